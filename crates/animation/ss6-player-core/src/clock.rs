//! Frame-advance state machine.
//!
//! The clock turns elapsed milliseconds into whole-frame steps within the playback
//! section, handling loop counting, direction and catch-up. It knows nothing about
//! parts; the player resolves whatever frame [`PlaybackClock::advance`] reports.

use serde::{Deserialize, Serialize};

use crate::data::AnimationBounds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClockState {
    /// Not playing
    Idle,
    /// Playing, but time does not advance
    Paused,
    Running,
}

/// Frame to resolve after an [`advance`](PlaybackClock::advance).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// Whole frame to resolve.
    pub frame: i32,
    /// Fractional frames consumed by this advance; `0` when nothing advanced.
    pub ds: f64,
    /// The loop counter ran out during this advance.
    pub play_ended: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackClock {
    current: f64,
    start: i32,
    end: i32,
    total: i32,
    /// Requested loop count, reinstated by `play`.
    loop_setting: i32,
    loops: i32,
    direction: i32,
    playing: bool,
    pausing: bool,
    pending_ms: f64,
    frame_duration_ms: f64,
    skip_enabled: bool,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self {
            current: 0.0,
            start: 0,
            end: 0,
            total: 0,
            loop_setting: -1,
            loops: -1,
            direction: 1,
            playing: false,
            pausing: true,
            pending_ms: 0.0,
            frame_duration_ms: 0.0,
            skip_enabled: true,
        }
    }
}

impl PlaybackClock {
    /// Idle clock over the full animation, positioned on its first frame.
    pub fn new(bounds: &AnimationBounds, loops: i32, skip_enabled: bool) -> Self {
        let loops = normalize_loops(loops);
        Self {
            current: f64::from(bounds.start_frame),
            start: bounds.start_frame,
            end: bounds.end_frame,
            total: bounds.total_frames,
            loop_setting: loops,
            loops,
            frame_duration_ms: bounds.frame_duration_ms(),
            skip_enabled,
            ..Self::default()
        }
    }

    #[inline]
    pub fn state(&self) -> ClockState {
        match (self.playing, self.pausing) {
            (false, _) => ClockState::Idle,
            (true, true) => ClockState::Paused,
            (true, false) => ClockState::Running,
        }
    }

    #[inline]
    pub fn current_frame(&self) -> f64 {
        self.current
    }

    #[inline]
    pub fn frame_no(&self) -> i32 {
        self.current.floor() as i32
    }

    #[inline]
    pub fn start_frame(&self) -> i32 {
        self.start
    }

    #[inline]
    pub fn end_frame(&self) -> i32 {
        self.end
    }

    #[inline]
    pub fn loops(&self) -> i32 {
        self.loops
    }

    #[inline]
    pub fn direction(&self) -> i32 {
        self.direction
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    #[inline]
    pub fn is_pausing(&self) -> bool {
        self.pausing
    }

    #[inline]
    pub fn frame_duration_ms(&self) -> f64 {
        self.frame_duration_ms
    }

    #[inline]
    pub fn skip_enabled(&self) -> bool {
        self.skip_enabled
    }

    /// First frame for the current direction.
    #[inline]
    fn entry_frame(&self) -> i32 {
        if self.direction > 0 {
            self.start
        } else {
            self.end
        }
    }

    /// Start running from `frame`, or from the section edge for the play direction.
    pub fn play(&mut self, frame: Option<f64>) {
        self.playing = true;
        self.pausing = false;
        self.loops = self.loop_setting;
        self.pending_ms = 0.0;
        self.current = frame.unwrap_or_else(|| f64::from(self.entry_frame()));
    }

    pub fn pause(&mut self) {
        self.pausing = true;
    }

    pub fn resume(&mut self) {
        self.pausing = false;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn set_frame(&mut self, frame: f64) {
        self.current = frame;
    }

    /// Loop count; zero or negative values loop forever.
    pub fn set_loops(&mut self, loops: i32) {
        self.loop_setting = normalize_loops(loops);
        self.loops = self.loop_setting;
    }

    /// `+1` forward, `-1` backward; zero is ignored.
    pub fn set_direction(&mut self, direction: i32) {
        if direction != 0 {
            self.direction = direction.signum();
        }
    }

    pub fn set_skip_enabled(&mut self, skip: bool) {
        self.skip_enabled = skip;
    }

    /// Milliseconds per frame; `0` keeps the frame fixed while still resolving it.
    pub fn set_frame_duration_ms(&mut self, ms: f64) {
        self.frame_duration_ms = if ms.is_finite() && ms > 0.0 { ms } else { 0.0 };
    }

    /// Narrow the playback section. Out-of-range bounds are ignored; loops `None` or
    /// non-positive means infinite. Moves to the section edge for the play direction.
    pub fn set_section(&mut self, start: Option<i32>, end: Option<i32>, loops: Option<i32>) {
        let in_range = |f: i32| f >= 0 && f < self.total;
        if let Some(s) = start.filter(|&s| in_range(s)) {
            self.start = s;
        }
        if let Some(e) = end.filter(|&e| in_range(e)) {
            self.end = e;
        }
        self.set_loops(loops.unwrap_or(-1));
        self.current = f64::from(self.entry_frame());
    }

    /// Advance by `elapsed_ms`.
    ///
    /// `on_frame` is called for every whole frame landed on while still playing, in
    /// order. Returns the frame to resolve, or `None` when running but not enough time
    /// has accumulated for a frame. Non-finite `elapsed_ms` is dropped.
    pub fn advance(
        &mut self,
        elapsed_ms: f64,
        rewind_on_finish: bool,
        mut on_frame: impl FnMut(i32),
    ) -> Option<Step> {
        if self.state() != ClockState::Running || self.frame_duration_ms == 0.0 {
            return Some(Step {
                frame: self.frame_no(),
                ds: 0.0,
                play_ended: false,
            });
        }
        if !elapsed_ms.is_finite() {
            return None;
        }

        self.pending_ms += elapsed_ms;
        if self.pending_ms < self.frame_duration_ms {
            return None;
        }

        let step = self.pending_ms / self.frame_duration_ms;
        self.pending_ms -= self.frame_duration_ms * step;

        let delta = if self.skip_enabled {
            step * f64::from(self.direction)
        } else {
            f64::from(self.direction)
        };
        let next = self.current + delta;
        let next_no = next.floor();
        let fraction = next - next_no;
        let next_no = next_no as i64;
        let mut frame_no = self.current.floor() as i64;
        let start = i64::from(self.start);
        let end = i64::from(self.end);
        let mut play_ended = false;

        let crossings = if self.direction > 0 {
            next_no - frame_no
        } else {
            frame_no - next_no
        };
        for _ in 0..crossings.max(0) {
            let mut landed = frame_no + i64::from(self.direction);
            let past_edge = if self.direction > 0 {
                landed > end
            } else {
                landed < start
            };
            if past_edge {
                let (wrap, near, far) = if self.direction > 0 {
                    (start, start, end)
                } else {
                    (end, end, start)
                };
                if self.loops == -1 {
                    landed = wrap;
                } else {
                    self.loops -= 1;
                    if self.loops <= 0 {
                        self.loops = 0;
                        self.playing = false;
                        play_ended = true;
                        frame_no = if rewind_on_finish { near } else { far };
                        break;
                    }
                    landed = wrap;
                }
            }
            frame_no = landed;
            on_frame(frame_no as i32);
        }

        self.current = if play_ended {
            frame_no as f64
        } else {
            frame_no as f64 + fraction
        };
        Some(Step {
            frame: self.frame_no(),
            ds: step,
            play_ended,
        })
    }
}

/// Non-positive loop counts mean infinite.
#[inline]
fn normalize_loops(loops: i32) -> i32 {
    if loops > 0 {
        loops
    } else {
        -1
    }
}
