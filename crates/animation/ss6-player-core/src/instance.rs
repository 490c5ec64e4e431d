//! Time mapping for nested (instance) animations.

use serde::{Deserialize, Serialize};

use crate::data::{InstanceLoopFlags, InstanceValues};

/// Runtime override of an instance part's authored timing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceKeyParams {
    pub start_frame: i32,
    pub end_frame: i32,
    pub speed: f64,
    pub loop_count: i32,
    pub infinite: bool,
    pub reverse: bool,
    pub pingpong: bool,
    pub independent: bool,
}

impl Default for InstanceKeyParams {
    fn default() -> Self {
        Self {
            start_frame: 0,
            end_frame: 0,
            speed: 1.0,
            loop_count: 1,
            infinite: false,
            reverse: false,
            pingpong: false,
            independent: false,
        }
    }
}

impl InstanceKeyParams {
    /// Defaults over the given sub-range.
    pub fn with_section(start_frame: i32, end_frame: i32) -> Self {
        Self {
            start_frame,
            end_frame,
            ..Self::default()
        }
    }
}

/// Effective timing inputs of one instance evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InstanceTiming {
    /// Parent frame at which the instance goes live.
    pub keyframe: i32,
    pub start_frame: i32,
    pub end_frame: i32,
    pub speed: f64,
    pub loop_count: i32,
    pub infinite: bool,
    pub reverse: bool,
    pub pingpong: bool,
    pub independent: bool,
}

impl InstanceTiming {
    pub fn from_values(v: &InstanceValues) -> Self {
        Self {
            keyframe: v.cur_keyframe,
            start_frame: v.start_frame,
            end_frame: v.end_frame,
            speed: v.speed,
            loop_count: v.loop_num,
            infinite: v.loop_flags.contains(InstanceLoopFlags::INFINITE),
            reverse: v.loop_flags.contains(InstanceLoopFlags::REVERSE),
            pingpong: v.loop_flags.contains(InstanceLoopFlags::PINGPONG),
            independent: v.loop_flags.contains(InstanceLoopFlags::INDEPENDENT),
        }
    }

    /// Replace everything but the placement keyframe.
    pub fn overridden_by(self, p: &InstanceKeyParams) -> Self {
        Self {
            keyframe: self.keyframe,
            start_frame: p.start_frame,
            end_frame: p.end_frame,
            speed: p.speed,
            loop_count: p.loop_count,
            infinite: p.infinite,
            reverse: p.reverse,
            pingpong: p.pingpong,
            independent: p.independent,
        }
    }
}

/// Map a parent-visible `time` to the frame displayed by the instance.
///
/// `time` is the parent frame, or the part's independent clock. `parent_reverse` is set
/// while the enclosing player runs backward. Returns `None` while the instance is not
/// live yet or its sub-range is empty.
pub fn map_instance_time(timing: &InstanceTiming, time: i32, parent_reverse: bool) -> Option<i32> {
    if timing.keyframe > time {
        return None;
    }
    let elapsed = ((f64::from(time) - f64::from(timing.keyframe)) * timing.speed).floor();
    if !(elapsed >= 0.0) {
        return None;
    }
    let mut elapsed = elapsed as i64;

    let duration = i64::from(timing.end_frame) - i64::from(timing.start_frame) + 1;
    if duration <= 0 {
        return None;
    }

    let mut loops = elapsed / duration;
    let limit = i64::from(timing.loop_count) * if timing.pingpong { 2 } else { 1 };
    if !timing.infinite && loops >= limit {
        // hold the last frame of the last pass
        elapsed = duration - 1;
        loops = limit - 1;
    }

    let phase = elapsed % duration;

    let mut reverse = timing.reverse;
    if timing.pingpong && loops % 2 == 1 {
        reverse = !reverse;
    }
    if parent_reverse {
        reverse = !reverse;
    }

    let frame = if reverse {
        i64::from(timing.end_frame) - phase
    } else {
        i64::from(timing.start_frame) + phase
    };
    Some(frame as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(start: i32, end: i32) -> InstanceTiming {
        InstanceTiming::from_values(&InstanceValues {
            start_frame: start,
            end_frame: end,
            ..Default::default()
        })
    }

    fn sequence(t: &InstanceTiming, frames: std::ops::Range<i32>) -> Vec<Option<i32>> {
        frames.map(|f| map_instance_time(t, f, false)).collect()
    }

    #[test]
    fn not_live_before_keyframe() {
        let mut t = timing(0, 3);
        t.keyframe = 5;
        assert_eq!(map_instance_time(&t, 4, false), None);
        assert_eq!(map_instance_time(&t, 5, false), Some(0));
    }

    #[test]
    fn empty_section_is_skipped() {
        let t = timing(5, 4);
        assert_eq!(map_instance_time(&t, 0, false), None);
    }

    #[test]
    fn single_pass_holds_last_frame() {
        let t = timing(2, 4);
        assert_eq!(
            sequence(&t, 0..6),
            vec![Some(2), Some(3), Some(4), Some(4), Some(4), Some(4)]
        );
    }

    #[test]
    fn infinite_wraps() {
        let mut t = timing(0, 2);
        t.infinite = true;
        assert_eq!(
            sequence(&t, 0..7),
            vec![Some(0), Some(1), Some(2), Some(0), Some(1), Some(2), Some(0)]
        );
    }

    #[test]
    fn pingpong_alternates_then_holds() {
        let mut t = timing(0, 2);
        t.pingpong = true;
        t.loop_count = 2;
        let got: Vec<i32> = sequence(&t, 0..14).into_iter().flatten().collect();
        assert_eq!(got, vec![0, 1, 2, 2, 1, 0, 0, 1, 2, 2, 1, 0, 0, 0]);
    }

    #[test]
    fn reverse_and_parent_direction_compose() {
        let mut t = timing(0, 3);
        t.infinite = true;
        assert_eq!(map_instance_time(&t, 1, true), Some(2));
        t.reverse = true;
        assert_eq!(map_instance_time(&t, 1, false), Some(2));
        assert_eq!(map_instance_time(&t, 1, true), Some(1));
    }

    #[test]
    fn speed_scales_elapsed_time() {
        let mut t = timing(0, 9);
        t.speed = 2.0;
        assert_eq!(map_instance_time(&t, 3, false), Some(6));
        t.speed = 0.5;
        assert_eq!(map_instance_time(&t, 3, false), Some(1));
        t.speed = -1.0;
        assert_eq!(map_instance_time(&t, 3, false), None);
    }

    #[test]
    fn override_keeps_keyframe() {
        let mut t = timing(0, 3);
        t.keyframe = 7;
        let o = t.overridden_by(&InstanceKeyParams {
            infinite: true,
            ..InstanceKeyParams::with_section(1, 2)
        });
        assert_eq!(o.keyframe, 7);
        assert_eq!((o.start_frame, o.end_frame), (1, 2));
        assert!(o.infinite);
    }
}
