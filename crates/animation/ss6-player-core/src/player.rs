//! Player: one animation bound to a root node, driven by elapsed time.
//!
//! Methods:
//! - setup, play, update/tick, pause/resume/stop, set_frame, set_animation_section
//! - change_instance_anime (re-target a nested player), set_part_cell (cell substitution)
//! - accessors for bounds, clock state, root/mask nodes and cached part objects

use std::fmt;
use std::rc::Rc;

use glam::Vec2;
use hashbrown::HashMap;
use log::{debug, warn};

use crate::cache::{PartCache, RenderObject};
use crate::clock::PlaybackClock;
use crate::data::{AnimationBounds, FrameData, PartKind, UserData};
use crate::error::PlayerError;
use crate::ids::{AnimationId, CellId};
use crate::instance::InstanceKeyParams;
use crate::project::Project;
use crate::scene::{clear_children, SharedNode};
use crate::Result;

pub type UserDataCallback = Box<dyn FnMut(&UserData)>;
pub type PlayEndCallback = Box<dyn FnMut(&mut Player)>;

/// Animation the player is currently bound to.
#[derive(Debug)]
pub(crate) struct Bound {
    pub(crate) id: AnimationId,
    pub(crate) pack: String,
    pub(crate) anim: String,
    pub(crate) bounds: AnimationBounds,
    part_lookup: HashMap<String, usize>,
}

pub struct Player {
    pub(crate) project: Project,
    pub(crate) root: SharedNode,
    pub(crate) bound: Option<Bound>,
    pub(crate) clock: PlaybackClock,
    pub(crate) cache: PartCache,
    pub(crate) masks: Vec<SharedNode>,
    /// Scratch reused across resolves.
    pub(crate) frame_data: FrameData,
    pub(crate) verts: Vec<Vec2>,
    crossed: Vec<i32>,
    /// Animations playing above this player, outermost first.
    lineage: Vec<AnimationId>,
    depth: usize,
    last_timestamp: Option<f64>,
    on_user_data: Option<UserDataCallback>,
    on_play_end: Option<PlayEndCallback>,
}

impl fmt::Debug for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Player")
            .field("bound", &self.bound)
            .field("clock", &self.clock)
            .field("parts", &self.cache.len())
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

impl Player {
    /// Unbound player with an empty root node.
    pub fn new(project: Project) -> Self {
        Self::nested(project, Vec::new(), 0)
    }

    fn nested(project: Project, lineage: Vec<AnimationId>, depth: usize) -> Self {
        let root = project.factory().create_node();
        let mut clock = PlaybackClock::default();
        clock.set_skip_enabled(project.config().skip_enabled);
        Self {
            project,
            root,
            bound: None,
            clock,
            cache: PartCache::default(),
            masks: Vec::new(),
            frame_data: FrameData::default(),
            verts: Vec::new(),
            crossed: Vec::new(),
            lineage,
            depth,
            last_timestamp: None,
            on_user_data: None,
            on_play_end: None,
        }
    }

    /// Bind to `pack/anim`: resets the part cache and clock and leaves the player idle on
    /// the first frame. Callbacks survive re-binding.
    pub fn setup(&mut self, pack: &str, anim: &str) -> Result<()> {
        let data = Rc::clone(self.project.data());
        let not_found = || PlayerError::AnimationNotFound {
            pack: pack.to_string(),
            anim: anim.to_string(),
        };

        let Some(id) = data.find_animation(pack, anim) else {
            warn!("setup: animation {pack}/{anim} not found");
            return Err(not_found());
        };
        if self.lineage.contains(&id) {
            warn!("setup: {pack}/{anim} already plays above this player");
            return Err(PlayerError::RecursiveInstance {
                pack: pack.to_string(),
                anim: anim.to_string(),
            });
        }
        let bounds = data.bounds(id).ok_or_else(not_found)?;

        let parts = data.parts(id);
        let part_lookup = parts.iter().map(|p| (p.name.clone(), p.index)).collect();
        let slots = parts.iter().map(|p| p.index + 1).max().unwrap_or(0);

        clear_children(&self.root);
        self.masks.clear();
        self.cache = PartCache::new(slots);
        let config = self.project.config();
        self.clock = PlaybackClock::new(&bounds, config.initial_loops, config.skip_enabled);
        self.last_timestamp = None;
        self.bound = Some(Bound {
            id,
            pack: pack.to_string(),
            anim: anim.to_string(),
            bounds,
            part_lookup,
        });

        debug!(
            "setup: {pack}/{anim} frames {}..={} @ {} fps, {} parts (depth {})",
            bounds.start_frame, bounds.end_frame, bounds.fps, slots, self.depth
        );
        Ok(())
    }

    /// Start playing from `frame`, or from the section edge for the play direction.
    ///
    /// Restores the loop count, restarts independent instance clocks, resolves the frame
    /// and delivers its user data.
    pub fn play(&mut self, frame: Option<f64>) {
        if self.bound.is_none() {
            return;
        }
        self.clock.play(frame);
        self.cache.reset_live_time();
        let frame_no = self.clock.frame_no();
        debug!("play: from frame {frame_no}, loops {}", self.clock.loops());
        self.resolve_frame(frame_no, 0.0);
        self.fire_user_data(frame_no);
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    pub fn resume(&mut self) {
        self.clock.resume();
    }

    /// Stop without moving the frame.
    pub fn stop(&mut self) {
        self.clock.stop();
    }

    /// Advance by `elapsed_ms`, rewinding on loop exhaustion as configured.
    pub fn update(&mut self, elapsed_ms: f64) {
        let rewind = self.project.config().rewind_on_finish;
        self.update_with_rewind(elapsed_ms, rewind);
    }

    /// Advance by `elapsed_ms` and resolve the resulting frame.
    ///
    /// When the loop counter runs out the player stops on the section start (forward,
    /// `rewind_on_finish`) or end, and the play-end callback fires once.
    pub fn update_with_rewind(&mut self, elapsed_ms: f64, rewind_on_finish: bool) {
        if self.bound.is_none() {
            return;
        }
        let mut crossed = std::mem::take(&mut self.crossed);
        crossed.clear();
        let step = self
            .clock
            .advance(elapsed_ms, rewind_on_finish, |frame| crossed.push(frame));
        for &frame in &crossed {
            self.fire_user_data(frame);
        }
        self.crossed = crossed;

        let Some(step) = step else {
            return;
        };
        self.resolve_frame(step.frame, step.ds);
        if step.play_ended {
            debug!("update: play end at frame {}", step.frame);
            self.fire_play_end();
        }
    }

    /// Advance to the absolute timestamp `now_ms`; the first call only records it.
    pub fn tick(&mut self, now_ms: f64) {
        let elapsed = now_ms - self.last_timestamp.unwrap_or(now_ms);
        self.last_timestamp = Some(now_ms);
        self.update(elapsed);
    }

    /// Move the playhead; takes effect on the next resolve.
    pub fn set_frame(&mut self, frame: f64) {
        self.clock.set_frame(frame);
    }

    /// Narrow playback to `start..=end` with `loops` passes (`None` or `<= 0` loops
    /// forever). Bounds outside the animation are ignored.
    pub fn set_animation_section(
        &mut self,
        start: Option<i32>,
        end: Option<i32>,
        loops: Option<i32>,
    ) {
        self.clock.set_section(start, end, loops);
    }

    pub fn set_loops(&mut self, loops: i32) {
        self.clock.set_loops(loops);
    }

    pub fn set_play_direction(&mut self, direction: i32) {
        self.clock.set_direction(direction);
    }

    pub fn set_skip_enabled(&mut self, skip: bool) {
        self.clock.set_skip_enabled(skip);
    }

    pub fn set_frame_duration_ms(&mut self, ms: f64) {
        self.clock.set_frame_duration_ms(ms);
    }

    pub fn on_user_data(&mut self, callback: impl FnMut(&UserData) + 'static) {
        self.on_user_data = Some(Box::new(callback));
    }

    /// Called once when the loop counter runs out, after the final frame is resolved.
    /// The callback may drive the player, e.g. `setup` and `play` the next animation.
    /// A callback installed from inside it replaces this one.
    pub fn on_play_end(&mut self, callback: impl FnMut(&mut Player) + 'static) {
        self.on_play_end = Some(Box::new(callback));
    }

    pub fn clear_callbacks(&mut self) {
        self.on_user_data = None;
        self.on_play_end = None;
    }

    /// Replace the animation played by instance part `part_name` with `pack/anim`.
    ///
    /// With `overwrite`, the part's authored timing is replaced by `key_params`, or by a
    /// single pass over the whole new animation when none are given. The new player starts
    /// at `key_params.start_frame` when given.
    pub fn change_instance_anime(
        &mut self,
        part_name: &str,
        pack: &str,
        anim: &str,
        overwrite: bool,
        key_params: Option<InstanceKeyParams>,
    ) -> Result<()> {
        let index = self.part_index(part_name)?;
        let data = Rc::clone(self.project.data());
        let id = self.bound.as_ref().ok_or(PlayerError::NotSetUp)?.id;
        let kind = data
            .parts(id)
            .get(index)
            .map(|p| p.kind)
            .ok_or_else(|| PlayerError::PartNotFound {
                name: part_name.to_string(),
            })?;
        let replaceable = self
            .cache
            .get(index)
            .is_some_and(|e| e.object.as_ref().map_or(true, |o| o.as_player().is_some()));
        if kind != PartKind::Instance || !replaceable {
            return Err(PlayerError::NotAnInstance {
                name: part_name.to_string(),
            });
        }

        let mut child = self.make_instance_player(pack, anim)?;
        child.root.borrow_mut().set_name(part_name);
        if let Some(params) = key_params {
            child.play(Some(f64::from(params.start_frame)));
        }
        let params = key_params.unwrap_or_else(|| {
            let b = child.bounds();
            InstanceKeyParams::with_section(b.start_frame, b.end_frame)
        });

        let entry = self
            .cache
            .get_mut(index)
            .ok_or_else(|| PlayerError::PartNotFound {
                name: part_name.to_string(),
            })?;
        entry.object = Some(RenderObject::Player(Box::new(child)));
        entry.overwrite = overwrite;
        entry.key_params = Some(params);
        entry.live_time = 0.0;

        debug!("change_instance_anime: {part_name} now plays {pack}/{anim}");
        Ok(())
    }

    /// Draw part `part_name` with `cell` instead of its authored cell; `None` restores it.
    pub fn set_part_cell(&mut self, part_name: &str, cell: Option<CellId>) -> Result<()> {
        let index = self.part_index(part_name)?;
        if let Some(id) = cell {
            if self.project.data().cell(id).is_none() {
                return Err(PlayerError::CellNotFound { cell: id });
            }
        }
        let entry = self
            .cache
            .get_mut(index)
            .ok_or_else(|| PlayerError::PartNotFound {
                name: part_name.to_string(),
            })?;
        entry.cell_override = cell;
        Ok(())
    }

    /// Nested player for `pack/anim`, one level below this one, already playing.
    pub(crate) fn make_instance_player(&self, pack: &str, anim: &str) -> Result<Player> {
        let limit = self.project.config().max_instance_depth;
        let depth = self.depth + 1;
        if depth > limit {
            warn!("instance {pack}/{anim}: depth {depth} exceeds limit {limit}");
            return Err(PlayerError::InstanceDepthExceeded { depth, limit });
        }
        let mut lineage = self.lineage.clone();
        if let Some(bound) = &self.bound {
            lineage.push(bound.id);
        }
        let mut child = Player::nested(self.project.clone(), lineage, depth);
        child.setup(pack, anim)?;
        child.play(None);
        Ok(child)
    }

    fn part_index(&self, name: &str) -> Result<usize> {
        let bound = self.bound.as_ref().ok_or(PlayerError::NotSetUp)?;
        bound
            .part_lookup
            .get(name)
            .copied()
            .ok_or_else(|| PlayerError::PartNotFound {
                name: name.to_string(),
            })
    }

    pub(crate) fn fire_user_data(&mut self, frame: i32) {
        let Some(id) = self.bound.as_ref().map(|b| b.id) else {
            return;
        };
        let Some(callback) = self.on_user_data.as_mut() else {
            return;
        };
        if let Some(user_data) = self.project.data().user_data(id, frame) {
            callback(&user_data);
        }
    }

    fn fire_play_end(&mut self) {
        if let Some(mut callback) = self.on_play_end.take() {
            callback(self);
            if self.on_play_end.is_none() {
                self.on_play_end = Some(callback);
            }
        }
    }

    /// Bounds of the whole bound animation (zeroed when unbound).
    pub fn bounds(&self) -> AnimationBounds {
        self.bound.as_ref().map_or(
            AnimationBounds {
                start_frame: 0,
                end_frame: 0,
                fps: 0.0,
                total_frames: 0,
            },
            |b| b.bounds,
        )
    }

    /// Section start.
    #[inline]
    pub fn start_frame(&self) -> i32 {
        self.clock.start_frame()
    }

    /// Section end.
    #[inline]
    pub fn end_frame(&self) -> i32 {
        self.clock.end_frame()
    }

    pub fn total_frames(&self) -> i32 {
        self.bounds().total_frames
    }

    pub fn fps(&self) -> f64 {
        self.bounds().fps
    }

    #[inline]
    pub fn frame_no(&self) -> i32 {
        self.clock.frame_no()
    }

    #[inline]
    pub fn current_frame(&self) -> f64 {
        self.clock.current_frame()
    }

    #[inline]
    pub fn loops(&self) -> i32 {
        self.clock.loops()
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.clock.is_playing()
    }

    #[inline]
    pub fn is_pausing(&self) -> bool {
        self.clock.is_pausing()
    }

    #[inline]
    pub fn play_direction(&self) -> i32 {
        self.clock.direction()
    }

    #[inline]
    pub fn skip_enabled(&self) -> bool {
        self.clock.skip_enabled()
    }

    #[inline]
    pub fn frame_duration_ms(&self) -> f64 {
        self.clock.frame_duration_ms()
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn anime_pack_name(&self) -> Option<&str> {
        self.bound.as_ref().map(|b| b.pack.as_str())
    }

    pub fn anime_name(&self) -> Option<&str> {
        self.bound.as_ref().map(|b| b.anim.as_str())
    }

    /// Nesting level; `0` for a top-level player.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn root(&self) -> &SharedNode {
        &self.root
    }

    /// Mask parts resolved in the last frame, in priority order.
    #[inline]
    pub fn masks(&self) -> &[SharedNode] {
        &self.masks
    }

    #[inline]
    pub fn cache(&self) -> &PartCache {
        &self.cache
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Cached render object of part `name`.
    pub fn part_object(&self, name: &str) -> Option<&RenderObject> {
        let index = self.part_index(name).ok()?;
        self.cache.get(index)?.object.as_ref()
    }

    /// Nested player of instance part `name`.
    pub fn instance_player(&self, name: &str) -> Option<&Player> {
        self.part_object(name)?.as_player()
    }

    pub fn instance_player_mut(&mut self, name: &str) -> Option<&mut Player> {
        let index = self.part_index(name).ok()?;
        self.cache.get_mut(index)?.object.as_mut()?.as_player_mut()
    }
}
