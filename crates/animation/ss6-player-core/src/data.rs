//! Records exchanged with an [`AnimationDataSource`](crate::source::AnimationDataSource).
//!
//! These are plain, owned values so that any loader (binary, JSON, generated) can hand
//! them to the player without borrowing its internal tables.

use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::ids::{CellId, NO_CELL};

/// Playback bounds of one animation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationBounds {
    pub start_frame: i32,
    pub end_frame: i32,
    pub fps: f64,
    pub total_frames: i32,
}

impl AnimationBounds {
    /// Milliseconds per frame; `0.0` when the frame rate is unusable (resolve-only).
    pub fn frame_duration_ms(&self) -> f64 {
        if self.fps.is_finite() && self.fps > 0.0 {
            1000.0 / self.fps
        } else {
            0.0
        }
    }
}

/// Kind of an authored part. Anything the player has no special handling for is
/// drawn as a cell quad.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartKind {
    Nulltype,
    Normal,
    Instance,
    Mesh,
    Mask,
    Joint,
    #[serde(other)]
    Other,
}

impl PartKind {
    /// Parts rendered through a mesh node (quad or mesh).
    #[inline]
    pub fn is_mesh_kind(self) -> bool {
        matches!(self, Self::Normal | Self::Mask | Self::Mesh | Self::Other)
    }

    /// Parts that only carry a transform.
    #[inline]
    pub fn is_node_kind(self) -> bool {
        matches!(self, Self::Nulltype | Self::Joint)
    }
}

/// Static description of one part of the hierarchy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartInfo {
    pub index: usize,
    pub name: String,
    pub kind: PartKind,
    /// `"pack/anim"` played by instance parts.
    #[serde(default)]
    pub ref_name: Option<String>,
    #[serde(default)]
    pub parent: Option<usize>,
}

/// A texture-atlas region.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub name: String,
    /// Name of the atlas (cell map); doubles as the texture name given to mesh nodes.
    pub map_name: String,
    pub map_index: usize,
    /// Image path of the atlas, relative to the project.
    #[serde(default)]
    pub image_path: String,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub pivot: Vec2,
    pub u1: f32,
    pub v1: f32,
    pub u2: f32,
    pub v2: f32,
}

impl Cell {
    /// Centre of the UV rectangle.
    #[inline]
    pub fn uv_center(&self) -> Vec2 {
        Vec2::new((self.u1 + self.u2) * 0.5, (self.v1 + self.v2) * 0.5)
    }
}

/// Stored UV/index table of a mesh part. The vertex count equals `uvs.len()`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
}

bitflags! {
    /// Attribute flags active on a part for one frame. Human-readable formats use flag
    /// names, e.g. `"U_MOVE | V_MOVE"`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct PartFlags: u32 {
        const INVISIBLE = 1 << 0;
        const FLIP_H = 1 << 1;
        const FLIP_V = 1 << 2;
        const VERTEX_TRANSFORM = 1 << 19;
        const SIZE_X = 1 << 20;
        const SIZE_Y = 1 << 21;
        const U_MOVE = 1 << 22;
        const V_MOVE = 1 << 23;
        const UV_ROTATION = 1 << 24;
        const U_SCALE = 1 << 25;
        const V_SCALE = 1 << 26;
    }
}

impl PartFlags {
    /// Any UV attribute (move, scale or rotation) present.
    #[inline]
    pub fn has_uv_animation(self) -> bool {
        self.intersects(
            Self::U_MOVE | Self::V_MOVE | Self::U_SCALE | Self::V_SCALE | Self::UV_ROTATION,
        )
    }
}

bitflags! {
    /// Loop behaviour of an instance part.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct InstanceLoopFlags: u32 {
        const INFINITE = 1 << 0;
        const REVERSE = 1 << 1;
        const PINGPONG = 1 << 2;
        const INDEPENDENT = 1 << 3;
    }
}

/// Instance keyframe values for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceValues {
    /// Parent frame of the keyframe that placed the instance.
    pub cur_keyframe: i32,
    pub start_frame: i32,
    pub end_frame: i32,
    pub speed: f64,
    pub loop_num: i32,
    pub loop_flags: InstanceLoopFlags,
}

impl Default for InstanceValues {
    fn default() -> Self {
        Self {
            cur_keyframe: 0,
            start_frame: 0,
            end_frame: 0,
            speed: 1.0,
            loop_num: 1,
            loop_flags: InstanceLoopFlags::empty(),
        }
    }
}

/// Evaluated attributes of one part at one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameAttributes {
    /// Part index these attributes belong to.
    pub index: usize,
    pub cell_index: CellId,
    pub hide: bool,
    /// Inherited opacity, 0..=255. Not applied to nodes.
    pub opacity: u8,
    /// Local opacity, 0..=255. Not applied to nodes.
    pub local_opacity: u8,
    pub flags: PartFlags,
    /// Quad size; the cell size when absent.
    pub size: Option<Vec2>,
    /// Pivot offset in quad-size units (`0,0` is the centre).
    pub pivot: Vec2,
    /// Corner offsets for vertex deformation, ordered LD, RD, LU, RU.
    pub vertex_offsets: [Vec2; 4],
    pub uv_move: Vec2,
    pub uv_scale: Vec2,
    /// Degrees.
    pub uv_rotation: f32,
    /// Deformed mesh points for this frame (mesh parts only).
    pub mesh_points: Vec<Vec2>,
    /// Bound meshes arrive already transformed by their bones.
    pub mesh_is_bind: bool,
    pub instance: Option<InstanceValues>,
}

impl Default for FrameAttributes {
    fn default() -> Self {
        Self {
            index: 0,
            cell_index: NO_CELL,
            hide: false,
            opacity: 255,
            local_opacity: 255,
            flags: PartFlags::empty(),
            size: None,
            pivot: Vec2::ZERO,
            vertex_offsets: [Vec2::ZERO; 4],
            uv_move: Vec2::ZERO,
            uv_scale: Vec2::ONE,
            uv_rotation: 0.0,
            mesh_points: Vec::new(),
            mesh_is_bind: false,
            instance: None,
        }
    }
}

/// All part attributes of one frame plus the draw (priority) order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameData {
    /// Indexed by part index.
    pub parts: Vec<FrameAttributes>,
    /// Part indices, lowest priority first.
    pub priority: Vec<usize>,
}

impl FrameData {
    #[inline]
    pub fn clear(&mut self) {
        self.parts.clear();
        self.priority.clear();
    }
}

/// Local placement of an instance part: translation, scale and rotation in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartTransform {
    pub position: Vec2,
    pub scale: Vec2,
    pub rotation: f32,
}

impl Default for PartTransform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            scale: Vec2::ONE,
            rotation: 0.0,
        }
    }
}

/// User data attached to one part at one frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserDataItem {
    pub part_index: usize,
    pub integer: Option<i32>,
    pub rect: Option<[i32; 4]>,
    pub point: Option<Vec2>,
    pub text: Option<String>,
}

/// All user data keyed on one frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub frame: i32,
    pub items: Vec<UserDataItem>,
}
