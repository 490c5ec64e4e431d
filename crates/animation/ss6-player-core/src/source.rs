//! The read-only animation data contract consumed by the player.
//!
//! Implementations own the parsed project (cells, packs, per-frame tables). The player
//! only ever calls these methods with ids it obtained from [`AnimationDataSource::find_animation`].

use glam::Vec2;

use crate::data::{
    AnimationBounds, Cell, FrameAttributes, FrameData, MeshData, PartFlags, PartInfo,
    PartTransform, UserData,
};
use crate::ids::{AnimationId, CellId};

/// Dummy layout transformed for node-kind parts: centre then LD, RD, LU, RU.
pub const DUMMY_VERTS: [Vec2; 5] = [
    Vec2::ZERO,
    Vec2::new(-0.5, -0.5),
    Vec2::new(0.5, -0.5),
    Vec2::new(-0.5, 0.5),
    Vec2::new(0.5, 0.5),
];

pub trait AnimationDataSource {
    /// Resolve an animation by pack and animation name.
    fn find_animation(&self, pack: &str, anim: &str) -> Option<AnimationId>;

    /// `(pack, [animation names])` for every pack in the project.
    fn animation_names(&self) -> Vec<(String, Vec<String>)>;

    fn bounds(&self, anim: AnimationId) -> Option<AnimationBounds>;

    /// Part table of the animation's pack, ordered by part index.
    fn parts(&self, anim: AnimationId) -> &[PartInfo];

    /// Fill `out` with the attributes of every part at `frame` and the draw order.
    fn frame_data(&self, anim: AnimationId, frame: i32, out: &mut FrameData);

    fn cell_count(&self) -> usize;

    fn cell(&self, cell: CellId) -> Option<&Cell>;

    /// Stored UV/index table for a mesh part.
    fn mesh_data(&self, anim: AnimationId, part: usize) -> Option<&MeshData>;

    /// User data keyed on `frame`, if any.
    fn user_data(&self, anim: AnimationId, frame: i32) -> Option<UserData>;

    /// Apply the part's hierarchical transform (relative to the player root) in place.
    fn transform_verts_local(&self, anim: AnimationId, part: usize, frame: i32, verts: &mut [Vec2]);

    /// Same as [`transform_verts_local`](Self::transform_verts_local) for unbound mesh vertices.
    fn transform_mesh_verts_local(
        &self,
        anim: AnimationId,
        part: usize,
        frame: i32,
        verts: &mut [Vec2],
    );

    /// Placement of an instance part relative to the player root.
    fn transform_position_local(&self, anim: AnimationId, part: usize, frame: i32) -> PartTransform;

    /// Build the untransformed 5-vertex quad of a part (centre, LD, RD, LU, RU).
    fn quad_verts(&self, cell: Option<&Cell>, attrs: &FrameAttributes, verts: &mut Vec<Vec2>) {
        verts.clear();
        let (cell_size, cell_pivot) = match cell {
            Some(c) => (Vec2::new(c.width, c.height), c.pivot),
            None => (Vec2::ZERO, Vec2::ZERO),
        };
        let size = attrs.size.unwrap_or(cell_size);
        let center = -(cell_pivot + attrs.pivot) * size;
        let mut half = size * 0.5;
        if attrs.flags.contains(PartFlags::FLIP_H) {
            half.x = -half.x;
        }
        if attrs.flags.contains(PartFlags::FLIP_V) {
            half.y = -half.y;
        }
        verts.push(center);
        verts.push(center + Vec2::new(-half.x, -half.y));
        verts.push(center + Vec2::new(half.x, -half.y));
        verts.push(center + Vec2::new(-half.x, half.y));
        verts.push(center + Vec2::new(half.x, half.y));
        if attrs.flags.contains(PartFlags::VERTEX_TRANSFORM) {
            for (v, offset) in verts[1..].iter_mut().zip(attrs.vertex_offsets) {
                *v += offset;
            }
        }
    }

    /// Copy this frame's deformed mesh points into `verts` (sized to the mesh vertex count).
    fn mesh_verts(&self, attrs: &FrameAttributes, verts: &mut Vec<Vec2>) {
        if attrs.mesh_points.is_empty() {
            return;
        }
        verts.clear();
        verts.extend_from_slice(&attrs.mesh_points);
    }

    fn dummy_verts(&self) -> [Vec2; 5] {
        DUMMY_VERTS
    }
}
