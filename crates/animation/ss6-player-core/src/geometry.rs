//! Vertex and UV math shared by the frame resolver.
//!
//! Quads use a 5-vertex fan: index 0 is the centre (pivot), then LD, RD, LU, RU.

use glam::Vec2;

use crate::data::{Cell, FrameAttributes, MeshData, PartFlags};
use crate::scene::MeshDesc;

const LD: usize = 1;
const RD: usize = 2;
const LU: usize = 3;
const RU: usize = 4;

/// Triangle fan around the centre vertex.
pub const QUAD_INDICES: [u32; 12] = [0, 1, 2, 0, 2, 4, 0, 4, 3, 0, 3, 1];

/// Build the mesh description of a plain cell quad.
pub fn quad_mesh(cell: &Cell) -> MeshDesc {
    let w = cell.width * 0.5;
    let h = cell.height * 0.5;
    MeshDesc {
        vertices: vec![
            Vec2::ZERO,
            Vec2::new(-w, -h),
            Vec2::new(w, -h),
            Vec2::new(-w, h),
            Vec2::new(w, h),
        ],
        uvs: vec![
            cell.uv_center(),
            Vec2::new(cell.u1, cell.v1),
            Vec2::new(cell.u2, cell.v1),
            Vec2::new(cell.u1, cell.v2),
            Vec2::new(cell.u2, cell.v2),
        ],
        indices: QUAD_INDICES.to_vec(),
        texture_name: cell.map_name.clone(),
    }
}

/// Build a mesh node description from a stored mesh table.
///
/// When `cell` substitutes the authored cell, UVs shift by the difference of the two
/// UV centres. Returns `None` for an empty table.
pub fn table_mesh(table: &MeshData, cell: &Cell, authored: Option<&Cell>) -> Option<MeshDesc> {
    if table.uvs.is_empty() {
        return None;
    }
    let shift = match authored {
        Some(orig) if orig != cell => cell.uv_center() - orig.uv_center(),
        _ => Vec2::ZERO,
    };
    Some(MeshDesc {
        vertices: vec![Vec2::ZERO; table.uvs.len()],
        uvs: table.uvs.iter().map(|uv| *uv + shift).collect(),
        indices: table.indices.clone(),
        texture_name: cell.map_name.clone(),
    })
}

/// Intersection of segments `a0→a1` and `b0→b1`, if they cross.
pub fn segment_intersection(a0: Vec2, a1: Vec2, b0: Vec2, b1: Vec2) -> Option<Vec2> {
    let r = a1 - a0;
    let s = b1 - b0;
    let denom = r.perp_dot(s);
    if denom == 0.0 {
        return None;
    }
    let qp = b0 - a0;
    let t = qp.perp_dot(s) / denom;
    let u = qp.perp_dot(r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(a0 + r * t)
    } else {
        None
    }
}

/// Visual centre of a deformed quad: the crossing of the lines joining opposite edge
/// midpoints. `None` when fewer than five vertices or the lines do not cross.
pub fn diagonal_pivot(verts: &[Vec2]) -> Option<Vec2> {
    if verts.len() < 5 {
        return None;
    }
    let top = (verts[LU] + verts[RU]) * 0.5;
    let left = (verts[LU] + verts[LD]) * 0.5;
    let bottom = (verts[LD] + verts[RD]) * 0.5;
    let right = (verts[RU] + verts[RD]) * 0.5;
    segment_intersection(top, bottom, right, left)
}

/// Subtract vertex 0 from every vertex and return it.
pub fn recenter(verts: &mut [Vec2]) -> Vec2 {
    let Some(&pivot) = verts.first() else {
        return Vec2::ZERO;
    };
    for v in verts.iter_mut() {
        *v -= pivot;
    }
    pivot
}

/// UVs of an animated quad: the cell rectangle moved by `uv_move`, scaled about its
/// centre by `uv_scale`, then rotated about the centre when the rotation flag is set.
pub fn animated_uvs(cell: &Cell, attrs: &FrameAttributes) -> [Vec2; 5] {
    let u1 = cell.u1 + attrs.uv_move.x;
    let u2 = cell.u2 + attrs.uv_move.x;
    let v1 = cell.v1 + attrs.uv_move.y;
    let v2 = cell.v2 + attrs.uv_move.y;

    let c = Vec2::new((u1 + u2) * 0.5, (v1 + v2) * 0.5);
    let half = Vec2::new((u2 - u1) * 0.5, (v2 - v1) * 0.5) * attrs.uv_scale;

    let mut uvs = [
        c,
        Vec2::new(c.x - half.x, c.y - half.y),
        Vec2::new(c.x + half.x, c.y - half.y),
        Vec2::new(c.x - half.x, c.y + half.y),
        Vec2::new(c.x + half.x, c.y + half.y),
    ];

    if attrs.flags.contains(PartFlags::UV_ROTATION) {
        let rot = Vec2::from_angle(attrs.uv_rotation.to_radians());
        for uv in uvs.iter_mut() {
            *uv = c + rot.rotate(*uv - c);
        }
    }
    uvs
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cell() -> Cell {
        Cell {
            name: "c".into(),
            map_name: "atlas".into(),
            map_index: 0,
            image_path: String::new(),
            width: 20.0,
            height: 10.0,
            pivot: Vec2::ZERO,
            u1: 0.0,
            v1: 0.0,
            u2: 0.5,
            v2: 0.25,
        }
    }

    #[test]
    fn quad_mesh_is_centred_on_cell() {
        let m = quad_mesh(&cell());
        assert_eq!(m.vertices[0], Vec2::ZERO);
        assert_eq!(m.vertices[RU], Vec2::new(10.0, 5.0));
        assert_eq!(m.uvs[0], Vec2::new(0.25, 0.125));
        assert_eq!(m.indices.len(), 12);
        assert_eq!(m.texture_name, "atlas");
    }

    #[test]
    fn pivot_of_skewed_quad_is_corner_average() {
        // Bimedians of any quadrilateral bisect each other at the vertex centroid.
        let verts = [
            Vec2::ZERO,
            Vec2::new(-10.0, -4.0),
            Vec2::new(12.0, -6.0),
            Vec2::new(-8.0, 7.0),
            Vec2::new(14.0, 9.0),
        ];
        let p = diagonal_pivot(&verts).unwrap();
        let mean = (verts[1] + verts[2] + verts[3] + verts[4]) / 4.0;
        assert_relative_eq!(p.x, mean.x, epsilon = 1e-5);
        assert_relative_eq!(p.y, mean.y, epsilon = 1e-5);
    }

    #[test]
    fn degenerate_quad_has_no_pivot() {
        let verts = [Vec2::ZERO; 5];
        assert!(diagonal_pivot(&verts).is_none());
        assert!(diagonal_pivot(&verts[..3]).is_none());
    }

    #[test]
    fn recenter_moves_offset_to_return_value() {
        let mut verts = [Vec2::new(3.0, 4.0), Vec2::new(4.0, 4.0)];
        let p = recenter(&mut verts);
        assert_eq!(p, Vec2::new(3.0, 4.0));
        assert_eq!(verts, [Vec2::ZERO, Vec2::new(1.0, 0.0)]);
        assert_eq!(recenter(&mut []), Vec2::ZERO);
    }

    #[test]
    fn uv_move_and_scale() {
        let attrs = FrameAttributes {
            flags: PartFlags::U_MOVE | PartFlags::U_SCALE,
            uv_move: Vec2::new(0.5, 0.0),
            uv_scale: Vec2::new(2.0, 1.0),
            ..Default::default()
        };
        let uvs = animated_uvs(&cell(), &attrs);
        assert_relative_eq!(uvs[0].x, 0.75);
        assert_relative_eq!(uvs[1].x, 0.25);
        assert_relative_eq!(uvs[4].x, 1.25);
        assert_relative_eq!(uvs[4].y, 0.25);
    }

    #[test]
    fn uv_rotation_quarter_turn() {
        let attrs = FrameAttributes {
            flags: PartFlags::UV_ROTATION,
            uv_rotation: 90.0,
            ..Default::default()
        };
        let uvs = animated_uvs(&cell(), &attrs);
        let c = Vec2::new(0.25, 0.125);
        // LD offset (-0.25, -0.125) rotated by +90deg becomes (0.125, -0.25)
        assert_relative_eq!(uvs[1].x, c.x + 0.125, epsilon = 1e-6);
        assert_relative_eq!(uvs[1].y, c.y - 0.25, epsilon = 1e-6);
        assert_relative_eq!(uvs[0].x, c.x);
    }

    #[test]
    fn table_mesh_shifts_uvs_for_substituted_cell() {
        let table = MeshData {
            uvs: vec![Vec2::new(0.1, 0.1), Vec2::new(0.2, 0.2), Vec2::new(0.3, 0.1)],
            indices: vec![0, 1, 2],
        };
        let orig = cell();
        let mut other = cell();
        other.u1 += 0.5;
        other.u2 += 0.5;
        let m = table_mesh(&table, &other, Some(&orig)).unwrap();
        assert_eq!(m.vertices.len(), 3);
        assert_relative_eq!(m.uvs[0].x, 0.6);
        assert_relative_eq!(m.uvs[0].y, 0.1);

        let same = table_mesh(&table, &orig, Some(&orig)).unwrap();
        assert_eq!(same.uvs, table.uvs);
        assert!(table_mesh(&MeshData::default(), &orig, None).is_none());
    }
}
