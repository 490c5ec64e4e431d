//! Per-frame part resolution.
//!
//! For one frame: walk the parts in priority order, build or reuse each part's render
//! object, then write geometry/UVs/placement and rebuild the root child list.

use std::rc::Rc;

use glam::Vec2;
use log::{trace, warn};

use crate::cache::{CacheEntry, RenderObject};
use crate::data::{FrameAttributes, PartFlags, PartInfo, PartKind};
use crate::error::PlayerError;
use crate::geometry::{animated_uvs, diagonal_pivot, quad_mesh, recenter, table_mesh};
use crate::ids::{split_ref_name, AnimationId, CellId};
use crate::instance::{map_instance_time, InstanceTiming};
use crate::player::Player;
use crate::scene::{add_child, clear_children, SharedNode};

impl Player {
    /// Resolve every part at `frame`. `ds` is the fractional frame delta of this update,
    /// which advances independent instance clocks.
    pub(crate) fn resolve_frame(&mut self, frame: i32, ds: f64) {
        let Some(id) = self.bound.as_ref().map(|b| b.id) else {
            return;
        };
        let data = Rc::clone(self.project.data());
        let mut fd = std::mem::take(&mut self.frame_data);
        fd.clear();
        data.frame_data(id, frame, &mut fd);

        clear_children(&self.root);
        self.masks.clear();

        let parts = data.parts(id);
        for &index in &fd.priority {
            let part = parts.get(index).filter(|p| p.index == index);
            let (Some(part), Some(attrs)) = (part, fd.parts.get(index)) else {
                trace!("frame {frame}: no part/attributes for index {index}");
                continue;
            };
            let Some(cell) = self.prepare_part(id, part, attrs) else {
                continue;
            };
            if part.kind.is_mesh_kind() {
                self.draw_mesh(id, part, attrs, cell, frame);
            } else if part.kind.is_node_kind() {
                self.place_node(id, part, attrs, frame);
            } else {
                self.place_instance(id, part, attrs, frame, ds);
            }
        }

        self.frame_data = fd;
    }

    /// Build or reuse the render object of `part`. Returns the effective cell, or `None`
    /// when the part has nothing to draw this frame.
    fn prepare_part(
        &mut self,
        id: AnimationId,
        part: &PartInfo,
        attrs: &FrameAttributes,
    ) -> Option<CellId> {
        let entry = self.cache.get(part.index)?;
        let cell = entry.cell_override.unwrap_or(attrs.cell_index);

        let rebuild = if part.kind.is_mesh_kind() {
            if cell < 0 {
                trace!("part {}: no cell", part.name);
                return None;
            }
            entry.cell != cell || entry.object.is_none()
        } else if part.kind.is_node_kind() {
            entry.object.is_none() || entry.cell != cell
        } else {
            entry.object.is_none()
        };

        if rebuild {
            let object = self.build_object(id, part, attrs.cell_index, cell)?;
            let entry = self.cache.get_mut(part.index)?;
            entry.object = Some(object);
        }

        let entry = self.cache.get_mut(part.index)?;
        entry.object.as_ref()?;
        entry.cell = cell;
        Some(cell)
    }

    fn build_object(
        &self,
        id: AnimationId,
        part: &PartInfo,
        authored_cell: CellId,
        cell: CellId,
    ) -> Option<RenderObject> {
        let data = self.project.data();
        let factory = self.project.factory();

        let object = match part.kind {
            PartKind::Instance => match self.build_instance(part) {
                Ok(player) => RenderObject::Player(Box::new(player)),
                Err(e) => {
                    warn!("part {}: instance refused: {e}", part.name);
                    return None;
                }
            },
            PartKind::Nulltype | PartKind::Joint => RenderObject::Node(factory.create_node()),
            PartKind::Mesh => {
                let Some(c) = data.cell(cell) else {
                    trace!("part {}: cell {cell} not found", part.name);
                    return None;
                };
                let Some(table) = data.mesh_data(id, part.index) else {
                    trace!("part {}: no mesh table", part.name);
                    return None;
                };
                let desc = table_mesh(table, c, data.cell(authored_cell))?;
                RenderObject::Mesh(factory.create_mesh(desc))
            }
            _ => {
                let Some(c) = data.cell(cell) else {
                    trace!("part {}: cell {cell} not found", part.name);
                    return None;
                };
                RenderObject::Mesh(factory.create_mesh(quad_mesh(c)))
            }
        };
        object.node().borrow_mut().set_name(&part.name);
        Some(object)
    }

    fn build_instance(&self, part: &PartInfo) -> crate::Result<Player> {
        let ref_name = part.ref_name.as_deref().unwrap_or_default();
        let (pack, anim) =
            split_ref_name(ref_name).ok_or_else(|| PlayerError::MalformedReference {
                name: ref_name.to_string(),
            })?;
        self.make_instance_player(pack, anim)
    }

    /// Quad and mesh parts.
    fn draw_mesh(
        &mut self,
        id: AnimationId,
        part: &PartInfo,
        attrs: &FrameAttributes,
        cell: CellId,
        frame: i32,
    ) {
        let data = Rc::clone(self.project.data());
        let Some(node) = self.part_node(part.index) else {
            return;
        };
        let Some(cell) = data.cell(cell) else {
            trace!("part {}: cell {cell} not found", part.name);
            return;
        };

        let mut verts = std::mem::take(&mut self.verts);
        if part.kind == PartKind::Mesh {
            verts.clear();
            if let Some(mesh) = node.borrow().as_mesh() {
                verts.extend_from_slice(mesh.vertices());
            }
            data.mesh_verts(attrs, &mut verts);
            if !attrs.mesh_is_bind {
                data.transform_mesh_verts_local(id, part.index, frame, &mut verts);
            }
        } else {
            data.quad_verts(Some(cell), attrs, &mut verts);
            data.transform_verts_local(id, part.index, frame, &mut verts);
        }

        if attrs.flags.contains(PartFlags::VERTEX_TRANSFORM) {
            if let Some(pivot) = diagonal_pivot(&verts) {
                verts[0] = pivot;
            }
        }
        let pivot = recenter(&mut verts);

        {
            let mut n = node.borrow_mut();
            n.set_position(pivot);
            n.set_visible(!attrs.hide);
            if let Some(mesh) = n.as_mesh_mut() {
                if attrs.flags.has_uv_animation() && mesh.uvs().len() == 5 {
                    mesh.uvs_mut().copy_from_slice(&animated_uvs(cell, attrs));
                }
                mesh.update(&verts);
            }
        }

        if part.kind == PartKind::Mask {
            self.masks.push(node);
        } else {
            add_child(&self.root, &node);
        }
        self.verts = verts;
    }

    /// Null and joint parts only carry a placement.
    fn place_node(&self, id: AnimationId, part: &PartInfo, attrs: &FrameAttributes, frame: i32) {
        let data = Rc::clone(self.project.data());
        let Some(node) = self.part_node(part.index) else {
            return;
        };
        let mut verts = data.dummy_verts();
        data.transform_verts_local(id, part.index, frame, &mut verts);
        let mut n = node.borrow_mut();
        n.set_position(verts[0]);
        n.set_visible(!attrs.hide);
    }

    fn place_instance(
        &mut self,
        id: AnimationId,
        part: &PartInfo,
        attrs: &FrameAttributes,
        frame: i32,
        ds: f64,
    ) {
        let data = Rc::clone(self.project.data());
        let root = Rc::clone(&self.root);
        let parent_reverse = self.clock.direction() < 0;
        let placement = data.transform_position_local(id, part.index, frame);

        let Some(CacheEntry {
            object: Some(RenderObject::Player(child)),
            overwrite,
            key_params,
            live_time,
            ..
        }) = self.cache.get_mut(part.index)
        else {
            return;
        };

        {
            let mut n = child.root.borrow_mut();
            n.set_position(placement.position);
            n.set_rotation(Vec2::new(0.0, placement.rotation.to_radians()));
            n.set_scale(placement.scale);
            n.set_visible(!attrs.hide);
        }

        let authored = InstanceTiming::from_values(&attrs.instance.unwrap_or_default());
        let timing = match key_params {
            Some(params) if *overwrite => authored.overridden_by(params),
            _ => authored,
        };

        if child.start_frame() != timing.start_frame || child.end_frame() != timing.end_frame {
            child.set_animation_section(Some(timing.start_frame), Some(timing.end_frame), None);
        }

        let time = if timing.independent {
            *live_time += ds;
            live_time.floor() as i32
        } else {
            frame
        };

        let Some(shown) = map_instance_time(&timing, time, parent_reverse) else {
            trace!("part {}: instance not live at {time}", part.name);
            return;
        };
        child.set_frame(f64::from(shown));
        child.resolve_frame(shown, ds);
        add_child(&root, &child.root);
    }

    fn part_node(&self, index: usize) -> Option<SharedNode> {
        self.cache.get(index)?.object.as_ref().map(RenderObject::node)
    }
}
