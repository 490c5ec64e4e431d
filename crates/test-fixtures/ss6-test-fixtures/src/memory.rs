//! In-memory animation data source built from JSON (or by hand in tests).
//!
//! Parts carry a rigid pose (translation, scale, rotation in degrees) that composes down
//! the parent chain. Frame attributes start from a per-part base record and take the
//! latest step key at or before the evaluated frame.

use anyhow::{anyhow, Context, Result};
use glam::Vec2;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use ss6_player::{
    AnimationBounds, AnimationDataSource, AnimationId, Cell, CellId, FrameAttributes, FrameData,
    InstanceValues, MeshData, PartInfo, PartKind, PartTransform, UserData,
};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MemoryProject {
    #[serde(default)]
    pub cells: Vec<Cell>,
    pub packs: Vec<PackDef>,
}

/// One animation pack: a shared part table and its animations.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PackDef {
    pub name: String,
    #[serde(default)]
    pub parts: Vec<PartInfo>,
    /// Mesh tables keyed by part index.
    #[serde(default)]
    pub meshes: HashMap<usize, MeshData>,
    #[serde(default)]
    pub animations: Vec<AnimDef>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnimDef {
    pub name: String,
    #[serde(default)]
    pub start_frame: i32,
    pub end_frame: i32,
    #[serde(default = "default_fps")]
    pub fps: f64,
    #[serde(default)]
    pub tracks: Vec<TrackDef>,
    /// Draw order, lowest first; part order when absent.
    #[serde(default)]
    pub priority: Option<Vec<usize>>,
    #[serde(default)]
    pub user_data: Vec<UserData>,
}

fn default_fps() -> f64 {
    30.0
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TrackDef {
    pub part: usize,
    #[serde(default)]
    pub base: FrameAttributes,
    #[serde(default)]
    pub pose: Pose,
    #[serde(default)]
    pub keys: Vec<KeyDef>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pose {
    pub position: Vec2,
    pub scale: Vec2,
    /// Degrees.
    pub rotation: f32,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            scale: Vec2::ONE,
            rotation: 0.0,
        }
    }
}

impl Pose {
    fn apply(&self, v: Vec2) -> Vec2 {
        self.position + Vec2::from_angle(self.rotation.to_radians()).rotate(v * self.scale)
    }
}

/// Step key: every field present replaces the base value from `frame` on.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyDef {
    pub frame: i32,
    pub cell_index: Option<CellId>,
    pub hide: Option<bool>,
    pub position: Option<Vec2>,
    pub rotation: Option<f32>,
    pub instance: Option<InstanceValues>,
}

const PACK_SHIFT: u32 = 16;

fn encode(pack: usize, anim: usize) -> AnimationId {
    AnimationId(((pack as u32) << PACK_SHIFT) | anim as u32)
}

fn decode(id: AnimationId) -> (usize, usize) {
    ((id.0 >> PACK_SHIFT) as usize, (id.0 & 0xFFFF) as usize)
}

impl MemoryProject {
    pub fn from_json(text: &str) -> Result<Self> {
        let project: Self = serde_json::from_str(text).context("failed to parse project JSON")?;
        project.validate()?;
        Ok(project)
    }

    /// A single part-less animation `pack/anim`, for clock-only scenarios.
    pub fn timing_only(start_frame: i32, end_frame: i32, fps: f64) -> Self {
        Self {
            cells: Vec::new(),
            packs: vec![PackDef {
                name: "pack".into(),
                animations: vec![AnimDef {
                    name: "anim".into(),
                    start_frame,
                    end_frame,
                    fps,
                    tracks: Vec::new(),
                    priority: None,
                    user_data: Vec::new(),
                }],
                ..PackDef::default()
            }],
        }
    }

    /// Attach user data to frames of `pack/anim`.
    pub fn with_user_data(mut self, pack: &str, anim: &str, frames: &[i32]) -> Self {
        if let Some(def) = self
            .packs
            .iter_mut()
            .find(|p| p.name == pack)
            .and_then(|p| p.animations.iter_mut().find(|a| a.name == anim))
        {
            def.user_data.extend(frames.iter().map(|&frame| UserData {
                frame,
                items: Vec::new(),
            }));
        }
        self
    }

    fn validate(&self) -> Result<()> {
        for pack in &self.packs {
            for (i, part) in pack.parts.iter().enumerate() {
                if part.index != i {
                    return Err(anyhow!(
                        "pack '{}': part '{}' has index {} at position {i}",
                        pack.name,
                        part.name,
                        part.index
                    ));
                }
            }
        }
        Ok(())
    }

    fn lookup(&self, id: AnimationId) -> Option<(&PackDef, &AnimDef)> {
        let (p, a) = decode(id);
        let pack = self.packs.get(p)?;
        Some((pack, pack.animations.get(a)?))
    }

    fn track<'a>(anim: &'a AnimDef, part: usize) -> Option<&'a TrackDef> {
        anim.tracks.iter().find(|t| t.part == part)
    }

    /// Pose of `part` alone at `frame`.
    fn local_pose(anim: &AnimDef, part: usize, frame: i32) -> Pose {
        let Some(track) = Self::track(anim, part) else {
            return Pose::default();
        };
        let mut pose = track.pose;
        for key in track.keys.iter().filter(|k| k.frame <= frame) {
            if let Some(p) = key.position {
                pose.position = p;
            }
            if let Some(r) = key.rotation {
                pose.rotation = r;
            }
        }
        pose
    }

    /// Chain of poses from `part` up to the top of the hierarchy.
    fn pose_chain(pack: &PackDef, anim: &AnimDef, part: usize, frame: i32) -> Vec<Pose> {
        let mut chain = Vec::new();
        let mut cursor = Some(part);
        while let Some(index) = cursor {
            if chain.len() > pack.parts.len() {
                break;
            }
            chain.push(Self::local_pose(anim, index, frame));
            cursor = pack.parts.get(index).and_then(|p| p.parent);
        }
        chain
    }

    fn transform(&self, id: AnimationId, part: usize, frame: i32, verts: &mut [Vec2]) {
        let Some((pack, anim)) = self.lookup(id) else {
            return;
        };
        let chain = Self::pose_chain(pack, anim, part, frame);
        for v in verts.iter_mut() {
            *v = chain.iter().fold(*v, |acc, pose| pose.apply(acc));
        }
    }
}

impl AnimationDataSource for MemoryProject {
    fn find_animation(&self, pack: &str, anim: &str) -> Option<AnimationId> {
        let p = self.packs.iter().position(|d| d.name == pack)?;
        let a = self.packs[p].animations.iter().position(|d| d.name == anim)?;
        Some(encode(p, a))
    }

    fn animation_names(&self) -> Vec<(String, Vec<String>)> {
        self.packs
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    p.animations.iter().map(|a| a.name.clone()).collect(),
                )
            })
            .collect()
    }

    fn bounds(&self, id: AnimationId) -> Option<AnimationBounds> {
        let (_, anim) = self.lookup(id)?;
        Some(AnimationBounds {
            start_frame: anim.start_frame,
            end_frame: anim.end_frame,
            fps: anim.fps,
            total_frames: anim.end_frame + 1,
        })
    }

    fn parts(&self, id: AnimationId) -> &[PartInfo] {
        match self.lookup(id) {
            Some((pack, _)) => &pack.parts,
            None => &[],
        }
    }

    fn frame_data(&self, id: AnimationId, frame: i32, out: &mut FrameData) {
        let Some((pack, anim)) = self.lookup(id) else {
            return;
        };
        for part in &pack.parts {
            let mut attrs = match Self::track(anim, part.index) {
                Some(track) => {
                    let mut attrs = track.base.clone();
                    for key in track.keys.iter().filter(|k| k.frame <= frame) {
                        if let Some(cell) = key.cell_index {
                            attrs.cell_index = cell;
                        }
                        if let Some(hide) = key.hide {
                            attrs.hide = hide;
                        }
                        if let Some(values) = key.instance {
                            attrs.instance = Some(values);
                        }
                    }
                    attrs
                }
                None => FrameAttributes::default(),
            };
            attrs.index = part.index;
            if part.kind == PartKind::Instance && attrs.instance.is_none() {
                attrs.instance = Some(InstanceValues::default());
            }
            out.parts.push(attrs);
        }
        match &anim.priority {
            Some(order) => out.priority.extend_from_slice(order),
            None => out.priority.extend(0..pack.parts.len()),
        }
    }

    fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn cell(&self, cell: CellId) -> Option<&Cell> {
        usize::try_from(cell).ok().and_then(|i| self.cells.get(i))
    }

    fn mesh_data(&self, id: AnimationId, part: usize) -> Option<&MeshData> {
        let (pack, _) = self.lookup(id)?;
        pack.meshes.get(&part)
    }

    fn user_data(&self, id: AnimationId, frame: i32) -> Option<UserData> {
        let (_, anim) = self.lookup(id)?;
        anim.user_data.iter().find(|u| u.frame == frame).cloned()
    }

    fn transform_verts_local(&self, id: AnimationId, part: usize, frame: i32, verts: &mut [Vec2]) {
        self.transform(id, part, frame, verts);
    }

    fn transform_mesh_verts_local(
        &self,
        id: AnimationId,
        part: usize,
        frame: i32,
        verts: &mut [Vec2],
    ) {
        self.transform(id, part, frame, verts);
    }

    fn transform_position_local(&self, id: AnimationId, part: usize, frame: i32) -> PartTransform {
        let Some((pack, anim)) = self.lookup(id) else {
            return PartTransform::default();
        };
        let chain = Self::pose_chain(pack, anim, part, frame);
        PartTransform {
            position: chain.iter().fold(Vec2::ZERO, |acc, pose| pose.apply(acc)),
            scale: chain.iter().fold(Vec2::ONE, |acc, pose| acc * pose.scale),
            rotation: chain.iter().map(|pose| pose.rotation).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_pack_and_animation() {
        assert_eq!(decode(encode(3, 7)), (3, 7));
    }

    #[test]
    fn step_keys_take_latest_value() {
        let mut project = MemoryProject::timing_only(0, 9, 30.0);
        project.packs[0].parts.push(PartInfo {
            index: 0,
            name: "body".into(),
            kind: PartKind::Normal,
            ref_name: None,
            parent: None,
        });
        project.packs[0].animations[0].tracks.push(TrackDef {
            part: 0,
            keys: vec![
                KeyDef {
                    frame: 2,
                    cell_index: Some(1),
                    ..KeyDef::default()
                },
                KeyDef {
                    frame: 5,
                    cell_index: Some(2),
                    ..KeyDef::default()
                },
            ],
            ..TrackDef::default()
        });
        let id = project.find_animation("pack", "anim").unwrap();
        let cell_at = |frame| {
            let mut fd = FrameData::default();
            project.frame_data(id, frame, &mut fd);
            fd.parts[0].cell_index
        };
        assert_eq!(cell_at(0), -1);
        assert_eq!(cell_at(3), 1);
        assert_eq!(cell_at(9), 2);
    }
}
