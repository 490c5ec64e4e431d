//! Per-part state that persists across frames.

use std::rc::Rc;

use crate::ids::{CellId, NO_CELL};
use crate::instance::InstanceKeyParams;
use crate::player::Player;
use crate::scene::SharedNode;

/// The object a part renders through.
#[derive(Debug)]
pub enum RenderObject {
    Mesh(SharedNode),
    Node(SharedNode),
    Player(Box<Player>),
}

impl RenderObject {
    /// Scene node of the object (the root node for nested players).
    pub fn node(&self) -> SharedNode {
        match self {
            Self::Mesh(node) | Self::Node(node) => Rc::clone(node),
            Self::Player(player) => Rc::clone(player.root()),
        }
    }

    pub fn as_player(&self) -> Option<&Player> {
        match self {
            Self::Player(player) => Some(player),
            _ => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut Player> {
        match self {
            Self::Player(player) => Some(player),
            _ => None,
        }
    }
}

/// Cached state of one part.
#[derive(Debug)]
pub struct CacheEntry {
    /// Cell id the cached object was built for.
    pub cell: CellId,
    pub object: Option<RenderObject>,
    /// Substitute for the authored cell id.
    pub cell_override: Option<CellId>,
    /// Apply `key_params` instead of the authored instance timing.
    pub overwrite: bool,
    pub key_params: Option<InstanceKeyParams>,
    /// Independent instance clock, in frames.
    pub live_time: f64,
}

impl Default for CacheEntry {
    fn default() -> Self {
        Self {
            cell: NO_CELL,
            object: None,
            cell_override: None,
            overwrite: false,
            key_params: None,
            live_time: 0.0,
        }
    }
}

/// Fixed arena of cache entries addressed by part index, sized at setup.
#[derive(Debug, Default)]
pub struct PartCache {
    entries: Vec<CacheEntry>,
}

impl PartCache {
    pub fn new(len: usize) -> Self {
        let mut entries = Vec::with_capacity(len);
        entries.resize_with(len, CacheEntry::default);
        Self { entries }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn get(&self, part: usize) -> Option<&CacheEntry> {
        self.entries.get(part)
    }

    #[inline]
    pub fn get_mut(&mut self, part: usize) -> Option<&mut CacheEntry> {
        self.entries.get_mut(part)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CacheEntry> {
        self.entries.iter()
    }

    /// Restart every independent instance clock.
    pub fn reset_live_time(&mut self) {
        for entry in &mut self.entries {
            entry.live_time = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_start_empty() {
        let mut cache = PartCache::new(3);
        assert_eq!(cache.len(), 3);
        assert!(cache.iter().all(|e| e.cell == NO_CELL && e.object.is_none()));
        assert!(cache.get(3).is_none());

        cache.get_mut(1).unwrap().live_time = 4.5;
        cache.reset_live_time();
        assert_eq!(cache.get(1).unwrap().live_time, 0.0);
    }
}
