//! Core configuration for ss6-player-core.

use serde::{Deserialize, Serialize};

use crate::error::PlayerError;

/// Playback defaults applied by `Player::setup`, plus limits for nested instances.
/// Keep this minimal; expand as needed without breaking API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Convert accumulated catch-up time into multi-frame jumps. When false, one
    /// qualifying update advances exactly one frame.
    pub skip_enabled: bool,

    /// Whether `Player::update` lands on the section start (forward play) once the
    /// loop counter runs out. `Player::update_with_rewind` takes this explicitly.
    pub rewind_on_finish: bool,

    /// Loop counter installed by `setup`. `-1` loops forever.
    pub initial_loops: i32,

    /// Maximum nesting of instance players below a root player.
    pub max_instance_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            skip_enabled: true,
            rewind_on_finish: true,
            initial_loops: -1,
            max_instance_depth: 16,
        }
    }
}

impl Config {
    /// Parse a (possibly partial) JSON object; missing fields take their defaults.
    pub fn from_json(s: &str) -> Result<Self, PlayerError> {
        serde_json::from_str(s).map_err(|e| PlayerError::Config {
            reason: e.to_string(),
        })
    }
}
