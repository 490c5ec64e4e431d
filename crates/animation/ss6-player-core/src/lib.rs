//! Sprite/skeletal animation player core (backend-agnostic).
//!
//! A [`Player`] is bound to one animation of a [`Project`] and driven with elapsed
//! milliseconds. Every update it advances its [`clock::PlaybackClock`], resolves each
//! part of the current frame into a cached render object and rebuilds the child list of
//! its root [`SceneNode`]. Instance parts are nested players with their own time mapping.
//!
//! Animation data and rendering are collaborators: implement [`AnimationDataSource`] for
//! the data and [`NodeFactory`] (plus [`SceneNode`]/[`MeshNode`]) for the backend, or use
//! the in-memory defaults from [`scene`].

pub mod cache;
pub mod clock;
pub mod config;
pub mod data;
pub mod error;
pub mod geometry;
pub mod ids;
pub mod instance;
pub mod player;
pub mod project;
mod resolver;
pub mod scene;
pub mod source;

// Re-exports for consumers (backends, data loaders)
pub use cache::{CacheEntry, PartCache, RenderObject};
pub use clock::{ClockState, PlaybackClock};
pub use config::Config;
pub use data::{
    AnimationBounds, Cell, FrameAttributes, FrameData, InstanceLoopFlags, InstanceValues,
    MeshData, PartFlags, PartInfo, PartKind, PartTransform, UserData, UserDataItem,
};
pub use error::PlayerError;
pub use ids::{AnimationId, CellId};
pub use instance::{map_instance_time, InstanceKeyParams, InstanceTiming};
pub use player::Player;
pub use project::Project;
pub use scene::{
    BaseNode, DefaultNodeFactory, MeshDesc, MeshNode, MeshPart, NodeFactory, SceneNode,
    SharedNode, WeakNode,
};
pub use source::AnimationDataSource;

/// Player result type
pub type Result<T> = core::result::Result<T, PlayerError>;
