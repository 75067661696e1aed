//! Domain layer: layer tree, order decoding and visibility rules
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod entities;
pub mod error;
pub mod model;
pub mod radio;

pub use arena::{NodeArena, NodeId, NodeKind, TreeNode};
pub use builder::TreeBuilder;
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use model::{LayerModel, StateChange};
pub use radio::{ExclusionGroup, ExclusionGroupId};
