//! Shared types for the roadspace workspace.
//!
//! # Invariants
//! - Handles are plain copyable ids; ownership lives with the instancer.
//! - Nothing here touches randomness or time.

pub mod instancer;
pub mod types;

pub use instancer::Instancer;
pub use types::{ContainerId, InstanceId, PieceKind, TemplateHandle, Transform};
