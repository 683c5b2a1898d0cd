//! Scene Kernel: the in-memory instancing collaborator for the generator.
//!
//! # Invariants
//! - Pieces are owned by exactly one container; destroying the container
//!   destroys its pieces.
//! - Pieces are never mutated after creation.
//! - All state mutations flow through explicit operations, and are logged
//!   when the scene records events.

pub mod scene;

pub use scene::{Container, Piece, Scene, SceneEvent};
