//! Corridor generation: curvature evolution, sub-segment smoothing,
//! distance-triggered spawning and time-based segment cleanup.
//!
//! # Invariants
//! - Accumulated curvature never leaves `[-max_total_curve, max_total_curve]`.
//! - At most one segment is built per tick.
//! - All randomness flows through a single [`SampleSource`].
//! - Everything runs on the caller's thread; nothing blocks.

mod builder;
mod config;
mod curvature;
mod lifecycle;
mod sample;
mod scheduler;
mod smoothing;

pub use builder::{
    MIN_ADVANCE, PieceTemplates, SegmentBuilder, SegmentReport, SpawnState, piece_advance,
    sub_segment_count,
};
pub use config::{ConfigError, GeneratorConfig};
pub use curvature::{CurvatureController, EasingState};
pub use lifecycle::LifecycleManager;
pub use sample::{SampleSource, ScriptedSource, SeededSource};
pub use scheduler::{GeneratorStats, SpawnScheduler, TickReport};
pub use smoothing::{delta_angle, smooth_damp, smooth_damp_angle};

pub fn crate_info() -> &'static str {
    "roadspace-gen v0.1.0"
}
