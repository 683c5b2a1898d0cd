use glam::Vec3;
use roadspace_common::{ContainerId, Instancer};
use serde::Serialize;

use crate::builder::{PieceTemplates, SegmentBuilder, SegmentReport, SpawnState};
use crate::config::{ConfigError, GeneratorConfig};
use crate::lifecycle::LifecycleManager;
use crate::sample::{SampleSource, SeededSource};

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Segment built this tick, if the observer was within range.
    pub built: Option<SegmentReport>,
    /// Containers whose lifetime ran out this tick.
    pub destroyed: Vec<ContainerId>,
    /// True when no observer was bound and the spawn check was skipped.
    pub skipped: bool,
}

/// Running totals for instrumentation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeneratorStats {
    pub segments_built: u64,
    pub segments_destroyed: u64,
    pub ticks: u64,
    pub skipped_ticks: u64,
    pub live_segments: usize,
}

/// Owns the spawn point and decides when the corridor grows.
///
/// Construction seeds `initial_segments` segments so the observer starts
/// inside generated content. Each [`tick`](Self::tick) first retires
/// expired segments, then builds at most one new segment if the observer is
/// closer than `trigger_distance` to the spawn point.
pub struct SpawnScheduler<R: SampleSource = SeededSource> {
    builder: SegmentBuilder,
    state: SpawnState,
    rng: R,
    lifecycle: LifecycleManager,
    stats: GeneratorStats,
    observer_bound: bool,
    seed_reports: Vec<SegmentReport>,
}

impl SpawnScheduler<SeededSource> {
    /// Validate `config`, seed the RNG from `config.seed` (or entropy) and
    /// lay the initial segments.
    pub fn from_config(
        config: GeneratorConfig,
        templates: PieceTemplates,
        instancer: &mut impl Instancer,
    ) -> Result<Self, ConfigError> {
        let rng = match config.seed {
            Some(seed) => SeededSource::new(seed),
            None => SeededSource::from_entropy(),
        };
        tracing::info!(seed = rng.seed(), "generator seeded");
        Self::start(config, templates, rng, instancer)
    }
}

impl<R: SampleSource> SpawnScheduler<R> {
    /// Validate `config` and lay the initial segments using `rng`.
    pub fn start(
        config: GeneratorConfig,
        templates: PieceTemplates,
        rng: R,
        instancer: &mut impl Instancer,
    ) -> Result<Self, ConfigError> {
        let initial = config.initial_segments;
        let mut scheduler = Self {
            builder: SegmentBuilder::new(config, templates)?,
            state: SpawnState::default(),
            rng,
            lifecycle: LifecycleManager::new(),
            stats: GeneratorStats::default(),
            observer_bound: true,
            seed_reports: Vec::with_capacity(initial as usize),
        };

        let _span = tracing::info_span!("seed_corridor", segments = initial).entered();
        for _ in 0..initial {
            let report = scheduler.build(instancer);
            scheduler.seed_reports.push(report);
        }
        Ok(scheduler)
    }

    /// Advance the clock by `dt` seconds and react to the observer.
    ///
    /// A missing observer is not an error: the spawn check is skipped and
    /// resumes as soon as a position is supplied again. Lifetimes keep
    /// running either way.
    pub fn tick(
        &mut self,
        observer: Option<Vec3>,
        dt: f64,
        instancer: &mut impl Instancer,
    ) -> TickReport {
        let _span = tracing::info_span!("spawn_tick").entered();
        self.stats.ticks += 1;

        let destroyed = self.lifecycle.advance(dt, instancer);
        self.stats.segments_destroyed += destroyed.len() as u64;
        self.stats.live_segments = self.lifecycle.pending();

        let Some(observer) = observer else {
            if self.observer_bound {
                tracing::warn!("observer unbound, spawning paused");
                self.observer_bound = false;
            }
            self.stats.skipped_ticks += 1;
            return TickReport {
                built: None,
                destroyed,
                skipped: true,
            };
        };
        if !self.observer_bound {
            tracing::info!("observer bound again, spawning resumed");
            self.observer_bound = true;
        }

        let distance = observer.distance(self.state.position);
        let built = if distance < self.trigger_distance() {
            Some(self.build(instancer))
        } else {
            None
        };

        TickReport {
            built,
            destroyed,
            skipped: false,
        }
    }

    fn build(&mut self, instancer: &mut impl Instancer) -> SegmentReport {
        let report = self.builder.build(
            &mut self.state,
            &mut self.rng,
            instancer,
            &mut self.lifecycle,
        );
        self.stats.segments_built += 1;
        self.stats.live_segments = self.lifecycle.pending();
        report
    }

    fn trigger_distance(&self) -> f32 {
        self.builder.config().trigger_distance
    }

    pub fn config(&self) -> &GeneratorConfig {
        self.builder.config()
    }

    /// Current spawn point and heading state.
    pub fn state(&self) -> &SpawnState {
        &self.state
    }

    /// Where the next segment will start.
    pub fn spawn_point(&self) -> Vec3 {
        self.state.position
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    /// Reports of the segments laid by construction, in build order.
    pub fn seed_reports(&self) -> &[SegmentReport] {
        &self.seed_reports
    }

    pub fn stats(&self) -> &GeneratorStats {
        &self.stats
    }

    /// Simulated seconds since start.
    pub fn now(&self) -> f64 {
        self.lifecycle.now()
    }
}
