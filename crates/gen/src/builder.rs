use glam::{Quat, Vec3};
use roadspace_common::{ContainerId, Instancer, PieceKind, TemplateHandle};

use crate::config::{ConfigError, GeneratorConfig};
use crate::curvature::CurvatureController;
use crate::lifecycle::LifecycleManager;
use crate::sample::SampleSource;
use crate::smoothing::smooth_damp_angle;

/// Smallest forward step between sub-pieces, whatever the overlap.
pub const MIN_ADVANCE: f32 = 0.01;

/// Cursor and heading state carried from one segment build to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnState {
    /// Where the next segment starts; the trigger check measures against it.
    pub position: Vec3,
    /// Yaw of the accumulated curvature at the end of the last segment.
    pub heading: Quat,
    /// Target heading in degrees, bounded by `max_total_curve`.
    pub accumulated_curvature: f32,
    /// Filtered heading actually used to lay pieces.
    pub smoothed_heading: f32,
    pub smoothing_velocity: f32,
}

impl Default for SpawnState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            heading: Quat::IDENTITY,
            accumulated_curvature: 0.0,
            smoothed_heading: 0.0,
            smoothing_velocity: 0.0,
        }
    }
}

/// Template handles for each piece kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceTemplates {
    pub road: TemplateHandle,
    pub terrain: TemplateHandle,
}

impl PieceTemplates {
    pub fn for_kind(&self, kind: PieceKind) -> TemplateHandle {
        match kind {
            PieceKind::Road => self.road,
            PieceKind::TerrainLeft | PieceKind::TerrainRight => self.terrain,
        }
    }
}

impl Default for PieceTemplates {
    fn default() -> Self {
        Self {
            road: TemplateHandle(0),
            terrain: TemplateHandle(1),
        }
    }
}

/// Outcome of one segment build.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentReport {
    pub container: ContainerId,
    pub curvature_delta: f32,
    pub target_curvature: f32,
    pub sub_segments: u32,
    pub piece_length: f32,
    /// Cursor advance per sub-piece.
    pub advance: f32,
    pub start_position: Vec3,
    pub end_position: Vec3,
}

/// Number of sub-pieces for a segment whose curvature changed by `delta`.
///
/// Sharper changes get more sub-pieces. The ratio `|delta| / sharp_angle_max`
/// is clamped to `[0, 1]` before interpolating, so the result is always in
/// `[min_sub_segments, max_sub_segments]`. Halves round to even.
///
/// `config` must be valid; see [`GeneratorConfig::validate`].
pub fn sub_segment_count(config: &GeneratorConfig, delta: f32) -> u32 {
    let min = config.min_sub_segments;
    let max = config.max_sub_segments;
    let t = if config.sharp_angle_max > 0.0 {
        (delta.abs() / config.sharp_angle_max).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let t = if t.is_nan() { 0.0 } else { t };
    let count = (min as f32 + (max - min) as f32 * t).round_ties_even() as u32;
    count.clamp(min, max)
}

/// Forward step between consecutive sub-pieces of length `piece_length`.
pub fn piece_advance(piece_length: f32, overlap: f32) -> f32 {
    (piece_length - overlap).max(MIN_ADVANCE)
}

/// Lays out one segment of road and terrain pieces.
#[derive(Debug, Clone)]
pub struct SegmentBuilder {
    config: GeneratorConfig,
    templates: PieceTemplates,
    curvature: CurvatureController,
}

impl SegmentBuilder {
    /// Validate `config` and create a builder with no turn in progress.
    pub fn new(config: GeneratorConfig, templates: PieceTemplates) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            templates,
            curvature: CurvatureController::new(),
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn curvature(&self) -> &CurvatureController {
        &self.curvature
    }

    /// Build the next segment starting at `state.position`.
    ///
    /// Places `3 * sub_segments` pieces in a fresh container, schedules the
    /// container's destruction and moves `state` to the end of the segment.
    pub fn build(
        &mut self,
        state: &mut SpawnState,
        rng: &mut impl SampleSource,
        instancer: &mut impl Instancer,
        lifecycle: &mut LifecycleManager,
    ) -> SegmentReport {
        let cfg = &self.config;
        let delta = self.curvature.next_delta(cfg, rng);
        state.accumulated_curvature = (state.accumulated_curvature + delta)
            .clamp(-cfg.max_total_curve, cfg.max_total_curve);
        let target = state.accumulated_curvature;

        let sub_segments = sub_segment_count(cfg, delta);
        let piece_length = cfg.segment_length / sub_segments as f32;
        let advance = piece_advance(piece_length, cfg.sub_overlap_z);
        let damping_time = cfg.damping_time();

        let container = instancer.create_container("Segment");
        let start = state.position;
        let mut pos = start;

        for _ in 0..sub_segments {
            (state.smoothed_heading, state.smoothing_velocity) = smooth_damp_angle(
                state.smoothed_heading,
                target,
                state.smoothing_velocity,
                damping_time,
                cfg.smoothing_time_step,
            );
            let step_rot = Quat::from_rotation_y(state.smoothed_heading.to_radians());

            let road_pos = pos + step_rot * Vec3::new(0.0, cfg.road_height, 0.0);
            instancer.instantiate(
                self.templates.road,
                PieceKind::Road,
                road_pos,
                step_rot,
                container,
            );

            // Terrain follows the curve in position only.
            for (kind, side) in [
                (PieceKind::TerrainLeft, -cfg.terrain_offset),
                (PieceKind::TerrainRight, cfg.terrain_offset),
            ] {
                let terrain_pos = pos + step_rot * Vec3::new(side, cfg.terrain_height, 0.0);
                instancer.instantiate(
                    self.templates.for_kind(kind),
                    kind,
                    terrain_pos,
                    Quat::IDENTITY,
                    container,
                );
            }

            pos += step_rot * Vec3::new(0.0, 0.0, advance);
        }

        lifecycle.schedule_destroy(container, cfg.segment_lifetime);

        state.position = pos;
        state.heading = Quat::from_rotation_y(target.to_radians());

        tracing::debug!(
            ?container,
            delta,
            target,
            sub_segments,
            end = ?pos,
            "segment built"
        );

        SegmentReport {
            container,
            curvature_delta: delta,
            target_curvature: target,
            sub_segments,
            piece_length,
            advance,
            start_position: start,
            end_position: pos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{ScriptedSource, SeededSource};
    use roadspace_kernel::Scene;

    fn straight_config() -> GeneratorConfig {
        GeneratorConfig {
            sharp_turn_chance: 0.0,
            normal_curve_change: 0.0,
            ..GeneratorConfig::default()
        }
    }

    fn build_once(
        config: GeneratorConfig,
        rng: &mut impl SampleSource,
    ) -> (Scene, SpawnState, SegmentReport) {
        let mut builder = SegmentBuilder::new(config, PieceTemplates::default()).unwrap();
        let mut scene = Scene::new();
        let mut lifecycle = LifecycleManager::new();
        let mut state = SpawnState::default();
        let report = builder.build(&mut state, rng, &mut scene, &mut lifecycle);
        (scene, state, report)
    }

    #[test]
    fn sub_segment_count_interpolates() {
        let c = GeneratorConfig::default();
        assert_eq!(sub_segment_count(&c, 0.0), 4);
        assert_eq!(sub_segment_count(&c, 40.0), 12);
        assert_eq!(sub_segment_count(&c, -20.0), 8);
        // 4 + 8 * 0.1 = 4.8
        assert_eq!(sub_segment_count(&c, 4.0), 5);
    }

    #[test]
    fn sub_segment_count_rounds_halves_to_even() {
        let c = GeneratorConfig::default();
        // 4 + 8 * 0.0625 = 4.5
        assert_eq!(sub_segment_count(&c, 2.5), 4);
        assert_eq!(sub_segment_count(&c, -2.5), 4);
        // 4 + 8 * 0.1875 = 5.5
        assert_eq!(sub_segment_count(&c, 7.5), 6);
    }

    #[test]
    fn new_rejects_inverted_sub_segment_range() {
        let config = GeneratorConfig {
            min_sub_segments: 8,
            max_sub_segments: 4,
            ..GeneratorConfig::default()
        };
        let err = SegmentBuilder::new(config, PieceTemplates::default()).unwrap_err();
        assert!(matches!(err, ConfigError::InvertedRange { what: "sub_segments", .. }));
    }

    #[test]
    fn new_rejects_negative_curve_bound() {
        let config = GeneratorConfig {
            max_total_curve: -5.0,
            ..GeneratorConfig::default()
        };
        let err = SegmentBuilder::new(config, PieceTemplates::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Negative { field: "max_total_curve", .. }));
    }

    #[test]
    fn sub_segment_count_clamps_ratio() {
        let c = GeneratorConfig::default();
        assert_eq!(sub_segment_count(&c, 400.0), 12);
        assert_eq!(sub_segment_count(&c, f32::INFINITY), 12);
    }

    #[test]
    fn sub_segment_count_without_sharp_range() {
        let c = GeneratorConfig {
            sharp_angle_min: 0.0,
            sharp_angle_max: 0.0,
            ..GeneratorConfig::default()
        };
        assert_eq!(sub_segment_count(&c, 5.0), 4);
    }

    #[test]
    fn advance_has_floor() {
        assert!((piece_advance(12.5, 0.3) - 12.2).abs() < 1e-5);
        assert_eq!(piece_advance(0.2, 0.3), MIN_ADVANCE);
        assert_eq!(piece_advance(1.0, 1.0), MIN_ADVANCE);
    }

    #[test]
    fn straight_segment_lays_three_pieces_per_sub_segment() {
        let mut rng = ScriptedSource::new([]);
        let (scene, state, report) = build_once(straight_config(), &mut rng);
        assert_eq!(report.sub_segments, 4);
        assert_eq!(scene.count_kind(PieceKind::Road), 4);
        assert_eq!(scene.count_kind(PieceKind::TerrainLeft), 4);
        assert_eq!(scene.count_kind(PieceKind::TerrainRight), 4);
        assert_eq!(scene.pieces_of(report.container).len(), 12);

        // 4 pieces of 12.5, minus 0.3 overlap each, straight down +Z
        let expected = Vec3::new(0.0, 0.0, 4.0 * 12.2);
        assert!((state.position - expected).length() < 1e-3);
        assert_eq!(report.end_position, state.position);
    }

    #[test]
    fn road_and_terrain_offsets() {
        let mut rng = ScriptedSource::new([]);
        let (scene, _, report) = build_once(straight_config(), &mut rng);
        let pieces = scene.pieces_of(report.container);
        let road = pieces[0];
        let left = pieces[1];
        let right = pieces[2];
        assert_eq!(road.kind, PieceKind::Road);
        assert!((road.transform.position - Vec3::new(0.0, 0.01, 0.0)).length() < 1e-6);
        assert!((left.transform.position - Vec3::new(-25.0, 0.0, 0.0)).length() < 1e-6);
        assert!((right.transform.position - Vec3::new(25.0, 0.0, 0.0)).length() < 1e-6);
        assert_eq!(left.transform.rotation, Quat::IDENTITY);
        assert_eq!(right.transform.rotation, Quat::IDENTITY);
    }

    #[test]
    fn terrain_follows_curve_in_position_only() {
        let config = GeneratorConfig {
            sharp_turn_chance: 1.0,
            sharp_ease_min: 1,
            sharp_ease_max: 1,
            sub_smoothing: 1.0,
            terrain_height: 0.5,
            ..GeneratorConfig::default()
        };
        // sharp right turn of 29 degrees
        let mut rng = ScriptedSource::new([0.0, 0.9, 0.5]);
        let (scene, _, report) = build_once(config.clone(), &mut rng);
        let pieces = scene.pieces_of(report.container);
        assert_eq!(pieces.len(), 3 * report.sub_segments as usize);

        for triple in pieces.chunks(3) {
            let (road, left, right) = (triple[0], triple[1], triple[2]);
            assert_eq!(road.kind, PieceKind::Road);
            assert_eq!(left.kind, PieceKind::TerrainLeft);
            assert_eq!(right.kind, PieceKind::TerrainRight);

            let rot = road.transform.rotation;
            assert!(rot.angle_between(Quat::IDENTITY) > 0.1);
            let cursor = road.transform.position - rot * Vec3::new(0.0, config.road_height, 0.0);
            let want_left = cursor + rot * Vec3::new(-config.terrain_offset, 0.5, 0.0);
            let want_right = cursor + rot * Vec3::new(config.terrain_offset, 0.5, 0.0);
            assert!((left.transform.position - want_left).length() < 1e-3);
            assert!((right.transform.position - want_right).length() < 1e-3);
            // an unrotated offset would leave z on the cursor
            assert!((left.transform.position.z - cursor.z).abs() > 1.0);

            assert_eq!(left.transform.rotation, Quat::IDENTITY);
            assert_eq!(right.transform.rotation, Quat::IDENTITY);
        }
    }

    #[test]
    fn templates_follow_kind() {
        let templates = PieceTemplates {
            road: TemplateHandle(10),
            terrain: TemplateHandle(20),
        };
        let mut builder = SegmentBuilder::new(straight_config(), templates).unwrap();
        let mut scene = Scene::new();
        let mut lifecycle = LifecycleManager::new();
        let report = builder.build(
            &mut SpawnState::default(),
            &mut ScriptedSource::new([]),
            &mut scene,
            &mut lifecycle,
        );
        for p in scene.pieces_of(report.container) {
            let want = if p.kind == PieceKind::Road { 10 } else { 20 };
            assert_eq!(p.template, TemplateHandle(want));
        }
    }

    #[test]
    fn curvature_is_clamped() {
        let config = GeneratorConfig {
            sharp_turn_chance: 1.0,
            sharp_ease_min: 1,
            sharp_ease_max: 1,
            max_total_curve: 25.0,
            ..GeneratorConfig::default()
        };
        // chance hit, positive, magnitude 40
        let mut rng = ScriptedSource::new([0.0, 0.9, 1.0]);
        let (_, state, report) = build_once(config, &mut rng);
        assert!((report.curvature_delta - 40.0).abs() < 1e-5);
        assert_eq!(state.accumulated_curvature, 25.0);
        assert_eq!(report.sub_segments, 12);
    }

    #[test]
    fn heading_persisted_from_target() {
        let config = GeneratorConfig {
            sharp_turn_chance: 1.0,
            sharp_ease_min: 1,
            sharp_ease_max: 1,
            sharp_angle_min: 30.0,
            sharp_angle_max: 30.0,
            ..GeneratorConfig::default()
        };
        let mut rng = ScriptedSource::new([0.0, 0.9, 0.0]);
        let (_, state, _) = build_once(config, &mut rng);
        let want = Quat::from_rotation_y(30f32.to_radians());
        assert!(state.heading.angle_between(want) < 1e-4);
        // filtered heading lags the target
        assert!(state.smoothed_heading > 0.0);
        assert!(state.smoothed_heading < 30.0);
    }

    #[test]
    fn right_turn_bends_toward_positive_x() {
        let config = GeneratorConfig {
            sharp_turn_chance: 1.0,
            sharp_ease_min: 1,
            sharp_ease_max: 1,
            sub_smoothing: 1.0,
            ..GeneratorConfig::default()
        };
        let mut rng = ScriptedSource::new([0.0, 0.9, 0.5]);
        let (_, state, _) = build_once(config, &mut rng);
        assert!(state.position.x > 0.0);
        assert!(state.position.z > 0.0);
    }

    #[test]
    fn builder_carries_ease_in_between_builds() {
        let config = GeneratorConfig {
            sharp_turn_chance: 1.0,
            sharp_ease_min: 3,
            sharp_ease_max: 3,
            ..GeneratorConfig::default()
        };
        let mut builder = SegmentBuilder::new(config, PieceTemplates::default()).unwrap();
        let mut scene = Scene::new();
        let mut lifecycle = LifecycleManager::new();
        let mut state = SpawnState::default();
        let mut rng = ScriptedSource::new([0.0, 0.9, 1.0]);

        let first = builder.build(&mut state, &mut rng, &mut scene, &mut lifecycle);
        assert_eq!(builder.curvature().easing().steps_remaining, 2);
        for left in (0..2).rev() {
            let r = builder.build(&mut state, &mut rng, &mut scene, &mut lifecycle);
            assert_eq!(r.curvature_delta, first.curvature_delta);
            assert_eq!(builder.curvature().easing().steps_remaining, left);
        }
        assert!(!builder.curvature().easing().is_active());
        assert!((state.accumulated_curvature - 40.0).abs() < 1e-4);
    }

    #[test]
    fn container_is_scheduled_for_destruction() {
        let config = GeneratorConfig {
            segment_lifetime: 10.0,
            ..straight_config()
        };
        let mut builder = SegmentBuilder::new(config, PieceTemplates::default()).unwrap();
        let mut scene = Scene::new();
        let mut lifecycle = LifecycleManager::new();
        let report = builder.build(
            &mut SpawnState::default(),
            &mut ScriptedSource::new([]),
            &mut scene,
            &mut lifecycle,
        );
        assert_eq!(lifecycle.pending(), 1);
        assert_eq!(lifecycle.next_deadline(), Some(10.0));
        lifecycle.advance(10.0, &mut scene);
        assert!(!scene.contains(report.container));
    }

    #[test]
    fn consecutive_builds_chain_end_to_start() {
        let mut builder =
            SegmentBuilder::new(GeneratorConfig::default(), PieceTemplates::default()).unwrap();
        let mut scene = Scene::new();
        let mut lifecycle = LifecycleManager::new();
        let mut state = SpawnState::default();
        let mut rng = SeededSource::new(3);
        let mut last_end = state.position;
        for _ in 0..20 {
            let r = builder.build(&mut state, &mut rng, &mut scene, &mut lifecycle);
            assert_eq!(r.start_position, last_end);
            last_end = r.end_position;
        }
        assert_eq!(scene.container_count(), 20);
    }
}
