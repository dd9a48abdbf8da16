// The per-frame driver: gate on host state, then for each enabled target
// estimate a direction and submit its cursor.
//
// A target that can't be resolved this frame is logged and skipped; the other
// target still draws. Only atlas loading can take the whole feature down.

use crate::atlas::{AtlasParts, AtlasRequest, AtlasSource};
use crate::config::IndicatorConfig;
use crate::error::Result;
use crate::geometry::{build_and_submit, QuadSink};
use crate::projection::{estimate, Direction, WorldView};
use crate::target::{HostConditions, TargetProvider, TargetSnapshot};
use crate::tint_cache::{TextureUploader, TintCache};

/// What one `draw_frame` call did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Host conditions turned indicators off for this frame.
    pub suppressed: bool,
    /// Targets that got an edge cursor.
    pub drawn: usize,
    /// Targets skipped because something failed.
    pub failed: usize,
}

pub struct IndicatorOverlay<U: TextureUploader> {
    cache: TintCache<U>,
}

impl<U: TextureUploader> IndicatorOverlay<U> {
    pub fn new(parts: AtlasParts, uploader: U) -> Self {
        Self {
            cache: TintCache::new(parts, uploader),
        }
    }

    pub fn load<S: AtlasSource + ?Sized>(source: &S, request: &AtlasRequest, uploader: U) -> Result<Self> {
        let parts = AtlasParts::load(source, request)?;
        Ok(Self::new(parts, uploader))
    }

    /// Like [`IndicatorOverlay::load`], but a failure only disables the
    /// indicator. The host keeps running.
    pub fn load_or_disable<S: AtlasSource + ?Sized>(
        source: &S,
        request: &AtlasRequest,
        uploader: U,
    ) -> Option<Self> {
        match Self::load(source, request, uploader) {
            Ok(overlay) => Some(overlay),
            Err(e) => {
                log::error!("edge indicator disabled: {e}");
                None
            }
        }
    }

    pub fn cache(&self) -> &TintCache<U> {
        &self.cache
    }

    /// Draw this frame's cursors into `sink`, primary target first.
    pub fn draw_frame<W, T, S>(
        &mut self,
        conditions: HostConditions,
        world: &W,
        targets: &T,
        config: &IndicatorConfig,
        sink: &mut S,
    ) -> FrameReport
    where
        W: WorldView + ?Sized,
        T: TargetProvider + ?Sized,
        S: QuadSink<U::Handle> + ?Sized,
    {
        let mut report = FrameReport::default();
        if conditions.suppresses_indicators() {
            log::debug!("indicators suppressed: {conditions:?}");
            report.suppressed = true;
            return report;
        }

        let config = config.clamped();
        let primary = targets.target();
        let focus = targets.focus_target();

        let mut snapshots = Vec::with_capacity(2);
        if config.display_for_target {
            snapshots.extend(primary.as_ref().map(TargetSnapshot::primary));
        }
        if config.display_for_focus_target {
            snapshots.extend(focus.as_ref().map(|f| TargetSnapshot::focus(f, primary.as_ref())));
        }

        for snapshot in &snapshots {
            match self.draw_target(world, snapshot, &config, sink) {
                Ok(true) => report.drawn += 1,
                Ok(false) => {}
                Err(e) => {
                    let role = if snapshot.is_focus { "focus target" } else { "target" };
                    log::warn!("skipping {role} {:#x}: {e}", snapshot.entity.id.0);
                    report.failed += 1;
                }
            }
        }
        report
    }

    fn draw_target<W, S>(
        &mut self,
        world: &W,
        snapshot: &TargetSnapshot<'_>,
        config: &IndicatorConfig,
        sink: &mut S,
    ) -> Result<bool>
    where
        W: WorldView + ?Sized,
        S: QuadSink<U::Handle> + ?Sized,
    {
        let Direction::Toward(direction) = estimate(world, snapshot)? else {
            return Ok(false);
        };
        build_and_submit(
            &mut self.cache,
            sink,
            direction,
            &world.viewport(),
            config,
            snapshot.entity.colors,
            snapshot.is_focus,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::AtlasPart;
    use crate::geometry::tests::RecordingSink;
    use crate::projection::tests::{assert_vec_eq, forward_camera, ScriptedView};
    use crate::target::{EntityId, TargetColors, TrackedEntity};
    use crate::tint_cache::tests::{gray_parts, CountingUploader};
    use crate::types::Rgb24;
    use cgmath::{Vector2, Vector3};

    struct Targets {
        target: Option<TrackedEntity>,
        focus: Option<TrackedEntity>,
    }

    impl TargetProvider for Targets {
        fn target(&self) -> Option<TrackedEntity> {
            self.target.clone()
        }

        fn focus_target(&self) -> Option<TrackedEntity> {
            self.focus.clone()
        }
    }

    fn entity(id: u64, plate: [f32; 3], colors: TargetColors) -> TrackedEntity {
        let plate = Vector3::from(plate);
        TrackedEntity {
            id: EntityId(id),
            position: plate - Vector3::new(0.0, 2.0, 0.0),
            nameplate: Some(plate),
            is_character: true,
            colors,
        }
    }

    const RIGHT: [f32; 3] = [0.0, 0.0, -5.0];
    const LEFT: [f32; 3] = [0.0, 0.0, -6.0];

    /// RIGHT projects past the right edge, LEFT past the left.
    fn world() -> ScriptedView {
        ScriptedView::new(Some(forward_camera()))
            .project(RIGHT.into(), false, 1000.0, 300.0)
            .project(LEFT.into(), false, -200.0, 300.0)
    }

    fn overlay() -> (IndicatorOverlay<CountingUploader>, CountingUploader) {
        let uploader = CountingUploader::default();
        (IndicatorOverlay::new(gray_parts(), uploader.clone()), uploader)
    }

    #[test_log::test]
    fn draws_both_targets_outline_then_fill() {
        let (mut overlay, uploader) = overlay();
        let targets = Targets {
            target: Some(entity(1, RIGHT, TargetColors::new(0x0000FF, 0xFF0000))),
            focus: Some(entity(2, LEFT, TargetColors::new(0x00FF00, 0x00FF00))),
        };
        let mut sink = RecordingSink::default();

        let report = overlay.draw_frame(HostConditions::default(), &world(), &targets, &IndicatorConfig::default(), &mut sink);

        assert_eq!(report, FrameReport { suppressed: false, drawn: 2, failed: 0 });
        assert_eq!(sink.quads.len(), 4);
        assert_eq!(uploader.uploads(), 4);
        // Primary on the right padded edge, focus on the left one.
        assert_vec_eq((sink.quads[0].1[2] + sink.quads[0].1[3]) * 0.5, Vector2::new(792.0, 300.0));
        assert_vec_eq((sink.quads[2].1[2] + sink.quads[2].1[3]) * 0.5, Vector2::new(8.0, 300.0));

        let cache = overlay.cache();
        assert_eq!(cache.current_tint(AtlasPart::TargetEdge), Some(Rgb24::new(0x0000FF)));
        assert_eq!(cache.current_tint(AtlasPart::TargetFill), Some(Rgb24::new(0xFF0000)));
        assert_eq!(cache.current_tint(AtlasPart::FocusEdge), Some(Rgb24::new(0x00FF00)));
    }

    #[test_log::test]
    fn steady_frames_reuse_textures() {
        let (mut overlay, uploader) = overlay();
        let targets = Targets {
            target: Some(entity(1, RIGHT, TargetColors::new(1, 2))),
            focus: None,
        };
        for _ in 0..5 {
            let mut sink = RecordingSink::default();
            overlay.draw_frame(HostConditions::default(), &world(), &targets, &IndicatorConfig::default(), &mut sink);
            assert_eq!(sink.quads.len(), 2);
        }
        assert_eq!(uploader.uploads(), 2);
    }

    #[test_log::test]
    fn gated_frames_do_nothing() {
        let (mut overlay, uploader) = overlay();
        let targets = Targets {
            target: Some(entity(1, RIGHT, TargetColors::default())),
            focus: None,
        };
        for conditions in [
            HostConditions { in_pvp: true, ..Default::default() },
            HostConditions { bound_by_duty: true, in_combat: true, ..Default::default() },
        ] {
            let mut sink = RecordingSink::default();
            let report = overlay.draw_frame(conditions, &world(), &targets, &IndicatorConfig::default(), &mut sink);
            assert!(report.suppressed);
            assert!(sink.quads.is_empty());
        }
        assert_eq!(uploader.uploads(), 0);
    }

    #[test_log::test]
    fn display_flags_select_targets() {
        let (mut overlay, _) = overlay();
        let targets = Targets {
            target: Some(entity(1, RIGHT, TargetColors::default())),
            focus: Some(entity(2, LEFT, TargetColors::default())),
        };
        let config = IndicatorConfig {
            display_for_target: false,
            ..IndicatorConfig::default()
        };
        let mut sink = RecordingSink::default();
        let report = overlay.draw_frame(HostConditions::default(), &world(), &targets, &config, &mut sink);
        assert_eq!(report.drawn, 1);
        assert_eq!(overlay.cache().current_tint(AtlasPart::TargetEdge), None);
        assert!(overlay.cache().current_tint(AtlasPart::FocusEdge).is_some());
    }

    #[test_log::test]
    fn failing_target_does_not_block_the_other() {
        let (mut overlay, _) = overlay();
        let mut broken = entity(1, RIGHT, TargetColors::default());
        broken.nameplate = None;
        let targets = Targets {
            target: Some(broken),
            focus: Some(entity(2, LEFT, TargetColors::default())),
        };
        let mut sink = RecordingSink::default();
        let report = overlay.draw_frame(HostConditions::default(), &world(), &targets, &IndicatorConfig::default(), &mut sink);
        assert_eq!(report, FrameReport { suppressed: false, drawn: 1, failed: 1 });
        assert_eq!(sink.quads.len(), 2);
    }

    #[test_log::test]
    fn upload_failure_is_per_frame() {
        let (mut overlay, uploader) = overlay();
        let targets = Targets {
            target: Some(entity(1, RIGHT, TargetColors::default())),
            focus: None,
        };
        *uploader.fail.borrow_mut() = true;
        let mut sink = RecordingSink::default();
        let report = overlay.draw_frame(HostConditions::default(), &world(), &targets, &IndicatorConfig::default(), &mut sink);
        assert_eq!(report.failed, 1);
        assert!(sink.quads.is_empty());

        *uploader.fail.borrow_mut() = false;
        let report = overlay.draw_frame(HostConditions::default(), &world(), &targets, &IndicatorConfig::default(), &mut sink);
        assert_eq!(report.drawn, 1);
    }

    #[test_log::test]
    fn focus_on_primary_character_with_body_in_view_is_hidden() {
        let (mut overlay, _) = overlay();
        let shared = entity(7, RIGHT, TargetColors::default());
        let world = world().project(shared.position, true, 700.0, 400.0);
        let targets = Targets {
            target: None,
            focus: Some(shared.clone()),
        };
        let mut sink = RecordingSink::default();
        // Focus alone: only the nameplate counts, so it draws.
        let report = overlay.draw_frame(HostConditions::default(), &world, &targets, &IndicatorConfig::default(), &mut sink);
        assert_eq!(report.drawn, 1);

        // Same entity as the primary: the visible body hides both.
        let targets = Targets {
            target: Some(shared.clone()),
            focus: Some(shared),
        };
        let mut sink = RecordingSink::default();
        let report = overlay.draw_frame(HostConditions::default(), &world, &targets, &IndicatorConfig::default(), &mut sink);
        assert_eq!(report, FrameReport::default());
        assert!(sink.quads.is_empty());
    }

    #[test_log::test]
    fn missing_atlas_disables_the_feature() {
        let source = crate::atlas::MemoryAtlasSource::new();
        let overlay = IndicatorOverlay::load_or_disable(&source, &AtlasRequest::default(), CountingUploader::default());
        assert!(overlay.is_none());
    }

    #[test]
    fn drop_releases_live_textures() {
        let (mut overlay, uploader) = overlay();
        let targets = Targets {
            target: Some(entity(1, RIGHT, TargetColors::default())),
            focus: None,
        };
        let mut sink = RecordingSink::default();
        overlay.draw_frame(HostConditions::default(), &world(), &targets, &IndicatorConfig::default(), &mut sink);
        drop(sink);
        drop(overlay);
        assert_eq!(uploader.releases().len(), 2);
    }
}
