// What you SEE:
// • A dotted ground grid seen from an orbiting camera.
// • Two moving targets. When one is on screen it gets a yellow/cyan crosshair;
//   when it isn't, a tinted cursor sits on the window edge pointing at it.
// • Arrows orbit the camera. T / F toggle the target / focus-target cursor
//   (saved to the config file). P fakes a PvP zone, which hides everything.
//   ESC quits.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use cgmath::{Point3, Vector3};
use clap::Parser;

use edge_indicator::atlas::{
    AtlasAsset, AtlasLayout, PartList, PartRect, DEFAULT_LAYOUT, DEFAULT_TEXTURE, high_res_path,
};
use edge_indicator::camera::PerspectiveView;
use edge_indicator::draw::{draw_crosshair, draw_text_5x7, FrameCanvas, SoftwareUploader};
use edge_indicator::window::{Drawer, WindowKey as Key};
use edge_indicator::{
    AtlasPart, AtlasRequest, AtlasSource, EntityId, Error, FrameBuffer, FrameReport, FsAtlasSource,
    HostConditions, IndicatorConfig, IndicatorOverlay, MemoryAtlasSource, PixelBuffer, TargetColors,
    TargetProvider, TrackedEntity, Viewport, WorldView,
};

#[derive(Parser, Debug)]
#[command(name = "edge-indicator-demo", version, about = "Off-screen target cursors in a software-rendered scene")]
struct Args {
    /// Directory holding the atlas layout and sprite sheet. Uses a built-in sheet if omitted.
    #[arg(long)]
    atlas_dir: Option<PathBuf>,

    /// Settings file; created on the first toggle.
    #[arg(long, default_value = "edge-indicator.json")]
    config: PathBuf,

    /// Write each part, tinted with the demo colors, as PNGs into this directory and exit.
    #[arg(long)]
    dump_parts: Option<PathBuf>,

    #[arg(long, default_value_t = 960)]
    width: usize,

    #[arg(long, default_value_t = 600)]
    height: usize,
}

// Tint words: low byte red, then green, then blue.
const PRIMARY_COLORS: TargetColors = TargetColors::new(0x2020E0, 0x1010A0);
const FOCUS_COLORS: TargetColors = TargetColors::new(0xE0C020, 0x806010);

const BACKGROUND: u32 = 0x00_16_1A_20;
const GRID: u32 = 0x00_40_48_50;

/* ---------- built-in sprite sheet ---------- */

const CELL: u32 = 16;

/// Six cells in a row: two cursor frames, then target edge/fill and focus edge/fill.
/// Every sprite is a cursor pointing down, toward the texture's bottom edge.
fn builtin_sheet(scale: u32) -> Result<PixelBuffer, Error> {
    let cell = CELL * scale;
    let (w, h) = (cell * 6, cell);
    let mut data = vec![0u8; (w * h * 4) as usize];
    for y in 0..h {
        for x in 0..w {
            let index = x / cell;
            let nx = ((x % cell) as f32 + 0.5) / cell as f32 - 0.5;
            let ny = ((y % cell) as f32 + 0.5) / cell as f32;

            // Distance inside the downward triangle, in cell units.
            let inset = (0.5 * (1.0 - ny) - nx.abs()).min(ny);
            let notch = ny < 0.35 && nx.abs() < 0.12;
            let (gray, alpha) = match index {
                0 | 1 => (0x60, if inset > 0.0 { 0xFF } else { 0 }),
                2 | 4 if inset > 0.0 && inset < 0.08 && !(index == 4 && notch) => (0x30, 0xFF),
                3 | 5 if inset >= 0.08 && !(index == 5 && notch) => (0x50, 0xD0),
                _ => (0, 0),
            };
            let i = ((y * w + x) * 4) as usize;
            data[i..i + 4].copy_from_slice(&[gray, gray, gray, alpha]);
        }
    }
    PixelBuffer::from_rgba(w, h, data)
}

fn builtin_source() -> Result<MemoryAtlasSource, Error> {
    let parts = (0..6)
        .map(|i| PartRect {
            texture_id: 1,
            u: (i * CELL) as i32,
            v: 0,
            w: CELL as i32,
            h: CELL as i32,
        })
        .collect();
    let layout = AtlasLayout {
        assets: vec![AtlasAsset {
            id: 1,
            path: DEFAULT_TEXTURE.to_owned(),
        }],
        part_lists: vec![PartList { id: 0, parts }],
    };
    Ok(MemoryAtlasSource::new()
        .with_layout(DEFAULT_LAYOUT, layout)
        .with_texture(high_res_path(DEFAULT_TEXTURE), builtin_sheet(2)?))
}

/* ---------- scene ---------- */

/// A target and a focus target drifting around the origin.
struct DemoTargets {
    time: f32,
}

impl DemoTargets {
    fn entity(id: u64, position: Vector3<f32>, colors: TargetColors) -> TrackedEntity {
        TrackedEntity {
            id: EntityId(id),
            position,
            nameplate: Some(position + Vector3::new(0.0, 2.2, 0.0)),
            is_character: true,
            colors,
        }
    }
}

impl TargetProvider for DemoTargets {
    fn target(&self) -> Option<TrackedEntity> {
        let a = self.time * 0.25;
        let position = Vector3::new(22.0 * a.cos(), 0.0, 22.0 * a.sin());
        Some(Self::entity(0x1001, position, PRIMARY_COLORS))
    }

    fn focus_target(&self) -> Option<TrackedEntity> {
        let position = Vector3::new(-14.0, 0.0, 18.0 * (self.time * 0.4).sin());
        Some(Self::entity(0x2002, position, FOCUS_COLORS))
    }
}

fn draw_grid(fb: &mut FrameBuffer, view: &PerspectiveView) {
    for gx in (-40..=40).step_by(5) {
        for gz in (-40..=40).step_by(5) {
            let point = Vector3::new(gx as f32, 0.0, gz as f32);
            if let Some(p) = view.world_to_screen(point).filter(|p| p.in_view) {
                draw_crosshair(fb, p.screen.x as i32, p.screen.y as i32, 3, GRID);
            }
        }
    }
}

fn mark_visible(fb: &mut FrameBuffer, view: &PerspectiveView, entity: Option<TrackedEntity>, color: u32) {
    let Some(plate) = entity.and_then(|e| e.nameplate) else {
        return;
    };
    if let Some(p) = view.world_to_screen(plate).filter(|p| p.in_view) {
        draw_crosshair(fb, p.screen.x as i32, p.screen.y as i32, 10, color);
    }
}

/// Save the current tinted parts as PNGs.
fn dump_parts(overlay: &IndicatorOverlay<SoftwareUploader>, dir: &Path) -> Result<(), Error> {
    std::fs::create_dir_all(dir)?;
    for part in AtlasPart::ALL {
        let tint = match part {
            AtlasPart::TargetEdge => PRIMARY_COLORS.outline(),
            AtlasPart::TargetFill => PRIMARY_COLORS.fill(),
            AtlasPart::FocusEdge => FOCUS_COLORS.outline(),
            AtlasPart::FocusFill => FOCUS_COLORS.fill(),
        };
        let tinted = overlay.cache().base_image(part).tint(tint, part.bias());
        let Some(image) = tinted.to_rgba_image() else {
            log::warn!("{part:?} is empty, not written");
            continue;
        };
        let path = dir.join(format!("{part:?}.png"));
        image.save(&path)?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

fn save_config(config: &IndicatorConfig, path: &Path) {
    if let Err(e) = config.save(path) {
        log::warn!("could not save settings: {e}");
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "ON" } else { "OFF" }
}

fn main() -> Result<(), Error> {
    env_logger::init();
    let args = Args::parse();

    let mut config = IndicatorConfig::load(&args.config)?;

    /* --- Atlas: from disk if asked, otherwise the built-in sheet ---
       Visual: nothing yet; a bad atlas only turns the cursors off. */
    let source: Box<dyn AtlasSource> = match &args.atlas_dir {
        Some(dir) => Box::new(FsAtlasSource::new(dir)),
        None => Box::new(builtin_source()?),
    };
    let mut overlay = IndicatorOverlay::load_or_disable(&*source, &AtlasRequest::default(), SoftwareUploader::new());

    if let Some(dir) = &args.dump_parts {
        return match &overlay {
            Some(overlay) => dump_parts(overlay, dir),
            None => Ok(()),
        };
    }

    let mut drawer = Drawer::new("Edge Indicator", args.width, args.height)?;
    let mut screen = FrameBuffer::new(args.width, args.height);

    let mut view = PerspectiveView::new(
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Viewport::new(0.0, 0.0, args.width as f32, args.height as f32),
    );
    let (mut yaw, mut pitch, distance) = (0.0f32, 0.35f32, 12.0f32);

    let mut targets = DemoTargets { time: 0.0 };
    let mut conditions = HostConditions::default();
    let mut report = FrameReport::default();

    /* --- HUD / FPS --- */
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;
    let mut hud_fps_text = String::from("FPS: 0.0");
    let mut last_frame_time = Instant::now();

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        let now = Instant::now();
        let dt = (now - last_frame_time).as_secs_f32();
        last_frame_time = now;

        /* 1) Inputs */
        if drawer.key_down(Key::Left) { yaw -= 1.2 * dt; }
        if drawer.key_down(Key::Right) { yaw += 1.2 * dt; }
        if drawer.key_down(Key::Up) { pitch += 0.8 * dt; }
        if drawer.key_down(Key::Down) { pitch -= 0.8 * dt; }
        pitch = pitch.clamp(-1.4, 1.4);

        if drawer.pressed_once(Key::T) {
            config.display_for_target = !config.display_for_target;
            save_config(&config, &args.config);
        }
        if drawer.pressed_once(Key::F) {
            config.display_for_focus_target = !config.display_for_focus_target;
            save_config(&config, &args.config);
        }
        if drawer.pressed_once(Key::P) {
            conditions.in_pvp = !conditions.in_pvp;
        }

        /* 2) Move the world */
        view.orbit(yaw, pitch, distance);
        targets.time += dt;

        /* 3) Scene: ground grid + crosshairs on visible targets */
        screen.clear(BACKGROUND);
        draw_grid(&mut screen, &view);
        mark_visible(&mut screen, &view, targets.target(), 0x00_FF_CC_33);
        mark_visible(&mut screen, &view, targets.focus_target(), 0x00_33_CC_FF);

        /* 4) Edge cursors for everything that isn't visible */
        if let Some(overlay) = overlay.as_mut() {
            let mut canvas = FrameCanvas::new(&mut screen);
            report = overlay.draw_frame(conditions, &view, &targets, &config, &mut canvas);
        }

        /* 5) HUD */
        let hud = format!(
            "TARGET {} | FOCUS {} | PVP {} | DRAWN {} | {}",
            on_off(config.display_for_target),
            on_off(config.display_for_focus_target),
            on_off(conditions.in_pvp),
            report.drawn,
            hud_fps_text
        );
        draw_text_5x7(&mut screen, 8, 8, &hud, 0x00_FF_FF_FF);
        if overlay.is_none() {
            draw_text_5x7(&mut screen, 8, 20, "INDICATOR OFF: ATLAS FAILED TO LOAD", 0x00_FF_60_60);
        }

        /* 6) Present */
        drawer.present(&screen)?;

        /* 7) FPS counter */
        frames_this_second += 1;
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            let fps = frames_this_second as f32 / secs;
            log::debug!("FPS: {fps:.1}");
            hud_fps_text = format!("FPS: {fps:.1}");
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    Ok(())
}
