use crate::{
    camera::Projector,
    config::RenderConfig,
    depth::collect_visible_obstacles,
    episode::EpisodeRecord,
    foundation::math::lerp,
    raster::{FrameRgb, Rgb8},
    scene::{grid, hud, landmarks, obstacles},
};

/// Sky gradient endpoints, deep blue at the top row to pale at the horizon.
const SKY_TOP: Rgb8 = Rgb8::new(120, 165, 220);
const SKY_HORIZON: Rgb8 = Rgb8::new(195, 220, 240);

/// Ground gradient endpoints, dim at the horizon to full tone at the bottom.
const GROUND_COLOR: Rgb8 = Rgb8::new(90, 120, 100);

fn gradient(a: Rgb8, b: Rgb8, t: f64) -> Rgb8 {
    Rgb8::new(
        lerp(f64::from(a.r), f64::from(b.r), t).round() as u8,
        lerp(f64::from(a.g), f64::from(b.g), t).round() as u8,
        lerp(f64::from(a.b), f64::from(b.b), t).round() as u8,
    )
}

/// Render one step of the episode to a complete frame.
///
/// Pure function of the episode and the step index: layers are painted
/// strictly back to front (sky/ground split, ground grid, landmarks and sun
/// glow, depth-sorted obstacles, HUD) and no state survives between calls.
pub fn render_step(
    record: &EpisodeRecord,
    step: usize,
    cfg: &RenderConfig,
    proj: &Projector,
) -> FrameRgb {
    let pose = record.robot_trajectory[step];
    let mut frame = FrameRgb::new(cfg.image_width, cfg.image_height);

    let horizon = proj.horizon_y().max(0.0) as i32;
    let height = cfg.image_height as i32;
    for y in 0..horizon.min(height) {
        let t = f64::from(y) / f64::from(horizon.max(1));
        frame.fill_hspan(y, 0, frame.width as i32 - 1, gradient(SKY_TOP, SKY_HORIZON, t));
    }
    for y in horizon.max(0)..height {
        let t = f64::from(y - horizon) / f64::from((height - horizon).max(1));
        let shade = 0.85 + 0.2 * t;
        frame.fill_hspan(y, 0, frame.width as i32 - 1, GROUND_COLOR.scaled(shade));
    }

    grid::draw_ground_grid(&mut frame, proj, &pose, cfg);
    landmarks::draw_landmarks(&mut frame, proj, record, &pose, cfg);

    for obstacle in collect_visible_obstacles(record, &pose, step, cfg) {
        obstacles::draw_obstacle(&mut frame, proj, &obstacle, cfg);
    }

    hud::draw_hud(&mut frame, record, &pose, step);
    frame
}
