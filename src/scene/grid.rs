use crate::{
    camera::{Projector, displacement_to_camera},
    config::RenderConfig,
    episode::Pose2D,
    foundation::math::wrap_angle,
    raster::{FrameRgb, Rgb8},
};

/// Base grid line color before the depth fade.
const GRID_COLOR: Rgb8 = Rgb8::new(60, 90, 70);

/// Samples per grid line. Fine enough that consecutive visible samples
/// connect into smooth perspective curves.
const SAMPLES_PER_LINE: usize = 48;

/// Draw the world-anchored ground grid.
///
/// Lines run along both world axes at multiples of `grid_pitch`, so the grid
/// stays fixed to the world and slides under the camera as the robot moves.
/// Each line is sampled in world space, transformed to the camera frame, and
/// only consecutive visible samples are connected; a line dipping out of the
/// frustum simply breaks into segments. Every fifth pitch multiple is drawn
/// brighter and thicker as a coarse reference line.
pub fn draw_ground_grid(frame: &mut FrameRgb, proj: &Projector, pose: &Pose2D, cfg: &RenderConfig) {
    let pitch = cfg.grid_pitch;
    let reach = cfg.view_distance;

    let k_min_x = ((pose.x - reach) / pitch).floor() as i64;
    let k_max_x = ((pose.x + reach) / pitch).ceil() as i64;
    let k_min_y = ((pose.y - reach) / pitch).floor() as i64;
    let k_max_y = ((pose.y + reach) / pitch).ceil() as i64;

    // Lines of constant world x, varying y.
    for k in k_min_x..=k_max_x {
        let dx = k as f64 * pitch - pose.x;
        draw_grid_line(frame, proj, pose, cfg, k, |t| {
            (dx, -reach + 2.0 * reach * t)
        });
    }
    // Lines of constant world y, varying x.
    for k in k_min_y..=k_max_y {
        let dy = k as f64 * pitch - pose.y;
        draw_grid_line(frame, proj, pose, cfg, k, |t| {
            (-reach + 2.0 * reach * t, dy)
        });
    }
}

fn draw_grid_line(
    frame: &mut FrameRgb,
    proj: &Projector,
    pose: &Pose2D,
    cfg: &RenderConfig,
    pitch_index: i64,
    displacement_at: impl Fn(f64) -> (f64, f64),
) {
    let half_fov = cfg.hfov_radians() / 2.0;
    let major = pitch_index.rem_euclid(5) == 0;
    let thickness = if major { 2 } else { 1 };
    let base = if major { GRID_COLOR.scaled(1.4) } else { GRID_COLOR };

    let mut prev: Option<(f64, f64, f64)> = None;
    for i in 0..=SAMPLES_PER_LINE {
        let t = i as f64 / SAMPLES_PER_LINE as f64;
        let (dx, dy) = displacement_at(t);
        let p = displacement_to_camera(dx, dy, pose.theta);

        let bearing = wrap_angle(p.local_y.atan2(p.local_x));
        let visible = p.local_x >= cfg.near_plane_epsilon
            && p.local_x <= cfg.view_distance
            && bearing.abs() < half_fov;
        if !visible {
            prev = None;
            continue;
        }

        let sx = proj.project_x(p.local_y, p.local_x);
        let sy = proj.project_y_ground(p.local_x);
        if let Some((px, py, pdepth)) = prev {
            let depth = (pdepth + p.local_x) / 2.0;
            let fade = (1.0 - depth / cfg.view_distance).clamp(0.3, 1.0);
            frame.draw_line_thick(
                px.round() as i32,
                py.round() as i32,
                sx.round() as i32,
                sy.round() as i32,
                thickness,
                base.scaled(fade),
            );
        }
        prev = Some((sx, sy, p.local_x));
    }
}
