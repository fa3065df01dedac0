use kurbo::Point;

use crate::{
    camera::{CameraPoint, Projector, world_to_camera},
    config::RenderConfig,
    episode::{EpisodeRecord, Pose2D},
    foundation::math::{angle_diff, wrap_angle},
    raster::{FrameRgb, Rgb8},
};

/// World-fixed orientation towers at the origin, the axis points and the
/// diagonals. Their colors make each direction recognizable at a glance.
const LANDMARKS: [(f64, f64, Rgb8); 9] = [
    (0.0, 0.0, Rgb8::new(255, 200, 100)),
    (20.0, 0.0, Rgb8::new(100, 200, 255)),
    (-20.0, 0.0, Rgb8::new(255, 100, 200)),
    (0.0, 20.0, Rgb8::new(100, 255, 100)),
    (0.0, -20.0, Rgb8::new(255, 255, 100)),
    (20.0, 20.0, Rgb8::new(200, 150, 255)),
    (-20.0, 20.0, Rgb8::new(150, 255, 200)),
    (20.0, -20.0, Rgb8::new(255, 180, 150)),
    (-20.0, -20.0, Rgb8::new(200, 200, 200)),
];

const LANDMARK_HEIGHT: f64 = 5.0;
const LANDMARK_RADIUS: f64 = 0.15;

const GOAL_COLOR: Rgb8 = Rgb8::new(255, 215, 0);
const GOAL_BASE_COLOR: Rgb8 = Rgb8::new(255, 50, 50);
const GOAL_HEIGHT: f64 = 6.0;
const GOAL_RADIUS: f64 = 0.3;

/// World bearing the sun glow sits at.
const SUN_BEARING: f64 = std::f64::consts::FRAC_PI_4;
const SUN_COLOR: Rgb8 = Rgb8::new(255, 245, 200);

/// Draw the sun glow, the orientation towers and the goal marker for this
/// pose. Called after the sky/ground split and the grid, before obstacles, so
/// nearby geometry still occludes everything here.
pub fn draw_landmarks(
    frame: &mut FrameRgb,
    proj: &Projector,
    record: &EpisodeRecord,
    pose: &Pose2D,
    cfg: &RenderConfig,
) {
    draw_sun_glow(frame, proj, pose, cfg);

    for &(x, y, color) in &LANDMARKS {
        let center = world_to_camera(Point::new(x, y), pose);
        if let Some(tower) = Tower::project(proj, center, LANDMARK_HEIGHT, LANDMARK_RADIUS, cfg) {
            tower.draw(frame, color);
        }
    }

    if let Some(goal) = record.robot_trajectory.last() {
        let center = world_to_camera(Point::new(goal.x, goal.y), pose);
        if let Some(tower) = Tower::project(proj, center, GOAL_HEIGHT, GOAL_RADIUS, cfg) {
            // Red base disc under the gold tower.
            frame.fill_ellipse(
                tower.cx,
                tower.y_bottom,
                tower.half_width * 2,
                (tower.half_width / 2).max(1),
                GOAL_BASE_COLOR,
            );
            tower.draw(frame, GOAL_COLOR);
        }
    }
}

/// Screen-space footprint of a thin vertical tower.
struct Tower {
    cx: i32,
    y_bottom: i32,
    y_top: i32,
    half_width: i32,
    ball_radius: i32,
}

impl Tower {
    /// Visibility test and projection shared by landmarks and the goal
    /// marker. Uses the same circle frustum test as obstacles.
    fn project(
        proj: &Projector,
        center: CameraPoint,
        height: f64,
        radius: f64,
        cfg: &RenderConfig,
    ) -> Option<Self> {
        let bearing = wrap_angle(center.local_y.atan2(center.local_x));
        if center.local_x <= cfg.near_plane_epsilon
            || center.distance >= cfg.view_distance
            || bearing.abs() >= cfg.hfov_radians() / 2.0
        {
            return None;
        }
        let scale = proj.scale_at_depth(center.local_x);
        Some(Self {
            cx: proj.project_x(center.local_y, center.local_x).round() as i32,
            y_bottom: proj.project_y_ground(center.local_x).round() as i32,
            y_top: proj.project_y_at_height(center.local_x, height).round() as i32,
            half_width: ((radius * scale).round() as i32).max(1),
            ball_radius: ((2.0 * radius * scale).round() as i32).max(2),
        })
    }

    fn draw(&self, frame: &mut FrameRgb, color: Rgb8) {
        let shaft = [
            Point::new(f64::from(self.cx - self.half_width), f64::from(self.y_top)),
            Point::new(f64::from(self.cx + self.half_width), f64::from(self.y_top)),
            Point::new(f64::from(self.cx + self.half_width), f64::from(self.y_bottom)),
            Point::new(f64::from(self.cx - self.half_width), f64::from(self.y_bottom)),
        ];
        frame.fill_polygon(&shaft, color);
        // Marker ball above the shaft.
        frame.fill_ellipse(self.cx, self.y_top, self.ball_radius, self.ball_radius, color);
    }
}

/// Soft glow at a fixed world bearing, drawn in the sky band.
fn draw_sun_glow(frame: &mut FrameRgb, proj: &Projector, pose: &Pose2D, cfg: &RenderConfig) {
    let relative = angle_diff(SUN_BEARING, pose.theta);
    if relative.abs() >= cfg.hfov_radians() / 2.0 {
        return;
    }
    let sx = proj.project_bearing_x(relative).round() as i32;
    let sy = (proj.horizon_y() * 0.35) as i32;
    frame.blend_circle(sx, sy, 40, SUN_COLOR, 0.15);
    frame.blend_circle(sx, sy, 25, SUN_COLOR, 0.25);
    frame.blend_circle(sx, sy, 14, SUN_COLOR, 0.8);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (RenderConfig, Projector) {
        let cfg = RenderConfig::default();
        let proj = Projector::new(&cfg);
        (cfg, proj)
    }

    fn pt(local_x: f64, local_y: f64) -> CameraPoint {
        CameraPoint {
            local_x,
            local_y,
            distance: (local_x * local_x + local_y * local_y).sqrt(),
        }
    }

    #[test]
    fn tower_behind_or_outside_fov_is_culled() {
        let (cfg, proj) = setup();
        assert!(Tower::project(&proj, pt(-3.0, 0.0), 5.0, 0.15, &cfg).is_none());
        assert!(Tower::project(&proj, pt(2.0, 10.0), 5.0, 0.15, &cfg).is_none());
        assert!(Tower::project(&proj, pt(60.0, 0.0), 5.0, 0.15, &cfg).is_none());
        assert!(Tower::project(&proj, pt(10.0, 0.0), 5.0, 0.15, &cfg).is_some());
    }

    #[test]
    fn tower_top_rises_above_its_base() {
        let (cfg, proj) = setup();
        let tower = Tower::project(&proj, pt(8.0, 0.0), 5.0, 0.15, &cfg).unwrap();
        assert!(tower.y_top < tower.y_bottom);
        assert!(tower.half_width >= 1);
    }

    #[test]
    fn sun_glow_tracks_heading() {
        let (cfg, proj) = setup();
        // Facing the sun bearing: glow lands on the image center column.
        let mut facing = FrameRgb::new(cfg.image_width, cfg.image_height);
        let pose = Pose2D { x: 0.0, y: 0.0, theta: SUN_BEARING };
        draw_sun_glow(&mut facing, &proj, &pose, &cfg);
        assert_ne!(facing.get_pixel(320, (proj.horizon_y() * 0.35) as i32), Some(Rgb8::new(0, 0, 0)));

        // Facing away: nothing drawn.
        let mut away = FrameRgb::new(cfg.image_width, cfg.image_height);
        let pose = Pose2D { x: 0.0, y: 0.0, theta: SUN_BEARING + std::f64::consts::PI };
        draw_sun_glow(&mut away, &proj, &pose, &cfg);
        assert!(away.data.iter().all(|&b| b == 0));
    }
}
