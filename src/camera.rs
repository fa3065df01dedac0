use kurbo::Point;

use crate::{config::RenderConfig, episode::Pose2D};

/// Fixed downward camera pitch folded into the horizon row, radians.
pub const PITCH_BIAS_RAD: f64 = 0.05;

/// A world point expressed in the camera frame of the current robot pose.
///
/// `local_x` is forward depth, `local_y` is lateral offset (positive toward
/// the robot's right, so increasing `local_y` maps to increasing screen x),
/// and `distance` is the straight-line range to the point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPoint {
    pub local_x: f64,
    pub local_y: f64,
    pub distance: f64,
}

/// Transform a world-frame point into the camera frame of `pose`.
///
/// Applied uniformly to obstacle vertices and centers, grid samples,
/// landmarks and the goal marker.
pub fn world_to_camera(world: Point, pose: &Pose2D) -> CameraPoint {
    displacement_to_camera(world.x - pose.x, world.y - pose.y, pose.theta)
}

/// Transform a displacement already relative to the robot into the camera
/// frame of a robot heading `theta`.
pub fn displacement_to_camera(dx: f64, dy: f64, theta: f64) -> CameraPoint {
    let (sin_nt, cos_nt) = (-theta).sin_cos();
    CameraPoint {
        local_x: dx * cos_nt - dy * sin_nt,
        local_y: -(dx * sin_nt + dy * cos_nt),
        distance: (dx * dx + dy * dy).sqrt(),
    }
}

/// Pinhole projection scalars derived once per render from [`RenderConfig`].
///
/// The vertical focal length deliberately reuses the horizontal one instead
/// of deriving an independent vertical FOV from the aspect ratio. That is an
/// intentional simplification kept for parity with the recorded footage.
#[derive(Clone, Copy, Debug)]
pub struct Projector {
    width: f64,
    height: f64,
    half_fov_tan: f64,
    focal: f64,
    camera_height: f64,
    horizon_y: f64,
}

impl Projector {
    pub fn new(cfg: &RenderConfig) -> Self {
        let half_fov_tan = (cfg.hfov_radians() / 2.0).tan();
        let height = f64::from(cfg.image_height);
        let focal = height / (2.0 * half_fov_tan);
        Self {
            width: f64::from(cfg.image_width),
            height,
            half_fov_tan,
            focal,
            camera_height: cfg.camera_height,
            horizon_y: (height / 2.0 + focal * PITCH_BIAS_RAD.tan()).floor(),
        }
    }

    /// Screen row separating sky from ground.
    pub fn horizon_y(&self) -> f64 {
        self.horizon_y
    }

    /// Project a lateral camera-space offset at forward depth `depth_z` to a
    /// screen column. Non-positive depth returns the screen center rather
    /// than NaN/Inf; the clipper keeps such points out of the hot path.
    pub fn project_x(&self, lateral_y: f64, depth_z: f64) -> f64 {
        if depth_z <= 0.0 {
            return self.width / 2.0;
        }
        self.width / 2.0 + (lateral_y / depth_z) * (self.width / (2.0 * self.half_fov_tan))
    }

    /// Screen row of the ground plane at forward depth `depth_z`, clamped to
    /// the frame.
    pub fn project_y_ground(&self, depth_z: f64) -> f64 {
        self.project_y_at_height(depth_z, 0.0)
    }

    /// Screen row of a point `object_height` above the ground at forward
    /// depth `depth_z`, clamped to the frame.
    pub fn project_y_at_height(&self, depth_z: f64, object_height: f64) -> f64 {
        if depth_z <= 0.01 {
            return self.horizon_y;
        }
        let y = self.horizon_y + self.focal * (self.camera_height - object_height) / depth_z;
        y.clamp(0.0, self.height - 1.0)
    }

    /// Pixels per world unit at forward depth `depth_z`; sizes the screen
    /// radius of cylindrical obstacles.
    pub fn scale_at_depth(&self, depth_z: f64) -> f64 {
        if depth_z <= 0.0 {
            return 0.0;
        }
        self.width / (2.0 * depth_z * self.half_fov_tan)
    }

    /// Screen column of a viewing direction `angle` radians off the camera
    /// axis (positive to the right). Only meaningful inside the half-FOV.
    pub fn project_bearing_x(&self, angle: f64) -> f64 {
        self.width / 2.0 + (angle.tan() / self.half_fov_tan) * self.width / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn projector() -> Projector {
        Projector::new(&RenderConfig::default())
    }

    #[test]
    fn centered_point_projects_to_screen_center() {
        let p = projector();
        assert_eq!(p.project_x(0.0, 5.0), 320.0);
    }

    #[test]
    fn project_x_is_monotonic_in_lateral_offset() {
        let p = projector();
        let mut prev = f64::NEG_INFINITY;
        for i in -50..=50 {
            let x = p.project_x(f64::from(i) * 0.1, 4.0);
            assert!(x >= prev);
            prev = x;
        }
    }

    #[test]
    fn degenerate_depth_is_guarded() {
        let p = projector();
        assert_eq!(p.project_x(3.0, 0.0), 320.0);
        assert_eq!(p.project_x(3.0, -1.0), 320.0);
        assert_eq!(p.project_y_ground(0.0), p.horizon_y());
        assert!(p.project_y_ground(-2.0).is_finite());
    }

    #[test]
    fn ground_rows_rise_toward_horizon_with_depth() {
        let p = projector();
        let near = p.project_y_ground(1.0);
        let far = p.project_y_ground(30.0);
        assert!(near > far);
        assert!(far > p.horizon_y());
    }

    #[test]
    fn tall_objects_project_above_the_ground_row() {
        let p = projector();
        let bottom = p.project_y_ground(5.0);
        let top = p.project_y_at_height(5.0, 2.5);
        assert!(top < bottom);
    }

    #[test]
    fn world_to_camera_axes() {
        let pose = Pose2D {
            x: 0.0,
            y: 0.0,
            theta: 0.0,
        };
        // Point straight ahead.
        let ahead = world_to_camera(Point::new(3.0, 0.0), &pose);
        assert!((ahead.local_x - 3.0).abs() < 1e-12);
        assert!(ahead.local_y.abs() < 1e-12);
        assert!((ahead.distance - 3.0).abs() < 1e-12);

        // Point to the robot's right (negative world y at theta = 0).
        let right = world_to_camera(Point::new(0.0, -2.0), &pose);
        assert!(right.local_x.abs() < 1e-12);
        assert!((right.local_y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn world_to_camera_respects_heading() {
        // Facing +y; a point further along +y is straight ahead.
        let pose = Pose2D {
            x: 1.0,
            y: 1.0,
            theta: FRAC_PI_2,
        };
        let p = world_to_camera(Point::new(1.0, 4.0), &pose);
        assert!((p.local_x - 3.0).abs() < 1e-12);
        assert!(p.local_y.abs() < 1e-9);
    }

    #[test]
    fn heading_wraparound_is_consistent() {
        // theta and theta + 2*pi see the same world.
        let a = Pose2D {
            x: 0.0,
            y: 0.0,
            theta: 0.3,
        };
        let b = Pose2D {
            theta: 0.3 + std::f64::consts::TAU,
            ..a
        };
        let w = Point::new(4.0, -2.0);
        let pa = world_to_camera(w, &a);
        let pb = world_to_camera(w, &b);
        assert!((pa.local_x - pb.local_x).abs() < 1e-9);
        assert!((pa.local_y - pb.local_y).abs() < 1e-9);
    }
}
