use kurbo::Point;

use crate::{
    camera::{CameraPoint, Projector},
    clip::VisibleEdge,
    config::RenderConfig,
    depth::{ObstacleShape, VisibleObstacle},
    raster::{FrameRgb, Rgb8},
};

/// Directional light in camera plan coordinates (forward, right), normalized.
/// Fixed relative to the camera, so lighting reads consistently regardless of
/// the robot's heading.
const LIGHT_DIR: (f64, f64) = (std::f64::consts::FRAC_1_SQRT_2, std::f64::consts::FRAC_1_SQRT_2);

/// Distance over which depth fog darkens geometry.
const FOG_FALLOFF: f64 = 70.0;

/// Angular segments used to shade the visible half of a cylinder.
const CYLINDER_WEDGES: usize = 8;

const SHADOW_COLOR: Rgb8 = Rgb8::new(40, 45, 40);

/// Base palette keyed by `(is_wall, is_dynamic)` only.
pub fn base_color(is_wall: bool, is_dynamic: bool) -> Rgb8 {
    match (is_wall, is_dynamic) {
        (true, false) => Rgb8::new(200, 200, 210),
        (true, true) => Rgb8::new(100, 180, 255),
        (false, false) => Rgb8::new(255, 120, 60),
        (false, true) => Rgb8::new(255, 180, 0),
    }
}

/// Extruded height for a polygon obstacle class. Cylinders always use the
/// standard obstacle height; their wall classification only picks the color.
fn extruded_height(is_wall: bool, cfg: &RenderConfig) -> f64 {
    if is_wall { cfg.wall_height } else { cfg.obstacle_height }
}

/// Lambert-style face brightness with a floor so back faces stay readable.
fn face_brightness(normal: (f64, f64)) -> f64 {
    let dot = normal.0 * LIGHT_DIR.0 + normal.1 * LIGHT_DIR.1;
    0.4 + 0.6 * dot.abs()
}

fn fog_factor(distance: f64) -> f64 {
    (1.0 - distance / FOG_FALLOFF).clamp(0.4, 1.0)
}

/// Rasterize one depth-sorted obstacle into `frame`.
pub fn draw_obstacle(
    frame: &mut FrameRgb,
    proj: &Projector,
    obstacle: &VisibleObstacle,
    cfg: &RenderConfig,
) {
    let base = base_color(obstacle.is_wall, obstacle.is_dynamic);
    match &obstacle.shape {
        ObstacleShape::Polygon { edges } => {
            let height = extruded_height(obstacle.is_wall, cfg);
            for edge in edges {
                draw_wall_face(frame, proj, edge, height, base);
            }
        }
        ObstacleShape::Circle { center, radius } => {
            draw_cylinder(frame, proj, *center, *radius, cfg.obstacle_height, base);
        }
    }
}

/// Draw one clipped wall edge as a screen quad spanning ground to `height`.
fn draw_wall_face(
    frame: &mut FrameRgb,
    proj: &Projector,
    edge: &VisibleEdge,
    height: f64,
    base: Rgb8,
) {
    let x1 = proj.project_x(edge.a.local_y, edge.a.local_x);
    let x2 = proj.project_x(edge.b.local_y, edge.b.local_x);

    // Entirely off one side of the screen.
    let width = frame.width as f64;
    if (x1 < 0.0 && x2 < 0.0) || (x1 >= width && x2 >= width) {
        return;
    }

    let quad = [
        Point::new(x1, proj.project_y_ground(edge.a.local_x)),
        Point::new(x2, proj.project_y_ground(edge.b.local_x)),
        Point::new(x2, proj.project_y_at_height(edge.b.local_x, height)),
        Point::new(x1, proj.project_y_at_height(edge.a.local_x, height)),
    ];

    // Edge normal in plan view drives the directional shading.
    let ex = edge.b.local_x - edge.a.local_x;
    let ey = edge.b.local_y - edge.a.local_y;
    let len = (ex * ex + ey * ey).sqrt();
    let brightness = if len > 1e-12 {
        face_brightness((-ey / len, ex / len))
    } else {
        1.0
    };

    let avg_distance = (edge.a.distance + edge.b.distance) / 2.0;
    let shade = brightness * fog_factor(avg_distance);

    frame.fill_polygon(&quad, base.scaled(shade));
    frame.stroke_polygon(&quad, base.scaled(shade * 0.5));
}

/// Draw a cylindrical obstacle: shaded angular wedges for the body, a top
/// ellipse, an offset highlight and a ground-contact shadow.
fn draw_cylinder(
    frame: &mut FrameRgb,
    proj: &Projector,
    center: CameraPoint,
    radius: f64,
    height: f64,
    base: Rgb8,
) {
    let cx = proj.project_x(center.local_y, center.local_x);
    let y_bottom = proj.project_y_ground(center.local_x);
    let y_top = proj.project_y_at_height(center.local_x, height);
    let screen_radius = radius * proj.scale_at_depth(center.local_x);
    if screen_radius < 2.0 {
        return;
    }

    let fog = fog_factor(center.distance);
    let r = screen_radius.round() as i32;
    let cx_i = cx.round() as i32;
    let yb = y_bottom.round() as i32;
    let yt = y_top.round() as i32;
    let body_h = (yb - yt).max(1);

    // Ground-contact shadow, offset toward the lower right.
    frame.fill_ellipse(cx_i + 2, yb + 2, r, (r / 6).max(1), SHADOW_COLOR);

    // Body as angular wedges over the visible half. The surface normal at a
    // wedge rotates from the axis-to-camera direction; shading each wedge by
    // that normal gives the rounded look without a real light pass.
    let toward_camera = if center.distance > 1e-9 {
        (-center.local_x / center.distance, -center.local_y / center.distance)
    } else {
        (-1.0, 0.0)
    };
    for w in 0..CYLINDER_WEDGES {
        let phi1 = -std::f64::consts::FRAC_PI_2
            + std::f64::consts::PI * w as f64 / CYLINDER_WEDGES as f64;
        let phi2 = phi1 + std::f64::consts::PI / CYLINDER_WEDGES as f64;
        let mid = (phi1 + phi2) / 2.0;

        let (sin_m, cos_m) = mid.sin_cos();
        let normal = (
            toward_camera.0 * cos_m - toward_camera.1 * sin_m,
            toward_camera.0 * sin_m + toward_camera.1 * cos_m,
        );
        let shade = face_brightness(normal) * fog;

        let wx1 = cx_i + (screen_radius * phi1.sin()).round() as i32;
        let wx2 = cx_i + (screen_radius * phi2.sin()).round() as i32;
        let quad = [
            Point::new(f64::from(wx1), f64::from(yt)),
            Point::new(f64::from(wx2), f64::from(yt)),
            Point::new(f64::from(wx2), f64::from(yb)),
            Point::new(f64::from(wx1), f64::from(yb)),
        ];
        frame.fill_polygon(&quad, base.scaled(shade));
    }

    // Top cap.
    let cap = base.scaled(fog);
    frame.fill_ellipse(cx_i, yt, r, (r / 5).max(2), cap);

    // Highlight ellipse offset up-left of center.
    let mid_y = (yt + yb) / 2;
    frame.fill_ellipse(
        cx_i - r / 3,
        mid_y - body_h / 6,
        (r / 3).max(1),
        (body_h / 6).max(1),
        base.scaled((fog * 1.3).min(1.3)),
    );

    // Silhouette sides.
    let rim = base.scaled(fog * 0.5);
    frame.draw_line(cx_i - r, yt, cx_i - r, yb, rim);
    frame.draw_line(cx_i + r, yt, cx_i + r, yb, rim);
}
