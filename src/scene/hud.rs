use crate::{
    episode::{EpisodeRecord, Pose2D},
    raster::{FrameRgb, Rgb8},
};

const PANEL_BORDER: Rgb8 = Rgb8::new(100, 150, 200);
const TEXT_COLOR: Rgb8 = Rgb8::new(255, 255, 255);
const ARROW_COLOR: Rgb8 = Rgb8::new(100, 255, 100);
const PANEL_ALPHA: f64 = 0.6;

const COMPASS_RADIUS: i32 = 30;

/// Draw the translucent info panel and the heading compass. Always the last
/// layer, over all scene geometry.
pub fn draw_hud(
    frame: &mut FrameRgb,
    record: &EpisodeRecord,
    pose: &Pose2D,
    step: usize,
) {
    let action = record.action(step);
    let lines = [
        format!("STEP: {}/{}", step + 1, record.len_steps()),
        format!("POS: ({:.2}, {:.2})", pose.x, pose.y),
        format!("THETA: {:.1} DEG", pose.theta.to_degrees()),
        format!("V: {:.2} M/S", action.linear),
        format!("W: {:.2} RAD/S", action.angular),
    ];

    frame.blend_rect(10, 10, 300, 130, Rgb8::new(0, 0, 0), PANEL_ALPHA);
    frame.stroke_rect(10, 10, 300, 130, PANEL_BORDER);
    for (i, line) in lines.iter().enumerate() {
        frame.draw_text(20, 26 + 20 * i as i32, line, TEXT_COLOR);
    }

    draw_compass(frame, pose.theta);
}

/// Compass in the top-right corner: the arrow points up when the robot faces
/// world north (theta = pi/2 puts world +y up on screen).
fn draw_compass(frame: &mut FrameRgb, theta: f64) {
    let cx = frame.width as i32 - 70;
    let cy = 50;
    let r = COMPASS_RADIUS;

    frame.blend_circle(cx, cy, r, Rgb8::new(0, 0, 0), PANEL_ALPHA);
    frame.stroke_ellipse(cx, cy, r, r, PANEL_BORDER);

    let len = f64::from(r - 8);
    let (sin_a, cos_a) = (theta - std::f64::consts::FRAC_PI_2).sin_cos();
    frame.draw_arrow(
        cx,
        cy,
        cx + (len * cos_a).round() as i32,
        cy + (len * sin_a).round() as i32,
        ARROW_COLOR,
    );
    frame.draw_text(cx - 2, cy - r - 12, "N", TEXT_COLOR);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_and_record() -> (FrameRgb, EpisodeRecord) {
        let record = EpisodeRecord {
            robot_trajectory: vec![
                Pose2D { x: 1.5, y: -2.25, theta: 0.4 },
                Pose2D { x: 2.0, y: -2.0, theta: 0.5 },
            ],
            ..EpisodeRecord::default()
        };
        (FrameRgb::new(640, 480), record)
    }

    #[test]
    fn panel_darkens_its_corner_of_the_frame() {
        let (mut frame, record) = frame_and_record();
        // Start from a mid-gray background so blending is observable.
        frame.data.fill(128);
        let pose = record.robot_trajectory[0];
        draw_hud(&mut frame, &record, &pose, 0);

        let inside = frame.get_pixel(150, 70).unwrap();
        assert!(inside.r < 128);
        // Well outside the panel and compass, untouched.
        assert_eq!(frame.get_pixel(320, 400), Some(Rgb8::new(128, 128, 128)));
    }

    #[test]
    fn compass_is_drawn_in_the_top_right() {
        let (mut frame, record) = frame_and_record();
        frame.data.fill(128);
        let pose = record.robot_trajectory[0];
        draw_hud(&mut frame, &record, &pose, 0);

        let center = frame.get_pixel(640 - 70, 50).unwrap();
        assert!(center.r < 128 || center.g > 128);
    }

    #[test]
    fn missing_action_renders_as_zero_velocity() {
        // No actions recorded at all; the HUD must not panic and must render
        // the zero-velocity text path.
        let (mut frame, record) = frame_and_record();
        let pose = record.robot_trajectory[1];
        draw_hud(&mut frame, &record, &pose, 1);
        assert!(frame.data.iter().any(|&b| b != 0));
    }
}
