use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::Context as _;
use kurbo::Point;
use tracing::info;

use crate::episode::{Action, EpisodeRecord, Pose2D};
use crate::foundation::error::{NavcamError, NavcamResult};
use crate::raster::{FrameRgb, Rgb8};

/// Per-episode task summary written next to the video.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TaskMetadata {
    pub finish: bool,
    pub status: String,
    pub success: f64,
    pub collision_count: u64,
    pub total_step: u64,
    pub duration: f64,
    pub instruction: String,
    pub controller_type: String,
    pub room_size: f64,
    pub num_obstacles: usize,
}

impl TaskMetadata {
    /// Summarize `record`, falling back to derived values where the recorder
    /// left the metadata block empty.
    pub fn from_record(record: &EpisodeRecord) -> Self {
        let meta = &record.metadata;
        let steps = record.len_steps();
        let room_size = estimate_room_size(record);
        let num_obstacles = record.initial_obstacles.len();
        Self {
            finish: meta.finish.unwrap_or(true),
            status: meta.status.clone().unwrap_or_else(|| "Normal".to_owned()),
            success: meta.success.unwrap_or(1.0),
            collision_count: meta.collision_count.unwrap_or(0),
            total_step: meta.total_step.unwrap_or(steps as u64),
            duration: meta.duration.unwrap_or(steps as f64 * 0.1),
            instruction: format!(
                "Navigate in a {room_size:.1}m room with {num_obstacles} obstacles using NeuPAN controller."
            ),
            controller_type: "neupan".to_owned(),
            room_size,
            num_obstacles,
        }
    }
}

/// Per-step pose and commanded velocity, written as one JSON array.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct StepInfo {
    /// 1-based step number.
    pub step: usize,
    pub position: Pose2D,
    pub velocity: Action,
    pub collision: bool,
}

/// Side length of the traversed area with a margin, used for the task
/// instruction. Degenerate trajectories get a nominal size.
pub fn estimate_room_size(record: &EpisodeRecord) -> f64 {
    let traj = &record.robot_trajectory;
    if traj.is_empty() {
        return 10.0;
    }
    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for pose in traj {
        x_min = x_min.min(pose.x);
        x_max = x_max.max(pose.x);
        y_min = y_min.min(pose.y);
        y_max = y_max.max(pose.y);
    }
    (x_max - x_min).max(y_max - y_min) * 1.2
}

/// Write the task metadata JSON for `record`.
pub fn write_task_metadata(record: &EpisodeRecord, path: &Path) -> NavcamResult<()> {
    let meta = TaskMetadata::from_record(record);
    write_json(&meta, path)?;
    info!(out = %path.display(), "task metadata written");
    Ok(())
}

/// Write the per-step info JSON for `record`.
pub fn write_step_info(record: &EpisodeRecord, path: &Path) -> NavcamResult<()> {
    let steps: Vec<StepInfo> = record
        .robot_trajectory
        .iter()
        .enumerate()
        .map(|(i, pose)| StepInfo {
            step: i + 1,
            position: *pose,
            velocity: record.action(i),
            collision: false,
        })
        .collect();
    write_json(&steps, path)?;
    info!(out = %path.display(), steps = steps.len(), "step info written");
    Ok(())
}

fn write_json<T: serde::Serialize>(value: &T, path: &Path) -> NavcamResult<()> {
    let f = File::create(path).with_context(|| format!("create '{}'", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(f), value)
        .map_err(|e| NavcamError::serde(format!("write '{}': {e}", path.display())))?;
    Ok(())
}

const MAP_GRID_COLOR: Rgb8 = Rgb8::new(220, 220, 220);
const MAP_OBSTACLE_FILL: Rgb8 = Rgb8::new(180, 180, 255);
const MAP_OBSTACLE_EDGE: Rgb8 = Rgb8::new(150, 150, 200);
const MAP_PATH_COLOR: Rgb8 = Rgb8::new(100, 100, 255);
const MAP_START_COLOR: Rgb8 = Rgb8::new(100, 255, 100);
const MAP_END_COLOR: Rgb8 = Rgb8::new(255, 100, 100);

/// Minimum scene-map side length; the fixed 50-pixel border and the text
/// legend need at least this much room.
const MIN_MAP_SIZE: u32 = 200;

/// Orthographic top view of the whole episode: grid, obstacles at their
/// initial placement, the robot path and start/end markers. `size` below
/// [`MIN_MAP_SIZE`] is raised to it.
pub fn render_scene_map(record: &EpisodeRecord, size: u32) -> NavcamResult<FrameRgb> {
    let size = size.max(MIN_MAP_SIZE);
    let mut xs: Vec<f64> = record.robot_trajectory.iter().map(|p| p.x).collect();
    let mut ys: Vec<f64> = record.robot_trajectory.iter().map(|p| p.y).collect();
    for obs in &record.initial_obstacles {
        xs.push(obs.initial_center[0]);
        ys.push(obs.initial_center[1]);
    }
    if xs.is_empty() {
        return Err(NavcamError::episode("episode has no geometry to map"));
    }

    let margin = 5.0;
    let fold = |v: &[f64]| {
        (
            v.iter().copied().fold(f64::INFINITY, f64::min) - margin,
            v.iter().copied().fold(f64::NEG_INFINITY, f64::max) + margin,
        )
    };
    let (x_min, x_max) = fold(&xs);
    let (y_min, y_max) = fold(&ys);

    let inner = f64::from(size - 100);
    let to_pixel = |x: f64, y: f64| {
        (
            ((x - x_min) / (x_max - x_min) * inner + 50.0) as i32,
            // World +y points up on the map.
            ((y_max - y) / (y_max - y_min) * inner + 50.0) as i32,
        )
    };

    let mut map = FrameRgb::new(size, size);
    map.data.fill(255);

    // Coarse reference grid, one line per tenth of the extent.
    for i in 0..10 {
        let x = x_min + (x_max - x_min) * f64::from(i) / 10.0;
        let y = y_min + (y_max - y_min) * f64::from(i) / 10.0;
        let (px, _) = to_pixel(x, y_min);
        map.draw_line(px, 0, px, size as i32 - 1, MAP_GRID_COLOR);
        let (_, py) = to_pixel(x_min, y);
        map.draw_line(0, py, size as i32 - 1, py, MAP_GRID_COLOR);
    }

    for obs in &record.initial_obstacles {
        if let Some(ring) = obs.polygon_ring() {
            let pts: Vec<Point> = ring
                .iter()
                .map(|v| {
                    let (px, py) = to_pixel(v.x, v.y);
                    Point::new(f64::from(px), f64::from(py))
                })
                .collect();
            map.fill_polygon(&pts, MAP_OBSTACLE_FILL);
            map.stroke_polygon(&pts, MAP_OBSTACLE_EDGE);
        } else {
            let (px, py) = to_pixel(obs.initial_center[0], obs.initial_center[1]);
            let pr = ((obs.radius / (x_max - x_min)) * inner) as i32;
            map.fill_ellipse(px, py, pr.max(2), pr.max(2), MAP_OBSTACLE_FILL);
            map.stroke_ellipse(px, py, pr.max(2), pr.max(2), MAP_OBSTACLE_EDGE);
        }
    }

    let mut prev: Option<(i32, i32)> = None;
    for pose in &record.robot_trajectory {
        let (px, py) = to_pixel(pose.x, pose.y);
        if let Some((qx, qy)) = prev {
            map.draw_line_thick(qx, qy, px, py, 2, MAP_PATH_COLOR);
        }
        prev = Some((px, py));
    }

    if let (Some(start), Some(end)) = (
        record.robot_trajectory.first(),
        record.robot_trajectory.last(),
    ) {
        let (sx, sy) = to_pixel(start.x, start.y);
        let (ex, ey) = to_pixel(end.x, end.y);
        map.fill_ellipse(sx, sy, 8, 8, MAP_START_COLOR);
        map.fill_ellipse(ex, ey, 8, 8, MAP_END_COLOR);
    }

    map.draw_text(20, size as i32 - 60, "START", MAP_START_COLOR);
    map.draw_text(20, size as i32 - 30, "END", MAP_END_COLOR);
    Ok(map)
}

/// Render and save the scene map PNG.
pub fn write_scene_map(record: &EpisodeRecord, path: &Path, size: u32) -> NavcamResult<()> {
    let map = render_scene_map(record, size)?;
    image::save_buffer_with_format(
        path,
        &map.data,
        map.width,
        map.height,
        image::ColorType::Rgb8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("save scene map '{}'", path.display()))?;
    info!(out = %path.display(), "scene map written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::episode::ObstacleDef;

    fn record() -> EpisodeRecord {
        EpisodeRecord {
            robot_trajectory: vec![
                Pose2D { x: 0.0, y: 0.0, theta: 0.0 },
                Pose2D { x: 4.0, y: 1.0, theta: 0.2 },
                Pose2D { x: 8.0, y: 3.0, theta: 0.3 },
            ],
            initial_obstacles: vec![ObstacleDef {
                id: 0,
                initial_center: [4.0, -2.0],
                radius: 1.0,
                vertices: None,
                is_dynamic: false,
            }],
            actions: vec![Action { linear: 0.5, angular: 0.0 }],
            ..EpisodeRecord::default()
        }
    }

    #[test]
    fn task_metadata_derives_missing_fields() {
        let meta = TaskMetadata::from_record(&record());
        assert_eq!(meta.total_step, 3);
        assert_eq!(meta.num_obstacles, 1);
        assert!((meta.duration - 0.3).abs() < 1e-9);
        assert!(meta.instruction.contains("1 obstacles"));
    }

    #[test]
    fn room_size_spans_the_trajectory_extent() {
        // x range 8.0 dominates, times the 1.2 margin factor.
        assert!((estimate_room_size(&record()) - 9.6).abs() < 1e-9);
        assert_eq!(estimate_room_size(&EpisodeRecord::default()), 10.0);
    }

    #[test]
    fn step_info_is_one_based_with_zero_velocity_fallback() {
        let rec = record();
        let steps: Vec<StepInfo> = rec
            .robot_trajectory
            .iter()
            .enumerate()
            .map(|(i, pose)| StepInfo {
                step: i + 1,
                position: *pose,
                velocity: rec.action(i),
                collision: false,
            })
            .collect();
        assert_eq!(steps[0].step, 1);
        assert_eq!(steps[0].velocity.linear, 0.5);
        // Action log shorter than the trajectory: zero velocity.
        assert_eq!(steps[2].velocity, Action::default());
    }

    #[test]
    fn scene_map_renders_path_and_markers() {
        let map = render_scene_map(&record(), 400).unwrap();
        assert_eq!(map.width, 400);
        // Not all white.
        assert!(map.data.iter().any(|&b| b != 255));
    }

    #[test]
    fn tiny_map_size_is_raised_to_the_minimum() {
        let map = render_scene_map(&record(), 50).unwrap();
        assert_eq!(map.width, MIN_MAP_SIZE);
        assert_eq!(map.height, MIN_MAP_SIZE);
        assert!(map.data.iter().any(|&b| b != 255));
    }

    #[test]
    fn empty_episode_cannot_be_mapped() {
        assert!(render_scene_map(&EpisodeRecord::default(), 400).is_err());
    }
}
