use std::{collections::HashMap, fs::File, io::BufReader, path::Path};

use anyhow::Context as _;
use kurbo::Point;

use crate::foundation::error::{NavcamError, NavcamResult};

/// World-frame robot pose at one step. `theta` is a planar heading in radians
/// with no enforced normalization range.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

/// Commanded velocity for one step.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Action {
    #[serde(default)]
    pub linear: f64,
    #[serde(default)]
    pub angular: f64,
}

/// Obstacle velocity as recorded. Some recorders emit a scalar speed, others a
/// `[vx, vy]` pair; the renderer consumes neither, so both are tolerated.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Velocity {
    Scalar(f64),
    Components(Vec<f64>),
}

impl Default for Velocity {
    fn default() -> Self {
        Velocity::Components(vec![0.0, 0.0])
    }
}

/// One recorded sample of a dynamic obstacle's trajectory.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrajectorySample {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub velocity: Velocity,
}

fn default_radius() -> f64 {
    0.5
}

/// Static description of one obstacle.
///
/// `vertices` holds two parallel coordinate lists forming a closed polygon
/// ring; obstacles without a usable ring render as cylinders of `radius`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ObstacleDef {
    pub id: u64,
    pub initial_center: [f64; 2],
    #[serde(default = "default_radius")]
    pub radius: f64,
    #[serde(default)]
    pub vertices: Option<[Vec<f64>; 2]>,
    #[serde(default)]
    pub is_dynamic: bool,
}

impl ObstacleDef {
    /// The polygon ring as world points, or `None` when the obstacle has no
    /// usable polygon (fewer than 3 vertices, or mismatched coordinate lists).
    pub fn polygon_ring(&self) -> Option<Vec<Point>> {
        let [xs, ys] = self.vertices.as_ref()?;
        if xs.len() < 3 || xs.len() != ys.len() {
            return None;
        }
        Some(
            xs.iter()
                .zip(ys.iter())
                .map(|(&x, &y)| Point::new(x, y))
                .collect(),
        )
    }

    /// Large obstacles are treated as walls for height and palette selection.
    pub fn is_wall(&self, wall_radius_threshold: f64) -> bool {
        self.radius > wall_radius_threshold
    }
}

/// Loosely-typed episode summary block; every field is optional in the input.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EpisodeMetadata {
    pub finish: Option<bool>,
    pub status: Option<String>,
    pub success: Option<f64>,
    pub collision_count: Option<u64>,
    pub total_step: Option<u64>,
    pub duration: Option<f64>,
}

/// One complete recorded navigation run, as produced by the episode recorder.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct EpisodeRecord {
    #[serde(default)]
    pub robot_trajectory: Vec<Pose2D>,
    #[serde(default)]
    pub initial_obstacles: Vec<ObstacleDef>,
    #[serde(default)]
    pub obstacle_trajectories: HashMap<String, Vec<TrajectorySample>>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub metadata: EpisodeMetadata,
}

impl EpisodeRecord {
    pub fn from_json_file(path: impl AsRef<Path>) -> NavcamResult<Self> {
        let path = path.as_ref();
        let f = File::open(path)
            .with_context(|| format!("open episode record '{}'", path.display()))?;
        let record: EpisodeRecord = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| NavcamError::serde(format!("parse episode record: {e}")))?;
        Ok(record)
    }

    /// Number of renderable steps (one frame per robot pose).
    pub fn len_steps(&self) -> usize {
        self.robot_trajectory.len()
    }

    pub fn trajectory_for(&self, id: u64) -> Option<&[TrajectorySample]> {
        self.obstacle_trajectories
            .get(&id.to_string())
            .map(Vec::as_slice)
    }

    /// World-frame center of `obs` at `step`.
    ///
    /// Dynamic obstacles follow their recorded trajectory; past its end (or
    /// when no trajectory was recorded) the obstacle freezes at its initial
    /// placement rather than extrapolating.
    pub fn obstacle_center(&self, obs: &ObstacleDef, step: usize) -> Point {
        if obs.is_dynamic
            && let Some(traj) = self.trajectory_for(obs.id)
            && let Some(sample) = traj.get(step)
        {
            return Point::new(sample.x, sample.y);
        }
        Point::new(obs.initial_center[0], obs.initial_center[1])
    }

    /// Rigid-translation displacement of `obs` at `step`, relative to its
    /// initial center. Always derived from the initial vertex set, never
    /// accumulated frame-over-frame.
    pub fn obstacle_displacement(&self, obs: &ObstacleDef, step: usize) -> (f64, f64) {
        let center = self.obstacle_center(obs, step);
        (
            center.x - obs.initial_center[0],
            center.y - obs.initial_center[1],
        )
    }

    /// Commanded action at `step`, zero when the action log is shorter than
    /// the trajectory.
    pub fn action(&self, step: usize) -> Action {
        self.actions.get(step).copied().unwrap_or_default()
    }

    /// Trajectory ids that reference no obstacle in `initial_obstacles`.
    /// These are skipped during rendering, never fatal.
    pub fn orphan_trajectory_ids(&self) -> Vec<&str> {
        self.obstacle_trajectories
            .keys()
            .filter(|key| {
                key.parse::<u64>()
                    .map(|id| !self.initial_obstacles.iter().any(|o| o.id == id))
                    .unwrap_or(true)
            })
            .map(String::as_str)
            .collect()
    }
}
