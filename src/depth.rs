use kurbo::Point;

use crate::{
    camera::{CameraPoint, world_to_camera},
    clip::{EdgeList, clip_polygon_edges},
    config::RenderConfig,
    episode::{EpisodeRecord, Pose2D},
    foundation::math::wrap_angle,
};

/// Camera-space geometry of one obstacle that passed its visibility test.
#[derive(Clone, Debug)]
pub enum ObstacleShape {
    /// Near-plane-clipped wall edges of a polygon obstacle.
    Polygon { edges: EdgeList },
    /// A cylindrical obstacle, represented by its center and world radius.
    Circle { center: CameraPoint, radius: f64 },
}

/// One obstacle scheduled for rasterization this frame.
#[derive(Clone, Debug)]
pub struct VisibleObstacle {
    pub shape: ObstacleShape,
    /// Representative distance used for painter's-algorithm ordering:
    /// minimum vertex distance for polygons, center range for circles.
    pub depth: f64,
    pub is_wall: bool,
    pub is_dynamic: bool,
}

/// Collect, clip and depth-sort the obstacles visible from `pose` at `step`.
///
/// The result is ordered by strictly descending representative distance so the
/// rasterizer can paint farthest-first and let nearer geometry overwrite
/// farther geometry wherever screen footprints overlap. There is no depth
/// buffer; interpenetrating or non-convex obstacles may mis-occlude, which is
/// an accepted limitation of the painter's algorithm.
pub fn collect_visible_obstacles(
    record: &EpisodeRecord,
    pose: &Pose2D,
    step: usize,
    cfg: &RenderConfig,
) -> Vec<VisibleObstacle> {
    let eps = cfg.near_plane_epsilon;
    let half_fov = cfg.hfov_radians() / 2.0;
    let mut out = Vec::new();

    for obs in &record.initial_obstacles {
        let is_wall = obs.is_wall(cfg.wall_radius_threshold);

        if let Some(ring) = obs.polygon_ring() {
            let (dx, dy) = record.obstacle_displacement(obs, step);
            let mut min_distance = f64::INFINITY;
            let camera_ring: Vec<CameraPoint> = ring
                .iter()
                .map(|v| {
                    let p = world_to_camera(Point::new(v.x + dx, v.y + dy), pose);
                    min_distance = min_distance.min(p.distance);
                    p
                })
                .collect();

            let edges = clip_polygon_edges(&camera_ring, eps);
            if edges.is_empty() {
                continue;
            }
            out.push(VisibleObstacle {
                shape: ObstacleShape::Polygon { edges },
                depth: min_distance,
                is_wall,
                is_dynamic: obs.is_dynamic,
            });
        } else {
            let center = world_to_camera(record.obstacle_center(obs, step), pose);
            // Circles have no edges to clip, so visibility is a direct
            // angular test against the half-FOV.
            let bearing = wrap_angle(center.local_y.atan2(center.local_x));
            if center.local_x > eps
                && center.distance < cfg.view_distance
                && bearing.abs() < half_fov
            {
                out.push(VisibleObstacle {
                    shape: ObstacleShape::Circle {
                        center,
                        radius: obs.radius,
                    },
                    depth: center.distance,
                    is_wall,
                    is_dynamic: obs.is_dynamic,
                });
            }
        }
    }

    out.sort_by(|a, b| b.depth.total_cmp(&a.depth));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::episode::ObstacleDef;

    fn circle(id: u64, x: f64, y: f64) -> ObstacleDef {
        ObstacleDef {
            id,
            initial_center: [x, y],
            radius: 0.5,
            vertices: None,
            is_dynamic: false,
        }
    }

    fn record_with(obstacles: Vec<ObstacleDef>) -> EpisodeRecord {
        EpisodeRecord {
            robot_trajectory: vec![Pose2D {
                x: 0.0,
                y: 0.0,
                theta: 0.0,
            }],
            initial_obstacles: obstacles,
            ..EpisodeRecord::default()
        }
    }

    fn origin_pose() -> Pose2D {
        Pose2D {
            x: 0.0,
            y: 0.0,
            theta: 0.0,
        }
    }

    #[test]
    fn obstacles_sort_by_descending_depth() {
        let record = record_with(vec![circle(0, 5.0, 0.0), circle(1, 15.0, 0.0), circle(2, 10.0, 0.0)]);
        let visible = collect_visible_obstacles(&record, &origin_pose(), 0, &RenderConfig::default());
        let depths: Vec<f64> = visible.iter().map(|v| v.depth).collect();
        assert_eq!(depths, vec![15.0, 10.0, 5.0]);
    }

    #[test]
    fn circle_behind_the_camera_is_invisible() {
        let record = record_with(vec![circle(0, -5.0, 0.0)]);
        let visible = collect_visible_obstacles(&record, &origin_pose(), 0, &RenderConfig::default());
        assert!(visible.is_empty());
    }

    #[test]
    fn circle_outside_the_half_fov_is_invisible() {
        // Default FOV is 90 degrees; a point at 60 degrees off-axis is out.
        let record = record_with(vec![circle(0, 2.0, 2.0 * 60f64.to_radians().tan())]);
        let visible = collect_visible_obstacles(&record, &origin_pose(), 0, &RenderConfig::default());
        assert!(visible.is_empty());
    }

    #[test]
    fn circle_beyond_view_distance_is_invisible() {
        let record = record_with(vec![circle(0, 60.0, 0.0)]);
        let visible = collect_visible_obstacles(&record, &origin_pose(), 0, &RenderConfig::default());
        assert!(visible.is_empty());
    }

    #[test]
    fn polygon_fully_behind_is_skipped_entirely() {
        let mut obs = circle(0, -5.0, 0.0);
        obs.vertices = Some([vec![-6.0, -4.0, -4.0, -6.0], vec![-1.0, -1.0, 1.0, 1.0]]);
        let record = record_with(vec![obs]);
        let visible = collect_visible_obstacles(&record, &origin_pose(), 0, &RenderConfig::default());
        assert!(visible.is_empty());
    }

    #[test]
    fn polygon_depth_is_minimum_vertex_distance() {
        let mut obs = circle(0, 5.0, 0.0);
        obs.vertices = Some([vec![4.0, 6.0, 6.0, 4.0], vec![-1.0, -1.0, 1.0, 1.0]]);
        let record = record_with(vec![obs]);
        let visible = collect_visible_obstacles(&record, &origin_pose(), 0, &RenderConfig::default());
        assert_eq!(visible.len(), 1);
        assert!((visible[0].depth - (4.0f64 * 4.0 + 1.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn wall_classification_follows_radius_threshold() {
        let mut wall = circle(0, 10.0, 0.0);
        wall.radius = 12.0;
        let record = record_with(vec![wall]);
        let visible = collect_visible_obstacles(&record, &origin_pose(), 0, &RenderConfig::default());
        assert!(visible[0].is_wall);
    }
}
