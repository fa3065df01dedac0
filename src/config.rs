use crate::foundation::error::{NavcamError, NavcamResult};

/// Renderer configuration surface. Every knob has a default; a config file is
/// only needed to override them.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Horizontal field of view in degrees.
    pub fov_degrees: f64,
    /// Output frame width in pixels.
    pub image_width: u32,
    /// Output frame height in pixels.
    pub image_height: u32,
    /// Output frames per second.
    pub fps: u32,
    /// Camera mounting height above ground, meters.
    pub camera_height: f64,
    /// Extruded height of wall-class obstacles, meters.
    pub wall_height: f64,
    /// Extruded height of small obstacles, meters.
    pub obstacle_height: f64,
    /// Near-plane forward depth below which geometry is clipped, meters.
    pub near_plane_epsilon: f64,
    /// Maximum render distance, meters.
    pub view_distance: f64,
    /// Ground grid pitch, meters.
    pub grid_pitch: f64,
    /// Radius above which an obstacle is classified as a wall. A bare
    /// threshold inherited from the recorded data, not a physical law.
    pub wall_radius_threshold: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 90.0,
            image_width: 640,
            image_height: 480,
            fps: 10,
            camera_height: 1.2,
            wall_height: 2.5,
            obstacle_height: 1.5,
            near_plane_epsilon: 0.1,
            view_distance: 50.0,
            grid_pitch: 2.0,
            wall_radius_threshold: 10.0,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> NavcamResult<()> {
        if self.image_width == 0 || self.image_height == 0 {
            return Err(NavcamError::validation(
                "image width/height must be non-zero",
            ));
        }
        if self.fps == 0 {
            return Err(NavcamError::validation("fps must be non-zero"));
        }
        if !(1.0..180.0).contains(&self.fov_degrees) {
            return Err(NavcamError::validation(
                "fov_degrees must be in [1, 180) degrees",
            ));
        }
        if self.near_plane_epsilon <= 0.0 {
            return Err(NavcamError::validation("near_plane_epsilon must be > 0"));
        }
        if self.view_distance <= self.near_plane_epsilon {
            return Err(NavcamError::validation(
                "view_distance must exceed near_plane_epsilon",
            ));
        }
        if self.grid_pitch <= 0.0 {
            return Err(NavcamError::validation("grid_pitch must be > 0"));
        }
        Ok(())
    }

    /// Horizontal field of view in radians.
    pub fn hfov_radians(&self) -> f64 {
        self.fov_degrees.to_radians()
    }
}
