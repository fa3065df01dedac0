//! Procedural scene layers composed per frame by the assembler.

/// Ground grid anchored to world coordinates.
pub mod grid;
/// Heads-up overlay: info panel and compass.
pub mod hud;
/// World-fixed landmark towers, goal marker and sun glow.
pub mod landmarks;
/// Wall-face and cylinder obstacle shading.
pub mod obstacles;
