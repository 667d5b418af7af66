use glam::{DVec2, DVec3};

use super::geometry::polar;

/// Viewer pose on the grid.
///
/// * `pos` is in grid units, `pos_z` is a fraction of one cell height
///   (0.5 = eye at mid-wall).
/// * `heading` is radians, 0 = +X, counter-clockwise positive.
/// * `pitch` is radians, positive looks up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub pos: DVec2,
    pub pos_z: f64,
    pub heading: f64,
    pub pitch: f64,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            pos: DVec2::new(1.0, 1.0),
            pos_z: 0.5,
            heading: 0.0,
            pitch: 0.0,
        }
    }
}

impl CameraPose {
    pub fn new(pos: DVec2, pos_z: f64, heading: f64, pitch: f64) -> Self {
        Self {
            pos,
            pos_z,
            heading,
            pitch,
        }
    }

    /// Eye position in 3-D (z in cell heights).
    #[inline]
    pub fn eye(&self) -> DVec3 {
        self.pos.extend(self.pos_z)
    }

    /*──────────────────────── derived vectors ───────────────────────*/

    /// Unit vector pointing where the camera looks on the X-Y plane.
    #[inline(always)]
    pub fn forward(&self) -> DVec2 {
        polar(self.heading, 1.0)
    }

    /// Unit vector pointing to the camera's right on the X-Y plane.
    #[inline(always)]
    pub fn right(&self) -> DVec2 {
        -self.forward().perp()
    }

    /// Direction vector whose length is the FOV depth scale.
    #[inline]
    pub fn direction(&self, fov_depth: f64) -> DVec2 {
        polar(self.heading, fov_depth)
    }

    /// Camera-plane vector: perpendicular to [`Self::direction`], sized so
    /// the screen edges sit at `±fov/2`.
    ///
    /// ```text
    /// plane = dir - polar(heading + fov/2, |dir| / cos(fov/2))
    /// ```
    pub fn plane(&self, fov: f64, fov_depth: f64) -> DVec2 {
        let dir = self.direction(fov_depth);
        let hypotenuse = dir.length() / (fov * 0.5).cos();
        dir - polar(self.heading + fov * 0.5, hypotenuse)
    }

    /*──────────────────────── movement helpers ──────────────────────*/

    /// Move by `forward` units and `side` (strafe, + right).
    pub fn step(&mut self, forward: f64, side: f64) {
        self.pos += self.forward() * forward + self.right() * side;
    }

    /// Rotate around Z (positive = turn left).
    pub fn turn(&mut self, delta: f64) {
        self.heading = (self.heading + delta).rem_euclid(std::f64::consts::TAU);
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn forward_and_right_are_orthonormal() {
        let cam = CameraPose::new(DVec2::ZERO, 0.5, 0.3, 0.0);
        let f = cam.forward();
        let r = cam.right();
        assert!((f.length() - 1.0).abs() < 1e-9);
        assert!((r.length() - 1.0).abs() < 1e-9);
        assert!(f.dot(r).abs() < 1e-9);
    }

    #[test]
    fn plane_is_perpendicular_and_sized_by_fov() {
        let cam = CameraPose::new(DVec2::ZERO, 0.5, 0.7, 0.0);
        let dir = cam.direction(1.0);
        let plane = cam.plane(FRAC_PI_2, 1.0);
        assert!(dir.dot(plane).abs() < 1e-9);
        // 90° FOV: half-width equals depth
        assert!((plane.length() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn plane_scales_with_depth() {
        let cam = CameraPose::default();
        let p1 = cam.plane(1.2, 1.0);
        let p2 = cam.plane(1.2, 2.0);
        assert!((p2.length() - 2.0 * p1.length()).abs() < 1e-9);
    }

    #[test]
    fn step_and_turn() {
        let mut cam = CameraPose::new(DVec2::ZERO, 0.5, 0.0, 0.0);
        cam.step(2.0, 0.0);
        assert!((cam.pos - DVec2::new(2.0, 0.0)).length() < 1e-9);
        cam.turn(FRAC_PI_2);
        cam.step(1.0, 0.0);
        assert!((cam.pos - DVec2::new(2.0, 1.0)).length() < 1e-9);
        cam.turn(-std::f64::consts::PI);
        assert!((cam.heading - 3.0 * FRAC_PI_2).abs() < 1e-9);
    }
}
