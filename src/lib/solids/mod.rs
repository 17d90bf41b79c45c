//! Colony parts as constructive solid geometry.
//!
//! The parts are recipes written against [`SolidBuilder`], a small set of primitives and
//! boolean operations. The geometry kernel that evaluates them lives outside this crate: the
//! backend shipped here, [`ScadBuilder`], turns a recipe into an OpenSCAD script.
use nalgebra::{Point2, Vector3};
use thiserror::Error;

mod parts;
mod scad;

pub use parts::{
    Airlock, AtmosphericTower, ColonyBlock, HabitatDome, MycoBioreactor, Part, ResonanceGate,
    RibbedDomeShell, TerraformDrone, WaterRing,
};
pub use scad::{write_scad, Scad, ScadBuilder};

/// Primitives and operations a CSG backend has to provide.
///
/// Sizes are in whatever unit the recipe uses (the colony parts use metres). Primitives
/// that are "extruded" start at z = 0 and grow upwards; boxes, spheres and tori are centred
/// on the origin.
pub trait SolidBuilder {
    type Solid: Clone;

    fn sphere(&self, radius: f64) -> Self::Solid;

    /// Cylinder on the XY plane, extruded to `height`
    fn cylinder(&self, radius: f64, height: f64) -> Self::Solid;

    /// Flat ring between two radii, extruded to `height`
    fn annulus(&self, outer: f64, inner: f64, height: f64) -> Self::Solid;

    /// Box centred on the origin
    fn cuboid(&self, size: Vector3<f64>) -> Self::Solid;

    /// Torus in the XY plane, centred on the origin
    fn torus(&self, major: f64, minor: f64) -> Self::Solid;

    /// Closed XY polygon, extruded to `height`
    fn prism(&self, profile: &[Point2<f64>], height: f64) -> Self::Solid;

    fn union(&self, parts: Vec<Self::Solid>) -> Self::Solid;

    /// `base` with every one of `tools` cut away
    fn difference(&self, base: Self::Solid, tools: Vec<Self::Solid>) -> Self::Solid;

    fn intersection(&self, a: Self::Solid, b: Self::Solid) -> Self::Solid;

    fn translate(&self, solid: Self::Solid, offset: Vector3<f64>) -> Self::Solid;

    /// Rotate about the Z axis, in degrees
    fn rotate_z(&self, solid: Self::Solid, degrees: f64) -> Self::Solid;

    /// Rotate so the solid's +Z axis points along `direction`
    fn align_z(&self, solid: Self::Solid, direction: Vector3<f64>) -> Self::Solid;

    fn scale(&self, solid: Self::Solid, factor: f64) -> Self::Solid;
}

#[derive(Debug, Error, PartialEq)]
pub enum PartError {
    #[error("{part}: {param} must be positive, got {value}")]
    NotPositive {
        part: &'static str,
        param: &'static str,
        value: f64,
    },

    #[error("{part}: {param} must be finite, got {value}")]
    NotFinite {
        part: &'static str,
        param: &'static str,
        value: f64,
    },

    #[error("{part}: {what} would need {count} features, at most {} are allowed", MAX_FEATURES)]
    TooMany {
        part: &'static str,
        what: &'static str,
        count: f64,
    },

    #[error("{part}: {reason}")]
    Inconsistent {
        part: &'static str,
        reason: String,
    },
}

/// Upper bound on any repeated feature (ribs, rows, rings) in a single part
pub const MAX_FEATURES: usize = 10_000;

pub(crate) fn check_positive(
    part: &'static str,
    param: &'static str,
    value: f64,
) -> Result<(), PartError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PartError::NotPositive { part, param, value })
    }
}

pub(crate) fn check_finite(
    part: &'static str,
    param: &'static str,
    value: f64,
) -> Result<(), PartError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PartError::NotFinite { part, param, value })
    }
}

/// Turn a computed feature count into a loop bound, refusing counts that are not finite or
/// exceed `MAX_FEATURES`
pub(crate) fn check_count(
    part: &'static str,
    what: &'static str,
    count: f64,
) -> Result<usize, PartError> {
    if count.is_finite() && count >= 0.0 && count <= MAX_FEATURES as f64 {
        Ok(count as usize)
    } else {
        Err(PartError::TooMany { part, what, count })
    }
}
