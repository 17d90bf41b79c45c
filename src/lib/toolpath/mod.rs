//! Spiral toolpath over a spherical dome cap, with per-segment auger speed.
use core::f64;
use std::io::{Result, Write};

use nalgebra::{distance, Point3};
use thiserror::Error;
use tracing::info;

use crate::calibration::CalibrationTable;
use crate::{auger_rpm_m900, g1, pf, preamble, trailer};

/// Toolpath points are in millimetres, geometry parameters in metres
pub const MM_PER_M: f64 = 1000.0;

/// mm/min to m/s
const MM_PER_MIN_PER_M_PER_S: f64 = 60_000.0;

pub const TITLE: &str = "Dawn Colony - Spiral Dome Toolpath";

#[derive(Debug, Clone, PartialEq)]
pub struct SpiralParams {
    /// Dome radius, m
    pub radius: f64,
    /// Polar angle at which the spiral stops, radians from the dome apex
    pub theta_max: f64,
    /// Bead width, m
    pub bead_width: f64,
    /// Fraction of the bead width that overlaps the previous turn, in [0, 1)
    pub overlap: f64,
    /// Azimuthal step between toolpath points, radians
    pub dphi: f64,
    /// Linear feed rate, mm/min
    pub feed: f64,
}

impl Default for SpiralParams {
    fn default() -> Self {
        SpiralParams {
            radius: 3.0,
            theta_max: 70.0_f64.to_radians(),
            bead_width: 0.03,
            overlap: 0.15,
            dphi: 0.5_f64.to_radians(),
            // 30mm/s, typical for thick material
            feed: 1800.0,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ToolpathError {
    #[error("dome radius must be positive, got {0}")]
    Radius(f64),

    #[error("maximum polar angle must be in (0, pi/2] radians, got {0}")]
    ThetaMax(f64),

    #[error("bead width must be positive, got {0}")]
    BeadWidth(f64),

    #[error("overlap must be in [0, 1), got {0}")]
    Overlap(f64),

    #[error("angular step must be positive, got {0}")]
    AngularStep(f64),

    #[error("feed rate must be positive, got {0}")]
    Feed(f64),
}

fn positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

impl SpiralParams {
    /// Check every parameter is in its domain. With these checks passing the spiral is
    /// guaranteed to reach `theta_max` in a finite number of steps.
    pub fn validate(&self) -> std::result::Result<(), ToolpathError> {
        if !positive(self.radius) {
            return Err(ToolpathError::Radius(self.radius));
        }
        if !positive(self.theta_max) || self.theta_max > f64::consts::FRAC_PI_2 {
            return Err(ToolpathError::ThetaMax(self.theta_max));
        }
        if !positive(self.bead_width) {
            return Err(ToolpathError::BeadWidth(self.bead_width));
        }
        if !(0.0..1.0).contains(&self.overlap) {
            return Err(ToolpathError::Overlap(self.overlap));
        }
        if !positive(self.dphi) {
            return Err(ToolpathError::AngularStep(self.dphi));
        }
        if !positive(self.feed) {
            return Err(ToolpathError::Feed(self.feed));
        }
        Ok(())
    }

    /// Distance between neighbouring turns of the spiral, m
    pub fn spacing(&self) -> f64 {
        self.bead_width * (1.0 - self.overlap)
    }

    /// Number of turns needed to reach `theta_max`
    pub fn turns(&self) -> f64 {
        self.theta_max * self.radius / self.spacing()
    }
}

/// Point on the dome at polar angle `theta` and azimuth `phi`, in mm
pub fn dome_point(radius: f64, theta: f64, phi: f64) -> Point3<f64> {
    let r = radius * MM_PER_M;
    Point3::new(
        r * theta.sin() * phi.cos(),
        r * theta.sin() * phi.sin(),
        r * theta.cos(),
    )
}

/// Lay an Archimedean spiral (turns `spacing` apart) over the dome cap, from the apex
/// outwards until the polar angle passes `theta_max`.
///
/// The planar spiral radius r is mapped to the polar angle by theta = r / R. That keeps the
/// distance from the apex, measured along a meridian, equal to the planar radius, but it is
/// not a true arc-length preserving mapping of the spiral itself: the spacing between
/// turns along the surface is exact, the point spacing along the spiral shrinks by
/// sin(theta) / theta towards the rim.
///
/// Points are returned in mm. The apex is always the first point, so the result is never
/// empty.
pub fn spiral_points(
    params: &SpiralParams,
) -> std::result::Result<Vec<Point3<f64>>, ToolpathError> {
    params.validate()?;
    let spacing = params.spacing();

    let points: Vec<Point3<f64>> = (0usize..)
        // Multiply rather than accumulate, so phi doesn't drift on long spirals
        .map(|step| step as f64 * params.dphi)
        .map(|phi| (spacing * phi / f64::consts::TAU / params.radius, phi))
        .take_while(|&(theta, _)| theta <= params.theta_max)
        .map(|(theta, phi)| dome_point(params.radius, theta, phi))
        .collect();

    info!(
        points = points.len(),
        turns = params.turns(),
        "generated dome spiral"
    );
    Ok(points)
}

/// Length of the segment between two points given in mm, in m
pub fn segment_length(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    distance(a, b) / MM_PER_M
}

/// Volumetric flow needed to lay a bead along a segment of `length` m at `feed` mm/min.
/// The bead cross section is taken as a square of side `bead_width`.
pub fn required_flow(bead_width: f64, length: f64, feed: f64) -> f64 {
    bead_width * bead_width * length * (feed / MM_PER_MIN_PER_M_PER_S)
}

/// One printed move, with the auger speed to use while making it
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub start: Point3<f64>,
    pub end: Point3<f64>,
    /// m
    pub length: f64,
    pub flow: f64,
    pub rpm: f64,
}

/// Turn consecutive toolpath points into segments, each with its flow and auger speed
pub fn plan_segments(
    points: &[Point3<f64>],
    params: &SpiralParams,
    table: &CalibrationTable,
) -> Vec<Segment> {
    points
        .windows(2)
        .map(|w| {
            let length = segment_length(&w[0], &w[1]);
            let flow = required_flow(params.bead_width, length, params.feed);
            Segment {
                start: w[0],
                end: w[1],
                length,
                flow,
                rpm: table.rpm_for_flow(flow),
            }
        })
        .collect()
}

/// Totals over a planned toolpath, for the operator's notes
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub segments: usize,
    /// m
    pub path_length: f64,
    /// minutes
    pub print_time: f64,
    pub min_rpm: f64,
    pub max_rpm: f64,
}

pub fn summarize(segments: &[Segment], feed: f64) -> Summary {
    let path_length: f64 = segments.iter().map(|s| s.length).sum();
    let (min_rpm, max_rpm) = segments
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
            (lo.min(s.rpm), hi.max(s.rpm))
        });
    Summary {
        segments: segments.len(),
        path_length,
        print_time: path_length * MM_PER_M / feed,
        min_rpm,
        max_rpm,
    }
}

/// Write the whole program: preamble, a move to the first point, then for each segment an
/// auger speed change followed by the move itself.
pub fn write_program(
    file: &mut dyn Write,
    name: &Option<String>,
    points: &[Point3<f64>],
    segments: &[Segment],
    feed: f64,
) -> Result<()> {
    preamble(TITLE, name, file)?;

    // Move to the first point. With no points there's nothing to print.
    if let Some(first) = points.first() {
        g1(file, pf(first, feed))?;
    }

    for seg in segments {
        auger_rpm_m900(file, seg.rpm)?;
        g1(file, pf(&seg.end, feed))?;
    }

    trailer(file)
}
