//! Parametric colony parts. All sizes are in metres, angles in degrees.
use core::f64;

use nalgebra::{Point2, Vector3};
use structopt::StructOpt;
use tracing::debug;

use super::{check_count, check_finite, check_positive, PartError, SolidBuilder};

/// Number of ribs that fit round a circumference at `spacing`
fn rib_count(part: &'static str, radius: f64, spacing: f64) -> Result<usize, PartError> {
    check_count(part, "ribs", (f64::consts::TAU * radius / spacing).floor())
}

/// `n` evenly spaced values from `a` to `b` inclusive
fn linspace(a: f64, b: f64, n: usize) -> impl Iterator<Item = f64> {
    let step = if n > 1 { (b - a) / (n - 1) as f64 } else { 0.0 };
    (0..n).map(move |k| a + k as f64 * step)
}

fn z(v: f64) -> Vector3<f64> {
    Vector3::new(0.0, 0.0, v)
}

/// Spherical habitat dome: a shell cut off at the equator, with an entrance and ribs
#[derive(Debug, Clone, PartialEq, StructOpt)]
pub struct HabitatDome {
    /// Dome radius
    #[structopt(long, default_value = "3")]
    pub radius: f64,

    /// Shell wall thickness
    #[structopt(long, default_value = "0.08")]
    pub wall: f64,

    /// Width (and height) of the square entrance cut
    #[structopt(long, default_value = "1.2")]
    pub entrance: f64,

    /// Spacing of the ribs around the circumference
    #[structopt(long, default_value = "0.5")]
    pub rib_spacing: f64,
}

impl Default for HabitatDome {
    fn default() -> Self {
        HabitatDome {
            radius: 3.0,
            wall: 0.08,
            entrance: 1.2,
            rib_spacing: 0.5,
        }
    }
}

impl HabitatDome {
    const NAME: &'static str = "habitat dome";
    const RIB_DEPTH: f64 = 0.06;

    pub fn build<B: SolidBuilder>(&self, b: &B) -> Result<B::Solid, PartError> {
        check_positive(Self::NAME, "radius", self.radius)?;
        check_positive(Self::NAME, "wall", self.wall)?;
        check_positive(Self::NAME, "entrance", self.entrance)?;
        check_positive(Self::NAME, "rib spacing", self.rib_spacing)?;
        if self.wall >= self.radius {
            return Err(PartError::Inconsistent {
                part: Self::NAME,
                reason: format!("wall {} is thicker than the radius {}", self.wall, self.radius),
            });
        }

        let r = self.radius;
        let e = self.entrance;
        let below_equator = b.translate(b.cuboid(Vector3::new(2.0 * r, 2.0 * r, r)), z(-r / 2.0));
        let doorway = b.translate(
            b.cuboid(Vector3::new(e, e, 2.0 * r)),
            Vector3::new(r - e / 2.0, 0.0, 0.0),
        );
        let dome = b.difference(
            b.sphere(r),
            vec![b.sphere(r - self.wall), below_equator, doorway],
        );

        let n = rib_count(Self::NAME, r, self.rib_spacing)?.max(6);
        let mut parts = vec![dome];
        for i in 0..n {
            let rib = b.translate(
                b.cuboid(Vector3::new(0.02 * r, 2.0 * r, Self::RIB_DEPTH)),
                z(Self::RIB_DEPTH / 2.0),
            );
            let rib = b.rotate_z(rib, i as f64 * 360.0 / n as f64);
            parts.push(b.translate(rib, z(1.0 - r)));
        }
        debug!(ribs = n, "habitat dome");
        Ok(b.union(parts))
    }
}

/// Dome shell between two horizontal planes, with trapezoidal ribs standing out along the
/// surface normal on a grid of meridians and polar angles
#[derive(Debug, Clone, PartialEq, StructOpt)]
pub struct RibbedDomeShell {
    /// Dome radius
    #[structopt(long, default_value = "3")]
    pub radius: f64,

    /// Shell thickness
    #[structopt(long, default_value = "0.06")]
    pub shell: f64,

    /// Spacing of the rib meridians around the circumference
    #[structopt(long, default_value = "0.5")]
    pub rib_spacing: f64,

    #[structopt(long, default_value = "0.08")]
    pub rib_height: f64,

    #[structopt(long, default_value = "0.06")]
    pub rib_width_top: f64,

    #[structopt(long, default_value = "0.13")]
    pub rib_width_base: f64,

    /// How far each rib extends along the surface normal
    #[structopt(long, default_value = "0.5")]
    pub rib_length: f64,

    /// Polar angle of the first row of ribs, degrees
    #[structopt(long, default_value = "60")]
    pub theta_start: f64,

    /// Polar angle past which no more rows are placed, degrees
    #[structopt(long, default_value = "120")]
    pub theta_end: f64,

    /// Polar angle between rows of ribs, degrees
    #[structopt(long, default_value = "10")]
    pub theta_step: f64,
}

impl Default for RibbedDomeShell {
    fn default() -> Self {
        RibbedDomeShell {
            radius: 3.0,
            shell: 0.06,
            rib_spacing: 0.5,
            rib_height: 0.08,
            rib_width_top: 0.06,
            rib_width_base: 0.13,
            rib_length: 0.5,
            theta_start: 60.0,
            theta_end: 120.0,
            theta_step: 10.0,
        }
    }
}

impl RibbedDomeShell {
    const NAME: &'static str = "ribbed dome shell";

    pub fn build<B: SolidBuilder>(&self, b: &B) -> Result<B::Solid, PartError> {
        check_positive(Self::NAME, "radius", self.radius)?;
        check_positive(Self::NAME, "shell", self.shell)?;
        check_positive(Self::NAME, "rib spacing", self.rib_spacing)?;
        check_positive(Self::NAME, "rib height", self.rib_height)?;
        check_positive(Self::NAME, "rib top width", self.rib_width_top)?;
        check_positive(Self::NAME, "rib base width", self.rib_width_base)?;
        check_positive(Self::NAME, "rib length", self.rib_length)?;
        check_positive(Self::NAME, "theta step", self.theta_step)?;
        check_finite(Self::NAME, "theta start", self.theta_start)?;
        check_finite(Self::NAME, "theta end", self.theta_end)?;
        if self.shell >= self.radius {
            return Err(PartError::Inconsistent {
                part: Self::NAME,
                reason: format!("shell {} is thicker than the radius {}", self.shell, self.radius),
            });
        }
        if self.theta_end < self.theta_start {
            return Err(PartError::Inconsistent {
                part: Self::NAME,
                reason: format!(
                    "theta end {} is before theta start {}",
                    self.theta_end, self.theta_start
                ),
            });
        }

        let r = self.radius;
        // Keeps the band from z = r/2 up to the top of the sphere
        let window = b.translate(b.cuboid(Vector3::new(2.0 * r, 2.0 * r, r)), z(r));
        let outer = b.intersection(b.sphere(r), window.clone());
        let inner = b.intersection(b.sphere(r - self.shell), window);
        let mut parts = vec![b.difference(outer, vec![inner])];

        let profile = [
            Point2::new(0.0, 0.0),
            Point2::new(self.rib_width_top, 0.0),
            Point2::new(self.rib_width_top, self.rib_height),
            Point2::new(0.0, self.rib_width_base),
        ];
        let meridians = rib_count(Self::NAME, r, self.rib_spacing)?;
        let rows = check_count(
            Self::NAME,
            "rib rows",
            ((self.theta_end - self.theta_start) / self.theta_step).floor(),
        )?;
        check_count(Self::NAME, "ribs", (meridians * rows) as f64)?;
        for i in 0..meridians {
            let phi = i as f64 * f64::consts::TAU / meridians as f64;
            for j in 0..rows {
                let theta = (self.theta_start + j as f64 * self.theta_step).to_radians();
                let normal = Vector3::new(
                    theta.sin() * phi.cos(),
                    theta.sin() * phi.sin(),
                    theta.cos(),
                );
                let rib = b.align_z(b.prism(&profile, self.rib_length), normal);
                parts.push(b.translate(rib, normal * r));
            }
        }
        debug!(meridians, rows, "ribbed dome shell");
        Ok(b.union(parts))
    }
}

/// Cylindrical airlock chamber with a stack of mating flanges and a gasket groove
#[derive(Debug, Clone, PartialEq, StructOpt)]
pub struct Airlock {
    #[structopt(long, default_value = "2.4")]
    pub inner_diameter: f64,

    #[structopt(long, default_value = "3")]
    pub length: f64,

    #[structopt(long, default_value = "0.06")]
    pub flange_thickness: f64,

    /// Number of flanges, stacked around the middle of the chamber
    #[structopt(long, default_value = "6")]
    pub ring_count: usize,
}

impl Default for Airlock {
    fn default() -> Self {
        Airlock {
            inner_diameter: 2.4,
            length: 3.0,
            flange_thickness: 0.06,
            ring_count: 6,
        }
    }
}

impl Airlock {
    const NAME: &'static str = "airlock";
    const WALL: f64 = 0.05;
    const FLANGE_REACH: f64 = 0.3;
    const GROOVE_HALF_WIDTH: f64 = 0.02;
    const GROOVE_DEPTH: f64 = 0.02;

    pub fn build<B: SolidBuilder>(&self, b: &B) -> Result<B::Solid, PartError> {
        check_positive(Self::NAME, "inner diameter", self.inner_diameter)?;
        check_positive(Self::NAME, "length", self.length)?;
        check_positive(Self::NAME, "flange thickness", self.flange_thickness)?;
        check_count(Self::NAME, "flanges", self.ring_count as f64)?;
        let r = self.inner_diameter / 2.0;
        if r <= Self::GROOVE_HALF_WIDTH {
            return Err(PartError::Inconsistent {
                part: Self::NAME,
                reason: format!(
                    "inner diameter {} leaves no room for the gasket groove",
                    self.inner_diameter
                ),
            });
        }

        // Bore runs slightly past both ends so the cut is clean
        let chamber = b.difference(
            b.cylinder(r + Self::WALL, self.length),
            vec![b.translate(b.cylinder(r, self.length + 0.02), z(-0.01))],
        );

        let mid = self.length / 2.0;
        let mut parts = vec![chamber];
        for i in 0..self.ring_count {
            let offset = (i as f64 - (self.ring_count / 2) as f64) * self.flange_thickness * 1.5;
            let flange = b.annulus(r + Self::FLANGE_REACH, r + Self::WALL, self.flange_thickness);
            parts.push(b.translate(flange, z(mid + offset)));
        }

        let groove = b.translate(
            b.annulus(
                r + Self::GROOVE_HALF_WIDTH,
                r - Self::GROOVE_HALF_WIDTH,
                Self::GROOVE_DEPTH,
            ),
            z(mid),
        );
        Ok(b.difference(b.union(parts), vec![groove]))
    }
}

/// Cylindrical mycelium reactor with radial baffles and a perforated top cap
#[derive(Debug, Clone, PartialEq, StructOpt)]
pub struct MycoBioreactor {
    #[structopt(long, default_value = "1")]
    pub radius: f64,

    #[structopt(long, default_value = "1.6")]
    pub height: f64,

    /// Number of radial baffles
    #[structopt(long, default_value = "6")]
    pub chamber_count: usize,

    #[structopt(long, default_value = "0.06")]
    pub wall_thickness: f64,
}

impl Default for MycoBioreactor {
    fn default() -> Self {
        MycoBioreactor {
            radius: 1.0,
            height: 1.6,
            chamber_count: 6,
            wall_thickness: 0.06,
        }
    }
}

impl MycoBioreactor {
    const NAME: &'static str = "myco bioreactor";
    const LINER: f64 = 0.02;
    const BAFFLE: f64 = 0.02;
    const CAP: f64 = 0.02;
    const HOLE_RADIUS: f64 = 0.02;
    const HOLE_MARGIN: f64 = 0.05;
    const HOLES_PER_SIDE: usize = 5;

    pub fn build<B: SolidBuilder>(&self, b: &B) -> Result<B::Solid, PartError> {
        check_positive(Self::NAME, "height", self.height)?;
        check_positive(Self::NAME, "wall thickness", self.wall_thickness)?;
        check_count(Self::NAME, "chambers", self.chamber_count as f64)?;
        if !(self.radius.is_finite() && self.radius > Self::HOLE_MARGIN) {
            return Err(PartError::Inconsistent {
                part: Self::NAME,
                reason: format!("radius {} must exceed {}", self.radius, Self::HOLE_MARGIN),
            });
        }

        let r = self.radius;
        let h = self.height;
        let shell = b.difference(
            b.cylinder(r + self.wall_thickness, h),
            vec![b.cylinder(r - Self::LINER, h)],
        );

        let mut parts = vec![shell];
        for i in 0..self.chamber_count {
            let baffle = b.translate(
                b.cuboid(Vector3::new(2.0 * r, Self::BAFFLE, 0.9 * h)),
                z(0.45 * h),
            );
            parts.push(b.rotate_z(baffle, i as f64 * 360.0 / self.chamber_count as f64));
        }

        let lim = r - Self::HOLE_MARGIN;
        let mut holes = Vec::new();
        for x in linspace(-lim, lim, Self::HOLES_PER_SIDE) {
            for y in linspace(-lim, lim, Self::HOLES_PER_SIDE) {
                // Taller than the cap so no faces are shared
                let hole = b.cylinder(Self::HOLE_RADIUS, 2.0 * Self::CAP);
                holes.push(b.translate(hole, Vector3::new(x, y, h - Self::CAP / 2.0)));
            }
        }
        let cap = b.translate(b.cylinder(r, Self::CAP), z(h));
        parts.push(b.difference(cap, holes));

        Ok(b.union(parts))
    }
}

/// Flat ring with radial fins, for structured-water lattices
#[derive(Debug, Clone, PartialEq, StructOpt)]
pub struct WaterRing {
    #[structopt(long, default_value = "6")]
    pub outer_r: f64,

    #[structopt(long, default_value = "4")]
    pub inner_r: f64,

    #[structopt(long, default_value = "0.2")]
    pub thickness: f64,

    #[structopt(long, default_value = "24")]
    pub fins: usize,
}

impl Default for WaterRing {
    fn default() -> Self {
        WaterRing {
            outer_r: 6.0,
            inner_r: 4.0,
            thickness: 0.2,
            fins: 24,
        }
    }
}

impl WaterRing {
    const NAME: &'static str = "structured water ring";
    const FIN_WIDTH: f64 = 0.05;

    pub fn build<B: SolidBuilder>(&self, b: &B) -> Result<B::Solid, PartError> {
        check_positive(Self::NAME, "inner radius", self.inner_r)?;
        check_positive(Self::NAME, "thickness", self.thickness)?;
        if !(self.outer_r.is_finite() && self.outer_r > self.inner_r) {
            return Err(PartError::Inconsistent {
                part: Self::NAME,
                reason: format!(
                    "outer radius {} must exceed inner radius {}",
                    self.outer_r, self.inner_r
                ),
            });
        }

        let t = self.thickness;
        let mut parts = vec![b.annulus(self.outer_r, self.inner_r, t)];
        let fin_len = (self.outer_r - self.inner_r) / 4.0;
        let mid_r = (self.outer_r + self.inner_r) / 2.0;
        for i in 0..self.fins {
            let fin = b.translate(
                b.cuboid(Vector3::new(fin_len, Self::FIN_WIDTH, 0.9 * t)),
                Vector3::new(mid_r, 0.0, t / 2.0),
            );
            parts.push(b.rotate_z(fin, i as f64 * 360.0 / self.fins as f64));
        }
        Ok(b.union(parts))
    }
}

/// Tall tower with a stack of shrinking resonance discs
#[derive(Debug, Clone, PartialEq, StructOpt)]
pub struct AtmosphericTower {
    #[structopt(long, default_value = "0.6")]
    pub base_r: f64,

    #[structopt(long, default_value = "8")]
    pub height: f64,

    #[structopt(long, default_value = "12")]
    pub disc_count: usize,
}

impl Default for AtmosphericTower {
    fn default() -> Self {
        AtmosphericTower {
            base_r: 0.6,
            height: 8.0,
            disc_count: 12,
        }
    }
}

impl AtmosphericTower {
    const NAME: &'static str = "atmospheric tower";
    const DISC: f64 = 0.02;
    const DISC_TAPER: f64 = 0.02;

    fn disc_radius(&self, i: usize) -> f64 {
        self.base_r * 1.2 - i as f64 * Self::DISC_TAPER
    }

    pub fn build<B: SolidBuilder>(&self, b: &B) -> Result<B::Solid, PartError> {
        check_positive(Self::NAME, "base radius", self.base_r)?;
        check_positive(Self::NAME, "height", self.height)?;
        if self.disc_count > 0 && self.disc_radius(self.disc_count - 1) <= 0.0 {
            return Err(PartError::Inconsistent {
                part: Self::NAME,
                reason: format!(
                    "{} discs taper to nothing on a base radius of {}",
                    self.disc_count, self.base_r
                ),
            });
        }

        let mut parts = vec![b.cylinder(self.base_r, self.height)];
        for i in 0..self.disc_count {
            let disc = b.cylinder(self.disc_radius(i), Self::DISC);
            parts.push(b.translate(
                disc,
                z(i as f64 * self.height / self.disc_count as f64),
            ));
        }
        Ok(b.union(parts))
    }
}

/// Nested toroidal rings, each carrying eight tuning nodes
#[derive(Debug, Clone, PartialEq, StructOpt)]
pub struct ResonanceGate {
    #[structopt(long, default_value = "2")]
    pub outer_r: f64,

    #[structopt(long, default_value = "5")]
    pub ring_count: usize,

    #[structopt(long, default_value = "0.25")]
    pub ring_spacing: f64,
}

impl Default for ResonanceGate {
    fn default() -> Self {
        ResonanceGate {
            outer_r: 2.0,
            ring_count: 5,
            ring_spacing: 0.25,
        }
    }
}

impl ResonanceGate {
    const NAME: &'static str = "resonance gate";
    const TUBE: f64 = 0.05;
    const NODE: f64 = 0.03;
    const NODES_PER_RING: usize = 8;

    pub fn build<B: SolidBuilder>(&self, b: &B) -> Result<B::Solid, PartError> {
        check_positive(Self::NAME, "outer radius", self.outer_r)?;
        check_positive(Self::NAME, "ring spacing", self.ring_spacing)?;
        if self.ring_count > 0 {
            let innermost = self.outer_r - (self.ring_count - 1) as f64 * self.ring_spacing;
            if innermost <= Self::TUBE {
                return Err(PartError::Inconsistent {
                    part: Self::NAME,
                    reason: format!("innermost ring radius {innermost} is smaller than the tube"),
                });
            }
        }

        let mut parts = Vec::new();
        for i in 0..self.ring_count {
            let r = self.outer_r - i as f64 * self.ring_spacing;
            parts.push(b.torus(r, Self::TUBE));
            for j in 0..Self::NODES_PER_RING {
                let a = (j as f64 * 360.0 / Self::NODES_PER_RING as f64).to_radians();
                parts.push(b.translate(
                    b.sphere(Self::NODE),
                    Vector3::new(r * a.cos(), r * a.sin(), 0.0),
                ));
            }
        }
        Ok(b.union(parts))
    }
}

/// Seeder drone chassis: a box with a hexagonal recess on top, a mast and two rear legs
#[derive(Debug, Clone, PartialEq, StructOpt)]
pub struct TerraformDrone {
    #[structopt(long, default_value = "0.8")]
    pub width: f64,

    #[structopt(long, default_value = "1.2")]
    pub length: f64,

    #[structopt(long, default_value = "0.25")]
    pub height: f64,

    #[structopt(long, default_value = "0.2")]
    pub leg_height: f64,
}

impl Default for TerraformDrone {
    fn default() -> Self {
        TerraformDrone {
            width: 0.8,
            length: 1.2,
            height: 0.25,
            leg_height: 0.2,
        }
    }
}

impl TerraformDrone {
    const NAME: &'static str = "terraform drone";
    const HEX_RADIUS: f64 = 0.3;
    const HEX_DEPTH: f64 = 0.02;
    const MAST_RADIUS: f64 = 0.03;
    const MAST_HEIGHT: f64 = 0.6;

    pub fn build<B: SolidBuilder>(&self, b: &B) -> Result<B::Solid, PartError> {
        check_positive(Self::NAME, "width", self.width)?;
        check_positive(Self::NAME, "length", self.length)?;
        check_positive(Self::NAME, "leg height", self.leg_height)?;
        if !(self.height.is_finite() && self.height > Self::HEX_DEPTH) {
            return Err(PartError::Inconsistent {
                part: Self::NAME,
                reason: format!("height {} is too thin for the top recess", self.height),
            });
        }

        let (w, l, h) = (self.width, self.length, self.height);
        let hex: Vec<Point2<f64>> = (0..6)
            .map(|k| {
                let a = (k as f64 * 60.0).to_radians();
                Point2::new(Self::HEX_RADIUS * a.cos(), Self::HEX_RADIUS * a.sin())
            })
            .collect();
        // Pokes out of the top face so the cut is clean
        let recess = b.translate(
            b.prism(&hex, 1.5 * Self::HEX_DEPTH),
            z(h / 2.0 - Self::HEX_DEPTH),
        );
        let chassis = b.difference(b.cuboid(Vector3::new(l, w, h)), vec![recess]);

        let mast = b.translate(
            b.cylinder(Self::MAST_RADIUS, Self::MAST_HEIGHT),
            Vector3::new(l / 2.0 - 0.05, 0.0, h / 2.0),
        );
        let mut parts = vec![chassis, mast];
        for side in [-1.0, 1.0] {
            parts.push(b.translate(
                b.cuboid(Vector3::new(0.1, 0.02, self.leg_height)),
                Vector3::new(-l / 2.0 + 0.05, side * w / 2.0, -self.leg_height / 2.0),
            ));
        }
        Ok(b.union(parts))
    }
}

/// A small colony: dome, airlock, bioreactor, water ring, tower and gate, all at their
/// default sizes except for a shorter tower
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColonyBlock;

impl ColonyBlock {
    pub fn build<B: SolidBuilder>(&self, b: &B) -> Result<B::Solid, PartError> {
        let tower = AtmosphericTower {
            base_r: 0.5,
            height: 6.0,
            ..AtmosphericTower::default()
        };
        let parts = vec![
            HabitatDome::default().build(b)?,
            b.translate(Airlock::default().build(b)?, Vector3::new(4.0, 0.0, 0.0)),
            b.translate(MycoBioreactor::default().build(b)?, Vector3::new(-4.0, 0.0, 0.0)),
            b.translate(WaterRing::default().build(b)?, Vector3::new(0.0, 6.5, 0.0)),
            b.translate(tower.build(b)?, Vector3::new(0.0, -6.5, 0.0)),
            b.translate(ResonanceGate::default().build(b)?, z(3.0)),
        ];
        Ok(b.union(parts))
    }
}

/// The parts that can be generated
#[derive(Debug, Clone, PartialEq, StructOpt)]
pub enum Part {
    /// Spherical habitat dome with entrance and ribs
    HabitatDome(HabitatDome),
    /// Dome shell band with surface-normal ribs
    RibbedDomeShell(RibbedDomeShell),
    /// Cylindrical airlock with flanges and gasket groove
    Airlock(Airlock),
    /// Myco-bioreactor with baffles and perforated cap
    MycoBioreactor(MycoBioreactor),
    /// Structured water ring with fins
    WaterRing(WaterRing),
    /// Atmospheric tower with resonance discs
    AtmosphericTower(AtmosphericTower),
    /// Nested resonance rings with tuning nodes
    ResonanceGate(ResonanceGate),
    /// Terraform seeder drone chassis
    TerraformDrone(TerraformDrone),
    /// Combined colony block
    ColonyBlock,
}

impl Part {
    pub fn title(&self) -> &'static str {
        match self {
            Part::HabitatDome(_) => "Habitat Dome",
            Part::RibbedDomeShell(_) => "Ribbed Dome Shell",
            Part::Airlock(_) => "Airlock",
            Part::MycoBioreactor(_) => "Myco Bioreactor",
            Part::WaterRing(_) => "Structured Water Ring",
            Part::AtmosphericTower(_) => "Atmospheric Tower",
            Part::ResonanceGate(_) => "Resonance Gate",
            Part::TerraformDrone(_) => "Terraform Drone",
            Part::ColonyBlock => "Full Block",
        }
    }

    pub fn build<B: SolidBuilder>(&self, b: &B) -> Result<B::Solid, PartError> {
        match self {
            Part::HabitatDome(p) => p.build(b),
            Part::RibbedDomeShell(p) => p.build(b),
            Part::Airlock(p) => p.build(b),
            Part::MycoBioreactor(p) => p.build(b),
            Part::WaterRing(p) => p.build(b),
            Part::AtmosphericTower(p) => p.build(b),
            Part::ResonanceGate(p) => p.build(b),
            Part::TerraformDrone(p) => p.build(b),
            Part::ColonyBlock => ColonyBlock.build(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solids::{Scad, ScadBuilder};

    fn parse(args: &[&str]) -> Part {
        let mut argv = vec!["colony_part_gen"];
        argv.extend_from_slice(args);
        Part::from_iter_safe(argv).unwrap()
    }

    #[test]
    fn test_cli_defaults_match_default_impls() {
        assert_eq!(parse(&["habitat-dome"]), Part::HabitatDome(HabitatDome::default()));
        assert_eq!(
            parse(&["ribbed-dome-shell"]),
            Part::RibbedDomeShell(RibbedDomeShell::default())
        );
        assert_eq!(parse(&["airlock"]), Part::Airlock(Airlock::default()));
        assert_eq!(
            parse(&["myco-bioreactor"]),
            Part::MycoBioreactor(MycoBioreactor::default())
        );
        assert_eq!(parse(&["water-ring"]), Part::WaterRing(WaterRing::default()));
        assert_eq!(
            parse(&["atmospheric-tower"]),
            Part::AtmosphericTower(AtmosphericTower::default())
        );
        assert_eq!(
            parse(&["resonance-gate"]),
            Part::ResonanceGate(ResonanceGate::default())
        );
        assert_eq!(
            parse(&["terraform-drone"]),
            Part::TerraformDrone(TerraformDrone::default())
        );
        assert_eq!(parse(&["colony-block"]), Part::ColonyBlock);
    }

    #[test]
    fn test_cli_overrides() {
        match parse(&["airlock", "--length", "4.5", "--ring-count", "2"]) {
            Part::Airlock(a) => {
                assert_eq!(a.length, 4.5);
                assert_eq!(a.ring_count, 2);
                assert_eq!(a.inner_diameter, 2.4);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_rib_count() {
        // 2 pi 3 / 0.5 = 37.7
        assert_eq!(rib_count("dome", 3.0, 0.5), Ok(37));
        assert_eq!(
            rib_count("dome", 3.0, 1e-12),
            Err(PartError::TooMany {
                part: "dome",
                what: "ribs",
                count: (f64::consts::TAU * 3.0 / 1e-12).floor(),
            })
        );
    }

    #[test]
    fn test_linspace() {
        let v: Vec<f64> = linspace(-1.0, 1.0, 5).collect();
        assert_eq!(v, vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
        assert_eq!(linspace(2.0, 3.0, 1).collect::<Vec<_>>(), vec![2.0]);
    }

    #[test]
    fn test_default_primitive_counts() {
        let b = ScadBuilder;
        let count = |p: Part| p.build(&b).unwrap().primitives();
        // Shell, inner sphere, two cuts, 37 ribs
        assert_eq!(count(Part::HabitatDome(HabitatDome::default())), 41);
        // Two sphere/window intersections, 37 meridians of 6 ribs
        assert_eq!(count(Part::RibbedDomeShell(RibbedDomeShell::default())), 226);
        // Chamber, bore, 6 flanges, groove
        assert_eq!(count(Part::Airlock(Airlock::default())), 9);
        // Shell, liner, 6 baffles, cap, 25 holes
        assert_eq!(count(Part::MycoBioreactor(MycoBioreactor::default())), 34);
        assert_eq!(count(Part::WaterRing(WaterRing::default())), 25);
        assert_eq!(count(Part::AtmosphericTower(AtmosphericTower::default())), 13);
        assert_eq!(count(Part::ResonanceGate(ResonanceGate::default())), 45);
        assert_eq!(count(Part::TerraformDrone(TerraformDrone::default())), 5);
        assert_eq!(count(Part::ColonyBlock), 41 + 9 + 34 + 25 + 13 + 45);
    }

    #[test]
    fn test_small_dome_has_at_least_six_ribs() {
        let dome = HabitatDome {
            radius: 0.2,
            wall: 0.01,
            entrance: 0.05,
            rib_spacing: 0.5,
        };
        // Shell, inner sphere, two cuts, 6 ribs
        assert_eq!(dome.build(&ScadBuilder).unwrap().primitives(), 10);
    }

    #[test]
    fn test_airlock_flanges_centred_on_chamber() {
        let airlock = Airlock {
            ring_count: 3,
            ..Airlock::default()
        };
        let solid = airlock.build(&ScadBuilder).unwrap();
        let body = match solid {
            Scad::Difference(children) => children[0].clone(),
            other => panic!("unexpected {other:?}"),
        };
        let heights: Vec<f64> = match body {
            Scad::Union(children) => children
                .iter()
                .filter_map(|c| match c {
                    Scad::Translate(v, _) => Some(v[2]),
                    _ => None,
                })
                .collect(),
            other => panic!("unexpected {other:?}"),
        };
        let step = 0.06 * 1.5;
        let expected = [1.5 - step, 1.5, 1.5 + step];
        assert_eq!(heights.len(), 3);
        for (h, e) in heights.iter().zip(expected.iter()) {
            assert!((h - e).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let b = ScadBuilder;
        assert_eq!(
            HabitatDome {
                wall: 3.5,
                ..HabitatDome::default()
            }
            .build(&b)
            .unwrap_err(),
            PartError::Inconsistent {
                part: "habitat dome",
                reason: "wall 3.5 is thicker than the radius 3".to_string(),
            }
        );
        assert_eq!(
            Airlock {
                length: -1.0,
                ..Airlock::default()
            }
            .build(&b)
            .unwrap_err(),
            PartError::NotPositive {
                part: "airlock",
                param: "length",
                value: -1.0,
            }
        );
        assert!(WaterRing {
            inner_r: 7.0,
            ..WaterRing::default()
        }
        .build(&b)
        .is_err());
        assert!(AtmosphericTower {
            disc_count: 100,
            ..AtmosphericTower::default()
        }
        .build(&b)
        .is_err());
        assert!(ResonanceGate {
            ring_count: 9,
            ..ResonanceGate::default()
        }
        .build(&b)
        .is_err());
        assert!(RibbedDomeShell {
            theta_end: 30.0,
            ..RibbedDomeShell::default()
        }
        .build(&b)
        .is_err());
        assert_eq!(
            RibbedDomeShell {
                theta_end: f64::INFINITY,
                ..RibbedDomeShell::default()
            }
            .build(&b)
            .unwrap_err(),
            PartError::NotFinite {
                part: "ribbed dome shell",
                param: "theta end",
                value: f64::INFINITY,
            }
        );
        assert!(matches!(
            RibbedDomeShell {
                theta_step: 1e-9,
                ..RibbedDomeShell::default()
            }
            .build(&b),
            Err(PartError::TooMany { what: "rib rows", .. })
        ));
        assert!(matches!(
            RibbedDomeShell {
                rib_spacing: 1e-12,
                ..RibbedDomeShell::default()
            }
            .build(&b),
            Err(PartError::TooMany { what: "ribs", .. })
        ));
        assert!(matches!(
            HabitatDome {
                rib_spacing: 1e-12,
                ..HabitatDome::default()
            }
            .build(&b),
            Err(PartError::TooMany { what: "ribs", .. })
        ));
        assert!(matches!(
            Airlock {
                ring_count: usize::MAX,
                ..Airlock::default()
            }
            .build(&b),
            Err(PartError::TooMany { what: "flanges", .. })
        ));
        assert!(MycoBioreactor {
            radius: 0.01,
            ..MycoBioreactor::default()
        }
        .build(&b)
        .is_err());
        assert!(TerraformDrone {
            height: 0.01,
            ..TerraformDrone::default()
        }
        .build(&b)
        .is_err());
    }

    #[test]
    fn test_ribs_sit_on_the_surface() {
        let shell = RibbedDomeShell {
            rib_spacing: 6.0,
            theta_end: 70.0,
            ..RibbedDomeShell::default()
        };
        // 2 pi 3 / 6 rounds down to 3 meridians, one row at 60 degrees
        let solid = shell.build(&ScadBuilder).unwrap();
        let ribs: Vec<[f64; 3]> = match solid {
            Scad::Union(children) => children[1..]
                .iter()
                .map(|c| match c {
                    Scad::Translate(v, _) => *v,
                    other => panic!("unexpected {other:?}"),
                })
                .collect(),
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(ribs.len(), 3);
        for v in ribs {
            let r = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            assert!((r - 3.0).abs() < 1e-9);
            assert!((v[2] - 1.5).abs() < 1e-9);
        }
    }
}
