use std::io::{Result, Write};

use nalgebra::{Point2, Vector3};

use super::SolidBuilder;

/// An OpenSCAD CSG tree
#[derive(Debug, Clone, PartialEq)]
pub enum Scad {
    Sphere { r: f64 },
    Cylinder { r: f64, h: f64 },
    Annulus { outer: f64, inner: f64, h: f64 },
    Cube { size: [f64; 3] },
    Torus { major: f64, minor: f64 },
    Prism { profile: Vec<[f64; 2]>, h: f64 },
    Union(Vec<Scad>),
    Difference(Vec<Scad>),
    Intersection(Vec<Scad>),
    Translate([f64; 3], Box<Scad>),
    /// Euler angles in degrees, applied X then Y then Z
    Rotate([f64; 3], Box<Scad>),
    Scale(f64, Box<Scad>),
}

impl Scad {
    /// Number of primitive leaves in the tree
    pub fn primitives(&self) -> usize {
        match self {
            Scad::Union(c) | Scad::Difference(c) | Scad::Intersection(c) => {
                c.iter().map(Scad::primitives).sum()
            }
            Scad::Translate(_, c) | Scad::Rotate(_, c) | Scad::Scale(_, c) => c.primitives(),
            _ => 1,
        }
    }
}

/// Builds [`Scad`] trees. Evaluating them (and exporting STL) is left to OpenSCAD.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScadBuilder;

impl SolidBuilder for ScadBuilder {
    type Solid = Scad;

    fn sphere(&self, radius: f64) -> Scad {
        Scad::Sphere { r: radius }
    }

    fn cylinder(&self, radius: f64, height: f64) -> Scad {
        Scad::Cylinder {
            r: radius,
            h: height,
        }
    }

    fn annulus(&self, outer: f64, inner: f64, height: f64) -> Scad {
        Scad::Annulus {
            outer,
            inner,
            h: height,
        }
    }

    fn cuboid(&self, size: Vector3<f64>) -> Scad {
        Scad::Cube {
            size: [size.x, size.y, size.z],
        }
    }

    fn torus(&self, major: f64, minor: f64) -> Scad {
        Scad::Torus { major, minor }
    }

    fn prism(&self, profile: &[Point2<f64>], height: f64) -> Scad {
        Scad::Prism {
            profile: profile.iter().map(|p| [p.x, p.y]).collect(),
            h: height,
        }
    }

    fn union(&self, mut parts: Vec<Scad>) -> Scad {
        if parts.len() == 1 {
            return parts.remove(0);
        }
        Scad::Union(parts)
    }

    fn difference(&self, base: Scad, tools: Vec<Scad>) -> Scad {
        if tools.is_empty() {
            return base;
        }
        let mut children = Vec::with_capacity(tools.len() + 1);
        children.push(base);
        children.extend(tools);
        Scad::Difference(children)
    }

    fn intersection(&self, a: Scad, b: Scad) -> Scad {
        Scad::Intersection(vec![a, b])
    }

    fn translate(&self, solid: Scad, offset: Vector3<f64>) -> Scad {
        Scad::Translate([offset.x, offset.y, offset.z], Box::new(solid))
    }

    fn rotate_z(&self, solid: Scad, degrees: f64) -> Scad {
        Scad::Rotate([0.0, 0.0, degrees], Box::new(solid))
    }

    fn align_z(&self, solid: Scad, direction: Vector3<f64>) -> Scad {
        let len = direction.norm();
        if !(len.is_finite() && len > 0.0) {
            return solid;
        }
        let d = direction / len;
        // Tilt +Z down by the polar angle about Y, then swing it round to the azimuth about Z
        let tilt = d.z.clamp(-1.0, 1.0).acos().to_degrees();
        let heading = d.y.atan2(d.x).to_degrees();
        Scad::Rotate([0.0, tilt, heading], Box::new(solid))
    }

    fn scale(&self, solid: Scad, factor: f64) -> Scad {
        Scad::Scale(factor, Box::new(solid))
    }
}

fn indent(file: &mut dyn Write, depth: usize) -> Result<()> {
    write!(file, "{:width$}", "", width = depth * 2)
}

fn vec3(v: &[f64; 3]) -> String {
    format!("[{}, {}, {}]", v[0], v[1], v[2])
}

fn write_group(file: &mut dyn Write, head: &str, children: &[Scad], depth: usize) -> Result<()> {
    writeln!(file, "{head} {{")?;
    for child in children {
        write_node(file, child, depth + 1)?;
    }
    indent(file, depth)?;
    writeln!(file, "}}")
}

fn write_node(file: &mut dyn Write, node: &Scad, depth: usize) -> Result<()> {
    indent(file, depth)?;
    match node {
        Scad::Sphere { r } => writeln!(file, "sphere(r = {r});"),
        Scad::Cylinder { r, h } => writeln!(file, "cylinder(h = {h}, r = {r});"),
        Scad::Annulus { outer, inner, h } => writeln!(
            file,
            "linear_extrude(height = {h}) difference() {{ circle(r = {outer}); circle(r = {inner}); }}"
        ),
        Scad::Cube { size } => writeln!(file, "cube({}, center = true);", vec3(size)),
        Scad::Torus { major, minor } => writeln!(
            file,
            "rotate_extrude() translate([{major}, 0, 0]) circle(r = {minor});"
        ),
        Scad::Prism { profile, h } => {
            let points: Vec<String> = profile.iter().map(|[x, y]| format!("[{x}, {y}]")).collect();
            writeln!(
                file,
                "linear_extrude(height = {h}) polygon(points = [{}]);",
                points.join(", ")
            )
        }
        Scad::Union(children) => write_group(file, "union()", children, depth),
        Scad::Difference(children) => write_group(file, "difference()", children, depth),
        Scad::Intersection(children) => write_group(file, "intersection()", children, depth),
        Scad::Translate(v, child) => write_group(
            file,
            &format!("translate({})", vec3(v)),
            std::slice::from_ref(child.as_ref()),
            depth,
        ),
        Scad::Rotate(v, child) => write_group(
            file,
            &format!("rotate({})", vec3(v)),
            std::slice::from_ref(child.as_ref()),
            depth,
        ),
        Scad::Scale(f, child) => write_group(
            file,
            &format!("scale({f})"),
            std::slice::from_ref(child.as_ref()),
            depth,
        ),
    }
}

/// Write `solid` as an OpenSCAD script. `segments` sets `$fn`, the number of facets on
/// every curved surface.
pub fn write_scad(file: &mut dyn Write, title: &str, segments: u32, solid: &Scad) -> Result<()> {
    writeln!(file, "// {title}")?;
    writeln!(file, "$fn = {segments};")?;
    writeln!(file)?;
    write_node(file, solid, 0)
}
