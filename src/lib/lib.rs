use std::fs::{File, OpenOptions};
use std::io::{Result, Write};
use std::path::Path;

use nalgebra::Point3;

pub mod calibration;
pub mod logging;
pub mod solids;
pub mod toolpath;

/// Open an output file for writing. Unless `overwrite` is set an existing file is an error,
/// so a finished program never gets clobbered by accident.
pub fn open_output(path: &Path, overwrite: bool) -> Result<File> {
    let mut options = OpenOptions::new();
    options.write(true);
    if overwrite {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    options.open(path)
}

pub fn gcode_comment(file: &mut dyn Write, s: &str) -> Result<()> {
    writeln!(file, "; {s}")
}

pub fn trailer(file: &mut dyn Write) -> Result<()> {
    gcode_comment(file, "DONE")
}

pub fn preamble(title: &str, name: &Option<String>, file: &mut dyn Write) -> Result<()> {
    gcode_comment(file, title)?;
    // Job name goes on the second line, if set
    if let Some(name) = &name {
        gcode_comment(file, name)?;
    }

    // Metric, absolute. The printer firmware handles everything else.
    writeln!(file, "G21 ; mm units")?;
    writeln!(file, "G90 ; absolute coordinates")?;
    writeln!(file)?;

    Ok(())
}

/// Set the auger speed for the moves that follow.
/// M900 is a custom M-code on the printer; R is the auger rotation speed in rpm.
pub fn auger_rpm_m900(file: &mut dyn Write, rpm: f64) -> Result<()> {
    writeln!(file, "M900 R{rpm:.2} ; set auger rpm")
}

trait AsGVals {
    fn as_gvals(&self, file: &mut dyn Write) -> Result<()>;
}

/// A full linear move: every axis and the feed are always given
#[derive(Clone, Debug, PartialEq)]
pub struct PosAndFeed {
    x: f64,
    y: f64,
    z: f64,
    feed: f64,
}

pub fn xyzf(x: f64, y: f64, z: f64, feed: f64) -> PosAndFeed {
    PosAndFeed { x, y, z, feed }
}

/// Move to a toolpath point (in mm) at `feed` mm/min
pub fn pf(p: &Point3<f64>, feed: f64) -> PosAndFeed {
    xyzf(p.x, p.y, p.z, feed)
}

impl AsGVals for PosAndFeed {
    fn as_gvals(&self, file: &mut dyn Write) -> Result<()> {
        g_val(file, "X", self.x)?;
        g_val(file, "Y", self.y)?;
        g_val(file, "Z", self.z)?;
        g_feed(file, self.feed)
    }
}

/// Emit a gcode coordinate value.
/// Coordinates are always printed with three decimals (micron resolution in mm).
fn g_val(file: &mut dyn Write, name: &str, v: f64) -> Result<()> {
    write!(file, " {name}{v:.3}")
}

/// Emit a feed rate.
/// To make the gcode human-friendly, feeds that round nicely are printed in their minimal form.
fn g_feed(file: &mut dyn Write, v: f64) -> Result<()> {
    if (v - v.round()).abs() < f64::EPSILON {
        write!(file, " F{}", v.round())
    } else {
        write!(file, " F{v:.3}")
    }
}

fn g_move_linear(file: &mut dyn Write, g: &str, p: &dyn AsGVals) -> Result<()> {
    write!(file, "{g}")?;
    p.as_gvals(file)?;
    writeln!(file)?;
    Ok(())
}

pub fn g1(file: &mut dyn Write, p: PosAndFeed) -> Result<()> {
    g_move_linear(file, "G1", &p)
}
