//! G-Code generator for printing a dome as one continuous spiral, with the auger speed set
//! per segment from a calibration table
use anyhow::{Context, Result};
use colony::calibration::CalibrationTable;
use colony::open_output;
use colony::toolpath::{
    plan_segments, spiral_points, summarize, write_program, SpiralParams, Summary,
};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use structopt::StructOpt;
use tracing::info;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "dome_spiral_gen",
    about = "Generates a spiral toolpath over a dome for an auger-fed printer"
)]
struct Opt {
    /// Dome radius, in m
    #[structopt(long, default_value = "3")]
    radius: f64,

    /// Polar angle where the spiral stops, in degrees down from the top of the dome
    #[structopt(long, default_value = "70")]
    theta_max: f64,

    /// Bead width, in m
    #[structopt(long, default_value = "0.03")]
    bead_width: f64,

    /// Fraction of each bead that overlaps the previous turn
    #[structopt(long, default_value = "0.15")]
    overlap: f64,

    /// Angle between toolpath points, in degrees around the dome axis
    #[structopt(long, default_value = "0.5")]
    dphi: f64,

    /// Feed rate, in mm/min
    #[structopt(long, default_value = "1800")]
    feed: f64,

    /// Auger calibration table (CSV). A default table is written here if there isn't one
    #[structopt(long, parse(from_os_str), default_value = "auger_calibration.csv")]
    calibration: PathBuf,

    /// Name for the job
    #[structopt(short, long)]
    name: Option<String>,

    /// Output file for the resulting G code
    #[structopt(short, long, parse(from_os_str))]
    output: PathBuf,

    /// Replace the output file if it exists
    #[structopt(long)]
    overwrite: bool,
}

impl Opt {
    fn params(&self) -> SpiralParams {
        SpiralParams {
            radius: self.radius,
            theta_max: self.theta_max.to_radians(),
            bead_width: self.bead_width,
            overlap: self.overlap,
            dphi: self.dphi.to_radians(),
            feed: self.feed,
        }
    }
}

fn help_text(opt: &Opt, summary: &Summary) {
    println!(
        "Before print:
        - Set home to the centre of the dome sphere ({}mm below the apex)
        - Load a nozzle for a {}mm bead
        - {} segments, path length {:.1}m
        - Approx print time {:.0} minutes",
        opt.radius * 1000.0,
        opt.bead_width * 1000.0,
        summary.segments,
        summary.path_length,
        summary.print_time,
    );
    if summary.segments > 0 {
        println!(
            "        - Auger speed from {:.2} to {:.2} rpm",
            summary.min_rpm, summary.max_rpm
        );
    }
}

fn main() -> Result<()> {
    let opt = Opt::from_args();
    colony::logging::init()?;

    // Check the geometry before anything touches the filesystem
    let params = opt.params();
    params.validate()?;

    let table = CalibrationTable::load_or_create(&opt.calibration)
        .with_context(|| format!("Loading calibration table {:?}", opt.calibration))?;

    let points = spiral_points(&params)?;
    let segments = plan_segments(&points, &params, &table);
    help_text(&opt, &summarize(&segments, params.feed));

    let mut file = BufWriter::new(
        open_output(&opt.output, opt.overwrite)
            .with_context(|| format!("Opening output {:?}", opt.output))?,
    );
    write_program(&mut file, &opt.name, &points, &segments, params.feed)?;
    file.flush()?;

    info!(path = ?opt.output, "G-code ready");
    Ok(())
}
