//! Writes a parametric colony part as an OpenSCAD script, for OpenSCAD to turn into STL
use anyhow::{Context, Result};
use colony::open_output;
use colony::solids::{write_scad, Part, ScadBuilder, SolidBuilder};
use colony::toolpath::MM_PER_M;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use structopt::StructOpt;
use tracing::info;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "colony_part_gen",
    about = "Generates Dawn Colony parts as OpenSCAD scripts"
)]
struct Opt {
    /// Output file for the OpenSCAD script
    #[structopt(short, long, parse(from_os_str))]
    output: PathBuf,

    /// Scale the part from metres to millimetres
    #[structopt(long)]
    millimetres: bool,

    /// Number of facets on curved surfaces
    #[structopt(long, default_value = "96")]
    segments: u32,

    /// Replace the output file if it exists
    #[structopt(long)]
    overwrite: bool,

    #[structopt(subcommand)]
    part: Part,
}

fn help_text(opt: &Opt) {
    println!(
        "To export:
        - openscad -o {}.stl {:?}
        - Units are {}",
        opt.part.title().replace(' ', "_"),
        opt.output,
        if opt.millimetres { "mm" } else { "m" },
    )
}

fn main() -> Result<()> {
    let opt = Opt::from_args();
    colony::logging::init()?;

    let b = ScadBuilder;
    let mut solid = opt
        .part
        .build(&b)
        .with_context(|| format!("Building {}", opt.part.title()))?;
    if opt.millimetres {
        solid = b.scale(solid, MM_PER_M);
    }
    info!(
        part = opt.part.title(),
        primitives = solid.primitives(),
        "built part"
    );

    let mut file = BufWriter::new(
        open_output(&opt.output, opt.overwrite)
            .with_context(|| format!("Opening output {:?}", opt.output))?,
    );
    write_scad(
        &mut file,
        &format!("Dawn Colony - {}", opt.part.title()),
        opt.segments,
        &solid,
    )?;
    file.flush()?;

    help_text(&opt);
    Ok(())
}
