//! Create, inspect and query the auger calibration table
use anyhow::{Context, Result};
use colony::calibration::CalibrationTable;
use colony::toolpath::required_flow;
use std::path::PathBuf;
use structopt::StructOpt;
use tracing::info;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "auger_cal",
    about = "Creates and queries the auger rpm to flow calibration table"
)]
struct Opt {
    /// Calibration table (CSV)
    #[structopt(short, long, parse(from_os_str), default_value = "auger_calibration.csv")]
    calibration: PathBuf,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Write the default table, unless there is a table already
    Init {
        /// Replace an existing table with the default one
        #[structopt(long)]
        force: bool,
    },
    /// Print the table
    Show,
    /// Auger speed for a volumetric flow
    Lookup {
        /// Required flow, in the table's flow units
        #[structopt(long)]
        flow: f64,
    },
    /// Flow and auger speed for a single printed segment
    Segment {
        /// Segment length, in m
        #[structopt(long)]
        length: f64,

        /// Bead width, in m
        #[structopt(long, default_value = "0.03")]
        bead_width: f64,

        /// Feed rate, in mm/min
        #[structopt(long, default_value = "1800")]
        feed: f64,
    },
}

fn load(opt: &Opt) -> Result<CalibrationTable> {
    CalibrationTable::load(&opt.calibration).with_context(|| {
        format!(
            "Loading calibration table {:?} (run `auger_cal init` to create one)",
            opt.calibration
        )
    })
}

fn main() -> Result<()> {
    let opt = Opt::from_args();
    colony::logging::init()?;

    match &opt.cmd {
        Command::Init { force } => {
            if *force {
                CalibrationTable::default_auger().save(&opt.calibration)?;
                info!(path = ?opt.calibration, "default calibration written");
            } else if !CalibrationTable::ensure(&opt.calibration)? {
                println!(
                    "{:?} already exists, leaving it alone (use --force to replace it)",
                    opt.calibration
                );
            }
        }
        Command::Show => {
            let table = load(&opt)?;
            println!("{:>10} {:>14}", "RPM", "Q_m3_per_min");
            for p in table.points() {
                println!("{:>10.2} {:>14.6}", p.rpm, p.flow);
            }
        }
        Command::Lookup { flow } => {
            let table = load(&opt)?;
            let (lo, hi) = table.flow_range();
            if *flow < lo || *flow > hi {
                println!("(flow {flow} is outside the table, {lo} to {hi}: clamped)");
            }
            println!("{:.2}", table.rpm_for_flow(*flow));
        }
        Command::Segment {
            length,
            bead_width,
            feed,
        } => {
            let table = load(&opt)?;
            let flow = required_flow(*bead_width, *length, *feed);
            println!("flow {flow:.8}, auger {:.2} rpm", table.rpm_for_flow(flow));
        }
    }

    Ok(())
}
