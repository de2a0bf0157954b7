//! xorca - assemble NEMO/ORCA output into a grid-aware dataset.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use xorca::calc::{calculate_moc, calculate_psi, calculate_speed};
use xorca::data::{write_netcdf, AxisSlice, DatasetInput};
use xorca::{load_xorca_dataset, LoadOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Calc {
    /// Meridional overturning stream function
    Moc,
    /// Barotropic stream function
    Psi,
    /// Speed on the centre grid
    Speed,
}

#[derive(Parser, Debug)]
#[command(name = "xorca")]
#[command(about = "Assemble NEMO/ORCA output into a grid-aware dataset", long_about = None)]
struct Args {
    /// Mesh and mask files (repeat for multi-file meshes)
    #[arg(short = 'm', long = "aux", required = true)]
    aux: Vec<PathBuf>,

    /// Model output files
    #[arg(short = 'd', long = "data")]
    data: Vec<PathBuf>,

    /// YAML file with load options
    #[arg(long)]
    config: Option<PathBuf>,

    /// Model configuration selecting the halo trim (GLOBAL, NEST)
    #[arg(long)]
    model_config: Option<String>,

    /// Override the y selection, as start:stop
    #[arg(long, allow_hyphen_values = true)]
    y_slice: Option<AxisSlice>,

    /// Override the x selection, as start:stop
    #[arg(long, allow_hyphen_values = true)]
    x_slice: Option<AxisSlice>,

    /// Keep fill values and packed values as stored
    #[arg(long)]
    no_decode_cf: bool,

    /// Derived quantity to compute from the assembled dataset
    #[arg(long, value_enum)]
    calc: Option<Calc>,

    /// Region suffix for the MOC masks (atl, pac, ind)
    #[arg(long, default_value = "")]
    region: String,

    /// Write the result to this NetCDF file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable logging to specified file
    #[arg(long)]
    log: Option<PathBuf>,
}

fn init_logging(log: Option<&PathBuf>) -> Result<()> {
    match log {
        Some(log_path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(log_path)
                .with_context(|| format!("Failed to open log file {}", log_path.display()))?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(Level::DEBUG)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        None => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
                )
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

fn load_options(args: &Args) -> Result<LoadOptions> {
    let mut opts = match &args.config {
        Some(path) => LoadOptions::from_yaml_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => LoadOptions::default(),
    };
    if let Some(model_config) = &args.model_config {
        opts.model_config = Some(model_config.clone());
    }
    if args.y_slice.is_some() {
        opts.y_slice = args.y_slice;
    }
    if args.x_slice.is_some() {
        opts.x_slice = args.x_slice;
    }
    if args.no_decode_cf {
        opts.decode_cf = false;
    }
    Ok(opts)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log.as_ref())?;
    tracing::info!("Starting xorca");

    for path in args.aux.iter().chain(&args.data) {
        if !path.exists() {
            bail!("Path not found: {}", path.display());
        }
    }

    let opts = load_options(&args)?;
    let aux = match args.aux.as_slice() {
        [single] => DatasetInput::File(single.clone()),
        many => DatasetInput::Files(many.to_vec()),
    };

    let ds = load_xorca_dataset(&args.data, &aux, &opts).context("Failed to assemble dataset")?;
    let result = match args.calc {
        None => ds,
        Some(Calc::Moc) => calculate_moc(&ds, &args.region).context("Failed to compute MOC")?,
        Some(Calc::Psi) => calculate_psi(&ds).context("Failed to compute psi")?,
        Some(Calc::Speed) => calculate_speed(&ds).context("Failed to compute speed")?,
    };

    print!("{}", result);

    if let Some(output) = &args.output {
        write_netcdf(&result, output)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        println!("Wrote {}", output.display());
    }

    tracing::info!("xorca finished");
    Ok(())
}
