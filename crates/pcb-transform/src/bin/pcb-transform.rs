//! Command-line driver: load an Eagle board or Gerber layers, then write SVG
//! and CSV outputs.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pcb_transform::{CsvSinks, PcbTransform, RenderOptions, Side};

#[derive(Parser)]
#[command(name = "pcb-transform")]
#[command(about = "Convert Eagle BRD and Gerber files to SVG and CSV", long_about = None)]
#[command(version)]
struct Cli {
    /// Eagle board file
    #[arg(long, value_name = "PATH", conflicts_with = "gerber")]
    brd: Option<PathBuf>,

    /// Gerber layer file as ID=PATH, e.g. GTP=board.GTP (repeatable)
    #[arg(long, value_name = "ID=PATH", value_parser = parse_layer_file)]
    gerber: Vec<(String, PathBuf)>,

    /// Write the board drawing here ("-" for stdout)
    #[arg(long, value_name = "OUT")]
    svg: Option<PathBuf>,

    /// Write the pad table here ("-" for stdout)
    #[arg(long, value_name = "OUT")]
    smd_csv: Option<PathBuf>,

    /// Write the hole table here ("-" for stdout)
    #[arg(long, value_name = "OUT")]
    holes_csv: Option<PathBuf>,

    /// Layer whose side is drawn, e.g. Top or Bottom
    #[arg(long, value_name = "NAME")]
    layer: Option<String>,

    /// Draw pads in the SVG
    #[arg(long)]
    show_smds: bool,

    /// Print a JSON summary of the loaded board
    #[arg(long)]
    summary: bool,

    /// Trace loading progress
    #[arg(short, long)]
    verbose: bool,
}

fn parse_layer_file(raw: &str) -> Result<(String, PathBuf), String> {
    let (id, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ID=PATH, got '{raw}'"))?;
    if id.is_empty() || path.is_empty() {
        return Err(format!("expected ID=PATH, got '{raw}'"));
    }
    Ok((id.to_ascii_uppercase(), PathBuf::from(path)))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn open_output(path: &Path) -> Result<Box<dyn Write>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(io::stdout().lock()));
    }
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    Ok(Box::new(BufWriter::new(file)))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut pcb = PcbTransform::new();
    if let Some(brd) = &cli.brd {
        pcb.load_eagle_brd(brd)?;
    } else if !cli.gerber.is_empty() {
        pcb.load_gerber_layers(cli.gerber.iter().map(|(id, path)| (id, path)))?;
    } else {
        bail!("specify an Eagle board with --brd or Gerber layers with --gerber");
    }

    if let Some(path) = &cli.svg {
        let options = RenderOptions {
            layer: cli.layer.clone(),
            show_smds: cli.show_smds,
            layers: BTreeSet::from([Side::Top]),
        };
        let mut out = open_output(path)?;
        pcb.render_svg(&options, &mut out)?;
        out.flush()?;
    }

    let mut smdpads = cli.smd_csv.as_deref().map(open_output).transpose()?;
    let mut holes = cli.holes_csv.as_deref().map(open_output).transpose()?;
    pcb.render_csv(CsvSinks {
        smdpads: smdpads.as_mut().map(|out| out.as_mut() as &mut dyn Write),
        holes: holes.as_mut().map(|out| out.as_mut() as &mut dyn Write),
    })?;
    for out in [smdpads.as_mut(), holes.as_mut()].into_iter().flatten() {
        out.flush()?;
    }

    if cli.summary {
        println!("{}", serde_json::to_string_pretty(&pcb.summary())?);
    }
    Ok(())
}
