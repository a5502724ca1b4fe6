use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use particle_fingerprint::io::{model, xyz};
use particle_fingerprint::{
    AtomicStructure, ElementSet, FingerprintGenerator, FingerprintKind, FingerprintOptions,
};

// --- CLI Definitions ---

#[derive(Parser, Debug)]
#[command(author, version, about = "Structural fingerprints for atomic clusters", long_about = None)]
struct Args {
    /// XYZ files (multi-frame allowed). Use '-' for standard input.
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<String>,

    /// Fingerprint(s) to compute; several are concatenated in the given order.
    #[arg(short, long, value_enum, default_value = "nn")]
    kind: Vec<KindArg>,

    /// JSON options file; flags below override its values
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// Explicit element set as atomic numbers, e.g. "28,78"
    #[arg(long, value_delimiter = ',')]
    atom_types: Option<Vec<u8>>,

    #[arg(long)]
    max_bonds: Option<usize>,

    /// Rebuild and attach a neighbour list before distribution/connections
    #[arg(long)]
    get_nl: bool,

    /// Margin added to covalent radii for neighbour lists (Å)
    #[arg(long)]
    dx: Option<f64>,

    /// Cubic cell edge imposed before the distribution fingerprint (Å)
    #[arg(long)]
    cell_size: Option<f64>,

    /// Bins of the distribution histogram
    #[arg(long)]
    nbin: Option<usize>,

    /// Bins of each partial RDF
    #[arg(long)]
    nbins: Option<usize>,

    /// Outer radius of each partial RDF (Å)
    #[arg(long)]
    rmax: Option<f64>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Output file; standard output if omitted
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Persist the generator state to <STEM>.json after the run
    #[arg(long, value_name = "STEM")]
    save_state: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    /// Nearest neighbour average
    Nn,
    /// Bond counts by coordination number
    Bonds,
    /// Per-element spatial distribution
    Distribution,
    /// Per-element coordination counts
    Connections,
    /// Partial radial distribution functions
    Rdf,
}

impl From<KindArg> for FingerprintKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Nn => FingerprintKind::NearestNeighbour,
            KindArg::Bonds => FingerprintKind::BondCount,
            KindArg::Distribution => FingerprintKind::Distribution,
            KindArg::Connections => FingerprintKind::Connections,
            KindArg::Rdf => FingerprintKind::Rdf,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// One JSON object with labels and a row per structure
    Json,
    /// Header of labels, one row per structure
    Csv,
}

#[derive(Serialize)]
struct Report<'a> {
    kinds: Vec<&'static str>,
    labels: Option<Vec<String>>,
    fingerprints: &'a [Vec<f64>],
}

// --- Initialization Helpers ---

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // `log` records are bridged into the subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn build_options(args: &Args) -> Result<FingerprintOptions> {
    let mut options: FingerprintOptions = match &args.options {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read options file {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Invalid options file {}", path.display()))?
        }
        None => FingerprintOptions::default(),
    };

    if let Some(types) = &args.atom_types {
        options.atom_types = Some(types.clone());
    }
    if let Some(v) = args.max_bonds {
        options.max_bonds = v;
    }
    if args.get_nl {
        options.get_nl = true;
    }
    if let Some(v) = args.dx {
        options.dx = v;
    }
    if let Some(v) = args.cell_size {
        options.cell_size = v;
    }
    if let Some(v) = args.nbin {
        options.nbin = v;
    }
    if let Some(v) = args.nbins {
        options.nbins = v;
    }
    if let Some(v) = args.rmax {
        options.rmax = v;
    }
    Ok(options)
}

/// Labels for the concatenated layout, when it does not depend on each structure.
fn labels_for(
    generator: &FingerprintGenerator,
    kinds: &[FingerprintKind],
    structures: &[AtomicStructure],
) -> Option<Vec<String>> {
    let explicit = generator.options().atom_types.clone().map(ElementSet::from);
    let mut labels = Vec::new();
    for &kind in kinds {
        let elements = match kind {
            FingerprintKind::Rdf => {
                let first = ElementSet::from_structure(structures.first()?);
                // Partial RDF layout follows each structure's composition.
                if structures.iter().any(|s| ElementSet::from_structure(s) != first) {
                    return None;
                }
                first
            }
            FingerprintKind::Distribution | FingerprintKind::Connections => {
                generator.resolved_elements()?
            }
            _ => explicit.clone()?,
        };
        labels.extend(kind.labels(&elements, generator.options()));
    }
    Some(labels)
}

fn write_report(
    args: &Args,
    kinds: &[FingerprintKind],
    labels: Option<Vec<String>>,
    rows: &[Vec<f64>],
) -> Result<()> {
    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };
    let mut sink = BufWriter::new(sink);

    match args.format {
        OutputFormat::Json => {
            let report = Report {
                kinds: kinds.iter().map(|k| k.name()).collect(),
                labels,
                fingerprints: rows,
            };
            serde_json::to_writer_pretty(&mut sink, &report)?;
            writeln!(sink)?;
        }
        OutputFormat::Csv => {
            if let Some(first) = rows.first() {
                if rows.iter().any(|r| r.len() != first.len()) {
                    bail!("Fingerprints have different lengths; pass --atom-types for a fixed layout");
                }
            }
            let mut writer = csv::Writer::from_writer(&mut sink);
            if let Some(labels) = labels {
                writer.write_record(&labels)?;
            }
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
    }
    sink.flush()?;
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let options = build_options(&args)?;
    let generator = FingerprintGenerator::new(options).context("Invalid fingerprint options")?;
    let kinds: Vec<FingerprintKind> = args.kind.iter().map(|&k| k.into()).collect();

    let mut structures = Vec::new();
    for input in &args.inputs {
        let frames = xyz::read_file(input).with_context(|| format!("Failed to read {}", input))?;
        log::info!("Read {} structure(s) from {}", frames.len(), input);
        structures.extend(frames);
    }
    if structures.is_empty() {
        bail!("No structures found in input");
    }

    let mut rows = vec![Vec::new(); structures.len()];
    for &kind in &kinds {
        let vectors = generator
            .generate_batch(kind, &mut structures)
            .with_context(|| format!("Failed to compute {} fingerprint", kind))?;
        for (row, v) in rows.iter_mut().zip(vectors) {
            row.extend(v);
        }
    }

    let labels = labels_for(&generator, &kinds, &structures);
    write_report(&args, &kinds, labels, &rows)?;

    if let Some(stem) = &args.save_state {
        let path = model::write(stem, &generator.state()).context("Failed to save generator state")?;
        log::info!("Saved generator state to {}", path.display());
    }

    Ok(())
}

// --- Main ---

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
