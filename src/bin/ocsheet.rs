//! Command-line entry point for the spreadsheet-to-OpenControl converter.
//!
//! `convert` reads exported sheet rows (CSV or JSON) and writes the catalog;
//! `family` and `control` expose the normalizer and parser for spot checks;
//! `validate` re-checks emitted documents against the bundled schema. Logs go
//! to stderr so stdout stays machine-readable.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use opencontrol_sheet::opencontrol::render_catalog;
use opencontrol_sheet::summary::render_listing;
use opencontrol_sheet::{
    ControlParser, IngestConfig, Ingestor, MalformedPolicy, OutputLayout, SheetRow,
    SubEnhancementPolicy, normalize_family, parse_row_stream, read_csv_rows, summarize,
    validate_output_dir, write_catalog,
};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ocsheet")]
#[command(about = "Convert spreadsheet NIST 800-53 control identifiers into an OpenControl catalog")]
#[command(version)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence when set)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a catalog from exported sheet rows
    #[command(after_help = "\
Examples:
  ocsheet convert --input controls.csv --out build/
  ocsheet convert --input rows.ndjson --format json --skip-malformed --summary
  cat controls.csv | ocsheet convert --input - > catalog.json")]
    Convert(ConvertArgs),

    /// Print the canonical code for a family label (empty line when unmapped)
    Family { label: String },

    /// Parse one control identifier and print the resulting entry as JSON
    Control {
        raw: String,

        #[arg(long, value_enum)]
        sub_enhancement: Option<SubEnhancementArg>,
    },

    /// Validate emitted catalog documents in a directory
    Validate { dir: PathBuf },
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Input file, or `-` for stdin
    #[arg(long, short)]
    input: PathBuf,

    #[arg(long, short, value_enum, default_value_t = InputFormat::Csv)]
    format: InputFormat,

    /// Output directory; the catalog is printed to stdout when omitted
    #[arg(long, short)]
    out: Option<PathBuf>,

    #[arg(long, value_enum)]
    layout: Option<LayoutArg>,

    /// TOML config file; falls back to `OCSHEET_CONFIG` when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Record malformed controls and keep going instead of aborting
    #[arg(long)]
    skip_malformed: bool,

    #[arg(long, value_enum)]
    sub_enhancement: Option<SubEnhancementArg>,

    /// Drop the first narrative fragment of controls with several fragments
    #[arg(long)]
    drop_leading_placeholder: bool,

    /// Print a per-family summary to stderr
    #[arg(long)]
    summary: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    Csv,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum LayoutArg {
    Single,
    PerFamily,
}

#[derive(Clone, Copy, ValueEnum)]
enum SubEnhancementArg {
    Collapse,
    Compound,
}

impl From<SubEnhancementArg> for SubEnhancementPolicy {
    fn from(arg: SubEnhancementArg) -> Self {
        match arg {
            SubEnhancementArg::Collapse => SubEnhancementPolicy::Collapse,
            SubEnhancementArg::Compound => SubEnhancementPolicy::Compound,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);
    if let Err(err) = run(cli.command) {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn setup_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Convert(args) => convert(args),
        Command::Family { label } => {
            println!("{}", normalize_family(&label));
            Ok(())
        }
        Command::Control {
            raw,
            sub_enhancement,
        } => {
            let parser = ControlParser::new(sub_enhancement.map(Into::into).unwrap_or_default());
            let entry = parser.parse(&raw)?;
            println!("{}", serde_json::to_string_pretty(&entry)?);
            Ok(())
        }
        Command::Validate { dir } => validate(&dir),
    }
}

fn convert(args: ConvertArgs) -> Result<()> {
    let mut config = IngestConfig::resolve(args.config.as_deref())?;
    apply_overrides(&mut config, &args);

    let rows = read_rows(&args.input, args.format, &config)?;
    info!(rows = rows.len(), "read input rows");

    let mut ingestor = Ingestor::new(&config);
    ingestor.ingest(&rows)?;
    let (catalog, report) = ingestor.finish();

    for skipped in &report.skipped {
        eprintln!("skipped row {}: {}", skipped.row, skipped.reason);
    }

    match &args.out {
        Some(dir) => {
            let written = write_catalog(&catalog, dir, &config.output)?;
            for path in written {
                eprintln!("wrote {}", path.display());
            }
        }
        None => println!("{}", render_catalog(&catalog, config.output.pretty)?),
    }

    if args.summary {
        eprint!("{}", render_listing(&catalog));
        let summary = summarize(&catalog);
        eprintln!(
            "{} rows, {} controls, {} narrative fragments, {} skipped",
            report.rows,
            summary.total_controls,
            summary.total_fragments,
            report.skipped.len()
        );
    }
    Ok(())
}

fn apply_overrides(config: &mut IngestConfig, args: &ConvertArgs) {
    if args.skip_malformed {
        config.on_malformed = MalformedPolicy::Skip;
    }
    if let Some(policy) = args.sub_enhancement {
        config.sub_enhancement = policy.into();
    }
    if args.drop_leading_placeholder {
        config.drop_leading_placeholder = true;
    }
    if let Some(layout) = args.layout {
        config.output.layout = match layout {
            LayoutArg::Single => OutputLayout::Single,
            LayoutArg::PerFamily => OutputLayout::PerFamily,
        };
    }
}

fn read_rows(input: &Path, format: InputFormat, config: &IngestConfig) -> Result<Vec<SheetRow>> {
    let reader: Box<dyn Read> = if input == Path::new("-") {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(input).with_context(|| format!("opening {}", input.display()))?;
        Box::new(BufReader::new(file))
    };

    match format {
        InputFormat::Csv => read_csv_rows(reader, &config.source)
            .with_context(|| format!("reading CSV rows from {}", input.display())),
        InputFormat::Json => {
            let mut buf = String::new();
            let mut reader = reader;
            reader
                .read_to_string(&mut buf)
                .with_context(|| format!("reading {}", input.display()))?;
            parse_row_stream(&buf).with_context(|| format!("parsing rows from {}", input.display()))
        }
    }
}

fn validate(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        bail!("not a directory: {}", dir.display());
    }
    let errors = validate_output_dir(dir)?;
    if errors.is_empty() {
        println!("ok");
        return Ok(());
    }
    for error in &errors {
        eprintln!("{error}");
    }
    bail!("{} problem(s) found in {}", errors.len(), dir.display())
}
