use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use gocov_coverage::summary::{render_text, summarize};
use gocov_coverage::{trace, PackageCoverage, Report};
use gocov_extents::{DiscoveryConfig, ExtentDiscoverer};
use gocov_instrument::{
    instrumented_package_path, InstrumentConfig, Instrumenter, DEFAULT_REGISTRY_IMPORT,
};
use gocov_profile::{parse_profiles, IngestConfig, Ingester, SourceResolver};
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

mod input;

#[derive(Parser)]
#[command(name = "gocov")]
#[command(about = "Coverage testing for Go", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for output)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite Go source files to report coverage when run
    Instrument(InstrumentArgs),

    /// Build a coverage report from trace logs of instrumented programs
    Trace(TraceArgs),

    /// Build a coverage report from Go cover profiles
    Convert(ConvertArgs),

    /// Merge coverage reports
    Merge(MergeArgs),

    /// Print a text summary of a coverage report
    Report(ReportArgs),

    /// Dump the function and statement extents of a Go file as JSON
    Extents(ExtentsArgs),
}

#[derive(Args)]
struct InstrumentArgs {
    /// Import path of the package the files belong to
    #[arg(long)]
    package: String,

    /// Output directory; instrumented files land in <out>/<import path>/.
    /// Without it the single input file is written to stdout
    #[arg(long)]
    out: Option<PathBuf>,

    /// Only track statements, not function entry and exit
    #[arg(long)]
    no_functions: bool,

    /// Import path of the coverage registry package
    #[arg(long, default_value = DEFAULT_REGISTRY_IMPORT)]
    registry: String,

    /// Rewrite an import path, as old=new (repeatable)
    #[arg(long, value_parser = input::parse_rewrite)]
    rewrite: Vec<(String, String)>,

    /// Go source files of the package
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Args)]
struct TraceArgs {
    /// Worker threads (0 = one per CPU)
    #[arg(long, default_value_t = 0)]
    jobs: usize,

    /// Trace logs written by instrumented programs
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Args)]
struct ConvertArgs {
    /// Directory profile file names are resolved against
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Module path stripped from profile file names (defaults to go.mod under --root)
    #[arg(long)]
    module: Option<String>,

    /// Worker threads (0 = one per CPU)
    #[arg(long, default_value_t = 0)]
    jobs: usize,

    /// Cover profiles (`go test -coverprofile`)
    #[arg(required = true)]
    profiles: Vec<PathBuf>,
}

#[derive(Args)]
struct MergeArgs {
    /// JSON coverage reports
    #[arg(required = true)]
    reports: Vec<PathBuf>,
}

#[derive(Args)]
struct ReportArgs {
    /// JSON coverage report (reads stdin when omitted)
    report: Option<PathBuf>,
}

#[derive(Args)]
struct ExtentsArgs {
    /// Go source file
    file: PathBuf,

    /// Ignore function literals outside function bodies
    #[arg(long)]
    no_literals: bool,

    /// Pretty-print JSON
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Instrument(args) => run_instrument(args),
        Commands::Trace(args) => run_trace(args),
        Commands::Convert(args) => run_convert(args),
        Commands::Merge(args) => run_merge(args),
        Commands::Report(args) => run_report(args),
        Commands::Extents(args) => run_extents(args),
    }
}

fn run_instrument(args: InstrumentArgs) -> Result<()> {
    if args.out.is_none() && args.files.len() > 1 {
        bail!("--out is required to instrument more than one file");
    }
    let config = InstrumentConfig {
        track_functions: !args.no_functions,
        registry_import: args.registry.clone(),
        rewrite_imports: args.rewrite.into_iter().collect(),
        ..InstrumentConfig::default()
    };
    let mut instrumenter = Instrumenter::new(config).context("Invalid instrument options")?;
    let out_dir = args
        .out
        .as_ref()
        .map(|out| out.join(instrumented_package_path(&args.registry, &args.package)));

    for path in &args.files {
        let file_name = path
            .file_name()
            .with_context(|| format!("{} is not a file", path.display()))?
            .to_string_lossy()
            .into_owned();
        let src = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let instrumented = instrumenter
            .instrument_file(&args.package, &file_name, &src)
            .with_context(|| format!("Failed to instrument {}", path.display()))?;
        log::info!(
            "{}: {} functions, {} statements",
            path.display(),
            instrumented.functions,
            instrumented.statements
        );

        match &out_dir {
            Some(dir) => {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
                let target = dir.join(&file_name);
                fs::write(&target, &instrumented.source)
                    .with_context(|| format!("Failed to write {}", target.display()))?;
            }
            None => print!("{}", instrumented.source),
        }
    }
    Ok(())
}

fn run_trace(args: TraceArgs) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.jobs)
        .build()?;
    let decoded: Vec<_> = pool.install(|| {
        args.files
            .par_iter()
            .map(|path| trace::decode_trace_file(path))
            .collect()
    });

    let mut report = Report::new();
    for (path, result) in args.files.iter().zip(decoded) {
        match result {
            Ok(packages) => merge_packages(&mut report, packages, path),
            Err(err) if err.is_fatal() => {
                return Err(err).with_context(|| format!("Corrupt trace {}", path.display()));
            }
            Err(err) => log::warn!("skipping {}: {err}", path.display()),
        }
    }
    report.write_to(io::stdout().lock())?;
    Ok(())
}

fn run_convert(args: ConvertArgs) -> Result<()> {
    let root = args
        .root
        .canonicalize()
        .with_context(|| format!("Invalid root {}", args.root.display()))?;
    let module = match args.module {
        Some(module) => Some(module),
        None => input::module_from_go_mod(&root)?,
    };
    log::debug!("resolving profiles against {} (module {module:?})", root.display());

    // Concatenated profiles repeat their mode line; the parser combines
    // blocks reported by more than one of them.
    let mut text = String::new();
    for path in &args.profiles {
        text.push_str(&input::read_input(Some(path.as_path()))?);
        text.push('\n');
    }
    let profiles = parse_profiles(&text).context("Invalid cover profile")?;

    let ingester = Ingester::new(
        IngestConfig {
            jobs: args.jobs,
            ..IngestConfig::default()
        },
        SourceResolver::new(module, root),
    )?;
    let ingested = ingester.ingest(&profiles)?;
    if !ingested.skipped.is_empty() {
        log::warn!("{} of {} files skipped", ingested.skipped.len(), profiles.len());
    }

    let report: Report = ingested.packages.into_iter().collect();
    report.write_to(io::stdout().lock())?;
    Ok(())
}

fn run_merge(args: MergeArgs) -> Result<()> {
    let mut report = Report::new();
    for path in &args.reports {
        let next = Report::from_json(&input::read_input(Some(path.as_path()))?)
            .with_context(|| format!("Invalid report {}", path.display()))?;
        merge_packages(&mut report, next.into_packages(), path);
    }
    report.write_to(io::stdout().lock())?;
    Ok(())
}

fn run_report(args: ReportArgs) -> Result<()> {
    let text = input::read_input(args.report.as_deref())?;
    let report = Report::from_json(&text).context("Invalid report")?;
    print!("{}", render_text(&summarize(report.packages())));
    Ok(())
}

fn run_extents(args: ExtentsArgs) -> Result<()> {
    let discoverer = ExtentDiscoverer::new(DiscoveryConfig {
        top_level_literals: !args.no_literals,
        ..DiscoveryConfig::default()
    })?;
    let funcs = discoverer
        .discover_file(&args.file)
        .with_context(|| format!("Failed to analyze {}", args.file.display()))?;
    let json = if args.pretty {
        serde_json::to_string_pretty(&funcs)?
    } else {
        serde_json::to_string(&funcs)?
    };
    println!("{json}");
    Ok(())
}

fn merge_packages(report: &mut Report, packages: Vec<PackageCoverage>, source: &Path) {
    for package in packages {
        let name = package.name.clone();
        if let Err(err) = report.merge_package(package) {
            log::warn!("{}: skipping package {name}: {err}", source.display());
        }
    }
}
