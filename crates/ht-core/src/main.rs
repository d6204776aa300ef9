//! Hypotest - exponential hypothesis-test significance sweeps
//!
//! The main entry point, handling:
//! - `sweep`: load two measurement files and compute the equal-error
//!   significance curve over measurements per experiment
//! - `generate`: write a reproducible exponential sample file
//! - `version`: print version information

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use ht_common::error::format_error_human;
use ht_common::{Error, OutputFormat, StructuredError};
use ht_core::config::{load_sweep_config, SweepConfig};
use ht_core::events::{JsonlWriter, ProgressEmitter};
use ht_core::exit_codes::ExitCode;
use ht_core::log_event;
use ht_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFormat, LogLevel, Stage,
};
use ht_core::measurement::generate::DEFAULT_SEED;
use ht_core::measurement::{
    load_hypothesis, write_sample_file, GenerateParams, Hypothesis, HypothesisPair,
};
use ht_core::report::{render_report, PlotOptions, SweepReport, REPORT_SCHEMA_VERSION};
use ht_core::run_sweep;

/// Hypotest - significance of an exponential-rate hypothesis test vs. sample size
#[derive(Parser)]
#[command(name = "hypotest")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true, arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Omit timestamps from human-format log lines
    #[arg(long, global = true)]
    no_timestamps: bool,

    /// Log format on stderr (human or jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the equal-error significance curve for two measurement files
    Sweep(SweepArgs),

    /// Generate an exponentially distributed measurement file
    Generate(GenerateArgs),

    /// Print version information
    Version,
}

#[derive(Args, Debug)]
struct SweepArgs {
    /// Number of experiments per test
    #[arg(long, visible_alias = "nexp", allow_negative_numbers = true)]
    n_exp: Option<i64>,

    /// Max measurements per experiment (exclusive bound on M)
    #[arg(long, allow_negative_numbers = true)]
    mpe: Option<i64>,

    /// Measurements per experiment increment [default: 1]
    #[arg(long, allow_negative_numbers = true)]
    step: Option<i64>,

    /// Worker threads for the sweep [default: 1]
    #[arg(long, short = 'j', allow_negative_numbers = true)]
    jobs: Option<i64>,

    /// Input data for hypothesis 0
    #[arg(long = "h0", value_name = "FILE")]
    h0: Option<PathBuf>,

    /// Input data for hypothesis 1
    #[arg(long = "h1", value_name = "FILE")]
    h1: Option<PathBuf>,

    /// Sweep config file (TOML or JSON); falls back to HT_CONFIG, then XDG
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the rendered report to a file instead of stdout
    #[arg(long, short = 'o', value_name = "FILE")]
    output: Option<PathBuf>,

    /// Logarithmic alpha axis for --format plot
    #[arg(long)]
    log_scale: bool,

    /// Emit JSONL progress events on stderr
    #[arg(long)]
    progress: bool,

    /// Plot width in columns
    #[arg(long, default_value_t = 60)]
    width: usize,

    /// Plot height in rows
    #[arg(long, default_value_t = 16)]
    height: usize,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Event rate (events per second)
    #[arg(long, allow_negative_numbers = true)]
    rate: f64,

    /// Number of time measurements
    #[arg(long, allow_negative_numbers = true)]
    measures: i64,

    /// Random seed
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Output file
    #[arg(long, short = 'o', value_name = "FILE")]
    output: PathBuf,

    /// Emit JSONL progress events on stderr
    #[arg(long)]
    progress: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            std::process::exit(code.as_i32());
        }
    };

    let cli_level = if cli.global.quiet {
        Some(LogLevel::Error)
    } else {
        match cli.global.verbose {
            0 => None,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    };
    init_logging(
        &LogConfig::from_env(cli_level, cli.global.log_format)
            .with_timestamps(!cli.global.no_timestamps),
    );

    let ctx = LogContext::new(generate_run_id());

    let result = match &cli.command {
        Commands::Sweep(args) => run_sweep_command(&cli.global, args, &ctx),
        Commands::Generate(args) => run_generate(&cli.global, args, &ctx),
        Commands::Version => {
            print_version(&cli.global);
            Ok(())
        }
    };

    let exit_code = match result {
        Ok(()) => ExitCode::Clean,
        Err(err) => output_error(&cli.global, &ctx, &err),
    };

    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Command implementations
// ============================================================================

fn run_sweep_command(
    global: &GlobalOpts,
    args: &SweepArgs,
    ctx: &LogContext,
) -> ht_common::Result<()> {
    let span = tracing::info_span!("sweep", run_id = %ctx.run_id, stage = %Stage::Sweep);
    let _guard = span.enter();

    log_event!(
        ctx,
        INFO,
        event_names::RUN_STARTED,
        Stage::Init,
        "Starting sweep command"
    );
    let started = Instant::now();

    let loaded = load_sweep_config(args.config.as_deref())?;
    match &loaded.path {
        Some(path) => log_event!(
            ctx,
            INFO,
            event_names::CONFIG_LOADED,
            Stage::Init,
            "Loaded sweep config",
            path = tracing::field::display(path.display())
        ),
        None => log_event!(
            ctx,
            DEBUG,
            event_names::CONFIG_DEFAULT_USED,
            Stage::Init,
            "No sweep config file; using CLI flags only"
        ),
    }

    let cli_config = SweepConfig {
        n_exp: args.n_exp,
        mpe: args.mpe,
        step: args.step,
        jobs: args.jobs,
        h0: args.h0.clone(),
        h1: args.h1.clone(),
    };
    let resolved = loaded.config.clone().merge(cli_config).resolve()?;
    let required = resolved.params.required_measurements()?;

    let pair = HypothesisPair::new(
        load_logged(ctx, &resolved.h0, 0, required)?,
        load_logged(ctx, &resolved.h1, 1, required)?,
    );

    let progress_writer = args.progress.then(|| JsonlWriter::new(std::io::stderr()));
    let progress = progress_writer
        .as_ref()
        .map(|writer| writer as &dyn ProgressEmitter);

    let curve = run_sweep(&resolved.params, &pair, progress)?;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let mut report = SweepReport::new(ctx.run_id.clone(), &resolved.params, &pair, &curve, elapsed_ms);
    if let (Some(path), Some(sha256)) = (loaded.path, loaded.sha256) {
        report = report.with_config(path, sha256);
    }

    let plot = PlotOptions {
        width: args.width,
        height: args.height,
        log_scale: args.log_scale,
    };
    let rendered = render_report(&report, global.format, &plot)?;
    write_output(args.output.as_deref(), &rendered)?;

    log_event!(
        ctx,
        INFO,
        event_names::RUN_FINISHED,
        Stage::Render,
        "Sweep finished",
        points = report.points.len() as u64,
        elapsed_ms = elapsed_ms
    );
    Ok(())
}

fn load_logged(
    ctx: &LogContext,
    path: &Path,
    index: usize,
    required: usize,
) -> ht_common::Result<Hypothesis> {
    log_event!(
        ctx,
        INFO,
        event_names::LOAD_HYPOTHESIS,
        Stage::Load,
        format!("Reading data set {}", index),
        path = tracing::field::display(path.display()),
        required = required as u64
    );
    load_hypothesis(path, index, required)
}

fn run_generate(
    global: &GlobalOpts,
    args: &GenerateArgs,
    ctx: &LogContext,
) -> ht_common::Result<()> {
    let span = tracing::info_span!("generate", run_id = %ctx.run_id, stage = %Stage::Generate);
    let _guard = span.enter();

    let params = GenerateParams::new(args.rate, args.measures, args.seed)?;
    log_event!(
        ctx,
        INFO,
        event_names::RUN_STARTED,
        Stage::Generate,
        "Generating sample file",
        rate = params.rate,
        count = params.count as u64,
        seed = params.seed
    );

    let progress_writer = args.progress.then(|| JsonlWriter::new(std::io::stderr()));
    let progress = progress_writer
        .as_ref()
        .map(|writer| writer as &dyn ProgressEmitter);
    write_sample_file(&args.output, &params, progress)?;

    match global.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "schema_version": REPORT_SCHEMA_VERSION,
                "run_id": ctx.run_id,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "output": args.output.display().to_string(),
                "rate": params.rate,
                "measures": params.count,
                "seed": params.seed,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        _ => {
            println!(
                "Wrote {} measurements (rate {}, seed {}) to {}",
                params.count,
                params.rate,
                params.seed,
                args.output.display()
            );
        }
    }
    Ok(())
}

fn print_version(global: &GlobalOpts) {
    let version_info = serde_json::json!({
        "schema_version": REPORT_SCHEMA_VERSION,
        "hypotest_version": env!("CARGO_PKG_VERSION"),
        "rust_version": env!("CARGO_PKG_RUST_VERSION"),
    });

    match global.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&version_info).unwrap_or_default()
            );
        }
        _ => {
            println!("hypotest {}", env!("CARGO_PKG_VERSION"));
            println!("report schema version: {}", REPORT_SCHEMA_VERSION);
        }
    }
}

/// Write a rendered payload to `path`, or stdout when none is given.
fn write_output(path: Option<&Path>, rendered: &str) -> ht_common::Result<()> {
    let newline = if rendered.ends_with('\n') { "" } else { "\n" };
    match path {
        Some(path) => std::fs::write(path, format!("{}{}", rendered, newline))?,
        None => print!("{}{}", rendered, newline),
    }
    Ok(())
}

fn output_error(global: &GlobalOpts, ctx: &LogContext, err: &Error) -> ExitCode {
    let exit_code = ExitCode::from(err);
    log_event!(
        ctx,
        ERROR,
        event_names::RUN_FAILED,
        Stage::Init,
        "Run failed",
        code = err.code() as u64,
        exit_code = exit_code.code_name()
    );

    match global.format {
        OutputFormat::Json => {
            let structured = StructuredError::from(err)
                .with_context("run_id", &ctx.run_id)
                .with_context("exit_code", exit_code.as_i32());
            println!("{}", structured.to_json_pretty());
        }
        _ => {
            let use_color = !global.no_color && std::io::stderr().is_terminal();
            eprintln!("{}", format_error_human(err, use_color));
        }
    }

    exit_code
}
