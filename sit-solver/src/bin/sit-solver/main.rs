mod model_file;
mod result;

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use log::error;
use log::info;
use log::warn;
use log::LevelFilter;
use model_file::parse_model;
use model_file::ModelFile;
use result::SitResult;
use sit_solver::convert_case::Case;
use sit_solver::statistics::configure_statistic_logging;

#[derive(Debug, Parser)]
#[command(
    help_template = "\
{before-help}{name} {version}
Authors: {author}
About: {about}

{usage-heading}\n{tab}{usage}

{all-args}{after-help}
",
    author,
    version,
    about,
    arg_required_else_help = true
)]
struct Args {
    /// The model to optimise, in the line-based format:
    ///   dimensions <nc> <c> <constraints>
    ///   precision <eta> [<epsilon>]
    ///   threshold <gamma0>
    ///   bound nc <idx> <lb> <ub>
    ///   bound c <idx> <lb> [<ub>]
    ///   objective numer nc=<v,..> c=<v,..> const=<v>
    ///   objective denom nc=<v,..> c=<v,..> const=<v>
    ///   constraint <idx> <le|ge|eq> <rhs> nc=<v,..> c=<v,..>
    ///   logterm <idx> <plus|minus> nc=<..> c=<..> const=<v> dc=<..> dcconst=<v>
    #[clap(verbatim_doc_comment)]
    model_path: PathBuf,

    /// The improvement step between two incumbents; overrides the `precision` of the model.
    ///
    /// Possible values: f64 > 0
    #[arg(long, verbatim_doc_comment)]
    eta: Option<f64>,

    /// The pruning tolerance; defaults to `eta * 1e-3`.
    ///
    /// Possible values: f64 > 0
    #[arg(long, verbatim_doc_comment)]
    epsilon: Option<f64>,

    /// The value the first incumbent has to reach; overrides the `threshold` of the model.
    ///
    /// Possible values: f64
    #[arg(long = "initial-threshold", allow_negative_numbers = true, verbatim_doc_comment)]
    initial_threshold: Option<f64>,

    /// Save the search to this file periodically, and resume from it if it exists.
    #[arg(long, verbatim_doc_comment)]
    checkpoint: Option<PathBuf>,

    /// The number of seconds between two checkpoints.
    ///
    /// Possible values: u64
    #[arg(long = "checkpoint-interval", default_value_t = 600, verbatim_doc_comment)]
    checkpoint_interval: u64,

    /// Keep the checkpoint once the search has finished.
    ///
    /// Possible values: bool
    #[arg(long = "keep-checkpoint", verbatim_doc_comment)]
    keep_checkpoint: bool,

    /// Log a progress line every this many iterations; 0 disables progress lines.
    ///
    /// Possible values: u64
    #[arg(long = "output-every", default_value_t = 1000, verbatim_doc_comment)]
    output_every: u64,

    /// Enables log message output from the solver.
    ///
    /// Possible values: bool
    #[arg(short = 'v', long = "verbose", verbatim_doc_comment)]
    verbose: bool,

    /// Enables logging of statistics from the solver.
    ///
    /// Possible values: bool
    #[arg(short = 's', long = "log-statistics", verbatim_doc_comment)]
    log_statistics: bool,
}

fn configure_logging(verbose: bool, log_statistics: bool) -> std::io::Result<()> {
    if log_statistics {
        configure_statistic_logging(
            "%%%sit-stat:",
            Some("%%%sit-stat-end"),
            Some(Case::Camel),
            None,
        );
    }
    let level_filter = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .format(move |buf, record| {
            write!(buf, "% ")?;

            writeln!(buf, "{}", record.args())
        })
        .filter_level(level_filter)
        .target(env_logger::Target::Stdout)
        .init();
    info!("Logging successfully configured");
    Ok(())
}

fn main() {
    match run() {
        Ok(()) => {}
        Err(e) => {
            error!("Execution failed, error: {e}");
            std::process::exit(1);
        }
    }
}

fn run() -> SitResult<()> {
    let args = Args::parse();
    configure_logging(args.verbose, args.log_statistics)?;

    if sit_solver::asserts::SIT_ASSERT_LEVEL_DEFINITION >= sit_solver::asserts::SIT_ASSERT_MODERATE
    {
        warn!(
            "Potential performance degradation: the assert level is set to {}, meaning many debug asserts are active which may result in performance degradation.",
            sit_solver::asserts::SIT_ASSERT_LEVEL_DEFINITION
        );
    };

    let source = std::fs::read_to_string(&args.model_path)?;
    let ModelFile {
        mut solver,
        precision,
        threshold,
    } = parse_model(&source)?;

    let (model_eta, model_epsilon) = precision.unwrap_or((solver.eta(), None));
    solver.set_precision(
        args.eta.unwrap_or(model_eta),
        args.epsilon.or(model_epsilon),
    )?;
    if let Some(gamma) = args.initial_threshold.or(threshold) {
        solver.set_initial_threshold(gamma);
    }
    solver.set_output_every(args.output_every);
    if let Some(path) = &args.checkpoint {
        solver.enable_checkpoint(path, Duration::from_secs(args.checkpoint_interval));
    }

    let result = solver.optimise()?;
    println!("{result}");

    if args.log_statistics {
        solver.log_statistics();
    }
    if args.checkpoint.is_some() && !args.keep_checkpoint {
        solver.remove_checkpoint()?;
    }

    Ok(())
}
