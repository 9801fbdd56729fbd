//! # ROTORSIZE-RS CLI
//!
//! ```bash
//! rotorsize evaluate --model quadrotor
//! rotorsize optimize --config run.toml --strategy stochastic --json outcome.json
//! rotorsize info
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args as ClapArgs, Parser, Subcommand};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use rotorsize_rs::optimizer::{
    CoefficientSpace, Evaluation, ReportExporter, ReportGenerator, TextReporter,
};
use rotorsize_rs::{
    info, BuiltinRepository, DesignCoefficients, EvaluationMode, Evaluator, OptimizationDriver,
    RunConfig, SizingError, SizingModel, SizingResult, Strategy,
};

#[derive(Parser, Debug)]
#[command(name = "rotorsize", version, about = "Multirotor sizing and optimization")]
struct Cli {
    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Size one design and print its report.
    Evaluate(EvaluateArgs),
    /// Search the coefficients for the lightest feasible design.
    Optimize(OptimizeArgs),
    /// Print version, presets and coefficient bounds.
    Info,
}

#[derive(ClapArgs, Debug)]
struct ModelArgs {
    /// TOML run configuration.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Builtin preset (heavy-lift, quadrotor).
    #[arg(long)]
    model: Option<String>,
    /// Eight comma-separated coefficients overriding the initial vector.
    #[arg(long, value_delimiter = ',')]
    coefficients: Option<Vec<f64>>,
}

#[derive(ClapArgs, Debug)]
struct EvaluateArgs {
    #[command(flatten)]
    model: ModelArgs,
    /// Write the structured report as JSON.
    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct OptimizeArgs {
    #[command(flatten)]
    model: ModelArgs,
    /// gradient | stochastic
    #[arg(long)]
    strategy: Option<Strategy>,
    /// Seed of the stochastic strategy.
    #[arg(long)]
    seed: Option<u64>,
    /// Evaluation budget.
    #[arg(long)]
    max_evaluations: Option<usize>,
    /// Write the outcome as JSON.
    #[arg(long)]
    json: Option<PathBuf>,
    /// Write the convergence history as CSV.
    #[arg(long)]
    history: Option<PathBuf>,
}

/// Resolved configuration and starting vector
fn setup(
    args: &ModelArgs,
    repository: &BuiltinRepository,
) -> SizingResult<(RunConfig, DesignCoefficients)> {
    let mut config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    let mut initial = config.initial;
    if let Some(id) = &args.model {
        config.model = Some(id.clone());
        if args.config.is_none() {
            initial = repository.preset(id)?.initial;
        }
    }
    if let Some(values) = &args.coefficients {
        initial = DesignCoefficients::from_slice(values)?;
    }

    let mission = config.resolved_mission(repository)?;
    log::info!(
        "mission: {} kg payload, {} min hover, MTOW {} kg, {} propellers",
        mission.payload_mass,
        mission.autonomy_min,
        mission.mtow,
        mission.architecture.propellers()
    );
    Ok((config, initial))
}

fn evaluate(args: &EvaluateArgs) -> SizingResult<()> {
    let repository = BuiltinRepository::new();
    let (config, initial) = setup(&args.model, &repository)?;
    let model = config
        .build_model(&repository)?
        .with_reporter(Arc::new(TextReporter::stdout()));

    let evaluated = model.evaluate(&initial, EvaluationMode::Report)?;
    if evaluated.degraded {
        log::warn!("mass loop did not converge, report uses the fallback mass");
    }
    if let (Some(path), Evaluation::Report(report)) = (&args.json, &evaluated.value) {
        std::fs::write(path, report.to_json()?)?;
        log::info!("report written to {}", path.display());
    }
    Ok(())
}

fn optimize(args: &OptimizeArgs) -> SizingResult<()> {
    let repository = BuiltinRepository::new();
    let (config, initial) = setup(&args.model, &repository)?;
    let model: SizingModel = config.build_model(&repository)?;

    let mut driver_config = config.driver;
    if let Some(strategy) = args.strategy {
        driver_config.strategy = strategy;
    }
    if let Some(seed) = args.seed {
        driver_config.stochastic.seed = Some(seed);
    }
    if args.max_evaluations.is_some() {
        driver_config.max_evaluations = args.max_evaluations;
    }

    let start = model.solve(&initial)?;
    log::info!(
        "initial design: {:.3} kg, max violation {:.2e}",
        start.objective,
        start.constraints.vector.max_violation()
    );

    let timer = std::time::Instant::now();
    let outcome = OptimizationDriver::new(&model, driver_config).run(&initial)?;
    log::info!("search took {:.2} s", timer.elapsed().as_secs_f64());

    let model = model.with_reporter(Arc::new(TextReporter::stdout()));
    model.report(&outcome.coefficients)?;
    println!("{}", ReportGenerator::optimization_summary(&outcome));

    if let Some(path) = &args.json {
        std::fs::write(path, ReportExporter::outcome_json(&outcome)?)?;
        log::info!("outcome written to {}", path.display());
    }
    if let Some(path) = &args.history {
        std::fs::write(path, ReportExporter::history_csv(&outcome))?;
        log::info!("history written to {}", path.display());
    }
    Ok(())
}

fn print_info() {
    println!("{}", info());
    println!();
    println!("Presets:");
    for preset in BuiltinRepository::new().presets() {
        println!("  {:<12} {}", preset.id, preset.description);
    }
    println!();
    println!("Coefficients:");
    for p in &CoefficientSpace::multirotor().parameters {
        println!("  {:<12} [{:>6}, {:>6}]  {}", p.symbol, p.min, p.max, p.description);
    }
}

fn run(cli: &Cli) -> SizingResult<()> {
    match &cli.command {
        Command::Evaluate(args) => evaluate(args),
        Command::Optimize(args) => optimize(args),
        Command::Info => {
            print_info();
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = TermLogger::init(
        cli.log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ) {
        eprintln!("logger: {}", e);
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ SizingError::OptimizationFailed(_)) => {
            log::error!("{}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
