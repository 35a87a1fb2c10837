//! Installment Rate CLI
//!
//! Estimates the implicit rate and outstanding balance of an installment loan

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::path::PathBuf;

use installment_rate::batch::BatchRow;
use installment_rate::loan::load_terms;
use installment_rate::{
    amortization_schedule, AmortizationScheme, BatchRunner, EngineConfig, LoanEngine, LoanEvaluation,
    LoanTerms, PeriodProgress,
};

/// Implicit rate and outstanding balance of Price and SAC installment loans
#[derive(Parser)]
#[command(name = "installment-rate", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the rate and balance of one loan
    Evaluate(EvaluateArgs),
    /// Print the amortization table for a principal and rate
    Schedule(ScheduleArgs),
    /// Evaluate every loan in a CSV file
    Batch(BatchArgs),
}

#[derive(Args)]
struct EngineArgs {
    /// JSON file with engine settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Monthly rate used to estimate an unknown principal (e.g. 0.015)
    #[arg(long)]
    assumed_rate: Option<f64>,

    /// Same as --assumed-rate, given as an annual effective rate (e.g. 0.1956)
    #[arg(long, conflicts_with = "assumed_rate")]
    assumed_annual_rate: Option<f64>,

    /// Newton-Raphson iteration budget
    #[arg(long)]
    max_iterations: Option<u32>,

    /// Newton-Raphson step tolerance
    #[arg(long)]
    tolerance: Option<f64>,
}

#[derive(Args)]
struct EvaluateArgs {
    /// Installment per period (first installment for SAC)
    #[arg(long)]
    installment: f64,

    /// Total number of installments
    #[arg(long)]
    total_periods: u32,

    /// Installments already paid
    #[arg(long, conflicts_with = "remaining", required_unless_present = "remaining")]
    elapsed: Option<u32>,

    /// Installments still to pay
    #[arg(long)]
    remaining: Option<u32>,

    /// Amortization scheme: Price or SAC
    #[arg(long, default_value = "Price")]
    scheme: AmortizationScheme,

    /// Original principal, if known
    #[arg(long)]
    principal: Option<f64>,

    /// Include the balance trajectory
    #[arg(long)]
    trajectory: bool,

    /// Write the balance trajectory to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Args)]
struct ScheduleArgs {
    #[arg(long)]
    principal: f64,

    /// Monthly rate (e.g. 0.015 for 1.5%)
    #[arg(long)]
    rate: f64,

    #[arg(long)]
    periods: u32,

    #[arg(long, default_value = "Price")]
    scheme: AmortizationScheme,
}

#[derive(Args)]
struct BatchArgs {
    /// CSV with loan_id,installment,total_periods,elapsed_periods,remaining_periods,scheme
    input: PathBuf,

    /// Write results as CSV here instead of printing them
    #[arg(long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    engine: EngineArgs,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Evaluate(args) => run_evaluate(args, cli.json),
        Commands::Schedule(args) => run_schedule(args, cli.json),
        Commands::Batch(args) => run_batch(args, cli.json),
    }
}

/// File settings, then environment, then command-line flags
fn engine_config(args: &EngineArgs) -> Result<EngineConfig> {
    let base = match &args.config {
        Some(path) => EngineConfig::from_json_path(path)
            .map_err(|e| anyhow!("{}", e))
            .with_context(|| format!("reading engine config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let mut config = base.with_env_overrides();
    if let Some(rate) = args.assumed_rate {
        config.assumed_market_rate = rate;
    }
    if let Some(annual) = args.assumed_annual_rate {
        config = config.with_assumed_annual_rate(annual);
    }
    if let Some(max) = args.max_iterations {
        config.solver.max_iterations = max;
    }
    if let Some(tolerance) = args.tolerance {
        config.solver.tolerance = tolerance;
    }
    Ok(config)
}

fn run_evaluate(args: EvaluateArgs, json: bool) -> Result<()> {
    let progress = match (args.elapsed, args.remaining) {
        (Some(k), _) => PeriodProgress::Elapsed(k),
        (None, Some(k)) => PeriodProgress::Remaining(k),
        (None, None) => return Err(anyhow!("one of --elapsed or --remaining is required")),
    };
    let terms = LoanTerms::new(args.installment, args.total_periods, progress, args.scheme);

    let mut config = engine_config(&args.engine)?;
    config.include_trajectory = args.trajectory || args.csv.is_some();
    let engine = LoanEngine::new(config);

    let evaluation = match args.principal {
        Some(principal) => engine.evaluate_with_principal(&terms, principal),
        None => engine.evaluate(&terms),
    }
    .context("could not evaluate the loan")?;

    if let (Some(path), Some(trajectory)) = (&args.csv, &evaluation.trajectory) {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        trajectory.write_csv(file)?;
        eprintln!("Trajectory written to: {}", path.display());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
    } else {
        print_evaluation(&evaluation, args.trajectory);
    }
    Ok(())
}

fn print_evaluation(evaluation: &LoanEvaluation, with_trajectory: bool) {
    let terms = &evaluation.terms;
    let summary = evaluation.summary();

    println!("Loan Evaluation ({})", terms.scheme);
    println!("======================\n");
    println!("  Installment:          {:.2}", terms.installment);
    println!("  Total periods:        {}", terms.total_periods);
    println!("  Elapsed / remaining:  {} / {}", evaluation.elapsed_periods, evaluation.remaining_periods);
    println!();
    println!("  Principal estimate:   {:.2}", summary.principal_estimate);
    println!("  Monthly rate:         {:.4}%", summary.monthly_rate_pct);
    println!("  Annual rate:          {:.2}%", summary.annual_rate_pct);
    println!("  Outstanding balance:  {:.2}", summary.current_balance);
    println!("  Payoff amount:        {:.2}", summary.payoff_amount);
    println!("  Next installment:     {:.2}", evaluation.next_installment);
    println!("  Solver iterations:    {}", evaluation.rate.iterations);

    if !with_trajectory {
        return;
    }
    if let Some(trajectory) = &evaluation.trajectory {
        println!("\n{:>6} {:>14}", "Period", "Balance");
        println!("{}", "-".repeat(21));
        for point in trajectory.iter().take(24) {
            println!("{:>6} {:>14.2}", point.period, point.balance);
        }
        if trajectory.len() > 24 {
            println!("... ({} more periods)", trajectory.len() - 24);
        }
    }
}

fn run_schedule(args: ScheduleArgs, json: bool) -> Result<()> {
    let rows = amortization_schedule(args.principal, args.rate, args.periods, args.scheme)
        .context("could not build the amortization schedule")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{:>6} {:>14} {:>14} {:>14} {:>14}", "Period", "Installment", "Interest", "Amortization", "Balance");
    println!("{}", "-".repeat(66));
    for row in &rows {
        println!(
            "{:>6} {:>14.2} {:>14.2} {:>14.2} {:>14.2}",
            row.period, row.installment, row.interest, row.amortization, row.balance
        );
    }

    let total_interest: f64 = rows.iter().map(|r| r.interest).sum();
    println!("\nTotal interest: {:.2}", total_interest);
    Ok(())
}

fn run_batch(args: BatchArgs, json: bool) -> Result<()> {
    let records = load_terms(&args.input)
        .map_err(|e| anyhow!("{}", e))
        .with_context(|| format!("loading loans from {}", args.input.display()))?;

    let runner = BatchRunner::new(engine_config(&args.engine)?);
    let outcomes = runner.run(&records);

    if json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
        return Ok(());
    }

    let rows: Vec<BatchRow> = outcomes.iter().map(BatchRow::from).collect();
    match &args.output {
        Some(path) => {
            let mut writer = csv::Writer::from_path(path)
                .with_context(|| format!("creating {}", path.display()))?;
            for row in &rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
            println!("{} results written to: {}", rows.len(), path.display());
        }
        None => {
            println!("{:<12} {:>6} {:>10} {:>10} {:>14} {:>14}", "Loan", "Scheme", "Monthly%", "Annual%", "Principal", "Balance");
            println!("{}", "-".repeat(71));
            for row in &rows {
                match &row.error {
                    Some(error) => println!("{:<12} {}", row.loan_id, error),
                    None => println!(
                        "{:<12} {:>6} {:>10.4} {:>10.2} {:>14.2} {:>14.2}",
                        row.loan_id,
                        row.scheme,
                        row.periodic_rate.unwrap_or_default() * 100.0,
                        row.annualized_rate.unwrap_or_default() * 100.0,
                        row.principal_estimate.unwrap_or_default(),
                        row.current_balance.unwrap_or_default(),
                    ),
                }
            }
        }
    }
    Ok(())
}
