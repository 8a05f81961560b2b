use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use bj_app::{
    AppError, AppResult, SweepOptions, SweepProgressEvent, SweepReport, SweepRequest, SweepStage,
    SweepTimingSummary, run_sweep_with_progress, simulate_pair,
};
use bj_config::RunConfig;
use bj_results::{PlotFormat, TrajectorySeries};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "bj-cli")]
#[command(about = "Bungee jump simulator - cord stiffness and damping sweeps", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the stiffness x loss-factor sweep
    Run {
        /// Config file (.yaml, .yml or .json); built-in defaults when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output CSV path for the summary table
        #[arg(long, default_value = "bungee_jump_data.csv")]
        csv: PathBuf,
        /// Render position/velocity/acceleration plots to this file
        #[arg(long)]
        plot: Option<PathBuf>,
        /// Force SVG output regardless of the plot file extension
        #[arg(long)]
        svg: bool,
        /// Solve pairs one at a time instead of on the thread pool
        #[arg(long)]
        serial: bool,
        /// Also print the summary rows as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate a config file
    Validate {
        /// Path to the config file
        config_path: PathBuf,
    },
    /// Write the default config to a file
    Init {
        /// Destination (.yaml, .yml or .json)
        config_path: PathBuf,
    },
    /// Simulate a single pair and export its time series
    Trajectory {
        /// Cord stiffness K in N/m
        #[arg(long)]
        stiffness: f64,
        /// Damping loss factor eta
        #[arg(long)]
        loss_factor: f64,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            csv,
            plot,
            svg,
            serial,
            json,
        } => cmd_run(config.as_deref(), &csv, plot.as_deref(), svg, !serial, json),
        Commands::Validate { config_path } => cmd_validate(&config_path),
        Commands::Init { config_path } => cmd_init(&config_path),
        Commands::Trajectory {
            stiffness,
            loss_factor,
            config,
            output,
        } => cmd_trajectory(stiffness, loss_factor, config.as_deref(), output.as_deref()),
    }
}

fn load_or_default(config_path: Option<&Path>) -> AppResult<RunConfig> {
    match config_path {
        Some(path) => Ok(bj_config::load_config(path)?),
        None => Ok(RunConfig::default()),
    }
}

fn cmd_validate(config_path: &Path) -> AppResult<()> {
    println!("Validating config: {}", config_path.display());
    let config = bj_config::load_config(config_path)?;
    println!("✓ Config is valid");
    println!(
        "  {} stiffness x {} loss factor values, {} samples over {:.1} s",
        config.stiffness_values().len(),
        config.loss_factor_values().len(),
        config.time.samples,
        config.time.t_end_s
    );
    Ok(())
}

fn cmd_init(config_path: &Path) -> AppResult<()> {
    bj_config::save_config(config_path, &RunConfig::default())?;
    println!("✓ Wrote default config to {}", config_path.display());
    Ok(())
}

fn cmd_run(
    config_path: Option<&Path>,
    csv_path: &Path,
    plot_path: Option<&Path>,
    force_svg: bool,
    parallel: bool,
    json: bool,
) -> AppResult<()> {
    let config = load_or_default(config_path)?;
    println!("Running sweep: {}", config.name);

    let request = SweepRequest {
        config: &config,
        options: SweepOptions {
            parallel,
            keep_trajectories: plot_path.is_some(),
        },
    };

    let mut last_emit = Instant::now();
    let mut last_stage = None;
    let report = run_sweep_with_progress(
        &request,
        Some(&mut |event| {
            let emit_now =
                last_stage != Some(event.stage) || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                last_stage = Some(event.stage);
                last_emit = Instant::now();
            }
        }),
    )?;
    clear_progress_line();

    let records = report.records();
    if let Err(err) = bj_results::write_summary_csv(csv_path, &records) {
        warn!(path = %csv_path.display(), error = %err, "CSV write failed, printing table");
        bj_results::write_summary(io::stdout().lock(), &records)?;
        return Err(err.into());
    }
    println!("✓ Wrote {} rows to {}", records.len(), csv_path.display());

    if json {
        serde_json::to_writer_pretty(io::stdout().lock(), &records).map_err(io::Error::from)?;
        println!();
    }

    if let Some(path) = plot_path {
        let format = if force_svg {
            PlotFormat::Svg
        } else {
            PlotFormat::from_path(path).unwrap_or(PlotFormat::Svg)
        };
        let series: Vec<TrajectorySeries> = report.trajectories().into_iter().cloned().collect();
        bj_results::render_plots(path, format, &series, &report.reference_lines())?;
        info!(path = %path.display(), "wrote plot");
        println!("✓ Wrote plot to {}", path.display());
    }

    print_timing_summary(&report.timing);
    print_equilibria(&report);

    let failures = report.failures();
    if failures.is_empty() {
        return Ok(());
    }
    println!("\nFailed pairs:");
    for f in &failures {
        println!(
            "  #{} K={} eta={}: {}",
            f.index, f.stiffness, f.loss_factor, f.error
        );
    }
    Err(AppError::SweepIncomplete {
        failed: failures.len(),
        total: report.grid.len(),
    })
}

fn cmd_trajectory(
    stiffness: f64,
    loss_factor: f64,
    config_path: Option<&Path>,
    output: Option<&Path>,
) -> AppResult<()> {
    let config = load_or_default(config_path)?;
    let run = simulate_pair(&config, stiffness, loss_factor)?;

    match output {
        Some(path) => {
            bj_results::write_trajectory_csv(path, &run.series)?;
            let r = &run.record;
            println!(
                "✓ Exported {} samples to {}",
                run.series.len(),
                path.display()
            );
            println!(
                "  max |a| = {:.3} m/s^2 at {:.3} s, max |v| = {:.3} m/s at {:.3} s, min z = {:.3} m at {:.3} s",
                r.max_acc, r.max_acc_time, r.max_vel, r.max_vel_time, r.min_pos, r.min_pos_time
            );
        }
        None => bj_results::write_trajectory(io::stdout().lock(), &run.series)?,
    }
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(100));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &SweepProgressEvent) {
    match event.stage {
        SweepStage::Simulating if event.total > 0 => {
            let width = 28usize;
            let fraction = event.fraction_complete();
            let filled = ((fraction * width as f64).round() as usize).min(width);
            let bar = format!(
                "{}{}",
                "#".repeat(filled),
                "-".repeat(width.saturating_sub(filled))
            );
            print!(
                "\r[{}] {:>3}/{:<3} {}  elapsed={:.1}s",
                bar,
                event.completed,
                event.total,
                event.message.as_deref().unwrap_or(""),
                event.elapsed_wall_s
            );
        }
        _ => {
            let spinner = ['|', '/', '-', '\\'];
            let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
            let mut line = format!(
                "\r{} {}  elapsed={:.2}s",
                spinner[spin_idx],
                event.stage.label(),
                event.elapsed_wall_s
            );
            if let Some(msg) = &event.message {
                line.push_str(&format!("  {}", msg));
            }
            print!("{}", line);
        }
    }
    let _ = io::stdout().flush();
}

fn print_timing_summary(timing: &SweepTimingSummary) {
    let total = timing.total_time_s.max(1.0e-12);
    let build_pct = 100.0 * timing.build_time_s / total;
    let sim_pct = 100.0 * timing.simulate_time_s / total;

    println!("\nTiming summary:");
    println!("  Build:    {:.3}s ({:.1}%)", timing.build_time_s, build_pct);
    println!(
        "  Simulate: {:.3}s ({:.1}%)",
        timing.simulate_time_s, sim_pct
    );
    println!("  Total:    {:.3}s", timing.total_time_s);
    println!(
        "  Pairs:    {} ({} failed, {})",
        timing.pairs,
        timing.failed_pairs,
        if timing.parallel { "parallel" } else { "serial" }
    );
    println!("  RHS calls: {}", timing.rhs_calls);
    println!(
        "  Steps:    {} accepted, {} rejected",
        timing.accepted_steps, timing.rejected_steps
    );
}

fn print_equilibria(report: &SweepReport) {
    println!("\nEquilibrium positions:");
    for (k, z) in report.equilibrium_positions() {
        println!("  K={:>7.1} N/m  z_eq={:.3} m", k, z);
    }
}
