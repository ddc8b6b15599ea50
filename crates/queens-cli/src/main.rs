//! Batch experiment runner for the active-sensing queens solver.
//!
//! Loads puzzles from a file, hides a fraction of each board's region colors,
//! solves under a probe budget, and reports per-puzzle and aggregate results.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use queens_core::{loader, ActiveSolver, Position, SolveRecord, SolverConfig};

mod report;
use report::{BatchSummary, PuzzleReport};

#[derive(Parser)]
#[command(
    name = "queens",
    version,
    about = "Active-sensing solver for colored-region queens puzzles"
)]
struct Cli {
    /// Maximum number of puzzles to run.
    #[arg(default_value_t = 100)]
    puzzles: usize,

    /// Fraction of cells to hide before each solve.
    #[arg(default_value_t = 0.3)]
    masking: f64,

    /// Probe budget as a fraction of initially hidden cells.
    #[arg(default_value_t = 0.5)]
    probe_budget: f64,

    /// Puzzle file: each puzzle is its size followed by n*n region ids.
    #[arg(long, default_value = "puzzles.txt")]
    puzzle_file: PathBuf,

    /// Ground-truth solution log, for correctness scoring.
    #[arg(long)]
    solutions: Option<PathBuf>,

    /// Masking RNG seed; omit for a fresh seed each run.
    #[arg(long)]
    seed: Option<u64>,

    /// Write queen placements for solved puzzles to this solution log.
    #[arg(long)]
    write_log: Option<PathBuf>,

    /// Append the aggregate text report to this file.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Print the aggregate summary as JSON instead of text.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = format!(
        "masking {:.0}%, probe budget {:.0}%",
        cli.masking * 100.0,
        cli.probe_budget * 100.0
    );

    let mut boards = loader::load_puzzles(&cli.puzzle_file, Some(cli.puzzles))
        .with_context(|| format!("loading puzzles from {}", cli.puzzle_file.display()))?;
    println!("Loaded {} puzzles ({config})", boards.len());

    let ground_truth = match &cli.solutions {
        Some(path) => load_ground_truth(path)?,
        None => BTreeMap::new(),
    };

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let total = boards.len();
    let mut reports = Vec::with_capacity(total);
    let mut records = Vec::with_capacity(total);

    for (i, board) in boards.iter_mut().enumerate() {
        let index = i + 1;
        let n = board.size();
        board.mask_fraction(cli.masking, &mut rng);
        let initial_masked = board.unknown_count();

        let solver_config = SolverConfig::default().with_budget_fraction(cli.probe_budget);
        let mut solver = ActiveSolver::with_config(board, solver_config);
        let solved = solver.solve();
        if !solved {
            // Leave the deepest partial on the board for scoring
            solver.restore_best_partial();
        }

        let truth = ground_truth.get(&index).map(Vec::as_slice).unwrap_or(&[]);
        let correctness = solver.compare_with_ground_truth(truth);
        let stats = *solver.stats();

        println!(
            "Puzzle {index:>3}/{total} ... {} (Q:{}/{} P:{}/{} I:{} C:{:.0}%)",
            if solved { "SOLVED" } else { "FAILED" },
            board.queen_count(),
            n,
            stats.probe_count,
            stats.probe_limit,
            stats.inferred_count,
            correctness * 100.0,
        );

        records.push(SolveRecord {
            index,
            size: n,
            solved,
            queens: if solved {
                board.queen_positions()
            } else {
                Vec::new()
            },
        });
        reports.push(PuzzleReport {
            index,
            size: n,
            solved,
            queens_placed: board.queen_count(),
            probes_used: stats.probe_count,
            probe_limit: stats.probe_limit,
            inferences: stats.inferred_count,
            backtracks: stats.backtrack_count,
            initial_masked,
            correctness,
        });
    }

    if let Some(path) = &cli.write_log {
        loader::save_solutions(path, &records)
            .with_context(|| format!("writing solution log to {}", path.display()))?;
        info!(path = %path.display(), "solution log written");
    }

    let summary = BatchSummary::from_reports(&reports);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!();
        print!("{}", summary.render_text(&config));
    }

    if let Some(path) = &cli.report {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening report file {}", path.display()))?;
        writeln!(file, "\n{}", summary.render_text(&config))?;
        info!(path = %path.display(), "report appended");
    }

    Ok(())
}

/// Solved blocks from a ground-truth solution log, keyed by puzzle number.
fn load_ground_truth(path: &PathBuf) -> Result<BTreeMap<usize, Vec<Position>>> {
    let records = loader::load_solutions(path)
        .with_context(|| format!("loading solutions from {}", path.display()))?;
    let map: BTreeMap<usize, Vec<Position>> = records
        .into_iter()
        .filter(|rec| rec.solved)
        .map(|rec| (rec.index, rec.queens))
        .collect();
    info!(count = map.len(), "loaded ground-truth solutions");
    Ok(map)
}
