//! Oracle-driven crossword builder and difficulty calibrator.
//!
//! `generate` builds a puzzle with the generator oracle and then refines its
//! clues until a panel of solver oracles finds it as hard as requested.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crossword::agents::generator::GeneratorAgent;
use crossword::agents::reviser::ReviserAgent;
use crossword::build::{BuildConfig, BuildOutcome, build_and_store};
use crossword::core::calibration::score_accuracy;
use crossword::core::grid::compute_occupancy;
use crossword::core::types::{Difficulty, MIN_GRID_SIZE, Puzzle};
use crossword::evaluate::{SolverSpec, evaluate_all};
use crossword::exit_codes;
use crossword::io::config::{CrosswordConfig, DEFAULT_CONFIG_FILE, OracleSettings, load_config};
use crossword::io::log_sink::LogSink;
use crossword::io::oracle::{Oracle, build_oracle};
use crossword::io::puzzle_store::{load_puzzle, write_snapshot};
use crossword::logging;
use crossword::looping::{CalibrationConfig, LoopStop, run_loop};
use crossword::solve::SolveConfig;

#[derive(Parser)]
#[command(
    name = "crossword",
    version,
    about = "Build crosswords with an LLM and calibrate their difficulty against solver LLMs"
)]
struct Cli {
    /// Config file (defaults apply when it does not exist).
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Output directory; overrides `[output] dir`.
    #[arg(long, global = true)]
    output: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a puzzle, then rewrite clues toward the target difficulty.
    Generate {
        #[command(flatten)]
        build: BuildArgs,
        #[arg(long, value_enum, default_value_t = DifficultyArg::Medium)]
        difficulty: DifficultyArg,
        /// Calibration iterations.
        #[arg(long, default_value_t = 1)]
        iterations: u32,
        /// Refine an existing puzzle file instead of building one.
        #[arg(long)]
        puzzle: Option<PathBuf>,
    },
    /// Build a puzzle and write `crossword-0.json`.
    Build(BuildArgs),
    /// Run every solver once and print per-agent results and accuracy.
    Solve {
        puzzle: PathBuf,
        #[arg(long, default_value_t = 15)]
        grid_size: usize,
    },
    /// Print the grid and clue list of a puzzle file.
    Show {
        puzzle: PathBuf,
        #[arg(long, default_value_t = 15)]
        grid_size: usize,
    },
}

#[derive(Args)]
struct BuildArgs {
    /// Generator model; `[generator]` from the config when omitted.
    #[arg(long, value_enum)]
    gen_model: Option<GenModel>,
    #[arg(long, default_value_t = 15)]
    grid_size: usize,
    #[arg(long, default_value_t = 10)]
    word_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GenModel {
    Claude,
    Gpt,
    Llama,
    Mistral,
}

impl GenModel {
    fn model_name(self) -> &'static str {
        match self {
            GenModel::Claude => "claude-3-5-sonnet-latest",
            GenModel::Gpt => "gpt-4o",
            GenModel::Llama => "llama-3.3-70b-versatile",
            GenModel::Mistral => "mistral-large-latest",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DifficultyArg {
    Easy,
    Medium,
    Hard,
}

impl From<DifficultyArg> for Difficulty {
    fn from(arg: DifficultyArg) -> Self {
        match arg {
            DifficultyArg::Easy => Difficulty::Easy,
            DifficultyArg::Medium => Difficulty::Medium,
            DifficultyArg::Hard => Difficulty::Hard,
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if !err.use_stderr() {
                err.exit();
            }
            let _ = err.print();
            process::exit(exit_codes::INVALID);
        }
    };
    logging::init();

    match run(cli) {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            process::exit(exit_codes::INVALID);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let cfg = load_config(&cli.config).with_context(|| format!("load {}", cli.config.display()))?;
    let output_dir = cli.output.unwrap_or_else(|| cfg.output.dir.clone());
    match cli.command {
        Command::Generate {
            build,
            difficulty,
            iterations,
            puzzle,
        } => cmd_generate(
            &cfg,
            &output_dir,
            &build,
            difficulty.into(),
            iterations,
            puzzle.as_deref(),
        ),
        Command::Build(build) => cmd_build(&cfg, &output_dir, &build),
        Command::Solve { puzzle, grid_size } => cmd_solve(&cfg, &puzzle, grid_size),
        Command::Show { puzzle, grid_size } => cmd_show(&puzzle, grid_size),
    }
}

fn validate_build_args(build: &BuildArgs) -> Result<()> {
    validate_grid_size(build.grid_size)?;
    if build.word_count == 0 {
        bail!("--word-count must be > 0");
    }
    Ok(())
}

fn validate_grid_size(grid_size: usize) -> Result<()> {
    if grid_size < MIN_GRID_SIZE {
        bail!("--grid-size must be at least {MIN_GRID_SIZE}, got {grid_size}");
    }
    Ok(())
}

fn generator_settings(cfg: &CrosswordConfig, build: &BuildArgs) -> OracleSettings {
    match build.gen_model {
        Some(model) => OracleSettings {
            model: model.model_name().to_string(),
            provider: None,
            base_url: None,
            api_key_env: None,
            ..cfg.generator.clone()
        },
        None => cfg.generator.clone(),
    }
}

fn solver_specs(cfg: &CrosswordConfig) -> Result<Vec<SolverSpec>> {
    cfg.solvers
        .iter()
        .map(|settings| {
            Ok(SolverSpec {
                name: settings.label().to_string(),
                oracle: build_oracle(settings)
                    .with_context(|| format!("configure solver {}", settings.label()))?,
            })
        })
        .collect()
}

/// Load a puzzle file and check that it forms a valid grid.
fn load_valid_puzzle(path: &Path, grid_size: usize) -> Result<Puzzle> {
    validate_grid_size(grid_size)?;
    let puzzle = load_puzzle(path, grid_size)?;
    compute_occupancy(&puzzle.words, grid_size)
        .with_context(|| format!("{} does not fit a {grid_size}x{grid_size} grid", path.display()))?;
    Ok(puzzle)
}

fn build_with(
    cfg: &CrosswordConfig,
    output_dir: &Path,
    build: &BuildArgs,
    oracle: Arc<dyn Oracle>,
) -> Result<BuildOutcome> {
    let mut generator = GeneratorAgent::new(oracle)?;
    let config = BuildConfig::new(build.grid_size, build.word_count, &cfg.build);
    let (outcome, path) = build_and_store(&mut generator, &config, output_dir)?;
    println!(
        "Placed {}/{} words -> {}",
        outcome.placed,
        build.word_count,
        path.display()
    );
    Ok(outcome)
}

fn cmd_build(cfg: &CrosswordConfig, output_dir: &Path, build: &BuildArgs) -> Result<i32> {
    validate_build_args(build)?;
    let oracle = build_oracle(&generator_settings(cfg, build)).context("configure generator")?;
    let outcome = build_with(cfg, output_dir, build, oracle)?;
    print!("{}", format_puzzle(&outcome.puzzle)?);
    Ok(if outcome.complete {
        exit_codes::OK
    } else {
        exit_codes::PARTIAL
    })
}

fn cmd_generate(
    cfg: &CrosswordConfig,
    output_dir: &Path,
    build: &BuildArgs,
    target: Difficulty,
    iterations: u32,
    puzzle_path: Option<&Path>,
) -> Result<i32> {
    validate_build_args(build)?;
    let generator = build_oracle(&generator_settings(cfg, build)).context("configure generator")?;
    let solvers = solver_specs(cfg)?;
    let reviser = ReviserAgent::new(generator.clone())?;

    let (puzzle, complete) = match puzzle_path {
        Some(path) => {
            let puzzle = load_valid_puzzle(path, build.grid_size)?;
            write_snapshot(output_dir, 0, &puzzle)?;
            (puzzle, true)
        }
        None => {
            let outcome = build_with(cfg, output_dir, build, generator)?;
            (outcome.puzzle, outcome.complete)
        }
    };

    let config = CalibrationConfig {
        target,
        max_iterations: iterations,
        solve: SolveConfig::from(&cfg.solve),
        workers: cfg.solve.workers,
        output_dir: output_dir.to_path_buf(),
    };
    let outcome = run_loop(puzzle, &solvers, &reviser, &config, |report| {
        println!(
            "Iteration {}: {} agents, {} clues flagged, {} rewritten",
            report.iteration,
            report.agents.len(),
            report.decisions.values().filter(|rewrite| **rewrite).count(),
            report.rewritten.len()
        );
    })?;

    print!("{}", format_puzzle(&outcome.puzzle)?);
    print!("{}", format_accuracy(&outcome.accuracy));
    let converged = matches!(outcome.stop, LoopStop::Converged { .. });
    match outcome.stop {
        LoopStop::Converged { iteration } => println!("Matched {target} after {iteration} iteration(s)"),
        LoopStop::IterationsExhausted { max_iterations } => {
            println!("Did not match {target} within {max_iterations} iteration(s)");
        }
    }

    Ok(if !complete {
        exit_codes::PARTIAL
    } else if converged {
        exit_codes::OK
    } else {
        exit_codes::NOT_CONVERGED
    })
}

fn cmd_solve(cfg: &CrosswordConfig, path: &Path, grid_size: usize) -> Result<i32> {
    let puzzle = load_valid_puzzle(path, grid_size)?;
    let solvers = solver_specs(cfg)?;
    let sink = LogSink::new();
    let reports = evaluate_all(
        &solvers,
        &puzzle,
        &SolveConfig::from(&cfg.solve),
        cfg.solve.workers,
        &sink,
    )?;

    for report in &reports {
        println!(
            "{}: Correct {}/{}",
            report.agent,
            report.response.solved.len(),
            puzzle.words.len()
        );
    }
    let responses: Vec<_> = reports.into_iter().map(|report| report.response).collect();
    print!("{}", format_accuracy(&score_accuracy(&puzzle, &responses)));
    Ok(exit_codes::OK)
}

fn cmd_show(path: &Path, grid_size: usize) -> Result<i32> {
    let puzzle = load_valid_puzzle(path, grid_size)?;
    print!("{}", format_puzzle(&puzzle)?);
    Ok(exit_codes::OK)
}

/// Grid drawing followed by the across and down clues.
fn format_puzzle(puzzle: &Puzzle) -> Result<String> {
    let occupancy = compute_occupancy(&puzzle.words, puzzle.grid_size)?;
    let mut out = occupancy.render(puzzle.grid_size);
    for (heading, across) in [("Across", true), ("Down", false)] {
        let clues: Vec<_> = puzzle
            .words
            .iter()
            .filter(|word| word.is_across == across)
            .collect();
        if clues.is_empty() {
            continue;
        }
        out.push('\n');
        out.push_str(heading);
        out.push('\n');
        for word in clues {
            out.push_str(&format!(
                "  ({}, {}) {} [{}]\n",
                word.row,
                word.column,
                word.clue,
                word.word.chars().count()
            ));
        }
    }
    Ok(out)
}

fn format_accuracy(accuracy: &BTreeMap<String, f64>) -> String {
    let mut out = String::from("\nAccuracy\n");
    for (word, value) in accuracy {
        out.push_str(&format!("  {word}: {value:.2}\n"));
    }
    out
}
