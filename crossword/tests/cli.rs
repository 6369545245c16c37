//! CLI tests for the `crossword` binary.
//!
//! Oracles are local shell commands configured through `crossword.toml`, so
//! the full build → solve → calibrate path runs without network access.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use crossword::core::types::Puzzle;
use crossword::exit_codes;
use crossword::io::config::{CrosswordConfig, OracleSettings, Provider, write_config};
use crossword::io::puzzle_store::{load_puzzle, write_puzzle};
use crossword::test_support::{bravo_air_puzzle, placed};

const BRAVO_REPLY: &str = r#"{"word": "bravo", "row": 0, "column": 1, "isAcross": true, "clue": "clue for bravo"}"#;

fn echo_oracle(name: &str, reply: &str) -> OracleSettings {
    OracleSettings {
        provider: Some(Provider::Command),
        command: vec![
            "sh".to_string(),
            "-c".to_string(),
            format!("cat >/dev/null; printf '%s\\n' '{reply}'"),
        ],
        ..OracleSettings::for_model(name)
    }
}

fn write_test_config(root: &Path, generator_reply: &str) {
    let cfg = CrosswordConfig {
        generator: echo_oracle("local-generator", generator_reply),
        solvers: vec![echo_oracle("local-solver", BRAVO_REPLY)],
        ..CrosswordConfig::default()
    };
    write_config(&root.join("crossword.toml"), &cfg).expect("write config");
}

fn crossword(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_crossword"))
        .current_dir(root)
        .args(args)
        .output()
        .expect("run crossword")
}

#[test]
fn show_prints_grid_and_clues() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_puzzle(&temp.path().join("puzzle.json"), &bravo_air_puzzle()).expect("write");

    let output = crossword(temp.path(), &["show", "puzzle.json", "--grid-size", "10"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("_ b r a v o _ _ _ _\n_ _ _ i _ _ _ _ _ _\n"));
    assert!(stdout.contains("Across\n  (0, 1) clue for bravo [5]"));
    assert!(stdout.contains("Down\n  (0, 3) clue for air [3]"));
}

#[test]
fn show_rejects_puzzle_outside_grid() {
    let temp = tempfile::tempdir().expect("tempdir");
    let puzzle = Puzzle {
        grid_size: 10,
        words: vec![placed("bravo", 0, 8, true)],
    };
    write_puzzle(&temp.path().join("puzzle.json"), &puzzle).expect("write");

    let output = crossword(temp.path(), &["show", "puzzle.json", "--grid-size", "10"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("out of bounds"));
}

#[test]
fn small_grid_is_a_startup_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_test_config(temp.path(), BRAVO_REPLY);

    let output = crossword(temp.path(), &["build", "--grid-size", "9"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(!temp.path().join("output").exists());
}

#[test]
fn unknown_model_is_a_startup_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = crossword(temp.path(), &["build", "--gen-model", "gemini"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
}

#[test]
fn build_writes_first_snapshot() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_test_config(temp.path(), BRAVO_REPLY);

    let output = crossword(temp.path(), &["build", "--grid-size", "10", "--word-count", "1"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));

    let puzzle = load_puzzle(&temp.path().join("output/crossword-0.json"), 10).expect("load");
    assert_eq!(puzzle.answers(), vec!["bravo"]);
}

#[test]
fn build_without_answers_is_partial() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_test_config(temp.path(), r#"{"message": "nothing fits"}"#);

    let output = crossword(
        temp.path(),
        &["build", "--grid-size", "10", "--word-count", "2", "--output", "out"],
    );
    assert_eq!(output.status.code(), Some(exit_codes::PARTIAL));
    let puzzle = load_puzzle(&temp.path().join("out/crossword-0.json"), 10).expect("load");
    assert!(puzzle.words.is_empty());
}

#[test]
fn generate_converges_on_easy_when_solvers_succeed() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_test_config(temp.path(), BRAVO_REPLY);

    let output = crossword(
        temp.path(),
        &[
            "generate",
            "--grid-size",
            "10",
            "--word-count",
            "1",
            "--difficulty",
            "easy",
            "--iterations",
            "2",
        ],
    );
    assert_eq!(
        output.status.code(),
        Some(exit_codes::OK),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Matched easy after 1 iteration(s)"));
    assert!(temp.path().join("output/iterations/1/report.json").is_file());
    assert!(!temp.path().join("output/crossword-1.json").exists());
}

#[test]
fn generate_refines_existing_puzzle_without_converging() {
    let temp = tempfile::tempdir().expect("tempdir");
    // The reviser shares the generator oracle; its reply carries no rewrites.
    write_test_config(temp.path(), r#"{"words": []}"#);
    let puzzle_path = temp.path().join("seed.json");
    write_puzzle(&puzzle_path, &bravo_air_puzzle()).expect("write");

    let output = crossword(
        temp.path(),
        &[
            "generate",
            "--grid-size",
            "10",
            "--difficulty",
            "hard",
            "--puzzle",
            "seed.json",
        ],
    );
    assert_eq!(output.status.code(), Some(exit_codes::NOT_CONVERGED));

    let report = fs::read_to_string(temp.path().join("output/iterations/1/report.json"))
        .expect("report");
    let report: serde_json::Value = serde_json::from_str(&report).expect("parse");
    assert_eq!(report["accuracy"]["bravo"], 1.0);
    assert_eq!(report["decisions"]["bravo"], true);
    let snapshot = load_puzzle(&temp.path().join("output/crossword-1.json"), 10).expect("load");
    assert_eq!(snapshot, bravo_air_puzzle());
}
