//! Puzzle snapshot load/save with schema validation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::core::types::{PlacedWord, Puzzle};
use crate::io::schema::Schema;

/// On-disk shape of a puzzle. The grid size is not stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PuzzleFile {
    words: Vec<PlacedWord>,
}

/// `<dir>/crossword-<iteration>.json`
pub fn snapshot_path(dir: &Path, iteration: u32) -> PathBuf {
    dir.join(format!("crossword-{iteration}.json"))
}

/// Write `puzzle` as pretty JSON with a trailing newline.
pub fn write_puzzle(path: &Path, puzzle: &Puzzle) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let file = PuzzleFile {
        words: puzzle.words.clone(),
    };
    let mut buf = serde_json::to_string_pretty(&file)?;
    buf.push('\n');
    fs::write(path, buf).with_context(|| format!("write puzzle {}", path.display()))
}

/// Persist `output/crossword-<iteration>.json` and return its path.
pub fn write_snapshot(dir: &Path, iteration: u32, puzzle: &Puzzle) -> Result<PathBuf> {
    let path = snapshot_path(dir, iteration);
    write_puzzle(&path, puzzle)?;
    info!(path = %path.display(), words = puzzle.words.len(), "wrote puzzle snapshot");
    Ok(path)
}

/// Load and schema-validate a puzzle file.
pub fn load_puzzle(path: &Path, grid_size: usize) -> Result<Puzzle> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read puzzle {}", path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("parse puzzle {}", path.display()))?;
    Schema::puzzle()?
        .check(&value)
        .map_err(|err| anyhow!("{}: {err}", path.display()))?;
    let file: PuzzleFile = serde_json::from_value(value)
        .with_context(|| format!("deserialize puzzle {}", path.display()))?;
    Ok(Puzzle {
        grid_size,
        words: file.words,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placed(word: &str, row: i64, column: i64, is_across: bool) -> PlacedWord {
        PlacedWord {
            word: word.to_string(),
            row,
            column,
            is_across,
            clue: format!("clue for {word}"),
        }
    }

    #[test]
    fn snapshot_paths_are_numbered() {
        let path = snapshot_path(Path::new("output"), 3);
        assert_eq!(path, Path::new("output/crossword-3.json"));
    }

    #[test]
    fn write_then_load_preserves_word_order() {
        let temp = tempfile::tempdir().expect("tempdir");
        let puzzle = Puzzle {
            grid_size: 10,
            words: vec![placed("bravo", 0, 1, true), placed("air", 0, 3, false)],
        };
        let path = write_snapshot(temp.path(), 0, &puzzle).expect("write");
        assert!(path.ends_with("crossword-0.json"));

        let contents = fs::read_to_string(&path).expect("read");
        assert!(contents.ends_with("}\n"));
        assert!(contents.contains("\"isAcross\": true"));

        let loaded = load_puzzle(&path, 10).expect("load");
        assert_eq!(loaded, puzzle);
    }

    #[test]
    fn load_rejects_missing_fields() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("bad.json");
        fs::write(&path, r#"{"words": [{"word": "air", "row": 0}]}"#).expect("write");
        let err = load_puzzle(&path, 10).unwrap_err();
        assert!(err.to_string().contains("schema validation failed"));
    }
}
