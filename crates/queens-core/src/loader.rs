//! Puzzle-file and solution-log I/O.
//!
//! A puzzle file is a whitespace-separated token stream: each puzzle is its
//! size `n` followed by `n * n` region ids in row-major order, and puzzles
//! simply follow one another. A solution log holds one block per puzzle:
//!
//! ```text
//! PUZZLE 1 SOLVED
//! SIZE 4
//! 0 1
//! 1 3
//! 2 0
//! 3 2
//! END
//! ```
//!
//! Failed puzzles get a `FAILED` header and an empty block.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use crate::board::{Board, BoardError, Position};

/// Errors from reading or writing puzzle files and solution logs.
#[derive(Debug, Error)]
pub enum PuzzleFileError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("puzzle {index}: file ended before all {expected} region ids")]
    Truncated { index: usize, expected: usize },
    #[error("puzzle {index}: bad token {token:?}")]
    BadToken { index: usize, token: String },
    #[error("puzzle {index}: {source}")]
    Board {
        index: usize,
        #[source]
        source: BoardError,
    },
    #[error("solution log line {line}: {message}")]
    MalformedLog { line: usize, message: String },
}

/// Outcome of one puzzle in a batch, as recorded in a solution log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveRecord {
    /// 1-based puzzle number within the file.
    pub index: usize,
    pub size: usize,
    pub solved: bool,
    /// Queen positions in row order; empty for failed puzzles.
    pub queens: Vec<Position>,
}

// ==================== Puzzle files ====================

/// Parse up to `limit` puzzles from a token stream (all of them if `None`).
pub fn parse_puzzles(text: &str, limit: Option<usize>) -> Result<Vec<Board>, PuzzleFileError> {
    let mut tokens = text.split_whitespace();
    let mut boards = Vec::new();

    while limit.map_or(true, |max| boards.len() < max) {
        let index = boards.len() + 1;
        let Some(head) = tokens.next() else {
            break;
        };
        let n: usize = parse_token(head, index)?;
        let expected = n * n;
        let mut regions = Vec::with_capacity(expected);
        for _ in 0..expected {
            let token = tokens
                .next()
                .ok_or(PuzzleFileError::Truncated { index, expected })?;
            regions.push(parse_token(token, index)?);
        }
        let board =
            Board::new(n, regions).map_err(|source| PuzzleFileError::Board { index, source })?;
        boards.push(board);
    }

    Ok(boards)
}

/// Load puzzles from a file. See [`parse_puzzles`] for the format.
pub fn load_puzzles<P: AsRef<Path>>(
    path: P,
    limit: Option<usize>,
) -> Result<Vec<Board>, PuzzleFileError> {
    let text = fs::read_to_string(path.as_ref())?;
    let boards = parse_puzzles(&text, limit)?;
    debug!(
        path = %path.as_ref().display(),
        count = boards.len(),
        "loaded puzzles"
    );
    Ok(boards)
}

fn parse_token<T: FromStr>(token: &str, index: usize) -> Result<T, PuzzleFileError> {
    token.parse().map_err(|_| PuzzleFileError::BadToken {
        index,
        token: token.to_owned(),
    })
}

// ==================== Solution logs ====================

/// Render solve records in the solution-log format.
pub fn format_solution_log(records: &[SolveRecord]) -> String {
    let mut out = String::new();
    for rec in records {
        let status = if rec.solved { "SOLVED" } else { "FAILED" };
        // Writing to a String cannot fail.
        let _ = writeln!(out, "PUZZLE {} {}", rec.index, status);
        let _ = writeln!(out, "SIZE {}", rec.size);
        for q in &rec.queens {
            let _ = writeln!(out, "{} {}", q.row, q.col);
        }
        out.push_str("END\n");
    }
    out
}

/// Write solve records to a solution-log file, replacing any existing log.
pub fn save_solutions<P: AsRef<Path>>(
    path: P,
    records: &[SolveRecord],
) -> Result<(), PuzzleFileError> {
    fs::write(path.as_ref(), format_solution_log(records))?;
    debug!(
        path = %path.as_ref().display(),
        count = records.len(),
        "wrote solution log"
    );
    Ok(())
}

/// Parse a solution log back into records.
pub fn parse_solutions(text: &str) -> Result<Vec<SolveRecord>, PuzzleFileError> {
    let mut records = Vec::new();
    let mut current: Option<SolveRecord> = None;

    for (lineno, raw) in text.lines().enumerate() {
        let line = lineno + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        match fields.as_slice() {
            ["PUZZLE", index, status] => {
                if current.is_some() {
                    return Err(PuzzleFileError::MalformedLog {
                        line,
                        message: "PUZZLE before END of previous block".into(),
                    });
                }
                let solved = match *status {
                    "SOLVED" => true,
                    "FAILED" => false,
                    other => {
                        return Err(PuzzleFileError::MalformedLog {
                            line,
                            message: format!("unknown status {other:?}"),
                        })
                    }
                };
                current = Some(SolveRecord {
                    index: parse_log_field(index, line)?,
                    size: 0,
                    solved,
                    queens: Vec::new(),
                });
            }
            ["SIZE", n] => {
                let rec = current.as_mut().ok_or_else(|| PuzzleFileError::MalformedLog {
                    line,
                    message: "SIZE outside a PUZZLE block".into(),
                })?;
                rec.size = parse_log_field(n, line)?;
            }
            ["END"] => {
                let rec = current.take().ok_or_else(|| PuzzleFileError::MalformedLog {
                    line,
                    message: "END outside a PUZZLE block".into(),
                })?;
                records.push(rec);
            }
            [row, col] => {
                let rec = current.as_mut().ok_or_else(|| PuzzleFileError::MalformedLog {
                    line,
                    message: "queen position outside a PUZZLE block".into(),
                })?;
                rec.queens.push(Position::new(
                    parse_log_field(row, line)?,
                    parse_log_field(col, line)?,
                ));
            }
            _ => {
                return Err(PuzzleFileError::MalformedLog {
                    line,
                    message: format!("unrecognized line {trimmed:?}"),
                })
            }
        }
    }

    if current.is_some() {
        return Err(PuzzleFileError::MalformedLog {
            line: text.lines().count(),
            message: "log ended inside a PUZZLE block".into(),
        });
    }
    Ok(records)
}

/// Load a solution log from a file.
pub fn load_solutions<P: AsRef<Path>>(path: P) -> Result<Vec<SolveRecord>, PuzzleFileError> {
    let text = fs::read_to_string(path)?;
    parse_solutions(&text)
}

fn parse_log_field<T: FromStr>(token: &str, line: usize) -> Result<T, PuzzleFileError> {
    token.parse().map_err(|_| PuzzleFileError::MalformedLog {
        line,
        message: format!("bad number {token:?}"),
    })
}

// ==================== Tests ====================
