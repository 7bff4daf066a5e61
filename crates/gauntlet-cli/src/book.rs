//! Opening book loading.
//!
//! Books are tab-separated text files: a header line, then one opening per
//! row with the move prefix in the third column as space-separated
//! coordinate moves (e.g. `e2e4 c7c5 g1f3`). The loader only splits; every
//! prefix is still legality-checked when the game starts.

use std::path::Path;

use thiserror::Error;

use gauntlet::openings::OpeningSet;

/// Errors loading an opening book file.
#[derive(Error, Debug)]
pub enum BookError {
    /// The book file could not be read.
    #[error("failed to read opening book: {0}")]
    Read(#[from] std::io::Error),
    /// A data row does not have the expected columns.
    #[error("malformed opening book line {line}: missing moves column")]
    MissingColumn {
        /// One-based line number of the offending row.
        line: usize,
    },
    /// The book contains no openings at all.
    #[error("opening book is empty")]
    Empty,
}

/// Loads a tab-separated opening book.
pub fn load<P: AsRef<Path>>(path: P) -> Result<OpeningSet, BookError> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

fn parse(content: &str) -> Result<OpeningSet, BookError> {
    let mut prefixes = Vec::new();
    // First line is the header.
    for (index, line) in content.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let moves_column = line
            .split('\t')
            .nth(2)
            .ok_or(BookError::MissingColumn { line: index + 1 })?;
        let prefix: Vec<String> = moves_column
            .split_whitespace()
            .map(str::to_string)
            .collect();
        prefixes.push(prefix);
    }
    if prefixes.is_empty() {
        return Err(BookError::Empty);
    }
    Ok(OpeningSet::from_prefixes(prefixes))
}
