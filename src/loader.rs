//! This module provides the `DescriptionLoader` struct, responsible for loading machine
//! descriptions from files and strings, and the batch-input reader that turns a case count
//! followed by comma separated lines into input cases.

use crate::parser::{parse, Description};
use crate::types::{AutomatonError, MachineKind, MAX_DESCRIPTION_SIZE};
use std::fs;
use std::io::Read;
use std::path::Path;

/// `DescriptionLoader` is a utility struct for loading machine descriptions.
pub struct DescriptionLoader;

impl DescriptionLoader {
    /// Loads a machine description of the given kind from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(Description)` if the file is successfully read and parsed.
    /// * `Err(AutomatonError::FileError)` if the file cannot be read or is too large.
    /// * `Err(AutomatonError::ParseError)` if the file content is not a valid description.
    pub fn load(path: &Path, kind: MachineKind) -> Result<Description, AutomatonError> {
        let content = fs::read_to_string(path).map_err(|e| {
            AutomatonError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        if content.len() > MAX_DESCRIPTION_SIZE {
            return Err(AutomatonError::FileError(format!(
                "Description {} exceeds the maximum size of {} bytes",
                path.display(),
                MAX_DESCRIPTION_SIZE
            )));
        }

        parse(&content, kind)
    }

    /// Loads a description, inferring its kind from the file extension.
    pub fn load_inferred(path: &Path) -> Result<Description, AutomatonError> {
        let kind = MachineKind::from_path(path).ok_or_else(|| {
            AutomatonError::FileError(format!(
                "Cannot infer machine kind of {}: expected a .nfa, .dpda or .tm file",
                path.display()
            ))
        })?;

        Self::load(path, kind)
    }

    /// Loads a description from the provided string content.
    pub fn load_from_string(
        content: &str,
        kind: MachineKind,
    ) -> Result<Description, AutomatonError> {
        parse(content, kind)
    }

    /// Reads a batch of input cases from a file.
    pub fn load_batch(path: &Path) -> Result<Vec<Vec<String>>, AutomatonError> {
        let file = fs::File::open(path).map_err(|e| {
            AutomatonError::FileError(format!("Failed to open file {}: {}", path.display(), e))
        })?;

        read_batch(file)
    }
}

/// Reads a whole batch of input cases from `reader`.
pub fn read_batch<R: Read>(mut reader: R) -> Result<Vec<Vec<String>>, AutomatonError> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| AutomatonError::FileError(format!("Failed to read input: {}", e)))?;

    parse_batch(&text)
}

/// Parses a batch: a case count, then one comma separated line per case.
///
/// An empty line is the empty input. Cases missing at the end of the text are treated as
/// empty inputs.
pub fn parse_batch(text: &str) -> Result<Vec<Vec<String>>, AutomatonError> {
    let mut lines = text.lines().skip_while(|line| line.trim().is_empty());

    let Some(header) = lines.next() else {
        return Ok(Vec::new());
    };

    let count = header.trim().parse::<usize>().map_err(|_| {
        AutomatonError::BatchError(format!("Expected a case count, found {:?}", header))
    })?;

    Ok((0..count)
        .map(|_| lines.next().map(split_case).unwrap_or_default())
        .collect())
}

/// Splits one input line into symbol tokens.
fn split_case(line: &str) -> Vec<String> {
    if line.trim().is_empty() {
        return Vec::new();
    }

    line.split(',').map(|token| token.trim().to_string()).collect()
}
