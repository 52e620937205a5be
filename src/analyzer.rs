//! This module provides functions for analyzing machine descriptions before any table is
//! built. It checks the start and accept states, and for Turing machines the composition of
//! the input and tape alphabets.

use crate::parser::Description;
use crate::types::{is_blank_token, AutomatonError, MachineKind};
use std::collections::HashSet;

/// Represents the problems that can be found while analyzing a description.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AnalysisError {
    /// The start state is not among the declared states.
    InvalidStartState(String),
    /// An accept state is not among the declared states.
    InvalidAcceptState(String),
    /// A Turing machine reject state is not among the declared states.
    InvalidRejectState(String),
    /// A Turing machine must list exactly two final states.
    FinalStateCount(usize),
    /// A Turing machine's accept and reject states must differ.
    SameAcceptAndReject(String),
    /// A Turing machine input symbol is not exactly one character long.
    InputSymbolLength(String),
    /// A Turing machine input alphabet contains the blank.
    BlankInInputAlphabet,
    /// A Turing machine tape symbol is not exactly one character long.
    TapeSymbolLength(String),
    /// A Turing machine tape alphabet lacks the blank.
    MissingBlank,
    /// Input symbols missing from the Turing machine tape alphabet.
    InputNotInTapeAlphabet(Vec<String>),
}

impl From<AnalysisError> for AutomatonError {
    /// Converts an `AnalysisError` into the matching `AutomatonError`.
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::InvalidStartState(state) => {
                AutomatonError::ValidationError(format!("Invalid start state: {}", state))
            }
            AnalysisError::InvalidAcceptState(state) => {
                AutomatonError::ValidationError(format!("Invalid accept state: {}", state))
            }
            AnalysisError::InvalidRejectState(state) => {
                AutomatonError::ValidationError(format!("Invalid reject state: {}", state))
            }
            AnalysisError::FinalStateCount(count) => AutomatonError::ValidationError(format!(
                "There must be exactly two final states, found {}",
                count
            )),
            AnalysisError::SameAcceptAndReject(state) => AutomatonError::ValidationError(
                format!("Accept and reject states must be different: {}", state),
            ),
            AnalysisError::InputSymbolLength(symbol) => AutomatonError::ValidationError(
                format!("Input symbol must be exactly one character long: {}", symbol),
            ),
            AnalysisError::BlankInInputAlphabet => AutomatonError::ValidationError(
                "Input alphabet cannot contain the blank symbol".to_string(),
            ),
            AnalysisError::TapeSymbolLength(symbol) => AutomatonError::ValidationError(format!(
                "Tape symbol must be exactly one character long: {}",
                symbol
            )),
            AnalysisError::MissingBlank => AutomatonError::ValidationError(
                "Tape alphabet must contain the blank symbol".to_string(),
            ),
            AnalysisError::InputNotInTapeAlphabet(symbols) => AutomatonError::ValidationError(
                format!("Input alphabet is not part of the tape alphabet: {:?}", symbols),
            ),
        }
    }
}

type Check = fn(&Description) -> Result<(), AnalysisError>;

/// Analyzes a `Description` for structural errors.
///
/// The checks depend on the machine kind; the first failing check is reported.
///
/// # Returns
///
/// * `Ok(())` if no errors are found.
/// * `Err(AutomatonError::ValidationError)` if any validation rule is violated.
pub fn analyze(description: &Description) -> Result<(), AutomatonError> {
    let checks: Vec<Check> = match description.kind {
        MachineKind::Nfa | MachineKind::Dpda => vec![check_start_state, check_accept_states],
        MachineKind::Tm => vec![
            check_input_alphabet,
            check_tape_alphabet,
            check_start_state,
            check_halting_states,
        ],
    };

    match checks.iter().find_map(|check| check(description).err()) {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}

fn is_declared(description: &Description, state: &str) -> bool {
    description.states.iter().any(|s| s == state)
}

/// Checks that the start state is one of the declared states.
fn check_start_state(description: &Description) -> Result<(), AnalysisError> {
    if !is_declared(description, &description.start) {
        return Err(AnalysisError::InvalidStartState(description.start.clone()));
    }

    Ok(())
}

/// Checks that every accept state is one of the declared states.
fn check_accept_states(description: &Description) -> Result<(), AnalysisError> {
    description
        .accept
        .iter()
        .find(|state| !is_declared(description, state))
        .map_or(Ok(()), |state| {
            Err(AnalysisError::InvalidAcceptState(state.clone()))
        })
}

/// Checks that a Turing machine lists a valid accept state and a distinct, valid reject state.
fn check_halting_states(description: &Description) -> Result<(), AnalysisError> {
    let [accept, reject] = description.accept.as_slice() else {
        return Err(AnalysisError::FinalStateCount(description.accept.len()));
    };

    if !is_declared(description, accept) {
        return Err(AnalysisError::InvalidAcceptState(accept.clone()));
    }
    if !is_declared(description, reject) {
        return Err(AnalysisError::InvalidRejectState(reject.clone()));
    }
    if accept == reject {
        return Err(AnalysisError::SameAcceptAndReject(accept.clone()));
    }

    Ok(())
}

/// Checks that Turing machine input symbols are single, non-blank characters.
fn check_input_alphabet(description: &Description) -> Result<(), AnalysisError> {
    for symbol in &description.input_alphabet {
        if symbol.chars().count() != 1 {
            return Err(AnalysisError::InputSymbolLength(symbol.clone()));
        }
        if is_blank_token(symbol) {
            return Err(AnalysisError::BlankInInputAlphabet);
        }
    }

    Ok(())
}

/// Checks that the Turing machine tape alphabet holds single characters, the blank,
/// and the whole input alphabet.
fn check_tape_alphabet(description: &Description) -> Result<(), AnalysisError> {
    let tape: HashSet<&str> = description
        .auxiliary_alphabet
        .iter()
        .map(String::as_str)
        .collect();

    if !tape.iter().any(|symbol| is_blank_token(symbol)) {
        return Err(AnalysisError::MissingBlank);
    }

    if let Some(symbol) = description
        .auxiliary_alphabet
        .iter()
        .find(|symbol| symbol.chars().count() != 1)
    {
        return Err(AnalysisError::TapeSymbolLength(symbol.clone()));
    }

    let mut missing: Vec<String> = description
        .input_alphabet
        .iter()
        .filter(|symbol| !tape.contains(symbol.as_str()))
        .cloned()
        .collect();

    if !missing.is_empty() {
        missing.sort(); // Sort for deterministic output
        missing.dedup();
        return Err(AnalysisError::InputNotInTapeAlphabet(missing));
    }

    Ok(())
}
