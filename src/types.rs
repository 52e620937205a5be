//! This module defines the core data structures and types shared by the three interpreters,
//! including states and symbols, machine kinds, run results, verdicts, and error types.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::parser::Description;
use crate::Rule;

/// The description token reserved for epsilon in NFA and DPDA descriptions.
pub const EPSILON_TOKEN: &str = "e";
/// The description token reserved for the blank cell in Turing machine descriptions.
pub const BLANK_TOKEN: &str = "_";
/// A single space also denotes the blank cell, as in `Z:0, ` or `T:q0, ,qa, ,R`.
pub const SPACE_BLANK_TOKEN: &str = " ";
/// The maximum allowed size for a machine description in bytes.
pub const MAX_DESCRIPTION_SIZE: usize = 65536; // 64KB
/// The maximum number of steps a Turing machine executes before giving up.
pub const MAX_EXECUTION_STEPS: usize = 1000;

/// A machine state. Cloning is cheap; the name is shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct State(Arc<str>);

impl State {
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for State {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// An alphabet symbol.
///
/// Epsilon and the blank cell are sentinels rather than named symbols, so an alphabet
/// may not accidentally collide with them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    /// No input consumed, or no stack symbol required/pushed.
    Epsilon,
    /// An unwritten Turing machine tape cell.
    Blank,
    /// A declared alphabet symbol.
    Named(Arc<str>),
}

impl Symbol {
    pub fn named(name: &str) -> Self {
        Symbol::Named(Arc::from(name))
    }

    pub fn is_epsilon(&self) -> bool {
        matches!(self, Symbol::Epsilon)
    }

    /// Returns `true` when `self` and `other` could both match one concrete lookup,
    /// i.e. they are equal or either of them is epsilon.
    pub fn overlaps(&self, other: &Symbol) -> bool {
        self == other || self.is_epsilon() || other.is_epsilon()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Epsilon => f.write_str(EPSILON_TOKEN),
            Symbol::Blank => f.write_str(BLANK_TOKEN),
            Symbol::Named(name) => f.write_str(name),
        }
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Whether a Turing machine token denotes the blank cell.
pub fn is_blank_token(token: &str) -> bool {
    token == BLANK_TOKEN || token == SPACE_BLANK_TOKEN
}

/// Represents the possible directions a Turing machine head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one cell to the left, stopping at the first cell.
    Left,
    /// Move the head one cell to the right, growing the tape when needed.
    Right,
}

/// The three supported machine families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MachineKind {
    Nfa,
    Dpda,
    Tm,
}

impl MachineKind {
    /// Infers the machine kind from a description file extension (`.nfa`, `.dpda`, `.tm`).
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "nfa" => Some(MachineKind::Nfa),
            "dpda" => Some(MachineKind::Dpda),
            "tm" => Some(MachineKind::Tm),
            _ => None,
        }
    }

    /// Whether descriptions of this kind carry a `Z:` (stack or tape) alphabet.
    pub fn has_auxiliary_alphabet(&self) -> bool {
        !matches!(self, MachineKind::Nfa)
    }

    /// Whether `e` denotes epsilon in this kind's transitions.
    pub fn has_epsilon(&self) -> bool {
        !matches!(self, MachineKind::Tm)
    }
}

impl fmt::Display for MachineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineKind::Nfa => f.write_str("NFA"),
            MachineKind::Dpda => f.write_str("DPDA"),
            MachineKind::Tm => f.write_str("TM"),
        }
    }
}

/// The final classification of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Accept,
    Reject,
    /// The Turing machine exhausted its step budget.
    DidNotHalt,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Accept => f.write_str("ACCEPT"),
            Verdict::Reject => f.write_str("REJECT"),
            Verdict::DidNotHalt => f.write_str("DID NOT HALT"),
        }
    }
}

/// Represents how a run ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Halt {
    /// The run completed with a verdict.
    Verdict(Verdict),
    /// The run was aborted; this is distinct from a rejection.
    Err(RunError),
}

/// The outcome of running one input case: its trace and how it halted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Run<E> {
    /// Configurations in the order they were reached.
    pub trace: Vec<E>,
    /// The number of transitions applied.
    pub steps: usize,
    pub halt: Halt,
}

impl<E> Run<E> {
    pub fn new(trace: Vec<E>, steps: usize, halt: Halt) -> Self {
        Self { trace, steps, halt }
    }

    /// Returns the verdict, or `None` if the run was aborted by a `RunError`.
    pub fn verdict(&self) -> Option<Verdict> {
        match self.halt {
            Halt::Verdict(verdict) => Some(verdict),
            Halt::Err(_) => None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.verdict() == Some(Verdict::Accept)
    }
}

/// Per-case errors. They end a single run without affecting the rest of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum RunError {
    /// An input token that is not part of the declared input alphabet.
    #[error("Invalid input: {0}")]
    UnknownSymbol(String),
    /// A DPDA's epsilon moves returned to an earlier configuration and would repeat forever.
    #[error("Epsilon loop: state {state} repeats after {moves} epsilon moves")]
    EpsilonLoop { state: State, moves: usize },
}

/// Build-time errors raised while parsing or validating a machine description.
/// Any of these aborts the whole program before a single case runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AutomatonError {
    /// Indicates a syntax error in the description.
    #[error("Description parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates a reference to a state that was not declared.
    #[error("Invalid state: {0}")]
    InvalidState(String),
    /// Indicates a reference to a symbol that was not declared.
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),
    /// Indicates an alphabet declaring a token reserved for epsilon.
    #[error("Reserved symbol cannot be declared: {0}")]
    ReservedSymbol(String),
    /// Indicates a malformed transition record.
    #[error("Invalid transition: {transition} ({reason})")]
    InvalidTransition { transition: String, reason: String },
    /// Indicates a transition that would break determinism.
    #[error("Conflicting transition from {state}: ({new}) overlaps ({existing})")]
    ConflictingTransition {
        state: String,
        new: String,
        existing: String,
    },
    /// Indicates a structural problem with the description.
    #[error("Description validation error: {0}")]
    ValidationError(String),
    /// Indicates a malformed batch of input cases.
    #[error("Invalid batch input: {0}")]
    BatchError(String),
    /// Indicates an error related to file system operations.
    #[error("File error: {0}")]
    FileError(String),
}

/// Shared shape of the three interpreters: build once from a description, then run
/// any number of independent input cases against the immutable tables.
pub trait Automaton: Sized {
    /// One trace record.
    type Event: fmt::Display + Serialize;

    /// Validates `description` and builds the machine's transition tables.
    fn from_description(description: &Description) -> Result<Self, AutomatonError>;

    /// Runs one input case.
    fn run(&self, input: &[String]) -> Run<Self::Event>;

    /// Runs every case of a batch in order.
    fn run_batch(&self, cases: &[Vec<String>]) -> Vec<Run<Self::Event>> {
        cases.iter().map(|case| self.run(case)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_serialization() {
        let left_json = serde_json::to_string(&Direction::Left).unwrap();
        let right_json = serde_json::to_string(&Direction::Right).unwrap();

        assert_eq!(left_json, "\"Left\"");
        assert_eq!(right_json, "\"Right\"");

        let left: Direction = serde_json::from_str(&left_json).unwrap();
        assert_eq!(left, Direction::Left);
    }

    #[test]
    fn test_verdict_display_and_serialization() {
        assert_eq!(Verdict::Accept.to_string(), "ACCEPT");
        assert_eq!(Verdict::Reject.to_string(), "REJECT");
        assert_eq!(Verdict::DidNotHalt.to_string(), "DID NOT HALT");

        assert_eq!(
            serde_json::to_string(&Verdict::DidNotHalt).unwrap(),
            "\"DID_NOT_HALT\""
        );
    }

    #[test]
    fn test_symbol_sentinels_do_not_collide() {
        assert_ne!(Symbol::named("e"), Symbol::Epsilon);
        assert_ne!(Symbol::named("_"), Symbol::Blank);
        assert_eq!(Symbol::Epsilon.to_string(), "e");
        assert_eq!(Symbol::Blank.to_string(), "_");
    }

    #[test]
    fn test_symbol_overlap() {
        let a = Symbol::named("a");
        let b = Symbol::named("b");

        assert!(a.overlaps(&a));
        assert!(a.overlaps(&Symbol::Epsilon));
        assert!(Symbol::Epsilon.overlaps(&b));
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_state_serializes_as_name() {
        let state = State::new("q0");
        assert_eq!(serde_json::to_string(&state).unwrap(), "\"q0\"");
        assert_eq!(state.name(), "q0");
    }

    #[test]
    fn test_kind_from_path() {
        assert_eq!(
            MachineKind::from_path(Path::new("dir/m.dpda")),
            Some(MachineKind::Dpda)
        );
        assert_eq!(MachineKind::from_path(Path::new("m.tm")), Some(MachineKind::Tm));
        assert_eq!(MachineKind::from_path(Path::new("m.txt")), None);
        assert_eq!(MachineKind::from_path(Path::new("nfa")), None);
    }

    #[test]
    fn test_error_display() {
        let error = AutomatonError::InvalidState("q9".to_string());
        let error_msg = format!("{}", error);
        assert!(error_msg.contains("Invalid state"));
        assert!(error_msg.contains("q9"));

        let error = RunError::UnknownSymbol("z".to_string());
        assert_eq!(error.to_string(), "Invalid input: z");

        let error = RunError::EpsilonLoop {
            state: State::new("q1"),
            moves: 3,
        };
        assert_eq!(
            error.to_string(),
            "Epsilon loop: state q1 repeats after 3 epsilon moves"
        );
    }

    #[test]
    fn test_blank_tokens() {
        assert!(is_blank_token("_"));
        assert!(is_blank_token(" "));
        assert!(!is_blank_token(""));
        assert!(!is_blank_token("b"));
    }
}
