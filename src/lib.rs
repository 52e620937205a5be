//! This crate provides the core logic for a small automata workbench.
//! It includes a description parser and analyzer, interpreters for NFAs with epsilon moves,
//! deterministic pushdown automata and deterministic Turing machines, trace rendering, and a
//! catalog of embedded sample machines.

pub mod analyzer;
pub mod dpda;
pub mod loader;
pub mod machine;
pub mod nfa;
pub mod parser;
pub mod registry;
pub mod report;
pub mod samples;
pub mod types;


/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the `analyze` function and `AnalysisError` enum from the analyzer module.
pub use analyzer::{analyze, AnalysisError};
/// Re-exports the DPDA interpreter and its trace record.
pub use dpda::{Dpda, DpdaStep};
/// Re-exports the `DescriptionLoader` struct and the batch readers from the loader module.
pub use loader::{parse_batch, read_batch, DescriptionLoader};
/// Re-exports the `TuringMachine` struct and its trace record from the machine module.
pub use machine::{Snapshot, TuringMachine};
/// Re-exports the NFA interpreter and its trace record.
pub use nfa::{Nfa, NfaStep};
/// Re-exports the `parse` function and the `Description` record from the parser module.
pub use parser::{parse, Description};
/// Re-exports the rendering functions from the report module.
pub use report::{render_batch, render_json, render_run};
/// Re-exports the sample catalog.
pub use samples::{Sample, SampleCatalog, SAMPLES};
/// Re-exports the types shared by all interpreters.
pub use types::{
    Automaton, AutomatonError, Direction, Halt, MachineKind, Run, RunError, State, Symbol,
    Verdict, MAX_DESCRIPTION_SIZE, MAX_EXECUTION_STEPS,
};
