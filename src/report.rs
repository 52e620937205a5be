//! This module renders runs in their textual trace format, or as JSON for tooling.
//!
//! A rendered run lists one trace record per line followed by the verdict line
//! (`ACCEPT`, `REJECT` or `DID NOT HALT`), or by the error that aborted the run.

use crate::types::{Halt, MachineKind, Run};
use serde::Serialize;
use std::fmt;

/// Renders a single run: its trace records, then how it halted.
pub fn render_run<E: fmt::Display>(run: &Run<E>) -> String {
    let mut lines: Vec<String> = run.trace.iter().map(ToString::to_string).collect();

    lines.push(match &run.halt {
        Halt::Verdict(verdict) => verdict.to_string(),
        Halt::Err(error) => error.to_string(),
    });

    lines.join("\n")
}

/// Renders a batch of runs, separating consecutive cases with a blank line.
pub fn render_batch<E: fmt::Display>(runs: &[Run<E>]) -> String {
    let mut output = runs
        .iter()
        .map(render_run)
        .collect::<Vec<String>>()
        .join("\n\n");

    if !output.is_empty() {
        output.push('\n');
    }

    output
}

#[derive(Serialize)]
struct BatchReport<'a, E> {
    kind: MachineKind,
    cases: Vec<CaseReport<'a, E>>,
}

#[derive(Serialize)]
struct CaseReport<'a, E> {
    input: &'a [String],
    run: &'a Run<E>,
}

/// Serializes a batch as pretty-printed JSON, pairing every run with its input case.
pub fn render_json<E: Serialize>(
    kind: MachineKind,
    cases: &[Vec<String>],
    runs: &[Run<E>],
) -> serde_json::Result<String> {
    let report = BatchReport {
        kind,
        cases: cases
            .iter()
            .zip(runs)
            .map(|(input, run)| CaseReport { input, run })
            .collect(),
    };

    serde_json::to_string_pretty(&report)
}
