//! This module defines the `TuringMachine` struct, a validated single-tape deterministic
//! Turing machine, and `Execution`, which simulates one input case against it. It handles
//! the machine's state, tape operations, head movements, and the bounded run loop.

use crate::analyzer::analyze;
use crate::parser::Description;
use crate::registry::Registry;
use crate::types::{
    Automaton, AutomatonError, Direction, Halt, MachineKind, Run, RunError, State, Symbol,
    Verdict, MAX_EXECUTION_STEPS,
};
use log::{debug, trace};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Represents a single transition rule: what to write, where to move, and the next state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// The symbol written at the head.
    pub write: Symbol,
    /// The direction the head moves after writing.
    pub direction: Direction,
    /// The next state the machine transitions to.
    pub next_state: State,
}

/// Represents the outcome of a Turing machine execution step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The machine performed a step and continues execution.
    Continue,
    /// The machine is in its accept or reject state.
    Halt(Verdict),
}

/// A configuration snapshot: the cells left of the head, the current state, and the cells
/// from the head up to the last non-blank cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub left: Vec<Symbol>,
    pub state: State,
    pub right: Vec<Symbol>,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells = |symbols: &[Symbol]| {
            symbols
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",")
        };

        write!(f, "({}){}({})", cells(&self.left), self.state, cells(&self.right))
    }
}

/// Represents a validated deterministic Turing machine.
///
/// The transition table is immutable once built; every run gets its own `Execution`.
#[derive(Debug, Clone)]
pub struct TuringMachine {
    registry: Registry,
    rules: HashMap<State, HashMap<Symbol, Transition>>,
    initial_state: State,
    accept_state: State,
    reject_state: State,
}

impl TuringMachine {
    /// Returns the initial state of the Turing machine.
    pub fn initial_state(&self) -> &State {
        &self.initial_state
    }

    pub fn accept_state(&self) -> &State {
        &self.accept_state
    }

    pub fn reject_state(&self) -> &State {
        &self.reject_state
    }

    /// Finds the transition for `state` reading `symbol`, if one is defined.
    pub fn transition(&self, state: &State, symbol: &Symbol) -> Option<&Transition> {
        self.rules.get(state)?.get(symbol)
    }

    /// Places `input` on a fresh tape and positions the head on its first cell.
    ///
    /// # Returns
    ///
    /// * `Ok(Execution)` ready to step.
    /// * `Err(RunError::UnknownSymbol)` if a token is not part of the input alphabet.
    pub fn execute(&self, input: &[String]) -> Result<Execution<'_>, RunError> {
        let tape = input
            .iter()
            .map(|token| {
                self.registry
                    .input(token)
                    .cloned()
                    .ok_or_else(|| RunError::UnknownSymbol(token.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Execution::new(self, tape))
    }
}

/// Represents one running configuration of a Turing machine: state, tape, and head.
pub struct Execution<'a> {
    machine: &'a TuringMachine,
    state: State,
    tape: Vec<Symbol>,
    head: usize,
    step_count: usize,
}

impl<'a> Execution<'a> {
    fn new(machine: &'a TuringMachine, mut tape: Vec<Symbol>) -> Self {
        if tape.is_empty() {
            tape.push(Symbol::Blank);
        }

        Self {
            machine,
            state: machine.initial_state.clone(),
            tape,
            head: 0,
            step_count: 0,
        }
    }

    /// Executes a single step of the computation.
    ///
    /// When no rule matches, the machine falls back to the reject state: the tape is left
    /// unchanged and the head still moves right.
    ///
    /// # Returns
    ///
    /// * `Step::Continue` if the machine performed a step.
    /// * `Step::Halt(_)` if the machine was already in its accept or reject state.
    pub fn step(&mut self) -> Step {
        if let Some(verdict) = self.halted() {
            return Step::Halt(verdict);
        }

        let machine = self.machine;
        let symbol = self.symbol().clone();
        match machine.transition(&self.state, &symbol) {
            Some(transition) => {
                trace!(
                    "TM {} reads {} -> writes {}, moves {:?}, enters {}",
                    self.state,
                    symbol,
                    transition.write,
                    transition.direction,
                    transition.next_state
                );
                self.tape[self.head] = transition.write.clone();
                self.state = transition.next_state.clone();
                self.move_head(transition.direction);
            }
            None => {
                trace!("TM {} has no rule for {}, rejecting", self.state, symbol);
                self.state = machine.reject_state.clone();
                self.move_head(Direction::Right);
            }
        }

        self.step_count += 1;

        Step::Continue
    }

    fn move_head(&mut self, direction: Direction) {
        match direction {
            // The tape has no cells left of the first one.
            Direction::Left => self.head = self.head.saturating_sub(1),
            Direction::Right => {
                self.head += 1;
                if self.head >= self.tape.len() {
                    self.tape.push(Symbol::Blank);
                }
            }
        }
    }

    /// Returns the verdict if the machine is in its accept or reject state.
    pub fn halted(&self) -> Option<Verdict> {
        if self.state == self.machine.accept_state {
            Some(Verdict::Accept)
        } else if self.state == self.machine.reject_state {
            Some(Verdict::Reject)
        } else {
            None
        }
    }

    /// Returns the current state of the Turing machine.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Returns the total number of steps executed.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn tape(&self) -> &[Symbol] {
        &self.tape
    }

    /// Returns the symbol under the head.
    pub fn symbol(&self) -> &Symbol {
        &self.tape[self.head]
    }

    /// Captures the current configuration. Trailing blanks right of the head are omitted.
    pub fn snapshot(&self) -> Snapshot {
        let end = self
            .tape
            .iter()
            .rposition(|symbol| *symbol != Symbol::Blank)
            .map_or(self.head, |last| (last + 1).max(self.head));

        Snapshot {
            left: self.tape[..self.head].to_vec(),
            state: self.state.clone(),
            right: self.tape[self.head..end].to_vec(),
        }
    }
}

impl Automaton for TuringMachine {
    type Event = Snapshot;

    fn from_description(description: &Description) -> Result<Self, AutomatonError> {
        if description.kind != MachineKind::Tm {
            return Err(AutomatonError::ValidationError(format!(
                "Expected a TM description, got {}",
                description.kind
            )));
        }
        analyze(description)?;

        let registry = Registry::new(
            MachineKind::Tm,
            &description.states,
            &description.input_alphabet,
            &description.auxiliary_alphabet,
        )?;

        let mut rules: HashMap<State, HashMap<Symbol, Transition>> = HashMap::new();
        let mut count = 0;
        for fields in &description.transitions {
            let (from, read, transition) = resolve_transition(&registry, fields)?;
            let by_symbol = rules.entry(from.clone()).or_default();

            // Prevent two rules for the same (state, symbol)
            if by_symbol.contains_key(&read) {
                return Err(AutomatonError::ConflictingTransition {
                    state: from.to_string(),
                    new: fields.join(","),
                    existing: format!("{from},{read}"),
                });
            }

            by_symbol.insert(read, transition);
            count += 1;
        }

        // The analyzer guarantees exactly two final states.
        let (accept_state, reject_state) = match description.accept.as_slice() {
            [accept, reject] => (registry.state(accept)?, registry.state(reject)?),
            _ => {
                return Err(AutomatonError::ValidationError(
                    "There must be exactly two final states".to_string(),
                ))
            }
        };

        debug!(
            "built TM with {} states and {} transitions",
            description.states.len(),
            count
        );

        Ok(Self {
            initial_state: registry.state(&description.start)?,
            registry,
            rules,
            accept_state,
            reject_state,
        })
    }

    /// Runs the machine until it accepts, rejects, or reaches `MAX_EXECUTION_STEPS`.
    ///
    /// A snapshot is recorded before every step and once more after the loop, so a
    /// machine that does not halt yields `MAX_EXECUTION_STEPS + 1` snapshots.
    fn run(&self, input: &[String]) -> Run<Snapshot> {
        let mut execution = match self.execute(input) {
            Ok(execution) => execution,
            Err(error) => return Run::new(Vec::new(), 0, Halt::Err(error)),
        };

        let mut trace = Vec::new();
        while execution.halted().is_none() && execution.step_count() < MAX_EXECUTION_STEPS {
            trace.push(execution.snapshot());
            execution.step();
        }
        trace.push(execution.snapshot());

        let verdict = execution.halted().unwrap_or(Verdict::DidNotHalt);
        debug!(
            "TM run on {} symbols: {verdict} after {} steps",
            input.len(),
            execution.step_count()
        );

        Run::new(trace, execution.step_count(), Halt::Verdict(verdict))
    }
}

/// Resolves a `from,read,to,write,direction` record against the tape alphabet.
fn resolve_transition(
    registry: &Registry,
    fields: &[String],
) -> Result<(State, Symbol, Transition), AutomatonError> {
    let invalid = |reason: String| AutomatonError::InvalidTransition {
        transition: fields.join(","),
        reason,
    };

    let [from, read, to, write, direction] = fields else {
        return Err(invalid(format!("expected 5 fields, found {}", fields.len())));
    };

    let from = registry.state(from).map_err(|e| invalid(e.to_string()))?;
    let read = registry
        .auxiliary_symbol(read)
        .map_err(|e| invalid(e.to_string()))?;
    let transition = Transition {
        next_state: registry.state(to).map_err(|e| invalid(e.to_string()))?,
        write: registry
            .auxiliary_symbol(write)
            .map_err(|e| invalid(e.to_string()))?,
        direction: parse_direction(direction).ok_or_else(|| {
            invalid(format!("Unsupported direction: {direction}"))
        })?,
    };

    Ok((from, read, transition))
}

/// Parses a direction: `L` or `<` for Left, `R` or `>` for Right.
fn parse_direction(token: &str) -> Option<Direction> {
    match token {
        "L" | "<" => Some(Direction::Left),
        "R" | ">" => Some(Direction::Right),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(symbols: &[&str]) -> Vec<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    fn machine(transitions: &[&[&str]]) -> TuringMachine {
        let mut description = Description::new(MachineKind::Tm)
            .states(&["q0", "q1", "qa", "qr"])
            .input_alphabet(&["0", "1"])
            .auxiliary_alphabet(&["0", "1", "x", "_"])
            .start("q0")
            .accept(&["qa", "qr"]);
        for fields in transitions {
            description = description.transition(fields);
        }

        TuringMachine::from_description(&description).unwrap()
    }

    #[test]
    fn test_accepts_after_one_step() {
        let description = Description::new(MachineKind::Tm)
            .states(&["q0", "qa", "qr"])
            .input_alphabet(&["0"])
            .auxiliary_alphabet(&["0", "_"])
            .transition(&["q0", "0", "qa", "0", "R"])
            .start("q0")
            .accept(&["qa", "qr"]);
        let tm = TuringMachine::from_description(&description).unwrap();

        let run = tm.run(&input(&["0"]));
        assert_eq!(run.halt, Halt::Verdict(Verdict::Accept));
        assert_eq!(run.steps, 1);
        let lines: Vec<String> = run.trace.iter().map(ToString::to_string).collect();
        assert_eq!(lines, vec!["()q0(0)", "(0)qa()"]);
    }

    #[test]
    fn test_single_step() {
        let tm = machine(&[&["q0", "0", "q1", "x", "R"]]);
        let mut execution = tm.execute(&input(&["0", "1"])).unwrap();

        assert_eq!(execution.step(), Step::Continue);
        assert_eq!(execution.state(), &State::new("q1"));
        assert_eq!(execution.head(), 1);
        assert_eq!(
            execution.tape(),
            &[Symbol::named("x"), Symbol::named("1")]
        );
        assert_eq!(execution.step_count(), 1);
    }

    #[test]
    fn test_head_is_clamped_at_the_left_end() {
        let tm = machine(&[&["q0", "0", "q1", "1", "L"]]);
        let mut execution = tm.execute(&input(&["0"])).unwrap();

        assert_eq!(execution.step(), Step::Continue);
        assert_eq!(execution.head(), 0);
        assert_eq!(execution.symbol(), &Symbol::named("1"));
    }

    #[test]
    fn test_moving_right_extends_the_tape() {
        let tm = machine(&[&["q0", "0", "q1", "0", "R"]]);
        let mut execution = tm.execute(&input(&["0"])).unwrap();

        execution.step();
        assert_eq!(execution.tape(), &[Symbol::named("0"), Symbol::Blank]);
        assert_eq!(execution.symbol(), &Symbol::Blank);
    }

    #[test]
    fn test_missing_rule_falls_back_to_reject() {
        let tm = machine(&[]);
        let mut execution = tm.execute(&input(&["1"])).unwrap();

        assert_eq!(execution.step(), Step::Continue);
        assert_eq!(execution.state(), &State::new("qr"));
        assert_eq!(execution.head(), 1);
        assert_eq!(execution.tape(), &[Symbol::named("1"), Symbol::Blank]);
        assert_eq!(execution.step(), Step::Halt(Verdict::Reject));

        let run = tm.run(&input(&["1"]));
        assert_eq!(run.verdict(), Some(Verdict::Reject));
        assert_eq!(run.trace.last().unwrap().to_string(), "(1)qr()");
    }

    #[test]
    fn test_self_loop_does_not_halt() {
        let tm = machine(&[&["q0", "0", "q0", "0", "L"]]);

        let run = tm.run(&input(&["0"]));
        assert_eq!(run.verdict(), Some(Verdict::DidNotHalt));
        assert_eq!(run.steps, MAX_EXECUTION_STEPS);
        assert_eq!(run.trace.len(), MAX_EXECUTION_STEPS + 1);
    }

    #[test]
    fn test_empty_input_reads_blank() {
        let tm = machine(&[&["q0", "_", "qa", "_", "R"]]);

        let run = tm.run(&[]);
        assert!(run.is_accepted());
        assert_eq!(run.trace[0].to_string(), "()q0()");
        assert_eq!(run.trace[1].to_string(), "(_)qa()");
    }

    #[test]
    fn test_snapshot_trims_trailing_blanks() {
        let tm = machine(&[
            &["q0", "0", "q0", "_", "R"],
            &["q0", "1", "q1", "1", "L"],
        ]);
        let mut execution = tm.execute(&input(&["0", "1"])).unwrap();

        execution.step();
        assert_eq!(execution.snapshot().to_string(), "(_)q0(1)");
        execution.step();
        assert_eq!(execution.snapshot().to_string(), "()q1(_,1)");
    }

    #[test]
    fn test_unknown_input_symbol() {
        let tm = machine(&[]);

        let run = tm.run(&input(&["0", "2"]));
        assert_eq!(run.halt, Halt::Err(RunError::UnknownSymbol("2".to_string())));
        assert!(run.trace.is_empty());

        // The blank is a tape symbol, not an input symbol.
        assert!(tm.execute(&input(&["_"])).is_err());
    }

    #[test]
    fn test_duplicate_rule_is_rejected() {
        let description = Description::new(MachineKind::Tm)
            .states(&["q0", "qa", "qr"])
            .input_alphabet(&["0"])
            .auxiliary_alphabet(&["0", "_"])
            .transition(&["q0", "0", "qa", "0", "R"])
            .transition(&["q0", "0", "qr", "0", "L"])
            .start("q0")
            .accept(&["qa", "qr"]);

        let error = TuringMachine::from_description(&description).unwrap_err();
        assert!(matches!(error, AutomatonError::ConflictingTransition { .. }));
    }

    #[test]
    fn test_invalid_rules() {
        let base = Description::new(MachineKind::Tm)
            .states(&["q0", "qa", "qr"])
            .input_alphabet(&["0"])
            .auxiliary_alphabet(&["0", "_"])
            .start("q0")
            .accept(&["qa", "qr"]);

        let error =
            TuringMachine::from_description(&base.clone().transition(&["q0", "0", "qa", "0", "S"]))
                .unwrap_err();
        assert_eq!(
            error.to_string(),
            "Invalid transition: q0,0,qa,0,S (Unsupported direction: S)"
        );

        let error =
            TuringMachine::from_description(&base.transition(&["q0", "1", "qa", "0", "R"]))
                .unwrap_err();
        assert!(matches!(error, AutomatonError::InvalidTransition { .. }));
    }

    #[test]
    fn test_starting_in_a_halting_state() {
        let description = Description::new(MachineKind::Tm)
            .states(&["qa", "qr"])
            .input_alphabet(&["0"])
            .auxiliary_alphabet(&["0", "_"])
            .start("qa")
            .accept(&["qa", "qr"]);
        let tm = TuringMachine::from_description(&description).unwrap();

        let run = tm.run(&input(&["0"]));
        assert!(run.is_accepted());
        assert_eq!(run.steps, 0);
        assert_eq!(run.trace.len(), 1);
    }

    #[test]
    fn test_space_is_the_blank_in_descriptions() {
        let text = "Q:q0,qa,qr\nA:0\nZ:0, \nT:q0, ,qa, ,R\nT:q0,0,q0,0,R\nS:q0\nF:qa,qr\n";
        let description = crate::parser::parse(text, MachineKind::Tm).unwrap();
        let tm = TuringMachine::from_description(&description).unwrap();

        let run = tm.run(&input(&["0", "0"]));
        assert_eq!(run.halt, Halt::Verdict(Verdict::Accept));
        assert_eq!(run.steps, 3);
        assert_eq!(run.trace.len(), 4);

        let run = tm.run(&input(&[]));
        assert!(run.is_accepted());
        assert_eq!(run.steps, 1);
    }
}
