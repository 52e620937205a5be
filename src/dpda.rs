//! Deterministic pushdown automaton.
//!
//! Determinism is enforced when transitions are inserted: two keys of the same source
//! state may never both match one runtime lookup. Runs alternate between consuming an
//! input symbol and an epsilon pass that applies `(e, e)` and `(e, top)` moves until
//! neither matches.

use crate::analyzer::analyze;
use crate::parser::Description;
use crate::registry::Registry;
use crate::types::{
    Automaton, AutomatonError, Halt, MachineKind, Run, RunError, State, Symbol, Verdict,
};
use log::{debug, trace};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

/// The lookup key of a pushdown transition: input symbol and required stack top,
/// either of which may be epsilon.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StackKey {
    pub input: Symbol,
    pub top: Symbol,
}

impl StackKey {
    pub fn new(input: Symbol, top: Symbol) -> Self {
        Self { input, top }
    }

    /// Two keys conflict when some concrete (input, stack top) pair would match both.
    pub fn conflicts_with(&self, other: &StackKey) -> bool {
        self.input.overlaps(&other.input) && self.top.overlaps(&other.top)
    }
}

impl fmt::Display for StackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.input, self.top)
    }
}

/// What a matching transition does: the next state and the symbol to push (or epsilon).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushdownAction {
    pub next: State,
    pub push: Symbol,
}

/// The DPDA transition function, keyed by source state.
#[derive(Debug, Clone, Default)]
pub struct DpdaTable {
    rules: HashMap<State, BTreeMap<StackKey, PushdownAction>>,
}

impl DpdaTable {
    /// Adds a transition, refusing keys that would make a runtime lookup ambiguous.
    pub fn insert(
        &mut self,
        from: State,
        key: StackKey,
        action: PushdownAction,
    ) -> Result<(), AutomatonError> {
        let keys = self.rules.entry(from.clone()).or_default();

        if let Some(existing) = keys.keys().find(|existing| existing.conflicts_with(&key)) {
            return Err(AutomatonError::ConflictingTransition {
                state: from.to_string(),
                new: key.to_string(),
                existing: existing.to_string(),
            });
        }

        keys.insert(key, action);
        Ok(())
    }

    /// The transition of `state` for exactly this key, if any.
    pub fn lookup(&self, state: &State, input: &Symbol, top: &Symbol) -> Option<&PushdownAction> {
        self.rules
            .get(state)?
            .get(&StackKey::new(input.clone(), top.clone()))
    }

    /// The number of stored transitions.
    pub fn len(&self) -> usize {
        self.rules.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One applied DPDA transition, with the stack listed from top to bottom afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DpdaStep {
    pub state: State,
    pub input: Symbol,
    pub popped: Symbol,
    pub next: State,
    pub stack: Vec<Symbol>,
}

impl fmt::Display for DpdaStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}; {}; {}; {};",
            self.state, self.input, self.popped, self.next
        )?;

        if !self.stack.is_empty() {
            let stack: Vec<String> = self.stack.iter().map(ToString::to_string).collect();
            write!(f, " {}", stack.join(","))?;
        }

        Ok(())
    }
}

/// A validated DPDA. Immutable once built.
#[derive(Debug, Clone)]
pub struct Dpda {
    registry: Registry,
    table: DpdaTable,
    start: State,
    accept: BTreeSet<State>,
}

impl Dpda {
    pub fn table(&self) -> &DpdaTable {
        &self.table
    }

    pub fn start(&self) -> &State {
        &self.start
    }
}

type Visit = (State, Option<Symbol>);

/// Remembers the (state, stack top) pairs met during one epsilon closure, by stack depth.
///
/// Epsilon moves only look at the state and the top symbol. If a pair comes back while the
/// stack never dropped below the depth it was first met at, everything under that depth is
/// untouched and the same moves replay forever. Every endless closure has such a repeat,
/// so a pass that never repeats terminates, however deep the stack gets.
#[derive(Debug, Default)]
struct LoopDetector {
    levels: BTreeMap<usize, Vec<Visit>>,
    seen: HashSet<Visit>,
}

impl LoopDetector {
    /// Records the configuration about to move. Returns `false` when it closes a loop.
    fn visit(&mut self, state: &State, top: Option<&Symbol>, depth: usize) -> bool {
        // Pairs met higher up are stale once the stack has shrunk below them.
        let stale = self.levels.split_off(&(depth + 1));
        for visit in stale.into_values().flatten() {
            self.seen.remove(&visit);
        }

        let visit = (state.clone(), top.cloned());
        if !self.seen.insert(visit.clone()) {
            return false;
        }
        self.levels.entry(depth).or_default().push(visit);

        true
    }
}

/// The running configuration of one DPDA case.
struct Execution<'a> {
    dpda: &'a Dpda,
    state: State,
    /// Bottom first; the top is the last element.
    stack: Vec<Symbol>,
    trace: Vec<DpdaStep>,
    steps: usize,
}

impl<'a> Execution<'a> {
    fn new(dpda: &'a Dpda) -> Self {
        Self {
            dpda,
            state: dpda.start.clone(),
            stack: Vec::new(),
            trace: Vec::new(),
            steps: 0,
        }
    }

    /// The epsilon move that applies in the current configuration. `(e, e)` is checked
    /// before `(e, top)`; an empty stack matches no stack-top keyed move.
    fn epsilon_move(&self) -> Option<(Symbol, &'a PushdownAction)> {
        let table = &self.dpda.table;

        if let Some(action) = table.lookup(&self.state, &Symbol::Epsilon, &Symbol::Epsilon) {
            return Some((Symbol::Epsilon, action));
        }

        let top = self.stack.last()?;
        table
            .lookup(&self.state, &Symbol::Epsilon, top)
            .map(|action| (top.clone(), action))
    }

    /// The move consuming `symbol`: `(symbol, e)` first, then `(symbol, top)`.
    fn input_move(&self, symbol: &Symbol) -> Option<(Symbol, &'a PushdownAction)> {
        let table = &self.dpda.table;

        if let Some(action) = table.lookup(&self.state, symbol, &Symbol::Epsilon) {
            return Some((Symbol::Epsilon, action));
        }

        let top = self.stack.last()?;
        table
            .lookup(&self.state, symbol, top)
            .map(|action| (top.clone(), action))
    }

    /// Applies epsilon moves until none matches, or until the moves are shown to repeat
    /// forever.
    fn close(&mut self) -> Result<(), RunError> {
        let mut detector = LoopDetector::default();
        let mut moves = 0;

        while let Some((popped, action)) = self.epsilon_move() {
            if !detector.visit(&self.state, self.stack.last(), self.stack.len()) {
                return Err(RunError::EpsilonLoop {
                    state: self.state.clone(),
                    moves,
                });
            }
            self.apply(Symbol::Epsilon, popped, action);
            moves += 1;
        }

        Ok(())
    }

    fn apply(&mut self, input: Symbol, popped: Symbol, action: &PushdownAction) {
        if !popped.is_epsilon() {
            self.stack.pop();
        }
        if !action.push.is_epsilon() {
            self.stack.push(action.push.clone());
        }

        trace!(
            "DPDA {} --{},{}--> {} (stack depth {})",
            self.state,
            input,
            popped,
            action.next,
            self.stack.len()
        );

        self.trace.push(DpdaStep {
            state: self.state.clone(),
            input,
            popped,
            next: action.next.clone(),
            stack: self.stack.iter().rev().cloned().collect(),
        });
        self.state = action.next.clone();
        self.steps += 1;
    }

    fn finish(self, halt: Halt) -> Run<DpdaStep> {
        Run::new(self.trace, self.steps, halt)
    }
}

impl Automaton for Dpda {
    type Event = DpdaStep;

    fn from_description(description: &Description) -> Result<Self, AutomatonError> {
        if description.kind != MachineKind::Dpda {
            return Err(AutomatonError::ValidationError(format!(
                "Expected a DPDA description, got {}",
                description.kind
            )));
        }
        analyze(description)?;

        let registry = Registry::new(
            MachineKind::Dpda,
            &description.states,
            &description.input_alphabet,
            &description.auxiliary_alphabet,
        )?;

        let mut table = DpdaTable::default();
        for fields in &description.transitions {
            let (from, key, action) = resolve_transition(&registry, fields)?;
            table.insert(from, key, action)?;
        }

        let start = registry.state(&description.start)?;
        let accept = description
            .accept
            .iter()
            .map(|state| registry.state(state))
            .collect::<Result<_, _>>()?;

        debug!(
            "built DPDA with {} states and {} transitions",
            description.states.len(),
            table.len()
        );

        Ok(Self {
            registry,
            table,
            start,
            accept,
        })
    }

    fn run(&self, input: &[String]) -> Run<DpdaStep> {
        let mut execution = Execution::new(self);

        if let Err(error) = execution.close() {
            return execution.finish(Halt::Err(error));
        }

        for token in input {
            // An undeclared symbol cannot match any transition.
            let next = self
                .registry
                .input(token)
                .and_then(|symbol| execution.input_move(symbol).map(|m| (symbol, m)));

            let Some((symbol, (popped, action))) = next else {
                debug!("DPDA run rejected: no transition for {token:?}");
                return execution.finish(Halt::Verdict(Verdict::Reject));
            };

            execution.apply(symbol.clone(), popped, action);

            if let Err(error) = execution.close() {
                return execution.finish(Halt::Err(error));
            }
        }

        let verdict = if self.accept.contains(&execution.state) {
            Verdict::Accept
        } else {
            Verdict::Reject
        };
        debug!("DPDA run on {} symbols: {verdict}", input.len());

        execution.finish(Halt::Verdict(verdict))
    }
}

/// Resolves a `from,input,top,to,push` record; input, top and push may be epsilon.
fn resolve_transition(
    registry: &Registry,
    fields: &[String],
) -> Result<(State, StackKey, PushdownAction), AutomatonError> {
    let invalid = |reason: String| AutomatonError::InvalidTransition {
        transition: fields.join(","),
        reason,
    };

    let [from, input, top, to, push] = fields else {
        return Err(invalid(format!("expected 5 fields, found {}", fields.len())));
    };

    let from = registry.state(from).map_err(|e| invalid(e.to_string()))?;
    let key = StackKey::new(
        registry
            .input_or_epsilon(input)
            .map_err(|e| invalid(e.to_string()))?,
        registry
            .auxiliary_or_epsilon(top)
            .map_err(|e| invalid(e.to_string()))?,
    );
    let action = PushdownAction {
        next: registry.state(to).map_err(|e| invalid(e.to_string()))?,
        push: registry
            .auxiliary_or_epsilon(push)
            .map_err(|e| invalid(e.to_string()))?,
    };

    Ok((from, key, action))
}
