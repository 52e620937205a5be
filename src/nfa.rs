//! Nondeterministic finite automaton with epsilon moves.
//!
//! The configuration of a run is the set of states the automaton may currently be in.
//! Sets are kept in `BTreeSet`s so traces list states in sorted order.

use crate::analyzer::analyze;
use crate::parser::Description;
use crate::registry::Registry;
use crate::types::{
    Automaton, AutomatonError, Halt, MachineKind, Run, RunError, State, Symbol, Verdict,
};
use log::{debug, trace};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// The NFA transition relation: (state, symbol or epsilon) to a set of destinations.
#[derive(Debug, Clone, Default)]
pub struct NfaTable {
    rules: HashMap<State, HashMap<Symbol, BTreeSet<State>>>,
}

impl NfaTable {
    /// Adds `from --symbol--> to`. Repeated records are merged.
    pub fn insert(&mut self, from: State, symbol: Symbol, to: State) {
        self.rules
            .entry(from)
            .or_default()
            .entry(symbol)
            .or_default()
            .insert(to);
    }

    /// Destinations of `state` on `symbol`; empty when there is no such transition.
    pub fn targets<'a>(
        &'a self,
        state: &State,
        symbol: &Symbol,
    ) -> impl Iterator<Item = &'a State> + 'a {
        self.rules
            .get(state)
            .and_then(|by_symbol| by_symbol.get(symbol))
            .into_iter()
            .flatten()
    }

    /// The number of (source, symbol, destination) triples.
    pub fn len(&self) -> usize {
        self.rules
            .values()
            .flat_map(|by_symbol| by_symbol.values())
            .map(BTreeSet::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One NFA trace record: the consumed symbol (`None` for the initial configuration) and
/// the states reachable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NfaStep {
    pub symbol: Option<Symbol>,
    pub states: BTreeSet<State>,
}

impl fmt::Display for NfaStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(symbol) = &self.symbol {
            write!(f, "{symbol}")?;
        }
        f.write_str("; ")?;

        let states: Vec<&str> = self.states.iter().map(State::name).collect();
        f.write_str(&states.join(","))
    }
}

/// A validated NFA. Immutable once built.
#[derive(Debug, Clone)]
pub struct Nfa {
    registry: Registry,
    table: NfaTable,
    start: State,
    accept: BTreeSet<State>,
}

impl Nfa {
    /// Returns the states reachable from any state of `states` by one transition on `symbol`.
    pub fn step_on(&self, states: &BTreeSet<State>, symbol: &Symbol) -> BTreeSet<State> {
        states
            .iter()
            .flat_map(|state| self.table.targets(state, symbol))
            .cloned()
            .collect()
    }

    /// Returns the smallest superset of `states` closed under epsilon moves.
    pub fn epsilon_closure(&self, states: &BTreeSet<State>) -> BTreeSet<State> {
        let mut closure = states.clone();
        let mut worklist: Vec<State> = states.iter().cloned().collect();

        while let Some(state) = worklist.pop() {
            for next in self.table.targets(&state, &Symbol::Epsilon) {
                if closure.insert(next.clone()) {
                    worklist.push(next.clone());
                }
            }
        }

        closure
    }

    /// Whether the configuration contains an accept state.
    pub fn accepts(&self, states: &BTreeSet<State>) -> bool {
        !self.accept.is_disjoint(states)
    }

    pub fn start(&self) -> &State {
        &self.start
    }

    pub fn table(&self) -> &NfaTable {
        &self.table
    }
}

impl Automaton for Nfa {
    type Event = NfaStep;

    fn from_description(description: &Description) -> Result<Self, AutomatonError> {
        if description.kind != MachineKind::Nfa {
            return Err(AutomatonError::ValidationError(format!(
                "Expected an NFA description, got {}",
                description.kind
            )));
        }
        analyze(description)?;

        let registry = Registry::new(
            MachineKind::Nfa,
            &description.states,
            &description.input_alphabet,
            &[],
        )?;

        let mut table = NfaTable::default();
        for fields in &description.transitions {
            let (from, symbol, to) = resolve_transition(&registry, fields)?;
            table.insert(from, symbol, to);
        }

        let start = registry.state(&description.start)?;
        let accept = description
            .accept
            .iter()
            .map(|state| registry.state(state))
            .collect::<Result<_, _>>()?;

        debug!(
            "built NFA with {} states and {} transitions",
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

    fn run(&self, input: &[String]) -> Run<NfaStep> {
        let mut current = self.epsilon_closure(&BTreeSet::from([self.start.clone()]));
        let mut trace = vec![NfaStep {
            symbol: None,
            states: current.clone(),
        }];

        for (consumed, token) in input.iter().enumerate() {
            let Some(symbol) = self.registry.input(token) else {
                debug!("NFA run aborted on unknown symbol {token:?}");
                return Run::new(
                    trace,
                    consumed,
                    Halt::Err(RunError::UnknownSymbol(token.clone())),
                );
            };

            current = self.epsilon_closure(&self.step_on(&current, symbol));
            trace!("NFA read {symbol}, {} states reachable", current.len());
            trace.push(NfaStep {
                symbol: Some(symbol.clone()),
                states: current.clone(),
            });
        }

        let verdict = if self.accepts(&current) {
            Verdict::Accept
        } else {
            Verdict::Reject
        };
        debug!("NFA run on {} symbols: {verdict}", input.len());

        Run::new(trace, input.len(), Halt::Verdict(verdict))
    }
}

/// Resolves a `from,symbol,to` record, where `symbol` may be epsilon.
fn resolve_transition(
    registry: &Registry,
    fields: &[String],
) -> Result<(State, Symbol, State), AutomatonError> {
    let invalid = |reason: String| AutomatonError::InvalidTransition {
        transition: fields.join(","),
        reason,
    };

    let [from, symbol, to] = fields else {
        return Err(invalid(format!("expected 3 fields, found {}", fields.len())));
    };

    Ok((
        registry.state(from).map_err(|e| invalid(e.to_string()))?,
        registry
            .input_or_epsilon(symbol)
            .map_err(|e| invalid(e.to_string()))?,
        registry.state(to).map_err(|e| invalid(e.to_string()))?,
    ))
}
