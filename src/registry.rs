//! Resolution of raw description tokens into interned states and symbols.
//!
//! A `Registry` is built once from the `Q:`, `A:` and `Z:` sections. Every token used by a
//! transition, the start state or the accept states goes through it, so an undeclared
//! reference is always a build-time error.

use crate::types::{
    is_blank_token, AutomatonError, MachineKind, State, Symbol, BLANK_TOKEN, EPSILON_TOKEN,
};
use std::collections::BTreeMap;

/// Declared states and alphabets of one machine description.
#[derive(Debug, Clone)]
pub struct Registry {
    kind: MachineKind,
    states: BTreeMap<String, State>,
    input: BTreeMap<String, Symbol>,
    auxiliary: BTreeMap<String, Symbol>,
}

impl Registry {
    /// Interns the declared states and alphabets.
    ///
    /// For a Turing machine the `_` or single-space token declares the blank cell. For NFA and DPDA
    /// descriptions `e` is reserved for epsilon and cannot be declared.
    pub fn new(
        kind: MachineKind,
        states: &[String],
        input_alphabet: &[String],
        auxiliary_alphabet: &[String],
    ) -> Result<Self, AutomatonError> {
        let states = states
            .iter()
            .map(|name| (name.clone(), State::new(name)))
            .collect();

        Ok(Self {
            kind,
            states,
            input: intern_symbols(kind, input_alphabet)?,
            auxiliary: intern_symbols(kind, auxiliary_alphabet)?,
        })
    }

    pub fn kind(&self) -> MachineKind {
        self.kind
    }

    /// Resolves a declared state.
    pub fn state(&self, token: &str) -> Result<State, AutomatonError> {
        self.states
            .get(token)
            .cloned()
            .ok_or_else(|| AutomatonError::InvalidState(token.to_string()))
    }

    /// Looks up an input symbol without failing. Used at run time, where an unknown token
    /// is a per-case condition rather than a build error.
    pub fn input(&self, token: &str) -> Option<&Symbol> {
        self.input.get(canonical(self.kind, token))
    }

    /// Resolves a declared input symbol.
    pub fn input_symbol(&self, token: &str) -> Result<Symbol, AutomatonError> {
        self.input(token)
            .cloned()
            .ok_or_else(|| AutomatonError::InvalidSymbol(token.to_string()))
    }

    /// Resolves a declared input symbol or the epsilon token.
    pub fn input_or_epsilon(&self, token: &str) -> Result<Symbol, AutomatonError> {
        if self.is_epsilon(token) {
            return Ok(Symbol::Epsilon);
        }
        self.input_symbol(token)
    }

    /// Resolves a declared stack or tape symbol.
    pub fn auxiliary_symbol(&self, token: &str) -> Result<Symbol, AutomatonError> {
        self.auxiliary
            .get(canonical(self.kind, token))
            .cloned()
            .ok_or_else(|| AutomatonError::InvalidSymbol(token.to_string()))
    }

    /// Resolves a declared stack symbol or the epsilon token.
    pub fn auxiliary_or_epsilon(&self, token: &str) -> Result<Symbol, AutomatonError> {
        if self.is_epsilon(token) {
            return Ok(Symbol::Epsilon);
        }
        self.auxiliary_symbol(token)
    }

    /// The declared input alphabet, sorted.
    pub fn input_alphabet(&self) -> impl Iterator<Item = &Symbol> {
        self.input.values()
    }

    /// The declared stack or tape alphabet, sorted.
    pub fn auxiliary_alphabet(&self) -> impl Iterator<Item = &Symbol> {
        self.auxiliary.values()
    }

    fn is_epsilon(&self, token: &str) -> bool {
        self.kind.has_epsilon() && token == EPSILON_TOKEN
    }
}

/// Both spellings of the Turing machine blank share one key.
fn canonical(kind: MachineKind, token: &str) -> &str {
    if kind == MachineKind::Tm && is_blank_token(token) {
        BLANK_TOKEN
    } else {
        token
    }
}

fn intern_symbols(
    kind: MachineKind,
    tokens: &[String],
) -> Result<BTreeMap<String, Symbol>, AutomatonError> {
    tokens
        .iter()
        .map(|token| {
            let symbol = match canonical(kind, token) {
                EPSILON_TOKEN if kind.has_epsilon() => {
                    return Err(AutomatonError::ReservedSymbol(token.clone()))
                }
                BLANK_TOKEN if kind == MachineKind::Tm => Symbol::Blank,
                name => Symbol::named(name),
            };
            Ok((canonical(kind, token).to_string(), symbol))
        })
        .collect()
}
