//! This module provides the parser for machine descriptions, utilizing the `pest` crate.
//! It turns `Tag:field,field` lines into a tokenized `Description`, enforcing which sections
//! are required and unique for each machine kind. Semantic checks (declared states, alphabet
//! composition, determinism) happen later, when a machine is built from the description.

use crate::types::{AutomatonError, MachineKind, SPACE_BLANK_TOKEN};
use pest::{
    error::{Error, ErrorVariant},
    iterators::Pair,
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;
use std::collections::HashSet;

/// Derives a `PestParser` for the description grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct DescriptionParser;

/// A tokenized machine description: the records every interpreter is built from.
///
/// Tokens are kept as raw strings; resolving them against the declared states and alphabets
/// is the job of the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description {
    pub kind: MachineKind,
    /// `Q:` declared states.
    pub states: Vec<String>,
    /// `A:` input alphabet.
    pub input_alphabet: Vec<String>,
    /// `Z:` stack (DPDA) or tape (TM) alphabet; always empty for an NFA.
    pub auxiliary_alphabet: Vec<String>,
    /// `T:` transition records in declaration order.
    pub transitions: Vec<Vec<String>>,
    /// `S:` start state.
    pub start: String,
    /// `F:` accept states. A Turing machine lists its accept state, then its reject state.
    pub accept: Vec<String>,
}

impl Description {
    /// Creates an empty description of the given kind.
    pub fn new(kind: MachineKind) -> Self {
        Self {
            kind,
            states: Vec::new(),
            input_alphabet: Vec::new(),
            auxiliary_alphabet: Vec::new(),
            transitions: Vec::new(),
            start: String::new(),
            accept: Vec::new(),
        }
    }

    pub fn states(mut self, states: &[&str]) -> Self {
        self.states = to_strings(states);
        self
    }

    pub fn input_alphabet(mut self, symbols: &[&str]) -> Self {
        self.input_alphabet = to_strings(symbols);
        self
    }

    pub fn auxiliary_alphabet(mut self, symbols: &[&str]) -> Self {
        self.auxiliary_alphabet = to_strings(symbols);
        self
    }

    /// Appends one transition record.
    pub fn transition(mut self, fields: &[&str]) -> Self {
        self.transitions.push(to_strings(fields));
        self
    }

    pub fn start(mut self, state: &str) -> Self {
        self.start = state.to_string();
        self
    }

    pub fn accept(mut self, states: &[&str]) -> Self {
        self.accept = to_strings(states);
        self
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Parses the given input string into a `Description` of the given kind.
///
/// # Returns
///
/// * `Ok(Description)` if the input is syntactically valid and has the sections `kind` needs.
/// * `Err(AutomatonError::ParseError)` for syntax errors, duplicate or unexpected sections.
/// * `Err(AutomatonError::ValidationError)` if a required section is missing.
pub fn parse(input: &str, kind: MachineKind) -> Result<Description, AutomatonError> {
    let root = DescriptionParser::parse(Rule::description, input)
        .map_err(|e| AutomatonError::ParseError(e.into()))?
        .next()
        .ok_or_else(|| AutomatonError::ValidationError("Empty description".to_string()))?;

    parse_description(root, kind)
}

/// Parses the top-level structure of a description from a `Pair<Rule::description>`.
fn parse_description(pair: Pair<Rule>, kind: MachineKind) -> Result<Description, AutomatonError> {
    let mut states: Option<Vec<String>> = None;
    let mut input_alphabet: Option<Vec<String>> = None;
    let mut auxiliary_alphabet: Option<Vec<String>> = None;
    let mut start: Option<String> = None;
    let mut accept: Option<Vec<String>> = None;
    let mut transitions = Vec::new();
    let mut seen = HashSet::new();

    for p in pair.into_inner() {
        let span = p.as_span();
        let rule = p.as_rule();

        check_unique_rule(rule, span, &mut seen)?;

        match rule {
            Rule::states => states = Some(parse_fields(p, kind)),
            Rule::input_alphabet => input_alphabet = Some(parse_fields(p, kind)),
            Rule::auxiliary_alphabet => {
                check_allowed_rule(rule, kind, span)?;
                auxiliary_alphabet = Some(parse_fields(p, kind));
            }
            Rule::transition => transitions.push(parse_fields(p, kind)),
            Rule::start => start = Some(parse_field(p)),
            Rule::accept => accept = Some(parse_fields(p, kind)),
            _ => {} // EOI
        }
    }

    let states = check_required_rule(states, Rule::states)?;
    let input_alphabet = check_required_rule(input_alphabet, Rule::input_alphabet)?;
    let start = check_required_rule(start, Rule::start)?;
    let accept = check_required_rule(accept, Rule::accept)?;
    let auxiliary_alphabet = if kind.has_auxiliary_alphabet() {
        check_required_rule(auxiliary_alphabet, Rule::auxiliary_alphabet)?
    } else {
        Vec::new()
    };

    Ok(Description {
        kind,
        states,
        input_alphabet,
        auxiliary_alphabet,
        transitions,
        start,
        accept,
    })
}

/// Extracts the trimmed fields of a `Tag:` line. A line with nothing after the tag has no fields.
///
/// In a Turing machine description a field made only of spaces is the blank cell, so it is
/// kept as a single space instead of being trimmed away.
fn parse_fields(pair: Pair<Rule>, kind: MachineKind) -> Vec<String> {
    let fields: Vec<String> = pair
        .into_inner()
        .flat_map(|fields| fields.into_inner())
        .map(|field| {
            let raw = field.as_str();
            match raw.trim() {
                "" if kind == MachineKind::Tm && !raw.is_empty() => SPACE_BLANK_TOKEN.to_string(),
                trimmed => trimmed.to_string(),
            }
        })
        .collect();

    if fields.len() == 1 && fields[0].is_empty() {
        return Vec::new();
    }

    fields
}

/// Extracts the single trimmed field of a `Tag:` line.
fn parse_field(pair: Pair<Rule>) -> String {
    pair.into_inner()
        .next()
        .map(|field| field.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Returns the description tag a section rule is written with.
fn tag(rule: Rule) -> &'static str {
    match rule {
        Rule::states => "Q:",
        Rule::input_alphabet => "A:",
        Rule::auxiliary_alphabet => "Z:",
        Rule::transition => "T:",
        Rule::start => "S:",
        Rule::accept => "F:",
        _ => "",
    }
}

/// Creates an `AutomatonError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> AutomatonError {
    AutomatonError::ParseError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

/// Checks if a section has already been declared. Only `T:` lines may repeat.
fn check_unique_rule(
    rule: Rule,
    span: Span,
    seen: &mut HashSet<Rule>,
) -> Result<(), AutomatonError> {
    if !matches!(
        rule,
        Rule::states
            | Rule::input_alphabet
            | Rule::auxiliary_alphabet
            | Rule::start
            | Rule::accept
    ) {
        return Ok(());
    };

    if !seen.insert(rule) {
        return Err(parse_error(
            &format!("Duplicate \"{}\" declaration", tag(rule)),
            span,
        ));
    }

    Ok(())
}

/// Checks that a section is meaningful for the machine kind being parsed.
fn check_allowed_rule(rule: Rule, kind: MachineKind, span: Span) -> Result<(), AutomatonError> {
    if rule == Rule::auxiliary_alphabet && !kind.has_auxiliary_alphabet() {
        return Err(parse_error(
            &format!("Unexpected \"{}\" section in {kind} description", tag(rule)),
            span,
        ));
    }

    Ok(())
}

/// Checks if a required section is present, returning an `Err` if it's missing.
fn check_required_rule<T>(value: Option<T>, rule: Rule) -> Result<T, AutomatonError> {
    value.ok_or_else(|| {
        AutomatonError::ValidationError(format!("Missing '{}' section", tag(rule)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_nfa() {
        let input = "Q:q0,q1\nA:a,b\nT:q0,a,q1\nT:q0,e,q1\nS:q0\nF:q1\n";

        let description = parse(input, MachineKind::Nfa).unwrap();
        assert_eq!(description.kind, MachineKind::Nfa);
        assert_eq!(description.states, vec!["q0", "q1"]);
        assert_eq!(description.input_alphabet, vec!["a", "b"]);
        assert!(description.auxiliary_alphabet.is_empty());
        assert_eq!(
            description.transitions,
            vec![vec!["q0", "a", "q1"], vec!["q0", "e", "q1"]]
        );
        assert_eq!(description.start, "q0");
        assert_eq!(description.accept, vec!["q1"]);
    }

    #[test]
    fn test_parse_matches_builder() {
        let input = "Q:q0,q1\nA:a\nZ:x\nT:q0,a,e,q1,x\nT:q1,e,x,q1,e\nS:q0\nF:q1";

        let expected = Description::new(MachineKind::Dpda)
            .states(&["q0", "q1"])
            .input_alphabet(&["a"])
            .auxiliary_alphabet(&["x"])
            .transition(&["q0", "a", "e", "q1", "x"])
            .transition(&["q1", "e", "x", "q1", "e"])
            .start("q0")
            .accept(&["q1"]);

        assert_eq!(parse(input, MachineKind::Dpda).unwrap(), expected);
    }

    #[test]
    fn test_parse_sections_in_any_order_with_blank_lines() {
        let input = "\nA:a\r\n\r\nQ:q0\n  S:q0\nF:\n\n";

        let description = parse(input, MachineKind::Nfa).unwrap();
        assert_eq!(description.states, vec!["q0"]);
        assert_eq!(description.input_alphabet, vec!["a"]);
        assert!(description.accept.is_empty());
        assert!(description.transitions.is_empty());
    }

    #[test]
    fn test_parse_trims_fields() {
        let input = "Q: q0 , q1\nA:0\nZ:0, _\nS:q0 \nF:q1,q0";

        let description = parse(input, MachineKind::Tm).unwrap();
        assert_eq!(description.states, vec!["q0", "q1"]);
        assert_eq!(description.auxiliary_alphabet, vec!["0", "_"]);
        assert_eq!(description.start, "q0");
    }

    #[test]
    fn test_parse_space_as_turing_machine_blank() {
        let input = "Q:q0,qa,qr\nA:0\nZ:0, \nT:q0, ,qa, ,R\nT:q0,0,q0,0,R\nS:q0\nF:qa,qr\n";

        let description = parse(input, MachineKind::Tm).unwrap();
        assert_eq!(description.auxiliary_alphabet, vec!["0", " "]);
        assert_eq!(description.transitions[0], vec!["q0", " ", "qa", " ", "R"]);
        assert_eq!(description.transitions[1], vec!["q0", "0", "q0", "0", "R"]);
    }

    #[test]
    fn test_parse_duplicate_section() {
        let input = "Q:q0\nQ:q1\nA:a\nS:q0\nF:q0";

        let error = parse(input, MachineKind::Nfa).unwrap_err();
        assert!(matches!(error, AutomatonError::ParseError(_)));
        assert!(error.to_string().contains("Duplicate \"Q:\" declaration"));
    }

    #[test]
    fn test_parse_missing_start() {
        let input = "Q:q0\nA:a\nF:q0";

        let error = parse(input, MachineKind::Nfa).unwrap_err();
        assert!(matches!(error, AutomatonError::ValidationError(_)));
        assert_eq!(
            error.to_string(),
            "Description validation error: Missing 'S:' section"
        );
    }

    #[test]
    fn test_parse_missing_auxiliary_alphabet() {
        let input = "Q:q0\nA:a\nS:q0\nF:q0";

        let error = parse(input, MachineKind::Dpda).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Description validation error: Missing 'Z:' section"
        );
    }

    #[test]
    fn test_parse_unexpected_auxiliary_alphabet() {
        let input = "Q:q0\nA:a\nZ:x\nS:q0\nF:q0";

        let error = parse(input, MachineKind::Nfa).unwrap_err();
        assert!(matches!(error, AutomatonError::ParseError(_)));
        assert!(error.to_string().contains("Unexpected \"Z:\" section"));
    }

    #[test]
    fn test_parse_unknown_tag() {
        let input = "Q:q0\nX:a\nS:q0\nF:q0";

        let error = parse(input, MachineKind::Nfa).unwrap_err();
        assert!(matches!(error, AutomatonError::ParseError(_)));
    }

    #[test]
    fn test_parse_start_with_several_states() {
        let input = "Q:q0,q1\nA:a\nS:q0,q1\nF:q0";

        let error = parse(input, MachineKind::Nfa).unwrap_err();
        assert!(matches!(error, AutomatonError::ParseError(_)));
    }
}
