use crate::parser::{parse, Description};
use crate::types::{AutomatonError, MachineKind};

// Default embedded machines
const SAMPLE_TEXTS: [(&str, MachineKind, &str); 4] = [
    (
        "ends-with-ab",
        MachineKind::Nfa,
        include_str!("../machines/ends-with-ab.nfa"),
    ),
    (
        "anbn",
        MachineKind::Dpda,
        include_str!("../machines/anbn.dpda"),
    ),
    (
        "even-zeros",
        MachineKind::Tm,
        include_str!("../machines/even-zeros.tm"),
    ),
    (
        "zeros-then-ones",
        MachineKind::Tm,
        include_str!("../machines/zeros-then-ones.tm"),
    ),
];

/// An embedded example machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub name: &'static str,
    pub kind: MachineKind,
    pub text: &'static str,
}

impl Sample {
    /// Parses the sample's description text.
    pub fn description(&self) -> Result<Description, AutomatonError> {
        parse(self.text, self.kind)
    }
}

lazy_static::lazy_static! {
    pub static ref SAMPLES: Vec<Sample> = SAMPLE_TEXTS
        .iter()
        .map(|&(name, kind, text)| Sample { name, kind, text })
        .collect();
}

pub struct SampleCatalog;

impl SampleCatalog {
    /// Get the number of available samples
    pub fn count() -> usize {
        SAMPLES.len()
    }

    /// Get a sample by its name
    pub fn get(name: &str) -> Result<&'static Sample, AutomatonError> {
        SAMPLES
            .iter()
            .find(|sample| sample.name == name)
            .ok_or_else(|| AutomatonError::ValidationError(format!("Sample '{}' not found", name)))
    }

    /// List all sample names
    pub fn names() -> Vec<&'static str> {
        SAMPLES.iter().map(|sample| sample.name).collect()
    }

    /// Search for samples of one machine kind
    pub fn of_kind(kind: MachineKind) -> Vec<&'static Sample> {
        SAMPLES.iter().filter(|sample| sample.kind == kind).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dpda::Dpda;
    use crate::machine::TuringMachine;
    use crate::nfa::Nfa;
    use crate::types::{Automaton, Verdict};

    fn case(tokens: &str) -> Vec<String> {
        tokens.chars().map(|c| c.to_string()).collect()
    }

    fn verdicts<M: Automaton>(name: &str, inputs: &[&str]) -> Vec<Verdict> {
        let description = SampleCatalog::get(name).unwrap().description().unwrap();
        let machine = M::from_description(&description).unwrap();

        inputs
            .iter()
            .map(|input| machine.run(&case(input)).verdict().unwrap())
            .collect()
    }

    #[test]
    fn test_sample_names() {
        let names = SampleCatalog::names();
        assert_eq!(SampleCatalog::count(), 4);
        assert!(names.contains(&"ends-with-ab"));
        assert!(names.contains(&"anbn"));
        assert!(names.contains(&"even-zeros"));
        assert!(names.contains(&"zeros-then-ones"));
    }

    #[test]
    fn test_get_missing_sample() {
        let result = SampleCatalog::get("Nonexistent");
        assert!(matches!(result, Err(AutomatonError::ValidationError(_))));
    }

    #[test]
    fn test_all_samples_are_valid() {
        for sample in SAMPLES.iter() {
            let description = sample
                .description()
                .unwrap_or_else(|e| panic!("Sample '{}' does not parse: {}", sample.name, e));

            let built = match sample.kind {
                MachineKind::Nfa => Nfa::from_description(&description).map(|_| ()),
                MachineKind::Dpda => Dpda::from_description(&description).map(|_| ()),
                MachineKind::Tm => TuringMachine::from_description(&description).map(|_| ()),
            };
            assert!(built.is_ok(), "Sample '{}' is invalid: {:?}", sample.name, built);
        }
    }

    #[test]
    fn test_samples_by_kind() {
        assert_eq!(SampleCatalog::of_kind(MachineKind::Nfa).len(), 1);
        assert_eq!(SampleCatalog::of_kind(MachineKind::Tm).len(), 2);
    }

    #[test]
    fn test_ends_with_ab() {
        assert_eq!(
            verdicts::<Nfa>("ends-with-ab", &["ab", "bbab", "", "ba", "abb"]),
            vec![
                Verdict::Accept,
                Verdict::Accept,
                Verdict::Reject,
                Verdict::Reject,
                Verdict::Reject
            ]
        );
    }

    #[test]
    fn test_anbn() {
        assert_eq!(
            verdicts::<Dpda>("anbn", &["", "ab", "aaabbb", "a", "abb", "ba", "abab"]),
            vec![
                Verdict::Accept,
                Verdict::Accept,
                Verdict::Accept,
                Verdict::Reject,
                Verdict::Reject,
                Verdict::Reject,
                Verdict::Reject
            ]
        );
    }

    #[test]
    fn test_even_zeros() {
        assert_eq!(
            verdicts::<TuringMachine>("even-zeros", &["", "00", "0", "000"]),
            vec![
                Verdict::Accept,
                Verdict::Accept,
                Verdict::Reject,
                Verdict::Reject
            ]
        );
    }

    #[test]
    fn test_zeros_then_ones() {
        assert_eq!(
            verdicts::<TuringMachine>("zeros-then-ones", &["", "01", "0011", "011", "001", "10"]),
            vec![
                Verdict::Accept,
                Verdict::Accept,
                Verdict::Accept,
                Verdict::Reject,
                Verdict::Reject,
                Verdict::Reject
            ]
        );
    }
}
