//! Text drafts for every editable scalar.
//!
//! Drafts hold exactly what the user typed. The canonical network only
//! changes when every draft parses, so a half-typed number such as `1.` or
//! `-` never corrupts committed state.

use crate::neural::{InputValues, Network, INPUT_WIDTH};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

static NUMBER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("number pattern is valid")
});

/// Identifies one editable scalar
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParameterAddress {
    Input(usize),
    Bias { layer: usize, neuron: usize },
    Weight { layer: usize, neuron: usize, weight: usize },
}

impl fmt::Display for ParameterAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input(slot) => write!(f, "x{}", slot + 1),
            Self::Bias { layer, neuron } => write!(f, "b[{}][{}]", layer, neuron),
            Self::Weight { layer, neuron, weight } => {
                write!(f, "w[{}][{}][{}]", layer, neuron, weight)
            }
        }
    }
}

/// Raw text per address
pub type Drafts = BTreeMap<ParameterAddress, String>;

/// A draft does not represent a finite real number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub text: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a number", self.text)
    }
}

impl std::error::Error for ParseError {}

/// Canonical text for a number: shortest round-trip form, integers without
/// a fractional part
pub fn format_number(value: f64) -> String {
    format!("{}", value)
}

/// Parse user text as a finite number
pub fn parse_number(text: &str) -> Result<f64, ParseError> {
    let trimmed = text.trim();
    let err = || ParseError {
        text: text.to_string(),
    };

    if !NUMBER_PATTERN.is_match(trimmed) {
        return Err(err());
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(err()),
    }
}

/// Every address of a network and input vector with its canonical value,
/// inputs first, then each layer's biases and weights in order
pub fn canonical_values(net: &Network, inputs: &InputValues) -> Vec<(ParameterAddress, f64)> {
    let mut values: Vec<_> = inputs
        .iter()
        .enumerate()
        .map(|(slot, &v)| (ParameterAddress::Input(slot), v))
        .collect();

    for (l, layer) in net.layers.iter().enumerate() {
        let layer_index = l + 1;
        for (n, neuron) in layer.neurons.iter().enumerate() {
            values.push((
                ParameterAddress::Bias {
                    layer: layer_index,
                    neuron: n,
                },
                neuron.bias,
            ));
            for (w, &weight) in neuron.weights.iter().enumerate() {
                values.push((
                    ParameterAddress::Weight {
                        layer: layer_index,
                        neuron: n,
                        weight: w,
                    },
                    weight,
                ));
            }
        }
    }

    values
}

/// Canonical drafts for a network and input vector
pub fn build_drafts(net: &Network, inputs: &InputValues) -> Drafts {
    canonical_values(net, inputs)
        .into_iter()
        .map(|(address, value)| (address, format_number(value)))
        .collect()
}

/// Rebuild drafts for the current state, keeping any previous text that
/// still parses to exactly the canonical value
pub fn reconcile(prev: &Drafts, net: &Network, inputs: &InputValues) -> Drafts {
    canonical_values(net, inputs)
        .into_iter()
        .map(|(address, value)| {
            let text = match prev.get(&address) {
                Some(text) if parse_number(text) == Ok(value) => text.clone(),
                _ => format_number(value),
            };
            (address, text)
        })
        .collect()
}

/// Per-address validity flags for input fields
pub fn field_validity(drafts: &Drafts) -> BTreeMap<ParameterAddress, bool> {
    drafts
        .iter()
        .map(|(address, text)| (*address, parse_number(text).is_ok()))
        .collect()
}

/// The edited address does not exist in the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownAddress(pub ParameterAddress);

impl fmt::Display for UnknownAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no editable parameter at {}", self.0)
    }
}

impl std::error::Error for UnknownAddress {}

/// Result of writing one draft
#[derive(Clone, Debug, PartialEq)]
pub struct CommitOutcome {
    /// Drafts including the new text
    pub drafts: Drafts,
    /// Addresses whose text does not parse; empty when the edit applied
    pub invalid: BTreeSet<ParameterAddress>,
    /// New network and inputs when every draft parsed
    pub applied: Option<(Network, InputValues)>,
}

impl CommitOutcome {
    /// Numeric updates are held back until every field is valid
    pub fn is_paused(&self) -> bool {
        !self.invalid.is_empty()
    }
}

/// Write `text` into the draft for `address` and, if every draft then parses,
/// build the updated network and inputs
pub fn commit_edit(
    drafts: &Drafts,
    address: ParameterAddress,
    text: &str,
    net: &Network,
    inputs: &InputValues,
) -> Result<CommitOutcome, UnknownAddress> {
    let canonical = canonical_values(net, inputs);
    if !canonical.iter().any(|(a, _)| *a == address) {
        return Err(UnknownAddress(address));
    }

    let mut drafts = drafts.clone();
    drafts.insert(address, text.to_string());

    let mut invalid = BTreeSet::new();
    let mut parsed = BTreeMap::new();
    for (addr, value) in canonical {
        match drafts.get(&addr) {
            Some(text) => match parse_number(text) {
                Ok(v) => {
                    parsed.insert(addr, v);
                }
                Err(_) => {
                    invalid.insert(addr);
                }
            },
            None => {
                parsed.insert(addr, value);
            }
        }
    }

    if !invalid.is_empty() {
        return Ok(CommitOutcome {
            drafts,
            invalid,
            applied: None,
        });
    }

    let mut next_inputs = *inputs;
    for (slot, v) in next_inputs.iter_mut().enumerate().take(INPUT_WIDTH) {
        *v = parsed[&ParameterAddress::Input(slot)];
    }

    let mut next = net.clone();
    for (l, layer) in next.layers.iter_mut().enumerate() {
        let layer_index = l + 1;
        for (n, neuron) in layer.neurons.iter_mut().enumerate() {
            neuron.bias = parsed[&ParameterAddress::Bias {
                layer: layer_index,
                neuron: n,
            }];
            for (w, weight) in neuron.weights.iter_mut().enumerate() {
                *weight = parsed[&ParameterAddress::Weight {
                    layer: layer_index,
                    neuron: n,
                    weight: w,
                }];
            }
        }
    }

    Ok(CommitOutcome {
        drafts,
        invalid,
        applied: Some((next, next_inputs)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const W0: ParameterAddress = ParameterAddress::Weight {
        layer: 1,
        neuron: 0,
        weight: 0,
    };
    const W1: ParameterAddress = ParameterAddress::Weight {
        layer: 1,
        neuron: 0,
        weight: 1,
    };

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-0.5), "-0.5");
        assert_eq!(format_number(0.1), "0.1");
        assert_eq!(format_number(1e-7), "0.0000001");
    }

    #[test]
    fn test_parse_accepts_numbers() {
        assert_eq!(parse_number("3"), Ok(3.0));
        assert_eq!(parse_number("  -2.50 "), Ok(-2.5));
        assert_eq!(parse_number("+.5"), Ok(0.5));
        assert_eq!(parse_number("1."), Ok(1.0));
        assert_eq!(parse_number("1e3"), Ok(1000.0));
        assert_eq!(parse_number("2.5E-1"), Ok(0.25));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for text in ["", "  ", "-", ".", "1e", "abc", "1.2.3", "inf", "NaN", "0x10", "1e999"] {
            assert!(parse_number(text).is_err(), "{:?} should not parse", text);
        }
    }

    #[test]
    fn test_build_drafts_covers_every_parameter() {
        let net = Network::identity().add_hidden_layer().unwrap();
        let drafts = build_drafts(&net, &[1.0, -2.0]);

        // 2 inputs + 3 hidden biases + 6 hidden weights + 1 output bias + 3 output weights
        assert_eq!(drafts.len(), 15);
        assert_eq!(drafts[&ParameterAddress::Input(1)], "-2");
        assert_eq!(drafts[&W0], "0");
    }

    #[test]
    fn test_reconcile_keeps_equivalent_text() {
        let net = Network::identity();
        let mut drafts = build_drafts(&net, &[1.0, 0.0]);
        drafts.insert(ParameterAddress::Input(0), "1.000".to_string());
        drafts.insert(W0, "5".to_string());

        let next = reconcile(&drafts, &net, &[1.0, 0.0]);
        assert_eq!(next[&ParameterAddress::Input(0)], "1.000");
        assert_eq!(next[&W0], "0");
    }

    #[test]
    fn test_reconcile_drops_stale_addresses() {
        let big = Network::identity().add_hidden_layer().unwrap();
        let drafts = build_drafts(&big, &[0.0, 0.0]);
        let next = reconcile(&drafts, &Network::identity(), &[0.0, 0.0]);
        assert_eq!(next, build_drafts(&Network::identity(), &[0.0, 0.0]));
    }

    #[test]
    fn test_reconcile_idempotent() {
        let net = Network::identity();
        let mut drafts = build_drafts(&net, &[0.0, 0.0]);
        drafts.insert(W1, "0.0".to_string());
        drafts.insert(W0, "oops".to_string());

        let once = reconcile(&drafts, &net, &[0.0, 0.0]);
        let twice = reconcile(&once, &net, &[0.0, 0.0]);
        assert_eq!(once, twice);
        assert_eq!(once[&W1], "0.0");
    }

    #[test]
    fn test_commit_valid_edit() {
        let net = Network::identity();
        let drafts = build_drafts(&net, &[0.0, 0.0]);

        let outcome = commit_edit(&drafts, W0, "1.50", &net, &[0.0, 0.0]).unwrap();
        assert!(!outcome.is_paused());
        let (next, inputs) = outcome.applied.unwrap();
        assert_eq!(next.layers[0].neurons[0].weights, vec![1.5, 0.0]);
        assert_eq!(inputs, [0.0, 0.0]);
        assert_eq!(outcome.drafts[&W0], "1.50");
    }

    #[test]
    fn test_commit_invalid_pauses() {
        let net = Network::identity();
        let drafts = build_drafts(&net, &[0.0, 0.0]);

        let outcome = commit_edit(&drafts, W0, "-", &net, &[0.0, 0.0]).unwrap();
        assert!(outcome.is_paused());
        assert!(outcome.applied.is_none());
        assert!(outcome.invalid.contains(&W0));
        assert_eq!(outcome.drafts[&W0], "-");

        // another valid edit is still held back while W0 is invalid
        let outcome = commit_edit(&outcome.drafts, W1, "2", &net, &[0.0, 0.0]).unwrap();
        assert!(outcome.applied.is_none());
        assert_eq!(field_validity(&outcome.drafts)[&W1], true);
        assert_eq!(field_validity(&outcome.drafts)[&W0], false);

        // fixing W0 applies both edits at once
        let outcome = commit_edit(&outcome.drafts, W0, "-1", &net, &[0.0, 0.0]).unwrap();
        let (next, _) = outcome.applied.unwrap();
        assert_eq!(next.layers[0].neurons[0].weights, vec![-1.0, 2.0]);
    }

    #[test]
    fn test_commit_input_edit() {
        let net = Network::identity();
        let drafts = build_drafts(&net, &[0.0, 0.0]);
        let outcome =
            commit_edit(&drafts, ParameterAddress::Input(1), "4e-1", &net, &[0.0, 0.0]).unwrap();
        let (next, inputs) = outcome.applied.unwrap();
        assert_eq!(inputs, [0.0, 0.4]);
        assert_eq!(next, net);
    }

    #[test]
    fn test_commit_unknown_address() {
        let net = Network::identity();
        let drafts = build_drafts(&net, &[0.0, 0.0]);
        let address = ParameterAddress::Bias { layer: 4, neuron: 0 };
        assert_eq!(
            commit_edit(&drafts, address, "1", &net, &[0.0, 0.0]),
            Err(UnknownAddress(address))
        );
    }
}
