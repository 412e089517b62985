//! Property-based tests for the result translator.
//!
//! Probabilities derived from any count histogram or probability
//! distribution lie in [0, 1] and sum to 1 over the full register.

use proptest::prelude::*;
use qcsnu_client::{ClientError, Distribution, ExecutionResult, Observable};
use serde_json::{Map, Value, json};

/// Every bitstring of `width` bits.
fn all_bitstrings(width: usize) -> Vec<String> {
    (0u32..1 << width).map(|i| format!("{i:0width$b}")).collect()
}

/// A fully populated histogram: one count per bitstring of a 1-6 bit register.
fn arb_counts() -> impl Strategy<Value = (usize, Vec<(String, u64)>)> {
    (1_usize..=6).prop_flat_map(|width| {
        let n = 1 << width;
        (
            Just(width),
            prop::collection::vec(0_u64..10_000, n).prop_filter("at least one shot", |c| {
                c.iter().any(|&x| x > 0)
            }),
        )
            .prop_map(|(width, counts)| {
                let pairs = all_bitstrings(width).into_iter().zip(counts).collect();
                (width, pairs)
            })
    })
}

/// A normalized distribution over every bitstring of a 1-6 bit register.
fn arb_probabilities() -> impl Strategy<Value = (usize, Vec<(String, f64)>)> {
    (1_usize..=6).prop_flat_map(|width| {
        let n = 1 << width;
        (
            Just(width),
            prop::collection::vec(0.0_f64..1.0, n)
                .prop_filter("non-zero mass", |w| w.iter().sum::<f64>() > 1e-3),
        )
            .prop_map(|(width, weights)| {
                let total: f64 = weights.iter().sum();
                let pairs = all_bitstrings(width)
                    .into_iter()
                    .zip(weights.into_iter().map(|w| w / total))
                    .collect();
                (width, pairs)
            })
    })
}

fn assert_is_distribution(result: &ExecutionResult, width: usize) -> Result<(), TestCaseError> {
    let mut total = 0.0;
    for bitstring in all_bitstrings(width) {
        let p = result.get_probability(&bitstring).unwrap();
        prop_assert!((0.0..=1.0).contains(&p), "P({bitstring}) = {p}");
        total += p;
    }
    prop_assert!((total - 1.0).abs() < 1e-9, "sum = {total}");
    Ok(())
}

proptest! {
    #[test]
    fn probabilities_are_bounded_and_sum_to_one((width, counts) in arb_counts()) {
        let result = ExecutionResult::from_counts("p", counts).unwrap();
        assert_is_distribution(&result, width)?;
    }

    #[test]
    fn probability_distributions_are_bounded_and_sum_to_one(
        (width, probabilities) in arb_probabilities()
    ) {
        let result = ExecutionResult::from_probabilities("p", probabilities).unwrap();
        assert_is_distribution(&result, width)?;
    }

    #[test]
    fn scaled_probabilities_are_rejected(
        (_width, probabilities) in arb_probabilities(),
        scale in 1.5_f64..10.0
    ) {
        let scaled = probabilities.into_iter().map(|(k, p)| (k, p * scale));
        let is_invalid = matches!(
            ExecutionResult::from_probabilities("p", scaled),
            Err(ClientError::InvalidResult(_))
        );
        prop_assert!(is_invalid);
    }

    #[test]
    fn whole_float_counts_read_as_counts((width, counts) in arb_counts()) {
        let as_floats: Map<String, Value> = counts
            .iter()
            .map(|(k, c)| (k.clone(), json!(*c as f64)))
            .collect();
        let dist: Distribution = serde_json::from_value(Value::Object(as_floats)).unwrap();
        prop_assert!(matches!(dist, Distribution::Counts(_)), "width {width}");

        let from_floats = ExecutionResult::new("p", dist).unwrap();
        let from_ints = ExecutionResult::from_counts("p", counts).unwrap();
        prop_assert_eq!(from_floats, from_ints);
    }

    #[test]
    fn parity_expectation_is_bounded((width, counts) in arb_counts()) {
        let result = ExecutionResult::from_counts("p", counts).unwrap();
        let value = result.expectation_value(&Observable::parity(width).unwrap()).unwrap();
        prop_assert!((-1.0 - 1e-9..=1.0 + 1e-9).contains(&value));
        prop_assert!((result.parity_expectation() - value).abs() < 1e-9);
    }

    #[test]
    fn wrong_width_is_rejected((width, counts) in arb_counts(), extra in 1_usize..3) {
        let result = ExecutionResult::from_counts("p", counts).unwrap();
        let bitstring = "0".repeat(width + extra);
        let is_length_error = matches!(
            result.get_probability(&bitstring),
            Err(ClientError::BitstringLength { .. })
        );
        prop_assert!(is_length_error);
    }
}
