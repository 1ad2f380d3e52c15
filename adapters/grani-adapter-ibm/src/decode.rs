//! Result normalization: raw sampler payloads → canonical counts.
//!
//! The IBM sampler API has gone through several result shapes: legacy
//! quasi-probability distributions, pre-aggregated count maps, and the V2
//! per-shot bit-array samples (which themselves appear as hex strings,
//! fixed-width bit rows, one-element integer rows, or bare integers
//! depending on the service build). This module classifies a payload once
//! into an explicit [`ResultFormat`] and converts it into
//! [`grani_hal::Counts`] over canonical fixed-width bitstrings.
//!
//! Anything that cannot be classified or converted is a hard
//! [`DecodeError`] — with one deliberate exception: quasi-distribution keys
//! that match no known encoding fall back to their raw string form under
//! [`KeyPolicy::Lenient`] (the default), preserving the long-standing
//! lenient behavior of the sampler clients. [`KeyPolicy::Strict`] turns
//! that fallback into an error.

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use grani_hal::Counts;
use grani_hal::result::to_bitstring;

use crate::api::{ClassicalRegisterData, SamplerResult};

/// Errors raised while normalizing a result payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The payload carries none of the known sampler result fields.
    #[error("result payload matches no known sampler format")]
    UnknownFormat,

    /// The response contained no per-circuit results at all.
    #[error("result payload contains no sampler results")]
    EmptyResults,

    /// A bit-array row has a shape no rule recognizes.
    #[error("unrecognized sample row: {0}")]
    UnrecognizedSample(String),

    /// An integer sample does not fit the declared register width.
    #[error("sample value {value} does not fit in {width} bits")]
    SampleOutOfRange {
        /// The offending value.
        value: u64,
        /// Declared register width.
        width: usize,
    },

    /// A quasi-distribution key matched no known outcome encoding
    /// (strict mode only).
    #[error("quasi-distribution key '{0}' is not a recognizable outcome")]
    MalformedKey(String),
}

/// How to treat quasi-distribution keys that match no known encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyPolicy {
    /// Pass the raw key string through as the outcome (historical behavior;
    /// may yield an outcome that is not a valid fixed-width bitstring).
    #[default]
    Lenient,
    /// Fail with [`DecodeError::MalformedKey`].
    Strict,
}

/// The classified shape of one sampler result.
#[derive(Debug)]
pub enum ResultFormat<'a> {
    /// V2 payload: per-shot samples grouped by classical register.
    BitArray(&'a HashMap<String, ClassicalRegisterData>),
    /// Legacy payload: quasi-probability distributions.
    QuasiDistribution(&'a [HashMap<String, f64>]),
    /// Legacy payload: pre-aggregated counts.
    Counts(&'a HashMap<String, u64>),
}

/// Classify a sampler result into its wire format.
///
/// Exactly one of the payload fields decides the format; a payload carrying
/// none of them is an error, never a guess.
pub fn classify(result: &SamplerResult) -> Result<ResultFormat<'_>, DecodeError> {
    if let Some(data) = &result.data {
        return Ok(ResultFormat::BitArray(data));
    }
    if let Some(counts) = &result.counts {
        return Ok(ResultFormat::Counts(counts));
    }
    if let Some(dists) = &result.quasi_dists {
        return Ok(ResultFormat::QuasiDistribution(dists));
    }
    Err(DecodeError::UnknownFormat)
}

/// Normalize one sampler result into counts over `width`-bit outcomes.
///
/// `shots` is the requested shot count for the job; quasi-distribution
/// payloads convert probabilities through it unless the result metadata
/// reports its own shot count.
pub fn decode_counts(
    result: &SamplerResult,
    width: usize,
    shots: u32,
    policy: KeyPolicy,
) -> Result<Counts, DecodeError> {
    match classify(result)? {
        ResultFormat::BitArray(registers) => decode_bit_array(registers, width),
        ResultFormat::Counts(raw) => decode_flat(raw, width, policy),
        ResultFormat::QuasiDistribution(dists) => {
            let effective_shots = metadata_shots(result).unwrap_or(u64::from(shots));
            decode_quasi(dists, width, effective_shots, policy)
        }
    }
}

/// Shot count reported in result metadata, if any.
fn metadata_shots(result: &SamplerResult) -> Option<u64> {
    result
        .metadata
        .as_ref()
        .and_then(|m| m.get("shots"))
        .and_then(Value::as_u64)
}

/// Decode V2 bit-array registers into per-outcome frequencies.
fn decode_bit_array(
    registers: &HashMap<String, ClassicalRegisterData>,
    width: usize,
) -> Result<Counts, DecodeError> {
    let mut counts = Counts::new();

    for register in registers.values() {
        let reg_width = register.num_bits.unwrap_or(width);
        for sample in &register.samples {
            let bitstring = sample_to_bitstring(sample, reg_width)?;
            counts.insert(bitstring, 1);
        }
    }

    Ok(counts)
}

/// Convert one raw sample row to a canonical bitstring.
///
/// Accepted row shapes, first match wins:
/// - array of exactly `width` 0/1 values → joined, row order = MSB first
/// - one-element array holding an unsigned integer → zero-padded binary
/// - bare unsigned integer → zero-padded binary
/// - string: `0x`-hex, exact-width binary, or decimal → zero-padded binary
///
/// Everything else is a hard error; a sample is never silently dropped.
fn sample_to_bitstring(sample: &Value, width: usize) -> Result<String, DecodeError> {
    match sample {
        Value::Array(row) => {
            if row.len() == width && row.iter().all(is_bit) {
                return Ok(row
                    .iter()
                    .map(|bit| if bit.as_u64() == Some(1) { '1' } else { '0' })
                    .collect());
            }
            if row.len() == 1 {
                if let Some(value) = row[0].as_u64() {
                    return int_to_bits(value, width);
                }
            }
            Err(DecodeError::UnrecognizedSample(sample.to_string()))
        }
        Value::Number(_) => {
            let value = sample
                .as_u64()
                .ok_or_else(|| DecodeError::UnrecognizedSample(sample.to_string()))?;
            int_to_bits(value, width)
        }
        Value::String(s) => {
            // Exact-width binary wins over the decimal reading of e.g. "011".
            if is_exact_binary(s, width) {
                return Ok(s.clone());
            }
            match parse_outcome_string(s) {
                Some(value) => int_to_bits(value, width),
                None => Err(DecodeError::UnrecognizedSample(sample.to_string())),
            }
        }
        _ => Err(DecodeError::UnrecognizedSample(sample.to_string())),
    }
}

/// Decode legacy quasi-probability distributions.
///
/// Probabilities convert to integer counts via `round(p × shots)`;
/// negative quasi-probabilities and zero rounds are dropped.
fn decode_quasi(
    dists: &[HashMap<String, f64>],
    width: usize,
    shots: u64,
    policy: KeyPolicy,
) -> Result<Counts, DecodeError> {
    let mut counts = Counts::new();

    if let Some(dist) = dists.first() {
        for (key, &prob) in dist {
            let bitstring = key_to_bitstring(key, width, policy)?;
            let count = (prob * shots as f64).max(0.0).round() as u64;
            if count > 0 {
                counts.insert(bitstring, count);
            }
        }
    }

    Ok(counts)
}

/// Decode a legacy pre-aggregated counts map.
///
/// Keys are usually hex ("0x3") but occasionally already binary; both
/// normalize to `width`-bit strings.
fn decode_flat(
    raw: &HashMap<String, u64>,
    width: usize,
    policy: KeyPolicy,
) -> Result<Counts, DecodeError> {
    let mut counts = Counts::new();
    for (key, &count) in raw {
        let bitstring = key_to_bitstring(key, width, policy)?;
        counts.insert(bitstring, count);
    }
    Ok(counts)
}

/// Normalize a counts/quasi-distribution key into a canonical bitstring.
///
/// Recognized encodings, first match wins: exact-width binary, `0x`-hex,
/// decimal. Unrecognizable keys fall back to their raw form under
/// [`KeyPolicy::Lenient`] and fail under [`KeyPolicy::Strict`].
fn key_to_bitstring(key: &str, width: usize, policy: KeyPolicy) -> Result<String, DecodeError> {
    if is_exact_binary(key, width) {
        return Ok(key.to_string());
    }
    if let Some(value) = parse_outcome_string(key) {
        if let Ok(bits) = int_to_bits(value, width) {
            return Ok(bits);
        }
    }
    match policy {
        KeyPolicy::Lenient => {
            warn!("passing through unrecognizable outcome key '{key}'");
            Ok(key.to_string())
        }
        KeyPolicy::Strict => Err(DecodeError::MalformedKey(key.to_string())),
    }
}

/// Parse a hex or decimal outcome string.
fn parse_outcome_string(s: &str) -> Option<u64> {
    if let Some(hex) = s.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).ok()
    } else if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse::<u64>().ok()
    } else {
        None
    }
}

fn is_exact_binary(s: &str, width: usize) -> bool {
    s.len() == width && s.bytes().all(|b| b == b'0' || b == b'1')
}

fn is_bit(value: &Value) -> bool {
    matches!(value.as_u64(), Some(0) | Some(1))
}

fn fits(value: u64, width: usize) -> bool {
    width >= 64 || value < (1u64 << width)
}

/// Range-checked fixed-width rendering.
fn int_to_bits(value: u64, width: usize) -> Result<String, DecodeError> {
    if !fits(value, width) {
        return Err(DecodeError::SampleOutOfRange { value, width });
    }
    Ok(to_bitstring(value, width))
}

/// Infer the register width from the samples themselves.
///
/// Fallback for results whose submission width is unknown: fixed-width rows
/// pin the width directly; otherwise the largest integer value decides.
pub(crate) fn infer_bit_width(registers: &HashMap<String, ClassicalRegisterData>) -> usize {
    let mut max_value: u64 = 0;

    for register in registers.values() {
        if let Some(num_bits) = register.num_bits {
            return num_bits;
        }
        for sample in &register.samples {
            match sample {
                Value::Array(row) if row.len() > 1 => return row.len(),
                Value::Array(row) if row.len() == 1 => {
                    if let Some(v) = row[0].as_u64() {
                        max_value = max_value.max(v);
                    }
                }
                Value::Number(_) => {
                    if let Some(v) = sample.as_u64() {
                        max_value = max_value.max(v);
                    }
                }
                Value::String(s) => {
                    if let Some(hex) = s.strip_prefix("0x") {
                        if let Ok(v) = u64::from_str_radix(hex, 16) {
                            max_value = max_value.max(v);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    if max_value == 0 {
        // All zeros — need at least 1 bit to display "0"
        1
    } else {
        64 - max_value.leading_zeros() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bit_array_result(samples: Vec<Value>, num_bits: Option<usize>) -> SamplerResult {
        let mut data = HashMap::new();
        data.insert(
            "c".to_string(),
            ClassicalRegisterData { samples, num_bits },
        );
        SamplerResult {
            data: Some(data),
            quasi_dists: None,
            counts: None,
            metadata: None,
        }
    }

    #[test]
    fn test_bit_rows_msb_first() {
        let result = bit_array_result(vec![json!([0, 1, 1]), json!([0, 1, 1]), json!([1, 0, 0])], None);
        let counts = decode_counts(&result, 3, 3, KeyPolicy::default()).unwrap();

        assert_eq!(counts.get("011"), 2);
        assert_eq!(counts.get("100"), 1);
        assert_eq!(counts.total_shots(), 3);
    }

    #[test]
    fn test_single_element_rows() {
        let result = bit_array_result(vec![json!([3]), json!([0]), json!([3])], None);
        let counts = decode_counts(&result, 3, 3, KeyPolicy::default()).unwrap();

        assert_eq!(counts.get("011"), 2);
        assert_eq!(counts.get("000"), 1);
    }

    #[test]
    fn test_bare_integer_rows() {
        let result = bit_array_result(vec![json!(3), json!(0), json!(7)], None);
        let counts = decode_counts(&result, 3, 3, KeyPolicy::default()).unwrap();

        assert_eq!(counts.get("011"), 1);
        assert_eq!(counts.get("000"), 1);
        assert_eq!(counts.get("111"), 1);
    }

    #[test]
    fn test_hex_string_rows() {
        let result = bit_array_result(
            vec![json!("0x0"), json!("0x3"), json!("0x0"), json!("0x3"), json!("0x0")],
            None,
        );
        let counts = decode_counts(&result, 2, 5, KeyPolicy::default()).unwrap();

        assert_eq!(counts.get("00"), 3);
        assert_eq!(counts.get("11"), 2);
    }

    #[test]
    fn test_output_width_is_exact() {
        let result = bit_array_result(vec![json!(0), json!(5), json!([1, 0, 1, 1]), json!("0x2")], Some(4));
        let counts = decode_counts(&result, 3, 4, KeyPolicy::default()).unwrap();

        assert_eq!(counts.total_shots(), 4);
        for (bits, _) in counts.iter() {
            assert_eq!(bits.len(), 4);
        }
    }

    #[test]
    fn test_declared_num_bits_overrides_width() {
        let result = bit_array_result(vec![json!(3)], Some(5));
        let counts = decode_counts(&result, 3, 1, KeyPolicy::default()).unwrap();
        assert_eq!(counts.get("00011"), 1);
    }

    #[test]
    fn test_wrong_length_row_is_hard_error() {
        let result = bit_array_result(vec![json!([0, 1])], None);
        let err = decode_counts(&result, 3, 1, KeyPolicy::default()).unwrap_err();
        assert!(matches!(err, DecodeError::UnrecognizedSample(_)));
    }

    #[test]
    fn test_out_of_range_sample_is_hard_error() {
        let result = bit_array_result(vec![json!(9)], None);
        let err = decode_counts(&result, 3, 1, KeyPolicy::default()).unwrap_err();
        assert_eq!(err, DecodeError::SampleOutOfRange { value: 9, width: 3 });
    }

    #[test]
    fn test_non_bit_row_is_hard_error() {
        let result = bit_array_result(vec![json!([0, 2, 1])], None);
        let err = decode_counts(&result, 3, 1, KeyPolicy::default()).unwrap_err();
        assert!(matches!(err, DecodeError::UnrecognizedSample(_)));
    }

    #[test]
    fn test_quasi_distribution_rounding() {
        let result = SamplerResult {
            data: None,
            quasi_dists: Some(vec![HashMap::from([
                ("011".to_string(), 0.6),
                ("100".to_string(), 0.4),
            ])]),
            counts: None,
            metadata: None,
        };

        let counts = decode_counts(&result, 3, 10, KeyPolicy::default()).unwrap();
        assert_eq!(counts.get("011"), 6);
        assert_eq!(counts.get("100"), 4);
    }

    #[test]
    fn test_quasi_hex_and_decimal_keys() {
        let result = SamplerResult {
            data: None,
            quasi_dists: Some(vec![HashMap::from([
                ("0x3".to_string(), 0.5),
                ("4".to_string(), 0.5),
            ])]),
            counts: None,
            metadata: None,
        };

        let counts = decode_counts(&result, 3, 100, KeyPolicy::default()).unwrap();
        assert_eq!(counts.get("011"), 50);
        assert_eq!(counts.get("100"), 50);
    }

    #[test]
    fn test_quasi_negative_probability_dropped() {
        let result = SamplerResult {
            data: None,
            quasi_dists: Some(vec![HashMap::from([
                ("011".to_string(), 1.02),
                ("100".to_string(), -0.02),
            ])]),
            counts: None,
            metadata: None,
        };

        let counts = decode_counts(&result, 3, 100, KeyPolicy::default()).unwrap();
        assert_eq!(counts.get("011"), 102);
        assert_eq!(counts.get("100"), 0);
    }

    #[test]
    fn test_quasi_metadata_shots_override() {
        let result = SamplerResult {
            data: None,
            quasi_dists: Some(vec![HashMap::from([("11".to_string(), 1.0)])]),
            counts: None,
            metadata: Some(json!({"shots": 500})),
        };

        // Requested 1024 shots, but metadata says the service ran 500.
        let counts = decode_counts(&result, 2, 1024, KeyPolicy::default()).unwrap();
        assert_eq!(counts.get("11"), 500);
    }

    #[test]
    fn test_malformed_key_lenient_passthrough() {
        let result = SamplerResult {
            data: None,
            quasi_dists: Some(vec![HashMap::from([("what".to_string(), 1.0)])]),
            counts: None,
            metadata: None,
        };

        let counts = decode_counts(&result, 3, 10, KeyPolicy::Lenient).unwrap();
        assert_eq!(counts.get("what"), 10);
    }

    #[test]
    fn test_malformed_key_strict_errors() {
        let result = SamplerResult {
            data: None,
            quasi_dists: Some(vec![HashMap::from([("what".to_string(), 1.0)])]),
            counts: None,
            metadata: None,
        };

        let err = decode_counts(&result, 3, 10, KeyPolicy::Strict).unwrap_err();
        assert_eq!(err, DecodeError::MalformedKey("what".to_string()));
    }

    #[test]
    fn test_flat_counts_normalized() {
        let result = SamplerResult {
            data: None,
            quasi_dists: None,
            counts: Some(HashMap::from([
                ("0x0".to_string(), 500),
                ("0x3".to_string(), 500),
            ])),
            metadata: None,
        };

        let counts = decode_counts(&result, 4, 1000, KeyPolicy::default()).unwrap();
        assert_eq!(counts.get("0000"), 500);
        assert_eq!(counts.get("0011"), 500);
        assert_eq!(counts.total_shots(), 1000);
    }

    #[test]
    fn test_flat_binary_keys_pass_through() {
        let result = SamplerResult {
            data: None,
            quasi_dists: None,
            counts: Some(HashMap::from([("011".to_string(), 7)])),
            metadata: None,
        };

        let counts = decode_counts(&result, 3, 7, KeyPolicy::default()).unwrap();
        assert_eq!(counts.get("011"), 7);
    }

    #[test]
    fn test_unknown_format_is_hard_error() {
        let result = SamplerResult {
            data: None,
            quasi_dists: None,
            counts: None,
            metadata: None,
        };

        let err = decode_counts(&result, 3, 10, KeyPolicy::default()).unwrap_err();
        assert_eq!(err, DecodeError::UnknownFormat);
    }

    #[test]
    fn test_classify_prefers_bit_array() {
        let result = bit_array_result(vec![json!(0)], None);
        assert!(matches!(
            classify(&result).unwrap(),
            ResultFormat::BitArray(_)
        ));
    }

    #[test]
    fn test_infer_bit_width() {
        // Bell state: max value 3 → 2 bits
        let result = bit_array_result(vec![json!("0x0"), json!("0x3"), json!("0x0")], None);
        assert_eq!(infer_bit_width(result.data.as_ref().unwrap()), 2);

        // GHZ on 3 qubits: max value 7 → 3 bits
        let result = bit_array_result(vec![json!("0x0"), json!("0x7")], None);
        assert_eq!(infer_bit_width(result.data.as_ref().unwrap()), 3);

        // All zeros → 1 bit
        let result = bit_array_result(vec![json!("0x0"), json!("0x0")], None);
        assert_eq!(infer_bit_width(result.data.as_ref().unwrap()), 1);

        // Fixed-width rows pin the width directly
        let result = bit_array_result(vec![json!([0, 0, 1, 0])], None);
        assert_eq!(infer_bit_width(result.data.as_ref().unwrap()), 4);

        // Declared num_bits wins over everything
        let result = bit_array_result(vec![json!("0x1")], Some(6));
        assert_eq!(infer_bit_width(result.data.as_ref().unwrap()), 6);
    }
}
