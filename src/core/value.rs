//! Purpose: Guess a display form for schemaless cell values.
//! Exports: `DecodedValue`, `classify`, `render_value`.
//! Role: Pure heuristic used by the row renderer; no I/O.
//! Invariants: Only 8-byte values are ever shown as numbers.
//! Invariants: 8-byte values whose sign+exponent bits are all 0 or all 1 are integers.
use std::fmt;

use bstr::BStr;

const NUMERIC_WIDTH: usize = 8;
const SIGN_EXPONENT_SHIFT: u32 = 52;
const SIGN_EXPONENT_ONES: u64 = 0xFFF;

#[derive(Clone, Debug, PartialEq)]
pub enum DecodedValue<'a> {
    Integer(i64),
    Float(f64),
    Text(&'a [u8]),
}

/// Classifies a raw cell value from its bit pattern alone.
///
/// Big-endian 8-byte values are read as a 64-bit word. When the twelve high
/// bits (the IEEE-754 sign and exponent) are all zero the word is a
/// non-negative integer below 2^52, which as a double would be zero or
/// subnormal; when they are all one it is a negative integer no smaller than
/// -2^52, which as a double would be a NaN. Both are shown as integers. Any
/// other 8-byte word is shown as a double.
pub fn classify(bytes: &[u8]) -> DecodedValue<'_> {
    let Ok(word) = <[u8; NUMERIC_WIDTH]>::try_from(bytes) else {
        return DecodedValue::Text(bytes);
    };
    let bits = u64::from_be_bytes(word);
    match bits >> SIGN_EXPONENT_SHIFT {
        0 | SIGN_EXPONENT_ONES => DecodedValue::Integer(bits as i64),
        _ => DecodedValue::Float(f64::from_bits(bits)),
    }
}

impl fmt::Display for DecodedValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::Integer(value) => write!(f, "{value}"),
            DecodedValue::Float(value) if value.is_infinite() => {
                f.write_str(if value.is_sign_positive() { "+Inf" } else { "-Inf" })
            }
            DecodedValue::Float(value) => write!(f, "{value:.6}"),
            DecodedValue::Text(bytes) => write!(f, "{:?}", BStr::new(bytes)),
        }
    }
}

pub fn render_value(bytes: &[u8]) -> String {
    classify(bytes).to_string()
}
