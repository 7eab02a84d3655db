//! Constant-time secret comparison.
//!
//! Used wherever a request-supplied secret is checked against a stored one
//! (admin bootstrap token, scheduled-job invocation tokens). Timing must not
//! depend on where the first differing byte sits.

use subtle::ConstantTimeEq;

/// Compare two strings in time independent of their contents.
///
/// A length mismatch returns `false` before any byte comparison, taken
/// unconditionally regardless of content; equal-length inputs are compared
/// with an XOR accumulator over every position (`subtle::ConstantTimeEq`).
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    bool::from(a.as_bytes().ct_eq(b.as_bytes()))
}
