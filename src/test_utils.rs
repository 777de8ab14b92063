//! Shared proptest strategies for unit tests.

use proptest::prelude::*;

/// Strings with at least one character that is not a digit or sign.
pub(crate) fn arb_non_integer() -> impl Strategy<Value = String> {
    prop::string::string_regex("[0-9]{0,4}[a-zA-Z .][0-9a-z]{0,4}").expect("valid regex")
}

/// Query-style keys.
pub(crate) fn arb_key() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z_]{0,10}").expect("valid regex")
}

/// Printable ASCII text up to `max_len` characters.
pub(crate) fn arb_text(max_len: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(0x20u8..0x7f, 0..=max_len)
        .prop_map(|bytes| bytes.into_iter().map(char::from).collect())
}
