//! Regex engine selection.
//!
//! `regex` is used by default; the `lite` feature swaps in `regex-lite`.

#[cfg(feature = "regex")]
pub(crate) use ::regex::Regex;

#[cfg(all(feature = "lite", not(feature = "regex")))]
pub(crate) use ::regex_lite::Regex;
