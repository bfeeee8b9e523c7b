//! Cross-module tests and shared test doubles.

mod pipeline;
pub(crate) mod support;
