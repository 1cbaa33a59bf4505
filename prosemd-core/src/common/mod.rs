//! Format-agnostic tree construction shared by the parsers.

pub mod flat_to_nested;
