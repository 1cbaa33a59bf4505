//! Library half of the prosemd CLI, shared by the binary and its tests.

pub mod transforms;
