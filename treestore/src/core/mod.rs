//! Deterministic, pure logic shared by the store.
//!
//! Core modules must be free of reactivity and I/O. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod namespace;
pub mod path;
pub mod types;
