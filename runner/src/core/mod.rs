//! Pure logic shared by the runner.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! values and return deterministic outputs suitable for tests.

pub mod path;
pub mod tail;
pub mod types;
