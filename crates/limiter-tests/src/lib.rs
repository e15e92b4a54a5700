//! Limiter Integration Tests
//!
//! Shared fixtures for exercising the worker pool without spawning real
//! processes, plus the cross-crate tests under `tests/`.
//! Run with: `cargo test -p limiter-tests`

pub mod common;
