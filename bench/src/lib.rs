//! Benchmark utilities for the strata data store.
//!
//! This crate provides the shared pieces the criterion benches build on:
//!
//! - **Records**: chunk-storage record types shaped like real render data
//! - **Scenarios**: world builders producing populated managers and stores
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench -p strata_bench
//!
//! # Run a specific benchmark group
//! cargo bench -p strata_bench -- query
//! ```
//!
//! Results are written to `target/criterion/` with HTML reports.

pub mod records;
pub mod scenarios;
