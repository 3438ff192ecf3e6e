//! # IronIDL Bench
//!
//! Benchmark workloads for IronIDL performance testing.

pub mod workload;
