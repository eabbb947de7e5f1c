//! DIPWATCH: S&P 500 drawdown-from-peak screener
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod universe;
pub mod market;
pub mod llm;
pub mod engine;
pub mod report;
pub mod storage;
