//! Core engine: the fetch → rank → select pipeline.

pub mod pacer;
pub mod fetcher;
pub mod metrics;
pub mod selector;
pub mod enricher;
pub mod runner;
