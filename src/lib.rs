// src/lib.rs
pub mod arbiter;
pub mod config;
pub mod export;
pub mod ingest;
pub mod matching;
pub mod models;
pub mod normalize;
pub mod utils;
