//! # WN8 Tracker
//!
//! A local World of Tanks WN8 tracker correlating player registries with the
//! Wargaming API.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (account and vehicle ids, battle stats)
//! - **config**: Configuration loading and validation
//! - **expected**: Expected-values reference table, cached on disk
//! - **source**: Statistics data source abstraction and the Wargaming client
//! - **reconcile**: Expected-total accumulation and aggregate correction
//! - **calculate**: WN8 and win-ratio computation
//! - **score**: Batch scoring pipeline
//! - **registry**: Player name to account id registry files

pub mod calculate;
pub mod config;
pub mod expected;
pub mod models;
pub mod reconcile;
pub mod registry;
pub mod score;
pub mod source;

pub use models::*;
