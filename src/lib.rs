//! Pay4me recharge gateway.
//!
//! Verified card/bank payments are turned into airtime and data top-ups by
//! walking an ordered list of third-party recharge providers, falling back to
//! a manually-processed transaction when none of them can deliver.

pub mod api;
#[cfg(feature = "cache")]
pub mod cache;
pub mod config;
#[cfg(feature = "database")]
pub mod database;
pub mod error;
pub mod health;
pub mod logging;
pub mod middleware;
pub mod payments;
pub mod recharge;
pub mod services;
