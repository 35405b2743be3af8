//! SAR-driven auto-trading signal core.
//!
//! Computes streaming technical indicators from OHLC candles, validates a
//! user-configurable multi-condition strategy against them (together with an
//! upstream AI directional signal), and drives a gated auto-trading loop.
//! Transport, storage and UI concerns live in the host process; this crate
//! only consumes the narrow service traits in [`services`].

pub mod candles;
pub mod config;
pub mod indicators;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod signals;
pub mod strategies;
pub mod trading;
