//! pdp library: argument parsing, logging setup and stage dispatch for the
//! `pdp` binary.

pub mod app;
pub mod config;
pub mod errors;
pub mod logging;
