//! Commands behind the `pagecraft` binary
//!
//! Each command takes its clap `Args` plus the working directory the
//! configuration is loaded from.

pub mod commands;
