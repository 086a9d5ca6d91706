//! slotbook command-line interface
//!
//! This crate provides the `slotbook` binary: `schedule` books a meeting in the
//! first free slot, `slots` lists candidates, `config` inspects settings.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod secret;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
