//! Command Line Interface (CLI) layer for s2dos.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`) for the `unzip`, `export`,
//! `correct` and `indices` subcommands. It wires user-provided options to
//! the library functionality exposed via `s2dos::api`.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
