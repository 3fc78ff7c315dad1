//! Socratic Tutor Service Library Crate
//!
//! Runtime configuration, command-line flags, and the interactive terminal loop.
//! The `socratic-tutor` binary is a thin wrapper around this library.

pub mod cli;
pub mod config;
pub mod repl;
