//! CLI module for the bgrefine library
//!
//! This module is only available when the "cli" feature is enabled.

mod config;
#[path = "main.rs"]
mod main_impl;
pub mod script;

pub use main_impl::{main, Cli};
pub use script::{ScriptOutcome, ScriptStep, StrokeScript};
