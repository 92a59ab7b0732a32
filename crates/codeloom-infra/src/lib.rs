//! Infrastructure layer for Codeloom.
//!
//! Contains implementations of the traits defined in `codeloom-core`:
//! SQLite storage for project state and API keys, LLM providers over HTTP
//! (Gemini, Anthropic), the `config.toml` loader, and filesystem helpers for
//! the data directory and project export.

pub mod config;
pub mod filesystem;
pub mod llm;
pub mod sqlite;
