//! Business logic and trait definitions for Codeloom.
//!
//! This crate defines the "ports" (repository and LLM provider traits) that
//! the infrastructure layer implements, plus the chat relay, project state
//! service and client workspace session built on them. It depends only on
//! `codeloom-types` -- never on `codeloom-infra` or any database/IO crate.

pub mod chat;
pub mod llm;
pub mod project;

#[cfg(test)]
pub(crate) mod testing;
