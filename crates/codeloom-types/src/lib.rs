//! Shared domain types for Codeloom.
//!
//! This crate contains the types exchanged between the chat client, the relay
//! and the LLM providers: project state, chat turns and replies, completion
//! requests, configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde and thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod project;
