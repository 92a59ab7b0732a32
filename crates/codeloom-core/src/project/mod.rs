//! Project state persistence and merge orchestration.
//!
//! This module defines the `ProjectRepository` trait that the infrastructure
//! layer implements, and the `ProjectService` that performs the
//! read-modify-write cycle on top of it.

pub mod repository;
pub mod service;
