//! # planguard-contracts
//!
//! Shared types for the planguard engine.
//!
//! All crates in the workspace import from here. No evaluation logic lives
//! in this crate, only data definitions and error types.

pub mod document;
pub mod error;
pub mod report;
pub mod rule;
