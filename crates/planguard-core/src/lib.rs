//! # planguard-core
//!
//! The evaluation runtime for planguard rules.
//!
//! This crate provides:
//! - The three seams (`PlanLoader`, `ResourceMatcher`, `ConditionEvaluator`)
//! - `Scope`, the shared path resolution for conditions and messages
//! - Message template rendering
//! - The `Reporter` that runs rules against resources and aggregates results
//!
//! ## Usage
//!
//! ```rust,ignore
//! use planguard_core::{Reporter, traits::{PlanLoader, ResourceMatcher, ConditionEvaluator}};
//! ```

pub mod reporter;
pub mod scope;
pub mod template;
pub mod traits;

pub use reporter::Reporter;
pub use scope::{Bindings, Scope};
