//! # planguard-plan
//!
//! Plan input for planguard.
//!
//! This crate provides [`loader::JsonPlanLoader`], which implements the
//! [`PlanLoader`](planguard_core::traits::PlanLoader) trait, and
//! [`matcher::PlannedResourceMatcher`], which implements
//! [`ResourceMatcher`](planguard_core::traits::ResourceMatcher).
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use planguard_plan::{JsonPlanLoader, PlannedResourceMatcher};
//!
//! let document = JsonPlanLoader::new().load_file(Path::new("tfplan.json"))?;
//! for bucket in PlannedResourceMatcher.matching(&document, "aws_s3_bucket_policy") {
//!     println!("{}", bucket.identity);
//! }
//! ```

pub mod loader;
pub mod matcher;

pub use loader::{JsonPlanLoader, LoaderOptions, DEFAULT_MAX_EMBEDDED_DEPTH};
pub use matcher::{PlannedResourceMatcher, ROOT_MODULE_PATH};
