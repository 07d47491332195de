//! gh-comment - manage GitHub pull request comments through one surface
//!
//! Callers pass a comment id; whether it belongs to the issue-comment or
//! review-comment API is worked out here, and failures come back with
//! guidance on what to try next.

pub mod config;
pub mod filter;
pub mod github;
pub mod ops;
pub mod suggest;
pub mod validate;
