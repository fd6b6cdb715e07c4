//! Core trait abstractions for the preview engine.
//!
//! These traits are the seams between the resolver and its collaborators:
//! outbound HTTP, the result cache, and the enrichment tiers.

pub mod cache;
pub mod http;
pub mod tier;
