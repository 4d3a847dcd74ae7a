//! Resolution internals.
//!
//! This module contains the pieces the resolver composes:
//!
//! - `bundled_candidate` / `prefix_candidate`: candidate path construction
//! - `version_token`: banner parsing for the version report

mod banner;
mod candidates;

pub(crate) use banner::version_token;
pub(crate) use candidates::{bundled_candidate, prefix_candidate};
