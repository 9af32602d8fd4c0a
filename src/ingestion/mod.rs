//! Draft question ingestion.
//!
//! This module provides:
//! - JSON extraction from free model text
//! - Replaceable keyword policy for domain inference
//! - Bounded, deduplicated ingestion of generated drafts
//! - The official question bank and local mock fallback
//! - A gate that discards results of superseded generations

mod bank;
mod domain;
mod draft;
mod extract;
mod fallback;
mod gate;

pub use bank::*;
pub use domain::*;
pub use draft::*;
pub use extract::*;
pub use fallback::*;
pub use gate::*;
