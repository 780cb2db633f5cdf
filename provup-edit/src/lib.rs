//! Edit engine for provider requirement blocks.
//!
//! Responsibilities:
//! - Locate `terraform { required_providers { ... } }` blocks in a parsed document.
//! - Consolidate resolved requirement facts into one block using `hcl-edit`, leaving
//!   everything else in the document untouched.
//! - Strip requirement blocks from files that are no longer the target.
//! - Generate a unified diff preview.

mod error;
mod locate;
mod patch;
mod render;
mod rewrite;

pub use error::{EditError, EditResult};
pub use locate::{BlockPath, REQUIREMENTS_BLOCK, WRAPPER_BLOCK, first_wrapper, locate_blocks};
pub use patch::render_patch;
pub use render::{entry_attribute, no_source_comment, render_entry};
pub use rewrite::{rewrite_requirements, strip_requirements};
