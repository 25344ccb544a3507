//! Section content → Markdown conversion.
//!
//! The design separates pure text generation from I/O:
//!
//! - [`fence`]: code fence sizing, inline code spans, fence tracking for
//!   line-oriented passes
//! - [`slugify`]: slug generation and file name allocation
//! - [`render`]: DOM → Markdown rendering of one section
//! - [`normalize`]: blank-line and trailing-whitespace normalization
//!
//! The assembler ([`crate::assemble`]) handles writing files.
//!
//! ## Design Notes
//!
//! - **No text escaping**: reference prose is full of identifiers such as
//!   `comptime_int` and `*T`; they are emitted verbatim.
//! - **Dynamic code fence length**: code blocks use the minimum backtick
//!   fence that does not conflict with their content.
//! - **Internal links stay in-page**: rendering keeps `#Id` targets; the
//!   link resolver rewrites them once every section has a file name.

mod fence;
mod normalize;
mod render;
mod slugify;

pub use fence::{
    FenceState, calculate_fence_length, calculate_inline_code_ticks, escape_table_cell,
    inline_code,
};
pub use normalize::normalize;
pub use render::{RenderContext, RenderResult, render_section};
pub use slugify::{EMPTY_SLUG, FilenameAllocator, slugify};
