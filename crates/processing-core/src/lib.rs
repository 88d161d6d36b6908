//! Stripcut Processing Core: the timeline compiler
//!
//! Turns a strip description into per-channel edit and automation data:
//! - **Placement:** Walk the strip tree, resolving channels, fades, and
//!   absolute frame positions into channel buffers
//! - **Keyframes:** Synthesize sparse volume automation from fades, mutes,
//!   and explicit overrides
//! - **Edits:** Turn a channel's strips into content and filler blocks,
//!   closing temporal gaps
//!
//! This crate is pure computation with no I/O. All inputs are data; all
//! outputs are data.

pub mod edits;
pub mod keyframes;
pub mod placement;

pub use edits::{EditBlock, EditEmitter};
pub use keyframes::{KeyframeSynthesizer, Keyframes};
pub use placement::{Compilation, PlacementEngine};
