//! Stripcut Render Engine
//!
//! Splices compiled strips into an existing Cinelerra timeline document.
//!
//! # Pipeline Architecture
//!
//! ```text
//! strips.json ──► placement ──► channels ─┬─► edit blocks ───┐
//!                                         └─► keyframes ─────┤
//!                                                            ▼
//! template.xml ──────────► line scanner (track kind + id) ──► injected document
//! ```
//!
//! The template is streamed once. Generated fragments are inserted just
//! before the `</EDITS>` and `</FADEAUTOS>` markers of each track whose
//! title names a compiled channel; every other line passes through as is.

pub mod compile;
pub mod fragment;
pub mod injector;

pub use compile::*;
pub use fragment::{CinelerraFormat, FragmentFormat};
pub use injector::{InjectionStats, Marker, TimelineInjector};
