//! Stripcut Project Model
//!
//! Defines the core data contracts for strip compilation:
//! - **Declarations:** The strip description file as written by the user
//!   (a tree of clips plus a trailing record of global tables)
//! - **Strip records:** One placed instance per declared clip, with
//!   absolute frame positions and resolved fades
//! - **Channels:** Append-ordered per-track buffers of strip records
//!
//! All timing values are integer video frames. Conversion into the
//! target's audio sample clock happens at emission time.

pub mod channel;
pub mod declaration;
pub mod strip;

pub use channel::*;
pub use declaration::*;
pub use strip::*;
