//! Shared definitions for the Orb scene-asset container format.
//!
//! The converter (`orb-export`) writes these structures and the engine
//! loads them; both sides depend on this crate so the byte layout is
//! defined exactly once.

pub mod formats;

pub use formats::*;
