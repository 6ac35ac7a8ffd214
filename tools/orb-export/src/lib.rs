//! orb-export library
//!
//! Offline conversion pipeline from FBX binary scenes to the Orb
//! container format, plus the reverse analyzer used for debugging.
//! The pipeline is strictly sequential per input file:
//! decode tree -> extract entities -> resolve scene graph -> bake
//! geometry -> encode container.

pub mod analyze;
pub mod convert;
pub mod fbx;
pub mod formats;
pub mod mesh;
pub mod scene;

mod reader;

pub use analyze::{analyze, print_report, read_orb, OrbArchive, OrbError};
pub use convert::{convert_files, convert_into};
pub use mesh::{bake_document, bake_geometry, BakeError, BakeOptions, OrbDocument};
