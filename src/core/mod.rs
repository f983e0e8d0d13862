//! Core module for exposure_tree
//!
//! This module provides the record model, the tag-tree builder and the flat
//! presenter. It follows a modular architecture for testability.
//!
//! # Architecture
//!
//! - `models`: Core data structures (ExposureRecord, Config)
//! - `error`: Error types using thiserror
//! - `label` / `node`: Structured labels and the immutable label tree
//! - `builder`: Groups records into the three-level tree
//! - `extractor`: MetadataExtractor trait + FITS header implementation
//! - `walker`: File discovery by glob pattern
//! - `presenter`: Flat text rendering and depth glyphs

pub mod builder;
pub mod error;
pub mod extractor;
pub mod label;
pub mod models;
pub mod node;
pub mod presenter;
pub mod walker;

// Re-export commonly used types
pub use builder::{build_tree, TreeBuilder};
pub use error::{ExtractionError, Result, ResultExt, TreeError};
pub use extractor::{extract_records, HeaderExtractor, MetadataExtractor};
pub use label::{Label, Span};
pub use models::{
    Config, ExposureMetadata, ExposureRecord, HeaderKeywords, CONFIG_FILE_NAME,
    DEFAULT_PRIORITY_TAGS,
};
pub use node::Node;
pub use presenter::{FlatRenderer, GlyphFormatter, Theme};
pub use walker::discover_files;
