//! exposure_tree - Summarize a night of exposures as a tag tree
//!
//! Takes the per-file tag sets of a directory of astronomical exposures and
//! factors them into a three-level tree: tags shared by everything at the
//! root, one node per observation identity, and collapsed runs of identical
//! configurations below that.
//!
//! # Architecture
//!
//! This crate follows the "Library-First" pattern:
//! - **lib.rs** (this file): the embeddable entry point
//! - **core**: records, builder, extraction, discovery, flat rendering
//! - **tui**: the interactive collapsible view with search
//! - **bin/exptree.rs**: thin CLI wrapper
//!
//! Errors are never handled here; the caller decides how to react.

pub mod core;
pub mod tui;

pub use crate::core::{
    build_tree, discover_files, extract_records, Config, ExposureRecord, FlatRenderer,
    HeaderExtractor, Label, MetadataExtractor, Node, Result, Theme, TreeBuilder, TreeError,
    DEFAULT_PRIORITY_TAGS,
};
pub use crate::tui::TreeSession;

use std::io::{self, Write};
use std::path::PathBuf;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Options for [`get_exposure_tree`]
#[derive(Debug, Clone)]
pub struct TreeOptions {
    /// Sort paths by file name before extraction
    pub sort: bool,
    /// Print the flat rendering instead of returning a session
    pub simple: bool,
    /// Flat-mode depth limit (`None` = unbounded)
    pub depth: Option<usize>,
    pub theme: Theme,
    /// Tags emphasized in group labels
    pub priority_tags: Vec<String>,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            sort: true,
            simple: false,
            depth: Some(2),
            theme: Theme::default(),
            priority_tags: DEFAULT_PRIORITY_TAGS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl TreeOptions {
    pub fn simple() -> Self {
        Self {
            simple: true,
            ..Self::default()
        }
    }
}

/// Extract every path and build its label tree
pub fn summarize<E>(paths: &[PathBuf], extractor: &E, options: &TreeOptions) -> Result<Node>
where
    E: MetadataExtractor + ?Sized,
{
    let mut paths = paths.to_vec();
    if options.sort {
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()).then_with(|| a.cmp(b)));
    }
    let records = extract_records(&paths, extractor)?;
    TreeBuilder::with_priority_tags(options.priority_tags.iter().cloned()).build(&records)
}

/// Build the tree for `paths`, printing it in simple mode
///
/// In simple mode the flat rendering goes to stdout and `None` is returned;
/// otherwise the returned session can be driven by [`tui::run`] or embedded
/// in another interactive front end.
pub fn get_exposure_tree<E>(
    paths: &[PathBuf],
    extractor: &E,
    options: &TreeOptions,
) -> Result<Option<TreeSession>>
where
    E: MetadataExtractor + ?Sized,
{
    let stdout = io::stdout();
    get_exposure_tree_to(paths, extractor, options, &mut stdout.lock())
}

/// [`get_exposure_tree`] writing simple-mode output to `out`
pub fn get_exposure_tree_to<E, W>(
    paths: &[PathBuf],
    extractor: &E,
    options: &TreeOptions,
    out: &mut W,
) -> Result<Option<TreeSession>>
where
    E: MetadataExtractor + ?Sized,
    W: Write,
{
    let root = summarize(paths, extractor, options)?;
    if options.simple {
        FlatRenderer::new(options.theme)
            .with_max_level(options.depth)
            .write_to(&root, out)?;
        return Ok(None);
    }
    Ok(Some(TreeSession::from_tree(&root, options.theme)))
}
