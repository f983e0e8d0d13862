//! Tag-tree builder
//!
//! Groups exposure records into a three-level tree:
//!
//! - root: tags shared by every record
//! - level 1: one node per observation identity, labelled with the tags the
//!   identity's records share beyond the root's
//! - level 2: consecutive runs of records with the same residual tags and
//!   exposure time, collapsed into one summary node
//!
//! Records sharing an identity are regrouped in order of first appearance,
//! so callers need not keep them contiguous.

use crate::core::error::{Result, TreeError};
use crate::core::label::Label;
use crate::core::models::{ExposureRecord, DEFAULT_PRIORITY_TAGS};
use crate::core::node::Node;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

type TagSet = BTreeSet<String>;

/// Builds label trees from exposure records
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    priority_tags: TagSet,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    /// Create a builder emphasizing the default exposure-purpose tags
    pub fn new() -> Self {
        Self::with_priority_tags(DEFAULT_PRIORITY_TAGS)
    }

    /// Create a builder with a custom emphasis vocabulary
    pub fn with_priority_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            priority_tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Build the tree for `records`
    ///
    /// Fails with [`TreeError::EmptyInput`] when there is nothing to group.
    pub fn build(&self, records: &[ExposureRecord]) -> Result<Node> {
        let root_common = intersect_all(records.iter().map(|r| &r.tags))
            .ok_or(TreeError::EmptyInput)?;

        let children: Vec<Node> = group_by_identity(records)
            .into_iter()
            .map(|(identity, members)| self.identity_node(identity, &members, &root_common))
            .collect();

        debug!(
            records = records.len(),
            groups = children.len(),
            "built exposure tree"
        );

        Ok(Node::with_children(
            Label::new().plain(join_tags(&root_common)),
            children,
        ))
    }

    fn identity_node(
        &self,
        identity: &str,
        members: &[&ExposureRecord],
        root_common: &TagSet,
    ) -> Node {
        let group_tags: Vec<TagSet> = members
            .iter()
            .map(|r| r.tags.difference(root_common).cloned().collect())
            .collect();
        let group_common = intersect_all(group_tags.iter()).unwrap_or_default();

        let (priority, normal): (TagSet, TagSet) = group_common
            .iter()
            .cloned()
            .partition(|t| self.priority_tags.contains(t));

        let mut label = Label::new().emphasized(join_tags(&priority));
        if !priority.is_empty() && !normal.is_empty() {
            label = label.plain(" ");
        }
        label = label.plain(join_tags(&normal));
        label = if label.is_empty() {
            label.plain(identity)
        } else {
            label.plain(format!(" : {}", identity))
        };

        let signatures: Vec<(TagSet, &str)> = members
            .iter()
            .zip(&group_tags)
            .map(|(record, tags)| {
                let residual = tags.difference(&group_common).cloned().collect();
                (residual, record.exposure_time.as_str())
            })
            .collect();

        let mut children = Vec::new();
        let mut start = 0;
        while start < members.len() {
            let mut end = start + 1;
            while end < members.len() && signatures[end] == signatures[start] {
                end += 1;
            }
            let (residual, exposure_time) = &signatures[start];
            children.push(run_node(residual, exposure_time, &members[start..end]));
            start = end;
        }

        debug!(identity, runs = children.len(), "grouped identity");
        Node::with_children(label, children)
    }
}

/// Build a tree with the default emphasis vocabulary
pub fn build_tree(records: &[ExposureRecord]) -> Result<Node> {
    TreeBuilder::new().build(records)
}

fn run_node(residual: &TagSet, exposure_time: &str, run: &[&ExposureRecord]) -> Node {
    let mut signature = join_tags(residual);
    if !signature.is_empty() {
        signature.push(' ');
    }
    signature.push_str(exposure_time);

    match run {
        [single] => Node::leaf(
            Label::new()
                .emphasized(format!("{} x 1", signature))
                .plain(format!(" : {}", single.filename)),
        ),
        [first, .., last] => Node::with_children(
            Label::new()
                .emphasized(format!("{} x {}", signature, run.len()))
                .plain(format!(" : {} .. {}", first.filename, last.filename)),
            run.iter().map(|r| Node::leaf(r.filename.as_str())).collect(),
        ),
        [] => unreachable!("runs always hold at least one record"),
    }
}

/// Intersection of every set; `None` for an empty sequence
fn intersect_all<'a, I>(sets: I) -> Option<TagSet>
where
    I: IntoIterator<Item = &'a TagSet>,
{
    let mut iter = sets.into_iter();
    let mut common = iter.next()?.clone();
    for set in iter {
        common.retain(|t| set.contains(t));
    }
    Some(common)
}

/// Regroup records by identity, groups in order of first appearance and
/// members sorted by filename
fn group_by_identity(records: &[ExposureRecord]) -> Vec<(&str, Vec<&ExposureRecord>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&ExposureRecord>)> = Vec::new();
    for record in records {
        let slot = *index.entry(record.identity.as_str()).or_insert_with(|| {
            groups.push((record.identity.as_str(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(record);
    }
    for (_, members) in &mut groups {
        members.sort_by(|a, b| a.filename.cmp(&b.filename));
    }
    groups
}

fn join_tags(tags: &TagSet) -> String {
    let names: Vec<&str> = tags.iter().map(String::as_str).collect();
    names.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(filename: &str, identity: &str, tags: &[&str], exptime: &str) -> ExposureRecord {
        ExposureRecord::new(filename, identity, tags.iter().copied(), exptime)
    }

    fn words(text: &str) -> BTreeSet<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    const FLATS: &str = "OBS-1 - Flat";
    const HD: &str = "OBS-2 - HD 1234";

    fn night() -> Vec<ExposureRecord> {
        const ON: &[&str] = &["IGRINS", "RAW", "FLAT", "LAMPON"];
        const OFF: &[&str] = &["IGRINS", "RAW", "FLAT", "LAMPOFF"];
        const SCI_A: &[&str] = &["IGRINS", "RAW", "SCIENCE", "ON"];
        const SCI_B: &[&str] = &["IGRINS", "RAW", "SCIENCE", "OFF"];
        vec![
            record("N0001.fits", FLATS, ON, "30.0s"),
            record("N0002.fits", FLATS, ON, "30.0s"),
            record("N0003.fits", FLATS, ON, "30.0s"),
            record("N0004.fits", FLATS, OFF, "30.0s"),
            record("N0005.fits", HD, SCI_A, "300.0s"),
            record("N0006.fits", HD, SCI_B, "300.0s"),
        ]
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let err = build_tree(&[]).unwrap_err();
        assert!(matches!(err, TreeError::EmptyInput));
    }

    #[test]
    fn test_root_label_is_intersection_of_all_tags() {
        let tree = build_tree(&night()).unwrap();
        assert_eq!(words(&tree.label.plain_text()), words("IGRINS RAW"));
    }

    #[test]
    fn test_one_child_per_identity() {
        let tree = build_tree(&night()).unwrap();
        assert_eq!(tree.children.len(), 2);
        assert!(tree.children[0]
            .label
            .plain_text()
            .ends_with(" : OBS-1 - Flat"));
        assert!(tree.children[1]
            .label
            .plain_text()
            .ends_with(" : OBS-2 - HD 1234"));
    }

    #[test]
    fn test_group_label_emphasizes_priority_tags() {
        let tree = build_tree(&night()).unwrap();
        let spans = tree.children[0].label.spans();
        assert!(spans[0].emphasized);
        assert_eq!(spans[0].text, "FLAT");
        // Root tags are not repeated in the group label
        assert!(!tree.children[0].label.plain_text().contains("IGRINS"));
    }

    #[test]
    fn test_collapsed_run_has_count_range_and_leaves() {
        let tree = build_tree(&night()).unwrap();
        let flats = &tree.children[0];
        assert_eq!(flats.children.len(), 2);

        let run = &flats.children[0];
        let text = run.label.plain_text();
        assert!(text.contains("x 3"));
        assert!(text.contains("LAMPON"));
        assert!(text.contains("30.0s"));
        assert!(text.ends_with(" : N0001.fits .. N0003.fits"));
        assert!(run.label.spans()[0].emphasized);
        let leaves: Vec<String> = run.children.iter().map(|c| c.label.plain_text()).collect();
        assert_eq!(leaves, vec!["N0001.fits", "N0002.fits", "N0003.fits"]);
        assert!(run.children.iter().all(Node::is_leaf));
    }

    #[test]
    fn test_singleton_run_is_childless() {
        let tree = build_tree(&night()).unwrap();
        let single = &tree.children[0].children[1];
        assert!(single.is_leaf());
        let text = single.label.plain_text();
        assert!(text.contains("LAMPOFF"));
        assert!(text.contains("x 1"));
        assert!(text.ends_with(" : N0004.fits"));
    }

    #[test]
    fn test_residual_tags_drop_group_common() {
        let tree = build_tree(&night()).unwrap();
        let science = &tree.children[1];
        assert_eq!(science.children.len(), 2);
        for run in &science.children {
            let text = run.label.plain_text();
            assert!(!text.contains("SCIENCE"));
            assert!(text.contains("300.0s x 1"));
        }
    }

    #[test]
    fn test_exposure_time_splits_runs() {
        let records = vec![
            record("a.fits", "OBS - Sky", &["SKY"], "10.0s"),
            record("b.fits", "OBS - Sky", &["SKY"], "10.0s"),
            record("c.fits", "OBS - Sky", &["SKY"], "20.0s"),
        ];
        let tree = build_tree(&records).unwrap();
        let group = &tree.children[0];
        assert_eq!(group.children.len(), 2);
        assert_eq!(group.children[0].children.len(), 2);
        assert!(group.children[1].is_leaf());
    }

    #[test]
    fn test_non_contiguous_identity_is_regrouped() {
        let records = vec![
            record("a.fits", "OBS-1 - A", &["FLAT"], "1.0s"),
            record("b.fits", "OBS-2 - B", &["SKY"], "1.0s"),
            record("c.fits", "OBS-1 - A", &["FLAT"], "1.0s"),
        ];
        let tree = build_tree(&records).unwrap();
        assert_eq!(tree.children.len(), 2);
        let run = &tree.children[0].children[0];
        assert!(run.label.plain_text().contains("x 2"));
        assert!(run.label.plain_text().ends_with("a.fits .. c.fits"));
    }

    #[test]
    fn test_group_members_sorted_by_filename() {
        let records = vec![
            record("b.fits", "OBS - A", &["FLAT"], "1.0s"),
            record("a.fits", "OBS - A", &["FLAT"], "1.0s"),
        ];
        let tree = build_tree(&records).unwrap();
        let run = &tree.children[0].children[0];
        assert_eq!(run.children[0].label.plain_text(), "a.fits");
    }

    #[test]
    fn test_group_without_common_tags_uses_identity() {
        let records = vec![
            record("a.fits", "OBS - A", &["X"], "1.0s"),
            record("b.fits", "OBS - A", &["Y"], "1.0s"),
        ];
        let tree = build_tree(&records).unwrap();
        assert_eq!(tree.children[0].label.plain_text(), "OBS - A");
        assert_eq!(tree.label.plain_text(), "");
    }

    #[test]
    fn test_custom_priority_tags() {
        let builder = TreeBuilder::with_priority_tags(["ARC"]);
        let records = vec![record("a.fits", "OBS - A", &["ARC", "LAMP"], "1.0s")];
        let tree = builder.build(&records).unwrap();
        // A lone record puts every tag in the root
        assert!(tree.children[0].label.spans().iter().all(|s| !s.emphasized));

        let records = vec![
            record("a.fits", "OBS - A", &["ARC", "LAMP"], "1.0s"),
            record("b.fits", "OBS - B", &["LAMP"], "1.0s"),
        ];
        let tree = builder.build(&records).unwrap();
        let spans = tree.children[0].label.spans();
        assert!(spans[0].emphasized);
        assert_eq!(spans[0].text, "ARC");
    }

    #[test]
    fn test_build_is_idempotent() {
        let records = night();
        assert_eq!(build_tree(&records).unwrap(), build_tree(&records).unwrap());
    }
}
