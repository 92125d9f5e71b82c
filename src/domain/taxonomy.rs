//! Two-level catalog taxonomy (genres and their subgroups).
//!
//! The remote store delivers taxonomy rows flat; [`build`] turns them into a forest of
//! top-level nodes with one level of children and derives the [`NameVariantIndex`] that
//! is persisted for synchronous theme lookups.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Flat taxonomy row. The remote store calls the variant flag `is_children`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default, alias = "is_children")]
    pub variant_flag: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub variant_flag: bool,
    #[serde(default)]
    pub children: Vec<TaxonomyNode>,
}

impl TaxonomyNode {
    fn from_record(record: &TaxonomyRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            parent_id: record.parent_id.clone(),
            variant_flag: record.variant_flag,
            children: Vec::new(),
        }
    }
}

/// Flattened `name -> variant flag` lookup derived from a taxonomy forest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameVariantIndex(BTreeMap<String, bool>);

impl NameVariantIndex {
    /// Flattens a forest. Top-level names are indexed before subgroups, so a subgroup
    /// sharing a genre's name never overrides the genre's flag.
    pub fn from_forest(forest: &[TaxonomyNode]) -> Self {
        let mut index = BTreeMap::new();
        for node in forest {
            index.insert(node.name.clone(), node.variant_flag);
        }
        for child in forest.iter().flat_map(|node| node.children.iter()) {
            index
                .entry(child.name.clone())
                .or_insert(child.variant_flag);
        }
        Self(index)
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.0.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, bool)> for NameVariantIndex {
    fn from_iter<I: IntoIterator<Item = (String, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Output of the tree builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltTaxonomy {
    pub tree: Vec<TaxonomyNode>,
    pub index: NameVariantIndex,
}

/// Builds the taxonomy forest and its variant index from flat records.
pub fn build(records: &[TaxonomyRecord]) -> BuiltTaxonomy {
    let tree = build_tree(records);
    let index = NameVariantIndex::from_forest(&tree);
    BuiltTaxonomy { tree, index }
}

/// Builds a depth-two forest ordered by name (ordinal, case-sensitive).
///
/// Rows whose parent is not a top-level row are dropped.
pub fn build_tree(records: &[TaxonomyRecord]) -> Vec<TaxonomyNode> {
    let (roots, nested): (Vec<&TaxonomyRecord>, Vec<&TaxonomyRecord>) = records
        .iter()
        .partition(|record| record.parent_id.is_none());

    let mut forest: Vec<TaxonomyNode> = roots.into_iter().map(TaxonomyNode::from_record).collect();
    let positions: HashMap<String, usize> = forest
        .iter()
        .enumerate()
        .map(|(position, node)| (node.id.clone(), position))
        .collect();

    let mut orphans = 0usize;
    for record in nested {
        let parent = record
            .parent_id
            .as_deref()
            .and_then(|parent_id| positions.get(parent_id));
        match parent {
            Some(&position) => forest[position]
                .children
                .push(TaxonomyNode::from_record(record)),
            None => orphans += 1,
        }
    }

    if orphans > 0 {
        debug!(orphans, "Dropped taxonomy rows without a top-level parent");
    }

    sort_by_name(&mut forest);
    for node in &mut forest {
        sort_by_name(&mut node.children);
    }
    forest
}

fn sort_by_name(nodes: &mut [TaxonomyNode]) {
    nodes.sort_by(|left, right| left.name.cmp(&right.name));
}

/// Finds a node by name, checking genres before subgroups.
pub fn find_node<'a>(forest: &'a [TaxonomyNode], name: &str) -> Option<&'a TaxonomyNode> {
    forest
        .iter()
        .find(|node| node.name == name)
        .or_else(|| {
            forest
                .iter()
                .flat_map(|node| node.children.iter())
                .find(|child| child.name == name)
        })
}

/// Top-level names in tree order.
pub fn genre_names(forest: &[TaxonomyNode]) -> Vec<String> {
    forest.iter().map(|node| node.name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str, parent: Option<&str>, flag: bool) -> TaxonomyRecord {
        TaxonomyRecord {
            id: id.to_string(),
            name: name.to_string(),
            parent_id: parent.map(str::to_string),
            variant_flag: flag,
        }
    }

    fn picture_book_records() -> Vec<TaxonomyRecord> {
        vec![
            record("1", "Fiction", None, false),
            record("2", "Picture Books", None, true),
            record("3", "Early Readers", Some("2"), true),
        ]
    }

    #[test]
    fn builds_two_level_forest_with_index() {
        let built = build(&picture_book_records());

        assert_eq!(built.tree.len(), 2);
        assert_eq!(built.tree[0].name, "Fiction");
        assert!(built.tree[0].children.is_empty());
        assert_eq!(built.tree[1].name, "Picture Books");
        assert_eq!(built.tree[1].children.len(), 1);
        assert_eq!(built.tree[1].children[0].name, "Early Readers");

        let expected: NameVariantIndex = [
            ("Fiction".to_string(), false),
            ("Picture Books".to_string(), true),
            ("Early Readers".to_string(), true),
        ]
        .into_iter()
        .collect();
        assert_eq!(built.index, expected);
    }

    #[test]
    fn building_twice_yields_identical_trees() {
        let records = vec![
            record("9", "Zhvillim Personal", None, false),
            record("4", "Histori", None, false),
            record("5", "Fëmijë", None, true),
            record("6", "Përralla", Some("5"), true),
            record("7", "Aventura", Some("5"), true),
        ];
        assert_eq!(build_tree(&records), build_tree(&records));
    }

    #[test]
    fn orders_names_ordinally() {
        let records = vec![
            record("1", "fantasy", None, false),
            record("2", "Mystery", None, false),
            record("3", "Biography", None, false),
        ];
        let names = genre_names(&build_tree(&records));
        assert_eq!(names, ["Biography", "Mystery", "fantasy"]);
    }

    #[test]
    fn children_are_sorted_by_name() {
        let records = vec![
            record("1", "Kids", None, true),
            record("2", "Poems", Some("1"), true),
            record("3", "Adventure", Some("1"), true),
        ];
        let tree = build_tree(&records);
        let children: Vec<&str> = tree[0].children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(children, ["Adventure", "Poems"]);
    }

    #[test]
    fn orphans_and_grandchildren_are_dropped() {
        let records = vec![
            record("1", "Kids", None, true),
            record("2", "Poems", Some("1"), true),
            record("3", "Haiku", Some("2"), true),
            record("4", "Lost", Some("missing"), false),
        ];
        let built = build(&records);
        assert_eq!(built.tree.len(), 1);
        assert_eq!(built.tree[0].children.len(), 1);
        assert_eq!(built.index.get("Haiku"), None);
        assert_eq!(built.index.get("Lost"), None);
    }

    #[test]
    fn subgroup_flags_are_kept_per_node() {
        let records = vec![
            record("1", "Kids", None, true),
            record("2", "Teen Fiction", Some("1"), false),
        ];
        let built = build(&records);
        assert_eq!(built.index.get("Kids"), Some(true));
        assert_eq!(built.index.get("Teen Fiction"), Some(false));
    }

    #[test]
    fn genre_flag_wins_over_same_named_subgroup() {
        let records = vec![
            record("1", "Comics", None, false),
            record("2", "Kids", None, true),
            record("3", "Comics", Some("2"), true),
        ];
        let built = build(&records);
        assert_eq!(built.index.get("Comics"), Some(false));
        assert_eq!(find_node(&built.tree, "Comics").map(|n| n.id.as_str()), Some("1"));
    }

    #[test]
    fn records_accept_remote_flag_name() {
        let parsed: TaxonomyRecord = serde_json::from_str(
            r#"{"id":"2","name":"Picture Books","parent_id":null,"is_children":true}"#,
        )
        .expect("row parses");
        assert!(parsed.variant_flag);
        assert!(parsed.parent_id.is_none());
    }
}
