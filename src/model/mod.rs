//! In-memory skill graph: the tree arena, peer edges and weights.

pub mod build;
pub mod spanning;

use std::collections::{HashMap, HashSet};

use eframe::egui::Vec2;

pub use build::{FocusFilter, GraphModelBuilder};
pub use spanning::spanning_tree;

/// Id of the virtual node inserted above a multi-root forest.
pub const SYNTHETIC_ROOT_ID: &str = "root";

/// Progress along an edge curve per second, per unit of strength.
pub const FLOW_SPEED_PER_STRENGTH: f32 = 0.04;

#[derive(Clone, Debug, PartialEq)]
pub struct SkillNode {
    pub id: String,
    pub display_name: String,
    pub children: Vec<usize>,
    pub parent: Option<usize>,
    pub position: Vec2,
    pub weight: u32,
    pub synthetic: bool,
}

/// Arena of nodes keyed by id; children are index lists, parents are plain
/// indices, so the structure carries no reference cycles.
#[derive(Clone, Debug, Default)]
pub struct SkillTree {
    nodes: Vec<SkillNode>,
    index_by_id: HashMap<String, usize>,
    root: Option<usize>,
}

impl SkillTree {
    pub fn singleton(id: &str, display_name: &str, weight: u32) -> Self {
        let mut tree = Self::default();
        let index = tree.insert(id, display_name, weight);
        tree.root = Some(index);
        tree
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<usize> {
        self.root
    }

    pub fn root_node(&self) -> Option<&SkillNode> {
        self.root.and_then(|index| self.nodes.get(index))
    }

    pub fn nodes(&self) -> &[SkillNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&SkillNode> {
        self.nodes.get(index)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&SkillNode> {
        self.index_of(id).and_then(|index| self.nodes.get(index))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_by_id.contains_key(id)
    }

    pub fn parent_link_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.parent.is_some()).count()
    }

    /// Indices in pre-order starting at the root, children left to right.
    pub fn preorder(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let Some(root) = self.root else {
            return order;
        };

        let mut stack = vec![root];
        while let Some(index) = stack.pop() {
            order.push(index);
            stack.extend(self.nodes[index].children.iter().rev().copied());
        }
        order
    }

    /// Hop distance from the root for every node; unreachable nodes get
    /// `usize::MAX`.
    pub fn depths(&self) -> Vec<usize> {
        let mut depths = vec![usize::MAX; self.nodes.len()];
        for index in self.preorder() {
            depths[index] = match self.nodes[index].parent {
                Some(parent) if depths[parent] != usize::MAX => depths[parent] + 1,
                _ => 0,
            };
        }
        depths
    }

    pub(crate) fn insert(&mut self, id: &str, display_name: &str, weight: u32) -> usize {
        if let Some(&index) = self.index_by_id.get(id) {
            return index;
        }

        let index = self.nodes.len();
        self.nodes.push(SkillNode {
            id: id.to_owned(),
            display_name: display_name.to_owned(),
            children: Vec::new(),
            parent: None,
            position: Vec2::ZERO,
            weight,
            synthetic: false,
        });
        self.index_by_id.insert(id.to_owned(), index);
        index
    }

    pub(crate) fn set_root(&mut self, index: usize) {
        self.root = Some(index);
    }

    pub(crate) fn node_mut(&mut self, index: usize) -> &mut SkillNode {
        &mut self.nodes[index]
    }

    pub(crate) fn set_position(&mut self, index: usize, position: Vec2) {
        self.nodes[index].position = position;
    }

    pub(crate) fn is_ancestor(&self, candidate: usize, of: usize) -> bool {
        let mut cursor = Some(of);
        while let Some(index) = cursor {
            if index == candidate {
                return true;
            }
            cursor = self.nodes[index].parent;
        }
        false
    }

    /// Moves `child` under `parent`. Refuses links that would close a cycle.
    pub(crate) fn attach(&mut self, parent: usize, child: usize) -> bool {
        if parent == child || self.is_ancestor(child, parent) {
            return false;
        }

        if let Some(previous) = self.nodes[child].parent {
            self.nodes[previous].children.retain(|&index| index != child);
        }
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        true
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub kind: String,
    pub strength: f32,
}

impl Edge {
    pub fn flow_speed(&self) -> f32 {
        self.strength * FLOW_SPEED_PER_STRENGTH
    }

    pub fn touches(&self, id: &str) -> bool {
        self.from == id || self.to == id
    }
}

/// Reference counts per node id, with the maximum tracked on insert.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeightMap {
    counts: HashMap<String, u32>,
    max_weight: u32,
}

impl WeightMap {
    pub fn increment(&mut self, id: &str) {
        let count = self.counts.entry(id.to_owned()).or_insert(0);
        *count += 1;
        self.max_weight = self.max_weight.max(*count);
    }

    pub fn get(&self, id: &str) -> u32 {
        self.counts.get(id).copied().unwrap_or(0)
    }

    pub fn max_weight(&self) -> u32 {
        self.max_weight
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(id, count)| (id.as_str(), *count))
    }

    /// Ids with a non-zero count; used as the relevance set when a focus
    /// filter scopes the view.
    pub fn relevant_ids(&self) -> HashSet<String> {
        self.counts
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(id, _)| id.clone())
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CatalogEntry {
    pub id: String,
    pub display_name: String,
    /// Referenced by a containment relation but never declared.
    pub placeholder: bool,
}

/// Every node id known to the document, in first-seen order.
#[derive(Clone, Debug, Default)]
pub struct NodeCatalog {
    entries: Vec<CatalogEntry>,
    index_by_id: HashMap<String, usize>,
}

impl NodeCatalog {
    pub(crate) fn declare(&mut self, id: &str, display_name: Option<&str>) {
        match self.index_by_id.get(id) {
            Some(&index) => {
                let entry = &mut self.entries[index];
                entry.placeholder = false;
                if let Some(name) = display_name {
                    entry.display_name = name.to_owned();
                }
            }
            None => self.push(id, display_name.unwrap_or(id), false),
        }
    }

    pub(crate) fn reference(&mut self, id: &str) {
        if !self.index_by_id.contains_key(id) {
            self.push(id, id, true);
        }
    }

    fn push(&mut self, id: &str, display_name: &str, placeholder: bool) {
        self.index_by_id.insert(id.to_owned(), self.entries.len());
        self.entries.push(CatalogEntry {
            id: id.to_owned(),
            display_name: display_name.to_owned(),
            placeholder,
        });
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_by_id.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.index_by_id.get(id).map(|&index| &self.entries[index])
    }

    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map_or(id, |entry| entry.display_name.as_str())
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Output of one build: rebuilt wholesale on every parse.
#[derive(Clone, Debug, Default)]
pub struct GraphModel {
    pub tree: SkillTree,
    pub catalog: NodeCatalog,
    pub edges: Vec<Edge>,
    pub weights: WeightMap,
}

impl GraphModel {
    pub fn connection_count(&self, id: &str) -> usize {
        self.edges.iter().filter(|edge| edge.touches(id)).count()
    }
}
