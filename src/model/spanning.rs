use std::collections::{HashMap, HashSet, VecDeque};

use log::debug;

use super::{Edge, NodeCatalog, SkillTree, WeightMap};

/// Undirected neighbour lists that remember insertion order, so BFS child
/// order is reproducible.
#[derive(Default)]
struct Adjacency<'a> {
    neighbors: HashMap<&'a str, Vec<&'a str>>,
    seen: HashSet<(&'a str, &'a str)>,
}

impl<'a> Adjacency<'a> {
    fn link(&mut self, a: &'a str, b: &'a str) {
        let key = if a <= b { (a, b) } else { (b, a) };
        if a == b || !self.seen.insert(key) {
            return;
        }
        self.neighbors.entry(a).or_default().push(b);
        self.neighbors.entry(b).or_default().push(a);
    }

    fn of(&self, id: &str) -> &[&'a str] {
        self.neighbors.get(id).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Reduces the peer relation graph to the BFS tree reachable from
/// `focus_id`.
///
/// Containment is not traversed; only the edges passed in are. When
/// `relevant` is given, edges with both endpoints outside it are ignored.
/// A focus id without neighbours (or unknown entirely) yields a single node.
pub fn spanning_tree(
    edges: &[Edge],
    catalog: &NodeCatalog,
    weights: &WeightMap,
    focus_id: &str,
    relevant: Option<&HashSet<String>>,
) -> SkillTree {
    let mut adjacency = Adjacency::default();
    for edge in edges {
        if !catalog.contains(&edge.from) || !catalog.contains(&edge.to) {
            continue;
        }
        if let Some(relevant) = relevant
            && !relevant.contains(&edge.from)
            && !relevant.contains(&edge.to)
        {
            continue;
        }
        adjacency.link(&edge.from, &edge.to);
    }

    let mut tree = SkillTree::singleton(
        focus_id,
        catalog.display_name(focus_id),
        weights.get(focus_id),
    );
    let mut queue = VecDeque::from([focus_id]);

    while let Some(current) = queue.pop_front() {
        let Some(current_index) = tree.index_of(current) else {
            continue;
        };

        for &next in adjacency.of(current) {
            if tree.contains(next) {
                continue;
            }

            let next_index = tree.insert(next, catalog.display_name(next), weights.get(next));
            tree.attach(current_index, next_index);
            queue.push_back(next);
        }
    }

    debug!(
        "spanning tree from {focus_id}: {} node(s), {} link(s)",
        tree.len(),
        tree.parent_link_count()
    );
    tree
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(from: &str, to: &str) -> Edge {
        Edge {
            from: from.to_owned(),
            to: to.to_owned(),
            kind: "related".to_owned(),
            strength: 1.0,
        }
    }

    fn catalog(ids: &[&str]) -> NodeCatalog {
        let mut catalog = NodeCatalog::default();
        for id in ids {
            catalog.declare(id, None);
        }
        catalog
    }

    #[test]
    fn breaks_cycles_with_first_discoverer_parentage() {
        let edges = [edge("a", "b"), edge("b", "c"), edge("c", "a"), edge("c", "d")];
        let tree = spanning_tree(
            &edges,
            &catalog(&["a", "b", "c", "d"]),
            &WeightMap::default(),
            "a",
            None,
        );

        assert_eq!(tree.len(), 4);
        assert_eq!(tree.parent_link_count(), 3);
        let root = tree.root_node().unwrap();
        let child_ids = root
            .children
            .iter()
            .map(|&index| tree.nodes()[index].id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(child_ids, vec!["b", "c"]);

        let d = tree.get("d").unwrap();
        assert_eq!(tree.nodes()[d.parent.unwrap()].id, "c");
    }

    #[test]
    fn unknown_focus_is_a_singleton() {
        let tree = spanning_tree(
            &[edge("a", "b")],
            &catalog(&["a", "b"]),
            &WeightMap::default(),
            "zzz",
            None,
        );
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root_node().unwrap().id, "zzz");
        assert!(tree.root_node().unwrap().children.is_empty());
    }

    #[test]
    fn relevance_excludes_edges_outside_the_scope() {
        let edges = [edge("a", "b"), edge("b", "c"), edge("c", "d")];
        let relevant = ["a".to_owned(), "b".to_owned()].into_iter().collect();
        let tree = spanning_tree(
            &edges,
            &catalog(&["a", "b", "c", "d"]),
            &WeightMap::default(),
            "a",
            Some(&relevant),
        );

        assert!(tree.contains("c"));
        assert!(!tree.contains("d"));
    }

    #[test]
    fn carries_names_and_weights() {
        let mut names = NodeCatalog::default();
        names.declare("a", Some("Alpha"));
        names.declare("b", Some("Beta"));
        let mut weights = WeightMap::default();
        weights.increment("b");

        let tree = spanning_tree(&[edge("a", "b")], &names, &weights, "a", None);
        let b = tree.get("b").unwrap();
        assert_eq!(b.display_name, "Beta");
        assert_eq!(b.weight, 1);
    }
}
