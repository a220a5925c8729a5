use std::collections::HashSet;

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{EngineConfig, StrengthFallback};
use crate::document::Document;

use super::{Edge, GraphModel, NodeCatalog, SYNTHETIC_ROOT_ID, SkillTree, WeightMap};

const SYNTHETIC_ROOT_NAME: &str = "All skills";

/// Restricts which subjects contribute weight, e.g. "unit U1" or "role R2".
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FocusFilter {
    pub kind: String,
    pub id: String,
}

impl FocusFilter {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

enum StrengthSource {
    Fixed(f32),
    Seeded(StdRng),
    Random,
}

impl StrengthSource {
    fn new(fallback: StrengthFallback) -> Self {
        match fallback {
            StrengthFallback::Fixed(value) => Self::Fixed(value),
            StrengthFallback::Seeded(seed) => Self::Seeded(StdRng::seed_from_u64(seed)),
            StrengthFallback::Random => Self::Random,
        }
    }

    fn next(&mut self) -> f32 {
        match self {
            Self::Fixed(value) => *value,
            Self::Seeded(rng) => rng.gen_range(1..=10) as f32,
            Self::Random => rand::thread_rng().gen_range(1..=10) as f32,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GraphModelBuilder {
    containment_kind: String,
    fallback: StrengthFallback,
}

impl Default for GraphModelBuilder {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl GraphModelBuilder {
    pub fn new(containment_kind: impl Into<String>, fallback: StrengthFallback) -> Self {
        Self {
            containment_kind: containment_kind.into(),
            fallback,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.containment_kind.clone(), config.strength_fallback)
    }

    pub fn build(&self, document: &Document, focus_filter: Option<&FocusFilter>) -> GraphModel {
        let mut catalog = NodeCatalog::default();
        let mut skipped = 0usize;

        for skill in &document.skills {
            match &skill.id {
                Some(id) => catalog.declare(id, skill.name.as_deref()),
                None => skipped += 1,
            }
        }

        let mut strengths = StrengthSource::new(self.fallback);
        let mut containment = Vec::new();
        let mut pending_edges = Vec::new();

        for skill in &document.skills {
            let Some(id) = skill.id.as_deref() else {
                continue;
            };

            for relation in &skill.relations {
                if relation.kind == self.containment_kind {
                    catalog.reference(&relation.target);
                    containment.push((relation.target.as_str(), id));
                } else {
                    let strength = relation.score.unwrap_or_else(|| strengths.next());
                    pending_edges.push(Edge {
                        from: id.to_owned(),
                        to: relation.target.clone(),
                        kind: relation.kind.clone(),
                        strength,
                    });
                }
            }
        }

        let edge_total = pending_edges.len();
        let edges = pending_edges
            .into_iter()
            .filter(|edge| catalog.contains(&edge.to) && edge.from != edge.to)
            .collect::<Vec<_>>();
        if edges.len() < edge_total {
            warn!(
                "dropped {} relation(s) pointing at unknown or identical nodes",
                edge_total - edges.len()
            );
        }
        if skipped > 0 {
            warn!("skipped {skipped} skill record(s) without an id");
        }

        let weights = collect_weights(document, &catalog, focus_filter);
        let tree = build_tree(&catalog, &containment, &weights);

        debug!(
            "built skill graph: {} known nodes, {} in tree, {} edges, max weight {}",
            catalog.len(),
            tree.len(),
            edges.len(),
            weights.max_weight()
        );

        GraphModel {
            tree,
            catalog,
            edges,
            weights,
        }
    }
}

fn collect_weights(
    document: &Document,
    catalog: &NodeCatalog,
    focus_filter: Option<&FocusFilter>,
) -> WeightMap {
    let mut weights = WeightMap::default();

    for subject in &document.subjects {
        let counts = focus_filter.is_none_or(|filter| subject.matches(&filter.kind, &filter.id));
        if !counts {
            continue;
        }

        let mut seen = HashSet::new();
        for skill_id in &subject.skills {
            if catalog.contains(skill_id) && seen.insert(skill_id.as_str()) {
                weights.increment(skill_id);
            }
        }
    }

    weights
}

fn build_tree(catalog: &NodeCatalog, containment: &[(&str, &str)], weights: &WeightMap) -> SkillTree {
    let participants = if containment.is_empty() {
        catalog.ids().collect::<HashSet<_>>()
    } else {
        containment
            .iter()
            .flat_map(|&(parent, child)| [parent, child])
            .collect::<HashSet<_>>()
    };

    let mut tree = SkillTree::default();
    for entry in catalog.entries() {
        if participants.contains(entry.id.as_str()) {
            tree.insert(&entry.id, &entry.display_name, weights.get(&entry.id));
        }
    }

    for &(parent, child) in containment {
        let (Some(parent_index), Some(child_index)) = (tree.index_of(parent), tree.index_of(child))
        else {
            continue;
        };

        if !tree.attach(parent_index, child_index) {
            warn!("ignoring containment {child} -> {parent}: it would close a cycle");
        }
    }

    let roots = (0..tree.len())
        .filter(|&index| tree.nodes()[index].parent.is_none())
        .collect::<Vec<_>>();

    match roots.as_slice() {
        [] => {}
        [root] => tree.set_root(*root),
        _ => {
            let mut root_id = SYNTHETIC_ROOT_ID.to_owned();
            while tree.contains(&root_id) {
                root_id.push('~');
            }

            let synthetic = tree.insert(&root_id, SYNTHETIC_ROOT_NAME, 0);
            tree.node_mut(synthetic).synthetic = true;
            for root in roots {
                tree.attach(synthetic, root);
            }
            tree.set_root(synthetic);
        }
    }

    tree
}
