use std::collections::{HashMap, HashSet, VecDeque};

use eframe::egui::{Rect, pos2, vec2};
use proptest::prelude::*;
use skill_flow::config::{FadePolicy, NodeSpacing, StrengthFallback, ZoomBounds};
use skill_flow::document::{Document, RelationRecord, SkillRecord};
use skill_flow::layout::{layout_hierarchical, layout_radial, radial_slots};
use skill_flow::model::{GraphModel, GraphModelBuilder, SkillTree, spanning_tree};
use skill_flow::particles::{Flow, FlowPath, ParticleSimulator, wrap_progress};
use skill_flow::viewport::{Transform, Viewport};

fn id(index: usize) -> String {
    format!("s{index}")
}

fn relation(kind: &str, target: usize) -> RelationRecord {
    RelationRecord {
        kind: kind.to_owned(),
        target: id(target),
        score: Some(5.0),
    }
}

fn document(node_count: usize, containment: &[(usize, usize)], peers: &[(usize, usize)]) -> Document {
    let mut skills = (0..node_count)
        .map(|index| SkillRecord {
            id: Some(id(index)),
            name: Some(format!("Skill {index}")),
            relations: Vec::new(),
        })
        .collect::<Vec<_>>();

    for &(child, parent) in containment {
        skills[child % node_count].relations.push(relation("Child", parent % node_count));
    }
    for &(from, to) in peers {
        skills[from % node_count].relations.push(relation("isRelatedTo", to % node_count));
    }

    Document {
        skills,
        subjects: Vec::new(),
    }
}

fn build(document: &Document) -> GraphModel {
    GraphModelBuilder::new("Child", StrengthFallback::Fixed(5.0)).build(document, None)
}

/// Random forest shaped tree: node `i` hangs under some earlier node or
/// starts a new root.
fn forest_tree(parents: &[usize]) -> SkillTree {
    let containment = parents
        .iter()
        .enumerate()
        .skip(1)
        .filter_map(|(index, raw)| {
            let parent = raw % (index + 1);
            (parent != index).then_some((index, parent))
        })
        .collect::<Vec<_>>();

    let node_count = parents.len();
    build(&document(node_count, &containment, &[])).tree
}

fn assert_well_formed(tree: &SkillTree) {
    if tree.is_empty() {
        return;
    }

    let root = tree.root().expect("non-empty tree has a root");
    assert_eq!(tree.node(root).unwrap().parent, None);

    let order = tree.preorder();
    assert_eq!(order.len(), tree.len());
    assert_eq!(order.iter().collect::<HashSet<_>>().len(), tree.len());
    assert_eq!(tree.parent_link_count(), tree.len() - 1);
    assert!(tree.depths().iter().all(|&depth| depth != usize::MAX));
}

fn component(model: &GraphModel, focus: &str) -> HashSet<String> {
    let mut adjacency = HashMap::<&str, Vec<&str>>::new();
    for edge in &model.edges {
        adjacency.entry(&edge.from).or_default().push(&edge.to);
        adjacency.entry(&edge.to).or_default().push(&edge.from);
    }

    let mut seen = HashSet::from([focus.to_owned()]);
    let mut queue = VecDeque::from([focus]);
    while let Some(current) = queue.pop_front() {
        for &next in adjacency.get(current).map(Vec::as_slice).unwrap_or_default() {
            if seen.insert(next.to_owned()) {
                queue.push_back(next);
            }
        }
    }
    seen
}

fn pairs(max: usize, len: usize) -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0..max, 0..max), 0..len)
}

proptest! {
    #[test]
    fn containment_always_yields_a_single_rooted_tree(
        node_count in 1usize..24,
        containment in pairs(64, 40),
    ) {
        let model = build(&document(node_count, &containment, &[]));
        assert_well_formed(&model.tree);
    }

    #[test]
    fn spanning_tree_covers_exactly_the_focus_component(
        node_count in 1usize..20,
        peers in pairs(64, 40),
        focus in 0usize..64,
    ) {
        let model = build(&document(node_count, &[], &peers));
        let focus = id(focus % node_count);

        let tree = spanning_tree(&model.edges, &model.catalog, &model.weights, &focus, None);
        let ids = tree.nodes().iter().map(|node| node.id.clone()).collect::<HashSet<_>>();

        prop_assert_eq!(ids, component(&model, &focus));
        prop_assert_eq!(tree.parent_link_count(), tree.len() - 1);
        prop_assert_eq!(tree.root_node().map(|node| node.id.as_str()), Some(focus.as_str()));
        assert_well_formed(&tree);
    }

    #[test]
    fn hierarchical_parents_centre_over_children(
        parents in prop::collection::vec(0usize..64, 1..30),
    ) {
        let mut tree = forest_tree(&parents);
        layout_hierarchical(&mut tree, NodeSpacing::default(), 400.0);

        let mut last_leaf_x = f32::NEG_INFINITY;
        for index in tree.preorder() {
            let node = tree.node(index).unwrap();
            match (node.children.first(), node.children.last()) {
                (Some(&first), Some(&last)) => {
                    let first = tree.node(first).unwrap().position.x;
                    let last = tree.node(last).unwrap().position.x;
                    prop_assert!((node.position.x - (first + last) * 0.5).abs() < 1e-2);
                }
                _ => {
                    prop_assert!(node.position.x > last_leaf_x);
                    last_leaf_x = node.position.x;
                }
            }
        }

        let root = tree.root_node().unwrap();
        prop_assert!((root.position.x - 400.0).abs() < 1e-2);
    }

    #[test]
    fn radial_arcs_partition_and_rings_widen(
        parents in prop::collection::vec(0usize..64, 1..30),
        base_radius in 10.0f32..200.0,
    ) {
        let mut tree = forest_tree(&parents);
        let center = vec2(320.0, 240.0);
        layout_radial(&mut tree, center, base_radius);
        prop_assert_eq!(tree.root_node().unwrap().position, center);

        let slots = radial_slots(&tree, base_radius);
        for (index, node) in tree.nodes().iter().enumerate() {
            let slot = slots[index].unwrap();
            if node.children.is_empty() {
                continue;
            }

            let child_arcs = node
                .children
                .iter()
                .map(|&child| slots[child].unwrap().arc)
                .sum::<f32>();
            prop_assert!((child_arcs - slot.arc).abs() < 1e-3);
            for &child in &node.children {
                prop_assert!(slots[child].unwrap().radius >= slot.radius);
            }
        }
    }

    #[test]
    fn zoom_keeps_the_cursor_point_fixed(
        start in (-500.0f32..500.0, -500.0f32..500.0, 0.2f32..5.0),
        cursor in (0.0f32..1200.0, 0.0f32..900.0),
        factor in 0.5f32..2.0,
    ) {
        let mut viewport = Viewport::new(ZoomBounds { min: 0.01, max: 100.0 });
        viewport.zoom(pos2(0.0, 0.0), start.2);
        viewport.pan(start.0, start.1);

        let cursor = pos2(cursor.0, cursor.1);
        let before = viewport.transform().to_model(cursor);
        viewport.zoom(cursor, factor);
        let after = viewport.transform().to_screen(before);

        prop_assert!((after.x - cursor.x).abs() < 1e-2);
        prop_assert!((after.y - cursor.y).abs() < 1e-2);
    }

    #[test]
    fn fit_to_view_contains_every_node(
        points in prop::collection::vec((-5000.0f32..5000.0, -5000.0f32..5000.0), 1..40),
        container in (50.0f32..2000.0, 50.0f32..2000.0),
        padding in 0.0f32..80.0,
    ) {
        let mut viewport = Viewport::new(ZoomBounds::default());
        let positions = points.iter().map(|&(x, y)| vec2(x, y)).collect::<Vec<_>>();
        prop_assert!(viewport.fit_to_view(positions.iter().copied(), vec2(container.0, container.1), padding));

        let transform = viewport.transform();
        for position in positions {
            let screen = transform.to_screen(position);
            prop_assert!(screen.x >= -padding - 1e-2 && screen.x <= container.0 + padding + 1e-2);
            prop_assert!(screen.y >= -padding - 1e-2 && screen.y <= container.1 + padding + 1e-2);
        }
    }

    #[test]
    fn particles_loop_and_respect_the_cap(
        initial in 0.0f32..1.0,
        speed in 0.01f32..2.0,
        steps in prop::collection::vec(0.0f32..0.1, 1..60),
        cap in 1usize..30,
    ) {
        let bounds = Rect::from_min_max(pos2(-1.0e6, -1.0e6), pos2(1.0e6, 1.0e6));
        let transform = Transform::default();
        let flow = Flow {
            edge: 0,
            path: FlowPath::between(vec2(0.0, 0.0), vec2(200.0, 50.0)).unwrap(),
            strength: 10.0,
            speed,
            color: eframe::egui::Color32::WHITE,
        };

        let mut tracked = ParticleSimulator::new(1, 0.0, FadePolicy::Constant, Some(7));
        tracked.set_flows(vec![flow.clone()]);
        tracked.spawn_on(0, initial, &transform).unwrap();
        let mut travelled = 0.0f32;
        for &dt in &steps {
            tracked.update(dt, &transform, bounds);
            travelled += speed * dt;
        }
        let expected = wrap_progress(initial + travelled);
        let actual = tracked.particles()[0].progress;
        let gap = (actual - expected).abs();
        prop_assert!(gap.min(1.0 - gap) < 1e-3);

        let mut crowded = ParticleSimulator::new(cap, 5.0, FadePolicy::Constant, Some(11));
        crowded.set_flows(vec![flow; 4]);
        for &dt in &steps {
            crowded.update(dt, &transform, bounds);
            prop_assert!(crowded.len() <= cap);
        }
    }
}
