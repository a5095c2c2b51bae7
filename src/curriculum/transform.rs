use std::collections::HashSet;

use rand::Rng;
use thiserror::Error;
use tracing::debug;

use crate::graph::{GraphSnapshot, Link, Node, Point};

use super::{Chapter, TreeNode};

const ROOT_RADIUS: f32 = 45.0;
const RADIUS_STEP: f32 = 8.0;
const MIN_RADIUS: f32 = 10.0;
const INITIAL_SCATTER: f32 = 400.0;
const FUNCTION_FALLBACK_LABEL: &str = "function";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    #[error("tree entry at depth {depth} has an empty `node` id")]
    EmptyNodeId { depth: usize },
}

pub(crate) fn radius_for_depth(depth: usize) -> f32 {
    (ROOT_RADIUS - RADIUS_STEP * depth as f32).max(MIN_RADIUS)
}

pub fn transform_chapter(chapter: &Chapter) -> Result<GraphSnapshot, TransformError> {
    transform_tree(&chapter.data, &chapter.chapter)
}

pub fn transform_tree(tree: &TreeNode, group: &str) -> Result<GraphSnapshot, TransformError> {
    transform_tree_with_rng(tree, group, &mut rand::thread_rng())
}

/// Flattens a concept tree into a deduplicated node/link snapshot.
///
/// Nodes are materialised on first visit (depth-first, root at depth 0) and
/// keep the attributes of that visit. A `targets` child labels its edge with
/// its own `relation`; every `function_targets` child shares the parent's
/// `function` (or the literal `"function"`).
pub fn transform_tree_with_rng<R: Rng + ?Sized>(
    tree: &TreeNode,
    group: &str,
    rng: &mut R,
) -> Result<GraphSnapshot, TransformError> {
    let mut builder = SnapshotBuilder {
        group,
        rng,
        nodes: Vec::new(),
        seen: HashSet::new(),
        links: Vec::new(),
        pairs: HashSet::new(),
    };
    builder.visit(tree, None, 0, None)?;

    debug!(
        group,
        nodes = builder.nodes.len(),
        links = builder.links.len(),
        "transformed concept tree"
    );

    Ok(GraphSnapshot {
        nodes: builder.nodes,
        links: builder.links,
    })
}

struct SnapshotBuilder<'a, R: ?Sized> {
    group: &'a str,
    rng: &'a mut R,
    nodes: Vec<Node>,
    seen: HashSet<String>,
    links: Vec<Link>,
    pairs: HashSet<(String, String)>,
}

impl<R: Rng + ?Sized> SnapshotBuilder<'_, R> {
    fn visit(
        &mut self,
        current: &TreeNode,
        parent: Option<&str>,
        depth: usize,
        incoming: Option<&str>,
    ) -> Result<(), TransformError> {
        let id = current.node.as_str();
        if id.is_empty() {
            return Err(TransformError::EmptyNodeId { depth });
        }

        if self.seen.insert(id.to_owned()) {
            let mut node = Node::new(id, self.group, radius_for_depth(depth));
            node.position = Some(Point {
                x: self.rng.gen_range(-INITIAL_SCATTER..=INITIAL_SCATTER),
                y: self.rng.gen_range(-INITIAL_SCATTER..=INITIAL_SCATTER),
            });
            node.description = current
                .relation
                .as_ref()
                .map(|relation| format!("Relation: {relation}"));
            self.nodes.push(node);
        }

        if let Some(parent) = parent {
            self.add_link(parent, id, incoming);
        }

        for child in &current.targets {
            self.visit(child, Some(id), depth + 1, child.relation.as_deref())?;
        }

        let function_label = current.function.as_deref().unwrap_or(FUNCTION_FALLBACK_LABEL);
        for child in &current.function_targets {
            self.visit(child, Some(id), depth + 1, Some(function_label))?;
        }

        Ok(())
    }

    fn add_link(&mut self, source: &str, target: &str, label: Option<&str>) {
        let key = if source <= target {
            (source.to_owned(), target.to_owned())
        } else {
            (target.to_owned(), source.to_owned())
        };
        if self.pairs.insert(key) {
            self.links.push(Link::new(source, target, label));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap};

    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn leaf(id: &str, relation: Option<&str>) -> TreeNode {
        TreeNode {
            node: id.to_owned(),
            relation: relation.map(str::to_owned),
            ..Default::default()
        }
    }

    fn transform(tree: &TreeNode, group: &str) -> GraphSnapshot {
        transform_tree_with_rng(tree, group, &mut StdRng::seed_from_u64(7)).unwrap()
    }

    fn unordered_pairs(snapshot: &GraphSnapshot) -> BTreeSet<(String, String)> {
        snapshot
            .links
            .iter()
            .map(|link| {
                let (a, b) = (link.source.clone(), link.target.clone());
                if a <= b { (a, b) } else { (b, a) }
            })
            .collect()
    }

    fn first_visit_depths(tree: &TreeNode) -> HashMap<String, usize> {
        fn walk(node: &TreeNode, depth: usize, out: &mut HashMap<String, usize>) {
            out.entry(node.node.clone()).or_insert(depth);
            for child in node.targets.iter().chain(node.function_targets.iter()) {
                walk(child, depth + 1, out);
            }
        }
        let mut depths = HashMap::new();
        walk(tree, 0, &mut depths);
        depths
    }

    #[test]
    fn single_target_example() {
        let tree = TreeNode {
            node: "A".to_owned(),
            targets: vec![leaf("B", Some("activates"))],
            ..Default::default()
        };

        let snapshot = transform(&tree, "1");

        assert_eq!(snapshot.nodes.len(), 2);
        assert_eq!(snapshot.nodes[0].id, "A");
        assert_eq!(snapshot.nodes[0].group, "1");
        assert_eq!(snapshot.nodes[0].radius, 45.0);
        assert_eq!(snapshot.nodes[1].id, "B");
        assert_eq!(snapshot.nodes[1].group, "1");
        assert_eq!(snapshot.nodes[1].radius, 37.0);
        assert_eq!(snapshot.links, vec![Link::new("A", "B", Some("activates"))]);
    }

    #[test]
    fn radius_shrinks_with_depth_and_floors_at_ten() {
        assert_eq!(radius_for_depth(0), 45.0);
        assert_eq!(radius_for_depth(2), 29.0);
        assert_eq!(radius_for_depth(4), 13.0);
        assert_eq!(radius_for_depth(5), 10.0);
        assert_eq!(radius_for_depth(40), 10.0);
    }

    #[test]
    fn function_targets_share_parent_function_label() {
        let tree = TreeNode {
            node: "Cell".to_owned(),
            function: Some("produces".to_owned()),
            function_targets: vec![leaf("Protein", Some("own")), leaf("Lipid", None)],
            targets: vec![
                TreeNode {
                    node: "Nucleus".to_owned(),
                    relation: Some("contains".to_owned()),
                    function_targets: vec![leaf("RNA", None)],
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let snapshot = transform(&tree, "ch1");
        let label_of = |target: &str| {
            snapshot
                .links
                .iter()
                .find(|link| link.target == target)
                .and_then(|link| link.label.clone())
        };

        assert_eq!(label_of("Nucleus").as_deref(), Some("contains"));
        assert_eq!(label_of("Protein").as_deref(), Some("produces"));
        assert_eq!(label_of("Lipid").as_deref(), Some("produces"));
        assert_eq!(label_of("RNA").as_deref(), Some("function"));
    }

    #[test]
    fn description_comes_from_own_relation() {
        let tree = TreeNode {
            node: "Root".to_owned(),
            targets: vec![leaf("Child", Some("regulates"))],
            function_targets: vec![leaf("Other", None)],
            ..Default::default()
        };

        let snapshot = transform(&tree, "g");
        assert_eq!(snapshot.node("Root").unwrap().description, None);
        assert_eq!(
            snapshot.node("Child").unwrap().description.as_deref(),
            Some("Relation: regulates")
        );
        assert_eq!(snapshot.node("Other").unwrap().description, None);
    }

    #[test]
    fn revisited_node_keeps_first_attributes_and_links_dedup() {
        // "Shared" is reached at depth 1 and again at depth 2 with a new relation.
        let tree = TreeNode {
            node: "Root".to_owned(),
            targets: vec![
                leaf("Shared", Some("first")),
                TreeNode {
                    node: "Middle".to_owned(),
                    relation: Some("via".to_owned()),
                    targets: vec![leaf("Shared", Some("second")), leaf("Root", Some("back"))],
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let snapshot = transform(&tree, "g");
        let shared = snapshot.node("Shared").unwrap();
        assert_eq!(shared.radius, 37.0);
        assert_eq!(shared.description.as_deref(), Some("Relation: first"));
        assert_eq!(snapshot.nodes.len(), 3);

        // Root-Middle already exists when Middle -> Root is attempted.
        assert_eq!(snapshot.links.len(), 3);
        assert_eq!(unordered_pairs(&snapshot).len(), snapshot.links.len());
    }

    #[test]
    fn initial_positions_stay_within_scatter_box() {
        let tree = TreeNode {
            node: "A".to_owned(),
            targets: (0..20).map(|i| leaf(&format!("n{i}"), None)).collect(),
            ..Default::default()
        };

        let snapshot = transform_tree(&tree, "g").unwrap();
        for node in &snapshot.nodes {
            let position = node.position.unwrap();
            assert!(position.x.abs() <= INITIAL_SCATTER);
            assert!(position.y.abs() <= INITIAL_SCATTER);
        }
    }

    #[test]
    fn empty_node_id_fails_fast() {
        let tree = TreeNode {
            node: "A".to_owned(),
            targets: vec![TreeNode {
                node: "B".to_owned(),
                targets: vec![leaf("", Some("broken"))],
                ..Default::default()
            }],
            ..Default::default()
        };

        assert_eq!(
            transform_tree(&tree, "g"),
            Err(TransformError::EmptyNodeId { depth: 2 })
        );
    }

    #[test]
    fn missing_node_field_is_rejected_at_parse_time() {
        let raw = r#"{"node": "A", "targets": [{"relation": "x"}]}"#;
        assert!(serde_json::from_str::<TreeNode>(raw).is_err());
    }

    fn arb_tree() -> impl Strategy<Value = TreeNode> {
        let id = "[a-f]";
        let label = proptest::option::of("[a-z]{1,6}");
        let leaf = (id, label.clone()).prop_map(|(node, relation)| TreeNode {
            node,
            relation,
            ..Default::default()
        });
        leaf.prop_recursive(4, 32, 4, move |inner| {
            (
                id,
                label.clone(),
                proptest::collection::vec(inner.clone(), 0..3),
                label.clone(),
                proptest::collection::vec(inner, 0..3),
            )
                .prop_map(|(node, relation, targets, function, function_targets)| TreeNode {
                    node,
                    relation,
                    targets,
                    function,
                    function_targets,
                })
        })
    }

    proptest! {
        #[test]
        fn transforming_twice_yields_same_graph(tree in arb_tree()) {
            let first = transform_tree(&tree, "g").unwrap();
            let second = transform_tree(&tree, "g").unwrap();

            let ids = |s: &GraphSnapshot| s.nodes.iter().map(|n| n.id.clone()).collect::<BTreeSet<_>>();
            prop_assert_eq!(ids(&first), ids(&second));
            prop_assert_eq!(unordered_pairs(&first), unordered_pairs(&second));
            prop_assert_eq!(unordered_pairs(&first).len(), first.links.len());
        }

        #[test]
        fn radius_follows_first_visit_depth(tree in arb_tree()) {
            let snapshot = transform(&tree, "g");
            let depths = first_visit_depths(&tree);

            prop_assert_eq!(snapshot.nodes.len(), depths.len());
            for node in &snapshot.nodes {
                prop_assert_eq!(node.radius, radius_for_depth(depths[&node.id]));
                prop_assert!(node.radius > 0.0);
                prop_assert_eq!(node.group.as_str(), "g");
            }
        }
    }
}
