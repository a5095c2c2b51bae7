use super::{GraphSnapshot, Link, Node};

const SAMPLE_GROUP: &str = "Example";

/// Glycolysis network shown before any chapter or topic is loaded.
pub fn sample_snapshot() -> GraphSnapshot {
    let nodes = [
        ("Glucose", 15.0),
        ("Hexokinase", 10.0),
        ("ATP", 8.0),
        ("ADP", 8.0),
        ("Glucose-6-P", 15.0),
        ("Phosphoglucose Isomerase", 10.0),
        ("Fructose-6-P", 15.0),
        ("Phosphofructokinase", 10.0),
        ("Fructose-1,6-BP", 16.0),
        ("Mitochondria", 30.0),
        ("Cytoplasm", 40.0),
        ("Glycolysis", 25.0),
    ]
    .into_iter()
    .map(|(id, radius)| Node::new(id, SAMPLE_GROUP, radius))
    .collect();

    let links = [
        ("Glucose", "Hexokinase", "substrate"),
        ("ATP", "Hexokinase", "cofactor"),
        ("Hexokinase", "Glucose-6-P", "product"),
        ("Hexokinase", "ADP", "product"),
        ("Glucose-6-P", "Phosphoglucose Isomerase", "substrate"),
        ("Phosphoglucose Isomerase", "Fructose-6-P", "product"),
        ("Fructose-6-P", "Phosphofructokinase", "substrate"),
        ("ATP", "Phosphofructokinase", "cofactor"),
        ("Phosphofructokinase", "Fructose-1,6-BP", "product"),
        ("Phosphofructokinase", "ADP", "product"),
        ("Glycolysis", "Cytoplasm", "location"),
        ("Glucose", "Cytoplasm", "location"),
        ("Mitochondria", "Cytoplasm", "location"),
    ]
    .into_iter()
    .map(|(source, target, label)| Link::new(source, target, Some(label)))
    .collect();

    GraphSnapshot { nodes, links }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_links_reference_known_nodes() {
        let snapshot = sample_snapshot();
        for link in &snapshot.links {
            assert!(snapshot.node(&link.source).is_some(), "{}", link.source);
            assert!(snapshot.node(&link.target).is_some(), "{}", link.target);
        }
    }
}
