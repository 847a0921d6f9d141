//! Tests for VisibilityService propagation

use generational_arena::Index;
use rstest::rstest;

use jobad::application::services::VisibilityService;
use jobad::application::ApplicationError;
use jobad::domain::{
    Brackets, DomainError, NodeData, PropertyDecl, PropertyType, Selection, TreeArena,
};
use jobad::util::testing;

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

/// Root declaring integer `level`, plus a group whose alternatives test it.
fn leveled_group(level: &str, conditions: &[&str]) -> (TreeArena, Index, Vec<Index>) {
    let mut tree = TreeArena::new();
    let root = tree
        .insert_node(
            NodeData::new("root")
                .with_property(PropertyDecl::new("level", PropertyType::Integer, level).unwrap()),
            None,
        )
        .unwrap();
    let group = tree
        .insert_node(NodeData::new("group").with_group(), Some(root))
        .unwrap();
    let alternatives = conditions
        .iter()
        .enumerate()
        .map(|(i, cond)| {
            tree.insert_node(
                NodeData::new(format!("alt-{}", i)).with_conditional(*cond),
                Some(group),
            )
            .unwrap()
        })
        .collect();
    (tree, group, alternatives)
}

fn selection(tree: &TreeArena, group: Index) -> Option<Selection> {
    tree.node(group).unwrap().data.group.as_ref().unwrap().selection
}

fn hidden_flags(tree: &TreeArena) -> Vec<(String, bool)> {
    tree.iter()
        .map(|(_, n)| (n.data.id.clone(), n.data.hidden))
        .collect()
}

#[test]
fn given_alternatives_false_true_true_when_propagating_then_selects_first_match() {
    let (mut tree, group, _) = leveled_group("5", &["level<3", "level>4", "level=5"]);

    VisibilityService::default().propagate_all(&mut tree).unwrap();

    assert_eq!(selection(&tree, group), Some(Selection::Child(1)));
}

#[test]
fn given_no_alternative_matches_when_propagating_then_selects_placeholder() {
    let (mut tree, group, alternatives) = leveled_group("0", &["level>1", "level>2"]);

    VisibilityService::default().propagate_all(&mut tree).unwrap();

    let selected = selection(&tree, group).unwrap();
    assert_eq!(selected, Selection::Placeholder);
    assert_eq!(selected.index(alternatives.len()), 2);
    assert_eq!(tree.len(), 4, "placeholder is virtual, no node inserted");
}

#[test]
fn given_unconditional_alternative_when_propagating_then_it_qualifies() {
    let mut tree = TreeArena::new();
    let root = tree.insert_node(NodeData::new("root"), None).unwrap();
    let group = tree
        .insert_node(NodeData::new("group").with_group(), Some(root))
        .unwrap();
    tree.insert_node(NodeData::new("a").with_conditional("false"), Some(group))
        .unwrap();
    tree.insert_node(NodeData::new("b"), Some(group)).unwrap();

    VisibilityService::default().propagate_all(&mut tree).unwrap();

    assert_eq!(selection(&tree, group), Some(Selection::Child(1)));
}

#[test]
fn given_malformed_alternative_when_propagating_then_keeps_prior_selection() {
    let (mut tree, group, alternatives) = leveled_group("5", &["level>4", "level>"]);
    let service = VisibilityService::default();
    service.propagate_all(&mut tree).unwrap();
    assert_eq!(selection(&tree, group), Some(Selection::Child(0)));

    // First alternative no longer qualifies, second is malformed
    tree.node_mut(alternatives[0]).unwrap().data.conditional = Some("level>9".into());
    tree.node_mut(alternatives[1]).unwrap().data.conditional = Some("level".into());
    let report = service.propagate_all(&mut tree).unwrap();

    assert_eq!(selection(&tree, group), Some(Selection::Child(0)));
    assert!(report.skipped.iter().any(|s| s.id == "group"));
}

#[rstest]
#[case("3", &[("alt-0", false), ("alt-1", true)])]
#[case("7", &[("alt-0", true), ("alt-1", false)])]
fn given_conditions_when_propagating_twice_then_flags_do_not_flap(
    #[case] level: &str,
    #[case] expected_hidden: &[(&str, bool)],
) {
    let (mut tree, _, _) = leveled_group(level, &["level<5", "level>5"]);
    let service = VisibilityService::default();

    service.propagate_all(&mut tree).unwrap();
    let first = hidden_flags(&tree);
    let report = service.propagate_all(&mut tree).unwrap();
    let second = hidden_flags(&tree);

    assert_eq!(first, second);
    assert_eq!(report.changed, 0);
    for (id, hidden) in expected_hidden {
        let idx = tree.find(id).unwrap();
        assert_eq!(tree.node(idx).unwrap().data.hidden, *hidden, "{}", id);
    }
}

#[test]
fn given_hidden_ancestor_when_propagating_then_descendants_keep_own_state() {
    let mut tree = TreeArena::new();
    let root = tree
        .insert_node(
            NodeData::new("root")
                .with_property(PropertyDecl::new("on", PropertyType::Boolean, "false").unwrap()),
            None,
        )
        .unwrap();
    let outer = tree
        .insert_node(NodeData::new("outer").with_conditional("on=true"), Some(root))
        .unwrap();
    let inner = tree
        .insert_node(NodeData::new("inner").with_conditional("on=false"), Some(outer))
        .unwrap();

    VisibilityService::default().propagate_all(&mut tree).unwrap();

    assert!(tree.node(outer).unwrap().data.hidden);
    assert!(!tree.node(inner).unwrap().data.hidden);
}

#[test]
fn given_bracket_condition_toggled_when_propagating_then_marks_round_trip() {
    let mut tree = TreeArena::new();
    let root = tree
        .insert_node(
            NodeData::new("root")
                .with_property(PropertyDecl::new("explicit", PropertyType::Boolean, "false").unwrap()),
            None,
        )
        .unwrap();
    let term = tree
        .insert_node(
            NodeData::new("term").with_brackets(Brackets::new("explicit=true", "⟨", "⟩")),
            Some(root),
        )
        .unwrap();
    let service = VisibilityService::default();
    let original = tree.node(term).unwrap().data.brackets.clone().unwrap();

    service.propagate_all(&mut tree).unwrap();
    let suppressed = tree.node(term).unwrap().data.brackets.clone().unwrap();
    assert!(suppressed.is_suppressed());
    assert_eq!((suppressed.open.as_str(), suppressed.close.as_str()), ("", ""));

    tree.node_mut(root).unwrap().data.property.as_mut().unwrap().value = "true".into();
    service.propagate_all(&mut tree).unwrap();

    assert_eq!(tree.node(term).unwrap().data.brackets.as_ref(), Some(&original));
}

#[test]
fn given_cyclic_ancestry_when_propagating_then_aborts_without_mutation() {
    let mut tree = TreeArena::new();
    let root = tree.insert_node(NodeData::new("root"), None).unwrap();
    let a = tree
        .insert_node(NodeData::new("a").with_conditional("false"), Some(root))
        .unwrap();
    let b = tree
        .insert_node(NodeData::new("b").with_conditional("false"), Some(a))
        .unwrap();
    tree.get_node_mut(a).unwrap().parent = Some(b);

    let err = VisibilityService::default()
        .propagate_all(&mut tree)
        .unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::CycleDetected(_))
    ));
    assert!(!tree.node(a).unwrap().data.hidden);
    assert!(!tree.node(b).unwrap().data.hidden);
}

#[test]
fn given_scope_when_propagating_then_nodes_outside_are_untouched() {
    let mut tree = TreeArena::new();
    let root = tree.insert_node(NodeData::new("root"), None).unwrap();
    let left = tree.insert_node(NodeData::new("left"), Some(root)).unwrap();
    let in_scope = tree
        .insert_node(NodeData::new("in").with_conditional("false"), Some(left))
        .unwrap();
    let out_of_scope = tree
        .insert_node(NodeData::new("out").with_conditional("false"), Some(root))
        .unwrap();

    let report = VisibilityService::default()
        .propagate(&mut tree, left)
        .unwrap();

    assert_eq!(report.evaluated, 1);
    assert!(tree.node(in_scope).unwrap().data.hidden);
    assert!(!tree.node(out_of_scope).unwrap().data.hidden);
}
