//! Unit tests for the reverse-edge index.

use asgraph::{
    Arena, AsgError, EdgeKind, EdgeSelector, NodeId, NodeKind, SimpleTypeKind, ROOT_PACKAGE_ID,
};

// Two classes, one calling method and a shared int type.
fn create_model(arena: &mut Arena) -> asgraph::Result<Vec<NodeId>> {
    let shape = arena.create_node(NodeKind::Class)?;
    arena.add_edge(ROOT_PACKAGE_ID, EdgeKind::ScopeHasMember, shape)?;
    let circle = arena.create_node(NodeKind::Class)?;
    arena.add_edge(ROOT_PACKAGE_ID, EdgeKind::ScopeHasMember, circle)?;

    let area = arena.create_node(NodeKind::Method)?;
    arena.add_edge(shape, EdgeKind::ScopeHasMember, area)?;
    let draw = arena.create_node(NodeKind::Method)?;
    arena.add_edge(circle, EdgeKind::ScopeHasMember, draw)?;

    let call = arena.create_method_call(area)?;
    arena.add_edge(draw, EdgeKind::MethodCalls, call)?;

    let int = arena.create_simple_type(SimpleTypeKind::Int);
    let former = arena.create_type_former_type(int)?;
    let int_type = arena.create_type(&[former])?;
    arena.add_edge(area, EdgeKind::MethodReturns, int_type)?;
    arena.add_edge(draw, EdgeKind::MemberUses, int_type)?;

    Ok(vec![shape, circle, area, draw, call, int_type])
}

// Every accepted forward edge appears reversed, and nothing else does.
fn assert_consistent(arena: &Arena) {
    let reverse = arena.reverse_edges().unwrap();
    let selector = reverse.selector();
    let mut expected = 0;
    for node in arena.iter_all() {
        for (kind, edge) in node.all_edges() {
            if selector.accepts(node.kind(), kind) {
                assert!(
                    reverse.get(edge.target).contains(&(kind, node.id())),
                    "missing {} -[{kind}]-> {}",
                    node.id(),
                    edge.target
                );
                expected += 1;
            }
        }
    }
    assert_eq!(reverse.edge_count(), expected);
}

#[test]
fn test_disabled_by_default() {
    let arena = Arena::default();

    assert!(!arena.is_reverse_edges_enabled());
    assert!(matches!(
        arena.reverse_edges(),
        Err(AsgError::ReverseEdgesDisabled)
    ));
}

#[test]
fn test_build_after_the_fact() {
    let mut arena = Arena::default();
    let ids = create_model(&mut arena).unwrap();
    let (area, draw, call, int_type) = (ids[2], ids[3], ids[4], ids[5]);

    arena.enable_reverse_edges(EdgeSelector::all()).unwrap();

    let reverse = arena.reverse_edges().unwrap();
    assert_eq!(
        reverse.sources(call, EdgeKind::MethodCalls).collect::<Vec<_>>(),
        vec![draw]
    );
    assert_eq!(
        reverse.sources(area, EdgeKind::MethodCallMethod).collect::<Vec<_>>(),
        vec![call]
    );
    assert_eq!(reverse.get(int_type).len(), 2);
    assert!(reverse.contains(ROOT_PACKAGE_ID));
    assert_eq!(reverse.node_count(), arena.node_count());
    assert_consistent(&arena);
}

#[test]
fn test_maintained_by_mutations() {
    let mut arena = Arena::default();
    arena.enable_reverse_edges(EdgeSelector::all()).unwrap();
    let ids = create_model(&mut arena).unwrap();
    assert_consistent(&arena);

    let (area, int_type) = (ids[2], ids[5]);
    arena.remove_edge(area, EdgeKind::MethodReturns, int_type).unwrap();
    assert_consistent(&arena);

    let param = arena.create_node(NodeKind::Parameter).unwrap();
    arena.add_edge(area, EdgeKind::MethodHasParameter, param).unwrap();
    arena.add_edge(param, EdgeKind::ParameterHasType, int_type).unwrap();
    assert_consistent(&arena);

    arena.destroy_node(ids[0]).unwrap();
    assert_consistent(&arena);
    assert!(!arena.reverse_edges().unwrap().contains(area));
}

#[test]
fn test_replaced_single_edge_is_unindexed() {
    let mut arena = Arena::default();
    arena.enable_reverse_edges(EdgeSelector::all()).unwrap();
    let int = arena.create_simple_type(SimpleTypeKind::Int);
    let long = arena.create_simple_type(SimpleTypeKind::Long);
    let int_type = arena
        .create_type_former_type(int)
        .and_then(|f| arena.create_type(&[f]))
        .unwrap();
    let long_type = arena
        .create_type_former_type(long)
        .and_then(|f| arena.create_type(&[f]))
        .unwrap();

    let param = arena.create_node(NodeKind::Parameter).unwrap();
    arena.add_edge(param, EdgeKind::ParameterHasType, int_type).unwrap();
    arena.add_edge(param, EdgeKind::ParameterHasType, long_type).unwrap();

    let reverse = arena.reverse_edges().unwrap();
    assert!(reverse.get(int_type).is_empty());
    assert_eq!(reverse.get(long_type), &[(EdgeKind::ParameterHasType, param)]);
}

#[test]
fn test_selector_restricts_the_index() {
    let mut arena = Arena::default();
    let ids = create_model(&mut arena).unwrap();
    let int_type = ids[5];

    let selector = EdgeSelector::edges(&[EdgeKind::MemberUses, EdgeKind::MethodReturns])
        .with_source_kinds(&[NodeKind::Method]);
    arena.enable_reverse_edges(selector).unwrap();

    let reverse = arena.reverse_edges().unwrap();
    assert_eq!(reverse.edge_count(), 2);
    assert_eq!(reverse.get(int_type).len(), 2);
    assert!(reverse.get(ids[2]).is_empty());
    assert_consistent(&arena);
}

#[test]
fn test_changing_selector_rebuilds() {
    let mut arena = Arena::default();
    create_model(&mut arena).unwrap();

    arena
        .enable_reverse_edges(EdgeSelector::edges(&[EdgeKind::MethodCalls]))
        .unwrap();
    assert_eq!(arena.reverse_edges().unwrap().edge_count(), 1);

    // same selector again keeps the index
    arena
        .enable_reverse_edges(EdgeSelector::edges(&[EdgeKind::MethodCalls]))
        .unwrap();
    assert_eq!(arena.reverse_edges().unwrap().edge_count(), 1);

    arena.enable_reverse_edges(EdgeSelector::all()).unwrap();
    assert!(arena.reverse_edges().unwrap().edge_count() > 1);
    assert_consistent(&arena);

    arena.disable_reverse_edges();
    assert!(!arena.is_reverse_edges_enabled());
}

#[test]
fn test_index_ignores_filter() {
    let mut arena = Arena::default();
    let ids = create_model(&mut arena).unwrap();
    arena.set_filtered(ids[1]).unwrap();

    arena.enable_reverse_edges(EdgeSelector::all()).unwrap();

    assert_consistent(&arena);
    assert!(arena.is_filtered(ids[1]));
}

#[test]
fn test_replaced_node_is_reindexed_under_new_kind() {
    let mut arena = Arena::default();
    let ids = create_model(&mut arena).unwrap();
    let (shape, area) = (ids[0], ids[2]);
    arena
        .enable_reverse_edges(
            EdgeSelector::edges(&[EdgeKind::ScopeHasMember])
                .with_source_kinds(&[NodeKind::ClassGeneric]),
        )
        .unwrap();
    assert!(arena.reverse_edges().unwrap().get(area).is_empty());

    arena.replace_node(shape).unwrap();
    assert_eq!(
        arena.reverse_edges().unwrap().get(area),
        &[(EdgeKind::ScopeHasMember, shape)]
    );
    assert_consistent(&arena);

    // a rebuild agrees with the incremental index
    let incremental = arena.reverse_edges().unwrap().get(area).to_vec();
    arena.disable_reverse_edges();
    arena
        .enable_reverse_edges(
            EdgeSelector::edges(&[EdgeKind::ScopeHasMember])
                .with_source_kinds(&[NodeKind::ClassGeneric]),
        )
        .unwrap();
    assert_eq!(arena.reverse_edges().unwrap().get(area), incremental.as_slice());
}
