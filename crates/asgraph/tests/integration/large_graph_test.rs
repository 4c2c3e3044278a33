//! Integration tests for large graphs (10K to 100K nodes).

use asgraph::{
    AlgorithmPreorder, Arena, ArenaConfig, EdgeKind, EdgeSelector, Language, NodeCollector, NodeId,
    NodeKind, SaveOptions, SimpleTypeKind, ROOT_PACKAGE_ID,
};
use tempfile::TempDir;

/// `packages` packages of `classes` classes, each class with one method
/// calling the method of the next class.
fn create_call_chain(
    arena: &mut Arena,
    packages: usize,
    classes: usize,
) -> asgraph::Result<Vec<NodeId>> {
    let int = arena.create_simple_type(SimpleTypeKind::Int);
    let former = arena.create_type_former_type(int)?;
    let int_type = arena.create_type(&[former])?;

    let mut methods = Vec::with_capacity(packages * classes);
    for p in 0..packages {
        let package = arena.create_node(NodeKind::Package)?;
        arena.set_name(package, &format!("pkg_{p}"))?;
        arena.add_edge(ROOT_PACKAGE_ID, EdgeKind::ScopeHasMember, package)?;
        for c in 0..classes {
            let class = arena.create_node(NodeKind::Class)?;
            arena.set_name(class, &format!("Class_{p}_{c}"))?;
            arena.add_edge(package, EdgeKind::ScopeHasMember, class)?;
            let method = arena.create_node(NodeKind::Method)?;
            arena.set_name(method, "run")?;
            arena.add_edge(class, EdgeKind::ScopeHasMember, method)?;
            arena.add_edge(method, EdgeKind::MethodReturns, int_type)?;
            methods.push(method);
        }
    }

    for pair in methods.windows(2) {
        let call = arena.create_method_call(pair[1])?;
        arena.add_edge(pair[0], EdgeKind::MethodCalls, call)?;
    }
    Ok(methods)
}

#[test]
fn test_medium_graph_10k_nodes_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("medium.zsi");
    let mut arena = Arena::new(ArenaConfig::for_language(Language::Java));

    let methods = create_call_chain(&mut arena, 10, 340).unwrap();
    assert!(arena.node_count() > 10_000);

    arena.save(&path, SaveOptions::compressed()).unwrap();
    let mut loaded = Arena::new(ArenaConfig::for_language(Language::Java));
    loaded.load(&path).unwrap();

    assert_eq!(loaded.node_count(), arena.node_count());
    for id in 0..arena.len() as NodeId {
        assert_eq!(arena.get_pointer(id), loaded.get_pointer(id));
    }

    let sample = methods[methods.len() / 2];
    assert_eq!(loaded.name(sample), "run");
    let class = loaded.get_ref(sample).unwrap().parent().unwrap();
    assert_eq!(loaded.name(class), arena.name(class));
}

#[test]
fn test_medium_graph_reverse_edges_and_traversal() {
    let mut arena = Arena::default();
    let methods = create_call_chain(&mut arena, 10, 340).unwrap();
    arena.enable_reverse_edges(EdgeSelector::all()).unwrap();

    let reverse = arena.reverse_edges().unwrap();
    let call = arena
        .get_ref(methods[0])
        .unwrap()
        .single(EdgeKind::MethodCalls)
        .unwrap();
    assert_eq!(
        reverse.sources(call, EdgeKind::MethodCalls).collect::<Vec<_>>(),
        vec![methods[0]]
    );

    let mut collector = NodeCollector::default();
    let mut preorder = AlgorithmPreorder::new();
    preorder.set_safe_mode(true);
    preorder.run(&arena, &mut [&mut collector]).unwrap();
    assert_eq!(collector.ids.len(), arena.node_count());
    assert!(preorder.double_visits().is_empty());
}

#[test]
#[ignore] // This test is slow, run with --ignored flag
fn test_large_graph_100k_nodes() {
    let mut arena = Arena::new(ArenaConfig::for_language(Language::Cpp));
    arena.enable_reverse_edges(EdgeSelector::all()).unwrap();

    let methods = create_call_chain(&mut arena, 100, 340).unwrap();
    assert!(arena.node_count() > 100_000);

    // drop every tenth class, then refill the holes
    let doomed: Vec<NodeId> = methods
        .iter()
        .step_by(10)
        .map(|m| arena.get_ref(*m).unwrap().parent().unwrap())
        .collect();
    for class in &doomed {
        arena.destroy_node(*class).unwrap();
    }
    let count = arena.node_count();

    let mut buffer = Vec::new();
    arena
        .save_to(&mut buffer, &[], SaveOptions::compressed())
        .unwrap();
    let mut loaded = Arena::new(ArenaConfig::for_language(Language::Cpp));
    loaded.load_from(&mut buffer.as_slice(), &mut []).unwrap();

    assert_eq!(loaded.node_count(), count);
    assert_eq!(
        loaded.free_ids().collect::<Vec<_>>(),
        arena_holes(&loaded)
    );
    let first_hole = loaded.free_ids().next().unwrap();
    assert_eq!(loaded.create_node(NodeKind::Class).unwrap(), first_hole);
}

fn arena_holes(arena: &Arena) -> Vec<NodeId> {
    (asgraph::RESERVED_IDS..arena.len() as NodeId)
        .filter(|id| !arena.get_exist(*id))
        .collect()
}
