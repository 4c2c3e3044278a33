//! Unit tests for the per-node filter and its file format.

use asgraph::{Arena, AsgError, EdgeKind, FilterState, NodeId, NodeKind, ROOT_PACKAGE_ID};
use tempfile::TempDir;

// package -> class -> method
fn create_chain(arena: &mut Arena) -> asgraph::Result<(NodeId, NodeId, NodeId)> {
    let package = arena.create_node(NodeKind::Package)?;
    arena.add_edge(ROOT_PACKAGE_ID, EdgeKind::ScopeHasMember, package)?;
    let class = arena.create_node(NodeKind::Class)?;
    arena.add_edge(package, EdgeKind::ScopeHasMember, class)?;
    let method = arena.create_node(NodeKind::Method)?;
    arena.add_edge(class, EdgeKind::ScopeHasMember, method)?;
    Ok((package, class, method))
}

#[test]
fn test_new_nodes_are_not_filtered() {
    let mut arena = Arena::default();
    let (package, class, method) = create_chain(&mut arena).unwrap();

    for id in [package, class, method] {
        assert!(!arena.is_filtered(id));
        assert_eq!(arena.filter().state(id), FilterState::NotFiltered);
    }
    assert!(arena.filter().is_on());
}

#[test]
fn test_switch_overrides_every_state() {
    let mut arena = Arena::default();
    let (package, class, method) = create_chain(&mut arena).unwrap();
    arena.set_filtered(package).unwrap();
    arena.set_filtered_this_node_only(method).unwrap();

    arena.turn_filter_off();
    for id in [package, class, method] {
        assert!(!arena.is_filtered(id));
    }

    arena.turn_filter_on();
    assert!(arena.is_filtered(package));
    assert!(!arena.is_filtered(class));
    assert!(arena.is_filtered(method));
    assert_eq!(arena.filter().state(method), FilterState::FilteredThisNodeOnly);
}

#[test]
fn test_off_guard_restores_switch() {
    let mut arena = Arena::default();
    let (package, _, _) = create_chain(&mut arena).unwrap();
    arena.set_filtered(package).unwrap();

    {
        let _guard = arena.filter_off_guard();
        assert!(!arena.is_filtered(package));
    }
    assert!(arena.is_filtered(package));

    arena.turn_filter_off();
    {
        let _guard = arena.filter_off_guard();
    }
    assert!(!arena.filter().is_on());
}

#[test]
fn test_single_entry_operations_leave_neighbours() {
    let mut arena = Arena::default();
    let (package, class, method) = create_chain(&mut arena).unwrap();

    arena.set_filtered(class).unwrap();
    assert!(!arena.is_filtered(package));
    assert!(!arena.is_filtered(method));

    arena.set_not_filtered_this_node_only(class).unwrap();
    assert_eq!(arena.filter().filtered_count(), 0);
}

#[test]
fn test_missing_node_cannot_be_filtered() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("own.flt");

    let mut arena = Arena::default();
    let (_, class, _) = create_chain(&mut arena).unwrap();
    let beyond = arena.len() as NodeId + 5000;

    assert!(matches!(
        arena.set_filtered(beyond),
        Err(AsgError::InvalidNodeId { id }) if id == beyond
    ));
    assert!(arena.set_filtered_this_node_only(beyond).is_err());
    assert!(arena.set_not_filtered(beyond).is_err());
    assert!(arena.filter().len() <= arena.len());

    // the arena can always read back its own filter
    arena.set_filtered(class).unwrap();
    arena.save_filter(&path).unwrap();
    arena.load_filter(&path).unwrap();
    assert!(arena.is_filtered(class));
}

#[test]
fn test_filter_subtree_and_unfilter_with_ancestors() {
    let mut arena = Arena::default();
    let (package, class, method) = create_chain(&mut arena).unwrap();

    arena.filter_subtree(package).unwrap();
    for id in [package, class, method] {
        assert!(arena.is_filtered(id));
    }
    assert!(!arena.is_filtered(ROOT_PACKAGE_ID));

    arena.set_filtered(ROOT_PACKAGE_ID).unwrap();
    arena.unfilter_with_ancestors(class).unwrap();
    for id in [ROOT_PACKAGE_ID, package, class, method] {
        assert!(!arena.is_filtered(id));
    }
}

#[test]
fn test_destroyed_node_is_unfiltered() {
    let mut arena = Arena::default();
    arena
        .enable_reverse_edges(asgraph::EdgeSelector::all())
        .unwrap();
    let (_, _, method) = create_chain(&mut arena).unwrap();
    arena.set_filtered(method).unwrap();

    arena.destroy_node(method).unwrap();
    assert_eq!(arena.filter().state(method), FilterState::NotFiltered);
}

#[test]
fn test_filter_file_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("model.flt");

    let mut arena = Arena::default();
    let (package, class, method) = create_chain(&mut arena).unwrap();
    arena.set_filtered(class).unwrap();
    arena.set_filtered_this_node_only(method).unwrap();
    arena.save_filter(&path).unwrap();

    arena.clear_filter();
    assert_eq!(arena.filter().filtered_count(), 0);

    arena.load_filter(&path).unwrap();
    assert_eq!(arena.filter().state(package), FilterState::NotFiltered);
    assert_eq!(arena.filter().state(class), FilterState::Filtered);
    assert_eq!(arena.filter().state(method), FilterState::FilteredThisNodeOnly);
}

#[test]
fn test_longer_filter_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("big.flt");

    let mut big = Arena::default();
    create_chain(&mut big).unwrap();
    create_chain(&mut big).unwrap();
    big.save_filter(&path).unwrap();

    let mut small = Arena::default();
    let (_, class, _) = create_chain(&mut small).unwrap();
    small.set_filtered(class).unwrap();

    let err = small.load_filter(&path).unwrap_err();
    assert!(matches!(err, AsgError::FilterMismatch { .. }));
    assert!(small.is_filtered(class));
}

#[test]
fn test_shorter_filter_is_padded() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("small.flt");

    let mut small = Arena::default();
    let (_, class, _) = create_chain(&mut small).unwrap();
    small.set_filtered(class).unwrap();
    small.save_filter(&path).unwrap();

    let mut big = Arena::default();
    create_chain(&mut big).unwrap();
    let (_, _, last) = create_chain(&mut big).unwrap();
    big.set_filtered(last).unwrap();

    big.load_filter(&path).unwrap();
    assert!(big.is_filtered(class));
    assert!(!big.is_filtered(last));
    assert_eq!(big.filter().len(), big.len());
}

#[test]
fn test_bad_filter_tag() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("garbage.flt");
    std::fs::write(&path, b"XYZ\0\0\0\0").unwrap();

    let mut arena = Arena::default();
    assert!(matches!(
        arena.load_filter(&path),
        Err(AsgError::BadTag { .. })
    ));
}
