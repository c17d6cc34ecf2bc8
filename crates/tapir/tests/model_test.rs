//! Hierarchy model construction and the rank-aware adjacency queries.

use tapir::acyclic::remove_cycles;
use tapir::model::{CellKind, HierarchyModel, MIN_CELL_EXTENT};
use tapir::rank::assign_ranks;
use tapir_graph::{CellId, GraphModel, Rect};

fn vertex(graph: &mut GraphModel) -> CellId {
    graph.add_vertex(None, Rect::new(0.0, 0.0, 40.0, 20.0))
}

#[test]
fn build_wraps_vertices_and_merges_parallel_edges() {
    let mut graph = GraphModel::new();
    let a = vertex(&mut graph);
    let b = vertex(&mut graph);
    let e1 = graph.add_edge(None, a, b).unwrap();
    let e2 = graph.add_edge(None, a, b).unwrap();
    let e3 = graph.add_edge(None, b, a).unwrap();

    let model = HierarchyModel::build(&graph, &[a, b], &[e1, e2, e3]);

    assert_eq!(model.node_count(), 2);
    // e1 and e2 share the same ordered pair and collapse into one internal
    // edge; the opposite direction stays separate.
    let edges: Vec<usize> = model.edge_indices().collect();
    assert_eq!(edges.len(), 2);

    let forward = model.cells[edges[0]].as_edge().unwrap();
    assert_eq!(forward.edges, vec![e1, e2]);
    assert_eq!(model.edge_index[&e1], model.edge_index[&e2]);
    assert_ne!(model.edge_index[&e1], model.edge_index[&e3]);

    let a_node = model.cells[model.vertex_index[&a]].as_node().unwrap();
    assert_eq!(a_node.connects_as_source, vec![edges[0]]);
    assert_eq!(a_node.connects_as_target, vec![edges[1]]);
}

#[test]
fn self_loops_are_collected_not_modeled() {
    let mut graph = GraphModel::new();
    let a = vertex(&mut graph);
    let loop_edge = graph.add_edge(None, a, a).unwrap();

    let model = HierarchyModel::build(&graph, &[a], &[loop_edge]);

    assert_eq!(model.self_loops, vec![loop_edge]);
    assert_eq!(model.edge_indices().count(), 0);
}

#[test]
fn edges_into_other_components_are_skipped() {
    let mut graph = GraphModel::new();
    let a = vertex(&mut graph);
    let b = vertex(&mut graph);
    let outside = vertex(&mut graph);
    let inside = graph.add_edge(None, a, b).unwrap();
    let crossing = graph.add_edge(None, a, outside).unwrap();

    let model = HierarchyModel::build(&graph, &[a, b], &[inside, crossing]);

    assert_eq!(model.edge_indices().count(), 1);
    assert!(model.edge_index.contains_key(&inside));
    assert!(!model.edge_index.contains_key(&crossing));
}

#[test]
fn zero_size_vertices_get_a_minimum_extent() {
    let mut graph = GraphModel::new();
    let a = graph.add_vertex(None, Rect::new(0.0, 0.0, 0.0, 0.0));

    let model = HierarchyModel::build(&graph, &[a], &[]);

    let node = model.cells[0].as_node().unwrap();
    assert_eq!(node.width, MIN_CELL_EXTENT);
    assert_eq!(node.height, MIN_CELL_EXTENT);
}

#[test]
fn inverting_twice_restores_the_edge() {
    let mut graph = GraphModel::new();
    let a = vertex(&mut graph);
    let b = vertex(&mut graph);
    let e = graph.add_edge(None, a, b).unwrap();

    let mut model = HierarchyModel::build(&graph, &[a, b], &[e]);
    let edge_idx = model.edge_index[&e];

    model.invert_edge(edge_idx);
    {
        let edge = model.cells[edge_idx].as_edge().unwrap();
        assert!(edge.is_reversed);
        assert_eq!(edge.source, model.vertex_index[&b]);
        assert_eq!(edge.target, model.vertex_index[&a]);
        let a_node = model.cells[model.vertex_index[&a]].as_node().unwrap();
        assert!(a_node.connects_as_source.is_empty());
        assert_eq!(a_node.connects_as_target, vec![edge_idx]);
    }

    model.invert_edge(edge_idx);
    let edge = model.cells[edge_idx].as_edge().unwrap();
    assert!(!edge.is_reversed);
    assert_eq!(edge.source, model.vertex_index[&a]);
    assert_eq!(edge.target, model.vertex_index[&b]);
    let a_node = model.cells[model.vertex_index[&a]].as_node().unwrap();
    assert_eq!(a_node.connects_as_source, vec![edge_idx]);
    assert!(a_node.connects_as_target.is_empty());
}

/// A long edge a -> b next to a chain a -> c -> d -> b, so the edge spans
/// ranks 0..3 with interior ranks 1 and 2.
fn long_edge_model() -> (HierarchyModel, usize) {
    let mut graph = GraphModel::new();
    let a = vertex(&mut graph);
    let b = vertex(&mut graph);
    let c = vertex(&mut graph);
    let d = vertex(&mut graph);
    let e_ab = graph.add_edge(None, a, b).unwrap();
    let e_ac = graph.add_edge(None, a, c).unwrap();
    let e_cd = graph.add_edge(None, c, d).unwrap();
    let e_db = graph.add_edge(None, d, b).unwrap();

    let mut model =
        HierarchyModel::build(&graph, &[a, b, c, d], &[e_ab, e_ac, e_cd, e_db]);
    remove_cycles(&mut model);
    assign_ranks(&mut model);
    let long = model.edge_index[&e_ab];
    (model, long)
}

#[test]
fn long_edge_spans_the_chain_ranks() {
    let (model, long) = long_edge_model();
    assert_eq!(model.cells[long].min_rank, 0);
    assert_eq!(model.cells[long].max_rank, 3);
    // The edge occupies its interior ranks alongside the chain nodes.
    assert!(model.ranks[1].contains(&long));
    assert!(model.ranks[2].contains(&long));
}

#[test]
fn edge_adjacency_walks_toward_its_terminals() {
    let (mut model, long) = long_edge_model();
    let source = model.cells[long].as_edge().unwrap().source;
    let target = model.cells[long].as_edge().unwrap().target;

    // Topmost occupied interior rank connects up to the source node; deeper
    // ranks connect to the edge's own segment above.
    assert_eq!(model.next_layer_connected_cells(long, 1), vec![source]);
    assert_eq!(model.next_layer_connected_cells(long, 2), vec![long]);

    // Bottom-most interior rank connects down to the target node.
    assert_eq!(model.previous_layer_connected_cells(long, 2), vec![target]);
    assert_eq!(model.previous_layer_connected_cells(long, 1), vec![long]);
}

#[test]
fn node_adjacency_sees_edge_segments_for_distant_neighbors() {
    let (mut model, long) = long_edge_model();
    let b = model.cells[long].as_edge().unwrap().target;
    let a = model.cells[long].as_edge().unwrap().source;

    // b's incoming edges: the long edge answers with its rank-2 segment, the
    // chain edge d -> b answers with d itself.
    let d = model.cells[model.ranks[2][0]].core_cell();
    let up = model.next_layer_connected_cells(b, 3);
    assert_eq!(up[0], long);
    assert_eq!(up.len(), 2);
    assert_eq!(model.cells[up[1]].core_cell(), d);

    // a's outgoing edges: the long edge answers with its rank-1 segment, the
    // chain edge a -> c answers with c.
    let c = model.cells[model.ranks[1][0]].core_cell();
    let down = model.previous_layer_connected_cells(a, 0);
    assert_eq!(down[0], long);
    assert_eq!(down.len(), 2);
    assert_eq!(model.cells[down[1]].core_cell(), c);
}

#[test]
fn scratch_slots_index_interior_ranks_independently() {
    let (mut model, long) = long_edge_model();

    assert_eq!(model.cells[long].general_purpose_variable(1), -1);
    assert_eq!(model.cells[long].general_purpose_variable(2), -1);

    model.cells[long].set_general_purpose_variable(1, 7);
    model.cells[long].set_general_purpose_variable(2, 9);
    assert_eq!(model.cells[long].general_purpose_variable(1), 7);
    assert_eq!(model.cells[long].general_purpose_variable(2), 9);
}

#[test]
fn core_cell_is_the_first_wrapped_external_cell() {
    let mut graph = GraphModel::new();
    let a = vertex(&mut graph);
    let b = vertex(&mut graph);
    let e1 = graph.add_edge(None, a, b).unwrap();
    let e2 = graph.add_edge(None, a, b).unwrap();

    let model = HierarchyModel::build(&graph, &[a, b], &[e1, e2]);

    assert_eq!(model.cells[model.vertex_index[&a]].core_cell(), Some(a));
    assert_eq!(model.cells[model.edge_index[&e2]].core_cell(), Some(e1));
    assert!(matches!(
        model.cells[model.edge_index[&e1]].kind,
        CellKind::Edge(_)
    ));
}
