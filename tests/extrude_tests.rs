mod support;

use nalgebra::Point3;
use polyforge::{
    face::{Face2D, Face3D, Ring},
    graph::{ExtrudeTags, Model},
    vertex::Axis,
};

use crate::support::{all_faces_outward, approx_eq, links_consistent, unit_square_base};

#[test]
fn extrusion_adds_one_side_per_edge_and_a_cap() {
    for sides in [3, 4, 6, 9] {
        let mut model = Model::new();
        let base = Face2D::circle(2.0, 2.0, sides).unwrap().to_3d_fixed(Axis::X);
        let id = model.add_node(base, Vec::new()).unwrap();
        let top = model.extrude(id, 1.0, &ExtrudeTags::default()).unwrap();

        let nodes = model.nodes(id).unwrap();
        assert_eq!(nodes.len(), 1 + sides + 1);
        assert_eq!(nodes.first(), Some(id));
        assert_eq!(model.last(id).unwrap(), top);
        assert!(links_consistent(&model, id));
    }
}

#[test]
fn unit_square_box_has_six_faces_and_outward_walls() {
    let mut model = Model::new();
    let id = model.add_node(unit_square_base(), Vec::new()).unwrap();
    let top = model.extrude(id, 1.0, &ExtrudeTags::default()).unwrap();

    assert_eq!(model.nodes(id).unwrap().len(), 6);
    let cap = model.outer_face(top).unwrap();
    assert!(cap.vertices.iter().all(|v| v.pos.z == 1.0));
    // the cap keeps the base winding, so it still faces -Z
    assert!(approx_eq(model.normal(top).unwrap().z, -1.0, 1e-12));

    model.flip(top).unwrap();
    assert!(all_faces_outward(&model, id));

    let triangles: usize = model
        .nodes(id)
        .unwrap()
        .into_iter()
        .map(|n| model.triangulate_node(n).unwrap().len())
        .sum();
    assert_eq!(triangles, 12);
}

#[test]
fn negative_height_reverses_side_ordering() {
    let mut model = Model::new();
    let hexagon = Face2D::circle(2.0, 2.0, 6).unwrap().to_3d_fixed(Axis::Z);
    let id = model.add_node(hexagon, Vec::new()).unwrap();
    assert!(model.normal(id).unwrap().z > 0.0);

    let top = model.extrude(id, -1.0, &ExtrudeTags::default()).unwrap();
    assert!(model.outer_face(top).unwrap().vertices.iter().all(|v| approx_eq(v.pos.z, 1.0, 1e-12)));

    // side 0 starts on a base vertex instead of a top vertex
    let side = model.node(id).unwrap().next().unwrap();
    let base_first = model.node(id).unwrap().outer.vertices[0];
    assert_eq!(model.node(side).unwrap().outer.vertices[0], base_first);

    model.flip(id).unwrap();
    assert_eq!(model.nodes(id).unwrap().len(), 8);
    assert!(all_faces_outward(&model, id));
}

#[test]
fn zero_height_is_allowed() {
    let mut model = Model::new();
    let id = model.add_node(unit_square_base(), Vec::new()).unwrap();
    let top = model.extrude(id, 0.0, &ExtrudeTags::default()).unwrap();
    assert_eq!(model.outer_face(top).unwrap(), model.outer_face(id).unwrap());
    assert_eq!(model.nodes(id).unwrap().len(), 6);
}

#[test]
fn tags_are_assigned_by_position() {
    let mut model = Model::new();
    let id = model.add_node(unit_square_base(), Vec::new()).unwrap();
    let tags = ExtrudeTags::from(["roof", "front", "", "back"]);
    let top = model.extrude(id, 1.0, &tags).unwrap();

    assert_eq!(model.node(top).unwrap().tag, "roof");
    let sides = model.get_next(id, 4).unwrap();
    let names: Vec<_> = sides.iter().map(|&n| model.node(n).unwrap().tag.clone()).collect();
    assert_eq!(names, ["front", "", "back", ""]);
    assert_eq!(model.get(id, "back").unwrap(), sides.get_index(2));
    assert_eq!(model.get(id, "chimney").unwrap(), None);
}

#[test]
fn extrusion_splices_before_the_old_next() {
    let mut model = Model::new();
    let a = model.add_node(unit_square_base(), Vec::new()).unwrap();
    let mut other = unit_square_base();
    other.translate(5.0, 0.0, 0.0);
    let b = model.add_node(other, Vec::new()).unwrap();
    model.link(&[a, b]).unwrap();

    let top = model.extrude(a, 1.0, &ExtrudeTags::default()).unwrap();
    assert_eq!(model.node(top).unwrap().next(), Some(b));
    assert_eq!(model.node(b).unwrap().prev(), Some(top));
    assert_eq!(model.nodes(a).unwrap().len(), 7);
    assert!(links_consistent(&model, a));
}

fn with_hole(reversed: bool) -> (Model, polyforge::NodeId) {
    let mut model = Model::new();
    let outer = Face3D::from_points(&[
        [0.0, 0.0, 0.0],
        [0.0, 4.0, 0.0],
        [4.0, 4.0, 0.0],
        [4.0, 0.0, 0.0],
    ])
    .unwrap();
    let mut hole = Face3D::from_points(&[
        [1.0, 1.0, 0.0],
        [1.0, 3.0, 0.0],
        [3.0, 3.0, 0.0],
        [3.0, 1.0, 0.0],
    ])
    .unwrap();
    if reversed {
        hole.flip();
    }
    let id = model.add_node(outer, vec![hole]).unwrap();
    (model, id)
}

#[test]
fn hole_walls_face_into_the_opening_for_either_winding() {
    for reversed in [false, true] {
        let (mut model, id) = with_hole(reversed);
        let top = model.extrude(id, 1.0, &ExtrudeTags::default()).unwrap();

        let nodes = model.nodes(id).unwrap();
        assert_eq!(nodes.len(), 1 + 4 + 4 + 1);
        assert_eq!(model.node(top).unwrap().inner.len(), 1);

        for &wall in &nodes.ids()[5..9] {
            let n = model.normal(wall).unwrap();
            let c = model.centroid(wall).unwrap();
            let to_axis = Point3::new(2.0, 2.0, c.z) - c;
            assert!(n.dot(&to_axis) > 0.0, "hole wall faces into the material");
        }
        for &wall in &nodes.ids()[1..5] {
            let n = model.normal(wall).unwrap();
            let c = model.centroid(wall).unwrap();
            let from_axis = c - Point3::new(2.0, 2.0, c.z);
            assert!(n.dot(&from_axis) > 0.0, "outer wall faces inwards");
        }
    }
}

#[test]
fn extrude_outer_ignores_holes() {
    let (mut model, id) = with_hole(false);
    let top = model.extrude_outer(id, 1.0, &ExtrudeTags::default()).unwrap();
    assert_eq!(model.nodes(id).unwrap().len(), 6);
    assert!(model.node(top).unwrap().inner.is_empty());
}

#[test]
fn extrude_inner_caps_face_like_the_outer() {
    for reversed in [false, true] {
        let (mut model, id) = with_hole(reversed);
        let caps = model.extrude_inner(id, 0.5, &ExtrudeTags::new().with_cap("glass")).unwrap();
        assert_eq!(caps.len(), 1);
        let cap = caps.first().unwrap();

        let outer_n = model.normal(id).unwrap();
        assert!(model.normal(cap).unwrap().dot(&outer_n) > 0.99);
        assert_eq!(model.node(cap).unwrap().tag, "glass");
        // recessed away from the outer face's front (-Z), i.e. towards +Z
        assert!(approx_eq(model.centroid(cap).unwrap().z, 0.5, 1e-12));
        assert_eq!(model.nodes(id).unwrap().len(), 1 + 4 + 1);
        assert_eq!(model.node(id).unwrap().inner.len(), 1);
    }
}

#[test]
fn extrude_inner_lists_recesses_in_hole_order() {
    let mut model = Model::new();
    let id = model.add_node(unit_square_base(), Vec::new()).unwrap();
    let left = Face2D::rectangle(0.1, 0.3, 0.3, 0.4);
    let right = Face2D::rectangle(0.6, 0.3, 0.3, 0.4);
    model.add_holes(id, &[left, right]).unwrap();

    let caps = model.extrude_inner(id, 0.25, &ExtrudeTags::new().with_cap("glass")).unwrap();
    assert_eq!(caps.len(), 2);

    // base, then walls and cap of the first hole, then of the second
    let order = model.nodes(id).unwrap().ids().to_vec();
    assert_eq!(order.len(), 1 + 2 * (4 + 1));
    assert_eq!(order[5], caps.ids()[0]);
    assert_eq!(order[10], caps.ids()[1]);
    assert!(links_consistent(&model, id));

    for (i, &cap) in caps.ids().iter().enumerate() {
        let hole = model.ring_face(id, Ring::Inner(i)).unwrap().centroid();
        let c = model.centroid(cap).unwrap();
        assert!(approx_eq(c.x, hole.x, 1e-9));
        assert!(approx_eq(c.y, hole.y, 1e-9));
    }
}

#[test]
fn extrude_drop_unlinks_the_source() {
    let mut model = Model::new();
    let id = model.add_node(unit_square_base(), Vec::new()).unwrap();
    let top = model.extrude_drop(id, 1.0, &ExtrudeTags::default()).unwrap();
    let nodes = model.nodes(top).unwrap();
    assert_eq!(nodes.len(), 5);
    assert!(!nodes.contains(id));
    assert!(model.node(id).unwrap().next().is_none());
}

#[test]
fn extrude_flip_points_the_cap_away() {
    let mut model = Model::new();
    let id = model.add_node(unit_square_base(), Vec::new()).unwrap();
    let top = model.extrude_flip(id, 1.0, &ExtrudeTags::default()).unwrap();
    assert!(approx_eq(model.normal(top).unwrap().z, 1.0, 1e-12));
    assert!(all_faces_outward(&model, id));
}

#[test]
fn extrude_loop_drops_intermediate_frontiers() {
    let mut model = Model::new();
    let id = model.add_node(unit_square_base(), Vec::new()).unwrap();
    let mut calls = Vec::new();
    let top = model
        .extrude_loop(
            id,
            3,
            |i, model, frontier| {
                calls.push(i);
                if i > 0 {
                    model.mul_2d(frontier, 0.5)?;
                }
                Ok(1.0)
            },
            &ExtrudeTags::default(),
        )
        .unwrap();

    assert_eq!(calls, [0, 1, 2, 3]);
    assert_eq!(model.nodes(id).unwrap().len(), 1 + 3 * 4 + 1);
    assert_eq!(model.last(id).unwrap(), top);
    assert!(approx_eq(model.centroid(top).unwrap().z, 3.0, 1e-9));
    assert!(links_consistent(&model, id));
}

#[test]
fn extrude_point_builds_an_outward_pyramid() {
    let mut model = Model::new();
    let id = model.add_node(unit_square_base(), Vec::new()).unwrap();
    let same = model.extrude_point(id, 1.0, &ExtrudeTags::new().with_sides(["slope"; 4])).unwrap();
    assert_eq!(same, id);

    let nodes = model.nodes(id).unwrap();
    assert_eq!(nodes.len(), 5);
    for &tri in &nodes.ids()[1..] {
        assert_eq!(model.node(tri).unwrap().outer.len(), 3);
        assert_eq!(model.node(tri).unwrap().tag, "slope");
    }
    assert!(all_faces_outward(&model, id));

    let apex = model.outer_face(nodes.ids()[1]).unwrap().vertices[0].pos;
    assert_eq!(apex, Point3::new(0.5, 0.5, 1.0));
}
