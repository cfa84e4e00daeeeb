//! Test support library
//! Provides fixtures and geometric checks shared by the integration tests.
#![allow(dead_code)]

use nalgebra::{Point3, Vector3};
use polyforge::{
    face::Face3D,
    float_types::Real,
    graph::{Model, NodeId},
};

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

/// Unit square in the XY plane, wound so its normal is -Z.
pub fn unit_square_base() -> Face3D {
    Face3D::from_points(&[
        [0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [1.0, 1.0, 0.0],
        [1.0, 0.0, 0.0],
    ])
    .unwrap()
}

/// Returns `[min_x, min_y, min_z, max_x, max_y, max_z]` over every vertex of
/// the list `root` belongs to.
pub fn bounding_box(model: &Model, root: NodeId) -> [Real; 6] {
    let mut lo = Point3::new(Real::MAX, Real::MAX, Real::MAX);
    let mut hi = Point3::new(Real::MIN, Real::MIN, Real::MIN);
    let nodes = model.nodes(root).unwrap();
    for v in nodes.unique_vertices(model).unwrap() {
        let p = model.vertex(v).unwrap().pos;
        lo = lo.inf(&p);
        hi = hi.sup(&p);
    }
    [lo.x, lo.y, lo.z, hi.x, hi.y, hi.z]
}

/// Mean of every identity-unique vertex of the list.
pub fn solid_center(model: &Model, root: NodeId) -> Point3<Real> {
    let nodes = model.nodes(root).unwrap();
    let ids = nodes.unique_vertices(model).unwrap();
    let sum = ids
        .iter()
        .fold(Vector3::zeros(), |acc, &v| acc + model.vertex(v).unwrap().pos.coords);
    Point3::from(sum / ids.len() as Real)
}

/// True when every node's normal points away from the center of a convex solid.
pub fn all_faces_outward(model: &Model, root: NodeId) -> bool {
    let center = solid_center(model, root);
    model.nodes(root).unwrap().into_iter().all(|id| {
        let n = model.normal(id).unwrap();
        let c = model.centroid(id).unwrap();
        n.dot(&(c - center)) > 0.0
    })
}

/// `prev`/`next` agree in both directions along the whole list.
pub fn links_consistent(model: &Model, root: NodeId) -> bool {
    let nodes = model.nodes(root).unwrap();
    let ids = nodes.ids();
    ids.windows(2).all(|pair| {
        model.node(pair[0]).unwrap().next() == Some(pair[1])
            && model.node(pair[1]).unwrap().prev() == Some(pair[0])
    }) && model.node(ids[0]).unwrap().prev().is_none()
        && model.node(ids[ids.len() - 1]).unwrap().next().is_none()
}
