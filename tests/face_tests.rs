mod support;

use approx::assert_relative_eq;
use nalgebra::Point3;
use polyforge::{
    errors::ModelError,
    face::{Face2D, Face3D},
    vertex::{Axis, Vertex2D},
};

use crate::support::approx_eq;

fn tilted_wall() -> Face3D {
    Face3D::from_points(&[
        [0.0, 0.0, 0.0],
        [3.0, 0.0, 1.0],
        [3.0, 2.0, 1.0],
        [0.0, 2.0, 0.0],
    ])
    .unwrap()
}

#[test]
fn flattening_keeps_lengths_and_winding() {
    let wall = tilted_wall();
    let flat = wall.to_2d().unwrap();
    assert_relative_eq!(flat.vertices[0].pos.coords.norm(), 0.0);
    assert_relative_eq!(flat.vertices[1].pos.coords.norm(), 10.0_f64.sqrt(), epsilon = 1e-12);
    assert!(flat.signed_area() > 0.0);

    let back = flat.to_3d_projected().unwrap();
    for (a, b) in wall.vertices.iter().zip(&back.vertices) {
        assert_relative_eq!(a.pos, b.pos, epsilon = 1e-12);
    }
}

#[test]
fn flip_twice_restores_the_loop() {
    let mut face = Face2D::circle(3.0, 1.0, 7).unwrap();
    let original = face.clone();
    face.flip();
    assert!(face.signed_area() < 0.0);
    face.flip();
    assert_eq!(face, original);
}

#[test]
fn hole_fit_lands_on_the_outer_plane() {
    let wall = tilted_wall();
    let n = wall.normal().unwrap();
    let d = wall.vertices[0].pos.coords.dot(&n);

    let mut hole = Face2D::rectangle(0.25, 0.25, 0.5, 0.5);
    hole.fit_3d(&wall).unwrap();
    assert!(hole.perc_shape.is_some());
    let lifted = hole.to_3d_projected().unwrap();
    for v in &lifted.vertices {
        assert!(approx_eq(v.pos.coords.dot(&n), d, 1e-9));
    }
    assert_relative_eq!(lifted.centroid(), wall.centroid(), epsilon = 1e-9);
}

#[test]
fn fitting_into_a_collinear_outer_fails() {
    let outer = Face2D::from_points(&[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]]).unwrap();
    let mut hole = Face2D::rectangle(0.25, 0.25, 0.5, 0.5);
    let before = hole.clone();
    assert!(matches!(hole.fit_2d(&outer), Err(ModelError::FitFailed(_))));
    assert_eq!(hole, before);
}

#[test]
fn lifting_an_authored_face_needs_a_projection() {
    let footprint = Face2D::square(1.0, 1.0);
    assert!(matches!(
        footprint.to_3d_projected(),
        Err(ModelError::MissingProjectionContext)
    ));
}

#[test]
fn circles_are_inscribed_in_their_box() {
    let hexagon = Face2D::circle(2.0, 2.0, 6).unwrap();
    let (min, max) = hexagon.min_max();
    assert_relative_eq!(max.x, 2.0);
    assert_relative_eq!(min.x, 0.0);
    assert_relative_eq!(hexagon.centroid().coords, nalgebra::Vector2::new(1.0, 1.0), epsilon = 1e-12);
    assert!(matches!(Face2D::circle(1.0, 1.0, 2), Err(ModelError::InvalidGeometry(_))));
}

#[test]
fn ground_footprints_face_down() {
    let base = Face2D::square(2.0, 1.0).to_3d_fixed(Axis::X);
    assert_relative_eq!(base.normal().unwrap(), nalgebra::Vector3::new(0.0, -1.0, 0.0), epsilon = 1e-12);
    assert_eq!(base.vertices[2].pos, Point3::new(2.0, 0.0, 1.0));
}

#[test]
fn explicit_uvs_must_match_vertex_count() {
    let mut wall = tilted_wall();
    let uvs = [Vertex2D::new(0.0, 0.0), Vertex2D::new(1.0, 0.0)];
    assert!(matches!(
        wall.add_texture(Some(&uvs)),
        Err(ModelError::InvalidGeometry(_))
    ));
    assert!(wall.vertices.iter().all(|v| v.uv.is_none()));
}
