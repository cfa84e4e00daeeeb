//! A unit cube with two image-textured faces, written to `obj/textured_cube.obj`.

use polyforge::face::Face2D;
use polyforge::graph::{ExtrudeTags, Model};
use polyforge::io::obj::ObjOptions;
use polyforge::vertex::{Axis, Vertex2D};
use polyforge::ModelResult;

fn main() -> ModelResult<()> {
    let (w, d, h) = (1.0, 1.0, 1.0);

    let mut model = Model::new();
    let bottom = model.add_node(Face2D::square(w, d).to_3d_fixed(Axis::X), Vec::new())?;
    let top = model.extrude_flip(bottom, h, &ExtrudeTags::default())?;

    // either give the texture coordinates explicitly...
    let uvs = [
        Vertex2D::new(0.0, 0.0),
        Vertex2D::new(1.0, 0.0),
        Vertex2D::new(1.0, 1.0),
        Vertex2D::new(0.0, 1.0),
    ];
    model.add_texture(top, "media/apple.png", Some(&uvs))?;
    // ...or let them be derived from the face
    model.add_texture(bottom, "media/banana.png", None)?;

    model.center(bottom)?;

    model.generate(bottom, "obj/textured_cube.obj", &ObjOptions::default())?;
    println!("wrote obj/textured_cube.obj");
    Ok(())
}
