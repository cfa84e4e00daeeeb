//! A box house with one window fitted into each wall, written to `obj/house.obj`.

use polyforge::face::Face2D;
use polyforge::graph::{ExtrudeTags, Model};
use polyforge::io::obj::ObjOptions;
use polyforge::vertex::Axis;
use polyforge::ModelResult;

fn main() -> ModelResult<()> {
    let (w, d, h) = (1.0, 1.0, 1.0);
    let sides = ["front", "right", "back", "left"];

    // window pane in the unit frame of each wall
    let pane = Face2D::rectangle(w / 4.0, d / 4.0, w / 2.0, d / 2.0);

    let mut model = Model::new();
    let bottom = model.add_node(Face2D::square(w, d).to_3d_fixed(Axis::X), Vec::new())?;
    let tags = ExtrudeTags::new().with_cap("top").with_sides(sides);
    let top = model.extrude(bottom, h, &tags)?;
    for tag in sides {
        if let Some(wall) = model.get(bottom, tag)? {
            model.add_holes(wall, &[pane.clone()])?;
        }
    }
    model.flip(top)?;

    let options = ObjOptions::default()
        .with_color("top", [0.6, 0.2, 0.2])
        .with_color("front", [0.9, 0.9, 0.8]);
    model.generate(bottom, "obj/house.obj", &options)?;
    println!("wrote obj/house.obj ({} nodes)", model.nodes(bottom)?.len());
    Ok(())
}
