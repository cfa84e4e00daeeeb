// main.rs
//
// Minimal tour of polyforge: each block builds one small model and writes it
// to the obj/ folder (and stl/ when the stl-io feature is on).

use polyforge::face::Face2D;
use polyforge::graph::{ExtrudeTags, Model};
use polyforge::io::obj::ObjOptions;
use polyforge::vertex::Axis;
use polyforge::ModelResult;

fn main() -> ModelResult<()> {
    // writers create obj/ and stl/ on demand
    let options = ObjOptions::default()
        .with_color("roof", [0.55, 0.15, 0.1])
        .with_color("wall", [0.85, 0.8, 0.7])
        .with_color("window", [0.3, 0.5, 0.8]);

    // 1) cube: extrude a floor and flip the cap outward
    let mut model = Model::new();
    let floor = model.add_node(Face2D::square(1.0, 1.0).to_3d_fixed(Axis::X), Vec::new())?;
    model.extrude_flip(floor, 1.0, &ExtrudeTags::default())?;
    model.generate(floor, "obj/cube.obj", &options)?;
    #[cfg(feature = "stl-io")]
    model.save_stl(floor, "stl/cube.stl")?;

    // 2) hexagonal prism grown downwards
    let mut model = Model::new();
    let hex = model.add_node(Face2D::circle(2.0, 2.0, 6)?.to_3d_fixed(Axis::X), Vec::new())?;
    // the cap already faces down; the original footprint is now the top face
    model.extrude(hex, -1.5, &ExtrudeTags::new().with_cap("floor"))?;
    model.flip(hex)?;
    model.generate(hex, "obj/hexagon.obj", &options)?;

    // 3) house: walls with recessed windows and a pyramid roof
    let mut model = Model::new();
    let floor = model.add_node(Face2D::square(4.0, 3.0).to_3d_fixed(Axis::X), Vec::new())?;
    let tags = ExtrudeTags::new()
        .with_cap("roof")
        .with_sides(["wall", "wall", "wall", "wall"]);
    let roof = model.extrude_flip(floor, 2.5, &tags)?;
    let window = Face2D::rectangle(0.3, 0.3, 0.4, 0.35);
    for wall in model.get_all(floor, &["wall"])? {
        model.add_holes(wall, &[window.clone()])?;
        model.extrude_inner(wall, 0.1, &ExtrudeTags::new().with_cap("window"))?;
    }
    model.extrude_point(roof, -1.2, &ExtrudeTags::new().with_sides(["roof"; 4]))?;
    model.center(floor)?;
    model.generate(floor, "obj/house.obj", &options)?;

    // 4) tower: stacked, shrinking floors
    let mut model = Model::new();
    let base = model.add_node(Face2D::square(2.0, 2.0).to_3d_fixed(Axis::X), Vec::new())?;
    let top = model.extrude_loop(
        base,
        5,
        |i, model, frontier| {
            if i > 0 {
                model.mul_2d(frontier, 0.85)?;
            }
            Ok(1.0)
        },
        &ExtrudeTags::new().with_sides(["wall"; 4]),
    )?;
    model.flip(top)?;
    let (nodes, vertices) = model.collect_garbage(base)?;
    println!("tower: dropped {nodes} nodes and {vertices} vertices");
    model.generate(base, "obj/tower.obj", &options)?;

    println!("wrote obj/cube.obj, obj/hexagon.obj, obj/house.obj, obj/tower.obj");
    Ok(())
}
