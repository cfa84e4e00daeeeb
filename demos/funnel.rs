//! A funnel grown ring by ring with `extrude_loop`, written to `obj/funnel.obj`.

use polyforge::face::Face2D;
use polyforge::graph::{ExtrudeTags, Model};
use polyforge::io::obj::ObjOptions;
use polyforge::vertex::Axis;
use polyforge::ModelResult;

fn main() -> ModelResult<()> {
    let (w, d, h) = (0.5, 0.5, 0.5);
    let funnel_perc = 0.8;

    let outer = Face2D::circle(w, d, 10)?;
    let mut inner = Face2D::circle(w * funnel_perc, d * funnel_perc, 10)?;
    inner.translate(w * (1.0 - funnel_perc) / 2.0, d * (1.0 - funnel_perc) / 2.0);

    let mut model = Model::new();
    let base = model.add_node(outer.to_3d_fixed(Axis::X), vec![inner.to_3d_fixed(Axis::X)])?;

    // widen the frontier before every extrusion; the first ring keeps its floor
    let top = model.extrude_loop(
        base,
        4,
        |i, model, frontier| {
            if i < 4 {
                model.mul_2d(frontier, 1.34_f64.powi(i as i32))?;
            }
            Ok(h)
        },
        &ExtrudeTags::default(),
    )?;
    model.flip(top)?;
    model.center(base)?;

    model.generate(base, "obj/funnel.obj", &ObjOptions::default())?;
    println!("wrote obj/funnel.obj ({} nodes)", model.nodes(base)?.len());
    Ok(())
}
