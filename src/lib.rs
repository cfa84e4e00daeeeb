//! Procedural **polygon modeling by extrusion**: build a mesh by growing faces
//! out of other faces, in place, on a graph of shared vertices.
//!
//! A [`Model`] owns every vertex and every node. A node is one planar polygon
//! with holes; nodes are chained into a doubly linked list, and faces that hold
//! the same vertex id move together. Extruding a node splices its side walls and
//! cap right after it, so a whole building can be grown from one footprint and
//! exported with a single walk of the list.
//!
//! ```rust
//! use polyforge::face::Face2D;
//! use polyforge::graph::{ExtrudeTags, Model};
//! use polyforge::io::obj::ObjOptions;
//! use polyforge::vertex::Axis;
//!
//! # fn main() -> Result<(), polyforge::errors::ModelError> {
//! let mut model = Model::new();
//! let footprint = Face2D::square(4.0, 3.0).to_3d_fixed(Axis::X);
//! let floor = model.add_tagged_node("floor", footprint, Vec::new())?;
//! let roof = model.extrude_flip(floor, 2.5, &ExtrudeTags::from(["roof", "wall"]))?;
//! model.extrude_point(roof, -1.0, &ExtrudeTags::default())?;
//! let doc = model.to_obj(floor, "house.mtl", &ObjOptions::default())?;
//! assert!(doc.obj.starts_with("mtllib house.mtl"));
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//! #### Default
//! - [**stl-io**](https://en.wikipedia.org/wiki/STL_(file_format)): `.stl` export next to the
//!   always-available OBJ/MTL writer

#![forbid(unsafe_code)]
#![warn(unused)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod errors;
pub mod face;
pub mod float_types;
pub mod graph;
pub mod io;
pub mod shapes;
pub mod triangulated;
pub mod vertex;

pub use errors::{ModelError, ModelResult};
pub use face::{Face2D, Face3D};
pub use graph::{ExtrudeTags, Model, NodeId, Nodes};
pub use vertex::{Axis, Vertex2D, Vertex3D};
