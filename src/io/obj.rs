//! Wavefront OBJ + MTL export.
//!
//! Output layout: `mtllib`, then every `v`, `vn` and `vt` record, then one
//! `usemtl` group per material with its `f` records. Positions are merged by
//! exact coordinates and UVs by exact value; each node contributes a single
//! flat normal. Indices are 1-based in first-seen order of the list walk.
//!
//! Untagged nodes land in the `default` material. A node textured through
//! [`Model::add_texture`] uses its image path as material name and gets a
//! `map_Kd` entry; every other material gets a flat `Kd` color from
//! [`ObjOptions`].

use super::write_file;
use crate::errors::ModelResult;
use crate::float_types::Real;
use crate::graph::{Model, NodeId};
use crate::vertex::position_key;
use hashbrown::HashMap;
use nalgebra::{Point2, Point3, Vector3};
use std::path::Path;
use tracing::{debug, instrument};

/// Material name used for untagged nodes.
pub const DEFAULT_MATERIAL: &str = "default";

/// Export knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjOptions {
    /// Flat diffuse color per tag.
    pub palette: HashMap<String, [Real; 3]>,
    /// Diffuse color of tags missing from the palette.
    pub default_color: [Real; 3],
    /// Decimal places of every written number.
    pub precision: usize,
}

impl Default for ObjOptions {
    fn default() -> Self {
        ObjOptions {
            palette: HashMap::new(),
            default_color: [1.0, 1.0, 1.0],
            precision: 6,
        }
    }
}

impl ObjOptions {
    pub fn with_color(mut self, tag: impl Into<String>, rgb: [Real; 3]) -> Self {
        self.palette.insert(tag.into(), rgb);
        self
    }

    fn color(&self, tag: &str) -> [Real; 3] {
        self.palette.get(tag).copied().unwrap_or(self.default_color)
    }
}

/// A rendered OBJ file and its material library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjDocument {
    pub obj: String,
    pub mtl: String,
}

#[derive(Debug, Clone, Copy)]
struct Corner {
    v: usize,
    vt: Option<usize>,
    vn: usize,
}

#[derive(Debug)]
struct Group {
    material: String,
    texture: bool,
    faces: Vec<[Corner; 3]>,
}

#[derive(Debug, Default)]
struct ObjBuffers {
    positions: Vec<Point3<Real>>,
    normals: Vec<Vector3<Real>>,
    uvs: Vec<Point2<Real>>,
    groups: Vec<Group>,
}

fn uv_key(uv: &Point2<Real>) -> [u64; 2] {
    [(uv.x + 0.0).to_bits(), (uv.y + 0.0).to_bits()]
}

fn build_obj_buffers(model: &Model, root: NodeId) -> ModelResult<ObjBuffers> {
    let mut buffers = ObjBuffers::default();
    let mut position_index: HashMap<[u64; 3], usize> = HashMap::new();
    let mut uv_index: HashMap<[u64; 2], usize> = HashMap::new();
    let mut group_index: HashMap<String, usize> = HashMap::new();

    for id in model.nodes(root)? {
        let triangles = model.triangulate_node(id)?;
        let Some(first) = triangles.first() else {
            continue;
        };
        buffers.normals.push(first.normal);
        let vn = buffers.normals.len();

        let node = model.node(id)?;
        let material = if node.is_tagged() {
            node.tag.as_str()
        } else {
            DEFAULT_MATERIAL
        };
        let group = *group_index.entry(material.to_string()).or_insert_with(|| {
            buffers.groups.push(Group {
                material: material.to_string(),
                texture: node.image_texture,
                faces: Vec::new(),
            });
            buffers.groups.len() - 1
        });
        buffers.groups[group].texture |= node.image_texture;

        for tri in &triangles {
            let textured = node.image_texture && tri.vertices.iter().all(|v| v.uv.is_some());
            let corners = tri.vertices.each_ref().map(|vertex| {
                let next = position_index.len() + 1;
                let v = *position_index.entry(position_key(&vertex.pos)).or_insert_with(|| {
                    buffers.positions.push(vertex.pos);
                    next
                });
                let vt = vertex.uv.filter(|_| textured).map(|uv| {
                    let next = uv_index.len() + 1;
                    *uv_index.entry(uv_key(&uv)).or_insert_with(|| {
                        buffers.uvs.push(uv);
                        next
                    })
                });
                Corner { v, vt, vn }
            });
            buffers.groups[group].faces.push(corners);
        }
    }
    Ok(buffers)
}

fn render_obj(buffers: &ObjBuffers, mtl_name: &str, precision: usize) -> String {
    let p = precision;
    let mut out = String::new();
    out.push_str(&format!("mtllib {mtl_name}\n"));
    for v in &buffers.positions {
        out.push_str(&format!("v {:.p$} {:.p$} {:.p$}\n", v.x, v.y, v.z));
    }
    for n in &buffers.normals {
        out.push_str(&format!("vn {:.p$} {:.p$} {:.p$}\n", n.x, n.y, n.z));
    }
    for uv in &buffers.uvs {
        out.push_str(&format!("vt {:.p$} {:.p$}\n", uv.x, uv.y));
    }
    for group in &buffers.groups {
        out.push_str(&format!("usemtl {}\n", group.material));
        for face in &group.faces {
            out.push('f');
            for c in face {
                match c.vt {
                    Some(vt) => out.push_str(&format!(" {}/{}/{}", c.v, vt, c.vn)),
                    None => out.push_str(&format!(" {}//{}", c.v, c.vn)),
                }
            }
            out.push('\n');
        }
    }
    out
}

fn render_mtl(buffers: &ObjBuffers, options: &ObjOptions) -> String {
    let p = options.precision;
    let mut out = String::new();
    for group in &buffers.groups {
        out.push_str(&format!("newmtl {}\n", group.material));
        if group.texture {
            out.push_str(&format!("map_Kd {}\n", group.material));
        } else {
            let [r, g, b] = options.color(&group.material);
            out.push_str(&format!("Kd {r:.p$} {g:.p$} {b:.p$}\n"));
        }
    }
    out
}

impl Model {
    /// Render the list `root` belongs to as OBJ text plus its MTL library,
    /// referenced from the OBJ as `mtl_name`.
    #[instrument(skip(self, options))]
    pub fn to_obj(&self, root: NodeId, mtl_name: &str, options: &ObjOptions) -> ModelResult<ObjDocument> {
        let buffers = build_obj_buffers(self, root)?;
        debug!(
            positions = buffers.positions.len(),
            normals = buffers.normals.len(),
            uvs = buffers.uvs.len(),
            materials = buffers.groups.len(),
            "rendered obj"
        );
        Ok(ObjDocument {
            obj: render_obj(&buffers, mtl_name, options.precision),
            mtl: render_mtl(&buffers, options),
        })
    }

    /// Write `path` and a material library next to it (same stem, `.mtl`).
    pub fn generate(&self, root: NodeId, path: impl AsRef<Path>, options: &ObjOptions) -> ModelResult<()> {
        let path = path.as_ref();
        let mtl_path = path.with_extension("mtl");
        let mtl_name = mtl_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "materials.mtl".to_string());
        let doc = self.to_obj(root, &mtl_name, options)?;
        write_file(path, doc.obj.as_bytes())?;
        write_file(&mtl_path, doc.mtl.as_bytes())
    }
}
