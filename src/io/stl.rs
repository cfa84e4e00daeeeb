use super::write_file;
use crate::errors::{ModelError, ModelResult};
use crate::graph::{Model, NodeId};
use crate::triangulated::Triangulated3D;
use std::io::Cursor;
use std::path::Path;

/// Export to ASCII STL
/// Render any triangulated shape as an **ASCII STL** string with the given `name`.
///
/// ```rust
/// # use polyforge::face::Face3D;
/// # use polyforge::graph::{ExtrudeTags, Model};
/// # fn main() -> Result<(), polyforge::errors::ModelError> {
/// let mut model = Model::new();
/// let base = Face3D::from_points(&[[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0], [1.0, 0.0, 0.0]])?;
/// let id = model.add_node(base, Vec::new())?;
/// model.extrude_flip(id, 1.0, &ExtrudeTags::default())?;
/// let text = model.to_stl_ascii(id, "box")?;
/// assert!(text.starts_with("solid box"));
/// # Ok(())
/// # }
/// ```
pub fn to_stl_ascii<T: Triangulated3D>(shape: &T, name: &str) -> ModelResult<String> {
    let mut out = String::new();
    out.push_str(&format!("solid {name}\n"));

    shape.visit_triangles(|tri| {
        let n = tri.normal;
        out.push_str(&format!(
            "  facet normal {:.6} {:.6} {:.6}\n",
            n.x, n.y, n.z
        ));
        out.push_str("    outer loop\n");
        for v in &tri.vertices {
            let p = v.pos;
            out.push_str(&format!(
                "      vertex {:.6} {:.6} {:.6}\n",
                p.x, p.y, p.z
            ));
        }
        out.push_str("    endloop\n");
        out.push_str("  endfacet\n");
    })?;

    out.push_str(&format!("endsolid {name}\n"));
    Ok(out)
}

/// Export to BINARY STL (returns `Vec<u8>`)
///
/// The `name` only labels a failure; binary STL carries no solid name.
pub fn to_stl_binary<T: Triangulated3D>(shape: &T, name: &str) -> ModelResult<Vec<u8>> {
    use stl_io::{Normal, Triangle, Vertex, write_stl};

    let mut triangles = Vec::<Triangle>::new();

    shape.visit_triangles(|tri| {
        let n = tri.normal;
        triangles.push(Triangle {
            normal: Normal::new([n.x as f32, n.y as f32, n.z as f32]),
            vertices: tri.vertices.each_ref().map(|v| {
                let p = v.pos;
                Vertex::new([p.x as f32, p.y as f32, p.z as f32])
            }),
        });
    })?;

    let mut cursor = Cursor::new(Vec::new());
    write_stl(&mut cursor, triangles.iter()).map_err(|source| ModelError::ExportFailed {
        path: name.into(),
        source,
    })?;
    Ok(cursor.into_inner())
}

impl Model {
    pub fn to_stl_ascii(&self, root: NodeId, name: &str) -> ModelResult<String> {
        self::to_stl_ascii(&self.mesh(root), name)
    }

    pub fn to_stl_binary(&self, root: NodeId, name: &str) -> ModelResult<Vec<u8>> {
        self::to_stl_binary(&self.mesh(root), name)
    }

    /// Write the list `root` belongs to as binary STL.
    pub fn save_stl(&self, root: NodeId, path: impl AsRef<Path>) -> ModelResult<()> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        write_file(path, &self.to_stl_binary(root, &name)?)
    }
}
