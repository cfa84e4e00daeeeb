//! 2D footprints as `Face2D`s
//!
//! Every shape is wound counter-clockwise in its own XY frame. Lifted with
//! [`Face2D::to_3d_fixed`] onto the ground plane (`Axis::X`) that winding faces
//! down, which is what a base meant to be extruded upwards wants.

use crate::errors::{ModelError, ModelResult};
use crate::face::Face2D;
use crate::float_types::{Real, TAU};
use crate::vertex::Vertex2D;

impl Face2D {
    /// Creates an axis-aligned rectangle with one corner at the origin.
    ///
    /// # Parameters
    ///
    /// - `width`: extent along x
    /// - `depth`: extent along y
    ///
    /// # Example
    /// ```
    /// use polyforge::face::Face2D;
    /// let base = Face2D::square(2.0, 3.0);
    /// assert_eq!(base.vertices.len(), 4);
    /// ```
    pub fn square(width: Real, depth: Real) -> Self {
        Self::rectangle(0.0, 0.0, width, depth)
    }

    /// Creates an axis-aligned rectangle with its minimum corner at `(x, y)`.
    ///
    /// Handy for hole shapes in the unit frame, e.g. a window occupying the
    /// middle third of a wall: `Face2D::rectangle(1.0 / 3.0, 0.25, 1.0 / 3.0, 0.5)`.
    pub fn rectangle(x: Real, y: Real, width: Real, depth: Real) -> Self {
        Face2D::from_vertices_unchecked(vec![
            Vertex2D::new(x, y),
            Vertex2D::new(x + width, y),
            Vertex2D::new(x + width, y + depth),
            Vertex2D::new(x, y + depth),
        ])
    }

    /// Creates a regular N-gon inscribed in the `width` × `height` box whose
    /// minimum corner is the origin.
    ///
    /// Vertex `i` sits at angle `i · τ / resolution`, starting on the +x side.
    ///
    /// # Errors
    /// [`ModelError::InvalidGeometry`] when `resolution < 3`.
    ///
    /// # Example
    /// ```
    /// use polyforge::face::Face2D;
    /// let hexagon = Face2D::circle(2.0, 2.0, 6).unwrap();
    /// assert_eq!(hexagon.vertices.len(), 6);
    /// ```
    pub fn circle(width: Real, height: Real, resolution: usize) -> ModelResult<Self> {
        if resolution < 3 {
            return Err(ModelError::invalid(format!(
                "a circle needs a resolution of at least 3, got {resolution}"
            )));
        }
        let (rx, ry) = (width / 2.0, height / 2.0);
        let vertices = (0..resolution)
            .map(|i| {
                let angle = i as Real * TAU / resolution as Real;
                Vertex2D::new(rx * angle.cos() + rx, ry * angle.sin() + ry)
            })
            .collect();
        Ok(Face2D::from_vertices_unchecked(vertices))
    }
}
