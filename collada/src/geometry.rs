use std::sync::Arc;

use xmltree::Element;

use crate::{dom, error::ImportError, material::Material, mesh::Mesh};

#[derive(Clone, Debug)]
pub struct Geometry {
    id: String,
    name: String,
    mesh: Mesh,
}

impl Geometry {
    pub fn new(id: &str, name: &str, mesh: Mesh) -> Geometry {
        Geometry {
            id: id.to_string(),
            name: name.to_string(),
            mesh,
        }
    }

    pub fn parse(element: &Element, materials: &[Arc<Material>]) -> Result<Geometry, ImportError> {
        let id = dom::attribute(element, "id").unwrap_or_default();
        let name = dom::attribute(element, "name").unwrap_or_default();
        let mesh = Mesh::parse(dom::required_child(element, "geometry", "mesh")?, materials)?;

        Ok(Geometry::new(id, name, mesh))
    }

    /// Whether the element describes a shape other than a polygon mesh.
    pub fn is_unsupported_shape(element: &Element) -> bool {
        dom::child(element, "mesh").is_none()
            && (dom::child(element, "convex_mesh").is_some()
                || dom::child(element, "spline").is_some())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }
}
