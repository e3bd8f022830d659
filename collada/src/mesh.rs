use std::sync::Arc;

use cgmath::Rad;
use log::warn;
use xmltree::{Element, XMLNode};

use crate::{
    dom,
    error::ImportError,
    input::Vertices,
    material::Material,
    source::Source,
    triangles::{check_destination, Triangles},
};

/// Surfaces in mesh order; `None` stands for a surface that lacks the
/// requested semantic and so contributed nothing to the destination.
pub type SurfaceList<'a> = Vec<Option<&'a Triangles>>;

#[derive(Clone, Debug)]
pub struct Mesh {
    sources: Vec<Arc<Source>>,
    vertices: Vertices,
    surfaces: Vec<Triangles>,
}

impl Mesh {
    pub fn new(sources: Vec<Arc<Source>>, vertices: Vertices, surfaces: Vec<Triangles>) -> Mesh {
        Mesh {
            sources,
            vertices,
            surfaces,
        }
    }

    pub fn parse(element: &Element, materials: &[Arc<Material>]) -> Result<Mesh, ImportError> {
        let sources = dom::children(element, "source")
            .map(|e| Source::parse(e).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        let vertices = Vertices::parse(
            dom::required_child(element, "mesh", "vertices")?,
            &sources,
        )?;

        let mut surfaces = Vec::new();
        for node in element.children.iter() {
            if let XMLNode::Element(e) = node {
                match e.name.as_str() {
                    "triangles" | "polylist" => {
                        surfaces.push(Triangles::parse(e, &sources, &vertices, materials)?);
                    }
                    "polygons" | "trifans" | "tristrips" => {
                        warn!("Skipping unsupported <{}> primitive", e.name);
                    }
                    _ => (),
                }
            }
        }

        Ok(Mesh::new(sources, vertices, surfaces))
    }

    pub fn sources(&self) -> &[Arc<Source>] {
        &self.sources
    }

    pub fn vertices(&self) -> &Vertices {
        &self.vertices
    }

    pub fn surfaces(&self) -> &[Triangles] {
        &self.surfaces
    }

    /// Faces over all surfaces that declare `semantic`.
    pub fn triangle_count(&self, semantic: &str) -> usize {
        self.surfaces
            .iter()
            .filter(|s| s.has_semantic(semantic))
            .map(|s| s.count())
            .sum()
    }

    /// Floats per record of `semantic`, which must be the same float
    /// width on every surface declaring it.
    fn record_width(&self, semantic: &str) -> Result<usize, ImportError> {
        let mut width = None;
        for input in self.surfaces.iter().filter_map(|s| s.input(semantic)) {
            let source = input.source();
            match (source.array().float_width(), width) {
                (Some(w), None) => width = Some(w),
                (Some(w), Some(first)) if w == first => (),
                _ => {
                    return Err(ImportError::UnsupportedSource(
                        source.id().to_string(),
                        source.array_type().name(),
                    ))
                }
            }
        }
        Ok(width.unwrap_or(1))
    }

    fn fill<'a, F>(
        &'a self,
        dest: &mut [f32],
        stride: usize,
        width: usize,
        semantic: &str,
        mut write: F,
    ) -> Result<SurfaceList<'a>, ImportError>
    where
        F: FnMut(&Triangles, &mut [f32]) -> Result<(), ImportError>,
    {
        let step = check_destination(dest, stride, width, self.triangle_count(semantic) * 3)?;

        let mut surfaces = Vec::with_capacity(self.surfaces.len());
        let mut cursor = 0;
        for surface in self.surfaces.iter() {
            if !surface.has_semantic(semantic) {
                surfaces.push(None);
                continue;
            }

            let start = cursor.min(dest.len());
            write(surface, &mut dest[start..])?;
            cursor += step * surface.count() * 3;
            surfaces.push(Some(surface));
        }

        Ok(surfaces)
    }

    /// Flattens the `semantic` stream of every surface into one buffer.
    ///
    /// `dest` must hold `triangle_count(semantic) * 3` records placed
    /// `stride` floats apart (0 packs them tightly).
    pub fn create_vertices(
        &self,
        dest: &mut [f32],
        stride: usize,
        semantic: &str,
    ) -> Result<SurfaceList, ImportError> {
        let width = self.record_width(semantic)?;
        self.fill(dest, stride, width, semantic, |surface, dest| {
            surface.create_vertices(dest, stride, semantic)
        })
    }

    /// Smoothed normals derived from the positions addressed by `semantic`.
    pub fn create_vertices_normal(
        &self,
        dest: &mut [f32],
        stride: usize,
        semantic: &str,
        smoothing_angle: Rad<f32>,
    ) -> Result<SurfaceList, ImportError> {
        self.fill(dest, stride, 3, semantic, |surface, dest| {
            surface.create_vertices_normal(dest, stride, semantic, smoothing_angle)
        })
    }

    /// Texture coordinates for every surface declaring the position
    /// `semantic`, projected where a surface has no texture coordinates.
    pub fn create_vertices_texcoords(
        &self,
        dest: &mut [f32],
        stride: usize,
        semantic: &str,
    ) -> Result<SurfaceList, ImportError> {
        self.fill(dest, stride, 2, semantic, |surface, dest| {
            surface.create_vertices_texcoords(dest, stride, semantic)
        })
    }

    pub fn vertices_of(&self, semantic: &str) -> Result<(Vec<f32>, SurfaceList), ImportError> {
        let mut dest = vec![0.0; self.triangle_count(semantic) * 3 * self.record_width(semantic)?];
        let surfaces = self.create_vertices(&mut dest, 0, semantic)?;
        Ok((dest, surfaces))
    }

    pub fn normals_of(
        &self,
        semantic: &str,
        smoothing_angle: Rad<f32>,
    ) -> Result<(Vec<f32>, SurfaceList), ImportError> {
        let mut dest = vec![0.0; self.triangle_count(semantic) * 9];
        let surfaces = self.create_vertices_normal(&mut dest, 0, semantic, smoothing_angle)?;
        Ok((dest, surfaces))
    }

    pub fn texcoords_of(&self, semantic: &str) -> Result<(Vec<f32>, SurfaceList), ImportError> {
        let mut dest = vec![0.0; self.triangle_count(semantic) * 6];
        let surfaces = self.create_vertices_texcoords(&mut dest, 0, semantic)?;
        Ok((dest, surfaces))
    }
}
