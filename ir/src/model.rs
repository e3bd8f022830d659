use std::{f32, path::PathBuf};

use cgmath::{AbsDiffEq, Rad};
use collada::{
    effect::EffectColorTexture, geometry::Geometry, triangles::Triangles, Collada, Vector3,
    Vector4, SEMANTIC_VERTEX,
};
use kdtree::{distance::squared_euclidean, KdTree};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::{error::BakeError, geometry::BoundingBox3};

pub const DEFAULT_SMOOTHING_ANGLE: Rad<f32> = Rad(f32::consts::FRAC_PI_6);

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VertexBuffer(pub Vec<f32>);

impl VertexBuffer {
    pub fn len(&self) -> usize {
        self.0.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: u32) -> Option<Vector3> {
        let start = index as usize * 3;
        match self.0.get(start..start + 3) {
            Some(v) => Some(Vector3::new(v[0], v[1], v[2])),
            None => None,
        }
    }
}

/// Collects unique vectors, merging any that lie within epsilon of one
/// already added.
pub struct VertexBufferBuilder {
    vertices: Vec<Vector3>,
    index_table: KdTree<f32, u32, [f32; 3]>,
    current_index: u32,
}

impl Default for VertexBufferBuilder {
    fn default() -> Self {
        Self {
            vertices: Default::default(),
            index_table: KdTree::new(3),
            current_index: 0,
        }
    }
}

impl VertexBufferBuilder {
    pub fn add(&mut self, vertex: Vector3) -> Result<u32, BakeError> {
        let vertex_ref: &[f32; 3] = vertex.as_ref();
        if vertex_ref.iter().any(|v| !v.is_finite()) {
            return Err(BakeError::NonFiniteVertex(*vertex_ref));
        }

        if let Ok(entries) = self.index_table.nearest(vertex_ref, 1, &squared_euclidean) {
            if let Some((dist, index)) = entries.first() {
                if dist < &f32::default_epsilon() {
                    return Ok(**index);
                }
            }
        }

        let index = self.current_index;
        match self.index_table.add(*vertex_ref, index) {
            Ok(_) => {
                self.vertices.push(vertex);
                self.current_index += 1;
                Ok(index)
            }
            Err(_) => Err(BakeError::NonFiniteVertex(*vertex_ref)),
        }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn build(self) -> VertexBuffer {
        let mut result = Vec::with_capacity(self.vertices.len() * 3);
        for vertex in self.vertices.iter() {
            let vertex: &[f32; 3] = vertex.as_ref();
            result.extend(vertex);
        }
        VertexBuffer(result)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Diffuse {
    Color(Vector4),
    Texture(PathBuf),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMaterial {
    pub material: Option<String>,
    pub diffuse: Option<Diffuse>,
}

impl From<&Triangles> for SurfaceMaterial {
    fn from(surface: &Triangles) -> SurfaceMaterial {
        let material = match surface.material() {
            Some(v) => v,
            None => return SurfaceMaterial::default(),
        };

        let diffuse = match &material.effect().diffuse {
            Some(EffectColorTexture::Color(c)) => Some(Diffuse::Color(*c)),
            Some(EffectColorTexture::Texture { texture, .. }) => {
                Some(Diffuse::Texture(texture.image().filename().to_path_buf()))
            }
            None => None,
        };

        SurfaceMaterial {
            material: Some(material.id().to_string()),
            diffuse,
        }
    }
}

/// One surface of a baked model. Every corner has a vertex index, a normal
/// index and two texture coordinates.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SurfaceBuffer {
    pub name: String,
    pub material: SurfaceMaterial,
    pub vertex_indices: Vec<u32>,
    pub normal_indices: Vec<u32>,
    pub texcoords: Vec<f32>,
}

impl SurfaceBuffer {
    pub fn len(&self) -> usize {
        self.vertex_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_indices.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        self.vertex_indices.len() == self.normal_indices.len()
            && self.vertex_indices.len() * 2 == self.texcoords.len()
    }

    pub fn add(
        &mut self,
        vertex_buffer: &mut VertexBufferBuilder,
        vertex: Vector3,
        normal: Vector3,
    ) -> Result<(), BakeError> {
        self.vertex_indices.push(vertex_buffer.add(vertex)?);
        self.normal_indices.push(vertex_buffer.add(normal)?);
        Ok(())
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub id: String,
    pub name: String,
    pub version: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Model {
    pub metadata: ModelMetadata,
    pub vertex_buffer: VertexBuffer,
    pub surfaces: Vec<SurfaceBuffer>,
    pub bounding_box: Option<BoundingBox3>,
}

impl Model {
    pub fn triangle_count(&self) -> usize {
        self.surfaces.iter().map(|s| s.len() / 3).sum()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct BakeOptions {
    pub smoothing_angle: Rad<f32>,
}

impl Default for BakeOptions {
    fn default() -> Self {
        BakeOptions {
            smoothing_angle: DEFAULT_SMOOTHING_ANGLE,
        }
    }
}

fn vectors(buffer: &[f32]) -> impl Iterator<Item = Vector3> + '_ {
    buffer
        .chunks_exact(3)
        .map(|v| Vector3::new(v[0], v[1], v[2]))
}

/// Flattens the mesh of `geometry` into an indexed model. Surfaces that
/// carry no vertex positions are left out.
pub fn bake_geometry(geometry: &Geometry, options: &BakeOptions) -> Result<Model, BakeError> {
    let mesh = geometry.mesh();

    let (normals, _) = mesh.normals_of(SEMANTIC_VERTEX, options.smoothing_angle)?;
    let (positions, surfaces) = mesh.vertices_of(SEMANTIC_VERTEX)?;
    let (texcoords, _) = mesh.texcoords_of(SEMANTIC_VERTEX)?;

    let mut builder = VertexBufferBuilder::default();
    let mut buffers = Vec::new();
    let mut bounding_box: Option<BoundingBox3> = None;
    let mut corner = 0;

    for surface in surfaces.into_iter().flatten() {
        let corners = surface.count() * 3;
        let range = corner..corner + corners;
        corner += corners;

        if corners == 0 {
            trace!("Skipping empty surface {:?}", surface.name());
            continue;
        }

        let mut buffer = SurfaceBuffer {
            name: surface.name().to_string(),
            material: SurfaceMaterial::from(surface),
            texcoords: texcoords[range.start * 2..range.end * 2].to_vec(),
            ..Default::default()
        };

        let surface_positions = &positions[range.start * 3..range.end * 3];
        let surface_normals = &normals[range.start * 3..range.end * 3];
        for (vertex, normal) in vectors(surface_positions).zip(vectors(surface_normals)) {
            match bounding_box {
                Some(ref mut bb) => bb.update_point(&vertex),
                None => bounding_box = Some(BoundingBox3::new(&vertex, &vertex)),
            }
            buffer.add(&mut builder, vertex, normal)?;
        }

        buffers.push(buffer);
    }

    debug!(
        "Baked geometry {}: {} surfaces, {} unique vectors",
        geometry.id(),
        buffers.len(),
        builder.len()
    );

    Ok(Model {
        metadata: ModelMetadata {
            id: geometry.id().to_string(),
            name: geometry.name().to_string(),
            version: String::new(),
        },
        vertex_buffer: builder.build(),
        surfaces: buffers,
        bounding_box,
    })
}

/// Bakes every geometry of a document in library order.
pub fn bake_document(document: &Collada, options: &BakeOptions) -> Result<Vec<Model>, BakeError> {
    document
        .geometries()
        .iter()
        .map(|geometry| {
            let mut model = bake_geometry(geometry, options)?;
            model.metadata.version = document.version().to_string();
            Ok(model)
        })
        .collect()
}
