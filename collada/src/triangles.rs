use std::sync::Arc;

use cgmath::{InnerSpace, Rad};
use xmltree::Element;

use crate::{
    dom,
    error::{ImportError, ParseError},
    input::{InputShared, Vertices},
    material::Material,
    parser::parse_tokens,
    source::{Source, SourceArray},
    Vector2, Vector3, SEMANTIC_TEXCOORD,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Picks the axis a face mostly looks along. Ties go to y, then z, then x.
pub fn dominant_axis(normal: Vector3) -> Axis {
    let (x, y, z) = (normal.x.abs(), normal.y.abs(), normal.z.abs());
    if y >= x && y >= z {
        Axis::Y
    } else if z >= x && z >= y {
        Axis::Z
    } else {
        Axis::X
    }
}

fn project(position: Vector3, axis: Axis) -> Vector2 {
    let (u, v) = match axis {
        Axis::X => (position.y, position.z),
        Axis::Y => (position.x, position.z),
        Axis::Z => (position.x, position.y),
    };
    Vector2::new(u * 0.5 + 0.5, v * 0.5 + 0.5)
}

fn face_normal(a: Vector3, b: Vector3, c: Vector3) -> Vector3 {
    let normal = (a - c).cross(b - c);
    if normal.magnitude2() == 0.0 {
        normal
    } else {
        normal.normalize()
    }
}

/// Faces touching each point, packed as `[count, face, face, ...]` runs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PointFaceList {
    pub face_offsets: Vec<usize>,
    pub faces: Vec<usize>,
}

impl PointFaceList {
    /// Faces using `point`; empty for points outside the list.
    pub fn faces_of(&self, point: usize) -> &[usize] {
        let offset = match self.face_offsets.get(point) {
            Some(v) => *v,
            None => return &[],
        };
        let start = offset.saturating_add(1);
        match self.faces.get(offset).and_then(|count| count.checked_add(start)) {
            Some(end) => self.faces.get(start..end).unwrap_or(&[]),
            None => &[],
        }
    }
}

/// Validates a destination buffer for `records` entries of `width` floats
/// placed `stride` floats apart, returning the effective stride.
pub(crate) fn check_destination(
    dest: &[f32],
    stride: usize,
    width: usize,
    records: usize,
) -> Result<usize, ImportError> {
    let step = if stride == 0 { width } else { stride };
    let required = match records {
        0 => 0,
        n => (n - 1) * step + width,
    };

    if dest.len() < required {
        Err(ImportError::DestinationTooSmall {
            required,
            actual: dest.len(),
        })
    } else {
        Ok(step)
    }
}

/// One `<triangles>` or `<polylist>` element: a run of faces sharing a
/// material.
#[derive(Clone, Debug)]
pub struct Triangles {
    name: String,
    count: usize,
    stride: usize,
    material: Option<Arc<Material>>,
    primitive: Vec<u32>,
    inputs: Vec<InputShared>,
}

impl Triangles {
    /// `primitive` must hold `stride * count * 3` indices, where the stride
    /// is one past the largest input offset.
    pub fn new(
        name: &str,
        count: usize,
        material: Option<Arc<Material>>,
        primitive: Vec<u32>,
        inputs: Vec<InputShared>,
    ) -> Triangles {
        let stride = inputs.iter().map(|i| i.offset() + 1).max().unwrap_or(1);
        Triangles {
            name: name.to_string(),
            count,
            stride,
            material,
            primitive,
            inputs,
        }
    }

    pub fn parse(
        element: &Element,
        sources: &[Arc<Source>],
        vertices: &Vertices,
        materials: &[Arc<Material>],
    ) -> Result<Triangles, ImportError> {
        let tag = if element.name == "polylist" {
            "polylist"
        } else {
            "triangles"
        };

        let material = match dom::attribute(element, "material") {
            Some(id) => match materials.iter().find(|m| m.id() == id) {
                Some(m) => Some(Arc::clone(m)),
                None => return Err(ImportError::MaterialNotFound(id.to_string())),
            },
            None => None,
        };

        let count: usize = dom::required_number(element, tag, "count")?;

        let inputs = dom::children(element, "input")
            .map(|e| InputShared::parse(e, sources, vertices))
            .collect::<Result<Vec<_>, _>>()?;

        if tag == "polylist" {
            if let Some(vcount) = dom::child(element, "vcount") {
                let vcount = parse_tokens::<u32>(&dom::text(vcount), count)?;
                if let Some(v) = vcount.iter().find(|v| **v != 3) {
                    return Err(ImportError::NonTriangleFace(*v));
                }
            }
        }

        let mut triangles = Triangles::new(
            dom::attribute(element, "name").unwrap_or_default(),
            count,
            material,
            Vec::new(),
            inputs,
        );

        let text = dom::child(element, "p").map(dom::text).unwrap_or_default();
        let indices = match count
            .checked_mul(3)
            .and_then(|v| v.checked_mul(triangles.stride))
        {
            Some(v) => v,
            None => return Err(ImportError::CountOverflow(tag, count)),
        };
        triangles.primitive = parse_tokens::<u32>(&text, indices)?;

        Ok(triangles)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of faces.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Number of indices per corner in the primitive array.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn material(&self) -> Option<&Arc<Material>> {
        self.material.as_ref()
    }

    pub fn primitive(&self) -> &[u32] {
        &self.primitive
    }

    pub fn inputs(&self) -> &[InputShared] {
        &self.inputs
    }

    pub fn input(&self, semantic: &str) -> Option<&InputShared> {
        self.inputs.iter().find(|i| i.semantic() == semantic)
    }

    pub fn has_semantic(&self, semantic: &str) -> bool {
        self.input(semantic).is_some()
    }

    fn required_input(&self, semantic: &str) -> Result<&InputShared, ImportError> {
        match self.input(semantic) {
            Some(v) => Ok(v),
            None => Err(ImportError::SemanticNotFound(semantic.to_string())),
        }
    }

    /// Source indices of every corner for `input`, in primitive order,
    /// checked against the source length.
    fn corner_indices(&self, input: &InputShared) -> Result<Vec<usize>, ImportError> {
        let source = input.source();
        let len = source.len();

        let expected = self.count.saturating_mul(3).saturating_mul(self.stride);
        if self.primitive.len() < expected {
            return Err(ImportError::Parse(ParseError::MissingTokens {
                expected,
                found: self.primitive.len(),
            }));
        }

        (0..self.count * 3)
            .map(|corner| {
                let index = self.primitive[corner * self.stride + input.offset()];
                if (index as usize) < len {
                    Ok(index as usize)
                } else {
                    Err(ImportError::IndexOutOfRange {
                        source: source.id().to_string(),
                        index,
                        len,
                    })
                }
            })
            .collect()
    }

    fn positions<'a>(
        &'a self,
        semantic: &str,
    ) -> Result<(&'a [Vector3], Vec<usize>), ImportError> {
        let input = self.required_input(semantic)?;
        let source = input.source();
        match source.array() {
            SourceArray::Vec3f(v) => Ok((v.as_slice(), self.corner_indices(input)?)),
            other => Err(ImportError::UnsupportedSource(
                source.id().to_string(),
                other.array_type().name(),
            )),
        }
    }

    /// Writes the records of the `semantic` stream for every corner into
    /// `dest`, `stride` floats apart (0 packs them tightly).
    pub fn create_vertices(
        &self,
        dest: &mut [f32],
        stride: usize,
        semantic: &str,
    ) -> Result<(), ImportError> {
        let input = self.required_input(semantic)?;
        let source = input.source();
        let width = match source.array().float_width() {
            Some(v) => v,
            None => {
                return Err(ImportError::UnsupportedSource(
                    source.id().to_string(),
                    source.array_type().name(),
                ))
            }
        };

        let indices = self.corner_indices(input)?;
        let step = check_destination(dest, stride, width, indices.len())?;

        for (i, index) in indices.into_iter().enumerate() {
            source
                .array()
                .write_float_record(index, &mut dest[i * step..i * step + width]);
        }

        Ok(())
    }

    /// One normal per face, from the positions addressed by `semantic`.
    pub fn calculate_face_normals(&self, semantic: &str) -> Result<Vec<Vector3>, ImportError> {
        let (positions, indices) = self.positions(semantic)?;

        Ok(indices
            .chunks_exact(3)
            .map(|t| face_normal(positions[t[0]], positions[t[1]], positions[t[2]]))
            .collect())
    }

    pub fn generate_point_facelist(
        &self,
        total_points: usize,
        semantic: &str,
    ) -> Result<PointFaceList, ImportError> {
        let input = self.required_input(semantic)?;
        let indices = self.corner_indices(input)?;

        let mut adjacency = vec![Vec::new(); total_points];
        for (face, corners) in indices.chunks_exact(3).enumerate() {
            for (n, point) in corners.iter().enumerate() {
                // A degenerate face lists a repeated point only once.
                if corners[..n].contains(point) {
                    continue;
                }
                if let Some(list) = adjacency.get_mut(*point) {
                    list.push(face);
                }
            }
        }

        let mut result = PointFaceList {
            face_offsets: Vec::with_capacity(total_points),
            faces: Vec::with_capacity(total_points + indices.len()),
        };
        for list in adjacency {
            result.face_offsets.push(result.faces.len());
            result.faces.push(list.len());
            result.faces.extend(list);
        }

        Ok(result)
    }

    /// Smoothed normal of every corner: the corner's own face normal plus
    /// the normals of faces sharing its point whose angle to it is below
    /// `smoothing_angle`, normalized.
    pub fn calculate_point_normals(
        &self,
        semantic: &str,
        smoothing_angle: Rad<f32>,
    ) -> Result<Vec<Vector3>, ImportError> {
        let (positions, indices) = self.positions(semantic)?;
        let face_normals = self.calculate_face_normals(semantic)?;
        let facelist = self.generate_point_facelist(positions.len(), semantic)?;

        Ok(indices
            .iter()
            .enumerate()
            .map(|(corner, point)| {
                let face = corner / 3;
                let base_normal = face_normals[face];
                let mut smoothed_normal = base_normal;

                for other in facelist.faces_of(*point) {
                    if *other == face {
                        continue;
                    }
                    let normal = face_normals[*other];
                    let angle = Rad(base_normal.dot(normal).clamp(-1.0, 1.0).acos());
                    if angle < smoothing_angle {
                        smoothed_normal += normal;
                    }
                }

                if smoothed_normal.magnitude2() == 0.0 {
                    smoothed_normal
                } else {
                    smoothed_normal.normalize()
                }
            })
            .collect())
    }

    pub fn create_vertices_normal(
        &self,
        dest: &mut [f32],
        stride: usize,
        semantic: &str,
        smoothing_angle: Rad<f32>,
    ) -> Result<(), ImportError> {
        let normals = self.calculate_point_normals(semantic, smoothing_angle)?;
        let step = check_destination(dest, stride, 3, normals.len())?;

        for (i, normal) in normals.iter().enumerate() {
            let r: &[f32; 3] = normal.as_ref();
            dest[i * step..i * step + 3].copy_from_slice(r);
        }

        Ok(())
    }

    /// Planar projected texture coordinates for every corner, used when a
    /// surface has no texture coordinate stream of its own.
    pub fn calculate_texcoords(&self, semantic: &str) -> Result<Vec<Vector2>, ImportError> {
        let (positions, indices) = self.positions(semantic)?;
        let face_normals = self.calculate_face_normals(semantic)?;

        Ok(indices
            .iter()
            .enumerate()
            .map(|(corner, point)| {
                project(positions[*point], dominant_axis(face_normals[corner / 3]))
            })
            .collect())
    }

    /// Writes two texture coordinates per corner. The surface's `TEXCOORD`
    /// stream is used when present, otherwise the coordinates are projected
    /// from the positions addressed by `semantic`.
    pub fn create_vertices_texcoords(
        &self,
        dest: &mut [f32],
        stride: usize,
        semantic: &str,
    ) -> Result<(), ImportError> {
        let texcoords = match self.input(SEMANTIC_TEXCOORD) {
            Some(input) => {
                let source = input.source();
                let indices = self.corner_indices(input)?;
                match source.array() {
                    SourceArray::Vec2f(v) => indices.iter().map(|i| v[*i]).collect::<Vec<_>>(),
                    SourceArray::Vec3f(v) => indices.iter().map(|i| v[*i].truncate()).collect(),
                    other => {
                        return Err(ImportError::UnsupportedSource(
                            source.id().to_string(),
                            other.array_type().name(),
                        ))
                    }
                }
            }
            None => self.calculate_texcoords(semantic)?,
        };

        let step = check_destination(dest, stride, 2, texcoords.len())?;
        for (i, texcoord) in texcoords.iter().enumerate() {
            let r: &[f32; 2] = texcoord.as_ref();
            dest[i * step..i * step + 2].copy_from_slice(r);
        }

        Ok(())
    }
}
