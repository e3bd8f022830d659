use log::trace;
use xmltree::Element;

use crate::{
    dom,
    error::ImportError,
    parser::parse_tokens,
    Vector2, Vector3,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrayType {
    Unknown,
    Float,
    Int,
    Vec2f,
    Vec3f,
    Vec2i,
    Vec3i,
}

impl ArrayType {
    pub fn name(self) -> &'static str {
        match self {
            ArrayType::Unknown => "unknown",
            ArrayType::Float => "float",
            ArrayType::Int => "int",
            ArrayType::Vec2f => "vec2f",
            ArrayType::Vec3f => "vec3f",
            ArrayType::Vec2i => "vec2i",
            ArrayType::Vec3i => "vec3i",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SourceArray {
    Unknown,
    Float(Vec<f32>),
    Int(Vec<i32>),
    Vec2f(Vec<Vector2>),
    Vec3f(Vec<Vector3>),
    Vec2i(Vec<[i32; 2]>),
    Vec3i(Vec<[i32; 3]>),
}

impl SourceArray {
    pub fn array_type(&self) -> ArrayType {
        match self {
            SourceArray::Unknown => ArrayType::Unknown,
            SourceArray::Float(_) => ArrayType::Float,
            SourceArray::Int(_) => ArrayType::Int,
            SourceArray::Vec2f(_) => ArrayType::Vec2f,
            SourceArray::Vec3f(_) => ArrayType::Vec3f,
            SourceArray::Vec2i(_) => ArrayType::Vec2i,
            SourceArray::Vec3i(_) => ArrayType::Vec3i,
        }
    }

    /// Number of records, not scalars.
    pub fn len(&self) -> usize {
        match self {
            SourceArray::Unknown => 0,
            SourceArray::Float(v) => v.len(),
            SourceArray::Int(v) => v.len(),
            SourceArray::Vec2f(v) => v.len(),
            SourceArray::Vec3f(v) => v.len(),
            SourceArray::Vec2i(v) => v.len(),
            SourceArray::Vec3i(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scalars per record for float arrays, `None` for everything else.
    pub fn float_width(&self) -> Option<usize> {
        match self {
            SourceArray::Float(_) => Some(1),
            SourceArray::Vec2f(_) => Some(2),
            SourceArray::Vec3f(_) => Some(3),
            _ => None,
        }
    }

    /// Copies the components of record `index` into `out`, which must hold
    /// at least `float_width()` values.
    pub(crate) fn write_float_record(&self, index: usize, out: &mut [f32]) {
        match self {
            SourceArray::Float(v) => out[0] = v[index],
            SourceArray::Vec2f(v) => {
                let r: &[f32; 2] = v[index].as_ref();
                out[..2].copy_from_slice(r);
            }
            SourceArray::Vec3f(v) => {
                let r: &[f32; 3] = v[index].as_ref();
                out[..3].copy_from_slice(r);
            }
            _ => (),
        }
    }
}

struct Accessor {
    count: usize,
    stride: usize,
}

#[derive(Clone, Debug)]
pub struct Source {
    id: String,
    name: String,
    array: SourceArray,
}

impl Source {
    pub fn new(id: &str, name: &str, array: SourceArray) -> Source {
        Source {
            id: id.to_string(),
            name: name.to_string(),
            array,
        }
    }

    pub fn parse(element: &Element) -> Result<Source, ImportError> {
        let id = dom::attribute(element, "id").unwrap_or_default();
        let name = dom::attribute(element, "name").unwrap_or_default();

        let mut array_element = None;
        for node in element.children.iter() {
            if let xmltree::XMLNode::Element(e) = node {
                if e.name == "float_array" || e.name == "int_array" {
                    if array_element.is_some() {
                        return Err(ImportError::ArrayAlreadySet(id.to_string()));
                    }
                    array_element = Some(e);
                }
            }
        }

        let array = match array_element {
            Some(e) => Source::load_array(element, e)?,
            None => SourceArray::Unknown,
        };

        Ok(Source::new(id, name, array))
    }

    fn find_accessor(element: &Element, array_id: &str) -> Result<Option<Accessor>, ImportError> {
        let technique = match dom::child(element, "technique_common") {
            Some(v) => v,
            None => return Ok(None),
        };

        for accessor in dom::children(technique, "accessor") {
            let source = dom::attribute(accessor, "source").unwrap_or_default();
            if dom::strip_fragment(source) != array_id {
                continue;
            }

            let offset: usize = dom::attribute_or(accessor, "offset", 0)?;
            if offset != 0 {
                return Err(ImportError::AccessorOffsetUnsupported(array_id.to_string()));
            }

            return Ok(Some(Accessor {
                count: dom::required_number(accessor, "accessor", "count")?,
                stride: dom::attribute_or(accessor, "stride", 1)?,
            }));
        }

        Ok(None)
    }

    fn load_array(element: &Element, array_element: &Element) -> Result<SourceArray, ImportError> {
        let array_id = dom::attribute(array_element, "id").unwrap_or_default();
        let count: usize = dom::required_number(array_element, "array", "count")?;

        let stride = match Source::find_accessor(element, array_id)? {
            Some(accessor) => {
                if accessor.count.checked_mul(accessor.stride) != Some(count) {
                    return Err(ImportError::AccessorCountMismatch {
                        array: array_id.to_string(),
                        count,
                        accessor_count: accessor.count,
                        stride: accessor.stride,
                    });
                }
                if (1..=3).contains(&accessor.stride) {
                    accessor.stride
                } else {
                    trace!(
                        "Array {} has accessor stride {}, reading it as scalars",
                        array_id,
                        accessor.stride
                    );
                    1
                }
            }
            None => 1,
        };

        let text = dom::text(array_element);
        let array = if array_element.name == "float_array" {
            let values = parse_tokens::<f32>(&text, count)?;
            match stride {
                2 => SourceArray::Vec2f(
                    values
                        .chunks_exact(2)
                        .map(|c| Vector2::new(c[0], c[1]))
                        .collect(),
                ),
                3 => SourceArray::Vec3f(
                    values
                        .chunks_exact(3)
                        .map(|c| Vector3::new(c[0], c[1], c[2]))
                        .collect(),
                ),
                _ => SourceArray::Float(values),
            }
        } else {
            let values = parse_tokens::<i32>(&text, count)?;
            match stride {
                2 => SourceArray::Vec2i(values.chunks_exact(2).map(|c| [c[0], c[1]]).collect()),
                3 => SourceArray::Vec3i(
                    values
                        .chunks_exact(3)
                        .map(|c| [c[0], c[1], c[2]])
                        .collect(),
                ),
                _ => SourceArray::Int(values),
            }
        };

        Ok(array)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn array(&self) -> &SourceArray {
        &self.array
    }

    pub fn array_type(&self) -> ArrayType {
        self.array.array_type()
    }

    pub fn len(&self) -> usize {
        self.array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }
}
