use std::sync::Arc;

use xmltree::Element;

use crate::{dom, error::ImportError, source::Source};

fn find_source(sources: &[Arc<Source>], id: &str) -> Result<Arc<Source>, ImportError> {
    match sources.iter().find(|s| s.id() == id) {
        Some(v) => Ok(Arc::clone(v)),
        None => Err(ImportError::SourceNotFound(id.to_string())),
    }
}

/// An input of a `<vertices>` group, one value per vertex.
#[derive(Clone, Debug)]
pub struct InputUnshared {
    semantic: String,
    source: Arc<Source>,
}

impl InputUnshared {
    pub fn parse(element: &Element, sources: &[Arc<Source>]) -> Result<InputUnshared, ImportError> {
        let semantic = dom::required_attribute(element, "input", "semantic")?;
        let source = dom::required_attribute(element, "input", "source")?;

        Ok(InputUnshared {
            semantic: semantic.to_string(),
            source: find_source(sources, dom::strip_fragment(source))?,
        })
    }

    pub fn semantic(&self) -> &str {
        &self.semantic
    }

    pub fn source(&self) -> &Arc<Source> {
        &self.source
    }
}

#[derive(Clone, Debug)]
pub struct Vertices {
    id: String,
    inputs: Vec<InputUnshared>,
}

impl Vertices {
    pub fn parse(element: &Element, sources: &[Arc<Source>]) -> Result<Vertices, ImportError> {
        let id = dom::required_attribute(element, "vertices", "id")?;
        let inputs = dom::children(element, "input")
            .map(|e| InputUnshared::parse(e, sources))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Vertices {
            id: id.to_string(),
            inputs,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn inputs(&self) -> &[InputUnshared] {
        &self.inputs
    }

    /// The sole input of the group. Groups carrying several streams
    /// (positions and normals side by side) cannot be addressed as one
    /// source.
    pub fn single_input(&self) -> Result<&InputUnshared, ImportError> {
        match self.inputs.as_slice() {
            [input] => Ok(input),
            _ => Err(ImportError::MultipleVertexInputs(self.id.clone())),
        }
    }
}

/// An input bound to a slot of each index tuple of a primitive.
#[derive(Clone, Debug)]
pub struct InputShared {
    semantic: String,
    offset: usize,
    set: u32,
    source: Arc<Source>,
}

impl InputShared {
    pub fn new(semantic: &str, offset: usize, set: u32, source: Arc<Source>) -> InputShared {
        InputShared {
            semantic: semantic.to_string(),
            offset,
            set,
            source,
        }
    }

    pub fn parse(
        element: &Element,
        sources: &[Arc<Source>],
        vertices: &Vertices,
    ) -> Result<InputShared, ImportError> {
        let semantic = dom::required_attribute(element, "input", "semantic")?;
        let source_id = dom::strip_fragment(dom::required_attribute(element, "input", "source")?);

        let source = if source_id == vertices.id() {
            Arc::clone(vertices.single_input()?.source())
        } else {
            find_source(sources, source_id)?
        };

        Ok(InputShared {
            semantic: semantic.to_string(),
            offset: dom::attribute_or(element, "offset", 0)?,
            set: dom::attribute_or(element, "set", 0)?,
            source,
        })
    }

    pub fn semantic(&self) -> &str {
        &self.semantic
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn set(&self) -> u32 {
        self.set
    }

    pub fn source(&self) -> &Arc<Source> {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dom::fragment, source::SourceArray, Vector3};

    fn sources() -> Vec<Arc<Source>> {
        vec![
            Arc::new(Source::new(
                "positions",
                "",
                SourceArray::Vec3f(vec![Vector3::new(0.0, 0.0, 0.0)]),
            )),
            Arc::new(Source::new(
                "normals",
                "",
                SourceArray::Vec3f(vec![Vector3::new(0.0, 1.0, 0.0)]),
            )),
        ]
    }

    #[test]
    fn input_unshared_resolves_sources() {
        let sources = sources();
        let input = InputUnshared::parse(
            &fragment("<input semantic=\"POSITION\" source=\"#positions\"/>"),
            &sources,
        )
        .unwrap();
        assert_eq!(input.semantic(), "POSITION");
        assert!(Arc::ptr_eq(input.source(), &sources[0]));

        match InputUnshared::parse(
            &fragment("<input semantic=\"POSITION\" source=\"#missing\"/>"),
            &sources,
        ) {
            Err(ImportError::SourceNotFound(id)) => assert_eq!(id, "missing"),
            other => panic!("expected a missing source, got {:?}", other),
        }
    }

    #[test]
    fn input_shared_resolves_through_vertices() {
        let sources = sources();
        let vertices = Vertices::parse(
            &fragment("<vertices id=\"verts\"><input semantic=\"POSITION\" source=\"#positions\"/></vertices>"),
            &sources,
        )
        .unwrap();

        let input = InputShared::parse(
            &fragment("<input semantic=\"VERTEX\" source=\"#verts\" offset=\"0\"/>"),
            &sources,
            &vertices,
        )
        .unwrap();
        assert_eq!(input.semantic(), "VERTEX");
        assert!(Arc::ptr_eq(input.source(), &sources[0]));

        let input = InputShared::parse(
            &fragment("<input semantic=\"NORMAL\" source=\"#normals\" offset=\"1\" set=\"2\"/>"),
            &sources,
            &vertices,
        )
        .unwrap();
        assert_eq!(input.offset(), 1);
        assert_eq!(input.set(), 2);
        assert!(Arc::ptr_eq(input.source(), &sources[1]));
    }

    #[test]
    fn input_shared_defaults_offset_and_set() {
        let sources = sources();
        let vertices = Vertices::parse(&fragment("<vertices id=\"verts\"/>"), &sources).unwrap();
        let input = InputShared::parse(
            &fragment("<input semantic=\"NORMAL\" source=\"#normals\"/>"),
            &sources,
            &vertices,
        )
        .unwrap();
        assert_eq!(input.offset(), 0);
        assert_eq!(input.set(), 0);
    }

    #[test]
    fn input_shared_requires_single_vertex_input() {
        let sources = sources();
        let vertices = Vertices::parse(
            &fragment(
                "<vertices id=\"verts\">\
                   <input semantic=\"POSITION\" source=\"#positions\"/>\
                   <input semantic=\"NORMAL\" source=\"#normals\"/>\
                 </vertices>",
            ),
            &sources,
        )
        .unwrap();
        assert_eq!(vertices.inputs().len(), 2);

        match InputShared::parse(
            &fragment("<input semantic=\"VERTEX\" source=\"#verts\"/>"),
            &sources,
            &vertices,
        ) {
            Err(ImportError::MultipleVertexInputs(id)) => assert_eq!(id, "verts"),
            other => panic!("expected multiple vertex inputs, got {:?}", other),
        }
    }
}
