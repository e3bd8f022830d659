use std::error::Error;
use std::fmt;

use xmltree::ParseError as XmlError;

#[derive(Debug, PartialEq)]
pub enum ParseError {
    TypeMismatch(&'static str, String),
    MissingTokens { expected: usize, found: usize },
    TrailingData(String),
}

#[derive(Debug)]
pub enum ImportError {
    Xml(Box<XmlError>),
    MissingRootElement,
    UnsupportedVersion(String),
    MissingElement(&'static str, &'static str),
    MissingAttribute(&'static str, &'static str),
    InvalidAttribute(&'static str, String),
    Parse(ParseError),
    ArrayAlreadySet(String),
    AccessorCountMismatch {
        array: String,
        count: usize,
        accessor_count: usize,
        stride: usize,
    },
    AccessorOffsetUnsupported(String),
    SourceNotFound(String),
    MultipleVertexInputs(String),
    MaterialNotFound(String),
    EffectNotFound(String),
    ImageNotFound(String),
    SamplerNotFound(String),
    SurfaceNotFound(String),
    MissingShader(String),
    EmbeddedImage(String),
    NonTriangleFace(u32),
    SemanticNotFound(String),
    UnsupportedSource(String, &'static str),
    IndexOutOfRange {
        source: String,
        index: u32,
        len: usize,
    },
    DestinationTooSmall {
        required: usize,
        actual: usize,
    },
    CountOverflow(&'static str, usize),
}

impl From<ParseError> for ImportError {
    fn from(e: ParseError) -> ImportError {
        ImportError::Parse(e)
    }
}

impl From<XmlError> for ImportError {
    fn from(e: XmlError) -> ImportError {
        ImportError::Xml(Box::new(e))
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::TypeMismatch(type_, val) => {
                write!(f, "Error reading value '{}' into {}", val, type_)
            }
            ParseError::MissingTokens { expected, found } => write!(
                f,
                "Expected {} values, but only {} were found",
                expected, found
            ),
            ParseError::TrailingData(token) => {
                write!(f, "Unexpected data after the last value: {}", token)
            }
        }
    }
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ImportError::Xml(err) => write!(f, "Malformed document: {}", err),
            ImportError::MissingRootElement => write!(f, "Missing root element"),
            ImportError::UnsupportedVersion(version) => {
                write!(f, "Unsupported collada version: {}", version)
            }
            ImportError::MissingElement(parent, element) => {
                write!(f, "Missing <{}> inside <{}>", element, parent)
            }
            ImportError::MissingAttribute(element, attribute) => {
                write!(f, "Missing attribute '{}' on <{}>", attribute, element)
            }
            ImportError::InvalidAttribute(attribute, value) => {
                write!(f, "Invalid value '{}' for attribute '{}'", value, attribute)
            }
            ImportError::Parse(err) => write!(f, "{}", err),
            ImportError::ArrayAlreadySet(id) => write!(f, "Array already set on source {}", id),
            ImportError::AccessorCountMismatch {
                array,
                count,
                accessor_count,
                stride,
            } => write!(
                f,
                "Array {} has {} values, but its accessor expects {} x {}",
                array, count, accessor_count, stride
            ),
            ImportError::AccessorOffsetUnsupported(array) => {
                write!(f, "Accessor offsets are not supported (array {})", array)
            }
            ImportError::SourceNotFound(id) => write!(f, "Unable to find source: {}", id),
            ImportError::MultipleVertexInputs(id) => write!(
                f,
                "Only supports single vertex input source at the moment (vertices {})",
                id
            ),
            ImportError::MaterialNotFound(id) => write!(f, "Unable to find material: {}", id),
            ImportError::EffectNotFound(id) => write!(f, "Unable to find effect: {}", id),
            ImportError::ImageNotFound(id) => write!(f, "Unable to find image: {}", id),
            ImportError::SamplerNotFound(sid) => write!(f, "Unable to find sampler: {}", sid),
            ImportError::SurfaceNotFound(sid) => write!(f, "Unable to find surface: {}", sid),
            ImportError::MissingShader(id) => {
                write!(f, "Effect {} has no blinn, phong or lambert shader", id)
            }
            ImportError::EmbeddedImage(id) => {
                write!(f, "Embedded images are not supported (image {})", id)
            }
            ImportError::NonTriangleFace(count) => write!(
                f,
                "Only triangles are supported, found a polygon with {} vertices",
                count
            ),
            ImportError::SemanticNotFound(semantic) => {
                write!(f, "Unsupported situation: no input with semantic {}", semantic)
            }
            ImportError::UnsupportedSource(id, type_) => {
                write!(f, "Source {} holds {} values, which cannot be used here", id, type_)
            }
            ImportError::IndexOutOfRange { source, index, len } => write!(
                f,
                "Index {} is out of range for source {} ({} entries)",
                index, source, len
            ),
            ImportError::DestinationTooSmall { required, actual } => write!(
                f,
                "Destination holds {} values, but {} are required",
                actual, required
            ),
            ImportError::CountOverflow(element, count) => {
                write!(f, "Count {} on <{}> is too large", count, element)
            }
        }
    }
}

impl Error for ParseError {}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ImportError::Xml(err) => Some(&**err),
            ImportError::Parse(err) => Some(err),
            _ => None,
        }
    }
}
