use std::{error::Error, fmt};

use collada::ImportError;

#[derive(Debug)]
pub enum BakeError {
    Import(ImportError),
    NonFiniteVertex([f32; 3]),
}

impl From<ImportError> for BakeError {
    fn from(e: ImportError) -> BakeError {
        BakeError::Import(e)
    }
}

impl fmt::Display for BakeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BakeError::Import(e) => write!(f, "{}", e),
            BakeError::NonFiniteVertex(v) => write!(f, "Non-finite vertex: {:?}", v),
        }
    }
}

impl Error for BakeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BakeError::Import(e) => Some(e),
            _ => None,
        }
    }
}
