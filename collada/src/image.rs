use std::path::{Path, PathBuf};

use xmltree::Element;

use crate::{dom, error::ImportError};

#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    id: String,
    filename: PathBuf,
}

fn resolve_filename(reference: &str, image_path: &Path) -> PathBuf {
    let reference = reference.trim();
    let reference = reference.strip_prefix("file://").unwrap_or(reference);
    // Escapes that decode to invalid UTF-8 are kept as written.
    let path = match urlencoding::decode(reference) {
        Ok(v) => PathBuf::from(v.as_ref()),
        Err(_) => PathBuf::from(reference),
    };

    if path.is_absolute() {
        path
    } else {
        image_path.join(path)
    }
}

impl Image {
    pub fn new(id: &str, filename: PathBuf) -> Image {
        Image {
            id: id.to_string(),
            filename,
        }
    }

    /// Reads an `<image>`, resolving relative file references against
    /// `image_path`.
    pub fn parse(element: &Element, image_path: &Path) -> Result<Image, ImportError> {
        let init_from = dom::child(element, "init_from").map(dom::text);

        let id = match (dom::attribute(element, "id"), dom::attribute(element, "name")) {
            (Some(id), _) => id.to_string(),
            (None, Some(name)) => name.to_string(),
            (None, None) => init_from.clone().unwrap_or_default().trim().to_string(),
        };

        match init_from {
            Some(reference) => Ok(Image::new(&id, resolve_filename(&reference, image_path))),
            None => Err(ImportError::EmbeddedImage(id)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }
}
