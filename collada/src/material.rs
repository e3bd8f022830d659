use std::sync::Arc;

use xmltree::Element;

use crate::{dom, effect::Effect, error::ImportError};

#[derive(Clone, Debug)]
pub struct Material {
    id: String,
    name: String,
    effect: Arc<Effect>,
}

impl Material {
    pub fn new(id: &str, name: &str, effect: Arc<Effect>) -> Material {
        Material {
            id: id.to_string(),
            name: name.to_string(),
            effect,
        }
    }

    pub fn parse(element: &Element, effects: &[Arc<Effect>]) -> Result<Material, ImportError> {
        let id = dom::required_attribute(element, "material", "id")?;
        let instance = dom::required_child(element, "material", "instance_effect")?;
        let url = dom::strip_fragment(dom::required_attribute(instance, "instance_effect", "url")?);

        match effects.iter().find(|e| e.id == url) {
            Some(effect) => Ok(Material::new(
                id,
                dom::attribute(element, "name").unwrap_or_default(),
                Arc::clone(effect),
            )),
            None => Err(ImportError::EffectNotFound(url.to_string())),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn effect(&self) -> &Arc<Effect> {
        &self.effect
    }
}
