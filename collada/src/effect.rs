use std::sync::Arc;

use log::debug;
use xmltree::Element;

use crate::{dom, error::ImportError, image::Image, parser::parse_tokens, Vector4};

/// A `sampler2D` parameter bound to an image.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectTexture {
    sid: String,
    image: Arc<Image>,
}

impl EffectTexture {
    pub fn new(sid: &str, image: Arc<Image>) -> EffectTexture {
        EffectTexture {
            sid: sid.to_string(),
            image,
        }
    }

    /// Follows `newparam/sampler2D/source` to the sibling `newparam` holding
    /// the surface, and the surface's `init_from` to an image.
    fn parse(
        newparam: &Element,
        sampler: &Element,
        profile: &Element,
        images: &[Arc<Image>],
    ) -> Result<EffectTexture, ImportError> {
        let sid = dom::required_attribute(newparam, "newparam", "sid")?;
        let surface_sid = dom::text(dom::required_child(sampler, "sampler2D", "source")?);
        let surface_sid = surface_sid.trim();

        let surface = dom::children(profile, "newparam")
            .filter(|e| dom::attribute(e, "sid") == Some(surface_sid))
            .find_map(|e| dom::child(e, "surface"));
        let surface = match surface {
            Some(v) => v,
            None => return Err(ImportError::SurfaceNotFound(surface_sid.to_string())),
        };

        let image_id = dom::text(dom::required_child(surface, "surface", "init_from")?);
        let image_id = image_id.trim();
        match images.iter().find(|i| i.id() == image_id) {
            Some(image) => Ok(EffectTexture::new(sid, Arc::clone(image))),
            None => Err(ImportError::ImageNotFound(image_id.to_string())),
        }
    }

    pub fn sid(&self) -> &str {
        &self.sid
    }

    pub fn image(&self) -> &Arc<Image> {
        &self.image
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EffectColorTexture {
    Color(Vector4),
    Texture {
        texture: Arc<EffectTexture>,
        texcoord: String,
    },
}

impl EffectColorTexture {
    fn parse(
        element: &Element,
        samplers: &[Arc<EffectTexture>],
        images: &[Arc<Image>],
    ) -> Result<Option<EffectColorTexture>, ImportError> {
        if let Some(color) = dom::child(element, "color") {
            let rgba = parse_tokens::<f32>(&dom::text(color), 4)?;
            return Ok(Some(EffectColorTexture::Color(Vector4::new(
                rgba[0], rgba[1], rgba[2], rgba[3],
            ))));
        }

        if let Some(texture) = dom::child(element, "texture") {
            let sid = dom::required_attribute(texture, "texture", "texture")?;
            let texcoord = dom::attribute(texture, "texcoord").unwrap_or_default();

            let resolved = match samplers.iter().find(|s| s.sid() == sid) {
                Some(sampler) => Arc::clone(sampler),
                // Some exporters reference the image directly instead of a sampler.
                None => match images.iter().find(|i| i.id() == sid) {
                    Some(image) => Arc::new(EffectTexture::new(sid, Arc::clone(image))),
                    None => return Err(ImportError::SamplerNotFound(sid.to_string())),
                },
            };

            return Ok(Some(EffectColorTexture::Texture {
                texture: resolved,
                texcoord: texcoord.to_string(),
            }));
        }

        debug!("<{}> holds neither a color nor a texture", element.name);
        Ok(None)
    }

    pub fn color(&self) -> Option<Vector4> {
        match self {
            EffectColorTexture::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn texture(&self) -> Option<&Arc<EffectTexture>> {
        match self {
            EffectColorTexture::Texture { texture, .. } => Some(texture),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectFloatParam(pub f32);

impl EffectFloatParam {
    fn parse(element: &Element) -> Result<Option<EffectFloatParam>, ImportError> {
        match dom::child(element, "float") {
            Some(v) => {
                let value = parse_tokens::<f32>(&dom::text(v), 1)?;
                Ok(Some(EffectFloatParam(value[0])))
            }
            None => Ok(None),
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Opaque {
    #[default]
    AOne,
    AZero,
    RgbOne,
    RgbZero,
}

impl Opaque {
    fn parse(element: &Element) -> Result<Opaque, ImportError> {
        match dom::attribute(element, "opaque") {
            None | Some("A_ONE") => Ok(Opaque::AOne),
            Some("A_ZERO") => Ok(Opaque::AZero),
            Some("RGB_ONE") => Ok(Opaque::RgbOne),
            Some("RGB_ZERO") => Ok(Opaque::RgbZero),
            Some(v) => Err(ImportError::InvalidAttribute("opaque", v.to_string())),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Effect {
    pub id: String,
    pub name: String,

    pub emission: Option<EffectColorTexture>,
    pub ambient: Option<EffectColorTexture>,
    pub diffuse: Option<EffectColorTexture>,
    pub specular: Option<EffectColorTexture>,
    pub reflective: Option<EffectColorTexture>,
    pub transparent: Option<EffectColorTexture>,
    pub transparent_opaque: Opaque,

    pub shininess: Option<EffectFloatParam>,
    pub reflectivity: Option<EffectFloatParam>,
    pub transparency: Option<EffectFloatParam>,
    pub index_of_refraction: Option<EffectFloatParam>,

    pub samplers: Vec<Arc<EffectTexture>>,
}

const SHADERS: &[&str] = &["blinn", "phong", "lambert"];

impl Effect {
    pub fn parse(element: &Element, images: &[Arc<Image>]) -> Result<Effect, ImportError> {
        let id = dom::required_attribute(element, "effect", "id")?;
        let profile = dom::required_child(element, "effect", "profile_COMMON")?;

        let mut samplers = Vec::new();
        for newparam in dom::children(profile, "newparam") {
            if let Some(sampler) = dom::child(newparam, "sampler2D") {
                samplers.push(Arc::new(EffectTexture::parse(
                    newparam, sampler, profile, images,
                )?));
            }
        }

        let technique = dom::required_child(profile, "profile_COMMON", "technique")?;
        let shader = match SHADERS.iter().find_map(|name| dom::child(technique, name)) {
            Some(v) => v,
            None => return Err(ImportError::MissingShader(id.to_string())),
        };

        let color = |name: &str| -> Result<Option<EffectColorTexture>, ImportError> {
            match dom::child(shader, name) {
                Some(e) => EffectColorTexture::parse(e, &samplers, images),
                None => Ok(None),
            }
        };
        let float = |name: &str| -> Result<Option<EffectFloatParam>, ImportError> {
            match dom::child(shader, name) {
                Some(e) => EffectFloatParam::parse(e),
                None => Ok(None),
            }
        };

        let transparent_opaque = match dom::child(shader, "transparent") {
            Some(e) => Opaque::parse(e)?,
            None => Opaque::default(),
        };

        Ok(Effect {
            id: id.to_string(),
            name: dom::attribute(element, "name").unwrap_or_default().to_string(),
            emission: color("emission")?,
            ambient: color("ambient")?,
            diffuse: color("diffuse")?,
            specular: color("specular")?,
            reflective: color("reflective")?,
            transparent: color("transparent")?,
            transparent_opaque,
            shininess: float("shininess")?,
            reflectivity: float("reflectivity")?,
            transparency: float("transparency")?,
            index_of_refraction: float("index_of_refraction")?,
            samplers,
        })
    }

    pub fn sampler(&self, sid: &str) -> Option<&Arc<EffectTexture>> {
        self.samplers.iter().find(|s| s.sid() == sid)
    }
}
