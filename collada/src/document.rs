//! Top level import of a COLLADA document.

use std::{path::Path, sync::Arc};

use log::{debug, warn};
use xmltree::Element;

use crate::{
    dom, effect::Effect, error::ImportError, geometry::Geometry, image::Image,
    material::Material,
};

const SUPPORTED_VERSIONS: &[&str] = &["1.4.0", "1.4.1"];

fn library_items<'a>(
    root: &'a Element,
    library: &'a str,
    item: &'a str,
) -> impl Iterator<Item = &'a Element> {
    dom::children(root, library).flat_map(move |e| dom::children(e, item))
}

fn check_root(root: &Element) -> Result<String, ImportError> {
    if root.name != "COLLADA" {
        return Err(ImportError::MissingRootElement);
    }

    let version = dom::required_attribute(root, "COLLADA", "version")?.trim();
    if SUPPORTED_VERSIONS.contains(&version) {
        Ok(version.to_string())
    } else {
        Err(ImportError::UnsupportedVersion(version.to_string()))
    }
}

/// Reads every `<library_images>` of a document. Relative file references
/// are resolved against `image_path`.
pub fn load_library_images(
    root: &Element,
    image_path: &Path,
) -> Result<Vec<Arc<Image>>, ImportError> {
    let images = library_items(root, "library_images", "image")
        .map(|e| Image::parse(e, image_path).map(Arc::new))
        .collect::<Result<Vec<_>, _>>()?;
    debug!("Loaded {} images", images.len());

    Ok(images)
}

#[derive(Clone, Debug)]
pub struct Collada {
    version: String,
    images: Vec<Arc<Image>>,
    effects: Vec<Arc<Effect>>,
    materials: Vec<Arc<Material>>,
    geometries: Vec<Arc<Geometry>>,
}

impl Collada {
    /// Imports a parsed document using an already loaded image library.
    ///
    /// Libraries are read strictly in dependency order: effects bind images,
    /// materials bind effects and surfaces bind materials.
    pub fn parse(root: &Element, images: &[Arc<Image>]) -> Result<Collada, ImportError> {
        let version = check_root(root)?;

        let effects = library_items(root, "library_effects", "effect")
            .map(|e| Effect::parse(e, images).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Loaded {} effects", effects.len());

        let materials = library_items(root, "library_materials", "material")
            .map(|e| Material::parse(e, &effects).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Loaded {} materials", materials.len());

        let mut geometries = Vec::new();
        for element in library_items(root, "library_geometries", "geometry") {
            if Geometry::is_unsupported_shape(element) {
                warn!(
                    "Skipping geometry {} without a polygon mesh",
                    dom::attribute(element, "id").unwrap_or_default()
                );
                continue;
            }
            geometries.push(Arc::new(Geometry::parse(element, &materials)?));
        }
        debug!("Loaded {} geometries", geometries.len());

        Ok(Collada {
            version,
            images: images.to_vec(),
            effects,
            materials,
            geometries,
        })
    }

    /// Parses document text, loading its images from `image_path`.
    pub fn load(text: &str, image_path: &Path) -> Result<Collada, ImportError> {
        let root = dom::parse_document(text)?;
        check_root(&root)?;

        let images = load_library_images(&root, image_path)?;
        Collada::parse(&root, &images)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn images(&self) -> &[Arc<Image>] {
        &self.images
    }

    pub fn effects(&self) -> &[Arc<Effect>] {
        &self.effects
    }

    pub fn materials(&self) -> &[Arc<Material>] {
        &self.materials
    }

    pub fn geometries(&self) -> &[Arc<Geometry>] {
        &self.geometries
    }

    pub fn geometry(&self, id: &str) -> Option<&Arc<Geometry>> {
        self.geometries.iter().find(|g| g.id() == id)
    }

    pub fn effect(&self, id: &str) -> Option<&Arc<Effect>> {
        self.effects.iter().find(|e| e.id == id)
    }

    pub fn material(&self, id: &str) -> Option<&Arc<Material>> {
        self.materials.iter().find(|m| m.id() == id)
    }

    pub fn image(&self, id: &str) -> Option<&Arc<Image>> {
        self.images.iter().find(|i| i.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use cgmath::{Rad, Vector4};

    use super::*;
    use crate::{SEMANTIC_TEXCOORD, SEMANTIC_VERTEX};

    const DOCUMENT: &str = r##"<?xml version="1.0" encoding="utf-8"?>
<COLLADA xmlns="http://www.collada.org/2005/11/COLLADASchema" version="1.4.1">
  <asset><unit name="meter" meter="1"/><up_axis>Y_UP</up_axis></asset>
  <library_images>
    <image id="crate-image" name="crate"><init_from>file://textures/crate%20side.png</init_from></image>
  </library_images>
  <library_effects>
    <effect id="crate-effect">
      <profile_COMMON>
        <newparam sid="crate-surface">
          <surface type="2D"><init_from>crate-image</init_from></surface>
        </newparam>
        <newparam sid="crate-sampler">
          <sampler2D><source>crate-surface</source></sampler2D>
        </newparam>
        <technique sid="common">
          <phong>
            <diffuse><texture texture="crate-sampler" texcoord="UVMap"/></diffuse>
            <shininess><float>50</float></shininess>
          </phong>
        </technique>
      </profile_COMMON>
    </effect>
    <effect id="paint-effect">
      <profile_COMMON>
        <technique sid="common">
          <lambert><diffuse><color>0.8 0.1 0.1 1</color></diffuse></lambert>
        </technique>
      </profile_COMMON>
    </effect>
  </library_effects>
  <library_materials>
    <material id="crate-material" name="crate"><instance_effect url="#crate-effect"/></material>
    <material id="paint-material"><instance_effect url="#paint-effect"/></material>
  </library_materials>
  <library_geometries>
    <geometry id="hull" name="hull"><convex_mesh convex_hull_of="#quad"/></geometry>
    <geometry id="quad" name="quad">
      <mesh>
        <source id="quad-positions">
          <float_array id="quad-positions-array" count="12">0 0 0 1 0 0 1 1 0 0 1 0</float_array>
          <technique_common>
            <accessor source="#quad-positions-array" count="4" stride="3"/>
          </technique_common>
        </source>
        <source id="quad-uvs">
          <float_array id="quad-uvs-array" count="8">0 0 1 0 1 1 0 1</float_array>
          <technique_common>
            <accessor source="#quad-uvs-array" count="4" stride="2"/>
          </technique_common>
        </source>
        <vertices id="quad-vertices">
          <input semantic="POSITION" source="#quad-positions"/>
        </vertices>
        <triangles material="crate-material" count="1">
          <input semantic="VERTEX" source="#quad-vertices" offset="0"/>
          <input semantic="TEXCOORD" source="#quad-uvs" offset="1" set="0"/>
          <p>0 0 1 1 2 2</p>
        </triangles>
        <polylist material="paint-material" count="1">
          <input semantic="VERTEX" source="#quad-vertices" offset="0"/>
          <vcount>3</vcount>
          <p>0 2 3</p>
        </polylist>
      </mesh>
    </geometry>
  </library_geometries>
  <scene/>
</COLLADA>
"##;

    fn load(text: &str) -> Result<Collada, ImportError> {
        Collada::load(text, Path::new("/assets"))
    }

    #[test]
    fn load_resolves_every_library() {
        let document = load(DOCUMENT).unwrap();
        assert_eq!(document.version(), "1.4.1");

        let image = document.image("crate-image").unwrap();
        assert_eq!(
            image.filename(),
            PathBuf::from("/assets/textures/crate side.png").as_path()
        );

        let crate_effect = document.effect("crate-effect").unwrap();
        let texture = crate_effect.diffuse.as_ref().and_then(|d| d.texture()).unwrap();
        assert!(Arc::ptr_eq(texture.image(), image));
        assert_eq!(crate_effect.shininess.map(|s| s.value()), Some(50.0));

        let paint = document.material("paint-material").unwrap();
        assert!(Arc::ptr_eq(paint.effect(), document.effect("paint-effect").unwrap()));
        assert_eq!(
            paint.effect().diffuse.as_ref().and_then(|d| d.color()),
            Some(Vector4::new(0.8, 0.1, 0.1, 1.0))
        );

        assert_eq!(document.geometries().len(), 1);
        assert!(document.geometry("hull").is_none());

        let mesh = document.geometry("quad").unwrap().mesh();
        let materials = mesh
            .surfaces()
            .iter()
            .map(|s| s.material().map(|m| m.id().to_string()))
            .collect::<Vec<_>>();
        assert_eq!(
            materials,
            vec![
                Some("crate-material".to_string()),
                Some("paint-material".to_string())
            ]
        );
    }

    #[test]
    fn loaded_mesh_flattens() {
        let document = load(DOCUMENT).unwrap();
        let mesh = document.geometry("quad").unwrap().mesh();

        assert_eq!(mesh.triangle_count(SEMANTIC_VERTEX), 2);
        let (positions, _) = mesh.vertices_of(SEMANTIC_VERTEX).unwrap();
        assert_eq!(&positions[9..], &[0., 0., 0., 1., 1., 0., 0., 1., 0.]);

        let (uvs, surfaces) = mesh.vertices_of(SEMANTIC_TEXCOORD).unwrap();
        assert_eq!(uvs, vec![0., 0., 1., 0., 1., 1.]);
        assert!(surfaces[0].is_some());
        assert!(surfaces[1].is_none());

        let (normals, _) = mesh.normals_of(SEMANTIC_VERTEX, Rad(0.5)).unwrap();
        for normal in normals.chunks_exact(3) {
            assert_eq!(normal, &[0., 0., 1.]);
        }
    }

    #[test]
    fn version_gate() {
        let cases = [
            ("1.4.0", true),
            ("1.4.1", true),
            ("1.5.0", false),
            ("1.3.1", false),
        ];

        for (version, accepted) in cases.iter() {
            let text = DOCUMENT.replace("version=\"1.4.1\"", &format!("version=\"{}\"", version));
            match load(&text) {
                Ok(document) => {
                    assert!(*accepted, "{} should be rejected", version);
                    assert_eq!(document.version(), *version);
                }
                Err(ImportError::UnsupportedVersion(v)) => {
                    assert!(!*accepted, "{} should be accepted", version);
                    assert_eq!(v, *version);
                }
                Err(e) => panic!("unexpected error for {}: {}", version, e),
            }
        }
    }

    #[test]
    fn load_rejects_other_roots_and_bad_xml() {
        assert!(matches!(
            load("<scene version=\"1.4.1\"/>"),
            Err(ImportError::MissingRootElement)
        ));
        assert!(matches!(
            load("<COLLADA/>"),
            Err(ImportError::MissingAttribute("COLLADA", "version"))
        ));
        assert!(matches!(load("<COLLADA"), Err(ImportError::Xml(_))));
    }

    #[test]
    fn dangling_references_abort_the_import() {
        let cases = [
            (
                DOCUMENT.replace("url=\"#paint-effect\"", "url=\"#missing-effect\""),
                "missing-effect",
            ),
            (
                DOCUMENT.replace("material=\"paint-material\"", "material=\"missing-material\""),
                "missing-material",
            ),
            (
                DOCUMENT.replace("<init_from>crate-image</init_from>", "<init_from>missing-image</init_from>"),
                "missing-image",
            ),
            (
                DOCUMENT.replace("source=\"#quad-uvs\"", "source=\"#missing-uvs\""),
                "missing-uvs",
            ),
            (
                DOCUMENT.replace("texture=\"crate-sampler\"", "texture=\"missing-sampler\""),
                "missing-sampler",
            ),
        ];

        for (text, missing) in cases.iter() {
            match load(text) {
                Err(ImportError::EffectNotFound(id))
                | Err(ImportError::MaterialNotFound(id))
                | Err(ImportError::ImageNotFound(id))
                | Err(ImportError::SourceNotFound(id))
                | Err(ImportError::SamplerNotFound(id)) => assert_eq!(id, *missing),
                other => panic!("expected {} to be unresolved, got {:?}", missing, other),
            }
        }
    }

    #[test]
    fn parse_uses_external_images() {
        let root = dom::parse_document(DOCUMENT).unwrap();
        let images = vec![Arc::new(Image::new("crate-image", PathBuf::from("crate.png")))];

        let document = Collada::parse(&root, &images).unwrap();
        assert!(Arc::ptr_eq(document.image("crate-image").unwrap(), &images[0]));

        match Collada::parse(&root, &[]) {
            Err(ImportError::ImageNotFound(id)) => assert_eq!(id, "crate-image"),
            other => panic!("expected a missing image, got {:?}", other),
        }
    }

    #[test]
    fn non_triangle_faces_abort_the_import() {
        let text = DOCUMENT.replace(
            "<vcount>3</vcount>\n          <p>0 2 3</p>",
            "<vcount>4</vcount>\n          <p>0 1 2 3</p>",
        );
        match load(&text) {
            Err(ImportError::NonTriangleFace(n)) => assert_eq!(n, 4),
            other => panic!("expected a non-triangle face, got {:?}", other),
        }
    }
}
