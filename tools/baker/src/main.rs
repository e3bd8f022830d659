use std::{
    env,
    path::{Path, PathBuf},
    process,
};

use bincode::serialize;
use cgmath::{Deg, Rad};
use clap::{App, Arg};
use collada::Collada;
use collada_ir::{bake_document, BakeOptions, Model};
use futures::{future::join_all, StreamExt};
use itertools::Itertools;
use log::{error, info, warn};
use tokio::{
    fs::{self, File},
    io::{AsyncWriteExt, BufWriter},
    task::spawn_blocking,
};
use tokio_stream::wrappers::ReadDirStream;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Format {
    Bincode,
    Json,
}

impl Format {
    fn encode(self, model: &Model) -> Result<Vec<u8>, String> {
        match self {
            Format::Bincode => serialize(model).map_err(|e| e.to_string()),
            Format::Json => serde_json::to_vec_pretty(model).map_err(|e| e.to_string()),
        }
    }
}

struct Settings {
    image_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    options: BakeOptions,
    format: Format,
}

fn is_collada(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.eq_ignore_ascii_case("dae"),
        None => false,
    }
}

fn output_file(path: &Path, output_path: &Option<PathBuf>, model: &Model) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|v| v.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = format!("{}.{}.model", file_name, model.metadata.id);

    match output_path {
        Some(dir) => dir.join(name),
        None => path.with_file_name(name),
    }
}

fn parse_smoothing_angle(value: Option<&str>) -> Result<BakeOptions, String> {
    match value {
        Some(v) => match v.trim().parse::<f32>() {
            Ok(degrees) if degrees.is_finite() && degrees >= 0.0 => Ok(BakeOptions {
                smoothing_angle: Rad::from(Deg(degrees)),
            }),
            _ => Err(format!("{} is not a valid smoothing angle", v)),
        },
        None => Ok(BakeOptions::default()),
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = App::new("baker")
        .about("Bake COLLADA geometries into indexed models")
        .arg(
            Arg::with_name("image_path")
                .long("image-path")
                .value_name("PATH")
                .takes_value(true)
                .help("Directory relative image references are resolved against"),
        )
        .arg(
            Arg::with_name("output_path")
                .short("o")
                .long("output-path")
                .takes_value(true)
                .help("Output path"),
        )
        .arg(
            Arg::with_name("smoothing_angle")
                .long("smoothing-angle")
                .value_name("DEGREES")
                .takes_value(true)
                .help("Largest angle between faces whose normals are blended"),
        )
        .arg(
            Arg::with_name("json")
                .long("json")
                .help("Write models as JSON instead of bincode"),
        )
        .arg(
            Arg::with_name("files")
                .multiple(true)
                .takes_value(true)
                .required(true)
                .help("Files to process"),
        )
        .get_matches();

    let image_path = match matches.value_of("image_path") {
        Some(v) => Some(PathBuf::from(v)),
        None => env::var("COLLADA_IMAGE_PATH").ok().map(PathBuf::from),
    };

    let output_path = match matches.value_of("output_path") {
        Some(v) => {
            let path = PathBuf::from(v);
            if !path.is_dir() {
                error!("{} is not a proper output directory", v);
                process::exit(1);
            }
            Some(path)
        }
        None => None,
    };

    let options = match parse_smoothing_angle(matches.value_of("smoothing_angle")) {
        Ok(v) => v,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    let settings = Settings {
        image_path,
        output_path,
        options,
        format: if matches.is_present("json") {
            Format::Json
        } else {
            Format::Bincode
        },
    };

    let mut paths = vec![];
    for file in matches.values_of("files").into_iter().flatten() {
        let path = PathBuf::from(file);
        if !fs::try_exists(&path).await.unwrap_or(false) {
            warn!("Path {} does not exist.", file);
        } else if path.is_dir() {
            let mut dir = match fs::read_dir(&path).await {
                Ok(v) => ReadDirStream::new(v),
                Err(e) => {
                    warn!("Could not read directory {}: {}", file, e);
                    continue;
                }
            };
            while let Some(entry) = dir.next().await {
                match entry {
                    Ok(entry) if is_collada(&entry.path()) => paths.push(entry.path()),
                    Ok(_) => (),
                    Err(e) => warn!("Could not read entry in {}: {}", file, e),
                }
            }
        } else {
            paths.push(path);
        }
    }

    let mut failures = 0;
    let cpus = num_cpus::get();
    for chunk in paths.into_iter().chunks(cpus).into_iter() {
        let results = join_all(chunk.map(|path| bake(&settings, path))).await;
        failures += results.iter().filter(|v| !**v).count();
    }

    if failures > 0 {
        error!("{} file(s) failed.", failures);
        process::exit(1);
    }
}

async fn bake(settings: &Settings, path: PathBuf) -> bool {
    info!("{}", path.display());

    let text = match fs::read_to_string(&path).await {
        Ok(v) => v,
        Err(err) => {
            error!("Could not open document {}: {}", path.display(), err);
            return false;
        }
    };

    let image_path = match &settings.image_path {
        Some(v) => v.clone(),
        None => path.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    let options = settings.options;

    let baked = spawn_blocking(move || {
        let document = Collada::load(&text, &image_path).map_err(|e| e.to_string())?;
        bake_document(&document, &options).map_err(|e| e.to_string())
    })
    .await;

    let models = match baked {
        Ok(Ok(v)) => v,
        Ok(Err(err)) => {
            error!("Could not bake {}: {}", path.display(), err);
            return false;
        }
        Err(err) => {
            error!("Baking {} was interrupted: {}", path.display(), err);
            return false;
        }
    };

    let mut succeeded = true;
    for model in models.iter() {
        let outpath = output_file(&path, &settings.output_path, model);
        if let Err(err) = write_model(&outpath, settings.format, model).await {
            error!("Could not write {}: {}", outpath.display(), err);
            succeeded = false;
        }
    }
    succeeded
}

async fn write_model(outpath: &Path, format: Format, model: &Model) -> Result<(), String> {
    let serialized = format.encode(model)?;

    let file = File::create(outpath).await.map_err(|e| e.to_string())?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(&serialized)
        .await
        .map_err(|e| e.to_string())?;
    writer.shutdown().await.map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use collada_ir::model::{ModelMetadata, VertexBuffer};

    use super::*;

    fn model(id: &str) -> Model {
        Model {
            metadata: ModelMetadata {
                id: id.to_string(),
                ..Default::default()
            },
            vertex_buffer: VertexBuffer::default(),
            surfaces: vec![],
            bounding_box: None,
        }
    }

    #[test]
    fn output_file_names_each_geometry() {
        let path = PathBuf::from("scenes/crate.dae");
        assert_eq!(
            output_file(&path, &None, &model("box")),
            PathBuf::from("scenes/crate.dae.box.model")
        );
        assert_eq!(
            output_file(&path, &Some(PathBuf::from("out")), &model("lid")),
            PathBuf::from("out/crate.dae.lid.model")
        );
    }

    #[test]
    fn is_collada_checks_extension() {
        let cases = [
            ("a.dae", true),
            ("b.DAE", true),
            ("c.obj", false),
            ("dae", false),
        ];

        for (path, expected) in cases.iter() {
            assert_eq!(is_collada(Path::new(path)), *expected, "{}", path);
        }
    }

    #[test]
    fn smoothing_angle_is_read_in_degrees() {
        let options = parse_smoothing_angle(Some("90")).unwrap();
        assert!((options.smoothing_angle.0 - std::f32::consts::FRAC_PI_2).abs() < 1e-6);

        let default = parse_smoothing_angle(None).unwrap();
        assert_eq!(default.smoothing_angle, BakeOptions::default().smoothing_angle);

        assert!(parse_smoothing_angle(Some("-5")).is_err());
        assert!(parse_smoothing_angle(Some("wide")).is_err());
    }

    #[test]
    fn formats_encode_models() {
        let json = Format::Json.encode(&model("box")).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["metadata"]["id"], "box");

        let bytes = Format::Bincode.encode(&model("box")).unwrap();
        let decoded: Model = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded.metadata.id, "box");
    }
}
