use std::{collections::BTreeMap, io::Write as _, path::Path};

use anyhow::Context as _;

use crate::{
    adapters::{self, Network},
    assets::AssetStore,
    fingerprint::{BundleFingerprint, fingerprint_files},
    foundation::error::{PlayforgeError, PlayforgeResult},
    model::Project,
};

/// The versioned, self-contained bundle runtime. Compiled into the binary
/// once; exports never synthesize runtime code per project.
pub const RUNTIME_JS: &str = include_str!("runtime/player.js");

const INDEX_TEMPLATE: &str = include_str!("runtime/index.html.jinja");
const INDEX_FILE: &str = "index.html";
const RUNTIME_FILE: &str = "playforge-runtime.js";
const MANIFEST_FILE: &str = "manifest.json";

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Manifest {
    pub name: String,
    pub version: String,
    pub network: Network,
    pub fingerprint: String,
}

#[derive(Clone, Debug)]
pub struct BundleFile {
    pub path: String,
    pub bytes: Vec<u8>,
}

/// A fully assembled export: the archive file list in archive order, plus
/// the content fingerprint recorded in its manifest.
#[derive(Clone, Debug)]
pub struct Bundle {
    pub network: Network,
    pub files: Vec<BundleFile>,
    pub fingerprint: BundleFingerprint,
}

impl Bundle {
    pub fn file(&self, path: &str) -> Option<&BundleFile> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn index_html(&self) -> &str {
        self.file(INDEX_FILE)
            .map(|f| std::str::from_utf8(&f.bytes).unwrap_or_default())
            .unwrap_or_default()
    }

    /// Serialize the archive. File order and timestamps are fixed, so the
    /// same bundle always produces identical bytes.
    pub fn to_zip_bytes(&self) -> PlayforgeResult<Vec<u8>> {
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            let options: zip::write::SimpleFileOptions = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated)
                .last_modified_time(zip::DateTime::default());
            for file in &self.files {
                writer
                    .start_file(file.path.as_str(), options)
                    .map_err(|e| PlayforgeError::export(format!("archive '{}': {e}", file.path)))?;
                writer
                    .write_all(&file.bytes)
                    .map_err(|e| PlayforgeError::export(format!("archive '{}': {e}", file.path)))?;
            }
            writer
                .finish()
                .map_err(|e| PlayforgeError::export(format!("finalize archive: {e}")))?;
        }
        Ok(cursor.into_inner())
    }

    pub fn write_zip(&self, path: &Path) -> PlayforgeResult<()> {
        let bytes = self.to_zip_bytes()?;
        std::fs::write(path, bytes)
            .with_context(|| format!("write archive '{}'", path.display()))
            .map_err(PlayforgeError::Other)
    }
}

/// Inline-encoded asset map exposed to the runtime as the global `ASSETS`.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
struct AssetsDoc {
    video: Option<String>,
    images: BTreeMap<String, String>,
    audio: BTreeMap<String, String>,
}

impl AssetsDoc {
    fn from_store(store: &AssetStore) -> Self {
        Self {
            video: store.video.as_ref().map(|v| v.data_url()),
            images: store
                .images
                .iter()
                .map(|(id, img)| (id.clone(), img.data_url()))
                .collect(),
            audio: store
                .audio
                .iter()
                .map(|(id, media)| (id.clone(), media.data_url()))
                .collect(),
        }
    }
}

/// Compile a project into a self-contained bundle for one ad network.
///
/// Validation or asset failures abort the whole export; no partial bundle
/// is ever produced. An adapter failure aborts only this network's bundle.
#[tracing::instrument(skip(project), fields(network = %network))]
pub fn export_bundle(
    project: &Project,
    assets_root: &Path,
    network: Network,
) -> PlayforgeResult<Bundle> {
    project.validate()?;
    let store = AssetStore::prepare(project, assets_root)?;

    let config_json = serde_json::to_string(project)
        .map_err(|e| PlayforgeError::serde(format!("serialize CONFIG: {e}")))?;
    let assets_json = serde_json::to_string(&AssetsDoc::from_store(&store))
        .map_err(|e| PlayforgeError::serde(format!("serialize ASSETS: {e}")))?;

    let inline_runtime = !network.requires_local_runtime();
    let html = render_index(
        &project.general.ad_name,
        &config_json,
        &assets_json,
        inline_runtime,
    )?;
    let html = adapters::adapt(&html, network)?;

    let mut files = vec![BundleFile {
        path: INDEX_FILE.to_string(),
        bytes: html.into_bytes(),
    }];
    if !inline_runtime {
        files.push(BundleFile {
            path: RUNTIME_FILE.to_string(),
            bytes: RUNTIME_JS.as_bytes().to_vec(),
        });
    }

    let fingerprint = fingerprint_files(
        files
            .iter()
            .map(|f| (f.path.as_str(), f.bytes.as_slice()))
            .chain(std::iter::once(("network", network.name().as_bytes()))),
    );

    let manifest = Manifest {
        name: project.general.ad_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        network,
        fingerprint: fingerprint.to_string(),
    };
    let manifest_json = serde_json::to_string_pretty(&manifest)
        .map_err(|e| PlayforgeError::serde(format!("serialize manifest: {e}")))?;
    files.push(BundleFile {
        path: MANIFEST_FILE.to_string(),
        bytes: manifest_json.into_bytes(),
    });

    tracing::debug!(files = files.len(), %fingerprint, "bundle assembled");
    Ok(Bundle {
        network,
        files,
        fingerprint,
    })
}

fn render_index(
    ad_name: &str,
    config_json: &str,
    assets_json: &str,
    inline_runtime: bool,
) -> PlayforgeResult<String> {
    let mut env = minijinja::Environment::new();
    env.set_auto_escape_callback(|_| minijinja::AutoEscape::None);
    env.add_template(INDEX_FILE, INDEX_TEMPLATE)
        .map_err(|e| PlayforgeError::export(format!("entry-point template: {e}")))?;
    let template = env
        .get_template(INDEX_FILE)
        .map_err(|e| PlayforgeError::export(format!("entry-point template: {e}")))?;

    template
        .render(minijinja::context! {
            ad_name => ad_name,
            config_json => script_safe_json(config_json),
            assets_json => script_safe_json(assets_json),
            inline_runtime => inline_runtime,
            runtime_js => RUNTIME_JS,
            runtime_src => RUNTIME_FILE,
        })
        .map_err(|e| PlayforgeError::export(format!("render entry point: {e}")))
}

/// JSON embedded in a `<script>` element must not contain a closing-tag
/// prefix; escaping the solidus keeps the document well formed.
fn script_safe_json(json: &str) -> String {
    json.replace("</", "<\\/")
}
