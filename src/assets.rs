use std::{collections::BTreeMap, path::Path, sync::Arc};

use anyhow::Context as _;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

use crate::{
    foundation::error::{PlayforgeError, PlayforgeResult},
    model::{AssetRef, Project},
};

/// MIME type for a source path or URL, by extension.
pub fn mime_for(source: &str) -> PlayforgeResult<&'static str> {
    let ext = source
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match ext.as_str() {
        "mp4" => Ok("video/mp4"),
        "webm" => Ok("video/webm"),
        "png" => Ok("image/png"),
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "webp" => Ok("image/webp"),
        "gif" => Ok("image/gif"),
        "mp3" => Ok("audio/mpeg"),
        "ogg" => Ok("audio/ogg"),
        "wav" => Ok("audio/wav"),
        _ => Err(PlayforgeError::asset(format!(
            "unsupported media extension in '{source}'"
        ))),
    }
}

/// Inline-encoded payload representation used by the exported `ASSETS` map.
pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", BASE64.encode(bytes))
}

#[derive(Clone, Debug)]
pub struct PreparedMedia {
    pub mime: &'static str,
    pub bytes: Arc<Vec<u8>>,
}

impl PreparedMedia {
    pub fn data_url(&self) -> String {
        data_url(self.mime, &self.bytes)
    }
}

/// Decoded-and-validated sprite image. Dimensions feed hit-testing.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    pub mime: &'static str,
    pub bytes: Arc<Vec<u8>>,
    pub width: u32,
    pub height: u32,
}

impl PreparedImage {
    pub fn data_url(&self) -> String {
        data_url(self.mime, &self.bytes)
    }
}

/// Binary assets of one project, keyed by owning entity id as the bundle
/// contract requires: the video, `images[sprite_id]`, `audio[modification_id]`.
///
/// Remote references are intentionally absent here: they are never embedded
/// and the runtime resolves them from `CONFIG` directly.
#[derive(Clone, Debug, Default)]
pub struct AssetStore {
    pub video: Option<PreparedMedia>,
    pub images: BTreeMap<String, PreparedImage>,
    pub audio: BTreeMap<String, PreparedMedia>,
}

impl AssetStore {
    /// Load and validate every bundled binary the project references,
    /// resolving sources relative to `root`.
    ///
    /// Any unreadable or undecodable asset fails the whole prepare with the
    /// owning entity named; a silently skipped asset would desync the
    /// exported `CONFIG` and `ASSETS`.
    #[tracing::instrument(skip(project), fields(root = %root.display()))]
    pub fn prepare(project: &Project, root: &Path) -> PlayforgeResult<Self> {
        let mut store = Self::default();

        if let AssetRef::Bundled { source } = &project.general.video {
            let bytes = read_source(root, source)
                .map_err(|e| PlayforgeError::asset(format!("video: {e:#}")))?;
            store.video = Some(PreparedMedia {
                mime: mime_for(source)?,
                bytes: Arc::new(bytes),
            });
        }

        for m in &project.modifications {
            for s in &m.sprites {
                let AssetRef::Bundled { source } = &s.asset else {
                    continue;
                };
                let bytes = read_source(root, source)
                    .map_err(|e| PlayforgeError::asset(format!("sprite '{}': {e:#}", s.id)))?;
                let decoded = image::load_from_memory(&bytes).map_err(|e| {
                    PlayforgeError::asset(format!("sprite '{}': decode '{source}': {e}", s.id))
                })?;
                let (width, height) = decoded.to_rgba8().dimensions();
                store.images.insert(
                    s.id.clone(),
                    PreparedImage {
                        mime: mime_for(source)?,
                        bytes: Arc::new(bytes),
                        width,
                        height,
                    },
                );
            }

            if let Some(music) = &m.background_music {
                let AssetRef::Bundled { source } = &music.asset else {
                    continue;
                };
                let bytes = read_source(root, source).map_err(|e| {
                    PlayforgeError::asset(format!("modification '{}' music: {e:#}", m.id))
                })?;
                store.audio.insert(
                    m.id.clone(),
                    PreparedMedia {
                        mime: mime_for(source)?,
                        bytes: Arc::new(bytes),
                    },
                );
            }
        }

        tracing::debug!(
            images = store.images.len(),
            audio = store.audio.len(),
            has_video = store.video.is_some(),
            "assets prepared"
        );
        Ok(store)
    }

    pub fn image_size(&self, sprite_id: &str) -> Option<(u32, u32)> {
        self.images.get(sprite_id).map(|i| (i.width, i.height))
    }
}

fn read_source(root: &Path, source: &str) -> anyhow::Result<Vec<u8>> {
    let path = root.join(source);
    std::fs::read(&path).with_context(|| format!("read '{}'", path.display()))
}
