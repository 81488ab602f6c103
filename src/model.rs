
//! Voice model files.
//!
//! A model file is addressed by filesystem path and carries an identity
//! UUID, a character/style manifest and one opaque weight payload per
//! style. Only the manifest is interpreted here; payloads are handed to
//! the inference engine as-is.

use std::collections::HashMap;
use std::fmt::{self, Display};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, ErrorKind};
use crate::metas::CharacterMeta;

/// Identity of a voice model, stable across re-releases unless the voices
/// materially change.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VoiceModelId(pub Uuid);

impl Display for VoiceModelId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque per-style weight payloads, keyed by the decimal style id.
pub(crate) type StyleWeights = HashMap<String, String>;

#[derive(Deserialize)]
struct ModelManifest {
    id: VoiceModelId,
    metas: Vec<CharacterMeta>,
    #[serde(default)]
    style_weights: StyleWeights,
}

/// An opened voice model file.
///
/// `id` and `metas` stay readable for the whole lifetime of the value;
/// [`close`](Self::close) releases only the weight payloads. A handle is
/// exclusively owned: release happens exactly once, on `close` (or drop),
/// never through a second handle.
#[derive(Debug)]
pub struct VoiceModelFile {
    id: VoiceModelId,
    metas: Vec<CharacterMeta>,
    path: PathBuf,
    weights: RwLock<Option<StyleWeights>>,
}

impl VoiceModelFile {
    /// Reads identity and metadata from a model file. The model is not yet
    /// usable for synthesis; it must be loaded into a synthesizer first.
    pub fn open(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| {
            Error::with_source(
                ErrorKind::InvalidModelFormat,
                format!("failed to read voice model file {}", path.display()),
                source,
            )
        })?;
        let manifest: ModelManifest = serde_json::from_slice(&bytes).map_err(|source| {
            Error::with_source(
                ErrorKind::InvalidModelFormat,
                format!("malformed voice model file {}", path.display()),
                source,
            )
        })?;
        Ok(Self {
            id: manifest.id,
            metas: manifest.metas,
            path: path.to_owned(),
            weights: RwLock::new(Some(manifest.style_weights)),
        })
    }

    pub fn id(&self) -> VoiceModelId {
        self.id
    }

    pub fn metas(&self) -> &[CharacterMeta] {
        &self.metas
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Releases the weight payloads. Blocks until any in-flight load using
    /// this handle has completed (drain, then release). `id` and `metas`
    /// remain available afterwards.
    pub fn close(&self) {
        self.weights.write().take();
    }

    /// Runs `f` against the weight payloads, holding them open for the
    /// duration so a concurrent `close` waits.
    pub(crate) fn with_weights<R>(
        &self,
        f: impl FnOnce(&StyleWeights) -> crate::Result<R>,
    ) -> crate::Result<R> {
        let guard = self.weights.read();
        match guard.as_ref() {
            Some(weights) => f(weights),
            None => {
                debug_assert!(false, "voice model file {} used after close", self.path.display());
                Err(Error::new(
                    ErrorKind::InvalidModelData,
                    format!("voice model file {} is already closed", self.path.display()),
                ))
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::metas::{StyleId, StyleType};

    const MODEL_ID: &str = "b988d4f4-1b6c-4bb5-bd0c-f4e29e5d8458";
    const SPEAKER_UUID: &str = "0caa1d86-6e5f-42c7-a2f1-0e41ecb7c9a7";

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("hibiki-model-{}-{name}", Uuid::new_v4()))
    }

    #[test]
    fn open_reads_identity_and_metas() {
        let path = temp_path("ok.json");
        std::fs::write(
            &path,
            test_file::manifest_json(MODEL_ID, SPEAKER_UUID, &[(0, StyleType::Talk)], true),
        )
        .unwrap();

        let model = VoiceModelFile::open(&path).unwrap();
        assert_eq!(model.id().to_string(), MODEL_ID);
        assert_eq!(model.metas().len(), 1);
        assert_eq!(model.metas()[0].styles[0].id, StyleId(0));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file_is_a_format_error() {
        let err = VoiceModelFile::open(temp_path("nonexistent.json")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidModelFormat);
    }

    #[test]
    fn malformed_manifest_is_a_format_error() {
        let path = temp_path("broken.json");
        std::fs::write(&path, b"{\"id\": 42}").unwrap();
        let err = VoiceModelFile::open(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidModelFormat);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn close_keeps_identity_readable() {
        let path = temp_path("close.json");
        std::fs::write(
            &path,
            test_file::manifest_json(MODEL_ID, SPEAKER_UUID, &[(0, StyleType::Talk)], true),
        )
        .unwrap();

        let model = VoiceModelFile::open(&path).unwrap();
        model.close();
        assert_eq!(model.id().to_string(), MODEL_ID);
        assert_eq!(model.metas().len(), 1);

        std::fs::remove_file(&path).unwrap();
    }
}
