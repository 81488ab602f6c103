
//! Bookkeeping of the models currently loaded into a synthesizer.

use parking_lot::Mutex;

use crate::error::{Error, ErrorKind};
use crate::metas::{self, CharacterMeta, StyleId, StyleType};
use crate::model::VoiceModelId;

/// What to do when a model with an already-loaded id is loaded again.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum DuplicateModelPolicy {
    /// Fail with a `model-already-loaded` error.
    #[default]
    Reject,
    /// Keep the already-loaded model and treat the call as a no-op.
    Ignore,
}

struct LoadedModel {
    id: VoiceModelId,
    metas: Vec<CharacterMeta>,
}

/// The loaded-model set. Lookups are cheap; none of the methods block on
/// anything but the internal lock.
#[derive(Default)]
pub(crate) struct LoadedModels {
    models: Mutex<Vec<LoadedModel>>,
}

impl LoadedModels {
    /// Registers a model's styles. Style ids must stay unique across the
    /// whole loaded set.
    pub(crate) fn insert(
        &self,
        id: VoiceModelId,
        metas: Vec<CharacterMeta>,
        policy: DuplicateModelPolicy,
    ) -> crate::Result<()> {
        let mut models = self.models.lock();

        if models.iter().any(|model| model.id == id) {
            return match policy {
                DuplicateModelPolicy::Reject => Err(Error::new(
                    ErrorKind::ModelAlreadyLoaded,
                    format!("voice model {id} is already loaded"),
                )),
                DuplicateModelPolicy::Ignore => Ok(()),
            };
        }

        let loaded_style_ids: Vec<StyleId> = models
            .iter()
            .flat_map(|model| &model.metas)
            .flat_map(|character| &character.styles)
            .map(|style| style.id)
            .collect();
        for style in metas.iter().flat_map(|character| &character.styles) {
            if loaded_style_ids.contains(&style.id) {
                return Err(Error::new(
                    ErrorKind::StyleAlreadyLoaded,
                    format!("style {} is already loaded", style.id),
                ));
            }
        }

        models.push(LoadedModel { id, metas });
        Ok(())
    }

    pub(crate) fn remove(&self, id: VoiceModelId) -> crate::Result<()> {
        let mut models = self.models.lock();
        let index = models
            .iter()
            .position(|model| model.id == id)
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::ModelNotFound,
                    format!("voice model {id} is not loaded"),
                )
            })?;
        models.remove(index);
        Ok(())
    }

    pub(crate) fn contains(&self, id: VoiceModelId) -> bool {
        self.models.lock().iter().any(|model| model.id == id)
    }

    /// Merged metadata of every loaded model, ordered per the `order`
    /// fields.
    pub(crate) fn metas(&self) -> Vec<CharacterMeta> {
        let models = self.models.lock();
        metas::merge(models.iter().flat_map(|model| &model.metas))
    }

    /// Confirms that `style_id` is loaded with one of the given
    /// capabilities. Runs before any inference-engine call.
    pub(crate) fn ensure_style(
        &self,
        style_id: StyleId,
        capabilities: &[StyleType],
    ) -> crate::Result<()> {
        let models = self.models.lock();
        let found = models
            .iter()
            .flat_map(|model| &model.metas)
            .flat_map(|character| &character.styles)
            .any(|style| style.id == style_id && capabilities.contains(&style.kind));
        if found {
            Ok(())
        } else {
            Err(Error::new(
                ErrorKind::StyleNotFound,
                format!(
                    "style {style_id} with capability {} is not loaded",
                    capabilities
                        .iter()
                        .map(StyleType::as_str)
                        .collect::<Vec<_>>()
                        .join("/")
                ),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_file::sample_meta;
    use uuid::Uuid;

    fn model_id() -> VoiceModelId {
        VoiceModelId(Uuid::new_v4())
    }

    const SPEAKER_A: &str = "0caa1d86-6e5f-42c7-a2f1-0e41ecb7c9a7";
    const SPEAKER_B: &str = "a1b60b30-f6a6-4d35-87a7-ec6f5f25b3e1";

    #[test]
    fn duplicate_model_policy() {
        let models = LoadedModels::default();
        let id = model_id();
        let metas = vec![sample_meta(SPEAKER_A, &[(0, StyleType::Talk)])];

        models
            .insert(id, metas.clone(), DuplicateModelPolicy::Reject)
            .unwrap();
        let err = models
            .insert(id, metas.clone(), DuplicateModelPolicy::Reject)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelAlreadyLoaded);
        models
            .insert(id, metas, DuplicateModelPolicy::Ignore)
            .unwrap();
    }

    #[test]
    fn duplicate_style_across_models_is_rejected() {
        let models = LoadedModels::default();
        models
            .insert(
                model_id(),
                vec![sample_meta(SPEAKER_A, &[(0, StyleType::Talk)])],
                DuplicateModelPolicy::Reject,
            )
            .unwrap();
        let err = models
            .insert(
                model_id(),
                vec![sample_meta(SPEAKER_B, &[(0, StyleType::Talk)])],
                DuplicateModelPolicy::Reject,
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StyleAlreadyLoaded);
    }

    #[test]
    fn style_lookup_requires_matching_capability() {
        let models = LoadedModels::default();
        models
            .insert(
                model_id(),
                vec![sample_meta(SPEAKER_A, &[(0, StyleType::Talk)])],
                DuplicateModelPolicy::Reject,
            )
            .unwrap();

        assert!(models.ensure_style(StyleId(0), &[StyleType::Talk]).is_ok());
        assert_eq!(
            models
                .ensure_style(StyleId(0), &[StyleType::SingingTeacher])
                .unwrap_err()
                .kind(),
            ErrorKind::StyleNotFound
        );
        assert_eq!(
            models
                .ensure_style(StyleId(1), &[StyleType::Talk])
                .unwrap_err()
                .kind(),
            ErrorKind::StyleNotFound
        );
    }

    #[test]
    fn unload_removes_all_styles() {
        let models = LoadedModels::default();
        let id = model_id();
        models
            .insert(
                id,
                vec![sample_meta(SPEAKER_A, &[(0, StyleType::Talk)])],
                DuplicateModelPolicy::Reject,
            )
            .unwrap();
        assert!(models.contains(id));
        assert_eq!(models.metas().len(), 1);

        models.remove(id).unwrap();
        assert!(!models.contains(id));
        assert!(models.metas().is_empty());
        assert_eq!(models.remove(id).unwrap_err().kind(), ErrorKind::ModelNotFound);
    }
}
