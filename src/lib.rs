
//! Query model, validation and pipeline orchestration for a text-to-speech
//! engine.
//!
//! The crate owns the serializable query types ([`AudioQuery`] and friends
//! for talk, [`Score`]/[`FrameAudioQuery`] for singing), their invariants,
//! the voice-model and user-dictionary lifecycles, and the stage sequence
//! that turns text or phonetic notation into waveform bytes. The text
//! analyzer and the inference engine are external collaborators, reached
//! through the [`TextAnalyzer`] and [`InferenceEngine`] traits.

pub mod dict;
pub mod engine;
pub mod error;
pub mod kana;
pub mod metas;
pub mod model;
pub mod phoneme;
mod song;
mod status;
pub mod synthesizer;
pub mod types;
pub mod validate;

pub mod deps {
    pub use serde;
    pub use serde_json;
}

pub use dict::{UserDict, UserDictWord, UserDictWordType};
pub use engine::{InferenceEngine, TextAnalyzer};
pub use error::{Error, ErrorKind, Result};
pub use kana::{create_kana, parse_kana};
pub use metas::{CharacterMeta, CharacterVersion, StyleId, StyleMeta, StyleType};
pub use model::{VoiceModelFile, VoiceModelId};
pub use song::ensure_compatible;
pub use status::DuplicateModelPolicy;
pub use synthesizer::{SynthesisOptions, Synthesizer, SynthesizerOptions, TtsOptions};
pub use types::{
    AccentPhrase, AudioQuery, FrameAudioQuery, FramePhoneme, Mora, Note, NoteId, Score,
};
pub use validate::{Severity, Validate, Violation, ViolationKind};

/// The sampling rate the inference engine renders at. Query sampling rates
/// must be multiples of it.
pub const DEFAULT_SAMPLING_RATE: u32 = 24000;

/// Samples produced per singing/talk feature frame.
pub const SAMPLES_PER_FRAME: usize = 256;
