
//! Seams to the two external collaborators: the text analyzer and the
//! inference engine. Both are synchronous; a call returns only once the
//! work is done, and a failed call is terminal for that call. No retry
//! happens on this side.

use crate::metas::StyleId;
use crate::types::AccentPhrase;

/// Converts raw natural-language text into provisional accent phrases.
///
/// Implementations report failures as [`ErrorKind::AnalyzeTextFailed`];
/// errors pass through the pipeline verbatim.
///
/// [`ErrorKind::AnalyzeTextFailed`]: crate::ErrorKind::AnalyzeTextFailed
pub trait TextAnalyzer {
    fn analyze(&self, text: &str) -> crate::Result<Vec<AccentPhrase>>;
}

/// The inference engine behind every prediction and waveform render.
///
/// Phonemes are passed as ids into [`PHONEME_LIST`]; a missing consonant
/// slot is `-1`. Implementations report failures as
/// [`ErrorKind::InferenceFailed`]. Outputs of unexpected length are treated
/// as malformed by the callers and reported the same way.
///
/// Concurrent calls for independent style ids must be safe; the engine is
/// responsible for its own internal serialization.
///
/// [`PHONEME_LIST`]: crate::phoneme::PHONEME_LIST
/// [`ErrorKind::InferenceFailed`]: crate::ErrorKind::InferenceFailed
pub trait InferenceEngine {
    /// Seconds per phoneme, one entry per input phoneme.
    fn predict_duration(&self, phoneme_ids: &[i64], style_id: StyleId) -> crate::Result<Vec<f64>>;

    /// Pitch per mora. All slices have one entry per mora; the accent
    /// slices are one-hot markers.
    #[allow(clippy::too_many_arguments)]
    fn predict_intonation(
        &self,
        vowel_phoneme_ids: &[i64],
        consonant_phoneme_ids: &[i64],
        start_accent: &[i64],
        end_accent: &[i64],
        start_accent_phrase: &[i64],
        end_accent_phrase: &[i64],
        style_id: StyleId,
    ) -> crate::Result<Vec<f64>>;

    /// Renders talk audio from per-frame f0 and one-hot phoneme rows
    /// (`phoneme.len() == f0.len() * phoneme_size`). Returns one waveform
    /// sample block per frame.
    fn decode(
        &self,
        f0: &[f64],
        phoneme: &[f64],
        phoneme_size: usize,
        style_id: StyleId,
    ) -> crate::Result<Vec<f32>>;

    /// Frames to allot to each note's consonant. One entry per note;
    /// notes without a consonant are expected to come back as zero.
    fn predict_sing_consonant_length(
        &self,
        consonant_ids: &[i64],
        vowel_ids: &[i64],
        note_durations: &[i64],
        style_id: StyleId,
    ) -> crate::Result<Vec<i64>>;

    /// Per-frame fundamental frequency for a sung phrase.
    fn predict_sing_f0(
        &self,
        phoneme_ids: &[i64],
        note_keys: &[i64],
        style_id: StyleId,
    ) -> crate::Result<Vec<f64>>;

    /// Per-frame volume for a sung phrase.
    fn predict_sing_volume(
        &self,
        phoneme_ids: &[i64],
        note_keys: &[i64],
        f0: &[f64],
        style_id: StyleId,
    ) -> crate::Result<Vec<f64>>;

    /// Renders singing audio from per-frame phoneme ids, f0 and volume.
    fn frame_decode(
        &self,
        phoneme_ids: &[i64],
        f0: &[f64],
        volume: &[f64],
        style_id: StyleId,
    ) -> crate::Result<Vec<f32>>;
}
