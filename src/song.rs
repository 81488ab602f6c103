
//! Frame-based (singing) synthesis: the Score → FrameAudioQuery pipeline
//! and the score/query compatibility check.

use crate::engine::{InferenceEngine, TextAnalyzer};
use crate::error::{Error, ErrorKind};
use crate::metas::{StyleId, StyleType};
use crate::phoneme;
use crate::synthesizer::{wav_from_samples, Synthesizer};
use crate::types::{FrameAudioQuery, FramePhoneme, Note, Score};
use crate::validate::Validate;

const SINGING_TEACHER: &[StyleType] = &[StyleType::SingingTeacher];
const FRAME_RENDER: &[StyleType] = &[StyleType::FrameDecode, StyleType::Sing];

/// Phoneme spelling of a note's lyric: `(consonant, mora tail)`.
/// A rest maps to a bare `pau`.
fn note_phonemes(note: &Note) -> crate::Result<(Option<&'static str>, &'static str)> {
    if note.key.is_none() && note.lyric.is_empty() {
        return Ok((None, "pau"));
    }
    phoneme::lookup_mora_text(&note.lyric).ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidQuery,
            format!("`{}` is not a single mora", note.lyric),
        )
    })
}

fn note_key(note: &Note) -> i64 {
    note.key.map(i64::from).unwrap_or(-1)
}

/// The phoneme-id sequence a score implies: one `pau` per rest, the
/// consonant (if any) followed by the mora tail per pitched note.
fn score_phoneme_ids(score: &Score) -> crate::Result<Vec<i64>> {
    let mut ids = Vec::new();
    for note in &score.notes {
        let (consonant, vowel) = note_phonemes(note)?;
        if let Some(consonant) = consonant {
            ids.push(symbol_to_id(consonant)?);
        }
        ids.push(symbol_to_id(vowel)?);
    }
    Ok(ids)
}

fn symbol_to_id(symbol: &str) -> crate::Result<i64> {
    phoneme::phoneme_id(symbol).ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidQuery,
            format!("`{symbol}` is not a known phoneme"),
        )
    })
}

fn malformed_output(operation: &str) -> Error {
    Error::new(
        ErrorKind::InferenceFailed,
        format!("`{operation}` returned output of unexpected length"),
    )
}

/// Checks that a score and a frame query are built from the same phoneme
/// sequence and can therefore be combined for f0/volume regeneration.
///
/// The comparison is over phoneme ids, not spellings, so synonyms (`sil`
/// vs `pau`) are treated as equal. Both inputs must pass their own
/// validation first.
pub fn ensure_compatible(score: &Score, frame_audio_query: &FrameAudioQuery) -> crate::Result<()> {
    score.validate()?;
    frame_audio_query.validate()?;

    let from_score = score_phoneme_ids(score)?;
    let from_query = frame_audio_query
        .phonemes
        .iter()
        .map(|frame_phoneme| symbol_to_id(&frame_phoneme.phoneme))
        .collect::<crate::Result<Vec<_>>>()?;

    if from_score != from_query {
        return Err(Error::new(
            ErrorKind::IncompatibleQueries,
            format!(
                "the score implies the phoneme-id sequence {from_score:?} but the query carries {from_query:?}"
            ),
        ));
    }
    Ok(())
}

/// Walks the score and the query in lockstep: per query phoneme, its id,
/// its frame length from the query, and the key of the owning note.
/// Callers must have passed [`ensure_compatible`] first.
fn zip_query_with_score(
    score: &Score,
    frame_audio_query: &FrameAudioQuery,
) -> crate::Result<Vec<(i64, u64, i64)>> {
    let mut zipped = Vec::with_capacity(frame_audio_query.phonemes.len());
    let mut query_phonemes = frame_audio_query.phonemes.iter();
    for note in &score.notes {
        let (consonant, vowel) = note_phonemes(note)?;
        for symbol in consonant.into_iter().chain([vowel]) {
            let frame_phoneme = query_phonemes.next().ok_or_else(|| {
                Error::new(
                    ErrorKind::IncompatibleQueries,
                    "the query has fewer phonemes than the score implies".to_string(),
                )
            })?;
            zipped.push((
                symbol_to_id(symbol)?,
                frame_phoneme.frame_length,
                note_key(note),
            ));
        }
    }
    Ok(zipped)
}

fn expand_frames(per_phoneme: &[(i64, u64, i64)]) -> (Vec<i64>, Vec<i64>) {
    let total: u64 = per_phoneme.iter().map(|(_, frames, _)| frames).sum();
    let mut phoneme_ids = Vec::with_capacity(total as usize);
    let mut keys = Vec::with_capacity(total as usize);
    for (id, frames, key) in per_phoneme {
        for _ in 0..*frames {
            phoneme_ids.push(*id);
            keys.push(*key);
        }
    }
    (phoneme_ids, keys)
}

impl<E: InferenceEngine, A: TextAnalyzer> Synthesizer<E, A> {
    /// Expands a score into a frame query: per-phoneme frame lengths and
    /// generated f0/volume contours. A note's frames are split between the
    /// consonant and the tail of its lyric mora, so the note's total frame
    /// count is preserved and both phonemes carry the note's id.
    pub fn create_frame_audio_query(
        &self,
        score: &Score,
        style_id: StyleId,
    ) -> crate::Result<FrameAudioQuery> {
        self.status.ensure_style(style_id, SINGING_TEACHER)?;
        score.validate()?;

        let notes = &score.notes;
        let mut spelled = Vec::with_capacity(notes.len());
        let mut consonant_ids = Vec::with_capacity(notes.len());
        let mut vowel_ids = Vec::with_capacity(notes.len());
        let mut durations = Vec::with_capacity(notes.len());
        for note in notes {
            let (consonant, vowel) = note_phonemes(note)?;
            spelled.push((consonant, vowel));
            consonant_ids.push(match consonant {
                Some(consonant) => symbol_to_id(consonant)?,
                None => -1,
            });
            vowel_ids.push(symbol_to_id(vowel)?);
            durations.push(note.frame_length as i64);
        }

        let consonant_lengths = self.engine().predict_sing_consonant_length(
            &consonant_ids,
            &vowel_ids,
            &durations,
            style_id,
        )?;
        if consonant_lengths.len() != notes.len() {
            return Err(malformed_output("predict_sing_consonant_length"));
        }

        let mut phonemes = Vec::new();
        let mut per_phoneme = Vec::new();
        for (i, note) in notes.iter().enumerate() {
            let (consonant, vowel) = spelled[i];
            let note_frames = note.frame_length;
            let consonant_frames = match consonant {
                Some(_) if note_frames > 1 => {
                    consonant_lengths[i].clamp(1, note_frames as i64 - 1) as u64
                }
                _ => 0,
            };
            if let Some(consonant) = consonant {
                phonemes.push(FramePhoneme {
                    phoneme: consonant.to_string(),
                    frame_length: consonant_frames,
                    note_id: note.id.clone(),
                });
                per_phoneme.push((symbol_to_id(consonant)?, consonant_frames, note_key(note)));
            }
            phonemes.push(FramePhoneme {
                phoneme: vowel.to_string(),
                frame_length: note_frames - consonant_frames,
                note_id: note.id.clone(),
            });
            per_phoneme.push((
                symbol_to_id(vowel)?,
                note_frames - consonant_frames,
                note_key(note),
            ));
        }

        let (frame_phoneme_ids, frame_keys) = expand_frames(&per_phoneme);
        let total_frames = frame_phoneme_ids.len();

        let f0 = self
            .engine()
            .predict_sing_f0(&frame_phoneme_ids, &frame_keys, style_id)?;
        if f0.len() != total_frames {
            return Err(malformed_output("predict_sing_f0"));
        }
        let volume =
            self.engine()
                .predict_sing_volume(&frame_phoneme_ids, &frame_keys, &f0, style_id)?;
        if volume.len() != total_frames {
            return Err(malformed_output("predict_sing_volume"));
        }

        Ok(FrameAudioQuery::from_parts(f0, volume, phonemes))
    }

    /// Regenerates the f0 contour for an existing frame query, keeping its
    /// phoneme layout.
    pub fn create_frame_f0(
        &self,
        score: &Score,
        frame_audio_query: &FrameAudioQuery,
        style_id: StyleId,
    ) -> crate::Result<Vec<f64>> {
        self.status.ensure_style(style_id, SINGING_TEACHER)?;
        ensure_compatible(score, frame_audio_query)?;

        let per_phoneme = zip_query_with_score(score, frame_audio_query)?;
        let (frame_phoneme_ids, frame_keys) = expand_frames(&per_phoneme);
        let f0 = self
            .engine()
            .predict_sing_f0(&frame_phoneme_ids, &frame_keys, style_id)?;
        if f0.len() != frame_phoneme_ids.len() {
            return Err(malformed_output("predict_sing_f0"));
        }
        Ok(f0)
    }

    /// Regenerates the volume contour for an existing frame query, keeping
    /// its phoneme layout and f0.
    pub fn create_frame_volume(
        &self,
        score: &Score,
        frame_audio_query: &FrameAudioQuery,
        style_id: StyleId,
    ) -> crate::Result<Vec<f64>> {
        self.status.ensure_style(style_id, SINGING_TEACHER)?;
        ensure_compatible(score, frame_audio_query)?;

        let per_phoneme = zip_query_with_score(score, frame_audio_query)?;
        let (frame_phoneme_ids, frame_keys) = expand_frames(&per_phoneme);
        let volume = self.engine().predict_sing_volume(
            &frame_phoneme_ids,
            &frame_keys,
            &frame_audio_query.f0,
            style_id,
        )?;
        if volume.len() != frame_phoneme_ids.len() {
            return Err(malformed_output("predict_sing_volume"));
        }
        Ok(volume)
    }

    /// Renders a frame query into WAV bytes.
    pub fn frame_synthesis(
        &self,
        frame_audio_query: &FrameAudioQuery,
        style_id: StyleId,
    ) -> crate::Result<Vec<u8>> {
        self.status.ensure_style(style_id, FRAME_RENDER)?;
        frame_audio_query.validate()?;

        let mut frame_phoneme_ids =
            Vec::with_capacity(frame_audio_query.total_frames() as usize);
        for frame_phoneme in &frame_audio_query.phonemes {
            let id = symbol_to_id(&frame_phoneme.phoneme)?;
            for _ in 0..frame_phoneme.frame_length {
                frame_phoneme_ids.push(id);
            }
        }

        let samples = self.engine().frame_decode(
            &frame_phoneme_ids,
            &frame_audio_query.f0,
            &frame_audio_query.volume,
            style_id,
        )?;
        Ok(wav_from_samples(
            &samples,
            frame_audio_query.volume_scale,
            frame_audio_query.output_sampling_rate,
            frame_audio_query.output_stereo,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NoteId;

    fn rest(frames: u64) -> Note {
        Note {
            id: None,
            key: None,
            lyric: String::new(),
            frame_length: frames,
        }
    }

    fn pitched(key: u8, lyric: &str, frames: u64) -> Note {
        Note {
            id: Some(NoteId(format!("{lyric}-{key}"))),
            key: Some(key),
            lyric: lyric.to_string(),
            frame_length: frames,
        }
    }

    fn query_with(symbols: &[&str]) -> FrameAudioQuery {
        let phonemes: Vec<FramePhoneme> = symbols
            .iter()
            .map(|symbol| FramePhoneme {
                phoneme: symbol.to_string(),
                frame_length: 1,
                note_id: None,
            })
            .collect();
        let frames = phonemes.len();
        FrameAudioQuery::from_parts(vec![5.; frames], vec![0.5; frames], phonemes)
    }

    #[test]
    fn score_expansion_spells_each_note() {
        let score = Score {
            notes: vec![rest(15), pitched(60, "ド", 45), pitched(64, "ミ", 45), rest(15)],
        };
        let ids = score_phoneme_ids(&score).unwrap();
        let expected: Vec<i64> = ["pau", "d", "o", "m", "i", "pau"]
            .iter()
            .map(|s| phoneme::phoneme_id(s).unwrap())
            .collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn matching_sequences_are_compatible() {
        let score = Score {
            notes: vec![
                rest(15),
                pitched(60, "ド", 45),
                pitched(62, "レ", 45),
                pitched(64, "ミ", 45),
                rest(15),
            ],
        };
        let query = query_with(&["pau", "d", "o", "r", "e", "m", "i", "pau"]);
        ensure_compatible(&score, &query).unwrap();
    }

    #[test]
    fn sil_spelling_is_compatible_with_pau() {
        let score = Score {
            notes: vec![rest(15), pitched(60, "ド", 45)],
        };
        let query = query_with(&["sil", "d", "o"]);
        ensure_compatible(&score, &query).unwrap();
    }

    #[test]
    fn mismatched_sequences_are_incompatible() {
        let score = Score {
            notes: vec![rest(15), pitched(0, "ア", 45)],
        };
        let query = query_with(&["pau", "i"]);
        let err = ensure_compatible(&score, &query).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncompatibleQueries);
    }

    #[test]
    fn invalid_inputs_fail_validation_before_comparison() {
        let invalid_score = Score { notes: vec![] };
        let query = query_with(&["pau"]);
        assert_eq!(
            ensure_compatible(&invalid_score, &query).unwrap_err().kind(),
            ErrorKind::InvalidQuery
        );

        let score = Score {
            notes: vec![rest(1)],
        };
        let invalid_query = query_with(&["nope"]);
        assert_eq!(
            ensure_compatible(&score, &invalid_query).unwrap_err().kind(),
            ErrorKind::InvalidQuery
        );
    }
}
