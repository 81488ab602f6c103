
use serde::{Deserialize, Serialize};

use crate::DEFAULT_SAMPLING_RATE;

/// Query for one synthesis run. Field names double as the JSON schema.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AudioQuery {
    pub accent_phrases: Vec<AccentPhrase>,
    pub speed_scale: f64,
    pub pitch_scale: f64,
    pub intonation_scale: f64,
    pub volume_scale: f64,
    pub pre_phoneme_length: f64,
    pub post_phoneme_length: f64,
    pub output_sampling_rate: u32,
    pub output_stereo: bool,
    /// Overrides the predicted length of every pause mora, in seconds.
    #[serde(default)]
    pub pause_length: Option<f64>,
    /// Scales pause mora lengths after `pause_length` is applied.
    #[serde(default)]
    pub pause_length_scale: Option<f64>,
    /// Phonetic notation of the query. Output only: populated by the
    /// `audio_query*` constructors, never read back as input.
    #[serde(default)]
    pub kana: Option<String>,
}

impl AudioQuery {
    /// Wraps accent phrases with the default scale values and the kana
    /// rendition of the phrases.
    pub fn from_accent_phrases(accent_phrases: Vec<AccentPhrase>) -> Self {
        let kana = crate::kana::create_kana(&accent_phrases);
        Self {
            accent_phrases,
            speed_scale: 1.,
            pitch_scale: 0.,
            intonation_scale: 1.,
            volume_scale: 1.,
            pre_phoneme_length: 0.1,
            post_phoneme_length: 0.1,
            output_sampling_rate: DEFAULT_SAMPLING_RATE,
            output_stereo: false,
            pause_length: None,
            pause_length_scale: None,
            kana: Some(kana),
        }
    }

    pub(crate) fn with_kana(self, kana: Option<String>) -> Self {
        Self { kana, ..self }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AccentPhrase {
    pub moras: Vec<Mora>,
    /// 1-based index of the accent nucleus.
    pub accent: usize,
    pub pause_mora: Option<Mora>,
    #[serde(default)]
    pub is_interrogative: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Mora {
    pub text: String,
    pub consonant: Option<String>,
    pub consonant_length: Option<f64>,
    pub vowel: String,
    pub vowel_length: f64,
    /// Zero means unvoiced; the scale is defined by the inference engine.
    pub pitch: f64,
}

/// Opaque correlation token tying a frame phoneme back to its note.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct NoteId(pub String);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Note {
    #[serde(default)]
    pub id: Option<NoteId>,
    /// MIDI-like pitch number, 0..=127. Absent for a rest.
    #[serde(default)]
    pub key: Option<u8>,
    /// Katakana mora spelling. Empty for a rest.
    pub lyric: String,
    pub frame_length: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Score {
    pub notes: Vec<Note>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FramePhoneme {
    pub phoneme: String,
    pub frame_length: u64,
    #[serde(default)]
    pub note_id: Option<NoteId>,
}

/// Query for one frame-based (singing) synthesis run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FrameAudioQuery {
    /// Fundamental frequency per frame.
    pub f0: Vec<f64>,
    /// Volume per frame.
    pub volume: Vec<f64>,
    pub phonemes: Vec<FramePhoneme>,
    pub volume_scale: f64,
    pub output_sampling_rate: u32,
    pub output_stereo: bool,
}

impl FrameAudioQuery {
    pub(crate) fn from_parts(f0: Vec<f64>, volume: Vec<f64>, phonemes: Vec<FramePhoneme>) -> Self {
        Self {
            f0,
            volume,
            phonemes,
            volume_scale: 1.,
            output_sampling_rate: DEFAULT_SAMPLING_RATE,
            output_stereo: false,
        }
    }

    /// Summed frame length of the phoneme sequence. `f0` and `volume`
    /// must be exactly this long for the query to be valid.
    pub fn total_frames(&self) -> u64 {
        self.phonemes.iter().map(|p| p.frame_length).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_query_accepts_json_without_optional_fields() {
        let query: AudioQuery = serde_json::from_value(serde_json::json!({
            "accent_phrases": [
                {
                    "moras": [
                        {
                            "text": "ア",
                            "consonant": null,
                            "consonant_length": null,
                            "vowel": "a",
                            "vowel_length": 0.0,
                            "pitch": 5.0
                        }
                    ],
                    "accent": 1,
                    "pause_mora": null
                }
            ],
            "speed_scale": 1.0,
            "pitch_scale": 0.0,
            "intonation_scale": 1.0,
            "volume_scale": 1.0,
            "pre_phoneme_length": 0.1,
            "post_phoneme_length": 0.1,
            "output_sampling_rate": 24000,
            "output_stereo": false
        }))
        .unwrap();
        assert!(!query.accent_phrases[0].is_interrogative);
        assert_eq!(query.pause_length, None);
        assert_eq!(query.kana, None);
    }

    #[test]
    fn note_without_id_and_key_is_a_rest() {
        let note: Note =
            serde_json::from_str(r#"{ "lyric": "", "frame_length": 15 }"#).unwrap();
        assert_eq!(note.id, None);
        assert_eq!(note.key, None);
        assert_eq!(note.frame_length, 15);
    }

    #[test]
    fn frame_audio_query_round_trips() {
        let query = FrameAudioQuery::from_parts(
            vec![0., 5.5],
            vec![0., 0.5],
            vec![
                FramePhoneme {
                    phoneme: "pau".to_string(),
                    frame_length: 1,
                    note_id: None,
                },
                FramePhoneme {
                    phoneme: "a".to_string(),
                    frame_length: 1,
                    note_id: Some(NoteId("n1".to_string())),
                },
            ],
        );
        let json = serde_json::to_string(&query).unwrap();
        let back: FrameAudioQuery = serde_json::from_str(&json).unwrap();
        assert_eq!(query, back);
        assert_eq!(back.total_frames(), 2);
    }
}
