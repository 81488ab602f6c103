
//! The talk-synthesis pipeline and the voice-model lifecycle operations.

use std::io::Cursor;

use crate::engine::{InferenceEngine, TextAnalyzer};
use crate::error::{Error, ErrorKind};
use crate::kana;
use crate::metas::{CharacterMeta, StyleId, StyleType};
use crate::model::{VoiceModelFile, VoiceModelId};
use crate::phoneme;
use crate::status::{DuplicateModelPolicy, LoadedModels};
use crate::types::{AccentPhrase, AudioQuery, Mora};
use crate::validate::Validate;
use crate::DEFAULT_SAMPLING_RATE;

/// Options for [`Synthesizer::synthesis`].
#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    pub enable_interrogative_upspeak: bool,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            enable_interrogative_upspeak: true,
        }
    }
}

impl From<&TtsOptions> for SynthesisOptions {
    fn from(options: &TtsOptions) -> Self {
        Self {
            enable_interrogative_upspeak: options.enable_interrogative_upspeak,
        }
    }
}

/// Options for [`Synthesizer::tts`] and [`Synthesizer::tts_from_kana`].
#[derive(Debug, Clone)]
pub struct TtsOptions {
    pub enable_interrogative_upspeak: bool,
}

impl Default for TtsOptions {
    fn default() -> Self {
        Self {
            enable_interrogative_upspeak: true,
        }
    }
}

/// Construction-time configuration of a [`Synthesizer`].
#[derive(Debug, Default, Clone)]
pub struct SynthesizerOptions {
    pub duplicate_model_policy: DuplicateModelPolicy,
}

pub(crate) const TALK: &[StyleType] = &[StyleType::Talk];

/// Orchestrates the query model, the validator and the two external
/// collaborators into the text-to-waveform pipeline.
///
/// Every operation is synchronous and returns once the underlying engine
/// call (if any) has completed. Calls against independent style ids may
/// run concurrently; mutations of the loaded-model set must be
/// synchronized by the caller.
pub struct Synthesizer<E, A> {
    engine: E,
    analyzer: A,
    pub(crate) status: LoadedModels,
    options: SynthesizerOptions,
}

impl<E: InferenceEngine, A: TextAnalyzer> Synthesizer<E, A> {
    pub fn new(engine: E, analyzer: A, options: SynthesizerOptions) -> Self {
        Self {
            engine,
            analyzer,
            status: LoadedModels::default(),
            options,
        }
    }

    pub(crate) fn engine(&self) -> &E {
        &self.engine
    }

    /// Makes the styles of an opened model available for synthesis.
    /// The model file stays open for the duration of the call; a
    /// concurrent [`VoiceModelFile::close`] waits for it.
    pub fn load_voice_model(&self, model: &VoiceModelFile) -> crate::Result<()> {
        model.with_weights(|weights| {
            for style in model.metas().iter().flat_map(|character| &character.styles) {
                if !weights.contains_key(&style.id.to_string()) {
                    return Err(Error::new(
                        ErrorKind::InvalidModelData,
                        format!(
                            "voice model {} declares style {} but carries no weights for it",
                            model.id(),
                            style.id
                        ),
                    ));
                }
            }
            self.status.insert(
                model.id(),
                model.metas().to_vec(),
                self.options.duplicate_model_policy,
            )
        })
    }

    /// Removes every style belonging to the given model.
    pub fn unload_voice_model(&self, id: VoiceModelId) -> crate::Result<()> {
        self.status.remove(id)
    }

    pub fn is_loaded_voice_model(&self, id: VoiceModelId) -> bool {
        self.status.contains(id)
    }

    /// Merged metadata of all loaded models.
    pub fn metas(&self) -> Vec<CharacterMeta> {
        self.status.metas()
    }

    /// Text → accent phrases, with phoneme lengths and pitches already
    /// generated for the given style.
    pub fn create_accent_phrases(
        &self,
        text: &str,
        style_id: StyleId,
    ) -> crate::Result<Vec<AccentPhrase>> {
        self.status.ensure_style(style_id, TALK)?;
        let accent_phrases = self.analyzer.analyze(text)?;
        self.replace_mora_data(&accent_phrases, style_id)
    }

    /// Phonetic notation → accent phrases, bypassing the text analyzer.
    pub fn create_accent_phrases_from_kana(
        &self,
        kana: &str,
        style_id: StyleId,
    ) -> crate::Result<Vec<AccentPhrase>> {
        self.status.ensure_style(style_id, TALK)?;
        let accent_phrases = kana::parse_kana(kana)?;
        self.replace_mora_data(&accent_phrases, style_id)
    }

    /// Regenerates phoneme lengths and pitches. Composition of
    /// [`replace_phoneme_length`](Self::replace_phoneme_length) and
    /// [`replace_mora_pitch`](Self::replace_mora_pitch).
    pub fn replace_mora_data(
        &self,
        accent_phrases: &[AccentPhrase],
        style_id: StyleId,
    ) -> crate::Result<Vec<AccentPhrase>> {
        let accent_phrases = self.replace_phoneme_length(accent_phrases, style_id)?;
        self.replace_mora_pitch(&accent_phrases, style_id)
    }

    /// Regenerates only the consonant/vowel lengths; every other field
    /// passes through unchanged.
    pub fn replace_phoneme_length(
        &self,
        accent_phrases: &[AccentPhrase],
        style_id: StyleId,
    ) -> crate::Result<Vec<AccentPhrase>> {
        self.status.ensure_style(style_id, TALK)?;
        accent_phrases.validate()?;

        let (_, phoneme_symbols) = initial_process(accent_phrases);
        let (_, _, vowel_indexes) = split_mora(&phoneme_symbols);
        let phoneme_ids = to_phoneme_ids(&phoneme_symbols)?;

        let phoneme_lengths = self.engine.predict_duration(&phoneme_ids, style_id)?;
        if phoneme_lengths.len() != phoneme_ids.len() {
            return Err(malformed_output("predict_duration"));
        }

        let mut index = 0;
        let new_accent_phrases = accent_phrases
            .iter()
            .map(|accent_phrase| AccentPhrase {
                moras: accent_phrase
                    .moras
                    .iter()
                    .map(|mora| {
                        let new_mora = Mora {
                            consonant_length: mora
                                .consonant
                                .as_ref()
                                .map(|_| phoneme_lengths[vowel_indexes[index + 1] - 1]),
                            vowel_length: phoneme_lengths[vowel_indexes[index + 1]],
                            ..mora.clone()
                        };
                        index += 1;
                        new_mora
                    })
                    .collect(),
                pause_mora: accent_phrase.pause_mora.as_ref().map(|pause_mora| {
                    let new_pause_mora = Mora {
                        vowel_length: phoneme_lengths[vowel_indexes[index + 1]],
                        ..pause_mora.clone()
                    };
                    index += 1;
                    new_pause_mora
                }),
                ..accent_phrase.clone()
            })
            .collect();

        Ok(new_accent_phrases)
    }

    /// Regenerates only the mora pitches; every other field passes
    /// through unchanged.
    pub fn replace_mora_pitch(
        &self,
        accent_phrases: &[AccentPhrase],
        style_id: StyleId,
    ) -> crate::Result<Vec<AccentPhrase>> {
        self.status.ensure_style(style_id, TALK)?;
        accent_phrases.validate()?;

        let (_, phoneme_symbols) = initial_process(accent_phrases);

        let mut base_start_accent_list = vec![0];
        let mut base_end_accent_list = vec![0];
        let mut base_start_accent_phrase_list = vec![0];
        let mut base_end_accent_phrase_list = vec![0];
        for accent_phrase in accent_phrases {
            let mut accent = usize::from(accent_phrase.accent != 1);
            create_one_accent_list(&mut base_start_accent_list, accent_phrase, accent as i32);

            accent = accent_phrase.accent - 1;
            create_one_accent_list(&mut base_end_accent_list, accent_phrase, accent as i32);
            create_one_accent_list(&mut base_start_accent_phrase_list, accent_phrase, 0);
            create_one_accent_list(&mut base_end_accent_phrase_list, accent_phrase, -1);
        }
        base_start_accent_list.push(0);
        base_end_accent_list.push(0);
        base_start_accent_phrase_list.push(0);
        base_end_accent_phrase_list.push(0);

        let (consonant_symbols, vowel_symbols, vowel_indexes) = split_mora(&phoneme_symbols);

        let consonant_phoneme_ids: Vec<i64> = consonant_symbols
            .iter()
            .map(|consonant| match consonant {
                Some(consonant) => to_phoneme_id(consonant),
                None => Ok(-1),
            })
            .collect::<crate::Result<_>>()?;
        let vowel_phoneme_ids = to_phoneme_ids(&vowel_symbols)?;

        let mut start_accent_list = Vec::with_capacity(vowel_indexes.len());
        let mut end_accent_list = Vec::with_capacity(vowel_indexes.len());
        let mut start_accent_phrase_list = Vec::with_capacity(vowel_indexes.len());
        let mut end_accent_phrase_list = Vec::with_capacity(vowel_indexes.len());
        for vowel_index in &vowel_indexes {
            start_accent_list.push(base_start_accent_list[*vowel_index]);
            end_accent_list.push(base_end_accent_list[*vowel_index]);
            start_accent_phrase_list.push(base_start_accent_phrase_list[*vowel_index]);
            end_accent_phrase_list.push(base_end_accent_phrase_list[*vowel_index]);
        }

        let mut f0_list = self.engine.predict_intonation(
            &vowel_phoneme_ids,
            &consonant_phoneme_ids,
            &start_accent_list,
            &end_accent_list,
            &start_accent_phrase_list,
            &end_accent_phrase_list,
            style_id,
        )?;
        if f0_list.len() != vowel_phoneme_ids.len() {
            return Err(malformed_output("predict_intonation"));
        }

        for (i, vowel) in vowel_symbols.iter().enumerate() {
            if phoneme::is_unvoiced_mora_phoneme(vowel) {
                f0_list[i] = 0.;
            }
        }

        let mut index = 0;
        let new_accent_phrases = accent_phrases
            .iter()
            .map(|accent_phrase| AccentPhrase {
                moras: accent_phrase
                    .moras
                    .iter()
                    .map(|mora| {
                        let new_mora = Mora {
                            pitch: f0_list[index + 1],
                            ..mora.clone()
                        };
                        index += 1;
                        new_mora
                    })
                    .collect(),
                pause_mora: accent_phrase.pause_mora.as_ref().map(|pause_mora| {
                    let new_pause_mora = Mora {
                        pitch: f0_list[index + 1],
                        ..pause_mora.clone()
                    };
                    index += 1;
                    new_pause_mora
                }),
                ..accent_phrase.clone()
            })
            .collect();

        Ok(new_accent_phrases)
    }

    /// Text → [`AudioQuery`] with default scales.
    pub fn audio_query(&self, text: &str, style_id: StyleId) -> crate::Result<AudioQuery> {
        let accent_phrases = self.create_accent_phrases(text, style_id)?;
        Ok(AudioQuery::from_accent_phrases(accent_phrases))
    }

    /// Phonetic notation → [`AudioQuery`]; `kana` is set to the input.
    pub fn audio_query_from_kana(
        &self,
        kana: &str,
        style_id: StyleId,
    ) -> crate::Result<AudioQuery> {
        let accent_phrases = self.create_accent_phrases_from_kana(kana, style_id)?;
        Ok(AudioQuery::from_accent_phrases(accent_phrases).with_kana(Some(kana.to_owned())))
    }

    /// Renders an [`AudioQuery`] into WAV bytes.
    pub fn synthesis(
        &self,
        audio_query: &AudioQuery,
        style_id: StyleId,
        options: &SynthesisOptions,
    ) -> crate::Result<Vec<u8>> {
        self.status.ensure_style(style_id, TALK)?;
        audio_query.validate()?;

        let mut accent_phrases = apply_pause_overrides(
            &audio_query.accent_phrases,
            audio_query.pause_length,
            audio_query.pause_length_scale,
        );
        if options.enable_interrogative_upspeak {
            accent_phrases = adjust_interrogative_accent_phrases(&accent_phrases);
        }

        let samples = self.render_wave(&accent_phrases, audio_query, style_id)?;
        Ok(wav_from_samples(
            &samples,
            audio_query.volume_scale,
            audio_query.output_sampling_rate,
            audio_query.output_stereo,
        ))
    }

    /// Text → WAV bytes. Strictly the composition of
    /// [`audio_query`](Self::audio_query) and
    /// [`synthesis`](Self::synthesis).
    pub fn tts(&self, text: &str, style_id: StyleId, options: &TtsOptions) -> crate::Result<Vec<u8>> {
        let audio_query = self.audio_query(text, style_id)?;
        self.synthesis(&audio_query, style_id, &options.into())
    }

    /// Phonetic notation → WAV bytes.
    pub fn tts_from_kana(
        &self,
        kana: &str,
        style_id: StyleId,
        options: &TtsOptions,
    ) -> crate::Result<Vec<u8>> {
        let audio_query = self.audio_query_from_kana(kana, style_id)?;
        self.synthesis(&audio_query, style_id, &options.into())
    }

    /// Builds the per-frame feature arrays and runs the decoder.
    fn render_wave(
        &self,
        accent_phrases: &[AccentPhrase],
        audio_query: &AudioQuery,
        style_id: StyleId,
    ) -> crate::Result<Vec<f32>> {
        let (flatten_moras, phoneme_symbols) = initial_process(accent_phrases);

        let mut phoneme_length_list = vec![audio_query.pre_phoneme_length];
        let mut f0_list = vec![0.];
        let mut voiced_list = vec![false];
        {
            let mut sum_of_voiced_f0 = 0.;
            let mut count_of_voiced_f0 = 0u32;
            for mora in &flatten_moras {
                if let Some(consonant_length) = mora.consonant_length {
                    phoneme_length_list.push(consonant_length);
                }
                phoneme_length_list.push(mora.vowel_length);

                let f0 = mora.pitch * 2f64.powf(audio_query.pitch_scale);
                f0_list.push(f0);
                let voiced = f0 > 0.;
                voiced_list.push(voiced);
                if voiced {
                    sum_of_voiced_f0 += f0;
                    count_of_voiced_f0 += 1;
                }
            }
            phoneme_length_list.push(audio_query.post_phoneme_length);
            f0_list.push(0.);
            voiced_list.push(false);

            if count_of_voiced_f0 > 0 {
                let mean_f0 = sum_of_voiced_f0 / f64::from(count_of_voiced_f0);
                for (f0, voiced) in f0_list.iter_mut().zip(&voiced_list) {
                    if *voiced {
                        *f0 = (*f0 - mean_f0) * audio_query.intonation_scale + mean_f0;
                    }
                }
            }
        }

        let (_, _, vowel_indexes) = split_mora(&phoneme_symbols);
        let phoneme_ids = to_phoneme_ids(&phoneme_symbols)?;

        let phoneme_size = phoneme::PHONEME_LIST.len();
        let mut phoneme_frames: Vec<f64> = Vec::new();
        let mut f0_frames: Vec<f64> = Vec::new();
        {
            let rate = f64::from(DEFAULT_SAMPLING_RATE) / 256.;
            let mut frames_since_last_vowel = 0;
            let mut f0_index = 0;
            let mut vowel_cursor = 0;

            for (i, phoneme_length) in phoneme_length_list.iter().enumerate() {
                // round to even to match the reference engine's behavior
                let frames = ((phoneme_length * rate).round_ties_even()
                    / audio_query.speed_scale)
                    .round_ties_even() as usize;
                for _ in 0..frames {
                    let row_start = phoneme_frames.len();
                    phoneme_frames.resize(row_start + phoneme_size, 0.);
                    phoneme_frames[row_start + phoneme_ids[i] as usize] = 1.;
                }
                frames_since_last_vowel += frames;

                if vowel_cursor < vowel_indexes.len() && i == vowel_indexes[vowel_cursor] {
                    for _ in 0..frames_since_last_vowel {
                        f0_frames.push(f0_list[f0_index]);
                    }
                    f0_index += 1;
                    frames_since_last_vowel = 0;
                    vowel_cursor += 1;
                }
            }
        }

        log::debug!(
            "rendering {} frames for style {style_id}",
            f0_frames.len()
        );
        self.engine
            .decode(&f0_frames, &phoneme_frames, phoneme_size, style_id)
    }
}

fn malformed_output(operation: &str) -> Error {
    Error::new(
        ErrorKind::InferenceFailed,
        format!("`{operation}` returned output of unexpected length"),
    )
}

fn to_phoneme_id(symbol: &str) -> crate::Result<i64> {
    phoneme::phoneme_id(symbol).ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidQuery,
            format!("`{symbol}` is not a known phoneme"),
        )
    })
}

fn to_phoneme_ids(symbols: &[String]) -> crate::Result<Vec<i64>> {
    symbols.iter().map(|symbol| to_phoneme_id(symbol)).collect()
}

/// Flattens accent phrases into their moras (pause moras included) and the
/// phoneme sequence framed by `pau` on both sides.
pub(crate) fn initial_process(accent_phrases: &[AccentPhrase]) -> (Vec<Mora>, Vec<String>) {
    let mut flatten_moras = Vec::new();
    for AccentPhrase {
        moras, pause_mora, ..
    } in accent_phrases
    {
        flatten_moras.extend(moras.iter().cloned());
        if let Some(pause_mora) = pause_mora {
            flatten_moras.push(pause_mora.clone());
        }
    }

    let mut phoneme_symbols = vec!["pau".to_string()];
    for mora in &flatten_moras {
        if let Some(consonant) = &mora.consonant {
            phoneme_symbols.push(consonant.clone());
        }
        phoneme_symbols.push(mora.vowel.clone());
    }
    phoneme_symbols.push("pau".to_string());

    (flatten_moras, phoneme_symbols)
}

/// Splits a phoneme sequence at mora boundaries: per mora, the optional
/// consonant, the tail phoneme, and the tail's index in the sequence.
pub(crate) fn split_mora(
    phoneme_symbols: &[String],
) -> (Vec<Option<String>>, Vec<String>, Vec<usize>) {
    let vowel_indexes: Vec<usize> = phoneme_symbols
        .iter()
        .enumerate()
        .filter(|(_, symbol)| phoneme::is_mora_tail(symbol))
        .map(|(i, _)| i)
        .collect();

    let vowel_symbols = vowel_indexes
        .iter()
        .map(|&i| phoneme_symbols[i].clone())
        .collect();

    let mut consonant_symbols: Vec<Option<String>> = vec![None];
    for window in vowel_indexes.windows(2) {
        let (prev, next) = (window[0], window[1]);
        consonant_symbols.push(if next - prev == 1 {
            None
        } else {
            Some(phoneme_symbols[next - 1].clone())
        });
    }

    (consonant_symbols, vowel_symbols, vowel_indexes)
}

fn create_one_accent_list(accent_list: &mut Vec<i64>, accent_phrase: &AccentPhrase, point: i32) {
    let mut one_accent_list: Vec<i64> = Vec::new();
    for (i, mora) in accent_phrase.moras.iter().enumerate() {
        let value = i64::from(
            i as i32 == point
                || (point < 0 && i == (accent_phrase.moras.len() as i32 + point) as usize),
        );
        one_accent_list.push(value);
        if mora.consonant.is_some() {
            one_accent_list.push(value);
        }
    }
    if accent_phrase.pause_mora.is_some() {
        one_accent_list.push(0);
    }
    accent_list.extend(one_accent_list);
}

fn apply_pause_overrides(
    accent_phrases: &[AccentPhrase],
    pause_length: Option<f64>,
    pause_length_scale: Option<f64>,
) -> Vec<AccentPhrase> {
    if pause_length.is_none() && pause_length_scale.is_none() {
        return accent_phrases.to_vec();
    }
    accent_phrases
        .iter()
        .map(|accent_phrase| AccentPhrase {
            pause_mora: accent_phrase.pause_mora.as_ref().map(|pause_mora| {
                let mut vowel_length = pause_length.unwrap_or(pause_mora.vowel_length);
                if let Some(scale) = pause_length_scale {
                    vowel_length *= scale;
                }
                Mora {
                    vowel_length,
                    ..pause_mora.clone()
                }
            }),
            ..accent_phrase.clone()
        })
        .collect()
}

fn adjust_interrogative_accent_phrases(accent_phrases: &[AccentPhrase]) -> Vec<AccentPhrase> {
    accent_phrases
        .iter()
        .map(|accent_phrase| AccentPhrase {
            moras: adjust_interrogative_moras(accent_phrase),
            ..accent_phrase.clone()
        })
        .collect()
}

fn adjust_interrogative_moras(accent_phrase: &AccentPhrase) -> Vec<Mora> {
    if accent_phrase.is_interrogative {
        if let Some(last_mora) = accent_phrase.moras.last() {
            if last_mora.pitch != 0. {
                let mut moras = accent_phrase.moras.clone();
                moras.push(make_interrogative_mora(last_mora));
                return moras;
            }
        }
    }
    accent_phrase.moras.clone()
}

/// The appended rising mora: short, voiced, a bounded step above the
/// phrase-final pitch.
fn make_interrogative_mora(last_mora: &Mora) -> Mora {
    const FIX_VOWEL_LENGTH: f64 = 0.15;
    const ADJUST_PITCH: f64 = 0.3;
    const MAX_PITCH: f64 = 6.5;

    Mora {
        text: phoneme::mora_to_text(None, &last_mora.vowel),
        consonant: None,
        consonant_length: None,
        vowel: last_mora.vowel.clone(),
        vowel_length: FIX_VOWEL_LENGTH,
        pitch: (last_mora.pitch + ADJUST_PITCH).min(MAX_PITCH),
    }
}

pub(crate) fn wav_from_samples(
    samples: &[f32],
    volume_scale: f64,
    output_sampling_rate: u32,
    output_stereo: bool,
) -> Vec<u8> {
    let channels: u16 = if output_stereo { 2 } else { 1 };
    let repeat =
        (output_sampling_rate / DEFAULT_SAMPLING_RATE).max(1) as usize * channels as usize;

    let spec = hound::WavSpec {
        channels,
        sample_rate: output_sampling_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    let mut writer =
        hound::WavWriter::new(&mut cursor, spec).expect("in-memory WAV writing is infallible");
    for sample in samples {
        let value = (f64::from(*sample) * volume_scale).clamp(-1., 1.);
        let value = (value * f64::from(i16::MAX)) as i16;
        for _ in 0..repeat {
            writer
                .write_sample(value)
                .expect("in-memory WAV writing is infallible");
        }
    }
    writer
        .finalize()
        .expect("in-memory WAV writing is infallible");
    cursor.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mora(text: &str, consonant: Option<&str>, vowel: &str, pitch: f64) -> Mora {
        Mora {
            text: text.to_string(),
            consonant: consonant.map(str::to_string),
            consonant_length: consonant.map(|_| 0.05),
            vowel: vowel.to_string(),
            vowel_length: 0.1,
            pitch,
        }
    }

    #[test]
    fn initial_process_frames_with_pau() {
        let phrases = vec![AccentPhrase {
            moras: vec![mora("コ", Some("k"), "o", 5.0), mora("ン", None, "N", 5.0)],
            accent: 1,
            pause_mora: Some(mora("、", None, "pau", 0.0)),
            is_interrogative: false,
        }];
        let (moras, symbols) = initial_process(&phrases);
        assert_eq!(moras.len(), 3);
        assert_eq!(symbols, ["pau", "k", "o", "N", "pau", "pau"]);
    }

    #[test]
    fn split_mora_pairs_consonants_with_tails() {
        let symbols: Vec<String> = ["pau", "k", "o", "N", "pau"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let (consonants, vowels, indexes) = split_mora(&symbols);
        assert_eq!(vowels, ["pau", "o", "N", "pau"]);
        assert_eq!(indexes, [0, 2, 3, 4]);
        assert_eq!(
            consonants,
            [None, Some("k".to_string()), None, None]
        );
    }

    #[test]
    fn interrogative_mora_is_appended_only_when_voiced() {
        let voiced = AccentPhrase {
            moras: vec![mora("カ", Some("k"), "a", 5.0)],
            accent: 1,
            pause_mora: None,
            is_interrogative: true,
        };
        let adjusted = adjust_interrogative_moras(&voiced);
        assert_eq!(adjusted.len(), 2);
        assert_eq!(adjusted[1].text, "ア");
        assert_eq!(adjusted[1].vowel, "a");
        assert_eq!(adjusted[1].vowel_length, 0.15);
        assert!((adjusted[1].pitch - 5.3).abs() < 1e-9);

        let unvoiced = AccentPhrase {
            moras: vec![mora("ッ", None, "cl", 0.0)],
            is_interrogative: true,
            ..voiced.clone()
        };
        assert_eq!(adjust_interrogative_moras(&unvoiced).len(), 1);

        let plain = AccentPhrase {
            is_interrogative: false,
            ..voiced
        };
        assert_eq!(adjust_interrogative_moras(&plain).len(), 1);
    }

    #[test]
    fn interrogative_pitch_is_capped() {
        let high = mora("カ", Some("k"), "a", 6.4);
        let appended = make_interrogative_mora(&high);
        assert_eq!(appended.pitch, 6.5);
    }

    #[test]
    fn pause_overrides_touch_only_pause_moras() {
        let phrases = vec![AccentPhrase {
            moras: vec![mora("カ", Some("k"), "a", 5.0)],
            accent: 1,
            pause_mora: Some(mora("、", None, "pau", 0.0)),
            is_interrogative: false,
        }];
        let adjusted = apply_pause_overrides(&phrases, Some(0.4), Some(2.0));
        assert_eq!(adjusted[0].moras[0].vowel_length, 0.1);
        assert_eq!(adjusted[0].pause_mora.as_ref().unwrap().vowel_length, 0.8);

        let untouched = apply_pause_overrides(&phrases, None, None);
        assert_eq!(untouched, phrases);
    }

    #[test]
    fn wav_header_reflects_output_format() {
        let samples = vec![0.0f32; 24000];
        let mono = wav_from_samples(&samples, 1.0, 24000, false);
        assert_eq!(&mono[..4], b"RIFF");
        assert_eq!(&mono[8..12], b"WAVE");
        // 16-bit mono: data = 2 bytes per sample
        assert_eq!(mono.len(), 44 + samples.len() * 2);

        let stereo = wav_from_samples(&samples, 1.0, 24000, true);
        assert_eq!(stereo.len(), 44 + samples.len() * 4);

        let upsampled = wav_from_samples(&samples, 1.0, 48000, false);
        assert_eq!(upsampled.len(), 44 + samples.len() * 4);
    }
}
