
//! Invariant checks for the query model.
//!
//! Validation is never implicit: constructing or deserializing a query does
//! not run it. Callers holding externally produced data are expected to call
//! [`Validate::validate`] before relying on the value being well-formed.
//! Hard violations produce an `invalid-query` error; soft violations are
//! logged at WARN level and are planned to become hard in a future revision.

use std::fmt::{self, Display};

use crate::error::{Error, ErrorKind};
use crate::phoneme;
use crate::types::{AccentPhrase, AudioQuery, FrameAudioQuery, FramePhoneme, Mora, Note, Score};
use crate::DEFAULT_SAMPLING_RATE;

/// Notes are exchanged with JavaScript frontends, so frame counts must
/// stay inside the contiguous integer range of an IEEE double.
pub(crate) const MAX_NOTE_FRAME_LENGTH: u64 = 1 << 53;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Rejected with an `invalid-query` error.
    Hard,
    /// Logged only. Planned to become hard; do not rely on acceptance.
    Soft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    PhonemeShape,
    NumericRange,
    Structural,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub severity: Severity,
    pub detail: String,
}

impl Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.detail)
    }
}

pub trait Validate {
    /// Collects every violation. Pure: same input, same list, no logging.
    fn violations(&self) -> Vec<Violation>;

    /// Logs soft violations and fails on hard ones.
    fn validate(&self) -> crate::Result<()> {
        let mut hard = Vec::new();
        for violation in self.violations() {
            match violation.severity {
                Severity::Soft => log::warn!("{violation}"),
                Severity::Hard => hard.push(violation.detail),
            }
        }
        if hard.is_empty() {
            Ok(())
        } else {
            Err(Error::new(ErrorKind::InvalidQuery, hard.join("; ")))
        }
    }
}

fn hard(kind: ViolationKind, detail: String) -> Violation {
    Violation {
        kind,
        severity: Severity::Hard,
        detail,
    }
}

fn soft(kind: ViolationKind, detail: String) -> Violation {
    Violation {
        kind,
        severity: Severity::Soft,
        detail,
    }
}

fn check_finite(out: &mut Vec<Violation>, field: &str, value: f64) {
    if value.is_nan() || value.is_infinite() {
        out.push(soft(
            ViolationKind::NumericRange,
            format!("`{field}` should be finite, got {value}"),
        ));
    }
}

fn check_finite_non_negative(out: &mut Vec<Violation>, field: &str, value: f64) {
    if value.is_nan() || value.is_infinite() {
        check_finite(out, field, value);
    } else if value.is_sign_negative() && value != 0. {
        out.push(soft(
            ViolationKind::NumericRange,
            format!("`{field}` should not be negative, got {value}"),
        ));
    }
}

fn check_sampling_rate(out: &mut Vec<Violation>, rate: u32) {
    if rate == 0 {
        out.push(hard(
            ViolationKind::NumericRange,
            "`output_sampling_rate` must not be zero".to_string(),
        ));
    } else if rate % DEFAULT_SAMPLING_RATE != 0 {
        out.push(hard(
            ViolationKind::NumericRange,
            format!("`output_sampling_rate` must be a multiple of {DEFAULT_SAMPLING_RATE}, got {rate}"),
        ));
    } else if rate != DEFAULT_SAMPLING_RATE {
        out.push(soft(
            ViolationKind::NumericRange,
            format!("`output_sampling_rate` should equal {DEFAULT_SAMPLING_RATE}, got {rate}"),
        ));
    }
}

fn nest(out: &mut Vec<Violation>, prefix: &str, violations: Vec<Violation>) {
    out.extend(violations.into_iter().map(|violation| Violation {
        detail: format!("{prefix}: {}", violation.detail),
        ..violation
    }));
}

impl Validate for Mora {
    fn violations(&self) -> Vec<Violation> {
        let mut out = Vec::new();

        match (&self.consonant, self.consonant_length) {
            (Some(consonant), Some(length)) => {
                if !phoneme::is_consonant(consonant) {
                    out.push(hard(
                        ViolationKind::PhonemeShape,
                        format!("`{consonant}` is not a consonant phoneme"),
                    ));
                }
                check_finite_non_negative(&mut out, "consonant_length", length);
            }
            (None, None) => {}
            (Some(_), None) | (None, Some(_)) => {
                out.push(hard(
                    ViolationKind::Structural,
                    "`consonant` and `consonant_length` must be present together".to_string(),
                ));
            }
        }

        if !phoneme::is_mora_tail(&self.vowel) {
            out.push(hard(
                ViolationKind::PhonemeShape,
                format!("`{}` is not a vowel phoneme", self.vowel),
            ));
        }
        check_finite_non_negative(&mut out, "vowel_length", self.vowel_length);
        check_finite(&mut out, "pitch", self.pitch);

        out
    }
}

impl Validate for AccentPhrase {
    fn violations(&self) -> Vec<Violation> {
        let mut out = Vec::new();

        if self.moras.is_empty() {
            out.push(hard(
                ViolationKind::Structural,
                "accent phrase has no moras".to_string(),
            ));
        }
        for (i, mora) in self.moras.iter().enumerate() {
            nest(&mut out, &format!("moras[{i}]"), mora.violations());
        }
        if let Some(pause_mora) = &self.pause_mora {
            nest(&mut out, "pause_mora", pause_mora.violations());
        }

        if self.accent == 0 {
            out.push(hard(
                ViolationKind::Structural,
                "`accent` must not be zero".to_string(),
            ));
        } else if self.accent > self.moras.len() {
            // tolerated for now, staged to become an error
            out.push(soft(
                ViolationKind::Structural,
                format!(
                    "`accent` ({}) exceeds the number of moras ({})",
                    self.accent,
                    self.moras.len()
                ),
            ));
        }

        out
    }
}

impl Validate for [AccentPhrase] {
    fn violations(&self) -> Vec<Violation> {
        let mut out = Vec::new();
        for (i, phrase) in self.iter().enumerate() {
            nest(&mut out, &format!("accent_phrases[{i}]"), phrase.violations());
        }
        out
    }
}

impl Validate for AudioQuery {
    fn violations(&self) -> Vec<Violation> {
        let mut out = Vec::new();

        if self.accent_phrases.is_empty() {
            out.push(hard(
                ViolationKind::Structural,
                "`accent_phrases` must not be empty".to_string(),
            ));
        }
        out.extend(self.accent_phrases.as_slice().violations());

        check_finite_non_negative(&mut out, "speed_scale", self.speed_scale);
        check_finite(&mut out, "pitch_scale", self.pitch_scale);
        check_finite(&mut out, "intonation_scale", self.intonation_scale);
        check_finite_non_negative(&mut out, "volume_scale", self.volume_scale);
        check_finite_non_negative(&mut out, "pre_phoneme_length", self.pre_phoneme_length);
        check_finite_non_negative(&mut out, "post_phoneme_length", self.post_phoneme_length);
        if let Some(pause_length) = self.pause_length {
            check_finite_non_negative(&mut out, "pause_length", pause_length);
        }
        if let Some(pause_length_scale) = self.pause_length_scale {
            check_finite_non_negative(&mut out, "pause_length_scale", pause_length_scale);
        }
        check_sampling_rate(&mut out, self.output_sampling_rate);

        out
    }
}

impl Validate for Note {
    fn violations(&self) -> Vec<Violation> {
        let mut out = Vec::new();

        match (self.key, self.lyric.is_empty()) {
            (None, true) => {} // rest
            (Some(key), false) => {
                if key > 127 {
                    out.push(hard(
                        ViolationKind::NumericRange,
                        format!("`key` must be within 0..=127, got {key}"),
                    ));
                }
                if self.lyric.starts_with(phoneme::UNVOICE_SYMBOL)
                    || phoneme::lookup_mora_text(&self.lyric).is_none()
                {
                    out.push(hard(
                        ViolationKind::PhonemeShape,
                        format!("`{}` is not a single mora", self.lyric),
                    ));
                }
            }
            (Some(_), true) => {
                out.push(hard(
                    ViolationKind::Structural,
                    "`key` is present but `lyric` is empty".to_string(),
                ));
            }
            (None, false) => {
                out.push(hard(
                    ViolationKind::Structural,
                    format!("`key` is absent but `lyric` is `{}`", self.lyric),
                ));
            }
        }

        if self.frame_length > MAX_NOTE_FRAME_LENGTH {
            out.push(hard(
                ViolationKind::NumericRange,
                format!("`frame_length` must not exceed 2^53, got {}", self.frame_length),
            ));
        }

        out
    }
}

impl Validate for Score {
    fn violations(&self) -> Vec<Violation> {
        let mut out = Vec::new();

        if self.notes.is_empty() {
            out.push(hard(
                ViolationKind::Structural,
                "score has no notes".to_string(),
            ));
        } else if self.notes[0].key.is_some() || !self.notes[0].lyric.is_empty() {
            out.push(hard(
                ViolationKind::Structural,
                "the first note must be a rest".to_string(),
            ));
        }
        for (i, note) in self.notes.iter().enumerate() {
            nest(&mut out, &format!("notes[{i}]"), note.violations());
        }

        out
    }
}

impl Validate for FramePhoneme {
    fn violations(&self) -> Vec<Violation> {
        let mut out = Vec::new();
        if !phoneme::is_known_phoneme(&self.phoneme) {
            out.push(hard(
                ViolationKind::PhonemeShape,
                format!("`{}` is not a known phoneme", self.phoneme),
            ));
        }
        out
    }
}

impl Validate for FrameAudioQuery {
    fn violations(&self) -> Vec<Violation> {
        let mut out = Vec::new();

        for (i, frame_phoneme) in self.phonemes.iter().enumerate() {
            nest(&mut out, &format!("phonemes[{i}]"), frame_phoneme.violations());
        }

        let total_frames = self.total_frames();
        if self.f0.len() != self.volume.len()
            || self.f0.len() as u64 != total_frames
        {
            out.push(hard(
                ViolationKind::Structural,
                format!(
                    "`f0` ({}), `volume` ({}) and the summed phoneme frame length ({}) must agree",
                    self.f0.len(),
                    self.volume.len(),
                    total_frames
                ),
            ));
        }

        for (field, values) in [("f0", &self.f0), ("volume", &self.volume)] {
            if values.iter().any(|v| !v.is_finite() || *v < 0.) {
                out.push(soft(
                    ViolationKind::NumericRange,
                    format!("`{field}` contains a negative or non-finite value"),
                ));
            }
        }

        check_finite_non_negative(&mut out, "volume_scale", self.volume_scale);
        check_sampling_rate(&mut out, self.output_sampling_rate);

        out
    }
}
