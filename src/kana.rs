
//! Parser and writer for the compact phonetic notation (AquesTalk-like).
//!
//! As in `アンドロ'イドワ、デンキ'/ヒ'_ツジノ/ユメ'オ/ミ'ルカ？`: `'` marks
//! the accent nucleus, `/` separates accent phrases, `、` separates them
//! with a pause, `_` devoices the following mora and a trailing `？` marks
//! the phrase interrogative.

use crate::error::{Error, ErrorKind};
use crate::phoneme::{self, UNVOICE_SYMBOL};
use crate::types::{AccentPhrase, Mora};

const ACCENT_SYMBOL: char = '\'';
const NOPAUSE_DELIMITER: char = '/';
const PAUSE_DELIMITER: char = '、';
const WIDE_INTERROGATION_MARK: char = '？';

fn parse_error(message: String) -> Error {
    Error::new(ErrorKind::KanaParseFailed, message)
}

fn mora_from_text(text: &str) -> Option<Mora> {
    let (consonant, vowel) = phoneme::lookup_mora_text(text)?;
    Some(Mora {
        text: text.trim_start_matches(UNVOICE_SYMBOL).to_string(),
        consonant: consonant.map(str::to_string),
        consonant_length: consonant.map(|_| 0.),
        vowel: vowel.to_string(),
        vowel_length: 0.,
        pitch: 0.,
    })
}

fn pause_mora() -> Mora {
    Mora {
        text: PAUSE_DELIMITER.to_string(),
        consonant: None,
        consonant_length: None,
        vowel: "pau".to_string(),
        vowel_length: 0.,
        pitch: 0.,
    }
}

fn text_to_accent_phrase(phrase: &str) -> crate::Result<AccentPhrase> {
    let chars: Vec<char> = phrase.chars().collect();
    let mut moras: Vec<Mora> = Vec::new();
    let mut accent: Option<usize> = None;
    let mut index = 0;

    while index < chars.len() {
        if chars[index] == ACCENT_SYMBOL {
            if index == 0 {
                return Err(parse_error(format!(
                    "accent cannot be set at the beginning of an accent phrase: {phrase}"
                )));
            }
            if accent.is_some() {
                return Err(parse_error(format!(
                    "a second accent cannot be set in an accent phrase: {phrase}"
                )));
            }
            accent = Some(moras.len());
            index += 1;
            continue;
        }

        // greedy longest match against the mora spelling table
        let mut stack = String::new();
        let mut matched: Option<(Mora, usize)> = None;
        for (length, letter) in chars[index..].iter().enumerate() {
            if *letter == ACCENT_SYMBOL {
                break;
            }
            stack.push(*letter);
            if let Some(mora) = mora_from_text(&stack) {
                matched = Some((mora, length + 1));
            }
        }
        let Some((mora, length)) = matched else {
            return Err(parse_error(format!(
                "unknown text in an accent phrase: {phrase}"
            )));
        };
        moras.push(mora);
        index += length;
    }

    let Some(accent) = accent else {
        return Err(parse_error(format!(
            "accent not found in an accent phrase: {phrase}"
        )));
    };
    Ok(AccentPhrase {
        moras,
        accent,
        pause_mora: None,
        is_interrogative: false,
    })
}

/// Parses the phonetic notation into accent phrases. All moras come out
/// with zero lengths and pitches; a pipeline stage fills them in.
pub fn parse_kana(text: &str) -> crate::Result<Vec<AccentPhrase>> {
    if text.is_empty() {
        return Ok(vec![]);
    }

    let mut parsed = Vec::new();
    let mut phrase = String::new();
    const TERMINATOR: char = '\0';

    for letter in text.chars().chain([TERMINATOR]) {
        if letter == TERMINATOR || letter == PAUSE_DELIMITER || letter == NOPAUSE_DELIMITER {
            if phrase.is_empty() {
                return Err(parse_error(format!(
                    "accent phrase at position {} is empty",
                    parsed.len()
                )));
            }
            let is_interrogative = phrase.contains(WIDE_INTERROGATION_MARK);
            if is_interrogative {
                if !phrase.ends_with(WIDE_INTERROGATION_MARK) {
                    return Err(parse_error(format!(
                        "an interrogation mark is only allowed at the end of an accent phrase: {phrase}"
                    )));
                }
                phrase.pop();
            }
            let mut accent_phrase = text_to_accent_phrase(&phrase)?;
            if letter == PAUSE_DELIMITER {
                accent_phrase.pause_mora = Some(pause_mora());
            }
            accent_phrase.is_interrogative = is_interrogative;
            parsed.push(accent_phrase);
            phrase.clear();
        } else {
            phrase.push(letter);
        }
    }
    Ok(parsed)
}

/// Writes accent phrases back into the phonetic notation.
pub fn create_kana(accent_phrases: &[AccentPhrase]) -> String {
    let mut text = String::new();
    for phrase in accent_phrases {
        for (index, mora) in phrase.moras.iter().enumerate() {
            if ["A", "I", "U", "E", "O"].contains(&mora.vowel.as_str()) {
                text.push(UNVOICE_SYMBOL);
            }
            text.push_str(&mora.text);
            if index + 1 == phrase.accent {
                text.push(ACCENT_SYMBOL);
            }
        }
        if phrase.is_interrogative {
            text.push(WIDE_INTERROGATION_MARK);
        }
        text.push(if phrase.pause_mora.is_some() {
            PAUSE_DELIMITER
        } else {
            NOPAUSE_DELIMITER
        });
    }
    text.pop();
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn accent_phrase_parsing() {
        for (text, ok) in [
            ("ア_シタ'ワ", true),
            ("ユウヒガ'", true),
            ("_キ'レイ", true),
            ("アクセントナシ", false),
            ("アクセ'ント'タクサン'", false),
            ("'アクセントハジマリ", false),
            ("不明な'文字", false),
        ] {
            let result = text_to_accent_phrase(text);
            assert_eq!(result.is_ok(), ok, "{text}: {result:?}");
        }
    }

    #[test]
    fn accent_phrase_contents() {
        let phrase = text_to_accent_phrase("ヒ'_ツジ").unwrap();
        assert_eq!(phrase.accent, 1);
        let spelled: Vec<String> = phrase
            .moras
            .iter()
            .map(|m| format!("{}{}", m.consonant.as_deref().unwrap_or(""), m.vowel))
            .collect();
        assert_eq!(spelled, ["hi", "tsU", "ji"]);
        assert_eq!(phrase.moras[1].text, "ツ");
    }

    #[test]
    fn full_notation_parsing() {
        for (text, ok) in [
            ("テ'ス_ト/テ_ス'ト、_テ'_スト？/テ'ス_ト？", true),
            ("クウハクノ'//フレーズ'", false),
            ("フレー？ズノ'/トチュウニ'、ギモ'ンフ", false),
        ] {
            let result = parse_kana(text);
            assert_eq!(result.is_ok(), ok, "{text}: {result:?}");
            if !ok {
                assert_eq!(
                    result.unwrap_err().kind(),
                    ErrorKind::KanaParseFailed
                );
            }
        }
    }

    #[test]
    fn pause_and_interrogative_flags() {
        let phrases = parse_kana("テ'スト、ホンバ'ン？").unwrap();
        assert_eq!(phrases.len(), 2);
        assert!(phrases[0].pause_mora.is_some());
        assert_eq!(phrases[0].pause_mora.as_ref().unwrap().vowel, "pau");
        assert!(!phrases[0].is_interrogative);
        assert!(phrases[1].pause_mora.is_none());
        assert!(phrases[1].is_interrogative);
    }

    #[test]
    fn notation_round_trips() {
        let text = "アンドロ'イドワ、デンキ'/ヒ'_ツジノ/ユメ'オ/ミ'ルカ？";
        let phrases = parse_kana(text).unwrap();
        assert_eq!(create_kana(&phrases), text);
    }

    #[test]
    fn empty_input_is_no_phrases() {
        assert_eq!(parse_kana("").unwrap(), vec![]);
    }
}
