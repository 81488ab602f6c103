
//! The closed phoneme inventory shared by the talk and singing pipelines,
//! plus the katakana/mora correspondence table (derived from OpenJTalk).

use std::collections::HashMap;
use std::sync::LazyLock;

/// Every phoneme symbol the inference engine understands, in id order.
/// The position in this list is the phoneme id.
pub const PHONEME_LIST: [&str; 45] = [
    "pau", "A", "E", "I", "N", "O", "U", "a", "b", "by", "ch", "cl", "d", "dy", "e", "f", "g",
    "gw", "gy", "h", "hy", "i", "j", "k", "kw", "ky", "m", "my", "n", "ny", "o", "p", "py", "r",
    "ry", "s", "sh", "t", "ts", "ty", "u", "v", "w", "y", "z",
];

/// Phonemes that terminate a mora (voiced/unvoiced vowels, ン, ッ, pau).
pub(crate) const MORA_TAIL_PHONEMES: [&str; 13] = [
    "a", "i", "u", "e", "o", "N", "A", "I", "U", "E", "O", "cl", "pau",
];

/// Mora-tail phonemes that carry no voicing; their pitch is forced to zero.
pub(crate) const UNVOICED_MORA_PHONEMES: [&str; 7] = ["A", "I", "U", "E", "O", "cl", "pau"];

pub(crate) const PAU_ID: i64 = 0;

/// Resolves a phoneme symbol to its id. Any symbol containing `sil` is a
/// spelling synonym of `pau`.
pub(crate) fn phoneme_id(symbol: &str) -> Option<i64> {
    if symbol.contains("sil") {
        return Some(PAU_ID);
    }
    PHONEME_LIST
        .iter()
        .position(|p| *p == symbol)
        .map(|i| i as i64)
}

pub(crate) fn is_known_phoneme(symbol: &str) -> bool {
    phoneme_id(symbol).is_some()
}

pub(crate) fn is_mora_tail(symbol: &str) -> bool {
    MORA_TAIL_PHONEMES.contains(&symbol)
}

/// A consonant is any known phoneme that cannot terminate a mora.
pub(crate) fn is_consonant(symbol: &str) -> bool {
    !symbol.contains("sil") && PHONEME_LIST.contains(&symbol) && !is_mora_tail(symbol)
}

pub(crate) fn is_unvoiced_mora_phoneme(symbol: &str) -> bool {
    UNVOICED_MORA_PHONEMES.contains(&symbol)
}

/// Katakana spelling → (consonant, vowel) for every mora, one-to-one.
/// An empty consonant means the mora is vowel-only.
pub(crate) const MORA_LIST: [(&str, &str, &str); 144] = [
    ("ヴォ", "v", "o"),
    ("ヴェ", "v", "e"),
    ("ヴィ", "v", "i"),
    ("ヴァ", "v", "a"),
    ("ヴ", "v", "u"),
    ("ン", "", "N"),
    ("ワ", "w", "a"),
    ("ロ", "r", "o"),
    ("レ", "r", "e"),
    ("ル", "r", "u"),
    ("リョ", "ry", "o"),
    ("リュ", "ry", "u"),
    ("リャ", "ry", "a"),
    ("リェ", "ry", "e"),
    ("リ", "r", "i"),
    ("ラ", "r", "a"),
    ("ヨ", "y", "o"),
    ("ユ", "y", "u"),
    ("ヤ", "y", "a"),
    ("モ", "m", "o"),
    ("メ", "m", "e"),
    ("ム", "m", "u"),
    ("ミョ", "my", "o"),
    ("ミュ", "my", "u"),
    ("ミャ", "my", "a"),
    ("ミェ", "my", "e"),
    ("ミ", "m", "i"),
    ("マ", "m", "a"),
    ("ポ", "p", "o"),
    ("ボ", "b", "o"),
    ("ホ", "h", "o"),
    ("ペ", "p", "e"),
    ("ベ", "b", "e"),
    ("ヘ", "h", "e"),
    ("プ", "p", "u"),
    ("ブ", "b", "u"),
    ("フォ", "f", "o"),
    ("フェ", "f", "e"),
    ("フィ", "f", "i"),
    ("ファ", "f", "a"),
    ("フ", "f", "u"),
    ("ピョ", "py", "o"),
    ("ピュ", "py", "u"),
    ("ピャ", "py", "a"),
    ("ピェ", "py", "e"),
    ("ピ", "p", "i"),
    ("ビョ", "by", "o"),
    ("ビュ", "by", "u"),
    ("ビャ", "by", "a"),
    ("ビェ", "by", "e"),
    ("ビ", "b", "i"),
    ("ヒョ", "hy", "o"),
    ("ヒュ", "hy", "u"),
    ("ヒャ", "hy", "a"),
    ("ヒェ", "hy", "e"),
    ("ヒ", "h", "i"),
    ("パ", "p", "a"),
    ("バ", "b", "a"),
    ("ハ", "h", "a"),
    ("ノ", "n", "o"),
    ("ネ", "n", "e"),
    ("ヌ", "n", "u"),
    ("ニョ", "ny", "o"),
    ("ニュ", "ny", "u"),
    ("ニャ", "ny", "a"),
    ("ニェ", "ny", "e"),
    ("ニ", "n", "i"),
    ("ナ", "n", "a"),
    ("ドゥ", "d", "u"),
    ("ド", "d", "o"),
    ("トゥ", "t", "u"),
    ("ト", "t", "o"),
    ("デョ", "dy", "o"),
    ("デュ", "dy", "u"),
    ("デャ", "dy", "a"),
    ("ディ", "d", "i"),
    ("デ", "d", "e"),
    ("テョ", "ty", "o"),
    ("テュ", "ty", "u"),
    ("テャ", "ty", "a"),
    ("ティ", "t", "i"),
    ("テ", "t", "e"),
    ("ツォ", "ts", "o"),
    ("ツェ", "ts", "e"),
    ("ツィ", "ts", "i"),
    ("ツァ", "ts", "a"),
    ("ツ", "ts", "u"),
    ("ッ", "", "cl"),
    ("チョ", "ch", "o"),
    ("チュ", "ch", "u"),
    ("チャ", "ch", "a"),
    ("チェ", "ch", "e"),
    ("チ", "ch", "i"),
    ("ダ", "d", "a"),
    ("タ", "t", "a"),
    ("ゾ", "z", "o"),
    ("ソ", "s", "o"),
    ("ゼ", "z", "e"),
    ("セ", "s", "e"),
    ("ズィ", "z", "i"),
    ("ズ", "z", "u"),
    ("スィ", "s", "i"),
    ("ス", "s", "u"),
    ("ジョ", "j", "o"),
    ("ジュ", "j", "u"),
    ("ジャ", "j", "a"),
    ("ジェ", "j", "e"),
    ("ジ", "j", "i"),
    ("ショ", "sh", "o"),
    ("シュ", "sh", "u"),
    ("シャ", "sh", "a"),
    ("シェ", "sh", "e"),
    ("シ", "sh", "i"),
    ("ザ", "z", "a"),
    ("サ", "s", "a"),
    ("ゴ", "g", "o"),
    ("コ", "k", "o"),
    ("ゲ", "g", "e"),
    ("ケ", "k", "e"),
    ("グヮ", "gw", "a"),
    ("グ", "g", "u"),
    ("クヮ", "kw", "a"),
    ("ク", "k", "u"),
    ("ギョ", "gy", "o"),
    ("ギュ", "gy", "u"),
    ("ギャ", "gy", "a"),
    ("ギェ", "gy", "e"),
    ("ギ", "g", "i"),
    ("キョ", "ky", "o"),
    ("キュ", "ky", "u"),
    ("キャ", "ky", "a"),
    ("キェ", "ky", "e"),
    ("キ", "k", "i"),
    ("ガ", "g", "a"),
    ("カ", "k", "a"),
    ("オ", "", "o"),
    ("エ", "", "e"),
    ("ウォ", "w", "o"),
    ("ウェ", "w", "e"),
    ("ウィ", "w", "i"),
    ("ウ", "", "u"),
    ("イェ", "y", "e"),
    ("イ", "", "i"),
    ("ア", "", "a"),
];

/// Unvoice prefix used by the phonetic notation and by the text → mora map.
pub(crate) const UNVOICE_SYMBOL: char = '_';

/// Spelling → (consonant, vowel) lookup including `_`-prefixed unvoiced
/// variants. Every mora except ン and ッ has an unvoiced counterpart whose
/// vowel is the uppercase (devoiced) symbol.
pub(crate) static TEXT_TO_MORA: LazyLock<HashMap<String, (Option<&'static str>, &'static str)>> =
    LazyLock::new(|| {
        let mut map = HashMap::new();
        for &(text, consonant, vowel) in &MORA_LIST {
            let consonant = (!consonant.is_empty()).then_some(consonant);
            map.insert(text.to_string(), (consonant, vowel));
            if let Some(unvoiced) = to_unvoiced(vowel) {
                map.insert(format!("{UNVOICE_SYMBOL}{text}"), (consonant, unvoiced));
            }
        }
        map
    });

fn to_unvoiced(vowel: &str) -> Option<&'static str> {
    match vowel {
        "a" => Some("A"),
        "i" => Some("I"),
        "u" => Some("U"),
        "e" => Some("E"),
        "o" => Some("O"),
        _ => None,
    }
}

fn to_voiced(vowel: &str) -> &str {
    match vowel {
        "A" => "a",
        "I" => "i",
        "U" => "u",
        "E" => "e",
        "O" => "o",
        other => other,
    }
}

/// Looks up a mora spelling (optionally `_`-prefixed) as used by the kana
/// notation and by note lyrics.
pub(crate) fn lookup_mora_text(text: &str) -> Option<(Option<&'static str>, &'static str)> {
    TEXT_TO_MORA.get(text).copied()
}

/// Reverse lookup: phoneme pair → katakana spelling. Devoiced vowels are
/// voiced before the lookup; an unknown pair falls back to the raw symbols.
pub(crate) fn mora_to_text(consonant: Option<&str>, vowel: &str) -> String {
    let vowel = to_voiced(vowel);
    let consonant = consonant.unwrap_or("");
    MORA_LIST
        .iter()
        .find(|&&(_, c, v)| c == consonant && v == vowel)
        .map(|&(text, _, _)| text.to_string())
        .unwrap_or_else(|| format!("{consonant}{vowel}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_stable() {
        assert_eq!(phoneme_id("pau"), Some(0));
        assert_eq!(phoneme_id("A"), Some(1));
        assert_eq!(phoneme_id("e"), Some(14));
        assert_eq!(phoneme_id("m"), Some(26));
        assert_eq!(phoneme_id("ts"), Some(38));
        assert_eq!(phoneme_id("v"), Some(41));
        assert_eq!(phoneme_id("z"), Some(44));
        assert_eq!(phoneme_id("xyz"), None);
        assert_eq!(phoneme_id(""), None);
    }

    #[test]
    fn sil_is_a_synonym_of_pau() {
        assert_eq!(phoneme_id("sil"), Some(PAU_ID));
        assert_eq!(phoneme_id("sil0"), Some(PAU_ID));
    }

    #[test]
    fn consonants_and_tails_partition_the_inventory() {
        for symbol in PHONEME_LIST {
            assert!(
                is_consonant(symbol) ^ is_mora_tail(symbol),
                "{symbol} must be exactly one of consonant/mora-tail"
            );
        }
    }

    #[test]
    fn text_lookup_covers_unvoiced_variants() {
        // all moras are doubled except ン and ッ
        assert_eq!(TEXT_TO_MORA.len(), MORA_LIST.len() * 2 - 2);
        assert_eq!(lookup_mora_text("ダ"), Some((Some("d"), "a")));
        assert_eq!(lookup_mora_text("ン"), Some((None, "N")));
        assert_eq!(lookup_mora_text("ッ"), Some((None, "cl")));
        assert_eq!(lookup_mora_text("ショ"), Some((Some("sh"), "o")));
        assert_eq!(lookup_mora_text("_ガ"), Some((Some("g"), "A")));
        assert_eq!(lookup_mora_text("_ビョ"), Some((Some("by"), "O")));
        assert_eq!(lookup_mora_text("_オ"), Some((None, "O")));
        assert_eq!(lookup_mora_text("_ン"), None);
        assert_eq!(lookup_mora_text("漢"), None);
    }

    #[test]
    fn reverse_lookup_voices_the_vowel() {
        assert_eq!(mora_to_text(None, "a"), "ア");
        assert_eq!(mora_to_text(None, "A"), "ア");
        assert_eq!(mora_to_text(Some("k"), "o"), "コ");
        assert_eq!(mora_to_text(Some("sh"), "U"), "シュ");
        assert_eq!(mora_to_text(Some("q"), "a"), "qa");
    }
}
