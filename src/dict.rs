
//! User-supplied pronunciation overrides.
//!
//! A text analyzer attached to a dictionary is allowed to keep a compiled
//! form of it internally. After any mutation (`add_word`, `update_word`,
//! `remove_word`, `import`, `load`) the analyzer must be re-attached, i.e.
//! its own "use this dictionary" operation applied again, before new
//! analyses reflect the change.

use std::collections::HashMap;
use std::path::Path;

use parking_lot::Mutex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::{Error, ErrorKind};

pub const MIN_PRIORITY: u32 = 0;
pub const MAX_PRIORITY: u32 = 10;
pub const DEFAULT_PRIORITY: u32 = 5;

/// Replaces characters that have a full-width counterpart: ASCII `!`..`~`
/// map into the FF01..FF5E block, space separators collapse to U+3000.
pub(crate) fn to_zenkaku(s: &str) -> String {
    s.chars()
        .map(|c| match u32::from(c) {
            _ if c.is_whitespace() => '\u{3000}',
            i @ 0x21..=0x7e => char::from_u32(0xfee0 + i).unwrap_or(c),
            _ => c,
        })
        .collect()
}

const SUTEGANA: [char; 10] = ['ァ', 'ィ', 'ゥ', 'ェ', 'ォ', 'ャ', 'ュ', 'ョ', 'ヮ', 'ッ'];

fn is_katakana(c: char) -> bool {
    ('ァ'..='ヴ').contains(&c) || c == 'ー'
}

/// Checks that a katakana string is a pronounceable reading.
fn validate_pronunciation(pronunciation: &str) -> Result<(), String> {
    if pronunciation.is_empty() || !pronunciation.chars().all(is_katakana) {
        return Err(format!(
            "pronunciation must consist of katakana: {pronunciation:?}"
        ));
    }

    let chars: Vec<char> = pronunciation.chars().collect();
    for i in 0..chars.len() {
        if SUTEGANA.contains(&chars[i]) && i + 1 < chars.len() {
            // a glide like キャ may be followed by ッ, but no other small
            // kana may follow a small kana, and nothing small follows ッ
            let next = chars[i + 1];
            if SUTEGANA[..SUTEGANA.len() - 1].contains(&next)
                || (chars[i] == 'ッ' && SUTEGANA.contains(&next))
            {
                return Err(format!(
                    "consecutive small kana in pronunciation: {pronunciation:?}"
                ));
            }
        }
        if chars[i] == 'ヮ' && i != 0 && !['ク', 'グ'].contains(&chars[i - 1]) {
            return Err(format!(
                "ヮ is only valid after ク or グ: {pronunciation:?}"
            ));
        }
    }
    Ok(())
}

/// Small kana that merge with the preceding character into one mora.
fn forms_digraph(first: char, second: char) -> bool {
    match second {
        'ェ' => matches!(
            first,
            'イ' | 'テ' | 'デ' | 'キ' | 'シ' | 'チ' | 'ニ' | 'ヒ' | 'ミ' | 'リ' | 'ギ' | 'ジ'
                | 'ビ' | 'ピ' | 'ウ' | 'ツ' | 'フ' | 'ヴ'
        ),
        'ャ' | 'ュ' | 'ョ' => matches!(
            first,
            'ヴ' | 'テ' | 'デ' | 'キ' | 'シ' | 'チ' | 'ニ' | 'ヒ' | 'ミ' | 'リ' | 'ギ' | 'ジ'
                | 'ビ' | 'ピ'
        ),
        'ゥ' => matches!(first, 'ト' | 'ド'),
        'ィ' => matches!(first, 'テ' | 'デ' | 'ウ' | 'ス' | 'ツ' | 'フ' | 'ヴ' | 'ズ'),
        'ァ' => matches!(first, 'ツ' | 'フ' | 'ヴ'),
        'ォ' => matches!(first, 'ウ' | 'ツ' | 'フ' | 'ヴ'),
        'ヮ' => matches!(first, 'ク' | 'グ'),
        _ => false,
    }
}

pub(crate) fn count_moras(pronunciation: &str) -> usize {
    let chars: Vec<char> = pronunciation.chars().collect();
    let mut count = 0;
    let mut i = 0;
    while i < chars.len() {
        if i + 1 < chars.len() && forms_digraph(chars[i], chars[i + 1]) {
            i += 2;
        } else {
            i += 1;
        }
        count += 1;
    }
    count
}

/// Grammatical category of a dictionary word.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserDictWordType {
    ProperNoun,
    CommonNoun,
    Verb,
    Adjective,
    Suffix,
}

/// A single dictionary entry. Construction validates the pronunciation and
/// normalizes the surface, so a held value is always well-formed.
#[derive(Debug, Clone, PartialEq)]
pub struct UserDictWord {
    surface: String,
    pronunciation: String,
    accent_type: usize,
    word_type: UserDictWordType,
    priority: u32,
    mora_count: usize,
}

impl UserDictWord {
    pub fn new(
        surface: &str,
        pronunciation: impl Into<String>,
        accent_type: usize,
        word_type: UserDictWordType,
        priority: u32,
    ) -> crate::Result<Self> {
        let pronunciation = pronunciation.into();
        if priority > MAX_PRIORITY {
            return Err(Error::new(
                ErrorKind::InvalidWord,
                format!("priority must be within {MIN_PRIORITY}..={MAX_PRIORITY}, got {priority}"),
            ));
        }
        validate_pronunciation(&pronunciation)
            .map_err(|message| Error::new(ErrorKind::InvalidWord, message))?;
        let mora_count = count_moras(&pronunciation);
        if accent_type > mora_count {
            return Err(Error::new(
                ErrorKind::InvalidWord,
                format!(
                    "accent_type ({accent_type}) exceeds the mora count of the pronunciation ({mora_count})"
                ),
            ));
        }
        Ok(Self {
            surface: to_zenkaku(surface),
            pronunciation,
            accent_type,
            word_type,
            priority,
            mora_count,
        })
    }

    /// Common-noun word with the default priority.
    pub fn simple(surface: &str, pronunciation: impl Into<String>) -> crate::Result<Self> {
        Self::new(
            surface,
            pronunciation,
            0,
            UserDictWordType::CommonNoun,
            DEFAULT_PRIORITY,
        )
    }

    pub fn surface(&self) -> &str {
        &self.surface
    }

    pub fn pronunciation(&self) -> &str {
        &self.pronunciation
    }

    pub fn accent_type(&self) -> usize {
        self.accent_type
    }

    pub fn word_type(&self) -> UserDictWordType {
        self.word_type
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn mora_count(&self) -> usize {
        self.mora_count
    }
}

/// On-disk shape of a word. `mora_count` is derived, so it is not stored;
/// deserialization revalidates through `UserDictWord::new`.
#[derive(Serialize, Deserialize)]
struct WordRepr<S> {
    surface: S,
    pronunciation: S,
    accent_type: usize,
    word_type: UserDictWordType,
    priority: u32,
}

impl Serialize for UserDictWord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WordRepr {
            surface: self.surface.as_str(),
            pronunciation: self.pronunciation.as_str(),
            accent_type: self.accent_type,
            word_type: self.word_type,
            priority: self.priority,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for UserDictWord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = WordRepr::<String>::deserialize(deserializer)?;
        Self::new(
            &repr.surface,
            repr.pronunciation,
            repr.accent_type,
            repr.word_type,
            repr.priority,
        )
        .map_err(serde::de::Error::custom)
    }
}

/// The user dictionary: a word map keyed by generated UUIDs.
#[derive(Debug, Default)]
pub struct UserDict {
    words: Mutex<HashMap<Uuid, UserDictWord>>,
}

impl UserDict {
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds a word and returns its generated id.
    pub fn add_word(&self, word: UserDictWord) -> Uuid {
        let id = Uuid::new_v4();
        self.words.lock().insert(id, word);
        id
    }

    pub fn update_word(&self, id: Uuid, word: UserDictWord) -> crate::Result<()> {
        let mut words = self.words.lock();
        if !words.contains_key(&id) {
            return Err(Error::new(
                ErrorKind::WordNotFound,
                format!("word {id} is not in the dictionary"),
            ));
        }
        words.insert(id, word);
        Ok(())
    }

    pub fn remove_word(&self, id: Uuid) -> crate::Result<UserDictWord> {
        self.words.lock().remove(&id).ok_or_else(|| {
            Error::new(
                ErrorKind::WordNotFound,
                format!("word {id} is not in the dictionary"),
            )
        })
    }

    /// Merges another dictionary into this one. Colliding ids are
    /// overwritten by the imported words.
    pub fn import(&self, other: &UserDict) {
        let imported = other.to_map();
        self.words.lock().extend(imported);
    }

    /// Reads a dictionary file and merges its words into this dictionary.
    pub fn load(&self, path: impl AsRef<Path>) -> crate::Result<()> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| {
            Error::with_source(
                ErrorKind::LoadUserDictFailed,
                format!("failed to read user dictionary from {}", path.display()),
                source,
            )
        })?;
        let words: HashMap<Uuid, UserDictWord> =
            serde_json::from_slice(&bytes).map_err(|source| {
                Error::with_source(
                    ErrorKind::LoadUserDictFailed,
                    format!("failed to parse user dictionary at {}", path.display()),
                    source,
                )
            })?;
        self.words.lock().extend(words);
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> crate::Result<()> {
        let path = path.as_ref();
        let json = self.to_json();
        std::fs::write(path, json).map_err(|source| {
            Error::with_source(
                ErrorKind::SaveUserDictFailed,
                format!("failed to write user dictionary to {}", path.display()),
                source,
            )
        })
    }

    /// Snapshot of the current contents.
    pub fn to_map(&self) -> HashMap<Uuid, UserDictWord> {
        self.words.lock().clone()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&*self.words.lock()).expect("word maps always serialize")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zenkaku_normalization() {
        assert_eq!(to_zenkaku("abcdefg"), "ａｂｃｄｅｆｇ");
        assert_eq!(to_zenkaku("あいうえお"), "あいうえお");
        assert_eq!(to_zenkaku("a_b"), "ａ＿ｂ");
        assert_eq!(to_zenkaku("a b"), "ａ　ｂ");
    }

    #[test]
    fn pronunciation_rules() {
        assert!(validate_pronunciation("ヨミ").is_ok());
        assert!(validate_pronunciation("キャット").is_ok());
        assert!(validate_pronunciation("グヮ").is_ok());
        assert!(validate_pronunciation("").is_err());
        assert!(validate_pronunciation("漢字").is_err());
        assert!(validate_pronunciation("ひらがな").is_err());
        assert!(validate_pronunciation("ッッッ").is_err());
        assert!(validate_pronunciation("ァァァァ").is_err());
        assert!(validate_pronunciation("ヌヮ").is_err());
    }

    #[test]
    fn mora_counting_merges_digraphs() {
        assert_eq!(count_moras("ヨミ"), 2);
        assert_eq!(count_moras("キャット"), 3);
        assert_eq!(count_moras("ディード"), 3);
        assert_eq!(count_moras("イェール"), 3);
        assert_eq!(count_moras("ツァー"), 2);
    }

    #[test]
    fn construction_normalizes_and_validates() {
        let word = UserDictWord::simple("abc", "テスト").unwrap();
        assert_eq!(word.surface(), "ａｂｃ");
        assert_eq!(word.mora_count(), 3);

        let err = UserDictWord::simple("x", "test").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidWord);

        let err =
            UserDictWord::new("x", "ヨミ", 0, UserDictWordType::Verb, 11).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidWord);

        let err =
            UserDictWord::new("x", "ヨミ", 3, UserDictWordType::Verb, 5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidWord);
    }

    #[test]
    fn crud_round_trip() {
        let dict = UserDict::new();
        let id = dict.add_word(UserDictWord::simple("abc", "テスト").unwrap());
        assert_eq!(dict.to_map()[&id].surface(), "ａｂｃ");

        dict.update_word(id, UserDictWord::simple("abc", "ヨミ").unwrap())
            .unwrap();
        assert_eq!(dict.to_map()[&id].pronunciation(), "ヨミ");

        let removed = dict.remove_word(id).unwrap();
        assert_eq!(removed.pronunciation(), "ヨミ");
        assert!(dict.to_map().is_empty());

        let err = dict.remove_word(id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WordNotFound);
        let err = dict
            .update_word(id, UserDictWord::simple("x", "ヨミ").unwrap())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WordNotFound);
    }

    #[test]
    fn import_overwrites_colliding_ids() {
        let base = UserDict::new();
        let id = base.add_word(UserDictWord::simple("a", "ア").unwrap());

        let other = UserDict::new();
        other.import(&base);
        other
            .update_word(id, UserDictWord::simple("a", "イ").unwrap())
            .unwrap();
        let extra = other.add_word(UserDictWord::simple("b", "ウ").unwrap());

        base.import(&other);
        let map = base.to_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map[&id].pronunciation(), "イ");
        assert_eq!(map[&extra].pronunciation(), "ウ");
    }

    #[test]
    fn save_and_load() {
        let dir = std::env::temp_dir().join(format!("hibiki-dict-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("dict.json");

        let dict = UserDict::new();
        let id = dict.add_word(
            UserDictWord::new("東北", "トーホク", 0, UserDictWordType::ProperNoun, 7).unwrap(),
        );
        dict.save(&path).unwrap();

        let restored = UserDict::new();
        restored.load(&path).unwrap();
        let map = restored.to_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map[&id].pronunciation(), "トーホク");
        assert_eq!(map[&id].priority(), 7);

        let err = restored.load(dir.join("missing.json")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LoadUserDictFailed);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn malformed_file_is_a_load_error() {
        let dir = std::env::temp_dir().join(format!("hibiki-dict-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.json");
        std::fs::write(&path, b"{not json").unwrap();

        let dict = UserDict::new();
        assert_eq!(
            dict.load(&path).unwrap_err().kind(),
            ErrorKind::LoadUserDictFailed
        );

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
