
//! Character and style metadata exposed by voice models.

use std::fmt::{self, Display};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Identifier of one style of one character, unique across a loaded
/// model set.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StyleId(pub u32);

impl Display for StyleId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Version string of a character, stable across style additions.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CharacterVersion(pub String);

impl Display for CharacterVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Capability of a style. Serialized as a snake_case tag; tags introduced
/// by future model formats are preserved as [`StyleType::Unknown`] instead
/// of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StyleType {
    Talk,
    SingingTeacher,
    FrameDecode,
    Sing,
    Unknown(String),
}

impl Default for StyleType {
    fn default() -> Self {
        Self::Talk
    }
}

impl StyleType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Talk => "talk",
            Self::SingingTeacher => "singing_teacher",
            Self::FrameDecode => "frame_decode",
            Self::Sing => "sing",
            Self::Unknown(raw) => raw,
        }
    }
}

impl Display for StyleType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for StyleType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StyleType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "talk" => Self::Talk,
            "singing_teacher" => Self::SingingTeacher,
            "frame_decode" => Self::FrameDecode,
            "sing" => Self::Sing,
            _ => Self::Unknown(raw),
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StyleMeta {
    pub id: StyleId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: StyleType,
    /// Styles of a character should be presented ascending by this value;
    /// styles without one come last.
    #[serde(default)]
    pub order: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CharacterMeta {
    pub name: String,
    pub styles: Vec<StyleMeta>,
    pub version: CharacterVersion,
    pub speaker_uuid: Uuid,
    /// Characters should be presented ascending by this value; characters
    /// without one come last.
    #[serde(default)]
    pub order: Option<u32>,
}

/// Merges metadata from several models: characters with the same
/// `speaker_uuid` are folded together, then characters and styles are
/// stably sorted by their `order` fields.
pub fn merge<'a>(metas: impl IntoIterator<Item = &'a CharacterMeta>) -> Vec<CharacterMeta> {
    let mut merged: Vec<CharacterMeta> = Vec::new();
    for character in metas {
        match merged
            .iter_mut()
            .find(|c| c.speaker_uuid == character.speaker_uuid)
        {
            Some(existing) => existing.styles.extend(character.styles.iter().cloned()),
            None => merged.push(character.clone()),
        }
    }
    for character in &mut merged {
        character.styles.sort_by_key(|style| order_key(style.order));
    }
    merged.sort_by_key(|character| order_key(character.order));
    merged
}

fn order_key(order: Option<u32>) -> u64 {
    order
        .map(u64::from)
        .unwrap_or_else(|| u64::from(u32::MAX) + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character(
        uuid: &str,
        name: &str,
        order: Option<u32>,
        styles: Vec<(u32, Option<u32>)>,
    ) -> CharacterMeta {
        CharacterMeta {
            name: name.to_string(),
            styles: styles
                .into_iter()
                .map(|(id, order)| StyleMeta {
                    id: StyleId(id),
                    name: format!("style-{id}"),
                    kind: StyleType::Talk,
                    order,
                })
                .collect(),
            version: CharacterVersion("0.1.0".to_string()),
            speaker_uuid: uuid.parse().unwrap(),
            order,
        }
    }

    const UUID_A: &str = "b1a81618-b27b-40d2-b0ea-27a9ad408c4b";
    const UUID_B: &str = "00a5c10c-d3bd-459f-83fd-43180b521a44";

    #[test]
    fn merge_folds_by_speaker_uuid_and_sorts() {
        let first = character(UUID_A, "A", Some(1), vec![(2, Some(5))]);
        let second = character(UUID_B, "B", Some(0), vec![(7, None)]);
        let third = character(UUID_A, "A", Some(1), vec![(3, Some(0))]);

        let merged = merge([&first, &second, &third]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].name, "B");
        assert_eq!(merged[1].name, "A");
        let style_ids: Vec<u32> = merged[1].styles.iter().map(|s| s.id.0).collect();
        assert_eq!(style_ids, [3, 2]);
    }

    #[test]
    fn entries_without_order_come_last() {
        let ordered = character(UUID_A, "A", Some(9), vec![]);
        let unordered = character(UUID_B, "B", None, vec![]);
        let merged = merge([&unordered, &ordered]);
        assert_eq!(merged[0].name, "A");
        assert_eq!(merged[1].name, "B");
    }

    #[test]
    fn unknown_style_type_round_trips() {
        let kind: StyleType = serde_json::from_str(r#""whisper""#).unwrap();
        assert_eq!(kind, StyleType::Unknown("whisper".to_string()));
        assert_eq!(serde_json::to_string(&kind).unwrap(), r#""whisper""#);

        let talk: StyleType = serde_json::from_str(r#""talk""#).unwrap();
        assert_eq!(talk, StyleType::Talk);
    }

    #[test]
    fn style_meta_defaults_to_talk() {
        let style: StyleMeta =
            serde_json::from_str(r#"{ "id": 302, "name": "ノーマル" }"#).unwrap();
        assert_eq!(style.kind, StyleType::Talk);
        assert_eq!(style.order, None);
    }
}
