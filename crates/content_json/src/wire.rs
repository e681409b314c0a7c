//! Serde types mirroring the persisted JSON shape
//!
//! The persisted document is a JSON array of element objects. Elements
//! carry a `type` tag, optional `url`/`align`, and `children`; text runs
//! carry `text` plus style flags that are present only when true.

use serde::{Deserialize, Serialize};

/// One node of the persisted tree: an element object or a text run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireNode {
    Element(WireElement),
    Text(WireText),
}

/// The `type` tag values of element objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WireKind {
    Paragraph,
    HeadingOne,
    HeadingTwo,
    Blockquote,
    BulletedList,
    NumberedList,
    ListItem,
    Image,
    Link,
}

/// The `align` attribute values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireAlign {
    Left,
    Center,
    Right,
}

/// An element object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireElement {
    #[serde(rename = "type")]
    pub kind: WireKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<WireAlign>,
    #[serde(default)]
    pub children: Vec<WireNode>,
}

/// A text run; flags are serialized only when true
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireText {
    pub text: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strikethrough: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub code: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}
