//! Discord "Components V2" building blocks.
//!
//! Strategies render each post as a [`Container`]; the notifier serialises it
//! with [`Component::to_json`].

use serde_json::{json, Value};

const TYPE_SECTION: u8 = 9;
const TYPE_TEXT_DISPLAY: u8 = 10;
const TYPE_THUMBNAIL: u8 = 11;
const TYPE_SEPARATOR: u8 = 14;
const TYPE_CONTAINER: u8 = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spacing {
    Small,
    Large,
}

impl Spacing {
    fn as_u8(self) -> u8 {
        match self {
            Spacing::Small => 1,
            Spacing::Large => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    TextDisplay(String),
    Separator { spacing: Spacing, divider: bool },
    Section {
        texts: Vec<String>,
        thumbnail: String,
    },
    Container(Container),
}

impl Component {
    pub fn text(content: impl Into<String>) -> Self {
        Component::TextDisplay(content.into())
    }

    pub fn to_json(&self) -> Value {
        match self {
            Component::TextDisplay(content) => json!({
                "type": TYPE_TEXT_DISPLAY,
                "content": content,
            }),
            Component::Separator { spacing, divider } => json!({
                "type": TYPE_SEPARATOR,
                "spacing": spacing.as_u8(),
                "divider": divider,
            }),
            Component::Section { texts, thumbnail } => json!({
                "type": TYPE_SECTION,
                "components": texts
                    .iter()
                    .map(|t| Component::text(t.clone()).to_json())
                    .collect::<Vec<_>>(),
                "accessory": {
                    "type": TYPE_THUMBNAIL,
                    "media": { "url": thumbnail },
                },
            }),
            Component::Container(container) => container.to_json(),
        }
    }

    /// All text carried by this component, one block per line.
    pub fn plain_text(&self) -> String {
        match self {
            Component::TextDisplay(content) => content.clone(),
            Component::Separator { .. } => String::new(),
            Component::Section { texts, .. } => texts.join("\n"),
            Component::Container(container) => container.plain_text(),
        }
    }
}

/// Top-level block grouping the components of one post.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Container {
    pub components: Vec<Component>,
    pub accent_color: Option<u32>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, content: impl Into<String>) -> Self {
        self.components.push(Component::text(content));
        self
    }

    pub fn texts<I, S>(mut self, contents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.components
            .extend(contents.into_iter().map(|c| Component::text(c)));
        self
    }

    pub fn separator(mut self, spacing: Spacing) -> Self {
        self.components.push(Component::Separator {
            spacing,
            divider: true,
        });
        self
    }

    pub fn spacer(mut self, spacing: Spacing) -> Self {
        self.components.push(Component::Separator {
            spacing,
            divider: false,
        });
        self
    }

    pub fn section(mut self, texts: Vec<String>, thumbnail: impl Into<String>) -> Self {
        self.components.push(Component::Section {
            texts,
            thumbnail: thumbnail.into(),
        });
        self
    }

    pub fn accent_color(mut self, color: Option<u32>) -> Self {
        self.accent_color = color;
        self
    }

    pub fn to_json(&self) -> Value {
        let mut value = json!({
            "type": TYPE_CONTAINER,
            "components": self.components.iter().map(Component::to_json).collect::<Vec<_>>(),
        });
        if let Some(color) = self.accent_color {
            value["accent_color"] = json!(color);
        }
        value
    }

    pub fn plain_text(&self) -> String {
        self.components
            .iter()
            .map(Component::plain_text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_json_shape() {
        let container = Container::new()
            .text("## Title")
            .separator(Spacing::Large)
            .text("Body")
            .accent_color(Some(0x313183));

        let value = container.to_json();
        assert_eq!(value["type"], 17);
        assert_eq!(value["accent_color"], 0x313183);
        assert_eq!(value["components"][0]["type"], 10);
        assert_eq!(value["components"][0]["content"], "## Title");
        assert_eq!(value["components"][1]["type"], 14);
        assert_eq!(value["components"][1]["spacing"], 2);
        assert_eq!(value["components"][1]["divider"], true);
    }

    #[test]
    fn test_section_has_thumbnail_accessory() {
        let container = Container::new().section(
            vec!["**Author**".into(), "text".into()],
            "https://example.com/a.png",
        );
        let value = container.to_json();
        let section = &value["components"][0];
        assert_eq!(section["type"], 9);
        assert_eq!(section["components"].as_array().unwrap().len(), 2);
        assert_eq!(section["accessory"]["type"], 11);
        assert_eq!(section["accessory"]["media"]["url"], "https://example.com/a.png");
    }

    #[test]
    fn test_no_accent_color_key_when_unset() {
        let value = Container::new().text("x").to_json();
        assert!(value.get("accent_color").is_none());
    }

    #[test]
    fn test_plain_text_skips_separators() {
        let container = Container::new()
            .text("a")
            .spacer(Spacing::Small)
            .text("b");
        assert_eq!(container.plain_text(), "a\nb");
    }
}
