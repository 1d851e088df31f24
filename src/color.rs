use egui::Color32;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid color `{0}`, expected #rgb, #rgba, #rrggbb or #rrggbbaa")]
pub struct ColorParseError(pub String);

/// Parses a CSS hex color such as `#3b82f6`.
pub fn parse_css_color(text: &str) -> Result<Color32, ColorParseError> {
    Color32::from_hex(text.trim()).map_err(|_| ColorParseError(text.to_owned()))
}

/// `#rrggbb` for opaque colors, `#rrggbbaa` otherwise.
pub fn to_css_hex(color: Color32) -> String {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    if a == u8::MAX {
        format!("#{r:02x}{g:02x}{b:02x}")
    } else {
        format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
    }
}

/// Color as a CSS hex string; for `#[serde(with = "...")]`.
pub mod css_hex {
    use egui::Color32;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(color: &Color32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_css_hex(*color))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color32, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_css_color(&text).map_err(serde::de::Error::custom)
    }
}
