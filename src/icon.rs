use serde::{Deserialize, Serialize};

/// A profile icon: a plain emoji, or one of the bundled mascot images.
/// The store and the wire keep the legacy string form; parsing happens once
/// at the boundary instead of prefix checks scattered through rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Icon {
    Emoji(String),
    Mascot(String),
}

impl Icon {
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("/mascot-") || raw.starts_with("http") {
            Icon::Mascot(raw.to_owned())
        } else {
            Icon::Emoji(raw.to_owned())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Icon::Emoji(raw) | Icon::Mascot(raw) => raw,
        }
    }

    pub fn html(&self) -> String {
        match self {
            Icon::Emoji(emoji) => format!("<span class=\"icon\">{emoji}</span>"),
            Icon::Mascot(src) => format!("<img class=\"icon\" src=\"{src}\" alt=\"mascot\">"),
        }
    }
}

impl From<String> for Icon {
    fn from(raw: String) -> Self {
        Icon::parse(&raw)
    }
}

impl From<Icon> for String {
    fn from(icon: Icon) -> Self {
        match icon {
            Icon::Emoji(raw) | Icon::Mascot(raw) => raw,
        }
    }
}

impl std::fmt::Display for Icon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emoji_stays_emoji() {
        assert_eq!(Icon::parse("🦊"), Icon::Emoji("🦊".to_owned()));
    }

    #[test]
    fn mascot_paths_and_urls_are_mascots() {
        assert_eq!(
            Icon::parse("/mascot-fox.png"),
            Icon::Mascot("/mascot-fox.png".to_owned())
        );
        assert_eq!(
            Icon::parse("https://cdn.example/m.png"),
            Icon::Mascot("https://cdn.example/m.png".to_owned())
        );
    }

    #[test]
    fn string_round_trip_preserves_raw_form() {
        let raw = "/mascot-owl.png".to_owned();
        assert_eq!(String::from(Icon::from(raw.clone())), raw);
    }

    #[test]
    fn mascot_renders_as_image() {
        assert!(Icon::parse("/mascot-fox.png").html().starts_with("<img"));
        assert!(Icon::parse("🦊").html().starts_with("<span"));
    }
}
