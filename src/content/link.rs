use serde::{Deserialize, Serialize};
use serde_json::Value;

const NAME_KEYS: &[&str] = &["name", "title", "text"];
const LINK_KEYS: &[&str] = &["link", "url", "href"];

/// An outbound link extracted from a page, in page order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentLink {
    #[serde(default, alias = "title", alias = "text")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,

    #[serde(default, alias = "url", alias = "href")]
    pub link: String,
}

impl ContentLink {
    pub fn new(name: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            friendly_name: None,
            link: link.into(),
        }
    }

    pub fn with_friendly_name(mut self, friendly_name: impl Into<String>) -> Self {
        self.friendly_name = Some(friendly_name.into());
        self
    }

    /// Returns true if the target is absolute enough to crawl later
    pub fn is_queueable(&self) -> bool {
        self.link.starts_with("http")
    }
}

/// Converts an upstream link collection into ordered links
///
/// Accepts an array of objects, an array of bare URL strings, or an object
/// mapping anchor text to URL. Map entries keep their document order, so
/// positions match the page. Anything else yields no links.
pub fn links_from_value(value: &Value) -> Vec<ContentLink> {
    match value {
        Value::Array(items) => items.iter().filter_map(link_from_item).collect(),
        Value::Object(map) => map
            .iter()
            .map(|(name, target)| ContentLink::new(name.clone(), target.as_str().unwrap_or_default()))
            .collect(),
        _ => Vec::new(),
    }
}

fn link_from_item(item: &Value) -> Option<ContentLink> {
    match item {
        Value::String(target) => Some(ContentLink::new("", target.clone())),
        Value::Object(obj) => {
            let first = |keys: &[&str]| {
                keys.iter()
                    .find_map(|k| obj.get(*k).and_then(Value::as_str))
                    .map(str::to_string)
            };
            Some(ContentLink {
                name: first(NAME_KEYS).unwrap_or_default(),
                friendly_name: first(&["friendly_name"]),
                link: first(LINK_KEYS).unwrap_or_default(),
            })
        }
        _ => None,
    }
}
