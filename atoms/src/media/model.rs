use std::sync::LazyLock;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

static DATA_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^data:(.+);base64,(.+)$").expect("data url pattern is valid")
});

const DEFAULT_EXTENSION: &str = "jpg";

/// One slot of a property gallery, as the site renders it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub class_name: String,
}

impl GalleryImage {
    /// Both `src` and `href` point at the same hosted file.
    pub fn hosted(url: String, class_name: String) -> Self {
        Self {
            href: url.clone(),
            src: url,
            class_name,
        }
    }

    pub fn is_hosted(&self) -> bool {
        self.src.starts_with("http")
    }

    /// CSS class the site layout expects for a slot, e.g. `item2 box-img` for slot 0.
    pub fn default_class_name(slot: usize) -> String {
        format!("item{} box-img", slot + 2)
    }
}

/// A decoded `data:<mime>;base64,<payload>` image submitted by the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl InlineImage {
    /// Returns `None` for anything that is not a well-formed base64 data URL.
    pub fn parse(src: &str) -> Option<Self> {
        let captures = DATA_URL.captures(src)?;
        let mime_type = captures.get(1)?.as_str();
        let payload = captures.get(2)?.as_str();

        match STANDARD.decode(payload) {
            Ok(bytes) => Some(Self {
                mime_type: mime_type.to_string(),
                bytes,
            }),
            Err(e) => {
                tracing::warn!("Inline image with mime {} has an undecodable payload: {}", mime_type, e);
                None
            }
        }
    }

    /// File extension taken from the mime subtype, `jpg` when there is none.
    pub fn extension(&self) -> &str {
        self.mime_type
            .split('/')
            .nth(1)
            .filter(|subtype| !subtype.is_empty())
            .unwrap_or(DEFAULT_EXTENSION)
    }
}

/// `property-<unix millis>-<random>-<slot>.<ext>`
pub fn gallery_file_name(slot: usize, extension: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let nonce: u32 = rand::rng().random_range(0..1_000_000_000);
    format!("property-{}-{}-{}.{}", millis, nonce, slot, extension)
}

/// Storage file name behind a hosted URL: its last path segment, percent-decoded.
pub fn file_name_from_url(url: &str) -> Option<String> {
    let last = url.rsplit('/').next()?;
    if last.is_empty() {
        return None;
    }
    urlencoding::decode(last).ok().map(|name| name.into_owned())
}
