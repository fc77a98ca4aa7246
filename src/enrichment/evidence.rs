use crate::models::{ItemDescription, is_meaningful};

/// Joined text evidence for one enrichment pass.
///
/// `raw` keeps original casing for shape-sensitive extraction (all-caps tokens, glyphs);
/// `text` is the lowercase form every keyword matcher scans.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvidenceCorpus {
    raw: String,
    text: String,
}

impl EvidenceCorpus {
    /// Joins the description's free-text fields in a fixed order.
    pub fn from_item(item: &ItemDescription) -> Self {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(visible) = item.identifiers.visible_text.as_deref() {
            parts.push(visible);
        }
        parts.extend(item.identifiers.logos_seen.iter().map(String::as_str));
        parts.push(&item.condition.description);
        parts.extend(
            item.identifiers
                .distinctive_features
                .iter()
                .map(String::as_str),
        );
        parts.extend(item.key_features.iter().map(String::as_str));
        parts.push(&item.category);
        parts.extend(item.specifications.values());
        parts.extend(item.materials.iter().map(String::as_str));
        if let Some(style) = item.style.as_deref() {
            parts.push(style);
        }
        if let Some(size) = item.identifiers.size_info.as_deref() {
            parts.push(size);
        }
        if let Some(color) = item.identifiers.color.as_deref() {
            parts.push(color);
        }

        let raw = parts
            .into_iter()
            .map(str::trim)
            .filter(|part| is_meaningful(part))
            .collect::<Vec<_>>()
            .join(" ");
        Self::from_text(&raw)
    }

    pub fn from_text(raw: &str) -> Self {
        let raw = raw.trim().to_string();
        let text = raw.to_lowercase();
        Self { raw, text }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn contains(&self, needle: &str) -> bool {
        !needle.is_empty() && self.text.contains(&needle.to_lowercase())
    }

    /// Needles from `needles` present in the corpus, in declaration order.
    pub fn hits<'a>(&self, needles: &'a [String]) -> Vec<&'a str> {
        needles
            .iter()
            .filter(|needle| self.contains(needle))
            .map(String::as_str)
            .collect()
    }

    /// Alphanumeric tokens (apostrophes and `&` kept inside words).
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.text
            .split(|ch: char| !(ch.is_alphanumeric() || ch == '\'' || ch == '&'))
            .filter(|token| !token.is_empty())
    }
}
