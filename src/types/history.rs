use serde::{Deserialize, Serialize};

use super::{AdCreative, CarouselCreative};

/// A saved snapshot, persisted as `{"kind": "...", "content": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "lowercase")]
pub enum HistoryItem {
    Single(AdCreative),
    Carousel(CarouselCreative),
}

impl HistoryItem {
    pub fn id(&self) -> &str {
        match self {
            HistoryItem::Single(c) => &c.id,
            HistoryItem::Carousel(c) => &c.id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            HistoryItem::Single(_) => "single",
            HistoryItem::Carousel(_) => "carousel",
        }
    }

    /// Short human label (title of the creative or of the first slide).
    pub fn label(&self) -> String {
        let raw = match self {
            HistoryItem::Single(c) => c.title.as_str(),
            HistoryItem::Carousel(c) => c.slides.first().map(|s| s.title.as_str()).unwrap_or(""),
        };
        crate::editor::RichText::parse(raw).plain_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AdCopyVariation, CarouselCreative};

    #[test]
    fn serializes_with_kind_and_content_tags() {
        let creative = AdCreative::from_variation(
            "creative-1".into(),
            AdCopyVariation {
                title: "Fresh <b>beans</b>".into(),
                subtitle: "s".into(),
                body: "b".into(),
                caption: "c".into(),
                background_prompt: "p".into(),
            },
            "data:image/png;base64,AAAA".into(),
        );
        let item = HistoryItem::Single(creative);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["kind"], "single");
        assert_eq!(json["content"]["id"], "creative-1");
        assert_eq!(item.label(), "Fresh beans");

        let carousel = HistoryItem::Carousel(CarouselCreative {
            id: "carousel-1".into(),
            slides: vec![],
            caption: "cap".into(),
        });
        let json = serde_json::to_value(&carousel).unwrap();
        assert_eq!(json["kind"], "carousel");
        assert_eq!(carousel.id(), "carousel-1");
    }
}
