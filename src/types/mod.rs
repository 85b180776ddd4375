//! Core data types: creatives, carousels, history entries and media payloads.

mod aspect;
mod creative;
mod history;
mod media;

pub use aspect::{AspectRatio, AspectRatioParseError};
pub use creative::{
    new_id, placeholder_image_url, AdCopyVariation, AdCreative, CarouselCreative, CarouselPlan,
    CarouselSlide, SlideField, SlidePlan, TextField,
};
pub use history::HistoryItem;
pub use media::InlineMedia;
