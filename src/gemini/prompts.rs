//! Prompt text and response schemas sent to the text model.

use serde_json::{json, Value};

pub fn ad_copy_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "title": {"type": "STRING", "description": "Main ad headline. Short and punchy."},
                "subtitle": {"type": "STRING", "description": "Subtitle complementing the headline."},
                "body": {"type": "STRING", "description": "Ad body copy. More descriptive."},
                "caption": {"type": "STRING", "description": "Caption for the social media post."},
                "backgroundPrompt": {"type": "STRING", "description": "Prompt suggestion for generating the background image, based on the copy and strategy."}
            },
            "required": ["title", "subtitle", "body", "caption", "backgroundPrompt"]
        }
    })
}

pub fn carousel_plan_schema(slide_count: usize) -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "caption": {"type": "STRING", "description": "The complete emotional caption for the carousel post."},
            "slides": {
                "type": "ARRAY",
                "description": format!("A list of exactly {slide_count} slides for the carousel."),
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "image_prompt": {"type": "STRING", "description": "A detailed prompt for the AI to create this slide's background image."},
                        "title": {"type": "STRING", "description": "The slide headline. Short, punchy and direct."},
                        "subtitle": {"type": "STRING", "description": "The slide subtitle or body text complementing the headline."}
                    },
                    "required": ["image_prompt", "title", "subtitle"]
                }
            }
        },
        "required": ["caption", "slides"]
    })
}

pub fn string_list_schema() -> Value {
    json!({"type": "ARRAY", "items": {"type": "STRING"}})
}

pub fn ad_copy(project_context: &str, count: usize) -> String {
    format!(
        "Based on the project context and ad strategy below, write {count} copy variations for an ad.\n\
         For each variation provide a title, subtitle, body, social media caption and a suggested prompt for the background image.\n\
         Be creative and conversion focused.\n\n\
         **Context and strategy:**\n{project_context}\n\n\
         Return the answer strictly as JSON following the schema."
    )
}

pub fn carousel_plan(
    project_context: &str,
    style_guide: &str,
    has_expert_image: bool,
    slide_count: usize,
) -> String {
    let style_guide = if style_guide.trim().is_empty() {
        "No specific guideline. Use your creativity."
    } else {
        style_guide.trim()
    };
    let expert = if has_expert_image {
        "Yes. The provided expert must be the protagonist of the carousel's visual story."
    } else {
        "No."
    };
    format!(
        "You are a world-class digital marketing strategist and copywriter. Create a complete Instagram carousel.\n\n\
         **Project context and strategy:**\n{project_context}\n\n\
         **Image guidelines:**\n\
         - Visual style guide (background prompt): {style_guide}\n\
         - Expert present as protagonist: {expert}\n\n\
         **Task:**\n\
         1. Write {slide_count} slides following the sequence hook, introduction, central thesis, arguments, practical application and a final call to action.\n\
         2. For each slide write a 'title' and a 'subtitle' that will be overlaid on the image.\n\
         3. The last slide's call to action MUST ask for a ONE-WORD comment.\n\
         4. For each slide write a detailed 'image_prompt' that follows the image guidelines above.\n\
         5. Write an emotional caption that ends with the same one-word comment call to action.\n\n\
         Return the answer strictly as JSON following the schema, with the 'caption' and exactly {slide_count} 'slides'."
    )
}

pub fn subject_recreation(scene_prompt: &str, ratio_instruction: &str) -> String {
    format!(
        "Reimagine the person in this photo in the following scene: {scene_prompt}. \
         Keep the person, but change the background and the style of the image according to the prompt. {ratio_instruction}"
    )
}

pub const TRANSCRIPTION: &str = "Transcribe the following audio verbatim:";

pub const DOCUMENT_EXTRACTION: &str =
    "Extract all the textual content of this document. If it is a spreadsheet, extract the data in a readable form.";

pub fn alternative_hooks(context: &str) -> String {
    format!(
        "You are a marketing strategist and copywriter. The user generated a carousel from the strategy below \
         and wants 3 alternative hooks for the FIRST slide.\n\n\
         **Carousel context and strategy:**\n{context}\n\n\
         Identify the main narrative angle (curiosity, controversy, desire, problem, belief, story or offer) \
         and write exactly 3 short, punchy alternative hooks aligned with it.\n\
         Return the answer strictly as a JSON array of strings."
    )
}

pub fn alternative_captions(context: &str) -> String {
    format!(
        "You are a marketing strategist and copywriter. The user generated a carousel from the strategy below \
         and wants 3 alternative captions for the post.\n\n\
         **Carousel context and strategy:**\n{context}\n\n\
         Write exactly 3 emotional captions that deepen the carousel theme, each ending with a clear call to action \
         asking for a ONE-WORD comment.\n\
         Return the answer strictly as a JSON array of strings."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carousel_prompt_mentions_slide_count_and_fallback_style() {
        let prompt = carousel_plan("eco coffee", "  ", false, 8);
        assert!(prompt.contains("exactly 8"));
        assert!(prompt.contains("No specific guideline"));
        assert!(prompt.contains("protagonist: No."));
    }

    #[test]
    fn carousel_schema_requires_slide_fields() {
        let schema = carousel_plan_schema(8);
        let required = &schema["properties"]["slides"]["items"]["required"];
        assert_eq!(required[0], "image_prompt");
    }
}
