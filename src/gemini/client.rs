use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::api_types::{
    ApiErrorBody, GenerateContentRequest, GenerateContentResponse, Part, PredictInstance,
    PredictParameters, PredictRequest, PredictResponse,
};
use super::{prompts, AiCollaborator};
use crate::config::ApiConfig;
use crate::error::{ForgeError, Result};
use crate::types::{AdCopyVariation, AspectRatio, CarouselPlan, InlineMedia};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// REST client for the Generative Language API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: Url,
    config: ApiConfig,
}

impl GeminiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(ForgeError::Network)?;

        Ok(Self {
            http,
            base_url,
            config: config.clone(),
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> Result<Url> {
        self.base_url
            .join(&format!("/v1beta/models/{model}:{method}"))
            .map_err(ForgeError::InvalidUrl)
    }

    async fn generate_content(
        &self,
        api_key: &str,
        model: &str,
        request: &GenerateContentRequest,
        context: &str,
    ) -> Result<GenerateContentResponse> {
        let url = self.endpoint(model, "generateContent")?;
        debug!(model, context, "calling generateContent");
        let builder = self
            .http
            .post(url)
            .header(API_KEY_HEADER, api_key)
            .json(request);
        self.send_json(builder, context).await
    }

    async fn generate_json<T: DeserializeOwned>(
        &self,
        api_key: &str,
        request: GenerateContentRequest,
        context: &str,
    ) -> Result<T> {
        let response = self
            .generate_content(api_key, &self.config.text_model, &request, context)
            .await?;
        parse_json_payload(&response.text(), context)
    }

    async fn generate_text(
        &self,
        api_key: &str,
        request: GenerateContentRequest,
        context: &str,
    ) -> Result<String> {
        let response = self
            .generate_content(api_key, &self.config.text_model, &request, context)
            .await?;
        let text = response.text();
        if text.trim().is_empty() {
            return Err(ForgeError::api(
                None,
                context,
                empty_response_message(&response, "the response contained no text"),
            ));
        }
        Ok(text)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<T> {
        let response = request.send().await.map_err(ForgeError::Network)?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.is_success() {
            return serde_json::from_str(&body).map_err(ForgeError::Serialization);
        }

        Err(ForgeError::classify(
            context,
            Some(status),
            &error_message(status, &body),
        ))
    }
}

#[async_trait]
impl AiCollaborator for GeminiClient {
    async fn generate_ad_copy(
        &self,
        api_key: &str,
        project_context: &str,
        count: usize,
    ) -> Result<Vec<AdCopyVariation>> {
        let request = GenerateContentRequest::new(vec![Part::text(prompts::ad_copy(
            project_context,
            count,
        ))])
        .with_json_schema(prompts::ad_copy_schema());
        self.generate_json(api_key, request, "generate the ad copy")
            .await
    }

    async fn generate_carousel_plan(
        &self,
        api_key: &str,
        project_context: &str,
        style_guide: &str,
        has_expert_image: bool,
        slide_count: usize,
    ) -> Result<CarouselPlan> {
        let request = GenerateContentRequest::new(vec![Part::text(prompts::carousel_plan(
            project_context,
            style_guide,
            has_expert_image,
            slide_count,
        ))])
        .with_json_schema(prompts::carousel_plan_schema(slide_count));
        self.generate_json(api_key, request, "plan the carousel")
            .await
    }

    async fn generate_image(
        &self,
        api_key: &str,
        prompt: &str,
        ratio: AspectRatio,
    ) -> Result<InlineMedia> {
        let context = "generate the image";
        let url = self.endpoint(&self.config.image_model, "predict")?;
        debug!(
            model = %self.config.image_model,
            ratio = %ratio,
            api_ratio = ratio.api_ratio(),
            "calling predict"
        );
        let body = PredictRequest {
            instances: vec![PredictInstance {
                prompt: prompt.to_string(),
            }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: ratio.api_ratio().to_string(),
                output_mime_type: "image/png".to_string(),
            },
        };
        let builder = self
            .http
            .post(url)
            .header(API_KEY_HEADER, api_key)
            .json(&body);
        let response: PredictResponse = self.send_json(builder, context).await?;

        response
            .predictions
            .into_iter()
            .find_map(|p| {
                p.bytes_base64_encoded.map(|data| InlineMedia {
                    data,
                    mime_type: p.mime_type.unwrap_or_else(|| "image/png".to_string()),
                })
            })
            .ok_or_else(|| ForgeError::api(None, context, "no image was generated"))
    }

    async fn recreate_with_subject(
        &self,
        api_key: &str,
        subject: &InlineMedia,
        prompt: &str,
        ratio: AspectRatio,
    ) -> Result<InlineMedia> {
        let context = "recreate the expert image";
        let request = GenerateContentRequest::new(vec![
            Part::inline(subject),
            Part::text(prompts::subject_recreation(prompt, ratio.edit_instruction())),
        ])
        .with_modality("IMAGE");
        let response = self
            .generate_content(api_key, &self.config.edit_model, &request, context)
            .await?;

        response.first_inline_data().cloned().ok_or_else(|| {
            ForgeError::api(
                None,
                context,
                empty_response_message(
                    &response,
                    "no image was recreated; the response may have been blocked or invalid",
                ),
            )
        })
    }

    async fn transcribe_audio(&self, api_key: &str, audio: &InlineMedia) -> Result<String> {
        let request = GenerateContentRequest::new(vec![
            Part::text(prompts::TRANSCRIPTION),
            Part::inline(audio),
        ]);
        self.generate_text(api_key, request, "transcribe the audio")
            .await
    }

    async fn extract_text(&self, api_key: &str, document: &InlineMedia) -> Result<String> {
        let request = GenerateContentRequest::new(vec![
            Part::text(prompts::DOCUMENT_EXTRACTION),
            Part::inline(document),
        ]);
        self.generate_text(api_key, request, "extract text from the file")
            .await
    }

    async fn generate_alternative_hooks(
        &self,
        api_key: &str,
        context: &str,
    ) -> Result<Vec<String>> {
        let request = GenerateContentRequest::new(vec![Part::text(prompts::alternative_hooks(
            context,
        ))])
        .with_json_schema(prompts::string_list_schema());
        self.generate_json(api_key, request, "generate alternative hooks")
            .await
    }

    async fn generate_alternative_captions(
        &self,
        api_key: &str,
        context: &str,
    ) -> Result<Vec<String>> {
        let request = GenerateContentRequest::new(vec![Part::text(
            prompts::alternative_captions(context),
        )])
        .with_json_schema(prompts::string_list_schema());
        self.generate_json(api_key, request, "generate alternative captions")
            .await
    }

    async fn generate_speech(&self, api_key: &str, text: &str) -> Result<InlineMedia> {
        let context = "generate the audio narration";
        let request = GenerateContentRequest::new(vec![Part::text(text)])
            .with_modality("AUDIO")
            .with_voice(&self.config.voice);
        let response = self
            .generate_content(api_key, &self.config.speech_model, &request, context)
            .await?;
        response
            .first_inline_data()
            .cloned()
            .ok_or_else(|| ForgeError::api(None, context, "no audio was generated"))
    }
}

/// Parses a JSON payload out of a model response, tolerating a Markdown code fence.
pub(crate) fn parse_json_payload<T: DeserializeOwned>(text: &str, context: &str) -> Result<T> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str(unfenced).map_err(|e| {
        ForgeError::api(
            None,
            context,
            format!("the response was not valid JSON for the expected schema: {e}"),
        )
    })
}

fn empty_response_message(response: &GenerateContentResponse, fallback: &str) -> String {
    match response.block_reason() {
        Some(reason) => format!("{fallback} (reason: {reason})"),
        None => fallback.to_string(),
    }
}

fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => {
            let detail = parsed.error;
            let message = detail
                .message
                .unwrap_or_else(|| format!("API returned status {}", status.as_u16()));
            match detail.status {
                Some(code) => format!("{message} [{code}]"),
                None => message,
            }
        }
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => format!("API returned status {}", status.as_u16()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn endpoint_joins_model_and_method() {
        let client = GeminiClient::new(&ApiConfig::default()).expect("client");
        let url = client.endpoint("gemini-2.5-pro", "generateContent").unwrap();
        assert_eq!(
            url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-pro:generateContent"
        );
    }

    #[test]
    fn error_message_prefers_structured_body() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        let msg = error_message(StatusCode::BAD_REQUEST, body);
        assert_eq!(
            msg,
            "API key not valid. Please pass a valid API key. [INVALID_ARGUMENT]"
        );
        assert!(ForgeError::classify("x", Some(StatusCode::BAD_REQUEST), &msg).is_credential());
    }

    #[test]
    fn error_message_falls_back_to_status() {
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, ""),
            "API returned status 502"
        );
    }

    #[test]
    fn json_payload_accepts_fenced_output() {
        let hooks: Vec<String> =
            parse_json_payload("```json\n[\"a\", \"b\"]\n```", "generate alternative hooks")
                .unwrap();
        assert_eq!(hooks, vec!["a", "b"]);
    }

    #[test]
    fn json_payload_errors_carry_context() {
        let err = parse_json_payload::<Vec<String>>("not json", "plan the carousel").unwrap_err();
        assert!(err.to_string().contains("plan the carousel"));
    }
}
