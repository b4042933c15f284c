use crate::answer::AnswerResult;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::image_processing::CroppedImage;
use futures::future::BoxFuture;
use gemini_rust::{Blob, Content, Gemini, Message, Part, Role};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
const DEFAULT_MIME: &str = "image/png";

/// Instruction sent with every cropped question.
pub const MCQ_PROMPT: &str = "\
You are an expert exam solver. Analyze this image of a multiple-choice question.
1. Extract the question text.
2. Extract the options.
3. Identify the correct answer.
4. Provide a short, clear explanation.

Return the result as a raw JSON object (no markdown backticks) with this structure:
{
  \"question\": \"string\",
  \"options\": [{\"label\": \"A\", \"text\": \"...\"}],
  \"answerLabel\": \"A\",
  \"explanation\": \"string\"
}";

/// Splits `data:<mime>;base64,<data>` into its MIME type and payload.
///
/// Input without a data-URI prefix is returned unchanged with no MIME type.
pub fn split_data_uri(encoded: &str) -> (Option<&str>, &str) {
    if let Some(rest) = encoded.strip_prefix("data:") {
        if let Some((header, data)) = rest.split_once(',') {
            let mime = header
                .split(';')
                .next()
                .filter(|m| !m.is_empty());
            return (mime, data);
        }
    }
    (None, encoded)
}

/// Removes one data-URI prefix if present.
pub fn strip_data_uri_prefix(encoded: &str) -> &str {
    split_data_uri(encoded).1
}

/// Removes markdown code-fence markers the model wraps around JSON.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parses the model's reply into a validated answer.
///
/// The raw reply is logged when it is not JSON and never returned.
pub fn parse_answer(response_text: &str) -> Result<AnswerResult> {
    let clean = strip_code_fences(response_text);

    let value: serde_json::Value = serde_json::from_str(&clean).map_err(|e| {
        log::error!("Failed to parse Gemini response ({}): {}", e, response_text);
        AppError::UnparsableResponse
    })?;

    AnswerResult::from_value(value).map_err(|e| {
        log::warn!("Gemini returned an unusable answer: {}", e);
        AppError::InvalidAnswer(e)
    })
}

/// Resource path of a model, adding the `models/` prefix when missing.
fn model_path(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

/// Everything needed for one inference call.
#[derive(Clone, Copy)]
pub struct InferenceRequest<'a> {
    pub api_key: &'a str,
    pub model: &'a str,
    pub instruction: &'a str,
    pub mime_type: &'a str,
    /// Raw base64, without any data-URI prefix.
    pub image_data: &'a str,
}

/// A multimodal endpoint that turns an instruction plus image into text.
pub trait InferenceTransport: Send + Sync {
    fn generate<'a>(&'a self, request: InferenceRequest<'a>) -> BoxFuture<'a, Result<String>>;
}

/// Talks to the Gemini `generateContent` endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeminiTransport;

impl GeminiTransport {
    fn client(api_key: &str, model: &str) -> Result<Gemini> {
        // Explicitly set the base URL to avoid a BadScheme error
        let base_url = url::Url::parse(GEMINI_BASE_URL)
            .map_err(|e| AppError::config(format!("Invalid base URL: {}", e)))?;

        let model_url = format!("{}{}", GEMINI_BASE_URL, model_path(model));

        Gemini::with_model_and_base_url(api_key, model_url, base_url)
            .map_err(|e| AppError::config(format!("Failed to create Gemini client: {}", e)))
    }
}

impl InferenceTransport for GeminiTransport {
    fn generate<'a>(&'a self, request: InferenceRequest<'a>) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let client = Self::client(request.api_key, request.model)?;

            let text_part = Part::Text {
                text: request.instruction.to_string(),
                thought: None,
                thought_signature: None,
            };

            let image_part = Part::InlineData {
                inline_data: Blob {
                    mime_type: request.mime_type.to_string(),
                    data: request.image_data.to_string(),
                },
                media_resolution: None,
            };

            let message = Message {
                role: Role::User,
                content: Content {
                    role: Some(Role::User),
                    parts: Some(vec![text_part, image_part]),
                },
            };

            let response = client
                .generate_content()
                .with_messages(vec![message])
                .execute()
                .await
                .map_err(|e| AppError::gemini(format!("API request failed: {:?}", e)))?;

            if let Some(candidate) = response.candidates.first() {
                if let Some(parts) = &candidate.content.parts {
                    let text: String = parts
                        .iter()
                        .filter_map(|part| match part {
                            Part::Text { text, thought, .. } if !thought.unwrap_or(false) => {
                                Some(text.as_str())
                            }
                            _ => None,
                        })
                        .collect();
                    if !text.is_empty() {
                        return Ok(text);
                    }
                }
            }

            Err(AppError::gemini("No text response received from Gemini"))
        })
    }
}

/// Sends cropped questions to the answer service, one attempt per call.
pub struct AnswerClient<T = GeminiTransport> {
    api_key: String,
    model: String,
    transport: T,
}

impl AnswerClient<GeminiTransport> {
    pub fn from_config(config: &Config) -> Self {
        Self::with_transport(config, GeminiTransport)
    }
}

impl<T: InferenceTransport> AnswerClient<T> {
    pub fn with_transport(config: &Config, transport: T) -> Self {
        Self {
            api_key: config.gemini_api_key.clone(),
            model: config.model_name.clone(),
            transport,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn solve(&self, image: &CroppedImage) -> Result<AnswerResult> {
        self.solve_encoded(image.data_uri()).await
    }

    /// Solves an image given as a data URI or raw base64 PNG.
    pub async fn solve_encoded(&self, encoded: &str) -> Result<AnswerResult> {
        if self.api_key.trim().is_empty() {
            return Err(AppError::MissingCredential);
        }

        let (mime, data) = split_data_uri(encoded);
        let request = InferenceRequest {
            api_key: &self.api_key,
            model: &self.model,
            instruction: MCQ_PROMPT,
            mime_type: mime.unwrap_or(DEFAULT_MIME),
            image_data: data,
        };

        log::info!("Sending {} bytes of {} to {}", data.len(), request.mime_type, self.model);
        let start = std::time::Instant::now();
        let text = self.transport.generate(request).await?;
        log::info!("Gemini replied in {}ms", start.elapsed().as_millis());

        parse_answer(&text)
    }
}
