//! Emergency Reporting Chatbot
//!
//! Visitors describe an incident in text, send a photo, or both. A photo is
//! captioned by the vision collaborator and the caption joins the
//! conversation as a user message. The text model then answers in the
//! visitor's language, and every exchange is written to disk as a report.
//!
//! Collaborator failures degrade to fixed texts. Only a report that cannot
//! be written, or a request with neither message nor image, is an error.

pub mod store;

pub use store::{ReportRecord, ReportStore};

use base64::Engine as _;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

use sdk::errors::EngineError;
use sdk::types::{ConversationItem, ReportRequest, ReportResponse};

use crate::llm::{CompletionRequest, ImageCaptioner, ImageInput, LLMProvider, Message, MessageRole};
use crate::secrets::SecretManager;

/// Instructions for the reporting assistant, in Arabic and English
pub const REPORT_SYSTEM_PROMPT: &str = "\
أنت مساعد ذكي مخصص لتلقي بلاغات الطوارئ داخل الملاعب. وظيفتك هي:
- استقبال البلاغات من المستخدمين.
- التفاعل معهم لفهم الحالة (مثل إغماء، سقوط، شيء غريب).
- طلب الموقع (بصورة أو كتابة).
- تأكيد استلام البلاغ بلغة لبقة.

You are an assistant that receives emergency reports inside stadiums through a chat interface. Your job is to:
- Understand emergencies (fainting, fallen objects, strange situations).
- Ask for the location (an image or a written description).
- Confirm the report kindly.

Reply in the language the user writes in (Arabic or English) and do not switch unless the user does.
Keep your tone polite, helpful and human. When someone reports an emergency such as \"someone fainted\" (أغمي على شخص), immediately ask for the location: nearby signs, a section number, or a picture.
When the location is provided, confirm receipt with a message like \"Your report has been sent. Stay safe\" (تم ارسال البلاغ دمتم بسلام).";

/// Caption used when the vision collaborator fails
pub const CAPTION_FALLBACK: &str = "Unable to analyze the image content.";

/// Reply used when the text collaborator fails
pub const REPORT_APOLOGY: &str = "عذراً، حدث خطأ في معالجة طلبك. حاول مرة أخرى لاحقاً. \
(Sorry, there was an error processing your request. Please try again later.)";

const REPORT_TEMPERATURE: f32 = 0.7;

/// Decode base64 image data, with or without a `data:<mime>;base64,` prefix.
///
/// The mime type comes from the prefix when present, otherwise from the
/// leading bytes of the image. Returns `None` for data that is not valid
/// base64 or decodes to nothing.
pub fn decode_image(data: &str) -> Option<ImageInput> {
    let (declared_mime, payload) = match data.split_once("base64,") {
        Some((prefix, payload)) => {
            let mime = prefix
                .strip_prefix("data:")
                .map(|m| m.trim_end_matches(';'))
                .filter(|m| !m.is_empty())
                .map(str::to_string);
            (mime, payload)
        }
        None => (None, data),
    };

    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = match base64::engine::general_purpose::STANDARD.decode(compact.as_bytes()) {
        Ok(bytes) if !bytes.is_empty() => bytes,
        Ok(_) => {
            warn!("Image data decoded to zero bytes, ignoring image");
            return None;
        }
        Err(e) => {
            warn!("Error decoding image: {}", e);
            return None;
        }
    };

    let mime = declared_mime.unwrap_or_else(|| sniff_mime(&bytes).to_string());
    Some(ImageInput::new(bytes, mime))
}

fn sniff_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/jpeg"
    }
}

pub struct EmergencyReporter {
    provider: Arc<dyn LLMProvider>,
    captioner: Option<Arc<dyn ImageCaptioner>>,
    store: ReportStore,
}

impl EmergencyReporter {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        captioner: Option<Arc<dyn ImageCaptioner>>,
        store: ReportStore,
    ) -> Self {
        Self {
            provider,
            captioner,
            store,
        }
    }

    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    /// Handle one `/rchat` exchange
    pub async fn process(&self, request: ReportRequest) -> Result<ReportResponse, EngineError> {
        let message = request
            .message
            .filter(|m| !m.trim().is_empty());
        let image_data = request
            .image_data
            .filter(|d| !d.trim().is_empty());

        if message.is_none() && image_data.is_none() {
            return Err(EngineError::InvalidInput(
                "Request must contain at least a message or image_data".to_string(),
            ));
        }

        let mut conversation = request.conversation_history;
        if let Some(message) = &message {
            conversation.push(ConversationItem::new("user", message.as_str()));
        }

        let image_caption = match image_data.as_deref().and_then(decode_image) {
            Some(image) => {
                let caption = self.caption(&image).await;
                conversation.push(ConversationItem::new(
                    "user",
                    format!("[Image uploaded] Description: {}", caption),
                ));
                Some(caption)
            }
            None => None,
        };

        let ai_response = self.generate(&conversation).await;
        conversation.push(ConversationItem::new("assistant", ai_response.as_str()));

        let record = ReportRecord {
            timestamp: Utc::now(),
            user_message: message,
            image_provided: image_data.is_some(),
            image_caption,
            ai_response: ai_response.clone(),
            conversation: conversation.clone(),
        };
        let path = self.store.save(&record).await?;

        Ok(ReportResponse {
            response: ai_response,
            conversation,
            report_saved: true,
            report_path: Some(path.display().to_string()),
        })
    }

    async fn caption(&self, image: &ImageInput) -> String {
        let Some(captioner) = &self.captioner else {
            debug!("No image captioner configured");
            return CAPTION_FALLBACK.to_string();
        };

        match captioner.caption(image).await {
            Ok(caption) if !caption.trim().is_empty() => caption,
            Ok(_) => CAPTION_FALLBACK.to_string(),
            Err(e) => {
                warn!(
                    "Error analyzing image with {}: {}",
                    captioner.name(),
                    SecretManager::scrub(&e.to_string())
                );
                CAPTION_FALLBACK.to_string()
            }
        }
    }

    async fn generate(&self, conversation: &[ConversationItem]) -> String {
        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(Message::system(REPORT_SYSTEM_PROMPT));
        messages.extend(conversation.iter().map(|item| Message {
            role: MessageRole::parse_lenient(&item.role),
            content: item.content.clone(),
        }));

        let request = CompletionRequest::new(messages).with_temperature(REPORT_TEMPERATURE);
        match self.provider.complete(&request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    "Error generating report response: {}",
                    SecretManager::scrub(&e.to_string())
                );
                REPORT_APOLOGY.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_base64() {
        let image = decode_image("/9j/4AAQ").unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(&image.bytes[..3], &[0xff, 0xd8, 0xff]);
    }

    #[test]
    fn test_decode_data_url_keeps_declared_mime() {
        let image = decode_image("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(&image.bytes[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_decode_sniffs_png_without_prefix() {
        let image = decode_image("iVBORw0KGgo=").unwrap();
        assert_eq!(image.mime_type, "image/png");
    }

    #[test]
    fn test_decode_ignores_whitespace() {
        assert!(decode_image("/9j/\n4AAQ").is_some());
    }

    #[test]
    fn test_decode_invalid() {
        assert!(decode_image("not base64 at all!").is_none());
        assert!(decode_image("data:image/png;base64,").is_none());
    }
}
