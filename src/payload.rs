//! Outbound payload construction.
//!
//! [`build_payload`] turns the inbound chat message array plus contextual
//! metadata into the exact JSON body the workflow webhook expects. It is a
//! pure function and never fails: absent or malformed inputs degrade to
//! defaults (empty string, empty sequence, skipped file) rather than errors.
//!
//! Multimodal handling follows the active [`FileMode`]:
//!
//! - `Passthrough`: content is forwarded unmodified, no files are extracted.
//! - `ExtractJson`: text parts are flattened, embeddable (data-URI) images
//!   become inline base64 file records in the JSON body.
//! - `ExtractMultipart`: same extraction, but the file records are returned
//!   alongside the payload for the caller to attach as multipart form parts.
//! - `Disabled`: text parts are flattened, images are extracted and
//!   discarded, never surfaced and never buffered.
//!
//! Remote (non-embeddable) image references are ignored in every mode.

use crate::config::{BridgeOptions, FileMode};
use crate::task::TaskDetectorService;
use crate::types::{
    ContentPart, FileAttachment, Message, MessageContent, MessageRole, OutboundPayload,
    PayloadMessage, UserContext,
};
use base64::Engine;

/// Result of payload construction: the JSON body plus any file records that
/// must travel out-of-band (extract-multipart mode only).
#[derive(Debug, Clone)]
pub struct BuiltPayload {
    pub payload: OutboundPayload,
    /// Extracted files for multipart submission; empty in every other mode.
    pub multipart_files: Vec<FileAttachment>,
}

/// Build the outbound webhook payload from the inbound request.
pub fn build_payload(
    messages: &[Message],
    session_id: &str,
    user_context: UserContext,
    options: &BridgeOptions,
    detectors: &TaskDetectorService,
) -> BuiltPayload {
    let mut files = Vec::new();

    // Leading system message becomes the systemPrompt; system messages never
    // appear in the outbound messages array.
    let system_prompt = messages
        .first()
        .filter(|m| m.role == MessageRole::System)
        .map(|m| m.content.to_text())
        .unwrap_or_default();

    let mut payload_messages = Vec::new();
    for (index, message) in messages.iter().enumerate() {
        if message.role == MessageRole::System {
            // System text went into systemPrompt, but embeddable images in a
            // multimodal system message still become file records.
            if let MessageContent::Parts(parts) = &message.content {
                if options.file_mode.extracts_files() {
                    collect_files(parts, index, &mut files);
                }
            }
            continue;
        }

        let content = match (&message.content, options.file_mode) {
            // Passthrough keeps the original content shape untouched.
            (content, FileMode::Passthrough) => content.clone(),
            (MessageContent::Text(text), _) => MessageContent::Text(text.clone()),
            (MessageContent::Parts(parts), mode) => {
                log::debug!(
                    "normalizing multimodal message {} ({} parts, mode {:?})",
                    index,
                    parts.len(),
                    mode
                );
                collect_files(parts, index, &mut files);
                MessageContent::Text(message.content.to_text())
            }
        };

        payload_messages.push(PayloadMessage {
            role: message.role,
            content,
        });
    }

    let chat_input = messages
        .iter()
        .rev()
        .find(|m| m.role == MessageRole::User)
        .map(|m| m.content.to_text())
        .unwrap_or_default();

    let decision = if options.task_detection {
        detectors.detect_task(messages)
    } else {
        crate::task::TaskDecision::none()
    };

    let user_context = user_context.normalized();

    // Files only ride inline in extract-json mode; multipart files travel
    // next to the payload; disabled mode drops them here.
    let (inline_files, multipart_files) = match options.file_mode {
        FileMode::ExtractJson => (files, Vec::new()),
        FileMode::ExtractMultipart => (Vec::new(), files),
        FileMode::Passthrough | FileMode::Disabled => (Vec::new(), Vec::new()),
    };

    BuiltPayload {
        payload: OutboundPayload {
            system_prompt,
            chat_input,
            messages: payload_messages,
            session_id: session_id.to_string(),
            user_id: user_context.id.unwrap_or_else(|| "anonymous".to_string()),
            user_email: user_context.email,
            user_name: user_context.name,
            user_role: user_context.role,
            is_task: decision.is_task,
            task_type: decision.task_type,
            files: inline_files,
        },
        multipart_files,
    }
}

/// Convert the embeddable image parts of one message into file records.
fn collect_files(parts: &[ContentPart], message_index: usize, files: &mut Vec<FileAttachment>) {
    for (part_index, part) in parts.iter().enumerate() {
        let ContentPart::ImageUrl { image_url } = part else {
            continue;
        };

        let Some((mime_type, data)) = parse_data_uri(&image_url.url) else {
            // Remote references are not embeddable and are ignored.
            continue;
        };

        if base64::engine::general_purpose::STANDARD.decode(data).is_err() {
            log::warn!(
                "skipping file in message {} part {}: data URI payload is not valid base64",
                message_index,
                part_index
            );
            continue;
        }

        files.push(FileAttachment {
            name: format!(
                "message_{}_file_{}.{}",
                message_index,
                part_index,
                extension_for(mime_type)
            ),
            mime_type: mime_type.to_string(),
            base64_data: data.to_string(),
        });
    }
}

/// Split a `data:<mime>;base64,<payload>` URI into mime type and payload.
/// Returns `None` for remote URLs and non-base64 data URIs.
fn parse_data_uri(url: &str) -> Option<(&str, &str)> {
    let rest = url.strip_prefix("data:")?;
    let (header, data) = rest.split_once(',')?;

    let mut segments = header.split(';');
    let mime = segments.next().unwrap_or_default();
    if !segments.any(|s| s == "base64") {
        return None;
    }

    let mime = if mime.is_empty() {
        "application/octet-stream"
    } else {
        mime
    };
    Some((mime, data))
}

/// File extension for a declared media type; unknown types map to `bin`.
fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "application/pdf" => "pdf",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageUrl;

    // A 1x1 transparent PNG, valid base64.
    const PNG_DATA: &str =
        "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

    fn image_message(url: &str) -> Message {
        Message::user_with_parts(vec![
            ContentPart::Text {
                text: "look at this".to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: url.to_string(),
                },
            },
        ])
    }

    fn options_with_mode(mode: FileMode) -> BridgeOptions {
        BridgeOptions::builder()
            .file_mode(mode)
            .task_detection(false)
            .build()
    }

    #[test]
    fn test_system_message_becomes_prompt() {
        let messages = vec![Message::system("be brief"), Message::user("hi")];
        let built = build_payload(
            &messages,
            "s1",
            UserContext::default(),
            &BridgeOptions::default(),
            &TaskDetectorService::new(),
        );

        assert_eq!(built.payload.system_prompt, "be brief");
        assert_eq!(built.payload.messages.len(), 1);
        assert_eq!(built.payload.chat_input, "hi");
    }

    #[test]
    fn test_no_system_message_yields_empty_prompt() {
        let messages = vec![Message::user("hi")];
        let built = build_payload(
            &messages,
            "s1",
            UserContext::default(),
            &BridgeOptions::default(),
            &TaskDetectorService::new(),
        );
        assert_eq!(built.payload.system_prompt, "");
    }

    #[test]
    fn test_user_id_defaults_to_anonymous() {
        let built = build_payload(
            &[Message::user("hi")],
            "s1",
            UserContext::default(),
            &BridgeOptions::default(),
            &TaskDetectorService::new(),
        );
        assert_eq!(built.payload.user_id, "anonymous");
    }

    #[test]
    fn test_empty_context_fields_are_absent() {
        let ctx = UserContext {
            id: Some("u1".to_string()),
            email: Some(String::new()),
            name: None,
            role: Some("admin".to_string()),
        };
        let built = build_payload(
            &[Message::user("hi")],
            "s1",
            ctx,
            &BridgeOptions::default(),
            &TaskDetectorService::new(),
        );

        assert_eq!(built.payload.user_id, "u1");
        assert!(built.payload.user_email.is_none());
        assert!(built.payload.user_name.is_none());
        assert_eq!(built.payload.user_role.as_deref(), Some("admin"));
    }

    #[test]
    fn test_extract_json_inlines_files() {
        let url = format!("data:image/png;base64,{}", PNG_DATA);
        let messages = vec![image_message(&url)];
        let built = build_payload(
            &messages,
            "s1",
            UserContext::default(),
            &options_with_mode(FileMode::ExtractJson),
            &TaskDetectorService::new(),
        );

        assert_eq!(built.payload.files.len(), 1);
        assert!(built.multipart_files.is_empty());
        let file = &built.payload.files[0];
        assert_eq!(file.name, "message_0_file_1.png");
        assert_eq!(file.mime_type, "image/png");
        assert_eq!(file.base64_data, PNG_DATA);
        // Content flattened to the text parts.
        assert!(matches!(
            built.payload.messages[0].content,
            MessageContent::Text(ref t) if t == "look at this"
        ));
    }

    #[test]
    fn test_system_message_images_are_extracted() {
        let url = format!("data:image/png;base64,{}", PNG_DATA);
        let messages = vec![
            Message {
                role: MessageRole::System,
                content: MessageContent::Parts(vec![
                    ContentPart::Text {
                        text: "be brief".to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url },
                    },
                ]),
            },
            Message::user("what is in the image?"),
        ];
        let built = build_payload(
            &messages,
            "s1",
            UserContext::default(),
            &options_with_mode(FileMode::ExtractJson),
            &TaskDetectorService::new(),
        );

        assert_eq!(built.payload.system_prompt, "be brief");
        assert_eq!(built.payload.files.len(), 1);
        assert_eq!(built.payload.files[0].name, "message_0_file_1.png");
        // The system message itself still stays out of the messages array.
        assert_eq!(built.payload.messages.len(), 1);
    }

    #[test]
    fn test_extract_multipart_returns_files_out_of_band() {
        let url = format!("data:image/png;base64,{}", PNG_DATA);
        let built = build_payload(
            &[image_message(&url)],
            "s1",
            UserContext::default(),
            &options_with_mode(FileMode::ExtractMultipart),
            &TaskDetectorService::new(),
        );

        assert!(built.payload.files.is_empty());
        assert_eq!(built.multipart_files.len(), 1);
    }

    #[test]
    fn test_disabled_mode_discards_files() {
        let url = format!("data:image/png;base64,{}", PNG_DATA);
        let built = build_payload(
            &[image_message(&url)],
            "s1",
            UserContext::default(),
            &options_with_mode(FileMode::Disabled),
            &TaskDetectorService::new(),
        );

        assert!(built.payload.files.is_empty());
        assert!(built.multipart_files.is_empty());
        // Text is still normalized.
        assert!(matches!(
            built.payload.messages[0].content,
            MessageContent::Text(_)
        ));
    }

    #[test]
    fn test_passthrough_preserves_parts() {
        let url = format!("data:image/png;base64,{}", PNG_DATA);
        let built = build_payload(
            &[image_message(&url)],
            "s1",
            UserContext::default(),
            &options_with_mode(FileMode::Passthrough),
            &TaskDetectorService::new(),
        );

        assert!(built.payload.files.is_empty());
        assert!(matches!(
            built.payload.messages[0].content,
            MessageContent::Parts(_)
        ));
    }

    #[test]
    fn test_remote_image_references_are_ignored() {
        let built = build_payload(
            &[image_message("https://example.com/cat.png")],
            "s1",
            UserContext::default(),
            &options_with_mode(FileMode::ExtractJson),
            &TaskDetectorService::new(),
        );
        assert!(built.payload.files.is_empty());
    }

    #[test]
    fn test_invalid_base64_is_skipped_not_fatal() {
        let built = build_payload(
            &[image_message("data:image/png;base64,@@not-base64@@")],
            "s1",
            UserContext::default(),
            &options_with_mode(FileMode::ExtractJson),
            &TaskDetectorService::new(),
        );
        assert!(built.payload.files.is_empty());
    }

    #[test]
    fn test_unknown_mime_maps_to_bin() {
        assert_eq!(extension_for("application/x-thing"), "bin");
        assert_eq!(extension_for("image/webp"), "webp");
    }

    #[test]
    fn test_chat_input_empty_when_no_user_message() {
        let built = build_payload(
            &[Message::assistant("hello")],
            "s1",
            UserContext::default(),
            &BridgeOptions::default(),
            &TaskDetectorService::new(),
        );
        assert_eq!(built.payload.chat_input, "");
    }

    #[test]
    fn test_task_detection_sets_flags() {
        let built = build_payload(
            &[Message::user("please summarize this document")],
            "s1",
            UserContext::default(),
            &BridgeOptions::default(),
            &TaskDetectorService::new(),
        );
        assert!(built.payload.is_task);
        assert!(built.payload.task_type.is_some());
    }

    #[test]
    fn test_parse_data_uri() {
        assert_eq!(
            parse_data_uri("data:image/png;base64,AAAA"),
            Some(("image/png", "AAAA"))
        );
        assert_eq!(
            parse_data_uri("data:;base64,AAAA"),
            Some(("application/octet-stream", "AAAA"))
        );
        assert_eq!(parse_data_uri("data:text/plain,hello"), None);
        assert_eq!(parse_data_uri("https://example.com/x.png"), None);
    }
}
