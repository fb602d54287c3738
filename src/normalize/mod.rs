use log::warn;

use crate::models::response::{ AvatarMessage, ModelReply, ResponseEnvelope };
use crate::sanitize::{ scrub_structured_fragments, strip_markup };

/// Expression and animation tag used when the model's output could not be
/// parsed and the reply degrades to a single plain-text message.
const FALLBACK_TAG: &str = "Talking_0";

fn sanitize(text: &str) -> String {
    scrub_structured_fragments(&strip_markup(text))
}

/// Shapes raw model output into the response envelope. The trusted path
/// parses the instructed JSON schema and sanitizes every text field; any
/// parse failure degrades to a single sanitized plain-text message. Total:
/// malformed model output is an expected branch, not an error.
pub fn normalize(raw_text: &str) -> ResponseEnvelope {
    match serde_json::from_str::<ModelReply>(raw_text) {
        Ok(reply) => {
            let messages = reply.messages
                .into_iter()
                .map(|m| AvatarMessage {
                    text: sanitize(&m.text),
                    facial_expression: m.facial_expression,
                    animation: m.animation,
                })
                .collect();
            ResponseEnvelope {
                messages,
                html_response: sanitize(&reply.html_response),
                function_call: reply.function_call,
            }
        }
        Err(e) => {
            warn!("Model output is not reply JSON ({}); degrading to plain text", e);
            let cleaned = sanitize(raw_text);
            ResponseEnvelope {
                messages: vec![AvatarMessage {
                    text: cleaned.clone(),
                    facial_expression: FALLBACK_TAG.to_string(),
                    animation: FALLBACK_TAG.to_string(),
                }],
                html_response: cleaned,
                function_call: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::response::FunctionName;

    #[test]
    fn normalizes_well_formed_reply() {
        let raw = r#"{"html_response": "Hi! 😘", "messages": [{"text": "Hi! 😘", "facialExpression": "happy", "animation": "Talking_0"}], "function_call": null}"#;
        let envelope = normalize(raw);
        assert_eq!(envelope.html_response, "Hi! 😘");
        assert_eq!(envelope.messages.len(), 1);
        assert_eq!(envelope.messages[0].text, "Hi! 😘");
        assert_eq!(envelope.messages[0].facial_expression, "happy");
        assert_eq!(envelope.messages[0].animation, "Talking_0");
        assert!(envelope.function_call.is_none());
    }

    #[test]
    fn passes_function_call_through() {
        let raw = r#"{"html_response": "Opening your wallet now!", "messages": [{"text": "Opening your wallet now!", "facialExpression": "smile", "animation": "Talking_1"}], "function_call": {"name": "connectWallet", "params": {}}}"#;
        let envelope = normalize(raw);
        let call = envelope.function_call.expect("function call should survive");
        assert_eq!(call.name, FunctionName::ConnectWallet);
        assert!(call.params.is_empty());
    }

    #[test]
    fn sanitizes_text_fields_but_not_tags() {
        let raw = r#"{"html_response": "<b>Hi&nbsp;love!</b>", "messages": [{"text": "Hi love! ----", "facialExpression": "funnyFace", "animation": "Rumba"}], "function_call": null}"#;
        let envelope = normalize(raw);
        assert_eq!(envelope.html_response, "Hi love!");
        assert_eq!(envelope.messages[0].text, "Hi love!");
        assert_eq!(envelope.messages[0].facial_expression, "funnyFace");
        assert_eq!(envelope.messages[0].animation, "Rumba");
    }

    #[test]
    fn plain_prose_degrades_to_single_message() {
        let raw = "Hey there, just thinking about you babe 😘";
        let envelope = normalize(raw);
        assert_eq!(envelope.messages.len(), 1);
        assert_eq!(envelope.messages[0].text, raw);
        assert_eq!(envelope.messages[0].facial_expression, FALLBACK_TAG);
        assert_eq!(envelope.messages[0].animation, FALLBACK_TAG);
        assert_eq!(envelope.html_response, raw);
        assert!(envelope.function_call.is_none());
    }

    #[test]
    fn unknown_function_name_degrades_to_fallback() {
        let raw = r#"{"html_response": "ok", "messages": [], "function_call": {"name": "stealWallet", "params": {}}}"#;
        let envelope = normalize(raw);
        assert!(envelope.function_call.is_none());
        assert_eq!(envelope.messages.len(), 1);
    }

    #[test]
    fn incomplete_object_degrades_to_fallback() {
        let envelope = normalize("{}");
        assert_eq!(envelope.messages.len(), 1);
        assert!(envelope.function_call.is_none());
    }

    #[test]
    fn never_panics_on_junk() {
        for raw in ["", "null", "[1,2,3]", "{\"html_response\": 7}", "<<<>>>"] {
            let envelope = normalize(raw);
            assert!(envelope.function_call.is_none());
            assert_eq!(envelope.messages.len(), 1);
        }
    }
}
