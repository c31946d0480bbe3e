// ═══════════════════════════════════════════════════════════════════
// Provider Tests: Gemini request/response shapes, construction
// ═══════════════════════════════════════════════════════════════════
//
// No network access: the HTTP round trip itself is not exercised here.

use fund_dashboard_core::errors::CoreError;
use fund_dashboard_core::models::narrative::NarrativeRequest;
use fund_dashboard_core::models::settings::NarrativeSettings;
use fund_dashboard_core::providers::gemini::{parse_response, request_body, GeminiProvider};
use fund_dashboard_core::providers::traits::NarrativeProvider;

fn request(grounded: bool) -> NarrativeRequest {
    NarrativeRequest {
        prompt: "点评一下消费板块".into(),
        grounded,
    }
}

// ── Request body ────────────────────────────────────────────────────

mod request_body_shape {
    use super::*;

    #[test]
    fn carries_prompt_as_single_part() {
        let body = request_body(&request(false)).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "点评一下消费板块");
        assert_eq!(body["contents"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn no_tools_without_grounding() {
        let body = request_body(&request(false)).unwrap();
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn google_search_tool_with_grounding() {
        let body = request_body(&request(true)).unwrap();
        let tools = body["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert!(tools[0]["google_search"].is_object());
    }
}

// ── Response parsing ────────────────────────────────────────────────

mod response_parsing {
    use super::*;

    #[test]
    fn joins_parts_of_first_candidate() {
        let json = r###"{
            "candidates": [
                {"content": {"parts": [{"text": "## 观点\n"}, {"text": "震荡向上"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }"###;
        assert_eq!(parse_response(json).unwrap(), "## 观点\n震荡向上");
    }

    #[test]
    fn skips_parts_without_text() {
        let json =
            r#"{"candidates": [{"content": {"parts": [{"inlineData": {}}, {"text": "ok"}]}}]}"#;
        assert_eq!(parse_response(json).unwrap(), "ok");
    }

    #[test]
    fn no_candidates_is_an_api_error() {
        let err = parse_response(r#"{"candidates": []}"#).unwrap_err();
        assert!(matches!(err, CoreError::Api { ref provider, .. } if provider == "Gemini"));
    }

    #[test]
    fn blank_text_is_an_api_error() {
        let json = r#"{"candidates": [{"content": {"parts": [{"text": "  "}]}}]}"#;
        assert!(matches!(parse_response(json), Err(CoreError::Api { .. })));
    }

    #[test]
    fn missing_content_is_an_api_error() {
        let json = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        assert!(matches!(parse_response(json), Err(CoreError::Api { .. })));
    }

    #[test]
    fn malformed_json_is_an_api_error() {
        let err = parse_response("<html>502</html>").unwrap_err();
        match err {
            CoreError::Api { message, .. } => assert!(message.contains("Failed to parse")),
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}

// ── Construction ────────────────────────────────────────────────────

mod construction {
    use super::*;

    #[test]
    fn no_key_no_provider() {
        assert!(GeminiProvider::from_settings(&NarrativeSettings::default()).is_none());
    }

    #[test]
    fn blank_key_no_provider() {
        let settings = NarrativeSettings {
            api_key: Some("   ".into()),
            ..NarrativeSettings::default()
        };
        assert!(GeminiProvider::from_settings(&settings).is_none());
    }

    #[test]
    fn key_builds_provider_with_configured_model() {
        let settings = NarrativeSettings {
            api_key: Some("test-key".into()),
            model: "gemini-custom".into(),
            ..NarrativeSettings::default()
        };
        let provider = GeminiProvider::from_settings(&settings).unwrap();
        assert_eq!(provider.model(), "gemini-custom");
        assert_eq!(provider.name(), "Gemini");
    }

    #[test]
    fn builds_with_and_without_timeout_override() {
        let default_timeout = GeminiProvider::new("k", "m", "https://example.invalid/v1/", None);
        assert_eq!(default_timeout.model(), "m");

        let settings = NarrativeSettings {
            api_key: Some("test-key".into()),
            timeout_secs: Some(5),
            ..NarrativeSettings::default()
        };
        assert!(GeminiProvider::from_settings(&settings).is_some());
    }
}
