use docrag_complete::openai::parse_completion_response;
use docrag_complete::{get_default_completer, Unavailable};
use docrag_core::config::CompletionSettings;
use docrag_core::traits::Completer;
use docrag_core::Error;
use futures::StreamExt;

#[tokio::test]
async fn none_provider_is_unavailable() {
    let settings = CompletionSettings { provider: "none".to_string(), ..CompletionSettings::default() };
    let completer = get_default_completer(&settings).expect("completer");
    assert!(!completer.supports_streaming());
    assert!(matches!(completer.complete("hi").await, Err(Error::CompletionUnavailable(_))));
}

#[tokio::test]
async fn missing_key_degrades_to_unavailable() {
    let settings = CompletionSettings {
        api_key: None,
        api_key_env: "DOCRAG_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
        ..CompletionSettings::default()
    };
    let completer = get_default_completer(&settings).expect("completer");
    assert_eq!(completer.model_id(), "none");
    assert!(completer.complete("hi").await.is_err());
}

#[tokio::test]
async fn default_streaming_surfaces_the_failure() {
    let completer = Unavailable::new("offline");
    assert!(completer.complete_streaming("hi").await.is_err());
}

#[test]
fn unknown_provider_is_config_error() {
    let settings = CompletionSettings { provider: "oracle".to_string(), ..CompletionSettings::default() };
    assert!(matches!(get_default_completer(&settings), Err(Error::InvalidConfig(_))));
}

#[test]
fn parses_chat_completion_shape() {
    let json = serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": "Use the X-API-Key header." } }]
    });
    assert_eq!(parse_completion_response(&json).unwrap(), "Use the X-API-Key header.");
    assert!(parse_completion_response(&serde_json::json!({ "choices": [] })).is_err());
}

struct Echo;

#[async_trait::async_trait]
impl Completer for Echo {
    fn model_id(&self) -> &str { "echo" }
    async fn complete(&self, prompt: &str) -> docrag_core::Result<String> { Ok(prompt.to_uppercase()) }
}

#[tokio::test]
async fn default_streaming_yields_single_fragment() {
    let fragments: Vec<String> = Echo
        .complete_streaming("abc")
        .await
        .expect("stream")
        .map(|f| f.expect("fragment"))
        .collect()
        .await;
    assert_eq!(fragments, vec!["ABC".to_string()]);
}
