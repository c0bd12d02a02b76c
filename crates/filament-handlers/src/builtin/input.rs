use futures::future::BoxFuture;

use filament_core::error::{FilamentError, Result};
use filament_core::traits::NodeHandler;
use filament_core::types::Record;

use super::str_param;

/// Entry node: emits a literal value configured in its parameters.
///
/// `input_type` selects the shape: `text` (default) emits the raw string on
/// the `text` port, `json` parses the value and emits it on `data`, and
/// `api` emits a fetch description on `data` — no network call is performed
/// for the generic input kind.
pub struct InputHandler;

impl NodeHandler for InputHandler {
    fn kind(&self) -> &str {
        "input"
    }

    fn execute(&self, _inputs: &Record, parameters: &Record) -> BoxFuture<'_, Result<Record>> {
        let parameters = parameters.clone();
        Box::pin(async move {
            let input_type = str_param(&parameters, "input_type").unwrap_or("text");
            let value = str_param(&parameters, "value").unwrap_or_default();

            let mut outputs = Record::new();
            match input_type {
                "text" => {
                    outputs.insert("text".into(), serde_json::json!(value));
                }
                "json" => {
                    let parsed: serde_json::Value =
                        serde_json::from_str(value).map_err(|e| {
                            FilamentError::InvalidParameter {
                                parameter: "value".into(),
                                message: format!("invalid JSON: {}", e),
                            }
                        })?;
                    outputs.insert("data".into(), parsed);
                }
                "api" => {
                    let url = str_param(&parameters, "url").unwrap_or("");
                    outputs.insert(
                        "data".into(),
                        serde_json::json!({
                            "source": url,
                            "description": format!("API fetch from {}", url),
                        }),
                    );
                }
                other => {
                    return Err(FilamentError::InvalidParameter {
                        parameter: "input_type".into(),
                        message: format!("unknown input type '{}'", other),
                    });
                }
            }
            Ok(outputs)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::json!(v)))
            .collect()
    }

    #[tokio::test]
    async fn test_text_input() {
        let outputs = InputHandler
            .execute(&Record::new(), &params(&[("value", "hello")]))
            .await
            .unwrap();
        assert_eq!(outputs.get("text"), Some(&serde_json::json!("hello")));
    }

    #[tokio::test]
    async fn test_json_input() {
        let outputs = InputHandler
            .execute(
                &Record::new(),
                &params(&[("input_type", "json"), ("value", r#"{"n": 1}"#)]),
            )
            .await
            .unwrap();
        assert_eq!(outputs.get("data"), Some(&serde_json::json!({"n": 1})));
    }

    #[tokio::test]
    async fn test_invalid_json_errors() {
        let err = InputHandler
            .execute(
                &Record::new(),
                &params(&[("input_type", "json"), ("value", "{broken")]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FilamentError::InvalidParameter { .. }));
    }

    #[tokio::test]
    async fn test_api_input_is_stubbed() {
        let outputs = InputHandler
            .execute(
                &Record::new(),
                &params(&[("input_type", "api"), ("url", "https://example.com/v1")]),
            )
            .await
            .unwrap();
        let data = outputs.get("data").unwrap();
        assert_eq!(data["source"], "https://example.com/v1");
        assert!(data["description"].as_str().unwrap().contains("API fetch"));
    }

    #[tokio::test]
    async fn test_unknown_input_type() {
        let err = InputHandler
            .execute(&Record::new(), &params(&[("input_type", "ftp")]))
            .await
            .unwrap_err();
        assert!(matches!(err, FilamentError::InvalidParameter { .. }));
    }
}
