use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::debug;

use filament_core::error::{FilamentError, Result};
use filament_core::traits::{GenerateRequest, NodeHandler, TextModel};
use filament_core::types::Record;

use super::{require_str_param, str_param};

/// Build a provider request from the merged parameter set.
///
/// The executor injects `api_key` and `model` from the run config before
/// dispatch; node parameters may override generation settings.
pub(crate) fn request_from_params(parameters: &Record, prompt: String) -> Result<GenerateRequest> {
    let api_key = require_str_param(parameters, "api_key")?;
    let model_id = str_param(parameters, "model").unwrap_or("gemini-2.0-flash");

    let temperature = parameters
        .get("temperature")
        .and_then(|v| v.as_f64())
        .unwrap_or(0.7) as f32;

    let max_output_tokens = parameters
        .get("max_output_tokens")
        .and_then(|v| v.as_u64())
        .unwrap_or(2048) as u32;

    Ok(GenerateRequest {
        api_key: api_key.to_string(),
        model_id: model_id.to_string(),
        prompt,
        temperature,
        max_output_tokens,
    })
}

/// Generic LLM node: sends a prompt and emits the generated text.
///
/// The prompt comes from the `prompt` input port if connected, otherwise
/// from the `prompt` parameter.
pub struct LlmHandler {
    model: Arc<dyn TextModel>,
}

impl LlmHandler {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self { model }
    }
}

impl NodeHandler for LlmHandler {
    fn kind(&self) -> &str {
        "llm"
    }

    fn execute(&self, inputs: &Record, parameters: &Record) -> BoxFuture<'_, Result<Record>> {
        let inputs = inputs.clone();
        let parameters = parameters.clone();
        Box::pin(async move {
            let prompt = inputs
                .get("prompt")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .or_else(|| str_param(&parameters, "prompt").map(str::to_string))
                .ok_or_else(|| FilamentError::MissingInput("prompt".to_string()))?;

            let request = request_from_params(&parameters, prompt)?;
            debug!(model = %request.model_id, "Dispatching llm node request");

            let text = self.model.generate(request).await?;

            let mut outputs = Record::new();
            outputs.insert("text".into(), serde_json::json!(text));
            Ok(outputs)
        })
    }
}
