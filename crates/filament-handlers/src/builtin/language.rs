use std::sync::Arc;

use futures::future::BoxFuture;

use filament_core::error::Result;
use filament_core::traits::{NodeHandler, TextModel};
use filament_core::types::Record;

use super::llm::request_from_params;
use super::{require_str_input, str_param};

/// Run one generation and wrap the text under a single output port.
async fn generate_port(
    model: &Arc<dyn TextModel>,
    parameters: &Record,
    prompt: String,
    port: &str,
) -> Result<Record> {
    let request = request_from_params(parameters, prompt)?;
    let text = model.generate(request).await?;
    let mut outputs = Record::new();
    outputs.insert(port.into(), serde_json::json!(text));
    Ok(outputs)
}

/// Free-form text generation from a prompt.
pub struct TextGenerationHandler {
    model: Arc<dyn TextModel>,
}

impl TextGenerationHandler {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self { model }
    }
}

impl NodeHandler for TextGenerationHandler {
    fn kind(&self) -> &str {
        "text-generation"
    }

    fn execute(&self, inputs: &Record, parameters: &Record) -> BoxFuture<'_, Result<Record>> {
        let inputs = inputs.clone();
        let parameters = parameters.clone();
        Box::pin(async move {
            let prompt = require_str_input(&inputs, "prompt")?.to_string();
            generate_port(&self.model, &parameters, prompt, "text").await
        })
    }
}

/// Summarize incoming text, optionally bounded by `max_sentences`.
pub struct SummarizationHandler {
    model: Arc<dyn TextModel>,
}

impl SummarizationHandler {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self { model }
    }
}

impl NodeHandler for SummarizationHandler {
    fn kind(&self) -> &str {
        "summarization"
    }

    fn execute(&self, inputs: &Record, parameters: &Record) -> BoxFuture<'_, Result<Record>> {
        let inputs = inputs.clone();
        let parameters = parameters.clone();
        Box::pin(async move {
            let text = require_str_input(&inputs, "text")?;
            let limit = parameters
                .get("max_sentences")
                .and_then(|v| v.as_u64())
                .unwrap_or(3);
            let prompt = format!(
                "Summarize the following text in at most {} sentences:\n\n{}",
                limit, text
            );
            generate_port(&self.model, &parameters, prompt, "summary").await
        })
    }
}

/// Classify sentiment of incoming text as a single lowercase label.
pub struct SentimentAnalysisHandler {
    model: Arc<dyn TextModel>,
}

impl SentimentAnalysisHandler {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self { model }
    }
}

impl NodeHandler for SentimentAnalysisHandler {
    fn kind(&self) -> &str {
        "sentiment-analysis"
    }

    fn execute(&self, inputs: &Record, parameters: &Record) -> BoxFuture<'_, Result<Record>> {
        let inputs = inputs.clone();
        let parameters = parameters.clone();
        Box::pin(async move {
            let text = require_str_input(&inputs, "text")?;
            let prompt = format!(
                "Classify the sentiment of the following text. \
                 Respond with ONLY one word: positive, negative, or neutral.\n\n{}",
                text
            );
            let request = request_from_params(&parameters, prompt)?;
            let label = self.model.generate(request).await?;

            let mut outputs = Record::new();
            outputs.insert(
                "sentiment".into(),
                serde_json::json!(label.trim().to_lowercase()),
            );
            Ok(outputs)
        })
    }
}

/// Generate code from a task description.
pub struct CodeGenerationHandler {
    model: Arc<dyn TextModel>,
}

impl CodeGenerationHandler {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self { model }
    }
}

impl NodeHandler for CodeGenerationHandler {
    fn kind(&self) -> &str {
        "code-generation"
    }

    fn execute(&self, inputs: &Record, parameters: &Record) -> BoxFuture<'_, Result<Record>> {
        let inputs = inputs.clone();
        let parameters = parameters.clone();
        Box::pin(async move {
            let task = require_str_input(&inputs, "prompt")?;
            let language = str_param(&parameters, "language").unwrap_or("python");
            let prompt = format!(
                "Write {} code for the following task. \
                 Respond with code only, no explanation.\n\n{}",
                language, task
            );
            generate_port(&self.model, &parameters, prompt, "code").await
        })
    }
}

/// Translate incoming text into `target_language`.
pub struct TranslationHandler {
    model: Arc<dyn TextModel>,
}

impl TranslationHandler {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self { model }
    }
}

impl NodeHandler for TranslationHandler {
    fn kind(&self) -> &str {
        "translation"
    }

    fn execute(&self, inputs: &Record, parameters: &Record) -> BoxFuture<'_, Result<Record>> {
        let inputs = inputs.clone();
        let parameters = parameters.clone();
        Box::pin(async move {
            let text = require_str_input(&inputs, "text")?;
            let target = str_param(&parameters, "target_language").unwrap_or("English");
            let prompt = format!(
                "Translate the following text to {}. \
                 Respond with the translation only.\n\n{}",
                target, text
            );
            generate_port(&self.model, &parameters, prompt, "translation").await
        })
    }
}

/// Describe an image by URL.
///
/// The provider request is text-only; the URL is embedded in the prompt.
pub struct ImageAnalysisHandler {
    model: Arc<dyn TextModel>,
}

impl ImageAnalysisHandler {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self { model }
    }
}

impl NodeHandler for ImageAnalysisHandler {
    fn kind(&self) -> &str {
        "image-analysis"
    }

    fn execute(&self, inputs: &Record, parameters: &Record) -> BoxFuture<'_, Result<Record>> {
        let inputs = inputs.clone();
        let parameters = parameters.clone();
        Box::pin(async move {
            let image_url = require_str_input(&inputs, "image_url")?;
            let prompt = format!(
                "Describe the content of the image at the following URL:\n{}",
                image_url
            );
            generate_port(&self.model, &parameters, prompt, "analysis").await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filament_core::error::FilamentError;
    use filament_llm::StaticModel;
    use serde_json::json;

    fn params() -> Record {
        let mut p = Record::new();
        p.insert("api_key".into(), json!("sk-test"));
        p
    }

    fn input(key: &str, value: &str) -> Record {
        let mut inputs = Record::new();
        inputs.insert(key.into(), json!(value));
        inputs
    }

    #[tokio::test]
    async fn test_summarization_prompt_and_port() {
        let model = Arc::new(StaticModel::new(["A short summary."]));
        let handler = SummarizationHandler::new(model.clone());

        let mut parameters = params();
        parameters.insert("max_sentences".into(), json!(2));

        let outputs = handler
            .execute(&input("text", "A very long article."), &parameters)
            .await
            .unwrap();
        assert_eq!(outputs.get("summary"), Some(&json!("A short summary.")));

        let prompts = model.prompts();
        assert!(prompts[0].contains("at most 2 sentences"));
        assert!(prompts[0].contains("A very long article."));
    }

    #[tokio::test]
    async fn test_sentiment_label_normalized() {
        let model = Arc::new(StaticModel::new(["  Positive \n"]));
        let handler = SentimentAnalysisHandler::new(model);

        let outputs = handler
            .execute(&input("text", "I love this"), &params())
            .await
            .unwrap();
        assert_eq!(outputs.get("sentiment"), Some(&json!("positive")));
    }

    #[tokio::test]
    async fn test_translation_uses_target_language() {
        let model = Arc::new(StaticModel::new(["Bonjour"]));
        let handler = TranslationHandler::new(model.clone());

        let mut parameters = params();
        parameters.insert("target_language".into(), json!("French"));

        let outputs = handler
            .execute(&input("text", "Hello"), &parameters)
            .await
            .unwrap();
        assert_eq!(outputs.get("translation"), Some(&json!("Bonjour")));
        assert!(model.prompts()[0].contains("to French"));
    }

    #[tokio::test]
    async fn test_code_generation_port() {
        let model = Arc::new(StaticModel::new(["fn main() {}"]));
        let handler = CodeGenerationHandler::new(model.clone());

        let mut parameters = params();
        parameters.insert("language".into(), json!("rust"));

        let outputs = handler
            .execute(&input("prompt", "hello world"), &parameters)
            .await
            .unwrap();
        assert_eq!(outputs.get("code"), Some(&json!("fn main() {}")));
        assert!(model.prompts()[0].contains("rust"));
    }

    #[tokio::test]
    async fn test_image_analysis_embeds_url() {
        let model = Arc::new(StaticModel::new(["A cat on a sofa."]));
        let handler = ImageAnalysisHandler::new(model.clone());

        let outputs = handler
            .execute(&input("image_url", "https://example.com/cat.jpg"), &params())
            .await
            .unwrap();
        assert_eq!(outputs.get("analysis"), Some(&json!("A cat on a sofa.")));
        assert!(model.prompts()[0].contains("https://example.com/cat.jpg"));
    }

    #[tokio::test]
    async fn test_missing_input_is_descriptive() {
        let handler = TextGenerationHandler::new(Arc::new(StaticModel::new(["x"])));
        let err = handler.execute(&Record::new(), &params()).await.unwrap_err();
        assert!(matches!(err, FilamentError::MissingInput(_)));
        assert!(err.to_string().contains("prompt"));
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let handler = SummarizationHandler::new(Arc::new(StaticModel::failing("503")));
        let err = handler
            .execute(&input("text", "x"), &params())
            .await
            .unwrap_err();
        assert!(matches!(err, FilamentError::ModelRequest(_)));
    }
}
