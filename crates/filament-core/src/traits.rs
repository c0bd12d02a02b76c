use futures::future::BoxFuture;

use crate::error::Result;
use crate::types::Record;

/// A single generation request to the external text provider.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub api_key: String,
    pub model_id: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// Generative-text model client.
pub trait TextModel: Send + Sync + 'static {
    /// Send a prompt and return the first candidate's generated text.
    fn generate(&self, request: GenerateRequest) -> BoxFuture<'_, Result<String>>;

    /// Round-trip a minimal request to verify the API key is usable.
    fn validate_key(&self, api_key: &str, model_id: &str) -> BoxFuture<'_, Result<()>>;
}

/// Node handler — the executable behavior behind a node type.
///
/// Handlers are pure with respect to the graph: they may perform network
/// I/O, but must not touch shared mutable state, and every invocation is
/// independent. The returned record's keys should match the node's declared
/// output ports.
pub trait NodeHandler: Send + Sync + 'static {
    /// The node type string this handler serves (e.g. "summarization").
    fn kind(&self) -> &str;

    /// Execute with collected inputs and the merged parameter set.
    fn execute(&self, inputs: &Record, parameters: &Record) -> BoxFuture<'_, Result<Record>>;
}
