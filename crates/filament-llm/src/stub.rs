use std::collections::VecDeque;
use std::sync::Mutex;

use futures::future::BoxFuture;

use filament_core::error::{FilamentError, Result};
use filament_core::traits::{GenerateRequest, TextModel};

/// A canned-response model for tests and offline dry runs.
///
/// Responses are served in order; when the queue is exhausted the last
/// response repeats. Prompts are recorded for assertion.
pub struct StaticModel {
    responses: Mutex<VecDeque<String>>,
    last: Mutex<Option<String>>,
    prompts: Mutex<Vec<String>>,
    fail_with: Option<String>,
}

impl StaticModel {
    pub fn new(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            last: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
            fail_with: None,
        }
    }

    /// A model whose every request fails with the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
            fail_with: Some(message.into()),
        }
    }

    /// Prompts received so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl TextModel for StaticModel {
    fn generate(&self, request: GenerateRequest) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            self.prompts.lock().unwrap().push(request.prompt.clone());

            if let Some(message) = &self.fail_with {
                return Err(FilamentError::ModelRequest(message.clone()));
            }

            let mut queue = self.responses.lock().unwrap();
            if let Some(next) = queue.pop_front() {
                *self.last.lock().unwrap() = Some(next.clone());
                return Ok(next);
            }
            self.last
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| FilamentError::ModelRequest("stub has no responses".into()))
        })
    }

    fn validate_key(&self, _api_key: &str, _model_id: &str) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            if let Some(message) = &self.fail_with {
                return Err(FilamentError::ModelRequest(message.clone()));
            }
            Ok(())
        })
    }
}
