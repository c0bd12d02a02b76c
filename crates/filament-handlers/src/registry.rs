use std::collections::HashMap;
use std::sync::Arc;

use filament_core::error::{FilamentError, Result};
use filament_core::traits::{NodeHandler, TextModel};

/// Registry of node handlers, keyed by node type string.
///
/// Built explicitly at startup and injected into the executor, so tests can
/// swap in fakes without touching global state.
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn NodeHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler under its own `kind()`.
    pub fn register(&mut self, handler: impl NodeHandler) {
        let kind = handler.kind().to_string();
        self.handlers.insert(kind, Arc::new(handler));
    }

    /// Unregister a handler by node type.
    pub fn unregister(&mut self, kind: &str) -> bool {
        self.handlers.remove(kind).is_some()
    }

    /// Look up a handler by node type.
    pub fn get(&self, kind: &str) -> Option<Arc<dyn NodeHandler>> {
        self.handlers.get(kind).cloned()
    }

    /// Look up a handler, erroring on unknown node types.
    pub fn resolve(&self, kind: &str) -> Result<Arc<dyn NodeHandler>> {
        self.get(kind)
            .ok_or_else(|| FilamentError::UnsupportedNodeType(kind.to_string()))
    }

    /// List all registered node types.
    pub fn list(&self) -> Vec<&str> {
        self.handlers.keys().map(|s| s.as_str()).collect()
    }

    /// Create a registry with every built-in node type registered.
    ///
    /// The model client backs the `llm` kind and the catalog types.
    pub fn with_builtins(model: Arc<dyn TextModel>) -> Self {
        let mut registry = Self::new();

        // ── Base kinds ──────────────────────────────────────────
        registry.register(crate::builtin::input::InputHandler);
        registry.register(crate::builtin::output::OutputHandler);
        registry.register(crate::builtin::process::ProcessHandler);
        registry.register(crate::builtin::tool::ToolHandler);
        registry.register(crate::builtin::llm::LlmHandler::new(model.clone()));

        // ── Catalog types ───────────────────────────────────────
        registry.register(crate::builtin::language::TextGenerationHandler::new(
            model.clone(),
        ));
        registry.register(crate::builtin::language::SummarizationHandler::new(
            model.clone(),
        ));
        registry.register(crate::builtin::language::SentimentAnalysisHandler::new(
            model.clone(),
        ));
        registry.register(crate::builtin::language::CodeGenerationHandler::new(
            model.clone(),
        ));
        registry.register(crate::builtin::language::TranslationHandler::new(
            model.clone(),
        ));
        registry.register(crate::builtin::language::ImageAnalysisHandler::new(model));

        registry
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
