use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilamentError {
    // Model errors
    #[error("model request failed: {0}")]
    ModelRequest(String),

    #[error("model response parse error: {0}")]
    ModelParse(String),

    #[error("API key is missing or empty")]
    MissingApiKey,

    // Graph errors
    #[error("edge '{edge}' references unknown node '{node}'")]
    UnknownNode { edge: String, node: String },

    #[error("edge '{edge}' references undeclared port '{port}' on node '{node}'")]
    UnknownPort {
        edge: String,
        node: String,
        port: String,
    },

    #[error("duplicate node id '{0}'")]
    DuplicateNode(String),

    #[error("cycle detected involving nodes: {}", .0.join(", "))]
    CycleDetected(Vec<String>),

    // Handler errors
    #[error("unsupported node type: {0}")]
    UnsupportedNodeType(String),

    #[error("missing required input '{0}'")]
    MissingInput(String),

    #[error("missing required parameter '{0}'")]
    MissingParameter(String),

    #[error("invalid parameter '{parameter}': {message}")]
    InvalidParameter { parameter: String, message: String },

    // Expression errors
    #[error("expression error: {0}")]
    Expression(String),

    // Config errors
    #[error("config error: {0}")]
    Config(String),

    #[error("config file not found: {0}")]
    ConfigNotFound(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FilamentError>;
