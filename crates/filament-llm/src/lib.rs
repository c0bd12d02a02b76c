pub mod gemini;
pub mod stub;

pub use gemini::GeminiClient;
pub use stub::StaticModel;
