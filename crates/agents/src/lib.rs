//! Text generation: the model trait the engine talks to, the prompts it sends,
//! and the Gemini provider.

pub mod model;
pub mod prompt;
pub mod providers;

pub use {
    model::{GenerationError, TextGenerator},
    providers::GeminiProvider,
};
