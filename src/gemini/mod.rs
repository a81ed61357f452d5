pub mod client;
pub mod models;
pub mod types;

pub use client::GeminiClient;
pub use models::GeminiModel;
pub use types::*;
