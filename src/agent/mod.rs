pub mod backend;
pub mod client;
pub mod disambiguator;
mod prompts;
mod stream;
pub mod tools;
pub mod turn;
pub mod types;

pub use client::AssistantAI;
pub use types::ConversationState;
