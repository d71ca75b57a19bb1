pub mod assistant;
pub mod banner;
pub mod color;
pub mod highlighter;
pub mod prompt;
