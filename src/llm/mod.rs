pub mod openai;
pub mod provider;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use openai::OpenAiCompatProvider;
pub use provider::LlmProvider;
