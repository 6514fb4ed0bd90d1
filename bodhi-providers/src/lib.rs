//! Generative model provider integrations for the Bodhi Guide relay
//!
//! This crate provides the provider abstraction and the Gemini
//! Generative Language API client.

pub mod base;
pub mod gemini;

pub use base::{
    GenerationParams, LLMProvider, LLMResponse, Message, ProviderError, ProviderResult,
};
pub use gemini::GeminiClient;
