// JobScout Infrastructure - LLM Adapter
// Implements: LlmClient against any OpenAI-compatible chat completion API

mod client;

pub use client::OpenAiChatClient;
