// Skill-gap analysis: match scoring and the HTTP handlers that drive it.
// Embeddings go through embedding_client; nothing here talks to a provider directly.

pub mod handlers;
pub mod scorer;
