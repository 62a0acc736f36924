// Skill normalization core: vocabulary, normalizer, recognizer, extractor.
// Everything here is built once at startup and shared read-only across requests.

pub mod extractor;
pub mod normalizer;
pub mod recognizer;
pub mod similarity;
pub mod vocabulary;
