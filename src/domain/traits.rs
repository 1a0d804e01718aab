// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer programs against these traits rather
// than concrete loaders or models, so a new corpus source or a
// different decoding strategy can be dropped in without touching
// the use cases.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use crate::domain::document::Document;

// ─── DocumentSource ───────────────────────────────────────────────────────────
/// Any component that can load text documents.
///
/// Implementations:
///   - TextLoader → a single .txt corpus or a directory of .txt files
pub trait DocumentSource {
    /// Load all available documents from this source.
    fn load_all(&self) -> Result<Vec<Document>>;
}

// ─── TextGenerator ────────────────────────────────────────────────────────────
/// Any component that can continue a text prompt.
///
/// Implementations:
///   - GenerateUseCase → samples from a trained actor-critic checkpoint
pub trait TextGenerator {
    /// Return the generated continuation of `prompt` (prompt not included).
    fn generate(&self, prompt: &str) -> Result<String>;
}
