// ============================================================
// Layer 3 — Document Domain Type
// ============================================================
// A single text file loaded from disk: where it came from and
// what it says. No behaviour beyond construction.
//
// Reference: Rust Book §5 (Structs and Methods)

/// A raw text document loaded from disk, before cleaning or tokenisation.
#[derive(Debug, Clone)]
pub struct Document {
    /// The file name — kept for log lines and traceability
    pub source: String,

    /// The full text content of the file
    pub text: String,
}

impl Document {
    /// Create a new Document.
    /// Accepts &str or String for both fields.
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text:   text.into(),
        }
    }

    /// Number of whitespace-separated words in the document
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count() {
        let doc = Document::new("a.txt", "the quick  brown\nfox");
        assert_eq!(doc.word_count(), 4);
        assert_eq!(doc.source, "a.txt");
    }
}
