// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits describing what the system
// works with: documents, token windows, and the abstractions
// the other layers implement.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Keeping this layer framework-free means the windowing and
// vocabulary rules can be unit tested without a GPU.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A loaded text file
pub mod document;

// Fixed-length (input, target) token windows and special token ids
pub mod window;

// Core abstractions (traits) that other layers implement
pub mod traits;
