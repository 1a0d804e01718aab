// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between text files on disk and tensor batches.
//
// The pipeline flows in this order:
//
//   .txt file(s)
//       │
//       ▼
//   TextLoader        → reads the corpus
//       │
//       ▼
//   Preprocessor      → cleans text (whitespace, control chars)
//       │
//       ▼
//   Tokenizer         → word or BPE ids (infra::tokenizer_store)
//       │
//       ▼
//   WindowChunker     → fixed-length (input, target) windows
//       │
//       ▼
//   split_train_val   → seeded shuffle + hold-out split
//       │
//       ▼
//   LmDataset         → implements Burn's Dataset trait
//       │
//       ▼
//   LmBatcher         → stacks windows into tensor batches
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads a text file or a directory of .txt files
pub mod loader;

/// Cleans and normalises raw text
pub mod preprocessor;

/// Cuts token streams into shifted, overlapping windows
pub mod chunker;

/// Implements Burn's Dataset trait for token windows
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Seeded shuffle and train/validation split
pub mod splitter;
