// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the output directory:
//
//   checkpoint.rs      — model weights (CompactRecorder), the
//                        latest-epoch pointer, and the training
//                        config as JSON
//
//   tokenizer_store.rs — builds the word or BPE vocabulary on the
//                        first run and reloads it afterwards, so
//                        training, resuming and generation share
//                        one set of ids
//
//   metrics.rs         — per-epoch CSV log
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Vocabulary building, saving, and loading
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;
