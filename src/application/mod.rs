// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only:
//   - No model math here (Layer 5)
//   - No printing here (Layer 1)
//   - No direct file formats here (Layers 4 and 6)
//
// Reference: Clean Architecture pattern

// The training workflow and its configuration
pub mod train_use_case;

// Prompt continuation from a trained checkpoint
pub mod generate_use_case;
