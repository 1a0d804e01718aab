// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All model math lives here:
//
//   model.rs     — the actor-critic transformer
//                  • Token + learned positional embeddings
//                  • Causal multi-head self-attention blocks
//                  • GELU feed-forward, residuals, LayerNorm
//                  • Policy head (next-token logits, the actor)
//                  • Value head (one scalar per position, the critic)
//                  • Joint cross-entropy + MSE loss
//
//   trainer.rs   — the epoch loop: Adam, gradient clipping,
//                  Noam warmup, validation, checkpoints, resume
//
//   generator.rs — autoregressive sampling from a checkpoint
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need

/// Actor-critic transformer architecture and loss
pub mod model;

/// Training loop with validation and checkpointing
pub mod trainer;

/// Greedy / temperature sampling from a trained model
pub mod generator;
