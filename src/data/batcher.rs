// ============================================================
// Layer 4 — LM Batcher
// ============================================================
// Implements Burn's Batcher trait to stack TokenWindows into
// device tensors for one forward pass.
//
// How batching works here:
//   Input:  Vec of N TokenWindows, each of length S
//   Output: LmBatch with tensors of shape [N, S]
//
//   All ids are flattened into one Vec<i32> and reshaped:
//   [w1_t1, ..., w1_tS, w2_t1, ..., wN_tS] → [N, S]
//
// Windows are padded to the same length by the chunker, so no
// dynamic padding is needed at this point.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::window::{TokenWindow, PAD_ID};

// ─── LmBatch ──────────────────────────────────────────────────────────────────
/// A batch of next-token windows ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct LmBatch<B: Backend> {
    /// Input token ids — shape: [batch_size, seq_len]
    pub inputs: Tensor<B, 2, Int>,

    /// Next-token targets — shape: [batch_size, seq_len]
    pub targets: Tensor<B, 2, Int>,

    /// Key padding mask — shape: [batch_size, seq_len]
    /// true = padding position, excluded from attention
    pub pad_mask: Tensor<B, 2, Bool>,
}

// ─── LmBatcher ────────────────────────────────────────────────────────────────
/// Stateless: the DataLoader passes the target device on every call.
#[derive(Clone, Debug, Default)]
pub struct LmBatcher;

impl LmBatcher {
    pub fn new() -> Self {
        Self
    }
}

impl<B: Backend> Batcher<B, TokenWindow, LmBatch<B>> for LmBatcher {
    fn batch(&self, items: Vec<TokenWindow>, device: &B::Device) -> LmBatch<B> {
        let batch_size = items.len();
        let seq_len    = items[0].seq_len();

        let input_flat: Vec<i32> = items
            .iter()
            .flat_map(|w| w.input_ids.iter().map(|&x| x as i32))
            .collect();

        let target_flat: Vec<i32> = items
            .iter()
            .flat_map(|w| w.target_ids.iter().map(|&x| x as i32))
            .collect();

        let inputs = Tensor::<B, 1, Int>::from_ints(input_flat.as_slice(), device)
            .reshape([batch_size, seq_len]);

        let targets = Tensor::<B, 1, Int>::from_ints(target_flat.as_slice(), device)
            .reshape([batch_size, seq_len]);

        // Padding is decided on the inputs: a padded input position has
        // nothing to attend from, and its target is padding too.
        let pad_mask = inputs.clone().equal_elem(PAD_ID as i32);

        LmBatch { inputs, targets, pad_mask }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_batch_shapes_and_mask() {
        let device  = Default::default();
        let windows = vec![
            TokenWindow::from_span(&[4, 5, 6, 7], 3),
            TokenWindow::from_span(&[8, 9], 3),
        ];

        let batch: LmBatch<TestBackend> = LmBatcher::new().batch(windows, &device);

        assert_eq!(batch.inputs.dims(),   [2, 3]);
        assert_eq!(batch.targets.dims(),  [2, 3]);
        assert_eq!(batch.pad_mask.dims(), [2, 3]);

        let mask: Vec<bool> = batch.pad_mask.into_data().to_vec().unwrap();
        assert_eq!(mask, vec![false, false, false, false, true, true]);

        let targets: Vec<i64> = batch.targets.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(targets, vec![5, 6, 7, 9, 0, 0]);
    }
}
