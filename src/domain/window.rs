// ============================================================
// Layer 3 — TokenWindow Domain Type
// ============================================================
// One next-token training example.
//
// A window of seq_len + 1 consecutive token ids is cut from the
// corpus stream and split into two overlapping views:
//
//   stream:  t0 t1 t2 t3 t4
//   input:   t0 t1 t2 t3
//   target:  t1 t2 t3 t4
//
// so that at every position i the model reads input[i] (and
// everything before it) and must predict target[i].
//
// When the stream runs out before the window is full, both
// vectors are right-padded with PAD_ID. Padded target positions
// are ignored by the losses.
//
// Reference: Rust Book §5 (Structs)

use serde::{Deserialize, Serialize};

// ─── Special token ids ────────────────────────────────────────────────────────
// Both tokenizer variants reserve the same four ids so the model,
// batcher and generator never need to look them up by string.
pub const PAD_ID: u32 = 0;
pub const UNK_ID: u32 = 1;
pub const BOS_ID: u32 = 2;
pub const EOS_ID: u32 = 3;

pub const PAD_TOKEN: &str = "<pad>";
pub const UNK_TOKEN: &str = "<unk>";
pub const BOS_TOKEN: &str = "<bos>";
pub const EOS_TOKEN: &str = "<eos>";

/// Special tokens in id order (index == id)
pub const SPECIAL_TOKENS: [&str; 4] = [PAD_TOKEN, UNK_TOKEN, BOS_TOKEN, EOS_TOKEN];

/// A fixed-length (input, target) pair. Both vectors have the same length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenWindow {
    pub input_ids:  Vec<u32>,
    pub target_ids: Vec<u32>,
}

impl TokenWindow {
    /// Build a window from `seq_len + 1` (or fewer) consecutive ids,
    /// padding both views up to `seq_len`.
    pub fn from_span(span: &[u32], seq_len: usize) -> Self {
        let take = span.len().saturating_sub(1).min(seq_len);

        let mut input_ids:  Vec<u32> = span.iter().take(take).copied().collect();
        let mut target_ids: Vec<u32> = span.iter().skip(1).take(take).copied().collect();
        input_ids.resize(seq_len, PAD_ID);
        target_ids.resize(seq_len, PAD_ID);

        Self { input_ids, target_ids }
    }

    pub fn seq_len(&self) -> usize {
        self.input_ids.len()
    }

    /// Number of target positions that carry a real token
    pub fn real_len(&self) -> usize {
        self.target_ids.iter().filter(|&&id| id != PAD_ID).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_is_input_shifted_by_one() {
        let w = TokenWindow::from_span(&[10, 11, 12, 13, 14], 4);
        assert_eq!(w.input_ids,  vec![10, 11, 12, 13]);
        assert_eq!(w.target_ids, vec![11, 12, 13, 14]);
        assert_eq!(w.real_len(), 4);
    }

    #[test]
    fn test_short_span_is_padded() {
        let w = TokenWindow::from_span(&[10, 11, 12], 5);
        assert_eq!(w.input_ids,  vec![10, 11, PAD_ID, PAD_ID, PAD_ID]);
        assert_eq!(w.target_ids, vec![11, 12, PAD_ID, PAD_ID, PAD_ID]);
        assert_eq!(w.seq_len(), 5);
        assert_eq!(w.real_len(), 2);
    }

    #[test]
    fn test_special_token_table_matches_ids() {
        assert_eq!(SPECIAL_TOKENS[PAD_ID as usize], PAD_TOKEN);
        assert_eq!(SPECIAL_TOKENS[UNK_ID as usize], UNK_TOKEN);
        assert_eq!(SPECIAL_TOKENS[BOS_ID as usize], BOS_TOKEN);
        assert_eq!(SPECIAL_TOKENS[EOS_ID as usize], EOS_TOKEN);
    }
}
