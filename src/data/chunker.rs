// ============================================================
// Layer 4 — Token Window Chunker
// ============================================================
// Splits one long token stream into fixed-length, overlapping
// next-token training windows.
//
// Each window covers seq_len + 1 stream positions so it can be
// viewed as (input, target) with target shifted by one.
// Consecutive windows start `stride` tokens apart:
//
// Example with seq_len=4, stride=2 over ids 0..=8:
//   Window 1: span 0 1 2 3 4  → input 0 1 2 3 / target 1 2 3 4
//   Window 2: span 2 3 4 5 6  → input 2 3 4 5 / target 3 4 5 6
//   Window 3: span 4 5 6 7 8  → input 4 5 6 7 / target 5 6 7 8
//
// stride == seq_len gives disjoint targets (every token predicted
// exactly once); a smaller stride trades duplicate work for more
// training examples per corpus.
//
// The last window may run past the end of the stream; it is
// right-padded (see TokenWindow::from_span).
//
// Reference: Rust Book §8 (Slices)

use crate::domain::window::TokenWindow;

#[derive(Debug, Clone, Copy)]
pub struct WindowChunker {
    /// Model context length (positions per window)
    seq_len: usize,
    /// Step between the starts of consecutive windows
    stride: usize,
}

impl WindowChunker {
    /// # Panics
    /// Panics if seq_len or stride is zero.
    pub fn new(seq_len: usize, stride: usize) -> Self {
        assert!(seq_len > 0, "seq_len must be at least 1");
        assert!(stride > 0, "stride must be at least 1");
        Self { seq_len, stride }
    }

    /// Cut `ids` into windows. A stream shorter than two tokens has
    /// no (input, target) pair and yields nothing.
    pub fn chunk(&self, ids: &[u32]) -> Vec<TokenWindow> {
        if ids.len() < 2 {
            return Vec::new();
        }

        let span_len    = self.seq_len + 1;
        let mut windows = Vec::with_capacity(self.num_windows(ids.len()));
        let mut start   = 0usize;

        loop {
            let end = (start + span_len).min(ids.len());
            windows.push(TokenWindow::from_span(&ids[start..end], self.seq_len));

            if end == ids.len() {
                break;
            }
            start += self.stride;
            // A stride longer than the span can jump past the last pair
            if start + 1 >= ids.len() {
                break;
            }
        }

        windows
    }

    /// How many windows a stream of `len` tokens produces
    pub fn num_windows(&self, len: usize) -> usize {
        if len < 2 {
            return 0;
        }
        let span_len = self.seq_len + 1;
        let mut count = 1;
        let mut start = 0;
        while start + span_len < len && start + self.stride + 1 < len {
            start += self.stride;
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::window::PAD_ID;

    fn stream(n: u32) -> Vec<u32> {
        (10..10 + n).collect()
    }

    #[test]
    fn test_overlapping_windows() {
        let c       = WindowChunker::new(4, 2);
        let windows = c.chunk(&stream(9));

        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].input_ids,  vec![10, 11, 12, 13]);
        assert_eq!(windows[0].target_ids, vec![11, 12, 13, 14]);
        assert_eq!(windows[1].input_ids,  vec![12, 13, 14, 15]);
        assert_eq!(windows[2].target_ids, vec![15, 16, 17, 18]);
    }

    #[test]
    fn test_every_window_is_shifted_by_one() {
        let c = WindowChunker::new(5, 3);
        for w in c.chunk(&stream(40)) {
            let real = w.real_len();
            assert_eq!(&w.input_ids[1..real], &w.target_ids[..real - 1]);
        }
    }

    #[test]
    fn test_last_window_is_padded() {
        let c       = WindowChunker::new(4, 4);
        let windows = c.chunk(&stream(7));

        // spans: [0..5], [4..7]
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[1].input_ids,  vec![14, 15, PAD_ID, PAD_ID]);
        assert_eq!(windows[1].target_ids, vec![15, 16, PAD_ID, PAD_ID]);
    }

    #[test]
    fn test_num_windows_matches_chunk() {
        for (seq_len, stride) in [(4, 1), (4, 2), (4, 4), (8, 3), (2, 7)] {
            let c = WindowChunker::new(seq_len, stride);
            for n in 0..30 {
                assert_eq!(c.num_windows(n as usize), c.chunk(&stream(n)).len());
            }
        }
    }

    #[test]
    fn test_too_short_stream_gives_no_windows() {
        let c = WindowChunker::new(4, 2);
        assert!(c.chunk(&[]).is_empty());
        assert!(c.chunk(&[7]).is_empty());
        assert_eq!(c.chunk(&[7, 8]).len(), 1);
    }

    #[test]
    #[should_panic]
    fn test_zero_stride_panics() {
        let _ = WindowChunker::new(4, 0);
    }
}
