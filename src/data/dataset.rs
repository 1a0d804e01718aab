use burn::data::dataset::Dataset;

use crate::domain::window::TokenWindow;

/// In-memory collection of next-token windows, served to Burn's DataLoader.
pub struct LmDataset {
    windows: Vec<TokenWindow>,
}

impl LmDataset {
    pub fn new(windows: Vec<TokenWindow>) -> Self { Self { windows } }

    /// Total number of real (non-pad) target tokens across all windows
    pub fn target_tokens(&self) -> usize {
        self.windows.iter().map(TokenWindow::real_len).sum()
    }
}

impl Dataset<TokenWindow> for LmDataset {
    fn get(&self, index: usize) -> Option<TokenWindow> {
        self.windows.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.windows.len()
    }
}
