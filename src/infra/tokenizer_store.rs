// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Builds, saves, and reloads the vocabulary.
//
// Two vocabulary kinds:
//
//   Word — frequency-truncated whole-word vocabulary.
//          Words are split exactly the way the saved tokenizer
//          will split them at encode time (tokenizers' Whitespace
//          pre-tokenizer, lower-cased), counted, and the most
//          frequent vocab_size - 4 are kept. Everything else
//          encodes to <unk>. The tokenizer JSON is written by hand
//          as a WordLevel model and loaded back.
//
//   Bpe  — byte-level BPE merges learned with tokenizers'
//          BpeTrainer over the cleaned corpus texts. The trainer is
//          seeded with all 256 byte symbols, so text containing bytes
//          the corpus never had still encodes instead of vanishing.
//          The vocabulary is therefore at least 260 entries.
//
// In both cases the four special tokens occupy ids 0..=3 so the
// rest of the crate can use the constants in domain::window.
//
// The tokenizer is written to {dir}/tokenizer.json and reused on
// later runs (including resumed training and generation), so the
// ids a checkpoint was trained on never change under it.
//
// Reference: Sennrich et al. (2016) BPE paper
//            tokenizers crate documentation

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::PathBuf,
};
use tokenizers::{
    models::bpe::{BpeTrainerBuilder, BPE},
    normalizers::{strip::Strip, unicode::NFC, utils::Sequence},
    pre_tokenizers::{byte_level::ByteLevel, whitespace::Whitespace},
    AddedToken, OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer, Tokenizer,
    TokenizerBuilder,
};

use crate::domain::window::{SPECIAL_TOKENS, UNK_TOKEN};

const TOKENIZER_FILE: &str = "tokenizer.json";

/// Which vocabulary to build for a fresh run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TokenizerKind {
    /// Whole words, truncated by frequency
    Word,
    /// Learned byte-level BPE subwords
    Bpe,
}

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(TOKENIZER_FILE)
    }

    pub fn exists(&self) -> bool {
        self.path().exists()
    }

    /// Load an existing tokenizer, or build a new one of `kind` from `texts`.
    pub fn load_or_build(
        &self,
        kind:       TokenizerKind,
        texts:      &[String],
        vocab_size: usize,
    ) -> Result<Tokenizer> {
        if self.exists() {
            tracing::info!("Loading existing tokenizer from '{}'", self.path().display());
            return self.load();
        }

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        tracing::info!("Building new {:?} tokenizer (vocab_size={})", kind, vocab_size);
        match kind {
            TokenizerKind::Word => self.build_word_level(texts, vocab_size),
            TokenizerKind::Bpe  => self.train_bpe(texts, vocab_size),
        }
    }

    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.path();
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!(
                "Cannot load tokenizer from '{}': {}", path.display(), e
            ))
    }

    fn build_word_level(&self, texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
        if vocab_size <= SPECIAL_TOKENS.len() {
            bail!("vocab_size must exceed the {} special tokens", SPECIAL_TOKENS.len());
        }

        let freq  = count_words(texts)?;
        let words = top_words(freq, vocab_size - SPECIAL_TOKENS.len());

        let mut vocab = serde_json::Map::new();
        for (id, token) in SPECIAL_TOKENS.iter().enumerate() {
            vocab.insert(token.to_string(), serde_json::json!(id));
        }
        for word in &words {
            let id = vocab.len();
            vocab.entry(word.clone()).or_insert_with(|| serde_json::json!(id));
        }
        let vocab_len = vocab.len();

        let added_tokens: Vec<serde_json::Value> = SPECIAL_TOKENS
            .iter()
            .enumerate()
            .map(|(id, token)| serde_json::json!({
                "id": id, "content": token, "single_word": false,
                "lstrip": false, "rstrip": false, "normalized": false, "special": true
            }))
            .collect();

        // HuggingFace tokenizer JSON, the format Tokenizer::from_file() expects
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": added_tokens,
            "normalizer": { "type": "Lowercase" },
            "pre_tokenizer": { "type": "Whitespace" },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": UNK_TOKEN
            }
        });

        let path = self.path();
        fs::write(&path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;

        tracing::info!("Word tokenizer built with {} entries, saved to '{}'", vocab_len, path.display());
        self.load()
    }

    fn train_bpe(&self, texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
        if texts.is_empty() {
            bail!("BPE training needs a non-empty corpus");
        }

        let special: Vec<AddedToken> = SPECIAL_TOKENS
            .iter()
            .map(|t| AddedToken::from(t.to_string(), true))
            .collect();

        let mut trainer = BpeTrainerBuilder::new()
            .show_progress(false)
            .vocab_size(vocab_size)
            .min_frequency(2)
            .special_tokens(special)
            .initial_alphabet(ByteLevel::alphabet())
            .build();

        let mut tokenizer = TokenizerBuilder::new()
            .with_model(BPE::default())
            .with_normalizer(Some(Sequence::new(vec![
                Strip::new(true, true).into(),
                NFC.into(),
            ])))
            .with_pre_tokenizer(Some(ByteLevel::default()))
            .with_post_processor(Some(ByteLevel::default()))
            .with_decoder(Some(ByteLevel::default()))
            .build()
            .map_err(|e| anyhow::anyhow!("Cannot assemble BPE tokenizer: {e}"))?;

        let path = self.path();
        tokenizer
            .train(&mut trainer, texts.iter())
            .map_err(|e| anyhow::anyhow!("BPE training failed: {e}"))?
            .save(&path, true)
            .map_err(|e| anyhow::anyhow!("Cannot write '{}': {e}", path.display()))?;

        tracing::info!("BPE tokenizer trained on {} texts, saved to '{}'", texts.len(), path.display());
        self.load()
    }
}

/// Count lower-cased words the way the Whitespace pre-tokenizer splits them
/// (`\w+` runs and punctuation runs are separate tokens).
fn count_words(texts: &[String]) -> Result<HashMap<String, usize>> {
    let mut freq: HashMap<String, usize> = HashMap::new();

    for text in texts {
        let lower   = text.to_lowercase();
        let mut pts = PreTokenizedString::from(lower.as_str());
        Whitespace {}
            .pre_tokenize(&mut pts)
            .map_err(|e| anyhow::anyhow!("Pre-tokenisation error: {e}"))?;

        for (piece, _, _) in pts.get_splits(OffsetReferential::Original, OffsetType::Byte) {
            *freq.entry(piece.to_string()).or_insert(0) += 1;
        }
    }

    Ok(freq)
}

/// Most frequent `max_words` words; ties broken alphabetically so the
/// vocabulary is deterministic.
fn top_words(freq: HashMap<String, usize>, max_words: usize) -> Vec<String> {
    let mut words: Vec<(String, usize)> = freq
        .into_iter()
        .filter(|(w, _)| !SPECIAL_TOKENS.contains(&w.as_str()))
        .collect();
    words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    words.truncate(max_words);
    words.into_iter().map(|(w, _)| w).collect()
}

/// Encode `text` to ids without adding special tokens.
pub fn encode_ids(tokenizer: &Tokenizer, text: &str) -> Result<Vec<u32>> {
    let enc = tokenizer
        .encode(text, false)
        .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;
    Ok(enc.get_ids().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::window::{EOS_ID, EOS_TOKEN, PAD_ID, PAD_TOKEN, UNK_ID};

    #[test]
    fn test_count_words_splits_punctuation() {
        let freq = count_words(&["The cat, the HAT.".to_string()]).unwrap();
        assert_eq!(freq["the"], 2);
        assert_eq!(freq[","], 1);
        assert_eq!(freq["."], 1);
        assert!(!freq.contains_key("cat,"));
    }

    #[test]
    fn test_top_words_is_frequency_then_alphabetical() {
        let freq: HashMap<String, usize> = [("b", 2), ("a", 2), ("c", 5), ("d", 1)]
            .into_iter()
            .map(|(w, n)| (w.to_string(), n))
            .collect();
        assert_eq!(top_words(freq, 3), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_word_vocab_is_bounded_and_specials_fixed() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        let texts = vec!["one two two three three three four four four four".to_string()];

        let tok = store.load_or_build(TokenizerKind::Word, &texts, 6).unwrap();

        assert_eq!(tok.get_vocab_size(true), 6);
        assert_eq!(tok.token_to_id(PAD_TOKEN), Some(PAD_ID));
        assert_eq!(tok.token_to_id(EOS_TOKEN), Some(EOS_ID));
        assert_eq!(tok.token_to_id("four"), Some(4));
        assert_eq!(tok.token_to_id("three"), Some(5));

        // "one" fell below the cut-off
        let ids = encode_ids(&tok, "Four one").unwrap();
        assert_eq!(ids, vec![4, UNK_ID]);
    }

    #[test]
    fn test_existing_tokenizer_is_reused() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        store.load_or_build(TokenizerKind::Word, &["alpha beta".to_string()], 10).unwrap();

        // A second build with a different corpus must not replace it
        let tok = store.load_or_build(TokenizerKind::Word, &["gamma".to_string()], 10).unwrap();
        assert!(tok.token_to_id("alpha").is_some());
        assert!(tok.token_to_id("gamma").is_none());
    }

    #[test]
    fn test_bpe_reserves_special_ids() {
        let dir   = tempfile::tempdir().unwrap();
        let texts = vec!["low lower lowest newer newest wider widest".to_string(); 20];

        let store = TokenizerStore::new(dir.path().join("out"));
        let tok   = store.load_or_build(TokenizerKind::Bpe, &texts, 300).unwrap();

        for (id, token) in SPECIAL_TOKENS.iter().enumerate() {
            assert_eq!(tok.token_to_id(token), Some(id as u32));
        }
        let ids = encode_ids(&tok, "lowest newer").unwrap();
        assert!(!ids.is_empty());
        assert!(ids.iter().all(|&id| id as usize >= SPECIAL_TOKENS.len()));
    }

    #[test]
    fn test_bpe_round_trips_unseen_characters() {
        let dir   = tempfile::tempdir().unwrap();
        let texts = vec!["low lower lowest newer newest wider widest".to_string(); 20];

        let store = TokenizerStore::new(dir.path());
        let tok   = store.load_or_build(TokenizerKind::Bpe, &texts, 300).unwrap();

        // None of z, b, a, é or the emoji occur in the corpus
        for word in ["zebra", "café", "q🦀x"] {
            let ids     = encode_ids(&tok, word).unwrap();
            let decoded = tok.decode(&ids, true).unwrap();
            assert_eq!(decoded.trim(), word);
        }
    }

    #[test]
    fn test_tiny_vocab_is_rejected() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        assert!(store.load_or_build(TokenizerKind::Word, &["x".to_string()], 4).is_err());
    }
}
