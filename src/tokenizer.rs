//! Token counting
//!
//! The document always carries the character-ratio estimate so output
//! stays deterministic. An exact BPE count is available for reporting.

use clap::ValueEnum;
use tiktoken_rs::CoreBPE;

use crate::error::{ConcatError, Result};

/// Estimated tokens: `ceil(chars / 4)`
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// BPE encodings available for exact counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Model {
    /// GPT-3.5 / GPT-4 encoding
    Cl100k,
    /// GPT-4o encoding
    O200k,
}

impl Model {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cl100k => "cl100k_base",
            Self::O200k => "o200k_base",
        }
    }
}

/// Interface for token counters
pub trait Tokenizer: Send + Sync {
    /// Count tokens in the given text
    fn count_tokens(&self, text: &str) -> usize;
}

/// Exact counter backed by tiktoken
pub struct BpeTokenizer {
    bpe: CoreBPE,
}

impl BpeTokenizer {
    pub fn new(model: Model) -> Result<Self> {
        let bpe = match model {
            Model::Cl100k => tiktoken_rs::cl100k_base(),
            Model::O200k => tiktoken_rs::o200k_base(),
        }
        .map_err(|e| ConcatError::Config(format!("Failed to load {}: {}", model.name(), e)))?;
        Ok(Self { bpe })
    }
}

impl Tokenizer for BpeTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}
