use crate::codec::CodecKind;
use rust_stemmers::Algorithm;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_CACHE_CAPACITY: usize = 100_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Code family used by `compress`.
    pub codec: CodecKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    pub language: Language,
    /// Drop English stopwords before positions are assigned.
    pub remove_stopwords: bool,
    /// Entries kept per cache (text -> tokens, word -> normal form). Zero disables caching.
    pub cache_capacity: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self { language: Language::default(), remove_stopwords: false, cache_capacity: DEFAULT_CACHE_CAPACITY }
    }
}

/// Stemming languages offered by the normalizing tokenizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Russian,
    German,
    French,
    Spanish,
    Italian,
    Portuguese,
    Dutch,
    Swedish,
}

impl Language {
    pub(crate) fn algorithm(self) -> Algorithm {
        match self {
            Language::English => Algorithm::English,
            Language::Russian => Algorithm::Russian,
            Language::German => Algorithm::German,
            Language::French => Algorithm::French,
            Language::Spanish => Algorithm::Spanish,
            Language::Italian => Algorithm::Italian,
            Language::Portuguese => Algorithm::Portuguese,
            Language::Dutch => Algorithm::Dutch,
            Language::Swedish => Algorithm::Swedish,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Russian => "russian",
            Language::German => "german",
            Language::French => "french",
            Language::Spanish => "spanish",
            Language::Italian => "italian",
            Language::Portuguese => "portuguese",
            Language::Dutch => "dutch",
            Language::Swedish => "swedish",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_ascii_lowercase();
        [
            Language::English,
            Language::Russian,
            Language::German,
            Language::French,
            Language::Spanish,
            Language::Italian,
            Language::Portuguese,
            Language::Dutch,
            Language::Swedish,
        ]
        .into_iter()
        .find(|lang| lang.name() == wanted)
        .ok_or_else(|| format!("unsupported language '{s}'"))
    }
}
