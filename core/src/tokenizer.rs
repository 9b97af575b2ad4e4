use crate::cache::BoundedCache;
use crate::config::TokenizerConfig;
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::Stemmer;
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"(?u)[\p{L}\p{N}][\p{L}\p{N}_']*").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","cannot","could","did","do","does","doing","down","during",
            "each","few","for","from","further",
            "had","has","have","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","it","its","itself",
            "me","more","most","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","should","so","some","such",
            "than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","very",
            "was","we","were","what","when","where","which","while","who","whom","why","with","would",
            "you","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

/// Turns raw text into the ordered term sequence the index is built from.
///
/// Implementations must be deterministic: the index re-tokenizes a stored document when
/// the same id is inserted again, and expects the terms it indexed the first time.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Splits on whitespace, nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }
}

/// NFKC normalization, lowercasing, optional stopword removal and Snowball stemming,
/// with bounded caches for whole texts and single words.
pub struct NormalizingTokenizer {
    stemmer: Stemmer,
    remove_stopwords: bool,
    texts: BoundedCache<Vec<String>>,
    words: BoundedCache<String>,
}

impl NormalizingTokenizer {
    pub fn new(config: TokenizerConfig) -> Self {
        Self {
            stemmer: Stemmer::create(config.language.algorithm()),
            remove_stopwords: config.remove_stopwords,
            texts: BoundedCache::new(config.cache_capacity),
            words: BoundedCache::new(config.cache_capacity),
        }
    }

    /// Canonical form of one lowercased word.
    pub fn normal_form(&self, word: &str) -> String {
        if let Some(hit) = self.words.get(word) {
            return hit;
        }
        let stem = self.stemmer.stem(word).into_owned();
        self.words.insert(word.to_string(), stem.clone());
        stem
    }

    /// Entries currently held by the (text, word) caches.
    pub fn cached_entries(&self) -> (usize, usize) {
        (self.texts.len(), self.words.len())
    }
}

impl Default for NormalizingTokenizer {
    fn default() -> Self {
        Self::new(TokenizerConfig::default())
    }
}

impl Tokenizer for NormalizingTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        if let Some(hit) = self.texts.get(text) {
            return hit;
        }
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        let tokens: Vec<String> = WORD
            .find_iter(&normalized)
            .map(|m| m.as_str())
            .filter(|word| !(self.remove_stopwords && STOPWORDS.contains(word)))
            .map(|word| self.normal_form(word))
            .collect();
        self.texts.insert(text.to_string(), tokens.clone());
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Language;

    #[test]
    fn whitespace_keeps_case_and_punctuation() {
        assert_eq!(WhitespaceTokenizer.tokenize("  Hello,  world! "), vec!["Hello,", "world!"]);
        assert!(WhitespaceTokenizer.tokenize("   ").is_empty());
    }

    #[test]
    fn basic_tokenize() {
        let t = NormalizingTokenizer::default().tokenize("Running, runner's run!");
        assert_eq!(t.first().map(String::as_str), Some("run"));
        assert_eq!(t.last().map(String::as_str), Some("run"));
    }

    #[test]
    fn stopwords_are_optional() {
        let keep = NormalizingTokenizer::default();
        assert_eq!(keep.tokenize("the fox").len(), 2);

        let drop = NormalizingTokenizer::new(TokenizerConfig { remove_stopwords: true, ..Default::default() });
        assert_eq!(drop.tokenize("the fox"), vec!["fox"]);
    }

    #[test]
    fn russian_forms_share_a_stem() {
        let tok = NormalizingTokenizer::new(TokenizerConfig { language: Language::Russian, ..Default::default() });
        let a = tok.tokenize("политика");
        let b = tok.tokenize("политики");
        assert_eq!(a, b);
    }

    #[test]
    fn caches_are_bounded() {
        let tok = NormalizingTokenizer::new(TokenizerConfig { cache_capacity: 3, ..Default::default() });
        for text in ["alpha", "beta gamma", "delta", "epsilon zeta", "eta"] {
            tok.tokenize(text);
        }
        let (texts, words) = tok.cached_entries();
        assert_eq!(texts, 3);
        assert_eq!(words, 3);
    }

    #[test]
    fn cached_result_matches_fresh_result() {
        let cached = NormalizingTokenizer::default();
        let uncached = NormalizingTokenizer::new(TokenizerConfig { cache_capacity: 0, ..Default::default() });
        let text = "Searching searched searches";
        assert_eq!(cached.tokenize(text), cached.tokenize(text));
        assert_eq!(cached.tokenize(text), uncached.tokenize(text));
        assert_eq!(uncached.cached_entries(), (0, 0));
    }
}
