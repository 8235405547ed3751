use regex::Regex;
use std::sync::{Arc, OnceLock};

/// Maps text to a token count.
///
/// Implementations are expected to be additive across whitespace and
/// punctuation boundaries: counting two pieces separately and summing should
/// match counting their concatenation. Oversized-text splitting relies on it.
pub trait TokenCounter {
    fn count_tokens(&self, text: &str) -> usize;
}

impl<T: TokenCounter + ?Sized> TokenCounter for &T {
    fn count_tokens(&self, text: &str) -> usize {
        (**self).count_tokens(text)
    }
}

impl<T: TokenCounter + ?Sized> TokenCounter for Box<T> {
    fn count_tokens(&self, text: &str) -> usize {
        (**self).count_tokens(text)
    }
}

impl<T: TokenCounter + ?Sized> TokenCounter for Arc<T> {
    fn count_tokens(&self, text: &str) -> usize {
        (**self).count_tokens(text)
    }
}

/// Adapts a plain function or closure, e.g. a wrapper around a model tokenizer.
#[derive(Debug, Clone, Copy)]
pub struct FnTokenCounter<F>(pub F);

impl<F> TokenCounter for FnTokenCounter<F>
where
    F: Fn(&str) -> usize,
{
    fn count_tokens(&self, text: &str) -> usize {
        (self.0)(text)
    }
}

const WORD_PATTERN: &str = r"\b[\w'-]+\b";

fn word_regex() -> &'static Regex {
    static WORD_REGEX: OnceLock<Regex> = OnceLock::new();
    WORD_REGEX.get_or_init(|| Regex::new(WORD_PATTERN).expect("word pattern is a valid regex"))
}

/// Default counter: one token per word-like run (`\b[\w'-]+\b`).
///
/// This approximates natural-language tokenization. It is not any model's
/// exact tokenizer and usually undercounts code and punctuation-heavy text.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenCounter;

impl TokenCounter for WordTokenCounter {
    fn count_tokens(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        word_regex().find_iter(text).count()
    }
}

/// Model-agnostic estimate of roughly four characters per token.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharEstimateTokenCounter;

impl TokenCounter for CharEstimateTokenCounter {
    fn count_tokens(&self, text: &str) -> usize {
        text.chars().count().div_ceil(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_counter_counts_words() {
        let counter = WordTokenCounter;
        assert_eq!(counter.count_tokens(""), 0);
        assert_eq!(counter.count_tokens("   "), 0);
        assert_eq!(counter.count_tokens("short text A"), 3);
        assert_eq!(counter.count_tokens("hello, world!"), 2);
    }

    #[test]
    fn word_counter_keeps_apostrophes_and_hyphens() {
        let counter = WordTokenCounter;
        assert_eq!(counter.count_tokens("don't re-run it"), 3);
        assert_eq!(counter.count_tokens("snake_case_name"), 1);
    }

    #[test]
    fn word_counter_is_additive_across_whitespace() {
        let counter = WordTokenCounter;
        let whole = "alpha beta, gamma\ndelta";
        let parts = ["alpha ", "beta, ", "gamma\n", "delta"];
        let sum: usize = parts.iter().map(|p| counter.count_tokens(p)).sum();
        assert_eq!(counter.count_tokens(whole), sum);
    }

    #[test]
    fn char_estimate_rounds_up() {
        let counter = CharEstimateTokenCounter;
        assert_eq!(counter.count_tokens(""), 0);
        assert_eq!(counter.count_tokens("abc"), 1);
        assert_eq!(counter.count_tokens("abcd"), 1);
        assert_eq!(counter.count_tokens("abcde"), 2);
    }

    #[test]
    fn closures_and_boxes_count() {
        let by_len = FnTokenCounter(|text: &str| text.len());
        assert_eq!(by_len.count_tokens("four"), 4);
        assert_eq!((&by_len).count_tokens("four"), 4);

        let boxed: Box<dyn TokenCounter> = Box::new(WordTokenCounter);
        assert_eq!(boxed.count_tokens("one two"), 2);

        let shared: Arc<dyn TokenCounter + Send + Sync> = Arc::new(CharEstimateTokenCounter);
        assert_eq!(shared.count_tokens("12345678"), 2);
    }
}
