use crate::config::SplitStrategy;
use crate::tokens::TokenCounter;
use crate::types::Chunk;

/// Break a text whose token count exceeds `token_limit` into file-less chunks.
///
/// Each piece stays within the limit unless it consists of a single word (or
/// segment) that exceeds the limit on its own; such words are never cut.
/// Packing sums per-word or per-segment counts, while each piece's recorded
/// `token_count` is the counter applied to the piece text.
pub fn split_oversized_text<C: TokenCounter + ?Sized>(
    text: &str,
    token_limit: usize,
    strategy: SplitStrategy,
    counter: &C,
) -> Vec<Chunk> {
    let pieces = match strategy {
        SplitStrategy::Words => split_words(text, token_limit, counter),
        SplitStrategy::Natural => split_natural(text, token_limit, counter),
    };
    pieces
        .into_iter()
        .map(|text| {
            let tokens = counter.count_tokens(&text);
            Chunk::text_only(text, tokens)
        })
        .collect()
}

/// Greedy packing of whitespace-delimited words, joined by single spaces
fn split_words<C: TokenCounter + ?Sized>(
    text: &str,
    token_limit: usize,
    counter: &C,
) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut buf = String::new();
    let mut tokens = 0usize;

    for word in text.split_whitespace() {
        let cost = counter.count_tokens(word);
        if tokens > 0 && tokens.saturating_add(cost) > token_limit {
            pieces.push(std::mem::take(&mut buf));
            tokens = 0;
        }
        if !buf.is_empty() {
            buf.push(' ');
        }
        buf.push_str(word);
        tokens = tokens.saturating_add(cost);
    }

    if !buf.is_empty() {
        pieces.push(buf);
    }
    pieces
}

struct Segment<'a> {
    text: &'a str,
    /// Ends after a newline, `,`, `}` or `]`
    strong: bool,
}

/// Cut `text` after every break character, keeping the break with the
/// preceding segment
fn natural_segments(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        let strong = matches!(ch, ',' | '}' | ']' | '\n');
        if strong || ch.is_whitespace() {
            let end = idx + ch.len_utf8();
            segments.push(Segment {
                text: &text[start..end],
                strong,
            });
            start = end;
        }
    }
    if start < text.len() {
        segments.push(Segment {
            text: &text[start..],
            strong: false,
        });
    }
    segments
}

fn split_natural<C: TokenCounter + ?Sized>(
    text: &str,
    token_limit: usize,
    counter: &C,
) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut buf = String::new();
    let mut tokens = 0usize;
    // Byte offset just past the last strong break in `buf`.
    let mut strong_cut: Option<usize> = None;

    for segment in natural_segments(text) {
        let cost = counter.count_tokens(segment.text);
        if tokens > 0 && tokens.saturating_add(cost) > token_limit {
            match strong_cut.take() {
                Some(at) if at < buf.len() => {
                    let rest = buf.split_off(at);
                    pieces.push(std::mem::replace(&mut buf, rest));
                    tokens = counter.count_tokens(&buf);
                }
                _ => {
                    pieces.push(std::mem::take(&mut buf));
                    tokens = 0;
                }
            }
            if tokens > 0 && tokens.saturating_add(cost) > token_limit {
                pieces.push(std::mem::take(&mut buf));
                tokens = 0;
            }
        }

        buf.push_str(segment.text);
        tokens = tokens.saturating_add(cost);
        if segment.strong {
            strong_cut = Some(buf.len());
        }
    }

    if !buf.is_empty() {
        pieces.push(buf);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::{CharEstimateTokenCounter, FnTokenCounter, WordTokenCounter};
    use pretty_assertions::assert_eq;

    fn texts(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(Chunk::text).collect()
    }

    #[test]
    fn words_pack_greedily() {
        let text = "one two three four five six seven eight nine ten eleven twelve";
        let chunks = split_oversized_text(text, 5, SplitStrategy::Words, &WordTokenCounter);
        assert_eq!(
            texts(&chunks),
            vec![
                "one two three four five",
                "six seven eight nine ten",
                "eleven twelve"
            ]
        );
        assert_eq!(
            chunks.iter().map(Chunk::token_count).collect::<Vec<_>>(),
            vec![5, 5, 2]
        );
        assert!(chunks.iter().all(|c| !c.has_files()));
    }

    #[test]
    fn words_collapse_whitespace_runs() {
        let text = "  alpha\n\tbeta   gamma  ";
        let chunks = split_oversized_text(text, 2, SplitStrategy::Words, &WordTokenCounter);
        assert_eq!(texts(&chunks), vec!["alpha beta", "gamma"]);
    }

    #[test]
    fn oversized_word_is_emitted_alone() {
        let per_char = FnTokenCounter(|t: &str| t.chars().count());
        let chunks = split_oversized_text("ab abcdefgh cd", 4, SplitStrategy::Words, &per_char);
        assert_eq!(texts(&chunks), vec!["ab", "abcdefgh", "cd"]);
        assert_eq!(chunks[1].token_count(), 8);
    }

    #[test]
    fn natural_prefers_strong_breaks() {
        let text = "alpha beta,\ngamma delta epsilon";
        let chunks = split_oversized_text(text, 4, SplitStrategy::Natural, &WordTokenCounter);
        assert_eq!(texts(&chunks), vec!["alpha beta,\n", "gamma delta epsilon"]);
    }

    #[test]
    fn natural_falls_back_to_whitespace() {
        let text = "a b c d e f g";
        let chunks = split_oversized_text(text, 3, SplitStrategy::Natural, &WordTokenCounter);
        assert_eq!(texts(&chunks), vec!["a b c ", "d e f ", "g"]);
    }

    #[test]
    fn natural_concatenation_is_lossless() {
        let text = "{\"a\": [1, 2, 3]},\n{\"b\": [4, 5]}\n  tail words here";
        let chunks = split_oversized_text(text, 3, SplitStrategy::Natural, &WordTokenCounter);
        assert!(chunks.len() >= 2);
        let rebuilt: String = chunks.iter().map(Chunk::text).collect();
        assert_eq!(rebuilt, text);
        for chunk in &chunks {
            assert!(WordTokenCounter.count_tokens(chunk.text()) <= 3, "{chunk:?}");
        }
    }

    #[test]
    fn piece_counts_match_counter_for_estimates() {
        let counter = CharEstimateTokenCounter;
        let text = "ab,\ncd ef gh,\nij kl mn op";
        for strategy in [SplitStrategy::Natural, SplitStrategy::Words] {
            let chunks = split_oversized_text(text, 2, strategy, &counter);
            assert!(chunks.len() >= 2);
            for chunk in &chunks {
                assert_eq!(chunk.token_count(), counter.count_tokens(chunk.text()));
            }
        }
    }

    #[test]
    fn segments_keep_break_characters() {
        let segments: Vec<(&str, bool)> = natural_segments("x, y\nz")
            .into_iter()
            .map(|s| (s.text, s.strong))
            .collect();
        assert_eq!(
            segments,
            vec![("x,", true), (" ", false), ("y\n", true), ("z", false)]
        );
    }
}
