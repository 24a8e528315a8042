//! Offline session labelling — clause scoring over the first user message.
//!
//! The last resort when no cached label exists and the remote summarizer
//! is unavailable, so it is pure: same text in, same label out.

use std::sync::LazyLock;

use regex::Regex;

/// Word-mode label budget, in characters.
const MAX_WORD_CHARS: usize = 16;
/// Character-mode (CJK) label budget, and the fallback prefix length.
const MAX_CHAR_CHARS: usize = 12;

/// Clause lengths that earn the quotable-length bonus.
const BONUS_RANGE: std::ops::RangeInclusive<usize> = 4..=12;
const BONUS: f64 = 3.0;

const CLAUSE_DELIMITERS: &[char] = &[
    '，', '。', '！', '？', '；', '：', '、', ',', '.', '!', '?', ';', ':', '\n',
];

/// Politeness and filler openers. Matched repeatedly at the start.
static FILLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:请你?|帮我|帮忙|麻烦你?|我想要?|我要|我需要|我希望|能不能|可以|能否|你能|我的|(?i:please|can you|could you|would you|help me|i want to|i need to|i'd like to)(?:[\s,]+|$))",
    )
    .expect("filler pattern is valid")
});

/// Produce a short label for `text`.
///
/// At most 16 characters when the chosen clause contains Latin letters
/// (never splitting a word unless no whole word fits), otherwise at most
/// 12 characters.
pub fn summarize(text: &str) -> String {
    let stripped = strip_filler(text);

    let clauses: Vec<&str> = stripped
        .split(CLAUSE_DELIMITERS)
        .map(str::trim)
        .filter(|c| c.chars().count() >= 2)
        .collect();

    let Some(best) = best_clause(&clauses) else {
        return clean(&prefix(text, MAX_CHAR_CHARS));
    };

    if best.chars().any(|c| c.is_ascii_alphabetic()) {
        let words = leading_words(best, MAX_WORD_CHARS);
        if words.is_empty() {
            clean(&prefix(best, MAX_CHAR_CHARS))
        } else {
            words
        }
    } else {
        clean(&prefix(best, MAX_CHAR_CHARS))
    }
}

fn strip_filler(text: &str) -> &str {
    let mut rest = text.trim_start();
    while let Some(m) = FILLER.find(rest) {
        if m.end() == 0 {
            break;
        }
        rest = rest[m.end()..].trim_start();
    }
    rest
}

/// Score is `1/(i+1) * 1/len`, tripled for quotable lengths. Ties keep
/// the earliest clause.
fn best_clause<'a>(clauses: &[&'a str]) -> Option<&'a str> {
    let mut best: Option<(f64, &'a str)> = None;
    for (i, &clause) in clauses.iter().enumerate() {
        let len = clause.chars().count();
        let mut score = (1.0 / (i + 1) as f64) * (1.0 / len.max(1) as f64);
        if BONUS_RANGE.contains(&len) {
            score *= BONUS;
        }
        if best.is_none_or(|(top, _)| score > top) {
            best = Some((score, clause));
        }
    }
    best.map(|(_, clause)| clause)
}

/// Whole words from the start of `clause` while the total fits `budget`.
fn leading_words(clause: &str, budget: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for word in clause.split_whitespace() {
        let cost = word.chars().count() + usize::from(!out.is_empty());
        if used + cost > budget {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
        used += cost;
    }
    out
}

fn prefix(text: &str, n: usize) -> String {
    text.chars().take(n).collect()
}

fn clean(label: &str) -> String {
    label
        .trim_matches(|c: char| c.is_whitespace() || CLAUSE_DELIMITERS.contains(&c))
        .to_string()
}
