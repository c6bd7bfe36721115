use unicode_categories::UnicodeCategories;

/// A Bert pre-tokenizer.
///
/// Splits a normalized sequence into word candidates on whitespace and isolates punctuation.
#[derive(Clone, Copy, Debug, Default)]
pub struct PreTokenizer;

impl PreTokenizer {
    /// Pre-tokenizes the sequence.
    pub(crate) fn pre_tokenize<'s>(&self, sequence: &'s str) -> Vec<&'s str> {
        sequence
            .split(char::is_whitespace)
            .flat_map(isolate_punctuation)
            .filter(|word| !word.is_empty())
            .collect()
    }
}

fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() || c.is_punctuation()
}

/// Splits the word such that every punctuation character becomes a word on its own.
fn isolate_punctuation(word: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start = 0;
    for (idx, c) in word.char_indices() {
        if is_punctuation(c) {
            let end = idx + c.len_utf8();
            words.push(&word[start..idx]);
            words.push(&word[idx..end]);
            start = end;
        }
    }
    words.push(&word[start..]);

    words
}
