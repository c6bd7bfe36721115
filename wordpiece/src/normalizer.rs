use unicode_categories::UnicodeCategories;
use unicode_normalization_alignments::UnicodeNormalization;

/// A Bert normalizer.
#[derive(Clone, Debug)]
pub struct Normalizer {
    clean_text: bool,
    handle_chinese_chars: bool,
    strip_accents: bool,
    lowercase: bool,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(true, true, true, true)
    }
}

impl Normalizer {
    pub(crate) fn new(
        clean_text: bool,
        handle_chinese_chars: bool,
        strip_accents: bool,
        lowercase: bool,
    ) -> Self {
        Self {
            clean_text,
            handle_chinese_chars,
            strip_accents,
            lowercase,
        }
    }

    /// Overrides the lowercasing, which also toggles the accent stripping.
    pub(crate) fn with_lowercase(self, lowercase: bool) -> Self {
        Self {
            strip_accents: lowercase,
            lowercase,
            ..self
        }
    }

    fn clean_text(&self, sequence: String) -> String {
        if self.clean_text {
            sequence
                .chars()
                .filter(|&c| {
                    c != '\0'
                        && c != '\u{fffd}'
                        && (c == '\t' || c == '\n' || c == '\r' || !c.is_other())
                })
                .map(|c| if c.is_whitespace() { ' ' } else { c })
                .collect()
        } else {
            sequence
        }
    }

    fn handle_chinese_chars(&self, sequence: String) -> String {
        if self.handle_chinese_chars {
            let mut separated = String::with_capacity(sequence.len());
            for c in sequence.chars() {
                // the CJK unified ideographs blocks, which don't include Hangul, Hiragana and
                // Katakana since those are written with whitespace separated words
                if let '\u{4E00}'..='\u{9FFF}'
                | '\u{3400}'..='\u{4DBF}'
                | '\u{20000}'..='\u{2A6DF}'
                | '\u{2A700}'..='\u{2B73F}'
                | '\u{2B740}'..='\u{2B81F}'
                | '\u{2B920}'..='\u{2CEAF}'
                | '\u{F900}'..='\u{FAFF}'
                | '\u{2F800}'..='\u{2FA1F}' = c
                {
                    separated.push(' ');
                    separated.push(c);
                    separated.push(' ');
                } else {
                    separated.push(c);
                }
            }
            separated
        } else {
            sequence
        }
    }

    fn strip_accents(&self, sequence: String) -> String {
        if self.strip_accents {
            sequence
                .nfd()
                .map(|(c, _)| c)
                .filter(|c| !c.is_mark_nonspacing())
                .collect()
        } else {
            sequence
        }
    }

    fn lowercase(&self, sequence: String) -> String {
        if self.lowercase {
            sequence.to_lowercase()
        } else {
            sequence
        }
    }

    /// Normalizes the sequence.
    pub(crate) fn normalize(&self, sequence: impl AsRef<str>) -> String {
        let sequence = sequence.as_ref().to_string();
        let sequence = self.clean_text(sequence);
        let sequence = self.handle_chinese_chars(sequence);
        let sequence = self.strip_accents(sequence);
        self.lowercase(sequence)
    }
}
