//! Named-entity recognition used as the second candidate source for skill extraction.
//!
//! The extractor only consumes `Entity::text`. `RuleBasedRecognizer` is the built-in
//! implementation; a model-backed recognizer can be plugged in through `EntityRecognizer`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecognizerError {
    #[error("recognizer unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityLabel {
    /// A single capitalised or mixed-case token.
    Term,
    /// Two or more adjacent terms separated only by whitespace.
    Phrase,
}

/// A recognized span. `start..end` are byte offsets into the input text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub label: EntityLabel,
}

pub trait EntityRecognizer: Send + Sync {
    fn recognize(&self, text: &str) -> Result<Vec<Entity>, RecognizerError>;
}

/// Tags proper-noun-looking tokens and runs of them.
///
/// A token is entity-like when it starts with an uppercase letter, carries an uppercase
/// letter after its first character (`iOS`, `gRPC`), or ends in `+`/`#` (`C++`, `C#`).
/// Surrounding punctuation is stripped; punctuation also ends a phrase.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleBasedRecognizer;

const EDGE_PUNCTUATION: &[char] = &[
    ',', ';', ':', '(', ')', '[', ']', '{', '}', '"', '\'', '!', '?', '.', '/', '\u{2022}',
];

struct Token {
    start: usize,
    end: usize,
    entity_like: bool,
    /// Trailing punctuation was stripped, so no phrase may continue past this token.
    closes_phrase: bool,
    /// Leading punctuation was stripped, so no phrase may continue into this token.
    opens_phrase: bool,
}

impl EntityRecognizer for RuleBasedRecognizer {
    fn recognize(&self, text: &str) -> Result<Vec<Entity>, RecognizerError> {
        let tokens = tokenize(text);
        let mut entities = Vec::new();
        let mut run: Vec<&Token> = Vec::new();

        for token in &tokens {
            let continues = token.entity_like
                && !token.opens_phrase
                && run
                    .last()
                    .map(|prev| !prev.closes_phrase && same_line(text, prev.end, token.start))
                    .unwrap_or(true);

            if !continues {
                flush_phrase(text, &run, &mut entities);
                run.clear();
            }

            if token.entity_like {
                entities.push(span(text, token.start, token.end, EntityLabel::Term));
                run.push(token);
            }
        }
        flush_phrase(text, &run, &mut entities);

        Ok(entities)
    }
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut offset = 0;

    for piece in text.split_whitespace() {
        // split_whitespace yields subslices in order, so find from the running offset.
        let Some(rel) = text[offset..].find(piece) else {
            continue;
        };
        let raw_start = offset + rel;
        let raw_end = raw_start + piece.len();
        offset = raw_end;

        let trimmed_start = piece.trim_start_matches(EDGE_PUNCTUATION);
        let core = trimmed_start.trim_end_matches(EDGE_PUNCTUATION);
        if core.is_empty() {
            continue;
        }

        let start = raw_start + (piece.len() - trimmed_start.len());
        let end = start + core.len();
        tokens.push(Token {
            start,
            end,
            entity_like: is_entity_like(core),
            closes_phrase: end != raw_end,
            opens_phrase: start != raw_start,
        });
    }

    tokens
}

fn is_entity_like(token: &str) -> bool {
    let mut chars = token.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_uppercase()
        || chars.any(char::is_uppercase)
        || (first.is_alphabetic() && (token.ends_with('+') || token.ends_with('#')))
}

fn same_line(text: &str, from: usize, to: usize) -> bool {
    !text[from..to].contains('\n')
}

fn flush_phrase(text: &str, run: &[&Token], entities: &mut Vec<Entity>) {
    if run.len() > 1 {
        let (first, last) = (run[0], run[run.len() - 1]);
        entities.push(span(text, first.start, last.end, EntityLabel::Phrase));
    }
}

fn span(text: &str, start: usize, end: usize, label: EntityLabel) -> Entity {
    Entity {
        text: text[start..end].to_string(),
        start,
        end,
        label,
    }
}
