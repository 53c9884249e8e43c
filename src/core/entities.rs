//! Capitalisation-based named-entity spans.
//!
//! A span is a maximal run of capitalised words inside one clause. Lowercase
//! name particles ("de", "de la", "of", ...) join a run only when a
//! capitalised word follows them. A word that merely opens a sentence ("The",
//! "Suddenly", ...) never starts a span, and at the start of a sentence only
//! a known title or article may begin a multi-word one.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref WORD_RE: Regex = Regex::new(r"\S+").unwrap();
    static ref SENTENCE_OPENERS: HashSet<&'static str> = HashSet::from([
        "A", "After", "Ah", "Alas", "All", "Although", "An", "And", "As", "At", "Before",
        "But", "By", "Every", "Finally", "For", "From", "He", "Her", "Here", "His", "How",
        "However", "I", "If", "In", "Indeed", "It", "Its", "Later", "Meanwhile", "My", "No",
        "Nor", "Not", "Now", "Of", "Oh", "On", "Once", "Or", "Our", "Perhaps", "She", "Since",
        "So", "Some", "Soon", "Still", "Suddenly", "That", "The", "Their", "Then", "There",
        "These", "They", "This", "Those", "Though", "Thus", "To", "Today", "Tomorrow",
        "Tonight", "Until", "Upon", "We", "Well", "What", "When", "Where", "Which", "While",
        "Who", "Why", "With", "Yes", "Yesterday", "Yet", "You", "Your",
    ]);
    /// Capitalised words that may begin a multi-word name at the start of a sentence.
    static ref TITLES: HashSet<&'static str> = HashSet::from([
        "Abbé", "Baron", "Cape", "Captain", "Cardinal", "Chevalier", "Comte", "Comtesse",
        "Count", "Countess", "De", "Du", "Duc", "Duchess", "Duchesse", "Duke", "Father",
        "Fort", "General", "Isle", "King", "La", "Lady", "Lake", "Le", "Les", "Lord",
        "Madame", "Mademoiselle", "Marquis", "Monsieur", "Mont", "Monte", "Mount", "New",
        "Notre", "Pont", "Port", "Prince", "Princess", "Queen", "Rue", "Saint", "San",
        "Santa", "Sir", "Vicomte",
    ]);
    /// A bare article takes the lowercase noun after it: "Le roi".
    static ref ARTICLES: HashSet<&'static str> = HashSet::from(["Le", "La", "Les"]);
    static ref NAME_PARTICLES: HashSet<&'static str> =
        HashSet::from(["de", "la", "le", "du", "des", "of", "von", "van"]);
}

/// Elided articles glued to a name: "d'Artagnan".
const ELISIONS: [&str; 4] = ["d'", "d\u{2019}", "l'", "l\u{2019}"];

/// An entity mention inside a passage, with byte offsets into the passage text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

struct Word<'a> {
    core: &'a str,
    start: usize,
    end: usize,
    /// Punctuation before the word opens a new clause.
    opens_clause: bool,
    /// Punctuation after the word closes the clause.
    closes_clause: bool,
    ends_sentence: bool,
}

impl Word<'_> {
    fn stem(&self) -> &str {
        ELISIONS
            .iter()
            .find_map(|p| self.core.strip_prefix(p))
            .unwrap_or(self.core)
    }

    fn is_capitalized(&self) -> bool {
        self.stem().chars().next().map(char::is_uppercase).unwrap_or(false)
    }

    fn is_particle(&self) -> bool {
        NAME_PARTICLES.contains(self.core)
    }
}

fn split_words(text: &str) -> Vec<Word<'_>> {
    WORD_RE
        .find_iter(text)
        .map(|m| {
            let raw = m.as_str();
            let lead = raw.len() - raw.trim_start_matches(|c: char| !c.is_alphanumeric()).len();
            let trimmed = raw.trim_end_matches(|c: char| !c.is_alphanumeric());
            let core = &trimmed[lead.min(trimmed.len())..];
            let tail = &raw[trimmed.len()..];
            Word {
                core,
                start: m.start() + lead.min(trimmed.len()),
                end: m.start() + trimmed.len(),
                opens_clause: lead > 0,
                closes_clause: !tail.is_empty() || core.is_empty(),
                ends_sentence: tail.contains(['.', '!', '?']),
            }
        })
        .collect()
}

/// Whether the capitalised word at `i`, opening a sentence, may start a span.
fn opens_entity(words: &[Word<'_>], i: usize) -> bool {
    let word = &words[i];
    if SENTENCE_OPENERS.contains(word.core) {
        return false;
    }
    if TITLES.contains(word.core) {
        return true;
    }
    // "Suddenly Athos": an unknown opener glued to the name after it.
    let followed_by_name =
        !word.closes_clause && words.get(i + 1).map(Word::is_capitalized).unwrap_or(false);
    !followed_by_name
}

/// Whether the particle chain starting at `i` ("de", "de la") reaches a
/// capitalised word inside the same clause.
fn particle_chain_continues(words: &[Word<'_>], i: usize) -> bool {
    let mut j = i;
    while let Some(word) = words.get(j) {
        if !word.is_particle() || word.closes_clause {
            return false;
        }
        j += 1;
        match words.get(j) {
            Some(next) if next.opens_clause => return false,
            Some(next) if next.is_capitalized() => return true,
            _ => {}
        }
    }
    false
}

fn is_bare_article(run: Option<(usize, usize)>, text: &str) -> bool {
    run.map(|(start, end)| ARTICLES.contains(&text[start..end]))
        .unwrap_or(false)
}

/// Extract entity spans from one passage, in reading order.
pub fn extract_entities(text: &str) -> Vec<EntitySpan> {
    let words = split_words(text);
    let mut spans = Vec::new();
    let mut run: Option<(usize, usize)> = None;
    let mut sentence_start = true;

    let flush = |run: &mut Option<(usize, usize)>, spans: &mut Vec<EntitySpan>| {
        if let Some((start, end)) = run.take() {
            let span_text = &text[start..end];
            if span_text != "I" && !ARTICLES.contains(span_text) {
                spans.push(EntitySpan {
                    text: span_text.to_string(),
                    start,
                    end,
                });
            }
        }
    };

    for (i, word) in words.iter().enumerate() {
        if word.opens_clause {
            flush(&mut run, &mut spans);
        }

        if word.core.is_empty() {
            flush(&mut run, &mut spans);
        } else if word.is_capitalized() {
            match run.as_mut() {
                Some((_, end)) => *end = word.end,
                None if sentence_start && !opens_entity(&words, i) => {}
                None => run = Some((word.start, word.end)),
            }
        } else if run.is_some() && particle_chain_continues(&words, i) {
            // Particles stay pending; the capitalised word after them extends the run.
        } else if is_bare_article(run, text) && !word.is_particle() {
            run = run.map(|(start, _)| (start, word.end));
            flush(&mut run, &mut spans);
        } else {
            flush(&mut run, &mut spans);
        }

        if word.closes_clause {
            flush(&mut run, &mut spans);
        }
        if !word.core.is_empty() || word.ends_sentence {
            sentence_start = word.ends_sentence;
        }
    }
    flush(&mut run, &mut spans);

    spans
}
