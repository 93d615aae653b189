//! Proper-noun tagging for fuzzy teacher links.
//!
//! Before a word of free text is looked up as a teacher it has to pass a part-of-speech
//! check, otherwise every capitalized German noun ("Aufgaben", "Raum") would be sent to
//! the directory and any abbreviation colliding with a common word would be linked.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Decides whether `token` is used as a proper noun within `sentence`.
pub trait ProperNounTagger {
    fn is_proper_noun(&self, sentence: &str, token: &str) -> bool;
}

/// Words that appear capitalized in notices without ever naming a person.
const GERMAN_COMMON_WORDS: &[&str] = &[
    "Achtung", "Am", "Arbeitsblatt", "Aufgabe", "Aufgaben", "Aufsicht", "Ausfall", "Bibo",
    "Bibliothek", "Bitte", "Block", "Buch", "Das", "Dem", "Den", "Der", "Die", "Ein", "Eine",
    "Fach", "Frau", "Fr", "Für", "Gruppe", "Halle", "Haus", "Hause", "Heft", "Hefter",
    "Herr", "Herrn", "Heute", "Hinweis", "Hr", "Im", "In", "Info", "Klasse", "Klassen",
    "Klausur", "Klausuren", "Kurs", "LernSax", "Lehrbuch", "Lehrer", "Lehrerin", "Material",
    "Mit", "Morgen", "Nach", "Nachbearbeitung", "Oder", "Prüfung", "Prüfungen", "Raum",
    "Räume", "Schüler", "Schülerin", "Sport", "Statt", "Stoffes", "Stunde", "Stunden", "Tag",
    "Test", "Turnhalle", "Und", "Unterricht", "Vertretung", "Von", "Vorbereitungsraum",
    "Woche",
];

/// Lexicon based tagger: a single word is a proper noun unless it is lowercase or a
/// known common word. Multi-word candidates ("Frau Musterfrau") are names by construction.
///
/// A single word has to occur on its own in the sentence; a fragment of a longer word
/// ("Sax" in "LernSax") is never a proper noun.
#[derive(Debug, Clone, Default)]
pub struct LexiconTagger {
    common_words: HashSet<String>,
}

impl LexiconTagger {
    pub fn new(common_words: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            common_words: common_words.into_iter().map(Into::into).collect(),
        }
    }

    /// Tagger with the built-in German lexicon.
    pub fn german() -> Self {
        Self::new(GERMAN_COMMON_WORDS.iter().copied())
    }

    pub fn with_words(mut self, words: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.common_words.extend(words.into_iter().map(Into::into));
        self
    }
}

impl ProperNounTagger for LexiconTagger {
    fn is_proper_noun(&self, sentence: &str, token: &str) -> bool {
        if token.split_whitespace().nth(1).is_some() {
            return true;
        }

        let standalone = sentence
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == token);
        if !standalone {
            return false;
        }

        token.chars().next().is_some_and(char::is_uppercase) && !self.common_words.contains(token)
    }
}

/// Tagger that accepts every candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl ProperNounTagger for AcceptAll {
    fn is_proper_noun(&self, _sentence: &str, _token: &str) -> bool {
        true
    }
}

pub static GERMAN_TAGGER: Lazy<LexiconTagger> = Lazy::new(LexiconTagger::german);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_nouns_are_rejected() {
        let sentence = "Aufgaben in Raum 1302";
        assert!(!GERMAN_TAGGER.is_proper_noun(sentence, "Aufgaben"));
        assert!(!GERMAN_TAGGER.is_proper_noun(sentence, "Raum"));
        assert!(!GERMAN_TAGGER.is_proper_noun(sentence, "in"));
    }

    #[test]
    fn test_names_and_abbreviations_pass() {
        let sentence = "Vertretung durch Frau Musterfrau, sonst MUS";
        assert!(GERMAN_TAGGER.is_proper_noun(sentence, "Frau Musterfrau"));
        assert!(GERMAN_TAGGER.is_proper_noun(sentence, "MUS"));
        assert!(!GERMAN_TAGGER.is_proper_noun(sentence, "Vertretung"));
    }

    #[test]
    fn test_word_fragments_are_rejected() {
        let sentence = "Aufgaben stehen im LernSax";
        assert!(!GERMAN_TAGGER.is_proper_noun(sentence, "Sax"));
        assert!(!GERMAN_TAGGER.is_proper_noun(sentence, "LernSax"));
        assert!(GERMAN_TAGGER.is_proper_noun("Vertretung durch Sax", "Sax"));
    }

    #[test]
    fn test_extra_words() {
        let tagger = LexiconTagger::german().with_words(["Mensa"]);
        assert!(!tagger.is_proper_noun("Essen in der Mensa", "Mensa"));
        assert!(GERMAN_TAGGER.is_proper_noun("Essen in der Mensa", "Mensa"));
    }
}
