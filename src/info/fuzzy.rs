//! Fuzzy entity linking
//!
//! Free text the grammar did not structure (fallback messages, `before` / `after` around
//! recognized notices, additional plan info lines) is scanned for mentions of known
//! teachers, forms and rooms. Three passes run in that order; each pass only looks at
//! segments the previous passes left unlinked.
//!
//! All passes share one scan: a cursor walks the text, every candidate pattern is tried
//! at the cursor, and the first match the pass accepts becomes a linked segment and moves
//! the cursor past it. Without an accepted match the current character is emitted as plain
//! text and the cursor moves on by one character.

use crate::info::forms::{FormMention, ParsedForm, LOOSE_FORM};
use crate::info::grammar::teacher_pattern;
use crate::info::lesson::PlanType;
use crate::info::render::{group_text_segments, Link, LinkedTextSegment};
use crate::info::tagger::{ProperNounTagger, GERMAN_TAGGER};
use crate::info::teachers::TeacherDirectory;
use crate::info::typography::fix_typography;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Deserialize;
use std::collections::BTreeSet;

static TEACHER_CANDIDATE: Lazy<Regex> = Lazy::new(|| Regex::new(&teacher_pattern()).unwrap());
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").unwrap());

/// Characters that may directly follow a room mention besides whitespace.
pub const DEFAULT_ROOM_TERMINATORS: &str = ")!?:";

/// Abbreviated salutation and the form the teacher directory knows.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Salutation {
    pub abbreviation: String,
    pub expansion: String,
}

impl Salutation {
    pub fn new(abbreviation: impl Into<String>, expansion: impl Into<String>) -> Self {
        Self {
            abbreviation: abbreviation.into(),
            expansion: expansion.into(),
        }
    }
}

pub fn default_salutations() -> Vec<Salutation> {
    vec![
        Salutation::new("Hr", "Herr"),
        Salutation::new("Hr.", "Herr"),
        Salutation::new("Herrn", "Herr"),
        Salutation::new("Fr", "Frau"),
        Salutation::new("Fr.", "Frau"),
    ]
}

/// Links entity mentions in free text against read-only directory snapshots.
pub struct FuzzyLinker<'a> {
    date: NaiveDate,
    teachers: &'a dyn TeacherDirectory,
    forms: Vec<ParsedForm>,
    rooms: Vec<(String, Regex)>,
    tagger: &'a dyn ProperNounTagger,
    salutations: Vec<Salutation>,
    room_terminators: String,
}

impl<'a> FuzzyLinker<'a> {
    pub fn new(date: NaiveDate, teachers: &'a dyn TeacherDirectory) -> Self {
        Self {
            date,
            teachers,
            forms: Vec::new(),
            rooms: Vec::new(),
            tagger: &*GERMAN_TAGGER,
            salutations: default_salutations(),
            room_terminators: DEFAULT_ROOM_TERMINATORS.to_string(),
        }
    }

    /// Forms known to exist on the linker's date.
    pub fn with_forms(mut self, forms: impl IntoIterator<Item = ParsedForm>) -> Self {
        self.forms = forms.into_iter().collect();
        self
    }

    /// Known room identifiers. Longer identifiers are tried first.
    pub fn with_rooms(mut self, rooms: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let rooms: BTreeSet<String> = rooms
            .into_iter()
            .map(Into::into)
            .filter(|room: &String| !room.is_empty())
            .collect();
        let mut rooms: Vec<String> = rooms.into_iter().collect();
        rooms.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        self.rooms = rooms
            .into_iter()
            .filter_map(|room| {
                let regex = Regex::new(&regex::escape(&room)).ok()?;
                Some((room, regex))
            })
            .collect();
        self
    }

    pub fn with_tagger(mut self, tagger: &'a dyn ProperNounTagger) -> Self {
        self.tagger = tagger;
        self
    }

    pub fn with_salutations(mut self, salutations: Vec<Salutation>) -> Self {
        self.salutations = salutations;
        self
    }

    pub fn with_room_terminators(mut self, terminators: impl Into<String>) -> Self {
        self.room_terminators = terminators.into();
        self
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Normalize typography of a raw line and link it.
    pub fn link_line(&self, text: &str) -> Vec<LinkedTextSegment> {
        let text = fix_typography(text);
        self.link_segments(vec![LinkedTextSegment::plain(text.as_str())], &text)
    }

    pub fn link_lines<S: AsRef<str>>(&self, lines: &[S]) -> Vec<Vec<LinkedTextSegment>> {
        lines.iter().map(|line| self.link_line(line.as_ref())).collect()
    }

    /// Run all passes over the unlinked segments; `context` is the sentence the segments
    /// came from, used by the proper-noun check.
    pub fn link_segments(
        &self,
        segments: Vec<LinkedTextSegment>,
        context: &str,
    ) -> Vec<LinkedTextSegment> {
        let passes: [&dyn Fn(&str) -> Vec<LinkedTextSegment>; 3] = [
            &|text: &str| self.link_teachers(text, context),
            &|text: &str| self.link_forms(text),
            &|text: &str| self.link_rooms(text),
        ];

        passes.iter().fold(group_text_segments(segments), |segments, pass| {
            group_text_segments(segments.into_iter().flat_map(|segment| {
                if segment.is_linked() {
                    vec![segment]
                } else {
                    pass(&segment.text)
                }
            }))
        })
    }

    fn link_teachers(&self, text: &str, context: &str) -> Vec<LinkedTextSegment> {
        scan_with_validator(text, &[&*TEACHER_CANDIDATE, &*WORD], |caps| {
            let span = caps.get(0)?;
            let candidate = span.as_str();
            let inside_word = text[..span.start()]
                .chars()
                .next_back()
                .is_some_and(char::is_alphanumeric);
            if inside_word || !self.tagger.is_proper_noun(context, candidate) {
                return None;
            }

            let reference = self.expand_salutations(candidate);
            let teacher = self.teachers.query(&reference, Some(self.date)).ok()?;
            Some(LinkedTextSegment::linked(
                candidate,
                Link::new(PlanType::Teachers, [teacher.plan_short.as_str()]).on(self.date),
            ))
        })
    }

    fn link_forms(&self, text: &str) -> Vec<LinkedTextSegment> {
        scan_with_validator(text, &[&*LOOSE_FORM], |caps| {
            let matched: BTreeSet<String> = FormMention::from_captures(caps)
                .expand()
                .iter()
                .filter_map(|mentioned| self.forms.iter().find(|form| mentioned.denotes(form)))
                .map(ParsedForm::to_form_string)
                .collect();

            if matched.is_empty() {
                return None;
            }
            Some(LinkedTextSegment::linked(
                caps.get(0)?.as_str(),
                Link::new(PlanType::Forms, matched).on(self.date),
            ))
        })
    }

    fn link_rooms(&self, text: &str) -> Vec<LinkedTextSegment> {
        let patterns: Vec<&Regex> = self.rooms.iter().map(|(_, regex)| regex).collect();
        scan_with_validator(text, &patterns, |caps| {
            let span = caps.get(0)?;
            let preceded_by_space = text[..span.start()]
                .chars()
                .next_back()
                .map_or(true, char::is_whitespace);
            let followed_by_terminator = text[span.end()..].chars().next().map_or(true, |c| {
                c.is_whitespace() || self.room_terminators.contains(c)
            });

            if !(preceded_by_space && followed_by_terminator) {
                return None;
            }
            Some(LinkedTextSegment::linked(
                span.as_str(),
                Link::new(PlanType::Rooms, [span.as_str()]).on(self.date),
            ))
        })
    }

    /// "Hr. Mustermann" → "Herr Mustermann"; only whole tokens are replaced.
    fn expand_salutations(&self, candidate: &str) -> String {
        candidate
            .split(' ')
            .map(|token| {
                self.salutations
                    .iter()
                    .find(|salutation| salutation.abbreviation == token)
                    .map_or(token, |salutation| salutation.expansion.as_str())
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Scan `text` with a cursor, emitting linked segments for accepted matches and one plain
/// segment per skipped character.
pub fn scan_with_validator(
    text: &str,
    patterns: &[&Regex],
    mut validator: impl FnMut(&Captures<'_>) -> Option<LinkedTextSegment>,
) -> Vec<LinkedTextSegment> {
    let mut segments = Vec::new();
    let mut i = 0;

    while i < text.len() {
        let accepted = patterns.iter().find_map(|pattern| {
            let caps = pattern.captures_at(text, i)?;
            let span = caps.get(0)?;
            if span.start() != i || span.is_empty() {
                return None;
            }
            validator(&caps).map(|segment| (segment, span.end()))
        });

        match accepted {
            Some((segment, end)) => {
                segments.push(segment);
                i = end;
            }
            None => {
                let width = text[i..].chars().next().map_or(1, char::len_utf8);
                segments.push(LinkedTextSegment::plain(&text[i..i + width]));
                i += width;
            }
        }
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::render::segments_text;
    use crate::info::tagger::AcceptAll;
    use crate::info::teachers::{Teacher, Teachers};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 6, 5).unwrap()
    }

    fn teachers() -> Teachers {
        Teachers::from(vec![
            Teacher::new("MUS").with_long("Frau Musterfrau"),
            Teacher::new("MUM").with_long("Herr Mustermann"),
        ])
    }

    fn linked(segments: &[LinkedTextSegment]) -> Vec<(&str, PlanType, Vec<&str>)> {
        segments
            .iter()
            .filter_map(|segment| {
                let link = segment.link.as_ref()?;
                Some((
                    segment.text.as_str(),
                    link.kind,
                    link.values.iter().map(String::as_str).collect(),
                ))
            })
            .collect()
    }

    #[test]
    fn test_room_pass_links_exact_substring() {
        let teachers = teachers();
        let linker = FuzzyLinker::new(date(), &teachers).with_rooms(["1302"]);
        let segments = linker.link_line("bitte Raum 1302 nutzen");

        assert_eq!(linked(&segments), vec![("1302", PlanType::Rooms, vec!["1302"])]);
        assert_eq!(segments_text(&segments), "bitte Raum 1302 nutzen");
        assert_eq!(segments.len(), 3);
    }

    #[test]
    fn test_room_needs_boundaries() {
        let teachers = teachers();
        let linker = FuzzyLinker::new(date(), &teachers).with_rooms(["130"]);
        assert!(linked(&linker.link_line("Raum 1302")).is_empty());
        assert!(linked(&linker.link_line("R130 frei")).is_empty());
        assert_eq!(linked(&linker.link_line("(in 130)")).len(), 1);
        assert_eq!(linked(&linker.link_line("in 130")).len(), 1);
    }

    #[test]
    fn test_teacher_pass_expands_salutations() {
        let teachers = teachers();
        let linker = FuzzyLinker::new(date(), &teachers);
        let segments = linker.link_line("Vertretung durch Hr. Mustermann");
        assert_eq!(
            linked(&segments),
            vec![("Hr. Mustermann", PlanType::Teachers, vec!["MUM"])]
        );
    }

    #[test]
    fn test_salutation_expansion_is_per_token() {
        let teachers = teachers();
        let linker = FuzzyLinker::new(date(), &teachers);
        assert_eq!(linker.expand_salutations("Frau Musterfrau"), "Frau Musterfrau");
        assert_eq!(linker.expand_salutations("Fr. Musterfrau"), "Frau Musterfrau");
        assert_eq!(linker.expand_salutations("Herrn Mustermann"), "Herr Mustermann");
    }

    #[test]
    fn test_teacher_abbreviation_and_common_words() {
        let teachers = Teachers::from(vec![
            Teacher::new("MUS"),
            Teacher::new("Raum").with_long("Herr Raum"),
        ]);
        let linker = FuzzyLinker::new(date(), &teachers);
        let segments = linker.link_line("Raum bei MUS");
        assert_eq!(linked(&segments), vec![("MUS", PlanType::Teachers, vec!["MUS"])]);

        let linker = FuzzyLinker::new(date(), &teachers).with_tagger(&AcceptAll);
        assert_eq!(linked(&linker.link_line("Raum bei MUS")).len(), 2);
    }

    #[test]
    fn test_teacher_never_starts_inside_a_word() {
        let teachers = Teachers::from(vec![Teacher::new("Sax").with_long("Herr Sax")]);
        let linker = FuzzyLinker::new(date(), &teachers);
        assert!(linked(&linker.link_line("Aufgaben stehen im LernSax")).is_empty());

        let linker = FuzzyLinker::new(date(), &teachers).with_tagger(&AcceptAll);
        assert!(linked(&linker.link_line("Aufgaben stehen im LernSax")).is_empty());
        assert_eq!(
            linked(&linker.link_line("Vertretung durch Sax")),
            vec![("Sax", PlanType::Teachers, vec!["Sax"])]
        );
    }

    #[test]
    fn test_form_pass_expands_ranges() {
        let teachers = teachers();
        let forms = ["6/1", "6/2", "10/1"].into_iter().filter_map(ParsedForm::parse);
        let linker = FuzzyLinker::new(date(), &teachers).with_forms(forms);

        let segments = linker.link_line("Klassen 6/1-3 in die Aula");
        assert_eq!(
            linked(&segments),
            vec![("6/1-3", PlanType::Forms, vec!["6/1", "6/2"])]
        );
    }

    #[test]
    fn test_unknown_form_stays_plain() {
        let teachers = teachers();
        let forms = ["6/1"].into_iter().filter_map(ParsedForm::parse);
        let linker = FuzzyLinker::new(date(), &teachers).with_forms(forms);
        assert!(linked(&linker.link_line("Klasse 7/2")).is_empty());
    }

    #[test]
    fn test_linked_segments_survive_later_passes() {
        let teachers = Teachers::from(vec![Teacher::new("1302")]);
        let linker = FuzzyLinker::new(date(), &teachers)
            .with_tagger(&AcceptAll)
            .with_rooms(["1302"]);
        let segments = linker.link_line("in 1302");
        assert_eq!(linked(&segments), vec![("1302", PlanType::Teachers, vec!["1302"])]);
    }

    #[test]
    fn test_scan_handles_multibyte_text() {
        let segments = scan_with_validator("Grüße", &[&*WORD], |_| None);
        assert_eq!(segments.len(), 5);
        assert_eq!(segments_text(&segments), "Grüße");
    }

    #[test]
    fn test_linking_is_deterministic() {
        let teachers = teachers();
        let linker = FuzzyLinker::new(date(), &teachers).with_rooms(["1302", "TH1"]);
        let line = "Frau Musterfrau: Sport in TH1, danach 1302!";
        assert_eq!(linker.link_line(line), linker.link_line(line));
    }
}
