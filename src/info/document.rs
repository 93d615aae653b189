//! Parsed info cells
//!
//! An info cell parses into a [`ParsedLessonInfo`]: paragraphs (split at `;`) of messages
//! (split at `,`), both bracket-aware. Consecutive fallback messages of a paragraph are
//! merged into one, so a sentence the grammar does not know stays together even when it
//! contains commas.
//!
//! Every paragraph and message remembers its position in the cell. Canonical sorting
//! orders by original text only, which makes notices from different data sources line up
//! for grouping; `sort_original` restores the order of the cell.

use crate::info::blocks::PeriodLabels;
use crate::info::fuzzy::FuzzyLinker;
use crate::info::grammar::parse_message;
use crate::info::lesson::{Lesson, PlanType};
use crate::info::messages::{MessageKind, ParsedMessage};
use crate::info::render::{segments_text, LinkedTextSegment};
use crate::info::segmenter::{
    split_bracket_aware, BracketPairs, MESSAGE_SEPARATOR, PARAGRAPH_SEPARATOR,
};
use crate::info::teachers::TeacherDirectory;
use crate::info::typography::fix_typography;
use chrono::NaiveDate;
use serde::Serialize;
use std::ops::Add;

/// One message of a paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub parsed: ParsedMessage,
    /// Position within the paragraph as written.
    pub index: usize,
}

/// Wire form of a message: the parsed kind (`null` for fallback text) and its rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SerializedMessage<'a> {
    pub parsed: Option<&'a MessageKind>,
    pub text_segments: Vec<LinkedTextSegment>,
}

impl Message {
    pub fn parse(text: &str, lesson: &Lesson, index: usize, plan_type: PlanType) -> Self {
        Self {
            parsed: parse_message(text, lesson, plan_type),
            index,
        }
    }

    /// Render the message; with a linker, free text is annotated with entity links.
    ///
    /// Free text is `before`, `after` and the body of fallback messages; it is
    /// typography-normalized before linking. Structured segments are never touched by the
    /// linker.
    pub fn text_segments(
        &self,
        lesson_date: NaiveDate,
        labels: &dyn PeriodLabels,
        linker: Option<&FuzzyLinker<'_>>,
    ) -> Vec<LinkedTextSegment> {
        let Some(linker) = linker else {
            return self.parsed.to_segments(lesson_date, labels);
        };

        let before = fix_typography(&self.parsed.before);
        let after = fix_typography(&self.parsed.after);
        let body = self.parsed.body_segments(lesson_date, labels);
        let context = format!("{before}{}{after}", segments_text(&body));

        let mut segments = Vec::new();
        if !before.is_empty() {
            segments.extend(linker.link_segments(vec![LinkedTextSegment::plain(before)], &context));
        }
        if self.parsed.kind.is_failed() {
            segments.extend(linker.link_segments(body, &context));
        } else {
            segments.extend(body);
        }
        if !after.is_empty() {
            segments.extend(linker.link_segments(vec![LinkedTextSegment::plain(after)], &context));
        }
        segments
    }

    pub fn serialize(
        &self,
        lesson_date: NaiveDate,
        labels: &dyn PeriodLabels,
        linker: Option<&FuzzyLinker<'_>>,
    ) -> SerializedMessage<'_> {
        SerializedMessage {
            parsed: (!self.parsed.kind.is_failed()).then_some(&self.parsed.kind),
            text_segments: self.text_segments(lesson_date, labels, linker),
        }
    }

    fn canonical_key(&self) -> &[String] {
        &self.parsed.original_messages
    }
}

/// Messages of one `;`-separated part of an info cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub messages: Vec<Message>,
    pub index: usize,
}

impl Paragraph {
    pub fn parse(
        text: &str,
        lesson: &Lesson,
        index: usize,
        plan_type: PlanType,
        brackets: &BracketPairs,
    ) -> Self {
        let mut messages: Vec<Message> = Vec::new();

        for (i, piece) in split_bracket_aware(text, MESSAGE_SEPARATOR, brackets)
            .into_iter()
            .enumerate()
        {
            let piece = piece.trim();
            if piece.is_empty() {
                continue;
            }

            let message = Message::parse(piece, lesson, i, plan_type);
            match messages.last_mut() {
                Some(last) if last.parsed.kind.is_failed() && message.parsed.kind.is_failed() => {
                    last.parsed
                        .original_messages
                        .extend(message.parsed.original_messages);
                }
                _ => messages.push(message),
            }
        }

        Self { messages, index }
    }

    pub fn serialize(
        &self,
        lesson_date: NaiveDate,
        labels: &dyn PeriodLabels,
        linker: Option<&FuzzyLinker<'_>>,
    ) -> Vec<SerializedMessage<'_>> {
        self.messages
            .iter()
            .map(|message| message.serialize(lesson_date, labels, linker))
            .collect()
    }

    pub fn sorted_by<K: Ord>(&self, key: impl FnMut(&Message) -> K) -> Paragraph {
        let mut out = self.clone();
        out.sort_by(key);
        out
    }

    pub fn sort_by<K: Ord>(&mut self, key: impl FnMut(&Message) -> K) {
        self.messages.sort_by_key(key);
    }

    fn canonical_key(&self) -> Vec<Vec<String>> {
        self.messages
            .iter()
            .map(|message| message.canonical_key().to_vec())
            .collect()
    }
}

/// A fully parsed info cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLessonInfo {
    pub paragraphs: Vec<Paragraph>,
}

impl ParsedLessonInfo {
    pub fn new(paragraphs: Vec<Paragraph>) -> Self {
        Self { paragraphs }
    }

    /// Parse with the default bracket pairs.
    pub fn parse(info: &str, lesson: &Lesson, plan_type: PlanType) -> Self {
        Self::parse_with(info, lesson, plan_type, &BracketPairs::default())
    }

    pub fn parse_with(
        info: &str,
        lesson: &Lesson,
        plan_type: PlanType,
        brackets: &BracketPairs,
    ) -> Self {
        let paragraphs = split_bracket_aware(info, PARAGRAPH_SEPARATOR, brackets)
            .into_iter()
            .enumerate()
            .filter(|(_, paragraph)| !paragraph.trim().is_empty())
            .map(|(i, paragraph)| Paragraph::parse(paragraph.trim(), lesson, i, plan_type, brackets))
            .collect();
        Self { paragraphs }
    }

    /// Parse the lesson's own info cell.
    pub fn from_lesson(lesson: &Lesson, plan_type: PlanType) -> Self {
        Self::parse(&lesson.info, lesson, plan_type)
    }

    /// Wrap text that must not be interpreted, e.g. a notice generated by the application.
    pub fn literal(text: impl Into<String>) -> Self {
        Self::new(vec![Paragraph {
            messages: vec![Message {
                parsed: ParsedMessage::failed(text),
                index: 0,
            }],
            index: 0,
        }])
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.iter().all(|p| p.messages.is_empty())
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.paragraphs.iter().flat_map(|p| p.messages.iter())
    }

    pub fn messages_mut(&mut self) -> impl Iterator<Item = &mut Message> {
        self.paragraphs.iter_mut().flat_map(|p| p.messages.iter_mut())
    }

    pub fn serialize(
        &self,
        lesson_date: NaiveDate,
        labels: &dyn PeriodLabels,
        linker: Option<&FuzzyLinker<'_>>,
    ) -> Vec<Vec<SerializedMessage<'_>>> {
        self.paragraphs
            .iter()
            .map(|paragraph| paragraph.serialize(lesson_date, labels, linker))
            .collect()
    }

    pub fn sorted_by<K: Ord>(&self, key: impl FnMut(&Paragraph) -> K) -> ParsedLessonInfo {
        let mut out = self.clone();
        out.sort_by(key);
        out
    }

    pub fn sort_by<K: Ord>(&mut self, key: impl FnMut(&Paragraph) -> K) {
        self.paragraphs.sort_by_key(key);
    }

    /// Restore the order paragraphs and messages had in the info cell.
    pub fn sort_original(&mut self) {
        self.sort_by(|p| p.index);
        for paragraph in &mut self.paragraphs {
            paragraph.sort_by(|m| m.index);
        }
    }

    /// Order messages and paragraphs by their original text.
    pub fn sorted_canonical(&self) -> ParsedLessonInfo {
        let paragraphs = self
            .paragraphs
            .iter()
            .map(|p| p.sorted_by(|m| m.canonical_key().to_vec()))
            .collect();
        ParsedLessonInfo::new(paragraphs).sorted_by(Paragraph::canonical_key)
    }

    /// Key under which lessons with the same notices group together.
    pub fn lesson_group_sort_key(&self) -> Vec<Vec<Vec<String>>> {
        self.sorted_canonical()
            .paragraphs
            .iter()
            .map(Paragraph::canonical_key)
            .collect()
    }

    /// Keep messages matching `predicate`; paragraphs left empty are dropped.
    pub fn filter_messages(&self, mut predicate: impl FnMut(&Message) -> bool) -> ParsedLessonInfo {
        let paragraphs = self
            .paragraphs
            .iter()
            .filter_map(|paragraph| {
                let messages: Vec<Message> = paragraph
                    .messages
                    .iter()
                    .filter(|m| predicate(m))
                    .cloned()
                    .collect();
                (!messages.is_empty()).then_some(Paragraph {
                    messages,
                    index: paragraph.index,
                })
            })
            .collect();
        ParsedLessonInfo::new(paragraphs)
    }

    /// Resolve teacher references of all course-bearing messages.
    pub fn resolve_teachers(&mut self, directory: &dyn TeacherDirectory, date: Option<NaiveDate>) {
        for message in self.messages_mut() {
            if let Some(course) = message.parsed.kind.course_info_mut() {
                course.resolve_teachers(directory, date);
            }
        }
    }

    /// Merge the notices of two lessons that are otherwise identical.
    ///
    /// Both infos are compared in canonical order. Moved notices that are groupable merge
    /// their periods; every other pair must have the same original text. Returns `None`
    /// as soon as a pair does not fit or the structure differs.
    pub fn group_with(&self, other: &ParsedLessonInfo) -> Option<ParsedLessonInfo> {
        let ours = self.sorted_canonical();
        let theirs = other.sorted_canonical();
        if ours.paragraphs.len() != theirs.paragraphs.len() {
            return None;
        }

        let mut paragraphs = Vec::with_capacity(ours.paragraphs.len());
        for (p1, p2) in ours.paragraphs.iter().zip(&theirs.paragraphs) {
            if p1.messages.len() != p2.messages.len() {
                return None;
            }

            let mut messages = Vec::with_capacity(p1.messages.len());
            for (m1, m2) in p1.messages.iter().zip(&p2.messages) {
                if m1.parsed.kind.name() != m2.parsed.kind.name() {
                    return None;
                }

                let mut merged = m1.clone();
                if m1.parsed.kind.is_moved() {
                    if !m1.parsed.is_groupable(&m2.parsed) {
                        return None;
                    }
                    merged.parsed.absorb(&m2.parsed);
                } else if m1.canonical_key() != m2.canonical_key() {
                    return None;
                }
                messages.push(merged);
            }

            paragraphs.push(Paragraph {
                messages,
                index: p1.index,
            });
        }

        let mut out = ParsedLessonInfo::new(paragraphs);
        out.sort_original();
        Some(out)
    }
}

impl Add for ParsedLessonInfo {
    type Output = ParsedLessonInfo;

    fn add(mut self, other: ParsedLessonInfo) -> ParsedLessonInfo {
        self.paragraphs.extend(other.paragraphs);
        self
    }
}
