//! Declarative notice grammar
//!
//! A single notice is matched against an ordered list of regex rules. The first rule that
//! matches and builds a [`MessageKind`] wins; text outside the matched span is kept
//! verbatim as `before` / `after`. Rules are data: a name and a pattern, compiled once.
//!
//! Rule order (first match wins):
//! 1. instead_of_course: `für <course> <teachers>` (anchored)
//! 2. moved_from: `verlegt von St.<periods>` (anchored)
//! 3. moved_from_date: `statt <weekday> (<dd.mm.>) St.<periods>` (anchored)
//! 4. held_at: `<course> <teachers> gehalten am <weekday> (<dd.mm.>) St.<periods>` (anchored)
//! 5. moved_to: `<course> <teachers> verlegt nach St.<periods>` (anchored)
//! 6. moved_to_date: `<course> <teachers> verlegt nach <weekday> (<dd.mm.>) St.<periods>` (anchored)
//! 7. cancelled: `<course> <teachers> fällt aus|entfällt` (anchored)
//! 8. exam: `Prüfung <Name>`
//! 9. do_at_location: `bitte <words> bearbeiten`
//! 10. individual_revision: `individuelle Nachbearbeitung des aktuellen Stoffes [in der Bibo]`
//! 11. whole_form: `gesamte Klasse <form>`
//! 12. independent: `selbst.` with an optional one-character annotation
//! 13. tasks_in_lernsax: `Aufgaben stehen im LernSax`
//! 14. tasks_were_given: `Aufgaben wurden erteilt`
//!
//! Rules 8 and later search anywhere in the notice. A rule whose pattern matches but whose
//! captures are unusable (an impossible date) is skipped and the cascade continues.

use crate::info::forms::{parse_periods, FORM_PATTERN};
use crate::info::lesson::{Lesson, PlanType};
use crate::info::messages::{CourseInfo, MessageKind, ParsedMessage};
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::BTreeSet;
use std::ops::Range;

const NAME_ELEMENT: &str = r"(?:[A-ZÄÖÜ]')?[A-ZÄÖÜ][a-zäöüß]+(?:-[A-ZÄÖÜ][a-zäöüß]+)*\.?";
const TEACHER_ABBREVIATION: &str = r"[A-ZÄÖÜ][A-ZÄÖÜa-zäöüß]{2,}";
const COURSE: &str = r"[A-Za-z0-9ÄÖÜäöüß/\-_]{2,8}";
const PERIOD: &str =
    r"St\.(?P<periods>(?P<period_begin>\d{1,2})(?:-(?P<period_end>\d{1,2}))?)";
const WEEKDAY: &str = r"(?:Mo|Di|Mi|Do|Fr|Sa|So)";
const DATE: &str = r"(?:\d{2}\.\d{2}\.)";

/// A teacher written as a name with salutation or titles, e.g. "Frau Dr. Musterfrau".
pub fn teacher_name_pattern() -> String {
    format!(r"(?:{NAME_ELEMENT})(?: ?{NAME_ELEMENT})*(?: van)?(?: {NAME_ELEMENT})")
}

/// A single teacher reference: full name or abbreviation.
pub fn teacher_pattern() -> String {
    format!(
        r"(?:{})|(?:{TEACHER_ABBREVIATION})",
        teacher_name_pattern()
    )
}

fn teachers_pattern() -> String {
    let teacher = teacher_pattern();
    format!(r"(?:{teacher})(?:, ?(?:{teacher}))*")
}

fn lesson_specifier() -> String {
    format!(r"{WEEKDAY} \((?P<date>{DATE})\) {PERIOD}")
}

fn grammar_patterns() -> Vec<(&'static str, String)> {
    let course_teachers = format!(r"^(?P<course>{COURSE}) (?P<teachers>{})", teachers_pattern());
    vec![
        (
            "instead_of_course",
            format!(r"^für (?P<course>{COURSE}) (?P<teachers>{})", teachers_pattern()),
        ),
        ("moved_from", format!(r"^verlegt von {PERIOD}")),
        ("moved_from_date", format!(r"^statt {}", lesson_specifier())),
        (
            "held_at",
            format!(r"{course_teachers} gehalten am {}", lesson_specifier()),
        ),
        ("moved_to", format!(r"{course_teachers} verlegt nach {PERIOD}")),
        (
            "moved_to_date",
            format!(r"{course_teachers} verlegt nach {}", lesson_specifier()),
        ),
        ("cancelled", format!(r"{course_teachers} (?:fällt aus|entfällt)")),
        ("exam", r"Prüfung (?P<last_name>[A-ZÄÖÜ][a-zäöüß]+)".to_string()),
        ("do_at_location", r"bitte(?P<location>(?: \w+)+) bearbeiten".to_string()),
        (
            "individual_revision",
            r"individuelle Nachbearbeitung des aktuellen Stoffes (?P<location>in der Bibo)?"
                .to_string(),
        ),
        ("whole_form", format!(r"gesamte Klasse (?P<form>{FORM_PATTERN})")),
        ("independent", r"selbst\.(?: \(.\))?".to_string()),
        ("tasks_in_lernsax", r"Aufgaben stehen im LernSax".to_string()),
        ("tasks_were_given", r"Aufgaben wurden erteilt".to_string()),
    ]
}

/// One compiled grammar rule.
#[derive(Debug)]
pub struct GrammarRule {
    pub name: &'static str,
    pub regex: Regex,
}

static GRAMMAR: Lazy<Vec<GrammarRule>> = Lazy::new(|| {
    grammar_patterns()
        .into_iter()
        .map(|(name, pattern)| GrammarRule {
            name,
            regex: Regex::new(&pattern).unwrap(),
        })
        .collect()
});

/// Spaces after slashes are dropped ("G/ R/ W" → "G/R/W").
static SLASH_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w)/ ").unwrap());

/// All rules in cascade order.
pub fn rules() -> &'static [GrammarRule] {
    &GRAMMAR
}

/// Look up a single rule by name.
pub fn rule(name: &str) -> Option<&'static GrammarRule> {
    GRAMMAR.iter().find(|rule| rule.name == name)
}

impl GrammarRule {
    /// Try this rule alone against `text`, returning the built kind and the matched span.
    pub fn try_build(&self, text: &str, lesson: &Lesson) -> Option<(MessageKind, Range<usize>)> {
        let caps = self.regex.captures(text)?;
        let span = caps.get(0)?.range();
        let kind = build_kind(self.name, &caps, lesson)?;
        Some((kind, span))
    }
}

/// Normalize a raw notice before matching.
pub fn normalize_message(info: &str) -> String {
    SLASH_SPACE.replace_all(info.trim(), "$1/").into_owned()
}

/// Parse a single notice of a lesson on a plan of the given type.
///
/// Only forms plans carry a grammar; notices on teacher and room plans always fall back to
/// [`MessageKind::FailedToParse`].
pub fn parse_message(info: &str, lesson: &Lesson, plan_type: PlanType) -> ParsedMessage {
    let info = normalize_message(info);

    if plan_type != PlanType::Forms {
        return ParsedMessage::failed(info);
    }

    for rule in rules() {
        if let Some((kind, span)) = rule.try_build(&info, lesson) {
            tracing::trace!(rule = rule.name, message = %info, "grammar rule matched");
            return ParsedMessage::new(kind, &info, span);
        }
    }

    tracing::trace!(message = %info, "no grammar rule matched");
    ParsedMessage::failed(info)
}

fn build_kind(name: &str, caps: &Captures<'_>, lesson: &Lesson) -> Option<MessageKind> {
    let kind = match name {
        "instead_of_course" => MessageKind::InsteadOfCourse {
            course: course_info(caps, lesson),
            periods: lesson.periods.clone(),
        },
        "moved_from" => MessageKind::MovedFrom {
            plan_type: PlanType::Forms,
            plan_value: lesson.forms.clone(),
            periods: parse_periods(&caps["periods"]),
            date: None,
        },
        "moved_from_date" => MessageKind::MovedFrom {
            plan_type: PlanType::Forms,
            plan_value: lesson.forms.clone(),
            periods: parse_periods(&caps["periods"]),
            date: Some(notice_date(&caps["date"], lesson)?),
        },
        "held_at" | "moved_to_date" => MessageKind::MovedTo {
            course: course_info(caps, lesson),
            date: Some(notice_date(&caps["date"], lesson)?),
            periods: parse_periods(&caps["periods"]),
        },
        "moved_to" => MessageKind::MovedTo {
            course: course_info(caps, lesson),
            date: None,
            periods: parse_periods(&caps["periods"]),
        },
        "cancelled" => MessageKind::Cancelled {
            course: course_info(caps, lesson),
            periods: lesson.periods.clone(),
        },
        "exam" => MessageKind::Exam {
            last_name: caps["last_name"].to_string(),
        },
        "do_at_location" => MessageKind::DoAtLocation {
            location: caps["location"].trim().to_string(),
        },
        "individual_revision" => MessageKind::IndividualRevision {
            location: caps.name("location").map(|m| m.as_str().to_string()),
        },
        "whole_form" => MessageKind::WholeForm {
            form: caps["form"].replace(' ', ""),
            periods: lesson.periods.clone(),
        },
        "independent" => MessageKind::DoIndependently,
        "tasks_in_lernsax" => MessageKind::TasksInLernsax,
        "tasks_were_given" => MessageKind::TasksWereGiven,
        _ => return None,
    };
    Some(kind)
}

fn course_info(caps: &Captures<'_>, lesson: &Lesson) -> CourseInfo {
    let teachers: BTreeSet<String> = caps["teachers"]
        .split(',')
        .map(str::trim)
        .filter(|teacher| !teacher.is_empty())
        .map(str::to_string)
        .collect();

    CourseInfo::new(&caps["course"], PlanType::Forms, lesson.forms.clone(), teachers)
}

/// "05.06." on a lesson in 2023 → 2023-06-05.
fn notice_date(day_month: &str, lesson: &Lesson) -> Option<NaiveDate> {
    let text = format!("{day_month}{}", lesson.date.year());
    match NaiveDate::parse_from_str(&text, "%d.%m.%Y") {
        Ok(date) => Some(date),
        Err(err) => {
            tracing::debug!(date = %text, "ignoring impossible notice date: {err}");
            None
        }
    }
}
