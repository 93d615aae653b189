//! Forms (school classes such as "10/1", "5a" or "JG11") and period ranges.
//!
//! A form is split into a major part (grade, or a letter code such as "JG"), an optional
//! separator and a minor part (section). Notices mention forms loosely ("6/1-3",
//! "10/1,2", "5 / 2"), so the fuzzy linker uses a looser grammar than the one used for
//! exact plan values and expands every mention into the forms it denotes.

use crate::info::lesson::Period;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::BTreeSet;

/// Strict form grammar used inside structured notices ("gesamte Klasse 6/2").
pub const FORM_PATTERN: &str =
    r"(?:\d{1,2}(?: ?[/.] ?(?:\d{1,2}|[a-zA-Z])|[a-z])?|[A-ZÄÖÜ]{2,3} ?\d{0,2})";

const MINOR: &str = r"(?:\d{1,2}|[a-zA-Z])";

/// Loose form grammar for free text, accepting lists and ranges of sections.
///
/// Graded forms ("6/1-3", "5a") and letter-coded forms with an optional grade ("JG11",
/// "JG 11") are separate alternatives so that a number never continues a graded major.
pub static LOOSE_FORM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:(?P<major>\d{{1,2}})(?:(?P<sep> ?[/.] ?)(?P<minors>{MINOR}(?:[-,]{MINOR})*)|(?P<letters>[a-z](?:-[a-z])?))?|(?P<code>[A-ZÄÖÜ]{{2,3}})(?: ?(?P<grade>\d{{1,2}}))?)\b"
    ))
    .unwrap()
});

static FORM_PARTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<major>\d+|[^\d/. ]+) ?(?P<sep>[/.]?) ?(?P<minor>.*)$").unwrap()
});

/// A single form split into its parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedForm {
    pub major: String,
    pub separator: String,
    pub minor: String,
}

impl ParsedForm {
    pub fn new(
        major: impl Into<String>,
        separator: impl Into<String>,
        minor: impl Into<String>,
    ) -> Self {
        Self {
            major: major.into(),
            separator: separator.into(),
            minor: minor.into(),
        }
    }

    /// Split a plan form value. Returns `None` for empty or whitespace-only input.
    pub fn parse(form: &str) -> Option<Self> {
        let caps = FORM_PARTS.captures(form.trim())?;
        Some(Self::new(&caps["major"], &caps["sep"], caps["minor"].trim()))
    }

    /// Forms whose major part is a letter code rather than a grade.
    pub fn is_alpha(&self) -> bool {
        !self.major.chars().all(|c| c.is_ascii_digit())
    }

    fn major_number(&self) -> Option<u32> {
        self.major.parse().ok()
    }

    /// Whether this (mentioned) form denotes the `existing` plan form.
    ///
    /// Letter-coded forms compare by major part only; graded forms compare the grade
    /// numerically and the section literally.
    pub fn denotes(&self, existing: &ParsedForm) -> bool {
        match (self.is_alpha(), existing.is_alpha()) {
            (true, true) => self.major == existing.major,
            (false, false) => {
                self.major_number() == existing.major_number() && self.minor == existing.minor
            }
            _ => false,
        }
    }

    pub fn to_form_string(&self) -> String {
        format!("{}{}{}", self.major, self.separator, self.minor)
    }

    fn sort_key(&self) -> (bool, u32, String, u32, String) {
        (
            self.is_alpha(),
            self.major_number().unwrap_or(u32::MAX),
            self.major.clone(),
            self.minor.parse().unwrap_or(u32::MAX),
            self.minor.clone(),
        )
    }
}

/// A loose mention of one or more forms in free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormMention {
    pub major: String,
    pub separator: String,
    /// Comma separated items, each a single section or a `a-b` range.
    pub minors: Vec<String>,
}

impl FormMention {
    pub fn from_captures(caps: &Captures<'_>) -> Self {
        let major = caps
            .name("major")
            .or_else(|| caps.name("code"))
            .map_or_else(String::new, |m| m.as_str().to_string());
        if let Some(minors) = caps.name("minors") {
            Self {
                major,
                separator: caps["sep"].trim().to_string(),
                minors: minors.as_str().split(',').map(str::to_string).collect(),
            }
        } else if let Some(section) = caps.name("letters").or_else(|| caps.name("grade")) {
            Self {
                major,
                separator: String::new(),
                minors: vec![section.as_str().to_string()],
            }
        } else {
            Self {
                major,
                separator: String::new(),
                minors: Vec::new(),
            }
        }
    }

    /// All forms the mention denotes, ranges expanded.
    pub fn expand(&self) -> Vec<ParsedForm> {
        if self.minors.is_empty() {
            return vec![ParsedForm::new(&self.major, "", "")];
        }

        self.minors
            .iter()
            .flat_map(|item| expand_minor_range(item))
            .map(|minor| ParsedForm::new(&self.major, &self.separator, minor))
            .collect()
    }
}

fn expand_minor_range(item: &str) -> Vec<String> {
    let Some((begin, end)) = item.split_once('-') else {
        return vec![item.to_string()];
    };

    if let (Ok(begin), Ok(end)) = (begin.parse::<u32>(), end.parse::<u32>()) {
        return (begin.min(end)..=begin.max(end)).map(|n| n.to_string()).collect();
    }

    let mut begin_chars = begin.chars();
    let mut end_chars = end.chars();
    match (
        begin_chars.next(),
        begin_chars.next(),
        end_chars.next(),
        end_chars.next(),
    ) {
        (Some(b), None, Some(e), None) if b.is_ascii_alphabetic() && e.is_ascii_alphabetic() => {
            (b.min(e)..=b.max(e)).map(|c| c.to_string()).collect()
        }
        _ => vec![begin.to_string(), end.to_string()],
    }
}

/// Compact display of parsed forms: sections of the same grade are joined ("10/1,2, 9/3"
/// becomes "9/3, 10/1,2" after sorting).
pub fn parsed_forms_to_str(forms: &[ParsedForm]) -> String {
    let mut sorted: Vec<&ParsedForm> = forms.iter().collect();
    sorted.sort_by_key(|form| form.sort_key());
    sorted.dedup();

    let mut groups: Vec<(String, Vec<&str>)> = Vec::new();
    for form in sorted {
        let prefix = format!("{}{}", form.major, form.separator);
        match groups.last_mut() {
            Some((last_prefix, minors)) if *last_prefix == prefix && !form.minor.is_empty() => {
                minors.push(&form.minor);
            }
            _ => groups.push((prefix, vec![&form.minor])),
        }
    }

    groups
        .into_iter()
        .map(|(prefix, minors)| format!("{prefix}{}", minors.join(",")))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Compact display of plan form values.
pub fn forms_to_str<'a>(forms: impl IntoIterator<Item = &'a String>) -> String {
    let mut unparsed = Vec::new();
    let mut parsed = Vec::new();
    for form in forms {
        match ParsedForm::parse(form) {
            Some(parsed_form) => parsed.push(parsed_form),
            None => unparsed.push(form.as_str()),
        }
    }

    let mut out = parsed_forms_to_str(&parsed);
    for form in unparsed.into_iter().filter(|f| !f.trim().is_empty()) {
        if !out.is_empty() {
            out.push_str(", ");
        }
        out.push_str(form);
    }
    out
}

/// Expand "3" or "3-4" into the set of periods it names.
pub fn parse_periods(text: &str) -> BTreeSet<Period> {
    let (begin, end) = text.split_once('-').unwrap_or((text, text));
    match (begin.trim().parse::<Period>(), end.trim().parse::<Period>()) {
        (Ok(begin), Ok(end)) => (begin.min(end)..=begin.max(end)).collect(),
        (Ok(begin), Err(_)) => BTreeSet::from([begin]),
        _ => BTreeSet::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mention(text: &str) -> FormMention {
        let caps = LOOSE_FORM.captures(text).expect("form mention");
        FormMention::from_captures(&caps)
    }

    #[test]
    fn test_parse_form_parts() {
        assert_eq!(ParsedForm::parse("10/1"), Some(ParsedForm::new("10", "/", "1")));
        assert_eq!(ParsedForm::parse("5a"), Some(ParsedForm::new("5", "", "a")));
        assert_eq!(ParsedForm::parse("JG11"), Some(ParsedForm::new("JG", "", "11")));
        assert_eq!(ParsedForm::parse("11"), Some(ParsedForm::new("11", "", "")));
        assert_eq!(ParsedForm::parse(""), None);
    }

    #[test]
    fn test_expand_ranges_and_lists() {
        let forms: Vec<String> = mention("6/1-3")
            .expand()
            .iter()
            .map(ParsedForm::to_form_string)
            .collect();
        assert_eq!(forms, vec!["6/1", "6/2", "6/3"]);

        let forms: Vec<String> = mention("10/1,2")
            .expand()
            .iter()
            .map(ParsedForm::to_form_string)
            .collect();
        assert_eq!(forms, vec!["10/1", "10/2"]);

        let forms: Vec<String> = mention("5a-c")
            .expand()
            .iter()
            .map(ParsedForm::to_form_string)
            .collect();
        assert_eq!(forms, vec!["5a", "5b", "5c"]);
    }

    #[test]
    fn test_loose_form_ignores_room_numbers() {
        assert!(LOOSE_FORM.find("1302").is_none());
    }

    #[test]
    fn test_letter_coded_form_takes_a_grade() {
        let joined = mention("JG11");
        assert_eq!(joined.major, "JG");
        assert_eq!(joined.minors, vec!["11"]);
        assert_eq!(joined.expand(), vec![ParsedForm::new("JG", "", "11")]);

        let spaced = mention("JG 11: Klausur");
        assert_eq!(spaced.major, "JG");
        assert_eq!(spaced.minors, vec!["11"]);

        assert_eq!(mention("JG").minors, Vec::<String>::new());
        assert_eq!(LOOSE_FORM.find("JG11").map(|m| m.as_str()), Some("JG11"));
    }

    #[test]
    fn test_denotes_compares_grades_numerically() {
        let existing = ParsedForm::parse("6/2").unwrap();
        assert!(ParsedForm::new("06", "/", "2").denotes(&existing));
        assert!(!ParsedForm::new("6", "/", "3").denotes(&existing));
        assert!(!ParsedForm::new("JG", "", "").denotes(&existing));
        assert!(ParsedForm::new("JG", "", "").denotes(&ParsedForm::parse("JG11").unwrap()));
    }

    #[test]
    fn test_forms_to_str() {
        let forms = BTreeSet::from(["10/1".to_string(), "10/2".to_string(), "9/3".to_string()]);
        assert_eq!(forms_to_str(&forms), "9/3, 10/1,2");
        assert_eq!(forms_to_str(&BTreeSet::new()), "");
    }

    #[test]
    fn test_parse_periods() {
        assert_eq!(parse_periods("3"), BTreeSet::from([3]));
        assert_eq!(parse_periods("3-5"), BTreeSet::from([3, 4, 5]));
        assert_eq!(parse_periods("x"), BTreeSet::new());
    }
}
