//! Test fixtures
//!
//! Small, fixed directories and lessons shared by unit and integration tests. All
//! fixtures live on Monday, 2023-06-05.

use crate::info::forms::ParsedForm;
use crate::info::lesson::{Class, Classes, Lesson, Period};
use crate::info::render::LinkedTextSegment;
use crate::info::teachers::{Teacher, Teachers};
use chrono::NaiveDate;
use std::collections::BTreeSet;

pub fn lesson_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 6, 5).expect("valid fixture date")
}

/// A scheduled lesson of the given forms and periods on [`lesson_date`].
pub fn form_lesson<'a>(
    forms: impl IntoIterator<Item = &'a str>,
    periods: impl IntoIterator<Item = Period>,
) -> Lesson {
    Lesson::new(lesson_date(), forms, periods)
}

pub fn sample_teachers() -> Teachers {
    Teachers::from(vec![
        Teacher::new("MUS").with_long("Frau Musterfrau"),
        Teacher::new("MUM").with_long("Herr Mustermann"),
        Teacher::new("BSP").with_long("Herr Beispiel"),
    ])
}

pub fn sample_forms() -> Vec<ParsedForm> {
    ["5a", "6/1", "6/2", "6/3", "10/1", "10/2", "JG11"]
        .into_iter()
        .filter_map(ParsedForm::parse)
        .collect()
}

pub fn sample_rooms() -> BTreeSet<String> {
    ["1302", "1306", "TH1"].into_iter().map(str::to_string).collect()
}

pub fn sample_classes() -> Classes {
    let class = |subject: &str, forms: &[&str], teacher: &str| Class {
        subject: subject.to_string(),
        group: None,
        forms: forms.iter().map(|form| form.to_string()).collect(),
        teacher: teacher.to_string(),
    };

    Classes::from([
        ("101".to_string(), class("MA", &["10/1"], "MUS")),
        ("102".to_string(), class("SPO", &["10/1", "10/2"], "MUM")),
        ("103".to_string(), class("DE", &["10/1"], "NEU")),
        ("104".to_string(), class("DE", &["10/1"], "BSP")),
    ])
}

/// Compact rendering for assertions: linked text as `[text](type:values)`.
pub fn mark_links(segments: &[LinkedTextSegment]) -> String {
    segments
        .iter()
        .map(|segment| match &segment.link {
            Some(link) => format!(
                "[{}]({}:{})",
                segment.text,
                link.kind,
                link.values.iter().cloned().collect::<Vec<_>>().join(",")
            ),
            None => segment.text.clone(),
        })
        .collect()
}
