//! Rendering parsed notices into linked text segments
//!
//! A notice renders as a list of [`LinkedTextSegment`]s: plain text, or text that links
//! to another plan view (a form, teacher or room plan on some date and periods). The
//! rendered text is normalized German ("SPO Herr Mustermann fällt aus"); `before` and
//! `after` are carried over verbatim.

use crate::info::blocks::PeriodLabels;
use crate::info::forms::forms_to_str;
use crate::info::lesson::{Period, PlanType};
use crate::info::messages::{CourseInfo, MessageKind, ParsedMessage};
use crate::info::typography::fix_typography;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use std::collections::BTreeSet;

/// Target of a linked segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    #[serde(rename = "type")]
    pub kind: PlanType,
    #[serde(rename = "value")]
    pub values: BTreeSet<String>,
    pub date: Option<NaiveDate>,
    pub periods: Option<BTreeSet<Period>>,
}

impl Link {
    pub fn new(kind: PlanType, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            kind,
            values: values.into_iter().map(Into::into).collect(),
            date: None,
            periods: None,
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn during(mut self, periods: Option<&BTreeSet<Period>>) -> Self {
        self.periods = periods.cloned();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkedTextSegment {
    pub text: String,
    pub link: Option<Link>,
}

impl LinkedTextSegment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link: None,
        }
    }

    pub fn linked(text: impl Into<String>, link: Link) -> Self {
        Self {
            text: text.into(),
            link: Some(link),
        }
    }

    pub fn is_linked(&self) -> bool {
        self.link.is_some()
    }
}

/// Drop empty segments and merge neighbours that carry the same link (or none).
pub fn group_text_segments(
    segments: impl IntoIterator<Item = LinkedTextSegment>,
) -> Vec<LinkedTextSegment> {
    let mut out: Vec<LinkedTextSegment> = Vec::new();
    for segment in segments {
        if segment.text.is_empty() {
            continue;
        }
        match out.last_mut() {
            Some(last) if last.link == segment.link => last.text.push_str(&segment.text),
            _ => out.push(segment),
        }
    }
    out
}

/// Concatenated text of all segments.
pub fn segments_text(segments: &[LinkedTextSegment]) -> String {
    segments.iter().map(|segment| segment.text.as_str()).collect()
}

pub fn de_weekday(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Mo",
        Weekday::Tue => "Di",
        Weekday::Wed => "Mi",
        Weekday::Thu => "Do",
        Weekday::Fri => "Fr",
        Weekday::Sat => "Sa",
        Weekday::Sun => "So",
    }
}

/// "Do (08.06.2023) St.3-4"
fn dated_label(date: NaiveDate, periods: &BTreeSet<Period>, labels: &dyn PeriodLabels) -> String {
    format!(
        "{} ({}) {}",
        de_weekday(date.weekday()),
        date.format("%d.%m.%Y"),
        labels.label_for_periods(periods)
    )
}

impl CourseInfo {
    /// "<course> <other entity>", the other entity linked once resolved.
    fn text_segments(
        &self,
        date: NaiveDate,
        periods: Option<&BTreeSet<Period>>,
    ) -> Vec<LinkedTextSegment> {
        let other_type = self.other_info_type();
        let text = match (other_type, &self.other_info_value) {
            (PlanType::Forms, Some(forms)) => forms_to_str(forms),
            _ => self
                .original_other_info_value()
                .map(|values| values.iter().cloned().collect::<Vec<_>>().join(", "))
                .unwrap_or_default(),
        };

        let link = self
            .other_info_value
            .as_ref()
            .filter(|values| !values.is_empty())
            .map(|values| Link::new(other_type, values.iter().cloned()).on(date).during(periods));

        vec![
            LinkedTextSegment::plain(format!("{} ", self.course)),
            LinkedTextSegment { text, link },
        ]
    }
}

impl ParsedMessage {
    /// Render this notice, `before` and `after` included.
    pub fn to_segments(
        &self,
        lesson_date: NaiveDate,
        labels: &dyn PeriodLabels,
    ) -> Vec<LinkedTextSegment> {
        let mut segments = Vec::new();
        if !self.before.is_empty() {
            segments.push(LinkedTextSegment::plain(fix_typography(&self.before)));
        }
        segments.extend(self.body_segments(lesson_date, labels));
        if !self.after.is_empty() {
            segments.push(LinkedTextSegment::plain(fix_typography(&self.after)));
        }
        segments
    }

    /// Segments of the matched span only.
    pub fn body_segments(
        &self,
        lesson_date: NaiveDate,
        labels: &dyn PeriodLabels,
    ) -> Vec<LinkedTextSegment> {
        match &self.kind {
            MessageKind::InsteadOfCourse { course, periods } => {
                let mut segments = vec![LinkedTextSegment::plain("für ")];
                segments.extend(course.text_segments(lesson_date, Some(periods)));
                segments
            }
            MessageKind::Cancelled { course, periods } => {
                let mut segments = course.text_segments(lesson_date, Some(periods));
                segments.push(LinkedTextSegment::plain(" fällt aus"));
                segments
            }
            MessageKind::MovedFrom {
                plan_type,
                plan_value,
                periods,
                date,
            } => match date {
                None => vec![
                    LinkedTextSegment::plain("verlegt von "),
                    LinkedTextSegment::linked(
                        labels.label_for_periods(periods),
                        Link::new(*plan_type, plan_value.iter().cloned())
                            .on(lesson_date)
                            .during(Some(periods)),
                    ),
                ],
                Some(date) => vec![
                    LinkedTextSegment::plain("statt "),
                    LinkedTextSegment::linked(
                        dated_label(*date, periods, labels),
                        Link::new(*plan_type, plan_value.iter().cloned())
                            .on(*date)
                            .during(Some(periods)),
                    ),
                ],
            },
            MessageKind::MovedTo {
                course,
                date,
                periods,
            } => {
                let target = Link::new(course.plan_type, course.plan_value.iter().cloned())
                    .during(Some(periods));
                match date {
                    None => {
                        let mut segments = course.text_segments(lesson_date, None);
                        segments.push(LinkedTextSegment::plain(" verlegt nach "));
                        segments.push(LinkedTextSegment::linked(
                            labels.label_for_periods(periods),
                            target.on(lesson_date),
                        ));
                        segments
                    }
                    Some(date) => {
                        let verb = if *date < lesson_date {
                            " gehalten am "
                        } else {
                            " verlegt nach "
                        };
                        let mut segments = course.text_segments(*date, Some(periods));
                        segments.push(LinkedTextSegment::plain(verb));
                        segments.push(LinkedTextSegment::linked(
                            dated_label(*date, periods, labels),
                            target.on(*date),
                        ));
                        segments
                    }
                }
            }
            MessageKind::WholeForm { form, periods } => vec![
                LinkedTextSegment::plain("gesamte "),
                LinkedTextSegment::linked(
                    format!("Klasse {form}"),
                    Link::new(PlanType::Forms, [form.as_str()])
                        .on(lesson_date)
                        .during(Some(periods)),
                ),
            ],
            MessageKind::FailedToParse => vec![LinkedTextSegment::plain(fix_typography(
                &self.original_messages.join(", "),
            ))],
            _ => vec![LinkedTextSegment::plain(self.original_messages.join("\n"))],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::blocks::PlanNotation;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 6, day).unwrap()
    }

    #[test]
    fn test_group_text_segments() {
        let link = Link::new(PlanType::Rooms, ["1302"]);
        let grouped = group_text_segments(vec![
            LinkedTextSegment::plain("a"),
            LinkedTextSegment::plain(""),
            LinkedTextSegment::plain("b"),
            LinkedTextSegment::linked("13", link.clone()),
            LinkedTextSegment::linked("02", link.clone()),
            LinkedTextSegment::plain("c"),
        ]);
        assert_eq!(
            grouped,
            vec![
                LinkedTextSegment::plain("ab"),
                LinkedTextSegment::linked("1302", link),
                LinkedTextSegment::plain("c"),
            ]
        );
    }

    #[test]
    fn test_weekday_names() {
        assert_eq!(de_weekday(date(5).weekday()), "Mo");
        assert_eq!(de_weekday(date(8).weekday()), "Do");
        assert_eq!(de_weekday(date(11).weekday()), "So");
    }

    #[test]
    fn test_whole_form_links_form() {
        let message = ParsedMessage {
            kind: MessageKind::WholeForm {
                form: "10/1".to_string(),
                periods: BTreeSet::from([3]),
            },
            before: String::new(),
            after: " in 1302".to_string(),
            original_messages: vec!["gesamte Klasse 10/1".to_string()],
        };

        let segments = message.to_segments(date(5), &PlanNotation);
        assert_eq!(segments_text(&segments), "gesamte Klasse 10/1 in 1302");
        assert_eq!(
            segments[1].link,
            Some(
                Link::new(PlanType::Forms, ["10/1"])
                    .on(date(5))
                    .during(Some(&BTreeSet::from([3])))
            )
        );
    }

    #[test]
    fn test_unresolved_course_is_unlinked() {
        let message = ParsedMessage {
            kind: MessageKind::Cancelled {
                course: CourseInfo::new(
                    "SPO",
                    PlanType::Forms,
                    BTreeSet::from(["10/1".to_string()]),
                    BTreeSet::from(["Herr Unbekannt".to_string()]),
                ),
                periods: BTreeSet::from([3]),
            },
            before: String::new(),
            after: String::new(),
            original_messages: vec!["SPO Herr Unbekannt entfällt".to_string()],
        };

        let segments = message.to_segments(date(5), &PlanNotation);
        assert_eq!(segments_text(&segments), "SPO Herr Unbekannt fällt aus");
        assert!(segments.iter().all(|segment| !segment.is_linked()));
    }

    #[test]
    fn test_failed_message_fixes_typography() {
        let message = ParsedMessage {
            kind: MessageKind::FailedToParse,
            before: String::new(),
            after: String::new(),
            original_messages: vec!["Raum  1302".to_string(), "Material mitbringen".to_string()],
        };
        let segments = message.to_segments(date(5), &PlanNotation);
        assert_eq!(segments_text(&segments), "Raum 1302, Material mitbringen");
    }

    #[test]
    fn test_link_serialization() {
        let link = Link::new(PlanType::Forms, ["10/1"])
            .on(date(8))
            .during(Some(&BTreeSet::from([3, 4])));
        assert_eq!(
            serde_json::to_value(&link).unwrap(),
            serde_json::json!({
                "type": "forms",
                "value": ["10/1"],
                "date": "2023-06-08",
                "periods": [3, 4],
            })
        );
    }
}
