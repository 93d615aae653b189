//! Typed lesson notices
//!
//! Every notice parses into one [`MessageKind`], wrapped in a [`ParsedMessage`] that keeps
//! the verbatim text around the matched grammar span (`before` / `after`) and the matched
//! text itself (`original_messages`). The original text is what canonical grouping and
//! sorting use; resolved data (teacher abbreviations) never leaks into those keys.
//!
//! Course-bearing kinds keep two teacher sets apart: `teachers` is what the notice says
//! ("Frau Musterfrau"), `other_info_value` is the canonical abbreviation set once a
//! directory resolved it. Resolution can fail, so `other_info_value` is optional.

use crate::info::lesson::{Period, PlanType};
use crate::info::teachers::TeacherDirectory;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use std::mem;

/// Course, plan context and teacher references shared by course-bearing notices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseInfo {
    pub course: String,
    pub plan_type: PlanType,
    pub plan_value: BTreeSet<String>,
    /// Canonical values of the other entity (teacher abbreviations on a forms plan).
    /// `None` while unresolved or after resolution failed.
    pub other_info_value: Option<BTreeSet<String>>,
    /// Teacher references as written in the notice.
    #[serde(rename = "_teachers")]
    pub teachers: Option<BTreeSet<String>>,
}

impl CourseInfo {
    pub fn new(
        course: impl Into<String>,
        plan_type: PlanType,
        plan_value: BTreeSet<String>,
        teachers: BTreeSet<String>,
    ) -> Self {
        Self {
            course: course.into(),
            plan_type,
            plan_value,
            other_info_value: None,
            teachers: Some(teachers),
        }
    }

    pub fn other_info_type(&self) -> PlanType {
        self.plan_type.other_info_type()
    }

    /// The other entity as the notice wrote it, falling back to the resolved values.
    pub fn original_other_info_value(&self) -> Option<&BTreeSet<String>> {
        match &self.teachers {
            Some(teachers) if !teachers.is_empty() => Some(teachers),
            _ => self.other_info_value.as_ref(),
        }
    }

    /// Resolve the raw teacher references; any miss leaves the whole set unresolved.
    pub fn resolve_teachers(&mut self, directory: &dyn TeacherDirectory, date: Option<NaiveDate>) {
        let Some(teachers) = &self.teachers else {
            return;
        };

        let resolved: Result<BTreeSet<String>, _> = teachers
            .iter()
            .map(|reference| {
                directory
                    .query(reference, date)
                    .map(|teacher| teacher.plan_short.clone())
            })
            .collect();

        self.other_info_value = match resolved {
            Ok(values) => Some(values),
            Err(err) => {
                tracing::debug!(course = %self.course, "{err}");
                None
            }
        };
    }

    /// Key compared when grouping: resolved values when known, raw references otherwise.
    fn group_key(&self) -> (&str, PlanType, Option<&BTreeSet<String>>, Option<&BTreeSet<String>>) {
        let unresolved = match self.other_info_value {
            Some(_) => None,
            None => self.teachers.as_ref(),
        };
        (
            &self.course,
            self.plan_type,
            self.other_info_value.as_ref(),
            unresolved,
        )
    }
}

/// The closed set of notice kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum MessageKind {
    /// "für MA Frau Musterfrau": this slot covers another course.
    InsteadOfCourse {
        #[serde(flatten)]
        course: CourseInfo,
        periods: BTreeSet<Period>,
    },
    /// This slot was vacated because its lesson moved here from elsewhere.
    /// `date` is `None` for a move within the same day ("verlegt von"), else the day the
    /// lesson originally belonged to ("statt").
    MovedFrom {
        plan_type: PlanType,
        plan_value: BTreeSet<String>,
        periods: BTreeSet<Period>,
        date: Option<NaiveDate>,
    },
    /// This lesson moved elsewhere. `date` is `None` for a same-day move; a date before the
    /// lesson means it was already held ("gehalten am").
    MovedTo {
        #[serde(flatten)]
        course: CourseInfo,
        date: Option<NaiveDate>,
        periods: BTreeSet<Period>,
    },
    Cancelled {
        #[serde(flatten)]
        course: CourseInfo,
        periods: BTreeSet<Period>,
    },
    DoIndependently,
    TasksInLernsax,
    TasksWereGiven,
    DoAtLocation {
        location: String,
    },
    IndividualRevision {
        location: Option<String>,
    },
    Exam {
        last_name: String,
    },
    /// The notice applies to the entire form, not only the queried group.
    WholeForm {
        form: String,
        periods: BTreeSet<Period>,
    },
    FailedToParse,
}

impl MessageKind {
    pub fn name(&self) -> &'static str {
        match self {
            MessageKind::InsteadOfCourse { .. } => "InsteadOfCourse",
            MessageKind::MovedFrom { .. } => "MovedFrom",
            MessageKind::MovedTo { .. } => "MovedTo",
            MessageKind::Cancelled { .. } => "Cancelled",
            MessageKind::DoIndependently => "DoIndependently",
            MessageKind::TasksInLernsax => "TasksInLernsax",
            MessageKind::TasksWereGiven => "TasksWereGiven",
            MessageKind::DoAtLocation { .. } => "DoAtLocation",
            MessageKind::IndividualRevision { .. } => "IndividualRevision",
            MessageKind::Exam { .. } => "Exam",
            MessageKind::WholeForm { .. } => "WholeForm",
            MessageKind::FailedToParse => "FailedToParse",
        }
    }

    pub fn course_info(&self) -> Option<&CourseInfo> {
        match self {
            MessageKind::InsteadOfCourse { course, .. }
            | MessageKind::MovedTo { course, .. }
            | MessageKind::Cancelled { course, .. } => Some(course),
            _ => None,
        }
    }

    pub fn course_info_mut(&mut self) -> Option<&mut CourseInfo> {
        match self {
            MessageKind::InsteadOfCourse { course, .. }
            | MessageKind::MovedTo { course, .. }
            | MessageKind::Cancelled { course, .. } => Some(course),
            _ => None,
        }
    }

    /// Whether notices of this kind may be merged across lessons by uniting periods.
    pub fn is_moved(&self) -> bool {
        matches!(self, MessageKind::MovedFrom { .. } | MessageKind::MovedTo { .. })
    }

    pub fn periods(&self) -> Option<&BTreeSet<Period>> {
        match self {
            MessageKind::InsteadOfCourse { periods, .. }
            | MessageKind::MovedFrom { periods, .. }
            | MessageKind::MovedTo { periods, .. }
            | MessageKind::Cancelled { periods, .. }
            | MessageKind::WholeForm { periods, .. } => Some(periods),
            _ => None,
        }
    }

    pub fn periods_mut(&mut self) -> Option<&mut BTreeSet<Period>> {
        match self {
            MessageKind::InsteadOfCourse { periods, .. }
            | MessageKind::MovedFrom { periods, .. }
            | MessageKind::MovedTo { periods, .. }
            | MessageKind::Cancelled { periods, .. }
            | MessageKind::WholeForm { periods, .. } => Some(periods),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, MessageKind::FailedToParse)
    }
}

/// One parsed notice plus the verbatim text around the matched span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMessage {
    pub kind: MessageKind,
    pub before: String,
    pub after: String,
    /// The matched text; for merged fallback messages one entry per merged fragment.
    pub original_messages: Vec<String>,
}

impl ParsedMessage {
    pub fn new(kind: MessageKind, text: &str, span: std::ops::Range<usize>) -> Self {
        Self {
            kind,
            before: text[..span.start].to_string(),
            after: text[span.end..].to_string(),
            original_messages: vec![text[span].to_string()],
        }
    }

    /// Fallback for text no grammar rule matched.
    pub fn failed(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::FailedToParse,
            before: String::new(),
            after: String::new(),
            original_messages: vec![text.into()],
        }
    }

    /// Whether `other` is the same notice, as received from another data source.
    ///
    /// Requires the same kind and the same surrounding text. Course-bearing kinds also
    /// compare course, plan type and the resolved teachers (raw references while
    /// unresolved); moved kinds compare their date. Periods never take part, they are
    /// what grouping unites. Fallback messages only group with identical text.
    pub fn is_groupable(&self, other: &ParsedMessage) -> bool {
        if mem::discriminant(&self.kind) != mem::discriminant(&other.kind)
            || self.before != other.before
            || self.after != other.after
        {
            return false;
        }

        match (&self.kind, &other.kind) {
            (
                MessageKind::MovedFrom {
                    plan_type, date, ..
                },
                MessageKind::MovedFrom {
                    plan_type: other_plan_type,
                    date: other_date,
                    ..
                },
            ) => plan_type == other_plan_type && date == other_date,
            (
                MessageKind::MovedTo { course, date, .. },
                MessageKind::MovedTo {
                    course: other_course,
                    date: other_date,
                    ..
                },
            ) => course.group_key() == other_course.group_key() && date == other_date,
            (
                MessageKind::InsteadOfCourse { course, .. },
                MessageKind::InsteadOfCourse {
                    course: other_course,
                    ..
                },
            )
            | (
                MessageKind::Cancelled { course, .. },
                MessageKind::Cancelled {
                    course: other_course,
                    ..
                },
            ) => course.group_key() == other_course.group_key(),
            (
                MessageKind::WholeForm { form, .. },
                MessageKind::WholeForm {
                    form: other_form, ..
                },
            ) => form == other_form,
            (MessageKind::FailedToParse, MessageKind::FailedToParse) => {
                self.original_messages == other.original_messages
            }
            (kind, other_kind) => kind == other_kind,
        }
    }

    /// Fold another groupable moved notice into this one.
    pub fn absorb(&mut self, other: &ParsedMessage) {
        if let (Some(periods), Some(other_periods)) = (self.kind.periods_mut(), other.kind.periods())
        {
            periods.extend(other_periods.iter().copied());
        }
        self.original_messages
            .extend(other.original_messages.iter().cloned());
    }
}
