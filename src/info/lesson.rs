//! Inputs consumed from the plan decoder.
//!
//! Lessons arrive fully decoded (forms, periods, teachers, date). Parsing only reads
//! them; nothing here is mutated by the engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A numbered lesson slot within a school day.
pub type Period = i32;

/// The axis a plan view is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    Forms,
    Teachers,
    Rooms,
}

impl PlanType {
    /// The entity kind shown next to a course on a plan of this type.
    ///
    /// A forms plan names the teacher of a course, teacher and room plans name the form.
    pub fn other_info_type(self) -> PlanType {
        match self {
            PlanType::Forms => PlanType::Teachers,
            PlanType::Teachers | PlanType::Rooms => PlanType::Forms,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlanType::Forms => "forms",
            PlanType::Teachers => "teachers",
            PlanType::Rooms => "rooms",
        }
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lesson of a plan as seen by the notice parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub forms: BTreeSet<String>,
    pub periods: BTreeSet<Period>,
    #[serde(default)]
    pub teachers: Option<BTreeSet<String>>,
    /// `true` when the lesson is part of the regular timetable, `false` for lessons that
    /// only exist on the substitution plan.
    #[serde(default = "scheduled_by_default")]
    pub is_scheduled: bool,
    pub date: NaiveDate,
    /// Identifier of the class (course group) this lesson belongs to.
    #[serde(default)]
    pub class_number: Option<String>,
    /// Raw info cell as written in the plan.
    #[serde(default)]
    pub info: String,
}

fn scheduled_by_default() -> bool {
    true
}

impl Lesson {
    pub fn new(
        date: NaiveDate,
        forms: impl IntoIterator<Item = impl Into<String>>,
        periods: impl IntoIterator<Item = Period>,
    ) -> Self {
        Self {
            forms: forms.into_iter().map(Into::into).collect(),
            periods: periods.into_iter().collect(),
            teachers: None,
            is_scheduled: true,
            date,
            class_number: None,
            info: String::new(),
        }
    }

    pub fn with_teachers(mut self, teachers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.teachers = Some(teachers.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_class_number(mut self, class_number: impl Into<String>) -> Self {
        self.class_number = Some(class_number.into());
        self
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = info.into();
        self
    }

    pub fn unscheduled(mut self) -> Self {
        self.is_scheduled = false;
        self
    }
}

/// A class (course group) from the regular timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub subject: String,
    #[serde(default)]
    pub group: Option<String>,
    pub forms: BTreeSet<String>,
    /// Teacher abbreviation as printed in the timetable; may be empty or garbage.
    #[serde(default)]
    pub teacher: String,
}

impl Class {
    /// The code a notice uses for this class: the group name if present, else the subject.
    pub fn course_code(&self) -> &str {
        self.group.as_deref().unwrap_or(&self.subject)
    }
}

/// Classes of a plan, keyed by class number.
pub type Classes = BTreeMap<String, Class>;
