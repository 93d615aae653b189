//! Teacher directory and reference resolution.
//!
//! Notices refer to teachers by surname with salutation ("Frau Musterfrau") or by the
//! plan abbreviation ("MUS"). Resolution maps such a raw reference to the canonical plan
//! abbreviation, using the directory snapshot that was valid on the lesson's date.

use crate::info::error::LookupError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;

const SALUTATIONS: &[&str] = &["Herr", "Frau"];

/// One teacher as known to the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    /// Abbreviation used in plan files.
    pub plan_short: String,
    /// Name as written in notices, e.g. "Frau Musterfrau".
    #[serde(default)]
    pub plan_long: Option<String>,
    /// First and last date the teacher appeared on a plan. `None` means unbounded.
    #[serde(default)]
    pub first_seen: Option<NaiveDate>,
    #[serde(default)]
    pub last_seen: Option<NaiveDate>,
}

impl Teacher {
    pub fn new(plan_short: impl Into<String>) -> Self {
        Self {
            plan_short: plan_short.into(),
            plan_long: None,
            first_seen: None,
            last_seen: None,
        }
    }

    pub fn with_long(mut self, plan_long: impl Into<String>) -> Self {
        self.plan_long = Some(plan_long.into());
        self
    }

    /// Restrict validity to a single day.
    pub fn seen_on(mut self, date: NaiveDate) -> Self {
        self.first_seen = Some(date);
        self.last_seen = Some(date);
        self
    }

    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        self.first_seen.map_or(true, |first| first <= date)
            && self.last_seen.map_or(true, |last| date <= last)
    }

    /// The long name without salutation and titles ("Frau Dr. Musterfrau" → "Musterfrau").
    pub fn surname_without_titles(&self) -> Option<String> {
        let long = self.plan_long.as_deref()?;
        let surname = long
            .split_whitespace()
            .filter(|part| !SALUTATIONS.contains(part) && !part.contains('.'))
            .collect::<Vec<_>>()
            .join(" ");
        (!surname.is_empty()).then_some(surname)
    }

    /// How well `reference` names this teacher; lower is better, `None` is no match.
    fn match_rank(&self, reference: &str) -> Option<u8> {
        if self.plan_short == reference {
            Some(0)
        } else if self.plan_long.as_deref() == Some(reference) {
            Some(1)
        } else if self.surname_without_titles().as_deref() == Some(reference) {
            Some(2)
        } else {
            None
        }
    }

    fn merge(self, other: Teacher) -> Teacher {
        Teacher {
            plan_short: self.plan_short,
            plan_long: self.plan_long.or(other.plan_long),
            first_seen: merge_bound(self.first_seen, other.first_seen, std::cmp::min),
            last_seen: merge_bound(self.last_seen, other.last_seen, std::cmp::max),
        }
    }
}

/// Unbounded wins; otherwise the wider of both bounds.
fn merge_bound(
    a: Option<NaiveDate>,
    b: Option<NaiveDate>,
    pick: fn(NaiveDate, NaiveDate) -> NaiveDate,
) -> Option<NaiveDate> {
    Some(pick(a?, b?))
}

/// Lookup of raw teacher references.
pub trait TeacherDirectory {
    /// Resolve `reference` to a teacher valid on `date` (any date when `None`).
    fn query(&self, reference: &str, date: Option<NaiveDate>) -> Result<&Teacher, LookupError>;
}

/// Directory snapshot of all known teachers, keyed by abbreviation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Teacher>", into = "Vec<Teacher>")]
pub struct Teachers {
    teachers: BTreeMap<String, Teacher>,
}

impl Teachers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or merge teachers; records with the same abbreviation are combined.
    pub fn add_teachers(&mut self, teachers: impl IntoIterator<Item = Teacher>) {
        for teacher in teachers {
            let merged = match self.teachers.remove(&teacher.plan_short) {
                Some(existing) => existing.merge(teacher),
                None => teacher,
            };
            self.teachers.insert(merged.plan_short.clone(), merged);
        }
    }

    pub fn get(&self, plan_short: &str) -> Option<&Teacher> {
        self.teachers.get(plan_short)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Teacher> {
        self.teachers.values()
    }

    pub fn len(&self) -> usize {
        self.teachers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teachers.is_empty()
    }
}

impl TeacherDirectory for Teachers {
    fn query(&self, reference: &str, date: Option<NaiveDate>) -> Result<&Teacher, LookupError> {
        let reference = reference.trim();

        self.teachers
            .values()
            .filter(|teacher| date.map_or(true, |date| teacher.is_valid_on(date)))
            .filter_map(|teacher| Some((teacher.match_rank(reference)?, teacher)))
            .max_by_key(|(rank, teacher)| (Reverse(*rank), teacher.last_seen))
            .map(|(_, teacher)| teacher)
            .ok_or_else(|| LookupError::TeacherNotFound {
                reference: reference.to_string(),
                date,
            })
    }
}

impl From<Vec<Teacher>> for Teachers {
    fn from(teachers: Vec<Teacher>) -> Self {
        let mut out = Teachers::new();
        out.add_teachers(teachers);
        out
    }
}

impl From<Teachers> for Vec<Teacher> {
    fn from(teachers: Teachers) -> Self {
        teachers.teachers.into_values().collect()
    }
}

impl FromIterator<Teacher> for Teachers {
    fn from_iter<I: IntoIterator<Item = Teacher>>(iter: I) -> Self {
        let mut out = Teachers::new();
        out.add_teachers(iter);
        out
    }
}
