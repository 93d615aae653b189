//! Teacher inference from unscheduled lessons.
//!
//! Lessons that only exist on the substitution plan often name their teacher by surname
//! ("MA Herr Mustermann fällt aus") where the directory has no long name yet. If the
//! regular timetable has exactly one teacher for that course in the lesson's forms, the
//! surname is attributed to that teacher's abbreviation.

use crate::info::document::ParsedLessonInfo;
use crate::info::lesson::{Class, Classes, Lesson};
use crate::info::teachers::Teacher;
use std::collections::{BTreeMap, BTreeSet};

/// Teachers learned from `lesson`: its own abbreviations plus surnames matched to classes.
///
/// Scheduled lessons teach nothing new and yield no records. Ambiguous matches are
/// dropped, never guessed.
pub fn extract_teachers(lesson: &Lesson, info: &ParsedLessonInfo, classes: &Classes) -> Vec<Teacher> {
    if lesson.is_scheduled {
        return Vec::new();
    }

    let mut out: BTreeMap<String, Teacher> = lesson
        .teachers
        .iter()
        .flatten()
        .map(|plan_short| (plan_short.clone(), Teacher::new(plan_short).seen_on(lesson.date)))
        .collect();

    for message in info.messages() {
        let Some(course) = message.parsed.kind.course_info() else {
            continue;
        };
        if course.other_info_value.is_some() {
            continue;
        }
        let Some(surname) = course.teachers.as_ref().and_then(|t| t.iter().next()) else {
            continue;
        };

        // A single token is taken for an abbreviation.
        let Some(given_name) = surname.split_whitespace().nth(1) else {
            continue;
        };

        let Some(abbreviation) = unique_teacher(lesson, &course.course, given_name, classes) else {
            tracing::debug!(
                course = %course.course,
                forms = ?lesson.forms,
                message = ?message.parsed.original_messages,
                "could not find a unique class for the course"
            );
            continue;
        };

        if !abbreviation.chars().any(char::is_alphabetic) {
            tracing::debug!(
                course = %course.course,
                forms = ?lesson.forms,
                "class has invalid teacher {abbreviation:?}"
            );
            continue;
        }

        out.insert(
            abbreviation.to_string(),
            Teacher::new(abbreviation)
                .with_long(surname)
                .seen_on(lesson.date),
        );
    }

    out.into_values().collect()
}

/// Narrow the timetable down to the one teacher of `course`, if there is one.
fn unique_teacher<'c>(
    lesson: &Lesson,
    course: &str,
    given_name: &str,
    classes: &'c Classes,
) -> Option<&'c str> {
    let in_forms = |class: &Class| lesson.forms.is_subset(&class.forms);

    let mut candidates: Vec<(&String, &Class)> = classes
        .iter()
        .filter(|(_, class)| class.course_code() == course && in_forms(class))
        .collect();

    if candidates.is_empty() {
        candidates = classes
            .iter()
            .filter(|(_, class)| class.subject == course && in_forms(class))
            .collect();
    }

    if distinct_teachers(&candidates).len() > 1 {
        if let Some(number) = &lesson.class_number {
            let same_class: Vec<_> = candidates
                .iter()
                .copied()
                .filter(|(id, _)| *id == number)
                .collect();
            if !same_class.is_empty() {
                candidates = same_class;
            }
        }
    }

    if distinct_teachers(&candidates).len() > 1 {
        candidates.retain(|(_, class)| {
            class
                .teacher
                .chars()
                .next()
                .is_some_and(|initial| given_name.starts_with(initial))
        });
    }

    let teachers = distinct_teachers(&candidates);
    match teachers.len() {
        1 => teachers.into_iter().next(),
        _ => None,
    }
}

fn distinct_teachers<'c>(candidates: &[(&String, &'c Class)]) -> BTreeSet<&'c str> {
    candidates
        .iter()
        .map(|(_, class)| class.teacher.as_str())
        .collect()
}
