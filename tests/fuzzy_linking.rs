//! Fuzzy linking of free text, alone and inside parsed info cells

use vplan_info::info::blocks::PlanNotation;
use vplan_info::info::config::Loader;
use vplan_info::info::fuzzy::FuzzyLinker;
use vplan_info::info::render::segments_text;
use vplan_info::info::teachers::{Teacher, Teachers};
use vplan_info::info::testing::{
    form_lesson, lesson_date, mark_links, sample_forms, sample_rooms, sample_teachers,
};
use vplan_info::info::{ParsedLessonInfo, PlanType};

#[test]
fn test_room_mention_in_free_text() {
    let teachers = sample_teachers();
    let linker = FuzzyLinker::new(lesson_date(), &teachers).with_rooms(sample_rooms());

    let segments = linker.link_line("bitte Raum 1302 nutzen");
    assert_eq!(segments.len(), 3);
    insta::assert_snapshot!(mark_links(&segments), @"bitte Raum [1302](rooms:1302) nutzen");

    let link = segments[1].link.as_ref().unwrap();
    assert_eq!(link.date, Some(lesson_date()));
    assert_eq!(link.periods, None);
}

#[test]
fn test_all_entity_kinds_in_one_line() {
    let teachers = sample_teachers();
    let linker = FuzzyLinker::new(lesson_date(), &teachers)
        .with_forms(sample_forms())
        .with_rooms(sample_rooms());

    let segments = linker.link_line("Klasse 10/1,2 mit Fr. Musterfrau in TH1");
    insta::assert_snapshot!(
        mark_links(&segments),
        @"Klasse [10/1,2](forms:10/1,10/2) mit [Fr. Musterfrau](teachers:MUS) in [TH1](rooms:TH1)"
    );
}

#[test]
fn test_linking_keeps_text() {
    let teachers = sample_teachers();
    let linker = FuzzyLinker::new(lesson_date(), &teachers)
        .with_forms(sample_forms())
        .with_rooms(sample_rooms());

    for line in [
        "Aufgaben für 6/1-3 liegen bei Herrn Beispiel (1306)!",
        "JG11: Klausur in 1302",
        "Raum 1306 statt 1302",
    ] {
        assert_eq!(segments_text(&linker.link_line(line)), line);
    }
}

#[test]
fn test_free_text_of_parsed_info_is_linked() {
    let teachers = sample_teachers();
    let linker = FuzzyLinker::new(lesson_date(), &teachers).with_rooms(sample_rooms());
    let lesson = form_lesson(["10/1"], [3]);

    let mut info = ParsedLessonInfo::parse(
        "Raumänderung beachten, Material von Frau Musterfrau; SPO MUM fällt aus in 1302",
        &lesson,
        PlanType::Forms,
    );
    info.resolve_teachers(&teachers, Some(lesson_date()));

    let rendered: Vec<String> = info
        .messages()
        .map(|message| {
            mark_links(&message.text_segments(lesson_date(), &PlanNotation, Some(&linker)))
        })
        .collect();

    assert_eq!(
        rendered,
        vec![
            "Raumänderung beachten, Material von [Frau Musterfrau](teachers:MUS)",
            "SPO [MUM](teachers:MUM) fällt aus in [1302](rooms:1302)",
        ]
    );
}

#[test]
fn test_structured_segments_are_not_relinked() {
    let teachers = sample_teachers();
    let linker = FuzzyLinker::new(lesson_date(), &teachers).with_rooms(sample_rooms());
    let lesson = form_lesson(["10/1"], [3]);

    // MUM stays unresolved here, so the structured text must stay plain as well
    let info = ParsedLessonInfo::parse("SPO MUM fällt aus", &lesson, PlanType::Forms);
    let message = info.messages().next().unwrap();

    let segments = message.text_segments(lesson_date(), &PlanNotation, Some(&linker));
    insta::assert_snapshot!(mark_links(&segments), @"SPO MUM fällt aus");
}

#[test]
fn test_configured_common_nouns_block_teacher_links() {
    let teachers = Teachers::from(vec![Teacher::new("Aula")]);
    let config = Loader::new()
        .set_override("linker.common_nouns", vec!["Aula"])
        .unwrap()
        .build()
        .unwrap();
    let tagger = config.linker.tagger();

    let plain = FuzzyLinker::new(lesson_date(), &teachers);
    assert_eq!(mark_links(&plain.link_line("in der Aula")), "in der [Aula](teachers:Aula)");

    let configured = FuzzyLinker::new(lesson_date(), &teachers).with_tagger(&tagger);
    assert_eq!(mark_links(&configured.link_line("in der Aula")), "in der Aula");
}

#[test]
fn test_letter_coded_forms_with_grade() {
    let teachers = sample_teachers();
    let linker = FuzzyLinker::new(lesson_date(), &teachers)
        .with_forms(sample_forms())
        .with_rooms(sample_rooms());

    insta::assert_snapshot!(
        mark_links(&linker.link_line("JG11: Klausur in 1302")),
        @"[JG11](forms:JG11): Klausur in [1302](rooms:1302)"
    );
    insta::assert_snapshot!(
        mark_links(&linker.link_line("JG 11 Klausur")),
        @"[JG 11](forms:JG11) Klausur"
    );
}

#[test]
fn test_teacher_inside_compound_word_stays_plain() {
    let mut teachers = sample_teachers();
    teachers.add_teachers([Teacher::new("Sax").with_long("Herr Sax")]);
    let linker = FuzzyLinker::new(lesson_date(), &teachers);

    assert_eq!(
        mark_links(&linker.link_line("Aufgaben stehen im LernSax")),
        "Aufgaben stehen im LernSax"
    );
    assert_eq!(
        mark_links(&linker.link_line("Vertretung durch Herrn Sax")),
        "Vertretung durch [Herrn Sax](teachers:Sax)"
    );

    let lesson = form_lesson(["10/1"], [3]);
    let info = ParsedLessonInfo::parse("Info im LernSax beachten", &lesson, PlanType::Forms);
    let message = info.messages().next().unwrap();
    let segments = message.text_segments(lesson_date(), &PlanNotation, Some(&linker));
    insta::assert_snapshot!(mark_links(&segments), @"Info im LernSax beachten");
}

#[test]
fn test_text_around_notices_is_normalized_before_linking() {
    let teachers = sample_teachers();
    let linker = FuzzyLinker::new(lesson_date(), &teachers).with_rooms(sample_rooms());
    let lesson = form_lesson(["10/1"], [3]);

    let mut info = ParsedLessonInfo::parse(
        "SPO MUM fällt aus  -  bitte  in 1302 warten",
        &lesson,
        PlanType::Forms,
    );
    info.resolve_teachers(&teachers, Some(lesson_date()));
    let message = info.messages().next().unwrap();
    assert_eq!(message.parsed.after, "  -  bitte  in 1302 warten");

    let plain = message.text_segments(lesson_date(), &PlanNotation, None);
    assert_eq!(segments_text(&plain), "SPO MUM fällt aus – bitte in 1302 warten");

    let linked = message.text_segments(lesson_date(), &PlanNotation, Some(&linker));
    insta::assert_snapshot!(
        mark_links(&linked),
        @"SPO [MUM](teachers:MUM) fällt aus – bitte in [1302](rooms:1302) warten"
    );
}
