//! Command-line interface for vplan-info
//!
//! Usage:
//!   vplan-info parse `<text>` --date `<date>` --forms `<forms>` --periods `<periods>`  - Parse an info cell
//!   vplan-info link `<text>` --date `<date>` --teachers `<file>`                      - Fuzzy-link a free text line
//!   vplan-info infer --lessons `<file>` --classes `<file>`                          - Infer teachers of unscheduled lessons
//!
//! Global flags: `--config <file>`, `--period-labels plan|blocks`, `--log-filter <directive>`.
//!
//! Output is JSON (parse, link) or YAML (infer) on stdout; diagnostics go to stderr.

use chrono::NaiveDate;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use vplan_info::info::blocks::{BlockConfiguration, PeriodLabels, PlanNotation};
use vplan_info::info::config::{EngineConfig, Loader, PeriodLabelStyle};
use vplan_info::info::forms::{parse_periods, ParsedForm};
use vplan_info::info::fuzzy::FuzzyLinker;
use vplan_info::info::inference::extract_teachers;
use vplan_info::info::lesson::Classes;
use vplan_info::info::snapshot::read_yaml;
use vplan_info::info::tagger::LexiconTagger;
use vplan_info::info::teachers::Teachers;
use vplan_info::info::{DirectoryError, Lesson, ParsedLessonInfo, PlanType};

#[derive(Debug, Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error("could not encode output: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not encode output: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("invalid plan type {0:?}, expected forms, teachers or rooms")]
    InvalidPlanType(String),
}

/// Optional configuration file picked up from the working directory.
const LOCAL_CONFIG: &str = "vplan-info.toml";

/// Global flags and the configuration keys they override.
const CONFIG_OVERRIDES: &[(&str, &str)] = &[
    ("period-labels", "render.period_labels"),
    ("log-filter", "logging.filter"),
];

fn main() {
    let matches = build_cli().get_matches();

    let Some((command, command_matches)) = matches.subcommand() else {
        unreachable!()
    };

    let result = load_config(command_matches).and_then(|config| {
        init_logging(&config);
        match command {
            "parse" => handle_parse_command(command_matches, &config),
            "link" => handle_link_command(command_matches, &config),
            "infer" => handle_infer_command(command_matches),
            _ => unreachable!(),
        }
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn build_cli() -> Command {
    Command::new("vplan-info")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Parse and link substitution-plan lesson notices")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .help("Configuration file layered over the built-in defaults"),
        )
        .arg(
            Arg::new("period-labels")
                .long("period-labels")
                .global(true)
                .value_parser(["plan", "blocks"])
                .help("Period label style, overrides render.period_labels"),
        )
        .arg(
            Arg::new("log-filter")
                .long("log-filter")
                .global(true)
                .help("Log filter directive, overrides logging.filter (RUST_LOG still wins)"),
        )
        .subcommand(
            Command::new("parse")
                .about("Parse the info cell of a single lesson")
                .arg(Arg::new("text").help("Info cell text").required(true).index(1))
                .arg(date_arg())
                .arg(
                    Arg::new("forms")
                        .long("forms")
                        .help("Comma separated forms of the lesson")
                        .required(true),
                )
                .arg(
                    Arg::new("periods")
                        .long("periods")
                        .help("Periods of the lesson, e.g. 3 or 3-4")
                        .required(true),
                )
                .arg(
                    Arg::new("plan-type")
                        .long("plan-type")
                        .help("Plan the lesson is filed under")
                        .default_value("forms"),
                )
                .arg(Arg::new("teachers").long("teachers").help("Teacher directory (YAML)"))
                .arg(
                    Arg::new("blocks")
                        .long("blocks")
                        .help("Block configuration (YAML map of block to periods)"),
                )
                .arg(
                    Arg::new("known-forms")
                        .long("known-forms")
                        .help("Comma separated forms existing on the date, enables fuzzy linking"),
                )
                .arg(rooms_arg())
                .arg(
                    Arg::new("pretty")
                        .long("pretty")
                        .action(ArgAction::SetTrue)
                        .help("Pretty-print JSON output"),
                ),
        )
        .subcommand(
            Command::new("link")
                .about("Fuzzy-link a line of free text")
                .arg(Arg::new("text").help("Text to link").required(true).index(1))
                .arg(date_arg())
                .arg(
                    Arg::new("teachers")
                        .long("teachers")
                        .help("Teacher directory (YAML)")
                        .required(true),
                )
                .arg(
                    Arg::new("known-forms")
                        .long("known-forms")
                        .help("Comma separated forms existing on the date"),
                )
                .arg(rooms_arg()),
        )
        .subcommand(
            Command::new("infer")
                .about("Infer teacher abbreviations from unscheduled lessons")
                .arg(
                    Arg::new("lessons")
                        .long("lessons")
                        .help("Lessons with info cells (YAML list)")
                        .required(true),
                )
                .arg(
                    Arg::new("classes")
                        .long("classes")
                        .help("Timetable classes (YAML map of class number to class)")
                        .required(true),
                )
                .arg(
                    Arg::new("teachers")
                        .long("teachers")
                        .help("Known teacher directory (YAML); known surnames are not inferred"),
                ),
        )
}

fn date_arg() -> Arg {
    Arg::new("date")
        .long("date")
        .short('d')
        .help("Date of the plan (YYYY-MM-DD)")
        .required(true)
}

fn rooms_arg() -> Arg {
    Arg::new("rooms")
        .long("rooms")
        .help("Comma separated room identifiers")
}

/// Defaults, then `vplan-info.toml` if present, then `--config`, then flag overrides.
fn load_config(matches: &ArgMatches) -> Result<EngineConfig, CliError> {
    let mut loader = Loader::new().with_optional_file(LOCAL_CONFIG);
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    for (flag, key) in CONFIG_OVERRIDES {
        if let Some(value) = matches.get_one::<String>(flag) {
            loader = loader.set_override(key, value.clone())?;
        }
    }
    Ok(loader.build()?)
}

fn init_logging(config: &EngineConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_date(matches: &ArgMatches) -> Result<NaiveDate, CliError> {
    let text = required(matches, "date");
    NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| CliError::InvalidDate(text.to_string()))
}

/// Value of an argument clap already enforces.
fn required<'m>(matches: &'m ArgMatches, id: &str) -> &'m str {
    matches.get_one::<String>(id).map(String::as_str).unwrap_or_default()
}

fn comma_list(matches: &ArgMatches, id: &str) -> Vec<String> {
    matches
        .get_one::<String>(id)
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn load_teachers(matches: &ArgMatches) -> Result<Teachers, CliError> {
    match matches.get_one::<String>("teachers") {
        Some(path) => Ok(read_yaml(path)?),
        None => Ok(Teachers::new()),
    }
}

fn build_linker<'a>(
    matches: &ArgMatches,
    config: &EngineConfig,
    date: NaiveDate,
    teachers: &'a Teachers,
    tagger: &'a LexiconTagger,
) -> FuzzyLinker<'a> {
    FuzzyLinker::new(date, teachers)
        .with_tagger(tagger)
        .with_salutations(config.linker.salutations.clone())
        .with_room_terminators(config.linker.room_terminators.as_str())
        .with_forms(
            comma_list(matches, "known-forms")
                .iter()
                .filter_map(|form| ParsedForm::parse(form)),
        )
        .with_rooms(comma_list(matches, "rooms"))
}

/// Handle the parse command
fn handle_parse_command(matches: &ArgMatches, config: &EngineConfig) -> Result<(), CliError> {
    let date = parse_date(matches)?;
    let text = required(matches, "text");
    let plan_type = match matches.get_one::<String>("plan-type").map(String::as_str) {
        Some("forms") | None => PlanType::Forms,
        Some("teachers") => PlanType::Teachers,
        Some("rooms") => PlanType::Rooms,
        Some(other) => return Err(CliError::InvalidPlanType(other.to_string())),
    };

    let lesson = Lesson::new(
        date,
        comma_list(matches, "forms"),
        parse_periods(required(matches, "periods")),
    );

    let teachers = load_teachers(matches)?;
    let mut info = ParsedLessonInfo::parse_with(
        text,
        &lesson,
        plan_type,
        &config.segmenter.bracket_pairs(),
    );
    info.resolve_teachers(&teachers, Some(date));

    let labels: Box<dyn PeriodLabels> = match config.render.period_labels {
        PeriodLabelStyle::Plan => Box::new(PlanNotation),
        PeriodLabelStyle::Blocks => match matches.get_one::<String>("blocks") {
            Some(path) => {
                let blocks: BTreeMap<i32, Vec<i32>> = read_yaml(path)?;
                Box::new(BlockConfiguration::new(blocks))
            }
            None => Box::new(BlockConfiguration::trivial()),
        },
    };

    let tagger = config.linker.tagger();
    let linker = build_linker(matches, config, date, &teachers, &tagger);
    let serialized = info.serialize(date, labels.as_ref(), Some(&linker));

    let output = if matches.get_flag("pretty") {
        serde_json::to_string_pretty(&serialized)?
    } else {
        serde_json::to_string(&serialized)?
    };
    println!("{}", output);
    Ok(())
}

/// Handle the link command
fn handle_link_command(matches: &ArgMatches, config: &EngineConfig) -> Result<(), CliError> {
    let date = parse_date(matches)?;
    let text = required(matches, "text");
    let teachers = load_teachers(matches)?;
    let tagger = config.linker.tagger();
    let linker = build_linker(matches, config, date, &teachers, &tagger);

    println!("{}", serde_json::to_string(&linker.link_line(text))?);
    Ok(())
}

/// Handle the infer command
fn handle_infer_command(matches: &ArgMatches) -> Result<(), CliError> {
    let lessons: Vec<Lesson> = read_yaml(required(matches, "lessons"))?;
    let classes: Classes = read_yaml(required(matches, "classes"))?;
    let known = load_teachers(matches)?;

    let mut inferred = Teachers::new();
    for lesson in &lessons {
        let mut info = ParsedLessonInfo::from_lesson(lesson, PlanType::Forms);
        info.resolve_teachers(&known, Some(lesson.date));
        inferred.add_teachers(extract_teachers(lesson, &info, &classes));
    }

    tracing::info!(lessons = lessons.len(), teachers = inferred.len(), "inference finished");
    print!("{}", serde_yaml::to_string(&inferred)?);
    Ok(())
}
