//! Main module for lesson info functionality

pub mod blocks;
pub mod config;
pub mod document;
pub mod error;
pub mod forms;
pub mod fuzzy;
pub mod grammar;
pub mod inference;
pub mod lesson;
pub mod messages;
pub mod render;
pub mod segmenter;
pub mod snapshot;
pub mod tagger;
pub mod teachers;
pub mod testing;
pub mod typography;

pub use document::{Message, Paragraph, ParsedLessonInfo};
pub use error::{DirectoryError, LookupError};
pub use lesson::{Class, Lesson, Period, PlanType};
pub use messages::{CourseInfo, MessageKind, ParsedMessage};
pub use render::{Link, LinkedTextSegment};
