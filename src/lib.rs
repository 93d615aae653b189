//! # vplan-info
//!
//! Parsing and linking of substitution-plan lesson notices.
//!
//! Plan files carry a free-text "info" cell per lesson, written in a terse, abbreviated
//! German ("MA Frau Musterfrau verlegt nach St.3; selbst. (v), Aufgaben stehen im LernSax").
//! This crate turns such a cell into typed messages, renders them back into text segments
//! that link to other plan views, and annotates text the grammar does not understand with
//! fuzzy links to known forms, teachers and rooms.
//!
//! File Layout
//!
//! src/info
//!   ├── lesson       lessons, classes and plan types as delivered by the plan decoder
//!   ├── segmenter    bracket-aware splitting into paragraphs and messages
//!   ├── grammar      the ordered rule cascade
//!   ├── messages     typed message kinds and grouping
//!   ├── render       text segments and links
//!   ├── blocks       period labels and block configuration
//!   ├── forms        form grammars, expansion and compaction
//!   ├── typography   German typography for displayed free text
//!   ├── document     parsed info / paragraph / message containers
//!   ├── tagger       proper-noun check used before teacher lookups
//!   ├── fuzzy        fuzzy entity linker (teachers, forms, rooms)
//!   ├── teachers     teacher directory and resolution
//!   ├── inference    teacher abbreviation inference from class data
//!   ├── config       layered engine configuration
//!   └── snapshot     directory snapshots read from YAML
//!
//! For test fixtures, see the [testing module](info::testing).

pub mod info;
