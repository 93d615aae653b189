//! Typography normalization for free text shown to users.
//!
//! Plan sources are typed on whatever keyboard was at hand. Before free text is displayed
//! (and before the fuzzy linker looks at it) quotes, dashes and ellipses are brought into
//! their German typographic form and runs of spaces are collapsed.

use once_cell::sync::Lazy;
use regex::Regex;

static MULTIPLE_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").unwrap());
static SPACED_HYPHEN: Lazy<Regex> = Lazy::new(|| Regex::new(r" -{1,2} ").unwrap());
static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]*)""#).unwrap());

/// Normalize quotes, dashes, ellipses and spacing of `text`.
pub fn fix_typography(text: &str) -> String {
    let text = MULTIPLE_SPACES.replace_all(text, " ");
    let text = SPACED_HYPHEN.replace_all(&text, " – ");
    let text = QUOTED.replace_all(&text, "„$1“");
    text.replace("...", "…")
}
