//! Shared regular expression fragments and compile helpers.
//!
//! Textile's grammar is assembled from a small set of reusable pattern
//! fragments (alignment shorthand, the class/style/language permutation,
//! punctuation classes). Patterns that need look-around or backtracking are
//! compiled with [`fancy_regex`]; everything else uses the plain [`regex`]
//! engine.

use std::sync::LazyLock;

use log::{debug, error};

/// Horizontal alignment shorthand: `<`, `>`, `=`, `<>` and padding parens.
pub(crate) const HALIGN: &str = r"(?:<(?!>)|(?<!<)>|<>|=|[()]+(?! ))";

/// Vertical alignment shorthand for table rows and cells.
pub(crate) const VALIGN: &str = r"[\-^~]";

const CLASS: &str = r"(?:\([^)\n]+\))";
const LANGUAGE: &str = r"(?:\[[^\]\n]+\])";
const STYLE: &str = r"(?:\{[^}\n]+\})";

pub(crate) const COLSPAN: &str = r"(?:\\\d+)";
pub(crate) const ROWSPAN: &str = r"(?:\/\d+)";

/// Uppercase letter, acronym body, and lowercase tail classes.
pub(crate) const ABR: &str = r"\p{Lu}";
pub(crate) const ACR: &str = r"\p{Lu}\p{Nd}";
pub(crate) const NAB: &str = r"\p{Ll}";
pub(crate) const DIGIT: &str = r"\p{N}";

/// Horizontal whitespace. `\x0B` stands in for the vertical tab, which the
/// regex syntax has no escape for.
pub(crate) const SPACE: &str = r"(?:\p{Zs}|\x0B)";

/// Punctuation recognized at glyph and span boundaries.
pub(crate) const PNCT: &str = r##"[-!"#$%&()*+,/:;<=>?@'\[\\\]\.^_`{|}~]"##;

/// Symbol characters allowed as note list starting markers.
pub(crate) const SYMS: &str = "¤§µ¶†‡•∗∴◊♠♣♥♦";

/// `(halign|valign)*` - the combined alignment prefix.
pub(crate) static ALIGN: LazyLock<String> =
  LazyLock::new(|| format!("(?:{HALIGN}|{VALIGN})*"));

/// `(colspan|rowspan)*` - the table span prefix.
pub(crate) static TABLE_SPAN: LazyLock<String> =
  LazyLock::new(|| format!("(?:{COLSPAN}|{ROWSPAN})*"));

/// Any permutation of one optional class/id, language, and style group.
pub(crate) static CLS: LazyLock<String> = LazyLock::new(|| {
  format!(
    "(?:{c}(?:{l}(?:{s})?|{s}(?:{l})?)?|{l}(?:{c}(?:{s})?|{s}(?:{c})?)?|{s}(?:{c}(?:{l})?|{l}(?:{c})?)?)?",
    c = CLASS,
    l = LANGUAGE,
    s = STYLE
  )
});

/// Compile a plain regex, degrading to a never-matching pattern on error.
pub(crate) fn plain(pattern: &str) -> regex::Regex {
  regex::Regex::new(pattern).unwrap_or_else(|e| {
    error!("failed to compile pattern {pattern:?}: {e}");
    never_matching_plain()
  })
}

/// Compile a backtracking regex, degrading to a never-matching pattern on
/// error.
pub(crate) fn fancy(pattern: &str) -> fancy_regex::Regex {
  fancy_regex::Regex::new(pattern).unwrap_or_else(|e| {
    error!("failed to compile pattern {pattern:?}: {e}");
    never_matching_fancy()
  })
}

/// A pattern that can never match any input. Safer as a fallback than a
/// trivial pattern like `^$`, which would still match empty strings.
fn never_matching_plain() -> regex::Regex {
  regex::Regex::new(r"[^\s\S]").expect("never-matching regex must compile")
}

fn never_matching_fancy() -> fancy_regex::Regex {
  fancy_regex::Regex::new(r"[^\s\S]").expect("never-matching regex must compile")
}

/// Replace every match of `re` in `text` using `rep`.
///
/// Backtracking searches can fail at match time (for instance when the
/// backtrack limit is exceeded on pathological input). A conversion must
/// never give up entirely, so on error the remainder of the text is passed
/// through untouched.
pub(crate) fn substitute<F>(re: &fancy_regex::Regex, text: &str, mut rep: F) -> String
where
  F: FnMut(&fancy_regex::Captures<'_>) -> String,
{
  let mut out = String::with_capacity(text.len());
  let mut last = 0;
  for caps in re.captures_iter(text) {
    let caps = match caps {
      Ok(caps) => caps,
      Err(e) => {
        debug!("regex search aborted: {e}");
        break;
      },
    };
    let Some(m) = caps.get(0) else { break };
    out.push_str(&text[last..m.start()]);
    out.push_str(&rep(&caps));
    last = m.end();
  }
  out.push_str(&text[last..]);
  out
}

/// Split `text` at every match of `re`, like the substitution helper never
/// failing outright.
pub(crate) fn split(re: &fancy_regex::Regex, text: &str) -> Vec<String> {
  let mut parts = Vec::new();
  let mut last = 0;
  for m in re.find_iter(text) {
    let m = match m {
      Ok(m) => m,
      Err(e) => {
        debug!("regex split aborted: {e}");
        break;
      },
    };
    parts.push(text[last..m.start()].to_string());
    last = m.end();
  }
  parts.push(text[last..].to_string());
  parts
}

/// Group accessor that tolerates absent captures.
pub(crate) fn group<'t>(caps: &fancy_regex::Captures<'t>, i: usize) -> &'t str {
  caps.get(i).map_or("", |m| m.as_str())
}

/// Named group accessor that tolerates absent captures.
pub(crate) fn named<'t>(caps: &fancy_regex::Captures<'t>, name: &str) -> &'t str {
  caps.name(name).map_or("", |m| m.as_str())
}
