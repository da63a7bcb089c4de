//! Attribute shorthand parsing.
//!
//! Textile attaches presentation hints to blocks, spans, cells and images
//! through a compact shorthand: `(class#id)`, `{style}`, `[lang]`, alignment
//! glyphs, padding parens, and `\n`/`/n` span markers on table cells. This
//! module turns such a string into an ordered attribute map.

use std::sync::LazyLock;

use indexmap::IndexMap;

use crate::regexes::{HALIGN, VALIGN, fancy, group, plain};

static TD_COLSPAN_RE: LazyLock<regex::Regex> = LazyLock::new(|| plain(r"\\(\d+)"));
static TD_ROWSPAN_RE: LazyLock<regex::Regex> = LazyLock::new(|| plain(r"/(\d+)"));
static VALIGN_LEAD_RE: LazyLock<regex::Regex> =
  LazyLock::new(|| plain(&format!("^({VALIGN})")));
static STYLE_RE: LazyLock<regex::Regex> = LazyLock::new(|| plain(r"\{([^}]*)\}"));
static LANG_RE: LazyLock<regex::Regex> = LazyLock::new(|| plain(r"\[([^\]]+)\]"));
static CLASS_RE: LazyLock<regex::Regex> = LazyLock::new(|| plain(r"\(([^()]+)\)"));
static PAD_LEFT_RE: LazyLock<regex::Regex> = LazyLock::new(|| plain(r"([(]+)"));
static PAD_RIGHT_RE: LazyLock<regex::Regex> = LazyLock::new(|| plain(r"([)]+)"));
static HALIGN_FIND_RE: LazyLock<fancy_regex::Regex> =
  LazyLock::new(|| fancy(&format!("({HALIGN})")));
static ID_SPLIT_RE: LazyLock<regex::Regex> = LazyLock::new(|| plain(r"^(.*)#(.*)$"));
static COL_SPAN_RE: LazyLock<regex::Regex> =
  LazyLock::new(|| plain(r"^(?:\\(\d+)\.?)?\s*(\d+)?"));

/// Find `re` in `matched`, remove every occurrence of the whole match, and
/// return the first capture group.
fn extract(re: &regex::Regex, matched: &mut String) -> Option<String> {
  let (whole, inner) = {
    let caps = re.captures(matched)?;
    (
      caps.get(0)?.as_str().to_string(),
      caps.get(1).map_or("", |m| m.as_str()).to_string(),
    )
  };
  *matched = matched.replace(&whole, "");
  Some(inner)
}

fn valign_style(glyph: &str) -> Option<&'static str> {
  match glyph {
    "^" => Some("top"),
    "-" => Some("middle"),
    "~" => Some("bottom"),
    _ => None,
  }
}

fn halign_style(glyph: &str) -> Option<&'static str> {
  match glyph {
    "<" => Some("left"),
    "=" => Some("center"),
    ">" => Some("right"),
    "<>" => Some("justify"),
    _ => None,
  }
}

/// Parse an attribute shorthand string into an ordered attribute map.
///
/// `element` widens the accepted grammar for table elements: `td` also
/// understands colspan/rowspan markers, `td` and `tr` understand a leading
/// vertical alignment glyph, and `col` understands span/width. Author ids
/// are only emitted when `include_id` is set (they are dropped in restricted
/// mode).
pub(crate) fn parse_attributes(
  block_attributes: &str,
  element: Option<&str>,
  include_id: bool,
) -> IndexMap<String, String> {
  let mut result = IndexMap::new();
  if block_attributes.is_empty() {
    return result;
  }

  let mut style: Vec<String> = Vec::new();
  let mut class = String::new();
  let mut lang = String::new();
  let mut colspan = String::new();
  let mut rowspan = String::new();
  let mut id = String::new();
  let mut span = String::new();
  let mut width = String::new();

  let mut matched = block_attributes.to_string();

  if element == Some("td") {
    if let Some(caps) = TD_COLSPAN_RE.captures(&matched) {
      colspan = caps.get(1).map_or("", |m| m.as_str()).to_string();
    }
    if let Some(caps) = TD_ROWSPAN_RE.captures(&matched) {
      rowspan = caps.get(1).map_or("", |m| m.as_str()).to_string();
    }
  }

  if element == Some("td") || element == Some("tr") {
    if let Some(caps) = VALIGN_LEAD_RE.captures(&matched) {
      if let Some(v) = caps.get(1).and_then(|m| valign_style(m.as_str())) {
        style.push(format!("vertical-align:{v}"));
      }
    }
  }

  if let Some(rules) = extract(&STYLE_RE, &mut matched) {
    for rule in rules.trim_end_matches(';').split(';') {
      style.push(rule.to_string());
    }
  }

  if let Some(found) = extract(&LANG_RE, &mut matched) {
    lang = found;
  }

  if let Some(found) = extract(&CLASS_RE, &mut matched) {
    class = found;
  }

  if let Some(parens) = extract(&PAD_LEFT_RE, &mut matched) {
    style.push(format!("padding-left:{}em", parens.len()));
  }

  if let Some(parens) = extract(&PAD_RIGHT_RE, &mut matched) {
    style.push(format!("padding-right:{}em", parens.len()));
  }

  if let Ok(Some(caps)) = HALIGN_FIND_RE.captures(&matched) {
    if let Some(h) = halign_style(group(&caps, 1)) {
      style.push(format!("text-align:{h}"));
    }
  }

  let id_split = ID_SPLIT_RE.captures(&class).map(|caps| {
    (
      caps.get(1).map_or("", |m| m.as_str()).to_string(),
      caps.get(2).map_or("", |m| m.as_str()).to_string(),
    )
  });
  if let Some((head, tail)) = id_split {
    class = head;
    id = tail;
  }

  if element == Some("col") {
    if let Some(caps) = COL_SPAN_RE.captures(&matched) {
      span = caps.get(1).map_or("", |m| m.as_str()).to_string();
      width = caps.get(2).map_or("", |m| m.as_str()).to_string();
    }
  }

  if !style.is_empty() {
    let style: Vec<&str> = style.iter().map(|s| s.trim()).collect();
    result.insert("style".to_string(), format!("{};", style.join("; ")));
  }
  if !class.is_empty() {
    result.insert("class".to_string(), class);
  }
  if !id.is_empty() && include_id {
    result.insert("id".to_string(), id);
  }
  if !lang.is_empty() {
    result.insert("lang".to_string(), lang);
  }
  if !colspan.is_empty() {
    result.insert("colspan".to_string(), colspan);
  }
  if !rowspan.is_empty() {
    result.insert("rowspan".to_string(), rowspan);
  }
  if !span.is_empty() {
    result.insert("span".to_string(), span);
  }
  if !width.is_empty() {
    result.insert("width".to_string(), width);
  }
  result
}

/// Render an attribute shorthand string as ` name="value"` pairs, ready for
/// direct interpolation after a tag name.
pub(crate) fn pba(
  block_attributes: &str,
  element: Option<&str>,
  include_id: bool,
) -> String {
  let attrs = parse_attributes(block_attributes, element, include_id);
  let mut out = String::new();
  for (name, value) in &attrs {
    out.push_str(&format!(" {name}=\"{value}\""));
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  fn render(atts: &str) -> String {
    pba(atts, None, true)
  }

  #[test]
  fn class_and_id() {
    assert_eq!(render("(cls)"), " class=\"cls\"");
    assert_eq!(render("(cls#frag)"), " class=\"cls\" id=\"frag\"");
    assert_eq!(render("(#frag)"), " id=\"frag\"");
  }

  #[test]
  fn style_language_and_class_in_any_order() {
    let expected = " style=\"color:red;\" class=\"cls\" lang=\"en\"";
    assert_eq!(render("(cls){color:red}[en]"), expected);
    assert_eq!(render("[en]{color:red}(cls)"), expected);
  }

  #[test]
  fn style_rules_are_joined_and_terminated() {
    assert_eq!(
      render("{color:red;font-size:1em;}"),
      " style=\"color:red; font-size:1em;\""
    );
  }

  #[test]
  fn alignment_and_padding_become_styles() {
    assert_eq!(render(">"), " style=\"text-align:right;\"");
    assert_eq!(render("<>"), " style=\"text-align:justify;\"");
    assert_eq!(render("(("), " style=\"padding-left:2em;\"");
  }

  #[test]
  fn td_grammar() {
    assert_eq!(pba(r"\2", Some("td"), true), " colspan=\"2\"");
    assert_eq!(pba("/3", Some("td"), true), " rowspan=\"3\"");
    assert_eq!(
      pba("^", Some("td"), true),
      " style=\"vertical-align:top;\""
    );
  }

  #[test]
  fn col_grammar() {
    assert_eq!(
      pba(r"\2 100", Some("col"), true),
      " span=\"2\" width=\"100\""
    );
  }

  #[test]
  fn id_dropped_when_excluded() {
    assert_eq!(pba("(cls#frag)", None, false), " class=\"cls\"");
  }

  #[test]
  fn empty_input_renders_nothing() {
    assert_eq!(render(""), "");
  }
}
