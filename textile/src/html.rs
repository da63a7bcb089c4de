//! HTML escaping and tag assembly helpers.

use std::sync::LazyLock;

use indexmap::IndexMap;

use crate::regexes::{fancy, plain, substitute};

/// Escape text so it is safe inside an HTML element.
///
/// With `quotes` set, single and double quotes are escaped as well, which
/// makes the result safe inside an attribute value too.
pub(crate) fn encode_html(text: &str, quotes: bool) -> String {
  let mut out = text
    .replace('&', "&amp;")
    .replace('<', "&lt;")
    .replace('>', "&gt;");
  if quotes {
    out = out.replace('\'', "&#39;").replace('"', "&quot;");
  }
  out
}

/// Render a complete HTML tag with the given attributes, preserving the
/// attribute insertion order. An empty tag name returns the content as-is,
/// and the content `" /"` produces a self-closing tag.
pub(crate) fn generate_tag(
  tag: &str,
  content: &str,
  attributes: &IndexMap<String, String>,
) -> String {
  if tag.is_empty() {
    return content.to_string();
  }
  let mut atts = String::new();
  for (name, value) in attributes {
    let value = html_escape::encode_double_quoted_attribute(value.as_str());
    atts.push_str(&format!(" {name}=\"{value}\""));
  }
  if content == " /" {
    format!("<{tag}{atts} />")
  } else {
    format!("<{tag}{atts}>{content}</{tag}>")
  }
}

static BLOCK_CONTENT_RE: LazyLock<fancy_regex::Regex> = LazyLock::new(|| {
  fancy(r"(?s)<(pre|p|blockquote|div|form|table|ul|ol|dl|h[1-6])[^>]*?>.*</\1>")
});

static SELF_CLOSING_RE: LazyLock<regex::Regex> =
  LazyLock::new(|| plain(r"<(hr|br)[^>]*?/>"));

/// Whether the text still contains content not enclosed by a block tag.
pub(crate) fn has_raw_text(text: &str) -> bool {
  let stripped = substitute(&BLOCK_CONTENT_RE, text.trim(), |_| String::new());
  let stripped = SELF_CLOSING_RE.replace_all(&stripped, "");
  !stripped.trim().is_empty()
}

static CRLF_RE: LazyLock<regex::Regex> = LazyLock::new(|| plain(r"\r\n?"));
static BLANK_LINE_RE: LazyLock<regex::Regex> =
  LazyLock::new(|| plain(r"(?m)^[ \t]*\n"));

/// Canonicalize line endings and whitespace-only lines, and pad a trailing
/// double quote so the closing-quote glyph rule can see it.
pub(crate) fn normalize_newlines(text: &str) -> String {
  let out = text.trim();
  let out = CRLF_RE.replace_all(out, "\n");
  let mut out = BLANK_LINE_RE.replace_all(&out, "\n").into_owned();
  if out.ends_with('"') {
    out.push(' ');
  }
  out
}
