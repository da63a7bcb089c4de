//! Per-document conversion state and the top-level pipeline.
//!
//! A [`Parser`] lives for exactly one conversion run. It owns the shelf
//! (finished HTML fragments tokenized out of the way of later passes), the
//! URL reference table, footnote and endnote registries, and the random uid
//! namespacing every token so document text can never collide with one.

use std::collections::HashMap;
use std::sync::LazyLock;

use indexmap::IndexMap;

use crate::Textile;
use crate::html::{encode_html, normalize_newlines};
use crate::notes::Note;
use crate::regexes::{fancy, group, plain, substitute};

pub(crate) const RESTRICTED_URL_SCHEMES: &[&str] = &["http", "https", "ftp", "mailto"];
pub(crate) const UNRESTRICTED_URL_SCHEMES: &[&str] = &[
  "http", "https", "ftp", "mailto", "file", "tel", "callto", "sftp", "data",
];

/// A `start`/`end` delimited special region: the delimited content is pulled
/// out of the document before the regular passes run over it.
fn special_re(start: &str, end: &str) -> fancy_regex::Regex {
  fancy(&format!(
    r"(?ms)(^|\s|[\[({{>|]){}(.*?){}($|[\])}}])?",
    regex::escape(start),
    regex::escape(end)
  ))
}

static CODE_AT_RE: LazyLock<fancy_regex::Regex> = LazyLock::new(|| special_re("@", "@"));
static CODE_TAG_RE: LazyLock<fancy_regex::Regex> =
  LazyLock::new(|| special_re("<code>", "</code>"));
static PRE_TAG_RE: LazyLock<fancy_regex::Regex> =
  LazyLock::new(|| special_re("<pre>", "</pre>"));
static NOTEXTILE_TAG_RE: LazyLock<fancy_regex::Regex> =
  LazyLock::new(|| special_re("<notextile>", "</notextile>"));
static NOTEXTILE_EQ_RE: LazyLock<fancy_regex::Regex> =
  LazyLock::new(|| special_re("==", "=="));
static COMMENT_RE: LazyLock<fancy_regex::Regex> =
  LazyLock::new(|| special_re("<!--", "-->"));

static REFS_RE: LazyLock<fancy_regex::Regex> = LazyLock::new(|| {
  fancy(r"(?:^|(?<=\s))\[(.+)\]((?:http(?:s?)://|/)\S+)(?=\s|$)")
});

static BR_FIX_RE: LazyLock<fancy_regex::Regex> =
  LazyLock::new(|| fancy(r"<br( /)?>(?!\n)"));

static BR_INSERT_RE: LazyLock<fancy_regex::Regex> =
  LazyLock::new(|| fancy(r"(.+)(?:(?<!<br>)|(?<!<br />))\n(?![#*;:\s|])"));

static P_TAG_RE: LazyLock<regex::Regex> =
  LazyLock::new(|| plain(r"(?s)<(p)([^>]*?)>(.*)(</p>)"));

pub(crate) struct Parser<'t> {
  pub(crate) t: &'t Textile,
  pub(crate) uid: String,
  pub(crate) link_prefix: String,
  pub(crate) link_index: usize,
  pub(crate) ref_index: usize,
  pub(crate) shelf: IndexMap<String, String>,
  pub(crate) url_refs: HashMap<String, String>,
  pub(crate) ref_cache: HashMap<usize, String>,
  pub(crate) footnotes: HashMap<String, String>,
  pub(crate) notes: IndexMap<String, Note>,
  pub(crate) ordered_notes: Vec<Note>,
  pub(crate) unreferenced_notes: Vec<Note>,
  pub(crate) notes_ordered: bool,
  pub(crate) notelist_cache: IndexMap<String, String>,
  pub(crate) note_index: usize,
  pub(crate) ol_starts: HashMap<String, usize>,
  pub(crate) span_depth: usize,
  pub(crate) url_schemes: &'static [&'static str],
  pub(crate) rel: String,
  /// Matches the link-start tokens planted by the link pass; depends on the
  /// per-run uid, so compiled here rather than as a static.
  pub(crate) link_token_re: regex::Regex,
  /// Matches shelved URL tokens, also uid-dependent.
  pub(crate) url_token_re: regex::Regex,
}

impl<'t> Parser<'t> {
  pub(crate) fn new(t: &'t Textile) -> Self {
    let hex = format!("{:032x}", rand::random::<u128>());
    let uid = format!("textileRef:{hex}:");
    let link_prefix = format!("{hex}-");
    let link_token_re = plain(&format!(
      r#"(\[)?{uid}linkStartMarker:"((?:.|\n)*?)":([^\s|^'"*]*)"#
    ));
    let url_token_re = plain(&format!("{uid}([0-9]+):url"));
    let url_schemes = if t.options.restricted {
      RESTRICTED_URL_SCHEMES
    } else {
      UNRESTRICTED_URL_SCHEMES
    };
    Self {
      t,
      uid,
      link_prefix,
      link_index: 0,
      ref_index: 0,
      shelf: IndexMap::new(),
      url_refs: HashMap::new(),
      ref_cache: HashMap::new(),
      footnotes: HashMap::new(),
      notes: IndexMap::new(),
      ordered_notes: Vec::new(),
      unreferenced_notes: Vec::new(),
      notes_ordered: false,
      notelist_cache: IndexMap::new(),
      note_index: 1,
      ol_starts: HashMap::new(),
      span_depth: 0,
      url_schemes,
      rel: t.options.rel.clone(),
      link_token_re,
      url_token_re,
    }
  }

  /// Run the full conversion pipeline over one document.
  pub(crate) fn run(mut self, text: &str) -> String {
    let opts = &self.t.options;

    let mut text = if opts.restricted {
      encode_html(text, false)
    } else {
      text.to_string()
    };
    text = normalize_newlines(&text);
    // Any literal occurrence of the uid in the input could forge tokens.
    text = text.replace(&self.uid, "");

    if opts.block_tags {
      text = self.block(&text);
      if !opts.lite {
        text = self.place_note_lists(&text);
      }
    } else {
      text = self.span(&text);
      text = self.glyphs(&text);
    }

    text = self.get_refs(&text);

    if !opts.lite {
      text = self.place_note_lists(&text);
    }

    text = self.retrieve(&text);
    text = text.replace(&format!("{}:glyph:", self.uid), "");

    if let Some(sanitizer) = &self.t.sanitizer {
      text = sanitizer.sanitize(&text, opts.html_kind);
    }

    text = self.retrieve_urls(&text);

    // A break tag not followed by a newline gets normalized and rewrapped.
    substitute(&BR_FIX_RE, &text, |_| "<br />\n".to_string())
  }

  /// Paragraph-level inline passes, applied to the content of every block.
  pub(crate) fn graf(&mut self, text: &str) -> String {
    let mut text = text.to_string();
    if !self.t.options.lite {
      text = self.no_textile(&text);
      text = self.code(&text);
    }

    text = self.get_html_comments(&text);

    text = self.get_refs(&text);
    text = self.links(&text);

    if !self.t.options.noimage {
      text = self.image(&text);
    }

    if !self.t.options.lite {
      text = self.table(&text);
      text = self.redcloth_list(&text);
      text = self.textile_lists(&text);
    }

    text = self.span(&text);
    text = self.footnote_ref(&text);
    text = self.note_ref(&text);
    text = self.glyphs(&text);

    text.trim_end_matches('\n').to_string()
  }

  pub(crate) fn increment_link_index(&mut self) -> usize {
    self.link_index += 1;
    self.link_index
  }

  /// Park a finished HTML fragment on the shelf, returning its token.
  pub(crate) fn shelve(&mut self, text: String) -> String {
    self.ref_index += 1;
    let item_id = format!("{}{}:shelve", self.uid, self.ref_index);
    self.shelf.insert(item_id.clone(), text);
    item_id
  }

  /// Expand shelf tokens back into their fragments. Shelved fragments can
  /// contain further tokens, so this runs to a fixpoint; the pass count is
  /// capped by the shelf size since nesting depth cannot exceed it.
  pub(crate) fn retrieve(&self, text: &str) -> String {
    let mut text = text.to_string();
    for _ in 0..=self.shelf.len() {
      let old = text.clone();
      for (token, fragment) in &self.shelf {
        text = text.replace(token, fragment);
      }
      if text == old {
        break;
      }
    }
    text
  }

  /// Park a URL, returning its token. URLs are kept separate from the shelf
  /// so reference aliases can still be resolved at the end of the run.
  pub(crate) fn shelve_url(&mut self, text: String) -> String {
    if text.is_empty() {
      return String::new();
    }
    self.ref_index += 1;
    self.ref_cache.insert(self.ref_index, text);
    format!("{}{}:url", self.uid, self.ref_index)
  }

  pub(crate) fn retrieve_urls(&self, text: &str) -> String {
    let re = self.url_token_re.clone();
    re.replace_all(text, |caps: &regex::Captures<'_>| {
      let token: usize = caps
        .get(1)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);
      let Some(url) = self.ref_cache.get(&token) else {
        return String::new();
      };
      self.url_refs.get(url).unwrap_or(url).clone()
    })
    .into_owned()
  }

  /// Capture `[name]url` reference definitions and remove them from the
  /// document.
  pub(crate) fn get_refs(&mut self, text: &str) -> String {
    substitute(&REFS_RE, text, |caps| {
      self
        .url_refs
        .insert(group(caps, 1).to_string(), group(caps, 2).to_string());
      String::new()
    })
  }

  pub(crate) fn code(&mut self, text: &str) -> String {
    let text = substitute(&CODE_TAG_RE, text, |caps| self.f_code(caps));
    let text = substitute(&CODE_AT_RE, &text, |caps| self.f_code(caps));
    substitute(&PRE_TAG_RE, &text, |caps| self.f_pre(caps))
  }

  fn f_code(&mut self, caps: &fancy_regex::Captures<'_>) -> String {
    let before = group(caps, 1);
    let mut text = group(caps, 2).to_string();
    let after = group(caps, 3);
    if !self.t.options.restricted {
      // Restricted input is escaped wholesale before the pipeline starts.
      text = encode_html(&text, false);
    }
    let shelved = self.shelve(format!("<code>{text}</code>"));
    format!("{before}{shelved}{after}")
  }

  fn f_pre(&mut self, caps: &fancy_regex::Captures<'_>) -> String {
    let before = group(caps, 1);
    let mut text = group(caps, 2).to_string();
    let after = group(caps, 3);
    if !self.t.options.restricted {
      text = encode_html(&text, true);
    }
    let shelved = self.shelve(text);
    format!("{before}<pre>{shelved}</pre>{after}")
  }

  pub(crate) fn no_textile(&mut self, text: &str) -> String {
    let text = substitute(&NOTEXTILE_TAG_RE, text, |caps| self.f_textile(caps));
    substitute(&NOTEXTILE_EQ_RE, &text, |caps| self.f_textile(caps))
  }

  fn f_textile(&mut self, caps: &fancy_regex::Captures<'_>) -> String {
    let before = group(caps, 1);
    let after = group(caps, 3);
    let shelved = self.shelve(group(caps, 2).to_string());
    format!("{before}{shelved}{after}")
  }

  /// HTML comments survive conversion untouched; their content is shelved so
  /// later passes cannot rewrite it.
  pub(crate) fn get_html_comments(&mut self, text: &str) -> String {
    substitute(&COMMENT_RE, text, |caps| {
      let before = group(caps, 1);
      let shelved = self.shelve(group(caps, 2).to_string());
      format!("{before}<!--{shelved}-->")
    })
  }

  /// Insert `<br />` for single newlines inside the given tag's content.
  pub(crate) fn do_tag_br(&self, tag: &str, input: &str) -> String {
    let re = plain(&format!(
      "(?s)<({0})([^>]*?)>(.*)(</{0}>)",
      regex::escape(tag)
    ));
    re.replace_all(input, |caps: &regex::Captures<'_>| self.do_br(caps))
      .into_owned()
  }

  pub(crate) fn do_p_br(&self, input: &str) -> String {
    P_TAG_RE
      .replace_all(input, |caps: &regex::Captures<'_>| self.do_br(caps))
      .into_owned()
  }

  fn do_br(&self, caps: &regex::Captures<'_>) -> String {
    let part = |i: usize| caps.get(i).map_or("", |m| m.as_str());
    let content = substitute(&BR_INSERT_RE, part(3), |inner| {
      format!("{}<br />", group(inner, 1))
    });
    format!("<{}{}>{}{}", part(1), part(2), content, part(4))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::TextileOptions;

  fn parser(t: &Textile) -> Parser<'_> {
    Parser::new(t)
  }

  fn default_converter() -> Textile {
    match Textile::new(TextileOptions::default()) {
      Ok(t) => t,
      Err(e) => panic!("default options rejected: {e}"),
    }
  }

  #[test]
  fn shelve_and_retrieve_round_trip() {
    let t = default_converter();
    let mut p = parser(&t);
    let token = p.shelve("<code>x</code>".to_string());
    let text = format!("before {token} after");
    assert_eq!(p.retrieve(&text), "before <code>x</code> after");
  }

  #[test]
  fn retrieve_expands_nested_tokens() {
    let t = default_converter();
    let mut p = parser(&t);
    let inner = p.shelve("inner".to_string());
    let outer = p.shelve(format!("<{inner}>"));
    assert_eq!(p.retrieve(&outer), "<inner>");
  }

  #[test]
  fn url_references_are_captured_and_removed() {
    let t = default_converter();
    let mut p = parser(&t);
    let out = p.get_refs("[home]http://example.com/ and text");
    assert_eq!(out, " and text");
    assert_eq!(
      p.url_refs.get("home").map(String::as_str),
      Some("http://example.com/")
    );
  }

  #[test]
  fn retrieve_urls_resolves_aliases() {
    let t = default_converter();
    let mut p = parser(&t);
    p.url_refs
      .insert("home".to_string(), "http://example.com/".to_string());
    let token = p.shelve_url("home".to_string());
    assert_eq!(p.retrieve_urls(&token), "http://example.com/");
  }

  #[test]
  fn inline_code_is_escaped_and_shelved() {
    let t = default_converter();
    let mut p = parser(&t);
    let out = p.code("take @a < b@ here");
    let out = p.retrieve(&out);
    assert_eq!(out, "take <code>a &lt; b</code> here");
  }

  #[test]
  fn comments_survive_with_content_protected() {
    let t = default_converter();
    let mut p = parser(&t);
    let out = p.get_html_comments("a <!-- *not bold* --> b");
    let out = p.retrieve(&out);
    assert_eq!(out, "a <!-- *not bold* --> b");
  }

  #[test]
  fn single_newlines_become_breaks_inside_paragraphs() {
    let t = default_converter();
    let p = parser(&t);
    // The newline is consumed here; the final pipeline pass reattaches one
    // after every break tag.
    assert_eq!(p.do_p_br("<p>one\ntwo</p>"), "<p>one<br />two</p>");
    // List-item starters at the line head suppress the break.
    assert_eq!(p.do_p_br("<p>one\n* two</p>"), "<p>one\n* two</p>");
  }
}
