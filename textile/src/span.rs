//! Inline phrase markup: `*strong*`, `_em_`, `??cite??`, `-del-`, `+ins+`,
//! `~sub~`, `^sup^`, `%span%`, `**b**` and `__i__`.

use std::sync::LazyLock;

use crate::attrs::pba;
use crate::parser::Parser;
use crate::regexes::{CLS, SPACE, fancy, group, substitute};

const MAX_SPAN_DEPTH: usize = 5;

/// Punctuation accepted around span markers; a superset of the glyph
/// punctuation class with typographic quote characters added.
const SPAN_PNCT: &str = r#".,"'?!;:‹›«»„“”‚‘’"#;

fn span_re(marker: &str) -> fancy_regex::Regex {
  fancy(&format!(
    r#"(^|(?<=[\s>{pnct}\(])|[{{\[])({tag})(?!{tag})({cls})(?!{tag})(?::(\S+[^{tag}]{space}))?([^{space}{tag}]+|\S.*?[^\s{tag}\n])([{pnct}]*){tag}($|[\[\]}}<]|(?=[{pnct}]{{1,2}}[^0-9]|\s|\)))"#,
    tag = marker,
    cls = &*CLS,
    pnct = SPAN_PNCT,
    space = SPACE
  ))
}

/// Marker patterns paired with the tags they produce. Double markers come
/// before their single counterparts so `**` is never read as two `*`.
static SPAN_RES: LazyLock<Vec<(fancy_regex::Regex, &'static str)>> =
  LazyLock::new(|| {
    [
      (r"\*\*", "b"),
      (r"\*", "strong"),
      (r"\?\?", "cite"),
      (r"\-", "del"),
      ("__", "i"),
      ("_", "em"),
      ("%", "span"),
      (r"\+", "ins"),
      ("~", "sub"),
      (r"\^", "sup"),
    ]
    .iter()
    .map(|(marker, tag)| (span_re(marker), *tag))
    .collect()
  });

impl Parser<'_> {
  /// Rewrite phrase markers into their HTML tags, recursing into span
  /// content up to a fixed depth.
  pub(crate) fn span(&mut self, text: &str) -> String {
    let mut text = text.to_string();
    self.span_depth += 1;
    if self.span_depth <= MAX_SPAN_DEPTH {
      for (re, tag) in SPAN_RES.iter() {
        text = substitute(re, &text, |caps| self.f_span(caps, tag));
      }
    }
    self.span_depth -= 1;
    text
  }

  fn f_span(&mut self, caps: &fancy_regex::Captures<'_>, tag: &str) -> String {
    let pre = group(caps, 1);
    let mut atts = pba(group(caps, 3), None, true);
    if let Some(cite) = caps.get(4) {
      atts = format!("{atts} cite=\"{}\"", cite.as_str().trim_end());
    }
    let content = self.span(group(caps, 5));
    let end = group(caps, 6);
    let tail = group(caps, 7);

    let out = format!("<{tag}{atts}>{content}{end}</{tag}>");
    // A span both opened by a bracket and closed by one is fenced; the
    // brackets themselves are consumed.
    if pre.is_empty() == tail.is_empty() {
      out
    } else {
      format!("{pre}{out}{tail}")
    }
  }
}
