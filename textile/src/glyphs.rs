//! Typographic glyph substitution.
//!
//! Straight quotes become curly, `--` becomes an em dash, `(tm)` and
//! friends become their symbols, runs of capitals get acronym/caps markup.
//! The text is split on HTML tags first so markup emitted by earlier passes
//! is never rewritten; only the very first text segment uses the
//! line-initial quote rules.

use std::sync::LazyLock;

use crate::HtmlKind;
use crate::parser::Parser;
use crate::regexes::{ABR, ACR, NAB, PNCT, SPACE, fancy, group, plain, substitute};

static TAG_SPLIT_RE: LazyLock<regex::Regex> =
  LazyLock::new(|| plain(r"<[\w/!?].*?>"));

static APOS_RE: LazyLock<regex::Regex> = LazyLock::new(|| plain(r"(^|\w)'(\w)"));
static APOS_INIT_RE: LazyLock<regex::Regex> = LazyLock::new(|| plain(r"(\w)'(\w)"));
static YEAR_RE: LazyLock<fancy_regex::Regex> =
  LazyLock::new(|| fancy(r"(\s)'(\d+\w?)\b(?!')"));
static SINGLE_CLOSE_RE: LazyLock<fancy_regex::Regex> =
  LazyLock::new(|| fancy(&format!(r"(^|\S)'(?=\s|{PNCT}|$)")));
static SINGLE_CLOSE_INIT_RE: LazyLock<fancy_regex::Regex> =
  LazyLock::new(|| fancy(&format!(r"(\S)'(?=\s|{PNCT}|$)")));
static SINGLE_OPEN_RE: LazyLock<regex::Regex> = LazyLock::new(|| plain("'"));
static DOUBLE_CLOSE_RE: LazyLock<fancy_regex::Regex> =
  LazyLock::new(|| fancy(&format!(r#"(^|\S)"(?=\s|{PNCT}|$)"#)));
static DOUBLE_CLOSE_INIT_RE: LazyLock<fancy_regex::Regex> =
  LazyLock::new(|| fancy(&format!(r#"(\S)"(?=\s|{PNCT}|$)"#)));
static DOUBLE_OPEN_RE: LazyLock<regex::Regex> = LazyLock::new(|| plain("\""));
static ELLIPSIS_RE: LazyLock<regex::Regex> =
  LazyLock::new(|| plain(r"([^.]?)\.{3}"));
static AMPERSAND_RE: LazyLock<regex::Regex> = LazyLock::new(|| plain(r"(\s)&(\s)"));
static EMDASH_RE: LazyLock<regex::Regex> = LazyLock::new(|| plain(r"(\s?)--(\s?)"));
static ENDASH_RE: LazyLock<regex::Regex> = LazyLock::new(|| plain(r"\s-(?:\s|$)"));
static DIMENSION_RE: LazyLock<fancy_regex::Regex> =
  LazyLock::new(|| fancy(r"(\d+)( ?)x( ?)(?=\d+)"));
static TRADEMARK_RE: LazyLock<regex::Regex> =
  LazyLock::new(|| plain(r"(?i)\b ?[(\[]TM[)\]]"));
static REGISTERED_RE: LazyLock<regex::Regex> =
  LazyLock::new(|| plain(r"(?i)\b ?[(\[]R[)\]]"));
static COPYRIGHT_RE: LazyLock<regex::Regex> =
  LazyLock::new(|| plain(r"(?i)\b ?[(\[]C[)\]]"));
static HALF_RE: LazyLock<regex::Regex> =
  LazyLock::new(|| plain(r"(?i)[(\[]1/2[)\]]"));
static QUARTER_RE: LazyLock<regex::Regex> =
  LazyLock::new(|| plain(r"(?i)[(\[]1/4[)\]]"));
static THREEQUARTERS_RE: LazyLock<regex::Regex> =
  LazyLock::new(|| plain(r"(?i)[(\[]3/4[)\]]"));
static DEGREES_RE: LazyLock<regex::Regex> =
  LazyLock::new(|| plain(r"(?i)[(\[]o[)\]]"));
static PLUSMINUS_RE: LazyLock<regex::Regex> =
  LazyLock::new(|| plain(r"(?i)[(\[]\+/-[)\]]"));
static ACRONYM_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
  plain(&format!(r"\b([{ABR}][{ACR}]{{2,}})\b(?:[(]([^)]*)[)])"))
});
static CAPS_RE: LazyLock<fancy_regex::Regex> = LazyLock::new(|| {
  fancy(&format!(
    r#"({SPACE}|^|[>(;-])([{ABR}]{{3,}})([{NAB}]*)(?={SPACE}|{PNCT}|<|$)(?=[^">]*?(?:<|$))"#
  ))
});

impl Parser<'_> {
  /// Apply the glyph rules to `text`, skipping anything inside HTML tags.
  pub(crate) fn glyphs(&self, text: &str) -> String {
    // A trailing double quote would otherwise never be seen as closing.
    let mut text = text.to_string();
    if text.ends_with('"') {
      text.push(' ');
    }
    let text = text.trim_end_matches('\n');

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut initial = true;
    for m in TAG_SPLIT_RE.find_iter(text) {
      out.push_str(&self.glyph_rules(&text[last..m.start()], initial));
      initial = false;
      out.push_str(m.as_str());
      last = m.end();
    }
    out.push_str(&self.glyph_rules(&text[last..], initial));
    out
  }

  /// One pass of all glyph rules over a tag-free segment. The `initial`
  /// variants treat a quote at the segment start as opening rather than as
  /// an apostrophe.
  fn glyph_rules(&self, segment: &str, initial: bool) -> String {
    let apos: &regex::Regex = if initial { &APOS_INIT_RE } else { &APOS_RE };
    let single_close: &fancy_regex::Regex = if initial {
      &SINGLE_CLOSE_INIT_RE
    } else {
      &SINGLE_CLOSE_RE
    };
    let double_close: &fancy_regex::Regex = if initial {
      &DOUBLE_CLOSE_INIT_RE
    } else {
      &DOUBLE_CLOSE_RE
    };

    let line = apos.replace_all(segment, "${1}&#8217;${2}");
    let line = substitute(&YEAR_RE, &line, |c| {
      format!("{}&#8217;{}", group(c, 1), group(c, 2))
    });
    let line = substitute(single_close, &line, |c| {
      format!("{}&#8217;", group(c, 1))
    });
    let line = SINGLE_OPEN_RE.replace_all(&line, "&#8216;");
    let line = substitute(double_close, &line, |c| {
      format!("{}&#8221;", group(c, 1))
    });
    let line = DOUBLE_OPEN_RE.replace_all(&line, "&#8220;");
    let line = ELLIPSIS_RE.replace_all(&line, "${1}&#8230;");
    let line = AMPERSAND_RE.replace_all(&line, "${1}&amp;${2}");
    let line = EMDASH_RE.replace_all(&line, "${1}&#8212;${2}");
    let line = ENDASH_RE.replace_all(&line, " &#8211; ");
    let line = substitute(&DIMENSION_RE, &line, |c| {
      format!("{}{}&#215;{}", group(c, 1), group(c, 2), group(c, 3))
    });
    let line = TRADEMARK_RE.replace_all(&line, "&#8482;");
    let line = REGISTERED_RE.replace_all(&line, "&#174;");
    let line = COPYRIGHT_RE.replace_all(&line, "&#169;");
    let line = HALF_RE.replace_all(&line, "&#189;");
    let line = QUARTER_RE.replace_all(&line, "&#188;");
    let line = THREEQUARTERS_RE.replace_all(&line, "&#190;");
    let line = DEGREES_RE.replace_all(&line, "&#176;");
    let line = PLUSMINUS_RE.replace_all(&line, "&#177;");
    let line = ACRONYM_RE.replace_all(&line, |c: &regex::Captures<'_>| {
      let word = c.get(1).map_or("", |m| m.as_str());
      let title = c.get(2).map_or("", |m| m.as_str());
      match self.t.options.html_kind {
        HtmlKind::Xhtml => format!("<acronym title=\"{title}\">{word}</acronym>"),
        HtmlKind::Html5 => format!("<abbr title=\"{title}\">{word}</abbr>"),
      }
    });
    // The uid guard keeps the caps span from re-matching on a later pass;
    // it is stripped at the end of the pipeline.
    substitute(&CAPS_RE, &line, |c| {
      format!(
        "{}<span class=\"caps\">{}:glyph:{}</span>{}",
        group(c, 1),
        self.uid,
        group(c, 2),
        group(c, 3)
      )
    })
  }
}

#[cfg(test)]
mod tests {
  use crate::parser::Parser;
  use crate::{Textile, TextileOptions};

  fn converter(kind: crate::HtmlKind) -> Textile {
    match Textile::new(TextileOptions {
      html_kind: kind,
      ..TextileOptions::default()
    }) {
      Ok(t) => t,
      Err(e) => panic!("options rejected: {e}"),
    }
  }

  fn run(text: &str) -> String {
    let t = converter(crate::HtmlKind::Xhtml);
    let p = Parser::new(&t);
    let out = p.glyphs(text);
    out.replace(&format!("{}:glyph:", p.uid), "")
  }

  #[test]
  fn quotes_and_apostrophes() {
    assert_eq!(run("\"Hello,\" she said."), "&#8220;Hello,&#8221; she said.");
    assert_eq!(run("it's fine"), "it&#8217;s fine");
    assert_eq!(run("back in '88"), "back in &#8217;88");
  }

  #[test]
  fn dashes_ellipsis_and_symbols() {
    assert_eq!(run("one -- two"), "one &#8212; two");
    assert_eq!(run("3 - 4"), "3 &#8211; 4");
    assert_eq!(run("wait..."), "wait&#8230;");
    assert_eq!(run("Brand(TM) and Mark(R)"), "Brand&#8482; and Mark&#174;");
    assert_eq!(run("1 x 2"), "1 &#215; 2");
  }

  #[test]
  fn fractions_degrees_and_plusminus() {
    assert_eq!(
      run("(1/2) (1/4) (3/4) (o) (+/-)"),
      "&#189; &#188; &#190; &#176; &#177;"
    );
    // Text without any bracketed symbol must pass through untouched.
    assert_eq!(run("one"), "one");
  }

  #[test]
  fn ampersand_is_entity_encoded() {
    assert_eq!(run("salt & pepper"), "salt &amp; pepper");
  }

  #[test]
  fn acronym_with_title() {
    assert_eq!(
      run("ABC(Abc Corp) rules"),
      "<acronym title=\"Abc Corp\"><span class=\"caps\">ABC</span></acronym> rules"
    );
  }

  #[test]
  fn caps_run_gets_span() {
    assert_eq!(run("the NASA budget"), "the <span class=\"caps\">NASA</span> budget");
  }

  #[test]
  fn html5_uses_abbr() {
    let t = converter(crate::HtmlKind::Html5);
    let p = Parser::new(&t);
    let out = p.glyphs("CSS(Cascading Style Sheets)");
    assert!(out.contains("<abbr title=\"Cascading Style Sheets\">"));
  }

  #[test]
  fn tags_are_left_alone() {
    assert_eq!(
      run("<strong>Here</strong>'s more"),
      "<strong>Here</strong>&#8217;s more"
    );
  }
}
