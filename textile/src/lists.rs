//! Ordered, unordered and definition lists.
//!
//! Two grammars are supported: Textile lists (`*`, `#`, `;`, `:` markers,
//! arbitrarily nested, with `#n` start and `#_` continuation on ordered
//! lists) and RedCloth-style definition lists (`- term := definition`).

use std::sync::LazyLock;

use indexmap::IndexMap;

use crate::attrs::pba;
use crate::parser::Parser;
use crate::regexes::{CLS, fancy, group, plain, split, substitute};

static LIST_RE: LazyLock<fancy_regex::Regex> = LazyLock::new(|| {
  fancy(&format!(
    r"(?ms)^((?:[*;:]+|[*;:#]*#(?:_|\d+)?){cls}[ .].*)$(?![^#*;:])",
    cls = &*CLS
  ))
});
static LIST_SPLIT_RE: LazyLock<fancy_regex::Regex> =
  LazyLock::new(|| fancy(r"\n(?=[*#;:])"));
static LINE_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
  plain(&format!(r"(?s)^([#*;:]+)(_|\d+)?({cls})[ .](.*)$", cls = &*CLS))
});
static NEXTLINE_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
  plain(&format!(r"^([#*;:]+)(_|\d+)?{cls}[ .].*", cls = &*CLS))
});

static RC_LIST_RE: LazyLock<fancy_regex::Regex> = LazyLock::new(|| {
  fancy(&format!(r"(?ms)^(-+{cls}[ .].*:=.*)$(?![^-])", cls = &*CLS))
});
static RC_SPLIT_RE: LazyLock<fancy_regex::Regex> =
  LazyLock::new(|| fancy(r"\n(?=-)"));
static RC_LINE_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
  plain(&format!(r"(?s)^-+({cls})[ .](.*)$", cls = &*CLS))
});
static RC_DEF_RE: LazyLock<regex::Regex> =
  LazyLock::new(|| plain(r"(?s)^(.*?)\s*:=(.*?)\s*(=:|:=)?\s*$"));

fn list_type(marker: &str) -> &'static str {
  match marker.chars().next() {
    Some('#') => "o",
    Some('*') => "u",
    Some(';' | ':') => "d",
    _ => "",
  }
}

impl Parser<'_> {
  pub(crate) fn textile_lists(&mut self, text: &str) -> String {
    substitute(&LIST_RE, text, |caps| {
      let matched = group(caps, 0).to_string();
      self.f_textile_list(&matched)
    })
  }

  fn f_textile_list(&mut self, matched: &str) -> String {
    let lines = split(&LIST_SPLIT_RE, matched);
    let mut pt = String::new();
    let mut ls: IndexMap<String, u8> = IndexMap::new();
    let mut litem = "li";
    let mut result: Vec<String> = Vec::new();

    for (i, line) in lines.iter().enumerate() {
      let nextline = lines.get(i + 1).map_or("", String::as_str);
      let mut out_line = line.clone();

      if let Some(m) = LINE_RE.captures(line) {
        let tl = m.get(1).map_or("", |g| g.as_str()).to_string();
        let start_raw = m.get(2).map(|g| g.as_str());
        let atts_raw = m.get(3).map_or("", |g| g.as_str());
        let content = m.get(4).map_or("", |g| g.as_str()).trim().to_string();

        let ltype = list_type(&tl);
        litem = if tl.contains(';') {
          "dt"
        } else if tl.contains(':') {
          "dd"
        } else {
          "li"
        };
        let showitem = !content.is_empty();

        // Ordered lists track their item count across the whole document so
        // a later `#_` item continues the numbering.
        let mut start_attr: Option<String> = None;
        if ltype == "o" {
          if tl.len() > pt.len() {
            match start_raw {
              None => {
                self.ol_starts.insert(tl.clone(), 1);
              },
              Some("_") => {
                self.ol_starts.entry(tl.clone()).or_insert(1);
              },
              Some(digits) => {
                self
                  .ol_starts
                  .insert(tl.clone(), digits.parse().unwrap_or(1));
              },
            }
          }
          let current = *self.ol_starts.entry(tl.clone()).or_insert(1);
          if tl.len() > pt.len() && start_raw.is_some() {
            start_attr = Some(format!(" start=\"{current}\""));
          }
          if showitem {
            if let Some(n) = self.ol_starts.get_mut(&tl) {
              *n += 1;
            }
          }
        }

        let nl = NEXTLINE_RE
          .captures(nextline)
          .and_then(|nm| nm.get(1))
          .map_or("", |g| g.as_str())
          .to_string();

        // A dd nested under a dt closes differently; mark the level so the
        // closing pass skips the list tag for it.
        if pt.contains(';') && tl.contains(':') {
          ls.insert(tl.clone(), 2);
        }

        let atts = pba(atts_raw, None, true);
        let start_out =
          start_attr.unwrap_or_else(|| start_raw.unwrap_or("").to_string());

        if ls.contains_key(&tl) {
          out_line = if showitem {
            format!("\t\t<{litem}{atts}>{content}")
          } else {
            String::new()
          };
        } else {
          ls.insert(tl.clone(), 1);
          let itemtag = if showitem {
            format!("\n\t\t<{litem}>{content}")
          } else {
            String::new()
          };
          out_line = format!("\t<{ltype}l{atts}{start_out}>{itemtag}");
        }

        if nl.len() <= tl.len() && showitem {
          out_line = format!("{out_line}</{litem}>");
        }

        // Close every list nested deeper than the next line's marker.
        let keys: Vec<String> = ls.keys().cloned().collect();
        for k in keys.iter().rev() {
          if k.len() > nl.len() {
            let v = ls.get(k).copied().unwrap_or(1);
            if v != 2 {
              out_line = format!("{out_line}\n\t</{}l>", list_type(k));
              if k.len() > 1 {
                out_line = format!("{out_line}</{litem}>");
              }
            }
            ls.shift_remove(k);
          }
        }

        pt = tl;
      }

      result.push(out_line);
    }

    self.do_tag_br(litem, &result.join("\n"))
  }

  pub(crate) fn redcloth_list(&mut self, text: &str) -> String {
    substitute(&RC_LIST_RE, text, |caps| {
      let matched = group(caps, 0).to_string();
      self.f_rc_list(&matched)
    })
  }

  fn f_rc_list(&mut self, matched: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    for line in split(&RC_SPLIT_RE, matched) {
      let Some(m) = RC_LINE_RE.captures(&line) else {
        continue;
      };
      let atts = pba(m.get(1).map_or("", |g| g.as_str()), None, true);
      let content = m.get(2).map_or("", |g| g.as_str()).trim().to_string();

      let Some(xm) = RC_DEF_RE.captures(&content) else {
        continue;
      };
      let term = xm.get(1).map_or("", |g| g.as_str()).trim().to_string();
      let mut definition = xm
        .get(2)
        .map_or("", |g| g.as_str())
        .trim_matches(' ')
        .to_string();

      if out.is_empty() {
        out.push(if definition.is_empty() {
          format!("<dl{atts}>")
        } else {
          "<dl>".to_string()
        });
      }

      if !definition.is_empty() && !term.is_empty() {
        if definition.starts_with('\n') {
          definition = format!("<p>{}</p>", definition.trim_start());
        }
        definition = definition.replace('\n', "<br />").trim().to_string();

        let term = self.graf(&term);
        let definition = self.graf(&definition);

        out.push(format!("\t<dt{atts}>{term}</dt>"));
        out.push(format!("\t<dd>{definition}</dd>"));
      }
    }
    out.push("</dl>".to_string());
    out.join("\n")
  }
}

#[cfg(test)]
mod tests {
  use crate::parser::Parser;
  use crate::{Textile, TextileOptions};

  fn run(text: &str) -> String {
    let t = match Textile::new(TextileOptions::default()) {
      Ok(t) => t,
      Err(e) => panic!("default options rejected: {e}"),
    };
    let mut p = Parser::new(&t);
    let out = p.textile_lists(text);
    p.retrieve(&out)
  }

  #[test]
  fn simple_unordered_list() {
    assert_eq!(
      run("* one\n* two"),
      "\t<ul>\n\t\t<li>one</li>\n\t\t<li>two</li>\n\t</ul>"
    );
  }

  #[test]
  fn ordered_list_with_start() {
    assert_eq!(
      run("#3 three\n# four"),
      "\t<ol start=\"3\">\n\t\t<li>three</li>\n\t\t<li>four</li>\n\t</ol>"
    );
  }

  #[test]
  fn continued_ordered_list() {
    let t = match Textile::new(TextileOptions::default()) {
      Ok(t) => t,
      Err(e) => panic!("default options rejected: {e}"),
    };
    let mut p = Parser::new(&t);
    let first = p.textile_lists("# one\n# two");
    let first = p.retrieve(&first);
    assert_eq!(
      first,
      "\t<ol>\n\t\t<li>one</li>\n\t\t<li>two</li>\n\t</ol>"
    );
    let second = p.textile_lists("#_ three");
    let second = p.retrieve(&second);
    assert_eq!(
      second,
      "\t<ol start=\"3\">\n\t\t<li>three</li>\n\t</ol>"
    );
  }

  #[test]
  fn nested_list_closes_inner_levels() {
    assert_eq!(
      run("* a\n** b\n* c"),
      "\t<ul>\n\t\t<li>a\n\t<ul>\n\t\t<li>b</li>\n\t</ul></li>\n\t\t<li>c</li>\n\t</ul>"
    );
  }

  #[test]
  fn definition_list_markers() {
    assert_eq!(
      run("; term\n: definition"),
      "\t<dl>\n\t\t<dt>term</dt>\n\t\t<dd>definition</dd>\n\t</dl>"
    );
  }

  #[test]
  fn redcloth_definition_list() {
    let t = match Textile::new(TextileOptions::default()) {
      Ok(t) => t,
      Err(e) => panic!("default options rejected: {e}"),
    };
    let mut p = Parser::new(&t);
    let out = p.redcloth_list("- t := d");
    let out = p.retrieve(&out);
    assert_eq!(out, "<dl>\n\t<dt>t</dt>\n\t<dd>d</dd>\n</dl>");
  }
}
