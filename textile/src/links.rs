//! Inline link parsing: `"text":url`, `["text":url]`, reference aliases and
//! the `$` url-as-text shorthand.
//!
//! Link recognition runs in two passes. The first scans backwards from every
//! `":` boundary, balancing quote characters to find where the link text
//! starts, and plants a uid-namespaced start marker there. The second pass
//! matches marker-to-url spans, trims trailing punctuation off the url, and
//! shelves the finished anchor tag.

use std::sync::LazyLock;

use crate::attrs::parse_attributes;
use crate::html::{encode_html, generate_tag};
use crate::parser::Parser;
use crate::regexes::{CLS, SPACE, fancy, plain};
use crate::urlutils::{encode_url, is_valid_url, urlsplit, urlunsplit};

static MARK_DEC_RE: LazyLock<regex::Regex> = LazyLock::new(|| plain(r"^\S|=\n?$"));
static MARK_INC_RE: LazyLock<regex::Regex> = LazyLock::new(|| plain(r"\S\n?$"));

static INNER_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
  plain(&format!(
    r"^(?P<atts>{cls}){space}*(?P<text>(?:!.+!)|.+?)(?:\((?P<title>[^)]+?)\))?$",
    cls = &*CLS,
    space = SPACE
  ))
});

static TIGHT_BRACKET_RE: LazyLock<regex::Regex> =
  LazyLock::new(|| plain(r"^(.*\])(\[.*?)$"));
static TRAILING_TEXT_RE: LazyLock<fancy_regex::Regex> =
  LazyLock::new(|| fancy(r"^(.*\])(?!=)(.*?)$"));
static TAG_TAIL_RE: LazyLock<regex::Regex> =
  LazyLock::new(|| plain(r"(.*)(</[a-z]+)$"));

impl Parser<'_> {
  pub(crate) fn links(&mut self, text: &str) -> String {
    let text = self.mark_start_of_links(text);
    self.replace_links(&text)
  }

  /// Find well-formed link starts and plant a start marker before each.
  fn mark_start_of_links(&self, text: &str) -> String {
    // Link text and url are always joined by `":`, which is far rarer than
    // bare quotes, so slice there first.
    let mut slices: Vec<&str> = text.split("\":").collect();
    if slices.len() <= 1 {
      return text.to_string();
    }
    // The last slice can never contain a link start.
    let Some(last_slice) = slices.pop() else {
      return text.to_string();
    };

    let mut output: Vec<String> = Vec::new();
    for s in slices {
      let mut quotes: Vec<String> = s.split('"').map(str::to_string).collect();
      let Some(mut possibility) = quotes.pop() else {
        continue;
      };

      // Walk backwards through the quote-separated parts, keeping a balance
      // count; when it returns to zero the quote that balanced it is the
      // start of the link text.
      let mut balanced: i32 = 0;
      let mut linkparts: Vec<String> = Vec::new();
      let mut empties = 0;

      while balanced != 0 || empties == 0 {
        linkparts.push(possibility.clone());
        if !possibility.is_empty() {
          if MARK_DEC_RE.is_match(&possibility) {
            balanced -= 1;
          }
          if MARK_INC_RE.is_match(&possibility) {
            balanced += 1;
          }
          match quotes.pop() {
            Some(next) => possibility = next,
            None => break,
          }
        } else {
          // Adjacent quotes produce empty parts; the last position counts
          // as a closing quote, any other as an opening one.
          if empties == 0 {
            balanced += 1;
          } else {
            balanced -= 1;
          }
          empties += 1;
          match quotes.pop() {
            Some(next) => possibility = next,
            None => {
              linkparts.pop();
              break;
            },
          }
          if possibility.is_empty() || possibility.ends_with(' ') {
            balanced = 0;
          }
        }
        if balanced <= 0 {
          quotes.push(possibility.clone());
          break;
        }
      }

      linkparts.reverse();
      let link_content = linkparts.join("\"");
      let pre_link = quotes.join("\"");
      output.push(format!(
        "{pre_link}{}linkStartMarker:\"{link_content}",
        self.uid
      ));
    }

    output.push(last_slice.to_string());
    output.join("\":")
  }

  /// Replace marked links with shelf tokens.
  fn replace_links(&mut self, text: &str) -> String {
    let re = self.link_token_re.clone();
    re.replace_all(text, |caps: &regex::Captures<'_>| self.f_link(caps))
      .into_owned()
  }

  fn f_link(&mut self, caps: &regex::Captures<'_>) -> String {
    let whole = caps.get(0).map_or("", |m| m.as_str());
    let mut pre = caps.get(1).map_or("", |m| m.as_str()).to_string();
    let inner = caps.get(2).map_or("", |m| m.as_str());
    let mut url = caps.get(3).map_or("", |m| m.as_str()).to_string();

    if inner.is_empty() {
      return format!("{pre}\"{inner}\":{url}");
    }

    let (atts, text, title) = match INNER_RE.captures(inner) {
      Some(m) => {
        let atts = m.name("atts").map_or("", |g| g.as_str());
        let text = m.name("text").map_or("", |g| g.as_str());
        let text = if text.is_empty() { inner } else { text };
        let title = m.name("title").map_or("", |g| g.as_str());
        (atts.to_string(), text.to_string(), title.to_string())
      },
      // Inner content the attribute grammar cannot parse is used verbatim.
      None => (String::new(), inner.to_string(), String::new()),
    };
    let mut text = text;

    let mut pop = String::new();
    let mut tight = String::new();

    // Square-bracketed stuff tacked onto the url, like a footnote in
    // "text":url[123], is split off to be re-emitted after the link.
    let initial_brackets = url.matches(']').count();
    if initial_brackets > 0 {
      let current = url.clone();
      if let Some(m) = TIGHT_BRACKET_RE.captures(&current) {
        url = m.get(1).map_or("", |g| g.as_str()).to_string();
        tight = m.get(2).map_or("", |g| g.as_str()).to_string();
      }
    }
    // Trailing text after a closing bracket that is not an array-style
    // query assignment (?q[]=x) is popped back out as well.
    if initial_brackets > 0 {
      let current = url.clone();
      if let Ok(Some(m)) = TRAILING_TEXT_RE.captures(&current) {
        url = m.get(1).map_or("", |g| g.as_str()).to_string();
        tight = format!("{}{tight}", m.get(2).map_or("", |g| g.as_str()));
      }
    }

    // Walk the url backwards popping characters that cannot end one:
    // sentence punctuation, a trailing closing tag, and unbalanced brackets.
    let mut first = true;
    let mut count_lbracket: Option<usize> = None;
    let mut count_lparen: Option<usize> = None;
    let mut count_rparen: Option<usize> = None;
    let mut count_rbracket = url.matches(']').count();
    let mut url_chars: Vec<char> = url.chars().collect();
    let snapshot = url_chars.clone();

    for &c in snapshot.iter().rev() {
      let mut popped = false;
      match c {
        '!' | '?' | ':' | ';' | '.' | ',' => {
          pop = format!("{c}{pop}");
          url_chars.pop();
          popped = true;
        },
        '>' => {
          url_chars.pop();
          let url_left: String = url_chars.iter().collect();
          if let Some(m) = TAG_TAIL_RE.captures(&url_left) {
            url_chars = m.get(1).map_or("", |g| g.as_str()).chars().collect();
            pop = format!("{}{c}{pop}", m.get(2).map_or("", |g| g.as_str()));
            popped = true;
          }
        },
        ']' => {
          let lbrackets =
            *count_lbracket.get_or_insert_with(|| url.matches('[').count());
          if lbrackets == count_rbracket {
            // Balanced, so it stays part of the url. The walk ends here.
            url_chars.push(c);
          } else {
            popped = true;
            url_chars.pop();
            count_rbracket = count_rbracket.saturating_sub(1);
            if first {
              pre.clear();
            }
          }
        },
        ')' => {
          if count_rparen.is_none() {
            count_lparen = Some(url.matches('(').count());
            count_rparen = Some(url.matches(')').count());
          }
          if count_lparen != count_rparen {
            popped = true;
            if let Some(last) = url_chars.pop() {
              pop = format!("{last}{pop}");
            }
            count_rparen = count_rparen.map(|n| n.saturating_sub(1));
          }
        },
        _ => {},
      }
      first = false;
      if !popped {
        break;
      }
    }

    let url: String = url_chars.into_iter().collect();
    let parts = urlsplit(&url);

    let valid_scheme =
      !parts.scheme.is_empty() && self.url_schemes.contains(&parts.scheme.as_str());
    if !is_valid_url(&url) && !valid_scheme {
      return whole.replace(&format!("{}linkStartMarker:", self.uid), "");
    }

    if text == "$" {
      text = if let Some((_, rest)) = url.split_once("://") {
        rest.to_string()
      } else if let Some((_, rest)) = url.split_once(':') {
        rest.to_string()
      } else {
        url.clone()
      };
    }

    let mut text = text.trim().to_string();
    let title = encode_html(&title, true);

    if !self.t.options.noimage {
      text = self.image(&text);
    }
    text = self.span(&text);
    text = self.glyphs(&text);

    let shelved_url = self.shelve_url(encode_url(&urlunsplit(&parts)));
    let mut attributes = parse_attributes(&atts, None, true);
    if !title.is_empty() {
      attributes.insert("title".to_string(), title);
    }
    attributes.insert("href".to_string(), shelved_url);
    if !self.rel.is_empty() {
      attributes.insert("rel".to_string(), self.rel.clone());
    }
    let a_tag = generate_tag("a", " /", &attributes);
    let a_text = format!("{}>{text}</a>", a_tag.trim_end_matches([' ', '/', '>']));
    let shelf_id = self.shelve(a_text);

    format!("{pre}{shelf_id}{pop}{tight}")
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
    let out = p.links(text);
    let out = p.retrieve(&out);
    p.retrieve_urls(&out)
  }

  #[test]
  fn simple_link() {
    assert_eq!(
      run("see \"the site\":http://example.com/ now"),
      "see <a href=\"http://example.com/\">the site</a> now"
    );
  }

  #[test]
  fn trailing_punctuation_stays_outside() {
    assert_eq!(
      run("go \"here\":http://example.com/page."),
      "go <a href=\"http://example.com/page\">here</a>."
    );
  }

  #[test]
  fn title_in_parentheses() {
    assert_eq!(
      run("\"docs(the manual)\":http://example.com/"),
      "<a title=\"the manual\" href=\"http://example.com/\">docs</a>"
    );
  }

  #[test]
  fn bad_scheme_is_not_linked() {
    let out = run("\"x\":javascript:alert(1)");
    assert!(!out.contains("<a "));
    assert!(out.contains("javascript:alert(1)"));
  }

  #[test]
  fn unicode_url_is_percent_encoded() {
    assert_eq!(
      run("\"w\":http://x.com/caf\u{e9}"),
      "<a href=\"http://x.com/caf%C3%A9\">w</a>"
    );
  }

  #[test]
  fn dollar_shorthand_uses_url_as_text() {
    assert_eq!(
      run("\"$\":http://x.com/path"),
      "<a href=\"http://x.com/path\">x.com/path</a>"
    );
  }

  #[test]
  fn dollar_shorthand_without_scheme_separator() {
    // A schemeless target keeps the whole url as the text.
    assert_eq!(run("\"$\":/about"), "<a href=\"/about\">/about</a>");
  }

  #[test]
  fn relative_url_is_allowed() {
    assert_eq!(
      run("\"about\":/about us"),
      "<a href=\"/about\">about</a> us"
    );
  }
}
