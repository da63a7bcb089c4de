//! Block-level structure: paragraphs, headings, blockquotes, code blocks,
//! footnote definitions and extended blocks.
//!
//! The document is cut at blank lines. A signature like `h2(cls).` opens a
//! block; a double period (`bq..`) extends it over following anonymous
//! paragraphs until the next signature closes it.

use std::sync::LazyLock;

use crate::attrs::pba;
use crate::html::{encode_html, has_raw_text};
use crate::notes::{NOTEDEF_RE, format_footnote};
use crate::parser::Parser;
use crate::regexes::{ALIGN, CLS, fancy, group};

static BLOCK_RE: LazyLock<fancy_regex::Regex> = LazyLock::new(|| {
  fancy(&format!(
    r"(?s)^(bq|bc|notextile|pre|h[1-6]|fn\d+|p|###)({align}{cls})\.(\.?)(?::(\S+))? (.*)$",
    align = &*ALIGN,
    cls = &*CLS
  ))
});
static BLOCK_LITE_RE: LazyLock<fancy_regex::Regex> = LazyLock::new(|| {
  fancy(&format!(
    r"(?s)^(bq|bc|p)({align}{cls})\.(\.?)(?::(\S+))? (.*)$",
    align = &*ALIGN,
    cls = &*CLS
  ))
});
static FN_TAG_RE: LazyLock<regex::Regex> =
  LazyLock::new(|| crate::regexes::plain(r"fn(\d+)"));

struct BlockPieces {
  o1: String,
  o2: String,
  content: String,
  c2: String,
  c1: String,
  eat: bool,
}

impl Parser<'_> {
  pub(crate) fn block(&mut self, text: &str) -> String {
    let signature: &fancy_regex::Regex = if self.t.options.lite {
      &BLOCK_LITE_RE
    } else {
      &BLOCK_RE
    };

    let mut tag = String::from("p");
    let mut atts = String::new();
    let mut cite = String::new();
    let mut ext = String::new();
    let mut c1 = String::new();
    let mut anon = false;
    let mut eat = false;
    let mut out: Vec<String> = Vec::new();

    for line in text.split("\n\n") {
      let groups = signature.captures(line).ok().flatten().map(|m| {
        (
          group(&m, 1).to_string(),
          group(&m, 2).to_string(),
          group(&m, 3).to_string(),
          group(&m, 4).to_string(),
          group(&m, 5).to_string(),
        )
      });

      let mut line_out;
      if let Some((m_tag, m_atts, m_ext, m_cite, content)) = groups {
        // A new signature ends any still-open extended block.
        if !ext.is_empty() {
          if let Some(prev) = out.pop() {
            out.push(format!("{prev}{c1}"));
          }
        }

        tag = m_tag;
        atts = m_atts;
        ext = m_ext;
        cite = m_cite;
        let pieces = self.f_block(&tag, &atts, &cite, &content);
        c1 = pieces.c1.clone();
        eat = pieces.eat;
        // An extended block keeps o1/c1 for the lines that follow.
        line_out = if ext.is_empty() {
          format!(
            "{}{}{}{}{}",
            pieces.o1, pieces.o2, pieces.content, pieces.c2, pieces.c1
          )
        } else {
          format!("{}{}{}{}", pieces.o1, pieces.o2, pieces.content, pieces.c2)
        };
      } else {
        anon = true;
        if !ext.is_empty() || !line.starts_with(char::is_whitespace) {
          let pieces = self.f_block(&tag, &atts, &cite, line);
          c1 = pieces.c1;
          eat = pieces.eat;
          line_out = if tag == "p" && !has_raw_text(&pieces.content) {
            pieces.content
          } else {
            format!("{}{}{}", pieces.o2, pieces.content, pieces.c2)
          };
        } else {
          line_out = self.graf(line);
        }
      }

      line_out = self.do_p_br(&line_out);
      line_out = line_out.replace("<br>", "<br />");

      if !ext.is_empty() && anon {
        match out.pop() {
          Some(prev) => out.push(format!("{prev}\n{line_out}")),
          None => out.push(line_out),
        }
      } else if !eat && !line_out.is_empty() {
        out.push(line_out);
      }

      if ext.is_empty() {
        tag = String::from("p");
        atts.clear();
        cite.clear();
      }
    }

    if !ext.is_empty() {
      if let Some(prev) = out.pop() {
        out.push(format!("{prev}{c1}"));
      }
    }
    out.join("\n\n")
  }

  fn f_block(&mut self, tag: &str, atts_raw: &str, cite: &str, content: &str) -> BlockPieces {
    let mut atts = pba(atts_raw, None, !self.t.options.restricted);
    let mut tag = tag.to_string();
    let mut content = content.to_string();
    let mut o1 = String::new();
    let mut o2 = String::new();
    let mut c2 = String::new();
    let mut c1 = String::new();
    let mut eat = false;

    if tag == "p" {
      let notedef = NOTEDEF_RE
        .replace_all(&content, |caps: &regex::Captures<'_>| {
          self.f_parse_note_defs(caps)
        })
        .into_owned();
      // Empty means the whole paragraph was note definitions.
      if notedef.is_empty() {
        return BlockPieces {
          o1,
          o2,
          content: notedef,
          c2,
          c1,
          eat: true,
        };
      }
    }

    let fn_index = FN_TAG_RE
      .captures(&tag)
      .map(|m| m.get(1).map_or("", |g| g.as_str()).to_string());
    if let Some(fn_index) = fn_index {
      tag = String::from("p");
      let fnid = match self.footnotes.get(&fn_index) {
        Some(id) => id.clone(),
        None => {
          // Register the generated id so a reference appearing after the
          // definition still points at it.
          let index = self.increment_link_index();
          let id = format!("{}{index}", self.link_prefix);
          self.footnotes.insert(fn_index.clone(), id.clone());
          id
        },
      };

      // An author-specified id goes on the wrapper and pushes the
      // generated one onto the sup.
      let mut supp_id = String::new();
      if !atts.contains("class=") {
        atts = format!("{atts} class=\"footnote\"");
      }
      if atts.contains("id=") {
        supp_id = format!(" id=\"fn{fnid}\"");
      } else {
        atts = format!("{atts} id=\"fn{fnid}\"");
      }

      let sup = if atts_raw.contains('^') {
        let fnrev = format!("<a href=\"#fnrev{fnid}\">{fn_index}</a>");
        format_footnote(&fnrev, &supp_id)
      } else {
        format_footnote(&fn_index, &supp_id)
      };
      content = format!("{sup} {content}");
    }

    match tag.as_str() {
      "bq" => {
        let cite_att = if cite.is_empty() {
          String::new()
        } else {
          let token = self.shelve_url(cite.to_string());
          format!(" cite=\"{token}\"")
        };
        o1 = format!("\t<blockquote{cite_att}{atts}>\n");
        o2 = format!("\t\t<p{atts}>");
        c2 = String::from("</p>");
        c1 = String::from("\n\t</blockquote>");
      },
      "bc" | "pre" => {
        o1 = format!("<pre{atts}>");
        if tag == "bc" {
          o2 = format!("<code{atts}>");
          c2 = String::from("</code>");
        }
        c1 = String::from("</pre>");
        let escaped =
          encode_html(&format!("{}\n", content.trim_end_matches('\n')), true);
        content = self.shelve(escaped);
      },
      "notextile" => {
        content = self.shelve(content);
      },
      "###" => eat = true,
      _ => {
        o2 = format!("\t<{tag}{atts}>");
        c2 = format!("</{tag}>");
      },
    }

    content = if eat {
      String::new()
    } else {
      self.graf(&content)
    };
    BlockPieces {
      o1,
      o2,
      content,
      c2,
      c1,
      eat,
    }
  }
}
