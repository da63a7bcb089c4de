//! Footnotes and endnotes.
//!
//! Footnotes pair an inline `[1]` reference with an `fn1. ...` block.
//! Endnotes are labelled: `[#label]` references collect against a
//! `note#label. ...` definition, and a `notelist.` block renders them all,
//! ordered by first reference, with configurable backlinks.

use std::sync::LazyLock;

use crate::attrs::pba;
use crate::parser::Parser;
use crate::regexes::{CLS, SPACE, SYMS, fancy, group, plain, substitute};

/// An endnote accumulated from `[#label]` references and a `note#label.`
/// definition; either side may be missing.
#[derive(Clone, Default)]
pub(crate) struct Note {
  pub(crate) label: String,
  pub(crate) id: String,
  /// Order of first reference. Definition-only notes have none until a
  /// reference arrives.
  pub(crate) seq: Option<usize>,
  pub(crate) refids: Vec<String>,
  pub(crate) def: Option<NoteDef>,
}

#[derive(Clone)]
pub(crate) struct NoteDef {
  pub(crate) atts: String,
  pub(crate) content: String,
  pub(crate) link: String,
}

static FOOTNOTE_REF_RE: LazyLock<fancy_regex::Regex> = LazyLock::new(|| {
  fancy(&format!(r"(?<=\S)\[(\p{{N}}+)(!?)\]({SPACE}?)"))
});

pub(crate) static NOTEDEF_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
  plain(&format!(
    r"^note#([^%<*!@#^(\[{{ {space}.]+)([*!^]?)({cls})\.?[{space} ]+(.*)$",
    space = SPACE,
    cls = &*CLS
  ))
});

static NOTE_REF_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
  plain(&format!(r"\[({cls})#([^\]!]+)(!?)\]", cls = &*CLS))
});

static NOTELIST_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
  plain(&format!(
    r"<p>notelist({cls})(?::([\w|{syms}]))?([\^!]?)(\+?)\.?[\s]*</p>",
    cls = &*CLS,
    syms = SYMS
  ))
});

/// The marker put in front of a footnote paragraph's content.
pub(crate) fn format_footnote(marker: &str, atts: &str) -> String {
  format!("<sup{atts}>{marker}</sup>")
}

impl Parser<'_> {
  /// Turn `[n]` markers into superscript footnote links.
  pub(crate) fn footnote_ref(&mut self, text: &str) -> String {
    substitute(&FOOTNOTE_REF_RE, text, |caps| {
      self.footnote_id(
        group(caps, 1),
        group(caps, 2) == "!",
        group(caps, 3),
      )
    })
  }

  fn footnote_id(&mut self, index: &str, nolink: bool, space: &str) -> String {
    let mut backref = String::from(" class=\"footnote\"");
    if !self.footnotes.contains_key(index) {
      let link_index = self.increment_link_index();
      let fnid = format!("{}{link_index}", self.link_prefix);
      backref = format!("{backref} id=\"fnrev{fnid}\"");
      self.footnotes.insert(index.to_string(), fnid);
    }
    let fnid = self
      .footnotes
      .get(index)
      .cloned()
      .unwrap_or_default();
    let footref = if nolink {
      index.to_string()
    } else {
      format!("<a href=\"#fn{fnid}\">{index}</a>")
    };
    format!("{}{space}", format_footnote(&footref, &backref))
  }

  /// Capture a `note#label.` definition. The block is consumed; the note is
  /// rendered later by the notelist.
  pub(crate) fn f_parse_note_defs(&mut self, caps: &regex::Captures<'_>) -> String {
    let part = |i: usize| caps.get(i).map_or("", |m| m.as_str());
    let label = part(1).to_string();
    let link = part(2).to_string();
    let att = part(3);
    let content = part(4);

    if !self.notes.contains_key(&label) {
      let link_index = self.increment_link_index();
      let id = format!("{}{link_index}", self.link_prefix);
      self.notes.insert(
        label.clone(),
        Note {
          label: label.clone(),
          id,
          ..Note::default()
        },
      );
    }

    // Later definitions reusing a label are ignored.
    let atts = pba(att, None, true);
    let content = self.graf(content);
    if let Some(note) = self.notes.get_mut(&label) {
      if note.def.is_none() {
        note.def = Some(NoteDef {
          atts,
          content,
          link,
        });
      }
    }
    String::new()
  }

  /// Turn `[#label]` markers into superscript endnote links, assigning
  /// sequence numbers in order of first reference.
  pub(crate) fn note_ref(&mut self, text: &str) -> String {
    NOTE_REF_RE
      .replace_all(text, |caps: &regex::Captures<'_>| {
        self.f_parse_note_refs(caps)
      })
      .into_owned()
  }

  fn f_parse_note_refs(&mut self, caps: &regex::Captures<'_>) -> String {
    let part = |i: usize| caps.get(i).map_or("", |m| m.as_str());
    let atts = pba(part(1), None, true);
    let label = part(2).to_string();
    let nolink = part(3) == "!";

    // A note defined before it is first referenced exists without a
    // sequence number; it receives the next one here.
    let num = match self.notes.get(&label).and_then(|n| n.seq) {
      Some(seq) => seq,
      None => {
        let seq = self.note_index;
        self.note_index += 1;
        let entry = self.notes.entry(label.clone()).or_insert_with(|| Note {
          label: label.clone(),
          ..Note::default()
        });
        entry.seq = Some(seq);
        seq
      },
    };

    let ref_index = self.increment_link_index();
    let refid = format!("{}{ref_index}", self.link_prefix);
    let labelid = {
      let needs_id = self
        .notes
        .get(&label)
        .is_none_or(|n| n.id.is_empty());
      let id = if needs_id {
        let id_index = self.increment_link_index();
        format!("{}{id_index}", self.link_prefix)
      } else {
        String::new()
      };
      match self.notes.get_mut(&label) {
        Some(note) => {
          note.refids.push(refid.clone());
          if note.id.is_empty() {
            note.id = id;
          }
          note.id.clone()
        },
        None => id,
      }
    };

    let mut result = format!("<span id=\"noteref{refid}\">{num}</span>");
    if !nolink {
      result = format!("<a href=\"#note{labelid}\">{result}</a>");
    }
    format!("<sup{atts}>{result}</sup>")
  }

  /// Order the collected notes by first reference and expand `notelist.`
  /// placeholders.
  pub(crate) fn place_note_lists(&mut self, text: &str) -> String {
    if !self.notes_ordered && !self.notes.is_empty() {
      let notes = std::mem::take(&mut self.notes);
      let mut ordered: Vec<Note> = Vec::new();
      for (_, note) in notes {
        if note.seq.is_some() {
          ordered.push(note);
        } else {
          self.unreferenced_notes.push(note);
        }
      }
      ordered.sort_by_key(|n| n.seq.unwrap_or(0));
      self.ordered_notes = ordered;
      self.notes_ordered = true;
    }

    NOTELIST_RE
      .replace_all(text, |caps: &regex::Captures<'_>| self.f_note_lists(caps))
      .into_owned()
  }

  fn f_note_lists(&mut self, caps: &regex::Captures<'_>) -> String {
    let part = |i: usize| caps.get(i).map_or("", |m| m.as_str());
    let att = part(1);
    let start_char = part(2).chars().next().unwrap_or('a');
    let g_links = part(3);
    let extras = part(4);

    // Each distinct notelist flavor renders once; repeats come out empty.
    let index = format!("{g_links}{extras}{start_char}");
    if self.notelist_cache.contains_key(&index) {
      return String::new();
    }

    let mut items: Vec<String> = Vec::new();
    for info in self.ordered_notes.clone() {
      let links = self.make_backref_link(&info, g_links, start_char);
      match &info.def {
        Some(def) => items.push(format!(
          "\t\t<li{}>{links}<span id=\"note{}\"> </span>{}</li>",
          def.atts, info.id, def.content
        )),
        None => items.push(format!(
          "\t\t<li>{links} Undefined Note [#{}].<li>",
          info.label
        )),
      }
    }
    if extras == "+" {
      for info in &self.unreferenced_notes {
        if let Some(def) = &info.def {
          items.push(format!("\t\t<li{}>{}</li>", def.atts, def.content));
        }
      }
    }

    let result = items.join("\n");
    self.notelist_cache.insert(index, result.clone());
    if result.is_empty() {
      return result;
    }
    let list_atts = pba(att, None, true);
    format!("<ol{list_atts}>\n{result}\n\t</ol>")
  }

  fn make_backref_link(&self, info: &Note, g_links: &str, start: char) -> String {
    let link = info.def.as_ref().map_or("", |d| d.link.as_str());
    let backlink_type = if link.is_empty() { g_links } else { link };
    let allow_inc = !SYMS.contains(start);
    let mut code = start as u32;

    match backlink_type {
      "!" => String::new(),
      "^" => {
        let refid = info.refids.first().map_or("", String::as_str);
        format!("<sup><a href=\"#noteref{refid}\">{start}</a></sup>")
      },
      _ => {
        let mut out: Vec<String> = Vec::new();
        for refid in &info.refids {
          let marker = char::from_u32(code).unwrap_or('\u{fffd}');
          out.push(format!(
            "<sup><a href=\"#noteref{refid}\">{marker}</a></sup>"
          ));
          if allow_inc {
            code += 1;
          }
        }
        out.join(" ")
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use crate::parser::Parser;
  use crate::{Textile, TextileOptions};

  fn converter() -> Textile {
    match Textile::new(TextileOptions::default()) {
      Ok(t) => t,
      Err(e) => panic!("default options rejected: {e}"),
    }
  }

  fn strip_uid(p: &Parser<'_>, text: &str) -> String {
    text.replace(&p.link_prefix, "U-")
  }

  #[test]
  fn footnote_reference_markup() {
    let t = converter();
    let mut p = Parser::new(&t);
    let out = p.footnote_ref("some text[1] here");
    assert_eq!(
      strip_uid(&p, &out),
      "some text<sup class=\"footnote\" id=\"fnrevU-1\">\
       <a href=\"#fnU-1\">1</a></sup> here"
    );
  }

  #[test]
  fn repeated_footnote_reference_gets_no_second_backref_id() {
    let t = converter();
    let mut p = Parser::new(&t);
    let out = p.footnote_ref("a[1] b[1]");
    let out = strip_uid(&p, &out);
    assert_eq!(out.matches("id=\"fnrevU-1\"").count(), 1);
    assert_eq!(out.matches("href=\"#fnU-1\"").count(), 2);
  }

  #[test]
  fn nolink_footnote_reference() {
    let t = converter();
    let mut p = Parser::new(&t);
    let out = p.footnote_ref("text[1!]");
    let out = strip_uid(&p, &out);
    assert_eq!(
      out,
      "text<sup class=\"footnote\" id=\"fnrevU-1\">1</sup>"
    );
  }

  #[test]
  fn note_refs_are_numbered_in_reference_order() {
    let t = converter();
    let mut p = Parser::new(&t);
    let out = p.note_ref("first[#b] then[#a] and[#b] again");
    assert!(out.contains(">1</span>"));
    assert!(out.contains(">2</span>"));
    assert_eq!(out.matches(">1</span>").count(), 2);
    assert_eq!(
      p.notes.get("b").and_then(|n| n.seq),
      Some(1)
    );
    assert_eq!(
      p.notes.get("a").and_then(|n| n.seq),
      Some(2)
    );
  }

  #[test]
  fn referenced_note_renders_in_the_list() {
    let t = converter();
    let mut p = Parser::new(&t);
    let text = p.note_ref("claim[#src]");
    let defs = crate::notes::NOTEDEF_RE
      .replace_all("note#src. The source.", |caps: &regex::Captures<'_>| {
        p.f_parse_note_defs(caps)
      })
      .into_owned();
    assert_eq!(defs, "");
    let out = p.place_note_lists(&format!("{text}\n<p>notelist.</p>"));
    let out = strip_uid(&p, &out);
    assert!(out.contains("<ol>"), "{out}");
    assert!(out.contains("<span id=\"noteU-2\"> </span>The source."), "{out}");
    assert!(out.contains("<sup><a href=\"#noterefU-1\">a</a></sup>"), "{out}");
  }

  #[test]
  fn unreferenced_note_needs_the_plus_flavor() {
    let t = converter();
    let mut p = Parser::new(&t);
    let defs = crate::notes::NOTEDEF_RE
      .replace_all("note#orphan. Lost.", |caps: &regex::Captures<'_>| {
        p.f_parse_note_defs(caps)
      })
      .into_owned();
    assert_eq!(defs, "");
    let plain_list = p.place_note_lists("<p>notelist.</p>");
    assert_eq!(plain_list, "");
    let with_extras = p.place_note_lists("<p>notelist+.</p>");
    assert!(with_extras.contains("<li>Lost.</li>"), "{with_extras}");
  }

  #[test]
  fn repeated_notelist_flavor_renders_once() {
    let t = converter();
    let mut p = Parser::new(&t);
    let text = p.note_ref("x[#n]");
    let defs = crate::notes::NOTEDEF_RE
      .replace_all("note#n. N.", |caps: &regex::Captures<'_>| {
        p.f_parse_note_defs(caps)
      })
      .into_owned();
    assert_eq!(defs, "");
    let out =
      p.place_note_lists(&format!("{text}\n<p>notelist.</p>\n<p>notelist.</p>"));
    assert_eq!(out.matches("<ol>").count(), 1);
  }
}
