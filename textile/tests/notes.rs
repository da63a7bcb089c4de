#![allow(
  clippy::expect_used,
  clippy::unwrap_used,
  clippy::panic,
  reason = "Fine in tests"
)]
//! Footnotes and endnotes through the full pipeline.
//!
//! Generated link ids embed a random per-run prefix; `normalized` rewrites
//! the prefix to `U-` so outputs compare stably.

use regex::Regex;
use textile::textile;

fn normalized(text: &str) -> String {
  let prefix = Regex::new(r"[0-9a-f]{32}-").expect("prefix pattern compiles");
  prefix.replace_all(&textile(text), "U-").into_owned()
}

#[test]
fn footnote_reference_and_definition() {
  assert_eq!(
    normalized("A claim[1] here.\n\nfn1. The note."),
    "\t<p>A claim<sup class=\"footnote\" id=\"fnrevU-1\"><a href=\"#fnU-1\">1</a></sup> here.</p>\n\n\t<p class=\"footnote\" id=\"fnU-1\"><sup>1</sup> The note.</p>"
  );
}

#[test]
fn footnote_defined_before_reference_shares_one_id() {
  let html = normalized("fn1. The note.\n\nA claim[1] here.");
  assert_eq!(html.matches("fnU-1").count(), 2, "{html}");
  assert!(html.contains("id=\"fnU-1\""), "{html}");
  assert!(html.contains("href=\"#fnU-1\""), "{html}");
}

#[test]
fn endnotes_render_in_reference_order() {
  assert_eq!(
    normalized(
      "Point one.[#cite1]\n\nPoint two.[#cite2]\n\nnote#cite1. First source.\n\nnote#cite2. Second source.\n\nnotelist."
    ),
    "\t<p>Point one.<sup><a href=\"#noteU-2\"><span id=\"noterefU-1\">1</span></a></sup></p>\n\n\t<p>Point two.<sup><a href=\"#noteU-4\"><span id=\"noterefU-3\">2</span></a></sup></p>\n\n\t<ol>\n\t\t<li><sup><a href=\"#noterefU-1\">a</a></sup><span id=\"noteU-2\"> </span>First source.</li>\n\t\t<li><sup><a href=\"#noterefU-3\">a</a></sup><span id=\"noteU-4\"> </span>Second source.</li>\n\t</ol>"
  );
}

#[test]
fn notelist_without_backlinks() {
  assert_eq!(
    normalized("Fact.[#a]\n\nnote#a. Source.\n\nnotelist!."),
    "\t<p>Fact.<sup><a href=\"#noteU-2\"><span id=\"noterefU-1\">1</span></a></sup></p>\n\n\t<ol>\n\t\t<li><span id=\"noteU-2\"> </span>Source.</li>\n\t</ol>"
  );
}

#[test]
fn undefined_note_is_reported_in_the_list() {
  assert_eq!(
    normalized("Mystery.[#ghost]\n\nnotelist."),
    "\t<p>Mystery.<sup><a href=\"#noteU-2\"><span id=\"noterefU-1\">1</span></a></sup></p>\n\n\t<ol>\n\t\t<li><sup><a href=\"#noterefU-1\">a</a></sup> Undefined Note [#ghost].<li>\n\t</ol>"
  );
}

#[test]
fn definition_label_stops_at_punctuation() {
  // `?` is outside the definition label grammar, so `note#a?b.` defines a
  // note labelled `a` and the `[#a?b]` reference stays undefined.
  assert_eq!(
    normalized("Fact.[#a?b]\n\nnote#a?b. Source.\n\nnotelist."),
    "\t<p>Fact.<sup><a href=\"#noteU-2\"><span id=\"noterefU-1\">1</span></a></sup></p>\n\n\t<ol>\n\t\t<li><sup><a href=\"#noterefU-1\">a</a></sup> Undefined Note [#a?b].<li>\n\t</ol>"
  );
}

#[test]
fn unreferenced_note_only_renders_with_plus() {
  assert_eq!(
    normalized("note#extra. Spare.\n\nnotelist+."),
    "\t<ol>\n\t\t<li>Spare.</li>\n\t</ol>"
  );
}
