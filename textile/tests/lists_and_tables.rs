#![allow(
  clippy::expect_used,
  clippy::unwrap_used,
  clippy::panic,
  reason = "Fine in tests"
)]
//! Lists and tables through the full pipeline.

use textile::textile;

#[test]
fn unordered_list() {
  assert_eq!(
    textile("* one\n* two"),
    "\t<ul>\n\t\t<li>one</li>\n\t\t<li>two</li>\n\t</ul>"
  );
}

#[test]
fn ordered_list_with_explicit_start() {
  assert_eq!(
    textile("#3 three\n# four"),
    "\t<ol start=\"3\">\n\t\t<li>three</li>\n\t\t<li>four</li>\n\t</ol>"
  );
}

#[test]
fn nested_unordered_list() {
  assert_eq!(
    textile("* a\n** b\n* c"),
    "\t<ul>\n\t\t<li>a\n\t<ul>\n\t\t<li>b</li>\n\t</ul></li>\n\t\t<li>c</li>\n\t</ul>"
  );
}

#[test]
fn definition_list() {
  assert_eq!(
    textile("; term\n: definition"),
    "\t<dl>\n\t\t<dt>term</dt>\n\t\t<dd>definition</dd>\n\t</dl>"
  );
}

#[test]
fn redcloth_definition_list() {
  assert_eq!(
    textile("- t := d"),
    "<dl>\n\t<dt>t</dt>\n\t<dd>d</dd>\n</dl>"
  );
}

#[test]
fn table_with_header_cells() {
  assert_eq!(
    textile("|_. h1|_. h2|\n|a|b|"),
    "\t<table>\n\t\t<tr>\n\t\t\t<th>h1</th>\n\t\t\t<th>h2</th>\n\t\t</tr>\n\t\t<tr>\n\t\t\t<td>a</td>\n\t\t\t<td>b</td>\n\t\t</tr>\n\t</table>"
  );
}

#[test]
fn header_marker_without_dot_stays_in_the_cell() {
  // `|_ x|` marks a header cell but only `|_. x|` consumes the marker.
  assert_eq!(
    textile("|_ h1|\n|a|"),
    "\t<table>\n\t\t<tr>\n\t\t\t<th>_ h1</th>\n\t\t</tr>\n\t\t<tr>\n\t\t\t<td>a</td>\n\t\t</tr>\n\t</table>"
  );
}

#[test]
fn table_and_row_attributes() {
  assert_eq!(
    textile("table(data).\n(odd). |a|"),
    "\t<table class=\"data\">\n\t\t<tr class=\"odd\">\n\t\t\t<td>a</td>\n\t\t</tr>\n\t</table>"
  );
}

#[test]
fn table_with_caption_and_colgroup() {
  assert_eq!(
    textile("|=. Results\n|:\\2. 100|\n|a|b|"),
    "\t<table>\n\t<caption>Results</caption>\n\t<colgroup span=\"2\" width=\"100\">\n\t</colgroup>\n\t\t<tr>\n\t\t\t<td>a</td>\n\t\t\t<td>b</td>\n\t\t</tr>\n\t</table>"
  );
}

#[test]
fn table_row_groups() {
  assert_eq!(
    textile("|^.\n|_. h|\n|-.\n|a|"),
    "\t<table>\n\t<thead>\n\t\t<tr>\n\t\t\t<th>h</th>\n\t\t</tr>\n\t</thead>\n\t<tbody>\n\t\t<tr>\n\t\t\t<td>a</td>\n\t\t</tr>\n\t</tbody>\n\t</table>"
  );
}

#[test]
fn cell_spans_and_vertical_alignment() {
  assert_eq!(
    textile("|\\2. wide|\n|^. top|x|"),
    "\t<table>\n\t\t<tr>\n\t\t\t<td colspan=\"2\">wide</td>\n\t\t</tr>\n\t\t<tr>\n\t\t\t<td style=\"vertical-align:top;\">top</td>\n\t\t\t<td>x</td>\n\t\t</tr>\n\t</table>"
  );
}
