#![allow(
  clippy::expect_used,
  clippy::unwrap_used,
  clippy::panic,
  reason = "Fine in tests"
)]
//! Link and image rendering through the full pipeline.

use textile::textile;

#[test]
fn simple_link() {
  assert_eq!(
    textile("see \"the site\":http://example.com/ now"),
    "\t<p>see <a href=\"http://example.com/\">the site</a> now</p>"
  );
}

#[test]
fn link_with_title() {
  assert_eq!(
    textile("\"docs(the manual)\":http://example.com/"),
    "\t<p><a title=\"the manual\" href=\"http://example.com/\">docs</a></p>"
  );
}

#[test]
fn reference_alias_is_resolved_and_definition_removed() {
  assert_eq!(
    textile("[home]http://example.com/\n\nGo \"home\":home now"),
    "\t<p>Go <a href=\"http://example.com/\">home</a> now</p>"
  );
}

#[test]
fn url_as_text_shorthand() {
  assert_eq!(
    textile("\"$\":http://example.com/path"),
    "\t<p><a href=\"http://example.com/path\">example.com/path</a></p>"
  );
}

#[test]
fn trailing_punctuation_stays_outside_the_link() {
  assert_eq!(
    textile("go \"here\":http://example.com/page."),
    "\t<p>go <a href=\"http://example.com/page\">here</a>.</p>"
  );
}

#[test]
fn unsupported_scheme_is_not_linked() {
  let html = textile("\"x\":javascript:alert(1)");
  assert!(!html.contains("<a "), "{html}");
}

#[test]
fn non_ascii_url_is_percent_encoded() {
  assert_eq!(
    textile("\"w\":http://x.com/caf\u{e9}"),
    "\t<p><a href=\"http://x.com/caf%C3%A9\">w</a></p>"
  );
}

#[test]
fn basic_image() {
  assert_eq!(
    textile("!/img/x.png(My pic)!"),
    "\t<p><img alt=\"My pic\" src=\"/img/x.png\" title=\"My pic\" /></p>"
  );
}

#[test]
fn aligned_image_wrapped_in_link() {
  assert_eq!(
    textile("!>/img/x.png!:http://example.com/"),
    "\t<p><a href=\"http://example.com/\" class=\"img\"><img align=\"right\" alt=\"\" src=\"/img/x.png\" /></a></p>"
  );
}
