//! A converter from Textile markup to HTML.
//!
//! Textile is a lightweight markup language: paragraphs, headings, lists,
//! tables, links, images, footnotes and endnotes, plus inline phrase markup
//! and typographic glyph substitution (curly quotes, dashes, ellipses,
//! acronyms).
//!
//! The one-shot [`textile`] function covers the common case:
//!
//! ```
//! use textile::textile;
//!
//! let html = textile("h2. Hello\n\nA *fine* day.");
//! assert_eq!(html, "\t<h2>Hello</h2>\n\n\t<p>A <strong>fine</strong> day.</p>");
//! ```
//!
//! For untrusted input, [`textile_restricted`] escapes raw HTML, drops
//! author-supplied ids and images, and marks links `rel="nofollow"`.
//! Everything else is configured through [`TextileOptions`] and
//! [`Textile::new`]:
//!
//! ```
//! use textile::{HtmlKind, Textile, TextileOptions};
//!
//! let converter = Textile::new(TextileOptions {
//!   html_kind: HtmlKind::Html5,
//!   ..TextileOptions::default()
//! })?;
//! let html = converter.parse("CSS(Cascading Style Sheets)");
//! assert!(html.contains("<abbr title=\"Cascading Style Sheets\">"));
//! # Ok::<(), textile::ConfigError>(())
//! ```
//!
//! Conversion never fails: malformed markup renders as literal text instead
//! of aborting the conversion.

mod attrs;
mod block;
mod glyphs;
mod html;
mod image;
mod links;
mod lists;
mod notes;
mod parser;
mod regexes;
mod span;
mod table;
mod urlutils;

mod error;

pub use error::ConfigError;

use crate::parser::Parser;

/// The flavor of HTML to emit.
///
/// The two flavors differ only where the vocabularies diverge, most visibly
/// in acronym markup: XHTML uses `<acronym>`, HTML5 uses `<abbr>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HtmlKind {
  /// XHTML 1.0 output. The default, matching classic Textile.
  #[default]
  Xhtml,
  /// HTML5 output.
  Html5,
}

/// Configuration for a [`Textile`] converter.
#[derive(Debug, Clone)]
pub struct TextileOptions {
  /// Escape raw HTML in the source and drop author-supplied ids. For
  /// untrusted input.
  pub restricted: bool,
  /// Only allow inline markup and plain paragraphs; block-level syntax
  /// (headings, lists, tables) renders literally. Requires `restricted`.
  pub lite: bool,
  /// Leave image syntax untouched instead of rendering `<img>` tags.
  pub noimage: bool,
  /// Consult the configured size lookup to add `width`/`height` attributes
  /// to images.
  pub get_sizes: bool,
  /// The HTML flavor to emit.
  pub html_kind: HtmlKind,
  /// A `rel` attribute added to every generated link, e.g. `"nofollow"`.
  /// Empty means none.
  pub rel: String,
  /// When unset, skip block parsing entirely and only apply inline markup
  /// and glyphs to the input.
  pub block_tags: bool,
}

impl Default for TextileOptions {
  fn default() -> Self {
    Self {
      restricted: false,
      lite: false,
      noimage: false,
      get_sizes: false,
      html_kind: HtmlKind::Xhtml,
      rel: String::new(),
      block_tags: true,
    }
  }
}

/// A post-processing hook that sanitizes the generated HTML.
///
/// Installing a sanitizer via [`Textile::with_sanitizer`] enables the
/// sanitization stage; without one, the stage is skipped.
pub trait Sanitizer {
  /// Sanitize a complete HTML document fragment.
  fn sanitize(&self, html: &str, kind: HtmlKind) -> String;
}

/// A lookup for the intrinsic dimensions of images, used when
/// [`TextileOptions::get_sizes`] is set.
pub trait ImageSizeLookup {
  /// The `(width, height)` of the image at `url`, if known.
  fn size(&self, url: &str) -> Option<(u32, u32)>;
}

/// A configured Textile-to-HTML converter.
///
/// The converter itself is immutable; per-document state lives in the
/// conversion run, so one converter can be reused across documents.
pub struct Textile {
  pub(crate) options: TextileOptions,
  pub(crate) sanitizer: Option<Box<dyn Sanitizer>>,
  pub(crate) image_sizes: Option<Box<dyn ImageSizeLookup>>,
}

impl Textile {
  /// Build a converter from the given options.
  ///
  /// # Errors
  ///
  /// Returns [`ConfigError::LiteRequiresRestricted`] when `lite` is set
  /// without `restricted`.
  pub fn new(options: TextileOptions) -> Result<Self, ConfigError> {
    if options.lite && !options.restricted {
      return Err(ConfigError::LiteRequiresRestricted);
    }
    Ok(Self {
      options,
      sanitizer: None,
      image_sizes: None,
    })
  }

  /// Install a sanitizer, enabling the sanitization stage of the pipeline.
  #[must_use]
  pub fn with_sanitizer(mut self, sanitizer: Box<dyn Sanitizer>) -> Self {
    self.sanitizer = Some(sanitizer);
    self
  }

  /// Install an image size lookup, consulted when
  /// [`TextileOptions::get_sizes`] is set.
  #[must_use]
  pub fn with_image_sizes(mut self, lookup: Box<dyn ImageSizeLookup>) -> Self {
    self.image_sizes = Some(lookup);
    self
  }

  /// Convert a Textile document to HTML.
  #[must_use]
  pub fn parse(&self, text: &str) -> String {
    Parser::new(self).run(text)
  }
}

/// Convert trusted Textile markup to XHTML with default options.
#[must_use]
pub fn textile(text: &str) -> String {
  let options = TextileOptions::default();
  match Textile::new(options) {
    Ok(converter) => converter.parse(text),
    // Default options are always consistent.
    Err(_) => text.to_string(),
  }
}

/// Convert untrusted Textile markup to XHTML.
///
/// Raw HTML is escaped, author ids and images are dropped, block-level
/// syntax renders literally, and links carry `rel="nofollow"`.
#[must_use]
pub fn textile_restricted(text: &str) -> String {
  let options = TextileOptions {
    restricted: true,
    lite: true,
    noimage: true,
    rel: "nofollow".to_string(),
    ..TextileOptions::default()
  };
  match Textile::new(options) {
    Ok(converter) => converter.parse(text),
    Err(_) => text.to_string(),
  }
}
