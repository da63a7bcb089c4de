//! Image markup: `!/path/img.png(alt text)!:http://link`.

use std::sync::LazyLock;

use crate::attrs::pba;
use crate::parser::Parser;
use crate::regexes::{CLS, fancy, group, substitute};
use crate::urlutils::is_rel_url;

static IMAGE_RE: LazyLock<fancy_regex::Regex> = LazyLock::new(|| {
  fancy(&format!(
    r"(?:[\[{{])?!(<|=|>)?({cls})(?:\. )?([^\s(!]+)\s?(?:\(([^)]+)\))?!(?::(\S+))?(?:[\]}}]|(?=\s|$))",
    cls = &*CLS
  ))
});

impl Parser<'_> {
  pub(crate) fn image(&mut self, text: &str) -> String {
    substitute(&IMAGE_RE, text, |caps| self.f_image(caps))
  }

  fn f_image(&mut self, caps: &fancy_regex::Captures<'_>) -> String {
    let align = group(caps, 1);
    let atts = pba(group(caps, 2), None, true);
    let url = group(caps, 3).to_string();
    let title = group(caps, 4);
    let href = group(caps, 5);

    let size = if !is_rel_url(&url) && self.t.options.get_sizes {
      self.t.image_sizes.as_ref().and_then(|lookup| lookup.size(&url))
    } else {
      None
    };

    let href_token = if href.is_empty() {
      String::new()
    } else {
      self.shelve_url(href.to_string())
    };
    let url_token = self.shelve_url(url);

    let mut out = String::new();
    if !href_token.is_empty() {
      out.push_str(&format!("<a href=\"{href_token}\" class=\"img\">"));
    }
    out.push_str("<img");
    match align {
      "<" => out.push_str(" align=\"left\""),
      "=" => out.push_str(" align=\"center\""),
      ">" => out.push_str(" align=\"right\""),
      _ => {},
    }
    out.push_str(&format!(" alt=\"{title}\""));
    if let Some((_, height)) = size {
      out.push_str(&format!(" height=\"{height}\""));
    }
    out.push_str(&format!(" src=\"{url_token}\""));
    out.push_str(&atts);
    if !title.is_empty() {
      out.push_str(&format!(" title=\"{title}\""));
    }
    if let Some((width, _)) = size {
      out.push_str(&format!(" width=\"{width}\""));
    }
    out.push_str(" />");
    if !href_token.is_empty() {
      out.push_str("</a>");
    }
    out
  }
}

#[cfg(test)]
mod tests {
  use crate::parser::Parser;
  use crate::{ImageSizeLookup, Textile, TextileOptions};

  fn run_with(t: &Textile, text: &str) -> String {
    let mut p = Parser::new(t);
    let out = p.image(text);
    p.retrieve_urls(&out)
  }

  fn run(text: &str) -> String {
    let t = match Textile::new(TextileOptions::default()) {
      Ok(t) => t,
      Err(e) => panic!("default options rejected: {e}"),
    };
    run_with(&t, text)
  }

  #[test]
  fn basic_image_with_alt() {
    assert_eq!(
      run("!/img/x.png(My pic)!"),
      "<img alt=\"My pic\" src=\"/img/x.png\" title=\"My pic\" />"
    );
  }

  #[test]
  fn image_without_title_has_empty_alt() {
    assert_eq!(run("!/img/x.png!"), "<img alt=\"\" src=\"/img/x.png\" />");
  }

  #[test]
  fn aligned_image_with_link() {
    assert_eq!(
      run("!>/img/x.png!:http://example.com/"),
      "<a href=\"http://example.com/\" class=\"img\">\
       <img align=\"right\" alt=\"\" src=\"/img/x.png\" /></a>"
    );
  }

  #[test]
  fn sizes_come_from_the_lookup() {
    struct Fixed;
    impl ImageSizeLookup for Fixed {
      fn size(&self, _url: &str) -> Option<(u32, u32)> {
        Some((640, 480))
      }
    }
    let t = match Textile::new(TextileOptions {
      get_sizes: true,
      ..TextileOptions::default()
    }) {
      Ok(t) => t.with_image_sizes(Box::new(Fixed)),
      Err(e) => panic!("options rejected: {e}"),
    };
    assert_eq!(
      run_with(&t, "!http://example.com/x.png!"),
      "<img alt=\"\" height=\"480\" src=\"http://example.com/x.png\" width=\"640\" />"
    );
  }
}
