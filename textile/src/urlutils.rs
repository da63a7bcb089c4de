//! URL splitting, joining and percent-encoding.
//!
//! Link targets in the source markup are written by humans, so they arrive
//! with unencoded spaces, non-ASCII characters and stray punctuation. The
//! resolver splits a candidate into its five components, percent-encodes
//! each with the appropriate set of safe characters, and reassembles it.

use std::sync::LazyLock;

use crate::regexes::plain;

/// The five components of a split URL.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct UrlParts {
  pub scheme: String,
  pub netloc: String,
  pub path: String,
  pub query: String,
  pub fragment: String,
}

fn is_scheme(candidate: &str) -> bool {
  let mut chars = candidate.chars();
  match chars.next() {
    Some(c) if c.is_ascii_alphabetic() => {},
    _ => return false,
  }
  chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Split a URL into scheme, network location, path, query and fragment.
pub(crate) fn urlsplit(url: &str) -> UrlParts {
  let mut parts = UrlParts::default();
  let mut rest = url;

  if let Some(i) = rest.find(':') {
    if i > 0 && is_scheme(&rest[..i]) {
      parts.scheme = rest[..i].to_ascii_lowercase();
      rest = &rest[i + 1..];
    }
  }

  if let Some(after) = rest.strip_prefix("//") {
    let end = after
      .find(['/', '?', '#'])
      .unwrap_or(after.len());
    parts.netloc = after[..end].to_string();
    rest = &after[end..];
  }

  if let Some(i) = rest.find('#') {
    parts.fragment = rest[i + 1..].to_string();
    rest = &rest[..i];
  }

  if let Some(i) = rest.find('?') {
    parts.query = rest[i + 1..].to_string();
    rest = &rest[..i];
  }

  parts.path = rest.to_string();
  parts
}

/// Reassemble the parts produced by [`urlsplit`].
pub(crate) fn urlunsplit(parts: &UrlParts) -> String {
  let mut url = parts.path.clone();
  if !parts.netloc.is_empty() || url.starts_with("//") {
    if !url.is_empty() && !url.starts_with('/') {
      url = format!("/{url}");
    }
    url = format!("//{}{url}", parts.netloc);
  }
  if !parts.scheme.is_empty() {
    url = format!("{}:{url}", parts.scheme);
  }
  if !parts.query.is_empty() {
    url = format!("{url}?{}", parts.query);
  }
  if !parts.fragment.is_empty() {
    url = format!("{url}#{}", parts.fragment);
  }
  url
}

/// Whether the URL carries neither a scheme nor a network location.
pub(crate) fn is_rel_url(url: &str) -> bool {
  let parts = urlsplit(url);
  parts.scheme.is_empty() && parts.netloc.is_empty()
}

/// A URL is "valid" here when it is scheme-less; targets with a scheme are
/// checked against the allowed scheme list separately.
pub(crate) fn is_valid_url(url: &str) -> bool {
  urlsplit(url).scheme.is_empty()
}

fn hex_val(b: u8) -> Option<u8> {
  match b {
    b'0'..=b'9' => Some(b - b'0'),
    b'a'..=b'f' => Some(b - b'a' + 10),
    b'A'..=b'F' => Some(b - b'A' + 10),
    _ => None,
  }
}

/// Decode percent escapes; malformed escapes pass through untouched.
pub(crate) fn unquote(text: &str) -> String {
  let bytes = text.as_bytes();
  let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
  let mut i = 0;
  while i < bytes.len() {
    if bytes[i] == b'%' {
      if let (Some(hi), Some(lo)) = (
        bytes.get(i + 1).copied().and_then(hex_val),
        bytes.get(i + 2).copied().and_then(hex_val),
      ) {
        out.push(hi << 4 | lo);
        i += 3;
        continue;
      }
    }
    out.push(bytes[i]);
    i += 1;
  }
  String::from_utf8_lossy(&out).into_owned()
}

/// Percent-encode every byte that is neither unreserved (alphanumeric or
/// `_.-~`) nor listed in `safe`.
pub(crate) fn quote(text: &str, safe: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for b in text.bytes() {
    let keep = b.is_ascii_alphanumeric()
      || matches!(b, b'_' | b'.' | b'-' | b'~')
      || safe.as_bytes().contains(&b);
    if keep {
      out.push(b as char);
    } else {
      out.push_str(&format!("%{b:02X}"));
    }
  }
  out
}

static NETLOC_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
  plain(r"^(?:([^:@]+)(?::([^:@]+))?@)?([^:]+)(?::([0-9]+))?")
});

/// Normalize a URL: percent-encode the user info, each path segment, the
/// query and the fragment, each with its own set of safe characters.
pub(crate) fn encode_url(url: &str) -> String {
  let parsed = urlsplit(url);

  let (user, password, host, port) = if parsed.netloc.is_empty() {
    (String::new(), String::new(), String::new(), String::new())
  } else {
    NETLOC_RE.captures(&parsed.netloc).map_or_else(
      || (String::new(), String::new(), String::new(), String::new()),
      |caps| {
        let part = |i| caps.get(i).map_or("", |m: regex::Match<'_>| m.as_str());
        (
          quote(part(1), "/"),
          quote(part(2), "/"),
          part(3).to_string(),
          part(4).to_string(),
        )
      },
    )
  };

  let path = parsed
    .path
    .split('/')
    .map(|segment| quote(&unquote(segment), ""))
    .collect::<Vec<_>>()
    .join("/");
  let query = quote(&unquote(&parsed.query), "=&?/");
  let fragment = quote(&unquote(&parsed.fragment), "/");

  let mut netloc = String::new();
  if !user.is_empty() {
    netloc.push_str(&user);
    if !password.is_empty() {
      netloc.push(':');
      netloc.push_str(&password);
    }
    netloc.push('@');
  }
  netloc.push_str(&host);
  if !port.is_empty() {
    netloc.push(':');
    netloc.push_str(&port);
  }

  urlunsplit(&UrlParts {
    scheme: parsed.scheme,
    netloc,
    path,
    query,
    fragment,
  })
}
