use std::path::PathBuf;

use clap::Parser;

/// Command line interface for the textile converter
#[derive(Parser, Debug)]
#[command(author, version, about = "Convert Textile markup to HTML")]
pub struct Cli {
  /// Textile file to convert; standard input when omitted
  pub infile: Option<PathBuf>,

  /// File to write the HTML output to; standard output when omitted
  pub outfile: Option<PathBuf>,

  /// Generate HTML5 output (`abbr` instead of `acronym`)
  #[arg(long)]
  pub html5: bool,

  /// Convert untrusted input: escape raw markup, drop images and block ids,
  /// and mark links rel="nofollow"
  #[arg(short, long)]
  pub restricted: bool,

  /// Enable verbose debug logging
  #[arg(short, long)]
  pub verbose: bool,
}

impl Cli {
  pub fn parse_args() -> Self {
    Self::parse()
  }
}
