use std::fs;
use std::io::{Read, Write};

use color_eyre::eyre::{Context, Result};
use log::{LevelFilter, debug};
use textile::{HtmlKind, Textile, TextileOptions};

mod cli;

use cli::Cli;

fn main() -> Result<()> {
  color_eyre::install()?;

  // Parse command line arguments
  let cli = Cli::parse_args();

  // Initialize logging first so conversion-time diagnostics are visible
  env_logger::Builder::new()
    .filter_level(if cli.verbose {
      LevelFilter::Debug
    } else {
      LevelFilter::Info
    })
    .write_style(env_logger::WriteStyle::Always)
    .init();

  let input = match &cli.infile {
    Some(path) => fs::read_to_string(path)
      .wrap_err_with(|| format!("Failed to read {}", path.display()))?,
    None => {
      let mut buffer = String::new();
      std::io::stdin()
        .read_to_string(&mut buffer)
        .wrap_err("Failed to read standard input")?;
      buffer
    },
  };
  debug!("read {} bytes of textile input", input.len());

  let html_kind = if cli.html5 {
    HtmlKind::Html5
  } else {
    HtmlKind::Xhtml
  };
  let options = if cli.restricted {
    TextileOptions {
      restricted: true,
      lite: true,
      noimage: true,
      rel: String::from("nofollow"),
      html_kind,
      ..TextileOptions::default()
    }
  } else {
    TextileOptions {
      html_kind,
      ..TextileOptions::default()
    }
  };
  let converter = Textile::new(options)?;
  let output = converter.parse(&input);

  match &cli.outfile {
    Some(path) => fs::write(path, output)
      .wrap_err_with(|| format!("Failed to write {}", path.display()))?,
    None => {
      std::io::stdout()
        .write_all(output.as_bytes())
        .wrap_err("Failed to write standard output")?;
    },
  }
  Ok(())
}
