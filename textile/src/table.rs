//! Table markup: pipe-delimited rows with optional caption, colgroup, row
//! groups (thead/tbody/tfoot), and per-table, per-row and per-cell
//! attributes.

use std::sync::LazyLock;

use crate::attrs::pba;
use crate::parser::Parser;
use crate::regexes::{ALIGN, CLS, SPACE, TABLE_SPAN, VALIGN, fancy, group, plain, substitute};

static TABLE_RE: LazyLock<fancy_regex::Regex> = LazyLock::new(|| {
  fancy(&format!(
    r"(?sm)^(?:table(_?{s}{a}{c})\.(.*?)\n)?^({a}{c}\.? ?\|.*\|)[\s]*\n\n",
    s = &*TABLE_SPAN,
    a = &*ALIGN,
    c = &*CLS
  ))
});
static ROW_SPLIT_RE: LazyLock<regex::Regex> =
  LazyLock::new(|| plain(r"(?m)\|\s*?$"));
static CAPTION_RE: LazyLock<fancy_regex::Regex> = LazyLock::new(|| {
  fancy(&format!(
    r"(?s)^\|=({s}{a}{c})\. ([^\n]*)(.*)",
    s = &*TABLE_SPAN,
    a = &*ALIGN,
    c = &*CLS
  ))
});
static COLGROUP_RE: LazyLock<fancy_regex::Regex> = LazyLock::new(|| {
  fancy(&format!(
    r"(?m)^\|:({s}{a}{c}\. .*)",
    s = &*TABLE_SPAN,
    a = &*ALIGN,
    c = &*CLS
  ))
});
static ROWGROUP_RE: LazyLock<fancy_regex::Regex> = LazyLock::new(|| {
  fancy(&format!(
    r"(?sm)(:?^\|({v})({s}{a}{c})\.\s*$\n)?^(.*)",
    v = VALIGN,
    s = &*TABLE_SPAN,
    a = &*ALIGN,
    c = &*CLS
  ))
});
static ROW_ATTS_RE: LazyLock<fancy_regex::Regex> = LazyLock::new(|| {
  fancy(&format!(r"^({a}{c}\. )(.*)", a = &*ALIGN, c = &*CLS))
});
static CELL_ATTS_RE: LazyLock<fancy_regex::Regex> = LazyLock::new(|| {
  fancy(&format!(
    r"(?s)^(_?{s}{a}{c}\. )(.*)",
    s = &*TABLE_SPAN,
    a = &*ALIGN,
    c = &*CLS
  ))
});
static CELL_SPACE_RE: LazyLock<regex::Regex> =
  LazyLock::new(|| plain(&format!(r"(?s)^({SPACE}*)(.*)")));

impl Parser<'_> {
  pub(crate) fn table(&mut self, text: &str) -> String {
    let text = format!("{text}\n\n");
    substitute(&TABLE_RE, &text, |caps| self.f_table(caps))
  }

  fn f_table(&mut self, caps: &fancy_regex::Captures<'_>) -> String {
    let tatts = pba(group(caps, 1), Some("table"), true);
    let summary_raw = group(caps, 2);
    let summary = if summary_raw.is_empty() {
      String::new()
    } else {
      format!(" summary=\"{}\"", summary_raw.trim())
    };

    let mut cap = String::new();
    let mut colgrp = String::new();
    let mut last_rgrp = String::new();
    let mut c_row = 1;
    let mut rows_out: Vec<String> = Vec::new();

    for raw_row in ROW_SPLIT_RE.split(group(caps, 3)).filter(|r| !r.is_empty()) {
      let mut row = raw_row.trim_start().to_string();

      // A caption can only be the first row; later `|=. foo |` rows fall
      // through and render as ordinary center-aligned cells.
      if c_row == 1 {
        let cm = CAPTION_RE.captures(&row).ok().flatten().map(|cm| {
          (
            group(&cm, 1).to_string(),
            group(&cm, 2).to_string(),
            group(&cm, 3).to_string(),
          )
        });
        if let Some((capts, cap_text, rest)) = cm {
          let capatts = pba(&capts, None, true);
          cap = format!("\t<caption{capatts}>{}</caption>\n", cap_text.trim());
          row = rest.trim_start().to_string();
          if row.is_empty() {
            continue;
          }
        }
      }
      c_row += 1;

      let cols = COLGROUP_RE
        .captures(row.trim_start())
        .ok()
        .flatten()
        .map(|gm| group(&gm, 1).to_string());
      if let Some(cols) = cols {
        let has_newline = row.contains('\n');
        for (idx, col) in cols.replace('.', "").split('|').enumerate() {
          let gatts = pba(col.trim(), Some("col"), true);
          let gatts = if idx == 0 {
            format!("group{gatts}>")
          } else {
            format!("{gatts} />")
          };
          colgrp = format!("{colgrp}\t<col{gatts}\n");
        }
        colgrp = format!("{colgrp}\t</colgroup>\n");

        // Without a newline the colgroup row had no closing pipe of its
        // own; otherwise the rest of the row still holds cells.
        if !has_newline {
          continue;
        }
        row = row[row.find('\n').unwrap_or(0)..].trim_start().to_string();
      }

      let (part, rgrpatts_raw, row_rest) =
        match ROWGROUP_RE.captures(row.trim_start()) {
          Ok(Some(gm)) => (
            group(&gm, 2).to_string(),
            group(&gm, 3).to_string(),
            group(&gm, 4).to_string(),
          ),
          _ => (String::new(), String::new(), row.trim_start().to_string()),
        };
      let rgrp = match part.as_str() {
        "^" => "head",
        "~" => "foot",
        "-" => "body",
        _ => "",
      };
      let rgrpatts = pba(&rgrpatts_raw, None, true);
      let row = row_rest;

      let rm = ROW_ATTS_RE.captures(row.trim_start()).ok().flatten().map(|rm| {
        (group(&rm, 1).to_string(), group(&rm, 2).to_string())
      });
      let (ratts, row) = if let Some((r, rest)) = rm {
        (pba(&r, Some("tr"), true), rest)
      } else {
        (String::new(), row)
      };

      let mut cells: Vec<String> = Vec::new();
      for (cellctr, cell) in row.split('|').enumerate() {
        let mut cell = cell.to_string();
        let ctyp = if cell.starts_with('_') { "h" } else { "d" };

        let cm = CELL_ATTS_RE.captures(&cell).ok().flatten().map(|cm| {
          (group(&cm, 1).to_string(), group(&cm, 2).to_string())
        });
        let catts = if let Some((c_atts, c_rest)) = cm {
          cell = c_rest;
          pba(&c_atts, Some("td"), true)
        } else {
          String::new()
        };

        if !self.t.options.lite {
          let am = CELL_SPACE_RE.captures(&cell).map(|am| {
            (
              am.get(1).map_or("", |g| g.as_str()).to_string(),
              am.get(2).map_or("", |g| g.as_str()).to_string(),
            )
          });
          if let Some((space, inner)) = am {
            let inner = self.redcloth_list(&inner);
            let inner = self.textile_lists(&inner);
            cell = format!("{space}{inner}");
          }
        }

        // The first split element is the text before the leading pipe.
        if cellctr > 0 {
          let ctag = format!("t{ctyp}");
          let cline = format!("\t\t\t<{ctag}{catts}>{cell}</{ctag}>");
          cells.push(self.do_tag_br(&ctag, &cline));
        }
      }

      let mut grp = String::new();
      if !rgrp.is_empty() && !last_rgrp.is_empty() {
        grp = format!("\t</t{last_rgrp}>\n");
      }
      if !rgrp.is_empty() {
        grp = format!("{grp}\t<t{rgrp}{rgrpatts}>\n");
        last_rgrp = rgrp.to_string();
      }

      let trailing_newline = if cells.is_empty() { "" } else { "\n" };
      rows_out.push(format!(
        "{grp}\t\t<tr{ratts}>\n{}{trailing_newline}\t\t</tr>",
        cells.join("\n")
      ));
    }

    let rows = format!("{}\n", rows_out.join("\n"));
    let close = if last_rgrp.is_empty() {
      String::new()
    } else {
      format!("\t</t{last_rgrp}>\n")
    };
    format!("\t<table{tatts}{summary}>\n{cap}{colgrp}{rows}{close}\t</table>\n\n")
  }
}
