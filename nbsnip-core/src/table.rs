//! HTML table to LaTeX `tabularx` conversion.
//!
//! Tables come from pandas `DataFrame` and R `tibble` HTML reprs. Header rows are taken
//! from `thead`, body rows from `tbody`; cell text is the concatenated text of the cell.
//! Tibbles put the column types (`<dbl>`, `<chr>`, ...) in a second header row, which is
//! used to right-align numeric columns.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::error::TableError;

/// Column type markers that are right-aligned.
const NUMERIC_TYPES: [&str; 2] = ["<dbl>", "<int>"];

const FILL: char = 'X';
const FIXED: char = 'l';
const RIGHT: char = 'r';

/// Macro names wrapped around header cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStyle {
    pub head_macro: String,
    pub subhead_macro: String,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            head_macro: "ccstablehead".to_string(),
            subhead_macro: "ccstablesubhead".to_string(),
        }
    }
}

/// Header and body rows of one HTML table, in markup order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTable {
    pub header: Vec<Vec<String>>,
    pub body: Vec<Vec<String>>,
}

fn selector(css: &str) -> Result<Selector, TableError> {
    Selector::parse(css).map_err(|e| TableError::Selector(format!("{css}: {e}")))
}

fn text_content(element: ElementRef<'_>) -> String {
    element.text().collect()
}

impl ParsedTable {
    /// Parse the `thead` and `tbody` rows of an HTML fragment.
    pub fn parse(html: &str) -> Result<Self, TableError> {
        let doc = Html::parse_fragment(html);
        let header_rows = selector("thead tr")?;
        let header_cells = selector("th")?;
        let body_rows = selector("tbody tr")?;
        let body_cells = selector("td, th")?;

        let header = doc
            .select(&header_rows)
            .map(|row| row.select(&header_cells).map(text_content).collect())
            .collect();
        let body = doc
            .select(&body_rows)
            .map(|row| row.select(&body_cells).map(text_content).collect())
            .collect();
        Ok(Self { header, body })
    }

    /// Infer the column specification, one character per column.
    ///
    /// A two-row header whose second row is all `<type>` markers is a tibble: `<dbl>` and
    /// `<int>` become `r`, anything else `X`. A tabularx needs at least one `X` column, so if
    /// none is left the whole spec falls back to `X`. Any other table takes its width from
    /// the first body row. A table without `thead` rows has no header and is rejected.
    pub fn column_spec(&self) -> Result<String, TableError> {
        if self.header.is_empty() {
            return Err(TableError::NoHeader);
        }
        if let [_, types] = self.header.as_slice() {
            if !types.is_empty() && types.iter().all(|t| t.starts_with('<')) {
                let spec: String = types
                    .iter()
                    .map(|t| {
                        if NUMERIC_TYPES.contains(&t.as_str()) {
                            RIGHT
                        } else {
                            FILL
                        }
                    })
                    .collect();
                if spec.contains(FILL) {
                    return Ok(spec);
                }
                return Ok(FILL.to_string().repeat(types.len()));
            }
        }
        match self.body.first() {
            None => Err(TableError::NoBodyRows),
            Some(row) if row.is_empty() => Err(TableError::NoColumns),
            Some(row) => Ok(FILL.to_string().repeat(row.len())),
        }
    }

    /// Render as a LaTeX table.
    ///
    /// With `resize` the fill columns become `l` and a plain `tabular` is scaled to the line
    /// width; otherwise a `tabularx` of line width is emitted.
    pub fn to_latex(&self, resize: bool, style: &TableStyle) -> Result<String, TableError> {
        let mut colspec = self.column_spec()?;
        debug!(colspec = %colspec, resize, rows = self.body.len(), "Rendering table");

        let mut out = String::new();
        if resize {
            colspec = colspec.replace(FILL, &FIXED.to_string());
            out.push_str(&format!(
                "\\resizebox{{\\linewidth}}{{!}}{{\\begin{{tabular}}{{{colspec}}}\n"
            ));
        } else {
            out.push_str(&format!(
                "\\begin{{tabularx}}{{\\linewidth}}{{{colspec}}}\n"
            ));
        }
        out.push_str("  \\toprule\n");
        for (i, row) in self.header.iter().enumerate() {
            let name = if i == 0 {
                &style.head_macro
            } else {
                &style.subhead_macro
            };
            let cells: Vec<String> = row
                .iter()
                .map(|c| format!("\\{name}{{{}}}", escape_latex(c)))
                .collect();
            push_row(&mut out, &cells);
        }
        out.push_str("  \\midrule\n");
        for row in &self.body {
            let cells: Vec<String> = row.iter().map(|c| escape_latex(c)).collect();
            push_row(&mut out, &cells);
        }
        out.push_str("  \\bottomrule\n");
        if resize {
            out.push_str("\\end{tabular}}\n");
        } else {
            out.push_str("\\end{tabularx}\n");
        }
        Ok(out)
    }
}

fn push_row(out: &mut String, cells: &[String]) {
    out.push_str("  ");
    out.push_str(&cells.join(" & "));
    out.push_str("\\\\\n");
}

/// Escape LaTeX special characters in cell text.
///
/// Runs in one pass over the input so nothing is escaped twice.
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\textbackslash{}"),
            '_' | '#' | '%' | '$' | '&' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Convert the single table among `fragments` into a LaTeX snippet.
///
/// Zero or several candidate fragments is an error; there is no best-effort pick.
pub fn table_snippet<I>(fragments: I, resize: bool, style: &TableStyle) -> Result<String, TableError>
where
    I: IntoIterator<Item = String>,
{
    let mut tables: Vec<String> = fragments.into_iter().collect();
    let html = match tables.len() {
        0 => return Err(TableError::NoTable),
        1 => tables.remove(0),
        n => return Err(TableError::MultipleTables(n)),
    };
    ParsedTable::parse(&html)?.to_latex(resize, style)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATAFRAME: &str = r#"<div>
<style scoped>.dataframe tbody tr th { vertical-align: top; }</style>
<table border="1" class="dataframe">
  <thead>
    <tr style="text-align: right;">
      <th></th>
      <th>col_a</th>
      <th>b</th>
    </tr>
  </thead>
  <tbody>
    <tr>
      <th>0</th>
      <td>1</td>
      <td>x&amp;y</td>
    </tr>
    <tr>
      <th>1</th>
      <td>2</td>
      <td>50%</td>
    </tr>
  </tbody>
</table>
</div>"#;

    const TIBBLE: &str = r#"<table class="dataframe">
<caption>A tibble: 2 × 2</caption>
<thead>
	<tr><th scope=col>x</th><th scope=col>label</th></tr>
	<tr><th scope=col>&lt;dbl&gt;</th><th scope=col>&lt;chr&gt;</th></tr>
</thead>
<tbody>
	<tr><td>1.5</td><td>a</td></tr>
	<tr><td>2.0</td><td>b</td></tr>
</tbody>
</table>"#;

    fn table(header: &[&[&str]], body: &[&[&str]]) -> ParsedTable {
        let rows = |rows: &[&[&str]]| {
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect()
        };
        ParsedTable {
            header: rows(header),
            body: rows(body),
        }
    }

    #[test]
    fn parses_dataframe_rows_in_order() {
        let parsed = ParsedTable::parse(DATAFRAME).unwrap();
        assert_eq!(parsed.header, vec![vec!["", "col_a", "b"]]);
        assert_eq!(
            parsed.body,
            vec![vec!["0", "1", "x&y"], vec!["1", "2", "50%"]]
        );
    }

    #[test]
    fn tibble_types_drive_alignment() {
        let parsed = ParsedTable::parse(TIBBLE).unwrap();
        assert_eq!(parsed.header[1], vec!["<dbl>", "<chr>"]);
        assert_eq!(parsed.column_spec().unwrap(), "rX");
    }

    #[test]
    fn unbracketed_second_header_row_uses_fill_columns() {
        let t = table(&[&["a", "b"], &["c", "d"]], &[&["1", "2"]]);
        assert_eq!(t.column_spec().unwrap(), "XX");
    }

    #[test]
    fn unmapped_or_all_numeric_types_fall_back_to_fill() {
        let unmapped = table(&[&["a", "b"], &["<chr>", "<fct>"]], &[]);
        assert_eq!(unmapped.column_spec().unwrap(), "XX");
        let numeric = table(&[&["a", "b"], &["<int>", "<dbl>"]], &[]);
        assert_eq!(numeric.column_spec().unwrap(), "XX");
    }

    #[test]
    fn no_body_rows_is_an_error() {
        let t = table(&[&["a", "b"]], &[]);
        assert_eq!(t.column_spec(), Err(TableError::NoBodyRows));
        assert_eq!(
            t.to_latex(false, &TableStyle::default()),
            Err(TableError::NoBodyRows)
        );
    }

    #[test]
    fn missing_header_is_an_error() {
        let parsed =
            ParsedTable::parse("<table><tr><th>a</th></tr><tr><td>1</td></tr></table>").unwrap();
        assert!(parsed.header.is_empty());
        assert_eq!(parsed.column_spec(), Err(TableError::NoHeader));
        assert_eq!(
            parsed.to_latex(false, &TableStyle::default()),
            Err(TableError::NoHeader)
        );
    }

    #[test]
    fn empty_type_row_or_body_row_has_no_columns() {
        let empty_types = table(&[&["a"], &[]], &[&[]]);
        assert_eq!(empty_types.column_spec(), Err(TableError::NoColumns));
        let typed_empty_types = table(&[&["a"], &[]], &[&["1"]]);
        assert_eq!(typed_empty_types.column_spec().unwrap(), "X");
    }

    #[test]
    fn renders_tabularx() {
        let t = table(&[&["a_b", "c"]], &[&["1", "2"]]);
        let latex = t.to_latex(false, &TableStyle::default()).unwrap();
        assert_eq!(
            latex,
            "\\begin{tabularx}{\\linewidth}{XX}\n\
             \x20 \\toprule\n\
             \x20 \\ccstablehead{a\\_b} & \\ccstablehead{c}\\\\\n\
             \x20 \\midrule\n\
             \x20 1 & 2\\\\\n\
             \x20 \\bottomrule\n\
             \\end{tabularx}\n"
        );
    }

    #[test]
    fn renders_resized_tabular_with_subheads() {
        let parsed = ParsedTable::parse(TIBBLE).unwrap();
        let latex = parsed.to_latex(true, &TableStyle::default()).unwrap();
        assert!(latex.starts_with("\\resizebox{\\linewidth}{!}{\\begin{tabular}{rl}\n"));
        assert!(latex.contains("  \\ccstablesubhead{<dbl>} & \\ccstablesubhead{<chr>}\\\\\n"));
        assert!(latex.ends_with("  \\bottomrule\n\\end{tabular}}\n"));
    }

    #[test]
    fn escapes_each_special_character_once() {
        assert_eq!(escape_latex("a_b"), "a\\_b");
        assert_eq!(escape_latex("#1 50% $3 & co"), "\\#1 50\\% \\$3 \\& co");
        assert_eq!(escape_latex("C:\\dir"), "C:\\textbackslash{}dir");
        assert_eq!(escape_latex("\\_"), "\\textbackslash{}\\_");
    }

    #[test]
    fn custom_style_changes_macros() {
        let style = TableStyle {
            head_macro: "textbf".into(),
            subhead_macro: "textit".into(),
        };
        let t = table(&[&["a"], &["b"]], &[&["1"]]);
        let latex = t.to_latex(false, &style).unwrap();
        assert!(latex.contains("  \\textbf{a}\\\\\n  \\textit{b}\\\\\n"));
    }

    #[test]
    fn snippet_requires_exactly_one_table() {
        let style = TableStyle::default();
        assert_eq!(
            table_snippet(Vec::new(), false, &style),
            Err(TableError::NoTable)
        );
        assert_eq!(
            table_snippet(vec![TIBBLE.to_string(), TIBBLE.to_string()], false, &style),
            Err(TableError::MultipleTables(2))
        );
        assert!(table_snippet(vec![TIBBLE.to_string()], false, &style).is_ok());
    }
}
