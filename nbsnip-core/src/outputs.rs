//! Classifies a cell's output records by kind.
//!
//! Every function returns a fresh iterator borrowing the records, so a sequence can be
//! re-derived from the same cell as often as needed. Record order is preserved.

use crate::notebook::{MimeBundle, Output, StreamName};

/// Marker used to decide whether an HTML payload holds a table.
///
/// This is a substring test, not a parse: any HTML containing the closing tag text counts,
/// even if it only appears inside a comment or a code sample.
pub const TABLE_CLOSE_MARKER: &str = "</table>";

fn bundles(outputs: &[Output]) -> impl Iterator<Item = &MimeBundle> + '_ {
    outputs.iter().filter_map(Output::mime_bundle)
}

/// Lines of textual output.
///
/// `stdout` streams contribute every line; `stderr` never does. Display and result records
/// contribute their `text/plain` lines unless they also carry an image, in which case the
/// text is only a caption and is dropped.
pub fn text_lines(outputs: &[Output]) -> impl Iterator<Item = &str> + '_ {
    outputs.iter().flat_map(|output| {
        let lines: Box<dyn Iterator<Item = &str> + '_> = match output {
            Output::Stream {
                name: StreamName::Stdout,
                text,
            } => text.lines(),
            Output::Stream {
                name: StreamName::Stderr,
                ..
            } => Box::new(std::iter::empty()),
            Output::DisplayData { data } | Output::ExecuteResult { data } => {
                match (&data.image_png, &data.text_plain) {
                    (None, Some(text)) => text.lines(),
                    _ => Box::new(std::iter::empty()),
                }
            }
            Output::Error { .. } => Box::new(std::iter::empty()),
        };
        lines
    })
}

/// Base64 PNG payloads, one per record carrying an image.
pub fn image_payloads(outputs: &[Output]) -> impl Iterator<Item = String> + '_ {
    bundles(outputs).filter_map(|data| data.image_png.as_ref().map(|png| png.joined()))
}

/// Every line of every HTML payload.
pub fn html_lines(outputs: &[Output]) -> impl Iterator<Item = &str> + '_ {
    bundles(outputs)
        .filter_map(|data| data.text_html.as_ref())
        .flat_map(|html| html.lines())
}

/// Whole HTML payloads that look like they contain a table.
pub fn table_fragments(outputs: &[Output]) -> impl Iterator<Item = String> + '_ {
    bundles(outputs)
        .filter_map(|data| data.text_html.as_ref().map(|html| html.joined()))
        .filter(|html| html.contains(TABLE_CLOSE_MARKER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notebook::MultilineString;

    fn stream(name: StreamName, text: &[&str]) -> Output {
        Output::Stream {
            name,
            text: MultilineString::Lines(text.iter().map(|s| s.to_string()).collect()),
        }
    }

    fn display(bundle: MimeBundle) -> Output {
        Output::DisplayData { data: bundle }
    }

    fn lines(text: &[&str]) -> Option<MultilineString> {
        Some(MultilineString::Lines(
            text.iter().map(|s| s.to_string()).collect(),
        ))
    }

    #[test]
    fn stderr_never_reaches_text() {
        let outputs = vec![
            stream(StreamName::Stderr, &["warning\n"]),
            stream(StreamName::Stdout, &["Normal output\n"]),
        ];
        assert_eq!(text_lines(&outputs).collect::<Vec<_>>(), vec!["Normal output\n"]);
    }

    #[test]
    fn image_caption_is_suppressed() {
        let outputs = vec![
            display(MimeBundle {
                text_plain: lines(&["<Figure size 640x480>"]),
                image_png: lines(&["iVBO", "Rw0K\n"]),
                text_html: None,
            }),
            Output::ExecuteResult {
                data: MimeBundle {
                    text_plain: lines(&["42"]),
                    ..Default::default()
                },
            },
        ];
        assert_eq!(text_lines(&outputs).collect::<Vec<_>>(), vec!["42"]);
        assert_eq!(image_payloads(&outputs).collect::<Vec<_>>(), vec!["iVBORw0K\n"]);
    }

    #[test]
    fn table_fragments_use_closing_marker() {
        let outputs = vec![
            display(MimeBundle {
                text_html: lines(&["<div>no table</div>"]),
                ..Default::default()
            }),
            display(MimeBundle {
                text_html: lines(&["<table>\n", "<tr><td>1</td></tr>\n", "</table>"]),
                ..Default::default()
            }),
        ];
        let tables: Vec<_> = table_fragments(&outputs).collect();
        assert_eq!(tables, vec!["<table>\n<tr><td>1</td></tr>\n</table>"]);
        assert_eq!(html_lines(&outputs).count(), 4);
        // restartable
        assert_eq!(table_fragments(&outputs).count(), 1);
    }
}
