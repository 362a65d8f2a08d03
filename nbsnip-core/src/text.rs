//! Normalisation of plain-text cell output.

use regex::Regex;
use std::sync::OnceLock;

/// ANSI colour/style escapes (SGR), e.g. `ESC[0;31m`.
fn ansi_escape() -> &'static Regex {
    static ANSI: OnceLock<Regex> = OnceLock::new();
    ANSI.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").expect("valid ANSI regex"))
}

const ELLIPSES: [char; 3] = ['\u{2026}', '\u{22ee}', '\u{22ef}'];

/// Join output lines into the text written to a `.out` snippet.
///
/// Trailing whitespace (including the line terminator) is stripped from every line before
/// joining with `\n`, so the result never ends in a newline.
pub fn normalize<'a, I>(lines: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let joined = lines
        .into_iter()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    let replaced = joined.replace('\u{00d7}', "x").replace(ELLIPSES, ".");
    ansi_escape().replace_all(&replaced, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_and_strips_trailing_whitespace() {
        assert_eq!(
            normalize(["first print\n", "second print  \n"]),
            "first print\nsecond print"
        );
    }

    #[test]
    fn substitutes_unicode() {
        assert_eq!(normalize(["A tibble: 3 \u{00d7} 2"]), "A tibble: 3 x 2");
        assert_eq!(normalize(["# \u{2026} with 5 more rows"]), "# . with 5 more rows");
        assert_eq!(normalize(["\u{22ee}"]), ".");
        assert_eq!(normalize(["1 \u{22ef} 9"]), "1 . 9");
    }

    #[test]
    fn removes_ansi_sequences() {
        assert_eq!(
            normalize(["\u{1b}[1m\u{1b}[38;5;246m# A tibble\u{1b}[39m\u{1b}[22m"]),
            "# A tibble"
        );
    }

    #[test]
    fn empty_input_is_empty_text() {
        assert_eq!(normalize(Vec::<&str>::new()), "");
    }
}
