// munch. Parser combinators built and run at runtime
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::error;
use std::fmt;

use crate::position::Position;

/// The kind of failure an [`Error`] reports.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ErrorVariant {
    /// A match failure: the furthest point the parse reached, with the
    /// labels that would have let it continue.
    Parsing {
        /// De-duplicated, sorted labels describing what was expected.
        expected: Vec<String>,
        /// The character found instead, or `None` at end of input.
        unexpected: Option<char>,
    },
    /// A failure with a caller-supplied message, produced by
    /// [`fail`](crate::fail) parsers or by unreadable inputs.
    Custom {
        /// Short explanation.
        message: String,
    },
    /// The recursion depth guard tripped. Reported separately from a
    /// match failure so runaway grammars are recognizable.
    DepthLimit {
        /// The configured limit.
        limit: usize,
    },
}

/// A parse failure tied to a position in the input.
///
/// Only the single most informative failure of a whole parse attempt
/// survives: alternatives merge their failures by keeping the one at
/// the greater position and pooling expectations on ties.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Error {
    /// What went wrong.
    pub variant: ErrorVariant,
    path: Option<String>,
    line: usize,
    col: usize,
    offset: usize,
    line_src: String,
}

impl Error {
    pub(crate) fn new_from_pos(variant: ErrorVariant, pos: Position<'_>) -> Error {
        let (line, col) = pos.line_col();

        Error {
            variant,
            path: None,
            line,
            col,
            offset: pos.pos(),
            line_src: pos.line_of().to_owned(),
        }
    }

    pub(crate) fn with_path(mut self, path: &str) -> Error {
        if !path.is_empty() {
            self.path = Some(path.to_owned());
        }
        self
    }

    /// The source name given to the entry point, if any.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// 1-based line of the failure.
    pub fn line(&self) -> usize {
        self.line
    }

    /// 1-based column of the failure.
    pub fn col(&self) -> usize {
        self.col
    }

    /// Byte offset of the failure within the input.
    pub fn byte_offset(&self) -> usize {
        self.offset
    }

    /// The expected labels of a match failure, sorted and de-duplicated.
    pub fn expected(&self) -> &[String] {
        match self.variant {
            ErrorVariant::Parsing { ref expected, .. } => expected,
            _ => &[],
        }
    }

    /// The character found at the failure, or `None` at end of input.
    pub fn unexpected(&self) -> Option<char> {
        match self.variant {
            ErrorVariant::Parsing { unexpected, .. } => unexpected,
            _ => None,
        }
    }

    /// A one-line human-readable message: source name, 1-based line and
    /// column, expectations and the offending character.
    pub fn message(&self) -> String {
        format!(
            "{}:{}:{}: {}",
            self.path.as_deref().unwrap_or("<input>"),
            self.line,
            self.col,
            self.describe()
        )
    }

    /// Like [`message`](Error::message), but bounded to `max_len`
    /// characters; longer messages are cut and terminated with `...`.
    pub fn truncated_message(&self, max_len: usize) -> String {
        let message = self.message();

        if message.chars().count() <= max_len {
            return message;
        }

        let kept = max_len.saturating_sub(3);
        let mut out: String = message.chars().take(kept).collect();
        for _ in 0..(max_len - kept) {
            out.push('.');
        }
        out
    }

    fn describe(&self) -> String {
        match self.variant {
            ErrorVariant::Parsing {
                ref expected,
                unexpected,
            } => {
                let found = match unexpected {
                    Some(c) => format!("'{}'", c.escape_default()),
                    None => "end of input".to_owned(),
                };

                if expected.is_empty() {
                    format!("unexpected {}", found)
                } else {
                    format!("expected {}, found {}", enumerate(expected), found)
                }
            }
            ErrorVariant::Custom { ref message } => message.clone(),
            ErrorVariant::DepthLimit { limit } => {
                format!("recursion depth limit of {} reached", limit)
            }
        }
    }

    fn underline(&self) -> String {
        let mut underline = String::new();
        for _ in 1..self.col {
            underline.push(' ');
        }
        underline.push_str("^---");
        underline
    }
}

fn enumerate(labels: &[String]) -> String {
    match labels.len() {
        1 => labels[0].clone(),
        2 => format!("{} or {}", labels[0], labels[1]),
        l => {
            let separated = labels[..l - 1].join(", ");
            format!("{}, or {}", separated, labels[l - 1])
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spacing = " ".repeat(self.line.to_string().len());

        match self.path {
            Some(ref path) => {
                writeln!(f, "{}--> {}:{}:{}", spacing, path, self.line, self.col)?
            }
            None => writeln!(f, "{}--> {}:{}", spacing, self.line, self.col)?,
        }
        writeln!(f, "{} |", spacing)?;
        writeln!(f, "{} | {}", self.line, self.line_src)?;
        writeln!(f, "{} | {}", spacing, self.underline())?;
        writeln!(f, "{} |", spacing)?;
        write!(f, "{} = {}", spacing, self.describe())
    }
}

impl error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsing_error(input: &str, pos: usize, expected: &[&str]) -> Error {
        Error::new_from_pos(
            ErrorVariant::Parsing {
                expected: expected.iter().map(|s| s.to_string()).collect(),
                unexpected: input[pos..].chars().next(),
            },
            Position::new(input, pos).unwrap(),
        )
    }

    #[test]
    fn display_without_path() {
        let error = parsing_error("ab\ncd\nef", 4, &["'x'", "'y'", "'z'"]);

        assert_eq!(
            format!("{}", error),
            vec![
                " --> 2:2",
                "  |",
                "2 | cd",
                "  |  ^---",
                "  |",
                "  = expected 'x', 'y', or 'z', found 'd'",
            ]
            .join("\n")
        );
    }

    #[test]
    fn display_with_path() {
        let error = parsing_error("ab\ncd\nef", 4, &["'x'"]).with_path("file.txt");

        assert_eq!(
            format!("{}", error),
            vec![
                " --> file.txt:2:2",
                "  |",
                "2 | cd",
                "  |  ^---",
                "  |",
                "  = expected 'x', found 'd'",
            ]
            .join("\n")
        );
    }

    #[test]
    fn display_custom() {
        let error = Error::new_from_pos(
            ErrorVariant::Custom {
                message: "big one".to_owned(),
            },
            Position::from_start("ab"),
        );

        assert_eq!(
            format!("{}", error),
            vec![" --> 1:1", "  |", "1 | ab", "  | ^---", "  |", "  = big one"].join("\n")
        );
    }

    #[test]
    fn message_at_end_of_input() {
        let error = parsing_error("ab", 2, &["')'"]).with_path("input");

        assert_eq!(error.message(), "input:1:3: expected ')', found end of input");
    }

    #[test]
    fn message_pair() {
        let error = parsing_error("z", 0, &["'x'", "'y'"]);

        assert_eq!(
            error.message(),
            "<input>:1:1: expected 'x' or 'y', found 'z'"
        );
    }

    #[test]
    fn truncation() {
        let error = parsing_error("z", 0, &["'x'", "'y'"]);
        let full = error.message();

        assert_eq!(error.truncated_message(full.len()), full);
        assert_eq!(error.truncated_message(12), "<input>:1...");
        assert!(error.truncated_message(12).chars().count() <= 12);
    }

    #[test]
    fn depth_limit_is_distinct() {
        let error = Error::new_from_pos(
            ErrorVariant::DepthLimit { limit: 16 },
            Position::from_start(""),
        );

        assert!(matches!(error.variant, ErrorVariant::DepthLimit { .. }));
        assert_eq!(error.message(), "<input>:1:1: recursion depth limit of 16 reached");
    }
}
