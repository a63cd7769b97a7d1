// munch. Parser combinators built and run at runtime
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! A regex-literal compiler.
//!
//! [`compile`] lowers a regex pattern into an ordinary parser graph
//! built from the crate's own primitives and combinators, so the result
//! composes with hand-built parsers and is executed by the same engine.
//! Compilation happens once; malformed syntax is a construction-time
//! [`RegexError`], never a match-time failure.
//!
//! Accepted syntax: literal characters, `.`, escapes (`\n`, `\r`,
//! `\t`, `\0`, `\f`, `\v`, and `\` before any punctuation), character
//! classes `[...]` and `[^...]` with `a-z` ranges, groups `(...)`,
//! alternation `|`, and the postfix quantifiers `*`, `+`, `?`.

use thiserror::Error;

use crate::parser::Parser;
use crate::{and, any, ch, fold, or, satisfy, Value};

/// A syntax error in a regex literal, with the offset of the offending
/// construct within the pattern.
#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
pub enum RegexError {
    /// A `(` without its `)`.
    #[error("unterminated group starting at offset {offset}")]
    UnclosedGroup {
        /// Offset of the `(`.
        offset: usize,
    },
    /// A `)` without its `(`.
    #[error("unmatched `)` at offset {offset}")]
    UnmatchedClose {
        /// Offset of the `)`.
        offset: usize,
    },
    /// A `[` without its `]`.
    #[error("unterminated character class starting at offset {offset}")]
    UnclosedClass {
        /// Offset of the `[`.
        offset: usize,
    },
    /// `[]` or `[^]` matches nothing and is rejected.
    #[error("empty character class at offset {offset}")]
    EmptyClass {
        /// Offset of the `[`.
        offset: usize,
    },
    /// A class range whose bounds are inverted, like `[z-a]`.
    #[error("invalid range '{lo}'-'{hi}' in character class at offset {offset}")]
    InvalidClassRange {
        /// Lower bound as written.
        lo: char,
        /// Upper bound as written.
        hi: char,
        /// Offset of the range.
        offset: usize,
    },
    /// A quantifier with nothing to repeat, like `*ab`.
    #[error("quantifier `{quantifier}` has nothing to repeat at offset {offset}")]
    DanglingQuantifier {
        /// The offending quantifier.
        quantifier: char,
        /// Its offset.
        offset: usize,
    },
    /// A `\` at the very end of the pattern.
    #[error("trailing escape at end of pattern")]
    TrailingEscape,
}

/// Compiles `pattern` into a parser matching the same language. The
/// parser's value is the matched text, assembled through
/// [`Value::from_match`] and [`Value::join`].
pub fn compile<V: Value>(pattern: &str) -> Result<Parser<V>, RegexError> {
    let mut compiler = Compiler {
        chars: pattern.chars().collect(),
        offset: 0,
    };

    let parser = compiler.alternation()?;

    match compiler.peek() {
        None => Ok(parser),
        // `alternation` stops only at `)` or the end.
        Some(_) => Err(RegexError::UnmatchedClose {
            offset: compiler.offset,
        }),
    }
}

struct Compiler {
    chars: Vec<char>,
    offset: usize,
}

impl Compiler {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.offset += 1;
        }
        c
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.offset += 1;
            true
        } else {
            false
        }
    }

    fn alternation<V: Value>(&mut self) -> Result<Parser<V>, RegexError> {
        let mut alts = vec![self.sequence()?];

        while self.eat('|') {
            alts.push(self.sequence()?);
        }

        Ok(if alts.len() == 1 {
            alts.pop().unwrap()
        } else {
            or(alts)
        })
    }

    fn sequence<V: Value>(&mut self) -> Result<Parser<V>, RegexError> {
        let mut factors = vec![];

        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            factors.push(self.factor()?);
        }

        Ok(match factors.len() {
            0 => crate::pass(),
            1 => factors.pop().unwrap(),
            _ => and(factors, fold::join()),
        })
    }

    fn factor<V: Value>(&mut self) -> Result<Parser<V>, RegexError> {
        let mut parser = self.atom()?;

        loop {
            parser = match self.peek() {
                Some('*') => {
                    self.bump();
                    parser.many(fold::join())
                }
                Some('+') => {
                    self.bump();
                    parser.many1(fold::join())
                }
                Some('?') => {
                    self.bump();
                    parser.maybe()
                }
                _ => return Ok(parser),
            };
        }
    }

    fn atom<V: Value>(&mut self) -> Result<Parser<V>, RegexError> {
        let start = self.offset;

        match self.bump() {
            Some('(') => {
                let inner = self.alternation()?;
                if self.eat(')') {
                    Ok(inner)
                } else {
                    Err(RegexError::UnclosedGroup { offset: start })
                }
            }
            Some('[') => self.class(start),
            Some('.') => Ok(any()),
            Some('\\') => Ok(ch(self.escape()?)),
            Some(q @ ('*' | '+' | '?')) => Err(RegexError::DanglingQuantifier {
                quantifier: q,
                offset: start,
            }),
            // `sequence` never calls in here at `|`, `)`, or the end.
            Some(c) => Ok(ch(c)),
            None => unreachable!("atom at end of pattern"),
        }
    }

    fn escape(&mut self) -> Result<char, RegexError> {
        match self.bump() {
            Some('n') => Ok('\n'),
            Some('r') => Ok('\r'),
            Some('t') => Ok('\t'),
            Some('0') => Ok('\0'),
            Some('f') => Ok('\u{c}'),
            Some('v') => Ok('\u{b}'),
            Some(c) => Ok(c),
            None => Err(RegexError::TrailingEscape),
        }
    }

    fn class<V: Value>(&mut self, start: usize) -> Result<Parser<V>, RegexError> {
        let negated = self.eat('^');
        let mut ranges: Vec<(char, char)> = vec![];

        loop {
            match self.peek() {
                None => return Err(RegexError::UnclosedClass { offset: start }),
                Some(']') => {
                    self.bump();
                    break;
                }
                Some(_) => {
                    let range_start = self.offset;
                    let lo = self.class_char()?;

                    if self.eat('-') {
                        if self.peek() == Some(']') {
                            // A '-' before the closing bracket is
                            // literal.
                            ranges.push((lo, lo));
                            ranges.push(('-', '-'));
                        } else {
                            let hi = self.class_char()?;
                            if lo > hi {
                                return Err(RegexError::InvalidClassRange {
                                    lo,
                                    hi,
                                    offset: range_start,
                                });
                            }
                            ranges.push((lo, hi));
                        }
                    } else {
                        ranges.push((lo, lo));
                    }
                }
            }
        }

        if ranges.is_empty() {
            return Err(RegexError::EmptyClass { offset: start });
        }

        let label: String = self.chars[start..self.offset].iter().collect();
        let parser = satisfy(move |c| {
            ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi) != negated
        });

        Ok(parser.expect(&label))
    }

    fn class_char(&mut self) -> Result<char, RegexError> {
        match self.bump() {
            Some('\\') => self.escape(),
            // The caller checked for ']' and end of input.
            Some(c) => Ok(c),
            None => unreachable!("class character at end of pattern"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn matches(pattern: &str, input: &str) -> Option<String> {
        let parser = compile::<String>(pattern).unwrap();
        parse("re", input, &crate::common::total(parser)).ok()
    }

    #[test]
    fn alternation_under_repetition() {
        assert_eq!(matches("a(b|c)*", "a"), Some("a".to_owned()));
        assert_eq!(matches("a(b|c)*", "abcbc"), Some("abcbc".to_owned()));
        assert_eq!(matches("a(b|c)*", "ba"), None);
    }

    #[test]
    fn dot_matches_any_character() {
        assert_eq!(matches("a.c", "abc"), Some("abc".to_owned()));
        assert_eq!(matches("a.c", "a嗨c"), Some("a嗨c".to_owned()));
        assert_eq!(matches("a.c", "ac"), None);
    }

    #[test]
    fn quantifiers() {
        assert_eq!(matches("ab+", "abbb"), Some("abbb".to_owned()));
        assert_eq!(matches("ab+", "a"), None);
        assert_eq!(matches("ab?c", "ac"), Some("ac".to_owned()));
        assert_eq!(matches("ab?c", "abc"), Some("abc".to_owned()));
    }

    #[test]
    fn classes() {
        assert_eq!(matches("[0-9a-f]+", "7e"), Some("7e".to_owned()));
        assert_eq!(matches("[0-9]+", "x"), None);
        assert_eq!(matches("[^0-9]+", "xy"), Some("xy".to_owned()));
        assert_eq!(matches("[^0-9]+", "4"), None);
        assert_eq!(matches("[a-]", "-"), Some("-".to_owned()));
    }

    #[test]
    fn class_failures_report_the_class_text() {
        let parser = compile::<String>("[0-9]").unwrap();
        let err = parse("re", "x", &parser).unwrap_err();
        assert_eq!(err.expected(), ["[0-9]"]);
    }

    #[test]
    fn escapes() {
        assert_eq!(matches(r"a\.b", "a.b"), Some("a.b".to_owned()));
        assert_eq!(matches(r"a\.b", "axb"), None);
        assert_eq!(matches(r"a\nb", "a\nb"), Some("a\nb".to_owned()));
        assert_eq!(matches(r"\(\)", "()"), Some("()".to_owned()));
    }

    #[test]
    fn empty_alternative_matches_nothing() {
        assert_eq!(matches("a|", ""), Some("".to_owned()));
        assert_eq!(matches("a|", "a"), Some("a".to_owned()));
    }

    #[test]
    fn malformed_patterns() {
        assert_eq!(
            compile::<String>("(ab").unwrap_err(),
            RegexError::UnclosedGroup { offset: 0 }
        );
        assert_eq!(
            compile::<String>("a)b").unwrap_err(),
            RegexError::UnmatchedClose { offset: 1 }
        );
        assert_eq!(
            compile::<String>("[ab").unwrap_err(),
            RegexError::UnclosedClass { offset: 0 }
        );
        assert_eq!(
            compile::<String>("a[]b").unwrap_err(),
            RegexError::EmptyClass { offset: 1 }
        );
        assert_eq!(
            compile::<String>("[z-a]").unwrap_err(),
            RegexError::InvalidClassRange {
                lo: 'z',
                hi: 'a',
                offset: 1
            }
        );
        assert_eq!(
            compile::<String>("*a").unwrap_err(),
            RegexError::DanglingQuantifier {
                quantifier: '*',
                offset: 0
            }
        );
        assert_eq!(
            compile::<String>(r"ab\").unwrap_err(),
            RegexError::TrailingEscape
        );
    }
}
