// munch. Parser combinators built and run at runtime
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Pre-built lexical parsers: ordinary combinator compositions for the
//! matches every grammar ends up needing.
//!
//! Numeric parsers capture the literal text; converting it is the
//! caller's [`apply`](crate::Parser::apply).

use crate::parser::{self, Parser};
use crate::{and, ch, fold, one_of, range, satisfy, string, Value};

/// Matches the start of input, consuming nothing.
pub fn soi<V: Value>() -> Parser<V> {
    parser::soi()
}

/// Matches the end of input, consuming nothing.
pub fn eoi<V: Value>() -> Parser<V> {
    parser::eoi()
}

/// A single space-like character.
pub fn space<V: Value>() -> Parser<V> {
    one_of(" \t\n\r\u{b}\u{c}").expect("space")
}

/// One or more space-like characters.
pub fn spaces<V: Value>() -> Parser<V> {
    space().many1(fold::join()).expect("spaces")
}

/// Zero or more space-like characters, discarded.
pub fn whitespace<V: Value>() -> Parser<V> {
    space().many(fold::discard()).expect("whitespace")
}

/// A literal newline.
pub fn newline<V: Value>() -> Parser<V> {
    ch('\n').expect("newline")
}

/// A literal tab.
pub fn tab<V: Value>() -> Parser<V> {
    ch('\t').expect("tab")
}

/// A decimal digit.
pub fn digit<V: Value>() -> Parser<V> {
    range('0', '9').expect("digit")
}

/// One or more decimal digits.
pub fn digits<V: Value>() -> Parser<V> {
    digit().many1(fold::join()).expect("digits")
}

/// A hexadecimal digit.
pub fn hexdigit<V: Value>() -> Parser<V> {
    satisfy(|c: char| c.is_ascii_hexdigit()).expect("hex digit")
}

/// A lowercase ASCII letter.
pub fn lower<V: Value>() -> Parser<V> {
    range('a', 'z').expect("lowercase letter")
}

/// An uppercase ASCII letter.
pub fn upper<V: Value>() -> Parser<V> {
    range('A', 'Z').expect("uppercase letter")
}

/// An ASCII letter.
pub fn alpha<V: Value>() -> Parser<V> {
    satisfy(|c: char| c.is_ascii_alphabetic()).expect("letter")
}

/// A literal underscore.
pub fn underscore<V: Value>() -> Parser<V> {
    ch('_').expect("underscore")
}

/// A letter, digit, or underscore.
pub fn alphanum<V: Value>() -> Parser<V> {
    satisfy(|c: char| c.is_ascii_alphanumeric() || c == '_').expect("letter, digit, or underscore")
}

/// An optionally signed run of digits, e.g. `-42`.
pub fn int<V: Value>() -> Parser<V> {
    and(vec![one_of("+-").maybe(), digits()], fold::join()).expect("integer")
}

/// An integer with an optional fraction part, e.g. `3.14`.
pub fn number<V: Value>() -> Parser<V> {
    and(
        vec![
            int(),
            and(vec![ch('.'), digits()], fold::join()).maybe(),
        ],
        fold::join(),
    )
    .expect("number")
}

/// An identifier: a letter or underscore followed by letters, digits,
/// and underscores.
pub fn ident<V: Value>() -> Parser<V> {
    and(
        vec![
            alpha().or(underscore()),
            alphanum().many(fold::join()),
        ],
        fold::join(),
    )
    .expect("identifier")
}

/// Surrounds `parser` with optional whitespace, keeping its value.
pub fn strip<V: Value>(parser: Parser<V>) -> Parser<V> {
    and(vec![whitespace(), parser, whitespace()], fold::second())
}

/// Discards whitespace after `parser`, keeping its value.
pub fn tok<V: Value>(parser: Parser<V>) -> Parser<V> {
    parser.also(whitespace(), fold::first())
}

/// A tokenized literal: `string` followed by discarded whitespace.
pub fn sym<V: Value>(s: &str) -> Parser<V> {
    tok(string(s))
}

/// Requires `parser` to consume the whole input.
pub fn total<V: Value>(parser: Parser<V>) -> Parser<V> {
    parser.also(eoi(), fold::first())
}

/// `parser` surrounded by the literal `open` and `close`, keeping only
/// the inner value.
pub fn between<V: Value>(parser: Parser<V>, open: &str, close: &str) -> Parser<V> {
    and(vec![string(open), parser, string(close)], fold::middle())
}

/// `parser` wrapped in `(` and `)`.
pub fn parens<V: Value>(parser: Parser<V>) -> Parser<V> {
    between(parser, "(", ")")
}

/// `parser` wrapped in `{` and `}`.
pub fn braces<V: Value>(parser: Parser<V>) -> Parser<V> {
    between(parser, "{", "}")
}

/// `parser` wrapped in `[` and `]`.
pub fn brackets<V: Value>(parser: Parser<V>) -> Parser<V> {
    between(parser, "[", "]")
}
