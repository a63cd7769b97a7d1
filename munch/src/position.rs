// munch. Parser combinators built and run at runtime
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::fmt;

/// A cursor into an input `&str`, advanced by the primitive matchers and
/// reported back to callers inside an [`Error`](crate::Error).
///
/// The byte offset always lies on a UTF-8 character boundary.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Position<'i> {
    input: &'i str,
    pos: usize,
}

impl<'i> Position<'i> {
    /// Creates a `Position` at the start of `input`.
    pub fn from_start(input: &'i str) -> Position<'i> {
        Position { input, pos: 0 }
    }

    /// Creates a `Position` at byte offset `pos`, or `None` when the
    /// offset is out of bounds or not a character boundary.
    pub fn new(input: &'i str, pos: usize) -> Option<Position<'i>> {
        if input.is_char_boundary(pos) {
            Some(Position { input, pos })
        } else {
            None
        }
    }

    /// The current byte offset.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub(crate) fn at_start(&self) -> bool {
        self.pos == 0
    }

    #[inline]
    pub(crate) fn at_end(&self) -> bool {
        self.pos == self.input.len()
    }

    /// The character at the cursor, or `None` at end of input.
    #[inline]
    pub fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// Returns the 1-based line and column of the cursor.
    ///
    /// `\n`, `\r` and `\r\n` all end a line.
    pub fn line_col(&self) -> (usize, usize) {
        let mut line = 1;
        let mut col = 1;
        let mut chars = self.input[..self.pos].chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\r' => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    line += 1;
                    col = 1;
                }
                '\n' => {
                    line += 1;
                    col = 1;
                }
                _ => col += 1,
            }
        }

        (line, col)
    }

    /// Returns the full line the cursor lies on, without its terminator.
    pub fn line_of(&self) -> &'i str {
        let start = self.input[..self.pos]
            .rfind(|c| c == '\n' || c == '\r')
            .map(|i| i + 1)
            .unwrap_or(0);
        let end = self.input[self.pos..]
            .find(|c| c == '\n' || c == '\r')
            .map(|i| self.pos + i)
            .unwrap_or(self.input.len());

        &self.input[start..end]
    }

    /// Advances past the next character when `f` accepts it.
    #[inline]
    pub(crate) fn match_char_by<F>(&mut self, f: F) -> Option<char>
    where
        F: FnOnce(char) -> bool,
    {
        match self.peek() {
            Some(c) if f(c) => {
                self.pos += c.len_utf8();
                Some(c)
            }
            _ => None,
        }
    }

    /// Advances past `string` when the input continues with it.
    #[inline]
    pub(crate) fn match_string(&mut self, string: &str) -> bool {
        if self.input[self.pos..].starts_with(string) {
            self.pos += string.len();
            true
        } else {
            false
        }
    }

    /// Advances past the next character when it falls in `lo..=hi`.
    #[inline]
    pub(crate) fn match_range(&mut self, lo: char, hi: char) -> Option<char> {
        self.match_char_by(|c| lo <= c && c <= hi)
    }
}

impl<'i> fmt::Debug for Position<'i> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Position").field("pos", &self.pos).finish()
    }
}
