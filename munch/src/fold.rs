// munch. Parser combinators built and run at runtime
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Ready-made fold functions for the fold slots of [`and`](crate::and),
//! [`many`](crate::Parser::many) and friends.
//!
//! A fold takes ownership of every sub-value and produces the combined
//! value; anything it does not propagate is simply dropped.

use crate::Value;

/// Combines the values with [`Value::join`]. The default choice.
pub fn join<V: Value>() -> impl Fn(Vec<V>) -> V {
    V::join
}

/// Keeps the first value, dropping the rest.
pub fn first<V: Value>() -> impl Fn(Vec<V>) -> V {
    nth(0)
}

/// Keeps the second value, dropping the rest.
pub fn second<V: Value>() -> impl Fn(Vec<V>) -> V {
    nth(1)
}

/// Keeps the middle value of three; the usual choice for
/// bracket-wrapped content.
pub fn middle<V: Value>() -> impl Fn(Vec<V>) -> V {
    nth(1)
}

/// Keeps the last value, dropping the rest.
pub fn last<V: Value>() -> impl Fn(Vec<V>) -> V {
    |mut values: Vec<V>| match values.pop() {
        Some(v) => v,
        None => V::from_match(""),
    }
}

/// Keeps value number `i`, counting from zero. Yields an empty value
/// when fewer values were produced.
pub fn nth<V: Value>(i: usize) -> impl Fn(Vec<V>) -> V {
    move |mut values: Vec<V>| {
        if i < values.len() {
            values.swap_remove(i)
        } else {
            V::from_match("")
        }
    }
}

/// Drops every value and yields an empty one.
pub fn discard<V: Value>() -> impl Fn(Vec<V>) -> V {
    |_| V::from_match("")
}
