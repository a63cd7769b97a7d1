// munch. Parser combinators built and run at runtime
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! # munch
//!
//! `munch` builds parsers at runtime. Primitive parsers match single
//! characters or literal strings; combinators wrap existing parsers into
//! sequences, alternations, repetitions, and lookaheads. The resulting
//! graph is executed by a recursive-descent evaluator that backtracks
//! exactly and keeps the most informative failure it has seen.
//!
//! Grammars may refer to themselves: [`Parser::declare`] creates a named
//! placeholder that is later resolved with [`Parser::define`], so direct
//! and mutual recursion need no special pass. A placeholder that takes
//! part in a cycle must be [`Parser::undefine`]d before the graph is
//! dropped, otherwise the reference cycle keeps the nodes alive.
//!
//! ```
//! use munch::{fold, Parser};
//!
//! // P : '(' P ')' | ""
//! let parens = Parser::<String>::declare("parens");
//! let body = munch::and(
//!     vec![munch::ch('('), parens.clone(), munch::ch(')')],
//!     fold::join(),
//! )
//! .maybe();
//! parens.define(body);
//!
//! let exact = munch::common::total(parens.clone());
//! assert!(munch::parse("input", "(())", &exact).is_ok());
//! assert!(munch::parse("input", "(()", &exact).is_err());
//! parens.undefine();
//! ```
//!
//! The [`regex`] module compiles a regex literal into the same kind of
//! parser graph, and the companion `munch-meta` crate compiles a whole
//! textual grammar into a set of named, possibly mutually recursive
//! parsers.
//!
//! Evaluation is plain call/return recursion, so a rule that can match
//! the empty string and recurse into itself consumes stack without
//! bound. [`set_depth_limit`] installs a process-wide guard that turns
//! such runaway parses into a reported [`Error`] instead of a crash.

pub mod ast;
pub mod common;
mod error;
pub mod fold;
mod parser;
mod position;
pub mod regex;
mod state;

pub use crate::error::{Error, ErrorVariant};
pub use crate::parser::{and, any, ch, fail, lift, lift_val, none_of, one_of, or, pass, range,
                        satisfy, string, Parser, WeakParser};
pub use crate::position::Position;
pub use crate::state::{parse, parse_file, parse_reader, set_depth_limit};

/// The payload type produced by a successful parse.
///
/// Every combinator takes ownership of the values its children produce
/// and either forwards them into a caller-supplied fold or drops them,
/// so disposal is ordinary `Drop`. The two methods here are the only
/// capabilities the engine itself needs: injecting matched input text
/// and combining sub-results when no explicit fold was given.
pub trait Value: Sized + 'static {
    /// Builds a value from the text a primitive parser matched.
    fn from_match(text: &str) -> Self;

    /// Combines the values of a sequence or repetition.
    ///
    /// Must tolerate an empty vector, which arises from an empty
    /// repetition.
    fn join(values: Vec<Self>) -> Self;
}

impl Value for String {
    fn from_match(text: &str) -> String {
        text.to_owned()
    }

    fn join(values: Vec<String>) -> String {
        values.concat()
    }
}

impl Value for () {
    fn from_match(_: &str) {}

    fn join(_: Vec<()>) {}
}
