// munch. Parser combinators built and run at runtime
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! A grammar language compiled to [`munch`] parser graphs at runtime.
//!
//! Where `munch` builds parsers by calling combinators, this crate
//! builds them from a textual grammar: a set of named rules, compiled
//! in one call and immediately runnable. Rules may reference each other
//! in any order, including cyclically, and every rule tags the tree it
//! produces with its own name.
//!
//! ```
//! use munch_meta::Grammar;
//!
//! let grammar = Grammar::compile(
//!     r#"
//!         expr : <term> ("+" <term>)* ;
//!         term : [0-9]+ ;
//!     "#,
//!     &[],
//! )
//! .unwrap();
//!
//! let tree = grammar.parse("expr", "<input>", "1+2").unwrap();
//! assert_eq!(tree.tag, "expr");
//! assert_eq!(tree.child(0), Some(&munch::ast::Ast::leaf("term", "1")));
//! ```
//!
//! # The grammar language
//!
//! A grammar is one or more rules, each `name : body ;`. Whitespace is
//! insignificant between tokens and `#` starts a comment running to the
//! end of the line. A rule body is an alternation of sequences; the
//! atoms of a sequence are:
//!
//! - `"text"` matches an exact string; `\n`, `\r`, `\t`, `\0`, and
//!   `\`-escaped punctuation are resolved
//! - `'a'-'z'` matches one character in an inclusive range
//! - `[a-z_]` matches a character class, with the same syntax the
//!   [`munch::regex`] compiler accepts
//! - `<name>` matches the rule of that name
//! - `%0`, `%1`, and so on match the caller-supplied parser at that
//!   index in the [`Arg`] slice
//! - `( body )` is a parenthesized group
//!
//! An atom takes the postfix operators `*`, `+`, and `?`, plus two
//! annotations: `@name` tags the produced tree and `@%N` runs the
//! caller-supplied transform at index `N` over it. Operators apply left
//! to right.
//!
//! Grammars are matched exactly as written: no whitespace is skipped
//! inside an input unless a rule says so.

use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use munch::ast::Ast;
use munch::Parser;
use thiserror::Error as ThisError;

pub mod ast;
mod compiler;
mod parser;
mod validator;

/// What can go wrong turning a grammar source into runnable parsers.
///
/// All of these are construction-time: a compiled [`Grammar`] holds
/// only well-formed parsers, and running them reports plain
/// [`munch::Error`]s.
#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum Error {
    /// The grammar source itself did not parse.
    #[error("{0}")]
    Syntax(#[from] munch::Error),
    /// Two rules share a name.
    #[error("rule `{name}` is defined twice")]
    AlreadyDefined {
        /// The repeated rule name.
        name: String,
    },
    /// A `<name>` reference without a matching rule.
    #[error("rule `{rule}` references undefined rule `{referenced}`")]
    Undefined {
        /// The rule containing the reference.
        rule: String,
        /// The missing name.
        referenced: String,
    },
    /// A `'lo'-'hi'` range with inverted bounds.
    #[error("rule `{rule}` has an empty range '{lo}'-'{hi}'")]
    InvalidRange {
        /// The rule containing the range.
        rule: String,
        /// Lower bound as written.
        lo: char,
        /// Upper bound as written.
        hi: char,
    },
    /// A `%N` or `@%N` index with no matching argument.
    #[error("rule `{rule}` uses argument {index} but {provided} were supplied")]
    PlaceholderOutOfRange {
        /// The rule containing the index.
        rule: String,
        /// The index as written.
        index: usize,
        /// How many arguments the caller passed.
        provided: usize,
    },
    /// A `%N` slot filled with a transform argument.
    #[error("rule `{rule}` uses argument {index} as a parser, but a transform was supplied")]
    ExpectedParser {
        /// The rule containing the slot.
        rule: String,
        /// The offending index.
        index: usize,
    },
    /// An `@%N` slot filled with a parser argument.
    #[error("rule `{rule}` uses argument {index} as a transform, but a parser was supplied")]
    ExpectedTransform {
        /// The rule containing the slot.
        rule: String,
        /// The offending index.
        index: usize,
    },
    /// A malformed `[...]` class.
    #[error("rule `{rule}` has a malformed character class: {source}")]
    Class {
        /// The rule containing the class.
        rule: String,
        /// What the regex compiler rejected.
        source: munch::regex::RegexError,
    },
}

/// An argument for the `%N` and `@%N` slots of a grammar.
///
/// Arguments are positional: `%0` is the first element of the slice
/// given to [`Grammar::compile`]. A slot is either a parser, spliced
/// into the grammar where `%N` appears, or a transform, run over the
/// tree of the expression `@%N` annotates.
pub struct Arg {
    kind: ArgKind,
}

enum ArgKind {
    Parser(Parser<Ast>),
    Transform(Rc<dyn Fn(Ast) -> Ast>),
}

impl Arg {
    /// A parser argument for a `%N` slot.
    pub fn parser(parser: Parser<Ast>) -> Arg {
        Arg {
            kind: ArgKind::Parser(parser),
        }
    }

    /// A transform argument for an `@%N` slot.
    pub fn transform<F>(f: F) -> Arg
    where
        F: Fn(Ast) -> Ast + 'static,
    {
        Arg {
            kind: ArgKind::Transform(Rc::new(f)),
        }
    }

    pub(crate) fn is_parser(&self) -> bool {
        matches!(self.kind, ArgKind::Parser(_))
    }

    pub(crate) fn as_parser(&self) -> Option<&Parser<Ast>> {
        match self.kind {
            ArgKind::Parser(ref parser) => Some(parser),
            ArgKind::Transform(_) => None,
        }
    }

    pub(crate) fn as_transform(&self) -> Option<Rc<dyn Fn(Ast) -> Ast>> {
        match self.kind {
            ArgKind::Parser(_) => None,
            ArgKind::Transform(ref f) => Some(Rc::clone(f)),
        }
    }
}

/// A compiled grammar: one runnable parser per rule.
///
/// The rule parsers reference each other through forward declarations,
/// which the grammar detaches again when dropped; handles obtained from
/// [`rule`](Grammar::rule) must not be evaluated after that.
#[derive(Debug)]
pub struct Grammar {
    rules: HashMap<String, Parser<Ast>>,
}

impl Grammar {
    /// Compiles `source`, resolving `%N` and `@%N` slots against
    /// `args`. Errors name the offending rule, or carry a position
    /// within `source` when the source itself did not parse.
    pub fn compile(source: &str, args: &[Arg]) -> Result<Grammar, Error> {
        let rules = parser::parse_rules(source)?;
        validator::validate(&rules, args)?;
        let table = compiler::compile(&rules, args)?;

        Ok(Grammar { rules: table })
    }

    /// The parser compiled for `name`, usable like any other parser.
    pub fn rule(&self, name: &str) -> Option<&Parser<Ast>> {
        self.rules.get(name)
    }

    /// The names of the compiled rules, in no particular order.
    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Runs the rule `rule` over `input`, reporting failures against
    /// the source name `name`. Matching the whole input is not
    /// required; wrap the rule parser with
    /// [`munch::common::total`] when it should be.
    ///
    /// # Panics
    ///
    /// Panics when no rule named `rule` exists.
    pub fn parse(&self, rule: &str, name: &str, input: &str) -> Result<Ast, munch::Error> {
        match self.rules.get(rule) {
            Some(parser) => munch::parse(name, input, parser),
            None => panic!("unknown rule `{}`", rule),
        }
    }

    /// Opens and parses the file at `path` with the rule `rule`.
    ///
    /// # Panics
    ///
    /// Panics when no rule named `rule` exists.
    pub fn parse_file<P: AsRef<Path>>(&self, rule: &str, path: P) -> Result<Ast, munch::Error> {
        match self.rules.get(rule) {
            Some(parser) => munch::parse_file(path, parser),
            None => panic!("unknown rule `{}`", rule),
        }
    }
}

impl Drop for Grammar {
    fn drop(&mut self) {
        // Breaks the reference cycles of recursive rules so the graphs
        // are reclaimed.
        for parser in self.rules.values() {
            parser.undefine();
        }
    }
}
