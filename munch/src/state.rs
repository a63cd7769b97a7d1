// munch. Parser combinators built and run at runtime
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::fs;
use std::io::Read;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Error, ErrorVariant};
use crate::parser::{Node, Parser};
use crate::position::Position;
use crate::Value;

static DEPTH_LIMIT: AtomicUsize = AtomicUsize::new(0);

/// Sets the process-wide recursion depth limit for all subsequent
/// parses.
///
/// Left-recursive or nullable-recursive grammars recurse without
/// consuming input and would otherwise exhaust the native call stack.
/// With a limit installed, such parses fail with
/// [`ErrorVariant::DepthLimit`] instead. `None` removes the guard,
/// which is also the default.
pub fn set_depth_limit(limit: Option<NonZeroUsize>) {
    DEPTH_LIMIT.store(limit.map_or(0, NonZeroUsize::get), Ordering::Relaxed);
}

/// The internal, merge-able record of a failed attempt.
///
/// Only positions and label sets travel through the engine; the
/// rendered [`Error`] is built once, at the entry point.
struct Failure {
    pos: usize,
    expected: Vec<String>,
    message: Option<String>,
    /// A tripped depth guard aborts the whole parse: no alternative is
    /// tried once this is set.
    fatal: bool,
}

impl Failure {
    fn expected(pos: usize, label: String) -> Failure {
        Failure {
            pos,
            expected: vec![label],
            message: None,
            fatal: false,
        }
    }

    fn message(pos: usize, message: &str) -> Failure {
        Failure {
            pos,
            expected: vec![],
            message: Some(message.to_owned()),
            fatal: false,
        }
    }

    fn depth(pos: usize) -> Failure {
        Failure {
            pos,
            expected: vec![],
            message: None,
            fatal: true,
        }
    }

    /// Position dominance: the failure at the greater position wins;
    /// ties pool their expectations.
    fn merge(mut self, other: Failure) -> Failure {
        if other.pos > self.pos {
            other
        } else if other.pos < self.pos {
            self
        } else {
            self.expected.extend(other.expected);
            if self.message.is_none() {
                self.message = other.message;
            }
            self
        }
    }
}

struct State<'i> {
    pos: Position<'i>,
    depth: usize,
    limit: usize,
}

impl<'i> State<'i> {
    fn new(input: &'i str) -> State<'i> {
        State {
            pos: Position::from_start(input),
            depth: 0,
            limit: DEPTH_LIMIT.load(Ordering::Relaxed),
        }
    }

    fn enter(&mut self) -> bool {
        self.depth += 1;
        self.limit == 0 || self.depth <= self.limit
    }

    fn exit(&mut self) {
        self.depth -= 1;
    }
}

/// Evaluates `parser` at the state's current position.
///
/// Invariant: on `Err`, the position is exactly what it was when the
/// call was made; on `Ok`, the position has advanced by the consumed
/// length (possibly zero). Every combinator below preserves this.
fn eval<V: Value>(parser: &Parser<V>, state: &mut State<'_>) -> Result<V, Failure> {
    if !state.enter() {
        state.exit();
        return Err(Failure::depth(state.pos.pos()));
    }
    let result = eval_node(parser, state);
    state.exit();
    result
}

fn eval_node<V: Value>(parser: &Parser<V>, state: &mut State<'_>) -> Result<V, Failure> {
    let start = state.pos;

    match *parser.node {
        Node::Any => match state.pos.match_char_by(|_| true) {
            Some(c) => Ok(V::from_match(&c.to_string())),
            None => Err(Failure::expected(start.pos(), parser.label())),
        },
        Node::Char(expected) => match state.pos.match_char_by(|c| c == expected) {
            Some(c) => Ok(V::from_match(&c.to_string())),
            None => Err(Failure::expected(start.pos(), parser.label())),
        },
        Node::Range(lo, hi) => match state.pos.match_range(lo, hi) {
            Some(c) => Ok(V::from_match(&c.to_string())),
            None => Err(Failure::expected(start.pos(), parser.label())),
        },
        Node::OneOf(ref set) => match state.pos.match_char_by(|c| set.contains(c)) {
            Some(c) => Ok(V::from_match(&c.to_string())),
            None => Err(Failure::expected(start.pos(), parser.label())),
        },
        Node::NoneOf(ref set) => match state.pos.match_char_by(|c| !set.contains(c)) {
            Some(c) => Ok(V::from_match(&c.to_string())),
            None => Err(Failure::expected(start.pos(), parser.label())),
        },
        Node::Satisfy(ref f) => match state.pos.match_char_by(|c| f(c)) {
            Some(c) => Ok(V::from_match(&c.to_string())),
            None => Err(Failure::expected(start.pos(), parser.label())),
        },
        Node::Literal(ref string) => {
            if state.pos.match_string(string) {
                Ok(V::from_match(string))
            } else {
                Err(Failure::expected(start.pos(), parser.label()))
            }
        }
        Node::Start => {
            if state.pos.at_start() {
                Ok(V::from_match(""))
            } else {
                Err(Failure::expected(start.pos(), parser.label()))
            }
        }
        Node::End => {
            if state.pos.at_end() {
                Ok(V::from_match(""))
            } else {
                Err(Failure::expected(start.pos(), parser.label()))
            }
        }
        Node::Pass => Ok(V::from_match("")),
        Node::Fail(ref message) => Err(Failure::message(start.pos(), message)),
        Node::Lift(ref f) => Ok(f()),
        Node::Expect {
            ref inner,
            ref label,
        } => eval(inner, state).map_err(|failure| {
            if failure.fatal {
                failure
            } else {
                Failure::expected(failure.pos, label.clone())
            }
        }),
        Node::Apply { ref inner, ref f } => eval(inner, state).map(|v| f(v)),
        Node::Not {
            ref inner,
            ref fallback,
        } => match eval(inner, state) {
            Ok(_) => {
                state.pos = start;
                Err(Failure::expected(
                    start.pos(),
                    format!("not {}", inner.label()),
                ))
            }
            Err(failure) if failure.fatal => Err(failure),
            Err(_) => {
                state.pos = start;
                Ok(fallback())
            }
        },
        Node::Maybe {
            ref inner,
            ref fallback,
        } => match eval(inner, state) {
            Ok(v) => Ok(v),
            Err(failure) if failure.fatal => Err(failure),
            Err(_) => {
                state.pos = start;
                Ok(fallback())
            }
        },
        Node::Many {
            ref inner,
            ref fold,
        } => {
            let mut values = vec![];

            loop {
                let attempt = state.pos;
                match eval(inner, state) {
                    Ok(v) => {
                        values.push(v);
                        // An empty match would repeat forever; take it
                        // once and stop.
                        if state.pos.pos() == attempt.pos() {
                            return Ok(fold(values));
                        }
                    }
                    Err(failure) if failure.fatal => return Err(failure),
                    Err(_) => {
                        state.pos = attempt;
                        return Ok(fold(values));
                    }
                }
            }
        }
        Node::Many1 {
            ref inner,
            ref fold,
        } => {
            let first = state.pos;
            let mut values = vec![eval(inner, state)?];

            if state.pos.pos() == first.pos() {
                return Ok(fold(values));
            }

            loop {
                let attempt = state.pos;
                match eval(inner, state) {
                    Ok(v) => {
                        values.push(v);
                        if state.pos.pos() == attempt.pos() {
                            return Ok(fold(values));
                        }
                    }
                    Err(failure) if failure.fatal => return Err(failure),
                    Err(_) => {
                        state.pos = attempt;
                        return Ok(fold(values));
                    }
                }
            }
        }
        Node::Count {
            ref inner,
            ref fold,
            n,
        } => {
            let mut values = Vec::with_capacity(n);

            for _ in 0..n {
                match eval(inner, state) {
                    Ok(v) => values.push(v),
                    Err(failure) => {
                        // An exact arity was promised; drop the partial
                        // values and give the whole attempt back.
                        state.pos = start;
                        return Err(failure);
                    }
                }
            }

            Ok(fold(values))
        }
        Node::Or { ref alts } => {
            let mut merged: Option<Failure> = None;

            for alt in alts {
                match eval(alt, state) {
                    Ok(v) => return Ok(v),
                    Err(failure) if failure.fatal => return Err(failure),
                    Err(failure) => {
                        state.pos = start;
                        merged = Some(match merged {
                            Some(m) => m.merge(failure),
                            None => failure,
                        });
                    }
                }
            }

            // `or` construction guarantees at least one alternative.
            Err(merged.unwrap())
        }
        Node::And { ref seq, ref fold } => {
            let mut values = Vec::with_capacity(seq.len());

            for p in seq {
                match eval(p, state) {
                    Ok(v) => values.push(v),
                    Err(failure) => {
                        state.pos = start;
                        return Err(failure);
                    }
                }
            }

            Ok(fold(values))
        }
        Node::Bind {
            ref inner,
            ref cont,
        } => {
            let value = eval(inner, state)?;
            let next = cont(value);

            eval(&next, state).map_err(|failure| {
                if !failure.fatal {
                    state.pos = start;
                }
                failure
            })
        }
        Node::Forward { ref name, ref def } => {
            let body = def
                .borrow()
                .clone()
                .unwrap_or_else(|| panic!("undefined forward reference `{}` evaluated", name));

            eval(&body, state)
        }
    }
}

fn failure_to_error(failure: Failure, input: &str, name: &str) -> Error {
    // The failure position came from a Position cursor, so it is a
    // valid boundary.
    let pos = Position::new(input, failure.pos).unwrap_or_else(|| Position::from_start(input));

    let variant = if failure.fatal {
        ErrorVariant::DepthLimit {
            limit: DEPTH_LIMIT.load(Ordering::Relaxed),
        }
    } else if let Some(message) = failure.message {
        ErrorVariant::Custom { message }
    } else {
        let mut expected = failure.expected;
        expected.sort();
        expected.dedup();

        ErrorVariant::Parsing {
            expected,
            unexpected: pos.peek(),
        }
    };

    Error::new_from_pos(variant, pos).with_path(name)
}

/// Runs `parser` over `input`, reporting failures against the source
/// name `name`.
///
/// Matching the whole input is not required; wrap the parser with
/// [`common::total`](crate::common::total) when it should be.
pub fn parse<V: Value>(name: &str, input: &str, parser: &Parser<V>) -> Result<V, Error> {
    let mut state = State::new(input);

    eval(parser, &mut state).map_err(|failure| failure_to_error(failure, input, name))
}

/// Reads `reader` to the end and parses the buffered text. A read
/// failure is surfaced as an [`Error`], not a panic.
pub fn parse_reader<V: Value, R: Read>(
    name: &str,
    mut reader: R,
    parser: &Parser<V>,
) -> Result<V, Error> {
    let mut input = String::new();

    match reader.read_to_string(&mut input) {
        Ok(_) => parse(name, &input, parser),
        Err(e) => Err(read_error(name, &format!("cannot read {}: {}", name, e))),
    }
}

/// Opens and parses the file at `path`.
pub fn parse_file<V: Value, P: AsRef<Path>>(path: P, parser: &Parser<V>) -> Result<V, Error> {
    let name = path.as_ref().display().to_string();

    match fs::read_to_string(path.as_ref()) {
        Ok(input) => parse(&name, &input, parser),
        Err(e) => Err(read_error(&name, &format!("cannot read {}: {}", name, e))),
    }
}

fn read_error(name: &str, message: &str) -> Error {
    Error::new_from_pos(
        ErrorVariant::Custom {
            message: message.to_owned(),
        },
        Position::from_start(""),
    )
    .with_path(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{and, ch, fold, one_of, or, string};

    #[test]
    fn primitives_advance_by_matched_length() {
        assert_eq!(parse("t", "abc", &ch::<String>('a')), Ok("a".to_owned()));
        assert_eq!(parse("t", "abc", &string::<String>("ab")), Ok("ab".to_owned()));
        assert_eq!(parse("t", "嗨", &crate::any::<String>()), Ok("嗨".to_owned()));
    }

    #[test]
    fn primitive_failure_consumes_nothing() {
        let err = parse("t", "xyz", &ch::<String>('a')).unwrap_err();
        assert_eq!(err.byte_offset(), 0);
        assert_eq!(err.expected(), ["'a'"]);
        assert_eq!(err.unexpected(), Some('x'));
    }

    #[test]
    fn failure_at_end_of_input_has_no_unexpected_char() {
        let err = parse("t", "", &ch::<String>('a')).unwrap_err();
        assert_eq!(err.unexpected(), None);
    }

    #[test]
    fn or_pools_expectations_at_the_same_position() {
        let p = ch::<String>('x').or(ch('y'));
        let err = parse("t", "z", &p).unwrap_err();

        assert_eq!(err.byte_offset(), 0);
        assert_eq!(err.expected(), ["'x'", "'y'"]);
    }

    #[test]
    fn or_is_associative_in_its_merged_error() {
        let left = or(vec![ch::<String>('a').or(ch('b')), ch('c')]);
        let right = or(vec![ch::<String>('a'), ch('b').or(ch('c'))]);

        let e1 = parse("t", "z", &left).unwrap_err();
        let e2 = parse("t", "z", &right).unwrap_err();
        assert_eq!(e1.expected(), e2.expected());
        assert_eq!(e1.byte_offset(), e2.byte_offset());
    }

    #[test]
    fn furthest_failure_wins() {
        // The first alternative consumes 'a' before failing, so its
        // failure dominates the one from 'x'.
        let p = and(vec![ch::<String>('a'), ch('b')], fold::join()).or(ch('x'));
        let err = parse("t", "ad", &p).unwrap_err();

        assert_eq!(err.byte_offset(), 1);
        assert_eq!(err.expected(), ["'b'"]);
    }

    #[test]
    fn and_failure_restores_the_start() {
        let p = and(vec![ch::<String>('a'), ch('b')], fold::join()).or(string("ax"));
        assert_eq!(parse("t", "ax", &p), Ok("ax".to_owned()));
    }

    #[test]
    fn many_never_fails() {
        let p = ch::<String>('a').many(fold::join());
        assert_eq!(parse("t", "aaab", &p), Ok("aaa".to_owned()));
        assert_eq!(parse("t", "b", &p), Ok("".to_owned()));
    }

    #[test]
    fn many_keeps_the_last_successful_position() {
        let p = and(
            vec![string::<String>("ab").many(fold::join()), string("ac")],
            fold::join(),
        );
        assert_eq!(parse("t", "ababac", &p), Ok("ababac".to_owned()));
    }

    #[test]
    fn repetition_of_an_empty_match_terminates() {
        let p = ch::<String>('x').maybe().many(fold::join());
        assert_eq!(parse("t", "", &p), Ok("".to_owned()));
        assert_eq!(parse("t", "xxy", &p), Ok("xx".to_owned()));

        let p = ch::<String>('x').maybe().many1(fold::join());
        assert_eq!(parse("t", "", &p), Ok("".to_owned()));
        assert_eq!(parse("t", "xx", &p), Ok("xx".to_owned()));
    }

    #[test]
    fn many1_fails_with_the_first_attempts_error() {
        let p = ch::<String>('a').many1(fold::join());
        let err = parse("t", "b", &p).unwrap_err();

        assert_eq!(err.byte_offset(), 0);
        assert_eq!(err.expected(), ["'a'"]);
        assert_eq!(parse("t", "aa", &p), Ok("aa".to_owned()));
    }

    #[test]
    fn count_demands_exact_arity() {
        let p = ch::<String>('a').count(3, fold::join());
        assert_eq!(parse("t", "aaa", &p), Ok("aaa".to_owned()));

        let err = parse("t", "aab", &p).unwrap_err();
        assert_eq!(err.byte_offset(), 2);
        assert_eq!(err.expected(), ["'a'"]);
    }

    #[test]
    fn count_failure_restores_the_start() {
        let p = ch::<String>('a').count(3, fold::join()).or(string("aab"));
        assert_eq!(parse("t", "aab", &p), Ok("aab".to_owned()));
    }

    #[test]
    fn maybe_consumes_nothing_on_failure() {
        let p = and(
            vec![string::<String>("ab").maybe(), string("ac")],
            fold::join(),
        );
        assert_eq!(parse("t", "ac", &p), Ok("ac".to_owned()));
    }

    #[test]
    fn not_is_negative_lookahead() {
        let keyword = string::<String>("if");
        let p = and(vec![keyword.not(), string("x")], fold::join());

        assert_eq!(parse("t", "x", &p), Ok("x".to_owned()));
        let err = parse("t", "if", &p).unwrap_err();
        assert_eq!(err.byte_offset(), 0);
        assert_eq!(err.expected(), ["not \"if\""]);
    }

    #[test]
    fn expect_relabels_failures() {
        let p = one_of::<String>("0123456789").expect("digit");
        let err = parse("t", "x", &p).unwrap_err();
        assert_eq!(err.expected(), ["digit"]);
    }

    #[test]
    fn fail_reports_its_message() {
        let err = parse("t", "x", &crate::fail::<String>("nope")).unwrap_err();
        assert_eq!(err.variant, crate::ErrorVariant::Custom { message: "nope".to_owned() });
    }

    #[test]
    fn bind_threads_the_matched_value() {
        // The first character decides what must follow.
        let p = crate::any::<String>().and_then(|c| {
            if c == "(" {
                string(")")
            } else {
                string("!")
            }
        });

        assert_eq!(parse("t", "()", &p), Ok(")".to_owned()));
        assert_eq!(parse("t", "a!", &p), Ok("!".to_owned()));
        assert!(parse("t", "(!", &p).is_err());
    }

    #[test]
    fn bind_failure_restores_the_start() {
        let p = crate::any::<String>()
            .and_then(|_| string(")"))
            .or(string("ax"));
        assert_eq!(parse("t", "ax", &p), Ok("ax".to_owned()));
    }

    #[test]
    fn forward_supports_direct_recursion() {
        // P : '(' P ')' | ""
        let parens = Parser::<String>::declare("parens");
        let body = and(
            vec![ch('('), parens.clone(), ch(')')],
            fold::join(),
        )
        .maybe();
        parens.define(body);

        let total = crate::common::total(parens.clone());
        assert_eq!(parse("t", "(())", &total), Ok("(())".to_owned()));

        // The unbalanced inner group cannot match, so the optional
        // grammar matches nothing and end of input is expected instead.
        let err = parse("t", "(()", &total).unwrap_err();
        assert_eq!(err.expected(), ["end of input"]);
        assert_eq!(err.unexpected(), Some('('));

        parens.undefine();
    }

    #[test]
    #[should_panic(expected = "undefined forward reference `ghost` evaluated")]
    fn evaluating_an_undefined_forward_panics() {
        let ghost = Parser::<String>::declare("ghost");
        let _ = parse("t", "x", &ghost);
    }

    #[test]
    fn depth_limit_reports_a_distinct_error() {
        // A nullable rule that recurses without consuming.
        let looping = Parser::<String>::declare("looping");
        looping.define(crate::pass::<String>().also(looping.clone(), fold::join()));

        // The limit is process-wide and tests run concurrently; keep it
        // far above any depth a sibling test reaches.
        set_depth_limit(NonZeroUsize::new(512));
        let err = parse("t", "x", &looping).unwrap_err();
        set_depth_limit(None);

        assert_eq!(err.variant, crate::ErrorVariant::DepthLimit { limit: 512 });
        looping.undefine();
    }

    #[test]
    fn read_failures_become_errors() {
        let err = parse_file("no/such/file.txt", &ch::<String>('a')).unwrap_err();
        match err.variant {
            crate::ErrorVariant::Custom { ref message } => {
                assert!(message.starts_with("cannot read "));
            }
            ref other => panic!("expected a custom error, got {:?}", other),
        }
    }

    #[test]
    fn parse_reader_buffers_the_stream() {
        let input = "abc".as_bytes();
        assert_eq!(
            parse_reader("stream", input, &string::<String>("abc")),
            Ok("abc".to_owned())
        );
    }
}
