// munch. Parser combinators built and run at runtime
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::Value;

pub(crate) type Thunk<V> = Rc<dyn Fn() -> V>;
pub(crate) type FoldFn<V> = Rc<dyn Fn(Vec<V>) -> V>;
pub(crate) type ApplyFn<V> = Rc<dyn Fn(V) -> V>;
pub(crate) type BindFn<V> = Rc<dyn Fn(V) -> Parser<V>>;
pub(crate) type Predicate = Rc<dyn Fn(char) -> bool>;

/// One node of a parser graph. Nodes are immutable after construction,
/// except for the body slot of `Forward`, which starts empty and is
/// filled exactly once by [`Parser::define`].
pub(crate) enum Node<V: Value> {
    Any,
    Char(char),
    Range(char, char),
    OneOf(String),
    NoneOf(String),
    Satisfy(Predicate),
    Literal(String),
    Start,
    End,
    Pass,
    Fail(String),
    Lift(Thunk<V>),
    Expect {
        inner: Parser<V>,
        label: String,
    },
    Apply {
        inner: Parser<V>,
        f: ApplyFn<V>,
    },
    Not {
        inner: Parser<V>,
        fallback: Thunk<V>,
    },
    Maybe {
        inner: Parser<V>,
        fallback: Thunk<V>,
    },
    Many {
        inner: Parser<V>,
        fold: FoldFn<V>,
    },
    Many1 {
        inner: Parser<V>,
        fold: FoldFn<V>,
    },
    Count {
        inner: Parser<V>,
        fold: FoldFn<V>,
        n: usize,
    },
    Or {
        alts: Vec<Parser<V>>,
    },
    And {
        seq: Vec<Parser<V>>,
        fold: FoldFn<V>,
    },
    Bind {
        inner: Parser<V>,
        cont: BindFn<V>,
    },
    Forward {
        name: String,
        def: RefCell<Option<Parser<V>>>,
    },
}

/// A handle to a parser graph.
///
/// Handles are cheap to clone and share: a sub-grammar may be referenced
/// by any number of parents, including itself through a forward
/// declaration. The graph a handle points to is immutable once built and
/// may be evaluated any number of times.
pub struct Parser<V: Value> {
    pub(crate) node: Rc<Node<V>>,
}

impl<V: Value> Clone for Parser<V> {
    fn clone(&self) -> Parser<V> {
        Parser {
            node: Rc::clone(&self.node),
        }
    }
}

/// Matches any single character.
pub fn any<V: Value>() -> Parser<V> {
    Parser::from_node(Node::Any)
}

/// Matches the character `c`.
pub fn ch<V: Value>(c: char) -> Parser<V> {
    Parser::from_node(Node::Char(c))
}

/// Matches one character in `lo..=hi`.
///
/// # Panics
///
/// Panics when `lo > hi`.
pub fn range<V: Value>(lo: char, hi: char) -> Parser<V> {
    assert!(lo <= hi, "empty range '{}'-'{}'", lo, hi);
    Parser::from_node(Node::Range(lo, hi))
}

/// Matches one character contained in `set`.
pub fn one_of<V: Value>(set: &str) -> Parser<V> {
    Parser::from_node(Node::OneOf(set.to_owned()))
}

/// Matches one character not contained in `set`.
pub fn none_of<V: Value>(set: &str) -> Parser<V> {
    Parser::from_node(Node::NoneOf(set.to_owned()))
}

/// Matches one character accepted by `f`.
pub fn satisfy<V: Value, F>(f: F) -> Parser<V>
where
    F: Fn(char) -> bool + 'static,
{
    Parser::from_node(Node::Satisfy(Rc::new(f)))
}

/// Matches the literal `string`.
pub fn string<V: Value>(string: &str) -> Parser<V> {
    Parser::from_node(Node::Literal(string.to_owned()))
}

/// Always succeeds with an empty match, consuming nothing.
pub fn pass<V: Value>() -> Parser<V> {
    Parser::from_node(Node::Pass)
}

/// Always fails with `message`, consuming nothing.
pub fn fail<V: Value>(message: &str) -> Parser<V> {
    Parser::from_node(Node::Fail(message.to_owned()))
}

/// Always succeeds with the value produced by `f`, consuming nothing.
pub fn lift<V: Value, F>(f: F) -> Parser<V>
where
    F: Fn() -> V + 'static,
{
    Parser::from_node(Node::Lift(Rc::new(f)))
}

/// Always succeeds with a clone of `value`, consuming nothing.
pub fn lift_val<V: Value + Clone>(value: V) -> Parser<V> {
    lift(move || value.clone())
}

/// Tries each alternative in order at the same position, returning the
/// first success. On total failure the alternatives' failures merge:
/// the furthest one wins, ties pool their expectations.
///
/// # Panics
///
/// Panics when `alts` is empty.
pub fn or<V: Value>(alts: Vec<Parser<V>>) -> Parser<V> {
    assert!(!alts.is_empty(), "`or` needs at least one alternative");
    Parser::from_node(Node::Or { alts })
}

/// Runs each parser in order, reducing their values with `fold`. Any
/// failure restores the starting position and drops the values already
/// produced.
///
/// # Panics
///
/// Panics when `seq` is empty.
pub fn and<V: Value, F>(seq: Vec<Parser<V>>, fold: F) -> Parser<V>
where
    F: Fn(Vec<V>) -> V + 'static,
{
    assert!(!seq.is_empty(), "`and` needs at least one parser");
    Parser::from_node(Node::And {
        seq,
        fold: Rc::new(fold),
    })
}

impl<V: Value> Parser<V> {
    pub(crate) fn from_node(node: Node<V>) -> Parser<V> {
        Parser {
            node: Rc::new(node),
        }
    }

    /// Relabels this parser's failures with `label`, leaving its
    /// matching behavior untouched. The label is what shows up in the
    /// `expected …` part of an [`Error`](crate::Error).
    pub fn expect(self, label: &str) -> Parser<V> {
        Parser::from_node(Node::Expect {
            inner: self,
            label: label.to_owned(),
        })
    }

    /// Transforms this parser's value with `f` on success. Failures
    /// pass through unchanged.
    pub fn apply<F>(self, f: F) -> Parser<V>
    where
        F: Fn(V) -> V + 'static,
    {
        Parser::from_node(Node::Apply {
            inner: self,
            f: Rc::new(f),
        })
    }

    /// Like [`apply`](Parser::apply), but `f` also receives a shared
    /// context value.
    pub fn apply_with<C, F>(self, ctx: Rc<C>, f: F) -> Parser<V>
    where
        C: 'static,
        F: Fn(V, &C) -> V + 'static,
    {
        self.apply(move |v| f(v, &ctx))
    }

    /// Negative lookahead: succeeds with an empty match exactly when
    /// this parser fails at the current position. Never consumes input.
    pub fn not(self) -> Parser<V> {
        self.not_else(|| V::from_match(""))
    }

    /// Like [`not`](Parser::not), with an explicit fallback value.
    pub fn not_else<F>(self, fallback: F) -> Parser<V>
    where
        F: Fn() -> V + 'static,
    {
        Parser::from_node(Node::Not {
            inner: self,
            fallback: Rc::new(fallback),
        })
    }

    /// Attempts this parser; on failure succeeds with an empty match,
    /// consuming nothing.
    pub fn maybe(self) -> Parser<V> {
        self.maybe_with(|| V::from_match(""))
    }

    /// Like [`maybe`](Parser::maybe), with an explicit fallback value.
    pub fn maybe_with<F>(self, fallback: F) -> Parser<V>
    where
        F: Fn() -> V + 'static,
    {
        Parser::from_node(Node::Maybe {
            inner: self,
            fallback: Rc::new(fallback),
        })
    }

    /// Repeats this parser zero or more times, reducing the values with
    /// `fold`. Never fails; the position of the last success is kept.
    /// A repetition that matches without consuming input is taken once,
    /// since it would otherwise repeat forever.
    pub fn many<F>(self, fold: F) -> Parser<V>
    where
        F: Fn(Vec<V>) -> V + 'static,
    {
        Parser::from_node(Node::Many {
            inner: self,
            fold: Rc::new(fold),
        })
    }

    /// Repeats this parser one or more times. Fails with the first
    /// attempt's failure when not even one repetition matches. Like
    /// [`many`](Parser::many), a repetition that matches without
    /// consuming input is taken once.
    pub fn many1<F>(self, fold: F) -> Parser<V>
    where
        F: Fn(Vec<V>) -> V + 'static,
    {
        Parser::from_node(Node::Many1 {
            inner: self,
            fold: Rc::new(fold),
        })
    }

    /// Repeats this parser exactly `n` times. A failure mid-repetition
    /// propagates, since an exact arity was promised.
    ///
    /// # Panics
    ///
    /// Panics when `n` is zero.
    pub fn count<F>(self, n: usize, fold: F) -> Parser<V>
    where
        F: Fn(Vec<V>) -> V + 'static,
    {
        assert!(n > 0, "`count` needs at least one repetition");
        Parser::from_node(Node::Count {
            inner: self,
            fold: Rc::new(fold),
            n,
        })
    }

    /// Two-way alternation; equivalent to [`or`] of `self` and `other`.
    pub fn or(self, other: Parser<V>) -> Parser<V> {
        or(vec![self, other])
    }

    /// Runs `self` then `other`, combining both values with `fold`;
    /// equivalent to a two-element [`and`].
    pub fn also<F>(self, other: Parser<V>, fold: F) -> Parser<V>
    where
        F: Fn(Vec<V>) -> V + 'static,
    {
        and(vec![self, other], fold)
    }

    /// Monadic bind: on success, feeds the value into `f` to obtain the
    /// parser that continues the parse. This is what lets later parsing
    /// depend on earlier-matched content. A failure of the continuation
    /// restores the position held before `self` ran.
    pub fn and_then<F>(self, f: F) -> Parser<V>
    where
        F: Fn(V) -> Parser<V> + 'static,
    {
        Parser::from_node(Node::Bind {
            inner: self,
            cont: Rc::new(f),
        })
    }

    /// Creates a named forward declaration: a placeholder parser whose
    /// body is installed later with [`define`](Parser::define). All
    /// clones of the handle observe the definition, which is how
    /// self-referencing and mutually recursive grammars are built.
    pub fn declare(name: &str) -> Parser<V> {
        Parser::from_node(Node::Forward {
            name: name.to_owned(),
            def: RefCell::new(None),
        })
    }

    /// Installs the body of a forward declaration.
    ///
    /// # Panics
    ///
    /// Panics when `self` is not a forward declaration or was already
    /// defined; a forward, once defined, is never redefined.
    pub fn define(&self, body: Parser<V>) {
        match *self.node {
            Node::Forward { ref name, ref def } => {
                let mut slot = def.borrow_mut();
                assert!(
                    slot.is_none(),
                    "forward declaration `{}` defined twice",
                    name
                );
                *slot = Some(body);
            }
            _ => panic!("define called on a parser that is not a forward declaration"),
        }
    }

    /// Detaches the body of a forward declaration without dropping the
    /// handle. Breaking the cycle this way is what lets a
    /// self-referential graph be reclaimed: every node is freed exactly
    /// once when the last outside handle goes away.
    ///
    /// # Panics
    ///
    /// Panics when `self` is not a forward declaration.
    pub fn undefine(&self) {
        match *self.node {
            Node::Forward { ref def, .. } => {
                def.borrow_mut().take();
            }
            _ => panic!("undefine called on a parser that is not a forward declaration"),
        }
    }

    /// Whether this handle is a forward declaration with a body
    /// installed. Non-forward parsers are always defined.
    pub fn is_defined(&self) -> bool {
        match *self.node {
            Node::Forward { ref def, .. } => def.borrow().is_some(),
            _ => true,
        }
    }

    /// Creates a non-owning handle, useful for observing teardown.
    pub fn downgrade(&self) -> WeakParser<V> {
        WeakParser {
            node: Rc::downgrade(&self.node),
        }
    }

    /// The number of live handles to this node.
    pub fn strong_count(&self) -> usize {
        Rc::strong_count(&self.node)
    }

    /// The label this parser contributes to failure messages.
    pub(crate) fn label(&self) -> String {
        match *self.node {
            Node::Any => "any character".to_owned(),
            Node::Char(c) => format!("'{}'", c.escape_default()),
            Node::Range(lo, hi) => format!("character between '{}' and '{}'", lo, hi),
            Node::OneOf(ref set) => format!("one of '{}'", set),
            Node::NoneOf(ref set) => format!("none of '{}'", set),
            Node::Satisfy(_) => "character satisfying predicate".to_owned(),
            Node::Literal(ref s) => format!("\"{}\"", s),
            Node::Start => "start of input".to_owned(),
            Node::End => "end of input".to_owned(),
            Node::Expect { ref label, .. } => label.clone(),
            Node::Forward { ref name, .. } => name.clone(),
            _ => "input".to_owned(),
        }
    }
}

/// A non-owning [`Parser`] handle.
///
/// Exists so teardown of shared and cyclic graphs can be observed: a
/// weak handle does not keep its node alive and
/// [`upgrade`](WeakParser::upgrade) returns `None` once the node has
/// been freed.
pub struct WeakParser<V: Value> {
    node: Weak<Node<V>>,
}

impl<V: Value> WeakParser<V> {
    /// Recovers an owning handle while the node is still alive.
    pub fn upgrade(&self) -> Option<Parser<V>> {
        self.node.upgrade().map(|node| Parser { node })
    }
}

impl<V: Value> Clone for WeakParser<V> {
    fn clone(&self) -> WeakParser<V> {
        WeakParser {
            node: Weak::clone(&self.node),
        }
    }
}

impl<V: Value> fmt::Debug for Parser<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_node<V: Value>(node: &Node<V>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match *node {
                Node::Any => write!(f, "any"),
                Node::Char(c) => write!(f, "char({:?})", c),
                Node::Range(lo, hi) => write!(f, "range({:?}, {:?})", lo, hi),
                Node::OneOf(ref set) => write!(f, "one_of({:?})", set),
                Node::NoneOf(ref set) => write!(f, "none_of({:?})", set),
                Node::Satisfy(_) => write!(f, "satisfy(..)"),
                Node::Literal(ref s) => write!(f, "string({:?})", s),
                Node::Start => write!(f, "soi"),
                Node::End => write!(f, "eoi"),
                Node::Pass => write!(f, "pass"),
                Node::Fail(ref m) => write!(f, "fail({:?})", m),
                Node::Lift(_) => write!(f, "lift(..)"),
                Node::Expect {
                    ref inner,
                    ref label,
                } => {
                    write!(f, "expect({:?}, ", label)?;
                    write_node(&inner.node, f)?;
                    write!(f, ")")
                }
                Node::Apply { ref inner, .. } => {
                    write!(f, "apply(")?;
                    write_node(&inner.node, f)?;
                    write!(f, ")")
                }
                Node::Not { ref inner, .. } => {
                    write!(f, "not(")?;
                    write_node(&inner.node, f)?;
                    write!(f, ")")
                }
                Node::Maybe { ref inner, .. } => {
                    write!(f, "maybe(")?;
                    write_node(&inner.node, f)?;
                    write!(f, ")")
                }
                Node::Many { ref inner, .. } => {
                    write!(f, "many(")?;
                    write_node(&inner.node, f)?;
                    write!(f, ")")
                }
                Node::Many1 { ref inner, .. } => {
                    write!(f, "many1(")?;
                    write_node(&inner.node, f)?;
                    write!(f, ")")
                }
                Node::Count { ref inner, n, .. } => {
                    write!(f, "count({}, ", n)?;
                    write_node(&inner.node, f)?;
                    write!(f, ")")
                }
                Node::Or { ref alts } => {
                    write!(f, "or(")?;
                    for (i, alt) in alts.iter().enumerate() {
                        if i > 0 {
                            write!(f, " | ")?;
                        }
                        write_node(&alt.node, f)?;
                    }
                    write!(f, ")")
                }
                Node::And { ref seq, .. } => {
                    write!(f, "and(")?;
                    for (i, p) in seq.iter().enumerate() {
                        if i > 0 {
                            write!(f, " ~ ")?;
                        }
                        write_node(&p.node, f)?;
                    }
                    write!(f, ")")
                }
                Node::Bind { ref inner, .. } => {
                    write!(f, "bind(")?;
                    write_node(&inner.node, f)?;
                    write!(f, ")")
                }
                // Forwards print by name only; descending would loop on
                // recursive grammars.
                Node::Forward { ref name, .. } => write!(f, "<{}>", name),
            }
        }

        write_node(&self.node, f)
    }
}

pub(crate) fn soi<V: Value>() -> Parser<V> {
    Parser::from_node(Node::Start)
}

pub(crate) fn eoi<V: Value>() -> Parser<V> {
    Parser::from_node(Node::End)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_shares_the_node() {
        let p = ch::<String>('a');
        let q = p.clone();
        assert_eq!(p.strong_count(), 2);
        drop(q);
        assert_eq!(p.strong_count(), 1);
    }

    #[test]
    #[should_panic(expected = "`count` needs at least one repetition")]
    fn zero_count_is_rejected_at_construction() {
        let _ = ch::<String>('a').count(0, crate::fold::join());
    }

    #[test]
    #[should_panic(expected = "`or` needs at least one alternative")]
    fn empty_or_is_rejected_at_construction() {
        let _ = or::<String>(vec![]);
    }

    #[test]
    #[should_panic(expected = "empty range")]
    fn inverted_range_is_rejected_at_construction() {
        let _ = range::<String>('z', 'a');
    }

    #[test]
    #[should_panic(expected = "defined twice")]
    fn forward_is_never_redefined() {
        let fwd = Parser::<String>::declare("rule");
        fwd.define(ch('a'));
        fwd.define(ch('b'));
    }

    #[test]
    #[should_panic(expected = "not a forward declaration")]
    fn define_requires_a_forward() {
        ch::<String>('a').define(ch('b'));
    }

    #[test]
    fn undefine_breaks_a_cycle() {
        let fwd = Parser::<String>::declare("loop");
        fwd.define(fwd.clone());
        let weak = fwd.downgrade();

        fwd.undefine();
        drop(fwd);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn debug_prints_forwards_by_name() {
        let fwd = Parser::<String>::declare("expr");
        let body = ch('(').also(fwd.clone(), crate::fold::join());
        fwd.define(body);

        assert_eq!(format!("{:?}", fwd), "<expr>");
        fwd.undefine();
    }
}
