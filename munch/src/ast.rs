// munch. Parser combinators built and run at runtime
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! A generic syntax tree and the [`Value`] behavior that assembles it
//! during execution.
//!
//! [`Ast`] is the default structured output of a parse: leaves carry
//! the matched text, interior nodes carry their children in match
//! order, and tags name the grammar rule a node came from. Consumers
//! depend on exactly these three fields.

use std::fmt;

use crate::parser::Parser;
use crate::Value;

/// A node of the generic syntax tree.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Ast {
    /// The rule name this node was tagged with, or empty.
    pub tag: String,
    /// The matched text for leaves; empty for interior nodes.
    pub contents: String,
    /// Sub-trees in match order.
    pub children: Vec<Ast>,
}

impl Ast {
    /// Creates a leaf node.
    pub fn leaf(tag: &str, contents: &str) -> Ast {
        Ast {
            tag: tag.to_owned(),
            contents: contents.to_owned(),
            children: vec![],
        }
    }

    /// Creates an interior node.
    pub fn node(tag: &str, children: Vec<Ast>) -> Ast {
        Ast {
            tag: tag.to_owned(),
            contents: String::new(),
            children,
        }
    }

    /// Whether this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// The `i`-th child, in match order.
    pub fn child(&self, i: usize) -> Option<&Ast> {
        self.children.get(i)
    }

    /// Names this node. An untagged node is tagged in place; a node
    /// that already carries a tag is wrapped in a synthetic parent
    /// instead, so the existing name survives as a child.
    pub fn tagged(mut self, tag: &str) -> Ast {
        if self.tag.is_empty() {
            self.tag = tag.to_owned();
            self
        } else {
            Ast::node(tag, vec![self])
        }
    }

    /// An untagged leaf: raw matched text that has not been claimed by
    /// any rule yet.
    fn is_plain_leaf(&self) -> bool {
        self.tag.is_empty() && self.children.is_empty()
    }

    /// An untagged interior node: an anonymous grouping whose children
    /// can be spliced into a larger sequence.
    fn is_plain_node(&self) -> bool {
        self.tag.is_empty() && self.contents.is_empty() && !self.children.is_empty()
    }

    fn fmt_at_depth(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        for _ in 0..depth {
            write!(f, "  ")?;
        }

        if self.tag.is_empty() {
            write!(f, "_")?;
        } else {
            write!(f, "{}", self.tag)?;
        }
        if !self.contents.is_empty() {
            write!(f, " '{}'", self.contents)?;
        }

        for child in &self.children {
            writeln!(f)?;
            child.fmt_at_depth(f, depth + 1)?;
        }

        Ok(())
    }
}

impl Value for Ast {
    fn from_match(text: &str) -> Ast {
        Ast::leaf("", text)
    }

    /// Lexical sub-matches collapse: joining only untagged leaves
    /// concatenates their text into one leaf. Otherwise the values
    /// become the children of an untagged interior node, with empty
    /// untagged leaves dropped and anonymous groupings spliced in
    /// place, preserving match order.
    fn join(values: Vec<Ast>) -> Ast {
        if values.len() == 1 {
            return values.into_iter().next().unwrap();
        }

        if values.iter().all(Ast::is_plain_leaf) {
            let contents: String = values.into_iter().map(|v| v.contents).collect();
            return Ast::leaf("", &contents);
        }

        let mut children = vec![];
        for value in values {
            if value.is_plain_leaf() && value.contents.is_empty() {
                continue;
            }
            if value.is_plain_node() {
                children.extend(value.children);
            } else {
                children.push(value);
            }
        }

        match children.len() {
            0 => Ast::from_match(""),
            1 => children.into_iter().next().unwrap(),
            _ => Ast::node("", children),
        }
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_at_depth(f, 0)
    }
}

/// Wraps `parser` so its output is tagged with `name`; the usual way a
/// grammar rule claims the tree it produced.
pub fn tag(parser: Parser<Ast>, name: &str) -> Parser<Ast> {
    let name = name.to_owned();
    parser.apply(move |ast| ast.tagged(&name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{and, fold, parse, string};

    #[test]
    fn plain_leaves_collapse() {
        let joined = Ast::join(vec![Ast::from_match("4"), Ast::from_match("2")]);
        assert_eq!(joined, Ast::leaf("", "42"));
    }

    #[test]
    fn tagged_values_nest() {
        let joined = Ast::join(vec![
            Ast::leaf("lhs", "1"),
            Ast::from_match("+"),
            Ast::leaf("rhs", "2"),
        ]);

        assert_eq!(
            joined,
            Ast::node(
                "",
                vec![
                    Ast::leaf("lhs", "1"),
                    Ast::leaf("", "+"),
                    Ast::leaf("rhs", "2"),
                ]
            )
        );
    }

    #[test]
    fn empty_leaves_are_dropped_from_sequences() {
        let joined = Ast::join(vec![
            Ast::from_match(""),
            Ast::leaf("x", "x"),
            Ast::from_match(""),
        ]);
        assert_eq!(joined, Ast::leaf("x", "x"));
    }

    #[test]
    fn anonymous_groupings_are_spliced() {
        let inner = Ast::node("", vec![Ast::leaf("a", "a"), Ast::leaf("b", "b")]);
        let joined = Ast::join(vec![inner, Ast::leaf("c", "c")]);

        assert_eq!(
            joined,
            Ast::node(
                "",
                vec![Ast::leaf("a", "a"), Ast::leaf("b", "b"), Ast::leaf("c", "c")]
            )
        );
    }

    #[test]
    fn tagging_an_untagged_node_names_it() {
        assert_eq!(
            Ast::from_match("42").tagged("number"),
            Ast::leaf("number", "42")
        );
    }

    #[test]
    fn tagging_a_tagged_node_inserts_a_root() {
        let tagged = Ast::leaf("term", "x").tagged("expr");
        assert_eq!(tagged, Ast::node("expr", vec![Ast::leaf("term", "x")]));
    }

    #[test]
    fn a_parse_builds_the_tree() {
        let number = tag(
            crate::range::<Ast>('0', '9').many1(fold::join()),
            "number",
        );
        let sum = and(vec![number.clone(), string("+").apply(|_| Ast::from_match("")), number], fold::join());
        let sum = tag(sum, "sum");

        assert_eq!(
            parse("t", "12+3", &sum),
            Ok(Ast::node(
                "sum",
                vec![Ast::leaf("number", "12"), Ast::leaf("number", "3")]
            ))
        );
    }

    #[test]
    fn display_indents_children() {
        let ast = Ast::node("sum", vec![Ast::leaf("number", "12"), Ast::leaf("number", "3")]);
        assert_eq!(
            format!("{}", ast),
            "sum\n  number '12'\n  number '3'"
        );
    }
}
