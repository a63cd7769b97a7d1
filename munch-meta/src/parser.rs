// munch. Parser combinators built and run at runtime
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! The grammar language parser.
//!
//! The language is parsed with the combinators it compiles down to: the
//! source is run through an ordinary parser graph producing an [`Ast`],
//! which [`parse_rules`] then lowers into [`Rule`]s. Structural tags on
//! the tree stand in for a dedicated token type.

use munch::ast::{tag, Ast};
use munch::{and, ch, common, fold, none_of, or, Parser, Value};

use crate::ast::{Expr, Rule};

/// Parses a grammar source into its rules. Positions in the returned
/// error refer to the grammar text itself.
pub(crate) fn parse_rules(source: &str) -> Result<Vec<Rule>, munch::Error> {
    let dsl = DslParser::new();
    let tree = munch::parse("<grammar>", source, &dsl.root)?;

    Ok(tree.children.into_iter().map(lower_rule).collect())
}

/// The parser for the grammar language, rebuilt per compilation.
///
/// Holds the one forward declaration of the graph so it can be detached
/// again on drop; the grammar language allows parenthesized groups to
/// nest, which makes its own grammar recursive.
struct DslParser {
    root: Parser<Ast>,
    alternation: Parser<Ast>,
}

impl DslParser {
    fn new() -> DslParser {
        let alternation = Parser::declare("alternation");

        let atom = or(vec![
            string_atom(),
            range_atom(),
            class_atom(),
            ref_atom(),
            placeholder_atom(),
            and(
                vec![sym("("), alternation.clone(), sym(")")],
                fold::join(),
            ),
        ]);

        let postfix = or(vec![
            marker("*", "rep"),
            marker("+", "rep1"),
            marker("?", "opt"),
            apply_marker(),
            tag_marker(),
        ]);

        let item = tag(
            and(vec![atom, postfix.many(fold::join())], fold::join()),
            "item",
        );
        let sequence = tag(item.many1(fold::join()), "seq");

        let more = and(vec![sym("|"), sequence.clone()], fold::join());
        alternation.define(tag(
            and(vec![sequence, more.many(fold::join())], fold::join()),
            "alt",
        ));

        let rule = tag(
            and(
                vec![
                    tag(tok(common::ident()), "name"),
                    sym(":"),
                    alternation.clone(),
                    sym(";"),
                ],
                fold::join(),
            ),
            "rule",
        );

        let root = tag(
            and(
                vec![ws(), rule.many1(fold::join()), common::eoi()],
                fold::join(),
            ),
            "grammar",
        );

        DslParser { root, alternation }
    }
}

impl Drop for DslParser {
    fn drop(&mut self) {
        self.alternation.undefine();
    }
}

/// Spaces and `#` line comments, discarded.
fn ws() -> Parser<Ast> {
    let comment = and(
        vec![ch('#'), none_of("\n").many(fold::join())],
        fold::join(),
    );

    or(vec![common::space(), comment]).many(fold::discard())
}

fn tok(parser: Parser<Ast>) -> Parser<Ast> {
    parser.also(ws(), fold::first())
}

/// A punctuation token, matched and dropped.
fn sym(s: &str) -> Parser<Ast> {
    tok(munch::string(s)).apply(|_| Ast::from_match(""))
}

/// A postfix operator token, turned into a bare structural marker.
fn marker(symbol: &str, name: &'static str) -> Parser<Ast> {
    tok(munch::string(symbol)).apply(move |_| Ast::leaf(name, ""))
}

/// `@name`, carrying the tag to attach.
fn tag_marker() -> Parser<Ast> {
    tag(
        and(vec![ch('@'), tok(common::ident())], fold::last()),
        "tagmark",
    )
}

/// `@%N`, carrying the index of the transform argument to apply.
fn apply_marker() -> Parser<Ast> {
    tag(
        and(vec![ch('@'), ch('%'), tok(common::digits())], fold::last()),
        "applymark",
    )
}

/// A double-quoted literal; the stored contents are unescaped.
fn string_atom() -> Parser<Ast> {
    let chr = or(vec![escape_pair(), none_of("\"\\")]);
    let quoted = and(
        vec![ch('"'), chr.many(fold::join()), ch('"')],
        fold::middle(),
    )
    .expect("string literal");

    tag(
        tok(quoted).apply(|raw| Ast::leaf("", &unescape(&raw.contents))),
        "str",
    )
}

/// `'a'-'z'`; the stored contents are the two unescaped bound
/// characters.
fn range_atom() -> Parser<Ast> {
    let bounds = and(
        vec![
            char_lit(),
            ch('-').apply(|_| Ast::from_match("")),
            char_lit(),
        ],
        fold::join(),
    );

    tag(tok(bounds), "range")
}

fn char_lit() -> Parser<Ast> {
    let chr = or(vec![escape_pair(), none_of("'\\")]);

    and(vec![ch('\''), chr, ch('\'')], fold::middle())
        .expect("character literal")
        .apply(|raw| Ast::leaf("", &unescape(&raw.contents)))
}

/// `[...]`; the stored contents are the class text with its brackets,
/// escapes intact, ready for the regex compiler.
fn class_atom() -> Parser<Ast> {
    let item = or(vec![escape_pair(), none_of("]\\")]);
    let body = and(
        vec![ch('['), item.many1(fold::join()), ch(']')],
        fold::middle(),
    )
    .expect("character class");

    tag(
        tok(body).apply(|raw| Ast::leaf("", &format!("[{}]", raw.contents))),
        "class",
    )
}

/// `<name>`, a reference to another rule.
fn ref_atom() -> Parser<Ast> {
    let named = and(vec![ch('<'), common::ident(), ch('>')], fold::middle())
        .expect("rule reference");

    tag(tok(named), "ref")
}

/// `%N`, a slot for a caller-supplied parser.
fn placeholder_atom() -> Parser<Ast> {
    let indexed = and(vec![ch('%'), common::digits()], fold::last())
        .expect("placeholder");

    tag(tok(indexed), "holder")
}

/// A backslash and the character it escapes, kept verbatim.
fn escape_pair() -> Parser<Ast> {
    and(vec![ch('\\'), munch::any()], fold::join())
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}

fn lower_rule(rule: Ast) -> Rule {
    let mut parts = rule.children.into_iter();
    let name = parts.next().map_or_else(String::new, |n| n.contents);
    let expr = parts.next().map_or(Expr::Str(String::new()), lower_expr);

    Rule { name, expr }
}

fn lower_expr(node: Ast) -> Expr {
    match node.tag.as_str() {
        "alt" => {
            let mut alts: Vec<Expr> = node.children.into_iter().map(lower_expr).collect();
            if alts.len() == 1 {
                alts.pop().unwrap()
            } else {
                Expr::Choice(alts)
            }
        }
        "seq" => {
            let mut items: Vec<Expr> = node.children.into_iter().map(lower_expr).collect();
            if items.len() == 1 {
                items.pop().unwrap()
            } else {
                Expr::Seq(items)
            }
        }
        "item" => {
            let mut parts = node.children.into_iter();
            let mut expr = parts.next().map_or(Expr::Str(String::new()), lower_expr);

            for marker in parts {
                expr = match marker.tag.as_str() {
                    "rep" => Expr::Rep(Box::new(expr)),
                    "rep1" => Expr::RepOnce(Box::new(expr)),
                    "opt" => Expr::Opt(Box::new(expr)),
                    "tagmark" => Expr::Tag(Box::new(expr), marker.contents),
                    "applymark" => Expr::Transform(Box::new(expr), parse_index(&marker.contents)),
                    _ => expr,
                };
            }

            expr
        }
        "range" => {
            let mut bounds = node.contents.chars();
            let lo = bounds.next().unwrap_or('\0');
            let hi = bounds.next().unwrap_or(lo);
            Expr::Range(lo, hi)
        }
        "class" => Expr::Class(node.contents),
        "ref" => Expr::Ref(node.contents),
        "holder" => Expr::Placeholder(parse_index(&node.contents)),
        // "str", and the fallback for shapes the grammar cannot produce.
        _ => Expr::Str(node.contents),
    }
}

/// Indices too large for `usize` saturate; validation rejects them as
/// out of range.
fn parse_index(digits: &str) -> usize {
    digits.parse().unwrap_or(usize::MAX)
}
