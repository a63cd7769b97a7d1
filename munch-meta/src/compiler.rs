// munch. Parser combinators built and run at runtime
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Lowers validated rules to parser graphs.
//!
//! Compilation is two-phase: every rule first gets a forward
//! declaration under its name, then each body is built against that
//! table and installed. Rules may therefore reference each other in any
//! order, including cyclically.

use std::collections::HashMap;

use munch::ast::{self, Ast};
use munch::{and, fold, or, range, string, Parser};

use crate::ast::{Expr, Rule};
use crate::{Arg, Error};

pub(crate) fn compile(
    rules: &[Rule],
    args: &[Arg],
) -> Result<HashMap<String, Parser<Ast>>, Error> {
    let mut table = HashMap::with_capacity(rules.len());

    for rule in rules {
        table.insert(rule.name.clone(), Parser::declare(&rule.name));
    }

    for rule in rules {
        let body = match compile_expr(&rule.expr, rule, &table, args) {
            Ok(body) => body,
            Err(e) => {
                // Bodies installed so far hold cycles through the
                // table; detach them before the table is dropped.
                for forward in table.values() {
                    forward.undefine();
                }
                return Err(e);
            }
        };

        if let Some(forward) = table.get(&rule.name) {
            forward.define(ast::tag(body, &rule.name));
        }
    }

    Ok(table)
}

fn compile_expr(
    expr: &Expr,
    rule: &Rule,
    table: &HashMap<String, Parser<Ast>>,
    args: &[Arg],
) -> Result<Parser<Ast>, Error> {
    Ok(match *expr {
        Expr::Str(ref s) => string(s),
        Expr::Range(lo, hi) => range(lo, hi),
        Expr::Class(ref source) => {
            munch::regex::compile(source).map_err(|e| Error::Class {
                rule: rule.name.clone(),
                source: e,
            })?
        }
        Expr::Ref(ref name) => match table.get(name) {
            Some(forward) => forward.clone(),
            // Validation resolved every reference already.
            None => {
                return Err(Error::Undefined {
                    rule: rule.name.clone(),
                    referenced: name.clone(),
                })
            }
        },
        Expr::Placeholder(index) => match args.get(index).and_then(Arg::as_parser) {
            Some(parser) => parser.clone(),
            None => return Err(out_of_range(rule, index, args)),
        },
        Expr::Seq(ref exprs) => {
            let mut seq = Vec::with_capacity(exprs.len());
            for e in exprs {
                seq.push(compile_expr(e, rule, table, args)?);
            }
            and(seq, fold::join())
        }
        Expr::Choice(ref exprs) => {
            let mut alts = Vec::with_capacity(exprs.len());
            for e in exprs {
                alts.push(compile_expr(e, rule, table, args)?);
            }
            or(alts)
        }
        Expr::Rep(ref e) => compile_expr(e, rule, table, args)?.many(fold::join()),
        Expr::RepOnce(ref e) => compile_expr(e, rule, table, args)?.many1(fold::join()),
        Expr::Opt(ref e) => compile_expr(e, rule, table, args)?.maybe(),
        Expr::Tag(ref e, ref name) => ast::tag(compile_expr(e, rule, table, args)?, name),
        Expr::Transform(ref e, index) => match args.get(index).and_then(Arg::as_transform) {
            Some(f) => compile_expr(e, rule, table, args)?.apply(move |tree| f(tree)),
            None => return Err(out_of_range(rule, index, args)),
        },
    })
}

fn out_of_range(rule: &Rule, index: usize, args: &[Arg]) -> Error {
    Error::PlaceholderOutOfRange {
        rule: rule.name.clone(),
        index,
        provided: args.len(),
    }
}
