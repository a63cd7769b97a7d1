// munch. Parser combinators built and run at runtime
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Whole-grammar checks that run between parsing and compilation, so
//! compilation itself never meets a dangling reference or a misused
//! argument slot.

use std::collections::HashSet;

use crate::ast::{Expr, Rule};
use crate::{Arg, Error};

pub(crate) fn validate(rules: &[Rule], args: &[Arg]) -> Result<(), Error> {
    let mut defined = HashSet::new();

    for rule in rules {
        if !defined.insert(rule.name.as_str()) {
            return Err(Error::AlreadyDefined {
                name: rule.name.clone(),
            });
        }
    }

    for rule in rules {
        let mut result = Ok(());

        rule.expr.walk(&mut |expr| {
            if result.is_ok() {
                result = check(rule, expr, &defined, args);
            }
        });

        result?;
    }

    Ok(())
}

fn check(
    rule: &Rule,
    expr: &Expr,
    defined: &HashSet<&str>,
    args: &[Arg],
) -> Result<(), Error> {
    match *expr {
        Expr::Ref(ref name) if !defined.contains(name.as_str()) => Err(Error::Undefined {
            rule: rule.name.clone(),
            referenced: name.clone(),
        }),
        Expr::Range(lo, hi) if lo > hi => Err(Error::InvalidRange {
            rule: rule.name.clone(),
            lo,
            hi,
        }),
        Expr::Placeholder(index) => {
            if index >= args.len() {
                Err(out_of_range(rule, index, args))
            } else if !args[index].is_parser() {
                Err(Error::ExpectedParser {
                    rule: rule.name.clone(),
                    index,
                })
            } else {
                Ok(())
            }
        }
        Expr::Transform(_, index) => {
            if index >= args.len() {
                Err(out_of_range(rule, index, args))
            } else if args[index].is_parser() {
                Err(Error::ExpectedTransform {
                    rule: rule.name.clone(),
                    index,
                })
            } else {
                Ok(())
            }
        }
        _ => Ok(()),
    }
}

fn out_of_range(rule: &Rule, index: usize, args: &[Arg]) -> Error {
    Error::PlaceholderOutOfRange {
        rule: rule.name.clone(),
        index,
        provided: args.len(),
    }
}

#[cfg(test)]
mod tests {
    use munch::ast::Ast;

    use super::*;

    fn rule(name: &str, expr: Expr) -> Rule {
        Rule {
            name: name.to_owned(),
            expr,
        }
    }

    #[test]
    fn duplicate_rules_are_rejected() {
        let rules = [
            rule("a", Expr::Str("x".to_owned())),
            rule("a", Expr::Str("y".to_owned())),
        ];

        assert_eq!(
            validate(&rules, &[]),
            Err(Error::AlreadyDefined {
                name: "a".to_owned()
            })
        );
    }

    #[test]
    fn dangling_references_are_rejected() {
        let rules = [rule("a", Expr::Ref("ghost".to_owned()))];

        assert_eq!(
            validate(&rules, &[]),
            Err(Error::Undefined {
                rule: "a".to_owned(),
                referenced: "ghost".to_owned()
            })
        );
    }

    #[test]
    fn references_resolve_regardless_of_order() {
        let rules = [
            rule("a", Expr::Ref("b".to_owned())),
            rule("b", Expr::Ref("a".to_owned())),
        ];

        assert_eq!(validate(&rules, &[]), Ok(()));
    }

    #[test]
    fn inverted_ranges_are_rejected() {
        let rules = [rule("a", Expr::Range('z', 'a'))];

        assert_eq!(
            validate(&rules, &[]),
            Err(Error::InvalidRange {
                rule: "a".to_owned(),
                lo: 'z',
                hi: 'a'
            })
        );
    }

    #[test]
    fn placeholders_must_be_in_range() {
        let rules = [rule("a", Expr::Placeholder(1))];
        let args = [Arg::parser(munch::ch::<Ast>('x'))];

        assert_eq!(
            validate(&rules, &args),
            Err(Error::PlaceholderOutOfRange {
                rule: "a".to_owned(),
                index: 1,
                provided: 1
            })
        );
    }

    #[test]
    fn placeholder_slots_must_hold_parsers() {
        let rules = [rule("a", Expr::Placeholder(0))];
        let args = [Arg::transform(|ast| ast)];

        assert_eq!(
            validate(&rules, &args),
            Err(Error::ExpectedParser {
                rule: "a".to_owned(),
                index: 0
            })
        );
    }

    #[test]
    fn transform_slots_must_hold_transforms() {
        let rules = [rule(
            "a",
            Expr::Transform(Box::new(Expr::Str("x".to_owned())), 0),
        )];
        let args = [Arg::parser(munch::ch::<Ast>('x'))];

        assert_eq!(
            validate(&rules, &args),
            Err(Error::ExpectedTransform {
                rule: "a".to_owned(),
                index: 0
            })
        );
    }

    #[test]
    fn a_well_formed_grammar_passes() {
        let rules = [
            rule(
                "a",
                Expr::Seq(vec![
                    Expr::Ref("b".to_owned()),
                    Expr::Transform(Box::new(Expr::Placeholder(0)), 1),
                ]),
            ),
            rule("b", Expr::Range('0', '9')),
        ];
        let args = [Arg::parser(munch::ch::<Ast>('x')), Arg::transform(|ast| ast)];

        assert_eq!(validate(&rules, &args), Ok(()));
    }
}
