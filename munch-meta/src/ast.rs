// munch. Parser combinators built and run at runtime
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! The rule tree a grammar source is lowered to before compilation.

/// A named grammar rule.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rule {
    pub name: String,
    pub expr: Expr,
}

/// One expression of a rule body.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Expr {
    /// Matches an exact string, e.g. `"let"`
    Str(String),
    /// Matches one character in the range, e.g. `'a'-'z'`
    Range(char, char),
    /// Matches a regex character class, e.g. `[a-z_]`; the raw class
    /// text including brackets
    Class(String),
    /// Matches the rule with the given name, e.g. `<expr>`
    Ref(String),
    /// Matches the caller-supplied parser at this position, e.g. `%0`
    Placeholder(usize),
    /// Matches a sequence of expressions, e.g. `e1 e2`
    Seq(Vec<Expr>),
    /// Matches the first succeeding alternative, e.g. `e1 | e2`
    Choice(Vec<Expr>),
    /// Matches an expression zero or more times, e.g. `e*`
    Rep(Box<Expr>),
    /// Matches an expression one or more times, e.g. `e+`
    RepOnce(Box<Expr>),
    /// Optionally matches an expression, e.g. `e?`
    Opt(Box<Expr>),
    /// Tags an expression's tree output, e.g. `e @name`
    Tag(Box<Expr>, String),
    /// Applies the caller-supplied transform, e.g. `e @%1`
    Transform(Box<Expr>, usize),
}

impl Expr {
    /// Visits this expression and every sub-expression, outside in.
    pub fn walk<F>(&self, f: &mut F)
    where
        F: FnMut(&Expr),
    {
        f(self);

        match *self {
            Expr::Seq(ref exprs) | Expr::Choice(ref exprs) => {
                for expr in exprs {
                    expr.walk(f);
                }
            }
            Expr::Rep(ref expr)
            | Expr::RepOnce(ref expr)
            | Expr::Opt(ref expr)
            | Expr::Tag(ref expr, _)
            | Expr::Transform(ref expr, _) => expr.walk(f),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_reaches_every_node() {
        let expr = Expr::Choice(vec![
            Expr::Seq(vec![Expr::Str("a".to_owned()), Expr::Ref("b".to_owned())]),
            Expr::Rep(Box::new(Expr::Tag(
                Box::new(Expr::Range('0', '9')),
                "digit".to_owned(),
            ))),
        ]);

        let mut count = 0;
        expr.walk(&mut |_| count += 1);
        assert_eq!(count, 7);
    }
}
