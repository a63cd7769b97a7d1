// munch. Parser combinators built and run at runtime
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::num::NonZeroUsize;

use munch::{set_depth_limit, ErrorVariant};
use munch_meta::Grammar;

#[test]
fn rules_recurse_through_themselves() {
    let grammar = Grammar::compile(r#"p : ("(" <p> ")")? ;"#, &[]).unwrap();
    let exact = munch::common::total(grammar.rule("p").unwrap().clone());

    assert!(munch::parse("t", "((()))", &exact).is_ok());
    assert!(munch::parse("t", "", &exact).is_ok());
    assert!(munch::parse("t", "(()", &exact).is_err());
}

#[test]
fn mutually_recursive_rules_resolve_in_either_order() {
    let forwards = r#"
        a : "x" | "(" <b> ")" ;
        b : "y" | "(" <a> ")" ;
    "#;
    let backwards = r#"
        b : "y" | "(" <a> ")" ;
        a : "x" | "(" <b> ")" ;
    "#;

    for source in [forwards, backwards] {
        let grammar = Grammar::compile(source, &[]).unwrap();

        assert!(grammar.parse("a", "t", "((x))").is_ok());
        assert!(grammar.parse("a", "t", "(y)").is_ok());
        assert!(grammar.parse("b", "t", "((y))").is_ok());
        assert!(grammar.parse("a", "t", "(x)").is_err());
    }
}

#[test]
fn dropping_a_grammar_reclaims_its_parsers() {
    let grammar = Grammar::compile(r#"p : ("(" <p> ")")? ;"#, &[]).unwrap();
    let weak = grammar.rule("p").unwrap().downgrade();

    assert!(weak.upgrade().is_some());
    drop(grammar);
    assert!(weak.upgrade().is_none());
}

#[test]
fn runaway_rules_trip_the_depth_guard() {
    // `a` recurses without consuming anything.
    let grammar = Grammar::compile("a : <a>? ;", &[]).unwrap();

    // The limit is process-wide and tests run concurrently; keep it
    // far above any depth a sibling test reaches.
    set_depth_limit(NonZeroUsize::new(2048));
    let err = grammar.parse("a", "t", "x").unwrap_err();
    set_depth_limit(None);

    assert_eq!(err.variant, ErrorVariant::DepthLimit { limit: 2048 });
}

#[test]
fn repeating_a_nullable_item_terminates() {
    // The optional item can match nothing, so the repetition must not
    // spin on it.
    let grammar = Grammar::compile(r#"a : ("x"?)* ;"#, &[]).unwrap();

    assert!(grammar.parse("a", "t", "").is_ok());
    assert!(grammar.parse("a", "t", "xxx").is_ok());
}
