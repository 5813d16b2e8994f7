//! The three expression front ends must build identical syntax trees.
//!
//! Trees are compared with `PartialEq`, which includes every span, so this
//! also checks that each parser computes ranges the same way.

mod test_harness;

use bumpalo::Bump;
use test_harness::TestHarness;
use zinc::{Parser, ParserKind};

fn assert_equivalent(source: &str) {
    let arenas: Vec<Bump> = ParserKind::ALL.iter().map(|_| Bump::new()).collect();
    let programs: Vec<_> = ParserKind::ALL
        .iter()
        .zip(&arenas)
        .map(|(&kind, arena)| match Parser::parse(source, arena, kind) {
            Ok(program) => program,
            Err(errors) => panic!("{kind:?} failed on {source:?}:\n{errors}"),
        })
        .collect();

    for (kind, program) in ParserKind::ALL.iter().zip(&programs).skip(1) {
        assert_eq!(
            &programs[0], program,
            "Pratt and {kind:?} disagree on {source:?}"
        );
    }
}

fn assert_expressions_equivalent(source: &str) {
    let arenas: Vec<Bump> = ParserKind::ALL.iter().map(|_| Bump::new()).collect();
    let exprs: Vec<_> = ParserKind::ALL
        .iter()
        .zip(&arenas)
        .map(|(&kind, arena)| match Parser::parse_expression(source, arena, kind) {
            Ok(expr) => expr,
            Err(errors) => panic!("{kind:?} failed on {source:?}:\n{errors}"),
        })
        .collect();

    for (kind, expr) in ParserKind::ALL.iter().zip(&exprs).skip(1) {
        assert_eq!(exprs[0], *expr, "Pratt and {kind:?} disagree on {source:?}");
    }
}

#[test]
fn test_scripts_parse_identically() {
    let harness = TestHarness::new();
    for script in [
        "hello.zn",
        "arithmetic.zn",
        "structs.zn",
        "closures.zn",
        "globals.zn",
        "short_circuit.zn",
        "blocks.zn",
        "recursion.zn",
        "errors/undefined_variable.zn",
        "errors/missing_fields.zn",
        "errors/duplicate_function.zn",
        "errors/uninitialized.zn",
        "errors/many_errors.zn",
    ] {
        assert_equivalent(&harness.load(script));
    }
}

#[test]
fn test_precedence_ladder() {
    for source in [
        "1 + 2 * 3 - 4 / 5 % 6",
        "1 - 2 - 3",
        "2 ^ 3 ^ 2",
        "-2 ^ 2",
        "!a == b",
        "a < b == c >= d",
        "a && b || c && d",
        "a or b and c",
        "a || b && c == d + e * f ^ g",
    ] {
        assert_expressions_equivalent(source);
    }
}

#[test]
fn test_postfix_and_assignment() {
    for source in [
        "f(1, g(2), h())",
        "a.b.c",
        "a.b = c.d = 1 + 2",
        "x = y = z",
        "P { x: 1, y: Q { z: 2 } }.x",
        "(a + b) * (c - d)",
        "((a))",
        "()",
        "-f(x).y",
        r#""str" + 'c' == "a\tb""#,
    ] {
        assert_expressions_equivalent(source);
    }
}

#[test]
fn test_declarations() {
    for source in [
        "struct P { x: num, y: num } func main() { val p = P { x: 1, y: 2 }; p.x = p.y; }",
        "var g = 1; val h: str = \"s\"; func main() { g = g + 1; }",
        "func f(a: num): num { return a; } func g() { return; } func main() { f(1); g(); }",
        "func main() { { val a = 1; { a; } } func inner(): bool { return true && false; } }",
        "func main() { \"\"\"multi\nline\"\"\"; /* block */ 1; // line\n }",
    ] {
        assert_equivalent(source);
    }
}
