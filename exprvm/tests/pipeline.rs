//! End-to-end tests: text in, numbers out
use approx::assert_relative_eq;
use exprvm::{ErrorKind, compiler::compile, parse, tree::Expr};
use std::collections::BTreeMap;

fn bind(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

const EXPRS: &[&str] = &[
    "2+2-5",
    "3^4",
    "2+2*5+3*5+2*5+3*72",
    "sin(y/b)",
    "sin(x*y/b)*y+cos(a*x-y)",
    "ln(a) / (x - y) ^ 2",
    "x ^ y ^ 0.5 - a * b / 3",
    "cos(sin(cos(x))) * (1 - x) * (1 + x)",
];

fn bindings() -> Vec<BTreeMap<String, f64>> {
    vec![
        bind(&[("a", 1.5), ("b", 0.7345345), ("x", 2.0), ("y", 0.1)]),
        bind(&[("a", 0.25), ("b", -3.0), ("x", 0.5), ("y", 1.75)]),
        bind(&[("x", 4.0)]),
    ]
}

#[test]
fn known_values() {
    let empty = BTreeMap::new();
    assert_eq!(parse("2+2-5").unwrap().eval(&empty), -1.0);
    assert_eq!(parse("3^4").unwrap().eval(&empty), 81.0);
    assert_eq!(parse("2+2*5+3*5+2*5+3*72").unwrap().eval(&empty), 253.0);

    let (b, y) = (0.7345345, 0.1);
    let v = parse("sin(y/b)").unwrap().eval(&bind(&[("b", b), ("y", y)]));
    assert_eq!(v, (y / b).sin());
}

#[test]
fn compiled_matches_tree() {
    for s in EXPRS {
        let e = parse(s).unwrap();
        let p = compile(&e);
        for vars in bindings() {
            let (a, b) = (e.eval(&vars), p.run(&vars));
            assert_eq!(a.to_bits(), b.to_bits(), "{s}: {a} != {b}");
        }
    }
}

#[test]
fn compiled_simplified_matches_tree() {
    for s in EXPRS {
        let e = parse(s).unwrap();
        let p = compile(&e.simplify());
        for vars in bindings() {
            let (a, b) = (e.eval(&vars), p.run(&vars));
            if a.is_finite() {
                assert_relative_eq!(a, b, max_relative = 1e-12);
            }
        }
    }
}

#[test]
fn text_round_trip() {
    let mut exprs: Vec<Expr> =
        EXPRS.iter().map(|s| parse(s).unwrap()).collect();
    exprs.push(Expr::constant(-2.5) * Expr::var("x"));
    exprs.push(Expr::constant(f64::INFINITY) + Expr::var("x"));
    exprs.push(Expr::constant(f64::NEG_INFINITY) * Expr::var("x"));
    exprs.push(Expr::constant(0.1) + Expr::constant(1e20));
    exprs.push(Expr::constant(1.0) / Expr::constant(-0.0));
    exprs.push(Expr::constant(-0.0) * Expr::var("x"));
    for e in exprs {
        let text = e.to_string();
        let reparsed = parse(&text).unwrap();
        assert_eq!(reparsed.to_string(), text);
        for vars in bindings() {
            let (a, b) = (e.eval(&vars), reparsed.eval(&vars));
            assert!(a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan()));
        }
    }
}

#[test]
fn simplify_preserves_values() {
    let _ = env_logger::builder().is_test(true).try_init();
    let cases = [
        "x*x*x/x",
        "2*x*3*y/(4*x)",
        "(x+1)*(x+1)/(x+1)^2*y",
        "0-x+y*1+0",
        "sin(x)^2 * sin(x) / cos(y)",
        "x^y * x / x^a",
    ];
    for s in cases {
        let e = parse(s).unwrap();
        let simple = e.simplify();
        assert!(simple.vars().is_subset(&e.vars()), "{s} => {simple}");
        for vars in bindings() {
            let a = e.eval(&vars);
            if a.is_finite() {
                let b = simple.eval(&vars);
                assert_relative_eq!(b, a, max_relative = 1e-12);
            }
        }
    }
}

#[test]
fn identity_laws() {
    let x = Expr::var("x");
    assert_eq!(Expr::constant(0.0).simplify(), Expr::constant(0.0));
    assert_eq!((0.0 * x.ln()).simplify().to_string(), "0");
    let e = parse("sin(x) + 0").unwrap();
    assert_eq!(
        (e.clone() / 1.0).simplify().to_string(),
        e.simplify().to_string()
    );
}

#[test]
fn derivatives() {
    let x = Expr::var("x");
    let at4 = bind(&[("x", 4.0)]);
    assert_eq!(x.pow(2).deriv("x").eval(&at4), 8.0);
    assert_eq!(x.pow(3).deriv("x").eval(&at4), 48.0);

    // symbolic derivatives agree with finite differences
    let h = 1e-6;
    for s in EXPRS {
        let e = parse(s).unwrap();
        let d = e.deriv("x");
        for vars in bindings() {
            let mut lo = vars.clone();
            let mut hi = vars.clone();
            let x0 = vars.get("x").copied().unwrap_or(0.0);
            lo.insert("x".to_owned(), x0 - h);
            hi.insert("x".to_owned(), x0 + h);
            let numeric = (e.eval(&hi) - e.eval(&lo)) / (2.0 * h);
            let symbolic = d.eval(&vars);
            if numeric.is_finite() && symbolic.is_finite() {
                assert_relative_eq!(
                    symbolic,
                    numeric,
                    epsilon = 1e-4,
                    max_relative = 1e-4
                );
            }
        }
    }
}

#[test]
fn parse_errors() {
    assert_eq!(parse("(2+3").unwrap_err().kind(), ErrorKind::Parenthesis);
    assert_eq!(parse("2+3)").unwrap_err().kind(), ErrorKind::Parenthesis);
    assert_eq!(parse("2x").unwrap_err().kind(), ErrorKind::Lex);
    assert_eq!(parse("2 + * 3").unwrap_err().kind(), ErrorKind::StackUnderflow);
}

#[test]
fn shared_between_threads() {
    let p = compile(&parse("sin(x) * y").unwrap());
    std::thread::scope(|s| {
        for i in 0..4 {
            let p = &p;
            s.spawn(move || {
                let vars = bind(&[("x", i as f64), ("y", 2.0)]);
                assert_eq!(p.run(&vars), (i as f64).sin() * 2.0);
            });
        }
    });
}
