//! Numeric integration with the trapezoidal rule
//!
//! ```
//! use exprvm::{integrate::{integrate, Settings}, parse};
//! use std::collections::BTreeMap;
//!
//! let e = parse("x ^ 2")?;
//! let mut vars = BTreeMap::new();
//! let area = integrate(&e, &mut vars, "x", 0.0, 3.0, &Settings::default());
//! assert!((area - 9.0).abs() < 1e-3);
//! assert!(vars.is_empty()); // the binding for `x` is removed again
//! # Ok::<(), exprvm::Error>(())
//! ```
use crate::{compiler::Program, tree::Expr, vm::ProgramEval};
use log::debug;
use std::collections::BTreeMap;

/// Settings for numeric integration
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Settings {
    /// Number of equal-width segments between the bounds
    pub segments: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self { segments: 100 }
    }
}

/// Sums trapezoids under `f` between `from` and `to`
fn trapezoid(
    from: f64,
    to: f64,
    segments: usize,
    mut f: impl FnMut(f64) -> f64,
) -> f64 {
    if segments == 0 {
        return 0.0;
    }
    let dx = (to - from) / segments as f64;
    let mut prev = f(from);
    let mut sum = 0.0;
    for i in 1..=segments {
        let next = f(i as f64 * dx + from);
        sum += dx * (prev + next) / 2.0;
        prev = next;
    }
    sum
}

/// Runs `f` with `vars[wrt]` available for overwriting, then restores it
fn with_binding<T>(
    vars: &mut BTreeMap<String, f64>,
    wrt: &str,
    f: impl FnOnce(&mut BTreeMap<String, f64>) -> T,
) -> T {
    let prev = vars.get(wrt).copied();
    let out = f(vars);
    match prev {
        Some(v) => vars.insert(wrt.to_owned(), v),
        None => vars.remove(wrt),
    };
    out
}

/// Integrates `e` over `wrt` from `from` to `to`
///
/// Other variables are read from `vars`.  The binding for `wrt` is
/// overwritten during integration and restored (or removed, if it was not
/// present) before returning.
pub fn integrate(
    e: &Expr,
    vars: &mut BTreeMap<String, f64>,
    wrt: &str,
    from: f64,
    to: f64,
    settings: &Settings,
) -> f64 {
    debug!(
        "integrating over {wrt} in [{from}, {to}] with {} segments",
        settings.segments
    );
    with_binding(vars, wrt, |vars| {
        trapezoid(from, to, settings.segments, |x| {
            vars.insert(wrt.to_owned(), x);
            e.eval(vars)
        })
    })
}

/// Integrates `e` over `wrt` using the given number of segments
///
/// See [`integrate`] for details.
pub fn integrate_n(
    e: &Expr,
    vars: &mut BTreeMap<String, f64>,
    wrt: &str,
    from: f64,
    to: f64,
    segments: usize,
) -> f64 {
    integrate(e, vars, wrt, from, to, &Settings { segments })
}

impl Program {
    /// Integrates this program over `wrt` from `from` to `to`
    ///
    /// This follows the same rules as [`integrate`], but evaluates with the
    /// interpreter (reusing one [`ProgramEval`] for every sample).
    pub fn integrate(
        &self,
        vars: &mut BTreeMap<String, f64>,
        wrt: &str,
        from: f64,
        to: f64,
        settings: &Settings,
    ) -> f64 {
        debug!(
            "integrating program over {wrt} in [{from}, {to}] with {} segments",
            settings.segments
        );
        let mut eval = ProgramEval::default();
        with_binding(vars, wrt, |vars| {
            trapezoid(from, to, settings.segments, |x| {
                vars.insert(wrt.to_owned(), x);
                eval.eval(self, vars)
            })
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{compiler::compile, parse};
    use approx::assert_relative_eq;

    #[test]
    fn polynomial() {
        let e = parse("x^2").unwrap();
        let mut vars = BTreeMap::new();
        let area = integrate_n(&e, &mut vars, "x", 0.0, 4.0, 10_000);
        assert!((area - 64.0 / 3.0).abs() < 0.001);
    }

    #[test]
    fn linear_is_exact() {
        let e = parse("2 * x + 1").unwrap();
        let mut vars = BTreeMap::new();
        let area = integrate_n(&e, &mut vars, "x", 0.0, 1.0, 4);
        assert_relative_eq!(area, 2.0);
    }

    #[test]
    fn other_variables() {
        let e = parse("a * sin(x)").unwrap();
        let mut vars = BTreeMap::from([("a".to_owned(), 2.0)]);
        let s = Settings { segments: 1000 };
        let area = integrate(&e, &mut vars, "x", 0.0, std::f64::consts::PI, &s);
        assert_relative_eq!(area, 4.0, epsilon = 1e-4);
    }

    #[test]
    fn binding_is_restored() {
        let e = parse("x").unwrap();
        let mut vars = BTreeMap::from([("x".to_owned(), 7.0)]);
        integrate(&e, &mut vars, "x", 0.0, 1.0, &Settings::default());
        assert_eq!(vars.get("x"), Some(&7.0));

        let mut vars = BTreeMap::new();
        integrate(&e, &mut vars, "x", 0.0, 1.0, &Settings::default());
        assert!(vars.is_empty());
    }

    #[test]
    fn reversed_and_empty() {
        let e = parse("x").unwrap();
        let mut vars = BTreeMap::new();
        assert_relative_eq!(
            integrate_n(&e, &mut vars, "x", 1.0, 0.0, 10),
            -0.5,
            epsilon = 1e-12
        );
        assert_eq!(integrate_n(&e, &mut vars, "x", 0.0, 1.0, 0), 0.0);
    }

    #[test]
    fn compiled_matches_tree() {
        let e = parse("sin(x) * cos(y) + x ^ 2").unwrap();
        let p = compile(&e);
        let mut vars = BTreeMap::from([("y".to_owned(), 0.3)]);
        let s = Settings { segments: 50 };
        let a = integrate(&e, &mut vars, "x", -1.0, 2.0, &s);
        let b = p.integrate(&mut vars, "x", -1.0, 2.0, &s);
        assert_eq!(a, b);
        assert_eq!(vars.len(), 1);
    }
}
