use crate::ast::{BinOp, Expr, Fixity, Loop, LoopBody, StepOp, StepTarget};
use crate::canvas::Canvas;
use crate::error::Error;

/// Reduces a tree to a number. Reading a variable observes its cell's
/// current value; increments and decrements write back through the cell, so
/// their effect is visible to every other node naming the same variable.
pub(crate) fn evaluate(expr: &Expr) -> f64 {
    match expr {
        Expr::Const(value) => *value,
        Expr::Var { cell, .. } => cell.get(),

        Expr::Binary { op, left, right } => {
            let left = evaluate(left);
            let right = evaluate(right);

            match op {
                BinOp::Plus => left + right,
                BinOp::Minus => left - right,
                BinOp::Mul => left * right,
                BinOp::Div => left / right,
                // IEEE remainder with the dividend's sign
                BinOp::Mod => left % right,
                BinOp::Pow => left.powf(right),
            }
        }

        Expr::Call { func, arg, .. } => func(evaluate(arg)),

        // Postfix returns the pre-mutation value and mutates after; prefix
        // mutates first and returns the post-mutation value. A literal
        // target has nothing to mutate, only a value to report.
        Expr::Step { op, fixity, target } => {
            let delta = match op {
                StepOp::Incr => 1.0,
                StepOp::Decr => -1.0,
            };

            match (fixity, target) {
                (Fixity::Prefix, StepTarget::Cell { cell, .. }) => {
                    cell.set(cell.get() + delta);
                    cell.get()
                }
                (Fixity::Postfix, StepTarget::Cell { cell, .. }) => {
                    let before = cell.get();
                    cell.set(before + delta);
                    before
                }
                (Fixity::Prefix, StepTarget::Literal(value)) => value + delta,
                (Fixity::Postfix, StepTarget::Literal(value)) => *value,
            }
        }
    }
}

/// The transform registers in effect while a statement executes: set by
/// `ORIGIN`/`SCALE`/`ROT`, read for every drawn point.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub origin: (f64, f64),
    pub scale: (f64, f64),
    pub rotation: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Transform {
            origin: (0.0, 0.0),
            scale: (1.0, 1.0),
            rotation: 0.0,
        }
    }
}

impl Transform {
    /// Scale componentwise, rotate about the origin, then translate.
    ///
    /// The rotation is `x' = x·cosθ + y·sinθ`, `y' = y·cosθ − x·sinθ` — the
    /// clockwise convention, not the textbook counter-clockwise matrix.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let x = x * self.scale.0;
        let y = y * self.scale.1;

        let (sin, cos) = self.rotation.sin_cos();
        let (x, y) = (x * cos + y * sin, y * cos - x * sin);

        (x + self.origin.0, y + self.origin.1)
    }
}

/// Runs a fully parsed top-level loop, emitting one point per draw
/// iteration and signalling line completion exactly once at the end.
pub(crate) fn run_loop(
    lp: &Loop,
    transform: &Transform,
    canvas: &mut dyn Canvas,
) -> Result<(), Error> {
    iterate(lp, transform, canvas)?;
    canvas.line_complete();
    Ok(())
}

fn iterate(lp: &Loop, transform: &Transform, canvas: &mut dyn Canvas) -> Result<(), Error> {
    if lp.step == 0.0 {
        return Err(Error::zero_step(lp.line, &lp.name));
    }

    // The induction variable iterates through the shared cell itself, so a
    // mutation from inside the body's expressions carries into loop control.
    lp.cell.set(lp.start);
    while in_range(lp.cell.get(), lp.end, lp.step) {
        match &lp.body {
            LoopBody::Nested(child) => iterate(child, transform, canvas)?,
            LoopBody::Draw { x, y } => {
                let (x, y) = transform.apply(evaluate(x), evaluate(y));
                canvas.point(x, y);
            }
        }

        lp.cell.set(lp.cell.get() + lp.step);
    }

    Ok(())
}

// `end` is inclusive. A step whose sign opposes the range direction never
// enters the loop.
fn in_range(value: f64, end: f64, step: f64) -> bool {
    if step > 0.0 {
        value <= end
    } else {
        value >= end
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{BinOp, Expr, Fixity, Loop, LoopBody, StepOp, StepTarget};
    use crate::canvas::Canvas;
    use crate::error::Error;
    use crate::eval::{evaluate, run_loop, Transform};
    use crate::value::ValueCell;

    #[derive(Default)]
    struct Recorder {
        points: Vec<(f64, f64)>,
        lines: usize,
    }

    impl Canvas for Recorder {
        fn point(&mut self, x: f64, y: f64) {
            self.points.push((x, y));
        }

        fn line_complete(&mut self) {
            self.lines += 1;
        }
    }

    fn draw_loop(name: &str, cell: ValueCell, range: (f64, f64, f64), x: Expr, y: Expr) -> Loop {
        Loop {
            name: String::from(name),
            cell,
            start: range.0,
            end: range.1,
            step: range.2,
            line: 1,
            body: LoopBody::Draw { x, y },
        }
    }

    #[test]
    fn test_arithmetic() {
        let tests = [
            (
                Expr::binary(BinOp::Plus, Expr::constant(1.0), Expr::constant(2.0)),
                3.0,
            ),
            (
                Expr::binary(BinOp::Minus, Expr::constant(1.0), Expr::constant(2.0)),
                -1.0,
            ),
            (
                Expr::binary(BinOp::Mul, Expr::constant(3.0), Expr::constant(4.0)),
                12.0,
            ),
            (
                Expr::binary(BinOp::Div, Expr::constant(1.0), Expr::constant(4.0)),
                0.25,
            ),
            (
                Expr::binary(BinOp::Pow, Expr::constant(2.0), Expr::constant(10.0)),
                1024.0,
            ),
        ];

        for (expr, expected) in tests {
            assert_eq!(evaluate(&expr), expected);
        }
    }

    #[test]
    fn test_remainder_follows_dividend_sign() {
        let tests = [((-7.0, 3.0), -1.0), ((7.0, -3.0), 1.0), ((7.0, 3.0), 1.0)];

        for ((dividend, divisor), expected) in tests {
            let expr = Expr::binary(
                BinOp::Mod,
                Expr::constant(dividend),
                Expr::constant(divisor),
            );
            assert_eq!(evaluate(&expr), expected);
        }
    }

    #[test]
    fn test_call_applies_native_function() {
        let expr = Expr::call(String::from("SQRT"), f64::sqrt, Expr::constant(16.0));
        assert_eq!(evaluate(&expr), 4.0);
    }

    #[test]
    fn test_variable_reads_cell() {
        let cell = ValueCell::default();
        let expr = Expr::variable(String::from("T"), cell.clone());

        cell.set(2.5);
        assert_eq!(evaluate(&expr), 2.5);
    }

    #[test]
    fn test_prefix_mutates_then_returns() {
        let cell = ValueCell::default();
        cell.set(5.0);

        let expr = Expr::step(
            StepOp::Incr,
            Fixity::Prefix,
            StepTarget::Cell {
                name: String::from("T"),
                cell: cell.clone(),
            },
        );

        assert_eq!(evaluate(&expr), 6.0);
        assert_eq!(cell.get(), 6.0);
    }

    #[test]
    fn test_postfix_returns_then_mutates() {
        let cell = ValueCell::default();
        cell.set(5.0);

        let expr = Expr::step(
            StepOp::Decr,
            Fixity::Postfix,
            StepTarget::Cell {
                name: String::from("T"),
                cell: cell.clone(),
            },
        );

        assert_eq!(evaluate(&expr), 5.0);
        assert_eq!(cell.get(), 4.0);
    }

    #[test]
    fn test_step_on_literal_has_nothing_to_mutate() {
        let prefix = Expr::step(StepOp::Incr, Fixity::Prefix, StepTarget::Literal(5.0));
        let postfix = Expr::step(StepOp::Incr, Fixity::Postfix, StepTarget::Literal(5.0));

        assert_eq!(evaluate(&prefix), 6.0);
        assert_eq!(evaluate(&postfix), 5.0);
    }

    #[test]
    fn test_transform_scales_rotates_translates() {
        let transform = Transform {
            origin: (10.0, 20.0),
            scale: (2.0, 3.0),
            rotation: std::f64::consts::FRAC_PI_2,
        };

        // (1, 1) scales to (2, 3); a quarter turn clockwise maps it to
        // roughly (3, -2); then the origin offset lands it at (13, 18).
        let (x, y) = transform.apply(1.0, 1.0);
        assert!((x - 13.0).abs() < 1e-9);
        assert!((y - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_identity_transform_is_a_no_op() {
        assert_eq!(Transform::default().apply(4.0, -2.5), (4.0, -2.5));
    }

    #[test]
    fn test_loop_emits_inclusive_range() {
        let cell = ValueCell::default();
        let lp = draw_loop(
            "T",
            cell.clone(),
            (0.0, 1.0, 0.25),
            Expr::variable(String::from("T"), cell.clone()),
            Expr::constant(0.0),
        );

        let mut canvas = Recorder::default();
        run_loop(&lp, &Transform::default(), &mut canvas).unwrap();

        let xs: Vec<f64> = canvas.points.iter().map(|p| p.0).collect();
        assert_eq!(xs, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(canvas.lines, 1);
    }

    #[test]
    fn test_nested_loops_run_outer_major() {
        let outer_cell = ValueCell::default();
        let inner_cell = ValueCell::default();

        let inner = draw_loop(
            "U",
            inner_cell.clone(),
            (0.0, 1.0, 1.0),
            Expr::variable(String::from("T"), outer_cell.clone()),
            Expr::variable(String::from("U"), inner_cell.clone()),
        );
        let outer = Loop {
            name: String::from("T"),
            cell: outer_cell,
            start: 0.0,
            end: 1.0,
            step: 1.0,
            line: 1,
            body: LoopBody::Nested(Box::new(inner)),
        };

        let mut canvas = Recorder::default();
        run_loop(&outer, &Transform::default(), &mut canvas).unwrap();

        assert_eq!(
            canvas.points,
            vec![(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (1.0, 1.0)]
        );
        // line completion belongs to the top-level loop, not each inner pass
        assert_eq!(canvas.lines, 1);
    }

    #[test]
    fn test_opposing_step_sign_runs_zero_iterations() {
        let cell = ValueCell::default();
        let lp = draw_loop(
            "T",
            cell.clone(),
            (0.0, 10.0, -1.0),
            Expr::variable(String::from("T"), cell.clone()),
            Expr::constant(0.0),
        );

        let mut canvas = Recorder::default();
        run_loop(&lp, &Transform::default(), &mut canvas).unwrap();

        assert!(canvas.points.is_empty());
        assert_eq!(canvas.lines, 1);
    }

    #[test]
    fn test_zero_step_is_an_error() {
        let cell = ValueCell::default();
        let lp = draw_loop(
            "T",
            cell.clone(),
            (0.0, 1.0, 0.0),
            Expr::variable(String::from("T"), cell.clone()),
            Expr::constant(0.0),
        );

        let mut canvas = Recorder::default();
        let err = run_loop(&lp, &Transform::default(), &mut canvas).unwrap_err();

        assert_eq!(err, Error::zero_step(1, "T"));
        assert_eq!(err.to_string(), "line 1: T loop step must not be zero");
        assert_eq!(canvas.lines, 0);
    }
}
