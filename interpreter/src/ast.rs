use std::fmt::{Display, Formatter};

use drawl_core::NativeFn;

use crate::value::ValueCell;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum BinOp {
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    Pow,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum StepOp {
    Incr,
    Decr,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Fixity {
    Prefix,
    Postfix,
}

/// Operand of an increment/decrement. Restricting this to a cell or a bare
/// literal at the type level is what makes `++(T + 1)` unrepresentable; the
/// parser rejects it before a node is ever built.
#[derive(Debug, PartialEq)]
pub(crate) enum StepTarget {
    Cell { name: String, cell: ValueCell },
    Literal(f64),
}

/// An expression tree. `Const` and `Var` are the only leaves; unary minus is
/// encoded as `0 - x` during parsing, so every `Binary` node has both sides.
#[derive(Debug, PartialEq)]
pub(crate) enum Expr {
    Const(f64),
    Var {
        name: String,
        cell: ValueCell,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        name: String,
        func: NativeFn,
        arg: Box<Expr>,
    },
    Step {
        op: StepOp,
        fixity: Fixity,
        target: StepTarget,
    },
}

impl Expr {
    pub(crate) fn constant(value: f64) -> Self {
        Expr::Const(value)
    }

    pub(crate) fn variable(name: String, cell: ValueCell) -> Self {
        Expr::Var { name, cell }
    }

    pub(crate) fn binary(op: BinOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub(crate) fn call(name: String, func: NativeFn, arg: Expr) -> Self {
        Expr::Call {
            name,
            func,
            arg: Box::new(arg),
        }
    }

    pub(crate) fn step(op: StepOp, fixity: Fixity, target: StepTarget) -> Self {
        Expr::Step { op, fixity, target }
    }
}

// The rendered form used by the syntax tree dumps.
impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Const(value) => write!(f, "{}", value),
            Expr::Var { name, .. } => write!(f, "{}", name),
            Expr::Binary { op, left, right } => write!(f, "({} {} {})", op, left, right),
            Expr::Call { name, arg, .. } => write!(f, "({} {})", name, arg),
            Expr::Step {
                op,
                fixity: Fixity::Prefix,
                target,
            } => write!(f, "({} {})", op, target),
            Expr::Step {
                op,
                fixity: Fixity::Postfix,
                target,
            } => write!(f, "({} {})", target, op),
        }
    }
}

impl Display for BinOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            BinOp::Plus => "+",
            BinOp::Minus => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Pow => "^",
        };
        write!(f, "{}", symbol)
    }
}

impl Display for StepOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StepOp::Incr => write!(f, "++"),
            StepOp::Decr => write!(f, "--"),
        }
    }
}

impl Display for StepTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StepTarget::Cell { name, .. } => write!(f, "{}", name),
            StepTarget::Literal(value) => write!(f, "{}", value),
        }
    }
}

/// A fully parsed `FOR` statement. Bounds are plain numbers because they are
/// evaluated while the statement parses; only the draw pair stays a tree, to
/// be re-evaluated once per iteration.
#[derive(Debug, PartialEq)]
pub(crate) struct Loop {
    pub(crate) name: String,
    pub(crate) cell: ValueCell,
    pub(crate) start: f64,
    pub(crate) end: f64,
    pub(crate) step: f64,
    pub(crate) line: usize,
    pub(crate) body: LoopBody,
}

/// A loop either nests another loop or terminates in a draw pair, never
/// neither.
#[derive(Debug, PartialEq)]
pub(crate) enum LoopBody {
    Nested(Box<Loop>),
    Draw { x: Expr, y: Expr },
}
