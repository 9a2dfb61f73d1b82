use ahash::AHashMap;

use drawl_core::{Token, TokenStream, Type};

use crate::ast::{BinOp, Expr, Fixity, Loop, LoopBody, StepOp, StepTarget};
use crate::canvas::Canvas;
use crate::error::Error;
use crate::eval::{evaluate, run_loop, Transform};
use crate::trace::Trace;
use crate::value::ValueCell;

/// Construction-time options. Both tracing switches default to off, which
/// keeps the parse allocation-free on the happy path.
#[derive(Debug, Default, Clone, Copy)]
pub struct Options {
    /// Record a structured trace of grammar productions and token matches.
    pub debug: bool,
    /// Record a rendered dump of each parsed expression tree.
    pub show_syntax_tree: bool,
}

// Helper aliases for shorter return types
type StmtResult = Result<(), Error>;
type ExprResult = Result<Expr, Error>;

/// Recursive-descent parser over one program string. Parsing and execution
/// are interleaved: `ORIGIN`/`SCALE`/`ROT` commit their registers the moment
/// they parse, and a completed top-level `FOR` statement runs before the
/// next statement is even looked at. A `Parser` is a single-use session —
/// one source, one canvas, one `parse()` call.
pub struct Parser<'a> {
    stream: TokenStream<'a>,
    token: Token,

    // One shared cell per distinct variable name; see `intern`.
    vars: AHashMap<String, ValueCell>,

    transform: Transform,
    canvas: &'a mut dyn Canvas,
    trace: Trace,
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str, canvas: &'a mut dyn Canvas, options: Options) -> Self {
        Parser {
            stream: TokenStream::new(src),
            token: Token::eof(1),
            vars: AHashMap::new(),
            transform: Transform::default(),
            canvas,
            trace: Trace::new(options.debug, options.show_syntax_tree),
        }
    }

    /// Consumes the whole program. On success the program-complete callback
    /// has fired exactly once; on failure the scanner is closed, nothing
    /// after the failing token has executed, and callbacks delivered by
    /// earlier statements stand.
    pub fn parse(&mut self) -> Result<(), Error> {
        self.trace.enter("Program");

        self.fetch_token()?;
        while self.token.ty != Type::Eof {
            self.statement()?;
            self.match_token(Type::SemiColon, "Expect ';' after statement.")?;
        }

        self.trace.exit("Program");
        self.canvas.program_complete();
        Ok(())
    }

    /// The transform registers as of the last executed statement.
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    fn statement(&mut self) -> StmtResult {
        self.trace.enter("Statement");

        match self.token.ty {
            Type::Origin => self.origin_statement()?,
            Type::Scale => self.scale_statement()?,
            Type::Rot => self.rot_statement()?,
            Type::For => self.loop_statement()?,
            _ => return Err(self.syntax_error("Expect statement.")),
        }

        self.trace.exit("Statement");
        Ok(())
    }

    fn origin_statement(&mut self) -> StmtResult {
        self.trace.enter("Origin Statement");

        self.match_token(Type::Origin, "Expect 'ORIGIN'.")?;
        self.match_token(Type::Is, "Expect 'IS' after 'ORIGIN'.")?;
        self.match_token(Type::LeftParen, "Expect '(' after 'IS'.")?;
        self.transform.origin.0 = self.bound()?;
        self.match_token(Type::Comma, "Expect ',' between coordinates.")?;
        self.transform.origin.1 = self.bound()?;
        self.match_token(Type::RightParen, "Expect ')' after coordinates.")?;

        self.trace.exit("Origin Statement");
        Ok(())
    }

    fn scale_statement(&mut self) -> StmtResult {
        self.trace.enter("Scale Statement");

        self.match_token(Type::Scale, "Expect 'SCALE'.")?;
        self.match_token(Type::Is, "Expect 'IS' after 'SCALE'.")?;
        self.match_token(Type::LeftParen, "Expect '(' after 'IS'.")?;
        self.transform.scale.0 = self.bound()?;
        self.match_token(Type::Comma, "Expect ',' between scale factors.")?;
        self.transform.scale.1 = self.bound()?;
        self.match_token(Type::RightParen, "Expect ')' after scale factors.")?;

        self.trace.exit("Scale Statement");
        Ok(())
    }

    fn rot_statement(&mut self) -> StmtResult {
        self.trace.enter("Rotate Statement");

        self.match_token(Type::Rot, "Expect 'ROT'.")?;
        self.match_token(Type::Is, "Expect 'IS' after 'ROT'.")?;
        self.transform.rotation = self.bound()?;

        self.trace.exit("Rotate Statement");
        Ok(())
    }

    fn loop_statement(&mut self) -> StmtResult {
        let lp = self.for_loop()?;
        run_loop(&lp, &self.transform, self.canvas)
    }

    fn for_loop(&mut self) -> Result<Loop, Error> {
        self.trace.enter("Loop Statement");

        let for_token = self.match_token(Type::For, "Expect 'FOR'.")?;
        let name = self.match_token(Type::Var, "Expect loop variable after 'FOR'.")?;
        let cell = self.intern(&name.lexeme);

        self.match_token(Type::From, "Expect 'FROM' after loop variable.")?;
        let start = self.bound()?;
        self.match_token(Type::To, "Expect 'TO' after loop start.")?;
        let end = self.bound()?;
        self.match_token(Type::Step, "Expect 'STEP' after loop end.")?;
        let step = self.bound()?;

        let body = match self.token.ty {
            Type::For => LoopBody::Nested(Box::new(self.for_loop()?)),
            Type::Draw => {
                self.match_token(Type::Draw, "Expect 'DRAW'.")?;
                self.match_token(Type::LeftParen, "Expect '(' after 'DRAW'.")?;
                let x = self.traced_expression()?;
                self.match_token(Type::Comma, "Expect ',' between draw coordinates.")?;
                let y = self.traced_expression()?;
                self.match_token(Type::RightParen, "Expect ')' after draw coordinates.")?;
                LoopBody::Draw { x, y }
            }
            _ => return Err(self.syntax_error("Expect 'FOR' or 'DRAW' after loop range.")),
        };

        self.trace.exit("Loop Statement");
        Ok(Loop {
            name: name.lexeme,
            cell,
            start,
            end,
            step,
            line: for_token.line,
            body,
        })
    }

    // Register and loop-bound expressions are evaluated as soon as they
    // parse; only draw coordinates survive as trees.
    fn bound(&mut self) -> Result<f64, Error> {
        let expr = self.traced_expression()?;
        Ok(evaluate(&expr))
    }

    fn traced_expression(&mut self) -> ExprResult {
        let expr = self.expression()?;
        self.trace.tree(&expr);
        Ok(expr)
    }

    fn expression(&mut self) -> ExprResult {
        self.trace.enter("Expression");

        let mut left = self.term()?;
        while matches!(self.token.ty, Type::Plus | Type::Minus) {
            let op = match self.token.ty {
                Type::Plus => BinOp::Plus,
                _ => BinOp::Minus,
            };
            self.advance_token()?;
            let right = self.term()?;
            left = Expr::binary(op, left, right);
        }

        self.trace.exit("Expression");
        Ok(left)
    }

    fn term(&mut self) -> ExprResult {
        self.trace.enter("Term");

        let mut left = self.factor()?;
        while matches!(self.token.ty, Type::Star | Type::Slash | Type::Percent) {
            let op = match self.token.ty {
                Type::Star => BinOp::Mul,
                Type::Slash => BinOp::Div,
                _ => BinOp::Mod,
            };
            self.advance_token()?;
            let right = self.factor()?;
            left = Expr::binary(op, left, right);
        }

        self.trace.exit("Term");
        Ok(left)
    }

    fn factor(&mut self) -> ExprResult {
        self.trace.enter("Factor");

        let expr = match self.token.ty {
            Type::Plus => {
                self.advance_token()?;
                self.factor()?
            }
            Type::Minus => {
                // Unary minus is the implicit subtraction `0 - x`
                self.advance_token()?;
                let right = self.factor()?;
                Expr::binary(BinOp::Minus, Expr::constant(0.0), right)
            }
            _ => self.component()?,
        };

        self.trace.exit("Factor");
        Ok(expr)
    }

    fn component(&mut self) -> ExprResult {
        self.trace.enter("Component");

        let expr = if let Some(op) = self.step_op() {
            self.advance_token()?;
            let operand = self.atom()?;
            let target = self.step_target(operand)?;
            Expr::step(op, Fixity::Prefix, target)
        } else {
            let mut left = self.atom()?;

            if let Some(op) = self.step_op() {
                self.advance_token()?;
                let target = self.step_target(left)?;
                left = Expr::step(op, Fixity::Postfix, target);
            }

            if self.token.ty == Type::Caret {
                self.advance_token()?;
                // Exponentiation is right-associative
                let right = self.component()?;
                left = Expr::binary(BinOp::Pow, left, right);
            }

            left
        };

        self.trace.exit("Component");
        Ok(expr)
    }

    fn atom(&mut self) -> ExprResult {
        self.trace.enter("Atom");

        let expr = match self.token.ty {
            Type::ConstId => {
                let token = self.advance_token()?;
                Expr::constant(token.value)
            }
            Type::Var => {
                let token = self.advance_token()?;
                let cell = self.intern(&token.lexeme);
                Expr::variable(token.lexeme, cell)
            }
            Type::Func => {
                let token = self.advance_token()?;
                self.match_token(Type::LeftParen, "Expect '(' after function name.")?;
                let arg = self.expression()?;
                self.match_token(Type::RightParen, "Expect ')' after function argument.")?;

                match token.func {
                    Some(func) => Expr::call(token.lexeme, func, arg),
                    None => return Err(self.syntax_error("Unknown function.")),
                }
            }
            Type::LeftParen => {
                self.advance_token()?;
                let expr = self.expression()?;
                self.match_token(Type::RightParen, "Expect ')' after expression.")?;
                expr
            }
            _ => return Err(self.syntax_error("Expect expression.")),
        };

        self.trace.exit("Atom");
        Ok(expr)
    }

    fn step_op(&self) -> Option<StepOp> {
        match self.token.ty {
            Type::Increment => Some(StepOp::Incr),
            Type::Decrement => Some(StepOp::Decr),
            _ => None,
        }
    }

    fn step_target(&mut self, operand: Expr) -> Result<StepTarget, Error> {
        match operand {
            Expr::Var { name, cell } => Ok(StepTarget::Cell { name, cell }),
            Expr::Const(value) => Ok(StepTarget::Literal(value)),
            _ => Err(self.syntax_error("invalid left-hand side in prefix/postfix operation")),
        }
    }

    // One shared cell per distinct variable name per session; every tree
    // node and loop binding for that name aliases the same cell, which is
    // how an induction variable's updates reach the draw expressions.
    fn intern(&mut self, name: &str) -> ValueCell {
        self.vars.entry(String::from(name)).or_default().clone()
    }

    fn match_token(&mut self, ty: Type, msg: &str) -> Result<Token, Error> {
        if self.token.ty == ty {
            self.advance_token()
        } else {
            Err(self.syntax_error(msg))
        }
    }

    // Consumes the current token unconditionally; the caller has already
    // inspected its type.
    fn advance_token(&mut self) -> Result<Token, Error> {
        let token = std::mem::replace(&mut self.token, Token::eof(self.stream.line()));
        self.trace.matched(&token);
        self.fetch_token()?;
        Ok(token)
    }

    fn fetch_token(&mut self) -> Result<(), Error> {
        self.token = self.stream.get_token();

        if self.token.ty == Type::Error {
            return Err(self.syntax_error("Unexpected character."));
        }

        Ok(())
    }

    // Raising a syntax error closes the scanner, so any in-flight descent
    // sees only `Eof` from here on and unwinds without scanning further.
    fn syntax_error(&mut self, msg: &str) -> Error {
        self.stream.close();
        Error::syntax(&self.token, msg)
    }
}
