use std::io::{BufRead, Write};

use tracing::{debug, trace};

use crate::{
    config::Config,
    environment::EnvironmentManager,
    error::{Error, Result, RuntimeError},
    expr::{self, Expr},
    input::WordReader,
    stmt::{self, Stmt},
    token::{Token, TokenKind},
    value::{Value, VarType},
};

/// How a statement finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Normal,
    Break,
    Continue,
}

pub struct Interpreter<R, W, E> {
    environment: EnvironmentManager,
    input: WordReader<R>,
    writer: W,
    err_out: E,
    config: Config,
    runtime_errors: usize,
    aborted: bool,
}

impl<R: BufRead, W: Write, E: Write> Interpreter<R, W, E> {
    pub fn new(input: R, writer: W, err_out: E) -> Self {
        Interpreter {
            environment: EnvironmentManager::new(),
            input: WordReader::new(input),
            writer,
            err_out,
            config: Config::default(),
            runtime_errors: 0,
            aborted: false,
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Runtime errors reported so far in this session.
    pub fn runtime_errors(&self) -> usize {
        self.runtime_errors
    }

    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        trace!(statements = statements.len(), "evaluating");
        self.aborted = false;
        self.execute_statements(statements)?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn report(&mut self, error: &Error) -> Result<()> {
        writeln!(self.err_out, "{}", error)?;
        Ok(())
    }

    pub(crate) fn writer(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Takes the next line from the same input `read` draws words from.
    pub(crate) fn next_line(&mut self) -> Result<Option<String>> {
        Ok(self.input.next_line()?)
    }

    fn execute(&mut self, s: &Stmt) -> Result<Flow> {
        s.accept(self)
    }

    /// Runs statements in order. A runtime error ends only the statement that
    /// raised it, until the session's error budget is used up.
    fn execute_statements(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for statement in statements {
            match self.execute(statement) {
                Ok(Flow::Normal) => {}
                Ok(flow) => return Ok(flow),
                Err(e) if e.is_runtime_error() => self.recover(e)?,
                Err(e) => return Err(e),
            }
        }
        Ok(Flow::Normal)
    }

    fn recover(&mut self, error: Error) -> Result<()> {
        if self.aborted {
            return Err(error);
        }
        self.runtime_errors += 1;
        if self.runtime_errors > self.config.max_runtime_errors {
            debug!(count = self.runtime_errors, "too many runtime errors, aborting");
            self.aborted = true;
            return Err(error);
        }
        debug!(error = %error, count = self.runtime_errors, "runtime error");
        self.report(&error)
    }

    fn execute_block(&mut self, statements: &[Stmt]) -> Result<Flow> {
        let marker = self.environment.create_child();
        let flow = self.execute_statements(statements);
        self.environment.discard_until(marker);
        flow
    }

    fn execute_for(&mut self, f: &stmt::For) -> Result<Flow> {
        if let Some(initializer) = &f.initializer {
            self.execute(initializer)?;
        }
        loop {
            if let Some(condition) = &f.condition {
                if !self.evaluate(condition)?.is_truthy() {
                    break;
                }
            }
            if self.execute(&f.body)? == Flow::Break {
                break;
            }
            if let Some(increment) = &f.increment {
                self.evaluate(increment)?;
            }
        }
        Ok(Flow::Normal)
    }

    fn evaluate(&mut self, e: &Expr) -> Result<Value> {
        e.accept(self)
    }
}

impl<R: BufRead, W: Write, E: Write> stmt::Visitor<Result<Flow>> for Interpreter<R, W, E> {
    fn visit_block_stmt(&mut self, b: &stmt::Block) -> Result<Flow> {
        self.execute_block(&b.statements)
    }

    fn visit_break_stmt(&mut self, _: &stmt::Break) -> Result<Flow> {
        Ok(Flow::Break)
    }

    fn visit_continue_stmt(&mut self, _: &stmt::Continue) -> Result<Flow> {
        Ok(Flow::Continue)
    }

    fn visit_declaration_stmt(&mut self, d: &stmt::Declaration) -> Result<Flow> {
        for declarator in &d.declarators {
            let value = if let Some(initializer) = &declarator.initializer {
                self.evaluate(initializer)?
            } else {
                Value::Nil
            };
            let var_name = declarator.name.lexeme.clone();
            self.environment.define(var_name, value, d.kind.var_type());
        }
        Ok(Flow::Normal)
    }

    fn visit_expression_stmt(&mut self, e: &stmt::Expression) -> Result<Flow> {
        self.evaluate(&e.expression)?;
        Ok(Flow::Normal)
    }

    fn visit_for_stmt(&mut self, f: &stmt::For) -> Result<Flow> {
        let marker = self.environment.create_child();
        let flow = self.execute_for(f);
        self.environment.discard_until(marker);
        flow
    }

    fn visit_if_stmt(&mut self, i: &stmt::If) -> Result<Flow> {
        if self.evaluate(&i.condition)?.is_truthy() {
            self.execute(&i.then_branch)
        } else if let Some(else_branch) = &i.else_branch {
            self.execute(else_branch)
        } else {
            Ok(Flow::Normal)
        }
    }

    fn visit_read_stmt(&mut self, r: &stmt::Read) -> Result<Flow> {
        let word = self.input.next_word()?.ok_or_else(|| Error::runtime(
            r.name.clone(),
            RuntimeError::EndOfInput(r.name.lexeme.clone()),
        ))?;
        let ty = self.environment.get_type(&r.name)?;

        let value = match coerce(&r.name, &word, ty) {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, "storing raw input instead");
                Value::Text(word)
            }
        };
        self.environment.assign(&r.name, value)?;
        Ok(Flow::Normal)
    }

    fn visit_while_stmt(&mut self, w: &stmt::While) -> Result<Flow> {
        while self.evaluate(&w.condition)?.is_truthy() {
            if self.execute(&w.body)? == Flow::Break {
                break;
            }
        }
        Ok(Flow::Normal)
    }

    fn visit_write_stmt(&mut self, w: &stmt::Write) -> Result<Flow> {
        let mut line = Vec::with_capacity(w.expressions.len());
        for expression in &w.expressions {
            line.push(self.evaluate(expression)?.to_string());
        }
        writeln!(self.writer, "{}", line.join(" "))?;
        Ok(Flow::Normal)
    }
}

impl<R: BufRead, W: Write, E: Write> expr::Visitor<Result<Value>> for Interpreter<R, W, E> {
    fn visit_assign_expr(&mut self, a: &expr::Assign) -> Result<Value> {
        let value = self.evaluate(&a.value)?;
        self.environment.assign(&a.name, value.clone())?;
        Ok(value)
    }

    fn visit_binary_expr(&mut self, e: &expr::Binary) -> Result<Value> {
        let left = self.evaluate(e.left.as_ref())?;
        let right = self.evaluate(e.right.as_ref())?;
        let kind = e.op.kind.clone();

        use Value::{Bool, Number, Text};
        match kind {
            TokenKind::Comma => Ok(right),
            TokenKind::Minus => compute_if_numbers(&e.op, left, right, |l, r| l - r),
            TokenKind::Plus => match (left, right) {
                (Number(l), Number(r)) => Ok(Number(l + r)),
                (l, r) if l.is_text() || r.is_text() => Ok(Text(format!("{}{}", l, r))),
                _ => Err(non_numeric(&e.op)),
            },
            TokenKind::Star => compute_if_numbers(&e.op, left, right, |l, r| l * r),
            TokenKind::Slash => {
                let (l, r) = numbers(&e.op, left, right)?;
                if r == 0.0 {
                    return Err(Error::runtime(e.op.clone(), RuntimeError::DivisionByZero));
                }
                Ok(Number(l / r))
            }
            TokenKind::Percent => {
                let (l, r) = numbers(&e.op, left, right)?;
                let (l, r) = (l.trunc(), r.trunc());
                if r == 0.0 {
                    return Err(Error::runtime(e.op.clone(), RuntimeError::DivisionByZero));
                }
                Ok(Number(l % r))
            }
            TokenKind::Greater => compute_if_numbers(&e.op, left, right, |l, r| l > r),
            TokenKind::GreaterEqual => compute_if_numbers(&e.op, left, right, |l, r| l >= r),
            TokenKind::Less => compute_if_numbers(&e.op, left, right, |l, r| l < r),
            TokenKind::LessEqual => compute_if_numbers(&e.op, left, right, |l, r| l <= r),
            TokenKind::EqualEqual => Ok(Bool(left.is_equal(&right))),
            TokenKind::BangEqual => Ok(Bool(!left.is_equal(&right))),
            _ => unreachable!("Binary expression built from a non-binary operator."),
        }
    }

    fn visit_conditional_expr(&mut self, e: &expr::Conditional) -> Result<Value> {
        if self.evaluate(&e.condition)?.is_truthy() {
            self.evaluate(&e.then_branch)
        } else {
            self.evaluate(&e.else_branch)
        }
    }

    fn visit_grouping_expr(&mut self, e: &expr::Grouping) -> Result<Value> {
        self.evaluate(&e.expression)
    }

    fn visit_literal_expr(&mut self, e: &expr::Literal) -> Result<Value> {
        Ok(e.value.clone())
    }

    fn visit_logical_expr(&mut self, e: &expr::Logical) -> Result<Value> {
        let left = self.evaluate(&e.left)?;

        use TokenKind::*;
        Ok(match (&e.op.kind, left.is_truthy()) {
            (Or, true) | (And, false) => left,
            (Or, false) | (And, true) => self.evaluate(&e.right)?,
            _ => unreachable!("Logical expression must be either And or Or."),
        })
    }

    fn visit_unary_expr(&mut self, e: &expr::Unary) -> Result<Value> {
        let right = self.evaluate(e.right.as_ref())?;
        let kind = e.op.kind.clone();

        use Value::*;
        match (kind, right) {
            (TokenKind::Bang, right) => Ok(Bool(!right.is_truthy())),
            (TokenKind::Minus, Number(n)) => Ok(Number(-n)),
            (TokenKind::PlusPlus, Number(n)) => Ok(Number(n + 1.0)),
            (TokenKind::MinusMinus, Number(n)) => Ok(Number(n - 1.0)),
            (TokenKind::Minus, _) | (TokenKind::PlusPlus, _) | (TokenKind::MinusMinus, _) => {
                Err(non_numeric(&e.op))
            }
            _ => unreachable!("Unary expression built from a non-unary operator."),
        }
    }

    fn visit_variable_expr(&mut self, e: &expr::Variable) -> Result<Value> {
        self.environment.get(&e.name)
    }
}

fn coerce(name: &Token, word: &str, ty: VarType) -> Result<Value> {
    let invalid = |expected: &'static str| Error::runtime(
        name.clone(),
        RuntimeError::InvalidRead(word.to_string(), expected),
    );
    match ty {
        VarType::Text | VarType::Untyped => Ok(Value::from(word)),
        VarType::Number => word.parse::<f64>()
            .map(Value::Number)
            .map_err(|_| invalid("a number")),
        VarType::Bool => match word {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(invalid("a boolean")),
        },
    }
}

fn numbers(op: &Token, left: Value, right: Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => Ok((l, r)),
        _ => Err(non_numeric(op)),
    }
}

fn compute_if_numbers<T: Into<Value>>(
    op: &Token,
    left: Value,
    right: Value,
    f: impl Fn(f64, f64) -> T
) -> Result<Value> {
    let (l, r) = numbers(op, left, right)?;
    Ok(f(l, r).into())
}

fn non_numeric(op: &Token) -> Error {
    Error::runtime(op.clone(), RuntimeError::NonNumericOperand)
}
