use std::io::{BufRead, Write};

use tracing::trace;

use crate::{
    config::Config,
    error::{Error, Result},
    interpreter::Interpreter,
    parser::Parser,
    printer,
    scanner,
    stmt::Stmt,
};

/// How a run ended, from the caller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Lexical or syntax errors; nothing was evaluated.
    StaticErrors,
    /// Evaluation finished but some statements raised runtime errors.
    RuntimeErrors,
    /// Too many runtime errors; evaluation was abandoned.
    Aborted,
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::StaticErrors => 65,
            Outcome::RuntimeErrors | Outcome::Aborted => 70,
        }
    }
}

/// One interpreter session. Variables defined by one `run_fragment` call are
/// visible to the next.
pub struct Lox<R, W, E> {
    interpreter: Interpreter<R, W, E>,
}

impl<R: BufRead, W: Write, E: Write> Lox<R, W, E> {
    pub fn new(input: R, out: W, err_out: E) -> Self {
        Self { interpreter: Interpreter::new(input, out, err_out) }
    }

    pub fn with_config(self, config: Config) -> Self {
        Self { interpreter: self.interpreter.with_config(config) }
    }

    /// Runs a complete `program { ... }` source.
    pub fn run(&mut self, source: &str) -> Result<Outcome> {
        match self.parse(source, true)? {
            Some(statements) => self.evaluate(&statements),
            None => Ok(Outcome::StaticErrors),
        }
    }

    /// Runs a bare list of statements, as typed at the prompt.
    pub fn run_fragment(&mut self, source: &str) -> Result<Outcome> {
        match self.parse(source, false)? {
            Some(statements) => self.evaluate(&statements),
            None => Ok(Outcome::StaticErrors),
        }
    }

    /// Runs fragments line by line from the session's own input, writing a
    /// `> ` marker to `prompt` before each one. `read` draws from the same
    /// input, so words it leaves on a line are not run as code.
    pub fn run_prompt<P: Write>(&mut self, mut prompt: P) -> Result<Outcome> {
        loop {
            write!(prompt, "> ")?;
            prompt.flush()?;

            let line = match self.interpreter.next_line()? {
                Some(line) => line,
                None => break,
            };
            if self.run_fragment(line.as_str())? == Outcome::Aborted {
                return Ok(Outcome::Aborted);
            }
        }
        Ok(Outcome::Success)
    }

    /// Writes the parsed program to the output instead of running it.
    pub fn print_ast(&mut self, source: &str) -> Result<Outcome> {
        match self.parse(source, true)? {
            Some(statements) => {
                writeln!(self.interpreter.writer(), "{}", printer::print_program(&statements))?;
                Ok(Outcome::Success)
            }
            None => Ok(Outcome::StaticErrors),
        }
    }

    fn parse(&mut self, source: &str, whole_program: bool) -> Result<Option<Vec<Stmt>>> {
        let mut errors: Vec<Error> = Vec::new();
        let mut tokens = Vec::new();
        for item in scanner::tokenize(source) {
            match item {
                Ok(token) => tokens.push(token),
                Err(e) => errors.push(e),
            }
        }
        trace!(tokens = tokens.len(), errors = errors.len(), "scanned");

        let mut parser = Parser::new(tokens.into_iter());
        let parsed = if whole_program { parser.parse() } else { parser.parse_statements() };
        let statements = match parsed {
            Ok(statements) => statements,
            Err(mut syntax_errors) => {
                errors.append(&mut syntax_errors);
                Vec::new()
            }
        };
        trace!(statements = statements.len(), errors = errors.len(), "parsed");

        if errors.is_empty() {
            return Ok(Some(statements));
        }
        for e in errors.iter() {
            self.interpreter.report(e)?;
        }
        Ok(None)
    }

    fn evaluate(&mut self, statements: &[Stmt]) -> Result<Outcome> {
        let before = self.interpreter.runtime_errors();
        match self.interpreter.interpret(statements) {
            Ok(()) if self.interpreter.runtime_errors() > before => Ok(Outcome::RuntimeErrors),
            Ok(()) => Ok(Outcome::Success),
            Err(e) if e.is_runtime_error() => {
                self.interpreter.report(&e)?;
                Ok(Outcome::Aborted)
            }
            Err(e) => Err(e),
        }
    }
}
