use std::fmt::{self, Display};
use std::result;

use crate::token::{Token, TokenKind};

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexicalError {
    #[error("Unexpected character '{0}'.")]
    UnexpectedCharacter(char),
    #[error("Unterminated string literal.")]
    UnterminatedString,
    #[error("Unterminated block comment.")]
    UnterminatedComment,
    #[error("Could not convert {0} into a number.")]
    InvalidNumber(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyntaxError {
    #[error("{0}")]
    Expected(String),
    #[error("Expected an expression.")]
    ExpectedExpression,
    #[error("Missing left-hand operand.")]
    MissingLeftOperand,
    #[error("Invalid assignment target.")]
    InvalidAssignmentTarget,
    #[error("'{0}' used outside of a loop.")]
    OutsideLoop(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    #[error("Operands must be numbers.")]
    NonNumericOperand,
    #[error("Division by zero.")]
    DivisionByZero,
    #[error("Undefined variable '{0}'.")]
    UndefinedVariable(String),
    #[error("Uninitialized variable '{0}'.")]
    UninitializedVariable(String),
    #[error("Cannot read '{0}' as {1}.")]
    InvalidRead(String, &'static str),
    #[error("No input left to read into '{0}'.")]
    EndOfInput(String),
}

#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    Lexical { line: usize, cause: LexicalError },
    Syntactic { token: Token, cause: SyntaxError },
    Runtime { token: Token, cause: RuntimeError },
    Unexpected,
    Io(std::io::Error),
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    pub fn lexical(line: usize, cause: LexicalError) -> Error {
        Error { kind: ErrorKind::Lexical { line, cause } }
    }

    pub fn syntactic(token: Token, cause: SyntaxError) -> Error {
        Error { kind: ErrorKind::Syntactic { token, cause } }
    }

    pub fn expected<S: Into<String>>(token: Token, message: S) -> Error {
        Error::syntactic(token, SyntaxError::Expected(message.into()))
    }

    pub fn runtime(token: Token, cause: RuntimeError) -> Error {
        Error { kind: ErrorKind::Runtime { token, cause } }
    }

    pub fn unexpected() -> Error {
        Error { kind: ErrorKind::Unexpected }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn line(&self) -> usize {
        use ErrorKind::*;
        match self.kind() {
            Unexpected | Io(_) => 0,
            Lexical { line, .. } => *line,
            Syntactic { token, .. } | Runtime { token, .. } => token.line,
        }
    }

    pub fn is_runtime_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Runtime { .. })
    }

    pub fn runtime_cause(&self) -> Option<&RuntimeError> {
        match self.kind() {
            ErrorKind::Runtime { cause, .. } => Some(cause),
            _ => None,
        }
    }

    pub fn syntax_cause(&self) -> Option<&SyntaxError> {
        match self.kind() {
            ErrorKind::Syntactic { cause, .. } => Some(cause),
            _ => None,
        }
    }

    pub fn lexical_cause(&self) -> Option<&LexicalError> {
        match self.kind() {
            ErrorKind::Lexical { cause, .. } => Some(cause),
            _ => None,
        }
    }

    fn loc(&self) -> String {
        use ErrorKind::*;
        match self.kind() {
            Syntactic { token, .. } | Runtime { token, .. } => {
                if token.kind == TokenKind::EndOfFile {
                    " at end".to_string()
                } else {
                    format!(" at '{}'", token.lexeme)
                }
            }
            _ => "".to_string(),
        }
    }

    fn message(&self) -> String {
        use ErrorKind::*;
        match self.kind() {
            Lexical { cause, .. } => cause.to_string(),
            Syntactic { cause, .. } => cause.to_string(),
            Runtime { cause, .. } => cause.to_string(),
            Unexpected => "Unexpected end of input.".to_string(),
            Io(e) => format!("IO error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind() {
            ErrorKind::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] Error{}: {}", self.line(), self.loc(), self.message())
    }
}

impl From<Error> for std::io::Error {
    fn from(e: Error) -> std::io::Error {
        match e.kind {
            ErrorKind::Io(inner) => inner,
            _ => std::io::Error::new(std::io::ErrorKind::Other, e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error { kind: ErrorKind::Io(e) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexical_errors_show_line_only() {
        let e = Error::lexical(3, LexicalError::UnexpectedCharacter('#'));
        assert_eq!("[line 3] Error: Unexpected character '#'.", e.to_string());
    }

    #[test]
    fn syntactic_errors_point_at_lexeme() {
        let token = Token::new(TokenKind::Equal, "=", 7);
        let e = Error::syntactic(token, SyntaxError::InvalidAssignmentTarget);
        assert_eq!("[line 7] Error at '=': Invalid assignment target.", e.to_string());
    }

    #[test]
    fn errors_at_end_of_file_say_so() {
        let token = Token::new(TokenKind::EndOfFile, "", 2);
        let e = Error::expected(token, "Expected ';'.");
        assert_eq!("[line 2] Error at end: Expected ';'.", e.to_string());
    }

    #[test]
    fn runtime_cause_is_exposed() {
        let token = Token::new(TokenKind::Identifier, "x", 1);
        let e = Error::runtime(token, RuntimeError::UndefinedVariable("x".into()));
        assert!(e.is_runtime_error());
        assert_eq!(Some(&RuntimeError::UndefinedVariable("x".into())), e.runtime_cause());
        assert_eq!(None, e.syntax_cause());
    }
}
