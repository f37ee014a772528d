#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) lexeme: String,
    pub(crate) line: usize,
}

impl Token {
    pub fn new<S: Into<String>>(kind: TokenKind, lexeme: S, line: usize) -> Self {
        Token { kind, lexeme: lexeme.into(), line }
    }

    pub fn kind(&self) -> &TokenKind {
        &self.kind
    }

    pub fn lexeme(&self) -> &str {
        &self.lexeme
    }

    pub fn line(&self) -> usize {
        self.line
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum TokenKind {
    LeftParen, RightParen, LeftBrace, RightBrace,
    Colon, Comma, Dot, Question, Semicolon, Slash, Star, Percent,

    Bang, BangEqual,
    Equal, EqualEqual,
    Greater, GreaterEqual,
    Less, LessEqual,
    Minus, MinusMinus,
    Plus, PlusPlus,

    Identifier, String(String), Number(f64),

    And, Break, Continue, Else, False, For, If, Int, Nil, Or,
    Program, Read, Real, Str, True, While, Write,

    EndOfFile,
}

impl TokenKind {
    /// Keywords that open a statement; used as resynchronisation points.
    pub(crate) fn starts_statement(&self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Int | Real | Str | For | If | While | Write | Read | Break | Continue | LeftBrace
        )
    }
}
