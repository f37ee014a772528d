use crate::{
    error::{Error, LexicalError, Result},
    token::{Token, TokenKind},
};
use peekmore::{PeekMore, PeekMoreIterator};
use phf::phf_map;
use std::str::Chars;

static KEYWORDS: phf::Map<&'static str, TokenKind> = phf_map! {
    "and" => TokenKind::And,
    "break" => TokenKind::Break,
    "continue" => TokenKind::Continue,
    "else" => TokenKind::Else,
    "false" => TokenKind::False,
    "for" => TokenKind::For,
    "if" => TokenKind::If,
    "int" => TokenKind::Int,
    "nil" => TokenKind::Nil,
    "or" => TokenKind::Or,
    "program" => TokenKind::Program,
    "read" => TokenKind::Read,
    "real" => TokenKind::Real,
    "string" => TokenKind::Str,
    "true" => TokenKind::True,
    "while" => TokenKind::While,
    "write" => TokenKind::Write,
};

/// Lazily yields the tokens of `src`, ending with a single `EndOfFile`.
pub fn tokenize(src: &str) -> Scanner<'_> {
    Scanner::new(src)
}

pub struct Scanner<'a> {
    src: PeekMoreIterator<Chars<'a>>,
    lexeme_buffer: String,
    line: usize,
    finished: bool,
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Result<Token>> {
        loop {
            if self.src.peek().is_none() {
                if self.finished {
                    return None;
                }
                self.finished = true;
                return Some(Ok(Token::new(TokenKind::EndOfFile, "", self.line)));
            }

            let kind = self.next_token_kind();
            let lexeme = std::mem::take(&mut self.lexeme_buffer);

            if let Some(kind) = kind {
                return Some(kind.map(|kind| Token { kind, lexeme, line: self.line }));
            }
        }
    }
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src: src.chars().peekmore(),
            lexeme_buffer: String::new(),
            line: 1,
            finished: false,
        }
    }

    fn next_token_kind(&mut self) -> Option<Result<TokenKind>> {
        let next_char = self.src.next()?;
        self.lexeme_buffer.push(next_char);

        use TokenKind::*;
        match next_char {
            '(' => Some(Ok(LeftParen)),
            ')' => Some(Ok(RightParen)),
            '{' => Some(Ok(LeftBrace)),
            '}' => Some(Ok(RightBrace)),
            ':' => Some(Ok(Colon)),
            ',' => Some(Ok(Comma)),
            '.' => Some(Ok(Dot)),
            '?' => Some(Ok(Question)),
            ';' => Some(Ok(Semicolon)),
            '*' => Some(Ok(Star)),
            '%' => Some(Ok(Percent)),
            '-' => Some(Ok(if self.does_next_match('-') { MinusMinus } else { Minus })),
            '+' => Some(Ok(if self.does_next_match('+') { PlusPlus } else { Plus })),
            '!' => Some(Ok(if self.does_next_match('=') { BangEqual } else { Bang })),
            '=' => Some(Ok(if self.does_next_match('=') { EqualEqual } else { Equal })),
            '<' => Some(Ok(if self.does_next_match('=') { LessEqual } else { Less })),
            '>' => Some(Ok(if self.does_next_match('=') { GreaterEqual } else { Greater })),
            '/' => {
                if self.does_next_match('/') {
                    self.advance_until_match('\n');
                    None
                } else if self.does_next_match('*') {
                    self.skip_block_comment().err().map(Err)
                } else {
                    Some(Ok(Slash))
                }
            }
            ' ' | '\r' | '\t' => None,
            '\n' => {
                self.line += 1;
                None
            }
            '"' => Some(self.extract_string()),
            c if c.is_ascii_digit() => Some(self.extract_number()),
            c if can_start_identifier(&c) => Some(self.extract_identifier()),
            c => Some(Err(Error::lexical(self.line, LexicalError::UnexpectedCharacter(c)))),
        }
    }

    fn does_next_match(&mut self, c: char) -> bool {
        match self.src.peek() {
            Some(next) if c == *next => {
                self.lexeme_buffer.push(c);
                self.src.next();
                true
            }
            _ => false,
        }
    }

    fn skip_block_comment(&mut self) -> Result<()> {
        let start_line = self.line;
        let mut depth = 1usize;
        while depth > 0 {
            match self.src.next() {
                None => {
                    return Err(Error::lexical(start_line, LexicalError::UnterminatedComment))
                }
                Some('/') if self.src.peek() == Some(&'*') => {
                    self.src.next();
                    depth += 1;
                }
                Some('*') if self.src.peek() == Some(&'/') => {
                    self.src.next();
                    depth -= 1;
                }
                Some('\n') => self.line += 1,
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn extract_string(&mut self) -> Result<TokenKind> {
        let start_line = self.line;
        let mut newline_count = 0;
        self.advance_until_match_for_each('"', |c| if c == '\n' { newline_count += 1 });
        self.line += newline_count;
        match self.src.next() {
            None => Err(Error::lexical(start_line, LexicalError::UnterminatedString)),
            Some(q) => {
                self.lexeme_buffer.push(q);
                let contents = &self.lexeme_buffer[1..self.lexeme_buffer.len() - 1];
                Ok(TokenKind::String(contents.to_string()))
            }
        }
    }

    fn extract_number(&mut self) -> Result<TokenKind> {
        self.advance_until(|n| !n.is_ascii_digit());

        if let Some(&'.') = self.src.peek() {
            if let Some(maybe_digit) = self.src.peek_nth(1) {
                if maybe_digit.is_ascii_digit() {
                    self.lexeme_buffer.push('.');
                    self.src.next();
                    self.advance_until(|n| !n.is_ascii_digit());
                }
            }
        }

        match self.lexeme_buffer.parse() {
            Err(_) => Err(Error::lexical(
                self.line,
                LexicalError::InvalidNumber(self.lexeme_buffer.clone()),
            )),
            Ok(number) => Ok(TokenKind::Number(number)),
        }
    }

    fn extract_identifier(&mut self) -> Result<TokenKind> {
        self.advance_until(|n| !is_part_of_valid_identifier(n));

        match KEYWORDS.get(self.lexeme_buffer.as_str()) {
            Some(token) => Ok(token.clone()),
            None => Ok(TokenKind::Identifier),
        }
    }

    fn advance_until_match(&mut self, c: char) {
        self.advance_until(|n| n == &c)
    }

    fn advance_until(&mut self, should_stop: impl Fn(&char) -> bool) {
        self.advance_until_for_each(should_stop, |_| {})
    }

    fn advance_until_match_for_each(&mut self, c: char, f: impl FnMut(char)) {
        self.advance_until_for_each(|n| n == &c, f);
    }

    fn advance_until_for_each(
        &mut self,
        should_stop: impl Fn(&char) -> bool,
        mut f: impl FnMut(char),
    ) {
        while let Some(next) = self.src.peek().copied() {
            if should_stop(&next) {
                break;
            }
            self.src.next();
            self.lexeme_buffer.push(next);
            f(next);
        }
    }
}

fn can_start_identifier(c: &char) -> bool {
    c.is_ascii_alphabetic() || c == &'_'
}

fn is_part_of_valid_identifier(c: &char) -> bool {
    can_start_identifier(c) || c.is_ascii_digit()
}
