use std::iter::Peekable;
use std::result;

use tracing::debug;

use crate::{
    error::{Error, Result, SyntaxError},
    expr::Expr,
    stmt::{Declarator, Stmt},
    token::*,
    value::{DeclKind, Value},
};

const COMMA_TOKENS: &[&TokenKind] = &[&TokenKind::Comma];

const EQUALITY_TOKENS: &[&TokenKind] = &[
    &TokenKind::BangEqual,
    &TokenKind::EqualEqual,
];

const COMPARISON_TOKENS: &[&TokenKind] = &[
    &TokenKind::Greater,
    &TokenKind::GreaterEqual,
    &TokenKind::Less,
    &TokenKind::LessEqual,
];

const TERM_TOKENS: &[&TokenKind] = &[
    &TokenKind::Minus,
    &TokenKind::Plus,
];

const FACTOR_TOKENS: &[&TokenKind] = &[
    &TokenKind::Star,
    &TokenKind::Slash,
    &TokenKind::Percent,
];

const UNARY_TOKENS: &[&TokenKind] = &[
    &TokenKind::Bang,
    &TokenKind::Minus,
    &TokenKind::PlusPlus,
    &TokenKind::MinusMinus,
];

// `-` is absent because it is also a prefix operator.
const DANGLING_TERM_TOKENS: &[&TokenKind] = &[&TokenKind::Plus];

pub struct Parser<T> {
    tokens: T,
    errors: Vec<Error>,
    consumed: usize,
    loop_depth: usize,
}

impl<T: Iterator<Item = Token>> Parser<Peekable<T>> {
    pub fn new(tokens: T) -> Self {
        let tokens = tokens.peekable();
        Parser { tokens, errors: Vec::new(), consumed: 0, loop_depth: 0 }
    }

    /// Parses a whole `program { ... }` unit.
    pub fn parse(&mut self) -> result::Result<Vec<Stmt>, Vec<Error>> {
        let header = self
            .consume(&TokenKind::Program, "Expected 'program' at start of source.")
            .and_then(|_| self.consume(&TokenKind::LeftBrace, "Expected '{' after 'program'."));
        let braced = match header {
            Ok(_) => true,
            Err(e) => {
                self.errors.push(e);
                self.match_single(&TokenKind::LeftBrace).is_some()
            }
        };

        let statements = self.statement_list();

        let closed = if braced {
            self.consume(&TokenKind::RightBrace, "Expected '}' at end of program.").map(|_| ())
        } else {
            self.match_single(&TokenKind::RightBrace);
            Ok(())
        };
        match closed {
            Err(e) => self.errors.push(e),
            Ok(()) if !self.is_at_end() => {
                let e = self.error_at_next("Expected end of input after program.");
                self.errors.push(e);
            }
            Ok(()) => {}
        }

        self.finish(statements)
    }

    /// Parses a bare sequence of statements, as typed at the prompt.
    pub fn parse_statements(&mut self) -> result::Result<Vec<Stmt>, Vec<Error>> {
        let mut statements = Vec::new();
        loop {
            statements.append(&mut self.statement_list());
            if self.is_at_end() {
                break;
            }
            let e = self.error_at_next("Unmatched '}'.");
            self.errors.push(e);
            self.advance();
        }
        self.finish(statements)
    }

    fn finish(&mut self, statements: Vec<Stmt>) -> result::Result<Vec<Stmt>, Vec<Error>> {
        if self.errors.is_empty() {
            Ok(statements)
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }

    fn statement_list(&mut self) -> Vec<Stmt> {
        let mut statements = Vec::new();
        while !self.check_next(&TokenKind::RightBrace) && !self.is_at_end() {
            if let Some(statement) = self.declaration() {
                statements.push(statement);
            }
        }
        statements
    }

    fn declaration(&mut self) -> Option<Stmt> {
        let start = self.consumed;
        match self.statement() {
            Ok(statement) => Some(statement),
            Err(e) => {
                debug!(error = %e, "recovering from parse error");
                self.errors.push(e);
                if self.consumed == start {
                    self.advance();
                }
                self.synchronise();
                None
            }
        }
    }

    fn statement(&mut self) -> Result<Stmt> {
        if self.match_single(&TokenKind::Int).is_some() {
            self.typed_declaration(DeclKind::Int)
        } else if self.match_single(&TokenKind::Real).is_some() {
            self.typed_declaration(DeclKind::Real)
        } else if self.match_single(&TokenKind::Str).is_some() {
            self.typed_declaration(DeclKind::Str)
        } else if self.match_single(&TokenKind::For).is_some() {
            self.for_statement()
        } else if self.match_single(&TokenKind::If).is_some() {
            self.if_statement()
        } else if self.match_single(&TokenKind::While).is_some() {
            self.while_statement()
        } else if let Some(keyword) = self.match_single(&TokenKind::Write) {
            self.write_statement(keyword)
        } else if self.match_single(&TokenKind::Read).is_some() {
            self.read_statement()
        } else if let Some(keyword) = self.match_single(&TokenKind::Break) {
            self.loop_control(keyword, Stmt::new_break)
        } else if let Some(keyword) = self.match_single(&TokenKind::Continue) {
            self.loop_control(keyword, Stmt::new_continue)
        } else if self.match_single(&TokenKind::LeftBrace).is_some() {
            Ok(Stmt::new_block(self.block()?))
        } else {
            self.expression_statement()
        }
    }

    fn typed_declaration(&mut self, kind: DeclKind) -> Result<Stmt> {
        let mut declarators = Vec::new();
        loop {
            let name = self.consume(
                &TokenKind::Identifier,
                format!("Expected a variable name after '{}'.", kind).as_str(),
            )?;
            let initializer = if self.match_single(&TokenKind::Equal).is_some() {
                Some(self.assignment()?)
            } else {
                None
            };
            declarators.push(Declarator { name, initializer });
            if self.match_single(&TokenKind::Comma).is_none() {
                break;
            }
        }

        self.consume(&TokenKind::Semicolon, "Expected ';' after variable declaration.")?;
        Ok(Stmt::new_declaration(kind, declarators))
    }

    fn for_statement(&mut self) -> Result<Stmt> {
        self.consume(&TokenKind::LeftParen, "Expected '(' after 'for'.")?;

        let initializer = if self.match_single(&TokenKind::Semicolon).is_some() {
            None
        } else if self.match_single(&TokenKind::Int).is_some() {
            Some(self.typed_declaration(DeclKind::Int)?)
        } else if self.match_single(&TokenKind::Real).is_some() {
            Some(self.typed_declaration(DeclKind::Real)?)
        } else if self.match_single(&TokenKind::Str).is_some() {
            Some(self.typed_declaration(DeclKind::Str)?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check_next(&TokenKind::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(&TokenKind::Semicolon, "Expected ';' after loop condition.")?;

        let increment = if !self.check_next(&TokenKind::RightParen) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(&TokenKind::RightParen, "Expected ')' after for clauses.")?;

        let body = Box::new(self.loop_body()?);
        Ok(Stmt::new_for(initializer.map(Box::new), condition, increment, body))
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.consume(&TokenKind::LeftParen, "Expected '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(&TokenKind::RightParen, "Expected ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_single(&TokenKind::Else).is_some() {
            Some(Box::new(self.statement()?))
        } else { None };

        Ok(Stmt::new_if(condition, then_branch, else_branch))
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        self.consume(&TokenKind::LeftParen, "Expected '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(&TokenKind::RightParen, "Expected ')' after condition.")?;
        let body = Box::new(self.loop_body()?);

        Ok(Stmt::new_while(condition, body))
    }

    fn loop_body(&mut self) -> Result<Stmt> {
        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;
        body
    }

    fn write_statement(&mut self, keyword: Token) -> Result<Stmt> {
        self.consume(&TokenKind::LeftParen, "Expected '(' after 'write'.")?;
        let mut expressions = vec![self.assignment()?];
        while self.match_single(&TokenKind::Comma).is_some() {
            expressions.push(self.assignment()?);
        }
        self.consume(&TokenKind::RightParen, "Expected ')' after write arguments.")?;
        self.consume(&TokenKind::Semicolon, "Expected ';' after write statement.")?;
        Ok(Stmt::new_write(keyword, expressions))
    }

    fn read_statement(&mut self) -> Result<Stmt> {
        self.consume(&TokenKind::LeftParen, "Expected '(' after 'read'.")?;
        let name = self.consume(&TokenKind::Identifier, "Expected a variable name to read into.")?;
        self.consume(&TokenKind::RightParen, "Expected ')' after variable name.")?;
        self.consume(&TokenKind::Semicolon, "Expected ';' after read statement.")?;
        Ok(Stmt::new_read(name))
    }

    fn loop_control(&mut self, keyword: Token, make: fn(Token) -> Stmt) -> Result<Stmt> {
        if self.loop_depth == 0 {
            let lexeme = keyword.lexeme.clone();
            return Err(Error::syntactic(keyword, SyntaxError::OutsideLoop(lexeme)));
        }
        self.consume(
            &TokenKind::Semicolon,
            format!("Expected ';' after '{}'.", keyword.lexeme).as_str(),
        )?;
        Ok(make(keyword))
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expression = self.expression()?;
        self.consume(&TokenKind::Semicolon, "Expected ';' after expression.")?;
        Ok(Stmt::new_expression(expression))
    }

    fn block(&mut self) -> Result<Vec<Stmt>> {
        let statements = self.statement_list();
        self.consume(&TokenKind::RightBrace, "Expected '}' after block.")?;
        Ok(statements)
    }

    pub(crate) fn expression(&mut self) -> Result<Expr> {
        self.match_binary_precedence_with_tokens(
            Self::assignment,
            COMMA_TOKENS
        )
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr = self.conditional()?;
        if let Some(equals) = self.match_single(&TokenKind::Equal) {
            if let Expr::Variable(lhs) = expr {
                let value = self.assignment()?;
                Ok(Expr::new_assign(lhs.name, Box::new(value)))
            } else {
                Err(Error::syntactic(equals, SyntaxError::InvalidAssignmentTarget))
            }
        } else {
            Ok(expr)
        }
    }

    fn conditional(&mut self) -> Result<Expr> {
        let condition = self.or()?;
        if self.match_single(&TokenKind::Question).is_some() {
            let then_branch = self.expression()?;
            self.consume(&TokenKind::Colon, "Expected ':' in conditional expression.")?;
            let else_branch = self.conditional()?;
            Ok(Expr::new_conditional(
                Box::new(condition),
                Box::new(then_branch),
                Box::new(else_branch),
            ))
        } else {
            Ok(condition)
        }
    }

    fn or(&mut self) -> Result<Expr> {
        let mut e = self.and()?;

        while let Some(op) = self.match_single(&TokenKind::Or) {
            let right = Box::new(self.and()?);
            e = Expr::new_logical(Box::new(e), op, right);
        }

        Ok(e)
    }

    fn and(&mut self) -> Result<Expr> {
        let mut e = self.equality()?;

        while let Some(op) = self.match_single(&TokenKind::And) {
            let right = Box::new(self.equality()?);
            e = Expr::new_logical(Box::new(e), op, right);
        }

        Ok(e)
    }

    fn equality(&mut self) -> Result<Expr> {
        self.match_binary_precedence_with_tokens(
            Self::comparison,
            EQUALITY_TOKENS
        )
    }

    fn comparison(&mut self) -> Result<Expr> {
        self.match_binary_precedence_with_tokens(
            Self::term,
            COMPARISON_TOKENS
        )
    }

    fn term(&mut self) -> Result<Expr> {
        self.match_binary_precedence_with_tokens(
            Self::factor,
            TERM_TOKENS
        )
    }

    fn factor(&mut self) -> Result<Expr> {
        self.match_binary_precedence_with_tokens(
            Self::unary,
            FACTOR_TOKENS
        )
    }

    fn unary(&mut self) -> Result<Expr> {
        if let Some(token) = self.match_any(UNARY_TOKENS) {
            let right = Box::new(self.unary()?);
            Ok(Expr::new_unary(token, right))
        } else {
            self.primary()
        }
    }

    fn primary(&mut self) -> Result<Expr> {
        let kind = match self.tokens.peek() {
            Some(next) => next.kind.clone(),
            None => return Err(Error::unexpected()),
        };

        let literal = match kind {
            TokenKind::True => Some(Value::Bool(true)),
            TokenKind::False => Some(Value::Bool(false)),
            TokenKind::Nil => Some(Value::Nil),
            TokenKind::Number(n) => Some(Value::Number(n)),
            TokenKind::String(s) => Some(Value::Text(s)),
            _ => None,
        };
        if let Some(value) = literal {
            self.advance();
            return Ok(Expr::new_literal(value));
        }

        if let Some(name) = self.match_single(&TokenKind::Identifier) {
            return Ok(Expr::new_variable(name));
        }

        if self.match_single(&TokenKind::LeftParen).is_some() {
            let expression = Box::new(self.expression()?);
            self.consume(&TokenKind::RightParen, "Expected ')' after expression.")?;
            return Ok(Expr::new_grouping(expression));
        }

        if let Some(e) = self.dangling_binary_operator() {
            return Err(e);
        }

        match self.tokens.peek() {
            Some(next) => Err(Error::syntactic(next.clone(), SyntaxError::ExpectedExpression)),
            None => Err(Error::unexpected()),
        }
    }

    /// A binary operator with nothing on its left. The right operand is still
    /// parsed so that the rest of the expression is skipped as a unit; an
    /// error inside it is dropped in favour of the missing-operand one.
    fn dangling_binary_operator(&mut self) -> Option<Error> {
        let productions: [(&[&TokenKind], fn(&mut Self) -> Result<Expr>); 4] = [
            (EQUALITY_TOKENS, Self::comparison),
            (COMPARISON_TOKENS, Self::term),
            (DANGLING_TERM_TOKENS, Self::factor),
            (FACTOR_TOKENS, Self::unary),
        ];

        for (kinds, operand) in productions.iter() {
            if let Some(op) = self.match_any(kinds) {
                if let Err(skipped) = operand(self) {
                    debug!(error = %skipped, "dropped error in operand of dangling operator");
                }
                return Some(Error::syntactic(op, SyntaxError::MissingLeftOperand));
            }
        }
        None
    }

    fn advance(&mut self) -> Option<Token> {
        let next = self.tokens.next();
        if next.is_some() {
            self.consumed += 1;
        }
        next
    }

    fn is_at_end(&mut self) -> bool {
        self.tokens.peek()
            .map(|t| t.kind == TokenKind::EndOfFile)
            .unwrap_or(true)
    }

    fn check_next(&mut self, kind: &TokenKind) -> bool {
        self.tokens.peek()
            .map(|t| &t.kind == kind)
            .unwrap_or(false)
    }

    fn error_at_next(&mut self, message: &str) -> Error {
        match self.tokens.peek() {
            Some(t) => Error::expected(t.clone(), message),
            None => Error::unexpected(),
        }
    }

    fn consume(&mut self, kind: &TokenKind, error_msg: &str) -> Result<Token> {
        if let Some(token) = self.match_single(kind) {
            Ok(token)
        } else {
            Err(self.error_at_next(error_msg))
        }
    }

    fn match_binary_precedence_with_tokens(
        &mut self,
        parse: impl Fn(&mut Self) -> Result<Expr>,
        kinds: &[&TokenKind]
    ) -> Result<Expr> {
        let mut e = parse(self)?;

        while let Some(token) = self.match_any(kinds) {
            let right = Box::new(parse(self)?);
            e = Expr::new_binary(Box::new(e), token, right)
        }

        Ok(e)
    }

    fn match_single(&mut self, kind: &TokenKind) -> Option<Token> {
        if self.check_next(kind) {
            self.advance()
        } else {
            None
        }
    }

    fn match_any(&mut self, kinds: &[&TokenKind]) -> Option<Token> {
        kinds.iter().find_map(|k| self.match_single(k))
    }

    /// Skips to the next statement boundary: just past a `;`, or just before a
    /// statement keyword, a brace, or the end of input.
    fn synchronise(&mut self) {
        loop {
            let kind = match self.tokens.peek() {
                Some(token) => token.kind.clone(),
                None => break,
            };

            match kind {
                TokenKind::Semicolon => {
                    self.advance();
                    break;
                }
                TokenKind::EndOfFile | TokenKind::RightBrace => break,
                k if k.starts_statement() => break,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{printer, scanner};
    use pretty_assertions::assert_eq;
    use std::io;

    fn tokens(src: &str) -> Vec<Token> {
        scanner::tokenize(src).filter_map(|t| t.ok()).collect()
    }

    fn parse_expr(src: &str) -> Result<Expr> {
        let mut parser = Parser::new(tokens(src).into_iter());
        parser.expression()
    }

    fn assert_parses_to(src: &str, expected: &str) -> io::Result<()> {
        let parsed = parse_expr(src)?;
        assert_eq!(expected, printer::print(&parsed));
        Ok(())
    }

    fn parse_program(src: &str) -> result::Result<Vec<Stmt>, Vec<Error>> {
        Parser::new(tokens(src).into_iter()).parse()
    }

    fn program_errors(src: &str) -> Vec<Error> {
        parse_program(src).err().unwrap_or_default()
    }

    fn assert_tokens_parse_to_expr(tokens: Vec<Token>, expr: Expr) -> io::Result<()> {
        let mut parser = Parser::new(tokens.into_iter());
        let parsed = parser.expression()?;
        assert_eq!(expr, parsed);
        Ok(())
    }

    #[test]
    fn string_literal_token() -> io::Result<()> {
        assert_tokens_parse_to_expr(
            vec![
                Token { kind: TokenKind::String("abc".into()), lexeme: "".into(), line: 1 },
            ],
            Expr::new_literal(Value::Text("abc".into()))
        )
    }

    #[test]
    fn number_literal_token() -> io::Result<()> {
        assert_tokens_parse_to_expr(
            vec![
                Token { kind: TokenKind::Number(5.1), lexeme: "".into(), line: 1 },
            ],
            Expr::new_literal(Value::Number(5.1))
        )
    }

    #[test]
    fn nil_literal_token() -> io::Result<()> {
        assert_tokens_parse_to_expr(
            vec![
                Token { kind: TokenKind::Nil, lexeme: "".into(), line: 1 },
            ],
            Expr::new_literal(Value::Nil)
        )
    }

    #[test]
    fn bool_literal_tokens() -> io::Result<()> {
        for (kind, expected) in [(TokenKind::True, true), (TokenKind::False, false)].iter() {
            assert_tokens_parse_to_expr(
                vec![
                    Token { kind: kind.clone(), lexeme: "".into(), line: 1 },
                ],
                Expr::new_literal(Value::Bool(*expected))
            )?;
        }
        Ok(())
    }

    #[test]
    fn unary_op_tokens() -> io::Result<()> {
        let not = Token::new(TokenKind::Bang, "!", 1);
        assert_tokens_parse_to_expr(
            vec![
                not.clone(),
                Token::new(TokenKind::True, "true", 1),
            ],
            Expr::new_unary(not, Box::new(Expr::new_literal(Value::Bool(true))))
        )
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() -> io::Result<()> {
        assert_parses_to("1 + 2 * 3", "(+ 1 (* 2 3))")
    }

    #[test]
    fn binary_operators_are_left_associative() -> io::Result<()> {
        assert_parses_to("1 - 2 - 3", "(- (- 1 2) 3)")?;
        assert_parses_to("8 / 4 % 3", "(% (/ 8 4) 3)")
    }

    #[test]
    fn grouping_overrides_precedence() -> io::Result<()> {
        assert_parses_to("(1 + 2) * 3", "(* (group (+ 1 2)) 3)")
    }

    #[test]
    fn precedence_ladder() -> io::Result<()> {
        assert_parses_to(
            "a = b or c and d == e < f + g * -h",
            "(= a (or b (and c (== d (< e (+ f (* g (- h))))))))",
        )
    }

    #[test]
    fn conditional_is_right_associative() -> io::Result<()> {
        assert_parses_to("a ? b : c ? d : e", "(?: a b (?: c d e))")
    }

    #[test]
    fn assignment_is_right_associative() -> io::Result<()> {
        assert_parses_to("a = b = 3", "(= a (= b 3))")
    }

    #[test]
    fn comma_is_the_loosest_operator() -> io::Result<()> {
        assert_parses_to("a = 1, b = 2", "(, (= a 1) (= b 2))")
    }

    #[test]
    fn invalid_assignment_target() {
        let err = parse_expr("1 + a = 3").unwrap_err();
        assert_eq!(Some(&SyntaxError::InvalidAssignmentTarget), err.syntax_cause());
    }

    #[test]
    fn missing_left_hand_operand() {
        for src in ["== 1", "> 2", "+ 3", "* 4", "/ 5", "% 6"].iter() {
            let err = parse_expr(src).unwrap_err();
            assert_eq!(Some(&SyntaxError::MissingLeftOperand), err.syntax_cause(), "{}", src);
        }
    }

    #[test]
    fn dangling_operator_without_right_operand_is_one_error() {
        let errors = program_errors("program { write(* ); write(1); }");
        assert_eq!(1, errors.len(), "{:?}", errors);
        assert_eq!(Some(&SyntaxError::MissingLeftOperand), errors[0].syntax_cause());
    }

    #[test]
    fn leading_minus_is_negation_not_an_error() -> io::Result<()> {
        assert_parses_to("- 3", "(- 3)")
    }

    #[test]
    fn expected_expression() {
        let err = parse_expr(")").unwrap_err();
        assert_eq!(Some(&SyntaxError::ExpectedExpression), err.syntax_cause());
    }

    #[test]
    fn program_with_declarations_and_statements() {
        let statements = parse_program("program { int a = 1, b; string s; write(a, s); }").unwrap();
        assert_eq!(3, statements.len());
        match &statements[0] {
            Stmt::Declaration(d) => {
                assert_eq!(DeclKind::Int, d.kind);
                assert_eq!(2, d.declarators.len());
                assert_eq!("b", d.declarators[1].name.lexeme);
                assert!(d.declarators[1].initializer.is_none());
            }
            other => panic!("expected a declaration, got {:?}", other),
        }
    }

    #[test]
    fn program_header_is_required() {
        let errors = program_errors("write(1);");
        assert_eq!(1, errors.len());
        assert!(errors[0].to_string().contains("'program'"));
    }

    #[test]
    fn trailing_tokens_after_program_are_an_error() {
        assert_eq!(1, program_errors("program { } write(1);").len());
    }

    #[test]
    fn recovers_and_reports_every_bad_statement() {
        let errors = program_errors(
            "program {
                int = 3;
                write(1);
                x = ;
                1 + 2 = 4;
                write(2);
            }",
        );
        assert_eq!(3, errors.len());
        assert_eq!(vec![2, 4, 5], errors.iter().map(|e| e.line()).collect::<Vec<_>>());
    }

    #[test]
    fn errors_inside_blocks_do_not_swallow_the_block() {
        let errors = program_errors("program { { write(; } write(1); }");
        assert_eq!(1, errors.len());
    }

    #[test]
    fn break_outside_a_loop_is_rejected() {
        let errors = program_errors("program { break; while (true) { break; } }");
        assert_eq!(1, errors.len());
        assert_eq!(Some(&SyntaxError::OutsideLoop("break".into())), errors[0].syntax_cause());
    }

    #[test]
    fn for_clauses_are_each_optional() {
        let statements = parse_program("program { for (;;) break; }").unwrap();
        match &statements[0] {
            Stmt::For(f) => {
                assert!(f.initializer.is_none());
                assert!(f.condition.is_none());
                assert!(f.increment.is_none());
            }
            other => panic!("expected a for loop, got {:?}", other),
        }
    }

    #[test]
    fn statement_fragments_parse_without_a_header() {
        let statements = Parser::new(tokens("int x = 1; write(x);").into_iter())
            .parse_statements()
            .unwrap();
        assert_eq!(2, statements.len());
    }
}
