use crate::{
    expr::{self, Expr},
    stmt::{self, Stmt},
    value::Value,
};

pub fn print(e: &Expr) -> String {
    let mut printer = AstPrinter {};
    e.accept(&mut printer)
}

/// One s-expression per top-level statement, newline separated.
pub fn print_program(statements: &[Stmt]) -> String {
    let mut printer = AstPrinter {};
    statements.iter()
        .map(|s| s.accept(&mut printer))
        .collect::<Vec<_>>()
        .join("\n")
}

struct AstPrinter;

impl AstPrinter {
    fn parenthesize(&mut self, name: &str, exprs: &[&Expr]) -> String {
        let parts: Vec<String> = exprs.iter().map(|e| e.accept(self)).collect();
        self.list(name, &parts)
    }

    fn list(&self, name: &str, parts: &[String]) -> String {
        let mut s = String::new();
        s.push('(');
        s.push_str(name);

        for part in parts.iter() {
            s.push(' ');
            s.push_str(part.as_str());
        }

        s.push(')');
        s
    }

    fn optional(&mut self, e: &Option<Expr>) -> String {
        e.as_ref().map(|e| e.accept(self)).unwrap_or_else(|| "_".to_string())
    }
}

impl expr::Visitor<String> for AstPrinter {
    fn visit_assign_expr(&mut self, e: &expr::Assign) -> String {
        let value = e.value.accept(self);
        self.list("=", &[e.name.lexeme.clone(), value])
    }

    fn visit_binary_expr(&mut self, e: &expr::Binary) -> String {
        self.parenthesize(
            e.op.lexeme.as_str(),
            &[e.left.as_ref(), e.right.as_ref()]
        )
    }

    fn visit_conditional_expr(&mut self, e: &expr::Conditional) -> String {
        self.parenthesize(
            "?:",
            &[e.condition.as_ref(), e.then_branch.as_ref(), e.else_branch.as_ref()]
        )
    }

    fn visit_grouping_expr(&mut self, e: &expr::Grouping) -> String {
        self.parenthesize(
            "group",
            &[e.expression.as_ref()]
        )
    }

    fn visit_literal_expr(&mut self, e: &expr::Literal) -> String {
        match &e.value {
            Value::Text(s) => format!("{:?}", s),
            value => value.to_string(),
        }
    }

    fn visit_logical_expr(&mut self, e: &expr::Logical) -> String {
        self.parenthesize(
            e.op.lexeme.as_str(),
            &[e.left.as_ref(), e.right.as_ref()]
        )
    }

    fn visit_unary_expr(&mut self, e: &expr::Unary) -> String {
        self.parenthesize(
            e.op.lexeme.as_str(),
            &[e.right.as_ref()]
        )
    }

    fn visit_variable_expr(&mut self, e: &expr::Variable) -> String {
        e.name.lexeme.clone()
    }
}

impl stmt::Visitor<String> for AstPrinter {
    fn visit_block_stmt(&mut self, b: &stmt::Block) -> String {
        let parts: Vec<String> = b.statements.iter().map(|s| s.accept(self)).collect();
        self.list("block", &parts)
    }

    fn visit_break_stmt(&mut self, _: &stmt::Break) -> String {
        "(break)".to_string()
    }

    fn visit_continue_stmt(&mut self, _: &stmt::Continue) -> String {
        "(continue)".to_string()
    }

    fn visit_declaration_stmt(&mut self, d: &stmt::Declaration) -> String {
        let parts: Vec<String> = d.declarators.iter()
            .map(|decl| match &decl.initializer {
                Some(initializer) => {
                    let value = initializer.accept(self);
                    self.list("=", &[decl.name.lexeme.clone(), value])
                }
                None => decl.name.lexeme.clone(),
            })
            .collect();
        self.list(&d.kind.to_string(), &parts)
    }

    fn visit_expression_stmt(&mut self, e: &stmt::Expression) -> String {
        self.parenthesize(";", &[&e.expression])
    }

    fn visit_for_stmt(&mut self, f: &stmt::For) -> String {
        let initializer = f.initializer.as_ref()
            .map(|s| s.accept(self))
            .unwrap_or_else(|| "_".to_string());
        let condition = self.optional(&f.condition);
        let increment = self.optional(&f.increment);
        let body = f.body.accept(self);
        self.list("for", &[initializer, condition, increment, body])
    }

    fn visit_if_stmt(&mut self, i: &stmt::If) -> String {
        let mut parts = vec![i.condition.accept(self), i.then_branch.accept(self)];
        if let Some(else_branch) = &i.else_branch {
            parts.push(else_branch.accept(self));
        }
        self.list("if", &parts)
    }

    fn visit_read_stmt(&mut self, r: &stmt::Read) -> String {
        self.list("read", &[r.name.lexeme.clone()])
    }

    fn visit_while_stmt(&mut self, w: &stmt::While) -> String {
        let parts = [w.condition.accept(self), w.body.accept(self)];
        self.list("while", &parts)
    }

    fn visit_write_stmt(&mut self, w: &stmt::Write) -> String {
        let parts: Vec<&Expr> = w.expressions.iter().collect();
        self.parenthesize("write", &parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Token, TokenKind};

    #[test]
    fn string_literal() {
        let e = Expr::new_literal(Value::Text("yes".into()));
        assert_eq!("\"yes\"", print(&e));
    }

    #[test]
    fn grouped_number() {
        let e = Expr::new_grouping(Box::new(Expr::new_literal(Value::Number(531.9))));
        assert_eq!("(group 531.9)", print(&e));
    }

    #[test]
    fn binary_expression_with_unary_and_grouping_sub_exprs() {
        let e = Expr::new_binary(
            Box::new(Expr::new_unary(
                Token::new(TokenKind::Minus, "-", 1),
                Box::new(Expr::new_literal(Value::Number(123.0))),
            )),
            Token::new(TokenKind::Star, "*", 1),
            Box::new(Expr::new_grouping(Box::new(Expr::new_literal(Value::Number(45.67))))),
        );
        assert_eq!("(* (- 123) (group 45.67))", print(&e));
    }

    #[test]
    fn statements() {
        let x = Token::new(TokenKind::Identifier, "x", 1);
        let program = vec![
            Stmt::new_declaration(
                crate::value::DeclKind::Int,
                vec![
                    stmt::Declarator { name: x.clone(), initializer: Some(Expr::new_literal(Value::Number(1.0))) },
                    stmt::Declarator { name: Token::new(TokenKind::Identifier, "y", 1), initializer: None },
                ],
            ),
            Stmt::new_while(
                Expr::new_literal(Value::Bool(true)),
                Box::new(Stmt::new_block(vec![
                    Stmt::new_read(x.clone()),
                    Stmt::new_break(Token::new(TokenKind::Break, "break", 1)),
                ])),
            ),
            Stmt::new_write(
                Token::new(TokenKind::Write, "write", 1),
                vec![Expr::new_variable(x), Expr::new_literal(Value::Nil)],
            ),
        ];
        assert_eq!(
            "(int (= x 1) y)\n(while true (block (read x) (break)))\n(write x nil)",
            print_program(&program)
        );
    }
}
