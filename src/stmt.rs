use crate::expr::Expr;
use crate::token::Token;
use crate::value::DeclKind;
use astgen::generate_ast;

/// One `name (= initializer)?` entry of a declaration.
#[derive(Debug, PartialEq)]
pub struct Declarator {
    pub(crate) name: Token,
    pub(crate) initializer: Option<Expr>,
}

generate_ast!(
    Stmt,
    [
        Block       => { statements: Vec<Stmt> };
        Break       => { keyword: Token };
        Continue    => { keyword: Token };
        Declaration => { kind: DeclKind, declarators: Vec<Declarator> };
        Expression  => { expression: Expr };
        For         => {
            initializer: Option<Box<Stmt>>,
            condition: Option<Expr>,
            increment: Option<Expr>,
            body: Box<Stmt>
        };
        If          => { condition: Expr, then_branch: Box<Stmt>, else_branch: Option<Box<Stmt>> };
        Read        => { name: Token };
        While       => { condition: Expr, body: Box<Stmt> };
        Write       => { keyword: Token, expressions: Vec<Expr> };
    ]
);
