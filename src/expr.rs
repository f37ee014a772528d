use crate::token::Token;
use crate::value::Value;
use astgen::generate_ast;

generate_ast!(
    Expr,
    [
        Assign      => { name: Token, value: Box<Expr> };
        Binary      => { left: Box<Expr>, op: Token, right: Box<Expr> };
        Conditional => { condition: Box<Expr>, then_branch: Box<Expr>, else_branch: Box<Expr> };
        Grouping    => { expression: Box<Expr> };
        Literal     => { value: Value };
        Logical     => { left: Box<Expr>, op: Token, right: Box<Expr> };
        Unary       => { op: Token, right: Box<Expr> };
        Variable    => { name: Token };
    ]
);
