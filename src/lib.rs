pub mod config;
mod environment;
pub mod error;
mod expr;
mod input;
pub mod interpreter;
pub mod lox;
pub mod parser;
pub mod printer;
pub mod scanner;
mod stmt;
pub mod token;
pub mod value;

pub use crate::config::Config;
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::lox::{Lox, Outcome};
