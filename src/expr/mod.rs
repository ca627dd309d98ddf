pub mod eval;
pub mod parser;
pub mod token;

pub use eval::{evaluate, evaluate_postfix};
pub use parser::{render_infix, render_postfix, to_postfix};
pub use token::{numbers, tokenize, Op, Paren, Token};
