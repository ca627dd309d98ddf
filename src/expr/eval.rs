use super::parser::to_postfix;
use super::token::{tokenize, Token};
use crate::error::ExprError;

/// Run a postfix sequence on a value stack.
///
/// Each operator pops `b` then `a` and pushes `a op b`. Any non-finite
/// intermediate (division by zero, overflow, NaN) aborts evaluation.
pub fn evaluate_postfix(postfix: &[Token]) -> Result<f64, ExprError> {
    let mut stack: Vec<f64> = Vec::with_capacity(postfix.len());

    for token in postfix {
        match *token {
            Token::Number(n) => stack.push(n as f64),
            Token::Operator(op) => {
                let (Some(b), Some(a)) = (stack.pop(), stack.pop()) else {
                    return Err(ExprError::MalformedExpression);
                };
                let result = op.apply(a, b);
                if !result.is_finite() {
                    return Err(ExprError::InvalidArithmeticResult);
                }
                stack.push(result);
            }
            Token::Paren(_) => return Err(ExprError::MalformedExpression),
        }
    }

    match stack.as_slice() {
        [value] => Ok(*value),
        _ => Err(ExprError::MalformedExpression),
    }
}

/// Tokenize, parse and evaluate `text`.
pub fn evaluate(text: &str) -> Result<f64, ExprError> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(ExprError::EmptyExpression);
    }
    let postfix = to_postfix(&tokens)?;
    evaluate_postfix(&postfix)
}
