use itertools::Itertools;

use super::token::{Paren, Token};
use crate::error::ExprError;

/// Shunting-yard conversion of infix tokens to postfix order.
///
/// Numbers go straight to the output. An incoming operator first pops every
/// stacked operator of equal or higher precedence (all operators are
/// left-associative), then is pushed itself. A closing parenthesis unwinds
/// the stack to its matching opener.
pub fn to_postfix(tokens: &[Token]) -> Result<Vec<Token>, ExprError> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut stack: Vec<Token> = Vec::new();

    for &token in tokens {
        match token {
            Token::Number(_) => output.push(token),
            Token::Operator(op) => {
                while let Some(&Token::Operator(top)) = stack.last() {
                    if top.precedence() < op.precedence() {
                        break;
                    }
                    output.push(Token::Operator(top));
                    stack.pop();
                }
                stack.push(token);
            }
            Token::Paren(Paren::Open) => stack.push(token),
            Token::Paren(Paren::Close) => loop {
                match stack.pop() {
                    Some(Token::Paren(Paren::Open)) => break,
                    Some(entry) => output.push(entry),
                    None => return Err(ExprError::MismatchedParentheses),
                }
            },
        }
    }

    while let Some(entry) = stack.pop() {
        if let Token::Paren(_) = entry {
            return Err(ExprError::MismatchedParentheses);
        }
        output.push(entry);
    }

    Ok(output)
}

/// Render a postfix sequence back to infix text, parenthesising every
/// binary operation so the result re-parses to the same tree.
pub fn render_infix(postfix: &[Token]) -> Result<String, ExprError> {
    let mut stack: Vec<String> = Vec::new();
    for token in postfix {
        match token {
            Token::Number(n) => stack.push(n.to_string()),
            Token::Operator(op) => {
                let (Some(b), Some(a)) = (stack.pop(), stack.pop()) else {
                    return Err(ExprError::MalformedExpression);
                };
                stack.push(format!("({a} {op} {b})"));
            }
            Token::Paren(_) => return Err(ExprError::MalformedExpression),
        }
    }
    match stack.len() {
        1 => Ok(stack.remove(0)),
        _ => Err(ExprError::MalformedExpression),
    }
}

/// Space separated postfix, e.g. `2 3 4 * +`.
pub fn render_postfix(postfix: &[Token]) -> String {
    postfix.iter().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::token::tokenize;
    use assert_matches::assert_matches;

    fn postfix_of(text: &str) -> Result<String, ExprError> {
        let tokens = tokenize(text)?;
        to_postfix(&tokens).map(|p| render_postfix(&p))
    }

    #[test]
    fn test_precedence() {
        assert_eq!(postfix_of("2+3*4").unwrap(), "2 3 4 * +");
        assert_eq!(postfix_of("2*3+4").unwrap(), "2 3 * 4 +");
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(postfix_of("10-4-3").unwrap(), "10 4 - 3 -");
        assert_eq!(postfix_of("64/8/2").unwrap(), "64 8 / 2 /");
        assert_eq!(postfix_of("6/3*2").unwrap(), "6 3 / 2 *");
    }

    #[test]
    fn test_parens_override_precedence() {
        assert_eq!(postfix_of("(2+3)*4").unwrap(), "2 3 + 4 *");
        assert_eq!(postfix_of("2*(3+(4-1))").unwrap(), "2 3 4 1 - + *");
    }

    #[test]
    fn test_unmatched_close_paren() {
        assert_matches!(postfix_of("2+3)"), Err(ExprError::MismatchedParentheses));
    }

    #[test]
    fn test_unmatched_open_paren() {
        assert_matches!(postfix_of("(2+3"), Err(ExprError::MismatchedParentheses));
        assert_matches!(postfix_of("((4)"), Err(ExprError::MismatchedParentheses));
    }

    #[test]
    fn test_render_infix() {
        let tokens = tokenize("2+3*4").unwrap();
        let postfix = to_postfix(&tokens).unwrap();
        assert_eq!(render_infix(&postfix).unwrap(), "(2 + (3 * 4))");
    }

    #[test]
    fn test_render_infix_rejects_malformed() {
        let postfix = [Token::Number(1), Token::Number(2)];
        assert_matches!(render_infix(&postfix), Err(ExprError::MalformedExpression));
        assert_matches!(render_infix(&[]), Err(ExprError::MalformedExpression));
    }
}
