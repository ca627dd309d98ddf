use std::fmt;

use crate::error::ExprError;

/// One of the four binary operators the game accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

impl Op {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Op::Add),
            '-' => Some(Op::Sub),
            '*' => Some(Op::Mul),
            '/' => Some(Op::Div),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Op::Add => '+',
            Op::Sub => '-',
            Op::Mul => '*',
            Op::Div => '/',
        }
    }

    /// Binding strength; every operator is left-associative.
    pub fn precedence(self) -> u8 {
        match self {
            Op::Add | Op::Sub => 1,
            Op::Mul | Op::Div => 2,
        }
    }

    /// `a op b` with real-number semantics (division is not floored).
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Op::Add => a + b,
            Op::Sub => a - b,
            Op::Mul => a * b,
            Op::Div => a / b,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Paren {
    Open,
    Close,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token {
    Number(u64),
    Operator(Op),
    Paren(Paren),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{n}"),
            Token::Operator(op) => write!(f, "{op}"),
            Token::Paren(Paren::Open) => write!(f, "("),
            Token::Paren(Paren::Close) => write!(f, ")"),
        }
    }
}

/// Split `text` into tokens.
///
/// Whitespace is dropped before scanning, so `"1 2"` reads as `12`. Positions
/// in errors refer to character offsets in the original text. An empty or
/// all-whitespace input yields an empty vector; callers that need a formula
/// must reject that themselves.
pub fn tokenize(text: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = text
        .chars()
        .enumerate()
        .filter(|(_, c)| !c.is_whitespace())
        .peekable();

    while let Some((position, c)) = chars.next() {
        if c.is_ascii_digit() {
            let mut value = digit_value(c);
            while let Some(&(_, next)) = chars.peek() {
                if !next.is_ascii_digit() {
                    break;
                }
                chars.next();
                value = value
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(digit_value(next)))
                    .ok_or(ExprError::NumberTooLarge { position })?;
            }
            tokens.push(Token::Number(value));
            continue;
        }

        let token = match c {
            '(' => Token::Paren(Paren::Open),
            ')' => Token::Paren(Paren::Close),
            _ => match Op::from_char(c) {
                Some(op) => Token::Operator(op),
                None => return Err(ExprError::InvalidCharacter { ch: c, position }),
            },
        };
        tokens.push(token);
    }

    reject_unary(&tokens)?;
    Ok(tokens)
}

fn digit_value(c: char) -> u64 {
    u64::from(c as u8 - b'0')
}

// An operator needs a left operand: it may not open the expression, follow
// another operator, or follow an opening parenthesis.
fn reject_unary(tokens: &[Token]) -> Result<(), ExprError> {
    let mut prev: Option<Token> = None;
    for &token in tokens {
        if let Token::Operator(op) = token {
            if matches!(
                prev,
                None | Some(Token::Operator(_)) | Some(Token::Paren(Paren::Open))
            ) {
                return Err(ExprError::UnsupportedUnaryOperator { op });
            }
        }
        prev = Some(token);
    }
    Ok(())
}

/// Number values in order of appearance.
pub fn numbers(tokens: &[Token]) -> impl Iterator<Item = u64> + '_ {
    tokens.iter().filter_map(|t| match t {
        Token::Number(n) => Some(*n),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_tokenize_simple_expression() {
        let tokens = tokenize("12+3").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Number(12),
                Token::Operator(Op::Add),
                Token::Number(3)
            ]
        );
    }

    #[test]
    fn test_tokenize_parens_and_all_operators() {
        let tokens = tokenize("(1-2)*3/4").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Paren(Paren::Open),
                Token::Number(1),
                Token::Operator(Op::Sub),
                Token::Number(2),
                Token::Paren(Paren::Close),
                Token::Operator(Op::Mul),
                Token::Number(3),
                Token::Operator(Op::Div),
                Token::Number(4),
            ]
        );
    }

    #[test]
    fn test_whitespace_is_stripped() {
        assert_eq!(
            tokenize("  7 *  8 ").unwrap(),
            vec![
                Token::Number(7),
                Token::Operator(Op::Mul),
                Token::Number(8)
            ]
        );
        // digits separated only by whitespace join up
        assert_eq!(tokenize("1 2").unwrap(), vec![Token::Number(12)]);
    }

    #[test]
    fn test_empty_input_yields_no_tokens() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize("   \t ").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_character() {
        assert_matches!(
            tokenize("3 + x"),
            Err(ExprError::InvalidCharacter { ch: 'x', position: 4 })
        );
        assert_matches!(
            tokenize("2.5"),
            Err(ExprError::InvalidCharacter { ch: '.', .. })
        );
        assert_matches!(
            tokenize("2^3"),
            Err(ExprError::InvalidCharacter { ch: '^', .. })
        );
    }

    #[test]
    fn test_non_ascii_digits_are_rejected() {
        assert_matches!(
            tokenize("٣"),
            Err(ExprError::InvalidCharacter { ch: '٣', .. })
        );
    }

    #[test]
    fn test_unary_operator_rejected() {
        assert_matches!(
            tokenize("-5+3"),
            Err(ExprError::UnsupportedUnaryOperator { op: Op::Sub })
        );
        assert_matches!(
            tokenize("5*-3"),
            Err(ExprError::UnsupportedUnaryOperator { op: Op::Sub })
        );
        assert_matches!(
            tokenize("(+2)"),
            Err(ExprError::UnsupportedUnaryOperator { op: Op::Add })
        );
    }

    #[test]
    fn test_trailing_operator_is_left_to_the_parser() {
        assert!(tokenize("5+").is_ok());
    }

    #[test]
    fn test_number_too_large() {
        assert_matches!(
            tokenize("1+99999999999999999999999"),
            Err(ExprError::NumberTooLarge { position: 2 })
        );
    }

    #[test]
    fn test_numbers_in_order() {
        let tokens = tokenize("(8+1)*40").unwrap();
        assert_eq!(numbers(&tokens).collect::<Vec<_>>(), vec![8, 1, 40]);
    }

    #[test]
    fn test_op_properties() {
        assert_eq!(Op::from_char('*'), Some(Op::Mul));
        assert_eq!(Op::from_char('%'), None);
        assert!(Op::Mul.precedence() > Op::Add.precedence());
        assert_eq!(Op::Sub.precedence(), Op::Add.precedence());
        assert_eq!(Op::Div.apply(7.0, 2.0), 3.5);
        assert_eq!(Op::Div.to_string(), "/");
    }
}
