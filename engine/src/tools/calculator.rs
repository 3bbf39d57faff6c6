//! Calculator Tool
//!
//! Evaluates arithmetic with a small tokenizer and recursive-descent parser.
//! Only numbers, `+ - * /`, parentheses and unary signs are accepted; any
//! other input is rejected with [`ToolError::InvalidExpression`], so nothing
//! the planner passes in can ever be executed as code.
//!
//! Grammar:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/') unary)*
//! unary  := ('+' | '-') unary | atom
//! atom   := NUMBER | '(' expr ')'
//! ```

use async_trait::async_trait;
use sdk::{Tool, ToolError, ToolInput, ToolOutput};
use serde_json::{json, Value};
use tracing::debug;

/// Maximum nesting of parentheses and unary signs
const MAX_DEPTH: usize = 64;

/// Largest magnitude at which every integer is exactly representable in f64
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Default)]
pub struct CalculatorTool;

impl CalculatorTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculate"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression using numbers, + - * / and parentheses."
    }

    fn parameters(&self) -> &[&str] {
        &["expression"]
    }

    async fn invoke(&self, input: ToolInput) -> Result<ToolOutput, ToolError> {
        let expression = input.param_str("expression")?;
        debug!("Evaluating expression: {}", expression);

        let value = evaluate(&expression)?;

        let mut output = ToolOutput::new();
        output.insert("result".to_string(), number_to_json(value));
        Ok(output)
    }
}

/// Evaluate an arithmetic expression.
///
/// # Errors
///
/// - [`ToolError::InvalidExpression`] for anything outside the grammar, for
///   nesting deeper than 64 levels, and for non-finite results
/// - [`ToolError::DivisionByZero`] when a divisor evaluates to zero
pub fn evaluate(expression: &str) -> Result<f64, ToolError> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(ToolError::InvalidExpression("empty expression".to_string()));
    }

    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;

    if let Some(token) = parser.peek() {
        return Err(ToolError::InvalidExpression(format!(
            "unexpected {} after end of expression",
            token
        )));
    }

    if !value.is_finite() {
        return Err(ToolError::InvalidExpression(
            "result is not a finite number".to_string(),
        ));
    }

    Ok(value)
}

/// Integral values become JSON integers so `5*7` reports `35`, not `35.0`.
fn number_to_json(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() <= MAX_EXACT_INT {
        json!(value as i64)
    } else {
        json!(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "number {}", n),
            Token::Plus => write!(f, "'+'"),
            Token::Minus => write!(f, "'-'"),
            Token::Star => write!(f, "'*'"),
            Token::Slash => write!(f, "'/'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, ToolError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '+' | '-' | '*' | '/' | '(' | ')' => {
                tokens.push(match ch {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '(' => Token::LParen,
                    _ => Token::RParen,
                });
                chars.next();
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = pos;
                let mut end = pos;
                let mut seen_dot = false;
                let mut seen_exp = false;

                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_digit() {
                        end = i + 1;
                        chars.next();
                    } else if c == '.' && !seen_dot && !seen_exp {
                        seen_dot = true;
                        end = i + 1;
                        chars.next();
                    } else if (c == 'e' || c == 'E') && !seen_exp {
                        seen_exp = true;
                        end = i + 1;
                        chars.next();
                        if let Some(&(j, sign)) = chars.peek() {
                            if sign == '+' || sign == '-' {
                                end = j + 1;
                                chars.next();
                            }
                        }
                    } else {
                        break;
                    }
                }

                let literal = &input[start..end];
                let number = literal.parse::<f64>().map_err(|_| {
                    ToolError::InvalidExpression(format!(
                        "invalid number '{}' at position {}",
                        literal, start
                    ))
                })?;
                tokens.push(Token::Number(number));
            }
            other => {
                return Err(ToolError::InvalidExpression(format!(
                    "unexpected character '{}' at position {}",
                    other, pos
                )));
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn descend(&mut self) -> Result<(), ToolError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ToolError::InvalidExpression(format!(
                "expression nested deeper than {} levels",
                MAX_DEPTH
            )));
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<f64, ToolError> {
        let mut value = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.advance();
            let rhs = self.term()?;
            value = if op == Token::Plus {
                value + rhs
            } else {
                value - rhs
            };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, ToolError> {
        let mut value = self.unary()?;
        while let Some(op @ (Token::Star | Token::Slash)) = self.peek() {
            self.advance();
            let rhs = self.unary()?;
            if op == Token::Star {
                value *= rhs;
            } else {
                if rhs == 0.0 {
                    return Err(ToolError::DivisionByZero);
                }
                value /= rhs;
            }
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<f64, ToolError> {
        match self.peek() {
            Some(Token::Plus) => {
                self.advance();
                self.descend()?;
                let value = self.unary();
                self.depth -= 1;
                value
            }
            Some(Token::Minus) => {
                self.advance();
                self.descend()?;
                let value = self.unary().map(|v| -v);
                self.depth -= 1;
                value
            }
            _ => self.atom(),
        }
    }

    fn atom(&mut self) -> Result<f64, ToolError> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::LParen) => {
                self.descend()?;
                let value = self.expr()?;
                self.depth -= 1;
                match self.advance() {
                    Some(Token::RParen) => Ok(value),
                    Some(token) => Err(ToolError::InvalidExpression(format!(
                        "expected ')' but found {}",
                        token
                    ))),
                    None => Err(ToolError::InvalidExpression(
                        "missing closing ')'".to_string(),
                    )),
                }
            }
            Some(token) => Err(ToolError::InvalidExpression(format!(
                "unexpected {}",
                token
            ))),
            None => Err(ToolError::InvalidExpression(
                "unexpected end of expression".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_arithmetic() {
        assert_eq!(evaluate("2+2").unwrap(), 4.0);
        assert_eq!(evaluate("(3*4)-5").unwrap(), 7.0);
        assert_eq!(evaluate("5 * 7").unwrap(), 35.0);
        assert_eq!(evaluate("10 / 4").unwrap(), 2.5);
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(evaluate("10 - 4 - 3").unwrap(), 3.0);
        assert_eq!(evaluate("64 / 4 / 2").unwrap(), 8.0);
    }

    #[test]
    fn test_unary_signs() {
        assert_eq!(evaluate("-3 + 5").unwrap(), 2.0);
        assert_eq!(evaluate("2 * -3").unwrap(), -6.0);
        assert_eq!(evaluate("--4").unwrap(), 4.0);
        assert_eq!(evaluate("+(1.5)").unwrap(), 1.5);
    }

    #[test]
    fn test_number_formats() {
        assert_eq!(evaluate("0.5 + .25").unwrap(), 0.75);
        assert_eq!(evaluate("1e3").unwrap(), 1000.0);
        assert_eq!(evaluate("2.5E-1").unwrap(), 0.25);
    }

    #[test]
    fn test_rejects_code() {
        for input in ["import os", "__import__('os')", "2 ** 3", "abs(-1)", "1; 2", "x + 1"] {
            let err = evaluate(input).unwrap_err();
            assert!(
                matches!(err, ToolError::InvalidExpression(_)),
                "{} should be rejected, got {:?}",
                input,
                err
            );
        }
    }

    #[test]
    fn test_structural_errors() {
        assert!(matches!(evaluate(""), Err(ToolError::InvalidExpression(_))));
        assert!(matches!(evaluate("   "), Err(ToolError::InvalidExpression(_))));
        assert!(matches!(evaluate("(1 + 2"), Err(ToolError::InvalidExpression(_))));
        assert!(matches!(evaluate("1 + 2)"), Err(ToolError::InvalidExpression(_))));
        assert!(matches!(evaluate("1 +"), Err(ToolError::InvalidExpression(_))));
        assert!(matches!(evaluate("1 2"), Err(ToolError::InvalidExpression(_))));
        assert!(matches!(evaluate("1..2"), Err(ToolError::InvalidExpression(_))));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(evaluate("1/0").unwrap_err(), ToolError::DivisionByZero);
        assert_eq!(evaluate("5 / (2 - 2)").unwrap_err(), ToolError::DivisionByZero);
    }

    #[test]
    fn test_overflow_is_rejected() {
        let err = evaluate("1e308 * 10").unwrap_err();
        assert!(matches!(err, ToolError::InvalidExpression(_)));
    }

    #[test]
    fn test_depth_limit() {
        let deep = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        assert!(matches!(evaluate(&deep), Err(ToolError::InvalidExpression(_))));

        let shallow = format!("{}1{}", "(".repeat(10), ")".repeat(10));
        assert_eq!(evaluate(&shallow).unwrap(), 1.0);
    }

    #[test]
    fn test_number_to_json() {
        assert_eq!(number_to_json(35.0), json!(35));
        assert_eq!(number_to_json(-6.0), json!(-6));
        assert_eq!(number_to_json(2.5), json!(2.5));
    }

    #[tokio::test]
    async fn test_invoke() {
        let tool = CalculatorTool::new();
        let output = tool
            .invoke(ToolInput::new().with_param("expression", json!("5*7")))
            .await
            .unwrap();
        assert_eq!(output.get("result"), Some(&json!(35)));

        let err = tool.invoke(ToolInput::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::MissingParameter(_)));

        let err = tool
            .invoke(ToolInput::new().with_param("expression", json!("import os")))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidExpression(_)));
    }
}
