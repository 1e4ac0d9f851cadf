//! Tokenizing and evaluating instruction argument expressions
//!
//! Expressions are evaluated over unsigned 32-bit wraparound arithmetic;
//! callers truncate the value to the operand width they need. Each
//! precedence level takes at most one right-hand operand, so a chain like
//! `1 + 2 + 3` evaluates its `1 + 2` prefix and reports the trailing
//! tokens as an invalid expression.

use regex::Regex;

use super::Assembler;

/// One lexeme of an argument expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Value(u32),
    Symbol(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

/// Lex a prepared (lowercased) expression string into tokens.
///
/// Integer literals are decimal, `$` hexadecimal or `%` binary. Anything
/// that is not a literal or an operator lexes as a symbol.
pub fn tokenize(expr: &str) -> Vec<Token> {
    let lexeme = Regex::new(r"\$[0-9a-f]+|%[01]+|[0-9]+|[+\-*/()]|[a-z_][a-z0-9_]*|\S").unwrap();
    lexeme
        .find_iter(expr)
        .map(|lexeme| match lexeme.as_str() {
            "+" => Token::Plus,
            "-" => Token::Minus,
            "*" => Token::Star,
            "/" => Token::Slash,
            "(" => Token::LParen,
            ")" => Token::RParen,
            text => match text.as_bytes()[0] {
                b'$' => Token::Value(fold_digits(&text[1..], 16)),
                b'%' => Token::Value(fold_digits(&text[1..], 2)),
                b'0'..=b'9' => Token::Value(fold_digits(text, 10)),
                _ => Token::Symbol(text.to_string()),
            },
        })
        .collect()
}

/// Accumulate digits with wrapping arithmetic, so oversized literals wrap
/// modulo 2^32 instead of failing to parse
fn fold_digits(digits: &str, radix: u32) -> u32 {
    digits.chars().fold(0u32, |value, ch| {
        value
            .wrapping_mul(radix)
            .wrapping_add(ch.to_digit(radix).unwrap_or(0))
    })
}

/// Evaluate an expression string against the assembler's symbol table.
///
/// Every malformed construct is reported through the assembler's error
/// counter and contributes 0, so evaluation always produces a value and
/// the second pass keeps emitting bytes.
pub(crate) fn evaluate(asm: &mut Assembler, expr: &str) -> u32 {
    let tokens = tokenize(expr);
    if tokens.is_empty() {
        return 0;
    }
    let mut cursor = Cursor {
        asm,
        tokens: &tokens,
        position: 0,
    };
    let value = cursor.sum();
    if cursor.position < tokens.len() {
        cursor.asm.report("invalid expression".to_string());
    }
    value
}

/// Recursive-descent evaluator over a flat token sequence
struct Cursor<'a> {
    asm: &'a mut Assembler,
    tokens: &'a [Token],
    position: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn sum(&mut self) -> u32 {
        let value = self.product();
        match self.peek() {
            Some(Token::Plus) => {
                self.position += 1;
                value.wrapping_add(self.product())
            }
            Some(Token::Minus) => {
                self.position += 1;
                value.wrapping_sub(self.product())
            }
            _ => value,
        }
    }

    fn product(&mut self) -> u32 {
        let value = self.unary();
        match self.peek() {
            Some(Token::Star) => {
                self.position += 1;
                value.wrapping_mul(self.unary())
            }
            Some(Token::Slash) => {
                self.position += 1;
                let divisor = self.unary();
                if divisor == 0 {
                    self.asm.report("division by zero".to_string());
                    0
                } else {
                    value / divisor
                }
            }
            _ => value,
        }
    }

    // Precedence level reserved for prefix operators
    fn unary(&mut self) -> u32 {
        self.factor()
    }

    fn factor(&mut self) -> u32 {
        match self.peek().cloned() {
            Some(Token::Value(value)) => {
                self.position += 1;
                value
            }
            Some(Token::Symbol(name)) => {
                self.position += 1;
                match self.asm.symbols.get(&name) {
                    Some(address) => *address as u32,
                    None => {
                        self.asm.report(format!("symbol not found: \"{}\"", name));
                        0
                    }
                }
            }
            Some(Token::LParen) => {
                self.position += 1;
                let value = self.sum();
                if matches!(self.peek(), Some(Token::RParen)) {
                    self.position += 1;
                } else {
                    self.asm.report("expected ')'".to_string());
                }
                value
            }
            Some(_) => {
                self.position += 1;
                self.asm.report("expected value".to_string());
                0
            }
            None => {
                self.asm.report("expected value".to_string());
                0
            }
        }
    }
}
