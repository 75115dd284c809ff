//! Recursive-descent parser for lambda-style filter text.
//!
//! The parser only knows the grammar; whether a member names a real field and whether the
//! literal fits its type is decided later by the compiler.

use super::error::PredicateError;
use super::lexer::{tokenize, Spanned, Token};
use super::types::CompareOp;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Int(i64),
    Bool(bool),
    Null,
}

impl Literal {
    pub fn describe(&self) -> String {
        match self {
            Literal::Str(s) => format!("string {:?}", s),
            Literal::Int(i) => format!("number {}", i),
            Literal::Bool(b) => format!("boolean {}", b),
            Literal::Null => "null".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub field: String,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Member(Member),
    Compare { member: Member, op: CompareOp, literal: Literal },
    Method { member: Member, method: String, argument: Literal },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

enum Operand {
    Literal(Literal, usize),
    Member(Member),
    Method(Member, String, Literal),
}

pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    /// Lambda parameter name; `None` when the expression has no `x =>` head
    param: Option<String>,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    /// Parse `input`, allowing at most `max_depth` nested `(` or `!` levels.
    pub fn parse(input: &str, max_depth: usize) -> Result<Expr, PredicateError> {
        let mut parser = Self { tokens: tokenize(input)?, pos: 0, param: None, depth: 0, max_depth };

        let head = match (&parser.peek().token, &parser.peek_at(1).token) {
            (Token::Ident(name), Token::Arrow) => Some(name.clone()),
            _ => None,
        };
        if let Some(name) = head {
            parser.param = Some(name);
            parser.pos += 2;
        }

        let expr = parser.parse_or()?;
        let trailing = parser.peek();
        if trailing.token != Token::Eof {
            return Err(PredicateError::syntax(
                trailing.position,
                format!("unexpected {} after expression", trailing.token.describe()),
            ));
        }
        Ok(expr)
    }

    fn peek(&self) -> &Spanned {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Spanned {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + offset).min(last)]
    }

    fn advance(&mut self) -> Spanned {
        let token = self.peek().clone();
        if token.token != Token::Eof {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<Spanned, PredicateError> {
        let next = self.advance();
        if next.token == expected {
            Ok(next)
        } else {
            Err(PredicateError::syntax(
                next.position,
                format!("expected {}, found {}", expected.describe(), next.token.describe()),
            ))
        }
    }

    fn parse_or(&mut self) -> Result<Expr, PredicateError> {
        let mut left = self.parse_and()?;
        while self.peek().token == Token::Or {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, PredicateError> {
        let mut left = self.parse_unary()?;
        while self.peek().token == Token::And {
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, PredicateError> {
        match self.peek().token {
            Token::Not => {
                self.descend()?;
                self.advance();
                let inner = self.parse_unary();
                self.depth -= 1;
                Ok(Expr::Not(Box::new(inner?)))
            }
            Token::LParen => {
                self.descend()?;
                self.advance();
                let inner = self.parse_or();
                self.depth -= 1;
                let inner = inner?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            _ => self.parse_comparison(),
        }
    }

    /// Recursion guard: every `(` and `!` costs one level.
    fn descend(&mut self) -> Result<(), PredicateError> {
        if self.depth >= self.max_depth {
            return Err(PredicateError::TooDeep { position: self.peek().position, max: self.max_depth });
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_comparison(&mut self) -> Result<Expr, PredicateError> {
        let left = self.parse_operand()?;

        let op = match self.peek().token {
            Token::Compare(op) => op,
            _ => {
                return Ok(match left {
                    Operand::Literal(literal, _) => Expr::Literal(literal),
                    Operand::Member(member) => Expr::Member(member),
                    Operand::Method(member, method, argument) => Expr::Method { member, method, argument },
                })
            }
        };
        let op_position = self.advance().position;
        let right = self.parse_operand()?;

        match (left, right) {
            (Operand::Member(member), Operand::Literal(literal, _)) => Ok(Expr::Compare { member, op, literal }),
            (Operand::Literal(literal, _), Operand::Member(member)) => {
                Ok(Expr::Compare { member, op: op.flip(), literal })
            }
            (Operand::Member(_), Operand::Member(_)) => Err(PredicateError::UnsupportedOperator(format!(
                "comparing two fields with '{}' is not supported",
                op.symbol()
            ))),
            (Operand::Method(..), _) | (_, Operand::Method(..)) => Err(PredicateError::syntax(
                op_position,
                format!("method results cannot be compared with '{}'", op.symbol()),
            )),
            (Operand::Literal(_, position), Operand::Literal(..)) => {
                Err(PredicateError::syntax(position, "comparison must reference a field"))
            }
        }
    }

    fn parse_operand(&mut self) -> Result<Operand, PredicateError> {
        let next = self.advance();
        match next.token {
            Token::Str(s) => Ok(Operand::Literal(Literal::Str(s), next.position)),
            Token::Int(i) => Ok(Operand::Literal(Literal::Int(i), next.position)),
            Token::True => Ok(Operand::Literal(Literal::Bool(true), next.position)),
            Token::False => Ok(Operand::Literal(Literal::Bool(false), next.position)),
            Token::Null => Ok(Operand::Literal(Literal::Null, next.position)),
            Token::Ident(name) => self.parse_member(name, next.position),
            other => Err(PredicateError::syntax(
                next.position,
                format!("expected a field or literal, found {}", other.describe()),
            )),
        }
    }

    fn parse_member(&mut self, head: String, position: usize) -> Result<Operand, PredicateError> {
        let member = match self.param.clone() {
            Some(param) => {
                if head != param {
                    return Err(PredicateError::syntax(
                        position,
                        format!("unknown identifier '{}'; fields are accessed as {}.Field", head, param),
                    ));
                }
                self.expect(Token::Dot)?;
                self.member_name()?
            }
            // Implicit parameter: bare `Field` or `it.Field`
            None if head == "it" && self.peek().token == Token::Dot => {
                self.advance();
                self.member_name()?
            }
            None => Member { field: head, position },
        };

        if self.peek().token != Token::Dot {
            return Ok(Operand::Member(member));
        }
        self.advance();

        let method = self.advance();
        let method_name = match method.token {
            Token::Ident(name) => name,
            other => {
                return Err(PredicateError::syntax(
                    method.position,
                    format!("expected a method name, found {}", other.describe()),
                ))
            }
        };
        self.expect(Token::LParen)?;
        let argument = match self.parse_operand()? {
            Operand::Literal(literal, _) => literal,
            _ => {
                return Err(PredicateError::syntax(
                    method.position,
                    format!("{} expects a literal argument", method_name),
                ))
            }
        };
        self.expect(Token::RParen)?;
        Ok(Operand::Method(member, method_name, argument))
    }

    fn member_name(&mut self) -> Result<Member, PredicateError> {
        let next = self.advance();
        match next.token {
            Token::Ident(field) => Ok(Member { field, position: next.position }),
            other => Err(PredicateError::syntax(
                next.position,
                format!("expected a field name, found {}", other.describe()),
            )),
        }
    }
}
