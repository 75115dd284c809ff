use super::error::PredicateError;
use super::types::CompareOp;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Str(String),
    Int(i64),
    True,
    False,
    Null,
    Dot,
    Arrow,
    LParen,
    RParen,
    Compare(CompareOp),
    And,
    Or,
    Not,
    Eof,
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(s) => format!("identifier '{}'", s),
            Token::Str(s) => format!("string {:?}", s),
            Token::Int(i) => format!("number {}", i),
            Token::True => "'true'".to_string(),
            Token::False => "'false'".to_string(),
            Token::Null => "'null'".to_string(),
            Token::Dot => "'.'".to_string(),
            Token::Arrow => "'=>'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Compare(op) => format!("'{}'", op.symbol()),
            Token::And => "'&&'".to_string(),
            Token::Or => "'||'".to_string(),
            Token::Not => "'!'".to_string(),
            Token::Eof => "end of expression".to_string(),
        }
    }
}

/// Token plus the character offset it starts at
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

pub fn tokenize(input: &str) -> Result<Vec<Spanned>, PredicateError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let peek = chars.get(i + 1).copied();
        let token = match c {
            '.' => { i += 1; Token::Dot }
            '(' => { i += 1; Token::LParen }
            ')' => { i += 1; Token::RParen }
            '=' if peek == Some('>') => { i += 2; Token::Arrow }
            '=' if peek == Some('=') => { i += 2; Token::Compare(CompareOp::Eq) }
            '=' => { i += 1; Token::Compare(CompareOp::Eq) }
            '!' if peek == Some('=') => { i += 2; Token::Compare(CompareOp::Ne) }
            '!' => { i += 1; Token::Not }
            '<' if peek == Some('=') => { i += 2; Token::Compare(CompareOp::Lte) }
            '<' if peek == Some('>') => { i += 2; Token::Compare(CompareOp::Ne) }
            '<' => { i += 1; Token::Compare(CompareOp::Lt) }
            '>' if peek == Some('=') => { i += 2; Token::Compare(CompareOp::Gte) }
            '>' => { i += 1; Token::Compare(CompareOp::Gt) }
            '&' if peek == Some('&') => { i += 2; Token::And }
            '|' if peek == Some('|') => { i += 2; Token::Or }
            '"' => {
                let (value, next) = read_string(&chars, i)?;
                i = next;
                Token::Str(value)
            }
            '-' if peek.map(|p| p.is_ascii_digit()).unwrap_or(false) => {
                let (value, next) = read_number(&chars, i)?;
                i = next;
                Token::Int(value)
            }
            c if c.is_ascii_digit() => {
                let (value, next) = read_number(&chars, i)?;
                i = next;
                Token::Int(value)
            }
            c if c.is_alphabetic() || c == '_' => {
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                match word.as_str() {
                    "true" => Token::True,
                    "false" => Token::False,
                    "null" => Token::Null,
                    "and" | "AND" => Token::And,
                    "or" | "OR" => Token::Or,
                    "not" | "NOT" => Token::Not,
                    _ => Token::Ident(word),
                }
            }
            '\'' => {
                return Err(PredicateError::syntax(start, "string literals must use double quotes"));
            }
            other => {
                return Err(PredicateError::syntax(start, format!("unexpected character '{}'", other)));
            }
        };

        tokens.push(Spanned { token, position: start });
    }

    tokens.push(Spanned { token: Token::Eof, position: chars.len() });
    Ok(tokens)
}

fn read_string(chars: &[char], start: usize) -> Result<(String, usize), PredicateError> {
    let mut value = String::new();
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '"' => return Ok((value, i + 1)),
            '\\' => {
                let escaped = chars
                    .get(i + 1)
                    .ok_or_else(|| PredicateError::syntax(i, "unterminated escape sequence"))?;
                value.push(match escaped {
                    '"' => '"',
                    '\\' => '\\',
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => {
                        return Err(PredicateError::syntax(i, format!("unknown escape sequence '\\{}'", other)))
                    }
                });
                i += 2;
            }
            c => {
                value.push(c);
                i += 1;
            }
        }
    }
    Err(PredicateError::syntax(start, "unterminated string literal"))
}

fn read_number(chars: &[char], start: usize) -> Result<(i64, usize), PredicateError> {
    let mut i = start + 1;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    if i < chars.len() && chars[i] == '.' && chars.get(i + 1).map(|c| c.is_ascii_digit()).unwrap_or(false) {
        return Err(PredicateError::syntax(start, "decimal literals are not supported"));
    }
    // Integer suffixes as written in C#-style lambdas (12345L)
    let digits: String = chars[start..i].iter().collect();
    if i < chars.len() && (chars[i] == 'L' || chars[i] == 'l') {
        i += 1;
    }
    let value = digits
        .parse::<i64>()
        .map_err(|_| PredicateError::syntax(start, format!("number {} is out of range", digits)))?;
    Ok((value, i))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        tokenize(input).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn tokenizes_lambda_comparison() {
        assert_eq!(
            kinds(r#"x => x.ReasonForRemoval == "DEA""#),
            vec![
                Token::Ident("x".into()),
                Token::Arrow,
                Token::Ident("x".into()),
                Token::Dot,
                Token::Ident("ReasonForRemoval".into()),
                Token::Compare(CompareOp::Eq),
                Token::Str("DEA".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn tokenizes_operators_and_keywords() {
        assert_eq!(
            kinds("a <= -2 && b <> 3L or !c"),
            vec![
                Token::Ident("a".into()),
                Token::Compare(CompareOp::Lte),
                Token::Int(-2),
                Token::And,
                Token::Ident("b".into()),
                Token::Compare(CompareOp::Ne),
                Token::Int(3),
                Token::Or,
                Token::Not,
                Token::Ident("c".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn string_escapes() {
        assert_eq!(kinds(r#""a\"b\\c""#)[0], Token::Str("a\"b\\c".into()));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(tokenize(r#""open"#), Err(PredicateError::Syntax { .. })));
        assert!(matches!(tokenize("x.Id == 1.5"), Err(PredicateError::Syntax { .. })));
        assert!(matches!(tokenize("x.Name == 'a'"), Err(PredicateError::Syntax { .. })));
        assert!(matches!(tokenize("x.Id == 99999999999999999999"), Err(PredicateError::Syntax { .. })));
        assert!(matches!(tokenize("x.Id ; drop"), Err(PredicateError::Syntax { position: 5, .. })));
    }
}
