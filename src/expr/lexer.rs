use crate::expr::error::CompileError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Unsigned; the parser applies a leading minus, so `-9223372036854775808` fits.
    Int(u64),
    Float(f64),
    Str(String),
    Ident(String),

    // Keywords
    And,
    Or,
    Not,
    In,
    If,
    Else,
    For,
    True,
    False,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,

    Eof,
}

/// A token with the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub pos: usize,
}

pub fn tokenize(src: &str) -> Result<Vec<Spanned>, CompileError> {
    let chars: Vec<(usize, char)> = src.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (pos, c) = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && peek_is_digit(&chars, i + 1)) {
            let (token, next) = number(&chars, i)?;
            tokens.push(Spanned { token, pos });
            i = next;
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].1.is_alphanumeric() || chars[i].1 == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().map(|(_, ch)| ch).collect();
            let token = match word.as_str() {
                "and" => Token::And,
                "or" => Token::Or,
                "not" => Token::Not,
                "in" => Token::In,
                "if" => Token::If,
                "else" => Token::Else,
                "for" => Token::For,
                "True" => Token::True,
                "False" => Token::False,
                _ => Token::Ident(word),
            };
            tokens.push(Spanned { token, pos });
            continue;
        }

        if c == '\'' || c == '"' {
            let quote = c;
            i += 1;
            let mut text = String::new();
            loop {
                let Some(&(_, ch)) = chars.get(i) else {
                    return Err(CompileError::UnterminatedString { pos });
                };
                i += 1;
                if ch == quote {
                    break;
                }
                if ch == '\\' {
                    let Some(&(_, escaped)) = chars.get(i) else {
                        return Err(CompileError::UnterminatedString { pos });
                    };
                    i += 1;
                    text.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        other => other,
                    });
                } else {
                    text.push(ch);
                }
            }
            tokens.push(Spanned { token: Token::Str(text), pos });
            continue;
        }

        let next = chars.get(i + 1).map(|(_, ch)| *ch);
        let (token, width) = match (c, next) {
            ('/', Some('/')) => (Token::DoubleSlash, 2),
            ('=', Some('=')) => (Token::Eq, 2),
            ('!', Some('=')) => (Token::Ne, 2),
            ('<', Some('=')) => (Token::Le, 2),
            ('>', Some('=')) => (Token::Ge, 2),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('%', _) => (Token::Percent, 1),
            ('&', _) => (Token::Amp, 1),
            ('|', _) => (Token::Pipe, 1),
            ('^', _) => (Token::Caret, 1),
            ('<', _) => (Token::Lt, 1),
            ('>', _) => (Token::Gt, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            ('[', _) => (Token::LBracket, 1),
            (']', _) => (Token::RBracket, 1),
            ('{', _) => (Token::LBrace, 1),
            ('}', _) => (Token::RBrace, 1),
            (',', _) => (Token::Comma, 1),
            (':', _) => (Token::Colon, 1),
            ('.', _) => (Token::Dot, 1),
            _ => return Err(CompileError::Lex { pos, ch: c }),
        };
        tokens.push(Spanned { token, pos });
        i += width;
    }

    tokens.push(Spanned {
        token: Token::Eof,
        pos: src.len(),
    });
    Ok(tokens)
}

fn peek_is_digit(chars: &[(usize, char)], i: usize) -> bool {
    chars.get(i).is_some_and(|(_, ch)| ch.is_ascii_digit())
}

fn skip_digits(chars: &[(usize, char)], mut i: usize) -> usize {
    while i < chars.len() && chars[i].1.is_ascii_digit() {
        i += 1;
    }
    i
}

// `12`, `1.5`, `.5`, `1.`, `1e3`, `2.5E-2`.
fn number(chars: &[(usize, char)], start: usize) -> Result<(Token, usize), CompileError> {
    let pos = chars[start].0;
    let mut i = skip_digits(chars, start);
    let mut is_float = false;

    if chars.get(i).is_some_and(|(_, ch)| *ch == '.')
        && !chars.get(i + 1).is_some_and(|(_, ch)| ch.is_alphabetic() || *ch == '_')
    {
        is_float = true;
        i = skip_digits(chars, i + 1);
    }

    if chars.get(i).is_some_and(|(_, ch)| matches!(ch, 'e' | 'E')) {
        let sign = usize::from(chars.get(i + 1).is_some_and(|(_, ch)| matches!(ch, '+' | '-')));
        if peek_is_digit(chars, i + 1 + sign) {
            is_float = true;
            i = skip_digits(chars, i + 1 + sign);
        }
    }

    let text: String = chars[start..i].iter().map(|(_, ch)| ch).collect();
    let token = if is_float {
        text.parse::<f64>()
            .map(Token::Float)
            .map_err(|e| CompileError::Syntax { pos, message: e.to_string() })?
    } else {
        text.parse::<u64>()
            .map(Token::Int)
            .map_err(|e| CompileError::Syntax { pos, message: e.to_string() })?
    };
    Ok((token, i))
}
