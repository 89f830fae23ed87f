use crate::expr::ast::{BinOp, Builtin, Clause, CmpOp, CompKind, Expr, Method, UnaryOp};
use crate::expr::error::CompileError;
use crate::expr::lexer::{tokenize, Spanned, Token};
use crate::expr::value::Value;

/// Deepest nesting of brackets, calls, unary operators, conditionals and
/// binary-operator chains accepted in one expression.
pub const MAX_DEPTH: usize = 64;

/// Parse one expression. Trailing tokens are a syntax error.
pub fn parse(src: &str) -> Result<Expr, CompileError> {
    let tokens = tokenize(src)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };

    if parser.at(&Token::Eof) {
        return Err(parser.error("empty expression"));
    }

    let expr = parser.expression()?;
    if !parser.at(&Token::Eof) {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].token
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].token
    }

    fn offset(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].pos
    }

    fn at(&self, token: &Token) -> bool {
        self.peek() == token
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.at(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<(), CompileError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {what}, found {:?}", self.peek())))
        }
    }

    fn error(&self, message: &str) -> CompileError {
        CompileError::Syntax {
            pos: self.offset(),
            message: message.to_string(),
        }
    }

    fn descend(&mut self) -> Result<(), CompileError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CompileError::TooDeep {
                pos: self.offset(),
                limit: MAX_DEPTH,
            });
        }
        Ok(())
    }

    fn ascend(&mut self, levels: usize) {
        self.depth -= levels;
    }

    fn nested<T>(
        &mut self,
        inner: impl FnOnce(&mut Self) -> Result<T, CompileError>,
    ) -> Result<T, CompileError> {
        self.descend()?;
        let out = inner(self)?;
        self.ascend(1);
        Ok(out)
    }

    fn expression(&mut self) -> Result<Expr, CompileError> {
        let value = self.or_expr()?;
        if self.eat(&Token::If) {
            let cond = self.or_expr()?;
            self.expect(&Token::Else, "'else'")?;
            let otherwise = self.nested(Self::expression)?;
            return Ok(Expr::IfElse {
                cond: Box::new(cond),
                then: Box::new(value),
                otherwise: Box::new(otherwise),
            });
        }
        Ok(value)
    }

    // `a or b or c` stays one flat node however long the chain is.
    fn or_expr(&mut self) -> Result<Expr, CompileError> {
        let first = self.and_expr()?;
        if !self.at(&Token::Or) {
            return Ok(first);
        }
        let mut operands = vec![first];
        while self.eat(&Token::Or) {
            operands.push(self.and_expr()?);
        }
        Ok(Expr::Or(operands))
    }

    fn and_expr(&mut self) -> Result<Expr, CompileError> {
        let first = self.not_expr()?;
        if !self.at(&Token::And) {
            return Ok(first);
        }
        let mut operands = vec![first];
        while self.eat(&Token::And) {
            operands.push(self.not_expr()?);
        }
        Ok(Expr::And(operands))
    }

    fn not_expr(&mut self) -> Result<Expr, CompileError> {
        if self.eat(&Token::Not) {
            let operand = self.nested(Self::not_expr)?;
            return Ok(Expr::Not(Box::new(operand)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, CompileError> {
        let first = self.bit_or()?;
        let mut rest = Vec::new();

        loop {
            let op = match (self.peek(), self.peek_at(1)) {
                (Token::Eq, _) => CmpOp::Eq,
                (Token::Ne, _) => CmpOp::Ne,
                (Token::Lt, _) => CmpOp::Lt,
                (Token::Le, _) => CmpOp::Le,
                (Token::Gt, _) => CmpOp::Gt,
                (Token::Ge, _) => CmpOp::Ge,
                (Token::In, _) => CmpOp::In,
                (Token::Not, Token::In) => CmpOp::NotIn,
                _ => break,
            };
            if op == CmpOp::NotIn {
                self.advance();
            }
            self.advance();
            rest.push((op, self.bit_or()?));
        }

        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare {
                first: Box::new(first),
                rest,
            })
        }
    }

    fn binary_level(
        &mut self,
        ops: &[(Token, BinOp)],
        next: fn(&mut Self) -> Result<Expr, CompileError>,
    ) -> Result<Expr, CompileError> {
        let mut left = next(self)?;
        // Each fold deepens the left spine of the tree.
        let mut folds = 0;
        'outer: loop {
            for (token, op) in ops {
                if self.eat(token) {
                    self.descend()?;
                    folds += 1;
                    let right = next(self)?;
                    left = Expr::Binary {
                        op: *op,
                        left: Box::new(left),
                        right: Box::new(right),
                    };
                    continue 'outer;
                }
            }
            self.ascend(folds);
            return Ok(left);
        }
    }

    fn bit_or(&mut self) -> Result<Expr, CompileError> {
        self.binary_level(&[(Token::Pipe, BinOp::BitOr)], Self::bit_xor)
    }

    fn bit_xor(&mut self) -> Result<Expr, CompileError> {
        self.binary_level(&[(Token::Caret, BinOp::BitXor)], Self::bit_and)
    }

    fn bit_and(&mut self) -> Result<Expr, CompileError> {
        self.binary_level(&[(Token::Amp, BinOp::BitAnd)], Self::arith)
    }

    fn arith(&mut self) -> Result<Expr, CompileError> {
        self.binary_level(
            &[(Token::Plus, BinOp::Add), (Token::Minus, BinOp::Sub)],
            Self::term,
        )
    }

    fn term(&mut self) -> Result<Expr, CompileError> {
        self.binary_level(
            &[
                (Token::Star, BinOp::Mul),
                (Token::DoubleSlash, BinOp::FloorDiv),
                (Token::Slash, BinOp::Div),
                (Token::Percent, BinOp::Mod),
            ],
            Self::factor,
        )
    }

    fn factor(&mut self) -> Result<Expr, CompileError> {
        let op = match self.peek() {
            Token::Minus => UnaryOp::Neg,
            Token::Plus => UnaryOp::Pos,
            _ => return self.postfix(),
        };
        self.advance();

        // The one literal whose magnitude only fits once negated.
        if op == UnaryOp::Neg
            && self.at(&Token::Int(i64::MIN.unsigned_abs()))
            && !matches!(self.peek_at(1), Token::LBracket | Token::Dot)
        {
            self.advance();
            return Ok(Expr::Literal(Value::Int(i64::MIN)));
        }

        let operand = self.nested(Self::factor)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn postfix(&mut self) -> Result<Expr, CompileError> {
        let mut expr = self.atom()?;
        // Like binary folds, every trailer wraps the expression built so far.
        let mut trailers = 0;

        loop {
            if self.at(&Token::LBracket) || self.at(&Token::Dot) {
                self.descend()?;
                trailers += 1;
            }

            if self.eat(&Token::LBracket) {
                expr = self.subscript(expr)?;
            } else if self.eat(&Token::Dot) {
                let name = match self.advance() {
                    Token::Ident(name) => name,
                    other => return Err(self.error(&format!("expected attribute name, found {other:?}"))),
                };
                let method = Method::from_name(&name)
                    .ok_or_else(|| CompileError::UnsupportedAttribute(name.clone()))?;
                if !self.eat(&Token::LParen) {
                    return Err(CompileError::UnsupportedAttribute(name));
                }
                let args = self.nested(Self::call_args)?;
                method.check_arity(args.len())?;
                expr = Expr::Method {
                    receiver: Box::new(expr),
                    method,
                    args,
                };
            } else {
                self.ascend(trailers);
                return Ok(expr);
            }
        }
    }

    // Called after '['.
    fn subscript(&mut self, target: Expr) -> Result<Expr, CompileError> {
        let lo = if self.at(&Token::Colon) {
            None
        } else {
            Some(self.expression()?)
        };

        if self.eat(&Token::Colon) {
            let hi = if self.at(&Token::RBracket) {
                None
            } else {
                Some(Box::new(self.expression()?))
            };
            self.expect(&Token::RBracket, "']'")?;
            return Ok(Expr::Slice {
                target: Box::new(target),
                lo: lo.map(Box::new),
                hi,
            });
        }

        self.expect(&Token::RBracket, "']'")?;
        let index = lo.ok_or_else(|| self.error("empty subscript"))?;
        Ok(Expr::Subscript {
            target: Box::new(target),
            index: Box::new(index),
        })
    }

    // Called after '('. A single generator argument is allowed without its own parens.
    fn call_args(&mut self) -> Result<Vec<Expr>, CompileError> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }

        let first = self.expression()?;
        if self.at(&Token::For) {
            let comp = self.comprehension(CompKind::Generator, first)?;
            self.expect(&Token::RParen, "')'")?;
            return Ok(vec![comp]);
        }
        args.push(first);

        while self.eat(&Token::Comma) {
            if self.at(&Token::RParen) {
                break;
            }
            args.push(self.expression()?);
        }
        self.expect(&Token::RParen, "')'")?;
        Ok(args)
    }

    fn comprehension(&mut self, kind: CompKind, element: Expr) -> Result<Expr, CompileError> {
        let mut clauses = Vec::new();

        // Clauses run as nested loops, one level each.
        while self.eat(&Token::For) {
            self.descend()?;
            let var = match self.advance() {
                Token::Ident(name) => name,
                other => return Err(self.error(&format!("expected loop variable, found {other:?}"))),
            };
            self.expect(&Token::In, "'in'")?;
            let iter = self.or_expr()?;
            clauses.push(Clause::For { var, iter });

            while self.eat(&Token::If) {
                self.descend()?;
                clauses.push(Clause::If(self.or_expr()?));
            }
        }
        self.ascend(clauses.len());

        Ok(Expr::Comprehension {
            kind,
            element: Box::new(element),
            clauses,
        })
    }

    fn atom(&mut self) -> Result<Expr, CompileError> {
        let offset = self.offset();
        match self.advance() {
            Token::Int(n) => i64::try_from(n)
                .map(|i| Expr::Literal(Value::Int(i)))
                .map_err(|_| CompileError::Syntax {
                    pos: offset,
                    message: format!("integer literal {n} is too large"),
                }),
            Token::Float(f) => Ok(Expr::Literal(Value::Float(f))),
            Token::Str(s) => {
                let mut text = s;
                // Adjacent string literals concatenate.
                while let Token::Str(next) = self.peek() {
                    text.push_str(next);
                    self.advance();
                }
                Ok(Expr::Literal(Value::Str(text)))
            }
            Token::True => Ok(Expr::Literal(Value::Bool(true))),
            Token::False => Ok(Expr::Literal(Value::Bool(false))),
            Token::Ident(name) => {
                if self.eat(&Token::LParen) {
                    let func = Builtin::from_name(&name)
                        .ok_or(CompileError::UnknownFunction(name))?;
                    let args = self.nested(Self::call_args)?;
                    func.check_arity(args.len())?;
                    Ok(Expr::Call { func, args })
                } else {
                    Ok(Expr::Name(name))
                }
            }
            Token::LParen => self.nested(Self::paren),
            Token::LBracket => self.nested(Self::bracket),
            Token::LBrace => self.nested(Self::brace),
            other => Err(CompileError::Syntax {
                pos: offset,
                message: format!("unexpected token {other:?}"),
            }),
        }
    }

    // Called after '('.
    fn paren(&mut self) -> Result<Expr, CompileError> {
        if self.eat(&Token::RParen) {
            return Ok(Expr::Tuple(Vec::new()));
        }

        let first = self.expression()?;
        if self.at(&Token::For) {
            let comp = self.comprehension(CompKind::Generator, first)?;
            self.expect(&Token::RParen, "')'")?;
            return Ok(comp);
        }
        if self.eat(&Token::RParen) {
            return Ok(first);
        }

        self.expect(&Token::Comma, "',' or ')'")?;
        let mut items = vec![first];
        while !self.at(&Token::RParen) {
            items.push(self.expression()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RParen, "')'")?;
        Ok(Expr::Tuple(items))
    }

    // Called after '['.
    fn bracket(&mut self) -> Result<Expr, CompileError> {
        if self.eat(&Token::RBracket) {
            return Ok(Expr::List(Vec::new()));
        }

        let first = self.expression()?;
        if self.at(&Token::For) {
            let comp = self.comprehension(CompKind::List, first)?;
            self.expect(&Token::RBracket, "']'")?;
            return Ok(comp);
        }

        let items = self.sequence_tail(first, &Token::RBracket)?;
        self.expect(&Token::RBracket, "']'")?;
        Ok(Expr::List(items))
    }

    // Called after '{'. `{}` is an empty dict, as in Python.
    fn brace(&mut self) -> Result<Expr, CompileError> {
        if self.eat(&Token::RBrace) {
            return Ok(Expr::Dict(Vec::new()));
        }

        let first = self.expression()?;

        if self.eat(&Token::Colon) {
            let mut entries = vec![(first, self.expression()?)];
            while self.eat(&Token::Comma) {
                if self.at(&Token::RBrace) {
                    break;
                }
                let key = self.expression()?;
                self.expect(&Token::Colon, "':'")?;
                entries.push((key, self.expression()?));
            }
            self.expect(&Token::RBrace, "'}'")?;
            return Ok(Expr::Dict(entries));
        }

        if self.at(&Token::For) {
            let comp = self.comprehension(CompKind::Set, first)?;
            self.expect(&Token::RBrace, "'}'")?;
            return Ok(comp);
        }

        let items = self.sequence_tail(first, &Token::RBrace)?;
        self.expect(&Token::RBrace, "'}'")?;
        Ok(Expr::Set(items))
    }

    fn sequence_tail(&mut self, first: Expr, close: &Token) -> Result<Vec<Expr>, CompileError> {
        let mut items = vec![first];
        while self.eat(&Token::Comma) {
            if self.at(close) {
                break;
            }
            items.push(self.expression()?);
        }
        Ok(items)
    }
}
