//! Recursive-descent statement parser
//!
//! Precedence, lowest first: OR, XOR, AND, NOT, comparison, predicate,
//! then the bit levels `|`, `&`, `+ -`, `* /`, `^`, and finally prefix
//! operators and operands.

use crate::ast::{
    ArithmeticOp, BitExpr, BitOp, ComparisonOp, Expr, FunctionCall, LimitClause, Lit, OrderBy,
    Predicate, PrefixOp, SelectTerm, SimpleExpr, SortDirection, Statement,
};

use super::errors::{ParseError, ParseResult};
use super::lexer::{Keyword, Lexer, Token, TokenKind};

/// Parses one statement
pub fn parse(src: &str) -> ParseResult<Statement> {
    let tokens = Lexer::new(src).tokenize()?;
    Parser::new(tokens).statement()
}

/// Parses a standalone expression
pub fn parse_expr(src: &str) -> ParseResult<Expr> {
    let tokens = Lexer::new(src).tokenize()?;
    let mut parser = Parser::new(tokens);
    let expr = parser.expr()?;
    parser.expect_eof()?;
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        // tokenize() always ends with Eof, and advance() never moves past it
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind_at(&self, ahead: usize) -> &TokenKind {
        let idx = (self.pos + ahead).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn at_keyword(&self, kw: Keyword) -> bool {
        self.peek().kind == TokenKind::Keyword(kw)
    }

    fn eat_keyword(&mut self, kw: Keyword) -> bool {
        if self.at_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if &self.peek().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: token.kind.to_string(),
            offset: token.offset,
        }
    }

    fn expect_keyword(&mut self, kw: Keyword) -> ParseResult<()> {
        if self.eat_keyword(kw) {
            Ok(())
        } else {
            Err(self.unexpected(kw.as_str()))
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<()> {
        if self.eat(&kind) {
            Ok(())
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    fn expect_eof(&self) -> ParseResult<()> {
        if self.peek().kind == TokenKind::Eof {
            Ok(())
        } else {
            Err(self.unexpected("end of input"))
        }
    }

    fn statement(&mut self) -> ParseResult<Statement> {
        self.expect_keyword(Keyword::Select)?;
        let distinct = self.eat_keyword(Keyword::Distinct);

        let mut select = vec![self.select_term()?];
        while self.eat(&TokenKind::Comma) {
            select.push(self.select_term()?);
        }

        let mut stmt = Statement::new(select);
        stmt.distinct = distinct;

        if self.eat_keyword(Keyword::Where) {
            stmt.where_clause = Some(self.expr()?);
        }
        if self.eat_keyword(Keyword::Group) {
            self.expect_keyword(Keyword::By)?;
            stmt.group_by = Some(self.expr()?);
            self.reject_second_term("multiple GROUP BY terms")?;
        }
        if self.eat_keyword(Keyword::Having) {
            stmt.having = Some(self.expr()?);
        }
        if self.eat_keyword(Keyword::Order) {
            self.expect_keyword(Keyword::By)?;
            let expr = self.expr()?;
            let direction = if self.eat_keyword(Keyword::Desc) {
                SortDirection::Desc
            } else {
                self.eat_keyword(Keyword::Asc);
                SortDirection::Asc
            };
            stmt.order_by = Some(OrderBy { expr, direction });
            self.reject_second_term("multiple ORDER BY terms")?;
        }
        if self.eat_keyword(Keyword::Limit) {
            let limit = self.signed_int()?;
            let offset = if self.eat_keyword(Keyword::Offset) {
                Some(self.signed_int()?)
            } else {
                None
            };
            stmt.limit = Some(LimitClause { limit, offset });
        }

        self.eat(&TokenKind::Semicolon);
        self.expect_eof()?;
        Ok(stmt)
    }

    fn reject_second_term(&self, what: &str) -> ParseResult<()> {
        if self.peek().kind == TokenKind::Comma {
            return Err(ParseError::Unsupported {
                what: what.to_string(),
                offset: self.peek().offset,
            });
        }
        Ok(())
    }

    fn select_term(&mut self) -> ParseResult<SelectTerm> {
        let expr = self.expr()?;
        if self.eat_keyword(Keyword::As) {
            let token = self.advance();
            return match token.kind {
                TokenKind::Ident(alias) => Ok(SelectTerm::aliased(expr, alias)),
                other => Err(ParseError::UnexpectedToken {
                    expected: "alias".to_string(),
                    found: other.to_string(),
                    offset: token.offset,
                }),
            };
        }
        Ok(SelectTerm::new(expr))
    }

    fn signed_int(&mut self) -> ParseResult<i64> {
        let negative = self.eat(&TokenKind::Minus);
        let token = self.advance();
        match token.kind {
            TokenKind::Int(v) if negative => Ok(-v),
            TokenKind::Int(v) => Ok(v),
            other => Err(ParseError::UnexpectedToken {
                expected: "integer".to_string(),
                found: other.to_string(),
                offset: token.offset,
            }),
        }
    }

    fn expr(&mut self) -> ParseResult<Expr> {
        let mut left = self.xor_expr()?;
        while self.eat_keyword(Keyword::Or) {
            let right = self.xor_expr()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn xor_expr(&mut self) -> ParseResult<Expr> {
        let mut left = self.and_expr()?;
        while self.eat_keyword(Keyword::Xor) {
            let right = self.and_expr()?;
            left = Expr::Xor(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> ParseResult<Expr> {
        let mut left = self.not_expr()?;
        while self.eat_keyword(Keyword::And) {
            let right = self.not_expr()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn not_expr(&mut self) -> ParseResult<Expr> {
        if self.eat_keyword(Keyword::Not) {
            return Ok(Expr::Not(Box::new(self.not_expr()?)));
        }
        self.comparison()
    }

    fn comparison_op(&self) -> Option<ComparisonOp> {
        match self.peek().kind {
            TokenKind::Eq => Some(ComparisonOp::Equal),
            TokenKind::Ne => Some(ComparisonOp::NotEqual),
            TokenKind::Gt => Some(ComparisonOp::GreaterThan),
            TokenKind::Ge => Some(ComparisonOp::GreaterEqual),
            TokenKind::Lt => Some(ComparisonOp::LessThan),
            TokenKind::Le => Some(ComparisonOp::LessEqual),
            _ => None,
        }
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut left = Expr::Predicate(self.predicate()?);
        while let Some(op) = self.comparison_op() {
            self.advance();
            let right = self.predicate()?;
            left = Expr::Comparison {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn predicate(&mut self) -> ParseResult<Predicate> {
        let target = self.bit_or()?;

        let negated = self.at_keyword(Keyword::Not)
            && matches!(
                self.peek_kind_at(1),
                TokenKind::Keyword(Keyword::In | Keyword::Between | Keyword::Like)
            );
        if negated {
            self.advance();
        }

        if self.eat_keyword(Keyword::In) {
            self.expect(TokenKind::LParen)?;
            let mut list = vec![self.expr()?];
            while self.eat(&TokenKind::Comma) {
                list.push(self.expr()?);
            }
            self.expect(TokenKind::RParen)?;
            return Ok(Predicate::In {
                negated,
                target,
                list,
            });
        }
        if self.eat_keyword(Keyword::Between) {
            let lower = self.bit_or()?;
            self.expect_keyword(Keyword::And)?;
            let upper = self.predicate()?;
            return Ok(Predicate::Between {
                negated,
                target,
                lower,
                upper: Box::new(upper),
            });
        }
        if self.eat_keyword(Keyword::Like) {
            let pattern = self.simple()?;
            return Ok(Predicate::Like {
                negated,
                target,
                pattern,
            });
        }
        Ok(Predicate::Bit(target))
    }

    fn bit_level(
        &mut self,
        next: fn(&mut Self) -> ParseResult<BitExpr>,
        op_of: fn(&TokenKind) -> Option<BitExprOp>,
    ) -> ParseResult<BitExpr> {
        let mut left = next(self)?;
        while let Some(op) = op_of(&self.peek().kind) {
            self.advance();
            let right = Box::new(next(self)?);
            let l = Box::new(left);
            left = match op {
                BitExprOp::Bit(op) => BitExpr::Bit {
                    op,
                    left: l,
                    right,
                },
                BitExprOp::Arithmetic(op) => BitExpr::Arithmetic {
                    op,
                    left: l,
                    right,
                },
            };
        }
        Ok(left)
    }

    fn bit_or(&mut self) -> ParseResult<BitExpr> {
        self.bit_level(Self::bit_and, |k| match k {
            TokenKind::Pipe => Some(BitExprOp::Bit(BitOp::Or)),
            _ => None,
        })
    }

    fn bit_and(&mut self) -> ParseResult<BitExpr> {
        self.bit_level(Self::additive, |k| match k {
            TokenKind::Amp => Some(BitExprOp::Bit(BitOp::And)),
            _ => None,
        })
    }

    fn additive(&mut self) -> ParseResult<BitExpr> {
        self.bit_level(Self::multiplicative, |k| match k {
            TokenKind::Plus => Some(BitExprOp::Arithmetic(ArithmeticOp::Add)),
            TokenKind::Minus => Some(BitExprOp::Arithmetic(ArithmeticOp::Subtract)),
            _ => None,
        })
    }

    fn multiplicative(&mut self) -> ParseResult<BitExpr> {
        self.bit_level(Self::bit_xor, |k| match k {
            TokenKind::Star => Some(BitExprOp::Arithmetic(ArithmeticOp::Multiply)),
            TokenKind::Slash => Some(BitExprOp::Arithmetic(ArithmeticOp::Divide)),
            _ => None,
        })
    }

    fn bit_xor(&mut self) -> ParseResult<BitExpr> {
        self.bit_level(
            |p| p.simple().map(BitExpr::Simple),
            |k| match k {
                TokenKind::Caret => Some(BitExprOp::Bit(BitOp::Xor)),
                _ => None,
            },
        )
    }

    fn simple(&mut self) -> ParseResult<SimpleExpr> {
        let prefix = match self.peek().kind {
            TokenKind::Plus => Some(PrefixOp::Plus),
            TokenKind::Minus => Some(PrefixOp::Minus),
            TokenKind::Tilde => Some(PrefixOp::BitNot),
            TokenKind::Keyword(Keyword::Not) => Some(PrefixOp::Not),
            _ => None,
        };
        if let Some(op) = prefix {
            self.advance();
            let expr = Box::new(self.simple()?);
            return Ok(SimpleExpr::Prefix { op, expr });
        }

        let token = self.advance();
        match token.kind {
            TokenKind::Int(v) => Ok(SimpleExpr::Lit(Lit::Int(v))),
            TokenKind::Float(v) => Ok(SimpleExpr::Lit(Lit::Float(v))),
            TokenKind::Str(s) => Ok(SimpleExpr::Lit(Lit::String(s))),
            TokenKind::Ident(name) => {
                if !self.eat(&TokenKind::LParen) {
                    return Ok(SimpleExpr::Ident(name));
                }
                let mut args = Vec::new();
                if !self.eat(&TokenKind::RParen) {
                    args.push(self.expr()?);
                    while self.eat(&TokenKind::Comma) {
                        args.push(self.expr()?);
                    }
                    self.expect(TokenKind::RParen)?;
                }
                Ok(SimpleExpr::Call(FunctionCall { name, args }))
            }
            TokenKind::LParen => {
                let inner = self.expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(SimpleExpr::Paren(Box::new(inner)))
            }
            other => Err(ParseError::UnexpectedToken {
                expected: "expression".to_string(),
                found: other.to_string(),
                offset: token.offset,
            }),
        }
    }
}

#[derive(Clone, Copy)]
enum BitExprOp {
    Bit(BitOp),
    Arithmetic(ArithmeticOp),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_statement() {
        let stmt = parse(
            "SELECT DISTINCT name, sum(size) AS total WHERE size > 10 GROUP BY name \
             HAVING count(size) >= 2 ORDER BY total DESC LIMIT 5 OFFSET 1;",
        )
        .unwrap();

        assert!(stmt.distinct);
        assert_eq!(stmt.headers(), vec!["name".to_string(), "total".to_string()]);
        assert_eq!(stmt.where_clause.unwrap().to_string(), "size > 10");
        assert_eq!(stmt.group_by.unwrap().as_ident(), Some("name"));
        assert_eq!(stmt.having.unwrap().to_string(), "count(size) >= 2");
        let order = stmt.order_by.unwrap();
        assert!(order.is_descending());
        assert_eq!(order.expr.as_ident(), Some("total"));
        assert_eq!(
            stmt.limit,
            Some(LimitClause {
                limit: 5,
                offset: Some(1)
            })
        );
    }

    #[test]
    fn test_arithmetic_precedence() {
        let e = parse_expr("1 + 2 * 3").unwrap();
        match e {
            Expr::Predicate(Predicate::Bit(BitExpr::Arithmetic { op, right, .. })) => {
                assert_eq!(op, ArithmeticOp::Add);
                assert!(matches!(
                    *right,
                    BitExpr::Arithmetic {
                        op: ArithmeticOp::Multiply,
                        ..
                    }
                ));
            }
            other => panic!("unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_logical_precedence() {
        let e = parse_expr("a or b and not c").unwrap();
        match e {
            Expr::Or(_, right) => assert!(matches!(*right, Expr::And(_, _))),
            other => panic!("unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_negated_predicates() {
        let e = parse_expr("name not like 'a' ").unwrap();
        assert!(matches!(
            e,
            Expr::Predicate(Predicate::Like { negated: true, .. })
        ));

        let e = parse_expr("size not between 1 and 3").unwrap();
        assert_eq!(e.to_string(), "size not between 1 and 3");

        let e = parse_expr("size in (1, 2)").unwrap();
        assert_eq!(e.to_string(), "size in (1, 2)");
    }

    #[test]
    fn test_call_without_args() {
        let e = parse_expr("now()").unwrap();
        assert_eq!(e.to_string(), "now()");
    }

    #[test]
    fn test_multiple_group_by_unsupported() {
        let err = parse("select name group by name, size").unwrap_err();
        assert!(matches!(err, ParseError::Unsupported { offset: 25, .. }));

        let err = parse("select name order by name, size").unwrap_err();
        assert!(matches!(err, ParseError::Unsupported { .. }));
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        let err = parse("select name name").unwrap_err();
        assert_eq!(err.offset(), 12);
    }

    #[test]
    fn test_missing_select() {
        let err = parse("where size > 1").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { offset: 0, .. }));
    }

    #[test]
    fn test_negative_limit_is_parsed() {
        let stmt = parse("select name limit -1").unwrap();
        assert_eq!(stmt.limit.map(|l| l.limit), Some(-1));
    }
}
