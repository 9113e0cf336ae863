//! Plural-Forms Rules
//!
//! Compiled catalogs describe their plural rules in the `Plural-Forms`
//! header, e.g. `nplurals=3; plural=(n%10==1 && n%100!=11 ? 0 : n%10>=2 &&
//! n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2);`. The expression is a small
//! C-like language over the single variable `n`; this module parses it once
//! at load time and evaluates it per lookup.

use crate::{I18nError, Result};

/// Longest accepted expression, in bytes.
const MAX_EXPRESSION_LEN: usize = 1024;

/// Deepest accepted nesting of parentheses, ternaries and unary operators.
const MAX_DEPTH: usize = 64;

/// Binary operators, loosest binding last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    fn apply(self, lhs: u64, rhs: u64) -> u64 {
        match self {
            BinaryOp::Mul => lhs.wrapping_mul(rhs),
            BinaryOp::Div => lhs.checked_div(rhs).unwrap_or(0),
            BinaryOp::Rem => lhs.checked_rem(rhs).unwrap_or(0),
            BinaryOp::Add => lhs.wrapping_add(rhs),
            BinaryOp::Sub => lhs.wrapping_sub(rhs),
            BinaryOp::Lt => (lhs < rhs) as u64,
            BinaryOp::Le => (lhs <= rhs) as u64,
            BinaryOp::Gt => (lhs > rhs) as u64,
            BinaryOp::Ge => (lhs >= rhs) as u64,
            BinaryOp::Eq => (lhs == rhs) as u64,
            BinaryOp::Ne => (lhs != rhs) as u64,
            // short-circuiting is handled by the evaluator
            BinaryOp::And => (lhs != 0 && rhs != 0) as u64,
            BinaryOp::Or => (lhs != 0 || rhs != 0) as u64,
        }
    }
}

/// Parsed plural-selection expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluralExpr {
    /// The count variable `n`
    N,
    /// Integer literal
    Const(u64),
    /// Logical negation `!e`
    Not(Box<PluralExpr>),
    /// Arithmetic negation `-e`
    Neg(Box<PluralExpr>),
    /// `lhs op rhs`
    Binary(BinaryOp, Box<PluralExpr>, Box<PluralExpr>),
    /// `cond ? then : otherwise`
    Ternary(Box<PluralExpr>, Box<PluralExpr>, Box<PluralExpr>),
}

impl PluralExpr {
    /// Parse an expression such as `(n != 1)`.
    pub fn parse(source: &str) -> Result<Self> {
        if source.len() > MAX_EXPRESSION_LEN {
            return Err(I18nError::InvalidPluralExpression(format!(
                "expression is {} bytes, limit is {}",
                source.len(),
                MAX_EXPRESSION_LEN
            )));
        }

        let tokens = tokenize(source)?;
        let mut parser = Parser {
            tokens: &tokens,
            pos: 0,
            depth: 0,
            source,
        };
        let expr = parser.ternary()?;
        if parser.pos != tokens.len() {
            return Err(parser.error("trailing input"));
        }
        Ok(expr)
    }

    /// Evaluate for a count.
    pub fn eval(&self, n: u64) -> u64 {
        match self {
            PluralExpr::N => n,
            PluralExpr::Const(c) => *c,
            PluralExpr::Not(e) => (e.eval(n) == 0) as u64,
            PluralExpr::Neg(e) => e.eval(n).wrapping_neg(),
            PluralExpr::Binary(BinaryOp::And, lhs, rhs) => {
                (lhs.eval(n) != 0 && rhs.eval(n) != 0) as u64
            }
            PluralExpr::Binary(BinaryOp::Or, lhs, rhs) => {
                (lhs.eval(n) != 0 || rhs.eval(n) != 0) as u64
            }
            PluralExpr::Binary(op, lhs, rhs) => op.apply(lhs.eval(n), rhs.eval(n)),
            PluralExpr::Ternary(cond, then, otherwise) => {
                if cond.eval(n) != 0 {
                    then.eval(n)
                } else {
                    otherwise.eval(n)
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    N,
    Num(u64),
    Op(BinaryOp),
    Not,
    Minus,
    Question,
    Colon,
    LParen,
    RParen,
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    let invalid = |msg: String| I18nError::InvalidPluralExpression(format!("{}: {}", source, msg));

    while i < bytes.len() {
        let c = bytes[i];
        let next = bytes.get(i + 1).copied();
        let (token, width) = match c {
            b' ' | b'\t' | b'\r' | b'\n' => {
                i += 1;
                continue;
            }
            b'n' => (Token::N, 1),
            b'0'..=b'9' => {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                let value = source[start..i]
                    .parse::<u64>()
                    .map_err(|e| invalid(e.to_string()))?;
                tokens.push(Token::Num(value));
                continue;
            }
            b'(' => (Token::LParen, 1),
            b')' => (Token::RParen, 1),
            b'?' => (Token::Question, 1),
            b':' => (Token::Colon, 1),
            b'*' => (Token::Op(BinaryOp::Mul), 1),
            b'/' => (Token::Op(BinaryOp::Div), 1),
            b'%' => (Token::Op(BinaryOp::Rem), 1),
            b'+' => (Token::Op(BinaryOp::Add), 1),
            b'-' => (Token::Minus, 1),
            b'<' if next == Some(b'=') => (Token::Op(BinaryOp::Le), 2),
            b'<' => (Token::Op(BinaryOp::Lt), 1),
            b'>' if next == Some(b'=') => (Token::Op(BinaryOp::Ge), 2),
            b'>' => (Token::Op(BinaryOp::Gt), 1),
            b'=' if next == Some(b'=') => (Token::Op(BinaryOp::Eq), 2),
            b'!' if next == Some(b'=') => (Token::Op(BinaryOp::Ne), 2),
            b'!' => (Token::Not, 1),
            b'&' if next == Some(b'&') => (Token::Op(BinaryOp::And), 2),
            b'|' if next == Some(b'|') => (Token::Op(BinaryOp::Or), 2),
            other => {
                return Err(invalid(format!(
                    "unexpected character {:?} at {}",
                    other as char, i
                )));
            }
        };
        tokens.push(token);
        i += width;
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
    source: &'a str,
}

impl Parser<'_> {
    fn error(&self, msg: &str) -> I18nError {
        I18nError::InvalidPluralExpression(format!("{}: {} at token {}", self.source, msg, self.pos))
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn eat(&mut self, token: Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Run `parse` one nesting level deeper.
    fn nested(&mut self, parse: fn(&mut Self) -> Result<PluralExpr>) -> Result<PluralExpr> {
        if self.depth == MAX_DEPTH {
            return Err(self.error("expression nested too deeply"));
        }
        self.depth += 1;
        let expr = parse(self);
        self.depth -= 1;
        expr
    }

    fn ternary(&mut self) -> Result<PluralExpr> {
        self.nested(Self::ternary_inner)
    }

    fn ternary_inner(&mut self) -> Result<PluralExpr> {
        let cond = self.binary(0)?;
        if !self.eat(Token::Question) {
            return Ok(cond);
        }
        let then = self.ternary()?;
        if !self.eat(Token::Colon) {
            return Err(self.error("expected ':'"));
        }
        let otherwise = self.ternary()?;
        Ok(PluralExpr::Ternary(
            Box::new(cond),
            Box::new(then),
            Box::new(otherwise),
        ))
    }

    /// Precedence climbing over the binary operator levels.
    fn binary(&mut self, level: usize) -> Result<PluralExpr> {
        const LEVELS: &[&[BinaryOp]] = &[
            &[BinaryOp::Or],
            &[BinaryOp::And],
            &[BinaryOp::Eq, BinaryOp::Ne],
            &[BinaryOp::Lt, BinaryOp::Le, BinaryOp::Gt, BinaryOp::Ge],
            &[BinaryOp::Add, BinaryOp::Sub],
            &[BinaryOp::Mul, BinaryOp::Div, BinaryOp::Rem],
        ];

        if level == LEVELS.len() {
            return self.unary();
        }

        let mut lhs = self.binary(level + 1)?;
        loop {
            let op = match self.peek() {
                Some(Token::Op(op)) if LEVELS[level].contains(&op) => op,
                Some(Token::Minus) if LEVELS[level].contains(&BinaryOp::Sub) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.binary(level + 1)?;
            lhs = PluralExpr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> Result<PluralExpr> {
        if self.eat(Token::Not) {
            return Ok(PluralExpr::Not(Box::new(self.nested(Self::unary)?)));
        }
        if self.eat(Token::Minus) {
            return Ok(PluralExpr::Neg(Box::new(self.nested(Self::unary)?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<PluralExpr> {
        match self.peek() {
            Some(Token::N) => {
                self.pos += 1;
                Ok(PluralExpr::N)
            }
            Some(Token::Num(value)) => {
                self.pos += 1;
                Ok(PluralExpr::Const(value))
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.ternary()?;
                if !self.eat(Token::RParen) {
                    return Err(self.error("expected ')'"));
                }
                Ok(inner)
            }
            Some(_) => Err(self.error("unexpected token")),
            None => Err(self.error("unexpected end of expression")),
        }
    }
}

/// A catalog's plural rule: how many forms exist and how to pick one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluralForms {
    nplurals: usize,
    expr: PluralExpr,
}

impl PluralForms {
    /// Parse a `Plural-Forms` header value.
    ///
    /// # Example
    ///
    /// ```
    /// use armature_gettext::PluralForms;
    ///
    /// let forms = PluralForms::parse("nplurals=2; plural=(n > 1);").unwrap();
    /// assert_eq!(forms.nplurals(), 2);
    /// assert_eq!(forms.index(0), 0);
    /// assert_eq!(forms.index(2), 1);
    /// ```
    pub fn parse(header: &str) -> Result<Self> {
        let mut nplurals = None;
        let mut expr = None;

        for part in header.split(';') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            match key.trim() {
                "nplurals" => {
                    let count = value.trim().parse::<usize>().map_err(|_| {
                        I18nError::InvalidPluralExpression(format!("bad nplurals in {:?}", header))
                    })?;
                    nplurals = Some(count);
                }
                "plural" => expr = Some(PluralExpr::parse(value.trim())?),
                _ => {}
            }
        }

        match (nplurals, expr) {
            (Some(nplurals), Some(expr)) if nplurals > 0 => Ok(Self { nplurals, expr }),
            _ => Err(I18nError::InvalidPluralExpression(format!(
                "incomplete Plural-Forms header {:?}",
                header
            ))),
        }
    }

    /// The rule assumed when a catalog has no `Plural-Forms` header:
    /// `nplurals=2; plural=(n != 1)`.
    pub fn germanic() -> Self {
        Self {
            nplurals: 2,
            expr: PluralExpr::Binary(
                BinaryOp::Ne,
                Box::new(PluralExpr::N),
                Box::new(PluralExpr::Const(1)),
            ),
        }
    }

    /// Number of plural forms each plural entry carries.
    pub fn nplurals(&self) -> usize {
        self.nplurals
    }

    /// Form index for a count. May exceed `nplurals` for a buggy rule;
    /// callers treat that as a miss.
    pub fn index(&self, n: u64) -> usize {
        usize::try_from(self.expr.eval(n)).unwrap_or(usize::MAX)
    }
}

impl Default for PluralForms {
    fn default() -> Self {
        Self::germanic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(header: &str) -> PluralForms {
        PluralForms::parse(header).unwrap()
    }

    #[test]
    fn test_germanic_default() {
        let forms = PluralForms::default();
        assert_eq!(forms.nplurals(), 2);
        assert_eq!(forms.index(0), 1);
        assert_eq!(forms.index(1), 0);
        assert_eq!(forms.index(2), 1);
    }

    #[test]
    fn test_french_rule() {
        let fr = rule("nplurals=2; plural=(n > 1);");
        assert_eq!(fr.index(0), 0);
        assert_eq!(fr.index(1), 0);
        assert_eq!(fr.index(2), 1);
    }

    #[test]
    fn test_russian_rule() {
        let ru = rule(
            "nplurals=3; plural=(n%10==1 && n%100!=11 ? 0 : n%10>=2 && n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2);",
        );
        assert_eq!(ru.nplurals(), 3);
        assert_eq!(ru.index(1), 0);
        assert_eq!(ru.index(2), 1);
        assert_eq!(ru.index(5), 2);
        assert_eq!(ru.index(11), 2);
        assert_eq!(ru.index(21), 0);
        assert_eq!(ru.index(22), 1);
        assert_eq!(ru.index(25), 2);
    }

    #[test]
    fn test_arabic_rule() {
        let ar = rule(
            "nplurals=6; plural=n==0 ? 0 : n==1 ? 1 : n==2 ? 2 : n%100>=3 && n%100<=10 ? 3 : n%100>=11 ? 4 : 5;",
        );
        assert_eq!(ar.index(0), 0);
        assert_eq!(ar.index(1), 1);
        assert_eq!(ar.index(2), 2);
        assert_eq!(ar.index(5), 3);
        assert_eq!(ar.index(11), 4);
        assert_eq!(ar.index(100), 5);
    }

    #[test]
    fn test_no_plurals_rule() {
        let ja = rule("nplurals=1; plural=0;");
        assert_eq!(ja.nplurals(), 1);
        assert_eq!(ja.index(0), 0);
        assert_eq!(ja.index(7), 0);
    }

    #[test]
    fn test_bare_boolean_plural() {
        // Some catalogs omit the parentheses
        let de = rule("nplurals=2; plural=n != 1;");
        assert_eq!(de.index(1), 0);
        assert_eq!(de.index(3), 1);
    }

    #[test]
    fn test_operator_precedence() {
        let expr = PluralExpr::parse("1 + 2 * 3 == 7 && !0").unwrap();
        assert_eq!(expr.eval(0), 1);

        let expr = PluralExpr::parse("10 - 2 - 3").unwrap();
        assert_eq!(expr.eval(0), 5);
    }

    #[test]
    fn test_division_by_zero_is_zero() {
        let expr = PluralExpr::parse("n / 0 + n % 0").unwrap();
        assert_eq!(expr.eval(9), 0);
    }

    #[test]
    fn test_invalid_expressions() {
        assert!(PluralExpr::parse("n ==").is_err());
        assert!(PluralExpr::parse("(n != 1").is_err());
        assert!(PluralExpr::parse("n ? 1").is_err());
        assert!(PluralExpr::parse("x").is_err());
        assert!(PluralExpr::parse("n 1").is_err());
    }

    #[test]
    fn test_incomplete_header() {
        assert!(PluralForms::parse("plural=(n != 1);").is_err());
        assert!(PluralForms::parse("nplurals=2;").is_err());
        assert!(PluralForms::parse("nplurals=0; plural=0;").is_err());
        assert!(PluralForms::parse("nplurals=two; plural=0;").is_err());
    }

    #[test]
    fn test_deep_nesting_rejected() {
        let deep = format!("{}n{}", "(".repeat(100), ")".repeat(100));
        assert!(matches!(
            PluralExpr::parse(&deep),
            Err(I18nError::InvalidPluralExpression(_))
        ));

        let negations = format!("{}n", "!".repeat(100));
        assert!(PluralExpr::parse(&negations).is_err());

        let reasonable = format!("{}n{}", "(".repeat(40), ")".repeat(40));
        assert_eq!(PluralExpr::parse(&reasonable).unwrap().eval(3), 3);
    }

    #[test]
    fn test_oversized_expression_rejected() {
        let header = format!(
            "nplurals=2; plural={}n{};",
            "(".repeat(200_000),
            ")".repeat(200_000)
        );
        assert!(matches!(
            PluralForms::parse(&header),
            Err(I18nError::InvalidPluralExpression(_))
        ));

        let long_chain = vec!["n"; 600].join("+");
        assert!(PluralExpr::parse(&long_chain).is_err());
    }
}
