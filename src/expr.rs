//! Evaluator for local override expressions such as `0.5`, `-$MaxBias / 2` or
//! `($Base + 1) * 3`. `$name` refers to a network property, which may itself be an
//! expression.

use crate::{
    constants::{NC_EXPR_MAX_DEPTH, NC_EXPR_MAX_EXPANSIONS},
    error::{ExprError, ExprResult},
    network::Tags,
};

pub fn evaluate(expr: &str, variables: &Tags) -> ExprResult<f64> {
    evaluate_nested(expr, variables, &mut Scope::default())
}

/// State shared by an expression and every variable it expands into.
#[derive(Default)]
struct Scope {
    resolving: Vec<String>,
    depth: usize,
    expansions: usize,
}

fn evaluate_nested(expr: &str, variables: &Tags, scope: &mut Scope) -> ExprResult<f64> {
    let mut parser = Parser {
        src: expr,
        pos: 0,
        variables,
        scope,
    };
    parser.skip_ws();
    if parser.at_end() {
        return Err(ExprError::Empty);
    }
    let value = parser.sum()?;
    parser.skip_ws();
    match parser.peek() {
        None if value.is_finite() => Ok(value),
        None => Err(ExprError::NotFinite),
        Some(b')') => Err(ExprError::Unbalanced(parser.pos)),
        Some(_) => Err(parser.unexpected()),
    }
}

struct Parser<'s, 'v> {
    src: &'s str,
    pos: usize,
    variables: &'v Tags,
    scope: &'v mut Scope,
}

impl Parser<'_, '_> {
    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    /// The character at the cursor. The cursor only ever moves over ASCII, so it sits on a
    /// character boundary.
    fn unexpected(&self) -> ExprError {
        match self.src.get(self.pos..).and_then(|rest| rest.chars().next()) {
            Some(c) => ExprError::UnexpectedChar(c, self.pos),
            None => ExprError::UnexpectedEnd,
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn descend(&mut self) -> ExprResult<()> {
        self.scope.depth += 1;
        if self.scope.depth > NC_EXPR_MAX_DEPTH {
            Err(ExprError::TooDeep(NC_EXPR_MAX_DEPTH))
        } else {
            Ok(())
        }
    }

    fn ascend(&mut self) {
        self.scope.depth -= 1;
    }

    fn sum(&mut self) -> ExprResult<f64> {
        let mut acc = self.product()?;
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'+') => {
                    self.pos += 1;
                    acc += self.product()?;
                }
                Some(b'-') => {
                    self.pos += 1;
                    acc -= self.product()?;
                }
                _ => return Ok(acc),
            }
        }
    }

    fn product(&mut self) -> ExprResult<f64> {
        let mut acc = self.factor()?;
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'*') => {
                    self.pos += 1;
                    acc *= self.factor()?;
                }
                Some(b'/') => {
                    self.pos += 1;
                    acc /= self.factor()?;
                }
                _ => return Ok(acc),
            }
        }
    }

    fn factor(&mut self) -> ExprResult<f64> {
        self.descend()?;
        let value = self.unary()?;
        self.ascend();
        Ok(value)
    }

    fn unary(&mut self) -> ExprResult<f64> {
        self.skip_ws();
        match self.peek() {
            None => Err(ExprError::UnexpectedEnd),
            Some(b'-') => {
                self.pos += 1;
                Ok(-self.factor()?)
            }
            Some(b'+') => {
                self.pos += 1;
                self.factor()
            }
            Some(b'(') => {
                let open = self.pos;
                self.pos += 1;
                let value = self.sum()?;
                self.skip_ws();
                if self.peek() != Some(b')') {
                    return Err(ExprError::Unbalanced(open));
                }
                self.pos += 1;
                Ok(value)
            }
            Some(b'$') => {
                self.pos += 1;
                self.variable()
            }
            Some(c) if c.is_ascii_digit() || c == b'.' => self.number(),
            Some(_) => Err(self.unexpected()),
        }
    }

    fn number(&mut self) -> ExprResult<f64> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || c == b'.')
        {
            self.pos += 1;
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        let text = &self.src[start..self.pos];
        text.parse::<f64>()
            .map_err(|_| ExprError::Number(text.to_owned()))
    }

    fn variable(&mut self) -> ExprResult<f64> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.unexpected());
        }
        let name = self.src[start..self.pos].to_owned();
        if self.scope.resolving.contains(&name) {
            return Err(ExprError::Recursive(name));
        }
        let Some(value) = self.variables.property(&name) else {
            return Err(ExprError::UnknownVariable(name));
        };
        self.scope.expansions += 1;
        if self.scope.expansions > NC_EXPR_MAX_EXPANSIONS {
            return Err(ExprError::TooComplex(NC_EXPR_MAX_EXPANSIONS));
        }
        self.scope.resolving.push(name);
        let result = evaluate_nested(value, self.variables, self.scope);
        self.scope.resolving.pop();
        result
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::assert_f64_approx;

    fn vars() -> Tags {
        let mut tags = Tags::default();
        tags.set_property("Base", "2");
        tags.set_property("Scaled", "$Base * 1.5");
        tags.set_property("Loop", "$Loop + 1");
        tags
    }

    #[test]
    fn test_literals() {
        let v = Tags::default();
        assert_f64_approx!(evaluate("0.5", &v).unwrap(), 0.5);
        assert_f64_approx!(evaluate(" -3 ", &v).unwrap(), -3.);
        assert_f64_approx!(evaluate("1e-2", &v).unwrap(), 0.01);
        assert_f64_approx!(evaluate(".25", &v).unwrap(), 0.25);
    }

    #[test]
    fn test_precedence() {
        let v = Tags::default();
        assert_f64_approx!(evaluate("1 + 2 * 3", &v).unwrap(), 7.);
        assert_f64_approx!(evaluate("(1 + 2) * 3", &v).unwrap(), 9.);
        assert_f64_approx!(evaluate("8 / 2 / 2", &v).unwrap(), 2.);
        assert_f64_approx!(evaluate("2 - -1", &v).unwrap(), 3.);
    }

    #[test]
    fn test_variables() {
        let v = vars();
        assert_f64_approx!(evaluate("$Base", &v).unwrap(), 2.);
        assert_f64_approx!(evaluate("-$Scaled / 3", &v).unwrap(), -1.);
        assert_eq!(
            evaluate("$Missing", &v),
            Err(ExprError::UnknownVariable("Missing".into()))
        );
        assert_eq!(evaluate("$Loop", &v), Err(ExprError::Recursive("Loop".into())));
    }

    #[test]
    fn test_malformed() {
        let v = Tags::default();
        assert_eq!(evaluate("", &v), Err(ExprError::Empty));
        assert_eq!(evaluate("  ", &v), Err(ExprError::Empty));
        assert_eq!(evaluate("1 +", &v), Err(ExprError::UnexpectedEnd));
        assert_eq!(evaluate("(1", &v), Err(ExprError::Unbalanced(0)));
        assert_eq!(evaluate("1)", &v), Err(ExprError::Unbalanced(1)));
        assert_eq!(evaluate("abc", &v), Err(ExprError::UnexpectedChar('a', 0)));
        assert_eq!(evaluate("1..2", &v), Err(ExprError::Number("1..2".into())));
        assert_eq!(evaluate("1 / 0", &v), Err(ExprError::NotFinite));
    }

    #[test]
    fn test_nesting_limits() {
        let v = Tags::default();
        let negations = format!("{}1", "-".repeat(1_000_000));
        assert_eq!(
            evaluate(&negations, &v),
            Err(ExprError::TooDeep(NC_EXPR_MAX_DEPTH))
        );
        let parens = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
        assert_eq!(evaluate(&parens, &v), Err(ExprError::TooDeep(NC_EXPR_MAX_DEPTH)));

        let shallow = format!("{}1{}", "(".repeat(8), ")".repeat(8));
        assert_f64_approx!(evaluate(&shallow, &v).unwrap(), 1.);
    }

    #[test]
    fn test_variable_chain_limits() {
        // V0 = 1, Vn = $V(n-1) + $V(n-1): each level doubles the expansions
        let mut v = Tags::default();
        v.set_property("V0", "1");
        for n in 1..=20 {
            v.set_property(format!("V{n}"), format!("$V{m} + $V{m}", m = n - 1));
        }
        assert_f64_approx!(evaluate("$V3", &v).unwrap(), 8.);
        assert_eq!(
            evaluate("$V20", &v),
            Err(ExprError::TooComplex(NC_EXPR_MAX_EXPANSIONS))
        );

        // a long linear chain runs into the depth limit instead
        let mut chain = Tags::default();
        chain.set_property("L0", "1");
        for n in 1..1000 {
            chain.set_property(format!("L{n}"), format!("$L{}", n - 1));
        }
        assert!(matches!(
            evaluate("$L999", &chain),
            Err(ExprError::TooDeep(_) | ExprError::TooComplex(_))
        ));
    }

    #[test]
    fn test_unexpected_unicode() {
        let v = Tags::default();
        assert_eq!(evaluate("1 + é", &v), Err(ExprError::UnexpectedChar('é', 4)));
        assert_eq!(evaluate("2 ×3", &v), Err(ExprError::UnexpectedChar('×', 2)));
        assert_eq!(evaluate("$ö", &v), Err(ExprError::UnexpectedChar('ö', 1)));
    }
}
