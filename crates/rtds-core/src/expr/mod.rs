//! Exact symbolic expressions.
//!
//! Every quantity in an analysis (component values, unknowns, solved
//! currents and voltages) is an [`Expr`]: a rational function with rational
//! coefficients kept in canonical form, so that two expressions are
//! mathematically equal exactly when they compare equal.

mod gcd;
mod monomial;
mod poly;
mod symbol;

use std::collections::BTreeSet;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Div, Mul, Neg, Sub};

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::One;

use crate::error::{Error, Result};

pub use gcd::{content, gcd, primitive_part, pseudo_remainder};
pub use monomial::Monomial;
pub use poly::Poly;
pub use symbol::Symbol;

/// A rational function `num / den` over the rationals.
///
/// Invariants: `gcd(num, den) = 1`, the leading coefficient of `den` is 1,
/// and zero is represented as `0 / 1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expr {
    num: Poly,
    den: Poly,
}

impl Expr {
    pub fn zero() -> Self {
        Expr {
            num: Poly::zero(),
            den: Poly::one(),
        }
    }

    pub fn one() -> Self {
        Expr::integer(1)
    }

    /// An integer constant.
    pub fn integer(value: i64) -> Self {
        Expr::rational(BigRational::from_integer(BigInt::from(value)))
    }

    /// An exact rational constant.
    pub fn rational(value: BigRational) -> Self {
        Expr {
            num: Poly::constant(value),
            den: Poly::one(),
        }
    }

    /// The fraction `numer / denom`, or `None` when `denom` is zero.
    pub fn ratio(numer: i64, denom: i64) -> Option<Self> {
        if denom == 0 {
            return None;
        }
        Some(Expr::rational(BigRational::new(
            BigInt::from(numer),
            BigInt::from(denom),
        )))
    }

    /// A single symbol.
    pub fn symbol(symbol: impl Into<Symbol>) -> Self {
        Expr {
            num: Poly::var(symbol.into()),
            den: Poly::one(),
        }
    }

    /// Build `num / den`, or `None` when `den` is the zero polynomial.
    pub fn from_parts(num: Poly, den: Poly) -> Option<Self> {
        if den.is_zero() {
            return None;
        }
        Some(Expr::normalized(num, den))
    }

    /// Canonicalize `num / den`; `den` must be nonzero.
    fn normalized(num: Poly, den: Poly) -> Self {
        debug_assert!(!den.is_zero());
        if num.is_zero() {
            return Expr::zero();
        }
        if let Some(c) = den.as_constant() {
            return Expr {
                num: num.scale(&c.recip()),
                den: Poly::one(),
            };
        }

        let g = gcd(&num, &den);
        let (num, den) = if g.is_one() {
            (num, den)
        } else {
            match (num.div_exact(&g), den.div_exact(&g)) {
                (Some(n), Some(d)) => (n, d),
                _ => (num, den),
            }
        };
        let lead = den.leading_coeff();
        if lead.is_one() {
            Expr { num, den }
        } else {
            let inv = lead.recip();
            Expr {
                num: num.scale(&inv),
                den: den.scale(&inv),
            }
        }
    }

    pub fn numerator(&self) -> &Poly {
        &self.num
    }

    pub fn denominator(&self) -> &Poly {
        &self.den
    }

    pub fn is_zero(&self) -> bool {
        self.num.is_zero()
    }

    pub fn is_one(&self) -> bool {
        self.den.is_one() && self.num.is_one()
    }

    /// Whether the expression contains no symbols.
    pub fn is_constant(&self) -> bool {
        self.num.is_constant() && self.den.is_constant()
    }

    /// The exact value of a symbol-free expression.
    pub fn as_rational(&self) -> Option<BigRational> {
        if self.den.is_one() {
            self.num.as_constant()
        } else {
            None
        }
    }

    /// The symbol this expression consists of, if it is exactly one symbol.
    pub fn as_symbol(&self) -> Option<&Symbol> {
        if !self.den.is_one() || self.num.len() != 1 {
            return None;
        }
        let (m, c) = self.num.leading()?;
        if !c.is_one() {
            return None;
        }
        let mut factors = m.factors();
        match (factors.next(), factors.next()) {
            (Some((s, 1)), None) => Some(s),
            _ => None,
        }
    }

    /// All symbols appearing in the expression.
    pub fn free_symbols(&self) -> BTreeSet<Symbol> {
        let mut symbols = self.num.symbols();
        symbols.extend(self.den.symbols());
        symbols
    }

    /// Whether `symbol` appears anywhere in the expression.
    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.num.contains(symbol) || self.den.contains(symbol)
    }

    /// Rough size measure: total number of stored terms.
    pub fn complexity(&self) -> usize {
        self.num.len() + self.den.len()
    }

    /// Raise to a non-negative integer power.
    pub fn pow(&self, exp: u32) -> Expr {
        Expr {
            num: self.num.pow(exp),
            den: self.den.pow(exp),
        }
    }

    /// `1 / self`, or `None` for zero.
    pub fn recip(&self) -> Option<Expr> {
        Expr::from_parts(self.den.clone(), self.num.clone())
    }

    /// `self / rhs`, or `None` when `rhs` is zero.
    pub fn checked_div(&self, rhs: &Expr) -> Option<Expr> {
        if rhs.is_zero() {
            return None;
        }
        Some(Expr::normalized(
            self.num.mul(&rhs.den),
            self.den.mul(&rhs.num),
        ))
    }

    fn add_expr(&self, rhs: &Expr) -> Expr {
        if self.den == rhs.den {
            if self.den.is_one() {
                return Expr {
                    num: self.num.add(&rhs.num),
                    den: Poly::one(),
                };
            }
            return Expr::normalized(self.num.add(&rhs.num), self.den.clone());
        }
        Expr::normalized(
            self.num.mul(&rhs.den).add(&rhs.num.mul(&self.den)),
            self.den.mul(&rhs.den),
        )
    }

    fn mul_expr(&self, rhs: &Expr) -> Expr {
        if self.is_zero() || rhs.is_zero() {
            return Expr::zero();
        }
        if self.den.is_one() && rhs.den.is_one() {
            return Expr {
                num: self.num.mul(&rhs.num),
                den: Poly::one(),
            };
        }
        Expr::normalized(self.num.mul(&rhs.num), self.den.mul(&rhs.den))
    }

    fn neg_expr(&self) -> Expr {
        Expr {
            num: self.num.neg(),
            den: self.den.clone(),
        }
    }

    /// Replace every symbol for which `lookup` returns a value, all at once.
    ///
    /// Returns `None` if the substitution sends the denominator to zero.
    pub fn subs_with(&self, lookup: impl Fn(&Symbol) -> Option<Expr>) -> Option<Expr> {
        if !self.free_symbols().iter().any(|s| lookup(s).is_some()) {
            return Some(self.clone());
        }
        let (nn, nd) = eval_poly(&self.num, &lookup);
        let (dn, dd) = eval_poly(&self.den, &lookup);
        Expr::from_parts(nn.mul(&dd), nd.mul(&dn))
    }

    /// Replace one symbol.
    pub fn subs(&self, symbol: &Symbol, value: &Expr) -> Option<Expr> {
        self.subs_with(|s| (s == symbol).then(|| value.clone()))
    }

    /// Simultaneous substitution of several symbols.
    pub fn subs_all<'a, I>(&self, pairs: I) -> Option<Expr>
    where
        I: IntoIterator<Item = (&'a Symbol, &'a Expr)>,
    {
        let map: Vec<(&Symbol, &Expr)> = pairs.into_iter().collect();
        self.subs_with(|s| {
            map.iter()
                .find(|(k, _)| *k == s)
                .map(|(_, v)| (*v).clone())
        })
    }

    /// Split into `Σ coeffs[i] * unknowns[i] + rest`.
    ///
    /// Fails when an unknown appears in the denominator, with a power above
    /// one, or multiplied by another unknown.
    pub fn linear_form(&self, unknowns: &[Symbol]) -> Result<(Vec<Expr>, Expr)> {
        let (coeffs, rest) = self.cleared_linear_form(unknowns)?;
        let coeffs = coeffs
            .into_iter()
            .map(|p| Expr::normalized(p, self.den.clone()))
            .collect();
        Ok((coeffs, Expr::normalized(rest, self.den.clone())))
    }

    /// Linear form of the equation `self = 0` with the denominator cleared:
    /// polynomial coefficients of the numerator only.
    pub fn cleared_linear_form(&self, unknowns: &[Symbol]) -> Result<(Vec<Poly>, Poly)> {
        if unknowns.iter().any(|u| self.den.contains(u)) {
            return Err(Error::NonLinear(self.to_string()));
        }
        self.num
            .linear_form(unknowns)
            .ok_or_else(|| Error::NonLinear(self.to_string()))
    }
}

/// Substitute into a polynomial, collecting the terms over a common
/// denominator without reducing; the caller normalizes once.
fn eval_poly(p: &Poly, lookup: &impl Fn(&Symbol) -> Option<Expr>) -> (Poly, Poly) {
    let mut num = Poly::zero();
    let mut den = Poly::one();
    for (m, c) in p.terms() {
        let mut term_num = Poly::constant(c.clone());
        let mut term_den = Poly::one();
        for (s, e) in m.factors() {
            match lookup(s) {
                Some(value) => {
                    term_num = term_num.mul(&value.num.pow(e));
                    term_den = term_den.mul(&value.den.pow(e));
                }
                None => {
                    term_num = term_num.mul_term(&Monomial::power(s.clone(), e), &BigRational::one());
                }
            }
        }
        if term_den == den {
            num = num.add(&term_num);
        } else if let Some(q) = den.div_exact(&term_den) {
            num = num.add(&term_num.mul(&q));
        } else if let Some(q) = term_den.div_exact(&den) {
            num = num.mul(&q).add(&term_num);
            den = term_den;
        } else {
            num = num.mul(&term_den).add(&term_num.mul(&den));
            den = den.mul(&term_den);
        }
    }
    (num, den)
}

impl Default for Expr {
    fn default() -> Self {
        Expr::zero()
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Expr::integer(value)
    }
}

impl From<BigRational> for Expr {
    fn from(value: BigRational) -> Self {
        Expr::rational(value)
    }
}

impl From<Symbol> for Expr {
    fn from(symbol: Symbol) -> Self {
        Expr::symbol(symbol)
    }
}

impl From<&str> for Expr {
    fn from(name: &str) -> Self {
        Expr::symbol(name)
    }
}

macro_rules! forward_binop {
    ($Trait:ident, $method:ident, $inner:ident) => {
        impl $Trait<&Expr> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                self.$inner(rhs)
            }
        }

        impl $Trait<Expr> for Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                (&self).$inner(&rhs)
            }
        }

        impl $Trait<&Expr> for Expr {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                (&self).$inner(rhs)
            }
        }

        impl $Trait<Expr> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                self.$inner(&rhs)
            }
        }
    };
}

impl Expr {
    fn sub_expr(&self, rhs: &Expr) -> Expr {
        self.add_expr(&rhs.neg_expr())
    }

    fn div_expr(&self, rhs: &Expr) -> Expr {
        match self.checked_div(rhs) {
            Some(q) => q,
            None => panic!("division of {} by zero", self),
        }
    }
}

forward_binop!(Add, add, add_expr);
forward_binop!(Sub, sub, sub_expr);
forward_binop!(Mul, mul, mul_expr);
// Panics on an exact zero divisor, like integer division.
forward_binop!(Div, div, div_expr);

impl Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        self.neg_expr()
    }
}

impl Neg for &Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        self.neg_expr()
    }
}

impl Sum for Expr {
    fn sum<I: Iterator<Item = Expr>>(iter: I) -> Expr {
        iter.fold(Expr::zero(), |acc, e| acc.add_expr(&e))
    }
}

impl<'a> Sum<&'a Expr> for Expr {
    fn sum<I: Iterator<Item = &'a Expr>>(iter: I) -> Expr {
        iter.fold(Expr::zero(), |acc, e| acc.add_expr(e))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den.is_one() {
            return write!(f, "{}", self.num);
        }
        // Fractional coefficients move to the denominator: a/(2*b), not 1/2*a/b.
        let mut scale = BigRational::one();
        for (_, c) in self.num.terms() {
            let scaled = c * &scale;
            if !scaled.is_integer() {
                scale *= BigRational::from_integer(scaled.denom().clone());
            }
        }
        let (num, den) = if scale.is_one() {
            (self.num.clone(), self.den.clone())
        } else {
            (self.num.scale(&scale), self.den.scale(&scale))
        };

        if num.len() > 1 {
            write!(f, "({})", num)?;
        } else {
            write!(f, "{}", num)?;
        }
        let bare = Expr {
            num: den.clone(),
            den: Poly::one(),
        };
        match bare.as_symbol() {
            Some(s) => write!(f, "/{}", s),
            None => write!(f, "/({})", den),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(name: &str) -> Expr {
        Expr::symbol(name)
    }

    #[test]
    fn test_canonical_equality() {
        let a = (s("a") + s("b")) * (s("a") - s("b"));
        let b = s("a") * s("a") - s("b") * s("b");
        assert_eq!(a, b);

        let f = &a / &(s("a") - s("b"));
        assert_eq!(f, s("a") + s("b"));
    }

    #[test]
    fn test_fraction_cancellation() {
        let vin = s("Vin");
        let (r1, r2) = (s("R1"), s("R2"));
        let i = &vin / &(&r1 + &r2);
        let v_out = &i * &r2;
        assert_eq!(v_out.to_string(), "R2*Vin/(R1 + R2)");
        assert_eq!(&v_out * &(&r1 + &r2) / &r2, vin);
    }

    #[test]
    fn test_denominator_is_monic() {
        let e = s("a") / (s("b") * Expr::integer(2));
        assert_eq!(e.denominator().leading_coeff(), BigRational::one());
        assert_eq!(e, Expr::ratio(1, 2).unwrap() * s("a") / s("b"));
        assert_eq!(e.to_string(), "a/(2*b)");
        let mixed = (s("a") * Expr::ratio(1, 3).unwrap() + s("c")) / s("b");
        assert_eq!(mixed.to_string(), "(a + 3*c)/(3*b)");
    }

    #[test]
    fn test_zero_is_canonical() {
        let e = s("x") / s("y") - s("x") / s("y");
        assert!(e.is_zero());
        assert_eq!(e, Expr::zero());
        assert_eq!(e.denominator(), &Poly::one());
    }

    #[test]
    fn test_checked_div_by_zero() {
        assert!(s("a").checked_div(&Expr::zero()).is_none());
        assert!(Expr::zero().recip().is_none());
        assert!(Expr::ratio(1, 0).is_none());
    }

    #[test]
    #[should_panic]
    fn test_div_by_zero_panics() {
        let _ = s("a") / Expr::zero();
    }

    #[test]
    fn test_subs_simultaneous() {
        let e = s("x") + s("y") * Expr::integer(2);
        let x = Symbol::new("x");
        let y = Symbol::new("y");
        let swapped = e.subs_all([(&x, &s("y")), (&y, &s("x"))]).unwrap();
        assert_eq!(swapped, s("y") + s("x") * Expr::integer(2));

        let halved = e.subs(&y, &Expr::ratio(1, 2).unwrap()).unwrap();
        assert_eq!(halved, s("x") + Expr::one());
    }

    #[test]
    fn test_subs_into_denominator() {
        let e = s("a") / (s("b") - Expr::integer(1));
        let b = Symbol::new("b");
        assert!(e.subs(&b, &Expr::one()).is_none());
        assert_eq!(e.subs(&b, &Expr::integer(3)).unwrap(), s("a") / Expr::integer(2));
    }

    #[test]
    fn test_linear_form() {
        let i1 = Symbol::new("_IR1");
        let i2 = Symbol::new("_IR2");
        let e = s("R1") * s("_IR1") - s("_IR2") / s("R2") + s("Vin");
        let (coeffs, rest) = e.linear_form(&[i1, i2]).unwrap();
        assert_eq!(coeffs[0], s("R1"));
        assert_eq!(coeffs[1], -(Expr::one() / s("R2")));
        assert_eq!(rest, s("Vin"));
    }

    #[test]
    fn test_linear_form_rejects_products() {
        let x = Symbol::new("x");
        let y = Symbol::new("y");
        let e = s("x") * s("y");
        assert!(matches!(
            e.linear_form(&[x.clone(), y]),
            Err(Error::NonLinear(_))
        ));
        let e = s("a") / s("x");
        assert!(matches!(e.linear_form(&[x]), Err(Error::NonLinear(_))));
    }

    #[test]
    fn test_free_symbols_and_constants() {
        let e = s("Vin") / s("R1");
        let names: Vec<_> = e.free_symbols().into_iter().map(|s| s.to_string()).collect();
        assert_eq!(names, ["R1", "Vin"]);
        assert_eq!(
            (Expr::integer(3) / Expr::integer(6)).as_rational(),
            Some(BigRational::new(BigInt::from(1), BigInt::from(2)))
        );
        assert!(e.as_rational().is_none());
        assert_eq!(s("C1").as_symbol(), Some(&Symbol::new("C1")));
        assert!((s("C1") * Expr::integer(2)).as_symbol().is_none());
    }

    #[test]
    fn test_sum() {
        let terms = vec![s("a"), s("b"), -s("a")];
        let total: Expr = terms.iter().sum();
        assert_eq!(total, s("b"));
    }
}
