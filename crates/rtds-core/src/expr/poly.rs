//! Sparse multivariate polynomials with exact rational coefficients.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use super::{Monomial, Symbol};

/// A polynomial over the rationals.
///
/// Terms are keyed by monomial in graded lexicographic order; zero
/// coefficients are never stored, so the zero polynomial has no terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Poly {
    terms: BTreeMap<Monomial, BigRational>,
}

impl Poly {
    /// The zero polynomial.
    pub fn zero() -> Self {
        Poly::default()
    }

    /// The constant polynomial 1.
    pub fn one() -> Self {
        Poly::constant(BigRational::one())
    }

    /// A constant polynomial.
    pub fn constant(value: BigRational) -> Self {
        Poly::term(Monomial::one(), value)
    }

    /// A single symbol.
    pub fn var(symbol: Symbol) -> Self {
        Poly::term(Monomial::var(symbol), BigRational::one())
    }

    /// A single term `coeff * monomial`.
    pub fn term(monomial: Monomial, coeff: BigRational) -> Self {
        let mut terms = BTreeMap::new();
        if !coeff.is_zero() {
            terms.insert(monomial, coeff);
        }
        Poly { terms }
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Whether the polynomial has no symbols (zero included).
    pub fn is_constant(&self) -> bool {
        self.terms.keys().all(Monomial::is_one)
    }

    pub fn is_one(&self) -> bool {
        self.as_constant().is_some_and(|c| c.is_one())
    }

    /// The constant value, if the polynomial has no symbols.
    pub fn as_constant(&self) -> Option<BigRational> {
        if self.is_zero() {
            return Some(BigRational::zero());
        }
        if self.is_constant() {
            return self.terms.values().next().cloned();
        }
        None
    }

    /// Number of stored terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Iterate terms from the highest monomial down.
    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, &BigRational)> {
        self.terms.iter().rev()
    }

    /// Leading term in graded lexicographic order.
    pub fn leading(&self) -> Option<(&Monomial, &BigRational)> {
        self.terms.iter().next_back()
    }

    /// Coefficient of the leading term (zero for the zero polynomial).
    pub fn leading_coeff(&self) -> BigRational {
        self.leading()
            .map(|(_, c)| c.clone())
            .unwrap_or_else(BigRational::zero)
    }

    /// All symbols appearing in the polynomial.
    pub fn symbols(&self) -> BTreeSet<Symbol> {
        self.terms
            .keys()
            .flat_map(|m| m.factors().map(|(s, _)| s.clone()))
            .collect()
    }

    /// Whether `symbol` appears in any term.
    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.terms.keys().any(|m| m.exponent(symbol) > 0)
    }

    /// Highest power of `symbol` appearing in any term.
    pub fn degree_in(&self, symbol: &Symbol) -> u32 {
        self.terms
            .keys()
            .map(|m| m.exponent(symbol))
            .max()
            .unwrap_or(0)
    }

    /// Multiply every coefficient by `factor`.
    pub fn scale(&self, factor: &BigRational) -> Poly {
        if factor.is_zero() {
            return Poly::zero();
        }
        Poly {
            terms: self
                .terms
                .iter()
                .map(|(m, c)| (m.clone(), c * factor))
                .collect(),
        }
    }

    /// Multiply by a single term.
    pub fn mul_term(&self, monomial: &Monomial, coeff: &BigRational) -> Poly {
        if coeff.is_zero() {
            return Poly::zero();
        }
        Poly {
            terms: self
                .terms
                .iter()
                .map(|(m, c)| (m.mul(monomial), c * coeff))
                .collect(),
        }
    }

    pub(crate) fn add_term(&mut self, monomial: Monomial, coeff: BigRational) {
        if coeff.is_zero() {
            return;
        }
        let entry = self.terms.entry(monomial);
        match entry {
            std::collections::btree_map::Entry::Vacant(v) => {
                v.insert(coeff);
            }
            std::collections::btree_map::Entry::Occupied(mut o) => {
                let sum = o.get() + coeff;
                if sum.is_zero() {
                    o.remove();
                } else {
                    *o.get_mut() = sum;
                }
            }
        }
    }

    pub fn add(&self, other: &Poly) -> Poly {
        let mut out = self.clone();
        for (m, c) in &other.terms {
            out.add_term(m.clone(), c.clone());
        }
        out
    }

    pub fn sub(&self, other: &Poly) -> Poly {
        let mut out = self.clone();
        for (m, c) in &other.terms {
            out.add_term(m.clone(), -c.clone());
        }
        out
    }

    pub fn neg(&self) -> Poly {
        Poly {
            terms: self.terms.iter().map(|(m, c)| (m.clone(), -c.clone())).collect(),
        }
    }

    pub fn mul(&self, other: &Poly) -> Poly {
        let mut out = Poly::zero();
        for (ma, ca) in &self.terms {
            for (mb, cb) in &other.terms {
                out.add_term(ma.mul(mb), ca * cb);
            }
        }
        out
    }

    /// Raise to a non-negative integer power.
    pub fn pow(&self, exp: u32) -> Poly {
        let mut out = Poly::one();
        for _ in 0..exp {
            out = out.mul(self);
        }
        out
    }

    /// Exact quotient `self / divisor`, or `None` when the division leaves a
    /// remainder (or `divisor` is zero).
    pub fn div_exact(&self, divisor: &Poly) -> Option<Poly> {
        let (lead_m, lead_c) = divisor.leading()?;
        if divisor.len() == 1 {
            return self.div_term(lead_m, lead_c);
        }
        let mut quotient = Poly::zero();
        let mut rest = self.clone();
        loop {
            let (qm, qc) = match rest.leading() {
                None => break,
                Some((m, c)) => (m.div(lead_m)?, c / lead_c),
            };
            rest = rest.sub(&divisor.mul_term(&qm, &qc));
            quotient.add_term(qm, qc);
        }
        Some(quotient)
    }

    fn div_term(&self, monomial: &Monomial, coeff: &BigRational) -> Option<Poly> {
        let mut terms = BTreeMap::new();
        for (m, c) in &self.terms {
            terms.insert(m.div(monomial)?, c / coeff);
        }
        Some(Poly { terms })
    }

    /// Split into coefficients of powers of `symbol`: `self = Σ coeffs[k] * symbol^k`.
    pub fn coefficients_in(&self, symbol: &Symbol) -> Vec<Poly> {
        let mut coeffs = vec![Poly::zero(); self.degree_in(symbol) as usize + 1];
        for (m, c) in &self.terms {
            let k = m.exponent(symbol) as usize;
            coeffs[k].add_term(m.without(symbol), c.clone());
        }
        coeffs
    }

    /// Rebuild a polynomial from coefficients of powers of `symbol`.
    pub fn from_coefficients(symbol: &Symbol, coeffs: &[Poly]) -> Poly {
        let mut out = Poly::zero();
        for (k, coeff) in coeffs.iter().enumerate() {
            let power = Monomial::power(symbol.clone(), k as u32);
            for (m, c) in &coeff.terms {
                out.add_term(m.mul(&power), c.clone());
            }
        }
        out
    }

    /// Split into `Σ coeffs[i] * unknowns[i] + rest`, or `None` when an
    /// unknown appears with a power above one or times another unknown.
    pub fn linear_form(&self, unknowns: &[Symbol]) -> Option<(Vec<Poly>, Poly)> {
        let mut coeffs = vec![Poly::zero(); unknowns.len()];
        let mut rest = Poly::zero();
        for (m, c) in &self.terms {
            let mut hit = None;
            for (i, u) in unknowns.iter().enumerate() {
                match m.exponent(u) {
                    0 => {}
                    1 if hit.is_none() => hit = Some(i),
                    _ => return None,
                }
            }
            match hit {
                Some(i) => coeffs[i].add_term(m.without(&unknowns[i]), c.clone()),
                None => rest.add_term(m.clone(), c.clone()),
            }
        }
        Some((coeffs, rest))
    }

    /// Greatest common divisor of all monomials (the largest monomial factor).
    pub fn monomial_content(&self) -> Monomial {
        let mut keys = self.terms.keys();
        match keys.next() {
            None => Monomial::one(),
            Some(first) => keys.fold(first.clone(), |acc, m| acc.gcd(m)),
        }
    }

    /// Scale so the leading coefficient is 1.
    pub fn monic(&self) -> Poly {
        match self.leading() {
            None => Poly::zero(),
            Some((_, c)) if c.is_one() => self.clone(),
            Some((_, c)) => self.scale(&c.recip()),
        }
    }

    /// Whether the leading coefficient is negative.
    pub fn is_negative_leading(&self) -> bool {
        self.leading().is_some_and(|(_, c)| c.is_negative())
    }
}

impl fmt::Display for Poly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0");
        }
        for (k, (m, c)) in self.terms().enumerate() {
            let negative = c.is_negative();
            let magnitude = c.abs();
            match (k, negative) {
                (0, true) => f.write_str("-")?,
                (0, false) => {}
                (_, true) => f.write_str(" - ")?,
                (_, false) => f.write_str(" + ")?,
            }
            if m.is_one() {
                write!(f, "{}", magnitude)?;
            } else if magnitude.is_one() {
                write!(f, "{}", m)?;
            } else {
                write!(f, "{}*{}", magnitude, m)?;
            }
        }
        Ok(())
    }
}
