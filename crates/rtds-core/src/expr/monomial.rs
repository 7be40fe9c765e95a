//! Power products of symbols.

use std::cmp::Ordering;
use std::fmt;

use super::Symbol;

/// A product of symbols raised to positive integer powers.
///
/// Factors are kept sorted by symbol with no zero exponents, so two equal
/// monomials always have the same representation. The empty monomial is 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Monomial(Vec<(Symbol, u32)>);

impl Monomial {
    /// The monomial 1.
    pub fn one() -> Self {
        Monomial(Vec::new())
    }

    /// A single symbol to the first power.
    pub fn var(symbol: Symbol) -> Self {
        Monomial(vec![(symbol, 1)])
    }

    /// A single symbol to the given power (1 when `exp` is zero).
    pub fn power(symbol: Symbol, exp: u32) -> Self {
        if exp == 0 {
            Monomial::one()
        } else {
            Monomial(vec![(symbol, exp)])
        }
    }

    /// Whether this is the monomial 1.
    pub fn is_one(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all exponents.
    pub fn degree(&self) -> u32 {
        self.0.iter().map(|(_, e)| e).sum()
    }

    /// Exponent of `symbol` (0 when absent).
    pub fn exponent(&self, symbol: &Symbol) -> u32 {
        self.0
            .binary_search_by(|(s, _)| s.cmp(symbol))
            .map(|i| self.0[i].1)
            .unwrap_or(0)
    }

    /// Iterate over `(symbol, exponent)` factors in symbol order.
    pub fn factors(&self) -> impl Iterator<Item = (&Symbol, u32)> {
        self.0.iter().map(|(s, e)| (s, *e))
    }

    /// This monomial with `symbol` removed entirely.
    pub fn without(&self, symbol: &Symbol) -> Monomial {
        Monomial(self.0.iter().filter(|(s, _)| s != symbol).cloned().collect())
    }

    /// Product of two monomials.
    pub fn mul(&self, other: &Monomial) -> Monomial {
        let mut out = Vec::with_capacity(self.0.len() + other.0.len());
        let (mut i, mut j) = (0, 0);
        while i < self.0.len() && j < other.0.len() {
            let (a, ea) = &self.0[i];
            let (b, eb) = &other.0[j];
            match a.cmp(b) {
                Ordering::Less => {
                    out.push((a.clone(), *ea));
                    i += 1;
                }
                Ordering::Greater => {
                    out.push((b.clone(), *eb));
                    j += 1;
                }
                Ordering::Equal => {
                    out.push((a.clone(), ea + eb));
                    i += 1;
                    j += 1;
                }
            }
        }
        out.extend_from_slice(&self.0[i..]);
        out.extend_from_slice(&other.0[j..]);
        Monomial(out)
    }

    /// Quotient `self / other`, or `None` if `other` does not divide `self`.
    pub fn div(&self, other: &Monomial) -> Option<Monomial> {
        let mut out = Vec::with_capacity(self.0.len());
        let mut j = 0;
        for (s, e) in &self.0 {
            match other.0.get(j) {
                Some((t, f)) if t == s => {
                    if f > e {
                        return None;
                    }
                    if e > f {
                        out.push((s.clone(), e - f));
                    }
                    j += 1;
                }
                Some((t, _)) if t < s => return None,
                _ => out.push((s.clone(), *e)),
            }
        }
        if j < other.0.len() {
            return None;
        }
        Some(Monomial(out))
    }

    /// Greatest common divisor: the minimum exponent of every shared symbol.
    pub fn gcd(&self, other: &Monomial) -> Monomial {
        Monomial(
            self.0
                .iter()
                .filter_map(|(s, e)| {
                    let f = other.exponent(s);
                    (f > 0).then(|| (s.clone(), (*e).min(f)))
                })
                .collect(),
        )
    }
}

/// Graded lexicographic order: total degree first, then the exponent of the
/// earliest symbol decides. This order is compatible with multiplication.
impl Ord for Monomial {
    fn cmp(&self, other: &Self) -> Ordering {
        let by_degree = self.degree().cmp(&other.degree());
        if by_degree != Ordering::Equal {
            return by_degree;
        }
        let (mut i, mut j) = (0, 0);
        loop {
            match (self.0.get(i), other.0.get(j)) {
                (None, None) => return Ordering::Equal,
                (Some(_), None) => return Ordering::Greater,
                (None, Some(_)) => return Ordering::Less,
                (Some((a, ea)), Some((b, eb))) => match a.cmp(b) {
                    Ordering::Less => return Ordering::Greater,
                    Ordering::Greater => return Ordering::Less,
                    Ordering::Equal => {
                        if ea != eb {
                            return ea.cmp(eb);
                        }
                        i += 1;
                        j += 1;
                    }
                },
            }
        }
    }
}

impl PartialOrd for Monomial {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Monomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("1");
        }
        for (k, (s, e)) in self.0.iter().enumerate() {
            if k > 0 {
                f.write_str("*")?;
            }
            if *e == 1 {
                write!(f, "{}", s)?;
            } else {
                write!(f, "{}**{}", s, e)?;
            }
        }
        Ok(())
    }
}
