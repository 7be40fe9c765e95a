//! Multivariate polynomial GCD over the rationals.
//!
//! Recursive content/primitive-part scheme: pick a symbol `x`, split both
//! operands into content (GCD of their coefficients in `x`, which recurses on
//! one fewer symbol) and primitive part, then run a primitive
//! pseudo-remainder sequence in `x` on the primitive parts.
//!
//! Most pairs met in circuit algebra are coprime, so every call first maps
//! both operands to univariate images at a fixed integer point. A symbol
//! whose images are coprime (with their degrees preserved) cannot appear in
//! the GCD, which lets the expensive sequence run only on symbols that might.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};

use super::{Poly, Symbol};

/// Evaluation points tried before a symbol is handed to the full sequence.
const IMAGE_ATTEMPTS: usize = 2;

/// Greatest common divisor of two polynomials, scaled to a leading
/// coefficient of 1. `gcd(0, 0)` is 0.
pub fn gcd(a: &Poly, b: &Poly) -> Poly {
    if a.is_zero() {
        return b.monic();
    }
    if b.is_zero() {
        return a.monic();
    }
    if a.is_constant() || b.is_constant() {
        return Poly::one();
    }

    // Monomial factors are split off first; they are cheap to find and
    // keep the pseudo-remainder sequence small.
    let ma = a.monomial_content();
    let mb = b.monomial_content();
    let shared = ma.gcd(&mb);
    let a = a.div_exact(&Poly::term(ma, BigRational::one())).unwrap_or_else(|| a.clone());
    let b = b.div_exact(&Poly::term(mb, BigRational::one())).unwrap_or_else(|| b.clone());

    let g = gcd_nonzero(&a, &b);
    g.mul(&Poly::term(shared, BigRational::one())).monic()
}

fn gcd_nonzero(a: &Poly, b: &Poly) -> Poly {
    if a.is_constant() || b.is_constant() {
        return Poly::one();
    }
    let sa = a.symbols();
    let sb = b.symbols();
    let shared: Vec<Symbol> = sa.intersection(&sb).cloned().collect();
    if shared.is_empty() {
        return Poly::one();
    }

    let all: Vec<Symbol> = sa.union(&sb).cloned().collect();
    let (clean, suspect): (Vec<Symbol>, Vec<Symbol>) = shared
        .into_iter()
        .partition(|x| coprime_in(a, b, x, &all));
    if suspect.is_empty() {
        return Poly::one();
    }

    if a.len() <= b.len() {
        if b.div_exact(a).is_some() {
            return a.monic();
        }
    } else if a.div_exact(b).is_some() {
        return b.monic();
    }

    // A symbol only one side has, or one shown to be coprime, is absent
    // from the GCD, so the GCD divides both contents in it.
    let unshared = sa.symmetric_difference(&sb).next().cloned();
    if let Some(x) = clean.into_iter().next().or(unshared) {
        return gcd(&content(a, &x), &content(b, &x));
    }

    let Some(x) = suspect
        .into_iter()
        .min_by_key(|x| a.degree_in(x).max(b.degree_in(x)))
    else {
        return Poly::one();
    };
    let ca = content(a, &x);
    let cb = content(b, &x);
    let pa = a.div_exact(&ca).unwrap_or_else(|| a.clone());
    let pb = b.div_exact(&cb).unwrap_or_else(|| b.clone());
    let c = gcd(&ca, &cb);
    c.mul(&primitive_sequence(pa, pb, &x))
}

/// Whether `x` provably does not divide into the GCD of `a` and `b`: some
/// image of both at a fixed point of the other symbols keeps its degree in
/// `x` and has a constant univariate GCD.
fn coprime_in(a: &Poly, b: &Poly, x: &Symbol, symbols: &[Symbol]) -> bool {
    let (da, db) = (a.degree_in(x) as usize, b.degree_in(x) as usize);
    (0..IMAGE_ATTEMPTS).any(|attempt| {
        let point = |s: &Symbol| -> BigRational {
            let index = symbols.iter().position(|t| t == s).unwrap_or(0);
            let value = 3 + (index * 37 + attempt * 101 + 11) % 997;
            BigRational::from_integer(BigInt::from(value))
        };
        let ia = image(a, x, &point);
        let ib = image(b, x, &point);
        ia.len() == da + 1 && ib.len() == db + 1 && univariate_gcd_degree(ia, ib) == 0
    })
}

/// Dense coefficients (lowest power first, trailing zeros trimmed) of `p`
/// with every symbol other than `x` replaced by `point`.
fn image(p: &Poly, x: &Symbol, point: &impl Fn(&Symbol) -> BigRational) -> Vec<BigRational> {
    let mut coeffs = vec![BigRational::zero(); p.degree_in(x) as usize + 1];
    for (m, c) in p.terms() {
        let mut value = c.clone();
        let mut power = 0;
        for (s, e) in m.factors() {
            if s == x {
                power = e as usize;
            } else {
                value *= num_traits::pow(point(s), e as usize);
            }
        }
        coeffs[power] += value;
    }
    trim(&mut coeffs);
    coeffs
}

fn trim(coeffs: &mut Vec<BigRational>) {
    while coeffs.last().is_some_and(Zero::is_zero) {
        coeffs.pop();
    }
}

/// Degree of the GCD of two dense univariate polynomials over the rationals.
fn univariate_gcd_degree(mut f: Vec<BigRational>, mut g: Vec<BigRational>) -> usize {
    while !g.is_empty() {
        // f mod g
        while f.len() >= g.len() {
            let Some(lead_f) = f.last().cloned() else {
                break;
            };
            let shift = f.len() - g.len();
            let factor = lead_f / &g[g.len() - 1];
            for (k, c) in g.iter().enumerate() {
                f[k + shift] -= &factor * c;
            }
            f.pop();
            trim(&mut f);
        }
        std::mem::swap(&mut f, &mut g);
    }
    f.len().saturating_sub(1)
}

/// GCD of the coefficients of `p` viewed as a polynomial in `x`.
pub fn content(p: &Poly, x: &Symbol) -> Poly {
    let mut acc = Poly::zero();
    for coeff in p.coefficients_in(x) {
        if coeff.is_zero() {
            continue;
        }
        acc = gcd(&acc, &coeff);
        if acc.is_constant() {
            return Poly::one();
        }
    }
    acc
}

/// `p` divided by its content in `x`.
pub fn primitive_part(p: &Poly, x: &Symbol) -> Poly {
    if p.is_zero() {
        return Poly::zero();
    }
    let c = content(p, x);
    p.div_exact(&c).unwrap_or_else(|| p.clone())
}

/// Pseudo-remainder of `f` by `g` in `x`. Returns `f` unchanged when
/// `deg_x(f) < deg_x(g)`.
pub fn pseudo_remainder(f: &Poly, g: &Poly, x: &Symbol) -> Poly {
    let n = g.degree_in(x);
    let g_coeffs = g.coefficients_in(x);
    let lc_g = &g_coeffs[n as usize];
    let mut r = f.clone();
    while !r.is_zero() && r.degree_in(x) >= n {
        let deg = r.degree_in(x);
        let lc_r = r.coefficients_in(x).swap_remove(deg as usize);
        let shift = Poly::var(x.clone()).pow(deg - n);
        r = r.mul(lc_g).sub(&lc_r.mul(&shift).mul(g));
    }
    r
}

fn primitive_sequence(a: Poly, b: Poly, x: &Symbol) -> Poly {
    let (mut f, mut g) = if a.degree_in(x) >= b.degree_in(x) {
        (a, b)
    } else {
        (b, a)
    };
    loop {
        if !g.contains(x) {
            // Both operands are primitive, so a divisor free of `x` is a unit.
            return Poly::one();
        }
        let r = pseudo_remainder(&f, &g, x);
        if r.is_zero() {
            return primitive_part(&g, x);
        }
        if !r.contains(x) {
            return Poly::one();
        }
        f = g;
        g = primitive_part(&r, x);
    }
}
