//! Exact symbolic linear solver.
//!
//! Rows are brought to polynomial form by dropping each equation's
//! denominator, then eliminated fraction-free (Bareiss): every update
//! `(p * a_ij - a_ik * a_kj) / p_prev` divides exactly, so entries stay
//! polynomials and no GCD is taken until each solution is formed.

use indexmap::IndexMap;
use nalgebra::{DMatrix, DVector};
use num_rational::BigRational;
use rtds_core::expr::Poly;
use rtds_core::{Expr, Symbol};

use crate::error::{Error, Result};

/// Dense linear system `A x = b` with polynomial entries.
#[derive(Debug, Clone)]
pub struct LinearSystem {
    unknowns: Vec<Symbol>,
    a: DMatrix<Poly>,
    b: DVector<Poly>,
}

impl LinearSystem {
    /// Build the system from expressions that are each implicitly `= 0`.
    ///
    /// Fails with a non-linearity error if an unknown appears anywhere other
    /// than as a plain first-order factor.
    pub fn from_equations<'a, I>(equations: I, unknowns: &[Symbol]) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Expr>,
    {
        let mut rows = Vec::new();
        let mut rhs = Vec::new();
        for equation in equations {
            let (coeffs, rest) = equation.cleared_linear_form(unknowns)?;
            let (coeffs, rest) = strip_monomial_content(coeffs, rest);
            rows.push(coeffs);
            rhs.push(rest.neg());
        }

        let mut a = DMatrix::from_element(rows.len(), unknowns.len(), Poly::zero());
        for (r, coeffs) in rows.into_iter().enumerate() {
            for (c, coeff) in coeffs.into_iter().enumerate() {
                a[(r, c)] = coeff;
            }
        }
        Ok(Self {
            unknowns: unknowns.to_vec(),
            a,
            b: DVector::from_vec(rhs),
        })
    }

    pub fn unknowns(&self) -> &[Symbol] {
        &self.unknowns
    }

    pub fn matrix(&self) -> &DMatrix<Poly> {
        &self.a
    }

    pub fn rhs(&self) -> &DVector<Poly> {
        &self.b
    }

    /// Solve by fraction-free Gauss-Jordan elimination.
    ///
    /// Each column pivots on its shortest nonzero entry. After the last
    /// pivot every pivot row reads `d * x_col = b'`, with `d` the final
    /// pivot. Redundant rows are accepted as long as they are consistent.
    pub fn solve(&self) -> Result<IndexMap<Symbol, Expr>> {
        let rows = self.a.nrows();
        let n = self.unknowns.len();

        let mut m = DMatrix::from_element(rows, n + 1, Poly::zero());
        m.columns_mut(0, n).copy_from(&self.a);
        m.column_mut(n).copy_from(&self.b);

        let mut previous = Poly::one();
        let mut pivots = Vec::with_capacity(n);
        let mut row = 0;
        for col in 0..n {
            if row == rows {
                break;
            }
            let Some(best) = (row..rows)
                .filter(|&r| !m[(r, col)].is_zero())
                .min_by_key(|&r| m[(r, col)].len())
            else {
                continue;
            };
            m.swap_rows(row, best);

            let pivot = m[(row, col)].clone();
            for r in (0..rows).filter(|&r| r != row) {
                let factor = m[(r, col)].clone();
                for c in (0..=n).filter(|&c| c != col) {
                    if factor.is_zero() && m[(r, c)].is_zero() {
                        continue;
                    }
                    let cross = pivot.mul(&m[(r, c)]).sub(&factor.mul(&m[(row, c)]));
                    m[(r, c)] = cross
                        .div_exact(&previous)
                        .ok_or_else(|| Error::InexactElimination(self.unknowns[col].to_string()))?;
                }
                m[(r, col)] = Poly::zero();
            }
            log::trace!(
                "pivot {} on row {}: {} terms",
                self.unknowns[col],
                row,
                pivot.len()
            );
            previous = pivot;
            pivots.push(col);
            row += 1;
        }

        // Rows past the rank are zero on the left; a nonzero right-hand side
        // is a contradiction.
        if (row..rows).any(|r| !m[(r, n)].is_zero()) {
            return Err(Error::NoSolution);
        }
        if pivots.len() < n {
            return Err(Error::Underdetermined {
                free: n - pivots.len(),
            });
        }

        let mut values: Vec<Option<Expr>> = vec![None; n];
        for (r, &col) in pivots.iter().enumerate() {
            let value = Expr::from_parts(m[(r, n)].clone(), m[(r, col)].clone())
                .ok_or(Error::NoSolution)?;
            values[col] = Some(value);
        }
        Ok(self
            .unknowns
            .iter()
            .cloned()
            .zip(values)
            .filter_map(|(u, v)| v.map(|v| (u, v)))
            .collect())
    }
}

/// Divide a row by the monomial every entry shares.
fn strip_monomial_content(coeffs: Vec<Poly>, rest: Poly) -> (Vec<Poly>, Poly) {
    let shared = coeffs
        .iter()
        .chain(std::iter::once(&rest))
        .filter(|p| !p.is_zero())
        .map(Poly::monomial_content)
        .reduce(|acc, m| acc.gcd(&m));
    match shared {
        Some(shared) if !shared.is_one() => {
            let divisor = Poly::term(shared, BigRational::from_integer(1.into()));
            let strip = |p: Poly| p.div_exact(&divisor).unwrap_or(p);
            (coeffs.into_iter().map(strip).collect(), strip(rest))
        }
        _ => (coeffs, rest),
    }
}

/// Solve `equations = 0` for `unknowns`, returning one expression per unknown
/// in the order given.
pub fn solve_linear<'a, I>(equations: I, unknowns: &[Symbol]) -> Result<IndexMap<Symbol, Expr>>
where
    I: IntoIterator<Item = &'a Expr>,
{
    let system = LinearSystem::from_equations(equations, unknowns)?;
    log::debug!(
        "solving {} equations in {} unknowns",
        system.a.nrows(),
        system.unknowns.len()
    );
    system.solve()
}
