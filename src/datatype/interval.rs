/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::fmt;
use std::ops;

use crate::error::AnalysisError;
use crate::error::Result;
use crate::linear::Op;

/*
 * A closed interval [lo, hi] over the extended reals.
 *
 * Invariants: lo <= hi, lo is never +inf, hi is never -inf, and neither
 * bound is NaN. There is no empty interval; an unreachable program point
 * is represented by the enclosing environment being bottom.
 */
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    lo: f64,
    hi: f64,
}

// Bounds are never NaN.
impl Eq for Interval {}

impl Interval {
    pub const TOP: Interval = Interval {
        lo: f64::NEG_INFINITY,
        hi: f64::INFINITY,
    };

    fn is_valid(lo: f64, hi: f64) -> bool {
        !lo.is_nan() && !hi.is_nan() && lo <= hi && lo != f64::INFINITY && hi != f64::NEG_INFINITY
    }

    pub fn try_new(lo: f64, hi: f64) -> Result<Self> {
        if Self::is_valid(lo, hi) {
            Ok(Self::new(lo, hi))
        } else {
            Err(AnalysisError::InvalidInterval { lo, hi })
        }
    }

    pub fn new(lo: f64, hi: f64) -> Self {
        assert!(Self::is_valid(lo, hi), "invalid interval [{}, {}]", lo, hi);
        // Adding zero turns -0 into 0.
        Self {
            lo: lo + 0.0,
            hi: hi + 0.0,
        }
    }

    /// Smallest interval containing every finite value a rounded `f64`
    /// result can stand for: an overflow to +inf means "above f64::MAX", and
    /// NaN carries no information at all.
    pub fn enclosing(value: f64) -> Self {
        if value.is_nan() {
            Self::TOP
        } else {
            Self::saturating(value, value)
        }
    }

    // Bounds computed with rounding may overflow past the invariants; clamp
    // them back without dropping any value.
    fn saturating(lo: f64, hi: f64) -> Self {
        let lo = if lo.is_nan() {
            f64::NEG_INFINITY
        } else {
            lo.min(f64::MAX)
        };
        let hi = if hi.is_nan() {
            f64::INFINITY
        } else {
            hi.max(f64::MIN)
        };
        Self::new(lo, hi)
    }

    pub fn constant(value: f64) -> Self {
        Self::new(value, value)
    }

    pub fn lo(&self) -> f64 {
        self.lo
    }

    pub fn hi(&self) -> f64 {
        self.hi
    }

    pub fn is_top(&self) -> bool {
        *self == Self::TOP
    }

    pub fn is_constant(&self) -> bool {
        self.lo == self.hi
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lo <= value && value <= self.hi
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        other.lo <= self.lo && self.hi <= other.hi
    }

    /// Smallest interval containing both operands.
    pub fn hull(&self, other: &Self) -> Self {
        Self::new(self.lo.min(other.lo), self.hi.max(other.hi))
    }

    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let lo = self.lo.max(other.lo);
        let hi = self.hi.min(other.hi);
        if lo <= hi {
            Some(Self::new(lo, hi))
        } else {
            None
        }
    }

    /// Bounds that moved outward from `self` to `other` jump to infinity.
    pub fn widen(&self, other: &Self) -> Self {
        let lo = if other.lo < self.lo {
            f64::NEG_INFINITY
        } else {
            self.lo
        };
        let hi = if other.hi > self.hi {
            f64::INFINITY
        } else {
            self.hi
        };
        Self::new(lo, hi)
    }

    /// Infinite bounds of `self` are refined by the bounds of `other`.
    pub fn narrow(&self, other: &Self) -> Self {
        let lo = if self.lo == f64::NEG_INFINITY {
            other.lo
        } else {
            self.lo
        };
        let hi = if self.hi == f64::INFINITY {
            other.hi
        } else {
            self.hi
        };
        Self::try_new(lo, hi).unwrap_or(*self)
    }

    pub fn scale(&self, factor: f64) -> Self {
        *self * Self::enclosing(factor)
    }

    /// The values of `self` satisfying `value OP bound`, closed over the
    /// reals, or `None` when there are none.
    pub fn restrict(&self, op: Op, bound: f64) -> Option<Self> {
        if bound.is_nan() {
            return Some(*self);
        }
        if bound.is_infinite() {
            let below_everything = bound < 0.0;
            return match op {
                Op::Le | Op::Lt if below_everything => None,
                Op::Le | Op::Lt => Some(*self),
                Op::Ge | Op::Gt if below_everything => Some(*self),
                Op::Ge | Op::Gt => None,
                Op::Eq => None,
                Op::Ne => Some(*self),
            };
        }

        match op {
            Op::Le if self.lo > bound => None,
            Op::Lt if self.lo >= bound => None,
            Op::Le | Op::Lt => Some(Self::new(self.lo, self.hi.min(bound))),
            Op::Ge if self.hi < bound => None,
            Op::Gt if self.hi <= bound => None,
            Op::Ge | Op::Gt => Some(Self::new(self.lo.max(bound), self.hi)),
            Op::Eq if self.contains(bound) => Some(Self::constant(bound)),
            Op::Eq => None,
            Op::Ne if self.lo == bound && self.hi == bound => None,
            Op::Ne => Some(*self),
        }
    }
}

// A zero factor absorbs infinite bounds.
fn mul_bound(lhs: f64, rhs: f64) -> f64 {
    if lhs == 0.0 || rhs == 0.0 {
        0.0
    } else {
        lhs * rhs
    }
}

impl ops::Add for Interval {
    type Output = Interval;

    fn add(self, rhs: Interval) -> Interval {
        Interval::saturating(self.lo + rhs.lo, self.hi + rhs.hi)
    }
}

impl ops::Sub for Interval {
    type Output = Interval;

    fn sub(self, rhs: Interval) -> Interval {
        Interval::saturating(self.lo - rhs.hi, self.hi - rhs.lo)
    }
}

impl ops::Mul for Interval {
    type Output = Interval;

    fn mul(self, rhs: Interval) -> Interval {
        let corners = [
            mul_bound(self.lo, rhs.lo),
            mul_bound(self.lo, rhs.hi),
            mul_bound(self.hi, rhs.lo),
            mul_bound(self.hi, rhs.hi),
        ];
        let lo = corners.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = corners.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Interval::saturating(lo, hi)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lo, self.hi)
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    const INF: f64 = f64::INFINITY;

    fn random_interval(rng: &mut impl Rng) -> Interval {
        let lo = if rng.gen_bool(0.1) {
            -INF
        } else {
            rng.gen_range(-20..=20) as f64
        };
        let hi = if rng.gen_bool(0.1) {
            INF
        } else {
            rng.gen_range(-20..=20) as f64
        };
        if lo <= hi {
            Interval::new(lo, hi)
        } else {
            Interval::new(hi, lo)
        }
    }

    #[test]
    fn test_validation() {
        assert!(Interval::try_new(0.0, 5.0).is_ok());
        assert!(Interval::try_new(-INF, INF).is_ok());
        assert_eq!(
            Interval::try_new(5.0, 0.0),
            Err(AnalysisError::InvalidInterval { lo: 5.0, hi: 0.0 })
        );
        assert!(Interval::try_new(INF, INF).is_err());
        assert!(Interval::try_new(-INF, -INF).is_err());
        assert!(Interval::try_new(f64::NAN, 1.0).is_err());
    }

    #[test]
    #[should_panic]
    fn test_inverted_interval_panics() {
        Interval::new(1.0, 0.0);
    }

    #[test]
    fn test_arithmetic() {
        let x = Interval::new(0.0, 5.0);
        let y = Interval::new(0.0, 5.0);
        assert_eq!(x + y, Interval::new(0.0, 10.0));
        assert_eq!(x - y, Interval::new(-5.0, 5.0));
        assert_eq!(
            Interval::new(-2.0, 3.0) * Interval::new(-4.0, 1.0),
            Interval::new(-12.0, 8.0)
        );
        assert_eq!(x.scale(-2.0), Interval::new(-10.0, 0.0));
    }

    #[test]
    fn test_arithmetic_with_infinities() {
        let upper = Interval::new(1.0, INF);
        assert_eq!(upper + Interval::constant(1.0), Interval::new(2.0, INF));
        assert_eq!(upper - upper, Interval::TOP);
        assert_eq!(upper.scale(-1.0), Interval::new(-INF, -1.0));
        // 0 * inf is 0, not NaN.
        assert_eq!(upper.scale(0.0), Interval::constant(0.0));
        assert_eq!(
            Interval::new(0.0, INF) * Interval::new(-1.0, 0.0),
            Interval::new(-INF, 0.0)
        );
    }

    #[test]
    fn test_overflow_saturates() {
        let huge = Interval::constant(1e308);
        assert_eq!(huge * Interval::constant(10.0), Interval::new(f64::MAX, INF));
        assert_eq!(huge.scale(10.0), Interval::new(f64::MAX, INF));
        assert_eq!(huge + huge, Interval::new(f64::MAX, INF));
        assert_eq!(
            Interval::constant(-1e308) - huge,
            Interval::new(-INF, f64::MIN)
        );
        assert_eq!(
            Interval::new(-1e308, 1e308).scale(10.0),
            Interval::TOP
        );

        assert_eq!(Interval::enclosing(INF), Interval::new(f64::MAX, INF));
        assert_eq!(Interval::enclosing(-INF), Interval::new(-INF, f64::MIN));
        assert_eq!(Interval::enclosing(f64::NAN), Interval::TOP);
        assert_eq!(Interval::enclosing(2.5), Interval::constant(2.5));
        assert_eq!(Interval::new(1.0, 2.0).scale(f64::NAN), Interval::TOP);
    }

    #[test]
    fn test_widen() {
        let a = Interval::new(0.0, 5.0);
        assert_eq!(a.widen(&Interval::new(0.0, 6.0)), Interval::new(0.0, INF));
        assert_eq!(a.widen(&Interval::new(-1.0, 5.0)), Interval::new(-INF, 5.0));
        assert_eq!(a.widen(&Interval::new(1.0, 4.0)), a);
        assert_eq!(a.widen(&Interval::new(-1.0, 6.0)), Interval::TOP);
    }

    #[test]
    fn test_narrow() {
        let a = Interval::new(0.0, INF);
        assert_eq!(a.narrow(&Interval::new(0.0, 101.0)), Interval::new(0.0, 101.0));
        assert_eq!(
            Interval::new(0.0, 5.0).narrow(&Interval::new(1.0, 2.0)),
            Interval::new(0.0, 5.0)
        );
    }

    #[test]
    fn test_restrict() {
        let c = Interval::new(-5.0, 15.0);
        assert_eq!(c.restrict(Op::Lt, -6.0), None);
        assert_eq!(c.restrict(Op::Lt, -5.0), None);
        assert_eq!(c.restrict(Op::Le, -5.0), Some(Interval::constant(-5.0)));
        assert_eq!(c.restrict(Op::Ge, -6.0), Some(c));
        assert_eq!(c.restrict(Op::Gt, 10.0), Some(Interval::new(10.0, 15.0)));
        assert_eq!(c.restrict(Op::Gt, 15.0), None);
        assert_eq!(c.restrict(Op::Eq, 3.0), Some(Interval::constant(3.0)));
        assert_eq!(c.restrict(Op::Eq, 30.0), None);
        assert_eq!(c.restrict(Op::Ne, 3.0), Some(c));
        assert_eq!(Interval::constant(3.0).restrict(Op::Ne, 3.0), None);
        assert_eq!(c.restrict(Op::Le, INF), Some(c));
        assert_eq!(c.restrict(Op::Ge, INF), None);
    }

    #[test]
    fn test_lattice_laws_with_rng() {
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let a = random_interval(&mut rng);
            let b = random_interval(&mut rng);

            assert_eq!(a.hull(&a), a);
            assert_eq!(a.hull(&b), b.hull(&a));
            assert!(a.is_subset(&a.hull(&b)));
            assert!(b.is_subset(&a.hull(&b)));

            let widened = a.widen(&b);
            assert!(a.is_subset(&widened));
            assert!(b.is_subset(&widened));

            if let Some(met) = a.intersect(&b) {
                assert!(met.is_subset(&a));
                assert!(met.is_subset(&b));
            }
        }
    }
}
