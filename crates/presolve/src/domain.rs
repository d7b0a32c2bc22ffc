//! Sets of integer values, represented as unions of closed intervals, that are
//! used as the domains of decision variables.

use std::{
	fmt::{self, Debug, Display},
	ops::RangeInclusive,
};

use delegate::delegate;
use itertools::Itertools;
use rangelist::{IntervalIterator, RangeList};

use crate::{
	helpers::{div_ceil, div_floor},
	IntVal, NonZeroIntVal,
};

#[derive(Clone, PartialEq, Eq, Hash)]
/// A set of admissible integer values.
///
/// The set is stored as a list of closed intervals that are sorted, disjoint,
/// and non-adjacent. All values are kept within [`Domain::MIN_VALUE`] and
/// [`Domain::MAX_VALUE`], which ensures that negation can never overflow. The
/// empty domain is a valid value, and is used to represent that a variable
/// cannot take any value.
pub struct Domain {
	/// The intervals of the domain.
	ranges: RangeList<IntVal>,
}

impl Domain {
	/// The default number of intervals after which a domain is considered too
	/// complex, and the number of values after which multiplication is no
	/// longer performed exactly.
	pub const DEFAULT_COMPLEXITY_LIMIT: usize = 100;
	/// The largest value that can be contained in a domain.
	pub const MAX_VALUE: IntVal = IntVal::MAX;
	/// The smallest value that can be contained in a domain.
	pub const MIN_VALUE: IntVal = -IntVal::MAX;

	/// Returns the sum of the two domains: `{ a + b | a ∈ self, b ∈ other }`.
	///
	/// Note that the number of intervals of the result can be as large as the
	/// product of the number of intervals of the arguments. Callers that
	/// repeatedly add domains should use [`Self::relax_if_too_complex`].
	pub fn addition_with(&self, other: &Self) -> Self {
		let rhs = other.intervals().collect_vec();
		Self::from_intervals(
			self.intervals()
				.cartesian_product(rhs)
				.map(|((a_lb, a_ub), (b_lb, b_ub))| {
					(a_lb.saturating_add(b_lb), a_ub.saturating_add(b_ub))
				}),
		)
	}

	/// The domain that contains every representable value.
	pub fn all_values() -> Self {
		Self::new(Self::MIN_VALUE, Self::MAX_VALUE)
	}

	/// Returns all representable values that are not in the domain.
	pub fn complement(&self) -> Self {
		let mut gaps = Vec::new();
		let mut next = Some(Self::MIN_VALUE);
		for (lb, ub) in self.intervals() {
			if let Some(start) = next {
				if start < lb {
					gaps.push((start, lb - 1));
				}
			}
			next = (ub < Self::MAX_VALUE).then(|| ub + 1);
		}
		if let Some(start) = next {
			gaps.push((start, Self::MAX_VALUE));
		}
		Self::from_sorted(gaps)
	}

	/// Whether the given value is a member of the domain.
	pub fn contains(&self, value: IntVal) -> bool {
		self.ranges.contains(&value)
	}

	/// Returns the smallest interval that contains `{ v * coeff | v ∈ self }`.
	pub fn continuous_multiplication_by(&self, coeff: IntVal) -> Self {
		if self.is_empty() {
			return Self::empty();
		}
		let a = self.min().saturating_mul(coeff);
		let b = self.max().saturating_mul(coeff);
		Self::new(a.min(b), a.max(b))
	}

	/// The domain that does not contain any value.
	pub fn empty() -> Self {
		Self::from_sorted(Vec::new())
	}

	/// Create a domain from a list of closed intervals `(lb, ub)`.
	///
	/// The intervals can be given in any order and may overlap; intervals where
	/// `lb > ub` are ignored.
	pub fn from_intervals<I: IntoIterator<Item = (IntVal, IntVal)>>(intervals: I) -> Self {
		let mut intervals = intervals
			.into_iter()
			.map(|(lb, ub)| (lb.max(Self::MIN_VALUE), ub.min(Self::MAX_VALUE)))
			.filter(|(lb, ub)| lb <= ub)
			.collect_vec();
		intervals.sort_unstable();
		let mut merged: Vec<(IntVal, IntVal)> = Vec::with_capacity(intervals.len());
		for (lb, ub) in intervals {
			match merged.last_mut() {
				Some((_, last_ub)) if lb <= last_ub.saturating_add(1) => {
					*last_ub = (*last_ub).max(ub);
				}
				_ => merged.push((lb, ub)),
			}
		}
		Self::from_sorted(merged)
	}

	/// Internal method to create a domain from intervals that are already
	/// sorted, disjoint, non-adjacent and within the representable range.
	fn from_sorted(intervals: Vec<(IntVal, IntVal)>) -> Self {
		debug_assert!(intervals
			.iter()
			.tuple_windows()
			.all(|((_, a_ub), (b_lb, _))| a_ub.saturating_add(1) < *b_lb));
		Self {
			ranges: intervals.into_iter().map(|(lb, ub)| lb..=ub).collect(),
		}
	}

	/// Create a domain that contains exactly the given values.
	pub fn from_values<I: IntoIterator<Item = IntVal>>(values: I) -> Self {
		Self::from_intervals(values.into_iter().map(|v| (v, v)))
	}

	/// Returns the intersection of the two domains.
	pub fn intersection_with(&self, other: &Self) -> Self {
		let a = self.intervals().collect_vec();
		let b = other.intervals().collect_vec();
		let mut result = Vec::new();
		let (mut i, mut j) = (0, 0);
		while i < a.len() && j < b.len() {
			let lb = a[i].0.max(b[j].0);
			let ub = a[i].1.min(b[j].1);
			if lb <= ub {
				result.push((lb, ub));
			}
			if a[i].1 < b[j].1 {
				i += 1;
			} else {
				j += 1;
			}
		}
		Self::from_sorted(result)
	}

	/// Iterate over the intervals of the domain in increasing order, as `(lb,
	/// ub)` pairs.
	pub fn intervals(&self) -> impl Iterator<Item = (IntVal, IntVal)> + '_ {
		self.ranges.iter().map(|r| (*r.start(), *r.end()))
	}

	/// Returns `{ x | x * coeff ∈ self }`.
	///
	/// Unlike [`Self::multiplication_by`], the result of this operation is
	/// always exact.
	pub fn inverse_multiplication_by(&self, coeff: IntVal) -> Self {
		let Some(abs_coeff) = NonZeroIntVal::new(coeff.abs()) else {
			return if self.contains(0) {
				Self::all_values()
			} else {
				Self::empty()
			};
		};
		let positive = if coeff < 0 {
			self.negation()
		} else {
			self.clone()
		};
		Self::from_intervals(
			positive
				.intervals()
				.map(|(lb, ub)| (div_ceil(lb, abs_coeff), div_floor(ub, abs_coeff))),
		)
	}

	delegate! {
		to self.ranges {
			/// Whether the domain does not contain any values, i.e., a variable
			/// with this domain makes the model infeasible.
			pub fn is_empty(&self) -> bool;
		}
	}

	/// Whether the domain contains exactly one value.
	pub fn is_fixed(&self) -> bool {
		!self.is_empty() && self.min() == self.max()
	}

	/// Whether every value of the domain is also contained in `other`.
	pub fn is_included_in(&self, other: &Self) -> bool {
		let mut other_it = other.intervals().peekable();
		'outer: for (lb, ub) in self.intervals() {
			while let Some(&(o_lb, o_ub)) = other_it.peek() {
				if o_ub < lb {
					let _ = other_it.next();
				} else if o_lb <= lb && ub <= o_ub {
					continue 'outer;
				} else {
					return false;
				}
			}
			return false;
		}
		true
	}

	/// The largest value in the domain.
	///
	/// # Panics
	///
	/// Panics if the domain is empty.
	pub fn max(&self) -> IntVal {
		*self
			.ranges
			.upper_bound()
			.expect("the maximum of an empty domain is undefined")
	}

	/// The smallest value in the domain.
	///
	/// # Panics
	///
	/// Panics if the domain is empty.
	pub fn min(&self) -> IntVal {
		*self
			.ranges
			.lower_bound()
			.expect("the minimum of an empty domain is undefined")
	}

	/// Returns `{ v * coeff | v ∈ self }`, and whether this result is exact.
	///
	/// When the domain contains more than [`Self::DEFAULT_COMPLEXITY_LIMIT`]
	/// values and `|coeff| > 1`, the result is relaxed to
	/// [`Self::continuous_multiplication_by`], a superset of the exact result.
	pub fn multiplication_by(&self, coeff: IntVal) -> (Self, bool) {
		if self.is_empty() {
			return (Self::empty(), true);
		}
		match coeff {
			0 => (Self::singleton(0), true),
			1 => (self.clone(), true),
			-1 => (self.negation(), true),
			_ if self.size() > Self::DEFAULT_COMPLEXITY_LIMIT as u64 => {
				(self.continuous_multiplication_by(coeff), false)
			}
			_ => {
				let mut exact = true;
				let mut values = Vec::new();
				for v in self.intervals().flat_map(|(lb, ub)| lb..=ub) {
					values.push(v.checked_mul(coeff).unwrap_or_else(|| {
						exact = false;
						v.saturating_mul(coeff)
					}));
				}
				(Self::from_values(values), exact)
			}
		}
	}

	/// Returns `{ -v | v ∈ self }`.
	pub fn negation(&self) -> Self {
		Self::from_sorted(
			self.intervals()
				.map(|(lb, ub)| (-ub, -lb))
				.collect_vec()
				.into_iter()
				.rev()
				.collect(),
		)
	}

	/// Create a domain that contains all values in the interval `[lb, ub]`.
	///
	/// The domain is empty if `lb > ub`.
	pub fn new(lb: IntVal, ub: IntVal) -> Self {
		Self::from_intervals([(lb, ub)])
	}

	/// The number of intervals used to represent the domain.
	pub fn num_intervals(&self) -> usize {
		self.ranges.iter().count()
	}

	/// Returns the domain itself, or `[min, max]` if it consists of more than
	/// `limit` intervals.
	///
	/// The result always contains every value of the domain.
	pub fn relax_if_too_complex(&self, limit: usize) -> Self {
		if self.num_intervals() > limit {
			Self::new(self.min(), self.max())
		} else {
			self.clone()
		}
	}

	/// Returns a domain `D` such that `D ∩ implied == self ∩ implied`, that uses
	/// as few intervals as possible.
	///
	/// Parts of the domain that are outside of `implied` are removed, and the
	/// remaining intervals are extended over the gaps of `implied` surrounding
	/// them.
	pub fn simplify_using_implied_domain(&self, implied: &Self) -> Self {
		let implied_intervals = implied.intervals().collect_vec();
		let mut result = Vec::new();
		let mut k = 0;
		for (lb, ub) in self.intervals_within(implied) {
			// Every interval of the intersection lies within a single implied
			// interval.
			while implied_intervals[k].1 < lb {
				k += 1;
			}
			let (i_lb, i_ub) = implied_intervals[k];
			debug_assert!(i_lb <= lb && ub <= i_ub);
			let lb = match (lb == i_lb, k.checked_sub(1)) {
				(true, Some(prev)) => implied_intervals[prev].1 + 1,
				(true, None) => Self::MIN_VALUE,
				(false, _) => lb,
			};
			let ub = match (ub == i_ub, implied_intervals.get(k + 1)) {
				(true, Some(&(next_lb, _))) => next_lb - 1,
				(true, None) => Self::MAX_VALUE,
				(false, _) => ub,
			};
			result.push((lb, ub));
		}
		Self::from_intervals(result)
	}

	/// Internal method that returns the intervals of `self ∩ other`.
	fn intervals_within(&self, other: &Self) -> Vec<(IntVal, IntVal)> {
		self.intersection_with(other).intervals().collect()
	}

	/// Create a domain that contains only `value`.
	pub fn singleton(value: IntVal) -> Self {
		Self::new(value, value)
	}

	/// The number of values in the domain, saturating at [`u64::MAX`].
	pub fn size(&self) -> u64 {
		let size: u128 = self
			.intervals()
			.map(|(lb, ub)| (ub as i128 - lb as i128 + 1) as u128)
			.sum();
		size.min(u64::MAX as u128) as u64
	}

	/// Returns the union of the two domains.
	pub fn union_with(&self, other: &Self) -> Self {
		Self::from_intervals(self.intervals().chain(other.intervals()))
	}
}

impl Debug for Domain {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Domain{self}")
	}
}

impl Display for Domain {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let parts = self.intervals().map(|(lb, ub)| {
			if lb == ub {
				lb.to_string()
			} else {
				format!("{lb}..={ub}")
			}
		});
		write!(f, "[{}]", parts.format(", "))
	}
}

impl From<RangeInclusive<IntVal>> for Domain {
	fn from(value: RangeInclusive<IntVal>) -> Self {
		Self::new(*value.start(), *value.end())
	}
}

impl FromIterator<RangeInclusive<IntVal>> for Domain {
	fn from_iter<T: IntoIterator<Item = RangeInclusive<IntVal>>>(iter: T) -> Self {
		Self::from_intervals(iter.into_iter().map(|r| (*r.start(), *r.end())))
	}
}
