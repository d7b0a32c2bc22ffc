//! Small arithmetic helpers and data structures used throughout the crate.

pub(crate) mod linear_transform;
pub(crate) mod sparse_bitset;

use crate::{IntVal, NonZeroIntVal};

/// Integer division that rounds towards positive infinity.
pub(crate) fn div_ceil(a: IntVal, b: NonZeroIntVal) -> IntVal {
	let (d, r) = (a / b.get(), a % b.get());
	if (r > 0 && b.get() > 0) || (r < 0 && b.get() < 0) {
		d + 1
	} else {
		d
	}
}

/// Integer division that rounds towards negative infinity.
pub(crate) fn div_floor(a: IntVal, b: NonZeroIntVal) -> IntVal {
	let (d, r) = (a / b.get(), a % b.get());
	if (r > 0 && b.get() < 0) || (r < 0 && b.get() > 0) {
		d - 1
	} else {
		d
	}
}

/// Greatest common divisor of the absolute values of `a` and `b`.
///
/// Note that `gcd(0, b) == |b|`, which allows the function to be folded over a
/// sequence starting from zero.
pub(crate) fn gcd(a: IntVal, b: IntVal) -> IntVal {
	let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
	while b != 0 {
		(a, b) = (b, a % b);
	}
	a as IntVal
}
