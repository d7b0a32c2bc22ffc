//! Methods to perform linear transformations.

use crate::{IntVal, NonZeroIntVal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// An integer linear transformation of a discrete value.
///
/// The transformation will take a discrete value `x` and transform it to `scale
/// * x + offset`. In the affine relation forest, `x` is the value of the parent
/// node and the result is the value of the child.
pub(crate) struct LinearTransform {
	/// The multiplicative scale.
	pub(crate) scale: NonZeroIntVal,
	/// The additive offset.
	pub(crate) offset: IntVal,
}

impl LinearTransform {
	/// Create the transformation `scale * x + offset`, if `scale` is non-zero.
	pub(crate) fn new(scale: IntVal, offset: IntVal) -> Option<Self> {
		NonZeroIntVal::new(scale).map(|scale| Self { scale, offset })
	}

	/// Composes two transformations, the resulting transformation first applies
	/// `inner` and then `self`.
	///
	/// If `child = self(parent)` and `parent = inner(root)`, then the result maps
	/// `root` to `child`.
	pub(crate) fn compose(&self, inner: &Self) -> Self {
		self.checked_compose(inner)
			.expect("overflow when composing linear transformations")
	}

	/// Composes two transformations (see [`Self::compose`]), returning `None` if
	/// the result cannot be represented.
	pub(crate) fn checked_compose(&self, inner: &Self) -> Option<Self> {
		let scale = self.scale.get().checked_mul(inner.scale.get())?;
		let offset = self
			.scale
			.get()
			.checked_mul(inner.offset)?
			.checked_add(self.offset)?;
		Self::new(scale, offset)
	}
}

impl Default for LinearTransform {
	fn default() -> Self {
		Self {
			scale: NonZeroIntVal::new(1).unwrap(),
			offset: 0,
		}
	}
}
