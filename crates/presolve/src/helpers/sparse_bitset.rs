//! A set of indexes that can be drained in time proportional to its number of
//! members, rather than its capacity.

use std::mem;

use index_vec::{Idx, IndexVec};

#[derive(Debug, Clone)]
/// Set of indexes with constant time insertion and membership tests, that
/// remembers the order in which its members were inserted.
pub(crate) struct SparseBitset<I: Idx> {
	/// Whether each index is currently a member of the set.
	contains: IndexVec<I, bool>,
	/// The members of the set, in insertion order.
	members: Vec<I>,
}

impl<I: Idx> SparseBitset<I> {
	/// Whether `i` is a member of the set.
	pub(crate) fn contains(&self, i: I) -> bool {
		i.index() < self.contains.len() && self.contains[i]
	}

	/// Change the capacity of the set to `len` indexes.
	///
	/// The set can only grow, i.e., `len` must be at least the current capacity.
	pub(crate) fn resize(&mut self, len: usize) {
		debug_assert!(len >= self.contains.len());
		self.contains.resize(len, false);
	}

	/// Add `i` to the set.
	pub(crate) fn set(&mut self, i: I) {
		if !self.contains[i] {
			self.contains[i] = true;
			self.members.push(i);
		}
	}

	/// Remove all members from the set, returning them in insertion order.
	pub(crate) fn take(&mut self) -> Vec<I> {
		for &i in &self.members {
			self.contains[i] = false;
		}
		mem::take(&mut self.members)
	}
}

impl<I: Idx> Default for SparseBitset<I> {
	fn default() -> Self {
		Self {
			contains: IndexVec::new(),
			members: Vec::new(),
		}
	}
}
