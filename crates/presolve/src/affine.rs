//! Union-find forests that record affine relations `var = coeff *
//! representative + offset` between the variables of a model.

use index_vec::IndexVec;
use tracing::trace;

use crate::{helpers::linear_transform::LinearTransform, IntVal, VarIndex};

#[derive(Clone, Debug, Default)]
/// A partition of variables into classes, where every variable of a class is
/// an affine function of the representative of its class.
///
/// Every node of the forest stores the transformation that maps the value of
/// its parent to its own value. Classes are created lazily: a variable that has
/// never been related to another variable is its own representative.
pub struct AffineRelations {
	/// The parent of each node, representatives are their own parent.
	parent: IndexVec<VarIndex, VarIndex>,
	/// The transformation from the value of the parent to the value of the
	/// node.
	transform: IndexVec<VarIndex, LinearTransform>,
	/// The number of variables in the class (only maintained for
	/// representatives).
	size: IndexVec<VarIndex, usize>,
	/// The largest absolute coefficient and offset of the relation between any
	/// variable of the class and its representative (only maintained for
	/// representatives).
	extremes: IndexVec<VarIndex, (IntVal, IntVal)>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// The relation `var = coeff * representative + offset` between a variable and
/// the representative of its class.
pub struct Relation {
	/// The representative of the class.
	pub representative: VarIndex,
	/// The (non-zero) coefficient of the representative.
	pub coeff: IntVal,
	/// The constant offset.
	pub offset: IntVal,
}

impl AffineRelations {
	/// Returns the number of variables in the class of `var`.
	pub fn class_size(&self, var: VarIndex) -> usize {
		if var.index() >= self.parent.len() {
			return 1;
		}
		self.size[self.root(var)]
	}

	/// Internal method to make sure that `var` (and all variables with a smaller
	/// index) are part of the forest.
	fn ensure_node(&mut self, var: VarIndex) {
		while self.parent.len() <= var.index() {
			let node = self.parent.next_idx();
			let _ = self.parent.push(node);
			let _ = self.transform.push(LinearTransform::default());
			let _ = self.size.push(1);
			let _ = self.extremes.push((1, 0));
		}
	}

	/// Returns the relation between `var` and the representative of its class.
	///
	/// Note that the lookup does not compress the path to the representative;
	/// paths are compressed when relations are added.
	pub fn get(&self, var: VarIndex) -> Relation {
		if var.index() >= self.parent.len() {
			return Relation::identity(var);
		}
		let mut acc = LinearTransform::default();
		let mut node = var;
		while self.parent[node] != node {
			acc = acc.compose(&self.transform[node]);
			node = self.parent[node];
		}
		Relation {
			representative: node,
			coeff: acc.scale.get(),
			offset: acc.offset,
		}
	}

	/// Internal method that returns the extremes of the class of `root` after
	/// the class of `child` is placed under it using `transform`, or `None` if
	/// the relation of a member of the class of `child` to `root` would not be
	/// representable.
	fn merged_extremes(
		&self,
		child: VarIndex,
		root: VarIndex,
		transform: &LinearTransform,
	) -> Option<(IntVal, IntVal)> {
		let (scale, offset) = self.extremes[child];
		// member = s * child + o and child = ts * root + to, and thus
		// member = (s * ts) * root + (s * to + o).
		let new_scale = scale.checked_mul(transform.scale.get().checked_abs()?)?;
		let new_offset = scale
			.checked_mul(transform.offset.checked_abs()?)?
			.checked_add(offset)?;
		let (root_scale, root_offset) = self.extremes[root];
		Some((root_scale.max(new_scale), root_offset.max(new_offset)))
	}

	/// Internal method to make `root` the parent of `child`, where both are
	/// currently representatives.
	fn link(
		&mut self,
		child: VarIndex,
		root: VarIndex,
		transform: LinearTransform,
		extremes: (IntVal, IntVal),
	) {
		debug_assert!(self.parent[child] == child && self.parent[root] == root);
		trace!(
			child = child.index(),
			root = root.index(),
			coeff = transform.scale.get(),
			offset = transform.offset,
			"merge affine classes"
		);
		self.parent[child] = root;
		self.transform[child] = transform;
		self.size[root] += self.size[child];
		self.extremes[root] = extremes;
	}

	/// Internal method that makes every node on the path from `var` to its
	/// representative a direct child of the representative, returning the
	/// representative.
	fn compress_path(&mut self, var: VarIndex) -> VarIndex {
		let mut path = Vec::new();
		let mut node = var;
		while self.parent[node] != node {
			path.push(node);
			node = self.parent[node];
		}
		let root = node;
		// The parent of each node is compressed before the node itself.
		for &n in path.iter().rev() {
			let p = self.parent[n];
			if p != root {
				self.transform[n] = self.transform[n].compose(&self.transform[p]);
				self.parent[n] = root;
			}
		}
		root
	}

	/// Internal method that finds the representative of `var` without
	/// modifying the forest.
	fn root(&self, var: VarIndex) -> VarIndex {
		let mut node = var;
		while self.parent[node] != node {
			node = self.parent[node];
		}
		node
	}

	/// Try to merge the classes of `x` and `y` under the relation `x = coeff * y
	/// + offset`, returning whether the classes were merged.
	///
	/// The representative of the merged class is one of the two current
	/// representatives. The representative of `x` can only remain the
	/// representative if `allow_rep_x` is set (and similarly for `y`). If both
	/// are allowed, then the representative of the larger class is kept.
	///
	/// No merge takes place if `x` and `y` are already in the same class, if
	/// the relation between the representatives cannot be expressed with
	/// integer coefficients in an allowed direction, or if the relation of any
	/// variable of the merged class to the new representative cannot be
	/// represented.
	///
	/// # Panics
	///
	/// Panics if `coeff` is zero, or if neither representative is allowed.
	pub fn try_add(
		&mut self,
		x: VarIndex,
		y: VarIndex,
		coeff: IntVal,
		offset: IntVal,
		allow_rep_x: bool,
		allow_rep_y: bool,
	) -> bool {
		assert_ne!(coeff, 0, "affine relation with a zero coefficient");
		assert!(
			allow_rep_x || allow_rep_y,
			"one of the representatives must be allowed to remain representative"
		);
		if x == y {
			return false;
		}
		self.ensure_node(x.max(y));
		let rep_x = self.compress_path(x);
		let rep_y = self.compress_path(y);
		if rep_x == rep_y {
			return false;
		}

		// x = cx * rep_x + ox, y = cy * rep_y + oy, and thus
		// cx * rep_x = (coeff * cy) * rep_y + (coeff * oy + offset - ox).
		let (cx, ox) = (self.transform[x].scale.get(), self.transform[x].offset);
		let (cy, oy) = (self.transform[y].scale.get(), self.transform[y].offset);
		let Some(a) = coeff.checked_mul(cy) else {
			return false;
		};
		let Some(b) = coeff
			.checked_mul(oy)
			.and_then(|v| v.checked_add(offset))
			.and_then(|v| v.checked_sub(ox))
		else {
			return false;
		};

		// rep_x = (a / cx) * rep_y + b / cx
		let x_under_y = if allow_rep_y
			&& a.checked_rem(cx) == Some(0)
			&& b.checked_rem(cx) == Some(0)
		{
			a.checked_div(cx)
				.zip(b.checked_div(cx))
				.and_then(|(scale, offset)| LinearTransform::new(scale, offset))
				.and_then(|t| self.merged_extremes(rep_x, rep_y, &t).map(|ext| (t, ext)))
		} else {
			None
		};
		// rep_y = (cx / a) * rep_x - b / a
		let y_under_x = if allow_rep_x
			&& cx.checked_rem(a) == Some(0)
			&& b.checked_rem(a) == Some(0)
		{
			cx.checked_div(a)
				.zip(b.checked_div(a).and_then(IntVal::checked_neg))
				.and_then(|(scale, offset)| LinearTransform::new(scale, offset))
				.and_then(|t| self.merged_extremes(rep_y, rep_x, &t).map(|ext| (t, ext)))
		} else {
			None
		};

		match (x_under_y, y_under_x) {
			(None, None) => return false,
			(Some((t, ext)), None) => self.link(rep_x, rep_y, t, ext),
			(None, Some((t, ext))) => self.link(rep_y, rep_x, t, ext),
			(Some((tx, ext_x)), Some((ty, ext_y))) => {
				if self.size[rep_x] <= self.size[rep_y] {
					self.link(rep_x, rep_y, tx, ext_x);
				} else {
					self.link(rep_y, rep_x, ty, ext_y);
				}
			}
		}
		true
	}
}

impl Relation {
	/// The relation of a representative to itself.
	pub fn identity(var: VarIndex) -> Self {
		Self {
			representative: var,
			coeff: 1,
			offset: 0,
		}
	}
}
