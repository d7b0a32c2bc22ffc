//! Module that defines the working model that is simplified during presolve:
//! the declared domains of its variables, its constraints, and its objective.

use std::{
	fmt::{self, Display},
	ops::{AddAssign, Not},
};

use index_vec::{define_index_type, IndexVec};
use itertools::Itertools;

use crate::{Domain, IntVal};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// A constraint in a [`Model`], which is only enforced when all of its
/// enforcement literals are true.
pub struct Constraint {
	/// The literals that must all be true for the constraint to be enforced.
	pub enforcement: Vec<Literal>,
	/// The relation that the constraint enforces.
	pub kind: ConstraintKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// The different types of relations that can be expressed by a [`Constraint`].
pub enum ConstraintKind {
	/// A constraint that has been removed from the model.
	Empty,
	/// At least one of the literals must be true.
	BoolOr(Vec<Literal>),
	/// All of the literals must be true.
	BoolAnd(Vec<Literal>),
	/// At most one of the literals can be true.
	AtMostOne(Vec<Literal>),
	/// A linear relation between variables.
	Linear(LinearConstraint),
	/// All the variables must take different values.
	AllDifferent(Vec<VarRef>),
	/// A scheduling interval, `start + size == end`.
	Interval {
		/// The start of the interval.
		start: VarRef,
		/// The size of the interval.
		size: VarRef,
		/// The end of the interval.
		end: VarRef,
	},
	/// The referenced interval constraints cannot overlap.
	NoOverlap(Vec<ConIndex>),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// The relation `Σ coeffs[i] * vars[i] ∈ domain`.
pub struct LinearConstraint {
	/// The variables of the linear sum.
	pub vars: Vec<VarRef>,
	/// The coefficients of the linear sum, one for each variable.
	pub coeffs: Vec<IntVal>,
	/// The admissible values of the linear sum.
	pub domain: Domain,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
/// The linear expression `Σ coeffs[i] * vars[i] + offset`.
pub struct LinearExpr {
	/// The variables of the expression.
	pub vars: Vec<VarRef>,
	/// The coefficients of the expression, one for each variable.
	pub coeffs: Vec<IntVal>,
	/// The constant term of the expression.
	pub offset: IntVal,
}

/// A literal is a [`VarRef`] to a variable whose domain is contained in `{0,
/// 1}`. Its negation represents `1 - x`.
pub type Literal = VarRef;

#[derive(Clone, Debug, Default)]
/// A formulation of a problem instance in terms of decision variables,
/// constraints, and an optional linear objective.
pub struct Model {
	/// The declared domains of the variables.
	pub(crate) variables: IndexVec<VarIndex, Domain>,
	/// The constraints of the model.
	pub(crate) constraints: IndexVec<ConIndex, Constraint>,
	/// The objective of the model, if any.
	pub(crate) objective: Option<ObjectiveDef>,
}

#[derive(Clone, Debug, PartialEq)]
/// The linear objective of a [`Model`], which is minimized.
///
/// The value reported to the user is `scaling_factor * (Σ coeff * var +
/// offset)`.
pub struct ObjectiveDef {
	/// The terms of the linear sum.
	pub terms: Vec<(VarRef, IntVal)>,
	/// The constant offset of the objective.
	pub offset: f64,
	/// The factor by which the objective is scaled. A factor of `0.0` is
	/// interpreted as `1.0`.
	pub scaling_factor: f64,
	/// The admissible values for the linear sum, excluding the offset. `None`
	/// means that the objective is unrestricted.
	pub domain: Option<Domain>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// A signed reference to a variable in a [`Model`].
///
/// A negated reference represents `-x` for integer variables, or `¬x` (i.e.,
/// `1 - x`) when it is used as a [`Literal`].
pub struct VarRef {
	/// The variable that is referenced.
	var: VarIndex,
	/// Whether the reference is negated.
	negated: bool,
}

define_index_type! {
	/// Reference type for constraints in a [`Model`].
	pub struct ConIndex = u32;
}

define_index_type! {
	/// Reference type for decision variables in a [`Model`].
	pub struct VarIndex = u32;
}

impl Constraint {
	/// Create a new unenforced constraint of the given kind.
	pub fn new(kind: ConstraintKind) -> Self {
		Self {
			enforcement: Vec::new(),
			kind,
		}
	}

	/// Remove the constraint from the model, replacing it by an empty
	/// constraint.
	pub fn clear(&mut self) {
		self.enforcement.clear();
		self.kind = ConstraintKind::Empty;
	}

	/// Collect the (positive) variables read by the constraint into `vars`,
	/// including those of its enforcement literals.
	///
	/// The previous content of `vars` is discarded. The resulting list is
	/// sorted and does not contain duplicates.
	pub fn collect_used_variables(&self, vars: &mut Vec<VarIndex>) {
		vars.clear();
		vars.extend(self.enforcement.iter().map(|l| l.var()));
		match &self.kind {
			ConstraintKind::Empty | ConstraintKind::NoOverlap(_) => {}
			ConstraintKind::BoolOr(lits)
			| ConstraintKind::BoolAnd(lits)
			| ConstraintKind::AtMostOne(lits)
			| ConstraintKind::AllDifferent(lits) => vars.extend(lits.iter().map(|l| l.var())),
			ConstraintKind::Linear(lin) => vars.extend(lin.vars.iter().map(|v| v.var())),
			ConstraintKind::Interval { start, size, end } => {
				vars.extend([start.var(), size.var(), end.var()]);
			}
		}
		vars.sort_unstable();
		vars.dedup();
	}

	/// Returns the unary linear constraint variable, if the constraint is a
	/// linear constraint over a single variable.
	pub fn unary_linear_var(&self) -> Option<VarIndex> {
		match &self.kind {
			ConstraintKind::Linear(lin) if lin.vars.len() == 1 => Some(lin.vars[0].var()),
			_ => None,
		}
	}

	/// Returns the sorted list of interval constraints referenced by the
	/// constraint.
	pub fn used_intervals(&self) -> Vec<ConIndex> {
		match &self.kind {
			ConstraintKind::NoOverlap(intervals) => {
				intervals.iter().copied().sorted_unstable().dedup().collect()
			}
			_ => Vec::new(),
		}
	}

	/// Returns the sorted list of (positive) variables read by the constraint.
	pub fn used_variables(&self) -> Vec<VarIndex> {
		let mut vars = Vec::new();
		self.collect_used_variables(&mut vars);
		vars
	}

	/// Set the enforcement literals of the constraint.
	pub fn with_enforcement<I: IntoIterator<Item = Literal>>(mut self, literals: I) -> Self {
		self.enforcement = literals.into_iter().collect();
		self
	}
}

impl From<ConstraintKind> for Constraint {
	fn from(value: ConstraintKind) -> Self {
		Self::new(value)
	}
}

impl From<LinearConstraint> for Constraint {
	fn from(value: LinearConstraint) -> Self {
		Self::new(ConstraintKind::Linear(value))
	}
}

impl LinearConstraint {
	/// Create the linear constraint `Σ coeff * var ∈ domain` from a list of
	/// `(var, coeff)` terms.
	pub fn new<I: IntoIterator<Item = (VarRef, IntVal)>>(terms: I, domain: Domain) -> Self {
		let (vars, coeffs) = terms.into_iter().unzip();
		Self {
			vars,
			coeffs,
			domain,
		}
	}

	/// Iterate over the `(var, coeff)` terms of the linear sum.
	pub fn terms(&self) -> impl Iterator<Item = (VarRef, IntVal)> + '_ {
		self.vars.iter().copied().zip(self.coeffs.iter().copied())
	}
}

impl LinearExpr {
	/// Create the linear expression `Σ coeff * var + offset` from a list of
	/// `(var, coeff)` terms.
	pub fn new<I: IntoIterator<Item = (VarRef, IntVal)>>(terms: I, offset: IntVal) -> Self {
		let (vars, coeffs) = terms.into_iter().unzip();
		Self {
			vars,
			coeffs,
			offset,
		}
	}
}

impl Model {
	/// Add a constraint to the model, returning its index.
	pub fn add_constraint(&mut self, constraint: Constraint) -> ConIndex {
		self.constraints.push(constraint)
	}

	/// Access a constraint of the model.
	pub fn constraint(&self, index: ConIndex) -> &Constraint {
		&self.constraints[index]
	}

	/// Mutably access a constraint of the model.
	///
	/// Note that a [`crate::PresolveContext`] must be notified of any change to
	/// the variables used by the constraint.
	pub fn constraint_mut(&mut self, index: ConIndex) -> &mut Constraint {
		&mut self.constraints[index]
	}

	/// Iterate over the constraints of the model and their indices.
	pub fn constraints(&self) -> impl Iterator<Item = (ConIndex, &Constraint)> + '_ {
		self.constraints.iter_enumerated()
	}

	/// Create a new Boolean variable, i.e., an integer variable with domain `{0,
	/// 1}`.
	pub fn new_bool_var(&mut self) -> VarIndex {
		self.new_int_var(Domain::new(0, 1))
	}

	/// Create a new integer variable with the given domain.
	pub fn new_int_var(&mut self, domain: Domain) -> VarIndex {
		self.variables.push(domain)
	}

	/// The number of constraints in the model, including removed constraints.
	pub fn num_constraints(&self) -> usize {
		self.constraints.len()
	}

	/// The number of variables in the model.
	pub fn num_variables(&self) -> usize {
		self.variables.len()
	}

	/// The objective of the model, if any.
	pub fn objective(&self) -> Option<&ObjectiveDef> {
		self.objective.as_ref()
	}

	/// Set the objective of the model.
	pub fn set_objective(&mut self, objective: ObjectiveDef) {
		self.objective = Some(objective);
	}

	/// The declared domain of a variable.
	pub fn variable_domain(&self, var: VarIndex) -> &Domain {
		&self.variables[var]
	}
}

impl AddAssign<Constraint> for Model {
	fn add_assign(&mut self, rhs: Constraint) {
		let _ = self.add_constraint(rhs);
	}
}

impl AddAssign<LinearConstraint> for Model {
	fn add_assign(&mut self, rhs: LinearConstraint) {
		self.add_assign(Constraint::from(rhs));
	}
}

impl ObjectiveDef {
	/// Create an unrestricted objective to minimize `Σ coeff * var`.
	pub fn new<I: IntoIterator<Item = (VarRef, IntVal)>>(terms: I) -> Self {
		Self {
			terms: terms.into_iter().collect(),
			offset: 0.0,
			scaling_factor: 1.0,
			domain: None,
		}
	}

	/// Set the admissible values of the objective's linear sum.
	pub fn with_domain(mut self, domain: Domain) -> Self {
		self.domain = Some(domain);
		self
	}

	/// Set the constant offset of the objective.
	pub fn with_offset(mut self, offset: f64) -> Self {
		self.offset = offset;
		self
	}
}

impl Display for ObjectiveDef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let terms = self
			.terms
			.iter()
			.format_with(" + ", |(v, c), f| f(&format_args!("{c} * {v}")));
		write!(
			f,
			"minimize {terms}, offset: {}, scaling: {}, domain: ",
			self.offset, self.scaling_factor
		)?;
		match &self.domain {
			Some(dom) => write!(f, "{dom}"),
			None => write!(f, "unrestricted"),
		}
	}
}

impl VarRef {
	/// Whether the reference is not negated.
	pub fn is_positive(&self) -> bool {
		!self.negated
	}

	/// A negated reference to `var`.
	pub fn negative(var: VarIndex) -> Self {
		Self { var, negated: true }
	}

	/// A (non-negated) reference to `var`.
	pub fn positive(var: VarIndex) -> Self {
		Self {
			var,
			negated: false,
		}
	}

	/// The variable that is referenced.
	pub fn var(&self) -> VarIndex {
		self.var
	}
}

impl Display for VarRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.negated {
			write!(f, "-x{}", self.var.index())
		} else {
			write!(f, "x{}", self.var.index())
		}
	}
}

impl From<VarIndex> for VarRef {
	fn from(value: VarIndex) -> Self {
		Self::positive(value)
	}
}

impl Not for VarRef {
	type Output = Self;

	fn not(self) -> Self::Output {
		Self {
			var: self.var,
			negated: !self.negated,
		}
	}
}

#[cfg(test)]
mod tests {
	use expect_test::expect;

	use crate::{
		model::{ConIndex, VarIndex},
		Constraint, ConstraintKind, Domain, LinearConstraint, Model, ObjectiveDef, VarRef,
	};

	#[test]
	fn test_var_ref_negation() {
		let x = VarRef::positive(VarIndex::new(3));
		assert!(x.is_positive());
		assert!(!(!x).is_positive());
		assert_eq!(!!x, x);
		assert_eq!((!x).var(), x.var());
		assert_eq!(VarRef::from(VarIndex::new(3)), x);
		assert_eq!(format!("{} {}", x, !x), "x3 -x3");
	}

	#[test]
	fn test_used_variables() {
		let mut model = Model::default();
		let a = model.new_bool_var();
		let b = model.new_bool_var();
		let x = model.new_int_var(Domain::new(0, 10));
		let y = model.new_int_var(Domain::new(0, 10));

		let lin = Constraint::from(LinearConstraint::new(
			[(y.into(), 2), (VarRef::negative(x), 1), (y.into(), -1)],
			Domain::new(0, 5),
		))
		.with_enforcement([!VarRef::from(b)]);
		assert_eq!(lin.used_variables(), vec![b, x, y]);
		assert_eq!(lin.unary_linear_var(), None);
		assert!(lin.used_intervals().is_empty());

		let unary = Constraint::from(LinearConstraint::new(
			[(VarRef::negative(x), 1)],
			Domain::new(1, 2),
		))
		.with_enforcement([a.into()]);
		assert_eq!(unary.used_variables(), vec![a, x]);
		assert_eq!(unary.unary_linear_var(), Some(x));

		let interval = Constraint::new(ConstraintKind::Interval {
			start: x.into(),
			size: a.into(),
			end: y.into(),
		});
		assert_eq!(interval.used_variables(), vec![a, x, y]);

		let no_overlap = Constraint::new(ConstraintKind::NoOverlap(vec![
			ConIndex::new(4),
			ConIndex::new(1),
			ConIndex::new(4),
		]));
		assert!(no_overlap.used_variables().is_empty());
		assert_eq!(no_overlap.used_intervals(), vec![ConIndex::new(1), ConIndex::new(4)]);

		let mut removed = unary.clone();
		removed.clear();
		assert!(removed.used_variables().is_empty());
		assert_eq!(removed.kind, ConstraintKind::Empty);

		model += unary;
		assert_eq!(model.num_constraints(), 1);
		assert_eq!(model.num_variables(), 4);
	}

	#[test]
	fn test_objective_display() {
		let obj = ObjectiveDef::new([
			(VarRef::positive(VarIndex::new(0)), 2),
			(VarRef::negative(VarIndex::new(1)), 4),
		])
		.with_offset(1.5);
		expect!["minimize 2 * x0 + 4 * -x1, offset: 1.5, scaling: 1, domain: unrestricted"]
			.assert_eq(&obj.to_string());
		let obj = obj.with_domain(Domain::new(0, 10));
		expect!["minimize 2 * x0 + 4 * -x1, offset: 1.5, scaling: 1, domain: [0..=10]"]
			.assert_eq(&obj.to_string());
	}
}
