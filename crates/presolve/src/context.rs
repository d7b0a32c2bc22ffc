//! The working context of the presolve phase, which owns the [`Model`] being
//! simplified together with all indexes derived from it.

pub mod encoding;
pub mod graph;
pub mod objective;

use std::collections::{hash_map::Entry, BTreeMap, BTreeSet, HashMap};

use index_vec::IndexVec;
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
	affine::{AffineRelations, Relation},
	context::{encoding::ValueEncoding, graph::IncidenceGraph, objective::Objective},
	helpers::sparse_bitset::SparseBitset,
	model::{ConIndex, Constraint, ConstraintKind, LinearConstraint, LinearExpr, Literal, VarIndex},
	Domain, IntVal, Model, VarRef,
};

#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
/// Configuration object for a [`PresolveContext`].
pub struct PresolveConfig {
	/// The number of intervals after which the implied domain of the objective
	/// is relaxed to its bounds.
	domain_complexity_limit: Option<usize>,
	/// Whether to record the number of times each presolve rule is applied.
	enable_stats: Option<bool>,
	/// Whether the presolve must preserve every feasible solution of the model.
	keep_all_feasible_solutions: bool,
}

/// The mutable state shared by all presolve rules while they simplify a
/// [`Model`].
///
/// All changes to the domains of variables and the relations between variables
/// must go through the context, so that the indexes it maintains remain
/// consistent with the model.
#[derive(Debug)]
pub struct PresolveContext {
	/// The model that is being simplified.
	model: Model,
	/// The configuration of the presolve run.
	config: PresolveConfig,
	/// The current domain of each variable.
	domains: IndexVec<VarIndex, Domain>,
	/// The variables whose domain (or representative) changed since the last
	/// call to [`Self::take_modified_domains`].
	modified_domains: SparseBitset<VarIndex>,
	/// Whether the model has been found to be unsatisfiable.
	is_unsat: bool,
	/// The canonical variable for each constant value.
	constant_to_var: HashMap<IntVal, VarIndex>,
	/// General affine relations between variables.
	affine_relations: AffineRelations,
	/// Equivalence relations (`x = y` or `x = -y`) between variables.
	var_equiv_relations: AffineRelations,
	/// The constraints that define a stored affine relation.
	affine_constraints: BTreeSet<ConIndex>,
	/// Known relations `target = |var|`.
	abs_relations: HashMap<VarRef, VarIndex>,
	/// The constraint/variable incidence graph.
	graph: IncidenceGraph,
	/// The literals that encode that a variable takes a value.
	encoding: ValueEncoding,
	/// The working copy of the objective.
	objective: Objective,
	/// The number of times each presolve rule has been applied.
	stats_by_rule_name: BTreeMap<String, usize>,
	/// The total number of presolve operations performed.
	num_presolve_operations: usize,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Error type used during presolve.
pub enum PresolveError {
	#[error("The model is trivially unsatisfiable")]
	/// Error used when a presolve operation proves that the model does not have
	/// any solution.
	Unsatisfiable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Selection of one of the two relation forests maintained by the context.
enum RelationKind {
	/// The general affine relations.
	Affine,
	/// The equivalence relations.
	Equivalence,
}

impl PresolveConfig {
	/// Get the number of intervals after which the implied domain of the
	/// objective is relaxed to its bounds.
	pub fn domain_complexity_limit(&self) -> usize {
		self.domain_complexity_limit
			.unwrap_or(Domain::DEFAULT_COMPLEXITY_LIMIT)
	}

	/// Get whether the number of times each presolve rule is applied is
	/// recorded.
	pub fn enable_stats(&self) -> bool {
		self.enable_stats.unwrap_or(true)
	}

	/// Get whether the presolve must preserve every feasible solution of the
	/// model.
	pub fn keep_all_feasible_solutions(&self) -> bool {
		self.keep_all_feasible_solutions
	}

	/// Change the number of intervals after which the implied domain of the
	/// objective is relaxed to its bounds.
	pub fn with_domain_complexity_limit(mut self, limit: usize) -> Self {
		self.domain_complexity_limit = Some(limit);
		self
	}

	/// Change whether the number of times each presolve rule is applied is
	/// recorded.
	pub fn with_enable_stats(mut self, enable: bool) -> Self {
		self.enable_stats = Some(enable);
		self
	}

	/// Change whether the presolve must preserve every feasible solution of the
	/// model.
	pub fn with_keep_all_feasible_solutions(mut self, keep: bool) -> Self {
		self.keep_all_feasible_solutions = keep;
		self
	}
}

impl PresolveContext {
	/// Add the constraint `a ⇒ b`.
	pub fn add_implication(&mut self, a: Literal, b: Literal) {
		let _ = self.model.add_constraint(
			Constraint::new(ConstraintKind::BoolAnd(vec![b])).with_enforcement([a]),
		);
	}

	/// Add the constraint `b ⇒ x ∈ domain`.
	pub fn add_imply_in_domain(&mut self, b: Literal, x: VarIndex, domain: Domain) {
		let _ = self.model.add_constraint(
			Constraint::from(LinearConstraint::new([(x.into(), 1)], domain)).with_enforcement([b]),
		);
	}

	/// Internal method to merge the classes of `x` and `y` in one of the
	/// relation forests, under the relation `x = coeff * y + offset`.
	///
	/// When the classes are merged under a unit coefficient, the representative
	/// is chosen among the representatives that can be used as a literal (if
	/// any). A variable that is a strict multiple of another can never become
	/// Boolean without being fixed to zero, so no preference is made for other
	/// coefficients.
	fn add_relation(
		&mut self,
		x: VarIndex,
		y: VarIndex,
		coeff: IntVal,
		offset: IntVal,
		kind: RelationKind,
	) -> bool {
		let forest = match kind {
			RelationKind::Affine => &self.affine_relations,
			RelationKind::Equivalence => &self.var_equiv_relations,
		};
		let (allow_rep_x, allow_rep_y) = if coeff.abs() != 1 {
			(true, true)
		} else {
			let allow_rep_x = self.can_be_used_as_literal(forest.get(x).representative);
			let allow_rep_y = self.can_be_used_as_literal(forest.get(y).representative);
			if allow_rep_x || allow_rep_y {
				(allow_rep_x, allow_rep_y)
			} else {
				(true, true)
			}
		};
		let forest = match kind {
			RelationKind::Affine => &mut self.affine_relations,
			RelationKind::Equivalence => &mut self.var_equiv_relations,
		};
		forest.try_add(x, y, coeff, offset, allow_rep_x, allow_rep_y)
	}

	/// Returns the constraints that define a stored affine relation.
	pub fn affine_constraints(&self) -> &BTreeSet<ConIndex> {
		&self.affine_constraints
	}

	/// Whether the variable referenced by `r` can be used as a literal, i.e.,
	/// its domain is contained in `{0, 1}`.
	pub fn can_be_used_as_literal(&self, r: impl Into<VarRef>) -> bool {
		let dom = &self.domains[r.into().var()];
		!dom.is_empty() && dom.min() >= 0 && dom.max() <= 1
	}

	/// Reset the number of times each presolve rule has been applied.
	pub fn clear_stats(&mut self) {
		self.stats_by_rule_name.clear();
	}

	/// Returns the configuration of the presolve run.
	pub fn config(&self) -> &PresolveConfig {
		&self.config
	}

	/// Whether the domain of the referenced variable contains `value`.
	pub fn domain_contains(&self, r: impl Into<VarRef>, value: IntVal) -> bool {
		let r = r.into();
		if r.is_positive() {
			self.domains[r.var()].contains(value)
		} else {
			value
				.checked_neg()
				.is_some_and(|v| self.domains[r.var()].contains(v))
		}
	}

	/// Whether the domain of the referenced variable is empty.
	pub fn domain_is_empty(&self, r: impl Into<VarRef>) -> bool {
		self.domains[r.into().var()].is_empty()
	}

	/// Whether the domain (or representative) of `var` changed since the last
	/// call to [`Self::take_modified_domains`].
	pub fn domain_is_modified(&self, var: VarIndex) -> bool {
		self.modified_domains.contains(var)
	}

	/// Returns the current domain of the referenced variable.
	pub fn domain_of(&self, r: impl Into<VarRef>) -> Domain {
		let r = r.into();
		if r.is_positive() {
			self.domains[r.var()].clone()
		} else {
			self.domains[r.var()].negation()
		}
	}

	/// Merge a variable that is fixed to a value with the canonical variable of
	/// that value, which makes equal constants share a single representative.
	///
	/// # Panics
	///
	/// Panics if the variable is not fixed.
	pub fn exploit_fixed_domain(&mut self, var: VarIndex) {
		assert!(
			self.is_fixed(var),
			"exploit_fixed_domain called on a variable that is not fixed"
		);
		let value = self.min_of(var);
		if let Some(&constant) = self.constant_to_var.get(&value) {
			if constant != var {
				trace!(
					var = var.index(),
					constant = constant.index(),
					value,
					"merge fixed variable"
				);
				let _ = self.add_relation(var, constant, 1, 0, RelationKind::Affine);
				let _ = self.add_relation(var, constant, 1, 0, RelationKind::Equivalence);
			}
		} else {
			let _ = self.constant_to_var.insert(value, var);
		}
	}

	/// Returns the relation between the referenced variable and its
	/// representative.
	///
	/// The representative of the general affine relation is replaced by its
	/// representative in the equivalence relation, so that the result is
	/// consistent with both.
	pub fn get_affine_relation(&self, r: impl Into<VarRef>) -> Relation {
		let r = r.into();
		let mut rel = self.affine_relations.get(r.var());
		let equiv = self.var_equiv_relations.get(rel.representative);
		rel.representative = equiv.representative;
		if equiv.coeff == -1 {
			rel.coeff = -rel.coeff;
		}
		if !r.is_positive() {
			rel.coeff = -rel.coeff;
			rel.offset = -rel.offset;
		}
		rel
	}

	/// Returns the variable `target` for which `target = |var|` was recorded.
	pub fn get_abs_relation(&self, target: VarRef) -> Option<VarIndex> {
		self.abs_relations.get(&target).copied()
	}

	/// Returns the literal that represents `lit`.
	///
	/// If the representative of the variable of `lit` cannot be used as a
	/// literal, which can happen when the relation was stored before the
	/// variable became Boolean, then `lit` itself is returned.
	///
	/// # Panics
	///
	/// Panics if `lit` cannot be used as a literal.
	pub fn get_literal_representative(&self, lit: Literal) -> Literal {
		let rel = self.get_affine_relation(lit.var());
		assert!(
			self.can_be_used_as_literal(lit),
			"get_literal_representative called on a non-Boolean variable"
		);
		if !self.can_be_used_as_literal(rel.representative) {
			return lit;
		}
		// Since the relation coefficient is non-zero, only one of the mappings
		// `var = rep` or `var = 1 - rep` is consistent with the relation.
		let positive_possible = rel.offset == 0 || rel.coeff + rel.offset == 1;
		let negative_possible = rel.offset == 1 || rel.coeff + rel.offset == 0;
		debug_assert_ne!(positive_possible, negative_possible);
		let rep = VarRef::positive(rel.representative);
		if lit.is_positive() == positive_possible {
			rep
		} else {
			!rep
		}
	}

	/// Returns the canonical variable that is fixed to `value`, creating it if
	/// it does not exist yet.
	pub fn get_or_create_constant_var(&mut self, value: IntVal) -> VarIndex {
		if let Some(&var) = self.constant_to_var.get(&value) {
			return var;
		}
		let var = self.model.new_int_var(Domain::singleton(value));
		let _ = self.constant_to_var.insert(value, var);
		self.initialize_new_domains();
		var
	}

	/// Returns the representative of the referenced variable in the
	/// equivalence relation.
	///
	/// # Panics
	///
	/// Panics if the equivalence relation of the variable is not `x = rep` or
	/// `x = -rep`.
	pub fn get_variable_representative(&self, r: VarRef) -> VarRef {
		let rel = self.var_equiv_relations.get(r.var());
		assert_eq!(rel.coeff.abs(), 1, "equivalence relation with a non-unit coefficient");
		assert_eq!(rel.offset, 0, "equivalence relation with an offset");
		let rep = VarRef::positive(rel.representative);
		if r.is_positive() == (rel.coeff == 1) {
			rep
		} else {
			!rep
		}
	}

	/// Create the internal structures for any variables that were added to the
	/// model since the last call.
	///
	/// A variable with an empty domain makes the model unsatisfiable, and fixed
	/// variables are merged with the canonical variable of their value.
	pub fn initialize_new_domains(&mut self) {
		while self.domains.len() < self.model.num_variables() {
			let var = self.domains.next_idx();
			let _ = self.domains.push(self.model.variables[var].clone());
			if self.domains[var].is_empty() {
				debug!(var = var.index(), "declared domain is empty");
				self.is_unsat = true;
			} else if self.domains[var].is_fixed() {
				self.exploit_fixed_domain(var);
			}
		}
		self.modified_domains.resize(self.domains.len());
		self.graph.resize_variables(self.domains.len());
	}

	/// Intersect the domain of the referenced variable with `domain`, returning
	/// whether the domain of the variable changed.
	///
	/// If the referenced variable is negated, then its domain is intersected
	/// with the negation of `domain`. If the domain becomes empty, or if the
	/// model was already known to be unsatisfiable, then
	/// [`PresolveError::Unsatisfiable`] is returned.
	pub fn intersect_domain_with(
		&mut self,
		r: impl Into<VarRef>,
		domain: &Domain,
	) -> Result<bool, PresolveError> {
		if self.is_unsat {
			return Err(PresolveError::Unsatisfiable);
		}
		let r = r.into();
		let var = r.var();
		debug_assert!(
			!self.domains[var].is_empty(),
			"intersect_domain_with called on a variable with an empty domain"
		);
		let negated;
		let restriction = if r.is_positive() {
			domain
		} else {
			negated = domain.negation();
			&negated
		};
		if self.domains[var].is_included_in(restriction) {
			return Ok(false);
		}
		self.domains[var] = self.domains[var].intersection_with(restriction);
		self.modified_domains.set(var);
		trace!(var = var.index(), domain = %self.domains[var], "domain reduced");
		if self.domains[var].is_empty() {
			debug!(var = var.index(), "domain became empty");
			return Err(self.notify_that_model_is_unsat());
		}
		Ok(true)
	}

	/// Returns the model with the current domains of all variables written to
	/// its declared domains.
	pub fn into_model(mut self) -> Model {
		for (var, dom) in self.domains.into_iter_enumerated() {
			self.model.variables[var] = dom;
		}
		self.model
	}

	/// Whether the referenced variable is fixed to a single value.
	pub fn is_fixed(&self, r: impl Into<VarRef>) -> bool {
		let var = r.into().var();
		debug_assert!(!self.domains[var].is_empty());
		self.domains[var].is_fixed()
	}

	/// Whether the model has been found to be unsatisfiable.
	pub fn is_unsat(&self) -> bool {
		self.is_unsat
	}

	/// Whether the presolve must preserve every feasible solution of the model.
	pub fn keep_all_feasible_solutions(&self) -> bool {
		self.config.keep_all_feasible_solutions()
	}

	/// Whether the literal is fixed to false.
	pub fn literal_is_false(&self, lit: Literal) -> bool {
		debug_assert!(self.can_be_used_as_literal(lit));
		if lit.is_positive() {
			self.domains[lit.var()].max() == 0
		} else {
			self.domains[lit.var()].min() == 1
		}
	}

	/// Whether the literal is fixed to true.
	pub fn literal_is_true(&self, lit: Literal) -> bool {
		self.literal_is_false(!lit)
	}

	/// Returns the largest value of the referenced variable.
	pub fn max_of(&self, r: impl Into<VarRef>) -> IntVal {
		let r = r.into();
		debug_assert!(!self.domains[r.var()].is_empty());
		if r.is_positive() {
			self.domains[r.var()].max()
		} else {
			-self.domains[r.var()].min()
		}
	}

	/// Returns the largest value that the linear expression can take.
	pub fn max_of_expr(&self, expr: &LinearExpr) -> IntVal {
		expr.vars
			.iter()
			.zip(&expr.coeffs)
			.fold(expr.offset, |acc, (&v, &coeff)| {
				let bound = if coeff > 0 {
					self.max_of(v)
				} else {
					self.min_of(v)
				};
				acc.saturating_add(coeff.saturating_mul(bound))
			})
	}

	/// Returns the smallest value of the referenced variable.
	pub fn min_of(&self, r: impl Into<VarRef>) -> IntVal {
		let r = r.into();
		debug_assert!(!self.domains[r.var()].is_empty());
		if r.is_positive() {
			self.domains[r.var()].min()
		} else {
			-self.domains[r.var()].max()
		}
	}

	/// Returns the smallest value that the linear expression can take.
	pub fn min_of_expr(&self, expr: &LinearExpr) -> IntVal {
		expr.vars
			.iter()
			.zip(&expr.coeffs)
			.fold(expr.offset, |acc, (&v, &coeff)| {
				let bound = if coeff > 0 {
					self.min_of(v)
				} else {
					self.max_of(v)
				};
				acc.saturating_add(coeff.saturating_mul(bound))
			})
	}

	/// Access the model that is being simplified.
	///
	/// Note that the declared domains of the model are only updated by
	/// [`Self::into_model`], the current domains are available through the
	/// context.
	pub fn model(&self) -> &Model {
		&self.model
	}

	/// Mutably access the model that is being simplified.
	///
	/// Variables and constraints that are added to the model must be registered
	/// using [`Self::initialize_new_domains`] and
	/// [`Self::update_new_constraints_variable_usage`].
	pub fn model_mut(&mut self) -> &mut Model {
		&mut self.model
	}

	/// Create a new presolve context for the given model.
	pub fn new(model: Model, config: PresolveConfig) -> Self {
		let mut ctx = Self {
			model,
			config,
			domains: IndexVec::new(),
			modified_domains: SparseBitset::default(),
			is_unsat: false,
			constant_to_var: HashMap::new(),
			affine_relations: AffineRelations::default(),
			var_equiv_relations: AffineRelations::default(),
			affine_constraints: BTreeSet::new(),
			abs_relations: HashMap::new(),
			graph: IncidenceGraph::default(),
			encoding: ValueEncoding::default(),
			objective: Objective::default(),
			stats_by_rule_name: BTreeMap::new(),
			num_presolve_operations: 0,
		};
		ctx.initialize_new_domains();
		ctx
	}

	/// Create a new Boolean variable.
	pub fn new_bool_var(&mut self) -> VarIndex {
		self.new_int_var(Domain::new(0, 1))
	}

	/// Create a new integer variable with the given domain.
	pub fn new_int_var(&mut self, domain: Domain) -> VarIndex {
		let var = self.model.new_int_var(domain);
		self.initialize_new_domains();
		var
	}

	/// Mark the model as unsatisfiable, returning the error to be propagated.
	pub fn notify_that_model_is_unsat(&mut self) -> PresolveError {
		self.is_unsat = true;
		PresolveError::Unsatisfiable
	}

	/// The total number of presolve operations performed.
	pub fn num_presolve_operations(&self) -> usize {
		self.num_presolve_operations
	}

	/// Fix the literal to false.
	pub fn set_literal_to_false(&mut self, lit: Literal) -> Result<bool, PresolveError> {
		let value = if lit.is_positive() { 0 } else { 1 };
		self.intersect_domain_with(lit.var(), &Domain::singleton(value))
	}

	/// Fix the literal to true.
	pub fn set_literal_to_true(&mut self, lit: Literal) -> Result<bool, PresolveError> {
		self.set_literal_to_false(!lit)
	}

	/// Fix the literal to the given value.
	pub fn set_literal(&mut self, lit: Literal, value: bool) -> Result<bool, PresolveError> {
		if value {
			self.set_literal_to_true(lit)
		} else {
			self.set_literal_to_false(lit)
		}
	}

	/// Returns the number of times each presolve rule has been applied.
	pub fn stats_by_rule_name(&self) -> &BTreeMap<String, usize> {
		&self.stats_by_rule_name
	}

	/// Record that `target = |r|`, returning whether no relation was known for
	/// `target` yet.
	pub fn store_abs_relation(&mut self, target: VarRef, r: VarRef) -> bool {
		match self.abs_relations.entry(target) {
			Entry::Occupied(_) => false,
			Entry::Vacant(entry) => {
				let _ = entry.insert(r.var());
				true
			}
		}
	}

	/// Record the relation `x = coeff * y + offset` defined by constraint `ct`,
	/// returning whether the relation was added.
	///
	/// The relation is ignored if the model is unsatisfiable or if one of the
	/// variables is fixed. When the relation is an equivalence, it is also
	/// stored in the equivalence relation. Variables whose representative
	/// changed are marked as modified.
	pub fn store_affine_relation(
		&mut self,
		ct: ConIndex,
		x: impl Into<VarRef>,
		y: impl Into<VarRef>,
		coeff: IntVal,
		offset: IntVal,
	) -> bool {
		let (x_ref, y_ref) = (x.into(), y.into());
		if self.is_unsat || self.is_fixed(x_ref) || self.is_fixed(y_ref) {
			return false;
		}
		let (x, y) = (x_ref.var(), y_ref.var());
		let coeff = if x_ref.is_positive() == y_ref.is_positive() {
			coeff
		} else {
			-coeff
		};
		let offset = if x_ref.is_positive() { offset } else { -offset };

		let mut added = self.add_relation(x, y, coeff, offset, RelationKind::Affine);
		if coeff.abs() == 1 && offset == 0 {
			added |= self.add_relation(x, y, coeff, offset, RelationKind::Equivalence);
		}
		if added {
			trace!(
				constraint = ct.index(),
				x = x.index(),
				y = y.index(),
				coeff,
				offset,
				"store affine relation"
			);
			// The domains did not change, but constraints containing a variable
			// whose representative changed must be processed again.
			if self.get_affine_relation(x).representative != x {
				self.modified_domains.set(x);
			}
			if self.get_affine_relation(y).representative != y {
				self.modified_domains.set(y);
			}
			let _ = self.affine_constraints.insert(ct);
		}
		added
	}

	/// Record that the literals `a` and `b` are equal.
	///
	/// A linear constraint defining the equality is added to the model. An
	/// error is returned if `a` is already known to be the negation of `b`.
	///
	/// # Panics
	///
	/// Panics if `a` or `b` cannot be used as a literal.
	pub fn store_boolean_equality_relation(
		&mut self,
		a: Literal,
		b: Literal,
	) -> Result<(), PresolveError> {
		assert!(
			self.can_be_used_as_literal(a) && self.can_be_used_as_literal(b),
			"store_boolean_equality_relation called on a non-Boolean variable"
		);
		if a == b {
			return Ok(());
		}
		if a == !b {
			debug!(lit = %a, "literal equal to its negation");
			return Err(self.notify_that_model_is_unsat());
		}
		let (rep_a, rep_b) = (
			self.get_literal_representative(a),
			self.get_literal_representative(b),
		);
		if rep_a == rep_b {
			return Ok(());
		}
		if rep_a == !rep_b {
			debug!(a = %a, b = %b, "literal equal to its negation");
			return Err(self.notify_that_model_is_unsat());
		}
		let (var_a, var_b) = (a.var(), b.var());
		if self.get_affine_relation(var_a).representative == var_b
			|| self.get_affine_relation(var_b).representative == var_a
		{
			return Ok(());
		}

		// The defining constraint keeps the usage count of the variables and the
		// propagation between them correct.
		let (coeff_b, rhs, rel_coeff, rel_offset) = if a.is_positive() == b.is_positive() {
			// a = b
			(-1, 0, 1, 0)
		} else {
			// a = 1 - b
			(1, 1, -1, 1)
		};
		let ct = self.model.add_constraint(
			LinearConstraint::new(
				[(var_a.into(), 1), (var_b.into(), coeff_b)],
				Domain::singleton(rhs),
			)
			.into(),
		);
		let _ = self.store_affine_relation(ct, var_a, var_b, rel_coeff, rel_offset);
		Ok(())
	}

	/// Remove and return the variables whose domain (or representative) changed
	/// since the last call, in the order in which they were first modified.
	pub fn take_modified_domains(&mut self) -> Vec<VarIndex> {
		self.modified_domains.take()
	}

	/// Record that a presolve rule was applied.
	pub fn update_rule_stats(&mut self, name: &str) {
		if self.config.enable_stats() {
			debug!(
				operation = self.num_presolve_operations,
				rule = name,
				"apply presolve rule"
			);
			*self
				.stats_by_rule_name
				.entry(name.to_owned())
				.or_default() += 1;
		}
		self.num_presolve_operations += 1;
	}

	/// Whether the variable is not the representative of a non-trivial
	/// equivalence class.
	pub fn variable_is_not_representative_of_equivalence_class(&self, var: VarIndex) -> bool {
		self.affine_relations.class_size(var) == 1
			|| self.get_affine_relation(var).representative != var
	}
}
