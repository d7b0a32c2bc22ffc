//! The incidence graph between constraints and the variables they use, and
//! the predicates that presolve rules use to decide whether a variable can be
//! removed.

use std::{collections::HashSet, mem};

use index_vec::IndexVec;
use tracing::debug;

use crate::{
	model::{ConIndex, Constraint, VarIndex},
	PresolveContext, VarRef,
};

#[derive(Clone, Debug, Default)]
/// Bidirectional index between constraints and the variables and intervals
/// that they use.
pub(crate) struct IncidenceGraph {
	/// The sorted list of variables used by each constraint.
	constraint_to_vars: IndexVec<ConIndex, Vec<VarIndex>>,
	/// The sorted list of interval constraints used by each constraint.
	constraint_to_intervals: IndexVec<ConIndex, Vec<ConIndex>>,
	/// The number of constraints that use each interval constraint.
	interval_usage: IndexVec<ConIndex, usize>,
	/// The variable of each constraint that is a unary linear constraint.
	constraint_to_linear1_var: IndexVec<ConIndex, Option<VarIndex>>,
	/// The constraints (and objective) that use each variable.
	var_to_constraints: IndexVec<VarIndex, HashSet<Usage>>,
	/// The number of unary linear constraints over each variable.
	var_to_num_linear1: IndexVec<VarIndex, usize>,
	/// Scratch buffer for the variables newly used by a constraint.
	tmp_new_usage: Vec<VarIndex>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// A place in the model where a variable is used.
pub enum Usage {
	/// The variable occurs in the objective.
	Objective,
	/// The variable is used by a constraint.
	Constraint(ConIndex),
}

impl IncidenceGraph {
	/// Record that `var` occurs in the objective.
	pub(crate) fn add_objective_usage(&mut self, var: VarIndex) {
		let _ = self.var_to_constraints[var].insert(Usage::Objective);
	}

	/// Index a constraint that was not indexed before.
	fn add_usage(&mut self, c: ConIndex, ct: &Constraint) {
		debug_assert_eq!(c, self.constraint_to_vars.next_idx());
		let vars = ct.used_variables();
		for &v in &vars {
			let _ = self.var_to_constraints[v].insert(Usage::Constraint(c));
		}
		let intervals = ct.used_intervals();
		for &i in &intervals {
			self.interval_usage[i] += 1;
		}
		let _ = self.constraint_to_vars.push(vars);
		let _ = self.constraint_to_intervals.push(intervals);
		let _ = self.constraint_to_linear1_var.push(None);
		self.update_linear1_usage(c, ct);
	}

	/// The number of constraints that have been indexed.
	fn num_constraints(&self) -> usize {
		self.constraint_to_vars.len()
	}

	/// Record that `var` no longer occurs in the objective.
	pub(crate) fn remove_objective_usage(&mut self, var: VarIndex) {
		let _ = self.var_to_constraints[var].remove(&Usage::Objective);
	}

	/// Grow the per-variable indexes to `len` variables.
	pub(crate) fn resize_variables(&mut self, len: usize) {
		self.var_to_constraints.resize(len, HashSet::new());
		self.var_to_num_linear1.resize(len, 0);
	}

	/// Update the unary linear constraint index for constraint `c`.
	fn update_linear1_usage(&mut self, c: ConIndex, ct: &Constraint) {
		if let Some(old) = self.constraint_to_linear1_var[c].take() {
			self.var_to_num_linear1[old] -= 1;
		}
		if let Some(var) = ct.unary_linear_var() {
			self.constraint_to_linear1_var[c] = Some(var);
			self.var_to_num_linear1[var] += 1;
		}
	}

	/// Re-index constraint `c`, which may have changed since it was last
	/// indexed.
	fn update_usage(&mut self, c: ConIndex, ct: &Constraint) {
		for &i in &self.constraint_to_intervals[c] {
			self.interval_usage[i] -= 1;
		}
		self.constraint_to_intervals[c] = ct.used_intervals();
		for &i in &self.constraint_to_intervals[c] {
			self.interval_usage[i] += 1;
		}

		// Both lists are sorted: only the variables that are no longer used, or
		// that are newly used, change their reverse index.
		ct.collect_used_variables(&mut self.tmp_new_usage);
		let old_usage = &self.constraint_to_vars[c];
		let mut i = 0;
		for &var in &self.tmp_new_usage {
			while i < old_usage.len() && old_usage[i] < var {
				let _ = self.var_to_constraints[old_usage[i]].remove(&Usage::Constraint(c));
				i += 1;
			}
			if i < old_usage.len() && old_usage[i] == var {
				i += 1;
			} else {
				let _ = self.var_to_constraints[var].insert(Usage::Constraint(c));
			}
		}
		for &var in &old_usage[i..] {
			let _ = self.var_to_constraints[var].remove(&Usage::Constraint(c));
		}
		mem::swap(&mut self.constraint_to_vars[c], &mut self.tmp_new_usage);

		self.update_linear1_usage(c, ct);
	}
}

impl PresolveContext {
	/// Whether all constraints of the model have been indexed in the incidence
	/// graph.
	pub fn constraint_variable_graph_is_up_to_date(&self) -> bool {
		self.graph.num_constraints() == self.model.num_constraints()
	}

	/// Returns the sorted list of variables used by constraint `c`, as last
	/// indexed.
	pub fn constraint_to_vars(&self, c: ConIndex) -> &[VarIndex] {
		&self.graph.constraint_to_vars[c]
	}

	/// Check the incidence graph against a full recomputation from the model.
	///
	/// This method is intended for debugging and testing. It always returns
	/// `true` when the model is known to be unsatisfiable.
	pub fn constraint_variable_usage_is_consistent(&self) -> bool {
		if self.is_unsat {
			return true;
		}
		if !self.constraint_variable_graph_is_up_to_date() {
			debug!(
				indexed = self.graph.num_constraints(),
				constraints = self.model.num_constraints(),
				"wrong number of indexed constraints"
			);
			return false;
		}

		let num_vars = self.domains.len();
		let mut var_to_constraints: IndexVec<VarIndex, HashSet<Usage>> =
			IndexVec::from_vec(vec![HashSet::new(); num_vars]);
		let mut var_to_num_linear1: IndexVec<VarIndex, usize> =
			IndexVec::from_vec(vec![0; num_vars]);
		let mut interval_usage: IndexVec<ConIndex, usize> =
			IndexVec::from_vec(vec![0; self.model.num_constraints()]);
		for (c, ct) in self.model.constraints() {
			let vars = ct.used_variables();
			if vars != self.graph.constraint_to_vars[c] {
				debug!(
					constraint = c.index(),
					?ct,
					old_size = self.graph.constraint_to_vars[c].len(),
					"wrong variable usage for constraint"
				);
				return false;
			}
			for v in vars {
				let _ = var_to_constraints[v].insert(Usage::Constraint(c));
			}
			let intervals = ct.used_intervals();
			if intervals != self.graph.constraint_to_intervals[c] {
				debug!(constraint = c.index(), ?ct, "wrong interval usage for constraint");
				return false;
			}
			for i in intervals {
				interval_usage[i] += 1;
			}
			if let Some(v) = ct.unary_linear_var() {
				var_to_num_linear1[v] += 1;
			}
		}
		for &v in self.objective.map.keys() {
			let _ = var_to_constraints[v].insert(Usage::Objective);
		}

		for (v, usage) in var_to_constraints.iter_enumerated() {
			if *usage != self.graph.var_to_constraints[v] {
				debug!(var = v.index(), "wrong constraint usage for variable");
				return false;
			}
			if var_to_num_linear1[v] != self.graph.var_to_num_linear1[v] {
				debug!(var = v.index(), "wrong number of unary linear constraints for variable");
				return false;
			}
		}
		if interval_usage != self.graph.interval_usage {
			debug!("wrong interval usage");
			return false;
		}
		true
	}

	/// Returns the number of constraints that use the interval constraint `c`.
	pub fn interval_usage(&self, c: ConIndex) -> usize {
		self.graph.interval_usage[c]
	}

	/// Re-index constraint `c` in the incidence graph after it was changed.
	///
	/// The reverse index is only updated for the variables whose usage by `c`
	/// changed.
	pub fn update_constraint_variable_usage(&mut self, c: ConIndex) {
		debug_assert!(self.constraint_variable_graph_is_up_to_date());
		self.graph.update_usage(c, &self.model.constraints[c]);
	}

	/// Index all constraints that were added to the model since the last call.
	///
	/// # Panics
	///
	/// Panics if constraints were removed from the model (rather than replaced
	/// by an empty constraint).
	pub fn update_new_constraints_variable_usage(&mut self) {
		let old_size = self.graph.num_constraints();
		let new_size = self.model.num_constraints();
		assert!(old_size <= new_size, "constraints were removed from the model");
		self.graph.interval_usage.resize(new_size, 0);
		for c in (old_size..new_size).map(ConIndex::new) {
			self.graph.add_usage(c, &self.model.constraints[c]);
		}
	}

	/// Returns the places where `var` is used.
	pub fn var_to_constraints(&self, var: VarIndex) -> &HashSet<Usage> {
		&self.graph.var_to_constraints[var]
	}

	/// Whether the referenced variable is not used in any constraint or in the
	/// objective.
	///
	/// Even if the variable is equivalent to other variables, it is no longer
	/// needed once the constraints defining these relations were removed.
	pub fn variable_is_not_used_anymore(&self, r: impl Into<VarRef>) -> bool {
		if !self.constraint_variable_graph_is_up_to_date() {
			return false;
		}
		self.graph.var_to_constraints[r.into().var()].is_empty()
	}

	/// Whether the referenced variable is only used in unary linear
	/// constraints, such as the constraints of its value encoding.
	pub fn variable_is_only_used_in_encoding(&self, r: impl Into<VarRef>) -> bool {
		if !self.constraint_variable_graph_is_up_to_date() {
			return false;
		}
		let var = r.into().var();
		self.graph.var_to_num_linear1[var] == self.graph.var_to_constraints[var].len()
	}

	/// Whether the referenced variable is used in exactly one place, and can be
	/// removed together with that constraint.
	///
	/// If the variable is equivalent to another variable (but is not its
	/// representative) and is used in a single constraint, then this constraint
	/// must be the one that defines the relation, and the caller is responsible
	/// for handling this case.
	pub fn variable_is_unique_and_removable(&self, r: impl Into<VarRef>) -> bool {
		if !self.constraint_variable_graph_is_up_to_date() {
			return false;
		}
		let var = r.into().var();
		self.graph.var_to_constraints[var].len() == 1
			&& self.variable_is_not_representative_of_equivalence_class(var)
			&& !self.keep_all_feasible_solutions()
	}

	/// Whether the referenced variable occurs in the objective and in exactly
	/// one constraint, and can be removed together with that constraint.
	///
	/// The same remark as for [`Self::variable_is_unique_and_removable`]
	/// applies.
	pub fn variable_with_cost_is_unique_and_removable(&self, r: impl Into<VarRef>) -> bool {
		if !self.constraint_variable_graph_is_up_to_date() {
			return false;
		}
		let var = r.into().var();
		let usage = &self.graph.var_to_constraints[var];
		!self.keep_all_feasible_solutions()
			&& usage.contains(&Usage::Objective)
			&& usage.len() == 2
			&& self.variable_is_not_representative_of_equivalence_class(var)
	}
}
