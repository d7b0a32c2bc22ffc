//! The working copy of the objective, and the operations that bring it into a
//! canonical form.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::{
	helpers::gcd,
	model::{ConIndex, ConstraintKind, ObjectiveDef, VarIndex},
	Domain, IntVal, PresolveContext, PresolveError, Usage,
};

#[derive(Clone, Debug, PartialEq)]
/// The objective of the model as a sparse linear sum over (positive)
/// variables.
///
/// The value of the objective is `scaling_factor * (Σ coeff * var + offset)`,
/// where `Σ coeff * var` must be contained in `domain`.
pub struct Objective {
	/// The non-zero coefficient of each variable in the objective.
	pub(crate) map: BTreeMap<VarIndex, IntVal>,
	/// The constant offset of the objective.
	pub(crate) offset: f64,
	/// The factor by which the objective is scaled.
	pub(crate) scaling_factor: f64,
	/// The admissible values of the linear sum (excluding the offset).
	pub(crate) domain: Domain,
	/// Whether `domain` can exclude (optimal) solutions of the model.
	pub(crate) domain_is_constraining: bool,
}

impl Objective {
	/// The admissible values of the linear sum (excluding the offset).
	pub fn domain(&self) -> &Domain {
		&self.domain
	}

	/// Whether the domain of the objective can exclude (optimal) solutions of
	/// the model.
	pub fn domain_is_constraining(&self) -> bool {
		self.domain_is_constraining
	}

	/// The non-zero coefficient of each variable in the objective.
	pub fn map(&self) -> &BTreeMap<VarIndex, IntVal> {
		&self.map
	}

	/// The constant offset of the objective.
	pub fn offset(&self) -> f64 {
		self.offset
	}

	/// The factor by which the objective is scaled.
	pub fn scaling_factor(&self) -> f64 {
		self.scaling_factor
	}
}

impl Default for Objective {
	fn default() -> Self {
		Self {
			map: BTreeMap::new(),
			offset: 0.0,
			scaling_factor: 1.0,
			domain: Domain::all_values(),
			domain_is_constraining: false,
		}
	}
}

impl PresolveContext {
	/// Bring the objective into a canonical form.
	///
	/// Variables that only occur in the objective are fixed to their best value
	/// (unless all feasible solutions must be kept), fixed variables are moved
	/// into the offset, and variables are replaced by their representative. The
	/// domain of the objective is then restricted to the values that the linear
	/// sum can take, and all coefficients are divided by their greatest common
	/// divisor.
	///
	/// A term is left unchanged when moving it into the offset, or replacing
	/// its variable by the representative, would overflow.
	///
	/// An error is returned when the domain of the objective becomes empty.
	pub fn canonicalize_objective(&mut self) -> Result<(), PresolveError> {
		let mut offset_change: IntVal = 0;

		// The map is modified during the substitution, so iterate over a copy.
		let entries: Vec<VarIndex> = self.objective.map.keys().copied().collect();
		for var in entries {
			let Some(&coeff) = self.objective.map.get(&var) else {
				continue;
			};

			// A variable that only occurs in the objective can be fixed to its best
			// value, even if it is in an affine relation with other variables: the
			// constraints defining the relations are no longer in the model.
			if !self.keep_all_feasible_solutions()
				&& !self.objective.domain_is_constraining
				&& self.constraint_variable_graph_is_up_to_date()
				&& self.var_to_constraints(var).len() == 1
				&& self.var_to_constraints(var).contains(&Usage::Objective)
			{
				self.update_rule_stats("objective: variable not used elsewhere");
				let best = if coeff > 0 {
					self.min_of(var)
				} else {
					self.max_of(var)
				};
				let _ = self.intersect_domain_with(var, &Domain::singleton(best))?;
			}

			if self.is_fixed(var) {
				if let Some(change) = add_product(offset_change, coeff, self.min_of(var)) {
					offset_change = change;
					self.remove_from_objective(var);
				} else {
					debug!(var = var.index(), "fixed objective term kept to avoid overflow");
				}
				continue;
			}

			let rel = self.get_affine_relation(var);
			if rel.representative == var {
				continue;
			}
			let rep = rel.representative;
			let rep_coeff = self.objective.map.get(&rep).copied().unwrap_or(0);
			let Some((change, new_coeff)) = add_product(offset_change, coeff, rel.offset)
				.zip(add_product(rep_coeff, coeff, rel.coeff))
			else {
				debug!(
					var = var.index(),
					representative = rep.index(),
					"objective term kept to avoid overflow"
				);
				continue;
			};
			offset_change = change;
			self.remove_from_objective(var);
			trace!(
				var = var.index(),
				representative = rep.index(),
				coeff = new_coeff,
				"substitute representative in objective"
			);
			if new_coeff == 0 {
				self.remove_from_objective(rep);
			} else {
				let _ = self.objective.map.insert(rep, new_coeff);
				self.graph.add_objective_usage(rep);
				if self.is_fixed(rep) {
					if let Some(change) = add_product(offset_change, new_coeff, self.min_of(rep)) {
						offset_change = change;
						self.remove_from_objective(rep);
					}
				}
			}
		}

		let limit = self.config.domain_complexity_limit();
		let mut implied = Domain::singleton(0);
		let mut divisor = 0;
		for (&var, &coeff) in &self.objective.map {
			divisor = gcd(divisor, coeff);
			let (term, _) = self.domain_of(var).multiplication_by(coeff);
			implied = implied.addition_with(&term).relax_if_too_complex(limit);
		}

		// The domain never includes the offset.
		let domain = self
			.objective
			.domain
			.addition_with(&Domain::singleton(-offset_change))
			.intersection_with(&implied);
		self.objective.domain = domain.simplify_using_implied_domain(&implied);
		self.objective.offset += offset_change as f64;

		if divisor > 1 {
			for coeff in self.objective.map.values_mut() {
				*coeff /= divisor;
			}
			self.objective.domain = self.objective.domain.inverse_multiplication_by(divisor);
			implied = implied.inverse_multiplication_by(divisor);
			self.objective.offset /= divisor as f64;
			self.objective.scaling_factor *= divisor as f64;
			trace!(divisor, "divide objective by gcd");
		}

		if self.objective.domain.is_empty() {
			debug!("objective domain is empty");
			return Err(self.notify_that_model_is_unsat());
		}

		// The domain does not constrain the objective if every value of the
		// linear sum up to the largest admissible value is admissible.
		self.objective.domain_is_constraining = !implied
			.intersection_with(&Domain::new(Domain::MIN_VALUE, self.objective.domain.max()))
			.is_included_in(&self.objective.domain);
		Ok(())
	}

	/// Access the working copy of the objective.
	pub fn objective(&self) -> &Objective {
		&self.objective
	}

	/// The admissible values of the linear sum of the objective (excluding the
	/// offset).
	pub fn objective_domain(&self) -> &Domain {
		&self.objective.domain
	}

	/// Whether the domain of the objective can exclude (optimal) solutions of
	/// the model.
	pub fn objective_domain_is_constraining(&self) -> bool {
		self.objective.domain_is_constraining
	}

	/// The non-zero coefficient of each variable in the objective.
	pub fn objective_map(&self) -> &BTreeMap<VarIndex, IntVal> {
		&self.objective.map
	}

	/// The constant offset of the objective.
	pub fn objective_offset(&self) -> f64 {
		self.objective.offset
	}

	/// The factor by which the objective is scaled.
	pub fn objective_scaling_factor(&self) -> f64 {
		self.objective.scaling_factor
	}

	/// Load the working copy of the objective from the model.
	///
	/// Repeated variables are merged, negated references are replaced by their
	/// variable, and variables whose coefficients cancel out are removed.
	pub fn read_objective_from_model(&mut self) {
		for &var in self.objective.map.keys() {
			self.graph.remove_objective_usage(var);
		}
		let Some(def) = &self.model.objective else {
			self.objective = Objective::default();
			return;
		};

		self.objective.offset = def.offset;
		self.objective.scaling_factor = if def.scaling_factor == 0.0 {
			1.0
		} else {
			def.scaling_factor
		};
		// A declared domain might be relaxed when the objective is canonicalized,
		// using the domains of the variables.
		(self.objective.domain, self.objective.domain_is_constraining) = match &def.domain {
			Some(dom) => (dom.clone(), true),
			None => (Domain::all_values(), false),
		};

		self.objective.map.clear();
		for &(r, coeff) in &def.terms {
			let var = r.var();
			let coeff = if r.is_positive() { coeff } else { -coeff };
			let entry = self.objective.map.entry(var).or_default();
			*entry += coeff;
			if *entry == 0 {
				let _ = self.objective.map.remove(&var);
				self.graph.remove_objective_usage(var);
			} else {
				self.graph.add_objective_usage(var);
			}
		}
	}

	/// Internal method to remove a variable from the objective.
	fn remove_from_objective(&mut self, var: VarIndex) {
		let _ = self.objective.map.remove(&var);
		self.graph.remove_objective_usage(var);
	}

	/// Remove `var_in_equality` from the objective, by substituting it using the
	/// linear equality `equality` in which it occurs with coefficient
	/// `coeff_in_equality`.
	///
	/// Returns the variables that did not occur in the objective before the
	/// substitution. Since the equality is a constraint of the model, the domain
	/// of the objective is considered constraining afterwards.
	///
	/// # Panics
	///
	/// Panics if `equality` is not an unenforced linear equality, if
	/// `var_in_equality` does not occur in the objective, if
	/// `coeff_in_equality` does not divide its objective coefficient, or if a
	/// resulting coefficient cannot be represented.
	pub fn substitute_variable_in_objective(
		&mut self,
		var_in_equality: VarIndex,
		coeff_in_equality: IntVal,
		equality: ConIndex,
	) -> Vec<VarIndex> {
		let ct = &self.model.constraints[equality];
		assert!(
			ct.enforcement.is_empty(),
			"substitution using an enforced constraint"
		);
		let ConstraintKind::Linear(lin) = &ct.kind else {
			panic!("substitution using a constraint that is not linear")
		};
		assert!(
			lin.domain.is_fixed(),
			"substitution using a linear constraint that is not an equality"
		);
		let coeff_in_objective = *self
			.objective
			.map
			.get(&var_in_equality)
			.expect("substituted variable does not occur in the objective");
		assert_ne!(coeff_in_equality, 0, "substitution with a zero coefficient");
		assert_eq!(
			coeff_in_objective % coeff_in_equality,
			0,
			"equality coefficient does not divide the objective coefficient"
		);
		let multiplier = coeff_in_objective / coeff_in_equality;

		let mut new_vars = Vec::new();
		for (r, coeff) in lin.terms() {
			let var = r.var();
			let coeff = if r.is_positive() { coeff } else { -coeff };
			if var == var_in_equality {
				continue;
			}
			let entry = self.objective.map.entry(var).or_default();
			if *entry == 0 {
				new_vars.push(var);
			}
			let updated = coeff
				.checked_mul(multiplier)
				.and_then(|v| entry.checked_sub(v))
				.expect("overflow when substituting in the objective");
			*entry = updated;
			if *entry == 0 {
				let _ = self.objective.map.remove(&var);
				self.graph.remove_objective_usage(var);
			} else {
				self.graph.add_objective_usage(var);
			}
		}
		let shift = lin
			.domain
			.min()
			.checked_mul(multiplier)
			.expect("overflow when shifting the objective");
		self.remove_from_objective(var_in_equality);

		// The domain of the objective excludes the offset.
		self.objective.offset += shift as f64;
		self.objective.domain = self
			.objective
			.domain
			.addition_with(&Domain::singleton(-shift));
		self.objective.domain_is_constraining = true;
		trace!(
			var = var_in_equality.index(),
			constraint = equality.index(),
			multiplier,
			"substitute variable in objective"
		);
		new_vars
	}

	/// Write the working copy of the objective to the model.
	///
	/// An error is returned if the domain of the objective is empty.
	pub fn write_objective_to_model(&mut self) -> Result<(), PresolveError> {
		if self.objective.domain.is_empty() {
			return Err(self.notify_that_model_is_unsat());
		}
		self.model.objective = Some(ObjectiveDef {
			terms: self
				.objective
				.map
				.iter()
				.map(|(&var, &coeff)| (var.into(), coeff))
				.collect(),
			offset: self.objective.offset,
			scaling_factor: self.objective.scaling_factor,
			domain: Some(self.objective.domain.clone()),
		});
		Ok(())
	}
}

/// Returns `acc + coeff * value`, or `None` if the result cannot be
/// represented or lies outside of the values that a [`Domain`] can negate.
fn add_product(acc: IntVal, coeff: IntVal, value: IntVal) -> Option<IntVal> {
	coeff
		.checked_mul(value)?
		.checked_add(acc)
		.filter(|&v| v >= Domain::MIN_VALUE)
}
