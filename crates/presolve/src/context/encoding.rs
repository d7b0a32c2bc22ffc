//! Literals that encode whether a variable takes a particular value.
//!
//! An encoding is discovered either at once (a full encoding `lit ⇔ var =
//! value`), or one direction at a time (half encodings `lit ⇒ var = value` and
//! `lit ⇒ var ≠ value`). Matching half encodings are promoted to a full
//! encoding, and different literals that encode the same value are merged.

use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use tracing::{debug, trace};

use crate::{
	model::{Literal, VarIndex},
	Domain, IntVal, LinearConstraint, PresolveContext, PresolveError, VarRef,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// The direction of a half encoding.
pub enum EncodingDirection {
	/// The literal implies that the variable is equal to the value.
	Equal,
	/// The literal implies that the variable is not equal to the value.
	NotEqual,
}

#[derive(Clone, Debug, Default)]
/// Storage for the (half) encodings of variable values.
pub(crate) struct ValueEncoding {
	/// Full encodings: the literal is true if-and-only-if the variable takes
	/// the value.
	full: HashMap<(VarIndex, IntVal), Literal>,
	/// Literals that imply that the variable takes the value.
	eq_half: HashMap<(VarIndex, IntVal), HashSet<Literal>>,
	/// Literals that imply that the variable does not take the value.
	neq_half: HashMap<(VarIndex, IntVal), HashSet<Literal>>,
}

impl ValueEncoding {
	/// Internal method that returns the half encoding set for the given
	/// direction.
	fn half_mut(
		&mut self,
		direction: EncodingDirection,
	) -> &mut HashMap<(VarIndex, IntVal), HashSet<Literal>> {
		match direction {
			EncodingDirection::Equal => &mut self.eq_half,
			EncodingDirection::NotEqual => &mut self.neq_half,
		}
	}

	/// Internal method that returns the literals of the half encodings of
	/// `key` in the given direction.
	fn half_literals(
		&self,
		key: (VarIndex, IntVal),
		direction: EncodingDirection,
	) -> Vec<Literal> {
		let map = match direction {
			EncodingDirection::Equal => &self.eq_half,
			EncodingDirection::NotEqual => &self.neq_half,
		};
		map.get(&key)
			.map(|set| set.iter().copied().sorted().collect())
			.unwrap_or_default()
	}
}

impl EncodingDirection {
	/// Returns the opposite direction.
	fn opposite(self) -> Self {
		match self {
			Self::Equal => Self::NotEqual,
			Self::NotEqual => Self::Equal,
		}
	}
}

impl PresolveContext {
	/// Returns a literal that is true if-and-only-if the referenced variable
	/// takes `value`, creating a new Boolean variable if required.
	///
	/// Repeated calls for the same value return equivalent literals. New
	/// constraints might be added to the model, which have to be registered
	/// using [`Self::update_new_constraints_variable_usage`].
	pub fn get_or_create_var_value_encoding(
		&mut self,
		r: impl Into<VarRef>,
		value: IntVal,
	) -> Result<Literal, PresolveError> {
		let (var, value) = Self::encoding_key(r.into(), value);
		if !self.domain_contains(var, value) {
			return Ok(self.get_or_create_constant_var(0).into());
		}
		if let Some(lit) = self.has_var_value_encoding(var, value) {
			return Ok(lit);
		}

		let dom = &self.domains[var];
		if dom.is_fixed() {
			let lit = self.get_or_create_constant_var(1).into();
			let _ = self.insert_encoding(lit, var, value, false)?;
			return Ok(lit);
		}
		if dom.size() == 2 {
			let (min, max) = (dom.min(), dom.max());
			let other_value = if value == min { max } else { min };
			if let Some(other) = self.has_var_value_encoding(var, other_value) {
				let lit = !other;
				let _ = self.insert_encoding(lit, var, value, false)?;
				return Ok(lit);
			}
			if min == 0 && max == 1 {
				let lit = self.get_literal_representative(var.into());
				let _ = self.insert_encoding(lit, var, 1, false)?;
				let _ = self.insert_encoding(!lit, var, 0, false)?;
				return Ok(if value == 1 { lit } else { !lit });
			}
			// The new literal encodes the maximum value.
			let lit = self.new_bool_var().into();
			let _ = self.insert_encoding(lit, var, max, true)?;
			let rep = self.get_literal_representative(lit);
			return Ok(if value == max { rep } else { !rep });
		}

		let lit: Literal = self.new_bool_var().into();
		let _ = self.insert_encoding(lit, var, value, true)?;
		Ok(self.get_literal_representative(lit))
	}

	/// Returns the representative of the literal that is true if-and-only-if
	/// the referenced variable takes `value`, if such a literal is known.
	pub fn has_var_value_encoding(&self, r: impl Into<VarRef>, value: IntVal) -> Option<Literal> {
		let key = Self::encoding_key(r.into(), value);
		self.encoding
			.full
			.get(&key)
			.map(|&lit| self.get_literal_representative(lit))
	}

	/// Record the half encoding `lit ⇒ var = value` or `lit ⇒ var ≠ value`,
	/// depending on `direction`, returning whether it was new.
	///
	/// When the converse half encoding is known, the encoding is promoted to a
	/// full encoding. If the value was already fully encoded by a different
	/// literal, then the two literals are merged.
	pub fn insert_half_var_value_encoding(
		&mut self,
		lit: Literal,
		var: VarIndex,
		value: IntVal,
		direction: EncodingDirection,
	) -> Result<bool, PresolveError> {
		if self.is_unsat {
			return Err(PresolveError::Unsatisfiable);
		}
		let key = (var, value);
		if !self
			.encoding
			.half_mut(direction)
			.entry(key)
			.or_default()
			.insert(lit)
		{
			return Ok(false);
		}
		debug!(lit = %lit, var = var.index(), value, ?direction, "half reified value encoding");
		self.update_rule_stats("variables: detect half reified value encoding");

		let negated = self.get_literal_representative(!lit);
		let converse = self
			.encoding
			.half_literals(key, direction.opposite())
			.into_iter()
			.find(|&other| self.get_literal_representative(other) == negated);
		if converse.is_some() {
			let eq_lit = match direction {
				EncodingDirection::Equal => lit,
				EncodingDirection::NotEqual => !lit,
			};
			if self.insert_encoding(eq_lit, var, value, false)? {
				self.update_rule_stats("variables: detect fully reified value encoding");
			}
		}
		Ok(true)
	}

	/// Record that `lit` is true if-and-only-if the referenced variable takes
	/// `value`.
	///
	/// The constraints that enforce the encoding are added to the model, and
	/// have to be registered using
	/// [`Self::update_new_constraints_variable_usage`]. If `value` is not in the
	/// domain of the variable, then `lit` is fixed to false instead. If the
	/// value was already encoded by a different literal, then the two literals
	/// are merged.
	///
	/// # Panics
	///
	/// Panics if `lit` cannot be used as a literal.
	pub fn insert_var_value_encoding(
		&mut self,
		lit: Literal,
		r: impl Into<VarRef>,
		value: IntVal,
	) -> Result<(), PresolveError> {
		assert!(
			self.can_be_used_as_literal(lit),
			"insert_var_value_encoding called with a non-Boolean literal"
		);
		let (var, value) = Self::encoding_key(r.into(), value);
		if !self.domain_contains(var, value) {
			let _ = self.set_literal_to_false(lit)?;
			return Ok(());
		}
		let _ = self.insert_encoding(lit, var, value, true)?;
		Ok(())
	}

	/// Record that `lit ⇒ var = value` for the referenced variable, returning
	/// whether this implication was not known before.
	///
	/// If `value` is not in the domain of the variable, then `lit` is fixed to
	/// false instead.
	pub fn store_literal_implies_var_eq_value(
		&mut self,
		lit: Literal,
		r: impl Into<VarRef>,
		value: IntVal,
	) -> Result<bool, PresolveError> {
		let (var, value) = Self::encoding_key(r.into(), value);
		if !self.domain_contains(var, value) {
			return self.set_literal_to_false(lit);
		}
		self.insert_half_var_value_encoding(lit, var, value, EncodingDirection::Equal)
	}

	/// Record that `lit ⇒ var ≠ value` for the referenced variable, returning
	/// whether this implication was not known before.
	///
	/// Nothing is recorded when `value` is not in the domain of the variable.
	pub fn store_literal_implies_var_neq_value(
		&mut self,
		lit: Literal,
		r: impl Into<VarRef>,
		value: IntVal,
	) -> Result<bool, PresolveError> {
		let (var, value) = Self::encoding_key(r.into(), value);
		if !self.domain_contains(var, value) {
			return Ok(false);
		}
		self.insert_half_var_value_encoding(lit, var, value, EncodingDirection::NotEqual)
	}

	/// Internal method that maps a reference and a value to the key used to
	/// store encodings, which uses the positive variable.
	fn encoding_key(r: VarRef, value: IntVal) -> (VarIndex, IntVal) {
		(r.var(), if r.is_positive() { value } else { -value })
	}

	/// Internal method to record the full encoding `lit ⇔ var = value`,
	/// returning whether the value was not encoded before.
	///
	/// For variables with two values, the other value is encoded by `!lit` and
	/// the variable is linked to the literal using an affine relation. For
	/// other variables, the half encodings are recorded, and if
	/// `add_constraints` is set, constraints that enforce them are added to the
	/// model.
	fn insert_encoding(
		&mut self,
		lit: Literal,
		var: VarIndex,
		value: IntVal,
		add_constraints: bool,
	) -> Result<bool, PresolveError> {
		if let Some(&previous) = self.encoding.full.get(&(var, value)) {
			if previous != lit {
				self.update_rule_stats("variables: merge equivalent var value encoding literals");
				self.store_boolean_equality_relation(lit, previous)?;
			}
			return Ok(false);
		}
		let _ = self.encoding.full.insert((var, value), lit);

		let dom = &self.domains[var];
		if dom.size() == 2 {
			let (min, max) = (dom.min(), dom.max());
			let other_value = if value == min { max } else { min };
			if let Some(&other) = self.encoding.full.get(&(var, other_value)) {
				if other != !lit {
					self.store_boolean_equality_relation(lit, !other)?;
				}
				return Ok(true);
			}
			let _ = self.encoding.full.insert((var, other_value), !lit);
			self.link_two_valued_variable(lit, var, value, other_value);
		} else {
			trace!(lit = %lit, var = var.index(), value, "insert value encoding");
			let _ = self
				.encoding
				.eq_half
				.entry((var, value))
				.or_default()
				.insert(lit);
			let _ = self
				.encoding
				.neq_half
				.entry((var, value))
				.or_default()
				.insert(!lit);
			if add_constraints {
				let eq = Domain::singleton(value);
				let neq = eq.complement();
				self.add_imply_in_domain(lit, var, eq);
				self.add_imply_in_domain(!lit, var, neq);
			}
		}
		Ok(true)
	}

	/// Internal method that adds the linear constraint and affine relation that
	/// make `var` take `value` when `lit` is true, and `other_value` otherwise.
	fn link_two_valued_variable(
		&mut self,
		lit: Literal,
		var: VarIndex,
		value: IntVal,
		other_value: IntVal,
	) {
		let lit_var = lit.var();
		if self.get_affine_relation(var).representative
			== self.get_affine_relation(lit_var).representative
		{
			return;
		}
		// var = coeff * lit_var + offset
		let (coeff, offset) = if lit.is_positive() {
			(value - other_value, other_value)
		} else {
			(other_value - value, value)
		};
		debug!(
			var = var.index(),
			lit = %lit,
			coeff,
			offset,
			"link two-valued variable to its encoding literal"
		);
		let ct = self.model.add_constraint(
			LinearConstraint::new(
				[(var.into(), 1), (lit_var.into(), -coeff)],
				Domain::singleton(offset),
			)
			.into(),
		);
		let _ = self.store_affine_relation(ct, var, lit_var, coeff, offset);
	}
}

#[cfg(test)]
mod tests {
	use tracing_test::traced_test;

	use crate::{
		model::Literal, ConstraintKind, Domain, Model, PresolveConfig, PresolveContext,
		PresolveError, VarRef,
	};

	#[test]
	#[traced_test]
	fn test_two_valued_encoding() {
		let mut model = Model::default();
		let x = model.new_int_var(Domain::from_values([3, 7]));
		let mut ctx = PresolveContext::new(model, PresolveConfig::default());

		let lit = ctx.get_or_create_var_value_encoding(x, 7).unwrap();
		assert_eq!(ctx.has_var_value_encoding(x, 7), Some(lit));
		assert_eq!(ctx.has_var_value_encoding(x, 3), Some(!lit));
		assert_eq!(ctx.get_or_create_var_value_encoding(x, 3).unwrap(), !lit);
		// The values of a negated reference are negated.
		assert_eq!(ctx.has_var_value_encoding(VarRef::negative(x), -3), Some(!lit));

		// x = 4 * lit + 3
		let rel = ctx.get_affine_relation(x);
		assert_eq!(rel.representative, lit.var());
		assert_eq!((rel.coeff, rel.offset), (4, 3));
		assert_eq!(ctx.model().num_constraints(), 1);
		ctx.update_new_constraints_variable_usage();
		assert!(ctx.constraint_variable_usage_is_consistent());
	}

	#[test]
	#[traced_test]
	fn test_boolean_encoding() {
		let mut model = Model::default();
		let b = model.new_bool_var();
		let mut ctx = PresolveContext::new(model, PresolveConfig::default());

		let lit = ctx.get_or_create_var_value_encoding(b, 1).unwrap();
		assert_eq!(lit, VarRef::positive(b));
		let lit = ctx.get_or_create_var_value_encoding(b, 0).unwrap();
		assert_eq!(lit, VarRef::negative(b));
		assert_eq!(ctx.model().num_constraints(), 0);
	}

	#[test]
	#[traced_test]
	fn test_constant_encodings() {
		let mut model = Model::default();
		let x = model.new_int_var(Domain::new(0, 10));
		let f = model.new_int_var(Domain::singleton(4));
		let mut ctx = PresolveContext::new(model, PresolveConfig::default());

		let no = ctx.get_or_create_var_value_encoding(x, 11).unwrap();
		assert!(ctx.literal_is_false(no));
		let yes = ctx.get_or_create_var_value_encoding(f, 4).unwrap();
		assert!(ctx.literal_is_true(yes));
		let no = ctx.get_or_create_var_value_encoding(f, 5).unwrap();
		assert!(ctx.literal_is_false(no));
	}

	#[test]
	#[traced_test]
	fn test_large_domain_encoding() {
		let mut model = Model::default();
		let x = model.new_int_var(Domain::new(0, 10));
		let mut ctx = PresolveContext::new(model, PresolveConfig::default());

		let lit = ctx.get_or_create_var_value_encoding(x, 5).unwrap();
		assert_eq!(ctx.get_or_create_var_value_encoding(x, 5).unwrap(), lit);
		assert_eq!(ctx.has_var_value_encoding(x, 4), None);

		// lit ⇒ x = 5 and ¬lit ⇒ x ≠ 5
		let constraints: Vec<(Vec<Literal>, Domain)> = ctx
			.model()
			.constraints()
			.map(|(_, ct)| {
				let ConstraintKind::Linear(lin) = &ct.kind else {
					panic!("unexpected constraint {ct:?}")
				};
				assert_eq!(lin.vars, vec![VarRef::positive(x)]);
				(ct.enforcement.clone(), lin.domain.clone())
			})
			.collect();
		assert_eq!(
			constraints,
			vec![
				(vec![lit], Domain::singleton(5)),
				(vec![!lit], Domain::singleton(5).complement()),
			]
		);

		// The half encodings are known, so inserting them again changes nothing.
		assert_eq!(ctx.store_literal_implies_var_eq_value(lit, x, 5), Ok(false));
		assert_eq!(ctx.store_literal_implies_var_neq_value(!lit, x, 5), Ok(false));
		ctx.update_new_constraints_variable_usage();
		assert!(ctx.variable_is_only_used_in_encoding(x));
		assert!(ctx.constraint_variable_usage_is_consistent());
	}

	#[test]
	#[traced_test]
	fn test_half_encodings_promoted_and_merged() {
		let mut model = Model::default();
		let x = model.new_int_var(Domain::new(0, 10));
		let a: Literal = model.new_bool_var().into();
		let b: Literal = model.new_bool_var().into();
		let mut ctx = PresolveContext::new(model, PresolveConfig::default());

		assert_eq!(ctx.store_literal_implies_var_eq_value(a, x, 3), Ok(true));
		assert_eq!(ctx.has_var_value_encoding(x, 3), None);
		assert_eq!(ctx.store_literal_implies_var_neq_value(!a, x, 3), Ok(true));
		assert_eq!(ctx.has_var_value_encoding(x, 3), Some(a));
		// No constraints are needed for encodings that were detected.
		assert_eq!(ctx.model().num_constraints(), 0);

		assert_eq!(ctx.store_literal_implies_var_neq_value(!b, x, 3), Ok(true));
		assert_eq!(ctx.store_literal_implies_var_eq_value(b, x, 3), Ok(true));
		assert_eq!(
			ctx.get_literal_representative(a),
			ctx.get_literal_representative(b)
		);
		let stats = ctx.stats_by_rule_name();
		assert_eq!(stats["variables: detect half reified value encoding"], 4);
		// The second full encoding is merged with the first instead.
		assert_eq!(stats["variables: detect fully reified value encoding"], 1);
		assert_eq!(stats["variables: merge equivalent var value encoding literals"], 1);
		// The merge is defined by an equality constraint.
		assert_eq!(ctx.model().num_constraints(), 1);
	}

	#[test]
	#[traced_test]
	fn test_conflicting_encodings() {
		let mut model = Model::default();
		let x = model.new_int_var(Domain::from_values([1, 2]));
		let a: Literal = model.new_bool_var().into();
		let mut ctx = PresolveContext::new(model, PresolveConfig::default());

		assert_eq!(ctx.insert_var_value_encoding(a, x, 1), Ok(()));
		// a cannot encode both values.
		assert_eq!(
			ctx.insert_var_value_encoding(a, x, 2),
			Err(PresolveError::Unsatisfiable)
		);
		assert!(ctx.is_unsat());
	}

	#[test]
	#[traced_test]
	fn test_encoding_outside_domain() {
		let mut model = Model::default();
		let x = model.new_int_var(Domain::new(0, 10));
		let a: Literal = model.new_bool_var().into();
		let b: Literal = model.new_bool_var().into();
		let mut ctx = PresolveContext::new(model, PresolveConfig::default());

		assert_eq!(ctx.store_literal_implies_var_neq_value(a, x, 20), Ok(false));
		assert!(!ctx.is_fixed(a));
		assert_eq!(ctx.store_literal_implies_var_eq_value(a, x, 20), Ok(true));
		assert!(ctx.literal_is_false(a));
		assert_eq!(ctx.insert_var_value_encoding(b, x, -1), Ok(()));
		assert!(ctx.literal_is_false(b));
	}
}
