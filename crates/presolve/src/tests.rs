//! Test helpers, and tests of presolve scenarios in which several of the
//! indexes of the context interact.

use expect_test::{expect, Expect};
use itertools::Itertools;
use tracing_test::traced_test;

use crate::{
	model::{ConIndex, VarIndex},
	Constraint, ConstraintKind, Domain, IntVal, LinearConstraint, Model, ObjectiveDef,
	PresolveConfig, PresolveContext, PresolveError, VarRef,
};

impl PresolveContext {
	/// Check that every operation on the context now fails, because the model
	/// is known to be unsatisfiable.
	pub(crate) fn assert_unsatisfiable(&mut self) {
		assert!(self.is_unsat());
		assert_eq!(
			self.intersect_domain_with(VarIndex::new(0), &Domain::all_values()),
			Err(PresolveError::Unsatisfiable)
		);
	}

	/// Check the affine relation of each of the given variables against the
	/// expected output, which lists one relation per line.
	pub(crate) fn expect_relations(&self, vars: &[VarIndex], expect: Expect) {
		let relations = vars
			.iter()
			.map(|&v| {
				let rel = self.get_affine_relation(v);
				format!(
					"{} = {} * {} + {}",
					VarRef::from(v),
					rel.coeff,
					VarRef::from(rel.representative),
					rel.offset
				)
			})
			.join("\n");
		expect.assert_eq(&relations);
	}
}

/// Compute the value of the objective for an assignment of the variables.
fn evaluate_objective(obj: &ObjectiveDef, values: &[IntVal]) -> f64 {
	let sum: IntVal = obj
		.terms
		.iter()
		.map(|&(r, coeff)| {
			let val = values[r.var().index()];
			coeff * if r.is_positive() { val } else { -val }
		})
		.sum();
	obj.scaling_factor * (sum as f64 + obj.offset)
}

#[test]
#[traced_test]
fn test_affine_and_equivalence_relations_agree() {
	let mut model = Model::default();
	let x = model.new_int_var(Domain::new(0, 100));
	let y = model.new_int_var(Domain::new(0, 100));
	let z = model.new_int_var(Domain::new(0, 100));
	let c0 = model.add_constraint(
		LinearConstraint::new([(x.into(), 1), (y.into(), -2)], Domain::singleton(1)).into(),
	);
	let c1 = model.add_constraint(
		LinearConstraint::new([(y.into(), 1), (z.into(), -1)], Domain::singleton(0)).into(),
	);
	let mut ctx = PresolveContext::new(model, PresolveConfig::default());
	assert!(ctx.store_affine_relation(c0, x, y, 2, 1));
	assert!(ctx.store_affine_relation(c1, y, z, 1, 0));

	// The general relation keeps y as representative of the larger class, but
	// the representative of the equivalence takes precedence.
	ctx.expect_relations(
		&[x, y, z],
		expect![[r#"
			x0 = 2 * x2 + 1
			x1 = 1 * x2 + 0
			x2 = 1 * x2 + 0"#]],
	);
	assert_eq!(ctx.get_variable_representative(VarRef::negative(y)), VarRef::negative(z));
	assert!(ctx.variable_is_not_representative_of_equivalence_class(y));
	assert!(!ctx.variable_is_not_representative_of_equivalence_class(z));
	assert_eq!(ctx.take_modified_domains(), vec![x, y]);
	assert_eq!(ctx.affine_constraints().iter().collect_vec(), vec![&c0, &c1]);
}

#[test]
#[traced_test]
fn test_affine_relation_with_unrepresentable_member() {
	let mut model = Model::default();
	let a = model.new_int_var(Domain::new(0, 1 << 62));
	let b = model.new_int_var(Domain::new(0, 1 << 22));
	let c = model.new_int_var(Domain::new(0, 10));
	let c0 = model.add_constraint(
		LinearConstraint::new([(a.into(), 1), (b.into(), -(1 << 40))], Domain::singleton(0))
			.into(),
	);
	let c1 = model.add_constraint(
		LinearConstraint::new([(b.into(), 1), (c.into(), -(1 << 30))], Domain::singleton(0))
			.into(),
	);
	let mut ctx = PresolveContext::new(model, PresolveConfig::default());
	assert!(ctx.store_affine_relation(c0, a, b, 1 << 40, 0));
	// Relating a to c would require a coefficient of 2^70.
	assert!(!ctx.store_affine_relation(c1, b, c, 1 << 30, 0));
	ctx.expect_relations(
		&[a, b, c],
		expect![[r#"
			x0 = 1099511627776 * x1 + 0
			x1 = 1 * x1 + 0
			x2 = 1 * x2 + 0"#]],
	);
	assert_eq!(ctx.affine_constraints().iter().collect_vec(), vec![&c0]);
}

#[test]
#[traced_test]
fn test_complementary_literals() {
	let mut model = Model::default();
	let a = model.new_bool_var();
	let b = model.new_bool_var();
	let ct = model.add_constraint(
		LinearConstraint::new([(a.into(), 1), (b.into(), 1)], Domain::singleton(1)).into(),
	);
	let mut ctx = PresolveContext::new(model, PresolveConfig::default());
	assert!(ctx.store_affine_relation(ct, a, b, -1, 1));
	ctx.expect_relations(
		&[a, b],
		expect![[r#"
			x0 = -1 * x1 + 1
			x1 = 1 * x1 + 0"#]],
	);
	assert_eq!(
		ctx.get_literal_representative(a.into()),
		!ctx.get_literal_representative(b.into())
	);
	// Stating that a and b are equal contradicts the stored relation.
	assert_eq!(
		ctx.store_boolean_equality_relation(a.into(), b.into()),
		Err(PresolveError::Unsatisfiable)
	);
	ctx.assert_unsatisfiable();
}

#[test]
#[traced_test]
fn test_equal_constants_share_a_class() {
	let mut model = Model::default();
	let v = model.new_int_var(Domain::singleton(3));
	let w = model.new_int_var(Domain::singleton(3));
	let u = model.new_int_var(Domain::singleton(4));
	let mut ctx = PresolveContext::new(model, PresolveConfig::default());

	ctx.expect_relations(
		&[v, w, u],
		expect![[r#"
			x0 = 1 * x0 + 0
			x1 = 1 * x0 + 0
			x2 = 1 * x2 + 0"#]],
	);
	assert_eq!(ctx.get_or_create_constant_var(3), v);
	assert_eq!(ctx.get_or_create_constant_var(4), u);
	let seven = ctx.get_or_create_constant_var(7);
	assert_eq!(seven, VarIndex::new(3));
	assert_eq!(ctx.get_or_create_constant_var(7), seven);
	assert_eq!(ctx.min_of(seven), 7);
}

#[test]
#[traced_test]
fn test_literal_equal_to_its_negation() {
	let mut model = Model::default();
	let a = model.new_bool_var();
	let mut ctx = PresolveContext::new(model, PresolveConfig::default());
	assert_eq!(
		ctx.store_boolean_equality_relation(a.into(), VarRef::negative(a)),
		Err(PresolveError::Unsatisfiable)
	);
	ctx.assert_unsatisfiable();
}

#[test]
#[traced_test]
fn test_objective_divided_by_gcd() {
	let mut model = Model::default();
	let x = model.new_int_var(Domain::new(0, 10));
	let y = model.new_int_var(Domain::new(0, 10));
	model += Constraint::from(ConstraintKind::AllDifferent(vec![x.into(), y.into()]));
	model.set_objective(ObjectiveDef::new([(x.into(), 2), (y.into(), 4)]));
	let mut ctx = PresolveContext::new(model, PresolveConfig::default());
	ctx.update_new_constraints_variable_usage();
	ctx.read_objective_from_model();

	assert_eq!(ctx.canonicalize_objective(), Ok(()));
	assert_eq!(
		ctx.objective_map().iter().collect_vec(),
		vec![(&x, &1), (&y, &2)]
	);
	assert_eq!(ctx.objective_scaling_factor(), 2.0);
	assert_eq!(ctx.objective_offset(), 0.0);
	assert!(!ctx.objective_domain_is_constraining());
}

#[test]
#[traced_test]
fn test_objective_only_variable_is_fixed() {
	let mut model = Model::default();
	let v = model.new_int_var(Domain::new(5, 9));
	model.set_objective(ObjectiveDef::new([(v.into(), 3)]));
	let mut ctx = PresolveContext::new(model, PresolveConfig::default());
	ctx.update_new_constraints_variable_usage();
	ctx.read_objective_from_model();

	assert_eq!(ctx.canonicalize_objective(), Ok(()));
	assert!(ctx.is_fixed(v));
	assert_eq!(ctx.min_of(v), 5);
	assert!(ctx.objective_map().is_empty());
	assert_eq!(ctx.objective_offset(), 15.0);
	assert!(ctx.domain_is_modified(v));
	assert_eq!(ctx.take_modified_domains(), vec![v]);
	assert!(!ctx.domain_is_modified(v));
	assert!(ctx.variable_is_not_used_anymore(v));

	// Variables are not fixed when all feasible solutions must be kept.
	let mut model = Model::default();
	let v = model.new_int_var(Domain::new(5, 9));
	model.set_objective(ObjectiveDef::new([(v.into(), 3)]));
	let mut ctx = PresolveContext::new(
		model,
		PresolveConfig::default().with_keep_all_feasible_solutions(true),
	);
	ctx.update_new_constraints_variable_usage();
	ctx.read_objective_from_model();
	assert_eq!(ctx.canonicalize_objective(), Ok(()));
	assert!(!ctx.is_fixed(v));
	assert_eq!(ctx.objective_map()[&v], 1);
	assert_eq!(ctx.objective_scaling_factor(), 3.0);
}

#[test]
#[traced_test]
fn test_objective_round_trip() {
	let mut model = Model::default();
	let x = model.new_int_var(Domain::new(0, 4));
	let y = model.new_int_var(Domain::new(0, 4));
	model += LinearConstraint::new([(x.into(), 1), (y.into(), 1)], Domain::new(0, 6));
	let declared = ObjectiveDef::new([(x.into(), 4), (y.into(), 6)]).with_offset(2.0);
	model.set_objective(declared.clone());

	let mut ctx = PresolveContext::new(model, PresolveConfig::default());
	ctx.update_new_constraints_variable_usage();
	ctx.read_objective_from_model();
	assert_eq!(ctx.canonicalize_objective(), Ok(()));
	assert_eq!(ctx.write_objective_to_model(), Ok(()));
	let model = ctx.into_model();
	let Some(obj) = model.objective() else {
		panic!("objective was not written to the model")
	};
	expect!["minimize 2 * x0 + 3 * x1, offset: 1, scaling: 2, domain: [-4611686018427387903..=4611686018427387903]"]
		.assert_eq(&obj.to_string());

	// The value of the objective is unchanged for all assignments.
	for values in (0..=4).cartesian_product(0..=4) {
		let values = [values.0, values.1];
		assert_eq!(
			evaluate_objective(obj, &values),
			evaluate_objective(&declared, &values)
		);
	}
}

#[test]
#[traced_test]
fn test_usage_after_rewrites() {
	let mut model = Model::default();
	let vars = (0..4)
		.map(|_| model.new_int_var(Domain::new(0, 10)))
		.collect_vec();
	let b = model.new_bool_var();
	let interval = model.add_constraint(
		ConstraintKind::Interval {
			start: vars[0].into(),
			size: vars[1].into(),
			end: vars[2].into(),
		}
		.into(),
	);
	let no_overlap = model.add_constraint(ConstraintKind::NoOverlap(vec![interval]).into());
	let lin = model.add_constraint(
		LinearConstraint::new([(vars[0].into(), 1), (vars[3].into(), 2)], Domain::new(0, 5))
			.into(),
	);
	let mut ctx = PresolveContext::new(model, PresolveConfig::default());
	assert!(!ctx.constraint_variable_graph_is_up_to_date());
	ctx.update_new_constraints_variable_usage();
	assert!(ctx.constraint_variable_usage_is_consistent());
	assert_eq!(ctx.interval_usage(interval), 1);

	// Rewrite the linear constraint to a unary constraint.
	*ctx.model_mut().constraint_mut(lin) =
		LinearConstraint::new([(vars[3].into(), 1)], Domain::new(0, 2)).into();
	ctx.update_constraint_variable_usage(lin);
	assert!(ctx.constraint_variable_usage_is_consistent());
	assert_eq!(ctx.constraint_to_vars(lin), &[vars[3]]);
	assert!(ctx.variable_is_only_used_in_encoding(vars[3]));

	// Remove the constraint that uses the interval.
	ctx.model_mut().constraint_mut(no_overlap).clear();
	ctx.update_constraint_variable_usage(no_overlap);
	assert!(ctx.constraint_variable_usage_is_consistent());
	assert_eq!(ctx.interval_usage(interval), 0);

	// Add enforced constraints.
	let _ = ctx.model_mut().add_constraint(
		Constraint::new(ConstraintKind::AllDifferent(vec![
			vars[1].into(),
			VarRef::negative(vars[3]),
		]))
		.with_enforcement([b.into()]),
	);
	ctx.add_implication(b.into(), VarRef::negative(b));
	assert!(!ctx.constraint_variable_graph_is_up_to_date());
	ctx.update_new_constraints_variable_usage();
	assert!(ctx.constraint_variable_usage_is_consistent());
	assert!(!ctx.variable_is_only_used_in_encoding(vars[3]));
	assert_eq!(ctx.var_to_constraints(b).len(), 2);
	assert_eq!(
		ctx.constraint_to_vars(ConIndex::new(3)),
		&[vars[1], vars[3], b]
	);
}

#[test]
#[traced_test]
fn test_encoding_literals_are_stable() {
	let mut model = Model::default();
	let x = model.new_int_var(Domain::from_values([2, 5, 9]));
	let y = model.new_int_var(Domain::from_values([-1, 4]));
	let mut ctx = PresolveContext::new(model, PresolveConfig::default());

	for value in [2, 5, 9] {
		let first = ctx.get_or_create_var_value_encoding(x, value).unwrap();
		let second = ctx.get_or_create_var_value_encoding(x, value).unwrap();
		assert_eq!(
			ctx.get_literal_representative(first),
			ctx.get_literal_representative(second)
		);
	}
	let low = ctx.get_or_create_var_value_encoding(y, -1).unwrap();
	let high = ctx.get_or_create_var_value_encoding(y, 4).unwrap();
	assert_eq!(low, !high);
	// The literal of the negated reference is the same.
	assert_eq!(
		ctx.get_or_create_var_value_encoding(VarRef::negative(y), -4)
			.unwrap(),
		high
	);

	ctx.update_new_constraints_variable_usage();
	assert!(ctx.constraint_variable_usage_is_consistent());
	// Two constraints per encoded value of x, and the link between y and its
	// literal.
	assert_eq!(ctx.model().num_constraints(), 7);
}
