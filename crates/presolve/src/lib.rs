//! # Presolve - The Working Context of a Constraint Model Presolver
//!
//! Presolve rules simplify a discrete optimization model (integer and Boolean
//! decision variables, constraints and a linear objective) before any search
//! takes place. Many independent rules rewrite the same model, and they all
//! rely on a shared set of derived indexes to make their decisions: the current
//! domains of the variables, affine and equivalence relations between
//! variables, the constraint/variable incidence graph, the literals that encode
//! whether a variable takes a certain value, and a canonical form of the
//! objective.
//!
//! This crate provides [`PresolveContext`], which owns the working [`Model`]
//! and keeps all of these indexes consistent while rules mutate the model. Any
//! change that proves that the model has no solution is reported as a
//! [`PresolveError::Unsatisfiable`] error, and remembered by the context for
//! the remainder of the presolve run.

pub mod affine;
pub mod context;
pub mod domain;
pub(crate) mod helpers;
pub mod model;
#[cfg(test)]
pub(crate) mod tests;

use std::num::NonZeroI64;

#[cfg(test)]
use codspeed_criterion_compat as _;

pub use crate::{
	affine::{AffineRelations, Relation},
	context::{
		encoding::EncodingDirection, graph::Usage, objective::Objective, PresolveConfig,
		PresolveContext, PresolveError,
	},
	domain::Domain,
	model::{
		ConIndex, Constraint, ConstraintKind, LinearConstraint, LinearExpr, Literal, Model,
		ObjectiveDef, VarIndex, VarRef,
	},
};

/// Type alias for the integer values of variables and coefficients.
pub type IntVal = i64;

/// Type alias for a non-zero [`IntVal`].
pub type NonZeroIntVal = NonZeroI64;
