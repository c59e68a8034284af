//! Single-variable solvers for equations `f(x) = target`.
//!
//! [`NewtonRaphson`] follows the tangent from a single starting point;
//! [`RootBracketing`] narrows an interval that contains a sign change.

mod newton_raphson;
mod root_bracketing;

pub use newton_raphson::{NewtonRaphson, NewtonRaphsonConfig};
pub use root_bracketing::{BracketingMethod, RootBracketing, RootBracketingConfig};
