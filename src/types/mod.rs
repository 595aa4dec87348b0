mod context;
mod error;
mod node;
mod number;
mod range;
pub(crate) mod temporal;
mod value;

pub use context::EvaluationContext;
pub use error::{EvaluationError, FunctionError, TransformError};
pub use node::{ArithmeticOp, CompareOp, Node, Quantifier, TypeName};
pub use number::Number;
pub use range::RangeValue;
pub use value::Value;
