mod error;
mod options;
mod parameters;
mod profile;

pub use error::ParameterError;
pub use options::{Options, Variant};
pub use parameters::{
    Choice, Constraint, Parameter, ParameterRegistry, ParameterSet, ParameterType, Value,
};
pub use profile::ProfileConfig;
