//! Runtime for dinozoo.
//!
//! This crate provides the GraphQL execution runtime:
//! - `schema`: Schema definition, SDL loading and printing
//! - `validation`: Document validation and operation selection
//! - `coercion`: Input coercion and leaf serialization
//! - `resolver`: Resolver trait and resolver map
//! - `executor`: Operation execution with null propagation
//! - `error`: Error codes reported in `extensions.code`

pub mod coercion;
pub mod error;
pub mod executor;
pub mod resolver;
pub mod schema;
pub mod validation;

pub use error::ErrorCode;
pub use executor::{coerce_variables, Context, Executor, FieldError, PathSegment, Response};
pub use resolver::{
    Resolver, ResolverArgs, ResolverError, ResolverFuture, ResolverInfo, ResolverMap,
    ResolverResult,
};
pub use schema::{Schema, SchemaBuilder, SchemaError, TypeDef, TypeRef};
pub use validation::{select_operation, validate, ValidationError};
