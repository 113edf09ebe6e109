//! Field resolvers and the map the executor looks them up in.

use crate::executor::{Context, FieldError, PathSegment};
use crate::error::ErrorCode;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::fmt::{self, Debug};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Coerced field arguments, in the order they were declared.
#[derive(Debug, Clone, Default)]
pub struct ResolverArgs {
    args: IndexMap<String, Value>,
}

impl ResolverArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: Vec<(String, Value)>) -> Self {
        Self {
            args: pairs.into_iter().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Deserializes the argument `name`, failing when it is absent or has the wrong shape.
    pub fn require<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<T, ResolverError> {
        let value = self
            .args
            .get(name)
            .ok_or_else(|| ResolverError::MissingArgument(name.to_string()))?;
        serde_json::from_value(value.clone())
            .map_err(|e| ResolverError::ArgumentParseError(name.to_string(), e.to_string()))
    }

    pub(crate) fn set(&mut self, name: impl Into<String>, value: Value) {
        self.args.insert(name.into(), value);
    }
}

/// Where in the response a resolver is running.
#[derive(Debug, Clone)]
pub struct ResolverInfo {
    pub field_name: String,
    pub parent_type: String,
    /// Declared return type, e.g. `[Dinosaur!]!`.
    pub return_type: String,
    pub path: Vec<PathSegment>,
}

impl ResolverInfo {
    pub fn new(field_name: impl Into<String>, parent_type: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            parent_type: parent_type.into(),
            return_type: String::new(),
            path: Vec::new(),
        }
    }

    pub fn with_return_type(mut self, ty: impl Into<String>) -> Self {
        self.return_type = ty.into();
        self
    }

    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }
}

pub type ResolverResult = Result<Value, ResolverError>;

pub type ResolverFuture<'a> = Pin<Box<dyn Future<Output = ResolverResult> + Send + 'a>>;

/// A failed field; reported with code `RESOLVER_ERROR`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolverError {
    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    #[error("Failed to parse argument '{0}': {1}")]
    ArgumentParseError(String, String),

    #[error("{0}")]
    Custom(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResolverError {
    /// Wraps any displayable error as a resolver failure.
    pub fn custom(error: impl fmt::Display) -> Self {
        Self::Custom(error.to_string())
    }
}

impl From<ResolverError> for FieldError {
    fn from(error: ResolverError) -> Self {
        FieldError::new(error.to_string()).with_code(ErrorCode::ResolverError)
    }
}

/// Produces the value of one field of one object type.
pub trait Resolver: Send + Sync {
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        args: &'a ResolverArgs,
        ctx: &'a Context,
        info: &'a ResolverInfo,
    ) -> ResolverFuture<'a>;
}

type AsyncResolverFn =
    Arc<dyn Fn(ResolverArgs, Context, ResolverInfo) -> ResolverFuture<'static> + Send + Sync>;

/// Adapts a closure returning a future.
///
/// Root fields have no parent, so the closure only gets owned arguments, context and info.
struct AsyncFnResolver {
    func: AsyncResolverFn,
}

impl AsyncFnResolver {
    fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(ResolverArgs, Context, ResolverInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolverResult> + Send + 'static,
    {
        Self {
            func: Arc::new(move |args, ctx, info| Box::pin(f(args, ctx, info))),
        }
    }
}

impl Resolver for AsyncFnResolver {
    fn resolve<'a>(
        &'a self,
        _parent: &'a Value,
        args: &'a ResolverArgs,
        ctx: &'a Context,
        info: &'a ResolverInfo,
    ) -> ResolverFuture<'a> {
        (self.func)(args.clone(), ctx.clone(), info.clone())
    }
}

/// Reads the field of the same name off the parent object.
pub struct DefaultResolver;

impl Resolver for DefaultResolver {
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        _args: &'a ResolverArgs,
        _ctx: &'a Context,
        info: &'a ResolverInfo,
    ) -> ResolverFuture<'a> {
        let result = match parent {
            Value::Object(map) => Ok(map.get(&info.field_name).cloned().unwrap_or(Value::Null)),
            Value::Null => Ok(Value::Null),
            _ => Err(ResolverError::Internal(format!(
                "cannot read field \"{}\" from a non-object value",
                info.field_name
            ))),
        };
        Box::pin(async move { result })
    }
}

/// Resolvers keyed by `Type.field`; unregistered fields fall back to [`DefaultResolver`].
pub struct ResolverMap {
    resolvers: FxHashMap<String, Box<dyn Resolver>>,
    fallback: DefaultResolver,
}

impl Default for ResolverMap {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverMap {
    pub fn new() -> Self {
        Self {
            resolvers: FxHashMap::default(),
            fallback: DefaultResolver,
        }
    }

    fn register<R: Resolver + 'static>(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        resolver: R,
    ) {
        let key = format!("{}.{}", type_name.into(), field_name.into());
        self.resolvers.insert(key, Box::new(resolver));
    }

    /// Registers `f` for `type_name.field_name`.
    pub fn register_async<F, Fut>(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        f: F,
    ) where
        F: Fn(ResolverArgs, Context, ResolverInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolverResult> + Send + 'static,
    {
        self.register(type_name, field_name, AsyncFnResolver::new(f));
    }

    pub fn contains(&self, type_name: &str, field_name: &str) -> bool {
        self.resolvers
            .contains_key(&format!("{type_name}.{field_name}"))
    }

    pub fn get(&self, type_name: &str, field_name: &str) -> &dyn Resolver {
        match self.resolvers.get(&format!("{type_name}.{field_name}")) {
            Some(resolver) => resolver.as_ref(),
            None => &self.fallback,
        }
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl Debug for ResolverMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<_> = self.resolvers.keys().collect();
        fields.sort();
        f.debug_struct("ResolverMap").field("fields", &fields).finish()
    }
}
