//! Schema definition for dinozoo.
//!
//! A [`Schema`] is built from SDL with [`Schema::from_sdl`] or assembled with
//! [`SchemaBuilder`]. Either way [`SchemaBuilder::build`] checks that the
//! schema is consistent before it can be executed against.

use dinozoo_core::LineIndex;
use dinozoo_syntax::ast::{self, OperationType, TypeDefinitionKind};
use indexmap::IndexMap;
use std::fmt::{self, Write as _};
use thiserror::Error;

/// Names of the built-in scalar types.
pub const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// Error raised while loading or checking a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("syntax error at {line}:{column}: {message}")]
    Syntax {
        message: String,
        line: u32,
        column: u32,
    },

    #[error("type \"{0}\" is defined more than once")]
    DuplicateType(String),

    #[error("field \"{type_name}.{field}\" is defined more than once")]
    DuplicateField { type_name: String, field: String },

    #[error("type \"{0}\" must define at least one field or value")]
    EmptyType(String),

    #[error("schema has no query root type")]
    MissingQueryType,

    #[error("root {operation} type \"{name}\" must be a defined object type")]
    InvalidRootType { operation: String, name: String },

    #[error("unknown type \"{name}\" referenced by {referenced_by}")]
    UnknownType { name: String, referenced_by: String },

    #[error("{position} must have an output type, found \"{type_name}\"")]
    NotOutputType { position: String, type_name: String },

    #[error("{position} must have an input type, found \"{type_name}\"")]
    NotInputType { position: String, type_name: String },

    #[error("type \"{type_name}\" implements \"{interface}\", but interfaces are not supported")]
    UnsupportedInterface { type_name: String, interface: String },

    #[error("schema document may only contain type system definitions")]
    ExecutableDefinition,
}

/// A GraphQL schema.
#[derive(Debug, Clone)]
pub struct Schema {
    pub query_type: String,
    pub mutation_type: Option<String>,
    pub subscription_type: Option<String>,
    pub types: IndexMap<String, TypeDef>,
}

impl Schema {
    /// Loads and checks a schema written in SDL.
    pub fn from_sdl(sdl: &str) -> Result<Self, SchemaError> {
        let result = dinozoo_syntax::parse(sdl);
        if let Some(diagnostic) = result.diagnostics.iter().next() {
            let location = diagnostic.location(&LineIndex::new(sdl));
            return Err(SchemaError::Syntax {
                message: diagnostic.message.clone(),
                line: location.line,
                column: location.column,
            });
        }

        let mut builder = SchemaBuilder::new();
        let mut roots: Option<Vec<(OperationType, String)>> = None;

        for definition in result.document.definitions {
            match definition {
                ast::Definition::Schema(schema) => {
                    roots = Some(
                        schema
                            .operations
                            .into_iter()
                            .map(|op| (op.operation, op.type_name.value))
                            .collect(),
                    );
                }
                ast::Definition::Type(ty) => {
                    builder = builder.try_add_type(TypeDef::from_ast(ty)?)?;
                }
                ast::Definition::Operation(_) | ast::Definition::Fragment(_) => {
                    return Err(SchemaError::ExecutableDefinition);
                }
            }
        }

        match roots {
            Some(roots) => {
                for (operation, name) in roots {
                    builder = match operation {
                        OperationType::Query => builder.query_type(name),
                        OperationType::Mutation => builder.mutation_type(name),
                        OperationType::Subscription => builder.subscription_type(name),
                    };
                }
            }
            None => {
                for (operation, name) in [
                    (OperationType::Mutation, "Mutation"),
                    (OperationType::Subscription, "Subscription"),
                ] {
                    if builder.types.contains_key(name) {
                        builder = match operation {
                            OperationType::Mutation => builder.mutation_type(name),
                            _ => builder.subscription_type(name),
                        };
                    }
                }
            }
        }

        builder.build()
    }

    /// Gets a type by name.
    pub fn get_type(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Gets an object type by name.
    pub fn object(&self, name: &str) -> Option<&ObjectDef> {
        match self.types.get(name) {
            Some(TypeDef::Object(object)) => Some(object),
            _ => None,
        }
    }

    /// Returns the root object type for an operation kind, if the schema has one.
    pub fn root_type(&self, operation: OperationType) -> Option<&ObjectDef> {
        let name = match operation {
            OperationType::Query => Some(self.query_type.as_str()),
            OperationType::Mutation => self.mutation_type.as_deref(),
            OperationType::Subscription => self.subscription_type.as_deref(),
        }?;
        self.object(name)
    }

    /// Returns all types.
    pub fn types(&self) -> impl Iterator<Item = (&String, &TypeDef)> {
        self.types.iter()
    }

    /// Prints the schema as SDL. Built-in scalars are omitted.
    pub fn to_sdl(&self) -> String {
        let mut blocks = Vec::new();

        let default_roots = self.query_type == "Query"
            && self.mutation_type.as_deref().map_or(true, |m| m == "Mutation")
            && self
                .subscription_type
                .as_deref()
                .map_or(true, |s| s == "Subscription");
        if !default_roots {
            let mut block = String::from("schema {\n");
            let _ = writeln!(block, "  query: {}", self.query_type);
            if let Some(mutation) = &self.mutation_type {
                let _ = writeln!(block, "  mutation: {mutation}");
            }
            if let Some(subscription) = &self.subscription_type {
                let _ = writeln!(block, "  subscription: {subscription}");
            }
            block.push('}');
            blocks.push(block);
        }

        for ty in self.types.values() {
            if ty.is_builtin() {
                continue;
            }
            blocks.push(print_type(ty));
        }

        let mut sdl = blocks.join("\n\n");
        sdl.push('\n');
        sdl
    }
}

/// A type definition.
#[derive(Debug, Clone)]
pub enum TypeDef {
    Scalar(ScalarDef),
    Object(ObjectDef),
    Enum(EnumDef),
    InputObject(InputObjectDef),
}

impl TypeDef {
    pub fn name(&self) -> &str {
        match self {
            Self::Scalar(s) => &s.name,
            Self::Object(o) => &o.name,
            Self::Enum(e) => &e.name,
            Self::InputObject(i) => &i.name,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => s.description.as_deref(),
            Self::Object(o) => o.description.as_deref(),
            Self::Enum(e) => e.description.as_deref(),
            Self::InputObject(i) => i.description.as_deref(),
        }
    }

    /// Scalars and enums have no sub-fields.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Enum(_))
    }

    pub fn is_input(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Enum(_) | Self::InputObject(_))
    }

    pub fn is_output(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Enum(_) | Self::Object(_))
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Scalar(s) if BUILTIN_SCALARS.contains(&s.name.as_str()))
    }

    fn from_ast(definition: ast::TypeDefinition) -> Result<Self, SchemaError> {
        let name = definition.name.value;
        let description = definition.description;

        let ty = match definition.kind {
            TypeDefinitionKind::Scalar => Self::Scalar(ScalarDef { name, description }),
            TypeDefinitionKind::Object { interfaces, fields } => {
                if let Some(interface) = interfaces.into_iter().next() {
                    return Err(SchemaError::UnsupportedInterface {
                        type_name: name,
                        interface: interface.value,
                    });
                }
                let mut defs = IndexMap::new();
                for field in fields {
                    let def = FieldDef {
                        name: field.name.value.clone(),
                        description: field.description,
                        ty: TypeRef::from_ast(&field.ty),
                        arguments: input_values_from_ast(&name, field.arguments)?,
                    };
                    if defs.insert(field.name.value.clone(), def).is_some() {
                        return Err(SchemaError::DuplicateField {
                            type_name: name,
                            field: field.name.value,
                        });
                    }
                }
                Self::Object(ObjectDef {
                    name,
                    description,
                    fields: defs,
                })
            }
            TypeDefinitionKind::Enum { values } => {
                let mut defs: Vec<EnumValueDef> = Vec::with_capacity(values.len());
                for value in values {
                    if defs.iter().any(|v| v.name == value.name.value) {
                        return Err(SchemaError::DuplicateField {
                            type_name: name,
                            field: value.name.value,
                        });
                    }
                    defs.push(EnumValueDef {
                        name: value.name.value,
                        description: value.description,
                    });
                }
                Self::Enum(EnumDef {
                    name,
                    description,
                    values: defs,
                })
            }
            TypeDefinitionKind::InputObject { fields } => Self::InputObject(InputObjectDef {
                fields: input_values_from_ast(&name, fields)?,
                name,
                description,
            }),
        };

        Ok(ty)
    }
}

fn input_values_from_ast(
    owner: &str,
    values: Vec<ast::InputValueDefinition>,
) -> Result<IndexMap<String, InputValueDef>, SchemaError> {
    let mut defs = IndexMap::new();
    for value in values {
        let def = InputValueDef {
            name: value.name.value.clone(),
            description: value.description,
            ty: TypeRef::from_ast(&value.ty),
            default_value: value.default_value,
        };
        if defs.insert(value.name.value.clone(), def).is_some() {
            return Err(SchemaError::DuplicateField {
                type_name: owner.to_string(),
                field: value.name.value,
            });
        }
    }
    Ok(defs)
}

/// Scalar type definition.
#[derive(Debug, Clone)]
pub struct ScalarDef {
    pub name: String,
    pub description: Option<String>,
}

/// Object type definition.
#[derive(Debug, Clone)]
pub struct ObjectDef {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDef>,
}

/// Enum type definition.
#[derive(Debug, Clone)]
pub struct EnumDef {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<EnumValueDef>,
}

impl EnumDef {
    pub fn has_value(&self, name: &str) -> bool {
        self.values.iter().any(|v| v.name == name)
    }
}

/// Enum value definition.
#[derive(Debug, Clone)]
pub struct EnumValueDef {
    pub name: String,
    pub description: Option<String>,
}

/// Input object type definition.
#[derive(Debug, Clone)]
pub struct InputObjectDef {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, InputValueDef>,
}

/// Field definition.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub arguments: IndexMap<String, InputValueDef>,
}

/// Argument or input field definition.
#[derive(Debug, Clone)]
pub struct InputValueDef {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    /// Constant default, kept as written in the SDL.
    pub default_value: Option<ast::Value>,
}

impl InputValueDef {
    /// Required means non-null without a default.
    pub fn is_required(&self) -> bool {
        self.ty.is_non_null() && self.default_value.is_none()
    }
}

/// Type reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Named(String),
    NonNull(Box<TypeRef>),
    List(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn non_null(inner: TypeRef) -> Self {
        Self::NonNull(Box::new(inner))
    }

    pub fn list(inner: TypeRef) -> Self {
        Self::List(Box::new(inner))
    }

    /// Converts a type reference written in a document.
    pub fn from_ast(ty: &ast::Type) -> Self {
        match ty {
            ast::Type::Named(name) => Self::Named(name.value.clone()),
            ast::Type::List(inner, _) => Self::list(Self::from_ast(inner)),
            ast::Type::NonNull(inner, _) => Self::non_null(Self::from_ast(inner)),
        }
    }

    /// Returns the innermost named type.
    pub fn named_type(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::NonNull(inner) | Self::List(inner) => inner.named_type(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::NonNull(inner) => write!(f, "{inner}!"),
            Self::List(inner) => write!(f, "[{inner}]"),
        }
    }
}

/// Schema builder.
#[derive(Debug)]
pub struct SchemaBuilder {
    query_type: Option<String>,
    mutation_type: Option<String>,
    subscription_type: Option<String>,
    types: IndexMap<String, TypeDef>,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaBuilder {
    /// Creates a new schema builder with the built-in scalars.
    pub fn new() -> Self {
        let mut types = IndexMap::new();
        for name in BUILTIN_SCALARS {
            types.insert(
                name.to_string(),
                TypeDef::Scalar(ScalarDef {
                    name: name.to_string(),
                    description: None,
                }),
            );
        }
        Self {
            query_type: None,
            mutation_type: None,
            subscription_type: None,
            types,
        }
    }

    /// Sets the query type.
    pub fn query_type(mut self, name: impl Into<String>) -> Self {
        self.query_type = Some(name.into());
        self
    }

    /// Sets the mutation type.
    pub fn mutation_type(mut self, name: impl Into<String>) -> Self {
        self.mutation_type = Some(name.into());
        self
    }

    /// Sets the subscription type.
    pub fn subscription_type(mut self, name: impl Into<String>) -> Self {
        self.subscription_type = Some(name.into());
        self
    }

    /// Adds a type, rejecting duplicate names.
    pub fn try_add_type(mut self, type_def: TypeDef) -> Result<Self, SchemaError> {
        let name = type_def.name().to_string();
        if self.types.contains_key(&name) {
            return Err(SchemaError::DuplicateType(name));
        }
        self.types.insert(name, type_def);
        Ok(self)
    }

    /// Checks the schema and builds it.
    pub fn build(self) -> Result<Schema, SchemaError> {
        let query_type = match self.query_type {
            Some(name) => name,
            None if self.types.contains_key("Query") => "Query".to_string(),
            None => return Err(SchemaError::MissingQueryType),
        };

        let schema = Schema {
            query_type,
            mutation_type: self.mutation_type,
            subscription_type: self.subscription_type,
            types: self.types,
        };

        check_roots(&schema)?;
        for ty in schema.types.values() {
            check_type(&schema, ty)?;
        }

        Ok(schema)
    }
}

fn check_roots(schema: &Schema) -> Result<(), SchemaError> {
    let roots = [
        (OperationType::Query, Some(&schema.query_type)),
        (OperationType::Mutation, schema.mutation_type.as_ref()),
        (OperationType::Subscription, schema.subscription_type.as_ref()),
    ];
    for (operation, name) in roots {
        let Some(name) = name else { continue };
        if schema.object(name).is_none() {
            return Err(SchemaError::InvalidRootType {
                operation: operation.to_string(),
                name: name.clone(),
            });
        }
    }
    Ok(())
}

fn check_type(schema: &Schema, ty: &TypeDef) -> Result<(), SchemaError> {
    match ty {
        TypeDef::Scalar(_) => Ok(()),
        TypeDef::Enum(e) if e.values.is_empty() => Err(SchemaError::EmptyType(e.name.clone())),
        TypeDef::Enum(_) => Ok(()),
        TypeDef::Object(object) => {
            if object.fields.is_empty() {
                return Err(SchemaError::EmptyType(object.name.clone()));
            }
            for field in object.fields.values() {
                let position = format!("field \"{}.{}\"", object.name, field.name);
                check_type_ref(schema, &field.ty, &position, false)?;
                for arg in field.arguments.values() {
                    let position = format!(
                        "argument \"{}\" of \"{}.{}\"",
                        arg.name, object.name, field.name
                    );
                    check_type_ref(schema, &arg.ty, &position, true)?;
                }
            }
            Ok(())
        }
        TypeDef::InputObject(input) => {
            if input.fields.is_empty() {
                return Err(SchemaError::EmptyType(input.name.clone()));
            }
            for field in input.fields.values() {
                let position = format!("input field \"{}.{}\"", input.name, field.name);
                check_type_ref(schema, &field.ty, &position, true)?;
            }
            Ok(())
        }
    }
}

fn check_type_ref(
    schema: &Schema,
    ty: &TypeRef,
    position: &str,
    input: bool,
) -> Result<(), SchemaError> {
    let name = ty.named_type();
    let Some(def) = schema.get_type(name) else {
        return Err(SchemaError::UnknownType {
            name: name.to_string(),
            referenced_by: position.to_string(),
        });
    };
    if input && !def.is_input() {
        return Err(SchemaError::NotInputType {
            position: position.to_string(),
            type_name: ty.to_string(),
        });
    }
    if !input && !def.is_output() {
        return Err(SchemaError::NotOutputType {
            position: position.to_string(),
            type_name: ty.to_string(),
        });
    }
    Ok(())
}

fn print_type(ty: &TypeDef) -> String {
    let mut out = String::new();
    print_description(&mut out, ty.description(), "");

    match ty {
        TypeDef::Scalar(s) => {
            let _ = write!(out, "scalar {}", s.name);
        }
        TypeDef::Object(object) => {
            let _ = writeln!(out, "type {} {{", object.name);
            for field in object.fields.values() {
                print_description(&mut out, field.description.as_deref(), "  ");
                let _ = write!(out, "  {}", field.name);
                if !field.arguments.is_empty() {
                    let args: Vec<_> = field.arguments.values().map(print_input_value).collect();
                    let _ = write!(out, "({})", args.join(", "));
                }
                let _ = writeln!(out, ": {}", field.ty);
            }
            out.push('}');
        }
        TypeDef::Enum(e) => {
            let _ = writeln!(out, "enum {} {{", e.name);
            for value in &e.values {
                print_description(&mut out, value.description.as_deref(), "  ");
                let _ = writeln!(out, "  {}", value.name);
            }
            out.push('}');
        }
        TypeDef::InputObject(input) => {
            let _ = writeln!(out, "input {} {{", input.name);
            for field in input.fields.values() {
                print_description(&mut out, field.description.as_deref(), "  ");
                let _ = writeln!(out, "  {}", print_input_value(field));
            }
            out.push('}');
        }
    }

    out
}

fn print_input_value(value: &InputValueDef) -> String {
    match &value.default_value {
        Some(default) => format!("{}: {} = {}", value.name, value.ty, print_value(default)),
        None => format!("{}: {}", value.name, value.ty),
    }
}

fn print_description(out: &mut String, description: Option<&str>, indent: &str) {
    let Some(description) = description else {
        return;
    };
    if description.contains('\n') {
        let _ = writeln!(out, "{indent}\"\"\"");
        for line in description.lines() {
            let line = line.replace("\"\"\"", "\\\"\"\"");
            if line.is_empty() {
                out.push('\n');
            } else {
                let _ = writeln!(out, "{indent}{line}");
            }
        }
        let _ = writeln!(out, "{indent}\"\"\"");
    } else {
        let _ = writeln!(out, "{indent}{}", quote(description));
    }
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Prints a value literal as GraphQL source.
pub fn print_value(value: &ast::Value) -> String {
    match value {
        ast::Value::Variable(name) => format!("${}", name.value),
        ast::Value::Int(v, _) => v.to_string(),
        ast::Value::Float(v, _) => v.to_string(),
        ast::Value::String(v, _) => quote(v),
        ast::Value::Boolean(v, _) => v.to_string(),
        ast::Value::Null(_) => "null".to_string(),
        ast::Value::Enum(name) => name.value.clone(),
        ast::Value::List(items, _) => {
            let items: Vec<_> = items.iter().map(print_value).collect();
            format!("[{}]", items.join(", "))
        }
        ast::Value::Object(fields, _) => {
            let fields: Vec<_> = fields
                .iter()
                .map(|(name, value)| format!("{}: {}", name.value, print_value(value)))
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
    }
}
