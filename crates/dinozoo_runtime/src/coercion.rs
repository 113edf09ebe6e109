//! Input coercion: variables from JSON, arguments from literals.

use crate::schema::{InputValueDef, Schema, TypeDef, TypeRef};
use dinozoo_syntax::ast;
use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

/// Coerces a JSON value (a request variable) to the given input type.
pub fn coerce_input_value(schema: &Schema, value: &Value, ty: &TypeRef) -> Result<Value, String> {
    match ty {
        TypeRef::NonNull(inner) => {
            if value.is_null() {
                return Err(format!("Expected non-nullable type \"{ty}\" not to be null."));
            }
            coerce_input_value(schema, value, inner)
        }
        _ if value.is_null() => Ok(Value::Null),
        TypeRef::List(inner) => match value {
            Value::Array(items) => items
                .iter()
                .map(|item| coerce_input_value(schema, item, inner))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            single => Ok(Value::Array(vec![coerce_input_value(schema, single, inner)?])),
        },
        TypeRef::Named(name) => match schema.get_type(name) {
            Some(TypeDef::Scalar(_)) => coerce_scalar_json(name, value),
            Some(TypeDef::Enum(e)) => match value {
                Value::String(s) if e.has_value(s) => Ok(value.clone()),
                _ => Err(format!("Value {value} does not exist in \"{name}\" enum.")),
            },
            Some(TypeDef::InputObject(input)) => {
                let Value::Object(fields) = value else {
                    return Err(format!("Expected type \"{name}\" to be an object."));
                };
                coerce_input_object(schema, name, &input.fields, |field| {
                    fields
                        .get(field)
                        .map(|v| coerce_input_value(schema, v, &input.fields[field].ty))
                })
                .and_then(|coerced| {
                    match fields.keys().find(|k| !input.fields.contains_key(k.as_str())) {
                        Some(unknown) => Err(format!(
                            "Field \"{unknown}\" is not defined by type \"{name}\"."
                        )),
                        None => Ok(coerced),
                    }
                })
            }
            _ => Err(format!("\"{name}\" is not an input type.")),
        },
    }
}

fn coerce_scalar_json(name: &str, value: &Value) -> Result<Value, String> {
    let invalid = || format!("{name} cannot represent value: {value}");
    match name {
        "Int" => value
            .as_i64()
            .or_else(|| {
                value
                    .as_f64()
                    .filter(|f| f.fract() == 0.0)
                    .map(|f| f as i64)
            })
            .filter(|i| i32::try_from(*i).is_ok())
            .map(Value::from)
            .ok_or_else(invalid),
        "Float" => match value {
            Value::Number(_) => Ok(value.clone()),
            _ => Err(invalid()),
        },
        "String" => match value {
            Value::String(_) => Ok(value.clone()),
            _ => Err(invalid()),
        },
        "Boolean" => match value {
            Value::Bool(_) => Ok(value.clone()),
            _ => Err(invalid()),
        },
        "ID" => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Value::String(n.to_string())),
            _ => Err(invalid()),
        },
        // Custom scalars pass through unchanged
        _ => Ok(value.clone()),
    }
}

/// Coerces a literal written in the document to the given input type.
///
/// Variables are looked up in the already-coerced `variables`; a variable
/// that was not provided reads as null.
pub fn value_from_ast(
    schema: &Schema,
    value: &ast::Value,
    ty: &TypeRef,
    variables: &Map<String, Value>,
) -> Result<Value, String> {
    if let ast::Value::Variable(name) = value {
        let value = variables.get(&name.value).cloned().unwrap_or(Value::Null);
        if ty.is_non_null() && value.is_null() {
            return Err(format!(
                "Variable \"${}\" of non-null type \"{ty}\" must not be null.",
                name.value
            ));
        }
        return Ok(value);
    }

    match ty {
        TypeRef::NonNull(inner) => {
            if matches!(value, ast::Value::Null(_)) {
                return Err(format!("Expected value of type \"{ty}\", found null."));
            }
            value_from_ast(schema, value, inner, variables)
        }
        _ if matches!(value, ast::Value::Null(_)) => Ok(Value::Null),
        TypeRef::List(inner) => match value {
            ast::Value::List(items, _) => items
                .iter()
                .map(|item| value_from_ast(schema, item, inner, variables))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            single => Ok(Value::Array(vec![value_from_ast(
                schema, single, inner, variables,
            )?])),
        },
        TypeRef::Named(name) => match schema.get_type(name) {
            Some(TypeDef::Scalar(_)) => coerce_scalar_literal(name, value),
            Some(TypeDef::Enum(e)) => match value {
                ast::Value::Enum(v) if e.has_value(&v.value) => Ok(Value::String(v.value.clone())),
                _ => Err(format!(
                    "Value {} does not exist in \"{name}\" enum.",
                    crate::schema::print_value(value)
                )),
            },
            Some(TypeDef::InputObject(input)) => {
                let ast::Value::Object(fields, _) = value else {
                    return Err(format!(
                        "Expected value of type \"{name}\", found {}.",
                        crate::schema::print_value(value)
                    ));
                };
                if let Some((unknown, _)) = fields
                    .iter()
                    .find(|(field, _)| !input.fields.contains_key(&field.value))
                {
                    return Err(format!(
                        "Field \"{}\" is not defined by type \"{name}\".",
                        unknown.value
                    ));
                }
                coerce_input_object(schema, name, &input.fields, |field| {
                    fields
                        .iter()
                        .find(|(n, _)| n.value == field)
                        .filter(|(_, v)| !is_missing_variable(v, variables))
                        .map(|(_, v)| value_from_ast(schema, v, &input.fields[field].ty, variables))
                })
            }
            _ => Err(format!("\"{name}\" is not an input type.")),
        },
    }
}

fn coerce_scalar_literal(name: &str, value: &ast::Value) -> Result<Value, String> {
    let invalid = || {
        format!(
            "{name} cannot represent value: {}",
            crate::schema::print_value(value)
        )
    };
    match (name, value) {
        ("Int", ast::Value::Int(i, _)) if i32::try_from(*i).is_ok() => Ok(Value::from(*i)),
        ("Float", ast::Value::Int(i, _)) => Ok(Value::from(*i)),
        ("Float", ast::Value::Float(f, _)) => {
            Number::from_f64(*f).map(Value::Number).ok_or_else(invalid)
        }
        ("String", ast::Value::String(s, _)) | ("ID", ast::Value::String(s, _)) => {
            Ok(Value::String(s.clone()))
        }
        ("ID", ast::Value::Int(i, _)) => Ok(Value::String(i.to_string())),
        ("Boolean", ast::Value::Boolean(b, _)) => Ok(Value::Bool(*b)),
        ("Int" | "Float" | "String" | "ID" | "Boolean", _) => Err(invalid()),
        // Custom scalars accept any literal
        _ => Ok(const_value_to_json(value)),
    }
}

/// Coerces the fields of an input object, applying defaults.
///
/// `provided` returns the coerced value of a field, or `None` when the field is absent.
fn coerce_input_object<'a>(
    schema: &Schema,
    name: &str,
    defs: &'a IndexMap<String, InputValueDef>,
    mut provided: impl FnMut(&'a str) -> Option<Result<Value, String>>,
) -> Result<Value, String> {
    let mut object = Map::new();
    for (field, def) in defs {
        match provided(field) {
            Some(value) => {
                object.insert(field.clone(), value?);
            }
            None => {
                if let Some(default) = &def.default_value {
                    object.insert(
                        field.clone(),
                        value_from_ast(schema, default, &def.ty, &Map::new())?,
                    );
                } else if def.ty.is_non_null() {
                    return Err(format!(
                        "Field \"{name}.{field}\" of required type \"{}\" was not provided.",
                        def.ty
                    ));
                }
            }
        }
    }
    Ok(Value::Object(object))
}

/// Serializes a resolved value as the given leaf type for the response.
pub fn serialize_output(type_def: &TypeDef, value: Value) -> Result<Value, String> {
    match type_def {
        TypeDef::Enum(e) => match &value {
            Value::String(s) if e.has_value(s) => Ok(value),
            _ => Err(format!("Enum \"{}\" cannot represent value: {value}", e.name)),
        },
        TypeDef::Scalar(scalar) => match (scalar.name.as_str(), &value) {
            ("Int", Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .filter(|i| i32::try_from(*i).is_ok())
                .map(Value::from)
                .ok_or_else(|| format!("Int cannot represent non 32-bit signed integer value: {value}")),
            ("Int", Value::Bool(b)) => Ok(Value::from(i32::from(*b))),
            ("Float", Value::Number(_)) => Ok(value),
            ("Float", Value::Bool(b)) => Ok(Value::from(if *b { 1.0 } else { 0.0 })),
            ("String", Value::String(_)) | ("Boolean", Value::Bool(_)) => Ok(value),
            ("String", Value::Number(n)) => Ok(Value::String(n.to_string())),
            ("String", Value::Bool(b)) => Ok(Value::String(b.to_string())),
            ("Boolean", Value::Number(n)) => Ok(Value::Bool(n.as_f64().is_some_and(|f| f != 0.0))),
            ("ID", Value::String(_)) => Ok(value),
            ("ID", Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(Value::String(n.to_string())),
            ("Int" | "Float" | "String" | "Boolean" | "ID", _) => {
                Err(format!("{} cannot represent value: {value}", scalar.name))
            }
            _ => Ok(value),
        },
        TypeDef::Object(_) | TypeDef::InputObject(_) => {
            Err(format!("\"{}\" is not a leaf type.", type_def.name()))
        }
    }
}

/// True if the literal is a variable the request did not provide.
pub fn is_missing_variable(value: &ast::Value, variables: &Map<String, Value>) -> bool {
    matches!(value, ast::Value::Variable(name) if !variables.contains_key(&name.value))
}

/// Converts a constant literal to JSON without type information.
pub fn const_value_to_json(value: &ast::Value) -> Value {
    match value {
        ast::Value::Variable(_) | ast::Value::Null(_) => Value::Null,
        ast::Value::Int(i, _) => Value::from(*i),
        ast::Value::Float(f, _) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        ast::Value::String(s, _) => Value::String(s.clone()),
        ast::Value::Boolean(b, _) => Value::Bool(*b),
        ast::Value::Enum(name) => Value::String(name.value.clone()),
        ast::Value::List(items, _) => Value::Array(items.iter().map(const_value_to_json).collect()),
        ast::Value::Object(fields, _) => Value::Object(
            fields
                .iter()
                .map(|(name, value)| (name.value.clone(), const_value_to_json(value)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::from_sdl(
            r"
            enum Diet { HERBIVORE CARNIVORE }
            input NewDinosaur { name: String!, diet: Diet = HERBIVORE, tags: [String!] }
            type Query { ok(input: NewDinosaur): Boolean }
            ",
        )
        .unwrap()
    }

    fn literal(source: &str) -> ast::Value {
        let doc = dinozoo_syntax::parse(&format!("{{ f(v: {source}) }}")).document;
        let op = doc.operations().next().unwrap();
        match &op.selection_set.selections[0] {
            ast::Selection::Field(field) => field.arguments[0].value.clone(),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_coerce_scalars_from_json() {
        let schema = schema();
        let id = TypeRef::named("ID");
        assert_eq!(coerce_input_value(&schema, &json!("abc"), &id).unwrap(), json!("abc"));
        assert_eq!(coerce_input_value(&schema, &json!(7), &id).unwrap(), json!("7"));
        assert!(coerce_input_value(&schema, &json!(true), &id).is_err());

        let int = TypeRef::named("Int");
        assert_eq!(coerce_input_value(&schema, &json!(4.0), &int).unwrap(), json!(4));
        assert!(coerce_input_value(&schema, &json!(4.5), &int).is_err());
        assert!(coerce_input_value(&schema, &json!(3_000_000_000_i64), &int).is_err());

        let name = TypeRef::non_null(TypeRef::named("String"));
        assert!(coerce_input_value(&schema, &Value::Null, &name).is_err());
        assert!(coerce_input_value(&schema, &json!(1), &name).is_err());
    }

    #[test]
    fn test_coerce_list_and_object_from_json() {
        let schema = schema();
        let ty = TypeRef::named("NewDinosaur");

        let value = coerce_input_value(&schema, &json!({"name": "Rex", "tags": "big"}), &ty).unwrap();
        assert_eq!(value, json!({"name": "Rex", "diet": "HERBIVORE", "tags": ["big"]}));

        assert!(coerce_input_value(&schema, &json!({"diet": "CARNIVORE"}), &ty).is_err());
        assert!(coerce_input_value(&schema, &json!({"name": "Rex", "diet": "OMNIVORE"}), &ty).is_err());
        assert!(coerce_input_value(&schema, &json!({"name": "Rex", "size": 3}), &ty).is_err());
    }

    #[test]
    fn test_value_from_ast() {
        let schema = schema();
        let vars = Map::new();

        let ty = TypeRef::non_null(TypeRef::named("ID"));
        assert_eq!(value_from_ast(&schema, &literal("\"x1\""), &ty, &vars).unwrap(), json!("x1"));
        assert_eq!(value_from_ast(&schema, &literal("12"), &ty, &vars).unwrap(), json!("12"));
        assert!(value_from_ast(&schema, &literal("null"), &ty, &vars).is_err());
        assert!(value_from_ast(&schema, &literal("1.5"), &ty, &vars).is_err());

        let ty = TypeRef::named("NewDinosaur");
        let value = value_from_ast(&schema, &literal("{name: \"Rex\", diet: CARNIVORE}"), &ty, &vars).unwrap();
        assert_eq!(value, json!({"name": "Rex", "diet": "CARNIVORE"}));
        assert!(value_from_ast(&schema, &literal("{name: \"Rex\", diet: \"CARNIVORE\"}"), &ty, &vars).is_err());
    }

    #[test]
    fn test_value_from_ast_variables() {
        let schema = schema();
        let mut vars = Map::new();
        vars.insert("name".to_string(), json!("Rex"));

        let ty = TypeRef::non_null(TypeRef::named("String"));
        assert_eq!(value_from_ast(&schema, &literal("$name"), &ty, &vars).unwrap(), json!("Rex"));
        assert!(value_from_ast(&schema, &literal("$other"), &ty, &vars).is_err());
        assert!(is_missing_variable(&literal("$other"), &vars));
    }

    #[test]
    fn test_serialize_output() {
        let schema = schema();
        let string = schema.get_type("String").unwrap();
        let id = schema.get_type("ID").unwrap();
        let int = schema.get_type("Int").unwrap();
        let diet = schema.get_type("Diet").unwrap();

        assert_eq!(serialize_output(string, json!("Rex")).unwrap(), json!("Rex"));
        assert_eq!(serialize_output(string, json!(3)).unwrap(), json!("3"));
        assert!(serialize_output(string, json!({"a": 1})).is_err());
        assert_eq!(serialize_output(id, json!(650)).unwrap(), json!("650"));
        assert_eq!(serialize_output(int, json!(2.0)).unwrap(), json!(2));
        assert!(serialize_output(int, json!(1.5)).is_err());
        assert_eq!(serialize_output(diet, json!("HERBIVORE")).unwrap(), json!("HERBIVORE"));
        assert!(serialize_output(diet, json!("OMNIVORE")).is_err());
    }

    #[test]
    fn test_const_value_to_json() {
        assert_eq!(
            const_value_to_json(&literal("[1, 2.5, \"x\", true, null, RED, {a: 1}]")),
            json!([1, 2.5, "x", true, null, "RED", {"a": 1}])
        );
    }
}
