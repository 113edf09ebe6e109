//! Document validation against a schema.
//!
//! Runs before execution; a document with any validation error is not executed.

use crate::coercion::value_from_ast;
use crate::schema::{FieldDef, ObjectDef, Schema, TypeDef, TypeRef};
use dinozoo_core::Span;
use dinozoo_syntax::ast::{
    self, Definition, Directive, Document, FieldSelection, FragmentDefinition, OperationDefinition,
    Selection, SelectionSet, VariableDefinition,
};
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Map;
use thiserror::Error;

/// A validation failure, located at one or more spans of the document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub spans: Vec<Span>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            spans: vec![span],
        }
    }

    /// An error that refers to the request as a whole.
    pub fn unlocated(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            spans: Vec::new(),
        }
    }
}

/// Validates `document` and selects the operation to execute.
pub fn validate<'d>(
    schema: &Schema,
    document: &'d Document,
    operation_name: Option<&str>,
) -> Result<&'d OperationDefinition, Vec<ValidationError>> {
    let mut validator = Validator::new(schema, document);
    validator.check_document(document);
    if !validator.errors.is_empty() {
        return Err(validator.errors);
    }
    select_operation(document, operation_name).map_err(|error| vec![error])
}

/// Picks the operation named by the request, or the only operation.
pub fn select_operation<'d>(
    document: &'d Document,
    operation_name: Option<&str>,
) -> Result<&'d OperationDefinition, ValidationError> {
    if let Some(name) = operation_name {
        return document
            .operations()
            .find(|op| op.name.as_ref().is_some_and(|n| n.value == name))
            .ok_or_else(|| ValidationError::unlocated(format!("Unknown operation named \"{name}\".")));
    }

    let mut operations = document.operations();
    match (operations.next(), operations.next()) {
        (Some(op), None) => Ok(op),
        (None, _) => Err(ValidationError::unlocated("Must provide an operation.")),
        (Some(_), Some(_)) => Err(ValidationError::unlocated(
            "Must provide operation name if query contains multiple operations.",
        )),
    }
}

type Variables<'a> = FxHashMap<&'a str, &'a VariableDefinition>;

const SELECTION_LOCATIONS: [&str; 3] = ["FIELD", "FRAGMENT_SPREAD", "INLINE_FRAGMENT"];

struct Validator<'a> {
    schema: &'a Schema,
    fragments: FxHashMap<&'a str, &'a FragmentDefinition>,
    errors: Vec<ValidationError>,
}

impl<'a> Validator<'a> {
    fn new(schema: &'a Schema, document: &'a Document) -> Self {
        let mut fragments = FxHashMap::default();
        let mut errors = Vec::new();
        for fragment in document.fragments() {
            if fragments.insert(fragment.name.value.as_str(), fragment).is_some() {
                errors.push(ValidationError::new(
                    format!("There can be only one fragment named \"{}\".", fragment.name.value),
                    fragment.name.span,
                ));
            }
        }
        Self {
            schema,
            fragments,
            errors,
        }
    }

    fn error(&mut self, message: impl Into<String>, span: Span) {
        self.errors.push(ValidationError::new(message, span));
    }

    fn check_document(&mut self, document: &'a Document) {
        let operation_count = document.operations().count();
        let mut operation_names = FxHashSet::default();

        for definition in &document.definitions {
            match definition {
                Definition::Schema(def) => {
                    self.error("The schema definition is not executable.", def.span);
                }
                Definition::Type(def) => self.error(
                    format!("The \"{}\" definition is not executable.", def.name.value),
                    def.span,
                ),
                Definition::Operation(op) => {
                    match &op.name {
                        Some(name) if !operation_names.insert(name.value.as_str()) => self.error(
                            format!("There can be only one operation named \"{}\".", name.value),
                            name.span,
                        ),
                        None if operation_count > 1 => self.error(
                            "This anonymous operation must be the only defined operation.",
                            op.span,
                        ),
                        _ => {}
                    }
                    self.check_operation(op);
                }
                Definition::Fragment(fragment) => self.check_fragment_definition(fragment),
            }
        }

        self.check_fragment_cycles(document);
        self.check_unused_fragments(document);
    }

    fn check_operation(&mut self, op: &'a OperationDefinition) {
        let variables = self.check_variable_definitions(op);
        let location = match op.operation {
            ast::OperationType::Query => "QUERY",
            ast::OperationType::Mutation => "MUTATION",
            ast::OperationType::Subscription => "SUBSCRIPTION",
        };
        self.check_directives(&op.directives, location, Some(&variables));

        let schema = self.schema;
        let Some(root) = schema.root_type(op.operation) else {
            self.error(
                format!(
                    "Schema is not configured to execute {} operation.",
                    op.operation
                ),
                op.span,
            );
            return;
        };
        self.check_selection_set(root, &op.selection_set, Some(&variables));
        self.check_variable_usage(op, &variables);
    }

    fn check_variable_definitions(&mut self, op: &'a OperationDefinition) -> Variables<'a> {
        let schema = self.schema;
        let mut variables = Variables::default();
        for var in &op.variables {
            if variables.insert(var.name.value.as_str(), var).is_some() {
                self.error(
                    format!("There can be only one variable named \"${}\".", var.name.value),
                    var.name.span,
                );
            }
            self.check_directives(&var.directives, "VARIABLE_DEFINITION", None);

            let type_name = var.ty.named_type();
            let ty = TypeRef::from_ast(&var.ty);
            match schema.get_type(&type_name.value) {
                None => self.error(
                    format!("Unknown type \"{}\".", type_name.value),
                    type_name.span,
                ),
                Some(def) if !def.is_input() => self.error(
                    format!(
                        "Variable \"${}\" cannot be non-input type \"{ty}\".",
                        var.name.value
                    ),
                    var.ty.span(),
                ),
                Some(_) => {
                    if let Some(default) = &var.default_value {
                        if let Err(message) = value_from_ast(schema, default, &ty, &Map::new()) {
                            self.error(message, default.span());
                        }
                    }
                }
            }
        }
        variables
    }

    fn check_variable_usage(&mut self, op: &'a OperationDefinition, variables: &Variables<'a>) {
        let mut used = Vec::new();
        let mut visited = FxHashSet::default();
        for directive in &op.directives {
            collect_argument_variables(&directive.arguments, &mut used);
        }
        self.collect_variables(&op.selection_set, &mut used, &mut visited);

        let suffix = op
            .name
            .as_ref()
            .map(|name| format!(" by operation \"{}\"", name.value))
            .unwrap_or_default();
        let mut reported = FxHashSet::default();
        for name in &used {
            if !variables.contains_key(name.value.as_str()) && reported.insert(name.value.as_str()) {
                self.errors.push(ValidationError {
                    message: format!("Variable \"${}\" is not defined{suffix}.", name.value),
                    spans: vec![name.span, op.span],
                });
            }
        }

        let suffix = op
            .name
            .as_ref()
            .map(|name| format!(" in operation \"{}\"", name.value))
            .unwrap_or_default();
        for var in &op.variables {
            if !used.iter().any(|name| name.value == var.name.value) {
                self.error(
                    format!("Variable \"${}\" is never used{suffix}.", var.name.value),
                    var.span,
                );
            }
        }
    }

    fn collect_variables(
        &self,
        set: &'a SelectionSet,
        used: &mut Vec<&'a ast::Name>,
        visited: &mut FxHashSet<&'a str>,
    ) {
        for selection in &set.selections {
            match selection {
                Selection::Field(field) => {
                    collect_argument_variables(&field.arguments, used);
                    collect_directive_variables(&field.directives, used);
                    if let Some(set) = &field.selection_set {
                        self.collect_variables(set, used, visited);
                    }
                }
                Selection::FragmentSpread(spread) => {
                    collect_directive_variables(&spread.directives, used);
                    if visited.insert(spread.name.value.as_str()) {
                        if let Some(fragment) = self.fragments.get(spread.name.value.as_str()).copied() {
                            self.collect_variables(&fragment.selection_set, used, visited);
                        }
                    }
                }
                Selection::InlineFragment(inline) => {
                    collect_directive_variables(&inline.directives, used);
                    self.collect_variables(&inline.selection_set, used, visited);
                }
            }
        }
    }

    fn check_fragment_definition(&mut self, fragment: &'a FragmentDefinition) {
        self.check_directives(&fragment.directives, "FRAGMENT_DEFINITION", None);
        if let Some(object) = self.type_condition(&fragment.type_condition) {
            self.check_selection_set(object, &fragment.selection_set, None);
        }
    }

    /// Resolves a fragment type condition; only object types can be conditioned on.
    fn type_condition(&mut self, name: &ast::Name) -> Option<&'a ObjectDef> {
        let schema = self.schema;
        match schema.get_type(&name.value) {
            Some(TypeDef::Object(object)) => Some(object),
            Some(_) => {
                self.error(
                    format!(
                        "Fragment cannot condition on non composite type \"{}\".",
                        name.value
                    ),
                    name.span,
                );
                None
            }
            None => {
                self.error(format!("Unknown type \"{}\".", name.value), name.span);
                None
            }
        }
    }

    fn check_fragment_cycles(&mut self, document: &'a Document) {
        for fragment in document.fragments() {
            let mut stack = fragment_spreads(&fragment.selection_set);
            let mut seen = FxHashSet::default();
            while let Some(name) = stack.pop() {
                if name == fragment.name.value {
                    self.error(
                        format!(
                            "Cannot spread fragment \"{}\" within itself.",
                            fragment.name.value
                        ),
                        fragment.name.span,
                    );
                    break;
                }
                if seen.insert(name) {
                    if let Some(next) = self.fragments.get(name).copied() {
                        stack.extend(fragment_spreads(&next.selection_set));
                    }
                }
            }
        }
    }

    fn check_unused_fragments(&mut self, document: &'a Document) {
        let mut used = FxHashSet::default();
        let mut stack: Vec<&str> = document
            .operations()
            .flat_map(|op| fragment_spreads(&op.selection_set))
            .collect();
        while let Some(name) = stack.pop() {
            if used.insert(name) {
                if let Some(fragment) = self.fragments.get(name).copied() {
                    stack.extend(fragment_spreads(&fragment.selection_set));
                }
            }
        }

        for fragment in document.fragments() {
            if !used.contains(fragment.name.value.as_str()) {
                self.error(
                    format!("Fragment \"{}\" is never used.", fragment.name.value),
                    fragment.span,
                );
            }
        }
    }

    fn check_selection_set(
        &mut self,
        parent: &'a ObjectDef,
        set: &'a SelectionSet,
        variables: Option<&Variables<'a>>,
    ) {
        let mut response_keys: FxHashMap<&'a str, &'a FieldSelection> = FxHashMap::default();

        for selection in &set.selections {
            match selection {
                Selection::Field(field) => {
                    self.check_directives(&field.directives, "FIELD", variables);
                    match response_keys.get(field.response_key()).copied() {
                        Some(previous) => self.check_field_conflict(previous, field),
                        None => {
                            response_keys.insert(field.response_key(), field);
                        }
                    }
                    self.check_field(parent, field, variables);
                }
                Selection::FragmentSpread(spread) => {
                    self.check_directives(&spread.directives, "FRAGMENT_SPREAD", variables);
                    match self.fragments.get(spread.name.value.as_str()).copied() {
                        None => self.error(
                            format!("Unknown fragment \"{}\".", spread.name.value),
                            spread.name.span,
                        ),
                        Some(fragment) if fragment.type_condition.value != parent.name => {
                            self.error(
                                format!(
                                    "Fragment \"{}\" cannot be spread here as objects of type \"{}\" can never be of type \"{}\".",
                                    spread.name.value, parent.name, fragment.type_condition.value
                                ),
                                spread.span,
                            );
                        }
                        Some(_) => {}
                    }
                }
                Selection::InlineFragment(inline) => {
                    self.check_directives(&inline.directives, "INLINE_FRAGMENT", variables);
                    if let Some(condition) = &inline.type_condition {
                        match self.type_condition(condition) {
                            Some(object) if object.name != parent.name => self.error(
                                format!(
                                    "Fragment cannot be spread here as objects of type \"{}\" can never be of type \"{}\".",
                                    parent.name, object.name
                                ),
                                inline.span,
                            ),
                            Some(_) => {}
                            None => continue,
                        }
                    }
                    self.check_selection_set(parent, &inline.selection_set, variables);
                }
            }
        }
    }

    /// Two fields under one response key must select the same field with the same arguments.
    fn check_field_conflict(&mut self, first: &FieldSelection, second: &FieldSelection) {
        let key = first.response_key();
        let reason = if first.name.value != second.name.value {
            format!(
                "\"{}\" and \"{}\" are different fields",
                first.name.value, second.name.value
            )
        } else if printed_arguments(&first.arguments) != printed_arguments(&second.arguments) {
            "they have differing arguments".to_string()
        } else {
            return;
        };
        self.errors.push(ValidationError {
            message: format!(
                "Fields \"{key}\" conflict because {reason}. Use different aliases on the fields to fetch both if this was intentional."
            ),
            spans: vec![first.span, second.span],
        });
    }

    fn check_field(
        &mut self,
        parent: &'a ObjectDef,
        field: &'a FieldSelection,
        variables: Option<&Variables<'a>>,
    ) {
        let name = &field.name.value;
        if name == "__typename" {
            for arg in &field.arguments {
                self.error(
                    format!(
                        "Unknown argument \"{}\" on field \"{}.__typename\".",
                        arg.name.value, parent.name
                    ),
                    arg.name.span,
                );
            }
            if let Some(set) = &field.selection_set {
                self.error(
                    "Field \"__typename\" must not have a selection since type \"String!\" has no subfields.",
                    set.span,
                );
            }
            return;
        }

        let Some(def) = parent.fields.get(name) else {
            self.error(
                format!("Cannot query field \"{name}\" on type \"{}\".", parent.name),
                field.name.span,
            );
            return;
        };
        self.check_arguments(parent, def, field, variables);

        let schema = self.schema;
        match (schema.get_type(def.ty.named_type()), &field.selection_set) {
            (Some(TypeDef::Object(object)), Some(set)) => {
                self.check_selection_set(object, set, variables);
            }
            (Some(TypeDef::Object(_)), None) => self.error(
                format!(
                    "Field \"{name}\" of type \"{}\" must have a selection of subfields. Did you mean \"{name} {{ ... }}\"?",
                    def.ty
                ),
                field.span,
            ),
            (_, Some(set)) => self.error(
                format!(
                    "Field \"{name}\" must not have a selection since type \"{}\" has no subfields.",
                    def.ty
                ),
                set.span,
            ),
            (_, None) => {}
        }
    }

    fn check_arguments(
        &mut self,
        parent: &ObjectDef,
        def: &FieldDef,
        field: &FieldSelection,
        variables: Option<&Variables<'a>>,
    ) {
        let mut seen = FxHashSet::default();
        for arg in &field.arguments {
            if !seen.insert(arg.name.value.as_str()) {
                self.error(
                    format!("There can be only one argument named \"{}\".", arg.name.value),
                    arg.name.span,
                );
            }
            let Some(arg_def) = def.arguments.get(&arg.name.value) else {
                self.error(
                    format!(
                        "Unknown argument \"{}\" on field \"{}.{}\".",
                        arg.name.value, parent.name, def.name
                    ),
                    arg.name.span,
                );
                continue;
            };
            self.check_value(
                &arg.value,
                &arg_def.ty,
                arg_def.default_value.is_some(),
                variables,
            );
        }

        for (name, arg_def) in &def.arguments {
            if arg_def.is_required() && !field.arguments.iter().any(|arg| arg.name.value == *name) {
                self.error(
                    format!(
                        "Field \"{}.{}\" argument \"{name}\" of type \"{}\" is required, but it was not provided.",
                        parent.name, def.name, arg_def.ty
                    ),
                    field.span,
                );
            }
        }
    }

    /// Checks a literal against its expected type, or a variable against its position.
    ///
    /// Variables nested inside list or object literals are checked when the request is executed.
    fn check_value(
        &mut self,
        value: &ast::Value,
        expected: &TypeRef,
        has_default: bool,
        variables: Option<&Variables<'a>>,
    ) {
        if let ast::Value::Variable(name) = value {
            let Some(def) = variables.and_then(|vars| vars.get(name.value.as_str())) else {
                return;
            };
            let var_ty = TypeRef::from_ast(&def.ty);
            let position = match expected {
                TypeRef::NonNull(inner)
                    if !var_ty.is_non_null() && (has_default || def.default_value.is_some()) =>
                {
                    inner
                }
                _ => expected,
            };
            if !is_subtype(&var_ty, position) {
                self.errors.push(ValidationError {
                    message: format!(
                        "Variable \"${}\" of type \"{var_ty}\" used in position expecting type \"{expected}\".",
                        name.value
                    ),
                    spans: vec![def.span, name.span],
                });
            }
            return;
        }

        if contains_variable(value) {
            return;
        }
        if let Err(message) = value_from_ast(self.schema, value, expected, &Map::new()) {
            self.error(message, value.span());
        }
    }

    fn check_directives(
        &mut self,
        directives: &'a [Directive],
        location: &str,
        variables: Option<&Variables<'a>>,
    ) {
        let condition = TypeRef::non_null(TypeRef::named("Boolean"));
        for directive in directives {
            let name = directive.name.value.as_str();
            if !matches!(name, "skip" | "include") {
                self.error(format!("Unknown directive \"@{name}\"."), directive.span);
                continue;
            }
            if !SELECTION_LOCATIONS.contains(&location) {
                self.error(
                    format!("Directive \"@{name}\" may not be used on {location}."),
                    directive.span,
                );
                continue;
            }

            for arg in &directive.arguments {
                if arg.name.value == "if" {
                    self.check_value(&arg.value, &condition, false, variables);
                } else {
                    self.error(
                        format!(
                            "Unknown argument \"{}\" on directive \"@{name}\".",
                            arg.name.value
                        ),
                        arg.name.span,
                    );
                }
            }
            if !directive.arguments.iter().any(|arg| arg.name.value == "if") {
                self.error(
                    format!(
                        "Directive \"@{name}\" argument \"if\" of type \"Boolean!\" is required, but it was not provided."
                    ),
                    directive.span,
                );
            }
        }
    }
}

/// Names of the fragments spread directly in a selection set.
fn fragment_spreads(set: &SelectionSet) -> Vec<&str> {
    let mut names = Vec::new();
    let mut stack = vec![set];
    while let Some(set) = stack.pop() {
        for selection in &set.selections {
            match selection {
                Selection::Field(field) => stack.extend(field.selection_set.as_ref()),
                Selection::FragmentSpread(spread) => names.push(spread.name.value.as_str()),
                Selection::InlineFragment(inline) => stack.push(&inline.selection_set),
            }
        }
    }
    names
}

fn collect_argument_variables<'a>(arguments: &'a [ast::Argument], used: &mut Vec<&'a ast::Name>) {
    for arg in arguments {
        collect_value_variables(&arg.value, used);
    }
}

fn collect_directive_variables<'a>(directives: &'a [Directive], used: &mut Vec<&'a ast::Name>) {
    for directive in directives {
        collect_argument_variables(&directive.arguments, used);
    }
}

fn collect_value_variables<'a>(value: &'a ast::Value, used: &mut Vec<&'a ast::Name>) {
    match value {
        ast::Value::Variable(name) => used.push(name),
        ast::Value::List(items, _) => {
            for item in items {
                collect_value_variables(item, used);
            }
        }
        ast::Value::Object(fields, _) => {
            for (_, value) in fields {
                collect_value_variables(value, used);
            }
        }
        _ => {}
    }
}

fn contains_variable(value: &ast::Value) -> bool {
    match value {
        ast::Value::Variable(_) => true,
        ast::Value::List(items, _) => items.iter().any(contains_variable),
        ast::Value::Object(fields, _) => fields.iter().any(|(_, value)| contains_variable(value)),
        _ => false,
    }
}

fn printed_arguments(arguments: &[ast::Argument]) -> Vec<(&str, String)> {
    let mut printed: Vec<_> = arguments
        .iter()
        .map(|arg| (arg.name.value.as_str(), crate::schema::print_value(&arg.value)))
        .collect();
    printed.sort();
    printed
}

/// True if a variable of type `sub` may be used where `sup` is expected.
fn is_subtype(sub: &TypeRef, sup: &TypeRef) -> bool {
    match (sub, sup) {
        (TypeRef::NonNull(sub), TypeRef::NonNull(sup)) => is_subtype(sub, sup),
        (TypeRef::NonNull(sub), sup) => is_subtype(sub, sup),
        (_, TypeRef::NonNull(_)) => false,
        (TypeRef::List(sub), TypeRef::List(sup)) => is_subtype(sub, sup),
        (TypeRef::Named(sub), TypeRef::Named(sup)) => sub == sup,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SDL: &str = r"
        type Dinosaur {
            id: ID!
            name: String!
            type: String!
        }

        type MutationResponse {
            message: String!
        }

        type Query {
            getDinosaur: [Dinosaur!]!
            getDinosaurById(id: ID!): Dinosaur
        }

        type Mutation {
            addDinosaur(name: String!, type: String!): Dinosaur!
            deleteDinosaur(id: ID!): MutationResponse!
        }
    ";

    fn errors(source: &str) -> Vec<String> {
        errors_for(source, None)
    }

    fn errors_for(source: &str, operation_name: Option<&str>) -> Vec<String> {
        let schema = Schema::from_sdl(SDL).unwrap();
        let parsed = dinozoo_syntax::parse(source);
        assert!(parsed.is_ok(), "{:?}", parsed.diagnostics);
        match validate(&schema, &parsed.document, operation_name) {
            Ok(_) => Vec::new(),
            Err(errors) => errors.into_iter().map(|e| e.message).collect(),
        }
    }

    #[test]
    fn test_valid_documents() {
        assert!(errors("{ getDinosaur { id name type } }").is_empty());
        assert!(errors("query ($id: ID!) { getDinosaurById(id: $id) { __typename name } }").is_empty());
        assert!(errors(
            r#"mutation { addDinosaur(name: "Rex", type: "Carnivore") { ...Fields } }
               fragment Fields on Dinosaur { id name }"#
        )
        .is_empty());
        assert!(errors("{ a: getDinosaur { id } b: getDinosaur { id } }").is_empty());
        assert!(errors("query ($all: Boolean!) { getDinosaur @include(if: $all) { id } }").is_empty());
    }

    #[test]
    fn test_unknown_field_and_argument() {
        assert_eq!(
            errors("{ getDinosaur { id weight } }"),
            vec!["Cannot query field \"weight\" on type \"Dinosaur\"."]
        );
        assert_eq!(
            errors("{ getDinosaurById(id: \"1\", limit: 2) { id } }"),
            vec!["Unknown argument \"limit\" on field \"Query.getDinosaurById\"."]
        );
    }

    #[test]
    fn test_required_argument() {
        assert_eq!(
            errors("{ getDinosaurById { id } }"),
            vec!["Field \"Query.getDinosaurById\" argument \"id\" of type \"ID!\" is required, but it was not provided."]
        );
        assert_eq!(
            errors("{ getDinosaurById(id: 1.5) { id } }"),
            vec!["ID cannot represent value: 1.5"]
        );
    }

    #[test]
    fn test_leaf_and_composite_selections() {
        assert_eq!(
            errors("{ getDinosaur }"),
            vec!["Field \"getDinosaur\" of type \"[Dinosaur!]!\" must have a selection of subfields. Did you mean \"getDinosaur { ... }\"?"]
        );
        assert_eq!(
            errors("{ getDinosaur { name { length } } }"),
            vec!["Field \"name\" must not have a selection since type \"String!\" has no subfields."]
        );
    }

    #[test]
    fn test_operation_selection() {
        let doc = "query A { getDinosaur { id } } query B { getDinosaur { name } }";
        assert!(errors_for(doc, Some("B")).is_empty());
        assert_eq!(
            errors_for(doc, None),
            vec!["Must provide operation name if query contains multiple operations."]
        );
        assert_eq!(
            errors_for(doc, Some("C")),
            vec!["Unknown operation named \"C\"."]
        );
        assert_eq!(
            errors("query A { getDinosaur { id } } query A { getDinosaur { id } }"),
            vec!["There can be only one operation named \"A\"."]
        );
        assert_eq!(
            errors("{ getDinosaur { id } } query B { getDinosaur { id } }"),
            vec!["This anonymous operation must be the only defined operation."]
        );
    }

    #[test]
    fn test_missing_root_type() {
        assert_eq!(
            errors("subscription { events }"),
            vec!["Schema is not configured to execute subscription operation."]
        );
    }

    #[test]
    fn test_variables() {
        assert_eq!(
            errors("{ getDinosaurById(id: $id) { id } }"),
            vec!["Variable \"$id\" is not defined."]
        );
        assert_eq!(
            errors("query Q($id: ID!) { getDinosaur { id } }"),
            vec!["Variable \"$id\" is never used in operation \"Q\"."]
        );
        assert_eq!(
            errors("query ($id: String) { getDinosaurById(id: $id) { id } }"),
            vec!["Variable \"$id\" of type \"String\" used in position expecting type \"ID!\"."]
        );
        assert_eq!(
            errors("query ($d: Dinosaur) { getDinosaurById(id: $d) { id } }"),
            vec![
                "Variable \"$d\" cannot be non-input type \"Dinosaur\".",
                "Variable \"$d\" of type \"Dinosaur\" used in position expecting type \"ID!\"."
            ]
        );
    }

    #[test]
    fn test_fragments() {
        assert_eq!(
            errors("{ getDinosaur { ...Missing } }"),
            vec!["Unknown fragment \"Missing\"."]
        );
        assert_eq!(
            errors("{ getDinosaur { id } } fragment F on Dinosaur { id }"),
            vec!["Fragment \"F\" is never used."]
        );
        assert_eq!(
            errors("{ getDinosaur { ...F } } fragment F on MutationResponse { message }"),
            vec!["Fragment \"F\" cannot be spread here as objects of type \"Dinosaur\" can never be of type \"MutationResponse\"."]
        );
        assert_eq!(
            errors("{ getDinosaur { ...A } } fragment A on Dinosaur { ...B } fragment B on Dinosaur { ...A }"),
            vec![
                "Cannot spread fragment \"A\" within itself.",
                "Cannot spread fragment \"B\" within itself."
            ]
        );
    }

    #[test]
    fn test_directives() {
        assert_eq!(
            errors("{ getDinosaur @cached { id } }"),
            vec!["Unknown directive \"@cached\"."]
        );
        assert_eq!(
            errors("{ getDinosaur @skip { id } }"),
            vec!["Directive \"@skip\" argument \"if\" of type \"Boolean!\" is required, but it was not provided."]
        );
        assert_eq!(
            errors("query @skip(if: true) { getDinosaur { id } }"),
            vec!["Directive \"@skip\" may not be used on QUERY."]
        );
    }

    #[test]
    fn test_field_conflicts() {
        assert_eq!(
            errors("{ getDinosaur { id: name id } }"),
            vec!["Fields \"id\" conflict because \"name\" and \"id\" are different fields. Use different aliases on the fields to fetch both if this was intentional."]
        );
    }

    #[test]
    fn test_type_definitions_are_not_executable() {
        assert_eq!(
            errors("type Extra { a: Int } { getDinosaur { id } }"),
            vec!["The \"Extra\" definition is not executable."]
        );
    }

    #[test]
    fn test_error_spans() {
        let schema = Schema::from_sdl(SDL).unwrap();
        let source = "{ getDinosaur { weight } }";
        let document = dinozoo_syntax::parse(source).document;
        let errors = validate(&schema, &document, None).unwrap_err();
        assert_eq!(errors[0].spans, vec![Span::new(16, 22)]);
    }
}
