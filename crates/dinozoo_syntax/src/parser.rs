//! Recursive descent parser for GraphQL documents.

use crate::ast::*;
use crate::lexer::{block_string_value, unescape_string, Lexer};
use crate::token::{Token, TokenKind};
use dinozoo_core::{diagnostics::codes, DiagnosticBag, Span};

/// Keywords that can start a top-level definition.
const DEFINITION_KEYWORDS: &[&str] = &[
    "query",
    "mutation",
    "subscription",
    "fragment",
    "schema",
    "scalar",
    "type",
    "enum",
    "input",
    "interface",
    "union",
    "extend",
    "directive",
];

/// Deepest nesting of selection sets, list/object values and list types.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Parser for GraphQL documents.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    diagnostics: DiagnosticBag,
    depth: usize,
}

/// Result of parsing.
pub struct ParseResult {
    pub document: Document,
    pub diagnostics: DiagnosticBag,
}

impl ParseResult {
    /// Returns true if the document parsed without errors.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        !self.diagnostics.has_errors()
    }
}

/// Parses a source string into a document.
pub fn parse(source: &str) -> ParseResult {
    let mut parser = Parser::new(source);
    let document = parser.parse_document();
    ParseResult {
        document,
        diagnostics: parser.diagnostics,
    }
}

impl<'a> Parser<'a> {
    /// Creates a new parser.
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            diagnostics: DiagnosticBag::new(),
            depth: 0,
        }
    }

    /// Returns the current token kind.
    #[inline]
    fn at(&self) -> TokenKind {
        self.current.kind
    }

    /// Returns true if at the given kind.
    #[inline]
    fn at_kind(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Returns true if at a name with the given text.
    fn at_keyword(&self, keyword: &str) -> bool {
        self.at_kind(TokenKind::Name) && self.current_text() == keyword
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        if !self.current.is_eof() {
            self.current = self.lexer.next_token();
        }
    }

    /// Skips the current token if no progress was made since `before`.
    fn ensure_progress(&mut self, before: u32) {
        if self.current.span.start == before && !self.current.is_eof() {
            self.advance();
        }
    }

    /// Expects a specific token kind.
    fn expect(&mut self, kind: TokenKind) -> bool {
        if self.at_kind(kind) {
            self.advance();
            true
        } else {
            self.error_expected(&format!("\"{kind}\""));
            false
        }
    }

    /// Expects a contextual keyword.
    fn expect_keyword(&mut self, keyword: &str) -> bool {
        if self.at_keyword(keyword) {
            self.advance();
            true
        } else {
            self.error_expected(&format!("\"{keyword}\""));
            false
        }
    }

    /// Gets the text of the current token.
    fn current_text(&self) -> &'a str {
        self.lexer.span_text(self.current.span)
    }

    /// Describes the current token for error messages.
    fn describe_current(&self) -> String {
        match self.at() {
            TokenKind::Eof => "<EOF>".to_string(),
            TokenKind::Name => format!("Name \"{}\"", self.current_text()),
            TokenKind::IntLiteral | TokenKind::FloatLiteral => {
                format!("number {}", self.current_text())
            }
            TokenKind::StringLiteral | TokenKind::BlockStringLiteral => {
                format!("string {}", self.current_text())
            }
            TokenKind::Error => format!("invalid token \"{}\"", self.current_text()),
            kind => format!("\"{kind}\""),
        }
    }

    /// Reports an error at the current token.
    fn error(&mut self, code: &'static str, message: String) {
        self.error_at(code, message, self.current.span);
    }

    /// Reports an error, skipping repeats at the same position.
    fn error_at(&mut self, code: &'static str, message: String, span: Span) {
        let repeated = self
            .diagnostics
            .iter()
            .last()
            .is_some_and(|last| last.span.start == span.start);
        if !repeated {
            self.diagnostics.error(code, message, span);
        }
    }

    /// Reports an expected token error.
    fn error_expected(&mut self, expected: &str) {
        let code = if self.current.is_eof() {
            codes::UNEXPECTED_EOF
        } else {
            codes::UNEXPECTED_TOKEN
        };
        let message = format!("expected {expected}, found {}", self.describe_current());
        self.error(code, message);
    }

    /// Enters one nesting level. Past [`MAX_NESTING_DEPTH`] the rest of the
    /// input is skipped, so every caller unwinds at EOF.
    fn enter_nested(&mut self) -> bool {
        if self.depth < MAX_NESTING_DEPTH {
            self.depth += 1;
            return true;
        }
        let message = format!("nesting exceeds the maximum depth of {MAX_NESTING_DEPTH}");
        self.error(codes::NESTING_TOO_DEEP, message);
        while !self.current.is_eof() {
            self.advance();
        }
        false
    }

    fn leave_nested(&mut self) {
        self.depth -= 1;
    }

    fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.current.span.start.max(start))
    }

    /// Parses a document.
    pub fn parse_document(&mut self) -> Document {
        let start = self.current.span.start;
        let mut definitions = Vec::new();

        if self.current.is_eof() {
            self.error_expected("a definition");
        }

        while !self.current.is_eof() {
            let before = self.current.span.start;
            if let Some(def) = self.parse_definition() {
                definitions.push(def);
            }
            self.ensure_progress(before);
        }

        Document {
            definitions,
            span: Span::new(start, self.current.span.end),
        }
    }

    /// Parses a definition.
    fn parse_definition(&mut self) -> Option<Definition> {
        if self.at_kind(TokenKind::LBrace) {
            return Some(Definition::Operation(self.parse_operation()));
        }

        let description = self.try_parse_description();

        if !self.at_kind(TokenKind::Name) {
            self.error_expected("a definition");
            return None;
        }

        match self.current_text() {
            "query" | "mutation" | "subscription" if description.is_none() => {
                Some(Definition::Operation(self.parse_operation()))
            }
            "fragment" if description.is_none() => {
                Some(Definition::Fragment(self.parse_fragment_definition()))
            }
            "schema" => Some(Definition::Schema(self.parse_schema_definition(description))),
            "scalar" | "type" | "enum" | "input" => {
                Some(Definition::Type(self.parse_type_definition(description)))
            }
            keyword @ ("interface" | "union" | "extend" | "directive") => {
                let message = format!("\"{keyword}\" definitions are not supported");
                self.error(codes::UNSUPPORTED_DEFINITION, message);
                self.skip_definition();
                None
            }
            _ => {
                self.error_expected("a definition");
                None
            }
        }
    }

    /// Skips tokens up to the start of the next top-level definition.
    fn skip_definition(&mut self) {
        let mut depth = 0usize;
        self.advance();
        loop {
            match self.at() {
                TokenKind::Eof => break,
                TokenKind::LBrace | TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket => {
                    depth = depth.saturating_sub(1);
                }
                TokenKind::Name
                    if depth == 0 && DEFINITION_KEYWORDS.contains(&self.current_text()) =>
                {
                    break
                }
                _ => {}
            }
            self.advance();
        }
    }

    /// Tries to parse a description.
    fn try_parse_description(&mut self) -> Option<String> {
        if self.at().is_string() {
            Some(self.parse_string_value())
        } else {
            None
        }
    }

    /// Decodes the current string token and advances past it.
    fn parse_string_value(&mut self) -> String {
        let text = self.current_text();
        let value = if self.at_kind(TokenKind::BlockStringLiteral) {
            block_string_value(&text[3..text.len() - 3])
        } else {
            match unescape_string(&text[1..text.len() - 1]) {
                Ok(value) => value,
                Err(message) => {
                    self.error(codes::INVALID_STRING, message);
                    String::new()
                }
            }
        };
        self.advance();
        value
    }

    /// Parses a name.
    fn parse_name(&mut self) -> Name {
        let span = self.current.span;
        if self.at_kind(TokenKind::Name) {
            let value = self.current_text().to_string();
            self.advance();
            Name::new(value, span)
        } else {
            self.error_expected("Name");
            Name::new(String::new(), Span::empty(span.start))
        }
    }

    /// Parses schema definition.
    fn parse_schema_definition(&mut self, description: Option<String>) -> SchemaDefinition {
        let start = self.current.span.start;
        self.advance(); // schema

        let directives = self.parse_directives(true);
        self.expect(TokenKind::LBrace);

        let mut operations = Vec::new();
        while !self.at_kind(TokenKind::RBrace) && !self.current.is_eof() {
            let op_start = self.current.span.start;
            let Some(operation) = OperationType::from_keyword(self.current_text())
                .filter(|_| self.at_kind(TokenKind::Name))
            else {
                self.error_expected("an operation type");
                self.advance();
                continue;
            };
            self.advance();
            self.expect(TokenKind::Colon);
            let type_name = self.parse_name();
            operations.push(OperationTypeDefinition {
                operation,
                type_name,
                span: self.span_from(op_start),
            });
        }
        self.expect(TokenKind::RBrace);

        SchemaDefinition {
            description,
            directives,
            operations,
            span: self.span_from(start),
        }
    }

    /// Parses a scalar, object, enum or input object definition.
    fn parse_type_definition(&mut self, description: Option<String>) -> TypeDefinition {
        let start = self.current.span.start;
        let keyword = self.current_text();
        self.advance();

        let name = self.parse_name();

        let kind = match keyword {
            "scalar" => TypeDefinitionKind::Scalar,
            "type" => {
                let interfaces = self.parse_implements();
                let directives = self.parse_directives(true);
                let fields = self.parse_braced(Self::parse_field_definition);
                return TypeDefinition {
                    description,
                    name,
                    kind: TypeDefinitionKind::Object { interfaces, fields },
                    directives,
                    span: self.span_from(start),
                };
            }
            "enum" => TypeDefinitionKind::Enum { values: Vec::new() },
            _ => TypeDefinitionKind::InputObject { fields: Vec::new() },
        };

        let directives = self.parse_directives(true);
        let kind = match kind {
            TypeDefinitionKind::Enum { .. } => TypeDefinitionKind::Enum {
                values: self.parse_braced(Self::parse_enum_value_definition),
            },
            TypeDefinitionKind::InputObject { .. } => TypeDefinitionKind::InputObject {
                fields: self.parse_braced(Self::parse_input_value_definition),
            },
            other => other,
        };

        TypeDefinition {
            description,
            name,
            kind,
            directives,
            span: self.span_from(start),
        }
    }

    /// Parses `implements A & B`.
    fn parse_implements(&mut self) -> Vec<Name> {
        let mut interfaces = Vec::new();
        if self.at_keyword("implements") {
            self.advance();
            if self.at_kind(TokenKind::Amp) {
                self.advance();
            }
            interfaces.push(self.parse_name());
            while self.at_kind(TokenKind::Amp) {
                self.advance();
                interfaces.push(self.parse_name());
            }
        }
        interfaces
    }

    /// Parses `{ item* }` with the given item parser.
    fn parse_braced<T>(&mut self, mut item: impl FnMut(&mut Self) -> T) -> Vec<T> {
        let mut items = Vec::new();
        if !self.expect(TokenKind::LBrace) {
            return items;
        }
        while !self.at_kind(TokenKind::RBrace) && !self.current.is_eof() {
            let before = self.current.span.start;
            items.push(item(self));
            self.ensure_progress(before);
        }
        self.expect(TokenKind::RBrace);
        items
    }

    /// Parses a field definition.
    fn parse_field_definition(&mut self) -> FieldDefinition {
        let description = self.try_parse_description();
        let start = self.current.span.start;
        let name = self.parse_name();

        let arguments = if self.at_kind(TokenKind::LParen) {
            self.advance();
            let args = self.parse_input_value_definitions();
            self.expect(TokenKind::RParen);
            args
        } else {
            Vec::new()
        };

        self.expect(TokenKind::Colon);
        let ty = self.parse_type();
        let directives = self.parse_directives(true);

        FieldDefinition {
            description,
            name,
            arguments,
            ty,
            directives,
            span: self.span_from(start),
        }
    }

    /// Parses input value definitions up to `)`.
    fn parse_input_value_definitions(&mut self) -> Vec<InputValueDefinition> {
        let mut fields = Vec::new();
        while !self.at_kind(TokenKind::RParen) && !self.current.is_eof() {
            let before = self.current.span.start;
            fields.push(self.parse_input_value_definition());
            self.ensure_progress(before);
        }
        fields
    }

    /// Parses an input value definition.
    fn parse_input_value_definition(&mut self) -> InputValueDefinition {
        let description = self.try_parse_description();
        let start = self.current.span.start;
        let name = self.parse_name();
        self.expect(TokenKind::Colon);
        let ty = self.parse_type();

        let default_value = if self.at_kind(TokenKind::Eq) {
            self.advance();
            Some(self.parse_value(true))
        } else {
            None
        };

        let directives = self.parse_directives(true);

        InputValueDefinition {
            description,
            name,
            ty,
            default_value,
            directives,
            span: self.span_from(start),
        }
    }

    /// Parses an enum value definition.
    fn parse_enum_value_definition(&mut self) -> EnumValueDefinition {
        let description = self.try_parse_description();
        let start = self.current.span.start;
        if matches!(self.current_text(), "true" | "false" | "null") {
            let message = format!("enum value cannot be \"{}\"", self.current_text());
            self.error(codes::INVALID_SYNTAX, message);
        }
        let name = self.parse_name();
        let directives = self.parse_directives(true);
        EnumValueDefinition {
            description,
            name,
            directives,
            span: self.span_from(start),
        }
    }

    /// Parses a type.
    fn parse_type(&mut self) -> Type {
        let start = self.current.span.start;

        let ty = if self.at_kind(TokenKind::LBracket) {
            if !self.enter_nested() {
                return Type::Named(self.parse_name());
            }
            self.advance();
            let inner = self.parse_type();
            self.expect(TokenKind::RBracket);
            self.leave_nested();
            Type::List(Box::new(inner), self.span_from(start))
        } else {
            Type::Named(self.parse_name())
        };

        if self.at_kind(TokenKind::Bang) {
            self.advance();
            Type::NonNull(Box::new(ty), self.span_from(start))
        } else {
            ty
        }
    }

    /// Parses directives.
    fn parse_directives(&mut self, is_const: bool) -> Vec<Directive> {
        let mut directives = Vec::new();
        while self.at_kind(TokenKind::At) {
            directives.push(self.parse_directive(is_const));
        }
        directives
    }

    /// Parses a directive.
    fn parse_directive(&mut self, is_const: bool) -> Directive {
        let start = self.current.span.start;
        self.advance(); // @

        let name = self.parse_name();
        let arguments = self.parse_arguments(is_const);

        Directive {
            name,
            arguments,
            span: self.span_from(start),
        }
    }

    /// Parses an optional parenthesized argument list.
    fn parse_arguments(&mut self, is_const: bool) -> Vec<Argument> {
        let mut args = Vec::new();
        if !self.at_kind(TokenKind::LParen) {
            return args;
        }
        self.advance();
        if self.at_kind(TokenKind::RParen) {
            self.error_expected("Name");
        }
        while !self.at_kind(TokenKind::RParen) && !self.current.is_eof() {
            let before = self.current.span.start;
            args.push(self.parse_argument(is_const));
            self.ensure_progress(before);
        }
        self.expect(TokenKind::RParen);
        args
    }

    /// Parses an argument.
    fn parse_argument(&mut self, is_const: bool) -> Argument {
        let start = self.current.span.start;
        let name = self.parse_name();
        self.expect(TokenKind::Colon);
        let value = self.parse_value(is_const);
        Argument {
            name,
            value,
            span: self.span_from(start),
        }
    }

    /// Parses a value. Variables are rejected in const contexts.
    fn parse_value(&mut self, is_const: bool) -> Value {
        let start = self.current.span.start;
        let nested = matches!(self.at(), TokenKind::LBracket | TokenKind::LBrace);
        if nested && !self.enter_nested() {
            return Value::Null(Span::empty(start));
        }

        match self.at() {
            TokenKind::Dollar => {
                self.advance();
                let name = self.parse_name();
                if is_const {
                    let message = format!("unexpected variable \"${}\" in constant value", name.value);
                    self.error_at(codes::INVALID_SYNTAX, message, self.span_from(start));
                }
                Value::Variable(name)
            }
            TokenKind::IntLiteral => {
                let text = self.current_text();
                let value = match text.parse::<i64>() {
                    Ok(value) => value,
                    Err(_) => {
                        let message = format!("integer literal {text} is out of range");
                        self.error(codes::INVALID_SYNTAX, message);
                        0
                    }
                };
                self.advance();
                Value::Int(value, self.span_from(start))
            }
            TokenKind::FloatLiteral => {
                let value = self.current_text().parse().unwrap_or(f64::NAN);
                self.advance();
                Value::Float(value, self.span_from(start))
            }
            TokenKind::StringLiteral | TokenKind::BlockStringLiteral => {
                let value = self.parse_string_value();
                Value::String(value, self.span_from(start))
            }
            TokenKind::LBracket => {
                self.advance();
                let mut values = Vec::new();
                while !self.at_kind(TokenKind::RBracket) && !self.current.is_eof() {
                    let before = self.current.span.start;
                    values.push(self.parse_value(is_const));
                    self.ensure_progress(before);
                }
                self.expect(TokenKind::RBracket);
                self.leave_nested();
                Value::List(values, self.span_from(start))
            }
            TokenKind::LBrace => {
                self.advance();
                let mut fields = Vec::new();
                while !self.at_kind(TokenKind::RBrace) && !self.current.is_eof() {
                    let before = self.current.span.start;
                    let name = self.parse_name();
                    self.expect(TokenKind::Colon);
                    let value = self.parse_value(is_const);
                    fields.push((name, value));
                    self.ensure_progress(before);
                }
                self.expect(TokenKind::RBrace);
                self.leave_nested();
                Value::Object(fields, self.span_from(start))
            }
            TokenKind::Name => {
                let name = self.parse_name();
                match name.value.as_str() {
                    "true" => Value::Boolean(true, name.span),
                    "false" => Value::Boolean(false, name.span),
                    "null" => Value::Null(name.span),
                    _ => Value::Enum(name),
                }
            }
            _ => {
                self.error_expected("a value");
                Value::Null(Span::empty(start))
            }
        }
    }

    /// Parses an operation definition.
    fn parse_operation(&mut self) -> OperationDefinition {
        let start = self.current.span.start;

        if self.at_kind(TokenKind::LBrace) {
            // Query shorthand
            let selection_set = self.parse_selection_set();
            return OperationDefinition {
                operation: OperationType::Query,
                name: None,
                variables: Vec::new(),
                directives: Vec::new(),
                selection_set,
                span: self.span_from(start),
            };
        }

        let operation =
            OperationType::from_keyword(self.current_text()).unwrap_or(OperationType::Query);
        self.advance();

        let name = if self.at_kind(TokenKind::Name) {
            Some(self.parse_name())
        } else {
            None
        };

        let variables = if self.at_kind(TokenKind::LParen) {
            self.advance();
            let vars = self.parse_variable_definitions();
            self.expect(TokenKind::RParen);
            vars
        } else {
            Vec::new()
        };

        let directives = self.parse_directives(false);
        let selection_set = self.parse_selection_set();

        OperationDefinition {
            operation,
            name,
            variables,
            directives,
            selection_set,
            span: self.span_from(start),
        }
    }

    /// Parses variable definitions.
    fn parse_variable_definitions(&mut self) -> Vec<VariableDefinition> {
        let mut vars = Vec::new();
        if self.at_kind(TokenKind::RParen) {
            self.error_expected("\"$\"");
        }
        while !self.at_kind(TokenKind::RParen) && !self.current.is_eof() {
            let before = self.current.span.start;
            vars.push(self.parse_variable_definition());
            self.ensure_progress(before);
        }
        vars
    }

    /// Parses a variable definition.
    fn parse_variable_definition(&mut self) -> VariableDefinition {
        let start = self.current.span.start;
        self.expect(TokenKind::Dollar);
        let name = self.parse_name();
        self.expect(TokenKind::Colon);
        let ty = self.parse_type();

        let default_value = if self.at_kind(TokenKind::Eq) {
            self.advance();
            Some(self.parse_value(true))
        } else {
            None
        };

        let directives = self.parse_directives(true);

        VariableDefinition {
            name,
            ty,
            default_value,
            directives,
            span: self.span_from(start),
        }
    }

    /// Parses a fragment definition.
    fn parse_fragment_definition(&mut self) -> FragmentDefinition {
        let start = self.current.span.start;
        self.advance(); // fragment

        if self.at_keyword("on") {
            self.error_expected("a fragment name");
        }
        let name = self.parse_name();
        self.expect_keyword("on");
        let type_condition = self.parse_name();
        let directives = self.parse_directives(false);
        let selection_set = self.parse_selection_set();

        FragmentDefinition {
            name,
            type_condition,
            directives,
            selection_set,
            span: self.span_from(start),
        }
    }

    /// Parses a selection set.
    fn parse_selection_set(&mut self) -> SelectionSet {
        let start = self.current.span.start;
        let mut selections = Vec::new();

        if !self.enter_nested() {
            return SelectionSet {
                selections,
                span: Span::empty(start),
            };
        }
        if self.expect(TokenKind::LBrace) {
            if self.at_kind(TokenKind::RBrace) {
                self.error_expected("a selection");
            }
            while !self.at_kind(TokenKind::RBrace) && !self.current.is_eof() {
                let before = self.current.span.start;
                selections.push(self.parse_selection());
                self.ensure_progress(before);
            }
            self.expect(TokenKind::RBrace);
        }
        self.leave_nested();

        SelectionSet {
            selections,
            span: self.span_from(start),
        }
    }

    /// Parses a selection.
    fn parse_selection(&mut self) -> Selection {
        if !self.at_kind(TokenKind::Spread) {
            return Selection::Field(self.parse_field_selection());
        }

        let start = self.current.span.start;
        self.advance(); // ...

        if self.at_keyword("on") {
            self.advance();
            let type_condition = Some(self.parse_name());
            let directives = self.parse_directives(false);
            let selection_set = self.parse_selection_set();
            Selection::InlineFragment(InlineFragment {
                type_condition,
                directives,
                selection_set,
                span: self.span_from(start),
            })
        } else if self.at_kind(TokenKind::LBrace) || self.at_kind(TokenKind::At) {
            let directives = self.parse_directives(false);
            let selection_set = self.parse_selection_set();
            Selection::InlineFragment(InlineFragment {
                type_condition: None,
                directives,
                selection_set,
                span: self.span_from(start),
            })
        } else {
            let name = self.parse_name();
            let directives = self.parse_directives(false);
            Selection::FragmentSpread(FragmentSpread {
                name,
                directives,
                span: self.span_from(start),
            })
        }
    }

    /// Parses a field selection.
    fn parse_field_selection(&mut self) -> FieldSelection {
        let start = self.current.span.start;

        let first_name = self.parse_name();
        let (alias, name) = if self.at_kind(TokenKind::Colon) {
            self.advance();
            (Some(first_name), self.parse_name())
        } else {
            (None, first_name)
        };

        let arguments = self.parse_arguments(false);
        let directives = self.parse_directives(false);

        let selection_set = if self.at_kind(TokenKind::LBrace) {
            Some(self.parse_selection_set())
        } else {
            None
        };

        FieldSelection {
            alias,
            name,
            arguments,
            directives,
            selection_set,
            span: self.span_from(start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Document {
        let result = parse(source);
        assert!(
            result.is_ok(),
            "unexpected diagnostics: {:?}",
            result.diagnostics.iter().collect::<Vec<_>>()
        );
        result.document
    }

    fn first_operation(document: &Document) -> &OperationDefinition {
        document.operations().next().unwrap()
    }

    fn field(selection: &Selection) -> &FieldSelection {
        match selection {
            Selection::Field(field) => field,
            other => panic!("expected field, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_query_shorthand() {
        let doc = parse_ok("{ getDinosaur { id name type } }");
        let op = first_operation(&doc);
        assert_eq!(op.operation, OperationType::Query);
        assert!(op.name.is_none());

        let root = field(&op.selection_set.selections[0]);
        assert_eq!(root.name.value, "getDinosaur");
        let children: Vec<_> = root
            .selection_set
            .as_ref()
            .unwrap()
            .selections
            .iter()
            .map(|s| field(s).name.value.as_str())
            .collect();
        assert_eq!(children, vec!["id", "name", "type"]);
    }

    #[test]
    fn test_parse_mutation_with_variables() {
        let doc = parse_ok(
            r#"
            mutation Add($name: String!, $type: String! = "carnivore") {
                created: addDinosaur(name: $name, type: $type) { id }
            }
            "#,
        );
        let op = first_operation(&doc);
        assert_eq!(op.operation, OperationType::Mutation);
        assert_eq!(op.name.as_ref().unwrap().value, "Add");
        assert_eq!(op.variables.len(), 2);
        assert!(matches!(op.variables[0].ty, Type::NonNull(..)));
        assert!(matches!(
            &op.variables[1].default_value,
            Some(Value::String(value, _)) if value == "carnivore"
        ));

        let root = field(&op.selection_set.selections[0]);
        assert_eq!(root.response_key(), "created");
        assert_eq!(root.name.value, "addDinosaur");
        assert_eq!(root.arguments[1].name.value, "type");
        assert!(matches!(&root.arguments[0].value, Value::Variable(name) if name.value == "name"));
    }

    #[test]
    fn test_parse_values() {
        let doc = parse_ok(r#"{ f(a: 1, b: -2.5, c: "x\ny", d: true, e: null, g: RED, h: [1 2], i: {k: "v"}) }"#);
        let op = first_operation(&doc);
        let args = &field(&op.selection_set.selections[0]).arguments;
        assert!(matches!(args[0].value, Value::Int(1, _)));
        assert!(matches!(args[1].value, Value::Float(v, _) if (v + 2.5).abs() < f64::EPSILON));
        assert!(matches!(&args[2].value, Value::String(s, _) if s == "x\ny"));
        assert!(matches!(args[3].value, Value::Boolean(true, _)));
        assert!(matches!(args[4].value, Value::Null(_)));
        assert!(matches!(&args[5].value, Value::Enum(name) if name.value == "RED"));
        assert!(matches!(&args[6].value, Value::List(items, _) if items.len() == 2));
        assert!(matches!(&args[7].value, Value::Object(fields, _) if fields[0].0.value == "k"));
    }

    #[test]
    fn test_parse_fragments() {
        let doc = parse_ok(
            r"
            query { getDinosaur { ...DinoFields ... on Dinosaur { type } ... @include(if: true) { id } } }
            fragment DinoFields on Dinosaur { id name }
            ",
        );
        let op = first_operation(&doc);
        let root = field(&op.selection_set.selections[0]);
        let selections = &root.selection_set.as_ref().unwrap().selections;
        assert!(matches!(&selections[0], Selection::FragmentSpread(s) if s.name.value == "DinoFields"));
        assert!(matches!(&selections[1], Selection::InlineFragment(f) if f.type_condition.is_some()));
        assert!(matches!(&selections[2], Selection::InlineFragment(f) if f.directives.len() == 1));

        let fragment = doc.fragments().next().unwrap();
        assert_eq!(fragment.type_condition.value, "Dinosaur");
    }

    #[test]
    fn test_parse_sdl() {
        let doc = parse_ok(
            r#"
            """
            A dinosaur of the zoo.
            """
            type Dinosaur {
                id: ID!
                "Common name"
                name: String
                type: String
            }

            type Query {
                getDinosaur: [Dinosaur]
                getDinosaurById(id: ID!): Dinosaur
            }

            input Filter { type: String = "herbivore" }
            enum Diet { HERBIVORE CARNIVORE }
            scalar Date
            schema { query: Query }
            "#,
        );

        let types: Vec<_> = doc
            .definitions
            .iter()
            .filter_map(|def| match def {
                Definition::Type(ty) => Some(ty),
                _ => None,
            })
            .collect();
        assert_eq!(types.len(), 5);
        assert_eq!(types[0].description.as_deref(), Some("A dinosaur of the zoo."));

        let TypeDefinitionKind::Object { fields, .. } = &types[0].kind else {
            panic!("expected object type");
        };
        assert_eq!(fields[1].description.as_deref(), Some("Common name"));
        assert_eq!(fields[2].name.value, "type");

        let TypeDefinitionKind::Object { fields, .. } = &types[1].kind else {
            panic!("expected object type");
        };
        assert!(matches!(&fields[0].ty, Type::List(inner, _) if inner.named_type().value == "Dinosaur"));
        assert_eq!(fields[1].arguments[0].name.value, "id");

        assert!(matches!(&types[3].kind, TypeDefinitionKind::Enum { values } if values.len() == 2));
        assert!(doc.definitions.iter().any(|def| matches!(def, Definition::Schema(_))));
    }

    #[test]
    fn test_parse_error_unclosed_selection() {
        let result = parse("{ getDinosaur { id ");
        assert!(!result.is_ok());
        let diag = result.diagnostics.iter().next().unwrap();
        assert_eq!(diag.code, codes::UNEXPECTED_EOF);
        assert!(diag.message.contains("<EOF>"), "{}", diag.message);
    }

    #[test]
    fn test_parse_error_empty_document() {
        let result = parse("   # nothing here\n");
        assert!(!result.is_ok());
    }

    #[test]
    fn test_parse_error_invalid_character() {
        let result = parse("{ getDinosaur ^ }");
        assert!(!result.is_ok());
        let diag = result.diagnostics.iter().next().unwrap();
        assert_eq!(diag.span, Span::new(14, 15));
    }

    #[test]
    fn test_parse_error_variable_in_const_default() {
        let result = parse("query ($a: Int = $b) { f }");
        assert!(!result.is_ok());
    }

    #[test]
    fn test_parse_unsupported_definition_is_skipped() {
        let result = parse("interface Node { id: ID! } type Query { node: Node }");
        let diags: Vec<_> = result.diagnostics.iter().collect();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, codes::UNSUPPORTED_DEFINITION);
        assert_eq!(result.document.definitions.len(), 1);
    }

    fn nesting_error(source: &str) {
        let result = parse(source);
        let diag = result.diagnostics.iter().next().unwrap();
        assert_eq!(diag.code, codes::NESTING_TOO_DEEP, "{}", diag.message);
    }

    #[test]
    fn test_parse_nesting_at_limit() {
        // The operation's selection set is the first level.
        let depth = MAX_NESTING_DEPTH - 1;
        parse_ok(&format!("{{ f(a: {}1{}) }}", "[".repeat(depth), "]".repeat(depth)));

        let depth = MAX_NESTING_DEPTH;
        parse_ok(&format!("{}{}", "{ a ".repeat(depth), "}".repeat(depth)));
    }

    #[test]
    fn test_parse_deeply_nested_values() {
        let n = 50_000;
        nesting_error(&format!("{{ f(a: {}1{}) }}", "[".repeat(n), "]".repeat(n)));
        nesting_error(&format!("{{ f(a: {}1{}) }}", "{k: ".repeat(n), "}".repeat(n)));
    }

    #[test]
    fn test_parse_deeply_nested_selections() {
        let n = 50_000;
        nesting_error(&format!("{}{}", "{ a ".repeat(n), "}".repeat(n)));
        nesting_error(&format!("{{ a {}}}", "... { b ".repeat(n) + &"}".repeat(n)));
    }

    #[test]
    fn test_parse_deeply_nested_list_type() {
        let n = 50_000;
        nesting_error(&format!(
            "query ($v: {}Int{}) {{ f }}",
            "[".repeat(n),
            "]".repeat(n)
        ));
    }

    #[test]
    fn test_parse_recovers_and_terminates() {
        for source in ["{ f(", "query (", "fragment on on", "{ ... }", "{ a: }", "))))", "type {"] {
            let result = parse(source);
            assert!(!result.is_ok(), "{source}");
        }
    }
}
