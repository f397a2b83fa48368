//! Conversion from a parsed query document to the engine's selection tree.

use std::collections::{HashMap, HashSet};

use graphql_parser::query::{
    Definition, Directive, FragmentDefinition, OperationDefinition, Selection, SelectionSet,
    Type, TypeCondition, Value, VariableDefinition, parse_query,
};
use serde_json::Map;

use crate::domain::{Field, InputValue};

/// Request-level failures raised before execution starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("{message}")]
    Parse { message: String },
    #[error("Document does not contain any operations.")]
    NoOperation,
    #[error("Unknown operation named \"{name}\".")]
    UnknownOperation { name: String },
    #[error("Must provide operation name if query contains multiple operations.")]
    AmbiguousOperation,
    #[error("Only query operations are supported; received a {kind}.")]
    UnsupportedOperation { kind: &'static str },
    #[error("Unknown fragment \"{name}\".")]
    UnknownFragment { name: String },
    #[error("Cannot spread fragment \"{name}\" within itself.")]
    FragmentCycle { name: String },
    #[error("Variable \"${name}\" is not defined.")]
    UndefinedVariable { name: String },
    #[error("Variable \"${name}\" of required type \"{var_type}\" was not provided.")]
    MissingVariable { name: String, var_type: String },
    #[error("Directive \"@{directive}\" argument \"if\" must be a boolean.")]
    InvalidDirective { directive: String },
}

impl DocumentError {
    /// Stable code placed under `extensions.code`.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "GRAPHQL_PARSE_FAILED",
            Self::NoOperation
            | Self::UnknownOperation { .. }
            | Self::AmbiguousOperation
            | Self::UnsupportedOperation { .. } => "OPERATION_RESOLUTION_FAILURE",
            Self::UnknownFragment { .. }
            | Self::FragmentCycle { .. }
            | Self::UndefinedVariable { .. }
            | Self::MissingVariable { .. }
            | Self::InvalidDirective { .. } => "GRAPHQL_VALIDATION_FAILED",
        }
    }
}

/// Parse `query` and build the root selection set of the chosen operation.
///
/// `operation_name` is required when the document holds more than one
/// operation. Variables are coerced against the operation's declarations;
/// a nullable variable that is neither provided nor defaulted removes the
/// argument it is used in.
pub fn build_selection(
    query: &str,
    operation_name: Option<&str>,
    variables: &Map<String, serde_json::Value>,
) -> Result<Vec<Field>, DocumentError> {
    let document = parse_query::<String>(query).map_err(|err| DocumentError::Parse {
        message: err.to_string(),
    })?;

    let mut fragments = HashMap::new();
    let mut operations = Vec::new();
    for definition in &document.definitions {
        match definition {
            Definition::Operation(operation) => operations.push(operation),
            Definition::Fragment(fragment) => {
                fragments.insert(fragment.name.as_str(), fragment);
            }
        }
    }

    let (declarations, selection_set) = match pick_operation(&operations, operation_name)? {
        OperationDefinition::SelectionSet(set) => (&[][..], set),
        OperationDefinition::Query(query) => {
            (query.variable_definitions.as_slice(), &query.selection_set)
        }
        OperationDefinition::Mutation(_) => {
            return Err(DocumentError::UnsupportedOperation { kind: "mutation" });
        }
        OperationDefinition::Subscription(_) => {
            return Err(DocumentError::UnsupportedOperation {
                kind: "subscription",
            });
        }
    };

    let converter = Converter {
        fragments,
        variables: Variables::coerce(declarations, variables)?,
    };
    let mut fields = Vec::new();
    converter.selection_set(selection_set, None, &mut Vec::new(), &mut fields)?;
    Ok(fields)
}

fn operation_name<'d>(operation: &'d OperationDefinition<'_, String>) -> Option<&'d str> {
    match operation {
        OperationDefinition::SelectionSet(_) => None,
        OperationDefinition::Query(query) => query.name.as_deref(),
        OperationDefinition::Mutation(mutation) => mutation.name.as_deref(),
        OperationDefinition::Subscription(subscription) => subscription.name.as_deref(),
    }
}

fn pick_operation<'d, 'q>(
    operations: &[&'d OperationDefinition<'q, String>],
    name: Option<&str>,
) -> Result<&'d OperationDefinition<'q, String>, DocumentError> {
    match name {
        Some(name) => operations
            .iter()
            .copied()
            .find(|operation| operation_name(operation) == Some(name))
            .ok_or_else(|| DocumentError::UnknownOperation {
                name: name.to_owned(),
            }),
        None => match operations {
            [only] => Ok(*only),
            [] => Err(DocumentError::NoOperation),
            _ => Err(DocumentError::AmbiguousOperation),
        },
    }
}

/// Coerced variable values of the chosen operation.
#[derive(Debug, Default)]
struct Variables {
    declared: HashSet<String>,
    values: HashMap<String, InputValue>,
}

impl Variables {
    fn coerce(
        declarations: &[VariableDefinition<'_, String>],
        provided: &Map<String, serde_json::Value>,
    ) -> Result<Self, DocumentError> {
        let mut variables = Self::default();
        for declaration in declarations {
            let value = match provided.get(&declaration.name) {
                Some(value) => Some(InputValue::from(value)),
                None => declaration
                    .default_value
                    .as_ref()
                    .map(|value| input_value(value, &Self::default()))
                    .transpose()?,
            };
            match value {
                Some(InputValue::Null) | None
                    if matches!(declaration.var_type, Type::NonNullType(_)) =>
                {
                    return Err(DocumentError::MissingVariable {
                        name: declaration.name.clone(),
                        var_type: declaration.var_type.to_string(),
                    });
                }
                Some(value) => {
                    variables.values.insert(declaration.name.clone(), value);
                }
                None => {}
            }
            variables.declared.insert(declaration.name.clone());
        }
        Ok(variables)
    }

    /// `Ok(None)` for a declared variable without a value.
    fn lookup(&self, name: &str) -> Result<Option<&InputValue>, DocumentError> {
        if !self.declared.contains(name) {
            return Err(DocumentError::UndefinedVariable {
                name: name.to_owned(),
            });
        }
        Ok(self.values.get(name))
    }
}

fn input_value(
    value: &Value<'_, String>,
    variables: &Variables,
) -> Result<InputValue, DocumentError> {
    Ok(match value {
        Value::Variable(name) => variables
            .lookup(name)?
            .cloned()
            .unwrap_or(InputValue::Null),
        Value::Int(number) => number.as_i64().map_or(InputValue::Null, InputValue::Int),
        Value::Float(number) => InputValue::Float(*number),
        Value::String(text) => InputValue::String(text.clone()),
        Value::Boolean(flag) => InputValue::Boolean(*flag),
        Value::Null => InputValue::Null,
        Value::Enum(name) => InputValue::Enum(name.clone()),
        Value::List(items) => InputValue::List(
            items
                .iter()
                .map(|item| input_value(item, variables))
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(entries) => InputValue::Object(
            entries
                .iter()
                .map(|(key, item)| Ok((key.clone(), input_value(item, variables)?)))
                .collect::<Result<_, DocumentError>>()?,
        ),
    })
}

/// Combine an enclosing type condition with a nested one. `None` when both
/// can never hold for the same object.
fn narrow<'c>(outer: Option<&'c str>, inner: Option<&'c str>) -> Option<Option<&'c str>> {
    match (outer, inner) {
        (Some(outer), Some(inner)) if outer != inner => None,
        (outer, inner) => Some(inner.or(outer)),
    }
}

struct Converter<'d, 'q> {
    fragments: HashMap<&'d str, &'d FragmentDefinition<'q, String>>,
    variables: Variables,
}

impl<'d, 'q> Converter<'d, 'q> {
    fn included(&self, directives: &[Directive<'q, String>]) -> Result<bool, DocumentError> {
        for directive in directives {
            let expected = match directive.name.as_str() {
                "skip" => false,
                "include" => true,
                _ => continue,
            };
            let condition = directive
                .arguments
                .iter()
                .find(|(name, _)| name == "if")
                .map(|(_, value)| input_value(value, &self.variables))
                .transpose()?;
            match condition {
                Some(InputValue::Boolean(flag)) if flag != expected => return Ok(false),
                Some(InputValue::Boolean(_)) => {}
                _ => {
                    return Err(DocumentError::InvalidDirective {
                        directive: directive.name.clone(),
                    });
                }
            }
        }
        Ok(true)
    }

    fn field(
        &self,
        field: &'d graphql_parser::query::Field<'q, String>,
        condition: Option<&'d str>,
        spreading: &mut Vec<&'d str>,
    ) -> Result<Field, DocumentError> {
        let mut converted = Field::new(field.name.clone());
        converted.alias = field.alias.clone();
        converted.type_condition = condition.map(str::to_owned);
        for (name, value) in &field.arguments {
            if let Value::Variable(variable) = value {
                if let Some(value) = self.variables.lookup(variable)? {
                    converted.arguments.insert(name.clone(), value.clone());
                }
                continue;
            }
            converted
                .arguments
                .insert(name.clone(), input_value(value, &self.variables)?);
        }
        self.selection_set(&field.selection_set, None, spreading, &mut converted.selection)?;
        Ok(converted)
    }

    fn selection_set(
        &self,
        set: &'d SelectionSet<'q, String>,
        condition: Option<&'d str>,
        spreading: &mut Vec<&'d str>,
        out: &mut Vec<Field>,
    ) -> Result<(), DocumentError> {
        for item in &set.items {
            match item {
                Selection::Field(field) => {
                    if self.included(&field.directives)? {
                        out.push(self.field(field, condition, spreading)?);
                    }
                }
                Selection::FragmentSpread(spread) => {
                    if !self.included(&spread.directives)? {
                        continue;
                    }
                    let name = spread.fragment_name.as_str();
                    let fragment = self.fragments.get(name).copied().ok_or_else(|| {
                        DocumentError::UnknownFragment {
                            name: name.to_owned(),
                        }
                    })?;
                    if spreading.contains(&name) {
                        return Err(DocumentError::FragmentCycle {
                            name: name.to_owned(),
                        });
                    }
                    let TypeCondition::On(type_name) = &fragment.type_condition;
                    let Some(condition) = narrow(condition, Some(type_name.as_str())) else {
                        continue;
                    };
                    spreading.push(name);
                    self.selection_set(&fragment.selection_set, condition, spreading, out)?;
                    spreading.pop();
                }
                Selection::InlineFragment(inline) => {
                    if !self.included(&inline.directives)? {
                        continue;
                    }
                    let inner = inline
                        .type_condition
                        .as_ref()
                        .map(|TypeCondition::On(type_name)| type_name.as_str());
                    let Some(condition) = narrow(condition, inner) else {
                        continue;
                    };
                    self.selection_set(&inline.selection_set, condition, spreading, out)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
