//! Field-selection tree handed to the resolution driver.
//!
//! The tree is produced by an inbound adapter from a parsed query document.
//! Argument values are already substituted for variables, and fragments are
//! flattened into fields carrying the type condition they were selected
//! under.

use std::collections::BTreeMap;

/// Argument value after variable substitution.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Null,
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Enum(String),
    List(Vec<InputValue>),
    Object(BTreeMap<String, InputValue>),
}

impl InputValue {
    /// Short type description used in validation messages.
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Int(_) => "an integer",
            Self::Float(_) => "a float",
            Self::String(_) => "a string",
            Self::Boolean(_) => "a boolean",
            Self::Enum(_) => "an enum value",
            Self::List(_) => "a list",
            Self::Object(_) => "an object",
        }
    }
}

impl From<&serde_json::Value> for InputValue {
    fn from(value: &serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::Null,
            Value::Bool(flag) => Self::Boolean(*flag),
            Value::Number(number) => number
                .as_i64()
                .map(Self::Int)
                .or_else(|| number.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            Value::String(text) => Self::String(text.clone()),
            Value::Array(items) => Self::List(items.iter().map(Self::from).collect()),
            Value::Object(entries) => Self::Object(
                entries
                    .iter()
                    .map(|(key, item)| (key.clone(), Self::from(item)))
                    .collect(),
            ),
        }
    }
}

/// One requested field and its nested selection.
///
/// # Examples
/// ```
/// use feedgraph::domain::{Field, InputValue};
///
/// let field = Field::new("user")
///     .with_alias("author")
///     .with_argument("id", InputValue::String("3fa85f64-5717-4562-b3fc-2c963f66afa6".into()))
///     .with_selection(vec![Field::new("name")]);
/// assert_eq!(field.response_key(), "author");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub alias: Option<String>,
    pub name: String,
    pub arguments: BTreeMap<String, InputValue>,
    /// Object type this field was selected under, if it came from a fragment.
    pub type_condition: Option<String>,
    pub selection: Vec<Field>,
}

impl Field {
    /// Start a field selection with no alias, arguments or sub-selection.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            alias: None,
            name: name.into(),
            arguments: BTreeMap::new(),
            type_condition: None,
            selection: Vec::new(),
        }
    }

    /// Set the response key.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Add an argument, replacing any previous value with the same name.
    #[must_use]
    pub fn with_argument(mut self, name: impl Into<String>, value: InputValue) -> Self {
        self.arguments.insert(name.into(), value);
        self
    }

    /// Replace the nested selection.
    #[must_use]
    pub fn with_selection(mut self, selection: Vec<Field>) -> Self {
        self.selection = selection;
        self
    }

    /// Restrict the field to objects of the named type.
    #[must_use]
    pub fn on_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_condition = Some(type_name.into());
        self
    }

    /// Key under which the field's value appears in the response.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Look up an argument by name.
    pub fn argument(&self, name: &str) -> Option<&InputValue> {
        self.arguments.get(name)
    }

    /// Whether the field applies to objects of `type_name`.
    pub fn applies_to(&self, type_name: &str) -> bool {
        self.type_condition
            .as_deref()
            .is_none_or(|condition| condition == type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn response_key_defaults_to_the_field_name() {
        assert_eq!(Field::new("posts").response_key(), "posts");
    }

    #[rstest]
    #[case(None, true)]
    #[case(Some("User"), true)]
    #[case(Some("Post"), false)]
    fn type_conditions_filter_by_object_type(
        #[case] condition: Option<&str>,
        #[case] expected: bool,
    ) {
        let mut field = Field::new("id");
        if let Some(condition) = condition {
            field = field.on_type(condition);
        }
        assert_eq!(field.applies_to("User"), expected);
    }

    #[rstest]
    fn json_variables_convert_to_input_values() {
        let value = InputValue::from(&json!({"ids": [1, 2.5, "x"], "flag": true}));
        let InputValue::Object(entries) = value else {
            panic!("expected object");
        };
        assert_eq!(entries.get("flag"), Some(&InputValue::Boolean(true)));
        assert_eq!(
            entries.get("ids"),
            Some(&InputValue::List(vec![
                InputValue::Int(1),
                InputValue::Float(2.5),
                InputValue::String("x".into()),
            ]))
        );
    }
}
