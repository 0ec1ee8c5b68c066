use crate::error::{StructuralError, Violation};
use ahash::AHashMap;
use serde_json::Value;

/// A small JSON schema vocabulary, just large enough to describe plans.
///
/// Recursive shapes are expressed with [`Schema::Ref`], which names an entry in the
/// surrounding [`SchemaSet`]'s definitions and is resolved lazily while a document is
/// walked. A reference therefore never expands further than the data it describes.
#[derive(Debug, Clone)]
pub enum Schema {
    Any,
    Boolean,
    String {
        min_len: usize,
        max_len: Option<usize>,
    },
    Const(&'static str),
    Enum(&'static [&'static str]),
    Array {
        items: Box<Schema>,
        min_items: usize,
        max_items: Option<usize>,
    },
    Object(Vec<Property>),
    /// An object with arbitrary keys whose values all share one schema.
    Record(Box<Schema>),
    /// A union discriminated by a string field, e.g. `{"type": "filter", ...}`.
    TaggedUnion {
        tag: &'static str,
        variants: Vec<(&'static str, Schema)>,
    },
    Ref(&'static str),
}

#[derive(Debug, Clone)]
pub struct Property {
    pub name: &'static str,
    pub schema: Schema,
    pub required: bool,
}

impl Property {
    pub fn required(name: &'static str, schema: Schema) -> Self {
        Self {
            name,
            schema,
            required: true,
        }
    }

    pub fn optional(name: &'static str, schema: Schema) -> Self {
        Self {
            name,
            schema,
            required: false,
        }
    }
}

impl Schema {
    pub fn string() -> Self {
        Schema::String {
            min_len: 0,
            max_len: None,
        }
    }

    pub fn non_empty_string() -> Self {
        Schema::String {
            min_len: 1,
            max_len: None,
        }
    }

    pub fn array(items: Schema, min_items: usize, max_items: Option<usize>) -> Self {
        Schema::Array {
            items: Box::new(items),
            min_items,
            max_items,
        }
    }

    pub fn record(values: Schema) -> Self {
        Schema::Record(Box::new(values))
    }
}

/// A root schema together with the named definitions its references point at.
#[derive(Debug, Clone)]
pub struct SchemaSet {
    root: Schema,
    definitions: AHashMap<&'static str, Schema>,
}

impl SchemaSet {
    pub fn new(root: Schema) -> Self {
        Self {
            root,
            definitions: AHashMap::new(),
        }
    }

    pub fn define(mut self, name: &'static str, schema: Schema) -> Self {
        self.definitions.insert(name, schema);
        self
    }

    /// Walks `value` and returns every violation found, in document order.
    pub fn validate(&self, value: &Value) -> Vec<StructuralError> {
        let mut errors = Vec::new();
        self.check(&self.root, value, "", &mut errors);
        errors
    }

    fn check(&self, schema: &Schema, value: &Value, path: &str, errors: &mut Vec<StructuralError>) {
        match schema {
            Schema::Any => {}
            Schema::Boolean => {
                if !value.is_boolean() {
                    errors.push(type_error(path, "boolean", value));
                }
            }
            Schema::String { min_len, max_len } => {
                let Some(text) = value.as_str() else {
                    errors.push(type_error(path, "string", value));
                    return;
                };
                let found = text.chars().count();
                if found < *min_len || max_len.is_some_and(|max| found > max) {
                    errors.push(StructuralError::new(
                        path,
                        Violation::StringLength {
                            min: *min_len,
                            max: *max_len,
                            found,
                        },
                    ));
                }
            }
            Schema::Const(expected) => {
                if value.as_str() != Some(expected) {
                    errors.push(StructuralError::new(
                        path,
                        Violation::InvalidConst {
                            expected: expected.to_string(),
                            found: display_value(value),
                        },
                    ));
                }
            }
            Schema::Enum(allowed) => {
                if !value.as_str().is_some_and(|v| allowed.contains(&v)) {
                    errors.push(StructuralError::new(
                        path,
                        Violation::InvalidEnum {
                            allowed: allowed.iter().map(|a| a.to_string()).collect(),
                            found: display_value(value),
                        },
                    ));
                }
            }
            Schema::Array {
                items,
                min_items,
                max_items,
            } => {
                let Some(elements) = value.as_array() else {
                    errors.push(type_error(path, "array", value));
                    return;
                };
                let found = elements.len();
                if found < *min_items || max_items.is_some_and(|max| found > max) {
                    errors.push(StructuralError::new(
                        path,
                        Violation::ArrayLength {
                            min: *min_items,
                            max: *max_items,
                            found,
                        },
                    ));
                }
                for (index, element) in elements.iter().enumerate() {
                    self.check(items, element, &format!("{}[{}]", path, index), errors);
                }
            }
            Schema::Object(properties) => {
                let Some(object) = value.as_object() else {
                    errors.push(type_error(path, "object", value));
                    return;
                };
                for property in properties {
                    let property_path = join(path, property.name);
                    match object.get(property.name) {
                        Some(field) => self.check(&property.schema, field, &property_path, errors),
                        None if property.required => errors.push(StructuralError::new(
                            property_path,
                            Violation::Required {
                                field: property.name.to_string(),
                            },
                        )),
                        None => {}
                    }
                }
            }
            Schema::Record(values) => {
                let Some(object) = value.as_object() else {
                    errors.push(type_error(path, "object", value));
                    return;
                };
                for (key, field) in object {
                    self.check(values, field, &join(path, key), errors);
                }
            }
            Schema::TaggedUnion { tag, variants } => {
                if !value.is_object() {
                    errors.push(type_error(path, "object", value));
                    return;
                }
                let selected = value
                    .get(*tag)
                    .and_then(Value::as_str)
                    .and_then(|name| variants.iter().find(|(variant, _)| *variant == name));
                match selected {
                    Some((_, variant_schema)) => self.check(variant_schema, value, path, errors),
                    None => errors.push(StructuralError::new(
                        path,
                        Violation::NoUnionMatch {
                            variants: variants.iter().map(|(name, _)| name.to_string()).collect(),
                        },
                    )),
                }
            }
            Schema::Ref(name) => match self.definitions.get(name) {
                Some(definition) => self.check(definition, value, path, errors),
                None => tracing::error!(definition = name, "schema references an undefined definition"),
            },
        }
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn type_error(path: &str, expected: &str, value: &Value) -> StructuralError {
    StructuralError::new(
        path,
        Violation::InvalidType {
            expected: expected.to_string(),
            found: json_type(value).to_string(),
        },
    )
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => json_type(other).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree_schema() -> SchemaSet {
        SchemaSet::new(Schema::Ref("Tree")).define(
            "Tree",
            Schema::Object(vec![
                Property::required("label", Schema::non_empty_string()),
                Property::optional("children", Schema::array(Schema::Ref("Tree"), 0, Some(2))),
            ]),
        )
    }

    #[test]
    fn recursive_reference_follows_the_data() {
        let schema = tree_schema();
        let doc = json!({"label": "a", "children": [{"label": "b", "children": [{"label": ""}]}]});
        let errors = schema.validate(&doc);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "children[0].children[0].label");
        assert!(matches!(errors[0].violation, Violation::StringLength { found: 0, .. }));
    }

    #[test]
    fn violations_are_collected_not_short_circuited() {
        let schema = tree_schema();
        let doc = json!({"children": [{"label": 3}, {}, {"label": "c"}]});
        let errors = schema.validate(&doc);
        let paths: Vec<_> = errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["label", "children", "children[0].label", "children[1].label"]
        );
    }

    #[test]
    fn unknown_tag_reports_no_union_match() {
        let schema = SchemaSet::new(Schema::TaggedUnion {
            tag: "kind",
            variants: vec![("a", Schema::Object(vec![])), ("b", Schema::Object(vec![]))],
        });
        let errors = schema.validate(&json!({"kind": "c"}));
        assert_eq!(
            errors[0].violation,
            Violation::NoUnionMatch {
                variants: vec!["a".to_string(), "b".to_string()]
            }
        );
    }
}
