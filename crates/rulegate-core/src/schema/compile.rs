//! Compile a JSON Schema description into a [`SchemaNode`] tree.
//!
//! Supported keywords: `type` (string or list), `properties`, `required`,
//! `additionalProperties` (boolean or schema), `items`, `minItems`,
//! `minLength`, `enum` (strings), `oneOf`, `$ref` into `#/$defs/` or
//! `#/definitions/`, and `if`/`then` (directly or inside `allOf`) whose `if`
//! tests a single property against a `const`.
//!
//! Unlike JSON Schema, an object without `additionalProperties` rejects
//! undeclared keys. Conditional `then` blocks accept them, since they only
//! add to the enclosing object.

use serde_json::{Map, Value};

use crate::error::{SchemaError, SchemaResult};
use crate::schema::node::{ArraySchema, Conditional, ObjectSchema, SchemaNode, StringSchema};

/// Compile a description whose root is the document schema.
pub fn compile(description: &Value) -> SchemaResult<SchemaNode> {
    Compiler {
        root: description,
        resolving: Vec::new(),
    }
    .node(description, "#")
}

/// Parse and compile description text.
pub fn compile_str(description: &str) -> SchemaResult<SchemaNode> {
    let value: Value = serde_json::from_str(description)?;
    compile(&value)
}

struct Compiler<'a> {
    root: &'a Value,
    /// `$ref` targets currently being compiled, for cycle detection.
    resolving: Vec<String>,
}

fn invalid(pointer: &str, keyword: &str, reason: &str) -> SchemaError {
    SchemaError::InvalidKeyword {
        pointer: pointer.to_string(),
        keyword: keyword.to_string(),
        reason: reason.to_string(),
    }
}

impl<'a> Compiler<'a> {
    fn node(&mut self, schema: &'a Value, pointer: &str) -> SchemaResult<SchemaNode> {
        let obj = schema.as_object().ok_or_else(|| SchemaError::NotAnObject {
            pointer: pointer.to_string(),
        })?;

        if let Some(reference) = obj.get("$ref") {
            let reference = reference
                .as_str()
                .ok_or_else(|| invalid(pointer, "$ref", "must be a string"))?;
            return self.reference(reference, pointer);
        }

        if let Some(variants) = obj.get("oneOf") {
            let variants = variants
                .as_array()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| invalid(pointer, "oneOf", "must be a non-empty array"))?;
            let nodes = variants
                .iter()
                .enumerate()
                .map(|(i, v)| self.node(v, &format!("{pointer}/oneOf/{i}")))
                .collect::<SchemaResult<Vec<_>>>()?;
            return Ok(SchemaNode::OneOf(nodes));
        }

        if let Some(values) = obj.get("enum") {
            return enumeration(values, pointer);
        }

        match obj.get("type") {
            Some(Value::String(type_name)) => self.typed(type_name, obj, pointer),
            Some(Value::Array(types)) => {
                let mut nodes = types
                    .iter()
                    .map(|t| {
                        let name = t
                            .as_str()
                            .ok_or_else(|| invalid(pointer, "type", "entries must be strings"))?;
                        self.typed(name, obj, pointer)
                    })
                    .collect::<SchemaResult<Vec<_>>>()?;
                match nodes.len() {
                    0 => Err(invalid(pointer, "type", "must not be empty")),
                    1 => Ok(nodes.remove(0)),
                    _ => Ok(SchemaNode::OneOf(nodes)),
                }
            }
            Some(_) => Err(invalid(pointer, "type", "must be a string or an array")),
            None if obj.contains_key("properties") || obj.contains_key("required") => {
                self.object(obj, pointer, false).map(SchemaNode::Object)
            }
            None => Ok(SchemaNode::Any),
        }
    }

    fn typed(
        &mut self,
        type_name: &str,
        obj: &'a Map<String, Value>,
        pointer: &str,
    ) -> SchemaResult<SchemaNode> {
        match type_name {
            "object" => self.object(obj, pointer, false).map(SchemaNode::Object),
            "array" => {
                let items = match obj.get("items") {
                    Some(items) => self.node(items, &format!("{pointer}/items"))?,
                    None => SchemaNode::Any,
                };
                Ok(SchemaNode::Array(ArraySchema {
                    items: Box::new(items),
                    min_items: count(obj, "minItems", pointer)?,
                }))
            }
            "string" => Ok(SchemaNode::String(StringSchema {
                min_length: count(obj, "minLength", pointer)?,
            })),
            "integer" => Ok(SchemaNode::Integer),
            "boolean" => Ok(SchemaNode::Boolean),
            "null" => Ok(SchemaNode::Null),
            other => Err(SchemaError::UnsupportedType {
                pointer: pointer.to_string(),
                type_name: other.to_string(),
            }),
        }
    }

    fn object(
        &mut self,
        obj: &'a Map<String, Value>,
        pointer: &str,
        overlay: bool,
    ) -> SchemaResult<ObjectSchema> {
        let mut object = ObjectSchema::new();

        if let Some(properties) = obj.get("properties") {
            let properties = properties
                .as_object()
                .ok_or_else(|| invalid(pointer, "properties", "must be an object"))?;
            for (name, sub) in properties {
                let node = self.node(sub, &format!("{pointer}/properties/{name}"))?;
                object = object.optional(name.clone(), node);
            }
        }

        if let Some(required) = obj.get("required") {
            let required = required
                .as_array()
                .ok_or_else(|| invalid(pointer, "required", "must be an array"))?;
            for name in required {
                let name = name
                    .as_str()
                    .ok_or_else(|| invalid(pointer, "required", "entries must be strings"))?;
                match object.properties.iter_mut().find(|p| p.name == name) {
                    Some(property) => property.required = true,
                    None => object = object.required(name, SchemaNode::Any),
                }
            }
        }

        object.additional_properties = match obj.get("additionalProperties") {
            None => overlay,
            Some(Value::Bool(allowed)) => *allowed,
            Some(Value::Object(_)) => true,
            Some(_) => {
                return Err(invalid(
                    pointer,
                    "additionalProperties",
                    "must be a boolean or a schema",
                ))
            }
        };

        if let (Some(if_schema), Some(then_schema)) = (obj.get("if"), obj.get("then")) {
            let conditional = self.conditional(if_schema, then_schema, pointer)?;
            object.conditionals.push(conditional);
        }

        if let Some(all_of) = obj.get("allOf") {
            let entries = all_of
                .as_array()
                .ok_or_else(|| invalid(pointer, "allOf", "must be an array"))?;
            for (i, entry) in entries.iter().enumerate() {
                let entry_pointer = format!("{pointer}/allOf/{i}");
                match (entry.get("if"), entry.get("then")) {
                    (Some(if_schema), Some(then_schema)) => {
                        let conditional = self.conditional(if_schema, then_schema, &entry_pointer)?;
                        object.conditionals.push(conditional);
                    }
                    _ => {
                        return Err(invalid(
                            &entry_pointer,
                            "allOf",
                            "only if/then entries are supported",
                        ))
                    }
                }
            }
        }

        Ok(object)
    }

    fn conditional(
        &mut self,
        if_schema: &'a Value,
        then_schema: &'a Value,
        pointer: &str,
    ) -> SchemaResult<Conditional> {
        let tested = if_schema
            .get("properties")
            .and_then(Value::as_object)
            .filter(|props| props.len() == 1)
            .ok_or_else(|| invalid(pointer, "if", "must test exactly one property"))?;
        let (property, test) = tested
            .iter()
            .next()
            .ok_or_else(|| invalid(pointer, "if", "must test exactly one property"))?;
        let equals = test
            .get("const")
            .cloned()
            .ok_or_else(|| invalid(pointer, "if", "property test must use 'const'"))?;

        let then_pointer = format!("{pointer}/then");
        let then_obj = then_schema
            .as_object()
            .ok_or_else(|| SchemaError::NotAnObject {
                pointer: then_pointer.clone(),
            })?;
        let then = self.object(then_obj, &then_pointer, true)?;

        Ok(Conditional {
            property: property.clone(),
            equals,
            then,
        })
    }

    fn reference(&mut self, reference: &str, pointer: &str) -> SchemaResult<SchemaNode> {
        let unresolved = || SchemaError::UnresolvedRef {
            pointer: pointer.to_string(),
            reference: reference.to_string(),
        };

        let (section, name) = if let Some(name) = reference.strip_prefix("#/$defs/") {
            ("$defs", name)
        } else if let Some(name) = reference.strip_prefix("#/definitions/") {
            ("definitions", name)
        } else {
            return Err(unresolved());
        };

        let root = self.root;
        let target = root
            .get(section)
            .and_then(|defs| defs.get(name))
            .ok_or_else(unresolved)?;

        if self.resolving.iter().any(|r| r == reference) {
            return Err(SchemaError::RecursiveRef {
                pointer: pointer.to_string(),
                reference: reference.to_string(),
            });
        }

        self.resolving.push(reference.to_string());
        let node = self.node(target, reference);
        self.resolving.pop();
        node
    }
}

fn enumeration(values: &Value, pointer: &str) -> SchemaResult<SchemaNode> {
    let values = values
        .as_array()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| invalid(pointer, "enum", "must be a non-empty array"))?;
    let values = values
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid(pointer, "enum", "only string values are supported"))
        })
        .collect::<SchemaResult<Vec<_>>>()?;
    Ok(SchemaNode::Enum(values))
}

fn count(obj: &Map<String, Value>, keyword: &str, pointer: &str) -> SchemaResult<Option<usize>> {
    match obj.get(keyword) {
        None => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| invalid(pointer, keyword, "must be a non-negative integer")),
    }
}
