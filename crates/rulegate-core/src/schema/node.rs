//! Typed schema tree.
//!
//! A [`SchemaNode`] is the compiled, read-only form of a schema description.
//! Node paths are not stored; the validator derives them while walking.

use serde_json::Value;

/// One structural constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Object(ObjectSchema),
    Array(ArraySchema),
    String(StringSchema),
    Integer,
    Boolean,
    Null,
    /// A string drawn from a fixed set.
    Enum(Vec<String>),
    /// At least one variant must accept the value.
    OneOf(Vec<SchemaNode>),
    /// No constraint.
    Any,
}

impl SchemaNode {
    pub fn string() -> Self {
        SchemaNode::String(StringSchema::default())
    }

    pub fn non_empty_string() -> Self {
        SchemaNode::String(StringSchema {
            min_length: Some(1),
        })
    }

    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SchemaNode::Enum(values.into_iter().map(Into::into).collect())
    }

    pub fn array(items: SchemaNode) -> Self {
        SchemaNode::Array(ArraySchema {
            items: Box::new(items),
            min_items: None,
        })
    }

    /// Short description of the JSON type this node expects.
    pub fn expected(&self) -> String {
        match self {
            SchemaNode::Object(_) => "object".to_string(),
            SchemaNode::Array(_) => "array".to_string(),
            SchemaNode::String(_) | SchemaNode::Enum(_) => "string".to_string(),
            SchemaNode::Integer => "integer".to_string(),
            SchemaNode::Boolean => "boolean".to_string(),
            SchemaNode::Null => "null".to_string(),
            SchemaNode::OneOf(variants) => variants
                .iter()
                .map(SchemaNode::expected)
                .collect::<Vec<_>>()
                .join(" or "),
            SchemaNode::Any => "any value".to_string(),
        }
    }
}

impl From<ObjectSchema> for SchemaNode {
    fn from(object: ObjectSchema) -> Self {
        SchemaNode::Object(object)
    }
}

/// A named child of an object node.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub node: SchemaNode,
    pub required: bool,
}

/// Extra constraints applied when `property` equals `equals`.
#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    pub property: String,
    pub equals: Value,
    pub then: ObjectSchema,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    /// Declared children, in declaration order.
    pub properties: Vec<Property>,
    /// Keys not declared in `properties` are accepted.
    pub additional_properties: bool,
    pub conditionals: Vec<Conditional>,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: impl Into<String>, node: SchemaNode) -> Self {
        self.properties.push(Property {
            name: name.into(),
            node,
            required: true,
        });
        self
    }

    pub fn optional(mut self, name: impl Into<String>, node: SchemaNode) -> Self {
        self.properties.push(Property {
            name: name.into(),
            node,
            required: false,
        });
        self
    }

    pub fn allow_additional(mut self) -> Self {
        self.additional_properties = true;
        self
    }

    pub fn when(mut self, property: impl Into<String>, equals: Value, then: ObjectSchema) -> Self {
        self.conditionals.push(Conditional {
            property: property.into(),
            equals,
            then,
        });
        self
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArraySchema {
    pub items: Box<SchemaNode>,
    pub min_items: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringSchema {
    /// Minimum length in characters.
    pub min_length: Option<usize>,
}
