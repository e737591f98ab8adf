//! The dynamic value model and the type descriptors that drive signature
//! synthesis.
//!
//! [`Value`] is a closed tagged union over everything the marshaler can
//! decode or encode. Containers make no homogeneity promise: a decoded
//! list or map holds whatever the wire held. Wire types with no mapping
//! in this model decode to the [`Value::Unsupported`] sentinel instead of
//! failing.

/// A dynamically-typed value.
///
/// Maps keep entries in insertion order internally, but order carries no
/// meaning: equality compares maps as key→value sets, and inserting a
/// duplicate key overwrites the earlier entry.
#[derive(Clone, Debug)]
pub enum Value {
    Void,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(Vec<(Value, Value)>),
    /// A wire value with no representation in this model.
    Unsupported,
}

impl Value {
    /// Human-readable kind name, used in diagnostics and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Void => "void",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Unsupported => "unsupported",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        if let Value::Str(s) = self {
            Some(s)
        } else {
            None
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        if let Value::List(items) = self {
            Some(items)
        } else {
            None
        }
    }

    /// Looks up a string-keyed map entry. `None` for non-maps.
    pub fn get(&self, key: &str) -> Option<&Value> {
        if let Value::Map(entries) = self {
            entries
                .iter()
                .find(|(k, _)| k.as_str() == Some(key))
                .map(|(_, v)| v)
        } else {
            None
        }
    }
}

/// Inserts into a map entry list, overwriting any entry whose key is
/// value-equal.
pub fn insert_entry(entries: &mut Vec<(Value, Value)>, key: Value, value: Value) {
    if let Some(slot) = entries.iter_mut().find(|(k, _)| *k == key) {
        slot.1 = value;
    } else {
        entries.push((key, value));
    }
}

fn entry_value<'a>(entries: &'a [(Value, Value)], key: &Value) -> Option<&'a Value> {
    entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) => true,
            (Value::Unsupported, Value::Unsupported) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => {
                // Insertion order is not significant.
                a.len() == b.len() && a.iter().all(|(k, v)| entry_value(b, k) == Some(v))
            }
            _ => false,
        }
    }
}

/// A static type description: what drives signature synthesis when the
/// encoder opens a container.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeDesc {
    Any,
    Void,
    Bool,
    Int,
    Float,
    Str,
    List(Box<TypeDesc>),
    Map(Box<TypeDesc>, Box<TypeDesc>),
    /// Descriptor of the unrepresentable sentinel; has no wire form.
    Opaque,
}

impl TypeDesc {
    /// Derives a descriptor from a value. Element descriptors of empty
    /// containers come out as `Any`.
    pub fn of(value: &Value) -> TypeDesc {
        match value {
            Value::Void => TypeDesc::Void,
            Value::Bool(_) => TypeDesc::Bool,
            Value::Int(_) => TypeDesc::Int,
            Value::Float(_) => TypeDesc::Float,
            Value::Str(_) => TypeDesc::Str,
            Value::List(items) => {
                let elem = items.first().map(TypeDesc::of).unwrap_or(TypeDesc::Any);
                TypeDesc::List(Box::new(elem))
            }
            Value::Map(entries) => {
                let (key, value) = match entries.first() {
                    Some((k, v)) => (TypeDesc::of(k), TypeDesc::of(v)),
                    None => (TypeDesc::Any, TypeDesc::Any),
                };
                TypeDesc::Map(Box::new(key), Box::new(value))
            }
            Value::Unsupported => TypeDesc::Opaque,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TypeDesc::Any => "any",
            TypeDesc::Void => "void",
            TypeDesc::Bool => "boolean",
            TypeDesc::Int => "integer",
            TypeDesc::Float => "float",
            TypeDesc::Str => "string",
            TypeDesc::List(_) => "list",
            TypeDesc::Map(_, _) => "map",
            TypeDesc::Opaque => "unsupported",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{insert_entry, TypeDesc, Value};

    #[test]
    fn map_equality_ignores_order() {
        let a = Value::Map(vec![
            (Value::Str("x".to_owned()), Value::Int(1)),
            (Value::Str("y".to_owned()), Value::Int(2)),
        ]);
        let b = Value::Map(vec![
            (Value::Str("y".to_owned()), Value::Int(2)),
            (Value::Str("x".to_owned()), Value::Int(1)),
        ]);
        assert_eq!(a, b);
    }

    #[test]
    fn map_equality_checks_values() {
        let a = Value::Map(vec![(Value::Str("x".to_owned()), Value::Int(1))]);
        let b = Value::Map(vec![(Value::Str("x".to_owned()), Value::Int(2))]);
        assert_ne!(a, b);
    }

    #[test]
    fn duplicate_key_overwrites() {
        let mut entries = Vec::new();
        insert_entry(&mut entries, Value::Str("k".to_owned()), Value::Int(1));
        insert_entry(&mut entries, Value::Str("k".to_owned()), Value::Int(2));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].1, Value::Int(2));
    }

    #[test]
    fn descriptor_of_empty_containers() {
        assert_eq!(
            TypeDesc::of(&Value::List(vec![])),
            TypeDesc::List(Box::new(TypeDesc::Any))
        );
        assert_eq!(
            TypeDesc::of(&Value::Map(vec![])),
            TypeDesc::Map(Box::new(TypeDesc::Any), Box::new(TypeDesc::Any))
        );
    }

    #[test]
    fn descriptor_of_nested_list() {
        let v = Value::List(vec![Value::List(vec![Value::Str("s".to_owned())])]);
        assert_eq!(
            TypeDesc::of(&v),
            TypeDesc::List(Box::new(TypeDesc::List(Box::new(TypeDesc::Str))))
        );
    }
}
