use std::fmt;

use serde_json::Value;

pub struct ContextValue(ContextValueInner);

enum ContextValueInner {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Debug(Box<dyn fmt::Debug + Send + Sync + 'static>),
    Display(Box<dyn fmt::Display + Send + Sync + 'static>),
    Error(Box<dyn std::error::Error + Send + Sync + 'static>),
    Serde(Box<dyn erased_serde::Serialize + Send + Sync + 'static>),
}

impl From<ContextValueInner> for ContextValue {
    fn from(inner: ContextValueInner) -> Self {
        ContextValue(inner)
    }
}

impl ContextValue {
    #[must_use]
    pub fn null() -> Self {
        ContextValueInner::Null.into()
    }

    pub fn serde<S>(value: S) -> Self
    where
        S: serde::Serialize + Send + Sync + 'static,
    {
        let value = Box::new(value);
        ContextValueInner::Serde(value).into()
    }

    pub fn display<T>(value: T) -> Self
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        let value = Box::new(value);
        ContextValueInner::Display(value).into()
    }

    pub fn debug<T>(value: T) -> Self
    where
        T: fmt::Debug + Send + Sync + 'static,
    {
        let value = Box::new(value);
        ContextValueInner::Debug(value).into()
    }

    pub fn error<T>(value: T) -> Self
    where
        T: std::error::Error + Send + Sync + 'static,
    {
        let value = Box::new(value);
        ContextValueInner::Error(value).into()
    }

    /// Renders the value into the JSON model used by records.
    ///
    /// Values that cannot be serialized degrade to `null` rather than failing
    /// the surrounding log call.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match &self.0 {
            ContextValueInner::Null => Value::Null,
            ContextValueInner::Bool(value) => Value::Bool(*value),
            ContextValueInner::Integer(value) => Value::from(*value),
            ContextValueInner::Float(value) => Value::from(*value),
            ContextValueInner::String(value) => Value::String(value.clone()),
            ContextValueInner::Debug(value) => Value::String(format!("{value:?}")),
            ContextValueInner::Display(value) => Value::String(value.to_string()),
            ContextValueInner::Error(value) => Value::String(value.to_string()),
            ContextValueInner::Serde(value) => {
                serde_json::to_value(&**value).unwrap_or(Value::Null)
            }
        }
    }
}

impl fmt::Debug for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            ContextValueInner::Null => f.write_str("Null"),
            ContextValueInner::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
            ContextValueInner::Integer(value) => f.debug_tuple("Integer").field(value).finish(),
            ContextValueInner::Float(value) => f.debug_tuple("Float").field(value).finish(),
            ContextValueInner::String(value) => f.debug_tuple("String").field(value).finish(),
            ContextValueInner::Debug(value) => f.debug_tuple("Debug").field(value).finish(),
            ContextValueInner::Display(_) => f.write_str("Display(..)"),
            ContextValueInner::Error(value) => f.debug_tuple("Error").field(value).finish(),
            ContextValueInner::Serde(_) => f.write_str("Serde(..)"),
        }
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue(ContextValueInner::String(value.to_owned()))
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue(ContextValueInner::String(value))
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        ContextValue(ContextValueInner::Bool(value))
    }
}

impl From<f64> for ContextValue {
    fn from(value: f64) -> Self {
        ContextValue(ContextValueInner::Float(value))
    }
}

impl From<Value> for ContextValue {
    fn from(value: Value) -> Self {
        ContextValue(ContextValueInner::Serde(Box::new(value)))
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ContextValue {
                fn from(value: $ty) -> Self {
                    ContextValue(ContextValueInner::Integer(i64::from(value)))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    use super::ContextValue;

    #[test]
    fn scalar_conversions() {
        assert_eq!(ContextValue::from(42).to_json(), json!(42));
        assert_eq!(ContextValue::from(true).to_json(), json!(true));
        assert_eq!(ContextValue::from("abc").to_json(), json!("abc"));
        assert_eq!(ContextValue::null().to_json(), Value::Null);
    }

    #[test]
    fn display_and_error_render_as_strings() {
        let err = std::io::Error::other("boom");
        assert_eq!(ContextValue::error(err).to_json(), json!("boom"));
        assert_eq!(ContextValue::display('x').to_json(), json!("x"));
    }

    #[test]
    fn serde_values_keep_structure() {
        let value = ContextValue::serde(json!({"a": [1, 2]}));
        assert_eq!(value.to_json(), json!({"a": [1, 2]}));
    }
}
