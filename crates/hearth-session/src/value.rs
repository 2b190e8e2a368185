//! Values held in the ambient session map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Mapping of keys to session values.
pub type SessionMap = BTreeMap<String, SessionValue>;

/// A session value: a scalar, a sequence, or a nested mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<SessionValue>),
    Map(SessionMap),
}

impl SessionValue {
    /// Whether this value or anything nested in it is a NaN or infinite float.
    pub fn has_non_finite_float(&self) -> bool {
        match self {
            Self::Float(n) => !n.is_finite(),
            Self::List(items) => items.iter().any(Self::has_non_finite_float),
            Self::Map(map) => map.values().any(Self::has_non_finite_float),
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            Self::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[SessionValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&SessionMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<bool> for SessionValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for SessionValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for SessionValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for SessionValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for SessionValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for SessionValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<SessionValue>> for SessionValue {
    fn from(v: Vec<SessionValue>) -> Self {
        Self::List(v)
    }
}

impl From<SessionMap> for SessionValue {
    fn from(v: SessionMap) -> Self {
        Self::Map(v)
    }
}

impl<T: Into<SessionValue>> From<Option<T>> for SessionValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let mut inner = SessionMap::new();
        inner.insert("theme".into(), "dark".into());
        let value = SessionValue::List(vec![
            SessionValue::Null,
            true.into(),
            42i64.into(),
            1.5f64.into(),
            inner.into(),
        ]);

        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"[null,true,42,1.5,{"theme":"dark"}]"#);
    }

    #[test]
    fn test_integers_stay_integers() {
        let value: SessionValue = serde_json::from_str("7").unwrap();
        assert_eq!(value, SessionValue::Int(7));

        let value: SessionValue = serde_json::from_str("7.0").unwrap();
        assert_eq!(value, SessionValue::Float(7.0));
    }

    #[test]
    fn test_nested_decode() {
        let value: SessionValue =
            serde_json::from_str(r#"{"cart":{"items":[1,2],"coupon":null}}"#).unwrap();
        let cart = value.as_map().unwrap()["cart"].as_map().unwrap();
        assert_eq!(cart["items"].as_list().unwrap().len(), 2);
        assert!(cart["coupon"].is_null());
    }

    #[test]
    fn test_has_non_finite_float() {
        assert!(SessionValue::Float(f64::NAN).has_non_finite_float());
        assert!(SessionValue::Float(f64::NEG_INFINITY).has_non_finite_float());
        assert!(!SessionValue::Float(1.5).has_non_finite_float());
        assert!(!SessionValue::from("NaN").has_non_finite_float());

        let mut map = SessionMap::new();
        map.insert("x".into(), SessionValue::List(vec![f64::INFINITY.into()]));
        assert!(SessionValue::Map(map).has_non_finite_float());
    }

    #[test]
    fn test_accessors() {
        assert_eq!(SessionValue::from("x").as_str(), Some("x"));
        assert_eq!(SessionValue::from(3i64).as_f64(), Some(3.0));
        assert_eq!(SessionValue::from(false).as_bool(), Some(false));
        assert_eq!(SessionValue::from(None::<i64>), SessionValue::Null);
        assert_eq!(SessionValue::from("x").as_i64(), None);
    }
}
