use serde::{Deserialize, Serialize};

/// A JSON reference object, serialized as `{ "$ref": "#/components/..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "$ref")]
    pub path: String,
}

/// Either a reference to a reusable component or an inline value.
///
/// Exactly one of the two is present by construction, which is what the
/// OpenAPI `Reference Object | T` union requires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ref<T> {
    Ref(Reference),
    Value(T),
}

impl<T> Ref<T> {
    /// Reference an arbitrary JSON pointer.
    pub fn reference(path: impl Into<String>) -> Self {
        Ref::Ref(Reference { path: path.into() })
    }

    /// Reference a named entry of `components`, e.g. `component("schemas", "Pet")`.
    pub fn component(section: &str, name: &str) -> Self {
        Self::reference(format!("#/components/{section}/{name}"))
    }

    pub fn is_ref(&self) -> bool {
        matches!(self, Ref::Ref(_))
    }

    pub fn ref_path(&self) -> Option<&str> {
        match self {
            Ref::Ref(r) => Some(&r.path),
            Ref::Value(_) => None,
        }
    }

    /// The component name at the end of the reference path.
    pub fn ref_name(&self) -> Option<&str> {
        self.ref_path().and_then(|p| p.rsplit('/').next())
    }

    pub fn as_value(&self) -> Option<&T> {
        match self {
            Ref::Value(v) => Some(v),
            Ref::Ref(_) => None,
        }
    }

    pub fn as_value_mut(&mut self) -> Option<&mut T> {
        match self {
            Ref::Value(v) => Some(v),
            Ref::Ref(_) => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Ref::Value(v) => Some(v),
            Ref::Ref(_) => None,
        }
    }
}

impl<T> From<T> for Ref<T> {
    fn from(value: T) -> Self {
        Ref::Value(value)
    }
}
