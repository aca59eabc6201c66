use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

// Fields written into every proxied JSON object
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    fields: Vec<(String, Value)>,
}

impl Transform {
    pub fn new<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Insert every configured field, overwriting what upstream sent.
    pub fn apply(&self, data: &mut Map<String, Value>) {
        for (key, value) in &self.fields {
            data.insert(key.clone(), value.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new([("foo", "bar")])
    }
}

// One "key=value" pair from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub key: String,
    pub value: String,
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", s))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("empty key in `{}`", s));
        }
        Ok(Field {
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}
