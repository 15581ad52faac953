use std::{collections::HashMap, str::FromStr};

/// Flat query-string style mapping, every key may carry several values.
#[derive(Debug, Default, Clone)]
pub struct QueryParams {
    inner: HashMap<String, Vec<String>>,
}

impl QueryParams {
    pub fn new() -> Self {
        let inner = HashMap::new();
        Self { inner }
    }

    pub fn add_param(&mut self, key: &str, value: &str) {
        self.inner
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.inner.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// `None` when absent or not coercible to `T`.
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|value| value.trim().parse().ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)?.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        }
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        iter.into_iter()
            .for_each(|(key, value)| params.add_param(key.as_ref(), value.as_ref()));
        params
    }
}
