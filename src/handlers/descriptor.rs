//! Handler descriptors and variable sets.

use crate::handlers::registry::HandlerType;
use crate::host::context::QueryString;

/// Ordered mapping from variable name to one or more values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    entries: Vec<(String, Vec<String>)>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value, keeping any values already held for `name`.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    /// Append every query-string pair.
    pub fn extend_from_query(&mut self, query: &QueryString) {
        for (key, value) in query.iter() {
            self.append(key, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    /// First value for `name`; path-derived values come first.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.first()).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Variables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut variables = Variables::new();
        for (k, v) in iter {
            variables.append(k, v);
        }
        variables
    }
}

/// A resolved handler for one request.
#[derive(Debug, Clone)]
pub struct HandlerDescriptor {
    handler_type: HandlerType,
    variables: Variables,
    method: String,
}

impl HandlerDescriptor {
    pub fn new(handler_type: HandlerType, variables: Variables, method: impl Into<String>) -> Self {
        Self {
            handler_type,
            variables,
            method: method.into(),
        }
    }

    pub fn handler_type(&self) -> &HandlerType {
        &self.handler_type
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn variables_mut(&mut self) -> &mut Variables {
        &mut self.variables
    }

    pub fn method(&self) -> &str {
        &self.method
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_values_accumulate_after_path_values() {
        let mut variables: Variables = [("id", "5")].into_iter().collect();
        variables.extend_from_query(&QueryString::parse("id=6&sort=asc&id=7"));

        assert_eq!(variables.get("id"), Some(&["5".to_string(), "6".to_string(), "7".to_string()][..]));
        assert_eq!(variables.first("id"), Some("5"));
        assert_eq!(variables.first("sort"), Some("asc"));
        assert_eq!(variables.len(), 2);
    }

    #[test]
    fn test_iteration_order() {
        let variables: Variables = [("b", "1"), ("a", "2"), ("b", "3")].into_iter().collect();
        let names: Vec<_> = variables.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert!(variables.get("missing").is_none());
    }
}
