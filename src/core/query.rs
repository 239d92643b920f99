use crate::core::type_map::TypeMapping;
use crate::domain::model::Properties;

/// Selects the descendants of `root` whose `property` equals one of `values`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    root: String,
    property: String,
    values: Vec<String>,
}

impl RecordQuery {
    pub fn new(root: impl Into<String>, property: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            root: root.into(),
            property: property.into(),
            values,
        }
    }

    /// One equality condition per old type in the mapping.
    pub fn for_mapping(root: &str, property: &str, mapping: &TypeMapping) -> Self {
        Self::new(root, property, mapping.old_types().map(str::to_string).collect())
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// An empty disjunction selects nothing.
    pub fn matches_nothing(&self) -> bool {
        self.values.is_empty()
    }

    /// Strict descendants only; the root itself is out of scope.
    pub fn in_scope(&self, path: &str) -> bool {
        let root = self.root.trim_end_matches('/');
        match path.strip_prefix(root) {
            Some(rest) => rest.len() > 1 && rest.starts_with('/'),
            None => false,
        }
    }

    pub fn matches(&self, path: &str, properties: &Properties) -> bool {
        if self.matches_nothing() || !self.in_scope(path) {
            return false;
        }
        properties
            .get(&self.property)
            .and_then(|value| value.as_str())
            .is_some_and(|value| self.values.iter().any(|v| v == value))
    }

    /// JCR-SQL2 rendering, or `None` when the query can match nothing.
    pub fn statement(&self) -> Option<String> {
        if self.matches_nothing() {
            return None;
        }
        let conditions: Vec<String> = self
            .values
            .iter()
            .map(|value| format!("[{}] = '{}'", self.property, value.replace('\'', "''")))
            .collect();
        Some(format!(
            "SELECT * FROM [nt:base] WHERE ISDESCENDANTNODE([{}]) AND ({})",
            self.root,
            conditions.join(" OR ")
        ))
    }
}
