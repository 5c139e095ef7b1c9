//! Filter and query options for document fetches.
//!
//! Mirrors the predicate vocabulary of the backing store: field equality,
//! array containment, and membership (`In`). Only what the aggregation layer
//! actually issues is modeled here.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    Eq,
    ArrayContains,
    In,
}

#[derive(Debug, Clone)]
pub struct FieldFilter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl FieldFilter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    pub fn array_contains(field: &str, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            op: FilterOp::ArrayContains,
            value: value.into(),
        }
    }

    pub fn any_of(field: &str, values: Vec<Value>) -> Self {
        Self {
            field: field.to_string(),
            op: FilterOp::In,
            value: Value::Array(values),
        }
    }

    /// Whether a document body satisfies this filter.
    ///
    /// An `In` filter with an empty value list matches everything: the
    /// backend rejects empty-set queries outright, so callers expect the
    /// predicate to be skipped rather than fail the whole fetch.
    pub fn matches(&self, data: &Value) -> bool {
        let field_value = data.get(&self.field);
        match self.op {
            FilterOp::Eq => field_value == Some(&self.value),
            FilterOp::ArrayContains => match field_value {
                Some(Value::Array(items)) => items.contains(&self.value),
                _ => false,
            },
            FilterOp::In => match &self.value {
                Value::Array(candidates) if candidates.is_empty() => true,
                Value::Array(candidates) => {
                    field_value.is_some_and(|v| candidates.contains(v))
                }
                _ => false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

/// Options applied to a collection or sub-collection fetch.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub filters: Vec<FieldFilter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl QueryOptions {
    pub fn filtered(filters: Vec<FieldFilter>) -> Self {
        Self {
            filters,
            ..Default::default()
        }
    }

    pub fn with_order(mut self, field: &str, direction: SortDirection) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            direction,
        });
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, data: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equality_matches_exact_values() {
        let doc = json!({"status": "active", "count": 3});
        assert!(FieldFilter::eq("status", "active").matches(&doc));
        assert!(!FieldFilter::eq("status", "inactive").matches(&doc));
        assert!(!FieldFilter::eq("missing", "active").matches(&doc));
    }

    #[test]
    fn array_contains_checks_membership() {
        let doc = json!({"teacherIds": ["t1", "t2"]});
        assert!(FieldFilter::array_contains("teacherIds", "t1").matches(&doc));
        assert!(!FieldFilter::array_contains("teacherIds", "t9").matches(&doc));
        // Non-array fields never match containment.
        assert!(!FieldFilter::array_contains("teacherIds", "t1").matches(&json!({"teacherIds": "t1"})));
    }

    #[test]
    fn in_filter_with_values_restricts() {
        let doc = json!({"courseId": "c2"});
        let filter = FieldFilter::any_of("courseId", vec![json!("c1"), json!("c2")]);
        assert!(filter.matches(&doc));
        let filter = FieldFilter::any_of("courseId", vec![json!("c1")]);
        assert!(!filter.matches(&doc));
    }

    #[test]
    fn empty_in_filter_is_skipped() {
        let doc = json!({"courseId": "c2"});
        let filter = FieldFilter::any_of("courseId", vec![]);
        assert!(filter.matches(&doc));
    }
}
