use super::{CompareOp, Comparison, Filter, Like, ANY_TEXT};
use crate::common::Value;

/// Creates a fluent filter builder for the specified property path.
///
/// # Examples
///
/// ```rust
/// use geocat::filter::field;
///
/// let filter = field("workspace.id").eq("w1").and(field("name").like("road*"));
/// ```
pub fn field(property: &str) -> FluentFilter {
    FluentFilter {
        property: property.to_string(),
    }
}

/// A filter accepting every entity.
pub fn all() -> Filter {
    Filter::Include
}

/// A filter accepting no entity.
pub fn none() -> Filter {
    Filter::Exclude
}

/// A full-text clause using `pattern` verbatim (`*` and `?` wildcards).
pub fn any_text(pattern: &str) -> Filter {
    Filter::Like(Like::new(ANY_TEXT, pattern, false))
}

/// A full-text clause matching `text` anywhere in an entity's textual
/// properties, i.e. `AnyText LIKE '*text*'`.
pub fn full_text_search(text: &str) -> Filter {
    any_text(&format!("*{}*", text))
}

/// Combines several filters with AND; an empty list accepts everything.
pub fn and(filters: Vec<Filter>) -> Filter {
    if filters.is_empty() {
        Filter::Include
    } else {
        Filter::And(filters)
    }
}

/// Combines several filters with OR; an empty list accepts nothing.
pub fn or(filters: Vec<Filter>) -> Filter {
    if filters.is_empty() {
        Filter::Exclude
    } else {
        Filter::Or(filters)
    }
}

/// A fluent builder for filters on one property.
pub struct FluentFilter {
    property: String,
}

impl FluentFilter {
    fn compare<T: Into<Value>>(self, op: CompareOp, value: T) -> Filter {
        Filter::Compare(Comparison::new(&self.property, op, value.into()))
    }

    #[inline]
    pub fn eq<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(CompareOp::Eq, value)
    }

    #[inline]
    pub fn ne<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(CompareOp::Ne, value)
    }

    #[inline]
    pub fn gt<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(CompareOp::Gt, value)
    }

    #[inline]
    pub fn gte<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(CompareOp::Gte, value)
    }

    #[inline]
    pub fn lt<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(CompareOp::Lt, value)
    }

    #[inline]
    pub fn lte<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(CompareOp::Lte, value)
    }

    /// Case-insensitive wildcard match.
    #[inline]
    pub fn like(self, pattern: &str) -> Filter {
        Filter::Like(Like::new(&self.property, pattern, false))
    }

    /// Case-sensitive wildcard match.
    #[inline]
    pub fn like_match_case(self, pattern: &str) -> Filter {
        Filter::Like(Like::new(&self.property, pattern, true))
    }

    #[inline]
    pub fn is_null(self) -> Filter {
        Filter::IsNull(self.property)
    }

    /// Matches when the property equals any of `values`.
    pub fn is_in<T: Into<Value>>(self, values: Vec<T>) -> Filter {
        let property = self.property;
        or(values
            .into_iter()
            .map(|v| Filter::Compare(Comparison::new(&property, CompareOp::Eq, v.into())))
            .collect())
    }
}
