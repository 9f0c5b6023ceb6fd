use super::like::compile_like;
use crate::common::Value;
use crate::errors::{CatalogError, CatalogResult, ErrorKind};
use crate::model::CatalogInfo;
use regex::Regex;
use std::fmt::{Display, Formatter};

/// Reserved pseudo-property matching against every textual property of an
/// entity. A LIKE clause on it is delegated to the full-text index whenever
/// one is available.
pub const ANY_TEXT: &str = "AnyText";

/// Comparison operators usable in [`Filter::Compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        }
    }
}

/// A property compared against a literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    property: String,
    op: CompareOp,
    value: Value,
}

impl Comparison {
    pub fn new(property: &str, op: CompareOp, value: Value) -> Self {
        Comparison {
            property: property.to_string(),
            op,
            value,
        }
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn op(&self) -> CompareOp {
        self.op
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    fn matches_value(&self, actual: &Value) -> bool {
        // multi-valued properties match when any element does
        if let Value::Array(values) = actual {
            if !matches!(self.value, Value::Array(_)) {
                return match self.op {
                    CompareOp::Ne => values.iter().all(|v| self.matches_value(v)),
                    _ => values.iter().any(|v| self.matches_value(v)),
                };
            }
        }
        match self.op {
            CompareOp::Eq => actual == &self.value,
            CompareOp::Ne => actual != &self.value,
            _ if actual.is_null() || self.value.is_null() => false,
            CompareOp::Gt => actual > &self.value,
            CompareOp::Gte => actual >= &self.value,
            CompareOp::Lt => actual < &self.value,
            CompareOp::Lte => actual <= &self.value,
        }
    }
}

/// A wildcard pattern match on a property.
#[derive(Debug, Clone)]
pub struct Like {
    property: String,
    pattern: String,
    match_case: bool,
    matcher: Option<Regex>,
}

impl Like {
    pub fn new(property: &str, pattern: &str, match_case: bool) -> Self {
        Like {
            property: property.to_string(),
            pattern: pattern.to_string(),
            match_case,
            matcher: compile_like(pattern, match_case),
        }
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn match_case(&self) -> bool {
        self.match_case
    }

    #[inline]
    pub fn is_full_text(&self) -> bool {
        self.property == ANY_TEXT
    }

    fn matches_value(&self, value: &Value) -> bool {
        let Some(matcher) = &self.matcher else {
            return false;
        };
        match value {
            Value::Array(values) => values.iter().any(|v| self.matches_value(v)),
            other => other
                .to_text()
                .map(|text| matcher.is_match(&text))
                .unwrap_or(false),
        }
    }

    fn matches_any_text(&self, info: &CatalogInfo) -> bool {
        if self.matches_value(&Value::String(info.name().to_string())) {
            return true;
        }
        info.properties()
            .values()
            .filter(|v| !matches!(v, Value::Bool(_) | Value::Null))
            .any(|v| self.matches_value(v))
    }
}

impl PartialEq for Like {
    fn eq(&self, other: &Self) -> bool {
        self.property == other.property
            && self.pattern == other.pattern
            && self.match_case == other.match_case
    }
}

/// A predicate tree over entity properties.
///
/// Filters are plain values: they can be cloned, compared, rewritten by a
/// [`FilterVisitor`](super::FilterVisitor) and evaluated against entities.
///
/// # Examples
///
/// ```rust
/// use geocat::filter::{all, field, full_text_search};
///
/// let filter = field("name").eq("roads").and(full_text_search("tiger"));
/// assert!(!filter.is_include());
/// assert!(all().is_include());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Accepts everything
    Include,
    /// Accepts nothing
    Exclude,
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Compare(Comparison),
    Like(Like),
    IsNull(String),
}

impl Filter {
    /// Combines this filter with another using logical AND.
    pub fn and(self, other: Filter) -> Filter {
        match self {
            Filter::And(mut filters) => {
                filters.push(other);
                Filter::And(filters)
            }
            this => Filter::And(vec![this, other]),
        }
    }

    /// Combines this filter with another using logical OR.
    pub fn or(self, other: Filter) -> Filter {
        match self {
            Filter::Or(mut filters) => {
                filters.push(other);
                Filter::Or(filters)
            }
            this => Filter::Or(vec![this, other]),
        }
    }

    /// Negates this filter.
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Filter {
        Filter::Not(Box::new(self))
    }

    #[inline]
    pub fn is_include(&self) -> bool {
        matches!(self, Filter::Include)
    }

    #[inline]
    pub fn is_exclude(&self) -> bool {
        matches!(self, Filter::Exclude)
    }

    /// Evaluates the filter against an entity.
    pub fn apply(&self, info: &CatalogInfo) -> bool {
        match self {
            Filter::Include => true,
            Filter::Exclude => false,
            Filter::And(filters) => filters.iter().all(|f| f.apply(info)),
            Filter::Or(filters) => filters.iter().any(|f| f.apply(info)),
            Filter::Not(filter) => !filter.apply(info),
            Filter::Compare(comparison) => {
                comparison.matches_value(&info.property(comparison.property()))
            }
            Filter::Like(like) if like.is_full_text() => like.matches_any_text(info),
            Filter::Like(like) => like.matches_value(&info.property(like.property())),
            Filter::IsNull(property) => info.property(property).is_null(),
        }
    }

    /// Whether the tree holds any `AnyText` clause.
    pub fn has_full_text(&self) -> bool {
        match self {
            Filter::And(filters) | Filter::Or(filters) => filters.iter().any(Filter::has_full_text),
            Filter::Not(filter) => filter.has_full_text(),
            Filter::Like(like) => like.is_full_text(),
            _ => false,
        }
    }

    /// Checks that every clause references a well-formed property path.
    pub fn validate(&self) -> CatalogResult<()> {
        fn check(property: &str, filter: &Filter) -> CatalogResult<()> {
            if property.is_empty() || property.split('.').any(str::is_empty) {
                log::error!("Filter {} references a malformed property '{}'", filter, property);
                return Err(CatalogError::new(
                    &format!("Malformed property '{}' in filter {}", property, filter),
                    ErrorKind::IllegalArgument,
                ));
            }
            Ok(())
        }

        match self {
            Filter::Include | Filter::Exclude => Ok(()),
            Filter::And(filters) | Filter::Or(filters) => {
                filters.iter().try_for_each(Filter::validate)
            }
            Filter::Not(filter) => filter.validate(),
            Filter::Compare(comparison) => check(comparison.property(), self),
            Filter::Like(like) => check(like.property(), self),
            Filter::IsNull(property) => check(property, self),
        }
    }
}

impl Display for Filter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        fn join(f: &mut Formatter<'_>, filters: &[Filter], op: &str) -> std::fmt::Result {
            write!(f, "(")?;
            for (i, filter) in filters.iter().enumerate() {
                if i > 0 {
                    write!(f, " {} ", op)?;
                }
                write!(f, "{}", filter)?;
            }
            write!(f, ")")
        }

        match self {
            Filter::Include => write!(f, "INCLUDE"),
            Filter::Exclude => write!(f, "EXCLUDE"),
            Filter::And(filters) => join(f, filters, "&&"),
            Filter::Or(filters) => join(f, filters, "||"),
            Filter::Not(filter) => write!(f, "(not {})", filter),
            Filter::Compare(c) => write!(f, "({} {} {})", c.property, c.op.symbol(), c.value),
            Filter::Like(l) => write!(f, "({} like '{}')", l.property, l.pattern),
            Filter::IsNull(property) => write!(f, "({} is null)", property),
        }
    }
}
