//! Composable predicates over catalog entity properties.
//!
//! Filters are built with the fluent API:
//! - `field("name").eq("roads")` - comparisons
//! - `field("title").like("*roads*")` - wildcard matches
//! - `full_text_search("tiger")` - the reserved `AnyText` clause
//! - `all()` / `none()` - accept everything / nothing
//! - `a.and(b)`, `a.or(b)`, `a.not()` - logical composition
//!
//! A `FilterVisitor` rewrites trees; `FullTextExtractor` uses it to split
//! a filter into full-text terms and a residual structural predicate, and
//! `simplify` collapses the result.

mod filter;
mod fluent;
mod like;
mod simplify;
mod visitor;

pub use filter::*;
pub use fluent::*;
pub use like::{strip_wildcards, wildcard_to_regex};
pub use simplify::simplify;
pub use visitor::*;
