use super::{simplify, Comparison, Filter, Like};
use indexmap::IndexSet;

/// Dispatches `filter` to the matching `visit_*` method of `visitor`.
pub fn walk_filter<V: FilterVisitor + ?Sized>(visitor: &mut V, filter: &Filter) -> Filter {
    match filter {
        Filter::Include => visitor.visit_include(),
        Filter::Exclude => visitor.visit_exclude(),
        Filter::And(filters) => visitor.visit_and(filters),
        Filter::Or(filters) => visitor.visit_or(filters),
        Filter::Not(inner) => visitor.visit_not(inner),
        Filter::Compare(comparison) => visitor.visit_compare(comparison),
        Filter::Like(like) => visitor.visit_like(like),
        Filter::IsNull(property) => visitor.visit_is_null(property),
    }
}

/// A rewriting walk over a filter tree.
///
/// Every method returns the rewritten node. The defaults duplicate the tree
/// unchanged, so an implementation only overrides the nodes it rewrites.
pub trait FilterVisitor {
    fn visit(&mut self, filter: &Filter) -> Filter {
        walk_filter(self, filter)
    }

    fn visit_include(&mut self) -> Filter {
        Filter::Include
    }

    fn visit_exclude(&mut self) -> Filter {
        Filter::Exclude
    }

    fn visit_and(&mut self, filters: &[Filter]) -> Filter {
        Filter::And(filters.iter().map(|f| self.visit(f)).collect())
    }

    fn visit_or(&mut self, filters: &[Filter]) -> Filter {
        Filter::Or(filters.iter().map(|f| self.visit(f)).collect())
    }

    fn visit_not(&mut self, filter: &Filter) -> Filter {
        Filter::Not(Box::new(self.visit(filter)))
    }

    fn visit_compare(&mut self, comparison: &Comparison) -> Filter {
        Filter::Compare(comparison.clone())
    }

    fn visit_like(&mut self, like: &Like) -> Filter {
        Filter::Like(like.clone())
    }

    fn visit_is_null(&mut self, property: &str) -> Filter {
        Filter::IsNull(property.to_string())
    }
}

/// The outcome of splitting a filter into full-text terms and a residual
/// structural predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct FullTextSplit {
    terms: Vec<String>,
    residual: Filter,
}

impl FullTextSplit {
    /// Wildcard patterns to search for, OR-ed together.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// What still has to be checked against each candidate entity.
    pub fn residual(&self) -> &Filter {
        &self.residual
    }

    #[inline]
    pub fn has_terms(&self) -> bool {
        !self.terms.is_empty()
    }

    /// True when the full-text hits are the complete answer.
    #[inline]
    pub fn is_text_only(&self) -> bool {
        self.has_terms() && self.residual.is_include()
    }
}

/// Extracts the full-text clause of a filter.
///
/// The extractor replaces one `AnyText LIKE` clause (or one OR of such
/// clauses) sitting in a conjunctive position at the top of the tree with
/// `Include` and records its patterns. Hits of the recorded patterns are a
/// superset of the entities accepted by the filter, and the residual filter
/// re-checks everything else, so the split never changes results. Clauses
/// under NOT, mixed ORs and further full-text conjuncts stay in the residual
/// and are evaluated in memory.
pub struct FullTextExtractor {
    terms: IndexSet<String>,
    conjunctive: bool,
    extracted: bool,
}

impl Default for FullTextExtractor {
    fn default() -> Self {
        FullTextExtractor {
            terms: IndexSet::new(),
            conjunctive: true,
            extracted: false,
        }
    }
}

impl FullTextExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits `filter` and simplifies the residual.
    pub fn split(filter: &Filter) -> FullTextSplit {
        let mut extractor = FullTextExtractor::new();
        let rewritten = extractor.visit(filter);
        FullTextSplit {
            terms: extractor.terms.into_iter().collect(),
            residual: simplify(&rewritten),
        }
    }

    /// Returns the patterns of `filter` when it is a text clause: a single
    /// `AnyText` LIKE or an OR made only of them.
    fn text_clause_terms(filter: &Filter) -> Option<Vec<String>> {
        match filter {
            Filter::Like(like) if like.is_full_text() => Some(vec![like.pattern().to_string()]),
            Filter::Or(filters) if !filters.is_empty() => {
                let mut terms = Vec::with_capacity(filters.len());
                for f in filters {
                    terms.extend(Self::text_clause_terms(f)?);
                }
                Some(terms)
            }
            _ => None,
        }
    }

    fn try_extract(&mut self, filter: &Filter) -> bool {
        if self.extracted || !self.conjunctive {
            return false;
        }
        match Self::text_clause_terms(filter) {
            Some(terms) => {
                self.terms.extend(terms);
                self.extracted = true;
                true
            }
            None => false,
        }
    }
}

impl FilterVisitor for FullTextExtractor {
    fn visit(&mut self, filter: &Filter) -> Filter {
        if self.try_extract(filter) {
            return Filter::Include;
        }
        // only the children of a conjunctive AND stay conjunctive
        let conjunctive = self.conjunctive;
        self.conjunctive = conjunctive && matches!(filter, Filter::And(_));
        let rewritten = walk_filter(self, filter);
        self.conjunctive = conjunctive;
        rewritten
    }
}
