use super::Filter;

/// Collapses trivially true or false clauses and flattens nested AND/OR.
///
/// `Include` drops out of conjunctions and short-circuits disjunctions,
/// `Exclude` the other way round; empty and single-child groups collapse and
/// double negations cancel.
pub fn simplify(filter: &Filter) -> Filter {
    match filter {
        Filter::And(filters) => {
            let mut children = Vec::with_capacity(filters.len());
            for child in filters.iter().map(simplify) {
                match child {
                    Filter::Include => {}
                    Filter::Exclude => return Filter::Exclude,
                    Filter::And(nested) => children.extend(nested),
                    other => children.push(other),
                }
            }
            collapse(children, Filter::Include, Filter::And)
        }
        Filter::Or(filters) => {
            let mut children = Vec::with_capacity(filters.len());
            for child in filters.iter().map(simplify) {
                match child {
                    Filter::Exclude => {}
                    Filter::Include => return Filter::Include,
                    Filter::Or(nested) => children.extend(nested),
                    other => children.push(other),
                }
            }
            collapse(children, Filter::Exclude, Filter::Or)
        }
        Filter::Not(inner) => match simplify(inner) {
            Filter::Include => Filter::Exclude,
            Filter::Exclude => Filter::Include,
            Filter::Not(double) => *double,
            other => Filter::Not(Box::new(other)),
        },
        other => other.clone(),
    }
}

fn collapse(mut children: Vec<Filter>, empty: Filter, group: fn(Vec<Filter>) -> Filter) -> Filter {
    match children.len() {
        0 => empty,
        1 => children.remove(0),
        _ => group(children),
    }
}
