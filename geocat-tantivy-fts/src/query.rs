//! Translation of text queries into tantivy queries.

use geocat::errors::CatalogResult;
use geocat::filter::wildcard_to_regex;
use geocat::fulltext::TextQuery;
use geocat::model::InfoType;
use tantivy::query::{AllQuery, BooleanQuery, Occur, Query, RegexQuery, TermQuery};
use tantivy::schema::IndexRecordOption;
use tantivy::Term;

use crate::document::IndexFields;
use crate::fts_error;

/// `type ∈ {..} AND (term₁ OR term₂ ..)`.
///
/// The type clause is dropped for [`InfoType::Any`] and the term clause for
/// an empty term list. Terms are lowercased wildcard patterns matched
/// against single tokens of the full-text field.
pub(crate) fn build_query(query: &TextQuery, fields: &IndexFields) -> CatalogResult<Box<dyn Query>> {
    let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();

    if let Some(types) = type_clause(query.info_type(), fields) {
        clauses.push((Occur::Must, types));
    }

    if !query.terms().is_empty() {
        let mut terms: Vec<(Occur, Box<dyn Query>)> = Vec::with_capacity(query.terms().len());
        for term in query.terms() {
            let pattern = wildcard_to_regex(&term.to_lowercase());
            let regex = RegexQuery::from_pattern(&pattern, fields.full_text)
                .map_err(|e| fts_error(&format!("Invalid search term {}", term), e))?;
            terms.push((Occur::Should, Box::new(regex)));
        }
        clauses.push((Occur::Must, Box::new(BooleanQuery::new(terms))));
    }

    if clauses.is_empty() {
        return Ok(Box::new(AllQuery));
    }
    Ok(Box::new(BooleanQuery::new(clauses)))
}

fn type_clause(info_type: InfoType, fields: &IndexFields) -> Option<Box<dyn Query>> {
    if info_type == InfoType::Any {
        return None;
    }
    let kinds: Vec<(Occur, Box<dyn Query>)> = info_type
        .kinds()
        .into_iter()
        .map(|kind| {
            let term = Term::from_field_text(fields.types, kind.type_name());
            let query: Box<dyn Query> = Box::new(TermQuery::new(term, IndexRecordOption::Basic));
            (Occur::Should, query)
        })
        .collect();
    Some(Box::new(BooleanQuery::new(kinds)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DocumentMapping;
    use crate::document::{build_schema, to_document};
    use geocat::model::{BaseType, CatalogInfo, InfoKind};
    use tantivy::collector::Count;
    use tantivy::{Index, IndexWriter};

    fn index_with(infos: &[CatalogInfo]) -> (Index, IndexFields) {
        let mapping = DocumentMapping::new();
        let (schema, fields) = build_schema(&mapping);
        let index = Index::create_in_ram(schema);
        let mut writer: IndexWriter = index.writer(15_000_000).unwrap();
        for info in infos {
            writer.add_document(to_document(info, &fields, &mapping)).unwrap();
        }
        writer.commit().unwrap();
        (index, fields)
    }

    fn count(index: &Index, fields: &IndexFields, query: TextQuery) -> usize {
        let searcher = index.reader().unwrap().searcher();
        let query = build_query(&query, fields).unwrap();
        searcher.search(&*query, &Count).unwrap()
    }

    fn terms(terms: &[&str]) -> Vec<String> {
        terms.iter().map(|t| t.to_string()).collect()
    }

    fn catalog() -> Vec<CatalogInfo> {
        vec![
            CatalogInfo::builder(InfoKind::FeatureType, "roads")
                .property("title", "Main Roads")
                .build(),
            CatalogInfo::builder(InfoKind::Coverage, "dem")
                .property("abstract", "Elevation model of the roads network")
                .build(),
            CatalogInfo::builder(InfoKind::Layer, "rivers").build(),
        ]
    }

    #[test]
    fn test_terms_are_case_insensitive_wildcards() {
        let (index, fields) = index_with(&catalog());
        assert_eq!(count(&index, &fields, TextQuery::new(InfoType::Any, terms(&["*ROAD*"]))), 2);
        assert_eq!(count(&index, &fields, TextQuery::new(InfoType::Any, terms(&["riv?rs"]))), 1);
        assert_eq!(count(&index, &fields, TextQuery::new(InfoType::Any, terms(&["lakes"]))), 0);
    }

    #[test]
    fn test_terms_are_or_ed() {
        let (index, fields) = index_with(&catalog());
        let query = TextQuery::new(InfoType::Any, terms(&["rivers", "elevation"]));
        assert_eq!(count(&index, &fields, query), 2);
    }

    #[test]
    fn test_type_clause_restricts_kinds() {
        let (index, fields) = index_with(&catalog());
        let roads = terms(&["*road*"]);
        assert_eq!(
            count(&index, &fields, TextQuery::new(InfoKind::FeatureType.into(), roads.clone())),
            1
        );
        assert_eq!(
            count(&index, &fields, TextQuery::new(BaseType::Resource.into(), roads.clone())),
            2
        );
        assert_eq!(count(&index, &fields, TextQuery::new(InfoType::Published, roads)), 0);
    }

    #[test]
    fn test_no_terms_matches_the_whole_type() {
        let (index, fields) = index_with(&catalog());
        assert_eq!(count(&index, &fields, TextQuery::new(BaseType::Resource.into(), vec![])), 2);
        assert_eq!(count(&index, &fields, TextQuery::new(InfoType::Any, vec![])), 3);
    }
}
