//! Queries mixing full-text clauses with structural predicates.

use geocat::common::SortOrder;
use geocat::errors::CatalogResult;
use geocat::filter::{field, full_text_search};
use geocat::manager::{order_by, CatalogInfoLookupManager, Query};
use geocat::model::{BaseType, CatalogInfo, InfoKind, InfoType};
use geocat_int_test::test_util::{cleanup, create_fts_test_context, run_test};
use std::sync::Arc;

/// Ten feature types `ft0..ft9`: even ones about roads, odd ones about
/// rivers, each with its index as `rank`.
fn populate(manager: &CatalogInfoLookupManager) -> CatalogResult<Vec<Arc<CatalogInfo>>> {
    let ws = manager.add(CatalogInfo::builder(InfoKind::Workspace, "topp").build())?;
    let ns = manager.add(CatalogInfo::builder(InfoKind::Namespace, "topp").build())?;
    let store = manager.add(
        CatalogInfo::builder(InfoKind::DataStore, "shapes")
            .workspace(ws.id())
            .build(),
    )?;

    let mut resources = Vec::new();
    for i in 0..10 {
        let title = if i % 2 == 0 { "Main roads" } else { "Major rivers" };
        resources.push(manager.add(
            CatalogInfo::builder(InfoKind::FeatureType, &format!("ft{}", i))
                .namespace(ns.id())
                .store(store.id())
                .property("title", title)
                .property("rank", i)
                .build(),
        )?);
    }
    manager.commit()?;
    Ok(resources)
}

fn names(infos: &[Arc<CatalogInfo>]) -> Vec<String> {
    infos.iter().map(|info| info.name().to_string()).collect()
}

#[test]
fn test_text_with_structural_residual() {
    run_test(
        || create_fts_test_context(),
        |ctx| {
            let manager = ctx.manager();
            populate(&manager)?;

            let filter = full_text_search("roads").and(field("rank").gte(4));
            let found = manager.list(InfoType::Any, &filter, &order_by("name", SortOrder::Ascending))?;
            assert_eq!(names(&found), vec!["ft4", "ft6", "ft8"]);
            assert_eq!(manager.count(InfoType::Any, &filter)?, 3);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_pure_text_query_is_sorted_and_paged_by_the_index() {
    run_test(
        || create_fts_test_context(),
        |ctx| {
            let manager = ctx.manager();
            populate(&manager)?;

            let query = order_by("name", SortOrder::Ascending).offset(1).limit(2);
            let page = manager.list(BaseType::Resource.into(), &full_text_search("roads"), &query)?;
            assert_eq!(names(&page), vec!["ft2", "ft4"]);

            let query = order_by("name", SortOrder::Descending).limit(3);
            let page = manager.list(BaseType::Resource.into(), &full_text_search("rivers"), &query)?;
            assert_eq!(names(&page), vec!["ft9", "ft7", "ft5"]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_hybrid_query_pages_after_filtering() {
    run_test(
        || create_fts_test_context(),
        |ctx| {
            let manager = ctx.manager();
            populate(&manager)?;

            let filter = full_text_search("roads").and(field("rank").gte(4));
            let query = order_by("name", SortOrder::Descending).limit(2);
            let page = manager.list(InfoType::Any, &filter, &query)?;
            assert_eq!(names(&page), vec!["ft8", "ft6"]);

            let skipped = manager.list(InfoType::Any, &filter, &Query::new().offset(2))?;
            assert_eq!(skipped.len(), 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_unsortable_property_is_sorted_in_memory() {
    run_test(
        || create_fts_test_context(),
        |ctx| {
            let manager = ctx.manager();
            populate(&manager)?;

            let query = order_by("rank", SortOrder::Descending).offset(1).limit(2);
            let page = manager.list(InfoType::Any, &full_text_search("rivers"), &query)?;
            assert_eq!(names(&page), vec!["ft7", "ft5"]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_disjunction_with_text_is_evaluated_in_memory() {
    run_test(
        || create_fts_test_context(),
        |ctx| {
            let manager = ctx.manager();
            populate(&manager)?;

            let filter = full_text_search("rivers").or(field("name").eq("ft0"));
            let found = manager.list(
                BaseType::Resource.into(),
                &filter,
                &order_by("rank", SortOrder::Ascending),
            )?;
            assert_eq!(names(&found), vec!["ft0", "ft1", "ft3", "ft5", "ft7", "ft9"]);
            assert_eq!(manager.count(BaseType::Resource.into(), &filter)?, 6);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_published_text_search_spans_layers_and_groups() {
    run_test(
        || create_fts_test_context(),
        |ctx| {
            let manager = ctx.manager();
            let resources = populate(&manager)?;
            let ns = resources[0].namespace().cloned().unwrap();
            for resource in resources.iter().take(4) {
                manager.add(
                    CatalogInfo::builder(InfoKind::Layer, resource.name())
                        .namespace(&ns)
                        .resource(resource.id())
                        .property("title", resource.property("title"))
                        .build(),
                )?;
            }
            let ws = manager
                .find_first(BaseType::Workspace.into(), &field("name").eq("topp"))?
                .unwrap();
            manager.add(
                CatalogInfo::builder(InfoKind::LayerGroup, "overview")
                    .workspace(ws.id())
                    .property("title", "Roads overview")
                    .build(),
            )?;
            manager.commit()?;

            let found = manager.list(
                InfoType::Published,
                &full_text_search("roads"),
                &order_by("name", SortOrder::Ascending),
            )?;
            assert_eq!(names(&found), vec!["ft0", "ft2", "overview"]);
            assert!(found
                .iter()
                .all(|info| matches!(info.base_type(), BaseType::Layer | BaseType::LayerGroup)));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_index_and_memory_agree() {
    run_test(
        || create_fts_test_context(),
        |ctx| {
            let manager = ctx.manager();
            populate(&manager)?;

            let query = order_by("name", SortOrder::Descending);
            let from_index = manager.list(InfoType::Any, &full_text_search("roads"), &query)?;
            let from_memory = manager.list(InfoType::Any, &field("title").like("*roads*"), &query)?;
            assert_eq!(names(&from_index), names(&from_memory));
            assert_eq!(from_index.len(), 5);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_unbounded_limit_on_pure_text_query() {
    run_test(
        || create_fts_test_context(),
        |ctx| {
            let manager = ctx.manager();
            populate(&manager)?;

            let query = Query::new().offset(1).limit(usize::MAX - 1);
            let page = manager.list(InfoType::Any, &full_text_search("roads"), &query)?;
            assert_eq!(page.len(), 4);
            assert_eq!(manager.count(InfoType::Any, &full_text_search("roads"))?, 5);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
