//! Integration tests for the full-text mirror behind the lookup manager.

use geocat::errors::ErrorKind;
use geocat::filter::{all, full_text_search};
use geocat::fulltext::{FullTextSearch, TextQuery};
use geocat::manager::Query;
use geocat::model::{BaseType, CatalogInfo, InfoId, InfoKind, InfoType};
use geocat_int_test::test_util::{cleanup, create_fts_test_context, run_test};

fn terms(terms: &[&str]) -> Vec<String> {
    terms.iter().map(|t| t.to_string()).collect()
}

// ===== Lifecycle Tests =====

#[test]
fn test_open_and_close_are_idempotent() {
    run_test(
        || create_fts_test_context(),
        |ctx| {
            let index = ctx.index()?;
            index.open()?;
            index.open()?;
            assert!(index.is_open());

            index.close()?;
            index.close()?;
            assert!(!index.is_open());

            index.open()?;
            assert!(index.is_open());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_closed_index_is_not_running() {
    run_test(
        || create_fts_test_context(),
        |ctx| {
            let index = ctx.index()?;
            index.close()?;

            let info = CatalogInfo::builder(InfoKind::Workspace, "topp").build();
            for err in [
                index.add(&info).unwrap_err(),
                index.remove(&info).unwrap_err(),
                index.commit().unwrap_err(),
                index.count(&TextQuery::new(InfoType::Any, vec![])).unwrap_err(),
            ] {
                assert_eq!(err.kind(), &ErrorKind::IndexNotRunning);
            }
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

// ===== Search Tests =====

#[test]
fn test_text_search_round_trip() {
    run_test(
        || create_fts_test_context(),
        |ctx| {
            let manager = ctx.manager();
            let ns = manager.add(CatalogInfo::builder(InfoKind::Namespace, "topp").build())?;
            let roads = manager.add(
                CatalogInfo::builder(InfoKind::FeatureType, "tiger_roads")
                    .namespace(ns.id())
                    .property("abstract", "Highways of Manhattan")
                    .build(),
            )?;
            manager.commit()?;

            let filter = full_text_search("manhattan");
            let found = manager.list(InfoType::Any, &filter, &Query::new())?;
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].id(), roads.id());

            manager.remove(&roads)?;
            manager.commit()?;
            assert!(manager.list(InfoType::Any, &filter, &Query::new())?.is_empty());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_commit_makes_every_queued_write_visible() {
    run_test(
        || create_fts_test_context(),
        |ctx| {
            let index = ctx.index()?;
            for round in 0..20 {
                let info = CatalogInfo::builder(InfoKind::Style, &format!("style{}", round))
                    .property("title", format!("Round{} style", round))
                    .build();
                index.add(&info)?;
                index.commit()?;

                let query = TextQuery::new(InfoType::Any, terms(&[&format!("round{}", round)]));
                assert_eq!(index.search_ids(&query)?, vec![info.id().clone()]);
            }
            assert_eq!(index.pending_operations(), 0);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_wildcard_terms_are_or_ed() {
    run_test(
        || create_fts_test_context(),
        |ctx| {
            let manager = ctx.manager();
            let index = ctx.index()?;
            let ws1 = manager.add(CatalogInfo::builder(InfoKind::Workspace, "workspace1").build())?;
            let ws2 = manager.add(CatalogInfo::builder(InfoKind::Workspace, "workspace2").build())?;
            manager.commit()?;

            let search = |patterns: &[&str]| -> geocat::errors::CatalogResult<Vec<InfoId>> {
                let mut ids = index.search_ids(&TextQuery::new(InfoType::Any, terms(patterns)))?;
                ids.sort();
                Ok(ids)
            };
            let mut both = vec![ws1.id().clone(), ws2.id().clone()];
            both.sort();

            assert_eq!(search(&["*workspace*"])?, both);
            assert_eq!(search(&["*1*"])?, vec![ws1.id().clone()]);
            assert_eq!(search(&["*1*", "*2*"])?, both);
            assert!(search(&["*3*"])?.is_empty());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_search_is_scoped_by_type() {
    run_test(
        || create_fts_test_context(),
        |ctx| {
            let manager = ctx.manager();
            let ws = manager.add(CatalogInfo::builder(InfoKind::Workspace, "roads").build())?;
            let ns = manager.add(CatalogInfo::builder(InfoKind::Namespace, "roads").build())?;
            manager.add(
                CatalogInfo::builder(InfoKind::DataStore, "roads")
                    .workspace(ws.id())
                    .build(),
            )?;
            manager.add(
                CatalogInfo::builder(InfoKind::Coverage, "roads")
                    .namespace(ns.id())
                    .build(),
            )?;
            manager.add(
                CatalogInfo::builder(InfoKind::Layer, "roads")
                    .namespace(ns.id())
                    .build(),
            )?;
            manager.commit()?;

            let filter = full_text_search("road");
            assert_eq!(manager.count(InfoType::Any, &filter)?, 5);
            assert_eq!(manager.count(BaseType::Store.into(), &filter)?, 1);
            assert_eq!(manager.count(InfoKind::Coverage.into(), &filter)?, 1);
            assert_eq!(manager.count(InfoKind::FeatureType.into(), &filter)?, 0);
            assert_eq!(manager.count(InfoType::Published, &filter)?, 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_rename_is_reindexed() {
    run_test(
        || create_fts_test_context(),
        |ctx| {
            let manager = ctx.manager();
            let ws = manager.add(CatalogInfo::builder(InfoKind::Workspace, "ws1").id("w1").build())?;
            manager.update(ws.modify().name("renamed").build())?;
            manager.commit()?;

            assert_eq!(manager.count(InfoType::Any, &full_text_search("ws1"))?, 0);
            let found = manager.list(InfoType::Any, &full_text_search("renamed"), &Query::new())?;
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].id().as_str(), "w1");
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

// ===== Consistency Tests =====

#[test]
fn test_reindex_recovers_missed_writes() {
    run_test(
        || create_fts_test_context(),
        |ctx| {
            let manager = ctx.manager();
            let index = ctx.index()?;
            index.close()?;

            // the lookup keeps the entity even though the mirror rejected it
            let err = manager
                .add(CatalogInfo::builder(InfoKind::Workspace, "orphan").build())
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::IndexNotRunning);
            assert_eq!(manager.count(InfoType::Any, &all())?, 1);

            index.open()?;
            assert_eq!(manager.count(InfoType::Any, &full_text_search("orphan"))?, 0);
            assert_eq!(manager.reindex()?, 1);
            assert_eq!(manager.count(InfoType::Any, &full_text_search("orphan"))?, 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_reused_id_does_not_touch_the_owner_document() {
    run_test(
        || create_fts_test_context(),
        |ctx| {
            let manager = ctx.manager();
            let ws = manager.add(CatalogInfo::builder(InfoKind::Workspace, "alpha").id("x").build())?;
            let style = CatalogInfo::builder(InfoKind::Style, "beta")
                .id("x")
                .workspace(ws.id())
                .build();
            let err = manager.add(style.clone()).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::DuplicateKey);

            assert!(manager.remove(&style)?.is_none());
            manager.commit()?;
            assert!(manager.find_by_id(ws.id(), InfoType::Any).is_some());
            assert_eq!(manager.count(InfoType::Any, &full_text_search("alpha"))?, 1);
            assert_eq!(manager.count(InfoType::Any, &full_text_search("beta"))?, 0);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_hits_missing_from_the_catalog_are_skipped() {
    run_test(
        || create_fts_test_context(),
        |ctx| {
            let manager = ctx.manager();
            let index = ctx.index()?;
            manager.add(CatalogInfo::builder(InfoKind::Workspace, "known_roads").build())?;
            index.add(&CatalogInfo::builder(InfoKind::Workspace, "ghost_roads").build())?;
            manager.commit()?;

            let found = manager.list(InfoType::Any, &full_text_search("roads"), &Query::new())?;
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].name(), "known_roads");
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_clear_empties_the_mirror() {
    run_test(
        || create_fts_test_context(),
        |ctx| {
            let manager = ctx.manager();
            let index = ctx.index()?;
            manager.add(CatalogInfo::builder(InfoKind::Workspace, "topp").build())?;
            manager.commit()?;
            assert_eq!(index.count(&TextQuery::new(InfoType::Any, vec![]))?, 1);

            manager.clear()?;
            assert_eq!(index.count(&TextQuery::new(InfoType::Any, vec![]))?, 0);
            assert_eq!(manager.count(InfoType::Any, &all())?, 0);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
