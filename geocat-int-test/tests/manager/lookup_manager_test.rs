use geocat::common::SortOrder;
use geocat::errors::ErrorKind;
use geocat::filter::{all, field};
use geocat::lookup::IndexKey;
use geocat::manager::{Query, STORE_INDEX, WORKSPACE_INDEX};
use geocat::model::{BaseType, CatalogInfo, InfoKind, InfoType, QualifiedName};
use geocat_int_test::test_util::{cleanup, create_test_context, run_test};

#[test]
fn test_find_by_id_is_stable_across_updates() {
    run_test(
        || create_test_context(),
        |ctx| {
            let manager = ctx.manager();
            let ws = manager.add(CatalogInfo::builder(InfoKind::Workspace, "topp").build())?;
            assert_eq!(manager.find_by_id(ws.id(), InfoType::Any).as_deref(), Some(&*ws));

            let updated = manager.update(ws.modify().property("isolated", true).build())?;
            let found = manager.find_by_id(ws.id(), InfoKind::Workspace.into());
            assert_eq!(found.as_deref(), Some(&*updated));
            assert_eq!(updated.property("isolated").as_bool(), Some(true));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_rename_remaps_the_name_index() {
    run_test(
        || create_test_context(),
        |ctx| {
            let manager = ctx.manager();
            let ws = manager.add(CatalogInfo::builder(InfoKind::Workspace, "ws1").id("w1").build())?;
            manager.update(ws.modify().name("ws1-renamed").build())?;

            let workspaces: InfoType = BaseType::Workspace.into();
            assert!(manager
                .find_by_name(&QualifiedName::global("ws1"), workspaces)
                .is_none());
            let renamed = manager
                .find_by_name(&QualifiedName::global("ws1-renamed"), workspaces)
                .map(|info| info.id().as_str().to_string());
            assert_eq!(renamed.as_deref(), Some("w1"));
            assert!(manager.find_by_id(ws.id(), workspaces).is_some());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_moving_a_store_remaps_its_scope() {
    run_test(
        || create_test_context(),
        |ctx| {
            let manager = ctx.manager();
            let a = manager.add(CatalogInfo::builder(InfoKind::Workspace, "a").build())?;
            let b = manager.add(CatalogInfo::builder(InfoKind::Workspace, "b").build())?;
            let store = manager.add(
                CatalogInfo::builder(InfoKind::DataStore, "roads")
                    .workspace(a.id())
                    .build(),
            )?;
            manager.update(store.modify().workspace(Some(b.id())).build())?;

            let stores: InfoType = BaseType::Store.into();
            assert!(manager
                .find_by_name(&QualifiedName::scoped(a.id(), "roads"), stores)
                .is_none());
            assert!(manager
                .find_by_name(&QualifiedName::scoped(b.id(), "roads"), stores)
                .is_some());

            let in_a = manager.find_all_by_index(stores, WORKSPACE_INDEX, &IndexKey::Id(a.id().clone()))?;
            let in_b = manager.find_all_by_index(stores, WORKSPACE_INDEX, &IndexKey::Id(b.id().clone()))?;
            assert!(in_a.is_empty());
            assert_eq!(in_b.len(), 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_hierarchical_fan_out() {
    run_test(
        || create_test_context(),
        |ctx| {
            let manager = ctx.manager();
            let ws = manager.add(CatalogInfo::builder(InfoKind::Workspace, "topp").build())?;
            manager.add(
                CatalogInfo::builder(InfoKind::DataStore, "states")
                    .workspace(ws.id())
                    .build(),
            )?;

            let list = |info_type: InfoType| manager.list(info_type, &all(), &Query::new());
            assert_eq!(list(BaseType::Store.into())?.len(), 1);
            assert_eq!(list(InfoKind::DataStore.into())?.len(), 1);
            assert!(list(InfoKind::CoverageStore.into())?.is_empty());
            assert_eq!(list(InfoType::Any)?.len(), 2);
            assert!(list(InfoType::Published)?.is_empty());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_published_spans_layers_and_groups() {
    run_test(
        || create_test_context(),
        |ctx| {
            let manager = ctx.manager();
            let ws = manager.add(CatalogInfo::builder(InfoKind::Workspace, "topp").build())?;
            let ns = manager.add(CatalogInfo::builder(InfoKind::Namespace, "topp").build())?;
            manager.add(
                CatalogInfo::builder(InfoKind::Layer, "roads")
                    .namespace(ns.id())
                    .build(),
            )?;
            manager.add(
                CatalogInfo::builder(InfoKind::LayerGroup, "basemap")
                    .workspace(ws.id())
                    .build(),
            )?;

            assert_eq!(manager.count(InfoType::Published, &all())?, 2);
            let names: Vec<String> = manager
                .list(InfoType::Published, &all(), &Query::new().sort("name", SortOrder::Ascending))?
                .iter()
                .map(|info| info.name().to_string())
                .collect();
            assert_eq!(names, vec!["basemap".to_string(), "roads".to_string()]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_duplicate_names_are_rejected_per_scope() {
    run_test(
        || create_test_context(),
        |ctx| {
            let manager = ctx.manager();
            let a = manager.add(CatalogInfo::builder(InfoKind::Workspace, "a").build())?;
            let b = manager.add(CatalogInfo::builder(InfoKind::Workspace, "b").build())?;
            let store = |ws: &CatalogInfo| {
                CatalogInfo::builder(InfoKind::DataStore, "roads")
                    .workspace(ws.id())
                    .build()
            };

            manager.add(store(&a))?;
            let err = manager.add(store(&a)).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::DuplicateKey);
            manager.add(store(&b))?;

            let err = manager
                .add(CatalogInfo::builder(InfoKind::Workspace, "a").build())
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::DuplicateKey);
            assert_eq!(manager.count(BaseType::Workspace.into(), &all())?, 2);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_remove_drops_every_index_entry() {
    run_test(
        || create_test_context(),
        |ctx| {
            let manager = ctx.manager();
            let ws = manager.add(CatalogInfo::builder(InfoKind::Workspace, "topp").build())?;
            let ns = manager.add(CatalogInfo::builder(InfoKind::Namespace, "topp").build())?;
            let store = manager.add(
                CatalogInfo::builder(InfoKind::DataStore, "states")
                    .workspace(ws.id())
                    .build(),
            )?;
            let ft = manager.add(
                CatalogInfo::builder(InfoKind::FeatureType, "states")
                    .namespace(ns.id())
                    .store(store.id())
                    .build(),
            )?;

            let resources: InfoType = BaseType::Resource.into();
            let by_store = IndexKey::Id(store.id().clone());
            assert_eq!(manager.find_all_by_index(resources, STORE_INDEX, &by_store)?.len(), 1);

            let removed = manager.remove(&ft)?;
            assert_eq!(removed.map(|info| info.id().clone()), Some(ft.id().clone()));
            assert!(manager.find_by_id(ft.id(), InfoType::Any).is_none());
            assert!(manager
                .find_by_name(&QualifiedName::scoped(ns.id(), "states"), resources)
                .is_none());
            assert!(manager.find_all_by_index(resources, STORE_INDEX, &by_store)?.is_empty());

            assert!(manager.remove(&ft)?.is_none());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_index_queries_need_one_base_type() {
    run_test(
        || create_test_context(),
        |ctx| {
            let manager = ctx.manager();
            let err = manager
                .find_all_by_index(InfoType::Published, STORE_INDEX, &IndexKey::Id("x".into()))
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::IllegalArgument);

            let err = manager
                .find_all_by_index(BaseType::Store.into(), "no-such-index", &IndexKey::Id("x".into()))
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::IndexNotFound);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_namespace_by_uri() {
    run_test(
        || create_test_context(),
        |ctx| {
            let manager = ctx.manager();
            let ns = manager.add(
                CatalogInfo::builder(InfoKind::Namespace, "topp")
                    .property("uri", "http://www.openplans.org/topp")
                    .build(),
            )?;
            let found = manager.namespace_by_uri("http://www.openplans.org/topp")?;
            assert_eq!(found.map(|info| info.id().clone()), Some(ns.id().clone()));
            assert!(manager.namespace_by_uri("http://nowhere")?.is_none());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_count_equals_list_size() {
    run_test(
        || create_test_context(),
        |ctx| {
            let manager = ctx.manager();
            let ws = manager.add(CatalogInfo::builder(InfoKind::Workspace, "topp").build())?;
            for i in 0..5 {
                manager.add(
                    CatalogInfo::builder(InfoKind::DataStore, &format!("ds{}", i))
                        .workspace(ws.id())
                        .property("enabled", i % 2 == 0)
                        .build(),
                )?;
                manager.add(
                    CatalogInfo::builder(InfoKind::CoverageStore, &format!("cs{}", i))
                        .workspace(ws.id())
                        .build(),
                )?;
            }

            let enabled = field("enabled").eq(true);
            for info_type in [
                InfoType::Any,
                BaseType::Store.into(),
                InfoKind::DataStore.into(),
                InfoKind::CoverageStore.into(),
                InfoType::Published,
            ] {
                for filter in [all(), enabled.clone()] {
                    let count = manager.count(info_type, &filter)?;
                    let listed = manager.list(info_type, &filter, &Query::new())?.len();
                    assert_eq!(count, listed, "{} {:?}", info_type, filter);
                }
            }
            assert_eq!(manager.count(BaseType::Store.into(), &enabled)?, 3);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_clear_empties_every_lookup() {
    run_test(
        || create_test_context(),
        |ctx| {
            let manager = ctx.manager();
            let ws = manager.add(CatalogInfo::builder(InfoKind::Workspace, "topp").build())?;
            manager.add(
                CatalogInfo::builder(InfoKind::Style, "line")
                    .workspace(ws.id())
                    .build(),
            )?;
            manager.clear()?;
            assert_eq!(manager.count(InfoType::Any, &all())?, 0);
            assert!(manager.find_by_id(ws.id(), InfoType::Any).is_none());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
