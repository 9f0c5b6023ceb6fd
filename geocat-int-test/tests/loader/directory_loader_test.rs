use geocat::filter::{all, full_text_search};
use geocat::loader::{DirectoryLoader, LoaderConfig};
use geocat::manager::Query;
use geocat::model::{BaseType, InfoId, InfoType, QualifiedName};
use geocat_int_test::test_util::{
    cleanup, create_fts_test_context, create_test_context, run_test, temp_catalog_dir,
    write_catalog_tree, TestContext, TreeShape,
};
use std::fs;

const SHAPE: TreeShape = TreeShape {
    workspaces: 3,
    stores_per_workspace: 2,
    resources_per_store: 4,
};

fn sorted_ids(ctx: &TestContext) -> geocat::errors::CatalogResult<Vec<InfoId>> {
    let mut ids: Vec<InfoId> = ctx
        .manager()
        .list(InfoType::Any, &all(), &Query::new())?
        .iter()
        .map(|info| info.id().clone())
        .collect();
    ids.sort();
    Ok(ids)
}

#[test]
fn test_load_tree_into_indexed_catalog() {
    run_test(
        || create_fts_test_context(),
        |ctx| {
            let (_dir, root) = temp_catalog_dir()?;
            write_catalog_tree(&root, SHAPE)?;

            let manager = ctx.manager();
            let summary = DirectoryLoader::new(manager.clone(), LoaderConfig::new()).load(&root)?;
            assert_eq!(summary.loaded(), SHAPE.entity_count());
            assert_eq!(summary.failed(), 0);

            assert_eq!(manager.count(InfoType::Any, &all())?, SHAPE.entity_count());
            assert_eq!(manager.count(BaseType::Resource.into(), &all())?, 24);
            assert_eq!(manager.count(InfoType::Published, &all())?, 24 + 3);

            // even resources and their layers are about roads
            assert_eq!(manager.count(BaseType::Resource.into(), &full_text_search("roads"))?, 12);
            assert_eq!(manager.count(InfoType::Published, &full_text_search("roads"))?, 12);
            assert_eq!(manager.count(InfoType::Published, &full_text_search("base"))?, 3);

            let ns = manager.namespace_by_uri("http://ws1.example.org")?;
            assert_eq!(ns.map(|info| info.id().clone()), Some(InfoId::new("ns-1")));
            let store = manager.find_by_name(
                &QualifiedName::scoped(&InfoId::new("ws-2"), "store1"),
                BaseType::Store.into(),
            );
            assert_eq!(store.map(|info| info.id().clone()), Some(InfoId::new("store-2-1")));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_parallelism_does_not_change_the_result() {
    run_test(
        || create_test_context(),
        |ctx| {
            let (_dir, root) = temp_catalog_dir()?;
            write_catalog_tree(&root, SHAPE)?;

            let serial = create_test_context()?;
            DirectoryLoader::new(serial.manager(), LoaderConfig::new().with_parallelism(1)).load(&root)?;
            DirectoryLoader::new(ctx.manager(), LoaderConfig::new().with_parallelism(8)).load(&root)?;

            let expected = sorted_ids(&serial)?;
            assert_eq!(expected.len(), SHAPE.entity_count());
            assert_eq!(sorted_ids(&ctx)?, expected);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_broken_resource_skips_its_layer() {
    run_test(
        || create_test_context(),
        |ctx| {
            let (_dir, root) = temp_catalog_dir()?;
            write_catalog_tree(&root, SHAPE)?;
            let broken = root
                .join(geocat::loader::WORKSPACES_DIR)
                .join("ws0")
                .join("store0")
                .join("ft0_1")
                .join("featuretype.json");
            fs::write(&broken, "{ not json")?;

            let summary = DirectoryLoader::new(ctx.manager(), LoaderConfig::new()).load(&root)?;
            assert_eq!(summary.failed(), 2);
            assert_eq!(summary.loaded(), SHAPE.entity_count() - 2);
            assert!(summary.failures().iter().any(|(path, _)| path == &broken));

            let manager = ctx.manager();
            assert!(manager.find_by_id(&InfoId::new("ft-0-0-1"), InfoType::Any).is_none());
            assert!(manager.find_by_id(&InfoId::new("layer-0-0-1"), InfoType::Any).is_none());
            assert!(manager.find_by_id(&InfoId::new("layer-0-0-2"), InfoType::Any).is_some());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_text_is_visible_only_after_commit() {
    run_test(
        || create_fts_test_context(),
        |ctx| {
            let (_dir, root) = temp_catalog_dir()?;
            write_catalog_tree(&root, SHAPE)?;

            let manager = ctx.manager();
            let config = LoaderConfig::new().with_commit_on_finish(false);
            DirectoryLoader::new(manager.clone(), config).load(&root)?;

            let roads = full_text_search("roads");
            assert_eq!(manager.count(InfoType::Any, &all())?, SHAPE.entity_count());
            assert_eq!(manager.count(InfoType::Any, &roads)?, 0);

            manager.commit()?;
            assert_eq!(manager.count(InfoType::Any, &roads)?, 24);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_loading_a_missing_directory_fails() {
    run_test(
        || create_test_context(),
        |ctx| {
            let (_dir, root) = temp_catalog_dir()?;
            let loader = DirectoryLoader::new(ctx.manager(), LoaderConfig::new());
            assert!(loader.load(&root.join("missing")).is_err());
            assert_eq!(ctx.manager().count(InfoType::Any, &all())?, 0);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
