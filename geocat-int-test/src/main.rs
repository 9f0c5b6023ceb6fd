use geocat::errors::CatalogResult;
use geocat::filter::{all, full_text_search};
use geocat::loader::{DirectoryLoader, LoaderConfig};
use geocat::model::InfoType;
use geocat_int_test::test_util::{
    cleanup, create_fts_test_context, temp_catalog_dir, write_catalog_tree, TreeShape,
};

fn main() -> CatalogResult<()> {
    colog::init();
    println!("Starting catalog load stress test...");

    let shape = TreeShape {
        workspaces: 20,
        stores_per_workspace: 10,
        resources_per_store: 50,
    };
    let (_guard, root) = temp_catalog_dir()?;
    let start = std::time::Instant::now();
    write_catalog_tree(&root, shape)?;
    println!("Wrote {} entities in {:?}", shape.entity_count(), start.elapsed());

    let ctx = create_fts_test_context()?;
    let loader = DirectoryLoader::new(ctx.manager(), LoaderConfig::new());
    let summary = loader.load(&root)?;
    println!(
        "Loaded {} entities in {:?} ({} failed)",
        summary.loaded(),
        summary.elapsed(),
        summary.failed()
    );

    let manager = ctx.manager();
    let start = std::time::Instant::now();
    let total = manager.count(InfoType::Any, &all())?;
    let roads = manager.count(InfoType::Published, &full_text_search("road"))?;
    println!(
        "Counted {} entities, {} published about roads, in {:?}",
        total,
        roads,
        start.elapsed()
    );

    cleanup(ctx)
}
