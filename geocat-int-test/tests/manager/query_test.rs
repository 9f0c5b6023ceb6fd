use geocat::common::SortOrder;
use geocat::filter::{all, field};
use geocat::manager::{limit_to, order_by, CatalogInfoLookupManager, Query};
use geocat::model::{BaseType, CatalogInfo, InfoKind, InfoType};
use geocat_int_test::test_util::{cleanup, create_test_context, run_test};

fn populate(manager: &CatalogInfoLookupManager) -> geocat::errors::CatalogResult<()> {
    let ws = manager.add(CatalogInfo::builder(InfoKind::Workspace, "topp").build())?;
    for (name, size) in [("delta", 4), ("alpha", 1), ("charlie", 3), ("bravo", 2), ("echo", 5)] {
        manager.add(
            CatalogInfo::builder(InfoKind::Style, name)
                .workspace(ws.id())
                .property("size", size)
                .build(),
        )?;
    }
    Ok(())
}

fn names(infos: Vec<std::sync::Arc<CatalogInfo>>) -> Vec<String> {
    infos.iter().map(|info| info.name().to_string()).collect()
}

#[test]
fn test_sort_and_page() {
    run_test(
        || create_test_context(),
        |ctx| {
            let manager = ctx.manager();
            populate(&manager)?;
            let styles: InfoType = BaseType::Style.into();

            let sorted = manager.list(styles, &all(), &order_by("name", SortOrder::Ascending))?;
            assert_eq!(names(sorted), vec!["alpha", "bravo", "charlie", "delta", "echo"]);

            let page = manager.list(
                styles,
                &all(),
                &order_by("size", SortOrder::Descending).offset(1).limit(2),
            )?;
            assert_eq!(names(page), vec!["delta", "charlie"]);

            let past_end = manager.list(styles, &all(), &Query::new().offset(10))?;
            assert!(past_end.is_empty());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_find_first_honours_filter_and_sort() {
    run_test(
        || create_test_context(),
        |ctx| {
            let manager = ctx.manager();
            populate(&manager)?;

            let first = manager.find_first(BaseType::Style.into(), &field("size").gt(2))?;
            assert!(first.map(|info| info.property("size").as_int() > Some(2)).unwrap_or(false));

            let smallest = manager
                .stream(
                    InfoType::Any,
                    &field("size").gte(2),
                    &order_by("size", SortOrder::Ascending).limit(1),
                )?
                .next()
                .transpose()?;
            assert_eq!(smallest.map(|info| info.name().to_string()).as_deref(), Some("bravo"));

            let none = manager.list(InfoType::Any, &field("size").gt(99), &limit_to(3))?;
            assert!(none.is_empty());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_streams_see_a_consistent_snapshot() {
    run_test(
        || create_test_context(),
        |ctx| {
            let manager = ctx.manager();
            populate(&manager)?;

            let stream = manager.stream(BaseType::Style.into(), &all(), &Query::new())?;
            let ws = manager
                .list(BaseType::Workspace.into(), &all(), &Query::new())?
                .remove(0);
            manager.add(
                CatalogInfo::builder(InfoKind::Style, "foxtrot")
                    .workspace(ws.id())
                    .build(),
            )?;

            let seen: Vec<String> = stream
                .map(|info| info.map(|info| info.name().to_string()))
                .collect::<Result<_, _>>()?;
            assert_eq!(seen.len(), 5);
            assert!(!seen.contains(&"foxtrot".to_string()));
            assert_eq!(manager.count(BaseType::Style.into(), &all())?, 6);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
