use sitecat_core::db::{open_db, open_db_in_memory};
use sitecat_core::{
    AreaFilter, AreaScope, CatalogRepository, CatalogService, ContextFields, ContextScope,
    Hemisphere, NewContext, NewFind, RecordValidationError, RepoError, ServiceError,
    SqliteCatalogRepository,
};
use std::collections::BTreeSet;
use std::sync::{Arc, Barrier};
use std::thread;

fn setup() -> rusqlite::Connection {
    open_db_in_memory().unwrap()
}

fn area(easting: i64, northing: i64) -> AreaScope {
    AreaScope::new(Hemisphere::North, 38, easting, northing).unwrap()
}

fn context(area: AreaScope, number: u32) -> ContextScope {
    area.context(number).unwrap()
}

#[test]
fn sequential_allocations_are_dense_from_one() {
    let conn = setup();
    let service = CatalogService::new(SqliteCatalogRepository::try_new(&conn).unwrap());
    let cell = area(478_130, 4_419_430);

    let numbers: Vec<u32> = (0..5)
        .map(|_| {
            service
                .create_context(&NewContext::new(cell))
                .unwrap()
                .scope
                .context_number
        })
        .collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);

    let parent = context(cell, 2);
    let finds: Vec<u32> = (0..3)
        .map(|_| {
            service
                .create_find(&NewFind::new(parent))
                .unwrap()
                .scope
                .find_number
        })
        .collect();
    assert_eq!(finds, vec![1, 2, 3]);
    assert_eq!(service.list_find_numbers(&parent).unwrap(), vec![1, 2, 3]);
}

#[test]
fn sibling_scopes_do_not_share_counters() {
    let conn = setup();
    let service = CatalogService::new(SqliteCatalogRepository::try_new(&conn).unwrap());
    let first = area(100, 200);
    let second = area(100, 210);

    for _ in 0..3 {
        service.create_context(&NewContext::new(first)).unwrap();
    }
    let other = service.create_context(&NewContext::new(second)).unwrap();
    assert_eq!(other.scope.context_number, 1);

    service.create_find(&NewFind::new(context(first, 1))).unwrap();
    service.create_find(&NewFind::new(context(first, 1))).unwrap();
    let find = service.create_find(&NewFind::new(context(first, 2))).unwrap();
    assert_eq!(find.scope.find_number, 1);

    let south = AreaScope::new(Hemisphere::South, 38, 100, 200).unwrap();
    let south_context = service.create_context(&NewContext::new(south)).unwrap();
    assert_eq!(south_context.scope.context_number, 1);
}

#[test]
fn explicit_number_is_used_verbatim_and_allocation_continues_after_max() {
    let conn = setup();
    let service = CatalogService::new(SqliteCatalogRepository::try_new(&conn).unwrap());
    let cell = area(500, 600);

    service.create_context(&NewContext::new(cell)).unwrap();
    let explicit = service
        .create_context(&NewContext::new(cell).with_number(10))
        .unwrap();
    assert_eq!(explicit.scope.context_number, 10);

    let next = service.create_context(&NewContext::new(cell)).unwrap();
    assert_eq!(next.scope.context_number, 11);

    let low = service
        .create_context(&NewContext::new(cell).with_number(5))
        .unwrap();
    assert_eq!(low.scope.context_number, 5);
    let after_low = service.create_context(&NewContext::new(cell)).unwrap();
    assert_eq!(after_low.scope.context_number, 12);
}

#[test]
fn explicit_collision_is_duplicate_key() {
    let conn = setup();
    let service = CatalogService::new(SqliteCatalogRepository::try_new(&conn).unwrap());
    let cell = area(700, 800);

    service
        .create_context(&NewContext::new(cell).with_number(3))
        .unwrap();
    let err = service
        .create_context(&NewContext::new(cell).with_number(3))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Repo(RepoError::DuplicateKey(_))
    ));

    let parent = context(cell, 3);
    service
        .create_find(&NewFind::new(parent).with_number(1))
        .unwrap();
    let err = service
        .create_find(&NewFind::new(parent).with_number(1))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Repo(RepoError::DuplicateKey(_))
    ));
    assert_eq!(service.list_find_numbers(&parent).unwrap(), vec![1]);
}

#[test]
fn zero_explicit_number_is_rejected() {
    let conn = setup();
    let service = CatalogService::new(SqliteCatalogRepository::try_new(&conn).unwrap());

    let err = service
        .create_context(&NewContext::new(area(1, 1)).with_number(0))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Repo(RepoError::Validation(RecordValidationError::ZeroNumber(
            "context_number"
        )))
    ));
    assert!(service.list_areas(&AreaFilter::default()).unwrap().is_empty());
}

#[test]
fn find_creation_gets_or_creates_parents_idempotently() {
    let conn = setup();
    let repo = SqliteCatalogRepository::try_new(&conn).unwrap();
    let cell = area(900, 1_000);
    let parent = context(cell, 4);

    let first = repo.create_find(&NewFind::new(parent)).unwrap();
    let second = repo.create_find(&NewFind::new(parent)).unwrap();
    assert_eq!(first.scope.find_number, 1);
    assert_eq!(second.scope.find_number, 2);

    assert_eq!(repo.list_areas(&AreaFilter::default()).unwrap().len(), 1);
    let contexts = repo.list_contexts(&cell).unwrap();
    assert_eq!(contexts.len(), 1);
    assert_eq!(contexts[0].scope, parent);

    let next_context = repo.create_context(&NewContext::new(cell)).unwrap();
    assert_eq!(next_context.scope.context_number, 5);
}

#[test]
fn concurrent_writers_receive_distinct_dense_numbers() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 10;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("concurrent.db");
    drop(open_db(&path).unwrap());

    let cell = area(478_130, 4_419_430);
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let service = CatalogService::with_allocation_attempts(
                    SqliteCatalogRepository::try_new(&conn).unwrap(),
                    20,
                );
                barrier.wait();
                (0..PER_THREAD)
                    .map(|_| {
                        service
                            .create_context(&NewContext::new(cell))
                            .unwrap()
                            .scope
                            .context_number
                    })
                    .collect::<Vec<u32>>()
            })
        })
        .collect();

    let mut all = Vec::new();
    for handle in handles {
        all.extend(handle.join().unwrap());
    }
    let unique: BTreeSet<u32> = all.iter().copied().collect();
    let expected: BTreeSet<u32> = (1..=(THREADS * PER_THREAD) as u32).collect();
    assert_eq!(all.len(), THREADS * PER_THREAD);
    assert_eq!(unique, expected);
}

#[test]
fn reads_by_id_and_scope_agree() {
    let conn = setup();
    let service = CatalogService::new(SqliteCatalogRepository::try_new(&conn).unwrap());
    let cell = area(10, 20);

    let mut draft = NewContext::new(cell).with_type("pit");
    draft.fields.description = "ashy fill".to_string();
    draft.fields.opening_date = Some(1_000);
    let created = service.create_context(&draft).unwrap();

    let by_id = service.get_context(created.id).unwrap().unwrap();
    let by_scope = service.get_context_by_scope(&created.scope).unwrap().unwrap();
    assert_eq!(by_id, created);
    assert_eq!(by_scope, created);
    assert_eq!(by_id.context_type, "pit");

    let find = service
        .create_find(&NewFind::new(created.scope).with_material("ceramic", "sherd"))
        .unwrap();
    let stored = service.get_find(find.id).unwrap().unwrap();
    assert_eq!(stored, find);
    assert_eq!(
        service.get_find_by_scope(&find.scope).unwrap().unwrap().id,
        find.id
    );
    assert_eq!(
        stored.material_category.unwrap().to_string(),
        "ceramic - sherd"
    );

    let missing = context(cell, 99);
    assert!(service.get_context_by_scope(&missing).unwrap().is_none());
    assert!(service
        .get_find_by_scope(&missing.find(1).unwrap())
        .unwrap()
        .is_none());
}

#[test]
fn update_context_changes_fields_but_not_scope() {
    let conn = setup();
    let service = CatalogService::new(SqliteCatalogRepository::try_new(&conn).unwrap());
    let created = service.create_context(&NewContext::new(area(1, 2))).unwrap();

    let fields = ContextFields {
        context_type: "wall".to_string(),
        opening_date: Some(10),
        closing_date: Some(20),
        description: "mudbrick".to_string(),
        director_notes: "check phasing".to_string(),
    };
    let updated = service.update_context(created.id, &fields).unwrap();
    assert_eq!(updated.scope, created.scope);
    assert_eq!(updated.context_type, "wall");
    assert_eq!(updated.closing_date, Some(20));

    let reversed = ContextFields {
        opening_date: Some(20),
        closing_date: Some(10),
        ..ContextFields::default()
    };
    assert!(matches!(
        service.update_context(created.id, &reversed),
        Err(ServiceError::Repo(RepoError::Validation(
            RecordValidationError::InvalidDateRange { .. }
        )))
    ));
    assert!(matches!(
        service.update_context(uuid::Uuid::new_v4(), &fields),
        Err(ServiceError::Repo(RepoError::NotFound(_)))
    ));
}

#[test]
fn material_categories_are_created_once() {
    let conn = setup();
    let repo = SqliteCatalogRepository::try_new(&conn).unwrap();

    let first = repo
        .get_or_create_material_category("bone", "worked")
        .unwrap();
    let again = repo
        .get_or_create_material_category(" bone ", "worked ")
        .unwrap();
    assert_eq!(first, again);
    repo.get_or_create_material_category("ceramic", "sherd")
        .unwrap();

    let listed: Vec<String> = repo
        .list_material_categories()
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(listed, vec!["bone - worked", "ceramic - sherd"]);

    assert!(matches!(
        repo.get_or_create_material_category("", "x"),
        Err(RepoError::Validation(
            RecordValidationError::BlankMaterialCategory
        ))
    ));
}

#[test]
fn register_area_fills_origin_and_browse_walks_the_grid() {
    let conn = setup();
    let service = CatalogService::new(SqliteCatalogRepository::try_new(&conn).unwrap());

    let registered = service
        .register_area(area(478_130, 4_419_430), "survey unit")
        .unwrap();
    let latitude = registered.latitude.unwrap();
    let longitude = registered.longitude.unwrap();
    assert!((latitude - 39.9247).abs() < 1e-3, "{latitude}");
    assert!((longitude - 44.744).abs() < 1e-3, "{longitude}");

    let stored = service
        .get_area(&area(478_130, 4_419_430))
        .unwrap()
        .unwrap();
    assert_eq!(stored, registered);

    service.register_area(area(478_130, 4_419_440), "").unwrap();
    service.register_area(area(478_140, 4_419_430), "").unwrap();
    let south = AreaScope::new(Hemisphere::South, 19, 300_000, 8_000_000).unwrap();
    service.register_area(south, "").unwrap();

    assert_eq!(
        service.list_hemispheres().unwrap(),
        vec![Hemisphere::North, Hemisphere::South]
    );
    assert_eq!(service.list_zones(Hemisphere::North).unwrap(), vec![38]);
    assert_eq!(
        service.list_eastings(Hemisphere::North, 38).unwrap(),
        vec![478_130, 478_140]
    );
    assert_eq!(
        service
            .list_northings(Hemisphere::North, 38, 478_130)
            .unwrap(),
        vec![4_419_430, 4_419_440]
    );

    let filter = AreaFilter {
        hemisphere: Some(Hemisphere::North),
        easting: Some(478_130),
        ..AreaFilter::default()
    };
    assert_eq!(service.list_areas(&filter).unwrap().len(), 2);
    assert_eq!(service.list_areas(&AreaFilter::default()).unwrap().len(), 4);
}

#[test]
fn re_registering_an_area_updates_its_type() {
    let conn = setup();
    let service = CatalogService::new(SqliteCatalogRepository::try_new(&conn).unwrap());
    let cell = area(478_130, 4_419_430);

    service.create_context(&NewContext::new(cell)).unwrap();
    let bare = service.get_area(&cell).unwrap().unwrap();
    assert_eq!(bare.latitude, None);

    service.register_area(cell, "trench").unwrap();
    let updated = service.get_area(&cell).unwrap().unwrap();
    assert_eq!(updated.area_type, "trench");
    assert!(updated.latitude.is_some());
    assert_eq!(service.list_contexts(&cell).unwrap().len(), 1);
}
