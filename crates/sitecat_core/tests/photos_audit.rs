use sitecat_core::db::{open_db, open_db_in_memory};
use sitecat_core::{
    ActionFilter, AreaScope, AuditAction, AuditModel, AuditService, BagPhotoSource,
    CatalogService, ContextFields, ContextScope, Hemisphere, NewContext, NewFind, NewPhoto,
    PhotoPathError, PhotoService, PhotoSubject, RecordValidationError, RepoError, ServiceError,
    SqliteAuditRepository, SqliteCatalogRepository, SqlitePhotoRepository,
    SqliteSurveyRepository, SurveyService, TypeList,
};
use std::collections::BTreeSet;
use std::sync::{Arc, Barrier};
use std::thread;

fn area() -> AreaScope {
    AreaScope::new(Hemisphere::North, 38, 478_130, 4_419_430).unwrap()
}

fn seeded_context(conn: &rusqlite::Connection) -> ContextScope {
    let catalog = CatalogService::new(SqliteCatalogRepository::try_new(conn).unwrap());
    catalog
        .create_context(&NewContext::new(area()))
        .unwrap()
        .scope
}

#[test]
fn each_subject_numbers_its_own_folder() {
    let conn = open_db_in_memory().unwrap();
    let context = seeded_context(&conn);
    let catalog = CatalogService::new(SqliteCatalogRepository::try_new(&conn).unwrap());
    let find = catalog
        .create_find(&NewFind::new(context))
        .unwrap()
        .scope;
    let photos = PhotoService::new(SqlitePhotoRepository::try_new(&conn).unwrap());

    let first = photos.add_photo(&NewPhoto::context(context, "JPG")).unwrap();
    let second = photos.add_photo(&NewPhoto::context(context, ".jpg")).unwrap();
    let raw = photos.add_photo(&NewPhoto::context(context, "cr2")).unwrap();
    let bag = photos
        .add_photo(&NewPhoto::bag(context, BagPhotoSource::InField, "jpg"))
        .unwrap();
    let of_find = photos.add_photo(&NewPhoto::find(find, "jpg")).unwrap();

    assert_eq!(first.path, "N/38/478130/4419430/1/photos/1.jpg");
    assert_eq!(second.sequence, 2);
    assert_eq!(raw.path, "N/38/478130/4419430/1/photos/1.cr2");
    assert_eq!(bag.path, "N/38/478130/4419430/1/bag_photos/1.jpg");
    assert_eq!(bag.bag_source, Some(BagPhotoSource::InField));
    assert_eq!(of_find.path, "N/38/478130/4419430/1/1/photos/1.jpg");
    assert_eq!(of_find.bag_source, None);

    let listed: Vec<String> = photos
        .list_photos(&PhotoSubject::Context(context))
        .unwrap()
        .into_iter()
        .map(|photo| photo.path)
        .collect();
    assert_eq!(
        listed,
        vec![
            "N/38/478130/4419430/1/photos/1.cr2",
            "N/38/478130/4419430/1/photos/1.jpg",
            "N/38/478130/4419430/1/photos/2.jpg",
        ]
    );

    let stored = photos.get_photo(bag.id).unwrap().unwrap();
    assert_eq!(stored, bag);
}

#[test]
fn photos_need_an_existing_owner() {
    let conn = open_db_in_memory().unwrap();
    let context = seeded_context(&conn);
    let photos = PhotoService::new(SqlitePhotoRepository::try_new(&conn).unwrap());

    let missing_context = area().context(9).unwrap();
    assert!(matches!(
        photos.add_photo(&NewPhoto::context(missing_context, "jpg")),
        Err(ServiceError::Repo(RepoError::NotFound(_)))
    ));
    assert!(matches!(
        photos.add_photo(&NewPhoto::find(context.find(4).unwrap(), "jpg")),
        Err(ServiceError::Repo(RepoError::NotFound(_)))
    ));
    assert!(matches!(
        photos.add_photo(&NewPhoto::context(context, "tar.gz")),
        Err(ServiceError::Repo(RepoError::Photo(
            PhotoPathError::InvalidExtension(_)
        )))
    ));
    assert!(photos
        .list_photos(&PhotoSubject::Context(missing_context))
        .unwrap()
        .is_empty());
}

#[test]
fn replacing_a_photo_stamps_it_and_logs_an_update() {
    let conn = open_db_in_memory().unwrap();
    let context = seeded_context(&conn);
    let photos = PhotoService::new(SqlitePhotoRepository::try_new(&conn).unwrap());
    let audit = AuditService::new(SqliteAuditRepository::try_new(&conn).unwrap());
    let subject = PhotoSubject::Bag(context);

    let added = photos
        .add_photo(&NewPhoto::bag(context, BagPhotoSource::Drying, "jpg"))
        .unwrap();
    assert_eq!(added.replaced_at, None);

    let replaced = photos.replace_photo(&subject, "1.JPG").unwrap();
    assert_eq!(replaced.id, added.id);
    assert!(replaced.replaced_at.is_some());

    let history = audit.history_of(&added.id.to_string()).unwrap();
    let actions: Vec<(AuditModel, AuditAction)> = history
        .iter()
        .map(|entry| (entry.model, entry.action))
        .collect();
    assert_eq!(
        actions,
        vec![
            (AuditModel::BagPhoto, AuditAction::Update),
            (AuditModel::BagPhoto, AuditAction::Create),
        ]
    );

    assert!(matches!(
        photos.replace_photo(&subject, "2.jpg"),
        Err(ServiceError::Repo(RepoError::NotFound(_)))
    ));
    assert!(matches!(
        photos.replace_photo(&PhotoSubject::Context(context), "1.jpg"),
        Err(ServiceError::Repo(RepoError::NotFound(_)))
    ));
    assert!(matches!(
        photos.replace_photo(&subject, "cover.jpg"),
        Err(ServiceError::Repo(RepoError::Photo(
            PhotoPathError::InvalidFileName(_)
        )))
    ));
}

#[test]
fn catalog_writes_leave_an_action_trail() {
    let conn = open_db_in_memory().unwrap();
    let catalog = CatalogService::new(SqliteCatalogRepository::try_new(&conn).unwrap());
    let audit = AuditService::new(SqliteAuditRepository::try_new(&conn).unwrap());
    let cell = area();

    catalog.register_area(cell, "trench").unwrap();
    catalog.register_area(cell, "test pit").unwrap();
    let area_history: Vec<AuditAction> = audit
        .history_of(&cell.to_string())
        .unwrap()
        .into_iter()
        .map(|entry| entry.action)
        .collect();
    assert_eq!(area_history, vec![AuditAction::Update, AuditAction::Create]);

    let context = catalog.create_context(&NewContext::new(cell)).unwrap();
    let mut fields = ContextFields::default();
    fields.description = "ashy lens".to_string();
    catalog.update_context(context.id, &fields).unwrap();
    let context_history = audit.history_of(&context.id.to_string()).unwrap();
    assert_eq!(context_history.len(), 2);
    assert_eq!(context_history[0].model, AuditModel::SpatialContext);
    assert_eq!(context_history[0].action, AuditAction::Update);
    assert_eq!(context_history[1].action, AuditAction::Create);

    // Creating a find in a new cell also logs its implicit area and context.
    let other = AreaScope::new(Hemisphere::North, 38, 478_140, 4_419_430).unwrap();
    let find = catalog
        .create_find(&NewFind::new(other.context(3).unwrap()))
        .unwrap();
    let implicit = catalog
        .get_context_by_scope(&find.scope.context)
        .unwrap()
        .unwrap();
    assert_eq!(audit.history_of(&other.to_string()).unwrap().len(), 1);
    assert_eq!(audit.history_of(&implicit.id.to_string()).unwrap().len(), 1);
    assert_eq!(
        audit.history_of(&find.id.to_string()).unwrap()[0].model,
        AuditModel::ObjectFind
    );

    let contexts = audit
        .list_actions(&ActionFilter {
            model: Some(AuditModel::SpatialContext),
            ..ActionFilter::default()
        })
        .unwrap();
    assert_eq!(contexts.len(), 3);
}

#[test]
fn survey_path_edits_are_logged() {
    let conn = open_db_in_memory().unwrap();
    let survey = SurveyService::new(SqliteSurveyRepository::try_new(&conn).unwrap());
    let audit = AuditService::new(SqliteAuditRepository::try_new(&conn).unwrap());

    let path = survey.create_path("north transect").unwrap();
    survey.update_notes(path.id, "north transect, day 2").unwrap();

    let history = audit.history_of(&path.id.to_string()).unwrap();
    assert_eq!(history.len(), 2);
    assert!(history
        .iter()
        .all(|entry| entry.model == AuditModel::SurveyPath));
    assert_eq!(history[0].action, AuditAction::Update);
}

#[test]
fn type_lists_are_separate_and_deduplicated() {
    let conn = open_db_in_memory().unwrap();
    let catalog = CatalogService::new(SqliteCatalogRepository::try_new(&conn).unwrap());

    assert_eq!(
        catalog.add_type_option(TypeList::Context, "  pit fill ").unwrap(),
        "pit fill"
    );
    catalog.add_type_option(TypeList::Context, "layer").unwrap();
    catalog.add_type_option(TypeList::Context, "pit fill").unwrap();
    catalog.add_type_option(TypeList::Area, "trench").unwrap();

    assert_eq!(
        catalog.list_type_options(TypeList::Context).unwrap(),
        vec!["layer", "pit fill"]
    );
    assert_eq!(
        catalog.list_type_options(TypeList::Area).unwrap(),
        vec!["trench"]
    );
    assert!(matches!(
        catalog.add_type_option(TypeList::Area, "   "),
        Err(ServiceError::Repo(RepoError::Validation(
            RecordValidationError::BlankTypeOption
        )))
    ));
}

#[test]
fn concurrent_photo_adds_take_distinct_sequences() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 5;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("photos.db");
    let context = {
        let conn = open_db(&path).unwrap();
        seeded_context(&conn)
    };

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let photos = PhotoService::with_allocation_attempts(
                    SqlitePhotoRepository::try_new(&conn).unwrap(),
                    20,
                );
                barrier.wait();
                (0..PER_THREAD)
                    .map(|_| {
                        photos
                            .add_photo(&NewPhoto::context(context, "jpg"))
                            .unwrap()
                            .sequence
                    })
                    .collect::<Vec<u32>>()
            })
        })
        .collect();

    let mut seen = BTreeSet::new();
    for handle in handles {
        for sequence in handle.join().unwrap() {
            assert!(seen.insert(sequence), "sequence {sequence} handed out twice");
        }
    }
    let expected: BTreeSet<u32> = (1..=(THREADS * PER_THREAD) as u32).collect();
    assert_eq!(seen, expected);
}
