//! Subcommand handlers. Each prints its result to stdout.

use crate::error::{CliError, CliResult};
use sitecat_core::geo::latlong_to_utm_in_zone;
use sitecat_core::{
    open_db, project, utm_to_latlong, ActionFilter, AreaScope, AuditService, BagPhotoSource,
    CatalogService, ContextFields, ContextScope, CoreConfig, Hemisphere, NewContext, NewFind,
    NewPhoto, PhotoRecord, PhotoService, PhotoSubject, Scope, SqliteAuditRepository,
    SqliteCatalogRepository, SqlitePhotoRepository, TypeList,
};

pub fn to_utm(latitude: f64, longitude: f64, zone: Option<u8>) -> CliResult<()> {
    match zone {
        Some(zone) => {
            let utm = latlong_to_utm_in_zone(latitude, longitude, zone)?;
            println!(
                "{} {} {:.3} {:.3}",
                utm.zone, utm.hemisphere, utm.easting, utm.northing
            );
        }
        None => {
            let projection = project(latitude, longitude)?;
            let utm = projection.utm;
            println!(
                "{} {} {:.3} {:.3} k={:.8} convergence={:.6}",
                utm.zone,
                utm.hemisphere,
                utm.easting,
                utm.northing,
                projection.scale_factor,
                projection.convergence_degrees
            );
        }
    }
    Ok(())
}

pub fn to_latlong(zone: u8, hemisphere: Hemisphere, easting: f64, northing: f64) -> CliResult<()> {
    let point = utm_to_latlong(zone, easting, northing, hemisphere.as_char())?;
    println!("{:.8} {:.8}", point.latitude, point.longitude);
    Ok(())
}

pub fn register_area(config: &CoreConfig, area: AreaScope, area_type: String) -> CliResult<()> {
    with_catalog(config, |catalog| {
        let stored = catalog.register_area(area, area_type)?;
        println!(
            "{} {:.8} {:.8}",
            stored.scope,
            stored.latitude.unwrap_or_default(),
            stored.longitude.unwrap_or_default()
        );
        Ok(())
    })
}

pub fn new_context(
    config: &CoreConfig,
    area: AreaScope,
    number: Option<u32>,
    fields: ContextFields,
) -> CliResult<()> {
    with_catalog(config, |catalog| {
        let draft = NewContext {
            area,
            context_number: number,
            fields,
        };
        let context = catalog.create_context(&draft)?;
        println!("{} {}", context.scope, context.id);
        Ok(())
    })
}

pub fn new_find(
    config: &CoreConfig,
    context: ContextScope,
    number: Option<u32>,
    material: Option<(String, String)>,
    notes: String,
) -> CliResult<()> {
    with_catalog(config, |catalog| {
        let draft = NewFind {
            context,
            find_number: number,
            material_category: material,
            director_notes: notes,
        };
        let find = catalog.create_find(&draft)?;
        println!("{} {}", find.scope, find.id);
        Ok(())
    })
}

pub fn finds(config: &CoreConfig, context: ContextScope) -> CliResult<()> {
    with_catalog(config, |catalog| {
        for number in catalog.list_find_numbers(&context)? {
            println!("{number}");
        }
        Ok(())
    })
}

pub fn photo_add(
    config: &CoreConfig,
    scope: Scope,
    extension: String,
    bag: Option<BagPhotoSource>,
) -> CliResult<()> {
    let draft = match (photo_subject(scope, bag.is_some())?, bag) {
        (PhotoSubject::Bag(context), Some(source)) => NewPhoto::bag(context, source, extension),
        (PhotoSubject::Find(find), _) => NewPhoto::find(find, extension),
        (PhotoSubject::Context(context) | PhotoSubject::Bag(context), _) => {
            NewPhoto::context(context, extension)
        }
    };
    with_photos(config, |photos| {
        print_photo(&photos.add_photo(&draft)?);
        Ok(())
    })
}

pub fn photos(config: &CoreConfig, scope: Scope, bag: bool) -> CliResult<()> {
    let subject = photo_subject(scope, bag)?;
    with_photos(config, |photos| {
        for photo in photos.list_photos(&subject)? {
            print_photo(&photo);
        }
        Ok(())
    })
}

pub fn photo_replace(
    config: &CoreConfig,
    scope: Scope,
    file_name: &str,
    bag: bool,
) -> CliResult<()> {
    let subject = photo_subject(scope, bag)?;
    with_photos(config, |photos| {
        print_photo(&photos.replace_photo(&subject, file_name)?);
        Ok(())
    })
}

pub fn types(config: &CoreConfig, list: TypeList, add: Option<String>) -> CliResult<()> {
    with_catalog(config, |catalog| {
        if let Some(value) = add {
            catalog.add_type_option(list, &value)?;
        }
        for option in catalog.list_type_options(list)? {
            println!("{option}");
        }
        Ok(())
    })
}

pub fn history(config: &CoreConfig, object_id: Option<String>, limit: u32) -> CliResult<()> {
    let conn = open_db(&config.db_path)?;
    let audit = AuditService::new(SqliteAuditRepository::try_new(&conn)?);
    let filter = ActionFilter {
        object_id,
        limit: Some(limit),
        ..ActionFilter::default()
    };
    for entry in audit.list_actions(&filter)? {
        println!(
            "{} {} {} {}",
            entry.timestamp,
            entry.action.as_db(),
            entry.model.as_db(),
            entry.object_id
        );
    }
    Ok(())
}

fn photo_subject(scope: Scope, bag: bool) -> CliResult<PhotoSubject> {
    match (scope, bag) {
        (Scope::Context(context), false) => Ok(PhotoSubject::Context(context)),
        (Scope::Context(context), true) => Ok(PhotoSubject::Bag(context)),
        (Scope::Find(find), false) => Ok(PhotoSubject::Find(find)),
        (Scope::Find(find), true) => Err(CliError::Usage(format!(
            "bag photos belong to a context, not find {find}"
        ))),
        (Scope::Area(area), _) => Err(CliError::Usage(format!(
            "photos belong to a context or find, not area {area}"
        ))),
    }
}

fn print_photo(photo: &PhotoRecord) {
    let source = photo.bag_source.map_or("-", BagPhotoSource::as_db);
    let replaced = photo
        .replaced_at
        .map_or_else(|| "-".to_string(), |value| value.to_string());
    println!(
        "{} {} {} {} {}",
        photo.path, photo.id, source, photo.created_at, replaced
    );
}

fn with_photos<T>(
    config: &CoreConfig,
    run: impl FnOnce(&PhotoService<SqlitePhotoRepository<'_>>) -> CliResult<T>,
) -> CliResult<T> {
    let conn = open_db(&config.db_path)?;
    let repo = SqlitePhotoRepository::try_new(&conn)?;
    let photos = PhotoService::with_allocation_attempts(repo, config.allocation_attempts);
    run(&photos)
}

fn with_catalog<T>(
    config: &CoreConfig,
    run: impl FnOnce(&CatalogService<SqliteCatalogRepository<'_>>) -> CliResult<T>,
) -> CliResult<T> {
    let conn = open_db(&config.db_path)?;
    let repo = SqliteCatalogRepository::try_new(&conn)?;
    let catalog = CatalogService::with_allocation_attempts(repo, config.allocation_attempts);
    run(&catalog)
}
