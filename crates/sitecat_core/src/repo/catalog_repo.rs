//! Catalog repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist spatial areas, contexts, finds and material categories.
//! - Keep the area-type and context-type option lists.
//! - Run number allocation and insert inside one write transaction.
//! - Provide the hemisphere → zone → easting → northing browse queries.
//!
//! # Invariants
//! - Writes that allocate a number start with `BEGIN IMMEDIATE`, so the
//!   read of the current maximum and the insert see the same snapshot.
//! - Parent areas/contexts are get-or-create; repeating a create never
//!   fails because a parent already exists.
//! - Listings are deterministic: scope tuple ascending.
//! - Area, context and find creates and updates append an action log entry
//!   in the same transaction, including implicitly created parents.

use crate::geo::Hemisphere;
use crate::model::audit::{AuditAction, AuditModel};
use crate::model::catalog::{
    normalize_type_option, ContextFields, ContextId, FindId, MaterialCategory, NewContext,
    NewFind, ObjectFind, RecordValidationError, SpatialArea, SpatialContext, TypeList,
};
use crate::model::scope::{AreaScope, ContextScope, FindScope, Scope};
use crate::repo::audit_repo::{record_action, ACTION_LOG_SCHEMA};
use crate::repo::{
    allocating_transaction, ensure_connection_ready, insert_error, parse_uuid, query_all,
    query_one, write_transaction, RepoError, RepoResult,
};
use crate::service::allocator::{
    allocate_context_number, allocate_find_number, choose_number, ensure_scope_exists, AreaRowId,
    ScopeStore, SequenceSource,
};
use rusqlite::{params, Connection, OptionalExtension, Params, Row};
use std::str::FromStr;
use uuid::Uuid;

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    (
        "spatial_areas",
        &[
            "id",
            "utm_hemisphere",
            "utm_zone",
            "area_utm_easting_meters",
            "area_utm_northing_meters",
            "type",
            "latitude",
            "longitude",
        ],
    ),
    (
        "spatial_contexts",
        &[
            "uuid",
            "area_id",
            "context_number",
            "type",
            "opening_date",
            "closing_date",
            "description",
            "director_notes",
        ],
    ),
    (
        "object_finds",
        &[
            "uuid",
            "context_uuid",
            "find_number",
            "material_category_id",
            "director_notes",
            "created_at",
        ],
    ),
    ("material_categories", &["id", "material", "category"]),
    ("area_types", &["type"]),
    ("context_types", &["type"]),
    ACTION_LOG_SCHEMA,
];

const AREA_SELECT: &str = "SELECT
        a.utm_hemisphere,
        a.utm_zone,
        a.area_utm_easting_meters,
        a.area_utm_northing_meters,
        a.type,
        a.latitude,
        a.longitude
    FROM spatial_areas a";

const CONTEXT_SELECT: &str = "SELECT
        c.uuid,
        a.utm_hemisphere,
        a.utm_zone,
        a.area_utm_easting_meters,
        a.area_utm_northing_meters,
        c.context_number,
        c.type,
        c.opening_date,
        c.closing_date,
        c.description,
        c.director_notes
    FROM spatial_contexts c
    JOIN spatial_areas a ON a.id = c.area_id";

const FIND_SELECT: &str = "SELECT
        f.uuid,
        a.utm_hemisphere,
        a.utm_zone,
        a.area_utm_easting_meters,
        a.area_utm_northing_meters,
        c.context_number,
        f.find_number,
        m.id,
        m.material,
        m.category,
        f.director_notes,
        f.created_at
    FROM object_finds f
    JOIN spatial_contexts c ON c.uuid = f.context_uuid
    JOIN spatial_areas a ON a.id = c.area_id
    LEFT JOIN material_categories m ON m.id = f.material_category_id";

pub(crate) const AREA_MATCH: &str = "a.utm_hemisphere = ?1
        AND a.utm_zone = ?2
        AND a.area_utm_easting_meters = ?3
        AND a.area_utm_northing_meters = ?4";

/// Prefix filter for [`CatalogRepository::list_areas`]. `None` matches any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AreaFilter {
    pub hemisphere: Option<Hemisphere>,
    pub zone: Option<u8>,
    pub easting: Option<i64>,
    pub northing: Option<i64>,
}

/// Repository interface for catalog operations.
pub trait CatalogRepository {
    /// Inserts an area or updates its type and display coordinate.
    fn save_area(&self, area: &SpatialArea) -> RepoResult<()>;
    /// Loads one area by scope.
    fn get_area(&self, scope: &AreaScope) -> RepoResult<Option<SpatialArea>>;
    /// Lists areas matching the filter.
    fn list_areas(&self, filter: &AreaFilter) -> RepoResult<Vec<SpatialArea>>;
    /// Creates one context, allocating its number unless the draft has one.
    fn create_context(&self, draft: &NewContext) -> RepoResult<SpatialContext>;
    /// Loads one context by id.
    fn get_context(&self, id: ContextId) -> RepoResult<Option<SpatialContext>>;
    /// Loads one context by scope.
    fn get_context_by_scope(&self, scope: &ContextScope) -> RepoResult<Option<SpatialContext>>;
    /// Lists contexts of one area by number.
    fn list_contexts(&self, area: &AreaScope) -> RepoResult<Vec<SpatialContext>>;
    /// Replaces the editable attributes of one context.
    fn update_context(&self, id: ContextId, fields: &ContextFields)
        -> RepoResult<SpatialContext>;
    /// Creates one find, allocating its number unless the draft has one.
    fn create_find(&self, draft: &NewFind) -> RepoResult<ObjectFind>;
    /// Loads one find by id.
    fn get_find(&self, id: FindId) -> RepoResult<Option<ObjectFind>>;
    /// Loads one find by scope.
    fn get_find_by_scope(&self, scope: &FindScope) -> RepoResult<Option<ObjectFind>>;
    /// Lists find numbers of one context, ascending.
    fn list_find_numbers(&self, context: &ContextScope) -> RepoResult<Vec<u32>>;
    /// Returns the material/category option, creating it on first use.
    fn get_or_create_material_category(
        &self,
        material: &str,
        category: &str,
    ) -> RepoResult<MaterialCategory>;
    /// Lists material/category options by material then category.
    fn list_material_categories(&self) -> RepoResult<Vec<MaterialCategory>>;
    /// Adds a trimmed option to `list`; adding an existing option is a no-op.
    fn add_type_option(&self, list: TypeList, value: &str) -> RepoResult<String>;
    /// Options of `list`, ascending.
    fn list_type_options(&self, list: TypeList) -> RepoResult<Vec<String>>;
    /// Hemispheres that have at least one area.
    fn list_hemispheres(&self) -> RepoResult<Vec<Hemisphere>>;
    /// Zones with areas in `hemisphere`.
    fn list_zones(&self, hemisphere: Hemisphere) -> RepoResult<Vec<u8>>;
    /// Area eastings within one zone.
    fn list_eastings(&self, hemisphere: Hemisphere, zone: u8) -> RepoResult<Vec<i64>>;
    /// Area northings within one easting column.
    fn list_northings(
        &self,
        hemisphere: Hemisphere,
        zone: u8,
        easting: i64,
    ) -> RepoResult<Vec<i64>>;
}

/// SQLite-backed catalog repository.
pub struct SqliteCatalogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_SCHEMA)?;
        Ok(Self { conn })
    }
}

impl CatalogRepository for SqliteCatalogRepository<'_> {
    fn save_area(&self, area: &SpatialArea) -> RepoResult<()> {
        area.scope.validate()?;
        area.validate()?;
        write_transaction(self.conn, |conn| {
            let existed: i64 = conn.query_row(
                &format!("SELECT EXISTS(SELECT 1 FROM spatial_areas a WHERE {AREA_MATCH});"),
                area_params(&area.scope),
                |row| row.get(0),
            )?;
            conn.execute(
                "INSERT INTO spatial_areas (
                    utm_hemisphere,
                    utm_zone,
                    area_utm_easting_meters,
                    area_utm_northing_meters,
                    type,
                    latitude,
                    longitude
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT (
                    utm_hemisphere,
                    utm_zone,
                    area_utm_easting_meters,
                    area_utm_northing_meters
                )
                DO UPDATE SET
                    type = excluded.type,
                    latitude = excluded.latitude,
                    longitude = excluded.longitude;",
                params![
                    area.scope.hemisphere.as_str(),
                    i64::from(area.scope.zone),
                    area.scope.easting,
                    area.scope.northing,
                    area.area_type,
                    area.latitude,
                    area.longitude,
                ],
            )?;
            let action = if existed == 1 {
                AuditAction::Update
            } else {
                AuditAction::Create
            };
            record_action(conn, action, AuditModel::SpatialArea, &area.scope.to_string())
        })
    }

    fn get_area(&self, scope: &AreaScope) -> RepoResult<Option<SpatialArea>> {
        query_one(
            self.conn,
            &format!("{AREA_SELECT} WHERE {AREA_MATCH};"),
            area_params(scope),
            parse_area_row,
        )
    }

    fn list_areas(&self, filter: &AreaFilter) -> RepoResult<Vec<SpatialArea>> {
        query_all(
            self.conn,
            &format!(
                "{AREA_SELECT}
                WHERE (?1 IS NULL OR a.utm_hemisphere = ?1)
                  AND (?2 IS NULL OR a.utm_zone = ?2)
                  AND (?3 IS NULL OR a.area_utm_easting_meters = ?3)
                  AND (?4 IS NULL OR a.area_utm_northing_meters = ?4)
                ORDER BY
                    a.utm_hemisphere ASC,
                    a.utm_zone ASC,
                    a.area_utm_easting_meters ASC,
                    a.area_utm_northing_meters ASC;"
            ),
            params![
                filter.hemisphere.map(Hemisphere::as_str),
                filter.zone.map(i64::from),
                filter.easting,
                filter.northing,
            ],
            parse_area_row,
        )
    }

    fn create_context(&self, draft: &NewContext) -> RepoResult<SpatialContext> {
        draft.area.validate()?;
        draft.validate()?;

        allocating_transaction(self.conn, &draft.area, |conn| {
            let store = TransactionScopeStore { conn };
            let ensured = ensure_scope_exists(&store, &Scope::Area(draft.area))?;
            let choice = choose_number(draft.context_number, "context_number", || {
                allocate_context_number(&store, &draft.area)
            })?;
            let scope = ContextScope::new(draft.area, choice.value())?;
            let id = Uuid::new_v4();
            let fields = &draft.fields;

            conn.execute(
                "INSERT INTO spatial_contexts (
                    uuid,
                    area_id,
                    context_number,
                    type,
                    opening_date,
                    closing_date,
                    description,
                    director_notes
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                params![
                    id.to_string(),
                    ensured.area_id,
                    i64::from(scope.context_number),
                    fields.context_type,
                    fields.opening_date,
                    fields.closing_date,
                    fields.description,
                    fields.director_notes,
                ],
            )
            .map_err(|err| insert_error(err, choice, &scope))?;
            record_action(
                conn,
                AuditAction::Create,
                AuditModel::SpatialContext,
                &id.to_string(),
            )?;

            Ok(SpatialContext {
                id,
                scope,
                context_type: fields.context_type.clone(),
                opening_date: fields.opening_date,
                closing_date: fields.closing_date,
                description: fields.description.clone(),
                director_notes: fields.director_notes.clone(),
            })
        })
    }

    fn get_context(&self, id: ContextId) -> RepoResult<Option<SpatialContext>> {
        query_one(
            self.conn,
            &format!("{CONTEXT_SELECT} WHERE c.uuid = ?1;"),
            [id.to_string()],
            parse_context_row,
        )
    }

    fn get_context_by_scope(&self, scope: &ContextScope) -> RepoResult<Option<SpatialContext>> {
        let area = &scope.area;
        query_one(
            self.conn,
            &format!("{CONTEXT_SELECT} WHERE {AREA_MATCH} AND c.context_number = ?5;"),
            params![
                area.hemisphere.as_str(),
                i64::from(area.zone),
                area.easting,
                area.northing,
                i64::from(scope.context_number),
            ],
            parse_context_row,
        )
    }

    fn list_contexts(&self, area: &AreaScope) -> RepoResult<Vec<SpatialContext>> {
        query_all(
            self.conn,
            &format!("{CONTEXT_SELECT} WHERE {AREA_MATCH} ORDER BY c.context_number ASC;"),
            area_params(area),
            parse_context_row,
        )
    }

    fn update_context(
        &self,
        id: ContextId,
        fields: &ContextFields,
    ) -> RepoResult<SpatialContext> {
        fields.validate()?;
        write_transaction(self.conn, |conn| {
            let changed = conn.execute(
                "UPDATE spatial_contexts
                 SET type = ?2,
                     opening_date = ?3,
                     closing_date = ?4,
                     description = ?5,
                     director_notes = ?6,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?1;",
                params![
                    id.to_string(),
                    fields.context_type,
                    fields.opening_date,
                    fields.closing_date,
                    fields.description,
                    fields.director_notes,
                ],
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound(format!("context {id}")));
            }
            record_action(
                conn,
                AuditAction::Update,
                AuditModel::SpatialContext,
                &id.to_string(),
            )
        })?;
        self.get_context(id)?
            .ok_or_else(|| RepoError::NotFound(format!("context {id}")))
    }

    fn create_find(&self, draft: &NewFind) -> RepoResult<ObjectFind> {
        let context = ContextScope::new(draft.context.area, draft.context.context_number)?;
        draft.validate()?;

        allocating_transaction(self.conn, &context, |conn| {
            let store = TransactionScopeStore { conn };
            let ensured = ensure_scope_exists(&store, &Scope::Context(context))?;
            let context_id = ensured.context_id.ok_or_else(|| {
                RepoError::InvalidData(format!("context {context} was not stored"))
            })?;
            let material_category = match &draft.material_category {
                Some((material, category)) => {
                    Some(material_category_in(conn, material, category)?)
                }
                None => None,
            };
            let choice = choose_number(draft.find_number, "find_number", || {
                allocate_find_number(&store, &context)
            })?;
            let scope = FindScope::new(context, choice.value())?;
            let id = Uuid::new_v4();

            let created_at: i64 = conn
                .query_row(
                    "INSERT INTO object_finds (
                        uuid,
                        context_uuid,
                        find_number,
                        material_category_id,
                        director_notes
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    RETURNING created_at;",
                    params![
                        id.to_string(),
                        context_id.to_string(),
                        i64::from(scope.find_number),
                        material_category.as_ref().map(|value| value.id),
                        draft.director_notes,
                    ],
                    |row| row.get(0),
                )
                .map_err(|err| insert_error(err, choice, &scope))?;
            record_action(conn, AuditAction::Create, AuditModel::ObjectFind, &id.to_string())?;

            Ok(ObjectFind {
                id,
                scope,
                material_category,
                director_notes: draft.director_notes.clone(),
                created_at,
            })
        })
    }

    fn get_find(&self, id: FindId) -> RepoResult<Option<ObjectFind>> {
        query_one(
            self.conn,
            &format!("{FIND_SELECT} WHERE f.uuid = ?1;"),
            [id.to_string()],
            parse_find_row,
        )
    }

    fn get_find_by_scope(&self, scope: &FindScope) -> RepoResult<Option<ObjectFind>> {
        let area = scope.area();
        query_one(
            self.conn,
            &format!(
                "{FIND_SELECT}
                WHERE {AREA_MATCH}
                  AND c.context_number = ?5
                  AND f.find_number = ?6;"
            ),
            params![
                area.hemisphere.as_str(),
                i64::from(area.zone),
                area.easting,
                area.northing,
                i64::from(scope.context.context_number),
                i64::from(scope.find_number),
            ],
            parse_find_row,
        )
    }

    fn list_find_numbers(&self, context: &ContextScope) -> RepoResult<Vec<u32>> {
        let area = &context.area;
        let values = distinct_integers(
            self.conn,
            &format!(
                "SELECT f.find_number
                FROM object_finds f
                JOIN spatial_contexts c ON c.uuid = f.context_uuid
                JOIN spatial_areas a ON a.id = c.area_id
                WHERE {AREA_MATCH} AND c.context_number = ?5
                ORDER BY f.find_number ASC;"
            ),
            params![
                area.hemisphere.as_str(),
                i64::from(area.zone),
                area.easting,
                area.northing,
                i64::from(context.context_number),
            ],
        )?;
        values
            .into_iter()
            .map(|value| to_number(value, "object_finds.find_number"))
            .collect()
    }

    fn get_or_create_material_category(
        &self,
        material: &str,
        category: &str,
    ) -> RepoResult<MaterialCategory> {
        material_category_in(self.conn, material, category)
    }

    fn list_material_categories(&self) -> RepoResult<Vec<MaterialCategory>> {
        query_all(
            self.conn,
            "SELECT id, material, category
             FROM material_categories
             ORDER BY material ASC, category ASC;",
            [],
            |row| {
                Ok(MaterialCategory {
                    id: row.get(0)?,
                    material: row.get(1)?,
                    category: row.get(2)?,
                })
            },
        )
    }

    fn add_type_option(&self, list: TypeList, value: &str) -> RepoResult<String> {
        let value = normalize_type_option(value)?;
        self.conn.execute(
            &format!("INSERT OR IGNORE INTO {} (type) VALUES (?1);", list.table()),
            [&value],
        )?;
        Ok(value)
    }

    fn list_type_options(&self, list: TypeList) -> RepoResult<Vec<String>> {
        query_all(
            self.conn,
            &format!("SELECT type FROM {} ORDER BY type ASC;", list.table()),
            [],
            |row| Ok(row.get(0)?),
        )
    }

    fn list_hemispheres(&self) -> RepoResult<Vec<Hemisphere>> {
        query_all(
            self.conn,
            "SELECT DISTINCT utm_hemisphere
             FROM spatial_areas
             ORDER BY utm_hemisphere ASC;",
            [],
            |row| parse_hemisphere(&row.get::<_, String>(0)?),
        )
    }

    fn list_zones(&self, hemisphere: Hemisphere) -> RepoResult<Vec<u8>> {
        let values = distinct_integers(
            self.conn,
            "SELECT DISTINCT utm_zone
             FROM spatial_areas
             WHERE utm_hemisphere = ?1
             ORDER BY utm_zone ASC;",
            [hemisphere.as_str()],
        )?;
        values.into_iter().map(to_zone).collect()
    }

    fn list_eastings(&self, hemisphere: Hemisphere, zone: u8) -> RepoResult<Vec<i64>> {
        distinct_integers(
            self.conn,
            "SELECT DISTINCT area_utm_easting_meters
             FROM spatial_areas
             WHERE utm_hemisphere = ?1 AND utm_zone = ?2
             ORDER BY area_utm_easting_meters ASC;",
            params![hemisphere.as_str(), i64::from(zone)],
        )
    }

    fn list_northings(
        &self,
        hemisphere: Hemisphere,
        zone: u8,
        easting: i64,
    ) -> RepoResult<Vec<i64>> {
        distinct_integers(
            self.conn,
            "SELECT DISTINCT area_utm_northing_meters
             FROM spatial_areas
             WHERE utm_hemisphere = ?1 AND utm_zone = ?2 AND area_utm_easting_meters = ?3
             ORDER BY area_utm_northing_meters ASC;",
            params![hemisphere.as_str(), i64::from(zone), easting],
        )
    }
}

/// Allocation view of a connection that is inside a write transaction.
struct TransactionScopeStore<'a> {
    conn: &'a Connection,
}

impl SequenceSource for TransactionScopeStore<'_> {
    fn max_context_number(&self, area: &AreaScope) -> RepoResult<Option<u32>> {
        let current: Option<i64> = self.conn.query_row(
            &format!(
                "SELECT MAX(c.context_number)
                FROM spatial_contexts c
                JOIN spatial_areas a ON a.id = c.area_id
                WHERE {AREA_MATCH};"
            ),
            area_params(area),
            |row| row.get(0),
        )?;
        current
            .map(|value| to_number(value, "spatial_contexts.context_number"))
            .transpose()
    }

    fn max_find_number(&self, context: &ContextScope) -> RepoResult<Option<u32>> {
        let area = &context.area;
        let current: Option<i64> = self.conn.query_row(
            &format!(
                "SELECT MAX(f.find_number)
                FROM object_finds f
                JOIN spatial_contexts c ON c.uuid = f.context_uuid
                JOIN spatial_areas a ON a.id = c.area_id
                WHERE {AREA_MATCH} AND c.context_number = ?5;"
            ),
            params![
                area.hemisphere.as_str(),
                i64::from(area.zone),
                area.easting,
                area.northing,
                i64::from(context.context_number),
            ],
            |row| row.get(0),
        )?;
        current
            .map(|value| to_number(value, "object_finds.find_number"))
            .transpose()
    }
}

impl ScopeStore for TransactionScopeStore<'_> {
    fn get_or_create_area(&self, area: &AreaScope) -> RepoResult<AreaRowId> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO spatial_areas (
                utm_hemisphere,
                utm_zone,
                area_utm_easting_meters,
                area_utm_northing_meters
            )
            VALUES (?1, ?2, ?3, ?4);",
            area_params(area),
        )?;
        if inserted > 0 {
            record_action(
                self.conn,
                AuditAction::Create,
                AuditModel::SpatialArea,
                &area.to_string(),
            )?;
        }
        self.conn
            .query_row(
                &format!("SELECT a.id FROM spatial_areas a WHERE {AREA_MATCH};"),
                area_params(area),
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| RepoError::InvalidData(format!("area {area} was not stored")))
    }

    fn get_or_create_context(
        &self,
        area_id: AreaRowId,
        context: &ContextScope,
    ) -> RepoResult<ContextId> {
        let candidate = Uuid::new_v4().to_string();
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO spatial_contexts (uuid, area_id, context_number)
             VALUES (?1, ?2, ?3);",
            params![candidate, area_id, i64::from(context.context_number)],
        )?;
        if inserted > 0 {
            record_action(
                self.conn,
                AuditAction::Create,
                AuditModel::SpatialContext,
                &candidate,
            )?;
        }
        let stored: Option<String> = self
            .conn
            .query_row(
                "SELECT uuid
                 FROM spatial_contexts
                 WHERE area_id = ?1 AND context_number = ?2;",
                params![area_id, i64::from(context.context_number)],
                |row| row.get(0),
            )
            .optional()?;
        match stored {
            Some(value) => parse_uuid(&value, "spatial_contexts.uuid"),
            None => Err(RepoError::InvalidData(format!(
                "context {context} was not stored"
            ))),
        }
    }
}

fn material_category_in(
    conn: &Connection,
    material: &str,
    category: &str,
) -> RepoResult<MaterialCategory> {
    let material = material.trim();
    let category = category.trim();
    if material.is_empty() || category.is_empty() {
        return Err(RecordValidationError::BlankMaterialCategory.into());
    }
    conn.execute(
        "INSERT OR IGNORE INTO material_categories (material, category) VALUES (?1, ?2);",
        params![material, category],
    )?;
    let id: i64 = conn.query_row(
        "SELECT id FROM material_categories WHERE material = ?1 AND category = ?2;",
        params![material, category],
        |row| row.get(0),
    )?;
    Ok(MaterialCategory {
        id,
        material: material.to_string(),
        category: category.to_string(),
    })
}

pub(crate) fn area_params(area: &AreaScope) -> (&'static str, i64, i64, i64) {
    (
        area.hemisphere.as_str(),
        i64::from(area.zone),
        area.easting,
        area.northing,
    )
}

fn distinct_integers<P: Params>(conn: &Connection, sql: &str, params: P) -> RepoResult<Vec<i64>> {
    query_all(conn, sql, params, |row| Ok(row.get(0)?))
}

pub(crate) fn parse_area_scope(row: &Row<'_>, start: usize) -> RepoResult<AreaScope> {
    let hemisphere = parse_hemisphere(&row.get::<_, String>(start)?)?;
    let zone = to_zone(row.get(start + 1)?)?;
    AreaScope::new(hemisphere, zone, row.get(start + 2)?, row.get(start + 3)?)
        .map_err(|err| RepoError::InvalidData(format!("stored area scope: {err}")))
}

fn parse_area_row(row: &Row<'_>) -> RepoResult<SpatialArea> {
    Ok(SpatialArea {
        scope: parse_area_scope(row, 0)?,
        area_type: row.get(4)?,
        latitude: row.get(5)?,
        longitude: row.get(6)?,
    })
}

fn parse_context_row(row: &Row<'_>) -> RepoResult<SpatialContext> {
    let id: String = row.get(0)?;
    let area = parse_area_scope(row, 1)?;
    let context_number = to_number(row.get(5)?, "spatial_contexts.context_number")?;
    Ok(SpatialContext {
        id: parse_uuid(&id, "spatial_contexts.uuid")?,
        scope: ContextScope::new(area, context_number)
            .map_err(|err| RepoError::InvalidData(format!("stored context scope: {err}")))?,
        context_type: row.get(6)?,
        opening_date: row.get(7)?,
        closing_date: row.get(8)?,
        description: row.get(9)?,
        director_notes: row.get(10)?,
    })
}

fn parse_find_row(row: &Row<'_>) -> RepoResult<ObjectFind> {
    let id: String = row.get(0)?;
    let area = parse_area_scope(row, 1)?;
    let context_number = to_number(row.get(5)?, "spatial_contexts.context_number")?;
    let find_number = to_number(row.get(6)?, "object_finds.find_number")?;
    let scope = ContextScope::new(area, context_number)
        .and_then(|context| context.find(find_number))
        .map_err(|err| RepoError::InvalidData(format!("stored find scope: {err}")))?;

    let material_id: Option<i64> = row.get(7)?;
    let material_category = match material_id {
        Some(id) => Some(MaterialCategory {
            id,
            material: row.get(8)?,
            category: row.get(9)?,
        }),
        None => None,
    };

    Ok(ObjectFind {
        id: parse_uuid(&id, "object_finds.uuid")?,
        scope,
        material_category,
        director_notes: row.get(10)?,
        created_at: row.get(11)?,
    })
}

fn parse_hemisphere(value: &str) -> RepoResult<Hemisphere> {
    Hemisphere::from_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid hemisphere `{value}`")))
}

fn to_zone(value: i64) -> RepoResult<u8> {
    u8::try_from(value).map_err(|_| RepoError::InvalidData(format!("invalid utm zone `{value}`")))
}

pub(crate) fn to_number(value: i64, column: &'static str) -> RepoResult<u32> {
    u32::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid number `{value}` in {column}")))
}
