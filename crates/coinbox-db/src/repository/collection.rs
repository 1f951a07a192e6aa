//! # Collection Repository
//!
//! Database operations for collection records.
//!
//! ## Listing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How a listing is answered                            │
//! │                                                                         │
//! │  CollectionQuery { filter, page }                                      │
//! │       │                                                                 │
//! │       ├──► SELECT COUNT(*) ... WHERE <filters>          → total        │
//! │       │                                                                 │
//! │       └──► SELECT ... WHERE <filters>                                  │
//! │              ORDER BY collection_date DESC,                            │
//! │                       round_number DESC, id DESC                       │
//! │              LIMIT limit OFFSET (page - 1) × limit      → rows         │
//! │                                                                         │
//! │  Filters (all optional, all combined with AND):                        │
//! │    location  → case-insensitive substring of machine_location          │
//! │    week      → week_number = ?                                         │
//! │    startDate → collection_date >= ?                                    │
//! │    endDate   → collection_date <= ?                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::str::FromStr;
use tracing::debug;

use crate::error::{DbError, DbResult};
use coinbox_core::{
    CollectionAuthor, CollectionFields, CollectionFilter, CollectionIdentity, CollectionQuery,
    CollectionRecord, ExchangeFloat, Round,
};

const SELECT_COLUMNS: &str = r#"
    SELECT
        c.id,
        c.collection_date,
        c.round_number,
        c.week_number,
        c.machine_location,
        c.machine_coins_10baht,
        c.exchange_coins_1baht,
        c.exchange_coins_2baht,
        c.exchange_coins_5baht,
        c.exchange_coins_10baht,
        c.exchange_note_20baht,
        c.exchange_note_50baht,
        c.exchange_note_100baht,
        c.exchange_note_500baht,
        c.exchange_note_1000baht,
        c.postcards_remaining,
        c.cost_per_postcard,
        c.notes,
        c.created_by,
        c.created_at,
        c.updated_at,
        u.name AS author_name,
        u.email AS author_email
    FROM collections c
    JOIN users u ON u.id = c.created_by
"#;

// =============================================================================
// Row Mapping
// =============================================================================

/// A `collections` row joined with its author, exactly as SQLite hands it back.
#[derive(Debug, sqlx::FromRow)]
struct CollectionRow {
    id: i64,
    collection_date: NaiveDate,
    round_number: i64,
    week_number: i64,
    machine_location: String,
    machine_coins_10baht: i64,
    exchange_coins_1baht: i64,
    exchange_coins_2baht: i64,
    exchange_coins_5baht: i64,
    exchange_coins_10baht: i64,
    exchange_note_20baht: i64,
    exchange_note_50baht: i64,
    exchange_note_100baht: i64,
    exchange_note_500baht: i64,
    exchange_note_1000baht: i64,
    postcards_remaining: i64,
    cost_per_postcard: String,
    notes: Option<String>,
    created_by: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_name: Option<String>,
    author_email: String,
}

impl TryFrom<CollectionRow> for CollectionRecord {
    type Error = DbError;

    fn try_from(row: CollectionRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |reason: String| DbError::CorruptRow {
            entity: "collection",
            id,
            reason,
        };

        let round_number = Round::try_from(row.round_number)
            .map_err(|_| corrupt(format!("round_number {}", row.round_number)))?;
        let cost_per_postcard = Decimal::from_str(&row.cost_per_postcard)
            .map_err(|e| corrupt(format!("cost_per_postcard: {e}")))?;

        Ok(CollectionRecord {
            id,
            fields: CollectionFields {
                collection_date: row.collection_date,
                round_number,
                week_number: row.week_number,
                machine_location: row.machine_location,
                machine_coins_10baht: row.machine_coins_10baht,
                exchange: ExchangeFloat {
                    exchange_coins_1baht: row.exchange_coins_1baht,
                    exchange_coins_2baht: row.exchange_coins_2baht,
                    exchange_coins_5baht: row.exchange_coins_5baht,
                    exchange_coins_10baht: row.exchange_coins_10baht,
                    exchange_note_20baht: row.exchange_note_20baht,
                    exchange_note_50baht: row.exchange_note_50baht,
                    exchange_note_100baht: row.exchange_note_100baht,
                    exchange_note_500baht: row.exchange_note_500baht,
                    exchange_note_1000baht: row.exchange_note_1000baht,
                },
                postcards_remaining: row.postcards_remaining,
                cost_per_postcard,
                notes: row.notes,
            },
            created_by: row.created_by,
            user: CollectionAuthor {
                id: row.created_by,
                name: row.author_name,
                email: row.author_email,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Appends `AND ...` clauses for every filter that is set.
fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &CollectionFilter) {
    if let Some(location) = &filter.location {
        builder
            .push(" AND instr(lower(c.machine_location), lower(")
            .push_bind(location.clone())
            .push(")) > 0");
    }
    if let Some(week) = filter.week_number {
        builder.push(" AND c.week_number = ").push_bind(week);
    }
    if let Some(start) = filter.start_date {
        builder.push(" AND c.collection_date >= ").push_bind(start);
    }
    if let Some(end) = filter.end_date {
        builder.push(" AND c.collection_date <= ").push_bind(end);
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for collection database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.collections();
///
/// let record = repo.insert(&fields, user.id).await?;
/// let (page, total) = repo.list(&query).await?;
/// ```
#[derive(Debug, Clone)]
pub struct CollectionRepository {
    pool: SqlitePool,
}

impl CollectionRepository {
    /// Creates a new CollectionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CollectionRepository { pool }
    }

    /// Inserts a validated collection.
    ///
    /// ## Returns
    /// * `Ok(CollectionRecord)` - the stored record with its new id
    /// * `Err(DbError::UniqueViolation)` - (date, round, location) taken
    /// * `Err(DbError::ForeignKeyViolation)` - `created_by` is not a user
    pub async fn insert(
        &self,
        fields: &CollectionFields,
        created_by: i64,
    ) -> DbResult<CollectionRecord> {
        debug!(
            date = %fields.collection_date,
            round = %fields.round_number,
            location = %fields.machine_location,
            "Inserting collection"
        );

        let now = Utc::now();
        let exchange = &fields.exchange;

        let result = sqlx::query(
            r#"
            INSERT INTO collections (
                collection_date, round_number, week_number, machine_location,
                machine_coins_10baht,
                exchange_coins_1baht, exchange_coins_2baht, exchange_coins_5baht,
                exchange_coins_10baht, exchange_note_20baht, exchange_note_50baht,
                exchange_note_100baht, exchange_note_500baht, exchange_note_1000baht,
                postcards_remaining, cost_per_postcard, notes,
                created_by, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5,
                ?6, ?7, ?8,
                ?9, ?10, ?11,
                ?12, ?13, ?14,
                ?15, ?16, ?17,
                ?18, ?19, ?19
            )
            "#,
        )
        .bind(fields.collection_date)
        .bind(fields.round_number.number())
        .bind(fields.week_number)
        .bind(&fields.machine_location)
        .bind(fields.machine_coins_10baht)
        .bind(exchange.exchange_coins_1baht)
        .bind(exchange.exchange_coins_2baht)
        .bind(exchange.exchange_coins_5baht)
        .bind(exchange.exchange_coins_10baht)
        .bind(exchange.exchange_note_20baht)
        .bind(exchange.exchange_note_50baht)
        .bind(exchange.exchange_note_100baht)
        .bind(exchange.exchange_note_500baht)
        .bind(exchange.exchange_note_1000baht)
        .bind(fields.postcards_remaining)
        .bind(fields.cost_per_postcard.to_string())
        .bind(&fields.notes)
        .bind(created_by)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(id, "Collection inserted");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Collection", id))
    }

    /// Gets a collection by its id.
    ///
    /// ## Returns
    /// * `Ok(Some(CollectionRecord))` - Collection found
    /// * `Ok(None)` - No such id
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<CollectionRecord>> {
        let row = sqlx::query_as::<_, CollectionRow>(&format!("{SELECT_COLUMNS} WHERE c.id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(CollectionRecord::try_from).transpose()
    }

    /// Finds the collection holding `identity`, ignoring `exclude_id`.
    ///
    /// Location is compared exactly (case-sensitive), the same way the
    /// UNIQUE index compares it.
    pub async fn find_by_identity(
        &self,
        identity: &CollectionIdentity,
        exclude_id: Option<i64>,
    ) -> DbResult<Option<CollectionRecord>> {
        debug!(%identity, ?exclude_id, "Checking collection identity");

        let row = sqlx::query_as::<_, CollectionRow>(&format!(
            "{SELECT_COLUMNS} WHERE c.collection_date = ?1 AND c.round_number = ?2 \
             AND c.machine_location = ?3 AND (?4 IS NULL OR c.id <> ?4) LIMIT 1"
        ))
        .bind(identity.collection_date)
        .bind(identity.round_number.number())
        .bind(&identity.machine_location)
        .bind(exclude_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CollectionRecord::try_from).transpose()
    }

    /// Overwrites every caller-owned column of `record` and bumps
    /// `updated_at`.
    ///
    /// ## Returns
    /// * `Ok(CollectionRecord)` - the record as now stored
    /// * `Err(DbError::NotFound)` - no row with `record.id`
    /// * `Err(DbError::UniqueViolation)` - new identity already taken
    pub async fn update(&self, record: &CollectionRecord) -> DbResult<CollectionRecord> {
        debug!(id = record.id, "Updating collection");

        let now = Utc::now();
        let fields = &record.fields;
        let exchange = &fields.exchange;

        let result = sqlx::query(
            r#"
            UPDATE collections SET
                collection_date = ?2,
                round_number = ?3,
                week_number = ?4,
                machine_location = ?5,
                machine_coins_10baht = ?6,
                exchange_coins_1baht = ?7,
                exchange_coins_2baht = ?8,
                exchange_coins_5baht = ?9,
                exchange_coins_10baht = ?10,
                exchange_note_20baht = ?11,
                exchange_note_50baht = ?12,
                exchange_note_100baht = ?13,
                exchange_note_500baht = ?14,
                exchange_note_1000baht = ?15,
                postcards_remaining = ?16,
                cost_per_postcard = ?17,
                notes = ?18,
                updated_at = ?19
            WHERE id = ?1
            "#,
        )
        .bind(record.id)
        .bind(fields.collection_date)
        .bind(fields.round_number.number())
        .bind(fields.week_number)
        .bind(&fields.machine_location)
        .bind(fields.machine_coins_10baht)
        .bind(exchange.exchange_coins_1baht)
        .bind(exchange.exchange_coins_2baht)
        .bind(exchange.exchange_coins_5baht)
        .bind(exchange.exchange_coins_10baht)
        .bind(exchange.exchange_note_20baht)
        .bind(exchange.exchange_note_50baht)
        .bind(exchange.exchange_note_100baht)
        .bind(exchange.exchange_note_500baht)
        .bind(exchange.exchange_note_1000baht)
        .bind(fields.postcards_remaining)
        .bind(fields.cost_per_postcard.to_string())
        .bind(&fields.notes)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Collection", record.id));
        }

        Ok(CollectionRecord {
            updated_at: now,
            ..record.clone()
        })
    }

    /// Deletes a collection outright.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no row with `id`
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting collection");

        let result = sqlx::query("DELETE FROM collections WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Collection", id));
        }

        Ok(())
    }

    /// Returns one page of collections matching `query`, newest first,
    /// together with the number of matches across all pages.
    pub async fn list(&self, query: &CollectionQuery) -> DbResult<(Vec<CollectionRecord>, i64)> {
        debug!(
            page = query.page.page,
            limit = query.page.limit,
            filter = ?query.filter,
            "Listing collections"
        );

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM collections c WHERE 1 = 1");
        push_filters(&mut count, &query.filter);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Sqlite>::new(format!("{SELECT_COLUMNS} WHERE 1 = 1"));
        push_filters(&mut select, &query.filter);
        select
            .push(" ORDER BY c.collection_date DESC, c.round_number DESC, c.id DESC LIMIT ")
            .push_bind(i64::from(query.page.limit))
            .push(" OFFSET ")
            .push_bind(query.page.offset());

        let rows: Vec<CollectionRow> = select.build_query_as::<CollectionRow>().fetch_all(&self.pool).await?;
        let records = rows
            .into_iter()
            .map(CollectionRecord::try_from)
            .collect::<DbResult<Vec<_>>>()?;

        debug!(count = records.len(), total, "Listing returned collections");
        Ok((records, total))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
