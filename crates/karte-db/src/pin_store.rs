//! Pin persistence.
//!
//! Pins are created as drafts (from a map click or a geocoded address),
//! may be re-classified by the assistant, and become confirmed once the
//! user accepts a name and category.

use chrono::{DateTime, Utc};
use karte_types::{Classification, Pin, PinCategory, PinId, PinStatus};
use sqlx::SqlitePool;

use crate::error::DbError;

/// Columns selected for every pin query, in [`PinRow`] order.
const PIN_COLUMNS: &str = "id, lat, lng, name, category, status, confidence, created_at, updated_at";

/// Fields for a new draft pin.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPin {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Optional display name.
    pub name: Option<String>,
    /// Place category.
    pub category: PinCategory,
    /// Classifier confidence, if known.
    pub confidence: Option<f64>,
}

impl NewPin {
    /// An unnamed, unclassified draft at the given coordinates.
    pub const fn at(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            name: None,
            category: PinCategory::Other,
            confidence: None,
        }
    }
}

/// Operations on the `pins` table.
pub struct PinStore<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PinStore<'a> {
    /// Create a new pin store bound to a connection pool.
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All pins in creation order.
    pub async fn list(&self) -> Result<Vec<Pin>, DbError> {
        let rows = sqlx::query_as::<_, PinRow>(&format!(
            "SELECT {PIN_COLUMNS} FROM pins ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(PinRow::into_pin).collect())
    }

    /// A single pin by id.
    pub async fn get(&self, id: PinId) -> Result<Option<Pin>, DbError> {
        let row = sqlx::query_as::<_, PinRow>(&format!(
            "SELECT {PIN_COLUMNS} FROM pins WHERE id = ?1"
        ))
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(PinRow::into_pin))
    }

    /// Insert a draft pin and return it.
    pub async fn insert_draft(&self, new: &NewPin) -> Result<Pin, DbError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, PinRow>(&format!(
            "INSERT INTO pins (lat, lng, name, category, status, confidence, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 'draft', ?5, ?6, ?6)
             RETURNING {PIN_COLUMNS}"
        ))
        .bind(new.lat)
        .bind(new.lng)
        .bind(new.name.as_deref())
        .bind(new.category.as_str())
        .bind(new.confidence)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(pin_id = row.id, lat = new.lat, lng = new.lng, "Inserted draft pin");
        Ok(row.into_pin())
    }

    /// The first pin inside the box `lat ± tolerance`, `lng ± tolerance`.
    pub async fn find_near(
        &self,
        lat: f64,
        lng: f64,
        tolerance: f64,
    ) -> Result<Option<Pin>, DbError> {
        let row = sqlx::query_as::<_, PinRow>(&format!(
            "SELECT {PIN_COLUMNS} FROM pins
             WHERE lat BETWEEN ?1 - ?3 AND ?1 + ?3
               AND lng BETWEEN ?2 - ?3 AND ?2 + ?3
             ORDER BY id
             LIMIT 1"
        ))
        .bind(lat)
        .bind(lng)
        .bind(tolerance)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(PinRow::into_pin))
    }

    /// The most recently created draft, if any.
    pub async fn latest_draft(&self) -> Result<Option<Pin>, DbError> {
        let row = sqlx::query_as::<_, PinRow>(&format!(
            "SELECT {PIN_COLUMNS} FROM pins WHERE status = 'draft' ORDER BY id DESC LIMIT 1"
        ))
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(PinRow::into_pin))
    }

    /// Apply a classification to a pin.
    ///
    /// The category and confidence are overwritten; the name only when the
    /// classification carries one. Returns the updated pin.
    pub async fn classify(
        &self,
        id: PinId,
        classification: &Classification,
    ) -> Result<Pin, DbError> {
        let row = sqlx::query_as::<_, PinRow>(&format!(
            "UPDATE pins
             SET category = ?2, name = COALESCE(?3, name), confidence = ?4, updated_at = ?5
             WHERE id = ?1
             RETURNING {PIN_COLUMNS}"
        ))
        .bind(id.into_inner())
        .bind(classification.category.as_str())
        .bind(classification.name.as_deref())
        .bind(classification.confidence)
        .bind(Utc::now())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("pin {id}")))?;

        tracing::debug!(
            pin_id = row.id,
            category = classification.category.as_str(),
            "Classified pin"
        );
        Ok(row.into_pin())
    }

    /// Confirm a pin with the user's chosen name and category.
    ///
    /// An empty name clears it. Returns `None` when the pin does not exist.
    pub async fn confirm(
        &self,
        id: PinId,
        name: Option<&str>,
        category: PinCategory,
    ) -> Result<Option<Pin>, DbError> {
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        let row = sqlx::query_as::<_, PinRow>(&format!(
            "UPDATE pins
             SET name = ?2, category = ?3, status = 'confirmed', updated_at = ?4
             WHERE id = ?1
             RETURNING {PIN_COLUMNS}"
        ))
        .bind(id.into_inner())
        .bind(name)
        .bind(category.as_str())
        .bind(Utc::now())
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(PinRow::into_pin))
    }

    /// Delete every pin. Returns the number of rows removed.
    pub async fn delete_all(&self) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM pins").execute(self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Delete all draft pins. Returns the number of rows removed.
    pub async fn delete_drafts(&self) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM pins WHERE status = 'draft'")
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete pins whose name is in `names`. Returns the number of rows
    /// removed; an empty list deletes nothing.
    pub async fn delete_named(&self, names: &[String]) -> Result<u64, DbError> {
        if names.is_empty() {
            return Ok(0);
        }
        let mut tx = self.pool.begin().await?;
        let mut removed: u64 = 0;
        for name in names {
            let result = sqlx::query("DELETE FROM pins WHERE name = ?1")
                .bind(name)
                .execute(&mut *tx)
                .await?;
            removed = removed.saturating_add(result.rows_affected());
        }
        tx.commit().await?;
        Ok(removed)
    }
}

/// A row from the `pins` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PinRow {
    /// Row id.
    pub id: i64,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Optional display name.
    pub name: Option<String>,
    /// Category tag.
    pub category: String,
    /// Status tag.
    pub status: String,
    /// Classifier confidence.
    pub confidence: Option<f64>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl PinRow {
    /// Convert the raw row into the shared [`Pin`] type.
    pub fn into_pin(self) -> Pin {
        Pin {
            id: PinId(self.id),
            lat: self.lat,
            lng: self.lng,
            name: self.name,
            category: PinCategory::from_tag(&self.category),
            status: PinStatus::from_tag(&self.status),
            confidence: self.confidence,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
