//! Key-value settings repository with a per-instance read cache.

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, Set};
use tala_core::settings::SettingsCache;
use tracing::debug;

use crate::entities::settings;
use crate::error::RepositoryError;

/// Settings repository.
///
/// Create one per unit of work or session; its cache is never shared with
/// other instances. A clone starts with an empty cache of its own.
#[derive(Debug)]
pub struct SettingsRepository {
    db: DatabaseConnection,
    cache: SettingsCache,
}

impl Clone for SettingsRepository {
    fn clone(&self) -> Self {
        Self::new(self.db.clone())
    }
}

impl SettingsRepository {
    /// Creates a new settings repository with an empty cache.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            cache: SettingsCache::new(),
        }
    }

    /// Reads a setting, serving repeated reads from the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        if let Some(cached) = self.cache.get(key) {
            return Ok(cached);
        }
        let value = settings::Entity::find_by_id(key.to_string())
            .one(&self.db)
            .await?
            .map(|row| row.value);
        self.cache.insert(key, value.clone());
        Ok(value)
    }

    /// Reads a setting, falling back to `default` when it is unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_or(&self, key: &str, default: &str) -> Result<String, RepositoryError> {
        Ok(self.get(key).await?.unwrap_or_else(|| default.to_string()))
    }

    /// Writes a setting and drops it from the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        let row = settings::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            updated_at: Set(Utc::now().into()),
        };
        settings::Entity::insert(row)
            .on_conflict(
                OnConflict::column(settings::Column::Key)
                    .update_columns([settings::Column::Value, settings::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        self.cache.invalidate(key);
        debug!(key, "setting written");
        Ok(())
    }

    /// Removes a setting. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete(&self, key: &str) -> Result<bool, RepositoryError> {
        let result = settings::Entity::delete_by_id(key.to_string())
            .exec(&self.db)
            .await?;
        self.cache.invalidate(key);
        Ok(result.rows_affected > 0)
    }

    /// Drops every cached value.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Returns true if `key` is currently served from the cache.
    #[must_use]
    pub fn is_cached(&self, key: &str) -> bool {
        self.cache.contains(key)
    }
}
