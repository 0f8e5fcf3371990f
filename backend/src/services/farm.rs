//! Farm profile service

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use shared::{validated, EntityId, NewFarmProfile};

use crate::error::{AppError, AppResult};
use crate::services::query::ListQuery;

const SELECT_FARMS: &str = "SELECT id, owner_id, location, size, crop_type FROM farm_profiles";
const FARM_ORDER: &str = "owner_id ASC, location ASC, id ASC";

/// Farm service for managing farm profiles
#[derive(Clone)]
pub struct FarmService {
    db: PgPool,
}

/// Farm profile as stored and as sent over the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FarmProfile {
    pub id: EntityId,
    #[serde(rename = "owner")]
    pub owner_id: Uuid,
    pub location: String,
    /// Hectares
    pub size: f64,
    pub crop_type: String,
}

impl std::fmt::Display for FarmProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} farm at {} (id={})", self.crop_type, self.location, self.id)
    }
}

impl FarmService {
    /// Create a new FarmService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List every farm, grouped by owner then sorted by location
    pub async fn list_farms(&self) -> AppResult<Vec<FarmProfile>> {
        let mut query = ListQuery::new(SELECT_FARMS, FARM_ORDER).build();
        let farms = query
            .build_query_as::<FarmProfile>()
            .fetch_all(&self.db)
            .await?;

        tracing::debug!(count = farms.len(), "Listed farms");
        Ok(farms)
    }

    /// Create a farm profile for an owner of the identity store
    pub async fn create_farm(&self, input: NewFarmProfile) -> AppResult<FarmProfile> {
        let input = validated(input)?;

        let farm = sqlx::query_as::<_, FarmProfile>(
            r#"
            INSERT INTO farm_profiles (owner_id, location, size, crop_type)
            VALUES ($1, $2, $3, $4)
            RETURNING id, owner_id, location, size, crop_type
            "#,
        )
        .bind(input.owner)
        .bind(input.location.trim())
        .bind(input.size)
        .bind(input.crop_type.trim())
        .fetch_one(&self.db)
        .await?;

        tracing::info!(farm_id = farm.id, "Created {}", farm);
        Ok(farm)
    }

    /// Delete a farm together with its plots, readings, anomalies and
    /// recommendations (database cascades).
    pub async fn delete_farm(&self, farm_id: EntityId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM farm_profiles WHERE id = $1")
            .bind(farm_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Farm".to_string()));
        }

        tracing::info!(farm_id, "Deleted farm and everything beneath it");
        Ok(())
    }
}
