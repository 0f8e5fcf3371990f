//! Field plot service

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use shared::{validated, EntityId, NewFieldPlot};

use crate::error::{AppError, AppResult};
use crate::services::query::{optional_id, ListQuery};

const SELECT_PLOTS: &str = "SELECT id, farm_id, crop_variety FROM field_plots";
const PLOT_ORDER: &str = "farm_id ASC, id ASC";

/// Plot service for managing the plots of a farm
#[derive(Clone)]
pub struct PlotService {
    db: PgPool,
}

/// Field plot as stored and as sent over the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FieldPlot {
    pub id: EntityId,
    #[serde(rename = "farm")]
    pub farm_id: EntityId,
    pub crop_variety: String,
}

impl std::fmt::Display for FieldPlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Plot {} - {} (farm {})",
            self.id, self.crop_variety, self.farm_id
        )
    }
}

/// Query parameters accepted by the plot list
#[derive(Debug, Default, Deserialize)]
pub struct PlotFilter {
    #[serde(default, deserialize_with = "optional_id")]
    pub farm: Option<EntityId>,
}

impl PlotService {
    /// Create a new PlotService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List plots ordered by farm then id, optionally for one farm
    pub async fn list_plots(&self, filter: &PlotFilter) -> AppResult<Vec<FieldPlot>> {
        let mut query = ListQuery::new(SELECT_PLOTS, PLOT_ORDER)
            .filter("farm_id", filter.farm)
            .build();
        let plots = query
            .build_query_as::<FieldPlot>()
            .fetch_all(&self.db)
            .await?;

        tracing::debug!(count = plots.len(), ?filter, "Listed plots");
        Ok(plots)
    }

    /// Create a plot inside an existing farm
    pub async fn create_plot(&self, input: NewFieldPlot) -> AppResult<FieldPlot> {
        let input = validated(input)?;

        let plot = sqlx::query_as::<_, FieldPlot>(
            r#"
            INSERT INTO field_plots (farm_id, crop_variety)
            VALUES ($1, $2)
            RETURNING id, farm_id, crop_variety
            "#,
        )
        .bind(input.farm)
        .bind(input.crop_variety.trim())
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::from_insert(e, "farm", input.farm))?;

        tracing::info!(plot_id = plot.id, "Created {}", plot);
        Ok(plot)
    }
}
