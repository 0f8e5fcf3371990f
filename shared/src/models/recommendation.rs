//! Agent recommendation models

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::types::EntityId;

/// Input for attaching a recommended action to an anomaly event
///
/// The timestamp is assigned by the database at insert time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewAgentRecommendation {
    pub anomaly_event: EntityId,
    #[validate(
        custom = "crate::validation::not_blank",
        length(max = 255, message = "Ensure this field has no more than 255 characters.")
    )]
    pub recommended_action: String,
    #[validate(custom = "crate::validation::not_blank")]
    pub explanation_text: String,
    #[validate(custom = "crate::validation::finite")]
    pub confidence: f64,
}
