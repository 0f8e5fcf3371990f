//! Farm profile models

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::types::OwnerId;

/// Input for creating a farm profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewFarmProfile {
    pub owner: OwnerId,
    #[validate(
        custom = "crate::validation::not_blank",
        length(max = 255, message = "Ensure this field has no more than 255 characters.")
    )]
    pub location: String,
    /// Farm size in hectares (or the operator's chosen unit)
    #[validate(custom = "crate::validation::finite")]
    pub size: f64,
    #[validate(
        custom = "crate::validation::not_blank",
        length(max = 100, message = "Ensure this field has no more than 100 characters.")
    )]
    pub crop_type: String,
}
