//! Field plot models

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::types::EntityId;

/// Input for creating a plot inside an existing farm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewFieldPlot {
    pub farm: EntityId,
    #[validate(
        custom = "crate::validation::not_blank",
        length(max = 100, message = "Ensure this field has no more than 100 characters.")
    )]
    pub crop_variety: String,
}
