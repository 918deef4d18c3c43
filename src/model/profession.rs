//! Profession catalog entries.

use serde::{Deserialize, Serialize};

use super::ProfessionId;

/// A category of service. `estimated_time_hours` projects the cost of a
/// booking from the worker's hourly rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profession {
    pub id: ProfessionId,
    pub name: String,
    pub description: Option<String>,
    pub estimated_time_hours: f64,
}
