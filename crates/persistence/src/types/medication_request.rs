//! Medication request rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row of the `MEDICATION_REQUEST` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationRequestRecord {
    /// `MDRQ_ID`.
    pub id: i64,
    /// The person the medication is for (`MDRQ_PRSN_ID`).
    pub patient_id: i64,
    /// The prescribing person (`MDRQ_REQUESTER_ID`).
    pub requester_id: Option<i64>,
    pub status: String,
    pub intent: String,
    pub medication_code: Option<String>,
    pub medication_display: Option<String>,
    pub authored_on: Option<DateTime<Utc>>,
    pub dosage_text: Option<String>,
    pub supply_duration_days: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// A medication request about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMedicationRequest {
    pub patient_id: i64,
    pub requester_id: Option<i64>,
    pub status: String,
    pub intent: String,
    pub medication_code: Option<String>,
    pub medication_display: Option<String>,
    pub authored_on: Option<DateTime<Utc>>,
    pub dosage_text: Option<String>,
    pub supply_duration_days: Option<i64>,
}

impl NewMedicationRequest {
    /// An active order for `patient_id`.
    pub fn order(patient_id: i64) -> Self {
        Self {
            patient_id,
            requester_id: None,
            status: "active".to_string(),
            intent: "order".to_string(),
            medication_code: None,
            medication_display: None,
            authored_on: None,
            dosage_text: None,
            supply_duration_days: None,
        }
    }

    pub fn with_requester(mut self, requester_id: i64) -> Self {
        self.requester_id = Some(requester_id);
        self
    }

    pub fn with_medication(mut self, code: impl Into<String>, display: impl Into<String>) -> Self {
        self.medication_code = Some(code.into());
        self.medication_display = Some(display.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }
}
