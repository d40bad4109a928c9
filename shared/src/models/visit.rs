//! Visit Model (one customer presence on the showroom floor)

use serde::{Deserialize, Serialize};

use super::timer::Timer;

/// Visit status
///
/// `CHECKED_IN` is the only initial status; the two `CLOSED_*` statuses are
/// terminal and always carry a check-out time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(
    feature = "db",
    sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum VisitStatus {
    CheckedIn,
    Browsing,
    TestDrive,
    Negotiating,
    Paperwork,
    ClosedWon,
    ClosedLost,
}

impl VisitStatus {
    /// Non-terminal statuses in canonical floor order
    pub const PIPELINE: [VisitStatus; 5] = [
        VisitStatus::CheckedIn,
        VisitStatus::Browsing,
        VisitStatus::TestDrive,
        VisitStatus::Negotiating,
        VisitStatus::Paperwork,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ClosedWon | Self::ClosedLost)
    }

    /// Stage ordinal used when no workflow configuration covers the status
    pub fn default_stage(&self) -> i32 {
        match self {
            Self::CheckedIn => 0,
            Self::Browsing => 1,
            Self::TestDrive => 2,
            Self::Negotiating => 3,
            Self::Paperwork => 4,
            Self::ClosedWon => 5,
            Self::ClosedLost => 6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckedIn => "CHECKED_IN",
            Self::Browsing => "BROWSING",
            Self::TestDrive => "TEST_DRIVE",
            Self::Negotiating => "NEGOTIATING",
            Self::Paperwork => "PAPERWORK",
            Self::ClosedWon => "CLOSED_WON",
            Self::ClosedLost => "CLOSED_LOST",
        }
    }
}

impl std::fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the customer arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(
    feature = "db",
    sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum VisitSource {
    WalkIn,
    Appointment,
    Phone,
    Website,
    Referral,
    Repeat,
}

/// Visit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Visit {
    pub id: i64,
    pub dealership_id: String,
    pub customer_id: i64,
    /// Assigned salesperson (staff id)
    pub salesperson_id: Option<i64>,
    pub vehicle_id: Option<i64>,
    /// Display stock code of the attached vehicle
    pub stock_number: Option<String>,
    /// Unix millis
    pub check_in_time: i64,
    /// Unix millis, set iff status is terminal
    pub check_out_time: Option<i64>,
    pub status: VisitStatus,
    pub workflow_stage: i32,
    pub source: Option<VisitSource>,
    pub appointment_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Visit {
    pub fn is_closed(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Visit with its active timer, the shape pushed to dashboards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitDetail {
    #[serde(flatten)]
    pub visit: Visit,
    pub active_timer: Option<Timer>,
}

/// Check-in payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitCreate {
    pub customer_id: i64,
    pub salesperson_id: Option<i64>,
    pub vehicle_id: Option<i64>,
    pub stock_number: Option<String>,
    pub source: Option<VisitSource>,
    pub appointment_id: Option<i64>,
    /// Optional first note, created best-effort
    pub initial_note: Option<String>,
}

/// Partial update of assignable fields (status is never touched here)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisitUpdate {
    pub salesperson_id: Option<i64>,
    pub vehicle_id: Option<i64>,
    pub stock_number: Option<String>,
    pub source: Option<VisitSource>,
    pub appointment_id: Option<i64>,
}

impl VisitUpdate {
    /// Names of the fields present in this patch
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.salesperson_id.is_some() {
            fields.push("salesperson_id");
        }
        if self.vehicle_id.is_some() {
            fields.push("vehicle_id");
        }
        if self.stock_number.is_some() {
            fields.push("stock_number");
        }
        if self.source.is_some() {
            fields.push("source");
        }
        if self.appointment_id.is_some() {
            fields.push("appointment_id");
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.changed_fields().is_empty()
    }
}

/// Status change payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: VisitStatus,
}

/// Vehicle attach payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleAttach {
    pub vehicle_id: i64,
    pub stock_number: Option<String>,
}

/// Close payload; status must be `CLOSED_WON` or `CLOSED_LOST`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitClose {
    pub status: VisitStatus,
}

/// List filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisitFilter {
    pub status: Option<VisitStatus>,
    /// Only visits without a check-out time
    #[serde(default)]
    pub active_only: bool,
    /// Inclusive lower bound on `check_in_time` (Unix millis)
    pub from: Option<i64>,
    /// Exclusive upper bound on `check_in_time` (Unix millis)
    pub to: Option<i64>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// `STATUS_CHANGED` broadcast payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangedPayload {
    pub visit: VisitDetail,
    pub previous_status: VisitStatus,
    pub new_status: VisitStatus,
}
