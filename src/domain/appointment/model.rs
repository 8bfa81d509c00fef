use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Appointment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Approved,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" | "approve" => Ok(Self::Approved),
            "cancelled" | "canceled" | "cancel" => Ok(Self::Cancelled),
            other => Err(DomainError::Validation(format!(
                "Unknown appointment status: {}",
                other
            ))),
        }
    }
}

/// Appointment stored in `appointments/{id}`.
///
/// Names are copied from the profiles at booking time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub student_id: String,
    pub student_name: String,
    pub teacher_id: String,
    pub teacher_name: String,
    pub date_time: DateTime<Utc>,
    pub purpose: String,
    pub status: AppointmentStatus,
}

impl Appointment {
    /// Apply the owning teacher's decision. Only a pending appointment can be
    /// decided, and only once.
    pub fn decide(&mut self, decision: AppointmentStatus) -> Result<(), DomainError> {
        if decision == AppointmentStatus::Pending {
            return Err(DomainError::Validation(
                "An appointment can only be approved or cancelled".into(),
            ));
        }
        if self.status != AppointmentStatus::Pending {
            return Err(DomainError::Conflict(format!(
                "Appointment is already {}",
                self.status
            )));
        }
        self.status = decision;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn pending() -> Appointment {
        Appointment {
            student_id: "s1".into(),
            student_name: "Ann".into(),
            teacher_id: "t1".into(),
            teacher_name: "Dr. Lee".into(),
            date_time: Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap(),
            purpose: "Thesis".into(),
            status: AppointmentStatus::Pending,
        }
    }

    #[test]
    fn test_decide_once() {
        let mut appt = pending();
        appt.decide(AppointmentStatus::Approved).unwrap();
        assert_eq!(appt.status, AppointmentStatus::Approved);

        let err = appt.decide(AppointmentStatus::Cancelled).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(appt.status, AppointmentStatus::Approved);
    }

    #[test]
    fn test_cannot_decide_back_to_pending() {
        let mut appt = pending();
        assert!(matches!(
            appt.decide(AppointmentStatus::Pending),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_status_parse_accepts_verbs() {
        assert_eq!("approve".parse::<AppointmentStatus>().unwrap(), AppointmentStatus::Approved);
        assert_eq!("Cancel".parse::<AppointmentStatus>().unwrap(), AppointmentStatus::Cancelled);
        assert!("maybe".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let json = serde_json::to_value(pending()).unwrap();
        assert_eq!(json["studentId"], "s1");
        assert_eq!(json["teacherName"], "Dr. Lee");
        assert_eq!(json["status"], "pending");
        assert!(json["dateTime"].is_string());
    }
}
