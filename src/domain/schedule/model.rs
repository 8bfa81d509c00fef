use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Availability stored in `teacherSchedules/{teacherId}`.
///
/// Slots are kept in insertion order on the wire; readers sort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherSchedule {
    #[serde(default)]
    pub available_slots: Vec<DateTime<Utc>>,
}

impl TeacherSchedule {
    pub fn sorted_slots(&self) -> Vec<DateTime<Utc>> {
        let mut slots = self.available_slots.clone();
        slots.sort();
        slots.dedup();
        slots
    }

    pub fn offers(&self, slot: &DateTime<Utc>) -> bool {
        self.available_slots.contains(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sorted_slots() {
        let late = Utc.with_ymd_and_hms(2026, 5, 2, 10, 0, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2026, 5, 1, 9, 30, 0).unwrap();
        let schedule = TeacherSchedule {
            available_slots: vec![late, early],
        };
        assert_eq!(schedule.sorted_slots(), vec![early, late]);
        assert!(schedule.offers(&early));
    }

    #[test]
    fn test_missing_slots_field_defaults_to_empty() {
        let schedule: TeacherSchedule = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(schedule.available_slots.is_empty());
    }
}
