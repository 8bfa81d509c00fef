use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use super::{require_role, PortalRepositories};
use crate::application::access::AuthContext;
use crate::domain::{
    Appointment, AppointmentStatus, DomainError, DomainResult, Record, Role, TeacherSchedule,
};
use crate::notifications::{LiveDocument, LiveQuery};

/// Teacher dashboard: availability and appointment decisions
pub struct TeacherPage {
    context: Arc<AuthContext>,
    repos: PortalRepositories,
}

impl TeacherPage {
    pub fn new(context: Arc<AuthContext>, repos: PortalRepositories) -> DomainResult<Self> {
        require_role(&context, Role::Teacher)?;
        Ok(Self { context, repos })
    }

    fn teacher_id(&self) -> &str {
        &self.context.session_id
    }

    pub async fn add_slot(&self, slot: DateTime<Utc>) -> DomainResult<()> {
        self.repos.schedules.add_slot(self.teacher_id(), slot).await?;
        info!(teacher = self.teacher_id(), %slot, "Availability slot added");
        Ok(())
    }

    /// Own availability, earliest first
    pub async fn schedule(&self) -> DomainResult<Vec<DateTime<Utc>>> {
        Ok(self
            .repos
            .schedules
            .find(self.teacher_id())
            .await?
            .unwrap_or_default()
            .sorted_slots())
    }

    /// Own availability as it changes; `None` until the first slot is added
    pub fn watch_schedule(&self) -> LiveDocument<TeacherSchedule> {
        self.repos.schedules.watch(self.teacher_id())
    }

    pub async fn appointments(&self) -> DomainResult<Vec<Record<Appointment>>> {
        self.repos.appointments.for_teacher(self.teacher_id()).await
    }

    pub fn watch_appointments(&self) -> LiveQuery<Appointment> {
        self.repos.appointments.watch_teacher(self.teacher_id())
    }

    /// Approve or cancel one of this teacher's pending appointments.
    pub async fn decide(
        &self,
        appointment_id: &str,
        decision: AppointmentStatus,
    ) -> DomainResult<Appointment> {
        let Record { data: mut appointment, .. } =
            self.repos.appointments.get(appointment_id).await?;
        if appointment.teacher_id != self.teacher_id() {
            return Err(DomainError::Forbidden(format!(
                "Appointment {} belongs to another teacher",
                appointment_id
            )));
        }

        appointment.decide(decision)?;
        self.repos
            .appointments
            .set_status(appointment_id, appointment.status)
            .await?;

        info!(teacher = self.teacher_id(), appointment_id, status = %appointment.status, "Appointment decided");
        Ok(appointment)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::application::pages::test_support::{repositories, signed_in};
    use crate::domain::Profile;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 11, 2, hour, 0, 0).unwrap()
    }

    fn appointment(teacher_id: &str) -> Appointment {
        Appointment {
            student_id: "s1".into(),
            student_name: "Ann".into(),
            teacher_id: teacher_id.into(),
            teacher_name: "Lee".into(),
            date_time: at(9),
            purpose: "Thesis".into(),
            status: AppointmentStatus::Pending,
        }
    }

    async fn teacher_page() -> (PortalRepositories, TeacherPage) {
        let (_, repos) = repositories();
        let context = signed_in(
            &repos,
            "t1",
            Profile::teacher("Lee", "lee@example.com", "Physics", "Optics"),
        )
        .await;
        let page = TeacherPage::new(context, repos.clone()).unwrap();
        (repos, page)
    }

    #[tokio::test]
    async fn test_slots_are_a_sorted_set() {
        let (_, page) = teacher_page().await;
        assert!(page.schedule().await.unwrap().is_empty());

        page.add_slot(at(14)).await.unwrap();
        page.add_slot(at(9)).await.unwrap();
        page.add_slot(at(14)).await.unwrap();

        assert_eq!(page.schedule().await.unwrap(), vec![at(9), at(14)]);
    }

    #[tokio::test]
    async fn test_watch_schedule_sees_own_new_slot() {
        let (repos, page) = teacher_page().await;
        let mut live = page.watch_schedule();
        assert_eq!(live.next().await.unwrap().unwrap(), None);

        repos.schedules.add_slot("t2", at(8)).await.unwrap();
        page.add_slot(at(10)).await.unwrap();

        let schedule = tokio::time::timeout(std::time::Duration::from_secs(1), live.next())
            .await
            .expect("no schedule update")
            .unwrap()
            .unwrap()
            .expect("schedule created");
        assert_eq!(schedule.sorted_slots(), vec![at(10)]);
    }

    #[tokio::test]
    async fn test_decide_only_pending_and_owned() {
        let (repos, page) = teacher_page().await;
        let mine = repos.appointments.create(&appointment("t1")).await.unwrap();
        let theirs = repos.appointments.create(&appointment("t2")).await.unwrap();

        let decided = page.decide(&mine, AppointmentStatus::Approved).await.unwrap();
        assert_eq!(decided.status, AppointmentStatus::Approved);
        assert_eq!(
            repos.appointments.get(&mine).await.unwrap().data.status,
            AppointmentStatus::Approved
        );

        assert!(matches!(
            page.decide(&mine, AppointmentStatus::Cancelled).await,
            Err(DomainError::Conflict(_))
        ));
        assert!(matches!(
            page.decide(&theirs, AppointmentStatus::Cancelled).await,
            Err(DomainError::Forbidden(_))
        ));
        assert_eq!(page.appointments().await.unwrap().len(), 1);
    }
}
