use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use super::{require_role, PortalRepositories};
use crate::application::access::AuthContext;
use crate::domain::{
    Appointment, AppointmentStatus, DomainError, DomainResult, Profile, Record, Role,
};
use crate::notifications::LiveQuery;

/// What the booking page shows for one teacher
#[derive(Debug, Clone, PartialEq)]
pub struct BookingOptions {
    pub teacher_id: String,
    pub teacher_name: String,
    /// Earliest first; empty when the teacher has no schedule yet
    pub slots: Vec<DateTime<Utc>>,
}

/// Student area: find teachers, book, follow own appointments
pub struct StudentPage {
    context: Arc<AuthContext>,
    repos: PortalRepositories,
}

impl StudentPage {
    pub fn new(context: Arc<AuthContext>, repos: PortalRepositories) -> DomainResult<Self> {
        require_role(&context, Role::Student)?;
        Ok(Self { context, repos })
    }

    fn student_id(&self) -> &str {
        &self.context.session_id
    }

    pub async fn teachers(&self) -> DomainResult<Vec<Record<Profile>>> {
        self.repos.profiles.list_by_role(Role::Teacher).await
    }

    /// Teachers whose name, department or subject contains `term`,
    /// ignoring case. A blank term matches everyone.
    pub async fn search_teachers(&self, term: &str) -> DomainResult<Vec<Record<Profile>>> {
        let term = term.trim();
        let mut teachers = self.teachers().await?;
        if !term.is_empty() {
            teachers.retain(|teacher| teacher.data.matches_search(term));
        }
        Ok(teachers)
    }

    pub async fn booking_options(&self, teacher_id: &str) -> DomainResult<BookingOptions> {
        let teacher = match self.repos.profiles.find(teacher_id).await? {
            Some(profile) if profile.role == Role::Teacher => profile,
            _ => return Err(DomainError::not_found("Teacher", "id", teacher_id)),
        };
        let slots = self
            .repos
            .schedules
            .find(teacher_id)
            .await?
            .unwrap_or_default()
            .sorted_slots();

        Ok(BookingOptions {
            teacher_id: teacher_id.to_string(),
            teacher_name: teacher.name,
            slots,
        })
    }

    /// Book one of the teacher's offered slots. The new appointment starts
    /// pending; the slot stays offered.
    pub async fn book(
        &self,
        teacher_id: &str,
        slot: DateTime<Utc>,
        purpose: &str,
    ) -> DomainResult<String> {
        let options = self.booking_options(teacher_id).await?;
        if !options.slots.contains(&slot) {
            return Err(DomainError::Validation(format!(
                "{} is not an available slot",
                slot
            )));
        }

        let appointment = Appointment {
            student_id: self.student_id().to_string(),
            student_name: self.context.name().to_string(),
            teacher_id: options.teacher_id,
            teacher_name: options.teacher_name,
            date_time: slot,
            purpose: purpose.trim().to_string(),
            status: AppointmentStatus::Pending,
        };
        let id = self.repos.appointments.create(&appointment).await?;

        info!(student = self.student_id(), teacher = teacher_id, appointment_id = %id, "Appointment booked");
        Ok(id)
    }

    pub async fn appointments(&self) -> DomainResult<Vec<Record<Appointment>>> {
        self.repos.appointments.for_student(self.student_id()).await
    }

    pub fn watch_appointments(&self) -> LiveQuery<Appointment> {
        self.repos.appointments.watch_student(self.student_id())
    }
}
