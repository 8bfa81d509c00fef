use std::sync::Arc;

use tracing::info;
use validator::Validate;

use super::{require_role, PortalRepositories};
use crate::application::access::AuthContext;
use crate::domain::{
    CreateTeacherDto, DomainError, DomainResult, IdentityService, Profile, Record, Role,
    UpdateTeacherDto,
};
use crate::notifications::LiveQuery;

/// Admin dashboard: student approvals and teacher management
pub struct AdminPage {
    context: Arc<AuthContext>,
    identity: Arc<dyn IdentityService>,
    repos: PortalRepositories,
}

impl AdminPage {
    pub fn new(
        context: Arc<AuthContext>,
        identity: Arc<dyn IdentityService>,
        repos: PortalRepositories,
    ) -> DomainResult<Self> {
        require_role(&context, Role::Admin)?;
        Ok(Self {
            context,
            identity,
            repos,
        })
    }

    pub fn admin_name(&self) -> &str {
        self.context.name()
    }

    pub async fn pending_students(&self) -> DomainResult<Vec<Record<Profile>>> {
        self.repos.profiles.pending_students().await
    }

    pub async fn approve_student(&self, uid: &str) -> DomainResult<()> {
        let profile = self.repos.profiles.get(uid).await?;
        if profile.role != Role::Student {
            return Err(DomainError::Validation(format!("{} is not a student", uid)));
        }
        if !profile.awaiting_approval() {
            return Err(DomainError::Conflict(format!("Student {} is already approved", uid)));
        }

        self.repos.profiles.mark_approved(uid).await?;
        info!(admin = %self.context.session_id, student = uid, "Student approved");
        Ok(())
    }

    /// Create a teacher account and profile. The admin stays signed in.
    pub async fn add_teacher(&self, dto: CreateTeacherDto) -> DomainResult<String> {
        dto.validate()?;

        let uid = self.identity.create_account(&dto.email, &dto.password).await?;
        let profile = Profile::teacher(&dto.name, &dto.email, &dto.department, &dto.subject);
        self.repos.profiles.create(&uid, &profile).await?;

        info!(admin = %self.context.session_id, teacher = %uid, email = %dto.email, "Teacher added");
        Ok(uid)
    }

    pub async fn teachers(&self) -> DomainResult<Vec<Record<Profile>>> {
        self.repos.profiles.list_by_role(Role::Teacher).await
    }

    pub fn watch_teachers(&self) -> LiveQuery<Profile> {
        self.repos.profiles.watch_role(Role::Teacher)
    }

    pub async fn update_teacher(&self, uid: &str, dto: UpdateTeacherDto) -> DomainResult<()> {
        dto.validate()?;
        self.ensure_teacher(uid).await?;
        self.repos.profiles.update_teacher(uid, &dto).await?;
        info!(admin = %self.context.session_id, teacher = uid, "Teacher updated");
        Ok(())
    }

    /// Remove the teacher's profile. The credential account is left in
    /// place; its next login lands on a session without a profile.
    pub async fn delete_teacher(&self, uid: &str) -> DomainResult<()> {
        self.ensure_teacher(uid).await?;
        self.repos.profiles.delete(uid).await?;
        info!(admin = %self.context.session_id, teacher = uid, "Teacher deleted");
        Ok(())
    }

    async fn ensure_teacher(&self, uid: &str) -> DomainResult<()> {
        match self.repos.profiles.find(uid).await? {
            Some(profile) if profile.role == Role::Teacher => Ok(()),
            _ => Err(DomainError::not_found("Teacher", "id", uid)),
        }
    }
}
