use std::sync::Arc;

use chrono::{DateTime, Utc};
use classgate_core::{AppError, AppResult, NonEmptyString, UserIdentity};
use classgate_domain::{
    AccessRole, AuditAction, ClassificationCode, GrantId, PermissionGrant, ValidityWindow,
};

use crate::{
    AuditEvent, AuditRepository, ClassificationAccessResolver, ClassificationTreeRepository,
    PermissionGrantRepository,
};


/// Input payload for issuing a grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateGrantInput {
    /// Grantee subject.
    pub subject: String,
    /// Classification code in transport form.
    pub code: String,
    /// Granted role.
    pub role: AccessRole,
    /// Whether the grant extends to descendant codes.
    pub include_children: bool,
    /// Window start; defaults to the issuing instant.
    pub valid_from: Option<DateTime<Utc>>,
    /// Window end; `None` leaves the grant open-ended.
    pub valid_until: Option<DateTime<Utc>>,
}

/// Input payload for editing a grant validity window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateValidityInput {
    /// New window start.
    pub valid_from: DateTime<Utc>,
    /// New window end.
    pub valid_until: Option<DateTime<Utc>>,
}

/// Outcome of issuing a grant that may supersede an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantIssue {
    /// The active grant that now covers the request.
    pub grant: PermissionGrant,
    /// Whether `grant` was written by this call.
    pub created: bool,
    /// The grant deactivated to make room for `grant`.
    pub superseded: Option<PermissionGrant>,
}

/// Application service for grant administration.
///
/// System administrators manage every grant. Other actors manage grants on a
/// code when they hold ADMIN access to it, and grants that include children
/// only when they hold ADMIN access to the whole subtree.
#[derive(Clone)]
pub struct GrantAdminService {
    resolver: ClassificationAccessResolver,
    repository: Arc<dyn PermissionGrantRepository>,
    tree_repository: Arc<dyn ClassificationTreeRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl GrantAdminService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        resolver: ClassificationAccessResolver,
        repository: Arc<dyn PermissionGrantRepository>,
        tree_repository: Arc<dyn ClassificationTreeRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            resolver,
            repository,
            tree_repository,
            audit_repository,
        }
    }

    /// Issues a grant and emits an audit event.
    pub async fn create_grant(
        &self,
        actor: &UserIdentity,
        input: CreateGrantInput,
        now: DateTime<Utc>,
    ) -> AppResult<PermissionGrant> {
        let subject = NonEmptyString::new(input.subject.trim())?;
        let code = ClassificationCode::new(input.code)?;

        self.require_grant_management(actor, &code, input.include_children, now)
            .await?;

        if self.tree_repository.find_node(&code).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "classification code '{code}' does not exist"
            )));
        }

        let validity = ValidityWindow::new(input.valid_from.unwrap_or(now), input.valid_until)?;
        if validity.has_expired(now) {
            return Err(AppError::Validation(
                "valid_until must not be in the past".to_owned(),
            ));
        }

        if self
            .repository
            .find_active_grant(subject.as_str(), &code)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "subject '{}' already holds an active grant on '{code}'",
                subject.as_str()
            )));
        }

        let grant = PermissionGrant::new(
            GrantId::new(),
            subject,
            code,
            input.role,
            input.include_children,
            validity,
        )?
        .with_granted_by(Some(actor.subject().to_owned()));
        let grant = self.repository.create_grant(grant).await?;

        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.subject().to_owned(),
                action: AuditAction::GrantCreated,
                resource_type: "classification_permission_grant".to_owned(),
                resource_id: grant.grant_id().to_string(),
                detail: Some(format!(
                    "granted {} on '{}' to '{}' (include_children={})",
                    grant.role(),
                    grant.code(),
                    grant.subject(),
                    grant.include_children()
                )),
            })
            .await?;

        Ok(grant)
    }

    /// Issues an open-ended grant, folding in any active grant the subject
    /// already holds on the code.
    ///
    /// An effective open-ended grant that already covers the requested role
    /// and descendant scope is returned unchanged. Otherwise the existing
    /// grant is deactivated and replaced by one carrying the higher of both
    /// roles and the wider scope, so only one grant per subject and code stays
    /// active and access never shrinks.
    pub async fn issue_or_merge_grant(
        &self,
        actor: &UserIdentity,
        input: CreateGrantInput,
        now: DateTime<Utc>,
    ) -> AppResult<GrantIssue> {
        let subject = NonEmptyString::new(input.subject.trim())?;
        let code = ClassificationCode::new(input.code.as_str())?;

        let Some(existing) = self
            .repository
            .find_active_grant(subject.as_str(), &code)
            .await?
        else {
            let grant = self.create_grant(actor, input, now).await?;
            return Ok(GrantIssue {
                grant,
                created: true,
                superseded: None,
            });
        };

        let effective = existing.is_effective_at(now);
        if effective
            && existing.validity().valid_until().is_none()
            && existing.role() >= input.role
            && (existing.include_children() || !input.include_children)
        {
            self.require_grant_management(actor, &code, input.include_children, now)
                .await?;
            return Ok(GrantIssue {
                grant: existing,
                created: false,
                superseded: None,
            });
        }

        let merged = if effective {
            CreateGrantInput {
                role: existing.role().max(input.role),
                include_children: existing.include_children() || input.include_children,
                ..input
            }
        } else {
            input
        };

        self.require_grant_management(actor, &code, merged.include_children, now)
            .await?;
        if self.tree_repository.find_node(&code).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "classification code '{code}' does not exist"
            )));
        }

        self.deactivate_grant(actor, existing.grant_id(), now).await?;
        let grant = match self.create_grant(actor, merged, now).await {
            Ok(grant) => grant,
            Err(error) => {
                self.reissue(actor, &existing).await?;
                return Err(error);
            }
        };

        Ok(GrantIssue {
            grant,
            created: true,
            superseded: Some(existing),
        })
    }

    /// Undoes the writes of [`GrantAdminService::issue_or_merge_grant`].
    ///
    /// The created grant is deactivated and a superseded grant is restored
    /// under a new identifier with its original role, scope and window.
    pub async fn revert_issue(&self, actor: &UserIdentity, issue: &GrantIssue) -> AppResult<()> {
        if !issue.created {
            return Ok(());
        }

        self.repository
            .deactivate_grant(issue.grant.grant_id(), actor.subject())
            .await?;
        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.subject().to_owned(),
                action: AuditAction::GrantDeactivated,
                resource_type: "classification_permission_grant".to_owned(),
                resource_id: issue.grant.grant_id().to_string(),
                detail: Some(format!(
                    "rolled back {} grant on '{}' for '{}'",
                    issue.grant.role(),
                    issue.grant.code(),
                    issue.grant.subject()
                )),
            })
            .await?;

        match &issue.superseded {
            Some(previous) => self.reissue(actor, previous).await,
            None => Ok(()),
        }
    }

    /// Deactivates an active grant and emits an audit event.
    pub async fn deactivate_grant(
        &self,
        actor: &UserIdentity,
        grant_id: GrantId,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let grant = self.find_active_grant(grant_id).await?;
        self.require_grant_management(actor, grant.code(), false, now)
            .await?;

        self.repository
            .deactivate_grant(grant_id, actor.subject())
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.subject().to_owned(),
                action: AuditAction::GrantDeactivated,
                resource_type: "classification_permission_grant".to_owned(),
                resource_id: grant_id.to_string(),
                detail: Some(format!(
                    "deactivated {} grant on '{}' for '{}'",
                    grant.role(),
                    grant.code(),
                    grant.subject()
                )),
            })
            .await
    }

    /// Replaces the validity window of an active grant and emits an audit event.
    pub async fn update_validity_window(
        &self,
        actor: &UserIdentity,
        grant_id: GrantId,
        input: UpdateValidityInput,
        now: DateTime<Utc>,
    ) -> AppResult<PermissionGrant> {
        let grant = self.find_active_grant(grant_id).await?;
        self.require_grant_management(actor, grant.code(), grant.include_children(), now)
            .await?;

        let validity = ValidityWindow::new(input.valid_from, input.valid_until)?;
        let updated = self
            .repository
            .update_validity_window(grant_id, validity)
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.subject().to_owned(),
                action: AuditAction::GrantValidityUpdated,
                resource_type: "classification_permission_grant".to_owned(),
                resource_id: grant_id.to_string(),
                detail: Some(format!(
                    "validity of grant on '{}' for '{}' set to {} .. {}",
                    updated.code(),
                    updated.subject(),
                    validity.valid_from().to_rfc3339(),
                    validity
                        .valid_until()
                        .map(|until| until.to_rfc3339())
                        .unwrap_or_else(|| "open".to_owned())
                )),
            })
            .await?;

        Ok(updated)
    }

    /// Lists grants of one subject for administrators or the subject themself.
    pub async fn list_grants_for_subject(
        &self,
        actor: &UserIdentity,
        subject: &str,
    ) -> AppResult<Vec<PermissionGrant>> {
        if !actor.is_administrator() && actor.subject() != subject {
            return Err(AppError::Forbidden(format!(
                "subject '{}' may not list grants of '{subject}'",
                actor.subject()
            )));
        }

        self.repository.list_grants_for_subject(subject).await
    }

    /// Lists grants issued directly on a code.
    pub async fn list_grants_for_code(
        &self,
        actor: &UserIdentity,
        code: &str,
        active_only: bool,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<PermissionGrant>> {
        let code = ClassificationCode::new(code)?;
        self.require_grant_management(actor, &code, false, now)
            .await?;

        self.repository.list_grants_for_code(&code, active_only).await
    }

    /// Ensures the actor may issue or revoke grants on `code`.
    pub async fn require_grant_management(
        &self,
        actor: &UserIdentity,
        code: &ClassificationCode,
        include_children: bool,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        if actor.is_administrator() {
            return Ok(());
        }

        let permitted = if include_children {
            let allowed = self
                .resolver
                .allowed_codes(actor.subject(), AccessRole::Admin, now)
                .await?;
            let subtree = self.resolver.descendant_codes(code, true).await?;
            subtree.is_subset(&allowed)
        } else {
            self.resolver
                .has_access(actor.subject(), code, AccessRole::Admin, now)
                .await?
        };

        if permitted {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "subject '{}' may not manage grants on classification code '{code}'",
            actor.subject()
        )))
    }

    async fn reissue(&self, actor: &UserIdentity, previous: &PermissionGrant) -> AppResult<()> {
        let grant = PermissionGrant::new(
            GrantId::new(),
            previous.subject(),
            previous.code().clone(),
            previous.role(),
            previous.include_children(),
            *previous.validity(),
        )?
        .with_granted_by(previous.granted_by().map(ToOwned::to_owned));
        let grant = self.repository.create_grant(grant).await?;

        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.subject().to_owned(),
                action: AuditAction::GrantCreated,
                resource_type: "classification_permission_grant".to_owned(),
                resource_id: grant.grant_id().to_string(),
                detail: Some(format!(
                    "restored {} on '{}' for '{}' replacing grant '{}'",
                    grant.role(),
                    grant.code(),
                    grant.subject(),
                    previous.grant_id()
                )),
            })
            .await
    }

    async fn find_active_grant(&self, grant_id: GrantId) -> AppResult<PermissionGrant> {
        self.repository
            .find_grant(grant_id)
            .await?
            .filter(PermissionGrant::is_active)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "grant '{grant_id}' was not found or is already inactive"
                ))
            })
    }
}
