use std::sync::Arc;

use chrono::{DateTime, Utc};
use classgate_core::{AppError, AppResult, UserIdentity};
use classgate_domain::{
    AccessRole, AuditAction, ClassificationCode, PermissionGrant, PermissionRequest,
    PermissionRequestId, PermissionRequestStatus,
};

use crate::{
    AuditEvent, AuditRepository, ClassificationAccessResolver, ClassificationTreeRepository,
    CreateGrantInput, GrantAdminService, PermissionGrantRepository, PermissionRequestQuery,
    PermissionRequestRepository,
};


const MAX_LIST_LIMIT: usize = 200;

/// Input payload for requesting access to a code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitPermissionRequestInput {
    /// Classification code in transport form.
    pub code: String,
    /// Requested role.
    pub role: AccessRole,
    /// Whether descendant codes are requested too.
    pub include_children: bool,
    /// Optional justification shown to reviewers.
    pub reason: Option<String>,
}

/// Application service for the access request workflow.
#[derive(Clone)]
pub struct PermissionRequestService {
    resolver: ClassificationAccessResolver,
    grant_admin: GrantAdminService,
    grant_repository: Arc<dyn PermissionGrantRepository>,
    repository: Arc<dyn PermissionRequestRepository>,
    tree_repository: Arc<dyn ClassificationTreeRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl PermissionRequestService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        resolver: ClassificationAccessResolver,
        grant_admin: GrantAdminService,
        grant_repository: Arc<dyn PermissionGrantRepository>,
        repository: Arc<dyn PermissionRequestRepository>,
        tree_repository: Arc<dyn ClassificationTreeRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            resolver,
            grant_admin,
            grant_repository,
            repository,
            tree_repository,
            audit_repository,
        }
    }

    /// Files a pending request on behalf of the actor.
    pub async fn submit_request(
        &self,
        actor: &UserIdentity,
        input: SubmitPermissionRequestInput,
        now: DateTime<Utc>,
    ) -> AppResult<PermissionRequest> {
        let code = ClassificationCode::new(input.code)?;
        if self.tree_repository.find_node(&code).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "classification code '{code}' does not exist"
            )));
        }

        if !input.include_children
            && self
                .resolver
                .has_access(actor.subject(), &code, input.role, now)
                .await?
        {
            return Err(AppError::Conflict(format!(
                "subject '{}' already holds {} access to '{code}'",
                actor.subject(),
                input.role
            )));
        }

        if let Some(existing) = self
            .grant_repository
            .find_active_grant(actor.subject(), &code)
            .await?
            && existing.is_effective_at(now)
            && existing.role() >= input.role
            && (existing.include_children() || !input.include_children)
        {
            return Err(AppError::Conflict(format!(
                "subject '{}' already holds a {} grant on '{code}' covering this request",
                actor.subject(),
                existing.role()
            )));
        }

        if self
            .repository
            .find_pending_request(actor.subject(), &code)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "a pending request for '{code}' already exists"
            )));
        }

        let request = PermissionRequest::new(
            PermissionRequestId::new(),
            actor.subject(),
            code,
            input.role,
            input.include_children,
            input.reason,
            now,
        )?;
        let request = self.repository.create_request(request).await?;

        self.append_audit(
            actor,
            AuditAction::PermissionRequestSubmitted,
            &request,
            format!(
                "requested {} on '{}' (include_children={})",
                request.role(),
                request.code(),
                request.include_children()
            ),
        )
        .await?;

        Ok(request)
    }

    /// Lists requests visible to the actor.
    ///
    /// Administrators see every request; other actors see their own.
    pub async fn list_requests(
        &self,
        actor: &UserIdentity,
        status: Option<PermissionRequestStatus>,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<PermissionRequest>> {
        let subject = (!actor.is_administrator()).then(|| actor.subject().to_owned());

        self.repository
            .list_requests(PermissionRequestQuery {
                subject,
                status,
                limit: limit.clamp(1, MAX_LIST_LIMIT),
                offset,
            })
            .await
    }

    /// Approves a pending request and issues the matching grant.
    ///
    /// An active grant the requester already holds on the code is merged into
    /// the new one. When the decision cannot be stored the grant writes are
    /// rolled back, so a retry starts from the same state.
    pub async fn approve_request(
        &self,
        actor: &UserIdentity,
        request_id: PermissionRequestId,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<(PermissionRequest, PermissionGrant)> {
        let mut request = self.find_pending_request(request_id).await?;
        request.decide(PermissionRequestStatus::Approved, actor.subject(), note)?;

        let issue = self
            .grant_admin
            .issue_or_merge_grant(
                actor,
                CreateGrantInput {
                    subject: request.subject().to_owned(),
                    code: request.code().as_str().to_owned(),
                    role: request.role(),
                    include_children: request.include_children(),
                    valid_from: None,
                    valid_until: None,
                },
                now,
            )
            .await?;

        if let Err(error) = self.repository.save_decision(&request).await {
            return match self.grant_admin.revert_issue(actor, &issue).await {
                Ok(()) => Err(error),
                Err(rollback_error) => Err(AppError::Internal(format!(
                    "approval of '{request_id}' failed ({error}) and grant '{}' could not be \
                     rolled back ({rollback_error})",
                    issue.grant.grant_id()
                ))),
            };
        }

        self.append_audit(
            actor,
            AuditAction::PermissionRequestApproved,
            &request,
            format!("approved with grant '{}'", issue.grant.grant_id()),
        )
        .await?;

        Ok((request, issue.grant))
    }

    /// Rejects a pending request.
    pub async fn reject_request(
        &self,
        actor: &UserIdentity,
        request_id: PermissionRequestId,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<PermissionRequest> {
        let mut request = self.find_pending_request(request_id).await?;
        self.grant_admin
            .require_grant_management(actor, request.code(), request.include_children(), now)
            .await?;

        request.decide(PermissionRequestStatus::Rejected, actor.subject(), note)?;
        self.repository.save_decision(&request).await?;

        self.append_audit(
            actor,
            AuditAction::PermissionRequestRejected,
            &request,
            format!(
                "rejected {} on '{}' for '{}'",
                request.role(),
                request.code(),
                request.subject()
            ),
        )
        .await?;

        Ok(request)
    }

    async fn find_pending_request(
        &self,
        request_id: PermissionRequestId,
    ) -> AppResult<PermissionRequest> {
        let request = self
            .repository
            .find_request(request_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("permission request '{request_id}' was not found"))
            })?;

        if request.status() != PermissionRequestStatus::Pending {
            return Err(AppError::Conflict(format!(
                "permission request '{request_id}' was already decided"
            )));
        }

        Ok(request)
    }

    async fn append_audit(
        &self,
        actor: &UserIdentity,
        action: AuditAction,
        request: &PermissionRequest,
        detail: String,
    ) -> AppResult<()> {
        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.subject().to_owned(),
                action,
                resource_type: "classification_permission_request".to_owned(),
                resource_id: request.request_id().to_string(),
                detail: Some(detail),
            })
            .await
    }
}
