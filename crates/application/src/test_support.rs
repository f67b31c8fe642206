use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::Mutex;

use classgate_core::{AppError, AppResult, UserIdentity};
use classgate_domain::{
    AccessRole, ClassificationCode, ClassificationNode, GrantId, PermissionGrant,
    PermissionRequest, PermissionRequestId, PermissionRequestStatus, ValidityWindow,
};

use crate::{
    AuditEvent, AuditRepository, ClassificationAccessResolver, ClassificationTreeRepository,
    PermissionGrantRepository, PermissionRequestQuery, PermissionRequestRepository,
};

pub(crate) fn fixed_now() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single() {
        Some(now) => now,
        None => panic!("fixed timestamp must be valid"),
    }
}

pub(crate) fn code(value: &str) -> ClassificationCode {
    match ClassificationCode::new(value) {
        Ok(code) => code,
        Err(error) => panic!("invalid test code '{value}': {error}"),
    }
}

pub(crate) fn node(value: &str, parent: Option<&str>) -> ClassificationNode {
    match ClassificationNode::new(value, parent.map(str::to_owned), &value[..1], None) {
        Ok(node) => node,
        Err(error) => panic!("invalid test node '{value}': {error}"),
    }
}

pub(crate) fn grant(
    subject: &str,
    value: &str,
    role: AccessRole,
    include_children: bool,
) -> PermissionGrant {
    windowed_grant(
        subject,
        value,
        role,
        include_children,
        ValidityWindow::starting_at(fixed_now() - Duration::days(30)),
    )
}

pub(crate) fn windowed_grant(
    subject: &str,
    value: &str,
    role: AccessRole,
    include_children: bool,
    validity: ValidityWindow,
) -> PermissionGrant {
    match PermissionGrant::new(
        GrantId::new(),
        subject,
        code(value),
        role,
        include_children,
        validity,
    ) {
        Ok(grant) => grant,
        Err(error) => panic!("invalid test grant: {error}"),
    }
}

pub(crate) fn actor(subject: &str, is_administrator: bool) -> UserIdentity {
    UserIdentity::new(subject, subject, None, is_administrator)
}

/// IPC-like sample forest used across service tests.
pub(crate) fn sample_tree() -> Vec<ClassificationNode> {
    vec![
        node("A", None),
        node("A01B", Some("A")),
        node("A01C", Some("A")),
        node("G", None),
        node("G06N", Some("G")),
        node("H", None),
        node("H01M", Some("H")),
        node("H01M10", Some("H01M")),
        node("H01M10/05", Some("H01M10")),
        node("H01M4", Some("H01M")),
    ]
}

#[derive(Default)]
pub(crate) struct FakeGrantRepository {
    pub(crate) grants: Mutex<Vec<PermissionGrant>>,
}

impl FakeGrantRepository {
    pub(crate) fn with_grants(grants: Vec<PermissionGrant>) -> Self {
        Self {
            grants: Mutex::new(grants),
        }
    }
}

#[async_trait]
impl PermissionGrantRepository for FakeGrantRepository {
    async fn list_grants_for_subject(&self, subject: &str) -> AppResult<Vec<PermissionGrant>> {
        Ok(self
            .grants
            .lock()
            .await
            .iter()
            .filter(|grant| grant.subject() == subject)
            .cloned()
            .collect())
    }

    async fn list_grants_for_code(
        &self,
        code: &ClassificationCode,
        active_only: bool,
    ) -> AppResult<Vec<PermissionGrant>> {
        Ok(self
            .grants
            .lock()
            .await
            .iter()
            .filter(|grant| grant.code() == code && (!active_only || grant.is_active()))
            .cloned()
            .collect())
    }

    async fn find_grant(&self, grant_id: GrantId) -> AppResult<Option<PermissionGrant>> {
        Ok(self
            .grants
            .lock()
            .await
            .iter()
            .find(|grant| grant.grant_id() == grant_id)
            .cloned())
    }

    async fn find_active_grant(
        &self,
        subject: &str,
        code: &ClassificationCode,
    ) -> AppResult<Option<PermissionGrant>> {
        Ok(self
            .grants
            .lock()
            .await
            .iter()
            .find(|grant| grant.is_active() && grant.subject() == subject && grant.code() == code)
            .cloned())
    }

    async fn create_grant(&self, grant: PermissionGrant) -> AppResult<PermissionGrant> {
        self.grants.lock().await.push(grant.clone());
        Ok(grant)
    }

    async fn deactivate_grant(&self, grant_id: GrantId, _deactivated_by: &str) -> AppResult<()> {
        let mut grants = self.grants.lock().await;
        let Some(stored) = grants
            .iter_mut()
            .find(|grant| grant.grant_id() == grant_id && grant.is_active())
        else {
            return Err(AppError::NotFound(format!("grant '{grant_id}'")));
        };

        *stored = stored.clone().with_active(false);
        Ok(())
    }

    async fn update_validity_window(
        &self,
        grant_id: GrantId,
        validity: ValidityWindow,
    ) -> AppResult<PermissionGrant> {
        let mut grants = self.grants.lock().await;
        let Some(stored) = grants
            .iter_mut()
            .find(|grant| grant.grant_id() == grant_id && grant.is_active())
        else {
            return Err(AppError::NotFound(format!("grant '{grant_id}'")));
        };

        *stored = stored.clone().with_validity(validity);
        Ok(stored.clone())
    }
}

/// Tree store that keeps raw rows, so tests can persist cyclic data.
#[derive(Default)]
pub(crate) struct FakeTreeRepository {
    pub(crate) nodes: Mutex<Vec<ClassificationNode>>,
}

impl FakeTreeRepository {
    pub(crate) fn with_nodes(nodes: Vec<ClassificationNode>) -> Self {
        Self {
            nodes: Mutex::new(nodes),
        }
    }
}

#[async_trait]
impl ClassificationTreeRepository for FakeTreeRepository {
    async fn find_node(&self, code: &ClassificationCode) -> AppResult<Option<ClassificationNode>> {
        Ok(self
            .nodes
            .lock()
            .await
            .iter()
            .find(|node| node.code() == code)
            .cloned())
    }

    async fn find_parent(
        &self,
        code: &ClassificationCode,
    ) -> AppResult<Option<ClassificationCode>> {
        Ok(self
            .find_node(code)
            .await?
            .and_then(|node| node.parent_code().cloned()))
    }

    async fn list_children(
        &self,
        code: &ClassificationCode,
    ) -> AppResult<Vec<ClassificationNode>> {
        let mut children: Vec<ClassificationNode> = self
            .nodes
            .lock()
            .await
            .iter()
            .filter(|node| node.parent_code() == Some(code))
            .cloned()
            .collect();
        children.sort_by(|left, right| left.code().cmp(right.code()));
        Ok(children)
    }

    async fn list_roots(&self) -> AppResult<Vec<ClassificationNode>> {
        let mut roots: Vec<ClassificationNode> = self
            .nodes
            .lock()
            .await
            .iter()
            .filter(|node| node.is_root())
            .cloned()
            .collect();
        roots.sort_by(|left, right| left.code().cmp(right.code()));
        Ok(roots)
    }

    async fn list_nodes(&self) -> AppResult<Vec<ClassificationNode>> {
        Ok(self.nodes.lock().await.clone())
    }

    async fn save_nodes(&self, nodes: Vec<ClassificationNode>) -> AppResult<usize> {
        let mut stored = self.nodes.lock().await;
        let written = nodes.len();
        for node in nodes {
            stored.retain(|existing| existing.code() != node.code());
            stored.push(node);
        }
        Ok(written)
    }
}

pub(crate) struct UnavailableGrantRepository;

#[async_trait]
impl PermissionGrantRepository for UnavailableGrantRepository {
    async fn list_grants_for_subject(&self, _subject: &str) -> AppResult<Vec<PermissionGrant>> {
        Err(unavailable())
    }

    async fn list_grants_for_code(
        &self,
        _code: &ClassificationCode,
        _active_only: bool,
    ) -> AppResult<Vec<PermissionGrant>> {
        Err(unavailable())
    }

    async fn find_grant(&self, _grant_id: GrantId) -> AppResult<Option<PermissionGrant>> {
        Err(unavailable())
    }

    async fn find_active_grant(
        &self,
        _subject: &str,
        _code: &ClassificationCode,
    ) -> AppResult<Option<PermissionGrant>> {
        Err(unavailable())
    }

    async fn create_grant(&self, _grant: PermissionGrant) -> AppResult<PermissionGrant> {
        Err(unavailable())
    }

    async fn deactivate_grant(&self, _grant_id: GrantId, _deactivated_by: &str) -> AppResult<()> {
        Err(unavailable())
    }

    async fn update_validity_window(
        &self,
        _grant_id: GrantId,
        _validity: ValidityWindow,
    ) -> AppResult<PermissionGrant> {
        Err(unavailable())
    }
}

fn unavailable() -> AppError {
    AppError::Unavailable("store did not respond".to_owned())
}

#[derive(Default)]
pub(crate) struct FakeAuditRepository {
    pub(crate) events: Mutex<Vec<AuditEvent>>,
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakePermissionRequestRepository {
    pub(crate) requests: Mutex<Vec<PermissionRequest>>,
    /// When set, decisions fail as if the store were down.
    pub(crate) fail_decisions: AtomicBool,
}

#[async_trait]
impl PermissionRequestRepository for FakePermissionRequestRepository {
    async fn create_request(&self, request: PermissionRequest) -> AppResult<PermissionRequest> {
        self.requests.lock().await.push(request.clone());
        Ok(request)
    }

    async fn find_request(
        &self,
        request_id: PermissionRequestId,
    ) -> AppResult<Option<PermissionRequest>> {
        Ok(self
            .requests
            .lock()
            .await
            .iter()
            .find(|request| request.request_id() == request_id)
            .cloned())
    }

    async fn find_pending_request(
        &self,
        subject: &str,
        code: &ClassificationCode,
    ) -> AppResult<Option<PermissionRequest>> {
        Ok(self
            .requests
            .lock()
            .await
            .iter()
            .find(|request| {
                request.status() == PermissionRequestStatus::Pending
                    && request.subject() == subject
                    && request.code() == code
            })
            .cloned())
    }

    async fn list_requests(
        &self,
        query: PermissionRequestQuery,
    ) -> AppResult<Vec<PermissionRequest>> {
        Ok(self
            .requests
            .lock()
            .await
            .iter()
            .filter(|request| {
                query
                    .subject
                    .as_deref()
                    .is_none_or(|subject| request.subject() == subject)
                    && query.status.is_none_or(|status| request.status() == status)
            })
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn save_decision(&self, request: &PermissionRequest) -> AppResult<()> {
        if self.fail_decisions.load(Ordering::SeqCst) {
            return Err(unavailable());
        }

        let mut requests = self.requests.lock().await;
        let Some(stored) = requests.iter_mut().find(|stored| {
            stored.request_id() == request.request_id()
                && stored.status() == PermissionRequestStatus::Pending
        }) else {
            return Err(AppError::Conflict(format!(
                "permission request '{}' was already decided",
                request.request_id()
            )));
        };

        *stored = request.clone();
        Ok(())
    }
}

pub(crate) fn resolver(
    grants: Arc<FakeGrantRepository>,
    tree: Arc<FakeTreeRepository>,
) -> ClassificationAccessResolver {
    ClassificationAccessResolver::new(grants, tree)
}
