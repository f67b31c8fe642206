use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use classgate_core::{AppError, AppResult};
use classgate_domain::{AccessRole, ClassificationCode, PermissionGrant};

use crate::{ClassificationTreeRepository, PermissionGrantRepository};


/// Resolves which classification codes a subject may access.
///
/// A grant matches its own code and, when `include_children` is set, every
/// code below it. Among matching grants that are active and inside their
/// validity window the highest role wins; a narrower grant with a lower role
/// never hides a broader grant with a higher one.
#[derive(Clone)]
pub struct ClassificationAccessResolver {
    grant_repository: Arc<dyn PermissionGrantRepository>,
    tree_repository: Arc<dyn ClassificationTreeRepository>,
}

impl ClassificationAccessResolver {
    /// Creates a resolver over a grant store and a tree store.
    #[must_use]
    pub fn new(
        grant_repository: Arc<dyn PermissionGrantRepository>,
        tree_repository: Arc<dyn ClassificationTreeRepository>,
    ) -> Self {
        Self {
            grant_repository,
            tree_repository,
        }
    }

    /// Returns whether the subject may access `code` with at least `min_role` at `now`.
    pub async fn has_access(
        &self,
        subject: &str,
        code: &ClassificationCode,
        min_role: AccessRole,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let candidates: Vec<PermissionGrant> = self
            .effective_grants(subject, now)
            .await?
            .into_iter()
            .filter(|grant| grant.qualifies_for(min_role))
            .collect();

        Ok(self.strongest_match(&candidates, code).await?.is_some())
    }

    /// Returns the highest role the subject holds on `code` at `now`.
    pub async fn effective_role(
        &self,
        subject: &str,
        code: &ClassificationCode,
        now: DateTime<Utc>,
    ) -> AppResult<Option<AccessRole>> {
        let candidates = self.effective_grants(subject, now).await?;
        self.strongest_match(&candidates, code).await
    }

    /// Ensures the subject may access `code` with at least `min_role` at `now`.
    pub async fn require_access(
        &self,
        subject: &str,
        code: &ClassificationCode,
        min_role: AccessRole,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        if self.has_access(subject, code, min_role, now).await? {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "subject '{subject}' lacks {min_role} access to classification code '{code}'"
        )))
    }

    /// Returns every code in the subtree rooted at `code`.
    ///
    /// Unknown codes are treated as leaves. Reaching a node twice means the
    /// stored tree is not a forest and fails with `MalformedTree`.
    pub async fn descendant_codes(
        &self,
        code: &ClassificationCode,
        include_self: bool,
    ) -> AppResult<BTreeSet<ClassificationCode>> {
        let mut descendants = BTreeSet::new();
        let mut visited = HashSet::from([code.clone()]);
        let mut queue = VecDeque::from([code.clone()]);

        while let Some(current) = queue.pop_front() {
            for child in self.tree_repository.list_children(&current).await? {
                let child_code = child.code().clone();
                if !visited.insert(child_code.clone()) {
                    return Err(AppError::MalformedTree(format!(
                        "code '{child_code}' is reachable twice below '{code}'"
                    )));
                }
                descendants.insert(child_code.clone());
                queue.push_back(child_code);
            }
        }

        if include_self {
            descendants.insert(code.clone());
        }

        Ok(descendants)
    }

    /// Returns every code the subject may access with at least `min_role` at `now`.
    pub async fn allowed_codes(
        &self,
        subject: &str,
        min_role: AccessRole,
        now: DateTime<Utc>,
    ) -> AppResult<BTreeSet<ClassificationCode>> {
        let grants = self.effective_grants(subject, now).await?;

        let mut allowed = BTreeSet::new();
        let mut expanded = HashSet::new();
        for grant in grants
            .iter()
            .filter(|grant| grant.qualifies_for(min_role))
        {
            allowed.insert(grant.code().clone());
            if grant.include_children() && expanded.insert(grant.code().clone()) {
                allowed.extend(self.descendant_codes(grant.code(), false).await?);
            }
        }

        Ok(allowed)
    }

    /// Restricts `codes` to those the subject may access, keeping input order.
    pub async fn filter_allowed(
        &self,
        subject: &str,
        codes: Vec<ClassificationCode>,
        min_role: AccessRole,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<ClassificationCode>> {
        if codes.is_empty() {
            return Ok(codes);
        }

        let allowed = self.allowed_codes(subject, min_role, now).await?;
        Ok(codes
            .into_iter()
            .filter(|code| allowed.contains(code))
            .collect())
    }

    async fn effective_grants(
        &self,
        subject: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<PermissionGrant>> {
        let grants = self.grant_repository.list_grants_for_subject(subject).await?;

        Ok(grants
            .into_iter()
            .filter(|grant| grant.is_effective_at(now))
            .collect())
    }

    async fn strongest_match(
        &self,
        grants: &[PermissionGrant],
        code: &ClassificationCode,
    ) -> AppResult<Option<AccessRole>> {
        let direct = grants
            .iter()
            .filter(|grant| grant.code() == code)
            .map(PermissionGrant::role)
            .max();

        let inheriting: Vec<&PermissionGrant> = grants
            .iter()
            .filter(|grant| grant.include_children() && grant.code() != code)
            .filter(|grant| direct.is_none_or(|role| grant.role() > role))
            .collect();
        if inheriting.is_empty() {
            return Ok(direct);
        }

        let ancestors: HashSet<ClassificationCode> = self
            .tree_repository
            .ancestor_codes(code)
            .await?
            .into_iter()
            .collect();
        let inherited = inheriting
            .into_iter()
            .filter(|grant| ancestors.contains(grant.code()))
            .map(PermissionGrant::role)
            .max();

        Ok(direct.max(inherited))
    }
}
