//! Authorization service for centralized access control.
//!
//! This module provides the main authorization API that service operations use
//! to check permissions. It wraps Casbin enforcement with relation expansion.

use std::fmt;
use std::sync::Arc;

use casbin::CoreApi;

use crate::error::{ServiceError, ServiceResult};

use super::subject::Subjects;

/// Resource kinds named in the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    CalendarEvent,
    Club,
    ClubPost,
    ClubPostComment,
    CharitableItem,
    Giveaway,
    HelpRequest,
    CommunityComment,
    Residence,
    AllowedEmail,
    AuditLog,
    Dashboard,
}

impl Resource {
    #[must_use]
    pub const fn as_casbin_object(self) -> &'static str {
        match self {
            Self::CalendarEvent => "calendar_event",
            Self::Club => "club",
            Self::ClubPost => "club_post",
            Self::ClubPostComment => "club_post_comment",
            Self::CharitableItem => "charitable_item",
            Self::Giveaway => "giveaway",
            Self::HelpRequest => "help_request",
            Self::CommunityComment => "community_comment",
            Self::Residence => "residence",
            Self::AllowedEmail => "allowed_email",
            Self::AuditLog => "audit_log",
            Self::Dashboard => "dashboard",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_casbin_object())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    Join,
    Leave,
    Claim,
    Release,
}

impl Action {
    #[must_use]
    pub const fn as_casbin_action(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Join => "join",
            Self::Leave => "leave",
            Self::Claim => "claim",
            Self::Release => "release",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_casbin_action())
    }
}

/// Result of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthzResult {
    /// Access is allowed.
    Allowed,
    /// Access is denied.
    Denied,
}

impl AuthzResult {
    /// Returns `true` if access is allowed.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Convert to a `Result`, returning `Err(ServiceError::AuthorizationError)`
    /// carrying `denial` if denied.
    ///
    /// ## Errors
    ///
    /// Returns `AuthorizationError` if access is denied.
    pub fn require(self, denial: &str) -> ServiceResult<()> {
        match self {
            Self::Allowed => Ok(()),
            Self::Denied => Err(ServiceError::forbidden(denial)),
        }
    }
}

/// Authorization service for checking permissions.
///
/// ## Usage
///
/// ```ignore
/// let subjects = Subjects::for_user(&caller).with_owner(&caller, event.created_by);
/// authz.require(&subjects, Resource::CalendarEvent, Action::Delete, "Only the creator or an admin can delete this event")?;
/// ```
#[derive(Clone)]
pub struct Authorizer {
    enforcer: Arc<casbin::Enforcer>,
}

impl Authorizer {
    /// Create a new authorizer with the given Casbin enforcer.
    #[must_use]
    pub fn new(enforcer: Arc<casbin::Enforcer>) -> Self {
        Self { enforcer }
    }

    /// Check if any relation in the expanded set grants `action` on `resource`.
    ///
    /// ## Errors
    ///
    /// Returns `CasbinError` if Casbin evaluation fails.
    pub fn check(
        &self,
        subjects: &Subjects,
        resource: Resource,
        action: Action,
    ) -> ServiceResult<AuthzResult> {
        let obj = resource.as_casbin_object();
        let act = action.as_casbin_action();

        tracing::debug!(
            resource = %obj,
            action = %act,
            subject_count = subjects.len(),
            "Authorization check started"
        );

        for relation in subjects {
            let sub = relation.casbin_subject();

            let allowed = self
                .enforcer
                .enforce((sub, obj, act))
                .map_err(ServiceError::CasbinError)?;

            tracing::trace!(
                subject = %sub,
                resource = %obj,
                action = %act,
                allowed = %allowed,
                "Subject check result"
            );

            if allowed {
                tracing::debug!(subject = %sub, resource = %obj, action = %act, "Authorization granted");
                return Ok(AuthzResult::Allowed);
            }
        }

        tracing::debug!(resource = %obj, action = %act, "Authorization denied for all subjects");
        Ok(AuthzResult::Denied)
    }

    /// Check and require permission, returning `denial` as the error message
    /// if denied.
    ///
    /// ## Errors
    ///
    /// - Returns `AuthorizationError` if access is denied.
    /// - Returns `CasbinError` if Casbin evaluation fails.
    pub fn require(
        &self,
        subjects: &Subjects,
        resource: Resource,
        action: Action,
        denial: &str,
    ) -> ServiceResult<()> {
        self.check(subjects, resource, action)?.require(denial)
    }
}
