//! Shared utilities for use cases.
//!
//! Permission gating and the best-effort secondary effects (notifications,
//! audit events, revote scheduling) used by every mutating use case.

use crate::ports::audit::{AuditLog, TimelineEvent};
use crate::ports::notification::{Notification, NotificationDispatcher};
use crate::ports::permission::{Action, PermissionChecker, Resource};
use crate::ports::revote_scheduler::{RevoteRequest, RevoteScheduler};
use ballot_domain::UserId;
use tracing::{debug, warn};

/// Ask the permission port, logging denials.
pub(crate) async fn is_permitted(
    checker: &dyn PermissionChecker,
    actor: &UserId,
    action: Action,
    resource: &Resource,
) -> bool {
    let allowed = checker.can(actor, action, resource).await;
    if !allowed {
        debug!("Permission denied: {} may not {} on {}", actor, action, resource);
    }
    allowed
}

/// Deliver a notification; failures are logged and swallowed.
pub(crate) async fn notify_best_effort(
    dispatcher: &dyn NotificationDispatcher,
    notification: Notification,
) {
    let recipient = notification.recipient.clone();
    let kind = notification.kind;
    if let Err(e) = dispatcher.notify(notification).await {
        warn!(
            "Notification {} to {} failed: {}",
            kind.as_str(),
            recipient,
            e
        );
    }
}

/// Record a timeline event; failures are logged and swallowed.
pub(crate) fn record_best_effort(audit: &dyn AuditLog, event: TimelineEvent) {
    let event_type = event.event_type;
    if let Err(e) = audit.record(event) {
        warn!("Audit event {} was not recorded: {}", event_type, e);
    }
}

/// Schedule a revote; failures are logged and swallowed.
pub(crate) async fn schedule_best_effort(scheduler: &dyn RevoteScheduler, request: RevoteRequest) {
    let position = request.position_id.clone();
    let due_at = request.due_at();
    match scheduler.schedule(request).await {
        Ok(()) => debug!("Revote for {} scheduled at {}", position, due_at),
        Err(e) => warn!("Revote for {} could not be scheduled: {}", position, e),
    }
}
