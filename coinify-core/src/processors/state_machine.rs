//! Order state machine driven by verified webhook events.
//!
//! The mapping from event tag to status transition is the static
//! [`TRANSITIONS`] table. [`plan`] decides what an event means for an order
//! without touching the store; [`reconcile`] carries the plan out.
//!
//! Events with no rule are never dropped silently: they leave the status
//! alone and add a note recording the tag verbatim.

use coinify_sdk::objects::{EventTag, WebhookEnvelope};
use tracing::{info, warn};

use crate::orders::{Order, OrderStatus, OrderStore, StoreError};

/// One row of the transition table.
#[derive(Debug)]
pub struct TransitionRule {
    pub event: EventTag,
    /// Statuses the order may be in for the rule to apply.
    pub from: &'static [OrderStatus],
    pub to: OrderStatus,
    /// Note appended to the order once the transition is applied.
    pub note: &'static str,
    /// Record the payment time and intent id along with the status.
    pub marks_paid: bool,
}

pub static TRANSITIONS: &[TransitionRule] = &[
    TransitionRule {
        event: EventTag::PaymentComplete,
        from: &[OrderStatus::Pending],
        to: OrderStatus::Processing,
        note: "Payment via Coinify completed successfully.",
        marks_paid: true,
    },
    TransitionRule {
        event: EventTag::PaymentCancelled,
        from: &[OrderStatus::Pending],
        to: OrderStatus::Cancelled,
        note: "The payment was cancelled.",
        marks_paid: false,
    },
    TransitionRule {
        event: EventTag::PaymentFailed,
        from: &[OrderStatus::Pending],
        to: OrderStatus::Failed,
        note: "The payment failed via Coinify.",
        marks_paid: false,
    },
    TransitionRule {
        event: EventTag::RefundCompleted,
        from: &[OrderStatus::Processing, OrderStatus::Completed],
        to: OrderStatus::Refunded,
        note: "The refund was completed via Coinify.",
        marks_paid: false,
    },
];

/// Look up the rule for an event tag.
pub fn rule_for(event: &EventTag) -> Option<&'static TransitionRule> {
    TRANSITIONS.iter().find(|rule| &rule.event == event)
}

/// What an event means for an order in a given status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Transition {
        from: OrderStatus,
        to: OrderStatus,
        note: String,
        marks_paid: bool,
    },
    /// The order already is in the rule's target status.
    AlreadyApplied { status: OrderStatus },
    /// The rule does not allow leaving the current status.
    Rejected {
        from: OrderStatus,
        to: OrderStatus,
        note: String,
    },
    /// No rule for this event tag.
    UnknownEvent { note: String },
}

pub fn plan(current: &OrderStatus, envelope: &WebhookEnvelope) -> Plan {
    let tag = envelope.tag();
    let Some(rule) = rule_for(&tag) else {
        return Plan::UnknownEvent {
            note: format!("Received unknown event \"{}\" from Coinify.", envelope.event),
        };
    };

    if current == &rule.to {
        return Plan::AlreadyApplied {
            status: current.clone(),
        };
    }

    if !rule.from.contains(current) {
        return Plan::Rejected {
            from: current.clone(),
            to: rule.to.clone(),
            note: format!(
                "Ignored Coinify event \"{tag}\": order status \"{current}\" cannot change to \"{}\".",
                rule.to
            ),
        };
    }

    let note = match envelope.data.reason.as_deref().map(str::trim) {
        Some(reason) if tag == EventTag::PaymentCancelled && !reason.is_empty() => {
            format!("{} Reason: {reason}", rule.note)
        }
        _ => rule.note.to_owned(),
    };

    Plan::Transition {
        from: current.clone(),
        to: rule.to.clone(),
        note,
        marks_paid: rule.marks_paid,
    }
}

/// Result of applying one event to one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    Applied { from: OrderStatus, to: OrderStatus },
    AlreadyApplied,
    /// Another delivery changed the status between read and write.
    Superseded,
    Rejected,
    UnknownEvent,
}

/// Apply a verified event to `order` through `store`.
///
/// A transition and its note are written together. A rejected event whose
/// note is already the latest one is not noted again.
pub async fn reconcile(
    store: &dyn OrderStore,
    order: &Order,
    envelope: &WebhookEnvelope,
) -> Result<Reconciliation, StoreError> {
    match plan(&order.status, envelope) {
        Plan::Transition {
            from,
            to,
            note,
            marks_paid,
        } => {
            let changed = if marks_paid {
                store
                    .mark_paid(&order.id, &from, &to, envelope.data.id.as_deref(), &note)
                    .await?
            } else {
                store.transition_status(&order.id, &from, &to, &note).await?
            };
            if !changed {
                info!(
                    order_id = %order.id,
                    event = %envelope.event,
                    "Order status changed concurrently, skipping transition"
                );
                return Ok(Reconciliation::Superseded);
            }
            info!(
                order_id = %order.id,
                event = %envelope.event,
                from = %from,
                to = %to,
                "Order status updated from Coinify webhook"
            );
            Ok(Reconciliation::Applied { from, to })
        }
        Plan::AlreadyApplied { status } => {
            info!(
                order_id = %order.id,
                event = %envelope.event,
                status = %status,
                "Order already in target status"
            );
            Ok(Reconciliation::AlreadyApplied)
        }
        Plan::Rejected { from, to, note } => {
            warn!(
                order_id = %order.id,
                event = %envelope.event,
                from = %from,
                to = %to,
                "Coinify event does not apply to current order status"
            );
            let notes = store.notes(&order.id).await?;
            if notes.last().map(|last| last.message.as_str()) != Some(note.as_str()) {
                store.append_note(&order.id, &note).await?;
            }
            Ok(Reconciliation::Rejected)
        }
        Plan::UnknownEvent { note } => {
            warn!(
                order_id = %order.id,
                event = %envelope.event,
                "Unknown event from Coinify"
            );
            store.append_note(&order.id, &note).await?;
            Ok(Reconciliation::UnknownEvent)
        }
    }
}
