//! Payment-processor webhook payloads.
//!
//! Signature verification belongs to the HTTP edge (the processor SDK
//! verifies before anything here runs); this module only defines the
//! normalized event the ledger consumes and the outcome of applying it.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// What a checkout session purchased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Subscription,
    CreditPack,
}

/// A normalized, signature-verified payment-processor notification.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebhookEvent {
    /// Processor-assigned event id; the idempotency key.
    pub event_id: String,
    /// Processor event kind, e.g. `checkout.session.completed`.
    pub kind: String,
    pub workspace_id: Option<String>,
    pub product_type: Option<ProductType>,
    /// Plan name for subscription checkouts.
    pub plan: Option<String>,
    /// Credit pack id for credit-pack checkouts.
    pub credit_pack_id: Option<String>,
    /// Explicit credit amount; overrides the pack catalog when present.
    pub credits: Option<i32>,
    pub amount_cents: Option<i64>,
    pub currency: Option<String>,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
}

pub const KIND_CHECKOUT_COMPLETED: &str = "checkout.session.completed";
pub const KIND_SUBSCRIPTION_CREATED: &str = "customer.subscription.created";
pub const KIND_SUBSCRIPTION_UPDATED: &str = "customer.subscription.updated";
pub const KIND_SUBSCRIPTION_DELETED: &str = "customer.subscription.deleted";
pub const KIND_PAYMENT_SUCCEEDED: &str = "invoice.payment_succeeded";

/// Result of applying a webhook to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WebhookOutcome {
    /// Ledger state changed (or an audit row was recorded).
    Applied,
    /// The event id was seen before; nothing changed.
    Duplicate,
    /// Unrecognized kind; accepted and logged, never an error.
    Unhandled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_event_deserializes_from_minimal_json() {
        let event: WebhookEvent = serde_json::from_str(
            r#"{
                "event_id": "evt_123",
                "kind": "invoice.payment_succeeded"
            }"#,
        )
        .unwrap();
        assert_eq!(event.event_id, "evt_123");
        assert!(event.workspace_id.is_none());
        assert!(event.product_type.is_none());
    }

    #[test]
    fn test_product_type_wire_names() {
        let event: WebhookEvent = serde_json::from_str(
            r#"{
                "event_id": "evt_1",
                "kind": "checkout.session.completed",
                "workspace_id": "ws-1",
                "product_type": "credit_pack",
                "credit_pack_id": "pack_10"
            }"#,
        )
        .unwrap();
        assert_eq!(event.product_type, Some(ProductType::CreditPack));
    }
}
