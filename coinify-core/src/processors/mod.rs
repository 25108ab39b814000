pub mod checkout;
pub mod state_machine;
pub mod webhook_dispatcher;

pub use checkout::{
    CheckoutError, CheckoutRedirect, CheckoutSession, PaymentGateway, RefundError,
};
pub use state_machine::{Plan, Reconciliation, TRANSITIONS, TransitionRule};
pub use webhook_dispatcher::{DispatchOutcome, WebhookDispatcher};
