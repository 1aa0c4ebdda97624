//! Application layer driving the checkout.
//!
//! `CheckoutSession` is the synchronous core (cart, policy, active flow) and
//! `Terminal` is the single-task event loop around it: it executes flow
//! effects, runs timers as `tokio` tasks and feeds them back in order.

pub mod scheduler;
pub mod session;
pub mod terminal;
