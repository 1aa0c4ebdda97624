//! Domain layer: money, the cart, checkout rules, per-method validation and
//! the ports the core talks to the outside world through.

pub mod amount;
pub mod card;
pub mod cart;
pub mod outcome;
pub mod policy;
pub mod ports;
pub mod tag;
pub mod upi;
