//! Test suites for the user database service.

mod lookup_behaviour;
pub(crate) mod support;
mod unit;
