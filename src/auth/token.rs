//! Token pair and redacted secret types persisted by the token store.

pub mod pair;
pub mod secret;
