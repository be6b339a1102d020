mod auth;

pub use auth::{attach_identity, bind_identity, clear_identity};
