//! Request middleware

mod actor;

pub use actor::{actor_middleware, Actor, CurrentActor};
