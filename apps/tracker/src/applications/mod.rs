// Job application records: persistence, form intake, lifecycle and routes.

pub mod form;
pub mod handlers;
pub mod lifecycle;
pub mod store;
