// Creation records: append-only persistence and the read-only listing routes.

pub mod handlers;
pub mod store;
