// Join requests and invitations: one table, one state machine
// (pending → accepted | rejected), two initiating sides.

pub mod handlers;
pub mod lifecycle;
pub mod repository;
