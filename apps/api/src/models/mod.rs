pub mod event;
pub mod member;
pub mod request;
pub mod skill;
pub mod team;
pub mod user;
