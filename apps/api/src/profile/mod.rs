// Profile: the signed-in user's row and skill set.

pub mod handlers;
pub mod repository;
