pub mod chat;
pub mod review;
