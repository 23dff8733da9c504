pub mod army;
pub mod user;
