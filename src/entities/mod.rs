pub mod prelude;

pub mod army_lists;
pub mod users;
