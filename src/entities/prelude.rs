pub use super::army_lists::Entity as ArmyLists;
pub use super::users::Entity as Users;
