use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    /// bcrypt password hash
    pub password_hash: String,

    pub admin: bool,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::army_lists::Entity")]
    ArmyLists,
}

impl Related<super::army_lists::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ArmyLists.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
