use crate::entities::{army_lists, prelude::*};
use crate::models::army::{ArmyChanges, ArmyList, ArmyUnit, NewArmyList};
use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::info;

/// Repository for army lists. Every read and write is scoped to an owner in
/// the same statement, so a list belonging to someone else is never visible.
pub struct ArmyRepository {
    conn: DatabaseConnection,
}

impl ArmyRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Model Conversion Helpers
    // ========================================================================

    fn map_model(row: army_lists::Model) -> Result<ArmyList> {
        let units = decode_units(&row.units)
            .with_context(|| format!("Corrupt unit roster for army list {}", row.id))?;

        Ok(ArmyList {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            nation: row.nation,
            points_limit: row.points_limit,
            units,
            total_points: row.total_points,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    fn owned(id: &str, owner_id: i32) -> sea_orm::Condition {
        sea_orm::Condition::all()
            .add(army_lists::Column::Id.eq(id))
            .add(army_lists::Column::UserId.eq(owner_id))
    }

    // ========================================================================
    // Army List Operations
    // ========================================================================

    /// All lists owned by `owner_id`, newest first.
    pub async fn list_for_owner(&self, owner_id: i32) -> Result<Vec<ArmyList>> {
        let rows = ArmyLists::find()
            .filter(army_lists::Column::UserId.eq(owner_id))
            .order_by_desc(army_lists::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list army lists")?;

        rows.into_iter().map(Self::map_model).collect()
    }

    pub async fn get(&self, id: &str, owner_id: i32) -> Result<Option<ArmyList>> {
        let row = ArmyLists::find()
            .filter(Self::owned(id, owner_id))
            .one(&self.conn)
            .await
            .context("Failed to query army list")?;

        row.map(Self::map_model).transpose()
    }

    /// Inserts a list and returns it built from the input rather than re-read.
    pub async fn insert(&self, owner_id: i32, list: NewArmyList) -> Result<ArmyList> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = crate::db::timestamp();
        let units_json = encode_units(&list.units)?;

        let active_model = army_lists::ActiveModel {
            id: Set(id.clone()),
            user_id: Set(owner_id),
            name: Set(list.name.clone()),
            nation: Set(list.nation.clone()),
            points_limit: Set(list.points_limit),
            units: Set(units_json),
            total_points: Set(list.total_points),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
        };

        ArmyLists::insert(active_model)
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to insert army list")?;

        info!(army_id = %id, user_id = owner_id, "Created army list");

        Ok(ArmyList {
            id,
            user_id: owner_id,
            name: list.name,
            nation: list.nation,
            points_limit: list.points_limit,
            units: list.units,
            total_points: list.total_points,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Applies only the supplied columns plus `updated_at`.
    /// Returns false when no row matched both `id` and owner.
    pub async fn update(&self, id: &str, owner_id: i32, changes: &ArmyChanges) -> Result<bool> {
        let mut update = ArmyLists::update_many()
            .col_expr(army_lists::Column::UpdatedAt, Expr::value(crate::db::timestamp()))
            .filter(Self::owned(id, owner_id));

        if let Some(name) = &changes.name {
            update = update.col_expr(army_lists::Column::Name, Expr::value(name.clone()));
        }
        if let Some(nation) = &changes.nation {
            update = update.col_expr(army_lists::Column::Nation, Expr::value(nation.clone()));
        }
        if let Some(points_limit) = changes.points_limit {
            update = update.col_expr(army_lists::Column::PointsLimit, Expr::value(points_limit));
        }
        if let Some(units) = &changes.units {
            update = update.col_expr(army_lists::Column::Units, Expr::value(encode_units(units)?));
        }
        if let Some(total_points) = changes.total_points {
            update = update.col_expr(army_lists::Column::TotalPoints, Expr::value(total_points));
        }

        let result = update
            .exec(&self.conn)
            .await
            .context("Failed to update army list")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn delete(&self, id: &str, owner_id: i32) -> Result<bool> {
        let result = ArmyLists::delete_many()
            .filter(Self::owned(id, owner_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete army list")?;

        Ok(result.rows_affected > 0)
    }
}

fn encode_units(units: &[ArmyUnit]) -> Result<String> {
    serde_json::to_string(units).context("Failed to encode unit roster")
}

fn decode_units(raw: &str) -> Result<Vec<ArmyUnit>> {
    Ok(serde_json::from_str(raw)?)
}
