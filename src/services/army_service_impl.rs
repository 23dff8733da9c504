//! `SeaORM` implementation of the `ArmyService` trait.

use crate::db::Store;
use crate::models::army::{ArmyList, CreateArmyRequest, UpdateArmyRequest};
use crate::services::army_service::{ArmyError, ArmyService, build_changes, validate_new_army};
use async_trait::async_trait;
use tracing::info;

pub struct SeaOrmArmyService {
    store: Store,
    enforce_point_totals: bool,
}

impl SeaOrmArmyService {
    #[must_use]
    pub const fn new(store: Store, enforce_point_totals: bool) -> Self {
        Self {
            store,
            enforce_point_totals,
        }
    }
}

#[async_trait]
impl ArmyService for SeaOrmArmyService {
    async fn list(&self, owner_id: i32) -> Result<Vec<ArmyList>, ArmyError> {
        Ok(self.store.list_armies(owner_id).await?)
    }

    async fn get(&self, id: &str, owner_id: i32) -> Result<ArmyList, ArmyError> {
        self.store
            .get_army(id, owner_id)
            .await?
            .ok_or(ArmyError::NotFound)
    }

    async fn create(
        &self,
        owner_id: i32,
        request: CreateArmyRequest,
    ) -> Result<ArmyList, ArmyError> {
        let list = validate_new_army(request, self.enforce_point_totals)?;
        Ok(self.store.create_army(owner_id, list).await?)
    }

    async fn update(
        &self,
        id: &str,
        owner_id: i32,
        request: UpdateArmyRequest,
    ) -> Result<(), ArmyError> {
        let changes = build_changes(request, self.enforce_point_totals)?;

        if !self.store.update_army(id, owner_id, &changes).await? {
            return Err(ArmyError::NotFound);
        }

        Ok(())
    }

    async fn delete(&self, id: &str, owner_id: i32) -> Result<(), ArmyError> {
        if !self.store.delete_army(id, owner_id).await? {
            return Err(ArmyError::NotFound);
        }

        info!(army_id = %id, user_id = owner_id, "Deleted army list");
        Ok(())
    }
}
