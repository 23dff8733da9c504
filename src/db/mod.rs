use crate::models::army::{ArmyChanges, ArmyList, NewArmyList};
use crate::models::user::UserRef;
use anyhow::Result;
use chrono::SecondsFormat;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::user::{User, hash_password};

/// Current UTC time as RFC 3339 with fixed microsecond precision, so that
/// string order matches chronological order.
#[must_use]
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Each SQLite in-memory connection is its own database
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        if !in_memory {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn army_repo(&self) -> repositories::army::ArmyRepository {
        repositories::army::ArmyRepository::new(self.conn.clone())
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list_all().await
    }

    pub async fn create_user(&self, username: &str, password_hash: String) -> Result<Option<User>> {
        self.user_repo().create(username, password_hash).await
    }

    pub async fn verify_user_password(
        &self,
        username: &str,
        password: &str,
        dummy_hash: &str,
    ) -> Result<Option<User>> {
        self.user_repo()
            .verify_password(username, password, dummy_hash)
            .await
    }

    pub async fn set_user_admin(&self, username: &str, admin: bool) -> Result<bool> {
        self.user_repo().set_admin(username, admin).await
    }

    pub async fn delete_user(&self, target: &UserRef) -> Result<bool> {
        self.user_repo().delete(target).await
    }

    // ========================================================================
    // Army lists
    // ========================================================================

    pub async fn list_armies(&self, owner_id: i32) -> Result<Vec<ArmyList>> {
        self.army_repo().list_for_owner(owner_id).await
    }

    pub async fn get_army(&self, id: &str, owner_id: i32) -> Result<Option<ArmyList>> {
        self.army_repo().get(id, owner_id).await
    }

    pub async fn create_army(&self, owner_id: i32, list: NewArmyList) -> Result<ArmyList> {
        self.army_repo().insert(owner_id, list).await
    }

    pub async fn update_army(&self, id: &str, owner_id: i32, changes: &ArmyChanges) -> Result<bool> {
        self.army_repo().update(id, owner_id, changes).await
    }

    pub async fn delete_army(&self, id: &str, owner_id: i32) -> Result<bool> {
        self.army_repo().delete(id, owner_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::army::{ArmyUnit, Experience};

    async fn store() -> Store {
        Store::new("sqlite::memory:").await.unwrap()
    }

    fn new_list(name: &str) -> NewArmyList {
        NewArmyList {
            name: name.to_string(),
            nation: "Norse".to_string(),
            points_limit: 1000,
            units: vec![ArmyUnit {
                id: "hird".to_string(),
                name: "Hirdmen".to_string(),
                unit_type: "Infantry".to_string(),
                experience: Experience::Veteran,
                size: 8,
                points: 104,
                equipment: vec!["Shield".to_string()],
                special_rules: vec![],
                unique_id: None,
                selected_options: None,
                extra: serde_json::Map::new(),
            }],
            total_points: 104,
        }
    }

    #[tokio::test]
    async fn duplicate_username_is_reported_as_none() {
        let store = store().await;

        let user = store.create_user("ragnar", "hash".to_string()).await.unwrap();
        let user = user.unwrap();
        assert!(!user.admin);
        assert!(store.create_user("ragnar", "x".to_string()).await.unwrap().is_none());

        let fetched = store.get_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(fetched.username, "ragnar");
        assert!(store.get_user_by_username("Ragnar").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn password_verification() {
        let store = store().await;
        let hash = hash_password("secret", 4).await.unwrap();
        store.create_user("bjorn", hash).await.unwrap();

        let dummy = hash_password("secret", 4).await.unwrap();

        assert!(store.verify_user_password("bjorn", "secret", &dummy).await.unwrap().is_some());
        assert!(store.verify_user_password("bjorn", "wrong", &dummy).await.unwrap().is_none());
        // The dummy hash matching must never produce a user
        assert!(store.verify_user_password("nobody", "secret", &dummy).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn army_access_is_owner_scoped() {
        let store = store().await;
        let owner = store.create_user("a", "h".to_string()).await.unwrap().unwrap();
        let other = store.create_user("b", "h".to_string()).await.unwrap().unwrap();

        let created = store.create_army(owner.id, new_list("Vikings")).await.unwrap();
        assert_eq!(created.created_at, created.updated_at);

        let fetched = store.get_army(&created.id, owner.id).await.unwrap().unwrap();
        assert_eq!(fetched.units, created.units);
        assert!(store.get_army(&created.id, other.id).await.unwrap().is_none());

        let rename = ArmyChanges {
            name: Some("Stolen".to_string()),
            ..ArmyChanges::default()
        };
        assert!(!store.update_army(&created.id, other.id, &rename).await.unwrap());
        assert!(!store.delete_army(&created.id, other.id).await.unwrap());
        assert!(store.list_armies(other.id).await.unwrap().is_empty());

        assert!(store.update_army(&created.id, owner.id, &rename).await.unwrap());
        let renamed = store.get_army(&created.id, owner.id).await.unwrap().unwrap();
        assert_eq!(renamed.name, "Stolen");
        assert_eq!(renamed.nation, "Norse");
        assert_eq!(renamed.total_points, 104);

        assert!(store.delete_army(&created.id, owner.id).await.unwrap());
        assert!(!store.delete_army(&created.id, owner.id).await.unwrap());
    }

    #[tokio::test]
    async fn deleting_a_user_removes_their_lists() {
        let store = store().await;
        let user = store.create_user("victim", "h".to_string()).await.unwrap().unwrap();
        let army = store.create_army(user.id, new_list("Doomed")).await.unwrap();

        assert!(store.set_user_admin("victim", true).await.unwrap());
        assert!(!store.set_user_admin("ghost", true).await.unwrap());

        assert!(store.delete_user(&UserRef::Id(user.id)).await.unwrap());
        assert!(store.get_army(&army.id, user.id).await.unwrap().is_none());
        assert!(!store.delete_user(&UserRef::Username("victim".to_string())).await.unwrap());
        assert!(store.list_users().await.unwrap().is_empty());
    }

    #[test]
    fn timestamps_sort_chronologically() {
        let first = timestamp();
        std::thread::sleep(Duration::from_millis(2));
        let second = timestamp();
        assert!(first < second);
        assert!(first.ends_with('Z'));
    }
}
