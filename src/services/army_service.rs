//! Domain service for army lists.
//!
//! Every operation is scoped to the calling user. A list owned by someone else
//! is reported exactly like a list that does not exist.

use thiserror::Error;

use crate::models::army::{
    ArmyChanges, ArmyList, CreateArmyRequest, NewArmyList, UpdateArmyRequest, roster_points,
};

/// Errors specific to army list operations.
#[derive(Debug, Error)]
pub enum ArmyError {
    #[error("Army not found")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for ArmyError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ArmyError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Domain service trait for army lists.
#[async_trait::async_trait]
pub trait ArmyService: Send + Sync {
    /// Lists the owner's army lists, newest first.
    async fn list(&self, owner_id: i32) -> Result<Vec<ArmyList>, ArmyError>;

    /// # Errors
    ///
    /// Returns [`ArmyError::NotFound`] if no list with this id belongs to the owner.
    async fn get(&self, id: &str, owner_id: i32) -> Result<ArmyList, ArmyError>;

    /// # Errors
    ///
    /// Returns [`ArmyError::Validation`] when a required field is missing.
    async fn create(&self, owner_id: i32, request: CreateArmyRequest)
    -> Result<ArmyList, ArmyError>;

    /// Applies the supplied fields only.
    ///
    /// # Errors
    ///
    /// Returns [`ArmyError::Validation`] when nothing was supplied and
    /// [`ArmyError::NotFound`] when no owned list matched.
    async fn update(
        &self,
        id: &str,
        owner_id: i32,
        request: UpdateArmyRequest,
    ) -> Result<(), ArmyError>;

    /// # Errors
    ///
    /// Returns [`ArmyError::NotFound`] when no owned list matched.
    async fn delete(&self, id: &str, owner_id: i32) -> Result<(), ArmyError>;
}

/// Checks a create request and turns it into an insertable list.
///
/// With `enforce_totals` the roster sum is authoritative: a supplied
/// `totalPoints` must equal it and a missing one is filled in.
pub fn validate_new_army(
    request: CreateArmyRequest,
    enforce_totals: bool,
) -> Result<NewArmyList, ArmyError> {
    let required = || ArmyError::Validation("All fields are required".to_string());

    let name = request.name.filter(|s| !s.is_empty()).ok_or_else(required)?;
    let nation = request.nation.filter(|s| !s.is_empty()).ok_or_else(required)?;
    let points_limit = request.points_limit.filter(|p| *p != 0).ok_or_else(required)?;
    let units = request.units.ok_or_else(required)?;

    let total_points = if enforce_totals {
        let computed = roster_total(&units)?;
        match request.total_points {
            Some(claimed) if claimed != computed => return Err(total_mismatch(claimed, computed)),
            _ => computed,
        }
    } else {
        request.total_points.unwrap_or(0)
    };

    Ok(NewArmyList {
        name,
        nation,
        points_limit,
        units,
        total_points,
    })
}

/// Builds the column changes for a partial update.
pub fn build_changes(
    request: UpdateArmyRequest,
    enforce_totals: bool,
) -> Result<ArmyChanges, ArmyError> {
    let mut changes = ArmyChanges {
        name: request.name,
        nation: request.nation,
        points_limit: request.points_limit,
        units: request.units,
        total_points: request.total_points,
    };

    if changes.is_empty() {
        return Err(ArmyError::Validation("No fields to update".to_string()));
    }

    if enforce_totals {
        match (&changes.units, changes.total_points) {
            (Some(units), claimed) => {
                let computed = roster_total(units)?;
                if let Some(claimed) = claimed
                    && claimed != computed
                {
                    return Err(total_mismatch(claimed, computed));
                }
                changes.total_points = Some(computed);
            }
            (None, Some(_)) => {
                return Err(ArmyError::Validation(
                    "totalPoints can only be changed together with units".to_string(),
                ));
            }
            (None, None) => {}
        }
    }

    Ok(changes)
}

fn roster_total(units: &[crate::models::army::ArmyUnit]) -> Result<i32, ArmyError> {
    i32::try_from(roster_points(units))
        .map_err(|_| ArmyError::Validation("Roster point total is out of range".to_string()))
}

fn total_mismatch(claimed: i32, computed: i32) -> ArmyError {
    ArmyError::Validation(format!(
        "totalPoints ({claimed}) does not match the unit roster ({computed})"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::army::{ArmyUnit, Experience};

    fn unit(id: &str, points: i32) -> ArmyUnit {
        ArmyUnit {
            id: id.to_string(),
            name: "Hirdmen".to_string(),
            unit_type: "Infantry".to_string(),
            experience: Experience::Veteran,
            size: 8,
            points,
            equipment: vec![],
            special_rules: vec![],
            unique_id: None,
            selected_options: None,
            extra: serde_json::Map::new(),
        }
    }

    fn create_request() -> CreateArmyRequest {
        CreateArmyRequest {
            name: Some("Vikings".to_string()),
            nation: Some("Norse".to_string()),
            points_limit: Some(1000),
            units: Some(vec![]),
            total_points: Some(0),
        }
    }

    #[test]
    fn create_accepts_empty_roster() {
        let list = validate_new_army(create_request(), false).unwrap();
        assert_eq!(list.name, "Vikings");
        assert!(list.units.is_empty());
        assert_eq!(list.total_points, 0);
    }

    #[test]
    fn create_requires_fields() {
        let cases = [
            CreateArmyRequest { name: None, ..create_request() },
            CreateArmyRequest { name: Some(String::new()), ..create_request() },
            CreateArmyRequest { nation: None, ..create_request() },
            CreateArmyRequest { points_limit: None, ..create_request() },
            CreateArmyRequest { points_limit: Some(0), ..create_request() },
            CreateArmyRequest { units: None, ..create_request() },
        ];

        for request in cases {
            let err = validate_new_army(request, false).unwrap_err();
            assert!(matches!(err, ArmyError::Validation(ref m) if m == "All fields are required"));
        }
    }

    #[test]
    fn create_defaults_missing_total() {
        let request = CreateArmyRequest {
            units: Some(vec![unit("a", 50)]),
            total_points: None,
            ..create_request()
        };
        assert_eq!(validate_new_army(request.clone(), false).unwrap().total_points, 0);
        assert_eq!(validate_new_army(request, true).unwrap().total_points, 50);
    }

    #[test]
    fn create_trusts_client_total_unless_enforced() {
        let request = CreateArmyRequest {
            units: Some(vec![unit("a", 50), unit("b", 75)]),
            total_points: Some(999),
            ..create_request()
        };

        assert_eq!(validate_new_army(request.clone(), false).unwrap().total_points, 999);
        assert!(matches!(
            validate_new_army(request, true),
            Err(ArmyError::Validation(_))
        ));
    }

    #[test]
    fn update_with_nothing_is_rejected() {
        let err = build_changes(UpdateArmyRequest::default(), false).unwrap_err();
        assert!(matches!(err, ArmyError::Validation(ref m) if m == "No fields to update"));
    }

    #[test]
    fn update_touches_only_supplied_fields() {
        let request = UpdateArmyRequest {
            name: Some("X".to_string()),
            ..Default::default()
        };
        let changes = build_changes(request, false).unwrap();
        assert_eq!(
            changes,
            ArmyChanges {
                name: Some("X".to_string()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn enforced_update_recomputes_total() {
        let request = UpdateArmyRequest {
            units: Some(vec![unit("a", 40), unit("b", 60)]),
            ..Default::default()
        };
        let changes = build_changes(request, true).unwrap();
        assert_eq!(changes.total_points, Some(100));

        let request = UpdateArmyRequest {
            total_points: Some(100),
            ..Default::default()
        };
        assert!(build_changes(request.clone(), true).is_err());
        assert_eq!(build_changes(request, false).unwrap().total_points, Some(100));
    }
}
