use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Experience {
    Inexperienced,
    Regular,
    Veteran,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedOptions {
    #[serde(default)]
    pub additional_men: u32,

    /// Option key -> selected quantity
    #[serde(default)]
    pub upgrades: BTreeMap<String, u32>,
}

/// One entry of a roster. Stored as JSON and never queried, so any extra
/// properties a client attaches are kept in `extra` and written back as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmyUnit {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub unit_type: String,
    pub experience: Experience,
    pub size: u32,
    pub points: i32,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub special_rules: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_options: Option<SelectedOptions>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Sum of the unit point costs in a roster.
#[must_use]
pub fn roster_points(units: &[ArmyUnit]) -> i64 {
    units.iter().map(|u| i64::from(u.points)).sum()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmyList {
    pub id: String,
    pub user_id: i32,
    pub name: String,
    pub nation: String,
    pub points_limit: i32,
    pub units: Vec<ArmyUnit>,
    pub total_points: i32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArmyRequest {
    pub name: Option<String>,
    pub nation: Option<String>,
    pub points_limit: Option<i32>,
    pub units: Option<Vec<ArmyUnit>>,
    pub total_points: Option<i32>,
}

/// Partial update. Absent and `null` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArmyRequest {
    pub name: Option<String>,
    pub nation: Option<String>,
    pub points_limit: Option<i32>,
    pub units: Option<Vec<ArmyUnit>>,
    pub total_points: Option<i32>,
}

/// A validated list ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewArmyList {
    pub name: String,
    pub nation: String,
    pub points_limit: i32,
    pub units: Vec<ArmyUnit>,
    pub total_points: i32,
}

/// The columns an update will touch. `updatedAt` is always refreshed on top.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArmyChanges {
    pub name: Option<String>,
    pub nation: Option<String>,
    pub points_limit: Option<i32>,
    pub units: Option<Vec<ArmyUnit>>,
    pub total_points: Option<i32>,
}

impl ArmyChanges {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.nation.is_none()
            && self.points_limit.is_none()
            && self.units.is_none()
            && self.total_points.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unit_keeps_unknown_properties() {
        let raw = json!({
            "id": "u1",
            "name": "Hirdmen",
            "type": "Infantry",
            "experience": "veteran",
            "size": 8,
            "points": 104,
            "equipment": ["Hand weapon", "Shield"],
            "specialRules": ["Shieldwall"],
            "uniqueId": "u1-2",
            "selectedOptions": { "additionalMen": 2, "upgrades": { "0": 1 } },
            "notes": "front rank"
        });

        let unit: ArmyUnit = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(unit.unit_type, "Infantry");
        assert_eq!(unit.experience, Experience::Veteran);
        assert_eq!(unit.selected_options.as_ref().unwrap().additional_men, 2);
        assert_eq!(unit.extra.get("notes"), Some(&json!("front rank")));

        assert_eq!(serde_json::to_value(&unit).unwrap(), raw);
    }

    #[test]
    fn base_unit_omits_extended_fields() {
        let raw = json!({
            "id": "u2",
            "name": "Bondi",
            "type": "Infantry",
            "experience": "regular",
            "size": 10,
            "points": 70,
            "equipment": [],
            "specialRules": []
        });

        let unit: ArmyUnit = serde_json::from_value(raw.clone()).unwrap();
        assert!(unit.unique_id.is_none());
        assert!(unit.extra.is_empty());
        assert_eq!(serde_json::to_value(&unit).unwrap(), raw);
    }

    #[test]
    fn unknown_experience_is_rejected() {
        let raw = json!({
            "id": "u3", "name": "X", "type": "Infantry", "experience": "elite",
            "size": 1, "points": 1
        });
        assert!(serde_json::from_value::<ArmyUnit>(raw).is_err());
    }

    #[test]
    fn empty_changes() {
        assert!(ArmyChanges::default().is_empty());
        let changes = ArmyChanges {
            total_points: Some(0),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }
}
