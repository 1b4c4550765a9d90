use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub date: DateTime<Utc>,
    pub percentage: u8,
}

/// One deployed build (dev or official) of a site, app or backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSlot {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Partial update of a slot as received from clients.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlotPatch {
    pub url: Option<String>,
    pub version: Option<String>,
}

impl SlotPatch {
    pub fn is_empty(&self) -> bool {
        self.url.is_none() && self.version.is_none()
    }
}

impl DeploymentSlot {
    /// Apply provided fields and stamp the change.
    pub fn apply(&mut self, patch: &SlotPatch, now: DateTime<Utc>) {
        if patch.is_empty() {
            return;
        }
        if let Some(url) = &patch.url {
            self.url = Some(url.trim().to_string()).filter(|u| !u.is_empty());
        }
        if let Some(version) = &patch.version {
            self.version = Some(version.clone());
        }
        if self.created_at.is_none() {
            self.created_at = Some(now);
        }
        self.updated_at = Some(now);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentTarget {
    #[serde(default)]
    pub dev: DeploymentSlot,
    #[serde(default)]
    pub official: DeploymentSlot,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetPatch {
    pub dev: Option<SlotPatch>,
    pub official: Option<SlotPatch>,
}

impl DeploymentTarget {
    pub fn apply(&mut self, patch: &TargetPatch, now: DateTime<Utc>) {
        if let Some(dev) = &patch.dev {
            self.dev.apply(dev, now);
        }
        if let Some(official) = &patch.official {
            self.official.apply(official, now);
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub task_name: String,
    pub description: String,
    pub duration: String,
    pub progression: Json<Vec<ProgressEntry>>,
    pub problem: Option<String>,
    pub done: bool,
    pub due_date: Option<String>,
    #[serde(skip)]
    pub owner_id: Uuid,
    #[serde(skip)]
    pub assigned_to_id: Option<Uuid>,
    pub site: Json<DeploymentTarget>,
    pub apk: Json<DeploymentTarget>,
    pub backend: Json<DeploymentTarget>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn slot_update_stamps_timestamps() {
        let t0 = Utc::now();
        let t1 = t0 + Duration::minutes(5);
        let mut slot = DeploymentSlot::default();

        slot.apply(&SlotPatch { url: Some(" https://dev.acme.io ".into()), version: None }, t0);
        assert_eq!(slot.url.as_deref(), Some("https://dev.acme.io"));
        assert_eq!(slot.created_at, Some(t0));
        assert_eq!(slot.updated_at, Some(t0));

        slot.apply(&SlotPatch { url: None, version: Some("1.2.0".into()) }, t1);
        assert_eq!(slot.created_at, Some(t0));
        assert_eq!(slot.updated_at, Some(t1));
        assert_eq!(slot.version.as_deref(), Some("1.2.0"));
    }

    #[test]
    fn empty_patch_leaves_slot_untouched() {
        let mut target = DeploymentTarget::default();
        target.apply(&TargetPatch { dev: Some(SlotPatch::default()), official: None }, Utc::now());
        assert_eq!(target, DeploymentTarget::default());
    }

    #[test]
    fn empty_jsonb_object_decodes_to_defaults() {
        let target: DeploymentTarget = serde_json::from_str("{}").unwrap();
        assert_eq!(target, DeploymentTarget::default());
    }
}
