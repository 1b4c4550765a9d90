pub mod account;
pub mod official;
pub mod page;
pub mod report;
pub mod task;
pub mod todo;

pub use account::{Account, AccountSummary, AccountWithSecrets};
pub use official::{Official, PdfDocument};
pub use page::Page;
pub use report::Report;
pub use task::{DeploymentSlot, DeploymentTarget, ProgressEntry, SlotPatch, TargetPatch, Task};
pub use todo::Todo;

use serde::Serialize;
use uuid::Uuid;

use crate::types::Role;

/// Documents that belong to one account and may be assigned to another.
pub trait Owned {
    fn owner_id(&self) -> Uuid;
    fn assigned_to_id(&self) -> Option<Uuid>;

    fn is_owned_by(&self, account_id: Uuid) -> bool {
        self.owner_id() == account_id
    }

    fn is_assigned_to(&self, account_id: Uuid) -> bool {
        self.assigned_to_id() == Some(account_id)
    }

    /// Admins see everything; other accounts see what they own or are assigned.
    fn is_visible_to(&self, account_id: Uuid, role: Role) -> bool {
        role.is_admin() || self.is_owned_by(account_id) || self.is_assigned_to(account_id)
    }
}

macro_rules! impl_owned {
    ($($ty:ty),+) => {
        $(impl Owned for $ty {
            fn owner_id(&self) -> Uuid {
                self.owner_id
            }

            fn assigned_to_id(&self) -> Option<Uuid> {
                self.assigned_to_id
            }
        })+
    };
}

impl_owned!(Page, Report, Task, Todo, Official);

/// A document with its owner and assignee replaced by account summaries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Populated<T> {
    #[serde(flatten)]
    pub doc: T,
    pub owner: Option<AccountSummary>,
    pub assigned_to: Option<AccountSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::types::Json;

    use crate::media::ImageCollection;

    fn page(owner: Uuid, assignee: Option<Uuid>) -> Page {
        Page {
            id: Uuid::new_v4(),
            page_name: "Landing".into(),
            description: "Home page".into(),
            owner_id: owner,
            assigned_to_id: assignee,
            images: Json(ImageCollection::new()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn visibility_follows_ownership_and_assignment() {
        let owner = Uuid::new_v4();
        let assignee = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let doc = page(owner, Some(assignee));

        assert!(doc.is_visible_to(owner, Role::User));
        assert!(doc.is_visible_to(assignee, Role::User));
        assert!(!doc.is_visible_to(stranger, Role::User));
        assert!(doc.is_visible_to(stranger, Role::Admin));
    }

    #[test]
    fn populated_view_replaces_ids_with_summaries() {
        let owner = AccountSummary {
            id: Uuid::new_v4(),
            project_name: "Acme".into(),
            email: "owner@acme.io".into(),
            role: Role::User,
        };
        let doc = page(owner.id, None);
        let view = Populated { doc, owner: Some(owner.clone()), assigned_to: None };

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["pageName"], "Landing");
        assert_eq!(json["owner"]["projectName"], "Acme");
        assert_eq!(json["owner"]["role"], "user");
        assert!(json["assignedTo"].is_null());
        assert!(json.get("ownerId").is_none());
        assert_eq!(json["images"], serde_json::json!([]));
    }
}
