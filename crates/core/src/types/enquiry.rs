//! Enquiry records and the payloads used to create and update them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{EnquiryId, UserId};
use super::status::{EnquiryStatus, Priority, Role};

/// A customer-submitted contact/support request, as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enquiry {
    #[serde(rename = "_id")]
    pub id: EnquiryId,
    pub customer_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: EnquiryStatus,
    #[serde(default)]
    pub assigned_to: Option<Assignee>,
    pub created_at: DateTime<Utc>,
}

impl Enquiry {
    /// ID of the assigned user, whether or not the backend populated it.
    #[must_use]
    pub fn assignee_id(&self) -> Option<&UserId> {
        self.assigned_to.as_ref().map(Assignee::id)
    }

    /// Display name of the assigned user, when the backend populated it.
    #[must_use]
    pub fn assignee_name(&self) -> Option<&str> {
        match self.assigned_to.as_ref()? {
            Assignee::User(user) => Some(user.name.as_str()),
            Assignee::Id(_) => None,
        }
    }
}

/// The `assignedTo` reference: either a populated user or a bare ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Assignee {
    User(AssignedUser),
    Id(UserId),
}

impl Assignee {
    #[must_use]
    pub const fn id(&self) -> &UserId {
        match self {
            Self::User(user) => &user.id,
            Self::Id(id) => id,
        }
    }
}

/// Populated assignee summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedUser {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Body for creating an enquiry, publicly or from the console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEnquiry {
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub priority: Priority,
}

/// Every editable enquiry field as entered in the edit form.
///
/// Which of these reach the backend depends on the actor's role; see
/// [`EnquiryUpdate::for_role`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnquiryDraft {
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub status: EnquiryStatus,
    pub priority: Priority,
    pub assigned_to: Option<UserId>,
}

/// Body for `PUT /api/enquiries/:id`.
///
/// Restricting non-admin actors to status and message is a UX convenience;
/// the backend remains the authority on what each role may change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EnquiryUpdate {
    Full(FullEnquiryUpdate),
    Limited(LimitedEnquiryUpdate),
}

/// Admin update: every field, `assignedTo: null` when unassigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullEnquiryUpdate {
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub status: EnquiryStatus,
    pub priority: Priority,
    pub assigned_to: Option<UserId>,
}

/// Staff update: status and message only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimitedEnquiryUpdate {
    pub status: EnquiryStatus,
    pub message: String,
}

impl EnquiryUpdate {
    /// Build the update payload an actor with `role` is allowed to send.
    #[must_use]
    pub fn for_role(role: Role, draft: EnquiryDraft) -> Self {
        if role.is_admin() {
            Self::Full(FullEnquiryUpdate {
                customer_name: draft.customer_name,
                email: draft.email,
                phone: draft.phone,
                message: draft.message,
                status: draft.status,
                priority: draft.priority,
                assigned_to: draft.assigned_to,
            })
        } else {
            Self::Limited(LimitedEnquiryUpdate {
                status: draft.status,
                message: draft.message,
            })
        }
    }
}

/// Dashboard statistics from `GET /api/enquiries/stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EnquiryStats {
    pub total: u64,
    #[serde(default)]
    pub by_status: Vec<StatusCount>,
}

/// One `byStatus` bucket. The key stays a string so unknown statuses from
/// the backend do not fail the whole response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    #[serde(rename = "_id")]
    pub status: String,
    pub count: u64,
}

impl EnquiryStats {
    /// Count for one status; missing buckets count as zero.
    #[must_use]
    pub fn count_for(&self, status: EnquiryStatus) -> u64 {
        self.by_status
            .iter()
            .find(|bucket| bucket.status == status.as_str())
            .map_or(0, |bucket| bucket.count)
    }
}
