//! Select options and badges shared by filter bars, forms and tables.

use enquiry_desk_core::{EnquiryStatus, PAGE_SIZES, Priority, Role, User};

/// One `<option>` of a `<select>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    #[must_use]
    pub fn new(value: &str, label: &str, selected: bool) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
            selected,
        }
    }
}

/// Status options; `all_label` prepends an empty "all" option for filters.
#[must_use]
pub fn status_options(selected: Option<EnquiryStatus>, all_label: Option<&str>) -> Vec<SelectOption> {
    all_label
        .map(|label| SelectOption::new("", label, selected.is_none()))
        .into_iter()
        .chain(
            EnquiryStatus::ALL
                .iter()
                .map(|s| SelectOption::new(s.as_str(), s.label(), Some(*s) == selected)),
        )
        .collect()
}

#[must_use]
pub fn priority_options(selected: Priority) -> Vec<SelectOption> {
    Priority::ALL
        .iter()
        .map(|p| SelectOption::new(p.as_str(), p.label(), *p == selected))
        .collect()
}

/// Role options; `all_label` prepends an empty "all" option for filters.
#[must_use]
pub fn role_options(selected: Option<Role>, all_label: Option<&str>) -> Vec<SelectOption> {
    all_label
        .map(|label| SelectOption::new("", label, selected.is_none()))
        .into_iter()
        .chain(
            Role::ALL
                .iter()
                .map(|r| SelectOption::new(r.as_str(), r.label(), Some(*r) == selected)),
        )
        .collect()
}

#[must_use]
pub fn page_size_options(selected: u32) -> Vec<SelectOption> {
    PAGE_SIZES
        .iter()
        .map(|size| {
            let value = size.to_string();
            SelectOption::new(&value, &value, *size == selected)
        })
        .collect()
}

/// Assignee options: "Unassigned" followed by each staff member.
#[must_use]
pub fn assignee_options(staff: &[User], selected: Option<&str>) -> Vec<SelectOption> {
    std::iter::once(SelectOption::new("", "Unassigned", selected.is_none()))
        .chain(staff.iter().map(|user| {
            SelectOption::new(
                user.id.as_str(),
                &user.name,
                selected == Some(user.id.as_str()),
            )
        }))
        .collect()
}

/// A coloured label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub label: &'static str,
    pub class: &'static str,
}

impl From<EnquiryStatus> for Badge {
    fn from(status: EnquiryStatus) -> Self {
        Self {
            label: status.label(),
            class: status.badge_class(),
        }
    }
}

impl From<Priority> for Badge {
    fn from(priority: Priority) -> Self {
        Self {
            label: priority.label(),
            class: priority.badge_class(),
        }
    }
}

impl From<Role> for Badge {
    fn from(role: Role) -> Self {
        Self {
            label: role.label(),
            class: match role {
                Role::Admin => "bg-purple-100 text-purple-800",
                Role::Staff => "bg-blue-100 text-blue-800",
                Role::User => "bg-gray-100 text-gray-800",
            },
        }
    }
}
