//! Submitted HTML forms and their validation.
//!
//! Forms are checked before any backend call; a failure becomes a single
//! error toast and the form is shown again with the non-secret values the
//! user entered.

use serde::Deserialize;
use thiserror::Error;

use enquiry_desk_core::{
    Email, EnquiryDraft, EnquiryStatus, EnquiryUpdate, NewEnquiry, NewUser, Priority, Role,
    UserId, UserUpdate,
};

/// Bad form input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Please choose a valid {0}")]
    InvalidChoice(&'static str),
}

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(value)
}

fn email(value: &str) -> Result<Email, ValidationError> {
    required(value, "Email")?;
    Email::parse(value).map_err(|_| ValidationError::InvalidEmail)
}

/// An enquiry's contact email: checked like an account email but sent as
/// entered (trimmed), since it belongs to the customer.
fn contact_email(value: &str) -> Result<String, ValidationError> {
    email(value)?;
    Ok(value.trim().to_string())
}

fn choice<T: std::str::FromStr>(value: &str, field: &'static str) -> Result<T, ValidationError> {
    value
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidChoice(field))
}

// =============================================================================
// Authentication
// =============================================================================

/// `POST /login`.
#[derive(Deserialize, Default)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    /// # Errors
    ///
    /// Returns `ValidationError` for a malformed email or empty password.
    pub fn validate(&self) -> Result<(Email, &str), ValidationError> {
        let email = email(&self.email)?;
        if self.password.is_empty() {
            return Err(ValidationError::Required("Password"));
        }
        Ok((email, &self.password))
    }
}

/// `POST /register`.
#[derive(Deserialize, Default)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl RegisterForm {
    /// # Errors
    ///
    /// Returns `ValidationError` for a missing name, malformed email or empty
    /// password.
    pub fn validate(&self) -> Result<(&str, Email, &str), ValidationError> {
        let name = required(&self.name, "Name")?;
        let email = email(&self.email)?;
        if self.password.is_empty() {
            return Err(ValidationError::Required("Password"));
        }
        Ok((name, email, &self.password))
    }
}

// =============================================================================
// Enquiries
// =============================================================================

/// New enquiry, from the public contact form or the console create modal.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct EnquiryForm {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub priority: String,
}

impl EnquiryForm {
    /// Blank form with the default priority preselected.
    #[must_use]
    pub fn blank() -> Self {
        Self {
            priority: Priority::default().as_str().to_string(),
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// Returns `ValidationError` when a required field is empty, the email is
    /// malformed or the priority is unknown.
    pub fn validate(&self) -> Result<NewEnquiry, ValidationError> {
        let customer_name = required(&self.customer_name, "Name")?.to_string();
        let email = contact_email(&self.email)?;
        let phone = required(&self.phone, "Phone")?.to_string();
        let message = required(&self.message, "Message")?.to_string();
        let priority = if self.priority.trim().is_empty() {
            Priority::default()
        } else {
            choice(&self.priority, "priority")?
        };
        Ok(NewEnquiry {
            customer_name,
            email,
            phone,
            message,
            priority,
        })
    }

    /// Selected priority for re-rendering, defaulting when unknown.
    #[must_use]
    pub fn priority_or_default(&self) -> Priority {
        self.priority.parse().unwrap_or_default()
    }
}

/// Edit modal submission. Non-admin forms only carry status and message.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct EnquiryEditForm {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub assigned_to: String,
}

impl EnquiryEditForm {
    /// Build the update payload `role` is allowed to send.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for an unknown status, or, for admins, a
    /// missing name, malformed email or unknown priority.
    pub fn to_update(&self, role: Role) -> Result<EnquiryUpdate, ValidationError> {
        let status: EnquiryStatus = choice(&self.status, "status")?;
        let message = self.message.trim().to_string();

        let draft = if role.is_admin() {
            EnquiryDraft {
                customer_name: required(&self.customer_name, "Customer name")?.to_string(),
                email: contact_email(&self.email)?,
                phone: self.phone.trim().to_string(),
                message,
                status,
                priority: choice(&self.priority, "priority")?,
                assigned_to: Some(self.assigned_to.trim())
                    .filter(|id| !id.is_empty())
                    .map(UserId::from),
            }
        } else {
            EnquiryDraft {
                message,
                status,
                ..EnquiryDraft::default()
            }
        };
        Ok(EnquiryUpdate::for_role(role, draft))
    }
}

// =============================================================================
// Users
// =============================================================================

/// Create/edit user modal submission.
#[derive(Deserialize, Default)]
pub struct UserForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
}

impl UserForm {
    fn common(&self) -> Result<(String, Email, Role), ValidationError> {
        let name = required(&self.name, "Name")?.to_string();
        let email = email(&self.email)?;
        let role = choice(&self.role, "role")?;
        Ok((name, email, role))
    }

    /// # Errors
    ///
    /// Returns `ValidationError` for a missing field, malformed email or
    /// unknown role.
    pub fn to_new_user(&self) -> Result<NewUser, ValidationError> {
        let (name, email, role) = self.common()?;
        if self.password.is_empty() {
            return Err(ValidationError::Required("Password"));
        }
        Ok(NewUser {
            name,
            email,
            password: self.password.clone(),
            role,
        })
    }

    /// A blank password leaves the stored password unchanged.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a missing name, malformed email or
    /// unknown role.
    pub fn to_update(&self) -> Result<UserUpdate, ValidationError> {
        let (name, email, role) = self.common()?;
        Ok(UserUpdate {
            name,
            email,
            role,
            password: Some(self.password.clone()).filter(|p| !p.is_empty()),
        })
    }
}

impl std::fmt::Debug for UserForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserForm")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("role", &self.role)
            .finish()
    }
}

// =============================================================================
// Misc
// =============================================================================

/// Delete confirmation. Only `confirm=yes` counts as confirmed.
#[derive(Debug, Deserialize, Default)]
pub struct ConfirmForm {
    #[serde(default)]
    pub confirm: Option<String>,
}

impl ConfirmForm {
    #[must_use]
    pub fn confirmed(&self) -> bool {
        self.confirm.as_deref() == Some("yes")
    }
}

/// Toast dismissal, with the page to return to.
#[derive(Debug, Deserialize, Default)]
pub struct DismissForm {
    #[serde(default)]
    pub back: Option<String>,
}

impl DismissForm {
    /// Local path to return to; anything else falls back to the dashboard.
    #[must_use]
    pub fn back_path(&self) -> &str {
        match self.back.as_deref() {
            Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
            _ => "/dashboard",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn edit_form() -> EnquiryEditForm {
        EnquiryEditForm {
            customer_name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone: "1234567890".to_string(),
            message: "Called back".to_string(),
            status: "closed".to_string(),
            priority: "high".to_string(),
            assigned_to: "staff-1".to_string(),
        }
    }

    #[test]
    fn test_login_requires_email_and_password() {
        let form = LoginForm {
            email: "not-an-email".to_string(),
            password: "secret".to_string(),
        };
        assert_eq!(form.validate().unwrap_err(), ValidationError::InvalidEmail);

        let form = LoginForm {
            email: "sam@example.com".to_string(),
            password: String::new(),
        };
        assert_eq!(
            form.validate().unwrap_err(),
            ValidationError::Required("Password")
        );
    }

    #[test]
    fn test_register_requires_name() {
        let form = RegisterForm {
            name: "   ".to_string(),
            email: "sam@example.com".to_string(),
            password: "pw".to_string(),
        };
        assert_eq!(form.validate().unwrap_err().to_string(), "Name is required");
    }

    #[test]
    fn test_enquiry_form_defaults_priority() {
        let form = EnquiryForm {
            customer_name: "Jane".to_string(),
            email: "Jane@Example.com".to_string(),
            phone: "555".to_string(),
            message: "Hello".to_string(),
            priority: String::new(),
        };
        let enquiry = form.validate().unwrap();
        assert_eq!(enquiry.priority, Priority::Medium);
        assert_eq!(enquiry.email, "Jane@Example.com");
        assert_eq!(EnquiryForm::blank().priority, "medium");
    }

    #[test]
    fn test_admin_edit_sends_submitted_values() {
        let update = edit_form().to_update(Role::Admin).unwrap();
        assert_eq!(
            serde_json::to_value(update).unwrap(),
            json!({
                "customerName": "Jane Doe",
                "email": "jane@example.com",
                "phone": "1234567890",
                "message": "Called back",
                "status": "closed",
                "priority": "high",
                "assignedTo": "staff-1",
            })
        );
    }

    #[test]
    fn test_admin_edit_keeps_email_case() {
        let mut form = edit_form();
        form.email = " Jane.Doe@Example.com ".to_string();
        let body = serde_json::to_value(form.to_update(Role::Admin).unwrap()).unwrap();
        assert_eq!(body["email"], "Jane.Doe@Example.com");

        form.email = "Jane.Doe@".to_string();
        assert_eq!(
            form.to_update(Role::Admin).unwrap_err(),
            ValidationError::InvalidEmail
        );
    }

    #[test]
    fn test_staff_edit_ignores_restricted_fields() {
        let mut form = edit_form();
        form.customer_name = String::new();
        form.priority = "bogus".to_string();
        let update = form.to_update(Role::Staff).unwrap();
        assert_eq!(
            serde_json::to_value(update).unwrap(),
            json!({"status": "closed", "message": "Called back"})
        );
    }

    #[test]
    fn test_edit_rejects_unknown_status() {
        let mut form = edit_form();
        form.status = "pending".to_string();
        assert_eq!(
            form.to_update(Role::Staff).unwrap_err(),
            ValidationError::InvalidChoice("status")
        );
    }

    #[test]
    fn test_user_update_blank_password_omitted() {
        let form = UserForm {
            name: "Sam".to_string(),
            email: "sam@example.com".to_string(),
            password: String::new(),
            role: "staff".to_string(),
        };
        assert!(form.to_update().unwrap().password.is_none());
        assert_eq!(
            form.to_new_user().unwrap_err(),
            ValidationError::Required("Password")
        );
    }

    #[test]
    fn test_confirm_and_back_path() {
        assert!(!ConfirmForm::default().confirmed());
        assert!(ConfirmForm {
            confirm: Some("yes".to_string())
        }
        .confirmed());

        let back = |b: &str| DismissForm {
            back: Some(b.to_string()),
        };
        assert_eq!(back("/enquiries?page=2").back_path(), "/enquiries?page=2");
        assert_eq!(back("//evil.example").back_path(), "/dashboard");
        assert_eq!(back("https://evil.example").back_path(), "/dashboard");
        assert_eq!(DismissForm::default().back_path(), "/dashboard");
    }
}
