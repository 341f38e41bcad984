//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use enquiry_desk_core::{EnquiryListing, User};

use crate::api::BackendClient;
use crate::config::ConsoleConfig;
use crate::models::ChannelId;
use crate::notifications::Notifier;
use crate::services::ListViews;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// backend client and the per-session services.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ConsoleConfig,
    api: BackendClient,
    notifier: Notifier,
    enquiry_views: ListViews<EnquiryListing>,
    user_views: ListViews<Vec<User>>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend HTTP client cannot be built.
    pub fn new(config: ConsoleConfig) -> Result<Self, reqwest::Error> {
        let api = BackendClient::new(&config.api)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                notifier: Notifier::new(),
                enquiry_views: ListViews::new(),
                user_views: ListViews::new(),
            }),
        })
    }

    /// Get a reference to the console configuration.
    #[must_use]
    pub fn config(&self) -> &ConsoleConfig {
        &self.inner.config
    }

    /// Get a reference to the backend API client.
    #[must_use]
    pub fn api(&self) -> &BackendClient {
        &self.inner.api
    }

    /// Get a reference to the notification broadcaster.
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    #[must_use]
    pub fn enquiry_views(&self) -> &ListViews<EnquiryListing> {
        &self.inner.enquiry_views
    }

    #[must_use]
    pub fn user_views(&self) -> &ListViews<Vec<User>> {
        &self.inner.user_views
    }

    /// Drop every per-session artefact for `channel` (logout, expiry).
    pub fn forget_channel(&self, channel: ChannelId) {
        self.inner.enquiry_views.forget(channel);
        self.inner.user_views.forget(channel);
    }

    /// Drop retained list views untouched for `idle`. Returns slots removed.
    pub fn prune_list_views(&self, idle: Duration) -> usize {
        self.inner.enquiry_views.prune(idle) + self.inner.user_views.prune(idle)
    }
}
