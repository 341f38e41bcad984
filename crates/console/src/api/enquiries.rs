//! Enquiry endpoints.

use reqwest::Method;
use secrecy::SecretString;
use serde::Deserialize;
use tracing::instrument;

use enquiry_desk_core::{
    Enquiry, EnquiryFilter, EnquiryId, EnquiryListing, EnquiryStats, EnquiryUpdate, NewEnquiry,
};

use super::{ApiError, BackendClient, segment};

/// Single-record responses may come bare or wrapped as `{ "enquiry": ... }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum EnquiryBody {
    Wrapped { enquiry: Enquiry },
    Bare(Enquiry),
}

impl From<EnquiryBody> for Enquiry {
    fn from(body: EnquiryBody) -> Self {
        match body {
            EnquiryBody::Wrapped { enquiry } | EnquiryBody::Bare(enquiry) => enquiry,
        }
    }
}

impl BackendClient {
    /// Fetch one page of enquiries matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns a normalized backend failure.
    #[instrument(skip(self, token))]
    pub async fn list_enquiries(
        &self,
        token: &SecretString,
        filter: &EnquiryFilter,
    ) -> Result<EnquiryListing, ApiError> {
        let builder = self
            .request(Method::GET, "/api/enquiries", Some(token))
            .query(&filter.to_api_params());
        Self::send_json(builder).await
    }

    /// Fetch a single enquiry.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the enquiry does not exist.
    #[instrument(skip(self, token), fields(enquiry_id = %id))]
    pub async fn get_enquiry(&self, token: &SecretString, id: &EnquiryId) -> Result<Enquiry, ApiError> {
        let path = format!("/api/enquiries/{}", segment(id.as_str()));
        let body: EnquiryBody = Self::send_json(self.request(Method::GET, &path, Some(token))).await?;
        Ok(body.into())
    }

    /// Create an enquiry as an authenticated user.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when the backend rejects the fields.
    #[instrument(skip(self, token, enquiry))]
    pub async fn create_enquiry(
        &self,
        token: &SecretString,
        enquiry: &NewEnquiry,
    ) -> Result<(), ApiError> {
        Self::send_empty(
            self.request(Method::POST, "/api/enquiries", Some(token))
                .json(enquiry),
        )
        .await
    }

    /// Submit an enquiry from the public contact form (no credential).
    ///
    /// # Errors
    ///
    /// Returns `Validation` when the backend rejects the fields.
    #[instrument(skip(self, enquiry))]
    pub async fn create_public_enquiry(&self, enquiry: &NewEnquiry) -> Result<(), ApiError> {
        Self::send_empty(
            self.request(Method::POST, "/api/enquiries/public", None)
                .json(enquiry),
        )
        .await
    }

    /// Update an enquiry with a role-shaped payload.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` or `NotFound` as reported by the backend.
    #[instrument(skip(self, token, update), fields(enquiry_id = %id))]
    pub async fn update_enquiry(
        &self,
        token: &SecretString,
        id: &EnquiryId,
        update: &EnquiryUpdate,
    ) -> Result<(), ApiError> {
        let path = format!("/api/enquiries/{}", segment(id.as_str()));
        Self::send_empty(self.request(Method::PUT, &path, Some(token)).json(update)).await
    }

    /// Delete an enquiry (admin only on the backend).
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` or `NotFound` as reported by the backend.
    #[instrument(skip(self, token), fields(enquiry_id = %id))]
    pub async fn delete_enquiry(&self, token: &SecretString, id: &EnquiryId) -> Result<(), ApiError> {
        let path = format!("/api/enquiries/{}", segment(id.as_str()));
        Self::send_empty(self.request(Method::DELETE, &path, Some(token))).await
    }

    /// Dashboard counts by status.
    ///
    /// # Errors
    ///
    /// Returns a normalized backend failure.
    #[instrument(skip(self, token))]
    pub async fn enquiry_stats(&self, token: &SecretString) -> Result<EnquiryStats, ApiError> {
        Self::send_json(self.request(Method::GET, "/api/enquiries/stats", Some(token))).await
    }
}
