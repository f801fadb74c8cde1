//! HTTP client for the registration API.
//!
//! Wraps the `/api/v1/events` endpoints using [`reqwest`] and decodes the
//! `{ "success", ... }` envelope into typed responses or a [`ClientError`].

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use slotbook_core::constraints::SlotState;
use slotbook_core::event::EventConfig;
use slotbook_core::identity::{ParticipantSubmission, WaitlistApplicant};
use slotbook_core::selection::PerDaySelection;
use slotbook_core::types::{DbId, SlotId};

use crate::error::{decode_error, ClientError};

/// HTTP client for one registration server.
pub struct RegistrationClient {
    client: reqwest::Client,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct EventList {
    events: Vec<EventConfig>,
}

/// Current availability of one event.
#[derive(Debug, Clone, Deserialize)]
pub struct Availability {
    pub event: EventConfig,
    pub slots: Vec<SlotState>,
    pub no_slots_available: bool,
}

/// Result of running the constraint engine on the server.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectionEvaluation {
    pub slots: Vec<SlotState>,
    pub selection: PerDaySelection,
    pub pruned: Vec<SlotId>,
    pub consecutive_or_disabled_between: BTreeMap<String, bool>,
    pub no_slots_available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegistrationReceipt {
    pub id: DbId,
    pub created: bool,
    pub added: Vec<SlotId>,
    pub removed: Vec<SlotId>,
}

#[derive(Debug, Deserialize)]
struct BulkReceipt {
    ids: Vec<DbId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Withdrawal {
    pub withdrawn: usize,
    pub released: usize,
}

/// A registration found by mobile number.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationRecord {
    pub id: DbId,
    pub full_name: String,
    pub mobile_number: String,
    #[serde(default)]
    pub source_reference: Option<DbId>,
    #[serde(default)]
    pub member_id: Option<String>,
    #[serde(flatten)]
    pub selection: PerDaySelection,
    /// `dayN` -> comma-joined slot labels, `-` for an empty day.
    pub slot_times: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    registrations: Vec<RegistrationRecord>,
}

#[derive(Debug, Deserialize)]
struct WaitlistJoined {
    id: DbId,
}

#[derive(Serialize)]
struct MainData<T: Serialize> {
    #[serde(rename = "mainData")]
    main_data: T,
}

impl RegistrationClient {
    /// Create a client for a server.
    ///
    /// * `api_url` - Base URL including the version prefix, e.g.
    ///   `http://host:3000/api/v1`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    /// `GET /events`
    pub async fn events(&self) -> Result<Vec<EventConfig>, ClientError> {
        let list: EventList = self.get("/events").await?;
        Ok(list.events)
    }

    /// `GET /events/{slug}/slots`
    pub async fn slots(&self, slug: &str) -> Result<Availability, ClientError> {
        self.get(&format!("/events/{slug}/slots")).await
    }

    /// `POST /events/{slug}/selection/evaluate`
    pub async fn evaluate(
        &self,
        slug: &str,
        selection: &PerDaySelection,
    ) -> Result<SelectionEvaluation, ClientError> {
        self.post(&format!("/events/{slug}/selection/evaluate"), selection)
            .await
    }

    /// Register one participant, or replace the slots of an existing
    /// registration with the same identity.
    pub async fn register(
        &self,
        slug: &str,
        submission: &ParticipantSubmission,
    ) -> Result<RegistrationReceipt, ClientError> {
        let body = MainData {
            main_data: submission,
        };
        self.post(&format!("/events/{slug}/registrations"), &body)
            .await
    }

    /// Register a group in one all-or-nothing request. Returns the ids in
    /// input order.
    pub async fn register_bulk(
        &self,
        event: &EventConfig,
        submissions: &[ParticipantSubmission],
    ) -> Result<Vec<DbId>, ClientError> {
        let body = json!({
            "action": event.register_action(),
            "mainData": submissions,
        });
        let receipt: BulkReceipt = self
            .post(&format!("/events/{}/registrations", event.slug), &body)
            .await?;
        Ok(receipt.ids)
    }

    /// Withdraw the registrations with the given source references and
    /// release their seats.
    pub async fn withdraw(
        &self,
        event: &EventConfig,
        source_references: &[DbId],
    ) -> Result<Withdrawal, ClientError> {
        let body = json!({
            "action": event.delete_action(),
            "source_reference": source_references,
        });
        self.post(&format!("/events/{}/registrations", event.slug), &body)
            .await
    }

    /// `POST /events/{slug}/registrations/search`
    pub async fn search(
        &self,
        slug: &str,
        mobile_number: &str,
    ) -> Result<Vec<RegistrationRecord>, ClientError> {
        let body = json!({ "mobile_number": mobile_number });
        let results: SearchResults = self
            .post(&format!("/events/{slug}/registrations/search"), &body)
            .await?;
        Ok(results.registrations)
    }

    /// `POST /events/{slug}/waitlist`. Returns the waitlist entry id.
    pub async fn join_waitlist(
        &self,
        slug: &str,
        applicant: &WaitlistApplicant,
    ) -> Result<DbId, ClientError> {
        let body = MainData {
            main_data: applicant,
        };
        let joined: WaitlistJoined = self
            .post(&format!("/events/{slug}/waitlist"), &body)
            .await?;
        Ok(joined.id)
    }

    // ---- private helpers ----

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self
            .client
            .get(format!("{}{path}", self.api_url))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}{path}", self.api_url))
            .json(body)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// Decode a success body into `T`, or the error envelope into a
    /// [`ClientError`].
    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = decode_error(status.as_u16(), &body);
            tracing::debug!(status = status.as_u16(), error = %err, "Request rejected");
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = RegistrationClient::new("http://localhost:3000/api/v1/");
        assert_eq!(client.api_url, "http://localhost:3000/api/v1");
    }

    #[test]
    fn availability_decodes_server_body() {
        let body = r#"{
            "success": true,
            "event": {"id": 1, "slug": "gayathri-havanam", "label": "Gayathri Havanam",
                      "action_code": "GH", "day_count": 3, "max_per_day": 4,
                      "identity": "mobile_number"},
            "slots": [
                {"id": 10, "day": 1, "slot_time": "5:00 AM", "max_capacity": 2,
                 "registration_count": 2, "remaining": 0, "disabled": true}
            ],
            "no_slots_available": true
        }"#;
        let availability: Availability = serde_json::from_str(body).unwrap();
        assert_eq!(availability.event.day_count, 3);
        assert_eq!(availability.slots[0].slot.id, 10);
        assert!(availability.slots[0].disabled);
        assert!(availability.no_slots_available);
    }

    #[test]
    fn search_record_keeps_day_arrays() {
        let body = r#"{
            "id": 4, "full_name": "Gopal", "mobile_number": "9700000000",
            "day1": [10, 12], "slot_times": {"day1": "5:00 AM, 7:00 AM", "day2": "-"}
        }"#;
        let record: RegistrationRecord = serde_json::from_str(body).unwrap();
        assert_eq!(record.selection.day(1), &[10, 12]);
        assert!(record.selection.day(2).is_empty());
        assert_eq!(record.slot_times["day2"], "-");
        assert_eq!(record.source_reference, None);
    }
}
