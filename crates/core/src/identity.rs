//! Participant identity fields and submission payloads.

use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

use crate::error::CoreError;
use crate::event::IdentityKey;
use crate::selection::PerDaySelection;
use crate::types::DbId;

/// Reject empty or whitespace-only text.
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Identity fields sent with a registration.
///
/// Missing fields deserialize as empty and are caught by [`Validate`], so a
/// payload without a mobile number reports a validation error rather than a
/// parse failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ParticipantIdentity {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub mobile_number: String,

    #[serde(default, alias = "name")]
    #[validate(custom(function = "not_blank"))]
    pub full_name: String,

    #[serde(
        default,
        alias = "kcdt_member_id",
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub member_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
}

impl ParticipantIdentity {
    /// Validate, then derive the lookup key used to find an existing
    /// registration for this participant.
    pub fn identity_key(
        &self,
        key: IdentityKey,
        source_reference: Option<DbId>,
    ) -> Result<String, CoreError> {
        self.validate()?;
        let mobile = self.mobile_number.trim();
        match key {
            IdentityKey::MobileNumber => Ok(format!("mobile:{mobile}")),
            IdentityKey::MemberAndMobile => {
                let member = self
                    .member_id
                    .as_deref()
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .ok_or_else(|| {
                        CoreError::Validation("member_id: must not be blank".into())
                    })?;
                Ok(format!("member:{member}|mobile:{mobile}"))
            }
            IdentityKey::SourceReference => source_reference
                .map(|r| format!("ref:{r}"))
                .ok_or_else(|| {
                    CoreError::Validation("source_reference: is required".into())
                }),
        }
    }
}

/// One participant's registration request: identity plus per-day slots.
///
/// Accepts identity fields either nested under `identity` or inline next to
/// the `dayN` arrays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSubmission")]
pub struct ParticipantSubmission {
    pub identity: ParticipantIdentity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_reference: Option<DbId>,
    #[serde(flatten)]
    pub selection: PerDaySelection,
}

#[derive(Deserialize)]
struct RawSubmission {
    #[serde(default)]
    identity: Option<ParticipantIdentity>,
    #[serde(default, deserialize_with = "lenient_id")]
    source_reference: Option<DbId>,
    #[serde(flatten)]
    inline: ParticipantIdentity,
    #[serde(flatten)]
    selection: PerDaySelection,
}

impl From<RawSubmission> for ParticipantSubmission {
    fn from(raw: RawSubmission) -> Self {
        Self {
            identity: raw.identity.unwrap_or(raw.inline),
            source_reference: raw.source_reference,
            selection: raw.selection,
        }
    }
}

/// Waitlist applicant. All four fields are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct WaitlistApplicant {
    #[serde(default, alias = "kcdt_member_id", deserialize_with = "lenient_text")]
    #[validate(required, custom(function = "not_blank"))]
    pub member_id: Option<String>,

    #[serde(default, alias = "name")]
    #[validate(custom(function = "not_blank"))]
    pub full_name: String,

    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub country_code: String,

    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub mobile_number: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Int(i64),
}

/// Member ids arrive as strings or bare numbers depending on the form.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(
        Option::<TextOrNumber>::deserialize(deserializer)?.map(|v| match v {
            TextOrNumber::Text(s) => s,
            TextOrNumber::Int(n) => n.to_string(),
        }),
    )
}

/// Source references are numeric ids, occasionally sent as strings.
pub fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DbId>, D::Error> {
    match Option::<TextOrNumber>::deserialize(deserializer)? {
        None => Ok(None),
        Some(TextOrNumber::Int(n)) => Ok(Some(n)),
        Some(TextOrNumber::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid source_reference '{s}'"))),
    }
}

/// A list of source references, each leniently parsed like [`lenient_id`].
pub fn lenient_id_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<DbId>>, D::Error> {
    #[derive(Deserialize)]
    struct Item(#[serde(deserialize_with = "lenient_id")] Option<DbId>);

    let Some(items) = Option::<Vec<Item>>::deserialize(deserializer)? else {
        return Ok(None);
    };
    items
        .into_iter()
        .map(|Item(id)| id.ok_or_else(|| serde::de::Error::custom("source_reference must not contain null")))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn identity(mobile: &str, name: &str) -> ParticipantIdentity {
        ParticipantIdentity {
            mobile_number: mobile.into(),
            full_name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn blank_fields_fail_validation() {
        let err = identity("  ", "Asha").identity_key(IdentityKey::MobileNumber, None);
        assert_matches!(err, Err(CoreError::Validation(msg)) if msg.contains("mobile_number"));

        let err = identity("9876543210", "").identity_key(IdentityKey::MobileNumber, None);
        assert_matches!(err, Err(CoreError::Validation(msg)) if msg.contains("full_name"));
    }

    #[test]
    fn identity_keys_per_event_kind() {
        let mut who = identity(" 9876543210 ", "Asha");
        assert_eq!(
            who.identity_key(IdentityKey::MobileNumber, None).unwrap(),
            "mobile:9876543210"
        );

        assert_matches!(
            who.identity_key(IdentityKey::MemberAndMobile, None),
            Err(CoreError::Validation(_))
        );
        who.member_id = Some("K-17".into());
        assert_eq!(
            who.identity_key(IdentityKey::MemberAndMobile, None).unwrap(),
            "member:K-17|mobile:9876543210"
        );

        assert_matches!(
            who.identity_key(IdentityKey::SourceReference, None),
            Err(CoreError::Validation(_))
        );
        assert_eq!(
            who.identity_key(IdentityKey::SourceReference, Some(42)).unwrap(),
            "ref:42"
        );
    }

    #[test]
    fn submission_accepts_nested_identity() {
        let sub: ParticipantSubmission = serde_json::from_value(json!({
            "identity": {"mobile_number": "98", "name": "Asha", "member_id": 7},
            "day1": [10, 12],
            "day2": []
        }))
        .unwrap();
        assert_eq!(sub.identity.full_name, "Asha");
        assert_eq!(sub.identity.member_id.as_deref(), Some("7"));
        assert_eq!(sub.selection.day(1), &[10, 12]);
        assert!(sub.selection.day(2).is_empty());
        assert_eq!(sub.source_reference, None);
    }

    #[test]
    fn submission_accepts_inline_identity() {
        let sub: ParticipantSubmission = serde_json::from_value(json!({
            "source_reference": "15",
            "mobile_number": "98",
            "full_name": "Ravi",
            "member_id": "M1",
            "day2": [20]
        }))
        .unwrap();
        assert_eq!(sub.identity.mobile_number, "98");
        assert_eq!(sub.identity.member_id.as_deref(), Some("M1"));
        assert_eq!(sub.source_reference, Some(15));
        assert_eq!(sub.selection.day(2), &[20]);
    }

    #[test]
    fn waitlist_requires_all_fields() {
        let applicant: WaitlistApplicant = serde_json::from_value(json!({
            "full_name": "Asha",
            "country_code": "+91",
            "mobile_number": "98"
        }))
        .unwrap();
        let err = CoreError::from(applicant.validate().unwrap_err());
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("member_id"));

        let applicant: WaitlistApplicant = serde_json::from_value(json!({
            "kcdt_member_id": 55,
            "full_name": "Asha",
            "country_code": "+91",
            "mobile_number": "98"
        }))
        .unwrap();
        assert!(applicant.validate().is_ok());
        assert_eq!(applicant.member_id.as_deref(), Some("55"));
    }

    #[test]
    fn source_reference_lists_accept_strings_and_numbers() {
        #[derive(Deserialize)]
        struct Body {
            #[serde(default, deserialize_with = "lenient_id_list")]
            source_reference: Option<Vec<DbId>>,
        }

        let body: Body = serde_json::from_value(json!({"source_reference": [3, "4"]})).unwrap();
        assert_eq!(body.source_reference, Some(vec![3, 4]));

        let body: Body = serde_json::from_value(json!({})).unwrap();
        assert_eq!(body.source_reference, None);

        assert!(serde_json::from_value::<Body>(json!({"source_reference": ["x"]})).is_err());
    }
}
