use std::str::FromStr;

use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::rfc3339;
use crate::uploads::public_url;

/// Workflow state of a roadside request. Any status may follow any other;
/// there are no enforced transition rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl EmergencyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for EmergencyStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyRequest {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub phone: String,
    pub latitude: f64,
    pub longitude: f64,
    pub vehicle_type: String,
    pub vehicle_model: String,
    pub vehicle_color: String,
    pub vehicle_number: String,
    pub description: String,
    /// Stored paths relative to the uploads tree, e.g. `emergency/<uuid>.jpg`.
    pub photos: Vec<String>,
    pub status: EmergencyStatus,
    pub requested_by: ObjectId,
    pub assigned_to: Option<ObjectId>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Text fields of the multipart submission, validated before the record is
/// written. Photos arrive alongside and are handled by the route.
#[derive(Debug, Validate)]
pub struct CreateEmergency {
    #[validate(length(min = 1, max = 100, message = "must be 1 to 100 characters"))]
    pub name: String,
    #[validate(length(min = 7, max = 20, message = "must be 7 to 20 characters"))]
    pub phone: String,
    #[validate(range(min = -90.0, max = 90.0, message = "must be between -90 and 90"))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "must be between -180 and 180"))]
    pub longitude: f64,
    #[validate(length(min = 1, max = 40, message = "must be 1 to 40 characters"))]
    pub vehicle_type: String,
    #[validate(length(min = 1, max = 60, message = "must be 1 to 60 characters"))]
    pub vehicle_model: String,
    #[validate(length(min = 1, max = 30, message = "must be 1 to 30 characters"))]
    pub vehicle_color: String,
    #[validate(length(min = 2, max = 16, message = "must be 2 to 16 characters"))]
    pub vehicle_number: String,
    #[validate(length(min = 1, max = 2000, message = "must be 1 to 2000 characters"))]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEmergencyStatus {
    pub status: EmergencyStatus,
    pub assigned_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmergencyFilter {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EmergencyResponse {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub latitude: f64,
    pub longitude: f64,
    pub vehicle_type: String,
    pub vehicle_model: String,
    pub vehicle_color: String,
    pub vehicle_number: String,
    pub description: String,
    pub photos: Vec<String>,
    pub status: EmergencyStatus,
    pub requested_by: String,
    pub assigned_to: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl EmergencyRequest {
    /// Converts for the wire, rewriting stored photo paths into public URLs.
    pub fn into_response(self, base: &str) -> EmergencyResponse {
        EmergencyResponse {
            id: self.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: self.name,
            phone: self.phone,
            latitude: self.latitude,
            longitude: self.longitude,
            vehicle_type: self.vehicle_type,
            vehicle_model: self.vehicle_model,
            vehicle_color: self.vehicle_color,
            vehicle_number: self.vehicle_number,
            description: self.description,
            photos: self
                .photos
                .iter()
                .map(|path| public_url(base, path))
                .collect(),
            status: self.status,
            requested_by: self.requested_by.to_hex(),
            assigned_to: self.assigned_to.map(|id| id.to_hex()),
            created_at: rfc3339(self.created_at),
            updated_at: rfc3339(self.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn create() -> CreateEmergency {
        CreateEmergency {
            name: "Kamal Silva".into(),
            phone: "0712345678".into(),
            latitude: 6.9271,
            longitude: 79.8612,
            vehicle_type: "car".into(),
            vehicle_model: "Toyota Axio".into(),
            vehicle_color: "white".into(),
            vehicle_number: "CAB-1234".into(),
            description: "Flat tire on the highway shoulder".into(),
        }
    }

    #[test]
    fn valid_submission_passes() {
        assert!(create().validate().is_ok());
    }

    #[test]
    fn out_of_range_coordinates_fail() {
        let mut payload = create();
        payload.latitude = 91.0;
        payload.longitude = -200.0;

        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("latitude"));
        assert!(errors.field_errors().contains_key("longitude"));
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            EmergencyStatus::Pending,
            EmergencyStatus::Accepted,
            EmergencyStatus::InProgress,
            EmergencyStatus::Completed,
            EmergencyStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<EmergencyStatus>(), Ok(status));
        }
        assert!("towed".parse::<EmergencyStatus>().is_err());
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&EmergencyStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
    }

    #[test]
    fn response_rewrites_photo_urls() {
        let doc = EmergencyRequest {
            id: Some(ObjectId::new()),
            name: "Kamal Silva".into(),
            phone: "0712345678".into(),
            latitude: 6.9271,
            longitude: 79.8612,
            vehicle_type: "car".into(),
            vehicle_model: "Toyota Axio".into(),
            vehicle_color: "white".into(),
            vehicle_number: "CAB-1234".into(),
            description: "Flat tire".into(),
            photos: vec!["emergency/abc.jpg".into()],
            status: EmergencyStatus::Pending,
            requested_by: ObjectId::new(),
            assigned_to: None,
            created_at: DateTime::now(),
            updated_at: DateTime::now(),
        };

        let response = doc.into_response("http://localhost:4000");
        assert_eq!(
            response.photos,
            vec!["http://localhost:4000/uploads/emergency/abc.jpg"]
        );
    }
}
