use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::rfc3339;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Car,
    Van,
    Suv,
    Truck,
    Motorcycle,
    Bus,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Car => "car",
            Self::Van => "van",
            Self::Suv => "suv",
            Self::Truck => "truck",
            Self::Motorcycle => "motorcycle",
            Self::Bus => "bus",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Pending,
    Approved,
    Rejected,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleRegistration {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub owner_name: String,
    pub nic: String,
    pub vehicle_number: String,
    pub vehicle_type: VehicleType,
    pub vehicle_model: String,
    pub color: String,
    pub status: RegistrationStatus,
    pub submitted_by: ObjectId,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegistrationFields {
    #[validate(length(min = 1, max = 100, message = "must be 1 to 100 characters"))]
    pub owner_name: String,
    #[validate(length(min = 5, max = 20, message = "must be 5 to 20 characters"))]
    pub nic: String,
    #[validate(length(min = 2, max = 16, message = "must be 2 to 16 characters"))]
    pub vehicle_number: String,
    pub vehicle_type: VehicleType,
    #[validate(length(min = 1, max = 60, message = "must be 1 to 60 characters"))]
    pub vehicle_model: String,
    #[validate(length(min = 1, max = 30, message = "must be 1 to 30 characters"))]
    pub color: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRegistrationStatus {
    pub status: RegistrationStatus,
}

#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    pub id: String,
    pub owner_name: String,
    pub nic: String,
    pub vehicle_number: String,
    pub vehicle_type: VehicleType,
    pub vehicle_model: String,
    pub color: String,
    pub status: RegistrationStatus,
    pub submitted_by: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<VehicleRegistration> for RegistrationResponse {
    fn from(reg: VehicleRegistration) -> Self {
        Self {
            id: reg.id.map(|id| id.to_hex()).unwrap_or_default(),
            owner_name: reg.owner_name,
            nic: reg.nic,
            vehicle_number: reg.vehicle_number,
            vehicle_type: reg.vehicle_type,
            vehicle_model: reg.vehicle_model,
            color: reg.color,
            status: reg.status,
            submitted_by: reg.submitted_by.to_hex(),
            created_at: rfc3339(reg.created_at),
            updated_at: rfc3339(reg.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn fields() -> RegistrationFields {
        RegistrationFields {
            owner_name: "Sunil Fernando".into(),
            nic: "881234567V".into(),
            vehicle_number: "WP-CAB-1234".into(),
            vehicle_type: VehicleType::Van,
            vehicle_model: "Nissan Caravan".into(),
            color: "silver".into(),
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(fields().validate().is_ok());
    }

    #[test]
    fn short_nic_fails() {
        let mut payload = fields();
        payload.nic = "12".into();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("nic"));
    }

    #[test]
    fn vehicle_type_deserializes_snake_case() {
        let parsed: VehicleType = serde_json::from_str("\"motorcycle\"").unwrap();
        assert_eq!(parsed, VehicleType::Motorcycle);
        assert!(serde_json::from_str::<VehicleType>("\"boat\"").is_err());
    }

    #[test]
    fn status_payload_rejects_unknown_values() {
        assert!(serde_json::from_str::<UpdateRegistrationStatus>(
            "{\"status\":\"escalated\"}"
        )
        .is_err());
        let ok: UpdateRegistrationStatus =
            serde_json::from_str("{\"status\":\"approved\"}").unwrap();
        assert_eq!(ok.status, RegistrationStatus::Approved);
    }
}
