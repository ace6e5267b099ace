use std::str::FromStr;

use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::rfc3339;
use crate::uploads::public_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Engine,
    Brakes,
    Electrical,
    Body,
    Tires,
    Accessories,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Engine => "engine",
            Self::Brakes => "brakes",
            Self::Electrical => "electrical",
            Self::Body => "body",
            Self::Tires => "tires",
            Self::Accessories => "accessories",
        }
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "engine" => Ok(Self::Engine),
            "brakes" => Ok(Self::Brakes),
            "electrical" => Ok(Self::Electrical),
            "body" => Ok(Self::Body),
            "tires" => Ok(Self::Tires),
            "accessories" => Ok(Self::Accessories),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub product_id: String,
    pub name: String,
    pub price: f64,
    pub quantity: i64,
    pub description: String,
    pub category: Category,
    /// Stored path relative to the uploads tree, if an image was attached.
    pub image: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Text fields of the multipart create/update submission. The same shape is
/// used for both since PUT replaces every field.
#[derive(Debug, Validate)]
pub struct InventoryFields {
    #[validate(length(min = 1, max = 64, message = "must be 1 to 64 characters"))]
    pub product_id: String,
    #[validate(length(min = 1, max = 120, message = "must be 1 to 120 characters"))]
    pub name: String,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub price: f64,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub quantity: i64,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub description: String,
    pub category: Category,
}

#[derive(Debug, Deserialize)]
pub struct InventoryFilter {
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InventoryResponse {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub price: f64,
    pub quantity: i64,
    pub description: String,
    pub category: Category,
    pub image: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl InventoryItem {
    pub fn into_response(self, base: &str) -> InventoryResponse {
        InventoryResponse {
            id: self.id.map(|id| id.to_hex()).unwrap_or_default(),
            product_id: self.product_id,
            name: self.name,
            price: self.price,
            quantity: self.quantity,
            description: self.description,
            category: self.category,
            image: self.image.as_deref().map(|path| public_url(base, path)),
            created_at: rfc3339(self.created_at),
            updated_at: rfc3339(self.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn fields() -> InventoryFields {
        InventoryFields {
            product_id: "BRK-PAD-022".into(),
            name: "Front brake pad set".into(),
            price: 5400.0,
            quantity: 12,
            description: "Ceramic pads for compact sedans".into(),
            category: Category::Brakes,
        }
    }

    #[test]
    fn valid_fields_pass() {
        assert!(fields().validate().is_ok());
    }

    #[test]
    fn negative_price_and_quantity_fail() {
        let mut payload = fields();
        payload.price = -1.0;
        payload.quantity = -3;

        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("price"));
        assert!(errors.field_errors().contains_key("quantity"));
    }

    #[test]
    fn category_parses_known_values_only() {
        assert_eq!("tires".parse::<Category>(), Ok(Category::Tires));
        assert!("exhaust".parse::<Category>().is_err());
    }

    #[test]
    fn response_rewrites_image_url() {
        let item = InventoryItem {
            id: Some(ObjectId::new()),
            product_id: "BRK-PAD-022".into(),
            name: "Front brake pad set".into(),
            price: 5400.0,
            quantity: 12,
            description: "Ceramic pads".into(),
            category: Category::Brakes,
            image: Some("inventory/pad.png".into()),
            created_at: DateTime::now(),
            updated_at: DateTime::now(),
        };

        let response = item.into_response("http://localhost:4000/");
        assert_eq!(
            response.image.as_deref(),
            Some("http://localhost:4000/uploads/inventory/pad.png")
        );
    }
}
