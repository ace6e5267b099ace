use mongodb::bson::{oid::ObjectId, DateTime};

use crate::error::AppError;

pub mod emergency;
pub mod inventory;
pub mod user;
pub mod vehicle;

/// Parses a path-segment id, rejecting anything that is not a valid ObjectId
/// before it reaches the database.
pub fn parse_id(id: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(id).map_err(|_| AppError::BadRequest(format!("invalid id: {id}")))
}

pub fn rfc3339(ts: DateTime) -> String {
    ts.try_to_rfc3339_string().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_hex_object_ids() {
        let id = ObjectId::new();
        assert_eq!(parse_id(&id.to_hex()).unwrap(), id);
    }

    #[test]
    fn parse_id_rejects_garbage() {
        assert!(matches!(
            parse_id("not-an-id"),
            Err(AppError::BadRequest(_))
        ));
    }
}
