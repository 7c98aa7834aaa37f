use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;

/// A persisted pairing of two users connected by the matching flow. At most
/// one contact exists per unordered pair; `pair_key` is the canonical form
/// of the pair and carries a unique index.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Contact {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub pair_key: String,
    pub requester_id: ObjectId,
    pub counterpart_id: ObjectId,
    pub proximity_score: f64,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Contact {
    /// Canonical key for an unordered user pair: the lower hex id first.
    /// Both orderings of the same two users collapse to the same key.
    pub fn pair_key(a: &ObjectId, b: &ObjectId) -> String {
        let (a, b) = (a.to_hex(), b.to_hex());
        if a <= b {
            format!("{}:{}", a, b)
        } else {
            format!("{}:{}", b, a)
        }
    }

    pub fn other_party(&self, user_id: &ObjectId) -> ObjectId {
        if &self.requester_id == user_id {
            self.counterpart_id
        } else {
            self.requester_id
        }
    }

    pub fn involves(&self, user_id: &ObjectId) -> bool {
        &self.requester_id == user_id || &self.counterpart_id == user_id
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateContactDto {
    pub counterpart_id: String,
    pub score: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_key_is_order_independent() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_eq!(Contact::pair_key(&a, &b), Contact::pair_key(&b, &a));
    }

    #[test]
    fn test_pair_key_distinguishes_pairs() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        let c = ObjectId::new();
        assert_ne!(Contact::pair_key(&a, &b), Contact::pair_key(&a, &c));
    }
}
