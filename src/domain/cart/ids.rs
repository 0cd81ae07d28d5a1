use crate::uuid_id;

uuid_id!(CartId);
uuid_id!(UserId);

/// Catalog product identifier. Products are numbered by the catalog, not by this service.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct ProductId(pub i64);

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn confirm_v7_uuid_can_be_converted_to_cart_id() {
        let uuid = Uuid::now_v7();
        assert!(CartId::try_from(uuid).is_ok())
    }

    #[test]
    fn confirm_v4_uuid_cannot_be_converted_to_user_id() {
        let uuid = Uuid::new_v4();
        assert!(UserId::try_from(uuid).is_err())
    }

    #[test]
    fn product_id_serializes_as_a_plain_integer() {
        let json = serde_json::to_string(&ProductId(42)).expect("ProductId should serialize.");
        assert_eq!(json, "42");
    }
}
