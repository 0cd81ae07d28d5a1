use crate::uuid_id;

uuid_id!(CheckoutId);
uuid_id!(AttemptId);
