pub mod types;
pub mod utils;
pub mod env;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok" };
        assert_eq!(h.status, "ok");
    }

    #[test]
    fn error_body_serializes_message() {
        let body = types::ErrorBody::new("boom");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"], "boom");
    }
}
