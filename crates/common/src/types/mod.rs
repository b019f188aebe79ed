use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

/// Response envelope shared by every JSON endpoint:
/// `{success, data?, message?, error?, errors?}`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self { success: true, data: Some(data), message: Some(message.into()), error: None, errors: None }
    }
}

impl ApiResponse<()> {
    pub fn acknowledged(message: impl Into<String>) -> Self {
        Self { success: true, data: None, message: Some(message.into()), error: None, errors: None }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, data: None, message: Some(message.into()), error: None, errors: None }
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = Some(errors);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_envelope_omits_absent_fields() {
        let body = serde_json::to_value(ApiResponse::failure("Entry not found")).unwrap();
        assert_eq!(body, serde_json::json!({"success": false, "message": "Entry not found"}));
    }

    #[test]
    fn validation_envelope_carries_error_list() {
        let body = serde_json::to_value(
            ApiResponse::failure("Validation failed").with_errors(vec!["City cannot exceed 50 characters".into()]),
        )
        .unwrap();
        assert_eq!(body["errors"][0], "City cannot exceed 50 characters");
        assert!(body.get("data").is_none());
    }
}
