use serde::Serialize;
use utoipa::ToSchema;

/// JSON body returned by `/upload` and `/delete`.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum ApiResponse {
    Success {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        output: Option<String>,
    },
    Failure {
        error: String,
    },
}

impl ApiResponse {
    pub fn success(message: impl Into<String>) -> Self {
        ApiResponse::Success {
            message: message.into(),
            output: None,
        }
    }

    pub fn success_with_output(message: impl Into<String>, output: impl Into<String>) -> Self {
        ApiResponse::Success {
            message: message.into(),
            output: Some(output.into()),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        ApiResponse::Failure {
            error: error.into(),
        }
    }
}
