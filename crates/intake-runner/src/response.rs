//! Caller-facing invocation response

use serde::Serialize;

use intake_core::RunResult;

/// Structured response returned to whatever triggered the run
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: ResponseBody,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Success { message: String, result: RunResult },
    Failure { message: String, error: String },
}

impl Response {
    /// 200 with the run result; the pipeline completed (possibly partially)
    pub fn success(result: RunResult) -> Self {
        Self {
            status_code: 200,
            body: ResponseBody::Success {
                message: format!("Import completed with status: {}", result.status),
                result,
            },
        }
    }

    /// 500 for anything that failed before the pipeline could run
    pub fn failure(error: impl std::fmt::Display) -> Self {
        Self {
            status_code: 500,
            body: ResponseBody::Failure {
                message: "Import failed".to_string(),
                error: error.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use intake_core::RunStats;
    use uuid::Uuid;

    #[test]
    fn test_success_shape() {
        let result = RunResult::new("csv", RunStats::new(), Uuid::new_v4(), Utc::now());
        let response = Response::success(result);
        assert!(response.is_success());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["body"]["message"], "Import completed with status: success");
        assert_eq!(json["body"]["result"]["status"], "success");
        assert!(json["body"].get("error").is_none());
    }

    #[test]
    fn test_failure_shape() {
        let response = Response::failure("unknown connector kind: ftp");
        assert!(!response.is_success());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["statusCode"], 500);
        assert_eq!(json["body"]["message"], "Import failed");
        assert_eq!(json["body"]["error"], "unknown connector kind: ftp");
        assert!(json["body"].get("result").is_none());
    }
}
