//! Event-to-response handler

use tracing::{error, info};

use intake_common::ImportError;
use intake_connectors::ConnectorKind;
use intake_core::db::Database;
use intake_core::pipeline;

use crate::event::{Context, Event};
use crate::response::Response;

/// Run one import invocation
///
/// Parses the event, builds the connector, runs the pipeline, and maps the
/// outcome to a response. Only pre-pipeline failures (missing or unknown
/// connector kind, bad options) produce a 500; once the pipeline starts the
/// response is always a 200 carrying the run result.
pub async fn handle(event: Event, ctx: &Context, db: Database) -> Response {
    info!(
        invocation_id = %ctx.invocation_id,
        source = %ctx.source,
        connector = event.connector.as_deref().unwrap_or("<unset>"),
        "import invocation received"
    );

    let kind = match event.connector.as_deref() {
        Some(name) => match name.parse::<ConnectorKind>() {
            Ok(kind) => kind,
            Err(e) => {
                error!(invocation_id = %ctx.invocation_id, error = %e, "invalid connector kind");
                return Response::failure(e);
            }
        },
        None => {
            let e = ImportError::InvalidEvent("event is missing 'connector'".to_string());
            error!(invocation_id = %ctx.invocation_id, error = %e, "invalid event");
            return Response::failure(e);
        }
    };

    let importer = match intake_connectors::build(kind, &event.options, db) {
        Ok(importer) => importer,
        Err(e) => {
            error!(invocation_id = %ctx.invocation_id, error = %e, "connector construction failed");
            return Response::failure(e);
        }
    };

    let result = pipeline::run(importer.as_ref()).await;
    Response::success(result)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::response::ResponseBody;
    use intake_core::db::DatabaseConfig;
    use std::io::Write;

    /// Pool pointing at a port nothing listens on; connection attempts fail
    /// fast instead of hanging
    fn unreachable_db() -> Database {
        let config = DatabaseConfig {
            port: 1,
            acquire_timeout_secs: 1,
            ..Default::default()
        };
        Database::connect_lazy(&config).unwrap()
    }

    #[tokio::test]
    async fn test_missing_connector_is_500() {
        let response = handle(Event::default(), &Context::new("test"), unreachable_db()).await;
        assert_eq!(response.status_code, 500);
    }

    #[tokio::test]
    async fn test_unknown_connector_is_500() {
        let event = Event::from_json(r#"{"connector": "ftp"}"#).unwrap();
        let response = handle(event, &Context::new("test"), unreachable_db()).await;

        assert_eq!(response.status_code, 500);
        match response.body {
            ResponseBody::Failure { error, .. } => assert!(error.contains("ftp")),
            _ => panic!("expected failure body"),
        }
    }

    #[tokio::test]
    async fn test_bad_options_is_500() {
        // api connector requires api_url
        let event = Event::from_json(r#"{"connector": "api"}"#).unwrap();
        let response = handle(event, &Context::new("test"), unreachable_db()).await;
        assert_eq!(response.status_code, 500);
    }

    #[tokio::test]
    async fn test_missing_csv_file_is_vacuous_success() {
        let event = Event::from_json(
            r#"{"connector": "csv", "options": {"file_path": "/nonexistent/x.csv"}}"#,
        )
        .unwrap();
        let response = handle(event, &Context::new("test"), unreachable_db()).await;

        assert_eq!(response.status_code, 200);
        match response.body {
            ResponseBody::Success { result, .. } => {
                assert_eq!(result.stats.fetched, 0);
                assert_eq!(result.stats.errors, 0);
            }
            _ => panic!("expected success body"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_database_yields_partial_result() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,name\nc-1,Ada").unwrap();
        file.flush().unwrap();

        let event = Event::from_value(serde_json::json!({
            "connector": "csv",
            "options": {"file_path": file.path().to_str().unwrap()},
        }))
        .unwrap();

        let response = handle(event, &Context::new("test"), unreachable_db()).await;

        // pipeline ran to completion; the save failure is reported in the
        // result, not as a 500
        assert_eq!(response.status_code, 200);
        match response.body {
            ResponseBody::Success { result, .. } => {
                assert_eq!(result.stats.fetched, 1);
                assert_eq!(result.stats.transformed, 1);
                assert_eq!(result.stats.saved, 0);
                assert_eq!(result.stats.errors, 1);
            }
            _ => panic!("expected success body"),
        }
    }
}
