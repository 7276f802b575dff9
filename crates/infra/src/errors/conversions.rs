//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use tallybridge_domain::TallyError;
use thiserror::Error;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct InfraError(pub TallyError);

impl From<InfraError> for TallyError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<TallyError> for InfraError {
    fn from(value: TallyError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoTallyError {
    fn into_tally(self) -> TallyError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → TallyError */
/* -------------------------------------------------------------------------- */

impl IntoTallyError for HttpError {
    fn into_tally(self) -> TallyError {
        if self.is_timeout() {
            return TallyError::Timeout(format!("HTTP request timed out: {self}"));
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return TallyError::ConnectionFailed(format!("HTTP connection failure: {self}"));
        }

        if self.is_builder() {
            return TallyError::RequestFailed(self.to_string());
        }

        if self.is_body() || self.is_decode() {
            return TallyError::ResponseParseFailed(format!("failed to read response body: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                500..=599 => TallyError::ConnectionFailed(message),
                _ => TallyError::RequestFailed(message),
            };
        }

        TallyError::ConnectionFailed(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_tally())
    }
}

/* -------------------------------------------------------------------------- */
/* quick_xml errors → TallyError */
/* -------------------------------------------------------------------------- */

impl IntoTallyError for quick_xml::SeError {
    fn into_tally(self) -> TallyError {
        TallyError::InvalidXml(self.to_string())
    }
}

impl From<quick_xml::SeError> for InfraError {
    fn from(value: quick_xml::SeError) -> Self {
        InfraError(value.into_tally())
    }
}

impl IntoTallyError for quick_xml::DeError {
    fn into_tally(self) -> TallyError {
        TallyError::ResponseParseFailed(self.to_string())
    }
}

impl From<quick_xml::DeError> for InfraError {
    fn from(value: quick_xml::DeError) -> Self {
        InfraError(value.into_tally())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::time::Duration;

    use reqwest::{Client, StatusCode};
    use tallybridge_domain::TallyErrorKind;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn refused_connection_maps_to_connection_failed() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.post(format!("http://{addr}")).send().await.unwrap_err();

        let mapped: TallyError = InfraError::from(error).into();
        assert_eq!(mapped.kind(), TallyErrorKind::ConnectionFailed);
        assert!(mapped.is_retryable());
    }

    #[tokio::test]
    async fn client_timeout_maps_to_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client =
            Client::builder().no_proxy().timeout(Duration::from_millis(50)).build().unwrap();
        let error = client.post(server.uri()).send().await.unwrap_err();

        let mapped: TallyError = InfraError::from(error).into();
        assert!(mapped.is_timeout(), "expected timeout, got {mapped:?}");
    }

    #[tokio::test]
    async fn http_status_503_maps_to_connection_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::SERVICE_UNAVAILABLE))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error =
            client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: TallyError = InfraError::from(error).into();
        match mapped {
            TallyError::ConnectionFailed(msg) => assert!(msg.contains("503")),
            other => panic!("expected connection failure, got {:?}", other),
        }
    }

    #[test]
    fn xml_serialization_error_maps_to_invalid_xml() {
        let err = quick_xml::se::to_string_with_root("not a name", &1).unwrap_err();
        let mapped: TallyError = InfraError::from(err).into();
        assert_eq!(mapped.kind(), TallyErrorKind::InvalidXml);
    }
}
