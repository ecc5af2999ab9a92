use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use testset_core::model::{
    CodeSubmission, ItemId, QuizAnswer, SubmissionId, TestSetDetail, TestSetId, TestSetSubmission,
};

use super::SubmissionGateway;
use crate::config::GatewayConfig;
use crate::error::GatewayError;

/// JSON-over-HTTP gateway.
#[derive(Clone)]
pub struct HttpSubmissionGateway {
    client: Client,
    config: GatewayConfig,
}

impl HttpSubmissionGateway {
    /// # Errors
    ///
    /// Returns `GatewayError::Http` if the HTTP client cannot be built.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GatewayError::Endpoint(self.config.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GatewayError> {
        let request = match &self.config.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_default();
            tracing::warn!(%status, %message, "gateway call rejected");
            return Err(GatewayError::HttpStatus { status, message });
        }

        let bytes = response.bytes().await?;
        decode_body(&bytes)
    }
}

/// Responses arrive either bare or wrapped as `{ "data": … }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ApiBody<T> {
    Wrapped { data: T },
    Bare(T),
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, GatewayError> {
    match serde_json::from_slice::<ApiBody<T>>(bytes) {
        Ok(ApiBody::Wrapped { data } | ApiBody::Bare(data)) => Ok(data),
        Err(err) => Err(GatewayError::Decode(err.to_string())),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StartRequest<'a> {
    test_set_id: &'a TestSetId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QuizRequest<'a> {
    quiz_id: &'a ItemId,
    answers: &'a [QuizAnswer],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CodeRequest<'a> {
    problem_id: &'a ItemId,
    language: &'a str,
    source_code: &'a str,
}

#[async_trait]
impl SubmissionGateway for HttpSubmissionGateway {
    async fn start_test_set(&self, test_set_id: &TestSetId) -> Result<TestSetSubmission, GatewayError> {
        let url = self.endpoint(&["testset-submissions", "start"])?;
        self.send(self.client.post(url).json(&StartRequest { test_set_id }))
            .await
    }

    async fn get_test_set(&self, test_set_id: &TestSetId) -> Result<TestSetDetail, GatewayError> {
        let url = self.endpoint(&["testsets", test_set_id.as_str()])?;
        self.send(self.client.get(url)).await
    }

    async fn submit_quiz(
        &self,
        submission_id: &SubmissionId,
        quiz_id: &ItemId,
        answers: &[QuizAnswer],
    ) -> Result<TestSetSubmission, GatewayError> {
        let url = self.endpoint(&["testset-submissions", submission_id.as_str(), "quiz"])?;
        self.send(self.client.post(url).json(&QuizRequest { quiz_id, answers }))
            .await
    }

    async fn submit_code(
        &self,
        submission_id: &SubmissionId,
        problem_id: &ItemId,
        submission: &CodeSubmission,
    ) -> Result<TestSetSubmission, GatewayError> {
        let url = self.endpoint(&["testset-submissions", submission_id.as_str(), "code"])?;
        let body = CodeRequest {
            problem_id,
            language: &submission.language,
            source_code: &submission.source_code,
        };
        self.send(self.client.post(url).json(&body)).await
    }

    async fn submit_final(&self, submission_id: &SubmissionId) -> Result<TestSetSubmission, GatewayError> {
        let url = self.endpoint(&["testset-submissions", submission_id.as_str(), "submit"])?;
        self.send(self.client.post(url)).await
    }
}
