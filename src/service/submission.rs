// 证明提交客户端
//
// 提供：
// - 单次网络交换的响应分类
// - 有界指数退避重试（传输失败与可重试状态码共用同一退避表）
// - 可注入的传输层与等待实现，便于测试

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;

use crate::{config::HttpConfig, error::AppError};

/// 一次提交请求：三个路径段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonationRequest {
    pub destination: String,
    pub origin: String,
    pub proof_hex: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// 传输层失败（未拿到响应）
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
}

/// 传输层抽象：请求进，响应或失败出
#[async_trait]
pub trait DonationTransport: Send + Sync {
    async fn post(&self, request: &DonationRequest) -> Result<TransportResponse, TransportError>;
}

/// 退避等待抽象
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// reqwest 实现：POST {api_base}/{destination}/{origin}/{proof}，空 JSON 体
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    api_base: String,
}

impl HttpTransport {
    pub fn new(api_base: impl Into<String>, config: &HttpConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| AppError::Http(e.to_string()))?;

        Ok(Self {
            client,
            api_base: api_base.into(),
        })
    }

    pub fn url_for(&self, request: &DonationRequest) -> String {
        format!(
            "{}/{}/{}/{}",
            self.api_base.trim_end_matches('/'),
            request.destination,
            request.origin,
            request.proof_hex
        )
    }
}

#[async_trait]
impl DonationTransport for HttpTransport {
    async fn post(&self, request: &DonationRequest) -> Result<TransportResponse, TransportError> {
        let resp = self
            .client
            .post(self.url_for(request))
            .header(CONTENT_TYPE, "application/json")
            .body("{}")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(map_reqwest_error)?;

        Ok(TransportResponse { status, body })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(e.to_string())
    }
}

/// 重试策略：最多 max_retries 次重试，第 n 次重试前等待 base_delay * 2^(n-1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(5000),
        }
    }
}

impl RetryPolicy {
    /// attempt 从 1 开始
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// 单次响应的分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    Success,
    AlreadyDone,
    BadSignature,
    NotRegistered,
    Retryable,
    Unclassified,
}

pub fn classify(status: u16) -> ResponseClass {
    match status {
        200..=299 => ResponseClass::Success,
        400 => ResponseClass::BadSignature,
        404 => ResponseClass::NotRegistered,
        409 => ResponseClass::AlreadyDone,
        408 | 429 => ResponseClass::Retryable,
        s if s >= 500 => ResponseClass::Retryable,
        _ => ResponseClass::Unclassified,
    }
}

/// 最终提交结果（每条助记词一次）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Success { body: String },
    /// 已提交过；汇总时按成功计
    AlreadyDone { body: String },
    BadSignature { body: String },
    NotRegistered { body: String },
    UnclassifiedFailure { status: u16, body: String },
    ExhaustedRetries { attempts: u32, last_error: String },
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            SubmissionOutcome::Success { .. } | SubmissionOutcome::AlreadyDone { .. }
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            SubmissionOutcome::Success { .. } => "SUCCESS",
            SubmissionOutcome::AlreadyDone { .. } => "ALREADY DONE",
            SubmissionOutcome::BadSignature { .. } => "BAD SIG",
            SubmissionOutcome::NotRegistered { .. } => "NOT REGISTERED",
            SubmissionOutcome::UnclassifiedFailure { .. } => "FAILED",
            SubmissionOutcome::ExhaustedRetries { .. } => "MAX RETRIES EXCEEDED",
        }
    }
}

impl std::fmt::Display for SubmissionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionOutcome::Success { body } => {
                write!(f, "{}: {}", self.label(), if body.is_empty() { "OK" } else { body })
            }
            SubmissionOutcome::AlreadyDone { body }
            | SubmissionOutcome::BadSignature { body }
            | SubmissionOutcome::NotRegistered { body } => write!(f, "{}: {}", self.label(), body),
            SubmissionOutcome::UnclassifiedFailure { status, body } => {
                write!(f, "{} {}: {}", self.label(), status, body)
            }
            SubmissionOutcome::ExhaustedRetries {
                attempts,
                last_error,
            } => write!(f, "{} after {} attempts: {}", self.label(), attempts, last_error),
        }
    }
}

/// 提交客户端
#[derive(Clone)]
pub struct SubmissionClient {
    transport: Arc<dyn DonationTransport>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
}

impl SubmissionClient {
    pub fn new(transport: Arc<dyn DonationTransport>, policy: RetryPolicy) -> Self {
        Self::with_sleeper(transport, Arc::new(TokioSleeper), policy)
    }

    pub fn with_sleeper(
        transport: Arc<dyn DonationTransport>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            sleeper,
            policy,
        }
    }

    /// 提交一条证明，返回终态结果
    ///
    /// 传输失败与 408/429/5xx 触发退避重试；400/404/409/2xx 及其他状态立即返回
    pub async fn submit(&self, destination: &str, origin: &str, proof_hex: &str) -> SubmissionOutcome {
        let request = DonationRequest {
            destination: destination.to_string(),
            origin: origin.to_string(),
            proof_hex: proof_hex.to_string(),
        };

        let mut attempt: u32 = 0;

        loop {
            let last_error = match self.transport.post(&request).await {
                Ok(TransportResponse { status, body }) => match classify(status) {
                    ResponseClass::Success => {
                        tracing::info!(origin = %origin, destination = %destination, "Donation accepted");
                        return SubmissionOutcome::Success { body };
                    }
                    ResponseClass::AlreadyDone => {
                        tracing::warn!(origin = %origin, body = %body, "Donation already done");
                        return SubmissionOutcome::AlreadyDone { body };
                    }
                    ResponseClass::BadSignature => {
                        tracing::error!(origin = %origin, body = %body, "Donation rejected: bad signature");
                        return SubmissionOutcome::BadSignature { body };
                    }
                    ResponseClass::NotRegistered => {
                        tracing::error!(origin = %origin, body = %body, "Donation rejected: address not registered");
                        return SubmissionOutcome::NotRegistered { body };
                    }
                    ResponseClass::Unclassified => {
                        tracing::error!(origin = %origin, status, body = %body, "Donation failed");
                        return SubmissionOutcome::UnclassifiedFailure { status, body };
                    }
                    ResponseClass::Retryable => format!("server status {}", status),
                },
                Err(e) => e.to_string(),
            };

            attempt += 1;
            if attempt > self.policy.max_retries {
                tracing::error!(
                    origin = %origin,
                    attempts = attempt,
                    error = %last_error,
                    "Max retries exceeded"
                );
                return SubmissionOutcome::ExhaustedRetries {
                    attempts: attempt,
                    last_error,
                };
            }

            let wait = self.policy.delay_for(attempt);
            tracing::warn!(
                origin = %origin,
                error = %last_error,
                retry = attempt,
                max_retries = self.policy.max_retries,
                wait_ms = wait.as_millis() as u64,
                "Submission failed, will retry"
            );
            self.sleeper.sleep(wait).await;
        }
    }
}
