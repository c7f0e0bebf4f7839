// 批量捐赠执行器
//
// 每条助记词: 校验 → 派生 → 构建证明 → 提交
// 单条失败只记录，不中断整批

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::{
    domain::{address::Network, derivation::derive_from_mnemonic, proof::build_proof},
    error::AppError,
    service::submission::{SubmissionClient, SubmissionOutcome},
    utils::string_utils::proof_preview,
};

/// 调度模式（整批只选一次）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    #[default]
    Sequential,
    /// limit 为 0 时按 1 处理
    BoundedConcurrent { limit: usize },
}

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub destination_address: String,
    /// 已嵌入目标地址的固定签名消息
    pub message: String,
    pub mode: ExecutionMode,
    pub network: Network,
}

#[derive(Debug, Clone)]
pub enum PhraseOutcome {
    /// 校验/派生/构建阶段失败，未发起提交
    Rejected(AppError),
    Submitted(SubmissionOutcome),
}

impl PhraseOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PhraseOutcome::Submitted(outcome) if outcome.is_success())
    }
}

impl std::fmt::Display for PhraseOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhraseOutcome::Rejected(e) => write!(f, "SKIPPED: {}", e),
            PhraseOutcome::Submitted(outcome) => write!(f, "{}", outcome),
        }
    }
}

/// 单条助记词的处理结果
#[derive(Debug, Clone)]
pub struct PhraseResult {
    /// 输入中的位置（从 0 开始）
    pub index: usize,
    pub origin_address: Option<String>,
    pub proof_preview: Option<String>,
    pub outcome: PhraseOutcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    /// 含 already_done
    pub succeeded: usize,
    pub already_done: usize,
    pub failed: usize,
    pub rejected: usize,
}

/// 整批结果，按输入顺序排列
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub results: Vec<PhraseResult>,
}

impl BatchReport {
    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            total: self.results.len(),
            ..Default::default()
        };

        for result in &self.results {
            match &result.outcome {
                PhraseOutcome::Rejected(_) => summary.rejected += 1,
                PhraseOutcome::Submitted(outcome) => {
                    if outcome.is_success() {
                        summary.succeeded += 1;
                    } else {
                        summary.failed += 1;
                    }
                    if matches!(outcome, SubmissionOutcome::AlreadyDone { .. }) {
                        summary.already_done += 1;
                    }
                }
            }
        }

        summary
    }

    pub fn log_summary(&self) {
        let summary = self.summary();
        tracing::info!(
            total = summary.total,
            succeeded = summary.succeeded,
            already_done = summary.already_done,
            failed = summary.failed,
            rejected = summary.rejected,
            "All done."
        );
    }
}

pub struct BatchRunner {
    config: RunnerConfig,
    client: SubmissionClient,
}

impl BatchRunner {
    pub fn new(config: RunnerConfig, client: SubmissionClient) -> Self {
        Self { config, client }
    }

    pub async fn run(&self, phrases: Vec<String>) -> BatchReport {
        tracing::info!(
            phrases = phrases.len(),
            mode = ?self.config.mode,
            destination = %self.config.destination_address,
            "Starting donation batch"
        );

        let results = match self.config.mode {
            ExecutionMode::Sequential => {
                let mut results = Vec::with_capacity(phrases.len());
                for (index, phrase) in phrases.iter().enumerate() {
                    results.push(self.process(index, phrase).await);
                }
                results
            }
            ExecutionMode::BoundedConcurrent { limit } => {
                // tokio 信号量按 FIFO 发放许可
                let gate = Arc::new(Semaphore::new(limit.max(1)));
                let tasks = phrases.iter().enumerate().map(|(index, phrase)| {
                    let gate = gate.clone();
                    async move {
                        // 信号量从不关闭，acquire 不会失败
                        let _permit = gate.acquire().await.ok();
                        self.process(index, phrase).await
                    }
                });
                join_all(tasks).await
            }
        };

        BatchReport { results }
    }

    async fn process(&self, index: usize, phrase: &str) -> PhraseResult {
        // 密钥只在本作用域内存活，提交前即释放
        let prepared = self.prepare(phrase);

        let (origin, proof_hex) = match prepared {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(index, error = %e, code = e.code().as_str(), "Skipping phrase");
                return PhraseResult {
                    index,
                    origin_address: None,
                    proof_preview: None,
                    outcome: PhraseOutcome::Rejected(e),
                };
            }
        };

        let preview = proof_preview(&proof_hex);
        tracing::info!(index, origin = %origin, proof = %preview, "Submitting donation");

        let outcome = self
            .client
            .submit(&self.config.destination_address, &origin, &proof_hex)
            .await;

        tracing::info!(index, origin = %origin, outcome = %outcome, "Donation finished");

        PhraseResult {
            index,
            origin_address: Some(origin),
            proof_preview: Some(preview),
            outcome: PhraseOutcome::Submitted(outcome),
        }
    }

    fn prepare(&self, phrase: &str) -> Result<(String, String), AppError> {
        let keys = derive_from_mnemonic(phrase, self.config.network)?;
        let proof = build_proof(&keys.payment_key, &keys.address, &self.config.message);
        Ok((keys.address_bech32.clone(), proof.to_hex()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::submission::{
        DonationRequest, DonationTransport, RetryPolicy, TransportError, TransportResponse,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    const VALID_A: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
    const VALID_B: &str = "zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo wrong";
    const INVALID: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon";

    /// 固定状态码的传输层，记录收到的请求
    struct FixedTransport {
        status: u16,
        requests: Mutex<Vec<DonationRequest>>,
    }

    #[async_trait]
    impl DonationTransport for FixedTransport {
        async fn post(&self, request: &DonationRequest) -> Result<TransportResponse, TransportError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(TransportResponse {
                status: self.status,
                body: String::new(),
            })
        }
    }

    fn runner(status: u16, mode: ExecutionMode) -> (BatchRunner, Arc<FixedTransport>) {
        let transport = Arc::new(FixedTransport {
            status,
            requests: Mutex::new(Vec::new()),
        });
        let client = SubmissionClient::new(transport.clone(), RetryPolicy::default());
        let config = RunnerConfig {
            destination_address: "addr1dest".into(),
            message: "Assign accumulated Scavenger rights to: addr1dest".into(),
            mode,
            network: Network::Mainnet,
        };
        (BatchRunner::new(config, client), transport)
    }

    #[tokio::test]
    async fn test_invalid_phrase_does_not_stop_batch() {
        let (runner, transport) = runner(200, ExecutionMode::Sequential);
        let report = runner
            .run(vec![VALID_A.into(), INVALID.into(), VALID_B.into()])
            .await;

        assert_eq!(report.results.len(), 3);
        assert!(report.results[0].outcome.is_success());
        assert!(matches!(
            report.results[1].outcome,
            PhraseOutcome::Rejected(AppError::InvalidMnemonic { .. })
        ));
        assert!(report.results[1].origin_address.is_none());
        assert!(report.results[2].outcome.is_success());

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[0].origin,
            "addr1qy8ac7qqy0vtulyl7wntmsxc6wex80gvcyjy33qffrhm7sh927ysx5sftuw0dlft05dz3c7revpf7jx0xnlcjz3g69mq4afdhv"
        );
        assert!(requests.iter().all(|r| r.destination == "addr1dest"));
    }

    #[tokio::test]
    async fn test_summary_counts_already_done_as_success() {
        let (runner, _) = runner(409, ExecutionMode::Sequential);
        let report = runner.run(vec![VALID_A.into(), INVALID.into()]).await;

        let summary = report.summary();
        assert_eq!(
            summary,
            BatchSummary {
                total: 2,
                succeeded: 1,
                already_done: 1,
                failed: 0,
                rejected: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_bad_signature_counts_as_failed() {
        let (runner, _) = runner(400, ExecutionMode::BoundedConcurrent { limit: 2 });
        let report = runner.run(vec![VALID_A.into(), VALID_B.into()]).await;

        let summary = report.summary();
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.succeeded, 0);
        assert_eq!(report.results[0].index, 0);
        assert_eq!(report.results[1].index, 1);
        let preview = report.results[0].proof_preview.as_deref().unwrap();
        assert!(preview.starts_with("845847a2"));
        assert_eq!(preview.trim_end_matches('…').len(), 32);
    }

    #[tokio::test]
    async fn test_zero_limit_still_makes_progress() {
        let (runner, transport) = runner(200, ExecutionMode::BoundedConcurrent { limit: 0 });
        let report = runner.run(vec![VALID_A.into(), VALID_B.into()]).await;

        assert_eq!(report.summary().succeeded, 2);
        assert_eq!(transport.requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let (runner, _) = runner(200, ExecutionMode::Sequential);
        let report = runner.run(Vec::new()).await;
        assert_eq!(report.summary(), BatchSummary::default());
    }
}
