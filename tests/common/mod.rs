//! 测试辅助模块
//! 提供脚本化传输层、等待记录器和测试助记词

#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::Notify;
use scavenger_donor::service::submission::{
    DonationRequest, DonationTransport, Sleeper, TransportError, TransportResponse,
};

/// 全零熵标准测试向量
pub const ZERO_PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
pub const ZERO_ADDRESS: &str = "addr1qy8ac7qqy0vtulyl7wntmsxc6wex80gvcyjy33qffrhm7sh927ysx5sftuw0dlft05dz3c7revpf7jx0xnlcjz3g69mq4afdhv";

pub const LEGAL_PHRASE: &str = "legal winner thank year wave sausage worth useful legal winner thank yellow";
pub const LEGAL_ADDRESS: &str = "addr1qxttdu6d96klw8xvme7ctwuv0jg7xns0vm35ksv4l722aupyayzk39uascqj78hynwh3ax5w8ch5n9062k0vpnj3dlps3a8a9a";

pub const LETTER_PHRASE: &str = "letter advice cage absurd amount doctor acoustic avoid letter advice cage above";
pub const LETTER_ADDRESS: &str = "addr1q9mudxv36hnwejmdepu8a4mprs42d3gzzhzsl73uvv73ak334wvcuhjakcyejwx2j69ctqc4g5qaqt5x9ta8gzm4yaaqtmg29y";

pub const ZOO_PHRASE: &str = "zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo wrong";
pub const ZOO_ADDRESS: &str = "addr1qxpjv933p0lj92032x0usxgkk0rt3w5nxfyp0uj9gju0dng2s5d4tgt67ke6epav5xnx77csfwgdpwemyacfp8s7vqasdkjkn4";

/// 校验和错误
pub const BAD_CHECKSUM_PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon";

pub const DESTINATION: &str = "addr1qxg6wcdly3sr563x3pxv0qm5ukw4rdxxz983f93mj57cprqexqzssdmr839pgsuptwck7gacxjgp5al5zyzg2hknxe2s5km6gj";

pub fn donation_message() -> String {
    format!("Assign accumulated Scavenger rights to: {}", DESTINATION)
}

/// 按脚本依次返回结果；脚本耗尽后返回 200
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
    requests: Mutex<Vec<DonationRequest>>,
}

impl ScriptedTransport {
    pub fn with_statuses(statuses: &[u16]) -> Arc<Self> {
        let script = statuses
            .iter()
            .map(|&status| {
                Ok(TransportResponse {
                    status,
                    body: String::new(),
                })
            })
            .collect();
        Arc::new(Self {
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn always_ok() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn requests(&self) -> Vec<DonationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DonationTransport for ScriptedTransport {
    async fn post(&self, request: &DonationRequest) -> Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        self.script.lock().unwrap().pop_front().unwrap_or(Ok(TransportResponse {
            status: 200,
            body: "OK".into(),
        }))
    }
}

/// 记录同时在途的请求数
pub struct InFlightProbe {
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    completed: AtomicUsize,
}

impl InFlightProbe {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        })
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DonationTransport for InFlightProbe {
    async fn post(&self, _request: &DonationRequest) -> Result<TransportResponse, TransportError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(TransportResponse {
            status: 200,
            body: String::new(),
        })
    }
}

/// 只记录等待时长，不真正休眠
#[derive(Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start(String),
    End(String),
}

/// 记录每个请求的开始/结束顺序
///
/// `held` 指定的 origin 会一直挂起，直到其余请求完成 `release_after` 个；
/// 状态码脚本耗尽后返回 200
pub struct TimelineTransport {
    held: Option<String>,
    release_after: usize,
    statuses: Mutex<VecDeque<u16>>,
    events: Mutex<Vec<Event>>,
    completed: AtomicUsize,
    release: Notify,
}

impl TimelineTransport {
    pub fn new() -> Arc<Self> {
        Self::build(None, 0, &[])
    }

    pub fn with_statuses(statuses: &[u16]) -> Arc<Self> {
        Self::build(None, 0, statuses)
    }

    pub fn holding(origin: &str, release_after: usize) -> Arc<Self> {
        Self::build(Some(origin.to_string()), release_after, &[])
    }

    fn build(held: Option<String>, release_after: usize, statuses: &[u16]) -> Arc<Self> {
        Arc::new(Self {
            held,
            release_after,
            statuses: Mutex::new(statuses.iter().copied().collect()),
            events: Mutex::new(Vec::new()),
            completed: AtomicUsize::new(0),
            release: Notify::new(),
        })
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn start_order(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Start(origin) => Some(origin),
                Event::End(_) => None,
            })
            .collect()
    }

    /// 整个时间线上同时在途的最大请求数
    pub fn max_overlap(&self) -> usize {
        let mut current = 0usize;
        let mut max = 0usize;
        for event in self.events() {
            match event {
                Event::Start(_) => {
                    current += 1;
                    max = max.max(current);
                }
                Event::End(_) => current -= 1,
            }
        }
        max
    }
}

#[async_trait]
impl DonationTransport for TimelineTransport {
    async fn post(&self, request: &DonationRequest) -> Result<TransportResponse, TransportError> {
        self.events
            .lock()
            .unwrap()
            .push(Event::Start(request.origin.clone()));

        if self.held.as_deref() == Some(request.origin.as_str()) {
            self.release.notified().await;
        } else {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
            if done == self.release_after {
                // 没有等待者时 notify_one 会保留一次许可
                self.release.notify_one();
            }
        }

        let status = self.statuses.lock().unwrap().pop_front().unwrap_or(200);
        self.events
            .lock()
            .unwrap()
            .push(Event::End(request.origin.clone()));
        Ok(TransportResponse {
            status,
            body: String::new(),
        })
    }
}
