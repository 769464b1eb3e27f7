//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::Instant;

use stx_transfer::config::TransferConfig;
use stx_transfer::stacks::{
    BroadcastResponse, ChainClient, ChainError, ChainResult, ClarityValue, ContractCallRequest,
    StacksAddress,
};

pub const SENDER: &str = "ST2JN8XG1BG9TZE5FQ4GP0CMTHKF9EVRZ5THN11R1";
pub const RECIPIENT: &str = "ST000000000000000000002AMW42H";
pub const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TXID: &str = "0x5e1b7c3a9f1d2e4b6a8c0d2f4e6a8c0b2d4f6e8a0c2e4a6b8d0f2e4a6c8e0a2b";

pub fn address(s: &str) -> StacksAddress {
    s.parse().unwrap()
}

/// Default config with the verification timings used throughout the tests.
pub fn test_config() -> TransferConfig {
    let mut config = TransferConfig::default();
    config.verification.max_attempts = 3;
    config.verification.settle_delay_secs = 15;
    config.verification.retry_delay_secs = 20;
    config
}

/// When a broadcast transfer becomes visible in balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Visible from the first verification attempt onwards.
    OnAttempt(u32),
    /// Never visible.
    Never,
    /// Visible, but the recipient is credited `amount + extra`.
    OverCredit { extra: u128 },
}

#[derive(Debug)]
struct MockState {
    balances: HashMap<StacksAddress, u128>,
    settlement: Settlement,
    pending: Option<(StacksAddress, StacksAddress, u128)>,
    reads_before_broadcast: usize,
    reads_after_broadcast: usize,
    failing_reads: HashSet<StacksAddress>,
    fail_all_reads: bool,
    broadcast_error: Option<String>,
    submissions: Vec<ContractCallRequest>,
    submitted_at: Option<Instant>,
    read_times_after_broadcast: Vec<Instant>,
    preflight_calls: usize,
}

/// In-memory chain for driving the transfer flow.
pub struct MockChain {
    sender: StacksAddress,
    state: Mutex<MockState>,
}

impl MockChain {
    pub fn new(sender_balance: u128, recipient_balance: u128) -> Self {
        let mut balances = HashMap::new();
        balances.insert(address(SENDER), sender_balance);
        balances.insert(address(RECIPIENT), recipient_balance);
        Self {
            sender: address(SENDER),
            state: Mutex::new(MockState {
                balances,
                settlement: Settlement::OnAttempt(1),
                pending: None,
                reads_before_broadcast: 0,
                reads_after_broadcast: 0,
                failing_reads: HashSet::new(),
                fail_all_reads: false,
                broadcast_error: None,
                submissions: Vec::new(),
                submitted_at: None,
                read_times_after_broadcast: Vec::new(),
                preflight_calls: 0,
            }),
        }
    }

    pub fn with_settlement(self, settlement: Settlement) -> Self {
        self.state.lock().unwrap().settlement = settlement;
        self
    }

    pub fn with_broadcast_error(self, error: &str) -> Self {
        self.state.lock().unwrap().broadcast_error = Some(error.to_string());
        self
    }

    pub fn fail_reads_for(&self, address: StacksAddress) {
        self.state.lock().unwrap().failing_reads.insert(address);
    }

    pub fn fail_all_reads(&self, fail: bool) {
        self.state.lock().unwrap().fail_all_reads = fail;
    }

    pub fn balance_of(&self, address: &StacksAddress) -> u128 {
        self.state.lock().unwrap().balances.get(address).copied().unwrap_or(0)
    }

    pub fn reads_before_broadcast(&self) -> usize {
        self.state.lock().unwrap().reads_before_broadcast
    }

    pub fn reads_after_broadcast(&self) -> usize {
        self.state.lock().unwrap().reads_after_broadcast
    }

    pub fn submissions(&self) -> Vec<ContractCallRequest> {
        self.state.lock().unwrap().submissions.clone()
    }

    /// When each verification attempt started, relative to the broadcast.
    ///
    /// Every attempt reads the sender first, then the recipient.
    pub fn attempt_offsets(&self) -> Vec<Duration> {
        let state = self.state.lock().unwrap();
        let Some(submitted_at) = state.submitted_at else {
            return Vec::new();
        };
        state
            .read_times_after_broadcast
            .iter()
            .step_by(2)
            .map(|at| at.duration_since(submitted_at))
            .collect()
    }

    pub fn preflight_calls(&self) -> usize {
        self.state.lock().unwrap().preflight_calls
    }

    pub fn total_calls(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.reads_before_broadcast
            + state.reads_after_broadcast
            + state.submissions.len()
            + state.preflight_calls
    }
}

impl MockState {
    /// Apply the pending transfer once the configured attempt starts reading.
    fn maybe_settle(&mut self) {
        let Some((from, to, amount)) = self.pending else {
            return;
        };
        let due = match self.settlement {
            Settlement::OnAttempt(n) => self.reads_after_broadcast >= 2 * (n as usize - 1),
            Settlement::OverCredit { .. } => true,
            Settlement::Never => false,
        };
        if !due {
            return;
        }
        let credit = match self.settlement {
            Settlement::OverCredit { extra } => amount + extra,
            _ => amount,
        };
        *self.balances.entry(from).or_default() -= amount;
        *self.balances.entry(to).or_default() += credit;
        self.pending = None;
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn sender_address(&self) -> StacksAddress {
        self.sender
    }

    async fn preflight(&self) -> ChainResult<()> {
        self.state.lock().unwrap().preflight_calls += 1;
        Ok(())
    }

    async fn call_read_only(
        &self,
        _contract_address: &StacksAddress,
        _contract_name: &str,
        function_name: &str,
        args: &[ClarityValue],
        _sender: &StacksAddress,
    ) -> ChainResult<ClarityValue> {
        let mut state = self.state.lock().unwrap();
        assert_eq!(function_name, "get-balance");

        let broadcast = !state.submissions.is_empty();
        if broadcast {
            state.maybe_settle();
            state.reads_after_broadcast += 1;
            state.read_times_after_broadcast.push(Instant::now());
        } else {
            state.reads_before_broadcast += 1;
        }

        let owner = match args {
            [ClarityValue::StandardPrincipal(owner)] => *owner,
            other => panic!("unexpected get-balance args: {:?}", other),
        };
        if state.fail_all_reads || state.failing_reads.contains(&owner) {
            return Err(ChainError::Rpc("injected read failure".to_string()));
        }

        let balance = state.balances.get(&owner).copied().unwrap_or(0);
        Ok(ClarityValue::ResponseOk(Box::new(ClarityValue::UInt(balance))))
    }

    async fn submit_contract_call(
        &self,
        request: ContractCallRequest,
    ) -> ChainResult<BroadcastResponse> {
        let mut state = self.state.lock().unwrap();

        let (from, to, amount) = match request.function_args.as_slice() {
            [ClarityValue::UInt(amount), ClarityValue::StandardPrincipal(from), ClarityValue::StandardPrincipal(to), ClarityValue::OptionalNone] => {
                (*from, *to, *amount)
            }
            other => panic!("unexpected transfer args: {:?}", other),
        };
        state.submissions.push(request);
        state.submitted_at = Some(Instant::now());

        if let Some(error) = state.broadcast_error.clone() {
            return Ok(BroadcastResponse::rejected(TXID, error, Some("NotEnoughFunds".to_string())));
        }

        state.pending = Some((from, to, amount));
        Ok(BroadcastResponse::accepted(TXID))
    }
}

/// A request as seen by the stub node.
#[derive(Debug, Clone)]
pub struct StubRequest {
    pub method: String,
    pub path: String,
    pub body: Vec<u8>,
}

/// Start a programmable stub Stacks node on an ephemeral port.
///
/// Every request is fully read before `handler` answers it; the connection is
/// closed after each response. Returns the bound address and a log of the
/// requests received.
pub async fn start_stub_node<F>(handler: F) -> (SocketAddr, Arc<Mutex<Vec<StubRequest>>>)
where
    F: Fn(&StubRequest) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);
    let log = Arc::new(Mutex::new(Vec::new()));
    let requests = log.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let handler = handler.clone();
                    let requests = requests.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        requests.lock().unwrap().push(request.clone());
                        let (status, body) = handler(&request);
                        let response = format!(
                            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            status_text(status),
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, log)
}

/// Start a stub node that never answers within `delay`.
pub async fn start_slow_node(delay: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                drop(socket);
            });
        }
    });
    addr
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<StubRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = buf[header_end..].to_vec();

    Some(StubRequest { method, path, body })
}
