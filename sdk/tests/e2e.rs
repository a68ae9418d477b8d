//! End-to-end tests for the submission path.
//!
//! A scripted [`Transport`] stands in for the network: each call pops the
//! next reply off a queue and records what was sent. Endpoints can also be
//! taken down, in which case they refuse every connection without touching
//! the queue. Tokio's clock is paused,
//! so backoff sleeps and per-call timeouts complete instantly while keeping
//! their ordering.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use prost::Message;
use tokio::sync::watch;
use tokio::time::Instant;

use hiero_sdk::config::BackoffConfig;
use hiero_sdk::network::{Endpoint, Transport, TransportError};
use hiero_sdk::proto::{services, ToProtobuf};
use hiero_sdk::transaction::TransferData;
use hiero_sdk::{
    AccountId, Client, Error, FrozenTransaction, Hbar, LedgerId, PrivateKey, Status, TopicId,
    TopicMessageSubmitTransaction, TransactionId, TransactionRecordQuery, TransferTransaction,
};

// ---------------------------------------------------------------------------
// Scripted transport
// ---------------------------------------------------------------------------

enum Reply {
    Bytes(Vec<u8>),
    Fail(TransportError),
    /// Never answers; the call runs into its deadline.
    Hang,
}

struct Call {
    endpoint: String,
    method: String,
    request: Vec<u8>,
}

#[derive(Default)]
struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<Call>>,
    down: Mutex<HashSet<String>>,
}

impl ScriptedTransport {
    fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        })
    }

    fn push(&self, replies: impl IntoIterator<Item = Reply>) {
        self.replies.lock().extend(replies);
    }

    fn take_down(&self, endpoint: &str) {
        self.down.lock().insert(endpoint.to_string());
    }

    fn bring_up(&self, endpoint: &str) {
        self.down.lock().remove(endpoint);
    }

    fn endpoints(&self) -> Vec<String> {
        self.calls.lock().iter().map(|call| call.endpoint.clone()).collect()
    }

    fn calls(&self) -> usize {
        self.calls.lock().len()
    }

    fn request(&self, index: usize) -> Vec<u8> {
        self.calls.lock()[index].request.clone()
    }

    fn method(&self, index: usize) -> String {
        self.calls.lock()[index].method.clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        endpoint: &Endpoint,
        method: &str,
        request: Vec<u8>,
        _deadline: Instant,
    ) -> Result<Vec<u8>, TransportError> {
        let endpoint = endpoint.to_string();
        let down = self.down.lock().contains(&endpoint);
        self.calls.lock().push(Call {
            endpoint,
            method: method.to_string(),
            request,
        });
        if down {
            return Err(TransportError::ConnectionRefused);
        }
        let reply = self.replies.lock().pop_front();
        match reply {
            Some(Reply::Bytes(bytes)) => Ok(bytes),
            Some(Reply::Fail(err)) => Err(err),
            Some(Reply::Hang) => std::future::pending().await,
            None => Err(TransportError::Unavailable("script exhausted".into())),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const PAYER: AccountId = AccountId::new(0, 0, 1001);
const NODE: AccountId = AccountId::new(0, 0, 3);
const OTHER_NODE: AccountId = AccountId::new(0, 0, 4);
const NODE_ADDRESS: &str = "127.0.0.1:50211";
const OTHER_NODE_ADDRESS: &str = "127.0.0.1:50212";

fn client(transport: &Arc<ScriptedTransport>) -> (Client, PrivateKey) {
    let client = Client::for_network([("127.0.0.1:50211", NODE)]).unwrap();
    let key = PrivateKey::generate_ed25519();
    client.set_transport(transport.clone());
    client.set_operator(PAYER, key.clone());
    client.set_backoff(BackoffConfig {
        request_timeout: Duration::from_secs(2),
        ..BackoffConfig::default()
    });
    (client, key)
}

/// Two nodes, both healthy.
fn two_node_client(transport: &Arc<ScriptedTransport>) -> Client {
    let client =
        Client::for_network([(NODE_ADDRESS, NODE), (OTHER_NODE_ADDRESS, OTHER_NODE)]).unwrap();
    client.set_transport(transport.clone());
    client.set_operator(PAYER, PrivateKey::generate_ed25519());
    client.set_backoff(BackoffConfig {
        request_timeout: Duration::from_secs(2),
        ..BackoffConfig::default()
    });
    client
}

fn address_of(node: AccountId) -> &'static str {
    if node == NODE {
        NODE_ADDRESS
    } else {
        OTHER_NODE_ADDRESS
    }
}

fn precheck(status: Status) -> Reply {
    Reply::Bytes(
        services::TransactionResponse {
            node_transaction_precheck_code: status.code(),
            cost: 0,
        }
        .encode_to_vec(),
    )
}

fn ok_header() -> Option<services::ResponseHeader> {
    Some(services::ResponseHeader {
        node_transaction_precheck_code: Status::Ok.code(),
        ..Default::default()
    })
}

fn receipt(status: Status) -> Reply {
    Reply::Bytes(
        services::Response {
            response: Some(services::response::Response::TransactionGetReceipt(
                services::TransactionGetReceiptResponse {
                    header: ok_header(),
                    receipt: Some(services::TransactionReceipt {
                        status: status.code(),
                        ..Default::default()
                    }),
                },
            )),
        }
        .encode_to_vec(),
    )
}

fn record_response(
    header: Option<services::ResponseHeader>,
    record: Option<services::TransactionRecord>,
) -> Reply {
    Reply::Bytes(
        services::Response {
            response: Some(services::response::Response::TransactionGetRecord(
                services::TransactionGetRecordResponse {
                    header,
                    transaction_record: record,
                },
            )),
        }
        .encode_to_vec(),
    )
}

fn cost(tinybars: u64) -> Reply {
    record_response(
        Some(services::ResponseHeader {
            node_transaction_precheck_code: Status::Ok.code(),
            response_type: services::RESPONSE_TYPE_COST_ANSWER,
            cost: tinybars,
        }),
        None,
    )
}

fn transfer(client: &Client) -> FrozenTransaction<TransferData> {
    TransferTransaction::new()
        .hbar_transfer(PAYER, Hbar::new(-1))
        .hbar_transfer(AccountId::new(0, 0, 1002), Hbar::new(1))
        .freeze_with(client)
        .unwrap()
}

fn transfer_via(client: &Client, nodes: &[AccountId]) -> FrozenTransaction<TransferData> {
    TransferTransaction::new()
        .hbar_transfer(PAYER, Hbar::new(-1))
        .hbar_transfer(AccountId::new(0, 0, 1002), Hbar::new(1))
        .node_account_ids(nodes.iter().copied())
        .freeze_with(client)
        .unwrap()
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn transport_failures_are_retried_with_identical_bytes() {
    let transport = ScriptedTransport::new([
        Reply::Fail(TransportError::ConnectionRefused),
        Reply::Fail(TransportError::Unavailable("draining".into())),
        precheck(Status::Ok),
    ]);
    let (client, _) = client(&transport);
    let tx = transfer(&client);

    let response = tx.execute(&client).await.unwrap();

    assert_eq!(response.attempts, 3);
    assert_eq!(response.node_account_id, NODE);
    assert_eq!(response.transaction_id, tx.transaction_id());
    assert_eq!(response.transaction_hash, tx.transaction_hash().unwrap().to_vec());
    assert_eq!(transport.calls(), 3);
    assert_eq!(transport.request(0), transport.request(2));
    assert_eq!(transport.method(0), "proto.CryptoService/cryptoTransfer");
    assert_eq!(transport.calls.lock()[0].endpoint, "127.0.0.1:50211");
    assert!(tx.is_submitted());
}

#[tokio::test(start_paused = true)]
async fn fatal_precheck_is_not_retried() {
    let transport = ScriptedTransport::new([precheck(Status::InsufficientPayerBalance)]);
    let (client, _) = client(&transport);
    let tx = transfer(&client);

    let err = tx.execute(&client).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Rejected {
            status: Status::InsufficientPayerBalance,
            ..
        }
    ));
    assert_eq!(transport.calls(), 1);
    assert!(!tx.is_submitted());
}

#[tokio::test(start_paused = true)]
async fn busy_nodes_exhaust_the_attempt_budget() {
    let transport = ScriptedTransport::new((0..10).map(|_| precheck(Status::Busy)));
    let (client, _) = client(&transport);
    client.set_backoff(BackoffConfig {
        max_attempts: 3,
        ..client.backoff()
    });
    let tx = transfer(&client);

    let err = tx.execute(&client).await.unwrap_err();

    let Error::MaxAttemptsExceeded { attempts, last } = err else {
        panic!("expected MaxAttemptsExceeded, got {err:?}");
    };
    assert_eq!(attempts, 3);
    assert!(matches!(*last, Error::Rejected { status: Status::Busy, .. }));
    assert_eq!(transport.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn last_failed_attempt_does_not_wait_out_a_backoff() {
    let transport = ScriptedTransport::new((0..3).map(|_| precheck(Status::Busy)));
    let (client, _) = client(&transport);
    client.set_backoff(BackoffConfig {
        max_attempts: 3,
        min_backoff: Duration::from_secs(1),
        max_backoff: Duration::from_secs(60),
        ..client.backoff()
    });
    let tx = transfer(&client);
    let started = Instant::now();

    let err = tx.execute(&client).await.unwrap_err();

    assert!(matches!(err, Error::MaxAttemptsExceeded { attempts: 3, .. }));
    assert_eq!(transport.calls(), 3);
    // 1s after the first failure, 2s after the second, nothing after the last.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(3), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(4), "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn concurrent_execution_is_refused() {
    let transport = ScriptedTransport::new([Reply::Hang, precheck(Status::Ok)]);
    let (client, _) = client(&transport);
    let tx = transfer(&client);

    let (first, second) = tokio::join!(tx.execute(&client), tx.execute(&client));

    assert!(first.is_ok());
    assert!(matches!(second, Err(Error::IllegalState(_))));
    assert!(matches!(tx.execute(&client).await, Err(Error::IllegalState(_))));
}

#[tokio::test(start_paused = true)]
async fn failed_execution_can_be_retried() {
    let transport = ScriptedTransport::new([
        precheck(Status::InvalidSignature),
        precheck(Status::Ok),
    ]);
    let (client, _) = client(&transport);
    let tx = transfer(&client);

    assert!(tx.execute(&client).await.is_err());
    assert!(tx.execute(&client).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn chunks_are_submitted_in_order() {
    let transport = ScriptedTransport::new((0..3).map(|_| precheck(Status::Ok)));
    let (client, _) = client(&transport);
    let tx = TopicMessageSubmitTransaction::new()
        .topic_id(TopicId::new(0, 0, 77))
        .message(vec![b'x'; 2500])
        .freeze_with(&client)
        .unwrap();

    let responses = tx.execute_all(&client).await.unwrap();

    assert_eq!(responses.len(), 3);
    let initial = tx.transaction_id();
    let starts: Vec<i128> = responses
        .iter()
        .map(|response| response.transaction_id.valid_start.to_unix_nanos())
        .collect();
    let base = initial.valid_start.to_unix_nanos();
    assert_eq!(starts, [base, base + 1, base + 2]);
    assert_eq!(transport.method(2), "proto.ConsensusService/submitMessage");
}

#[tokio::test(start_paused = true)]
async fn global_timeout_bounds_execution() {
    let transport = ScriptedTransport::new((0..10).map(|_| Reply::Hang));
    let (client, _) = client(&transport);
    let tx = transfer(&client);

    let err = tx
        .execute_with_timeout(&client, Duration::from_secs(5))
        .await
        .unwrap_err();

    let Error::Timeout { elapsed, last } = err else {
        panic!("expected Timeout, got {err:?}");
    };
    assert!(elapsed <= Duration::from_secs(5));
    assert!(matches!(last.as_deref(), Some(Error::Transport(TransportError::Timeout))));
}

#[tokio::test(start_paused = true)]
async fn cancellation_aborts_and_releases_the_transaction() {
    let transport = ScriptedTransport::new([Reply::Hang, precheck(Status::Ok)]);
    let (client, _) = client(&transport);
    let tx = transfer(&client);
    let (cancel, cancelled) = watch::channel(false);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        let _ = cancel.send(true);
    });
    let err = tx.execute_with_cancel(&client, cancelled).await.unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert!(!tx.is_submitted());
    assert!(tx.execute(&client).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn checksum_mismatch_stops_before_sending() {
    let transport = ScriptedTransport::new([precheck(Status::Ok)]);
    let (client, _) = client(&transport);
    client.set_ledger_id(Some(LedgerId::testnet()));
    let mainnet_account: AccountId = "0.0.123-vfmkw".parse().unwrap();
    let tx = TransferTransaction::new()
        .hbar_transfer(PAYER, Hbar::new(-1))
        .hbar_transfer(mainnet_account, Hbar::new(1))
        .freeze_with(&client)
        .unwrap();

    let err = tx.execute(&client).await.unwrap_err();

    assert!(matches!(err, Error::ChecksumMismatch { .. }));
    assert_eq!(transport.calls(), 0);

    client.set_auto_validate_checksums(false);
    assert!(tx.execute(&client).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn transaction_survives_a_trip_through_bytes() {
    let transport = ScriptedTransport::new([precheck(Status::Ok)]);
    let (client, _) = client(&transport);
    let original = transfer(&client);

    let restored = FrozenTransaction::<TransferData>::from_bytes(&original.to_bytes()).unwrap();
    let response = restored.execute(&client).await.unwrap();

    assert_eq!(response.transaction_id, original.transaction_id());
    assert_eq!(response.transaction_hash, original.transaction_hash().unwrap().to_vec());
}

// ---------------------------------------------------------------------------
// Node selection
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn transport_failure_fails_over_to_another_node() {
    for _ in 0..8 {
        let transport = ScriptedTransport::new([
            Reply::Fail(TransportError::ConnectionRefused),
            precheck(Status::Ok),
        ]);
        let client = two_node_client(&transport);
        let tx = transfer_via(&client, &[NODE, OTHER_NODE]);
        let started = Instant::now();

        let response = tx.execute(&client).await.unwrap();

        let endpoints = transport.endpoints();
        assert_eq!(endpoints.len(), 2);
        assert_ne!(endpoints[0], endpoints[1]);
        assert_eq!(endpoints[1], address_of(response.node_account_id));
        assert_eq!(transport.request(0), transport.request(1));
        // The second node had not been tried yet, so there was no backoff.
        assert!(started.elapsed() < client.backoff().min_backoff);

        let failed = if response.node_account_id == NODE { OTHER_NODE } else { NODE };
        let health = client.network().node(failed).unwrap().health();
        assert_eq!(health.consecutive_failures, 1);
    }
}

#[tokio::test(start_paused = true)]
async fn busy_node_is_skipped_for_the_next_attempt() {
    for _ in 0..8 {
        let transport = ScriptedTransport::new([precheck(Status::Busy), precheck(Status::Ok)]);
        let client = two_node_client(&transport);
        let tx = transfer_via(&client, &[NODE, OTHER_NODE]);

        let response = tx.execute(&client).await.unwrap();

        let endpoints = transport.endpoints();
        assert_eq!(endpoints.len(), 2);
        assert_ne!(endpoints[0], endpoints[1]);
        assert_eq!(response.attempts, 2);

        // Busy is congestion, not a broken node.
        let busy = if response.node_account_id == NODE { OTHER_NODE } else { NODE };
        assert_eq!(client.network().node(busy).unwrap().health().consecutive_failures, 0);
    }
}

#[tokio::test(start_paused = true)]
async fn unreachable_node_is_excluded_until_the_health_check() {
    let transport = Arc::new(ScriptedTransport::default());
    let client = two_node_client(&transport);
    client.set_backoff(BackoffConfig {
        max_attempts: 2,
        max_node_failures: 2,
        health_check_interval: Duration::from_secs(60),
        ..client.backoff()
    });
    transport.take_down(NODE_ADDRESS);

    // Two failed attempts against the only allowed node exclude it.
    let err = transfer_via(&client, &[NODE]).execute(&client).await.unwrap_err();
    assert!(matches!(err, Error::MaxAttemptsExceeded { attempts: 2, .. }));
    let excluded_at = Instant::now();
    let node = client.network().node(NODE).unwrap();
    assert!(!node.is_available(excluded_at));

    // While excluded, every submission that may use either node avoids it.
    let before = transport.calls();
    for _ in 0..6 {
        transport.push([precheck(Status::Ok)]);
        let response = transfer_via(&client, &[NODE, OTHER_NODE])
            .execute(&client)
            .await
            .unwrap();
        assert_eq!(response.node_account_id, OTHER_NODE);
        assert_eq!(response.attempts, 1);
    }
    assert!(transport.endpoints()[before..].iter().all(|ep| ep == OTHER_NODE_ADDRESS));

    // After the health-check interval the node is offered again and recovers.
    tokio::time::advance(Duration::from_secs(60)).await;
    assert!(node.is_available(Instant::now()));
    transport.bring_up(NODE_ADDRESS);
    transport.take_down(OTHER_NODE_ADDRESS);
    transport.push([precheck(Status::Ok)]);

    let response = transfer_via(&client, &[NODE, OTHER_NODE])
        .execute(&client)
        .await
        .unwrap();
    assert_eq!(response.node_account_id, NODE);
    assert_eq!(node.health().consecutive_failures, 0);
}

// ---------------------------------------------------------------------------
// Expiry
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn expired_transaction_gets_a_new_id() {
    let transport = ScriptedTransport::new([
        precheck(Status::TransactionExpired),
        precheck(Status::Ok),
    ]);
    let (client, _) = client(&transport);
    let tx = transfer(&client);
    let before = tx.transaction_id();

    let response = tx.execute(&client).await.unwrap();

    assert_ne!(response.transaction_id, before);
    assert_eq!(response.transaction_id.account_id, PAYER);
    assert_eq!(tx.transaction_id(), response.transaction_id);
    assert_ne!(transport.request(0), transport.request(1));
}

#[tokio::test(start_paused = true)]
async fn explicit_id_is_never_regenerated() {
    let transport = ScriptedTransport::new([precheck(Status::TransactionExpired)]);
    let (client, _) = client(&transport);
    let tx = TransferTransaction::new()
        .hbar_transfer(PAYER, Hbar::new(-1))
        .hbar_transfer(AccountId::new(0, 0, 1002), Hbar::new(1))
        .transaction_id(TransactionId::generate(PAYER))
        .freeze_with(&client)
        .unwrap();

    let err = tx.execute(&client).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Rejected {
            status: Status::TransactionExpired,
            ..
        }
    ));
    assert_eq!(transport.calls(), 1);
}

// ---------------------------------------------------------------------------
// Receipts and records
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn receipt_is_polled_until_known() {
    let transport = ScriptedTransport::new([
        precheck(Status::Ok),
        receipt(Status::Unknown),
        receipt(Status::Unknown),
        receipt(Status::Success),
    ]);
    let (client, _) = client(&transport);
    let tx = transfer(&client);

    let receipt = tx
        .execute(&client)
        .await
        .unwrap()
        .get_receipt(&client)
        .await
        .unwrap();

    assert_eq!(receipt.status, Status::Success);
    assert_eq!(transport.calls(), 4);
    assert_eq!(transport.method(3), "proto.CryptoService/getTransactionReceipts");
}

#[tokio::test(start_paused = true)]
async fn failed_receipt_status_is_an_error_unless_disabled() {
    let transport = ScriptedTransport::new([
        precheck(Status::Ok),
        receipt(Status::InsufficientAccountBalance),
        receipt(Status::InsufficientAccountBalance),
    ]);
    let (client, _) = client(&transport);
    let response = transfer(&client).execute(&client).await.unwrap();

    let err = response.get_receipt(&client).await.unwrap_err();
    assert!(matches!(
        err,
        Error::ReceiptStatus {
            status: Status::InsufficientAccountBalance,
            ..
        }
    ));

    let receipt = response
        .validate_status(false)
        .get_receipt(&client)
        .await
        .unwrap();
    assert_eq!(receipt.status, Status::InsufficientAccountBalance);
}

#[tokio::test(start_paused = true)]
async fn record_query_pays_the_quoted_cost() {
    let id = TransactionId::generate(PAYER);
    let transport = ScriptedTransport::new([
        cost(500),
        record_response(
            ok_header(),
            Some(services::TransactionRecord {
                receipt: Some(services::TransactionReceipt {
                    status: Status::Success.code(),
                    ..Default::default()
                }),
                transaction_hash: vec![9; 48],
                transaction_id: Some(id.to_protobuf()),
                memo: "rent".into(),
                transaction_fee: 84_000,
                ..Default::default()
            }),
        ),
    ]);
    let (client, key) = client(&transport);

    let record = TransactionRecordQuery::new()
        .transaction_id(id)
        .node_account_ids([NODE])
        .execute(&client)
        .await
        .unwrap();

    assert_eq!(record.transaction_id, id);
    assert_eq!(record.memo, "rent");
    assert_eq!(record.transaction_fee, Hbar::from_tinybars(84_000));

    // The cost lookup is unpaid, the answer is paid with a signed transfer.
    let Some(services::query::Query::TransactionGetRecord(lookup)) =
        services::Query::decode(&*transport.request(0)).unwrap().query
    else {
        panic!("expected a record query");
    };
    let header = lookup.header.unwrap();
    assert_eq!(header.response_type, services::RESPONSE_TYPE_COST_ANSWER);
    assert!(header.payment.is_none());

    let Some(services::query::Query::TransactionGetRecord(paid)) =
        services::Query::decode(&*transport.request(1)).unwrap().query
    else {
        panic!("expected a record query");
    };
    let payment = paid.header.unwrap().payment.unwrap();
    let signed = services::SignedTransaction::decode(&*payment.signed_transaction_bytes).unwrap();
    let body = services::TransactionBody::decode(&*signed.body_bytes).unwrap();
    let Some(services::transaction_body::Data::CryptoTransfer(transfer)) = body.data else {
        panic!("expected a transfer");
    };
    let legs: Vec<(i64, i64)> = transfer
        .transfers
        .unwrap()
        .account_amounts
        .iter()
        .map(|leg| (leg.account_id.as_ref().unwrap().account_num, leg.amount))
        .collect();
    assert_eq!(legs, [(3, 500), (1001, -500)]);

    let sig_map = signed.sig_map.unwrap();
    assert_eq!(sig_map.sig_pair.len(), 1);
    assert_eq!(
        sig_map.sig_pair[0].pub_key_prefix,
        key.public_key().to_bytes_raw()
    );
}

#[tokio::test(start_paused = true)]
async fn record_cost_above_the_cap_is_refused() {
    let transport = ScriptedTransport::new([cost(300_000_000)]);
    let (client, _) = client(&transport);

    let err = TransactionRecordQuery::new()
        .transaction_id(TransactionId::generate(PAYER))
        .node_account_ids([NODE])
        .max_query_payment(Hbar::new(1))
        .execute(&client)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MaxQueryPaymentExceeded { .. }));
    assert_eq!(transport.calls(), 1);
}
