//! # Frozen Transactions
//!
//! Freezing fixes everything that goes into a body: the transaction ID,
//! the node list, the fee ceiling, the memo and the kind's payload. From
//! then on the only things that change are the signatures attached to each
//! body and the execution state.
//!
//! ```text
//!   chunk 0 ── node 3 ── SignedBody { body_bytes, signatures }
//!           └─ node 4 ── SignedBody { ... }
//!   chunk 1 ── node 3 ── SignedBody { ... }     transaction ID + 1ns
//!           └─ node 4 ── SignedBody { ... }
//! ```
//!
//! ## Execution state
//!
//! `Frozen → Executing → Submitted`, held in an `AtomicU8`. A second caller
//! that tries to execute while the first is running (or after it has
//! submitted) gets `IllegalState`. If no chunk was accepted the state falls
//! back to `Frozen` and the transaction may be executed again; that includes
//! the case where the executing future is dropped mid-flight.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use prost::Message;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info};

use super::chunk::ChunkInfo;
use super::data::TransactionData;
use super::id::TransactionId;
use super::response::TransactionResponse;
use super::signing::SignedBody;
use crate::client::Client;
use crate::crypto::{sha384, PrivateKey, PublicKey, Signature};
use crate::entity::AccountId;
use crate::error::{Error, Result};
use crate::execute::{self, Execute, Outcome};
use crate::hbar::Hbar;
use crate::proto::{required, services, FromProtobuf, ToProtobuf};
use crate::status::Status;

const FROZEN: u8 = 0;
const EXECUTING: u8 = 1;
const SUBMITTED: u8 = 2;

/// Fields every kind shares, fixed at freeze time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TransactionCommon {
    pub max_transaction_fee: Hbar,
    pub valid_duration: Duration,
    pub memo: String,
    pub regenerate_transaction_id: bool,
}

#[derive(Debug, Clone)]
struct FrozenChunk {
    info: ChunkInfo,
    /// One body per node, in the transaction's node order.
    bodies: Vec<(AccountId, SignedBody)>,
}

impl FrozenChunk {
    fn body(&self, node: AccountId) -> Option<&SignedBody> {
        self.bodies
            .iter()
            .find(|(id, _)| *id == node)
            .map(|(_, body)| body)
    }

    fn sign(&mut self, key: &PrivateKey) {
        for (_, body) in &mut self.bodies {
            body.signatures.sign(key, &body.body_bytes);
        }
    }
}

#[derive(Debug)]
struct Chain {
    transaction_id: TransactionId,
    chunks: Vec<FrozenChunk>,
}

/// A transaction ready to be signed and submitted.
#[derive(Debug)]
pub struct FrozenTransaction<D> {
    data: D,
    common: TransactionCommon,
    explicit_transaction_id: bool,
    node_account_ids: Vec<AccountId>,
    /// Only rewritten when an expired ID is regenerated.
    chain: RwLock<Chain>,
    /// Keys held by this transaction, replayed after regeneration.
    signers: Vec<PrivateKey>,
    /// Set once a signature produced elsewhere has been attached.
    foreign_signatures: bool,
    state: AtomicU8,
}

impl<D: TransactionData> FrozenTransaction<D> {
    pub(crate) fn build(
        data: D,
        common: TransactionCommon,
        transaction_id: TransactionId,
        explicit_transaction_id: bool,
        node_account_ids: Vec<AccountId>,
        total_chunks: usize,
    ) -> Self {
        let chunks = (0..total_chunks)
            .map(|index| {
                let info = ChunkInfo::new(index, total_chunks, transaction_id);
                build_chunk(&data, &common, &node_account_ids, info)
            })
            .collect();

        Self {
            data,
            common,
            explicit_transaction_id,
            node_account_ids,
            chain: RwLock::new(Chain {
                transaction_id,
                chunks,
            }),
            signers: Vec::new(),
            foreign_signatures: false,
            state: AtomicU8::new(FROZEN),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn data(&self) -> &D {
        &self.data
    }

    /// The chain's initial transaction ID. Changes only if an expired ID was
    /// regenerated during execution.
    pub fn transaction_id(&self) -> TransactionId {
        self.chain.read().transaction_id
    }

    pub fn node_account_ids(&self) -> &[AccountId] {
        &self.node_account_ids
    }

    pub fn max_transaction_fee(&self) -> Hbar {
        self.common.max_transaction_fee
    }

    pub fn transaction_valid_duration(&self) -> Duration {
        self.common.valid_duration
    }

    pub fn transaction_memo(&self) -> &str {
        &self.common.memo
    }

    /// One entry per chunk, in submission order.
    pub fn chunk_infos(&self) -> Vec<ChunkInfo> {
        self.chain.read().chunks.iter().map(|chunk| chunk.info).collect()
    }

    /// Every body that needs signing, tagged with its chunk and node.
    pub fn body_bytes(&self) -> Vec<(ChunkInfo, Vec<u8>)> {
        self.chain
            .read()
            .chunks
            .iter()
            .flat_map(|chunk| {
                chunk
                    .bodies
                    .iter()
                    .map(|(node, body)| (chunk.info.with_node(*node), body.body_bytes.clone()))
            })
            .collect()
    }

    /// Keys that have signed at least one body.
    pub fn public_keys(&self) -> BTreeSet<PublicKey> {
        self.chain
            .read()
            .chunks
            .iter()
            .flat_map(|chunk| chunk.bodies.iter())
            .flat_map(|(_, body)| body.signatures.public_keys().copied())
            .collect()
    }

    /// SHA-384 of the first chunk's signed bytes for the first node.
    pub fn transaction_hash(&self) -> Result<[u8; 48]> {
        let chain = self.chain.read();
        let (_, body) = chain
            .chunks
            .first()
            .and_then(|chunk| chunk.bodies.first())
            .ok_or_else(|| Error::illegal_state("transaction has no bodies"))?;
        Ok(sha384(&body.signed_transaction_bytes()))
    }

    /// First-chunk hash per node. Each node gets its own body, so each gets
    /// its own hash.
    pub fn transaction_hashes(&self) -> BTreeMap<AccountId, [u8; 48]> {
        let chain = self.chain.read();
        chain
            .chunks
            .first()
            .map(|chunk| {
                chunk
                    .bodies
                    .iter()
                    .map(|(node, body)| (*node, sha384(&body.signed_transaction_bytes())))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_submitted(&self) -> bool {
        self.state.load(Ordering::Acquire) == SUBMITTED
    }

    /// The first chunk's signed envelope for `node`. Used to attach query
    /// payments.
    pub(crate) fn envelope_for(&self, node: AccountId) -> Option<services::Transaction> {
        let chain = self.chain.read();
        chain.chunks.first()?.body(node).map(SignedBody::to_protobuf)
    }

    // -----------------------------------------------------------------------
    // Signing
    // -----------------------------------------------------------------------

    /// Signs every body of every chunk with `key`. Signing again with the
    /// same key replaces the earlier signatures.
    pub fn sign(&mut self, key: &PrivateKey) -> Result<()> {
        self.ensure_not_submitted()?;
        for chunk in &mut self.chain.get_mut().chunks {
            chunk.sign(key);
        }
        let public_key = key.public_key();
        if !self.signers.iter().any(|held| held.public_key() == public_key) {
            self.signers.push(key.clone());
        }
        Ok(())
    }

    /// Builder-style [`sign`](Self::sign).
    pub fn sign_with(mut self, key: &PrivateKey) -> Result<Self> {
        self.sign(key)?;
        Ok(self)
    }

    /// Attaches a signature produced elsewhere to the only body of a
    /// single-chunk, single-node transaction.
    pub fn add_signature(&mut self, public_key: PublicKey, signature: Signature) -> Result<()> {
        let node = match self.node_account_ids.as_slice() {
            [node] => *node,
            _ => {
                return Err(Error::illegal_state(
                    "add_signature needs exactly one node; use add_signature_for",
                ))
            }
        };
        if self.chain.get_mut().chunks.len() != 1 {
            return Err(Error::illegal_state(
                "add_signature needs a single chunk; use add_signature_for",
            ));
        }
        self.add_signature_for(0, node, public_key, signature)
    }

    /// Attaches a signature produced elsewhere to the body of chunk `chunk`
    /// addressed to `node`. The signature is verified against that body.
    pub fn add_signature_for(
        &mut self,
        chunk: usize,
        node: AccountId,
        public_key: PublicKey,
        signature: Signature,
    ) -> Result<()> {
        self.ensure_not_submitted()?;
        let body = self
            .chain
            .get_mut()
            .chunks
            .get_mut(chunk)
            .and_then(|chunk| chunk.bodies.iter_mut().find(|(id, _)| *id == node))
            .map(|(_, body)| body)
            .ok_or_else(|| {
                Error::illegal_state(format!("no body for chunk {chunk}, node {node}"))
            })?;
        body.signatures
            .insert_verified(public_key, signature, &body.body_bytes)?;
        self.foreign_signatures = true;
        Ok(())
    }

    fn ensure_not_submitted(&self) -> Result<()> {
        if self.is_submitted() {
            return Err(Error::illegal_state("transaction has already been submitted"));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    /// Every chunk and node envelope as a `TransactionList`, chunk-major.
    pub fn to_bytes(&self) -> Vec<u8> {
        let chain = self.chain.read();
        let transaction_list = chain
            .chunks
            .iter()
            .flat_map(|chunk| chunk.bodies.iter().map(|(_, body)| body.to_protobuf()))
            .collect();
        services::TransactionList { transaction_list }.encode_to_vec()
    }

    /// Restores a transaction written by [`to_bytes`](Self::to_bytes), with
    /// its signatures. Every signature is verified, and the bodies must form
    /// a consistent chain over one node list.
    ///
    /// The restored ID counts as explicit, so it is never regenerated.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let list = services::TransactionList::decode(bytes)?;
        if list.transaction_list.is_empty() {
            return Err(Error::decode("transaction list is empty"));
        }

        let mut groups: BTreeMap<TransactionId, Vec<DecodedBody>> = BTreeMap::new();
        for envelope in list.transaction_list {
            let decoded = DecodedBody::decode(envelope)?;
            groups.entry(decoded.transaction_id).or_default().push(decoded);
        }

        let total = groups.len();
        let initial = *groups
            .keys()
            .next()
            .ok_or_else(|| Error::decode("transaction list is empty"))?;
        let node_account_ids: Vec<AccountId> = groups
            .values()
            .next()
            .map(|bodies| bodies.iter().map(|body| body.node).collect())
            .unwrap_or_default();
        if node_account_ids.iter().collect::<BTreeSet<_>>().len() != node_account_ids.len() {
            return Err(Error::decode("a chunk lists the same node twice"));
        }

        let mut common: Option<TransactionCommon> = None;
        let mut chunks = Vec::with_capacity(total);
        let mut chunk_data = Vec::with_capacity(total);
        for (index, (transaction_id, bodies)) in groups.into_iter().enumerate() {
            if transaction_id != initial.offset_nanos(index) {
                return Err(Error::decode("chunk transaction IDs are not consecutive"));
            }
            let nodes: Vec<AccountId> = bodies.iter().map(|body| body.node).collect();
            if nodes != node_account_ids {
                return Err(Error::decode("chunks are addressed to different nodes"));
            }

            let mut signed = Vec::with_capacity(bodies.len());
            for (position, body) in bodies.into_iter().enumerate() {
                match &common {
                    None => common = Some(body.common),
                    Some(existing) if *existing != body.common => {
                        return Err(Error::decode("bodies disagree on fee, duration or memo"));
                    }
                    Some(_) => {}
                }
                if position == 0 {
                    chunk_data.push(body.data);
                }
                signed.push((body.node, body.signed));
            }
            chunks.push(FrozenChunk {
                info: ChunkInfo::new(index, total, initial),
                bodies: signed,
            });
        }

        let data = D::from_body_data(chunk_data)?;
        let common = common.ok_or_else(|| Error::decode("transaction list is empty"))?;
        let foreign_signatures = chunks
            .iter()
            .flat_map(|chunk| chunk.bodies.iter())
            .any(|(_, body)| !body.signatures.is_empty());

        Ok(Self {
            data,
            common,
            explicit_transaction_id: true,
            node_account_ids,
            chain: RwLock::new(Chain {
                transaction_id: initial,
                chunks,
            }),
            signers: Vec::new(),
            foreign_signatures,
            state: AtomicU8::new(FROZEN),
        })
    }

    // -----------------------------------------------------------------------
    // Execution
    // -----------------------------------------------------------------------

    /// Submits every chunk and returns the first chunk's response.
    pub async fn execute(&self, client: &Client) -> Result<TransactionResponse> {
        first(self.run(client, None, None).await?)
    }

    /// Submits every chunk, in order, and returns one response per chunk.
    pub async fn execute_all(&self, client: &Client) -> Result<Vec<TransactionResponse>> {
        self.run(client, None, None).await
    }

    /// [`execute`](Self::execute) under a caller-chosen global deadline
    /// instead of the client's execution timeout.
    pub async fn execute_with_timeout(
        &self,
        client: &Client,
        timeout: Duration,
    ) -> Result<TransactionResponse> {
        first(self.run(client, Some(timeout), None).await?)
    }

    /// [`execute_all`](Self::execute_all), aborted with `Cancelled` as soon
    /// as `cancel` reads `true`.
    pub async fn execute_with_cancel(
        &self,
        client: &Client,
        cancel: watch::Receiver<bool>,
    ) -> Result<Vec<TransactionResponse>> {
        self.run(client, None, Some(cancel)).await
    }

    async fn run(
        &self,
        client: &Client,
        timeout: Option<Duration>,
        cancel: Option<watch::Receiver<bool>>,
    ) -> Result<Vec<TransactionResponse>> {
        let mut guard = ExecutionGuard::acquire(&self.state)?;

        let mut entity_ids = self.data.entity_ids();
        entity_ids.push(self.transaction_id().account_id.entity_id());
        entity_ids.extend(self.node_account_ids.iter().map(AccountId::entity_id));
        client.validate_checksums(entity_ids)?;

        let deadline = Instant::now() + timeout.unwrap_or(client.backoff().execution_timeout);
        let total = self.chain.read().chunks.len();
        let can_regenerate = total == 1
            && !self.explicit_transaction_id
            && self.common.regenerate_transaction_id
            && !self.foreign_signatures;

        let mut responses = Vec::with_capacity(total);
        for index in 0..total {
            let chunk = self
                .chain
                .read()
                .chunks
                .get(index)
                .cloned()
                .ok_or_else(|| Error::illegal_state(format!("chunk {index} disappeared")))?;
            debug!(
                transaction_id = %chunk.info.current_transaction_id,
                chunk = index + 1,
                total,
                "submitting chunk"
            );

            let mut request = ChunkRequest {
                tx: self,
                chunk,
                can_regenerate,
                regenerated: false,
            };
            let executed =
                execute::execute(client, &mut request, deadline, cancel.clone()).await?;
            guard.submitted();

            if request.regenerated {
                let mut chain = self.chain.write();
                chain.transaction_id = request.chunk.info.initial_transaction_id;
                if let Some(slot) = chain.chunks.get_mut(index) {
                    *slot = request.chunk;
                }
            }

            responses.push(TransactionResponse {
                node_account_id: executed.node_account_id,
                transaction_id: executed.output.transaction_id,
                transaction_hash: executed.output.hash.to_vec(),
                attempts: executed.attempts,
                validate_status: true,
            });
        }

        info!(
            transaction_id = %self.transaction_id(),
            chunks = total,
            "transaction submitted"
        );
        Ok(responses)
    }
}

fn first(responses: Vec<TransactionResponse>) -> Result<TransactionResponse> {
    responses
        .into_iter()
        .next()
        .ok_or_else(|| Error::illegal_state("transaction has no chunks"))
}

fn build_chunk<D: TransactionData>(
    data: &D,
    common: &TransactionCommon,
    nodes: &[AccountId],
    info: ChunkInfo,
) -> FrozenChunk {
    let bodies = nodes
        .iter()
        .map(|node| {
            let body = services::TransactionBody {
                transaction_id: Some(info.current_transaction_id.to_protobuf()),
                node_account_id: Some(node.to_protobuf()),
                transaction_fee: common.max_transaction_fee.to_tinybars() as u64,
                transaction_valid_duration: Some(services::Duration {
                    seconds: common.valid_duration.as_secs() as i64,
                }),
                memo: common.memo.clone(),
                data: Some(data.to_body_data(&info.with_node(*node))),
            };
            (*node, SignedBody::new(body.encode_to_vec()))
        })
        .collect();
    FrozenChunk { info, bodies }
}

/// One envelope from a `TransactionList`, unpacked.
struct DecodedBody {
    transaction_id: TransactionId,
    node: AccountId,
    common: TransactionCommon,
    data: services::transaction_body::Data,
    signed: SignedBody,
}

impl DecodedBody {
    fn decode(envelope: services::Transaction) -> Result<Self> {
        let signed = SignedBody::from_protobuf(envelope)?;
        signed.verify()?;

        let services::TransactionBody {
            transaction_id,
            node_account_id,
            transaction_fee,
            transaction_valid_duration,
            memo,
            data,
        } = services::TransactionBody::decode(signed.body_bytes.as_slice())?;

        let duration = required(transaction_valid_duration, "transactionValidDuration")?;
        Ok(Self {
            transaction_id: TransactionId::from_protobuf(required(
                transaction_id,
                "transactionID",
            )?)?,
            node: AccountId::from_protobuf(required(node_account_id, "nodeAccountID")?)?,
            common: TransactionCommon {
                max_transaction_fee: Hbar::from_tinybars(transaction_fee as i64),
                valid_duration: Duration::from_secs(duration.seconds.max(0) as u64),
                memo,
                regenerate_transaction_id: false,
            },
            data: required(data, "data")?,
            signed,
        })
    }
}

/// Releases the execution state on drop: back to `Frozen` unless a chunk
/// made it through.
struct ExecutionGuard<'a> {
    state: &'a AtomicU8,
    release_to: u8,
}

impl<'a> ExecutionGuard<'a> {
    fn acquire(state: &'a AtomicU8) -> Result<Self> {
        match state.compare_exchange(FROZEN, EXECUTING, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => Ok(Self {
                state,
                release_to: FROZEN,
            }),
            Err(SUBMITTED) => Err(Error::illegal_state("transaction has already been submitted")),
            Err(_) => Err(Error::illegal_state("transaction is already being executed")),
        }
    }

    fn submitted(&mut self) {
        self.release_to = SUBMITTED;
    }
}

impl Drop for ExecutionGuard<'_> {
    fn drop(&mut self) {
        self.state.store(self.release_to, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// Chunk submission
// ---------------------------------------------------------------------------

struct ChunkAccepted {
    transaction_id: TransactionId,
    hash: [u8; 48],
}

/// Submission of one chunk, retried across its nodes with the same bytes.
struct ChunkRequest<'a, D> {
    tx: &'a FrozenTransaction<D>,
    chunk: FrozenChunk,
    can_regenerate: bool,
    regenerated: bool,
}

impl<D: TransactionData> Execute for ChunkRequest<'_, D> {
    type Output = ChunkAccepted;

    fn node_account_ids(&self) -> Option<&[AccountId]> {
        Some(&self.tx.node_account_ids)
    }

    fn method(&self) -> &'static str {
        self.tx.data.method()
    }

    fn make_request(&self, node: AccountId) -> Result<Vec<u8>> {
        let body = self
            .chunk
            .body(node)
            .ok_or_else(|| Error::illegal_state(format!("no body addressed to node {node}")))?;
        Ok(body.to_protobuf().encode_to_vec())
    }

    fn classify(&self, node: AccountId, response: &[u8]) -> Outcome<ChunkAccepted> {
        let transaction_id = self.chunk.info.current_transaction_id;
        let response = match services::TransactionResponse::decode(response) {
            Ok(response) => response,
            Err(err) => return Outcome::Fatal(err.into()),
        };
        let status = Status::from_code(response.node_transaction_precheck_code);
        let rejected = Error::Rejected {
            status,
            transaction_id: Some(transaction_id),
        };

        match status {
            Status::Ok => match self.chunk.body(node) {
                Some(body) => Outcome::Done(ChunkAccepted {
                    transaction_id,
                    hash: sha384(&body.signed_transaction_bytes()),
                }),
                None => Outcome::Fatal(Error::illegal_state(format!(
                    "accepted by node {node} that has no body"
                ))),
            },
            status if status.is_transient() => Outcome::Busy(rejected),
            Status::TransactionExpired => Outcome::Expired(rejected),
            _ => Outcome::Fatal(rejected),
        }
    }

    fn regenerate(&mut self) -> bool {
        if !self.can_regenerate {
            return false;
        }
        let payer = self.chunk.info.initial_transaction_id.account_id;
        let info = ChunkInfo::single(TransactionId::generate(payer));
        let tx = self.tx;
        let mut chunk = build_chunk(&tx.data, &tx.common, &tx.node_account_ids, info);
        for key in &self.tx.signers {
            chunk.sign(key);
        }
        self.chunk = chunk;
        self.regenerated = true;
        true
    }
}
