//! RPC request handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sigrelay_node::{PendingEntry, RelayerContext, Submission};
use sigrelay_store::VoteFilter;
use sigrelay_types::{
    parse_address, parse_u256, Address, RawDelegation, RawVote, RecordPayload, SubmissionRecord,
    B256,
};
use tracing::debug;

use crate::error::ApiError;

pub type AppState = Arc<RelayerContext>;

// ── Probes ───────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct CanDelegateQuery {
    pub address: Option<String>,
    pub delegatee: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanVoteQuery {
    pub address: Option<String>,
    pub proposal_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CanProposeQuery {
    pub address: Option<String>,
}

pub async fn can_delegate(
    State(ctx): State<AppState>,
    Query(query): Query<CanDelegateQuery>,
) -> Result<Json<Value>, ApiError> {
    let address = parse_address("address", query.address.as_deref())?;
    let delegatee = match query.delegatee.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(raw) => Some(parse_address("delegatee", Some(raw))?),
        None => None,
    };
    ctx.can_delegate(address, delegatee).await?;
    Ok(Json(json!({})))
}

pub async fn can_vote(
    State(ctx): State<AppState>,
    Query(query): Query<CanVoteQuery>,
) -> Result<Json<Value>, ApiError> {
    let address = parse_address("address", query.address.as_deref())?;
    let proposal_id = parse_u256("proposalId", query.proposal_id.as_deref())?;
    ctx.can_vote(address, proposal_id).await?;
    Ok(Json(json!({})))
}

pub async fn can_propose(
    State(ctx): State<AppState>,
    Query(query): Query<CanProposeQuery>,
) -> Result<Json<Value>, ApiError> {
    let address = parse_address("address", query.address.as_deref())?;
    ctx.can_propose(address).await?;
    Ok(Json(json!({})))
}

// ── Submission ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub id: u64,
    pub executed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<B256>,
}

impl From<Submission> for SubmissionResponse {
    fn from(s: Submission) -> Self {
        Self {
            id: s.id,
            executed: s.executed,
            tx_hash: s.tx_hash,
        }
    }
}

pub async fn submit_vote(
    State(ctx): State<AppState>,
    body: Result<Json<RawVote>, JsonRejection>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let Json(raw) = body.map_err(reject_body)?;
    let submission = ctx.validator().submit_vote(raw).await?;
    Ok(Json(submission.into()))
}

pub async fn submit_delegation(
    State(ctx): State<AppState>,
    body: Result<Json<RawDelegation>, JsonRejection>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let Json(raw) = body.map_err(reject_body)?;
    let submission = ctx.validator().submit_delegation(raw).await?;
    Ok(Json(submission.into()))
}

fn reject_body(rejection: JsonRejection) -> ApiError {
    debug!(error = %rejection, "unreadable request body");
    ApiError::unprocessable(rejection.body_text())
}

// ── Listings ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotesQuery {
    pub proposal_id: Option<String>,
    pub address: Option<String>,
    pub executed: Option<String>,
}

impl VotesQuery {
    /// A zero proposal id counts as absent.
    pub fn to_filter(&self) -> Result<VoteFilter, ApiError> {
        let proposal_id = match self.proposal_id.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(raw) => Some(parse_u256("proposalId", Some(raw))?).filter(|id| !id.is_zero()),
            None => None,
        };
        let address = match self.address.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(raw) => Some(parse_address("address", Some(raw))?),
            None => None,
        };
        let executed = self.executed.as_deref().map(|raw| raw == "true");
        Ok(VoteFilter {
            proposal_id,
            address,
            executed,
        })
    }
}

/// A stored record as listed by `/votes` and `/pending`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordView {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub from: String,
    #[serde(flatten)]
    pub payload: PayloadView,
    pub v: u8,
    pub r: B256,
    pub s: B256,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<B256>,
    /// Current vote weight of the sender; only on `/pending`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub votes: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PayloadView {
    #[serde(rename_all = "camelCase")]
    Vote { proposal_id: String, support: u8 },
    Delegate {
        delegatee: String,
        nonce: String,
        expiry: u64,
    },
}

impl RecordView {
    fn from_record(record: &SubmissionRecord) -> Self {
        let payload = match &record.payload {
            RecordPayload::Vote {
                proposal_id,
                support,
            } => PayloadView::Vote {
                proposal_id: proposal_id.to_string(),
                support: support.as_u8(),
            },
            RecordPayload::Delegate {
                delegatee,
                nonce,
                expiry,
            } => PayloadView::Delegate {
                delegatee: lower_hex(delegatee),
                nonce: nonce.to_string(),
                expiry: *expiry,
            },
        };
        Self {
            kind: record.kind().as_str(),
            from: lower_hex(&record.from),
            payload,
            v: record.signature.v,
            r: record.signature.r,
            s: record.signature.s,
            executed: Some(record.executed),
            tx_hash: record.tx_hash,
            votes: None,
        }
    }

    /// `/pending` drops `executed` (always false) and adds the weight when
    /// it could be read.
    fn pending(entry: &PendingEntry) -> Self {
        Self {
            executed: None,
            votes: entry.votes.map(|votes| votes.to_string()),
            ..Self::from_record(&entry.record)
        }
    }
}

fn lower_hex(address: &Address) -> String {
    format!("{address:#x}")
}

pub async fn votes(
    State(ctx): State<AppState>,
    Query(query): Query<VotesQuery>,
) -> Result<Json<Vec<RecordView>>, ApiError> {
    let filter = query.to_filter()?;
    if !filter.is_scoped() {
        return Err(ApiError::bad_request("proposalId or address required"));
    }
    let records = ctx.votes(filter).await?;
    Ok(Json(records.iter().map(RecordView::from_record).collect()))
}

pub async fn pending(State(ctx): State<AppState>) -> Result<Json<Vec<RecordView>>, ApiError> {
    let entries = ctx.pending().await?;
    Ok(Json(entries.iter().map(RecordView::pending).collect()))
}

// ── Metrics ──────────────────────────────────────────────────────────────

pub async fn metrics(State(ctx): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let body = ctx
        .metrics()
        .encode()
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}
