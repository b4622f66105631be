//! Ledger REST API payloads.
//!
//! ```json
//! {"data":[{"snapshot_id":"s1","opponent_id":"u1","asset_id":"a1","amount":"0.5","memo":"","created_at":"2026-01-01T00:00:00Z"}]}
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::domain::{AssetId, Transfer, TransferId, UserId};
use crate::port::RefundRequest;

/// Response of `GET /snapshots`.
///
/// Entries stay raw until [`SnapshotsResponse::into_transfers`] so one
/// malformed snapshot cannot reject the whole page.
#[derive(Debug, Deserialize)]
pub struct SnapshotsResponse {
    #[serde(default)]
    pub data: Vec<Value>,
}

impl SnapshotsResponse {
    /// Convert the page into transfers, skipping entries that do not parse.
    #[must_use]
    pub fn into_transfers(self) -> Vec<Transfer> {
        self.data
            .into_iter()
            .filter_map(|entry| {
                let snapshot_id = entry
                    .get("snapshot_id")
                    .and_then(Value::as_str)
                    .unwrap_or("<unknown>")
                    .to_string();
                match serde_json::from_value::<SnapshotDto>(entry) {
                    Ok(dto) => Some(Transfer::from(dto)),
                    Err(e) => {
                        warn!(snapshot_id = %snapshot_id, error = %e, "Skipping malformed snapshot");
                        None
                    }
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotDto {
    pub snapshot_id: String,
    pub opponent_id: String,
    pub asset_id: String,
    pub amount: Decimal,
    #[serde(default)]
    pub memo: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<SnapshotDto> for Transfer {
    fn from(dto: SnapshotDto) -> Self {
        Self {
            transfer_id: TransferId::from(dto.snapshot_id),
            sender_id: UserId::from(dto.opponent_id),
            asset_id: AssetId::from(dto.asset_id),
            amount: dto.amount,
            memo: dto.memo.unwrap_or_default(),
            received_at: dto.created_at,
        }
    }
}

/// Body of `POST /transfers`.
#[derive(Debug, Serialize)]
pub struct TransferRequestDto<'a> {
    pub asset_id: &'a str,
    pub opponent_id: &'a str,
    pub amount: String,
    /// Idempotency key; the ledger rejects a second transfer with the same value.
    pub trace_id: &'a str,
    pub memo: &'a str,
}

impl<'a> From<&'a RefundRequest> for TransferRequestDto<'a> {
    fn from(request: &'a RefundRequest) -> Self {
        Self {
            asset_id: request.asset_id.as_str(),
            opponent_id: request.recipient_id.as_str(),
            amount: request.amount.to_string(),
            trace_id: &request.idempotency_key,
            memo: &request.memo,
        }
    }
}

/// Response of `POST /transfers`.
#[derive(Debug, Deserialize)]
pub struct TransferResponse {
    pub data: TransferDataDto,
}

#[derive(Debug, Deserialize)]
pub struct TransferDataDto {
    pub snapshot_id: String,
}
