//! Record enrichment pipeline
//!
//! Takes raw indexed action rows and produces fully populated records:
//! fetch the parent transaction (cached), locate the matching receipt
//! outcome, fetch the block it executed in (cached), decode the method
//! payload, and assemble. Non-invocation rows are skipped; the first hard
//! error aborts the whole batch.

use crate::cache::DiskCache;
use crate::decode::decode_payload;
use crate::errors::{DecodeError, EnrichError};
use crate::records::{Record, RecordDetail};
use crate::rpc::LedgerClient;
use crate::types::{
    ActionKind, ActionView, BlockView, CallArgs, ExecutionStatusView, RawActionRow,
    ReceiptEnumView, ReceiptView, TransactionView,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures::stream::{self, StreamExt, TryStreamExt};

/// Enriches raw action rows against the remote ledger.
pub struct RecordEnricher<C> {
    client: C,
    cache: DiskCache,
    concurrency: usize,
}

impl<C: LedgerClient> RecordEnricher<C> {
    /// Create an enricher over a ledger client and cache. `concurrency`
    /// bounds the worker pool used by [`build_records`].
    ///
    /// [`build_records`]: RecordEnricher::build_records
    pub fn new(client: C, cache: DiskCache, concurrency: usize) -> Self {
        Self {
            client,
            cache,
            concurrency: concurrency.max(1),
        }
    }

    /// Enrich one raw row.
    ///
    /// Returns `Ok(None)` for rows in the known non-invocation set
    /// (CREATE_ACCOUNT, TRANSFER, ADD_KEY, DEPLOY_CONTRACT). Any other
    /// non-FUNCTION_CALL kind is an error so new kinds get classified
    /// explicitly.
    pub async fn enrich(&self, row: &RawActionRow) -> Result<Option<Record>, EnrichError> {
        let kind = ActionKind::parse(&row.action_kind)
            .ok_or_else(|| EnrichError::UnrecognizedActionKind(row.action_kind.clone()))?;
        if kind != ActionKind::FunctionCall {
            tracing::debug!(
                "skipping receipt {} with action kind {}",
                row.receipt_id,
                row.action_kind
            );
            return Ok(None);
        }

        let call: CallArgs =
            serde_json::from_value(row.args.clone()).map_err(|source| {
                EnrichError::InvalidCallArgs {
                    receipt_id: row.receipt_id.clone(),
                    source,
                }
            })?;

        let tx = self.cached_transaction(&row.tx_id).await?;
        let outcome = tx
            .receipts_outcome
            .iter()
            .find(|outcome| outcome.id == row.receipt_id)
            .ok_or_else(|| EnrichError::OutcomeNotFound {
                receipt_id: row.receipt_id.clone(),
                tx_id: row.tx_id.clone(),
            })?;

        let block = self.cached_block(&outcome.block_hash).await?;

        let payload = BASE64
            .decode(call.args_base64.as_bytes())
            .map_err(DecodeError::from)?;
        let input = decode_payload(&call.method_name, &payload)?;

        let (success_value, success_receipt_id) = match &outcome.outcome.status {
            ExecutionStatusView::SuccessValue(encoded) => {
                let bytes = BASE64.decode(encoded.as_bytes()).map_err(DecodeError::from)?;
                (Some(format!("0x{}", hex::encode(bytes))), None)
            }
            ExecutionStatusView::SuccessReceiptId(id) => (None, Some(id.clone())),
            ExecutionStatusView::Failure(_) | ExecutionStatusView::Unknown => (None, None),
        };

        Ok(Some(Record {
            receipt_id: row.receipt_id.clone(),
            tx_id: row.tx_id.clone(),
            block_hash: outcome.block_hash.clone(),
            gas_attached: call.gas,
            gas_burnt: outcome.outcome.gas_burnt,
            tokens_attached: call.deposit,
            tokens_burnt: outcome.outcome.tokens_burnt,
            method: call.method_name,
            input,
            success_value,
            success_receipt_id,
            timestamp: block.header.timestamp,
            block_height: block.header.height,
        }))
    }

    /// Enrich a batch of rows with a bounded worker pool and return the
    /// surviving records sorted most-recent-first, receipt id ascending
    /// within a timestamp.
    ///
    /// Fail-fast: the first hard error cancels the remaining work. The
    /// sort happens after the full set completes, so the final ordering
    /// does not depend on completion order.
    pub async fn build_records(&self, rows: Vec<RawActionRow>) -> Result<Vec<Record>, EnrichError> {
        let total = rows.len();
        let mut records: Vec<Record> = stream::iter(rows)
            .map(|row| async move { self.enrich(&row).await })
            .buffer_unordered(self.concurrency)
            .try_filter_map(|record| async move { Ok(record) })
            .try_collect()
            .await?;

        tracing::info!("enriched {} of {} indexed rows", records.len(), total);

        records.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| a.receipt_id.cmp(&b.receipt_id))
        });
        Ok(records)
    }

    /// Look up one record's detail by (receipt_id, tx_id): the receipt's
    /// own action list plus the outcome and block data.
    pub async fn record_detail(
        &self,
        receipt_id: &str,
        tx_id: &str,
    ) -> Result<RecordDetail, EnrichError> {
        let receipt = self.cached_receipt(receipt_id).await?;
        let tx = self.cached_transaction(tx_id).await?;

        let outcome = tx
            .receipts_outcome
            .iter()
            .find(|outcome| outcome.id == receipt_id)
            .ok_or_else(|| EnrichError::OutcomeNotFound {
                receipt_id: receipt_id.to_string(),
                tx_id: tx_id.to_string(),
            })?;

        let block = self.cached_block(&outcome.block_hash).await?;

        let (method, input) = match &receipt.receipt {
            ReceiptEnumView::Action { actions } => {
                let first = actions
                    .first()
                    .ok_or_else(|| EnrichError::EmptyReceipt(receipt_id.to_string()))?;
                match first {
                    ActionView::FunctionCall {
                        method_name, args, ..
                    } => {
                        let payload =
                            BASE64.decode(args.as_bytes()).map_err(DecodeError::from)?;
                        let input = decode_payload(method_name, &payload)?;
                        (Some(method_name.clone()), Some(input))
                    }
                    _ => (None, None),
                }
            }
            ReceiptEnumView::Data(_) => (None, None),
        };

        Ok(RecordDetail {
            receipt_id: receipt_id.to_string(),
            tx_id: tx_id.to_string(),
            block_hash: outcome.block_hash.clone(),
            block_height: block.header.height,
            timestamp: block.header.timestamp,
            gas_burnt: outcome.outcome.gas_burnt,
            tokens_burnt: outcome.outcome.tokens_burnt,
            method,
            input,
        })
    }

    async fn cached_transaction(&self, tx_id: &str) -> Result<TransactionView, EnrichError> {
        self.cache
            .get_or_compute("tx", tx_id, || async {
                self.client
                    .get_transaction(tx_id)
                    .await
                    .map_err(EnrichError::from)
            })
            .await
    }

    async fn cached_block(&self, block_hash: &str) -> Result<BlockView, EnrichError> {
        self.cache
            .get_or_compute("block", block_hash, || async {
                self.client
                    .get_block(block_hash)
                    .await
                    .map_err(EnrichError::from)
            })
            .await
    }

    async fn cached_receipt(&self, receipt_id: &str) -> Result<ReceiptView, EnrichError> {
        self.cache
            .get_or_compute("receipt", receipt_id, || async {
                self.client
                    .get_receipt(receipt_id)
                    .await
                    .map_err(EnrichError::from)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::tests::encode_tx;
    use crate::decode::DecodedInput;
    use crate::errors::RpcError;
    use crate::types::{BlockHeaderView, OutcomeView, ReceiptOutcomeView};
    use alloy_primitives::Address;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;

    #[derive(Default)]
    struct StubLedger {
        txs: HashMap<String, TransactionView>,
        blocks: HashMap<String, BlockView>,
        receipts: HashMap<String, ReceiptView>,
    }

    #[async_trait]
    impl LedgerClient for StubLedger {
        async fn get_receipt(&self, receipt_id: &str) -> Result<ReceiptView, RpcError> {
            self.receipts
                .get(receipt_id)
                .cloned()
                .ok_or(RpcError::CallFailed {
                    method: "EXPERIMENTAL_receipt",
                    message: format!("unknown receipt {receipt_id}"),
                })
        }

        async fn get_transaction(&self, tx_id: &str) -> Result<TransactionView, RpcError> {
            self.txs.get(tx_id).cloned().ok_or(RpcError::CallFailed {
                method: "tx",
                message: format!("unknown transaction {tx_id}"),
            })
        }

        async fn get_block(&self, block_id: &str) -> Result<BlockView, RpcError> {
            self.blocks.get(block_id).cloned().ok_or(RpcError::CallFailed {
                method: "block",
                message: format!("unknown block {block_id}"),
            })
        }
    }

    fn outcome(id: &str, block_hash: &str, status: ExecutionStatusView) -> ReceiptOutcomeView {
        ReceiptOutcomeView {
            id: id.to_string(),
            block_hash: block_hash.to_string(),
            outcome: OutcomeView {
                gas_burnt: 424_555_062_500,
                tokens_burnt: 42_455_506_250_000_000_000,
                status,
            },
        }
    }

    fn block(hash: &str, height: u64, timestamp: u64) -> BlockView {
        BlockView {
            header: BlockHeaderView {
                height,
                timestamp,
                hash: hash.to_string(),
            },
        }
    }

    fn function_call_row(receipt_id: &str, tx_id: &str, method: &str, payload: &[u8]) -> RawActionRow {
        RawActionRow {
            receipt_id: receipt_id.to_string(),
            tx_id: tx_id.to_string(),
            action_kind: "FUNCTION_CALL".to_string(),
            args: json!({
                "method_name": method,
                "args_base64": BASE64.encode(payload),
                "gas": 300000000000000u64,
                "deposit": "0"
            }),
        }
    }

    fn enricher(stub: StubLedger, dir: &std::path::Path) -> RecordEnricher<StubLedger> {
        RecordEnricher::new(stub, DiskCache::open(dir).unwrap(), 4)
    }

    #[tokio::test]
    async fn test_end_to_end_submit_enrichment() {
        let dir = tempfile::tempdir().unwrap();
        let eth_tx = encode_tx(0, 0, 0, &[0u8; 20], 0, &[], 27, &[0x01], &[0x01]);

        let mut stub = StubLedger::default();
        stub.txs.insert(
            "T1".to_string(),
            TransactionView {
                receipts_outcome: vec![outcome(
                    "R1",
                    "B1",
                    ExecutionStatusView::SuccessValue(String::new()),
                )],
            },
        );
        stub.blocks
            .insert("B1".to_string(), block("B1", 100, 1_000_000_000_000_000_000));

        let enricher = enricher(stub, dir.path());
        let row = function_call_row("R1", "T1", "submit", &eth_tx);
        let records = enricher.build_records(vec![row]).await.unwrap();

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.receipt_id, "R1");
        assert_eq!(record.block_hash, "B1");
        assert_eq!(record.block_height, 100);
        assert_eq!(record.timestamp, 1_000_000_000_000_000_000);
        assert_eq!(record.success_value.as_deref(), Some("0x"));
        assert_eq!(record.success_receipt_id, None);
        match &record.input {
            DecodedInput::EthTransaction(tx) => {
                assert_eq!(tx.to, Some(Address::ZERO));
                assert_eq!(tx.value, 0);
                assert_eq!(tx.sender, None);
            }
            other => panic!("unexpected input: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_invocation_kinds_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let eth_tx = encode_tx(0, 0, 0, &[0u8; 20], 0, &[], 27, &[0x01], &[0x01]);

        let mut stub = StubLedger::default();
        stub.txs.insert(
            "T1".to_string(),
            TransactionView {
                receipts_outcome: vec![outcome(
                    "R1",
                    "B1",
                    ExecutionStatusView::SuccessValue(String::new()),
                )],
            },
        );
        stub.blocks
            .insert("B1".to_string(), block("B1", 100, 1_000_000_000_000_000_000));

        let enricher = enricher(stub, dir.path());
        let rows = vec![
            function_call_row("R1", "T1", "submit", &eth_tx),
            RawActionRow {
                receipt_id: "R2".to_string(),
                tx_id: "T2".to_string(),
                action_kind: "TRANSFER".to_string(),
                args: json!({ "deposit": "1" }),
            },
            RawActionRow {
                receipt_id: "R3".to_string(),
                tx_id: "T3".to_string(),
                action_kind: "CREATE_ACCOUNT".to_string(),
                args: json!({}),
            },
        ];

        let records = enricher.build_records(rows).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].receipt_id, "R1");
    }

    #[tokio::test]
    async fn test_unrecognized_kind_fails() {
        let dir = tempfile::tempdir().unwrap();
        let enricher = enricher(StubLedger::default(), dir.path());

        let row = RawActionRow {
            receipt_id: "R1".to_string(),
            tx_id: "T1".to_string(),
            action_kind: "DELEGATE_ACTION".to_string(),
            args: json!({}),
        };
        let err = enricher.build_records(vec![row]).await.unwrap_err();
        match err {
            EnrichError::UnrecognizedActionKind(kind) => assert_eq!(kind, "DELEGATE_ACTION"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_outcome_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut stub = StubLedger::default();
        stub.txs.insert(
            "T1".to_string(),
            TransactionView {
                receipts_outcome: vec![outcome(
                    "OTHER",
                    "B1",
                    ExecutionStatusView::SuccessValue(String::new()),
                )],
            },
        );

        let enricher = enricher(stub, dir.path());
        let row = function_call_row("R1", "T1", "withdraw", b"payload");
        let err = enricher.enrich(&row).await.unwrap_err();
        assert!(matches!(err, EnrichError::OutcomeNotFound { .. }));
    }

    #[tokio::test]
    async fn test_remote_failure_surfaces() {
        let dir = tempfile::tempdir().unwrap();
        let enricher = enricher(StubLedger::default(), dir.path());

        let row = function_call_row("R1", "T_MISSING", "withdraw", b"payload");
        let err = enricher.enrich(&row).await.unwrap_err();
        assert!(matches!(err, EnrichError::Rpc(RpcError::CallFailed { .. })));
    }

    #[tokio::test]
    async fn test_success_receipt_id_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut stub = StubLedger::default();
        stub.txs.insert(
            "T1".to_string(),
            TransactionView {
                receipts_outcome: vec![outcome(
                    "R1",
                    "B1",
                    ExecutionStatusView::SuccessReceiptId("R_NEXT".to_string()),
                )],
            },
        );
        stub.blocks
            .insert("B1".to_string(), block("B1", 7, 1_000_000_000_000_000_000));

        let enricher = enricher(stub, dir.path());
        let row = function_call_row("R1", "T1", "deposit", b"proof");
        let record = enricher.enrich(&row).await.unwrap().unwrap();

        assert_eq!(record.success_value, None);
        assert_eq!(record.success_receipt_id.as_deref(), Some("R_NEXT"));
        assert_eq!(record.input, DecodedInput::RawHex(format!("0x{}", hex::encode(b"proof"))));
    }

    #[tokio::test]
    async fn test_records_sorted_most_recent_first() {
        let dir = tempfile::tempdir().unwrap();
        let mut stub = StubLedger::default();
        for (tx_id, receipt_id, block_hash) in
            [("T1", "Rb", "B1"), ("T2", "Ra", "B2"), ("T3", "Rc", "B2")]
        {
            stub.txs.insert(
                tx_id.to_string(),
                TransactionView {
                    receipts_outcome: vec![outcome(
                        receipt_id,
                        block_hash,
                        ExecutionStatusView::SuccessValue(String::new()),
                    )],
                },
            );
        }
        // B1 is newer than B2; Ra and Rc share B2's timestamp.
        stub.blocks
            .insert("B1".to_string(), block("B1", 101, 2_000_000_000_000_000_000));
        stub.blocks
            .insert("B2".to_string(), block("B2", 100, 1_000_000_000_000_000_000));

        let enricher = enricher(stub, dir.path());
        let rows = vec![
            function_call_row("Rc", "T3", "withdraw", b"x"),
            function_call_row("Rb", "T1", "withdraw", b"x"),
            function_call_row("Ra", "T2", "withdraw", b"x"),
        ];
        let records = enricher.build_records(rows).await.unwrap();

        let order: Vec<&str> = records.iter().map(|r| r.receipt_id.as_str()).collect();
        assert_eq!(order, vec!["Rb", "Ra", "Rc"]);
    }

    #[tokio::test]
    async fn test_record_detail_function_call() {
        let dir = tempfile::tempdir().unwrap();
        let mut stub = StubLedger::default();
        stub.receipts.insert(
            "R1".to_string(),
            ReceiptView {
                receipt_id: "R1".to_string(),
                receipt: ReceiptEnumView::Action {
                    actions: vec![ActionView::FunctionCall {
                        method_name: "withdraw".to_string(),
                        args: BASE64.encode(b"payload"),
                        gas: 300_000_000_000_000,
                        deposit: 0,
                    }],
                },
            },
        );
        stub.txs.insert(
            "T1".to_string(),
            TransactionView {
                receipts_outcome: vec![outcome(
                    "R1",
                    "B1",
                    ExecutionStatusView::SuccessValue(String::new()),
                )],
            },
        );
        stub.blocks
            .insert("B1".to_string(), block("B1", 55, 1_000_000_000_000_000_000));

        let enricher = enricher(stub, dir.path());
        let detail = enricher.record_detail("R1", "T1").await.unwrap();

        assert_eq!(detail.block_height, 55);
        assert_eq!(detail.method.as_deref(), Some("withdraw"));
        assert_eq!(
            detail.input,
            Some(DecodedInput::RawHex(format!("0x{}", hex::encode(b"payload"))))
        );
    }
}
