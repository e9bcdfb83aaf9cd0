//! Property tests for idempotent posting in the memory store.

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use ledgerline_core::ledger::{JournalEntry, JournalLine, NewJournalEntry, SourceType, codes};
use ledgerline_core::store::{LedgerStore, PostOutcome};
use ledgerline_shared::types::{SourceId, TenantId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::MemoryStore;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Replaying documents in any order posts each one exactly once and bumps
    /// the ledger version once per posted entry.
    #[test]
    fn prop_replayed_documents_post_once(
        picks in prop::collection::vec((0usize..6, 1u32..=28, 1i64..1_000_000), 1..40),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let store = MemoryStore::new();
            let tenant_id = TenantId::new();
            let chart = store.provision_standard_chart(tenant_id);
            let bank = chart.by_code(codes::BANK).unwrap().id;
            let sales = chart.by_code(codes::SALES_REVENUE).unwrap().id;
            let pool: Vec<SourceId> = (0..6).map(|_| SourceId::new()).collect();

            let mut posted = 0u64;
            for (index, day, cents) in &picks {
                let amount = Decimal::new(*cents, 2);
                let entry = JournalEntry::new(
                    NewJournalEntry {
                        tenant_id,
                        source_type: SourceType::Invoice,
                        source_id: pool[*index],
                        entry_date: NaiveDate::from_ymd_opt(2024, 3, *day).unwrap(),
                        memo: "invoice".into(),
                        lines: vec![JournalLine::debit(bank, amount), JournalLine::credit(sales, amount)],
                    },
                    Utc::now(),
                )
                .unwrap();
                if store.post_entry(entry).await.unwrap() == PostOutcome::Posted {
                    posted += 1;
                }
            }

            let distinct: HashSet<usize> = picks.iter().map(|p| p.0).collect();
            prop_assert_eq!(store.journal_entries(tenant_id).len(), distinct.len());
            prop_assert_eq!(posted, distinct.len() as u64);
            prop_assert_eq!(store.ledger_version(tenant_id).await.unwrap(), posted);
            Ok::<(), TestCaseError>(())
        })?;
    }
}
