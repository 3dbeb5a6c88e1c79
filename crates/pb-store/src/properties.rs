//! Sequence and stats invariants under random insert/delete churn, run
//! against both engines.

use std::collections::BTreeMap;

use bytes::Bytes;
use pb_core::{CompactId, Namespace, Record, RecordKey, Stats};
use proptest::prelude::*;

use crate::error::Result;
use crate::memory::MemoryStore;
use crate::sqlite::SqliteStore;
use crate::traits::Store;

#[derive(Debug, Clone)]
enum Churn {
    Insert(Vec<u8>),
    Delete(usize),
}

fn churn() -> impl Strategy<Value = Vec<Churn>> {
    prop::collection::vec(
        prop_oneof![
            3 => prop::collection::vec(any::<u8>(), 0..32).prop_map(Churn::Insert),
            2 => any::<usize>().prop_map(Churn::Delete),
        ],
        1..40,
    )
}

async fn check_churn<S: Store>(store: S, ops: Vec<Churn>) {
    let mut live: BTreeMap<RecordKey, (CompactId, u64)> = BTreeMap::new();
    let mut last_seq = 0u64;
    let mut last_key = RecordKey(0);

    for op in ops {
        match op {
            Churn::Insert(body) => {
                let len = 8 + body.len() as u64;
                let (seq, key) = store
                    .transact(move |tx| -> Result<_> {
                        let seq = tx.next_sequence(Namespace::Paste)?;
                        // Prefix with the sequence so public digests never collide.
                        let mut content = seq.to_be_bytes().to_vec();
                        content.extend_from_slice(&body);
                        let record =
                            Record::public(Namespace::Paste, CompactId(seq), Bytes::from(content));
                        let key = tx.insert_record(&record)?;
                        tx.adjust_stats(Namespace::Paste, 1, record.len() as i64)?;
                        Ok((seq, key))
                    })
                    .await
                    .unwrap();

                assert!(seq > last_seq, "sequence {} after {}", seq, last_seq);
                assert!(key > last_key, "{:?} after {:?}", key, last_key);
                last_seq = seq;
                last_key = key;
                live.insert(key, (CompactId(seq), len));
            }
            Churn::Delete(n) => {
                if live.is_empty() {
                    continue;
                }
                let key = *live.keys().nth(n % live.len()).unwrap();
                let (id, _) = live.remove(&key).unwrap();
                let gone = store
                    .transact(move |tx| -> Result<_> {
                        let record = tx.delete_record(key)?.unwrap();
                        tx.adjust_stats(Namespace::Paste, -1, -(record.len() as i64))?;
                        tx.record_by_id(Namespace::Paste, id)
                    })
                    .await
                    .unwrap();
                assert_eq!(gone, None);
            }
        }

        let stats = store
            .transact(|tx| tx.stats(Namespace::Paste))
            .await
            .unwrap();
        let expected = Stats {
            record_count: live.len() as u64,
            total_bytes: live.values().map(|(_, len)| len).sum(),
        };
        assert_eq!(stats, expected);
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn memory_sequences_and_stats_hold(ops in churn()) {
        runtime().block_on(check_churn(MemoryStore::new(), ops));
    }

    #[test]
    fn sqlite_sequences_and_stats_hold(ops in churn()) {
        runtime().block_on(check_churn(SqliteStore::open_memory().unwrap(), ops));
    }
}
