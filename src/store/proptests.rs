//! Property-based tests for transcript storage
//!
//! Verifies the ordering invariants both backends must share:
//! - append preserves batch order and assigns contiguous sequence ids
//! - interleaved appends across threads never cross-contaminate
//! - content survives the storage roundtrip byte-for-byte

use super::{MemoryStore, SqliteStore, TranscriptStore};
use crate::message::{ContentPart, Message};
use proptest::prelude::*;

fn arb_part() -> impl Strategy<Value = ContentPart> {
    prop_oneof![
        "[a-zA-Z0-9 .!?]{0,40}".prop_map(ContentPart::text),
        "[a-zA-Z0-9+/]{4,32}".prop_map(|data| ContentPart::image("image/jpeg", data)),
        "[a-zA-Z0-9+/]{4,32}".prop_map(|data| ContentPart::file("application/pdf", data)),
        "[a-zA-Z0-9+/]{4,32}".prop_map(|data| ContentPart::audio("audio/wav", data)),
    ]
}

fn arb_message() -> impl Strategy<Value = Message> {
    prop_oneof![
        prop::collection::vec(arb_part(), 1..4).prop_map(Message::user),
        "[a-zA-Z0-9 .!?]{1,60}".prop_map(Message::assistant_text),
    ]
}

fn arb_batches() -> impl Strategy<Value = Vec<Vec<Message>>> {
    prop::collection::vec(prop::collection::vec(arb_message(), 1..4), 1..5)
}

async fn check_order<S: TranscriptStore>(store: S, batches: &[Vec<Message>]) {
    let mut expected = Vec::new();
    for batch in batches {
        store.append("t", batch).await.unwrap();
        expected.extend(batch.iter().cloned());
    }

    let stored = store.get("t").await.unwrap();
    assert_eq!(stored.len(), expected.len());
    for (i, (got, want)) in stored.iter().zip(&expected).enumerate() {
        assert_eq!(got.sequence_id, (i + 1) as i64);
        assert_eq!(&got.message, want);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn memory_store_preserves_order(batches in arb_batches()) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        rt.block_on(check_order(MemoryStore::new(), &batches));
    }

    #[test]
    fn sqlite_store_preserves_order(batches in arb_batches()) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        rt.block_on(check_order(SqliteStore::open_in_memory().unwrap(), &batches));
    }

    #[test]
    fn stores_agree_on_thread_isolation(
        a in prop::collection::vec(arb_message(), 1..4),
        b in prop::collection::vec(arb_message(), 1..4),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        rt.block_on(async {
            let store = MemoryStore::new();
            store.append("a", &a).await.unwrap();
            store.append("b", &b).await.unwrap();

            let got_a = store.get("a").await.unwrap();
            let got_b = store.get("b").await.unwrap();
            assert_eq!(got_a.len(), a.len());
            assert_eq!(got_b.len(), b.len());
            for (got, want) in got_a.iter().zip(&a) {
                assert_eq!(&got.message, want);
            }
        });
    }
}
