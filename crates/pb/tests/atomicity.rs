//! Failure injection: a storage fault at any step leaves no trace.

use bytes::Bytes;
use pb::{Address, CompactId, Digest, Stats};
use pb_testkit::{StoreOp, TestFixture};

#[tokio::test]
async fn create_fault_consumes_nothing() {
    for op in [
        StoreOp::PublicByDigest,
        StoreOp::NextSequence,
        StoreOp::InsertRecord,
        StoreOp::AdjustStats,
    ] {
        let fixture = TestFixture::faulty();
        let pastes = fixture.pastes();

        fixture.store().arm(op);
        let err = pastes.create(&b"fragile\n"[..]).await.unwrap_err();
        assert!(err.is_storage_failure(), "{:?}: {}", op, err);
        assert!(!fixture.store().is_armed(), "{:?} never reached", op);

        assert_eq!(pastes.stats().await.unwrap(), Stats::default());
        assert_eq!(pastes.find_by_content(&b"fragile\n"[..]).await.unwrap(), None);

        // The failed attempt did not burn an ID.
        assert_eq!(
            pastes.create(&b"fragile\n"[..]).await.unwrap(),
            Address::Id(CompactId(1))
        );
    }
}

#[tokio::test]
async fn create_private_fault_leaves_no_record_or_token() {
    for op in [
        StoreOp::PrivateByDigest,
        StoreOp::InsertRecord,
        StoreOp::AdjustStats,
        StoreOp::BindToken,
    ] {
        let fixture = TestFixture::faulty();
        let pastes = fixture.pastes();

        fixture.store().arm(op);
        let err = pastes.create_private(&b"secret\n"[..]).await.unwrap_err();
        assert!(err.is_storage_failure(), "{:?}: {}", op, err);
        assert!(!fixture.store().is_armed(), "{:?} never reached", op);

        assert_eq!(pastes.stats().await.unwrap(), Stats::default());
        assert_eq!(
            pastes
                .read(Address::Digest(Digest::of(b"secret\n")))
                .await
                .unwrap(),
            None
        );

        // No half-created record blocks the retry.
        pastes.create_private(&b"secret\n"[..]).await.unwrap();
    }
}

#[tokio::test]
async fn create_owned_fault_on_bind_rolls_back_insert() {
    let fixture = TestFixture::faulty();
    let pastes = fixture.pastes();

    fixture.store().arm(StoreOp::BindToken);
    assert!(pastes.create_owned(&b"owned\n"[..]).await.is_err());

    let (address, token) = pastes.create_owned(&b"owned\n"[..]).await.unwrap();
    assert_eq!(address, Address::Id(CompactId(1)));
    assert!(token.is_some());
}

#[tokio::test]
async fn claim_update_fault_keeps_old_content() {
    for op in [
        StoreOp::TokenTarget,
        StoreOp::Record,
        StoreOp::PrivateByDigest,
        StoreOp::ReplaceRecord,
        StoreOp::AdjustStats,
    ] {
        let fixture = TestFixture::faulty();
        let pastes = fixture.pastes();
        let (address, token) = pastes.create_owned(&b"before\n"[..]).await.unwrap();
        let token = token.unwrap();
        let stats = pastes.stats().await.unwrap();

        fixture.store().arm(op);
        let err = pastes
            .claim_update(&token, &b"after, longer\n"[..])
            .await
            .unwrap_err();
        assert!(err.is_storage_failure(), "{:?}: {}", op, err);

        assert_eq!(
            pastes.read(address).await.unwrap(),
            Some(Bytes::from_static(b"before\n"))
        );
        assert_eq!(pastes.stats().await.unwrap(), stats);
        assert_eq!(
            pastes.claim_update(&token, &b"after, longer\n"[..]).await.unwrap(),
            address
        );
    }
}

#[tokio::test]
async fn claim_delete_fault_keeps_record_and_token() {
    for op in [
        StoreOp::TokenTarget,
        StoreOp::DeleteRecord,
        StoreOp::RevokeToken,
        StoreOp::AdjustStats,
    ] {
        let fixture = TestFixture::faulty();
        let pastes = fixture.pastes();
        let (digest, token) = pastes.create_private(&b"keep me\n"[..]).await.unwrap();

        fixture.store().arm(op);
        let err = pastes.claim_delete(&token).await.unwrap_err();
        assert!(err.is_storage_failure(), "{:?}: {}", op, err);

        assert_eq!(
            pastes.read(Address::Digest(digest)).await.unwrap(),
            Some(Bytes::from_static(b"keep me\n"))
        );
        assert_eq!(pastes.stats().await.unwrap().record_count, 1);
        assert_eq!(
            pastes.claim_delete(&token).await.unwrap(),
            Address::Digest(digest)
        );
    }
}

#[tokio::test]
async fn shorten_fault_consumes_nothing() {
    let fixture = TestFixture::faulty();
    let urls = fixture.urls();

    fixture.store().arm(StoreOp::InsertRecord);
    assert!(urls.shorten("https://example.com/").await.is_err());

    assert_eq!(urls.stats().await.unwrap(), Stats::default());
    assert_eq!(urls.shorten("https://example.com/").await.unwrap(), CompactId(1));
}
