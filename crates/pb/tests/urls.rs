//! Short URL namespace.

use pb::{CompactId, PasteError, PbConfig};
use pb_testkit::generators::url;
use pb_testkit::TestFixture;
use proptest::prelude::*;

#[tokio::test]
async fn shorten_dedups_and_resolves() {
    let fixture = TestFixture::new();
    let urls = fixture.urls();

    let id = urls.shorten("https://example.com/page\n").await.unwrap();
    assert_eq!(id, CompactId(1));
    assert_eq!(id.encode(urls.id_width()).unwrap(), "AAB");
    assert_eq!(
        urls.shorten("https://example.com/page\ntrailing junk").await.unwrap(),
        id
    );
    assert_eq!(
        urls.resolve(id).await.unwrap().as_deref(),
        Some("https://example.com/page")
    );
    assert_eq!(urls.stats().await.unwrap().record_count, 1);
}

#[tokio::test]
async fn urls_and_pastes_are_separate() {
    let fixture = TestFixture::new();

    fixture.pastes().create(&b"https://example.com/"[..]).await.unwrap();
    let id = fixture.urls().shorten("https://example.com/").await.unwrap();

    assert_eq!(id, CompactId(1));
    assert_eq!(fixture.pastes().stats().await.unwrap().record_count, 1);
    assert_eq!(fixture.urls().stats().await.unwrap().record_count, 1);
}

#[tokio::test]
async fn shorten_rejects_bad_input() {
    let fixture = TestFixture::new();
    let urls = fixture.urls();

    assert!(matches!(urls.shorten("").await, Err(PasteError::BadInput(_))));
    assert!(matches!(urls.shorten("\r\nx").await, Err(PasteError::BadInput(_))));
    assert!(matches!(urls.shorten([0xc3u8, 0x28]).await, Err(PasteError::BadInput(_))));
    assert_eq!(urls.resolve(CompactId(1)).await.unwrap(), None);
}

#[tokio::test]
async fn shorten_keeps_surrounding_whitespace() {
    let fixture = TestFixture::new();
    let urls = fixture.urls();

    let padded = urls.shorten(" https://example.com/ \n").await.unwrap();
    let bare = urls.shorten("https://example.com/").await.unwrap();

    assert_ne!(padded, bare);
    assert_eq!(
        urls.resolve(padded).await.unwrap().as_deref(),
        Some(" https://example.com/ ")
    );
}

#[tokio::test]
async fn url_ids_stay_within_width() {
    let fixture = TestFixture::with_config(PbConfig {
        url_id_width: 1,
        ..PbConfig::default()
    });
    let urls = fixture.urls();

    for i in 0..65 {
        let id = urls.shorten(format!("https://example.com/{}", i)).await.unwrap();
        assert_eq!(id.encode(1).unwrap().len(), 1);
    }
    assert!(matches!(
        urls.shorten("https://example.com/full").await,
        Err(PasteError::AddressSpaceExhausted { width: 1, .. })
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn resolve_returns_what_was_shortened(target in url()) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let fixture = TestFixture::new();
            let id = fixture.urls().shorten(target.as_bytes()).await.unwrap();
            assert_eq!(fixture.urls().resolve(id).await.unwrap(), Some(target.clone()));
        });
    }
}
