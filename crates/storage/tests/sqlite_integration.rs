use chrono::Duration;
use srs_core::model::{
    ComprehensionLevel, ReviewRecord, UserId, VocabularyItem, VocabularyItemId,
};
use srs_core::time::fixed_now;
use storage::repository::{ReviewRecordRepository, StorageError, VocabularyRepository};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn build_item(id: u64, user: UserId, word: &str) -> VocabularyItem {
    VocabularyItem::new(
        VocabularyItemId::new(id),
        user,
        word,
        "translation",
        "it",
        ComprehensionLevel::new(3).unwrap(),
    )
    .unwrap()
}

#[tokio::test]
async fn sqlite_roundtrips_vocabulary_and_records() {
    let repo = connect("memdb_roundtrip").await;
    let user = UserId::random();
    let now = fixed_now();

    let item = build_item(1, user, "ciao");
    repo.upsert_vocabulary_item(&item).await.unwrap();
    let fetched = repo
        .get_vocabulary_item(user, item.id())
        .await
        .unwrap()
        .expect("item stored");
    assert_eq!(fetched, item);

    assert!(repo.get_review_record(item.id(), user).await.unwrap().is_none());

    let initial = ReviewRecord::initial(item.id(), user, now);
    let stored = repo.upsert_review_record(&initial).await.unwrap();
    assert_eq!(stored.version, 1);

    let mut reviewed = stored.clone();
    reviewed.interval_days = 6;
    reviewed.repetitions = 2;
    reviewed.ease_factor = 2.36;
    reviewed.last_reviewed_at = Some(now);
    reviewed.next_review_date = Some(now + Duration::days(6));
    reviewed.review_count = 2;
    reviewed.consecutive_correct = 2;
    let stored = repo.upsert_review_record(&reviewed).await.unwrap();
    assert_eq!(stored.version, 2);

    let fetched = repo
        .get_review_record(item.id(), user)
        .await
        .unwrap()
        .expect("record stored");
    assert_eq!(fetched, stored);
}

#[tokio::test]
async fn sqlite_rejects_stale_and_duplicate_writes() {
    let repo = connect("memdb_conflict").await;
    let user = UserId::random();
    let item = build_item(1, user, "cane");
    repo.upsert_vocabulary_item(&item).await.unwrap();

    let initial = ReviewRecord::initial(item.id(), user, fixed_now());
    let first = repo.upsert_review_record(&initial).await.unwrap();

    let err = repo.upsert_review_record(&initial).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    let mut stale = first.clone();
    stale.version = 7;
    let err = repo.upsert_review_record(&stale).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    let unchanged = repo.get_review_record(item.id(), user).await.unwrap();
    assert_eq!(unchanged, Some(first));
}

#[tokio::test]
async fn sqlite_record_for_missing_item_is_not_found() {
    let repo = connect("memdb_orphan").await;
    let user = UserId::random();
    let orphan = ReviewRecord::initial(VocabularyItemId::new(42), user, fixed_now());

    let err = repo.upsert_review_record(&orphan).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_delete_cascades_and_lists_are_scoped() {
    let repo = connect("memdb_cascade").await;
    let alice = UserId::random();
    let bob = UserId::random();
    let now = fixed_now();

    for (id, word) in [(2, "due"), (1, "uno"), (3, "tre")] {
        let item = build_item(id, alice, word);
        repo.upsert_vocabulary_item(&item).await.unwrap();
        repo.upsert_review_record(&ReviewRecord::initial(item.id(), alice, now))
            .await
            .unwrap();
    }
    repo.upsert_vocabulary_item(&build_item(1, bob, "uno"))
        .await
        .unwrap();

    let items = repo.list_vocabulary_items(alice).await.unwrap();
    let ids: Vec<_> = items.iter().map(|i| i.id().value()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(repo.list_review_records(alice).await.unwrap().len(), 3);
    assert!(repo.list_review_records(bob).await.unwrap().is_empty());

    repo.delete_vocabulary_item(alice, VocabularyItemId::new(2))
        .await
        .unwrap();

    let records = repo.list_review_records(alice).await.unwrap();
    let ids: Vec<_> = records.iter().map(|r| r.vocabulary_item_id.value()).collect();
    assert_eq!(ids, vec![1, 3]);

    let err = repo
        .delete_vocabulary_item(alice, VocabularyItemId::new(2))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));

    // bob's item with the same id is untouched
    assert!(repo
        .get_vocabulary_item(bob, VocabularyItemId::new(1))
        .await
        .unwrap()
        .is_some());
}
