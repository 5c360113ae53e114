//! SeaORM 后端：SQLite 落盘读写、级联与计数

mod common;

use common::make_link;
use linkgate::analytics::VisitSink;
use linkgate::config::DatabaseConfig;
use linkgate::errors::LinkgateError;
use linkgate::storage::{
    DEFAULT_SCOPE, LinkStore, PreviewFields, SeaOrmStore, SplashPageFields, TemplateType, Visit,
};

async fn sqlite_store(dir: &tempfile::TempDir) -> SeaOrmStore {
    let config = DatabaseConfig {
        database_url: format!("sqlite://{}/linkgate-test.db", dir.path().display()),
        ..Default::default()
    };
    SeaOrmStore::new(&config).await.expect("store init")
}

#[tokio::test]
async fn test_link_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let store = sqlite_store(&dir).await;

    let mut link = make_link("abc123", "https://example.com");
    link.password_hash = Some("$argon2id$fake".to_string());
    store.upsert_link(link.clone()).await.unwrap();

    let loaded = store
        .find_link(DEFAULT_SCOPE, "abc123")
        .await
        .unwrap()
        .expect("link must exist");
    assert_eq!(loaded.id, link.id);
    assert_eq!(loaded.target, "https://example.com");
    assert_eq!(loaded.password_hash.as_deref(), Some("$argon2id$fake"));
    assert!(loaded.is_active);
    assert!(!loaded.banned);

    assert!(
        store
            .find_link(DEFAULT_SCOPE, "missing")
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        store
            .find_link("other.example", "abc123")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_scope_code_uniqueness_enforced() {
    let dir = tempfile::tempdir().unwrap();
    let store = sqlite_store(&dir).await;

    store
        .upsert_link(make_link("dup", "https://a.example"))
        .await
        .unwrap();

    // 相同 (scope, code) 不同 id：唯一索引拒绝
    let result = store
        .upsert_link(make_link("dup", "https://b.example"))
        .await;
    assert!(matches!(result, Err(LinkgateError::DatabaseOperation(_))));
}

#[tokio::test]
async fn test_splash_upsert_flag_and_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let store = sqlite_store(&dir).await;

    let link = make_link("branded", "https://example.com");
    let link_id = link.id.clone();
    store.upsert_link(link).await.unwrap();

    let splash = store
        .upsert_splash_page(
            &link_id,
            SplashPageFields {
                template_type: TemplateType::Warning,
                custom_css: Some("body{background:#000}".to_string()),
                is_active: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(splash.template_type, TemplateType::Warning);

    let loaded = store
        .find_link(DEFAULT_SCOPE, "branded")
        .await
        .unwrap()
        .unwrap();
    assert!(loaded.has_splash_page);

    // 快照带出生效的 splash
    let snapshot = store
        .load_snapshot(DEFAULT_SCOPE, "branded")
        .await
        .unwrap()
        .unwrap();
    let snap_splash = snapshot.splash.expect("snapshot must carry splash");
    assert_eq!(snap_splash.id, splash.id);
    assert_eq!(
        snap_splash.custom_css.as_deref(),
        Some("body{background:#000}")
    );

    // 再次 upsert 更新同一行
    let updated = store
        .upsert_splash_page(
            &link_id,
            SplashPageFields {
                template_type: TemplateType::Branded,
                is_active: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.id, splash.id);

    // 删除后父标记清零，快照不再带 splash
    store.delete_splash_page(&link_id).await.unwrap();
    let loaded = store
        .find_link(DEFAULT_SCOPE, "branded")
        .await
        .unwrap()
        .unwrap();
    assert!(!loaded.has_splash_page);
}

#[tokio::test]
async fn test_preview_upsert_and_flag() {
    let dir = tempfile::tempdir().unwrap();
    let store = sqlite_store(&dir).await;

    let link = make_link("preview", "https://example.com");
    let link_id = link.id.clone();
    store.upsert_link(link).await.unwrap();

    store
        .upsert_preview(
            &link_id,
            PreviewFields {
                og_title: Some("Example".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let loaded = store
        .find_link(DEFAULT_SCOPE, "preview")
        .await
        .unwrap()
        .unwrap();
    assert!(loaded.has_custom_preview);

    let preview = store.find_preview(&link_id).await.unwrap().unwrap();
    assert_eq!(preview.og_title.as_deref(), Some("Example"));

    store.delete_preview(&link_id).await.unwrap();
    let loaded = store
        .find_link(DEFAULT_SCOPE, "preview")
        .await
        .unwrap()
        .unwrap();
    assert!(!loaded.has_custom_preview);
    assert!(store.find_preview(&link_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_link_cascades() {
    let dir = tempfile::tempdir().unwrap();
    let store = sqlite_store(&dir).await;

    let link = make_link("gone", "https://example.com");
    let link_id = link.id.clone();
    store.upsert_link(link).await.unwrap();
    store
        .upsert_splash_page(
            &link_id,
            SplashPageFields {
                is_active: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    store.delete_link(&link_id).await.unwrap();

    assert!(store.find_link(DEFAULT_SCOPE, "gone").await.unwrap().is_none());
    assert!(store.find_splash_page(&link_id).await.unwrap().is_none());

    // 再删报 NotFound
    assert!(matches!(
        store.delete_link(&link_id).await,
        Err(LinkgateError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_set_link_flags_bumps_version() {
    let dir = tempfile::tempdir().unwrap();
    let store = sqlite_store(&dir).await;

    let link = make_link("mod", "https://example.com");
    let link_id = link.id.clone();
    store.upsert_link(link).await.unwrap();

    let before = store
        .find_link(DEFAULT_SCOPE, "mod")
        .await
        .unwrap()
        .unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    store
        .set_link_flags(&link_id, Some(true), None)
        .await
        .unwrap();

    let after = store
        .find_link(DEFAULT_SCOPE, "mod")
        .await
        .unwrap()
        .unwrap();
    assert!(after.banned);
    assert!(after.is_active, "active flag untouched");
    assert!(after.updated_at > before.updated_at);
}

#[tokio::test]
async fn test_visit_sink_batches_counts() {
    let dir = tempfile::tempdir().unwrap();
    let store = sqlite_store(&dir).await;

    let a = make_link("aaa", "https://a.example");
    let b = make_link("bbb", "https://b.example");
    let (a_id, b_id) = (a.id.clone(), b.id.clone());
    store.upsert_link(a).await.unwrap();
    store.upsert_link(b).await.unwrap();

    let visit = |link_id: &str| Visit {
        link_id: link_id.to_string(),
        visited_at: chrono::Utc::now(),
        referrer_class: Some("direct".to_string()),
        device_class: Some("pc".to_string()),
        browser_class: None,
        country: None,
    };

    store
        .flush_visits(
            vec![visit(&a_id), visit(&a_id), visit(&b_id)],
            vec![(a_id.clone(), 2), (b_id.clone(), 1)],
        )
        .await
        .unwrap();

    assert_eq!(
        store
            .find_link(DEFAULT_SCOPE, "aaa")
            .await
            .unwrap()
            .unwrap()
            .visit_count,
        2
    );
    assert_eq!(
        store
            .find_link(DEFAULT_SCOPE, "bbb")
            .await
            .unwrap()
            .unwrap()
            .visit_count,
        1
    );

    // 计数只增不减
    store
        .flush_visits(vec![visit(&a_id)], vec![(a_id.clone(), 1)])
        .await
        .unwrap();
    assert_eq!(
        store
            .find_link(DEFAULT_SCOPE, "aaa")
            .await
            .unwrap()
            .unwrap()
            .visit_count,
        3
    );
}
