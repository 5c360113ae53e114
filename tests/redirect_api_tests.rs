//! HTTP 层渲染：307 跳转、统一不可用页、密码表单、splash 确认

mod common;

use std::sync::Arc;
use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use chrono::Utc;

use common::{CapturingSink, MockStore, make_link};
use linkgate::analytics::{VisitRecorder, VisitSink};
use linkgate::api;
use linkgate::cache::{MokaSnapshotCache, SnapshotCache};
use linkgate::config::{CacheConfig, VisitConfig, get_config};
use linkgate::services::Resolver;
use linkgate::storage::{LinkStore, SplashPageFields};
use linkgate::utils::issue_splash_ack;
use linkgate::utils::password::hash_password;

async fn body_of<B>(resp: actix_web::dev::ServiceResponse<B>) -> String
where
    B: actix_web::body::MessageBody,
{
    let bytes = test::read_body(resp).await;
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn resolver_for(store: Arc<MockStore>) -> Arc<Resolver> {
    let cache: Arc<dyn SnapshotCache> = Arc::new(MokaSnapshotCache::new(&CacheConfig::default()));
    let recorder = Arc::new(VisitRecorder::start(
        Arc::new(CapturingSink::default()) as Arc<dyn VisitSink>,
        &VisitConfig::default(),
    ));
    Arc::new(Resolver::new(
        cache,
        store as Arc<dyn LinkStore>,
        recorder,
        Duration::from_millis(500),
    ))
}

macro_rules! test_app {
    ($resolver:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(Arc::clone(&$resolver)))
                .service(api::redirect_routes()),
        )
        .await
    };
}

#[actix_rt::test]
async fn test_redirect_is_307_with_location() {
    let store = Arc::new(MockStore::new().with_link(make_link("abc123", "https://example.com")));
    let resolver = resolver_for(store);
    let app = test_app!(resolver);

    let req = test::TestRequest::get().uri("/abc123").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        resp.headers().get("Location").unwrap(),
        "https://example.com"
    );
}

#[actix_rt::test]
async fn test_all_reject_reasons_render_identical_page() {
    let mut banned = make_link("banned", "https://example.com");
    banned.banned = true;
    let mut disabled = make_link("disabled", "https://example.com");
    disabled.is_active = false;
    let mut expired = make_link("expired", "https://example.com");
    expired.expires_at = Some(Utc::now() - chrono::Duration::hours(1));

    let store = Arc::new(
        MockStore::new()
            .with_link(banned)
            .with_link(disabled)
            .with_link(expired),
    );
    let resolver = resolver_for(store);
    let app = test_app!(resolver);

    let mut bodies = Vec::new();
    for code in ["banned", "disabled", "expired", "nosuchcode"] {
        let req = test::TestRequest::get()
            .uri(&format!("/{}", code))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "code: {}", code);
        bodies.push(body_of(resp).await);
    }

    // 对外不可区分：四种拒绝原因的响应体完全一致
    assert!(bodies.windows(2).all(|w| w[0] == w[1]));
}

#[actix_rt::test]
async fn test_password_prompt_and_submit() {
    let mut link = make_link("secret", "https://example.com");
    link.password_hash = Some(hash_password("hunter2").unwrap());
    let store = Arc::new(MockStore::new().with_link(link));
    let resolver = resolver_for(store);
    let app = test_app!(resolver);

    // GET 渲染表单
    let req = test::TestRequest::get().uri("/secret").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_of(resp).await;
    assert!(body.contains("password"));
    assert!(!body.contains("Incorrect"));

    // 错误密码：重新渲染表单，带笼统错误
    let req = test::TestRequest::post()
        .uri("/secret")
        .set_form([("password", "guess")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(body_of(resp).await.contains("Incorrect password"));

    // 正确密码：跳转
    let req = test::TestRequest::post()
        .uri("/secret")
        .set_form([("password", "hunter2")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[actix_rt::test]
async fn test_splash_page_then_ack_redirects() {
    let link = make_link("branded", "https://example.com");
    let link_id = link.id.clone();
    let store = Arc::new(MockStore::new().with_link(link));
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

    let resolver = resolver_for(store);
    let app = test_app!(resolver);

    // 无确认标记：渲染插页，带 Continue 链接
    let req = test::TestRequest::get().uri("/branded").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_of(resp).await.contains("?ack="));

    // 携带有效标记：放行
    let token = issue_splash_ack("", "branded", &get_config().server.ack_seed, Utc::now());
    let req = test::TestRequest::get()
        .uri(&format!("/branded?ack={}", token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);

    // 伪造标记不放行
    let req = test::TestRequest::get()
        .uri("/branded?ack=123.forged")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_store_failure_renders_503() {
    let store = Arc::new(MockStore::new());
    store
        .fail_reads
        .store(true, std::sync::atomic::Ordering::SeqCst);
    let resolver = resolver_for(store);
    let app = test_app!(resolver);

    let req = test::TestRequest::get().uri("/anything").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}
