use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, HttpServer, web};
use tracing::info;

use linkgate::analytics::{VisitRecorder, VisitSink};
use linkgate::api;
use linkgate::cache::{MokaSnapshotCache, SnapshotCache};
use linkgate::config::{AppConfig, get_config, init_config};
use linkgate::services::{LinkService, PageService, Resolver};
use linkgate::storage::{LinkStore, StoreFactory};
use linkgate::system::{logging, shutdown};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    init_config(AppConfig::load());
    let config = get_config();

    let _log_guard = logging::init_logging(&config.logging);

    let store = StoreFactory::create()
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    // 缓存与访问队列在进程启动时构造一次，无其他全局可变状态
    let cache: Arc<dyn SnapshotCache> = Arc::new(MokaSnapshotCache::new(&config.cache));
    let recorder = Arc::new(VisitRecorder::start(
        Arc::clone(&store) as Arc<dyn VisitSink>,
        &config.visits,
    ));

    let store: Arc<dyn LinkStore> = store;
    let resolver = Arc::new(Resolver::new(
        Arc::clone(&cache),
        Arc::clone(&store),
        Arc::clone(&recorder),
        Duration::from_millis(config.cache.flight_wait_ms),
    ));
    let link_service = Arc::new(LinkService::new(Arc::clone(&store), Arc::clone(&cache)));
    let page_service = Arc::new(PageService::new(Arc::clone(&store), Arc::clone(&cache)));

    let resolver_data = web::Data::new(resolver);
    let link_data = web::Data::new(link_service);
    let page_data = web::Data::new(page_service);

    info!(
        "linkgate listening on {}:{}",
        config.server.host, config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(resolver_data.clone())
            .app_data(link_data.clone())
            .app_data(page_data.clone())
            .service(api::admin_routes())
            // 跳转路由必须最后注册，兜住其余所有路径
            .service(api::redirect_routes())
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    // HTTP 服务退出（ctrl-c）后在宽限期内排空访问队列
    shutdown::perform_shutdown_tasks(
        &recorder,
        Duration::from_secs(config.visits.shutdown_grace_secs),
    )
    .await;

    Ok(())
}
