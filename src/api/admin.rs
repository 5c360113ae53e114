//! 管理端透传路由
//!
//! 链接 / splash / 预览的 CRUD 透传到服务层，服务层保证写后失效。
//! 鉴权由部署前置层负责，不在本服务范围内。

use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::errors::LinkgateError;
use crate::services::{LinkCreate, LinkService, LinkUpdate, PageService};
use crate::storage::{
    BrandingConfig, Link, PreviewFields, SplashPageFields, TemplateType, TwitterCardType,
};

#[derive(Deserialize)]
struct CreateLinkRequest {
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    code: Option<String>,
    target: String,
    #[serde(default)]
    owner_id: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct UpdateLinkRequest {
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    clear_expiry: bool,
    #[serde(default)]
    is_active: Option<bool>,
}

#[derive(Deserialize)]
struct FlagsRequest {
    #[serde(default)]
    banned: Option<bool>,
    #[serde(default)]
    is_active: Option<bool>,
}

#[derive(Deserialize)]
struct BulkBanRequest {
    link_ids: Vec<String>,
}

#[derive(Deserialize)]
struct SplashRequest {
    #[serde(default)]
    template_type: TemplateType,
    #[serde(default)]
    custom_html: Option<String>,
    #[serde(default)]
    custom_css: Option<String>,
    #[serde(default)]
    branding: Option<BrandingConfig>,
    #[serde(default = "default_is_active")]
    is_active: bool,
}

fn default_is_active() -> bool {
    true
}

#[derive(Deserialize)]
struct PreviewRequest {
    #[serde(default)]
    og_title: Option<String>,
    #[serde(default)]
    og_description: Option<String>,
    #[serde(default)]
    og_image_url: Option<String>,
    #[serde(default)]
    twitter_card_type: TwitterCardType,
    #[serde(default)]
    custom_preview_config: Option<serde_json::Value>,
    #[serde(default)]
    auto_generated: bool,
}

/// 对外的链接视图，不携带密码哈希
#[derive(Serialize)]
struct LinkResponse {
    id: String,
    scope: String,
    code: String,
    target: String,
    owner_id: Option<String>,
    has_password: bool,
    expires_at: Option<DateTime<Utc>>,
    banned: bool,
    is_active: bool,
    visit_count: i64,
    has_splash_page: bool,
    has_custom_preview: bool,
    created_at: DateTime<Utc>,
}

impl From<Link> for LinkResponse {
    fn from(link: Link) -> Self {
        Self {
            id: link.id,
            scope: link.scope,
            code: link.code,
            target: link.target,
            owner_id: link.owner_id,
            has_password: link.password_hash.is_some(),
            expires_at: link.expires_at,
            banned: link.banned,
            is_active: link.is_active,
            visit_count: link.visit_count,
            has_splash_page: link.has_splash_page,
            has_custom_preview: link.has_custom_preview,
            created_at: link.created_at,
        }
    }
}

fn error_response(e: LinkgateError) -> HttpResponse {
    match &e {
        LinkgateError::NotFound(_) => {
            HttpResponse::NotFound().json(serde_json::json!({ "error": "not found" }))
        }
        LinkgateError::Validation(msg) => {
            HttpResponse::BadRequest().json(serde_json::json!({ "error": msg }))
        }
        _ => {
            error!("Admin operation failed [{}]: {}", e.code(), e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": "internal error" }))
        }
    }
}

async fn create_link(
    body: web::Json<CreateLinkRequest>,
    links: web::Data<Arc<LinkService>>,
) -> impl Responder {
    let req = body.into_inner();
    let create = LinkCreate {
        scope: req.scope.unwrap_or_default(),
        code: req.code,
        target: req.target,
        owner_id: req.owner_id,
        password: req.password,
        expires_at: req.expires_at,
    };

    match links.create_link(create).await {
        Ok(link) => HttpResponse::Created().json(LinkResponse::from(link)),
        Err(e) => error_response(e),
    }
}

async fn update_link(
    path: web::Path<String>,
    body: web::Json<UpdateLinkRequest>,
    links: web::Data<Arc<LinkService>>,
) -> impl Responder {
    let req = body.into_inner();
    let update = LinkUpdate {
        target: req.target,
        password: req.password,
        expires_at: req.expires_at,
        clear_expiry: req.clear_expiry,
        is_active: req.is_active,
    };

    match links.update_link(&path, update).await {
        Ok(link) => HttpResponse::Ok().json(LinkResponse::from(link)),
        Err(e) => error_response(e),
    }
}

async fn delete_link(
    path: web::Path<String>,
    links: web::Data<Arc<LinkService>>,
) -> impl Responder {
    match links.delete_link(&path).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => error_response(e),
    }
}

async fn set_flags(
    path: web::Path<String>,
    body: web::Json<FlagsRequest>,
    links: web::Data<Arc<LinkService>>,
) -> impl Responder {
    if let Some(banned) = body.banned
        && let Err(e) = links.set_banned(&path, banned).await
    {
        return error_response(e);
    }
    if let Some(is_active) = body.is_active
        && let Err(e) = links.set_active(&path, is_active).await
    {
        return error_response(e);
    }

    HttpResponse::NoContent().finish()
}

async fn bulk_ban(
    body: web::Json<BulkBanRequest>,
    links: web::Data<Arc<LinkService>>,
) -> impl Responder {
    match links.ban_links(&body.link_ids).await {
        Ok(banned) => HttpResponse::Ok().json(serde_json::json!({ "banned": banned })),
        Err(e) => error_response(e),
    }
}

async fn get_splash(
    path: web::Path<String>,
    pages: web::Data<Arc<PageService>>,
) -> impl Responder {
    match pages.get_splash_page(&path).await {
        Ok(splash) => HttpResponse::Ok().json(serde_json::json!({ "splash_page": splash })),
        Err(e) => error_response(e),
    }
}

async fn upsert_splash(
    path: web::Path<String>,
    body: web::Json<SplashRequest>,
    pages: web::Data<Arc<PageService>>,
) -> impl Responder {
    let req = body.into_inner();
    let fields = SplashPageFields {
        template_type: req.template_type,
        custom_html: req.custom_html,
        custom_css: req.custom_css,
        branding: req.branding,
        is_active: req.is_active,
    };

    match pages.upsert_splash_page(&path, fields).await {
        Ok(splash) => HttpResponse::Ok().json(serde_json::json!({ "splash_page": splash })),
        Err(e) => error_response(e),
    }
}

async fn delete_splash(
    path: web::Path<String>,
    pages: web::Data<Arc<PageService>>,
) -> impl Responder {
    match pages.delete_splash_page(&path).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        Err(e) => error_response(e),
    }
}

async fn get_preview(
    path: web::Path<String>,
    pages: web::Data<Arc<PageService>>,
) -> impl Responder {
    match pages.get_preview(&path).await {
        Ok(preview) => HttpResponse::Ok().json(serde_json::json!({ "preview": preview })),
        Err(e) => error_response(e),
    }
}

async fn upsert_preview(
    path: web::Path<String>,
    body: web::Json<PreviewRequest>,
    pages: web::Data<Arc<PageService>>,
) -> impl Responder {
    let req = body.into_inner();
    let fields = PreviewFields {
        og_title: req.og_title,
        og_description: req.og_description,
        og_image_url: req.og_image_url,
        twitter_card_type: req.twitter_card_type,
        custom_preview_config: req.custom_preview_config,
        auto_generated: req.auto_generated,
    };

    match pages.upsert_preview(&path, fields).await {
        Ok(preview) => HttpResponse::Ok().json(serde_json::json!({ "preview": preview })),
        Err(e) => error_response(e),
    }
}

async fn delete_preview(
    path: web::Path<String>,
    pages: web::Data<Arc<PageService>>,
) -> impl Responder {
    match pages.delete_preview(&path).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        Err(e) => error_response(e),
    }
}

/// 管理端路由配置
pub fn admin_routes() -> actix_web::Scope {
    web::scope("/api")
        .route("/links", web::post().to(create_link))
        .route("/links/bulk-ban", web::post().to(bulk_ban))
        .route("/links/{id}", web::patch().to(update_link))
        .route("/links/{id}", web::delete().to(delete_link))
        .route("/links/{id}/flags", web::put().to(set_flags))
        .route("/links/{id}/splash", web::get().to(get_splash))
        .route("/links/{id}/splash", web::put().to(upsert_splash))
        .route("/links/{id}/splash", web::delete().to(delete_splash))
        .route("/links/{id}/preview", web::get().to(get_preview))
        .route("/links/{id}/preview", web::put().to(upsert_preview))
        .route("/links/{id}/preview", web::delete().to(delete_preview))
}
