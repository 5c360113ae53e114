//! 跳转入口
//!
//! 解析 Host/路径得到 (scope, code)，调用 Resolver 并把 Outcome
//! 渲染为 HTTP 响应。所有拒绝原因共用同一张「链接不可用」页面，
//! 不向外泄露封禁 / 停用 / 不存在的差别。

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::Deserialize;
use tracing::trace;

use crate::config::get_config;
use crate::services::policy::{Outcome, RejectReason, RequestContext};
use crate::services::resolver::Resolver;
use crate::storage::SplashPage;
use crate::utils::{issue_splash_ack, verify_splash_ack};

#[derive(Deserialize)]
pub struct PasswordForm {
    password: String,
}

pub struct RedirectService {}

impl RedirectService {
    pub async fn handle_root() -> impl Responder {
        let config = get_config();
        match &config.server.default_url {
            Some(url) if !url.is_empty() => HttpResponse::TemporaryRedirect()
                .insert_header(("Location", url.as_str()))
                .finish(),
            _ => Self::unavailable_response(),
        }
    }

    pub async fn handle_redirect(
        req: HttpRequest,
        path: web::Path<String>,
        resolver: web::Data<Arc<Resolver>>,
    ) -> impl Responder {
        let code = path.into_inner();
        let scope = Self::scope_from_request(&req);
        let ctx = Self::build_context(&req, &scope, &code, None);

        let outcome = resolver.resolve(&scope, &code, &ctx).await;
        Self::render_outcome(&scope, &code, outcome, false)
    }

    /// 密码表单提交走 POST，密码不落在 URL 和访问日志里
    pub async fn handle_password(
        req: HttpRequest,
        path: web::Path<String>,
        form: web::Form<PasswordForm>,
        resolver: web::Data<Arc<Resolver>>,
    ) -> impl Responder {
        let code = path.into_inner();
        let scope = Self::scope_from_request(&req);
        let ctx = Self::build_context(&req, &scope, &code, Some(form.into_inner().password));

        let outcome = resolver.resolve(&scope, &code, &ctx).await;
        Self::render_outcome(&scope, &code, outcome, true)
    }

    /// Host 与主域一致落在默认 scope，其余按自定义域处理
    fn scope_from_request(req: &HttpRequest) -> String {
        let host = req.connection_info().host().to_string();
        let host = host.split(':').next().unwrap_or("").to_ascii_lowercase();

        if host.is_empty() || host == get_config().server.primary_domain.to_ascii_lowercase() {
            String::new()
        } else {
            host
        }
    }

    fn build_context(
        req: &HttpRequest,
        scope: &str,
        code: &str,
        password: Option<String>,
    ) -> RequestContext {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|h| h.to_str().ok())
                .map(String::from)
        };

        let splash_acknowledged = Self::query_param(req.query_string(), "ack")
            .map(|token| {
                verify_splash_ack(
                    &token,
                    scope,
                    code,
                    &get_config().server.ack_seed,
                    chrono::Utc::now(),
                )
            })
            .unwrap_or(false);

        RequestContext {
            password,
            splash_acknowledged,
            referrer: header("referer"),
            user_agent: header("user-agent"),
            country: header("cf-ipcountry").or_else(|| header("x-country")),
        }
    }

    fn query_param(query: &str, key: &str) -> Option<String> {
        query.split('&').find_map(|part| {
            part.strip_prefix(key)
                .and_then(|s| s.strip_prefix('='))
                .map(String::from)
        })
    }

    fn render_outcome(
        scope: &str,
        code: &str,
        outcome: Outcome,
        password_attempted: bool,
    ) -> HttpResponse {
        match outcome {
            Outcome::Redirect(target) => HttpResponse::build(StatusCode::TEMPORARY_REDIRECT)
                .insert_header(("Location", target))
                .finish(),
            Outcome::RequirePassword => {
                trace!("Password required for code: {}", code);
                Self::password_prompt(code, password_attempted)
            }
            Outcome::RequireSplash(splash) => Self::splash_response(scope, code, &splash),
            Outcome::Rejected(RejectReason::ServiceUnavailable) => Self::error_response(),
            Outcome::Rejected(_) => Self::unavailable_response(),
        }
    }

    /// 所有拒绝原因共用的页面，对外不可区分
    #[inline]
    fn unavailable_response() -> HttpResponse {
        HttpResponse::build(StatusCode::NOT_FOUND)
            .insert_header(("Content-Type", "text/html; charset=utf-8"))
            .insert_header(("Cache-Control", "public, max-age=60"))
            .body(
                "<!DOCTYPE html><html><head><title>Link unavailable</title></head>\
                 <body><h1>Link unavailable</h1>\
                 <p>This link does not exist or is no longer available.</p></body></html>",
            )
    }

    #[inline]
    fn error_response() -> HttpResponse {
        HttpResponse::build(StatusCode::SERVICE_UNAVAILABLE)
            .insert_header(("Content-Type", "text/html; charset=utf-8"))
            .body(
                "<!DOCTYPE html><html><head><title>Service unavailable</title></head>\
                 <body><h1>Service temporarily unavailable</h1>\
                 <p>Please try again shortly.</p></body></html>",
            )
    }

    fn password_prompt(code: &str, wrong: bool) -> HttpResponse {
        // 错误提示保持笼统，不泄露尝试次数或链接状态
        let notice = if wrong {
            "<p class=\"error\">Incorrect password. Please try again.</p>"
        } else {
            ""
        };

        let body = format!(
            "<!DOCTYPE html><html><head><title>Password required</title>\
             <style>.error{{color:#b91c1c}}</style></head><body>\
             <h1>This link is password protected</h1>{}\
             <form method=\"post\" action=\"/{}\">\
             <input type=\"password\" name=\"password\" autofocus>\
             <button type=\"submit\">Continue</button>\
             </form></body></html>",
            notice, code
        );

        HttpResponse::build(StatusCode::UNAUTHORIZED)
            .insert_header(("Content-Type", "text/html; charset=utf-8"))
            .body(body)
    }

    fn splash_response(scope: &str, code: &str, splash: &SplashPage) -> HttpResponse {
        let config = get_config();
        let token = issue_splash_ack(scope, code, &config.server.ack_seed, chrono::Utc::now());
        let continue_url = format!("/{}?ack={}", code, token);

        let branding = splash.branding.clone().unwrap_or_default();
        let title = html_escape(branding.title.as_deref().unwrap_or("You are being redirected"));
        let description = html_escape(branding.description.as_deref().unwrap_or(""));

        let auto_redirect = if branding.auto_redirect {
            format!(
                "<meta http-equiv=\"refresh\" content=\"{};url={}\">",
                branding.redirect_delay_secs, continue_url
            )
        } else {
            String::new()
        };

        let custom_css = splash
            .custom_css
            .as_deref()
            .map(|css| format!("<style>{}</style>", css))
            .unwrap_or_default();
        let custom_html = splash.custom_html.as_deref().unwrap_or("");

        let body = format!(
            "<!DOCTYPE html><html><head><title>{}</title>{}{}</head><body \
             data-template=\"{}\">\
             <h1>{}</h1><p>{}</p>{}\
             <a href=\"{}\">Continue</a>\
             </body></html>",
            title,
            auto_redirect,
            custom_css,
            splash.template_type.as_ref(),
            title,
            description,
            custom_html,
            continue_url
        );

        HttpResponse::build(StatusCode::OK)
            .insert_header(("Content-Type", "text/html; charset=utf-8"))
            .insert_header(("Cache-Control", "no-store"))
            .body(body)
    }
}

fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Redirect 路由配置
pub fn redirect_routes() -> actix_web::Scope {
    web::scope("")
        .route("/", web::get().to(RedirectService::handle_root))
        .route("/{code}", web::get().to(RedirectService::handle_redirect))
        .route("/{code}", web::head().to(RedirectService::handle_redirect))
        .route("/{code}", web::post().to(RedirectService::handle_password))
}
