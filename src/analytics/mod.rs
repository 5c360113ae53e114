//! 访问记录与粗粒度分类
//!
//! 每次放行的跳转产出一条 Visit 事实记录；上下文只保留粗分类
//! （来源、设备、浏览器、国家），不落原始 UA / Referer。

pub mod recorder;
pub mod sink;

pub use recorder::VisitRecorder;
pub use sink::{StdoutSink, VisitSink};

use chrono::Utc;
use woothee::parser::Parser;

use crate::storage::Visit;

/// 已知社交来源域名
const SOCIAL_DOMAINS: &[(&str, &str)] = &[
    ("facebook.com", "facebook"),
    ("instagram.com", "instagram"),
    ("linkedin.com", "linkedin"),
    ("reddit.com", "reddit"),
    ("t.co", "twitter"),
    ("twitter.com", "twitter"),
    ("x.com", "twitter"),
];

/// 已知搜索引擎域名
const SEARCH_DOMAINS: &[(&str, &str)] = &[
    ("baidu.com", "baidu"),
    ("bing.com", "bing"),
    ("duckduckgo.com", "duckduckgo"),
    ("google.", "google"),
    ("yandex.", "yandex"),
];

/// 从请求上下文构造 Visit 记录
pub fn visit_from_request(
    link_id: &str,
    referrer: Option<&str>,
    user_agent: Option<&str>,
    country: Option<&str>,
) -> Visit {
    let (device_class, browser_class) = classify_user_agent(user_agent);

    Visit {
        link_id: link_id.to_string(),
        visited_at: Utc::now(),
        referrer_class: Some(classify_referrer(referrer)),
        device_class,
        browser_class,
        country: country.map(|c| c.to_uppercase()),
    }
}

/// 来源分类：direct / social:x / search:x / ref:domain
pub fn classify_referrer(referrer: Option<&str>) -> String {
    let Some(domain) = referrer.and_then(extract_domain) else {
        return "direct".to_string();
    };

    for (suffix, name) in SOCIAL_DOMAINS {
        if domain == *suffix || domain.ends_with(&format!(".{}", suffix)) {
            return format!("social:{}", name);
        }
    }
    for (fragment, name) in SEARCH_DOMAINS {
        if domain.contains(fragment) {
            return format!("search:{}", name);
        }
    }

    format!("ref:{}", domain)
}

/// UA 粗分类：(设备类别, 浏览器名)
pub fn classify_user_agent(user_agent: Option<&str>) -> (Option<String>, Option<String>) {
    let Some(ua) = user_agent else {
        return (None, None);
    };

    match Parser::new().parse(ua) {
        Some(result) => (
            Some(result.category.to_string()),
            Some(result.name.to_string()),
        ),
        None => (Some("unknown".to_string()), None),
    }
}

/// 取 :// 之后、首个分隔符之前的域名部分
fn extract_domain(url: &str) -> Option<&str> {
    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);

    without_scheme
        .split(&['/', ':', '?', '#'][..])
        .next()
        .filter(|s| !s.is_empty())
}
