//! 解析策略评估
//!
//! 纯函数：快照 + 请求上下文 → 结果。对全部输入都有定义，
//! 绝不抛错；存储故障在进入评估前就折算为 ServiceUnavailable。

use chrono::{DateTime, Utc};

use crate::storage::{LinkSnapshot, SplashPage};
use crate::utils::password::verify_password;

/// 请求上下文（由 HTTP 层解析填充）
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// 随请求提交的明文密码
    pub password: Option<String>,
    /// splash 插页是否已确认（HTTP 层校验标记后置位）
    pub splash_acknowledged: bool,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub country: Option<String>,
}

/// 解析结果
#[derive(Debug, Clone)]
pub enum Outcome {
    Redirect(String),
    RequireSplash(SplashPage),
    /// 覆盖「未提供密码」和「密码错误」两种情况
    RequirePassword,
    Rejected(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NotFound,
    Banned,
    Disabled,
    Expired,
    ServiceUnavailable,
}

/// 按固定顺序评估，先命中先返回：
/// 不存在 → 封禁 → 停用 → 过期（边界含等于）→ 密码 → splash → 跳转
pub fn evaluate(
    snapshot: Option<&LinkSnapshot>,
    ctx: &RequestContext,
    now: DateTime<Utc>,
) -> Outcome {
    let Some(snapshot) = snapshot else {
        return Outcome::Rejected(RejectReason::NotFound);
    };
    let link = &snapshot.link;

    if link.banned {
        return Outcome::Rejected(RejectReason::Banned);
    }
    if !link.is_active {
        return Outcome::Rejected(RejectReason::Disabled);
    }
    if link.is_expired(now) {
        return Outcome::Rejected(RejectReason::Expired);
    }

    if let Some(hash) = &link.password_hash {
        let verified = ctx
            .password
            .as_deref()
            .is_some_and(|supplied| verify_password(supplied, hash));
        if !verified {
            return Outcome::RequirePassword;
        }
    }

    if let Some(splash) = &snapshot.splash
        && splash.is_active
        && !ctx.splash_acknowledged
    {
        return Outcome::RequireSplash(splash.clone());
    }

    Outcome::Redirect(link.target.clone())
}
