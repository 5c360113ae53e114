//! Entity Model 与领域类型互转

use std::str::FromStr;

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use tracing::warn;

use crate::storage::models::{
    BrandingConfig, Link, LinkPreview, SplashPage, TemplateType, TwitterCardType, Visit,
};
use crate::storage::{PreviewFields, SplashPageFields};

use migration::entities::{link, link_preview, splash_page, visit};

pub fn model_to_link(model: link::Model) -> Link {
    Link {
        id: model.id,
        scope: model.scope,
        code: model.short_code,
        target: model.target_url,
        owner_id: model.owner_id,
        password_hash: model.password,
        expires_at: model.expires_at,
        banned: model.banned,
        is_active: model.is_active,
        visit_count: model.visit_count,
        has_splash_page: model.has_splash_page,
        has_custom_preview: model.has_custom_preview,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

pub fn link_to_active_model(link: &Link) -> link::ActiveModel {
    link::ActiveModel {
        id: Set(link.id.clone()),
        scope: Set(link.scope.clone()),
        short_code: Set(link.code.clone()),
        target_url: Set(link.target.clone()),
        owner_id: Set(link.owner_id.clone()),
        password: Set(link.password_hash.clone()),
        expires_at: Set(link.expires_at),
        banned: Set(link.banned),
        is_active: Set(link.is_active),
        visit_count: Set(link.visit_count),
        has_splash_page: Set(link.has_splash_page),
        has_custom_preview: Set(link.has_custom_preview),
        created_at: Set(link.created_at),
        updated_at: Set(link.updated_at),
    }
}

pub fn model_to_splash_page(model: splash_page::Model) -> SplashPage {
    let branding = model.branding_config.as_deref().and_then(|raw| {
        serde_json::from_str::<BrandingConfig>(raw)
            .map_err(|e| {
                warn!("Discarding malformed branding_config for {}: {}", model.link_id, e);
                e
            })
            .ok()
    });

    SplashPage {
        id: model.id,
        link_id: model.link_id,
        template_type: TemplateType::from_str(&model.template_type).unwrap_or_default(),
        custom_html: model.custom_html,
        custom_css: model.custom_css,
        branding,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

pub fn splash_fields_to_active_model(
    id: String,
    link_id: &str,
    fields: &SplashPageFields,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
) -> splash_page::ActiveModel {
    let branding_config = fields
        .branding
        .as_ref()
        .and_then(|b| serde_json::to_string(b).ok());

    splash_page::ActiveModel {
        id: Set(id),
        link_id: Set(link_id.to_string()),
        template_type: Set(fields.template_type.as_ref().to_string()),
        custom_html: Set(fields.custom_html.clone()),
        custom_css: Set(fields.custom_css.clone()),
        branding_config: Set(branding_config),
        is_active: Set(fields.is_active),
        created_at: Set(created_at),
        updated_at: Set(updated_at),
    }
}

pub fn model_to_preview(model: link_preview::Model) -> LinkPreview {
    let custom_preview_config = model
        .custom_preview_config
        .as_deref()
        .and_then(|raw| serde_json::from_str(raw).ok());

    LinkPreview {
        id: model.id,
        link_id: model.link_id,
        og_title: model.og_title,
        og_description: model.og_description,
        og_image_url: model.og_image_url,
        twitter_card_type: TwitterCardType::from_str(&model.twitter_card_type).unwrap_or_default(),
        custom_preview_config,
        auto_generated: model.auto_generated,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

pub fn preview_fields_to_active_model(
    id: String,
    link_id: &str,
    fields: &PreviewFields,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
) -> link_preview::ActiveModel {
    let custom_preview_config = fields
        .custom_preview_config
        .as_ref()
        .and_then(|v| serde_json::to_string(v).ok());

    link_preview::ActiveModel {
        id: Set(id),
        link_id: Set(link_id.to_string()),
        og_title: Set(fields.og_title.clone()),
        og_description: Set(fields.og_description.clone()),
        og_image_url: Set(fields.og_image_url.clone()),
        twitter_card_type: Set(fields.twitter_card_type.as_ref().to_string()),
        custom_preview_config: Set(custom_preview_config),
        auto_generated: Set(fields.auto_generated),
        created_at: Set(created_at),
        updated_at: Set(updated_at),
    }
}

pub fn visit_to_active_model(v: &Visit) -> visit::ActiveModel {
    visit::ActiveModel {
        link_id: Set(v.link_id.clone()),
        visited_at: Set(v.visited_at),
        referrer_class: Set(v.referrer_class.clone()),
        device_class: Set(v.device_class.clone()),
        browser_class: Set(v.browser_class.clone()),
        country: Set(v.country.clone()),
        ..Default::default()
    }
}
