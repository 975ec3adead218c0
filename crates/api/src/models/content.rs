//! Marketing content: site settings, hero slides, client logos and HTML
//! content sections.
//!
//! Image fields are plain URLs; uploads happen elsewhere. HTML bodies are
//! stored as given.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shipdesk_core::{ClientLogoId, ContentSectionId, HeroSlideId};

use super::{FieldErrors, trim_in_place, trim_optional};

/// Company-wide settings (singleton).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteSettings {
    pub company_name: String,
    pub tagline: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    /// Network name to profile URL (`linkedin` -> `https://...`).
    pub social_links: BTreeMap<String, String>,
    pub logo_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SiteSettingsInput {
    pub company_name: String,
    pub tagline: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub social_links: BTreeMap<String, String>,
    pub logo_url: Option<String>,
}

impl SiteSettingsInput {
    #[must_use]
    pub fn normalized(mut self) -> Self {
        trim_in_place(&mut self.company_name);
        trim_optional(&mut self.tagline);
        trim_optional(&mut self.contact_email);
        trim_optional(&mut self.contact_phone);
        trim_optional(&mut self.address);
        trim_optional(&mut self.logo_url);
        self.social_links.retain(|_, url| !url.trim().is_empty());
        self
    }

    pub fn validate(&self, errors: &mut FieldErrors) {
        errors.require("company_name", &self.company_name);
    }
}

/// A slide of the landing page carousel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeroSlide {
    pub id: HeroSlideId,
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    pub cta_label: Option<String>,
    pub cta_url: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewHeroSlide {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub cta_label: Option<String>,
    #[serde(default)]
    pub cta_url: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl NewHeroSlide {
    #[must_use]
    pub fn normalized(mut self) -> Self {
        trim_in_place(&mut self.title);
        trim_in_place(&mut self.image_url);
        trim_optional(&mut self.subtitle);
        trim_optional(&mut self.cta_label);
        trim_optional(&mut self.cta_url);
        self
    }

    pub fn validate(&self, errors: &mut FieldErrors) {
        errors.require("title", &self.title);
        errors.require("image_url", &self.image_url);
    }
}

/// A customer logo shown on the landing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientLogo {
    pub id: ClientLogoId,
    pub name: String,
    pub logo_url: String,
    pub website_url: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NewClientLogo {
    pub name: String,
    pub logo_url: String,
    pub website_url: Option<String>,
    pub sort_order: i32,
}

impl NewClientLogo {
    #[must_use]
    pub fn normalized(mut self) -> Self {
        trim_in_place(&mut self.name);
        trim_in_place(&mut self.logo_url);
        trim_optional(&mut self.website_url);
        self
    }

    pub fn validate(&self, errors: &mut FieldErrors) {
        errors.require("name", &self.name);
        errors.require("logo_url", &self.logo_url);
    }
}

/// A named block of HTML (about us, services, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentSection {
    pub id: ContentSectionId,
    pub slug: String,
    pub title: String,
    pub body_html: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update payload for a content section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContentSectionInput {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body_html: String,
    #[serde(default = "default_true")]
    pub is_published: bool,
}

impl ContentSectionInput {
    /// Maximum slug length.
    pub const MAX_SLUG_LENGTH: usize = 100;

    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.slug = self.slug.trim().to_lowercase();
        trim_in_place(&mut self.title);
        self
    }

    pub fn validate(&self, errors: &mut FieldErrors) {
        if self.slug.is_empty() {
            errors.add("slug", "is required");
        } else if self.slug.len() > Self::MAX_SLUG_LENGTH {
            errors.add(
                "slug",
                format!("must be at most {} characters", Self::MAX_SLUG_LENGTH),
            );
        } else if !is_slug(&self.slug) {
            errors.add("slug", "may only contain a-z, 0-9 and single dashes");
        }
        errors.require("title", &self.title);
    }
}

fn is_slug(s: &str) -> bool {
    s.bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        && !s.starts_with('-')
        && !s.ends_with('-')
        && !s.contains("--")
}

const fn default_true() -> bool {
    true
}
