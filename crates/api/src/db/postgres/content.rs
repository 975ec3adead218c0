//! Site content.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;

use shipdesk_core::{ClientLogoId, ContentSectionId, HeroSlideId};

use super::{PgStore, conflict_on_unique};
use crate::db::{ContentStore, RepositoryError};
use crate::models::{
    ClientLogo, ContentSection, ContentSectionInput, HeroSlide, NewClientLogo, NewHeroSlide,
    SiteSettings, SiteSettingsInput,
};

#[derive(sqlx::FromRow)]
struct SiteSettingsRow {
    company_name: String,
    tagline: Option<String>,
    contact_email: Option<String>,
    contact_phone: Option<String>,
    address: Option<String>,
    social_links: Json<BTreeMap<String, String>>,
    logo_url: Option<String>,
    updated_at: DateTime<Utc>,
}

impl From<SiteSettingsRow> for SiteSettings {
    fn from(row: SiteSettingsRow) -> Self {
        Self {
            company_name: row.company_name,
            tagline: row.tagline,
            contact_email: row.contact_email,
            contact_phone: row.contact_phone,
            address: row.address,
            social_links: row.social_links.0,
            logo_url: row.logo_url,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct HeroSlideRow {
    id: HeroSlideId,
    title: String,
    subtitle: Option<String>,
    image_url: String,
    cta_label: Option<String>,
    cta_url: Option<String>,
    sort_order: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<HeroSlideRow> for HeroSlide {
    fn from(row: HeroSlideRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            subtitle: row.subtitle,
            image_url: row.image_url,
            cta_label: row.cta_label,
            cta_url: row.cta_url,
            sort_order: row.sort_order,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ClientLogoRow {
    id: ClientLogoId,
    name: String,
    logo_url: String,
    website_url: Option<String>,
    sort_order: i32,
    created_at: DateTime<Utc>,
}

impl From<ClientLogoRow> for ClientLogo {
    fn from(row: ClientLogoRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            logo_url: row.logo_url,
            website_url: row.website_url,
            sort_order: row.sort_order,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ContentSectionRow {
    id: ContentSectionId,
    slug: String,
    title: String,
    body_html: String,
    is_published: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ContentSectionRow> for ContentSection {
    fn from(row: ContentSectionRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            title: row.title,
            body_html: row.body_html,
            is_published: row.is_published,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl ContentStore for PgStore {
    // =========================================================================
    // Site settings
    // =========================================================================

    async fn get_site_settings(&self) -> Result<Option<SiteSettings>, RepositoryError> {
        let row = sqlx::query_as::<_, SiteSettingsRow>(
            r"
            SELECT company_name, tagline, contact_email, contact_phone, address,
                   social_links, logo_url, updated_at
            FROM site_settings
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SiteSettings::from))
    }

    async fn upsert_site_settings(
        &self,
        settings: SiteSettingsInput,
    ) -> Result<SiteSettings, RepositoryError> {
        let row = sqlx::query_as::<_, SiteSettingsRow>(
            r"
            INSERT INTO site_settings
                (id, company_name, tagline, contact_email, contact_phone, address,
                 social_links, logo_url)
            VALUES (1, $1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE
            SET company_name = EXCLUDED.company_name,
                tagline = EXCLUDED.tagline,
                contact_email = EXCLUDED.contact_email,
                contact_phone = EXCLUDED.contact_phone,
                address = EXCLUDED.address,
                social_links = EXCLUDED.social_links,
                logo_url = EXCLUDED.logo_url,
                updated_at = now()
            RETURNING company_name, tagline, contact_email, contact_phone, address,
                      social_links, logo_url, updated_at
            ",
        )
        .bind(&settings.company_name)
        .bind(&settings.tagline)
        .bind(&settings.contact_email)
        .bind(&settings.contact_phone)
        .bind(&settings.address)
        .bind(Json(&settings.social_links))
        .bind(&settings.logo_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    // =========================================================================
    // Hero slides
    // =========================================================================

    async fn list_hero_slides(&self, active_only: bool) -> Result<Vec<HeroSlide>, RepositoryError> {
        let rows = sqlx::query_as::<_, HeroSlideRow>(
            r"
            SELECT id, title, subtitle, image_url, cta_label, cta_url, sort_order,
                   is_active, created_at
            FROM hero_slides
            WHERE is_active OR NOT $1
            ORDER BY sort_order, created_at
            ",
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(HeroSlide::from).collect())
    }

    async fn create_hero_slide(&self, slide: NewHeroSlide) -> Result<HeroSlide, RepositoryError> {
        let row = sqlx::query_as::<_, HeroSlideRow>(
            r"
            INSERT INTO hero_slides
                (id, title, subtitle, image_url, cta_label, cta_url, sort_order, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, title, subtitle, image_url, cta_label, cta_url, sort_order,
                      is_active, created_at
            ",
        )
        .bind(HeroSlideId::generate())
        .bind(&slide.title)
        .bind(&slide.subtitle)
        .bind(&slide.image_url)
        .bind(&slide.cta_label)
        .bind(&slide.cta_url)
        .bind(slide.sort_order)
        .bind(slide.is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn delete_hero_slide(&self, id: HeroSlideId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM hero_slides WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Client logos
    // =========================================================================

    async fn list_client_logos(&self) -> Result<Vec<ClientLogo>, RepositoryError> {
        let rows = sqlx::query_as::<_, ClientLogoRow>(
            r"
            SELECT id, name, logo_url, website_url, sort_order, created_at
            FROM client_logos
            ORDER BY sort_order, created_at
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ClientLogo::from).collect())
    }

    async fn create_client_logo(
        &self,
        logo: NewClientLogo,
    ) -> Result<ClientLogo, RepositoryError> {
        let row = sqlx::query_as::<_, ClientLogoRow>(
            r"
            INSERT INTO client_logos (id, name, logo_url, website_url, sort_order)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, logo_url, website_url, sort_order, created_at
            ",
        )
        .bind(ClientLogoId::generate())
        .bind(&logo.name)
        .bind(&logo.logo_url)
        .bind(&logo.website_url)
        .bind(logo.sort_order)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn delete_client_logo(&self, id: ClientLogoId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM client_logos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Content sections
    // =========================================================================

    async fn list_content_sections(
        &self,
        published_only: bool,
    ) -> Result<Vec<ContentSection>, RepositoryError> {
        let rows = sqlx::query_as::<_, ContentSectionRow>(
            r"
            SELECT id, slug, title, body_html, is_published, created_at, updated_at
            FROM content_sections
            WHERE is_published OR NOT $1
            ORDER BY title, slug
            ",
        )
        .bind(published_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ContentSection::from).collect())
    }

    async fn get_content_section_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<ContentSection>, RepositoryError> {
        let row = sqlx::query_as::<_, ContentSectionRow>(
            r"
            SELECT id, slug, title, body_html, is_published, created_at, updated_at
            FROM content_sections
            WHERE slug = $1
            ",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ContentSection::from))
    }

    async fn create_content_section(
        &self,
        section: ContentSectionInput,
    ) -> Result<ContentSection, RepositoryError> {
        let row = sqlx::query_as::<_, ContentSectionRow>(
            r"
            INSERT INTO content_sections (id, slug, title, body_html, is_published)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, slug, title, body_html, is_published, created_at, updated_at
            ",
        )
        .bind(ContentSectionId::generate())
        .bind(&section.slug)
        .bind(&section.title)
        .bind(&section.body_html)
        .bind(section.is_published)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "slug already exists"))?;

        Ok(row.into())
    }

    async fn update_content_section(
        &self,
        id: ContentSectionId,
        section: ContentSectionInput,
    ) -> Result<Option<ContentSection>, RepositoryError> {
        let row = sqlx::query_as::<_, ContentSectionRow>(
            r"
            UPDATE content_sections
            SET slug = $2, title = $3, body_html = $4, is_published = $5, updated_at = now()
            WHERE id = $1
            RETURNING id, slug, title, body_html, is_published, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(&section.slug)
        .bind(&section.title)
        .bind(&section.body_html)
        .bind(section.is_published)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "slug already exists"))?;

        Ok(row.map(ContentSection::from))
    }

    async fn delete_content_section(&self, id: ContentSectionId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM content_sections WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
