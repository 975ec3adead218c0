//! Marketing content: site settings, hero slides, client logos and
//! content sections. Reads are public; writes need an admin token.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};

use shipdesk_core::{ClientLogoId, ContentSectionId, HeroSlideId};

use crate::db::ContentStore;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{
    ClientLogo, ContentSection, ContentSectionInput, FieldErrors, HeroSlide, NewClientLogo,
    NewHeroSlide, SiteSettings, SiteSettingsInput,
};
use crate::state::AppState;

type JsonBody<T> = std::result::Result<Json<T>, JsonRejection>;
type PathId<T> = std::result::Result<Path<T>, PathRejection>;

/// Run a payload's field checks, failing with every problem found.
fn check(validate: impl FnOnce(&mut FieldErrors)) -> Result<()> {
    let mut errors = FieldErrors::new();
    validate(&mut errors);
    errors.into_result().map_err(AppError::Validation)
}

/// 204 when something was deleted, 404 otherwise.
fn deleted(found: bool, what: &str) -> Result<StatusCode> {
    if found {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(what))
    }
}

// =============================================================================
// Site settings
// =============================================================================

/// `GET /api/site-settings`: `null` until first saved.
pub async fn site_settings(State(state): State<AppState>) -> Result<Json<Option<SiteSettings>>> {
    Ok(Json(state.store().get_site_settings().await?))
}

/// `PUT /api/site-settings`
pub async fn update_site_settings(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    body: JsonBody<SiteSettingsInput>,
) -> Result<Json<SiteSettings>> {
    let Json(input) = body?;
    let input = input.normalized();
    check(|errors| input.validate(errors))?;

    let settings = state.store().upsert_site_settings(input).await?;
    tracing::info!(admin_id = %admin.id, "Site settings updated");
    Ok(Json(settings))
}

// =============================================================================
// Hero slides
// =============================================================================

/// `GET /api/hero-slides`: active slides in display order.
pub async fn hero_slides(State(state): State<AppState>) -> Result<Json<Vec<HeroSlide>>> {
    Ok(Json(state.store().list_hero_slides(true).await?))
}

/// `POST /api/hero-slides`
pub async fn create_hero_slide(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    body: JsonBody<NewHeroSlide>,
) -> Result<(StatusCode, Json<HeroSlide>)> {
    let Json(input) = body?;
    let input = input.normalized();
    check(|errors| input.validate(errors))?;

    let slide = state.store().create_hero_slide(input).await?;
    Ok((StatusCode::CREATED, Json(slide)))
}

/// `DELETE /api/hero-slides/{id}`
pub async fn delete_hero_slide(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    id: PathId<HeroSlideId>,
) -> Result<StatusCode> {
    let Path(id) = id?;
    deleted(state.store().delete_hero_slide(id).await?, "Hero slide")
}

// =============================================================================
// Client logos
// =============================================================================

/// `GET /api/clients`
pub async fn client_logos(State(state): State<AppState>) -> Result<Json<Vec<ClientLogo>>> {
    Ok(Json(state.store().list_client_logos().await?))
}

/// `POST /api/clients`
pub async fn create_client_logo(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    body: JsonBody<NewClientLogo>,
) -> Result<(StatusCode, Json<ClientLogo>)> {
    let Json(input) = body?;
    let input = input.normalized();
    check(|errors| input.validate(errors))?;

    let logo = state.store().create_client_logo(input).await?;
    Ok((StatusCode::CREATED, Json(logo)))
}

/// `DELETE /api/clients/{id}`
pub async fn delete_client_logo(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    id: PathId<ClientLogoId>,
) -> Result<StatusCode> {
    let Path(id) = id?;
    deleted(state.store().delete_client_logo(id).await?, "Client")
}

// =============================================================================
// Content sections
// =============================================================================

/// `GET /api/content-sections`: published sections by title.
pub async fn content_sections(
    State(state): State<AppState>,
) -> Result<Json<Vec<ContentSection>>> {
    Ok(Json(state.store().list_content_sections(true).await?))
}

/// `GET /api/content-sections/{slug}`: unpublished sections are not found.
pub async fn content_section(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ContentSection>> {
    state
        .store()
        .get_content_section_by_slug(&slug.trim().to_lowercase())
        .await?
        .filter(|section| section.is_published)
        .map(Json)
        .ok_or_else(|| AppError::not_found("Content section"))
}

/// `POST /api/content-sections`
pub async fn create_content_section(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    body: JsonBody<ContentSectionInput>,
) -> Result<(StatusCode, Json<ContentSection>)> {
    let Json(input) = body?;
    let input = input.normalized();
    check(|errors| input.validate(errors))?;

    let section = state.store().create_content_section(input).await?;
    Ok((StatusCode::CREATED, Json(section)))
}

/// `PUT /api/content-sections/{id}`
pub async fn update_content_section(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    id: PathId<ContentSectionId>,
    body: JsonBody<ContentSectionInput>,
) -> Result<Json<ContentSection>> {
    let Path(id) = id?;
    let Json(input) = body?;
    let input = input.normalized();
    check(|errors| input.validate(errors))?;

    state
        .store()
        .update_content_section(id, input)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Content section"))
}

/// `DELETE /api/content-sections/{id}`
pub async fn delete_content_section(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    id: PathId<ContentSectionId>,
) -> Result<StatusCode> {
    let Path(id) = id?;
    deleted(
        state.store().delete_content_section(id).await?,
        "Content section",
    )
}
