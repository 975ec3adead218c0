//! In-process backend.
//!
//! Everything lives behind one [`RwLock`], so every write is atomic with
//! respect to every other operation. Uniqueness rules and ordering match the
//! `PostgreSQL` backend.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;

use shipdesk_core::{
    AddressId, CarrierId, ClientLogoId, ContentSectionId, Email, HeroSlideId, ShipmentId,
    ShipmentStatus, TrackingEventId, TrackingNumber, UserId, UserRole,
};

use super::{
    AddressStore, CarrierStore, ContentStore, RepositoryError, ShipmentStore, Store, UserStore,
};
use crate::models::{
    Address, AddressDetails, Carrier, ClientLogo, ContentSection, ContentSectionInput, HeroSlide,
    NewAddress, NewCarrier, NewClientLogo, NewHeroSlide, NewShipment, NewTrackingEvent, NewUser,
    Shipment, ShipmentDetail, ShipmentFilter, SiteSettings, SiteSettingsInput, TrackingEvent, User,
};

/// [`Store`] kept in memory. Used by tests and local demos.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    /// Shipment inserts still to be refused as tracking-number collisions.
    #[cfg(test)]
    collisions: std::sync::atomic::AtomicU32,
}

#[derive(Debug, Default)]
struct State {
    users: Vec<(User, String)>,
    /// Address-book entries only; shipment copies live on the shipment.
    addresses: Vec<Address>,
    carriers: BTreeMap<CarrierId, Carrier>,
    /// Insertion order.
    shipments: Vec<Shipment>,
    /// Oldest first.
    events: HashMap<ShipmentId, Vec<TrackingEvent>>,
    settings: Option<SiteSettings>,
    slides: Vec<HeroSlide>,
    logos: Vec<ClientLogo>,
    sections: Vec<ContentSection>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-loaded with carriers.
    #[must_use]
    pub fn with_carriers(carriers: impl IntoIterator<Item = NewCarrier>) -> Self {
        let now = Utc::now();
        let carriers = carriers
            .into_iter()
            .map(|c| (c.id.clone(), carrier_from(c, now)))
            .collect();
        Self {
            state: RwLock::new(State {
                carriers,
                ..State::default()
            }),
            ..Self::default()
        }
    }

    /// Refuse the next `count` shipment inserts as if their tracking numbers
    /// were taken.
    #[cfg(test)]
    pub(crate) fn collide_next_inserts(&self, count: u32) {
        self.collisions
            .store(count, std::sync::atomic::Ordering::SeqCst);
    }
}

fn carrier_from(new: NewCarrier, created_at: DateTime<Utc>) -> Carrier {
    Carrier {
        id: new.id,
        name: new.name,
        base_rate: new.base_rate,
        service_types: new.service_types,
        is_active: new.is_active,
        created_at,
        updated_at: Utc::now(),
    }
}

fn shipment_address(user_id: UserId, details: AddressDetails, now: DateTime<Utc>) -> Address {
    Address {
        id: AddressId::generate(),
        user_id,
        details,
        is_default: false,
        created_at: now,
        updated_at: now,
    }
}

impl State {
    fn shipment_detail(&self, shipment: &Shipment) -> ShipmentDetail {
        let events = self
            .events
            .get(&shipment.id)
            .map(|events| events.iter().rev().cloned().collect())
            .unwrap_or_default();
        ShipmentDetail {
            shipment: shipment.clone(),
            events,
        }
    }

    /// Append an event, keeping `created_at` strictly increasing per shipment.
    fn append_event(&mut self, shipment_id: ShipmentId, event: NewTrackingEvent) -> TrackingEvent {
        let history = self.events.entry(shipment_id).or_default();
        let now = Utc::now();
        let created_at = history
            .last()
            .map_or(now, |last| now.max(last.created_at + TimeDelta::microseconds(1)));
        let event = TrackingEvent {
            id: TrackingEventId::generate(),
            shipment_id,
            status: event.status,
            description: event.description,
            location: event.location,
            event_time: event.event_time,
            created_at,
        };
        history.push(event.clone());
        event
    }

    fn slug_taken(&self, slug: &str, except: Option<ContentSectionId>) -> bool {
        self.sections
            .iter()
            .any(|s| s.slug == slug && Some(s.id) != except)
    }
}

// =============================================================================
// Users
// =============================================================================

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|(u, _)| u.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let now = Utc::now();
        let created = User {
            id: UserId::generate(),
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        state.users.push((created.clone(), user.password_hash));
        Ok(created)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|(u, _)| u.id == id)
            .map(|(u, _)| u.clone()))
    }

    async fn get_user_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|(u, _)| &u.email == email).cloned())
    }

    async fn set_user_role(&self, email: &Email, role: UserRole) -> Result<User, RepositoryError> {
        let mut state = self.state.write().await;
        let (user, _) = state
            .users
            .iter_mut()
            .find(|(u, _)| &u.email == email)
            .ok_or(RepositoryError::NotFound)?;
        user.role = role;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

// =============================================================================
// Addresses
// =============================================================================

#[async_trait]
impl AddressStore for MemoryStore {
    async fn list_addresses(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let state = self.state.read().await;
        let mut addresses: Vec<Address> = state
            .addresses
            .iter()
            .rev()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        addresses.sort_by(|a, b| {
            b.is_default
                .cmp(&a.is_default)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(addresses)
    }

    async fn create_address(&self, address: NewAddress) -> Result<Address, RepositoryError> {
        let mut state = self.state.write().await;
        let now = Utc::now();

        if address.is_default {
            for existing in state
                .addresses
                .iter_mut()
                .filter(|a| a.user_id == address.user_id && a.is_default)
            {
                existing.is_default = false;
                existing.updated_at = now;
            }
        }

        let created = Address {
            id: AddressId::generate(),
            user_id: address.user_id,
            details: address.details,
            is_default: address.is_default,
            created_at: now,
            updated_at: now,
        };
        state.addresses.push(created.clone());
        Ok(created)
    }
}

// =============================================================================
// Carriers
// =============================================================================

#[async_trait]
impl CarrierStore for MemoryStore {
    async fn list_carriers(&self, active_only: bool) -> Result<Vec<Carrier>, RepositoryError> {
        let state = self.state.read().await;
        let mut carriers: Vec<Carrier> = state
            .carriers
            .values()
            .filter(|c| c.is_active || !active_only)
            .cloned()
            .collect();
        // Map order already sorts by id; a stable sort keeps it within a name.
        carriers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(carriers)
    }

    async fn get_carrier(&self, id: &CarrierId) -> Result<Option<Carrier>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.carriers.get(id).cloned())
    }

    async fn upsert_carrier(&self, carrier: NewCarrier) -> Result<Carrier, RepositoryError> {
        let mut state = self.state.write().await;
        let created_at = state
            .carriers
            .get(&carrier.id)
            .map_or_else(Utc::now, |existing| existing.created_at);
        let stored = carrier_from(carrier, created_at);
        state.carriers.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }
}

// =============================================================================
// Shipments
// =============================================================================

#[async_trait]
impl ShipmentStore for MemoryStore {
    async fn create_shipment(
        &self,
        new: NewShipment,
    ) -> Result<ShipmentDetail, RepositoryError> {
        let mut state = self.state.write().await;
        #[cfg(test)]
        let forced = self
            .collisions
            .fetch_update(
                std::sync::atomic::Ordering::SeqCst,
                std::sync::atomic::Ordering::SeqCst,
                |left| left.checked_sub(1),
            )
            .is_ok();
        #[cfg(not(test))]
        let forced = false;

        if forced
            || state
                .shipments
                .iter()
                .any(|s| s.tracking_number == new.tracking_number)
        {
            return Err(RepositoryError::Conflict(
                "tracking number already exists".to_owned(),
            ));
        }

        let now = Utc::now();
        let shipment = Shipment {
            id: ShipmentId::generate(),
            tracking_number: new.tracking_number,
            user_id: new.user_id,
            carrier_id: new.carrier_id,
            sender: shipment_address(new.user_id, new.sender, now),
            recipient: shipment_address(new.user_id, new.recipient, now),
            package: new.package,
            insurance: new.options.insurance,
            signature_required: new.options.signature_required,
            status: new.initial_event.status,
            cost: new.cost,
            estimated_delivery: new.estimated_delivery,
            created_at: now,
            updated_at: now,
        };

        let event = state.append_event(shipment.id, new.initial_event);
        state.shipments.push(shipment.clone());
        Ok(ShipmentDetail {
            shipment,
            events: vec![event],
        })
    }

    async fn get_shipment(
        &self,
        id: ShipmentId,
    ) -> Result<Option<ShipmentDetail>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .shipments
            .iter()
            .find(|s| s.id == id)
            .map(|s| state.shipment_detail(s)))
    }

    async fn find_by_tracking_number(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<Option<ShipmentDetail>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .shipments
            .iter()
            .find(|s| &s.tracking_number == tracking_number)
            .map(|s| state.shipment_detail(s)))
    }

    async fn list_shipments(
        &self,
        user_id: UserId,
        filter: ShipmentFilter,
    ) -> Result<Vec<Shipment>, RepositoryError> {
        let state = self.state.read().await;
        let mut matching: Vec<&Shipment> = state
            .shipments
            .iter()
            .rev()
            .filter(|s| s.user_id == user_id)
            .filter(|s| filter.status.is_none_or(|status| s.status == status))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let limit = filter.limit.map_or(usize::MAX, |l| l as usize);
        Ok(matching
            .into_iter()
            .skip(filter.offset as usize)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn transition_shipment(
        &self,
        id: ShipmentId,
        expected: ShipmentStatus,
        event: NewTrackingEvent,
    ) -> Result<ShipmentDetail, RepositoryError> {
        let mut state = self.state.write().await;
        let shipment = state
            .shipments
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(RepositoryError::NotFound)?;
        if shipment.status != expected {
            return Err(RepositoryError::Conflict(format!(
                "shipment is no longer {expected}"
            )));
        }
        shipment.status = event.status;
        shipment.updated_at = Utc::now();
        let updated = shipment.clone();

        state.append_event(id, event);
        Ok(state.shipment_detail(&updated))
    }
}

// =============================================================================
// Site content
// =============================================================================

#[async_trait]
impl ContentStore for MemoryStore {
    async fn get_site_settings(&self) -> Result<Option<SiteSettings>, RepositoryError> {
        Ok(self.state.read().await.settings.clone())
    }

    async fn upsert_site_settings(
        &self,
        settings: SiteSettingsInput,
    ) -> Result<SiteSettings, RepositoryError> {
        let stored = SiteSettings {
            company_name: settings.company_name,
            tagline: settings.tagline,
            contact_email: settings.contact_email,
            contact_phone: settings.contact_phone,
            address: settings.address,
            social_links: settings.social_links,
            logo_url: settings.logo_url,
            updated_at: Utc::now(),
        };
        self.state.write().await.settings = Some(stored.clone());
        Ok(stored)
    }

    async fn list_hero_slides(&self, active_only: bool) -> Result<Vec<HeroSlide>, RepositoryError> {
        let state = self.state.read().await;
        let mut slides: Vec<HeroSlide> = state
            .slides
            .iter()
            .filter(|s| s.is_active || !active_only)
            .cloned()
            .collect();
        slides.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(slides)
    }

    async fn create_hero_slide(&self, slide: NewHeroSlide) -> Result<HeroSlide, RepositoryError> {
        let created = HeroSlide {
            id: HeroSlideId::generate(),
            title: slide.title,
            subtitle: slide.subtitle,
            image_url: slide.image_url,
            cta_label: slide.cta_label,
            cta_url: slide.cta_url,
            sort_order: slide.sort_order,
            is_active: slide.is_active,
            created_at: Utc::now(),
        };
        self.state.write().await.slides.push(created.clone());
        Ok(created)
    }

    async fn delete_hero_slide(&self, id: HeroSlideId) -> Result<bool, RepositoryError> {
        let mut state = self.state.write().await;
        let before = state.slides.len();
        state.slides.retain(|s| s.id != id);
        Ok(state.slides.len() < before)
    }

    async fn list_client_logos(&self) -> Result<Vec<ClientLogo>, RepositoryError> {
        let state = self.state.read().await;
        let mut logos = state.logos.clone();
        logos.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(logos)
    }

    async fn create_client_logo(
        &self,
        logo: NewClientLogo,
    ) -> Result<ClientLogo, RepositoryError> {
        let created = ClientLogo {
            id: ClientLogoId::generate(),
            name: logo.name,
            logo_url: logo.logo_url,
            website_url: logo.website_url,
            sort_order: logo.sort_order,
            created_at: Utc::now(),
        };
        self.state.write().await.logos.push(created.clone());
        Ok(created)
    }

    async fn delete_client_logo(&self, id: ClientLogoId) -> Result<bool, RepositoryError> {
        let mut state = self.state.write().await;
        let before = state.logos.len();
        state.logos.retain(|l| l.id != id);
        Ok(state.logos.len() < before)
    }

    async fn list_content_sections(
        &self,
        published_only: bool,
    ) -> Result<Vec<ContentSection>, RepositoryError> {
        let state = self.state.read().await;
        let mut sections: Vec<ContentSection> = state
            .sections
            .iter()
            .filter(|s| s.is_published || !published_only)
            .cloned()
            .collect();
        sections.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.slug.cmp(&b.slug)));
        Ok(sections)
    }

    async fn get_content_section_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<ContentSection>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.sections.iter().find(|s| s.slug == slug).cloned())
    }

    async fn create_content_section(
        &self,
        section: ContentSectionInput,
    ) -> Result<ContentSection, RepositoryError> {
        let mut state = self.state.write().await;
        if state.slug_taken(&section.slug, None) {
            return Err(RepositoryError::Conflict("slug already exists".to_owned()));
        }

        let now = Utc::now();
        let created = ContentSection {
            id: ContentSectionId::generate(),
            slug: section.slug,
            title: section.title,
            body_html: section.body_html,
            is_published: section.is_published,
            created_at: now,
            updated_at: now,
        };
        state.sections.push(created.clone());
        Ok(created)
    }

    async fn update_content_section(
        &self,
        id: ContentSectionId,
        section: ContentSectionInput,
    ) -> Result<Option<ContentSection>, RepositoryError> {
        let mut state = self.state.write().await;
        if !state.sections.iter().any(|s| s.id == id) {
            return Ok(None);
        }
        if state.slug_taken(&section.slug, Some(id)) {
            return Err(RepositoryError::Conflict("slug already exists".to_owned()));
        }

        let Some(existing) = state.sections.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        existing.slug = section.slug;
        existing.title = section.title;
        existing.body_html = section.body_html;
        existing.is_published = section.is_published;
        existing.updated_at = Utc::now();
        Ok(Some(existing.clone()))
    }

    async fn delete_content_section(&self, id: ContentSectionId) -> Result<bool, RepositoryError> {
        let mut state = self.state.write().await;
        let before = state.sections.len();
        state.sections.retain(|s| s.id != id);
        Ok(state.sections.len() < before)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
