//! Destination catalog: admin-managed places and the public boat views.

use crate::auth::{self, Action, Caller, Target};
use crate::error::{Error, Result};
use crate::fleet::{Boat, BoatStatus};
use crate::pricing::PriceRow;
use crate::{ids, store};
use std::sync::Arc;

#[derive(Debug, Clone, minicbor::Encode, minicbor::Decode)]
pub struct Place {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub name: String,
    #[n(2)]
    pub description: String,
    #[n(3)]
    pub image: String,
}

#[derive(Debug, Default)]
pub struct PlaceDraft {
    name: Option<String>,
    description: Option<String>,
    image: Option<String>,
}

impl PlaceDraft {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
    pub fn set_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
    /// Opaque stored-file reference; never interpreted.
    pub fn set_image(mut self, image: &str) -> Self {
        self.image = Some(image.to_string());
        self
    }

    fn validate(self) -> Result<(String, String, String)> {
        let name = match self.name {
            Some(n) if !n.trim().is_empty() => n,
            _ => return Err(Error::validation("place", "name is required")),
        };
        let description = match self.description {
            Some(d) if !d.trim().is_empty() => d,
            _ => return Err(Error::validation("place", "description is required")),
        };
        let image = match self.image {
            Some(i) if !i.trim().is_empty() => i,
            _ => return Err(Error::validation("place", "image is required")),
        };
        Ok((name, description, image))
    }
}

/// Bookable boat as shown on a dashboard: approved, has at least one price
/// row, with the cheapest per-place price as the teaser.
#[derive(Debug, Clone)]
pub struct BoatListing {
    pub boat: Boat,
    pub base_price: u64,
}

pub struct CatalogService {
    instance: Arc<sled::Db>,
}

impl CatalogService {
    pub fn new(instance: Arc<sled::Db>) -> Self {
        Self { instance }
    }

    pub fn add_place(&self, caller: &Caller, draft: PlaceDraft) -> Result<Place> {
        auth::authorize(caller, Action::ManagePlaces, &Target::Public)?;
        let (name, description, image) = draft.validate()?;
        let place = Place {
            id: ids::new_id(ids::PLACE),
            name,
            description,
            image,
        };
        store::put(&self.instance, &place.id, &place)?;
        tracing::info!(place = %place.id, "place added");
        Ok(place)
    }

    /// Admin edit. `image = None` keeps the existing image.
    pub fn update_place(
        &self,
        caller: &Caller,
        place_id: &str,
        name: &str,
        description: &str,
        image: Option<&str>,
    ) -> Result<Place> {
        auth::authorize(caller, Action::ManagePlaces, &Target::Public)?;
        let mut place: Place = store::fetch_or(&self.instance, "place", place_id)?;
        if name.trim().is_empty() {
            return Err(Error::validation("place", "name is required"));
        }
        if description.trim().is_empty() {
            return Err(Error::validation("place", "description is required"));
        }
        place.name = name.to_string();
        place.description = description.to_string();
        if let Some(image) = image {
            place.image = image.to_string();
        }
        store::put(&self.instance, &place.id, &place)?;
        Ok(place)
    }

    /// Admin hard delete. No cascade: orphaned price rows are tolerated and
    /// booking creation re-checks place existence.
    pub fn delete_place(&self, caller: &Caller, place_id: &str) -> Result<()> {
        auth::authorize(caller, Action::ManagePlaces, &Target::Public)?;
        let place: Place = store::fetch_or(&self.instance, "place", place_id)?;
        self.instance.remove(place.id.as_bytes())?;
        tracing::info!(place = %place.id, "place deleted");
        Ok(())
    }

    pub fn list_places(&self, caller: &Caller) -> Result<Vec<Place>> {
        auth::authorize(caller, Action::BrowseCatalog, &Target::Public)?;
        store::scan(&self.instance, ids::PLACE)
    }

    pub fn get_place(&self, caller: &Caller, place_id: &str) -> Result<Place> {
        auth::authorize(caller, Action::BrowseCatalog, &Target::Public)?;
        store::fetch_or(&self.instance, "place", place_id)
    }

    pub fn get_boat(&self, caller: &Caller, boat_id: &str) -> Result<Boat> {
        auth::authorize(caller, Action::BrowseCatalog, &Target::Public)?;
        store::fetch_or(&self.instance, "boat", boat_id)
    }

    /// Every approved boat, priced or not.
    pub fn list_approved_boats(&self, caller: &Caller) -> Result<Vec<Boat>> {
        auth::authorize(caller, Action::BrowseCatalog, &Target::Public)?;
        let mut boats: Vec<Boat> = store::scan(&self.instance, ids::BOAT)?;
        boats.retain(|b| b.status == BoatStatus::Approved);
        Ok(boats)
    }

    /// Approved boats with at least one price row, carrying the minimum
    /// per-place price as `base_price`.
    pub fn list_bookable_boats(&self, caller: &Caller) -> Result<Vec<BoatListing>> {
        auth::authorize(caller, Action::BrowseCatalog, &Target::Public)?;
        let boats: Vec<Boat> = store::scan(&self.instance, ids::BOAT)?;

        let mut listings = Vec::new();
        for boat in boats {
            if boat.status != BoatStatus::Approved {
                continue;
            }
            let rows: Vec<PriceRow> = store::scan(&self.instance, &ids::price_prefix(&boat.id))?;
            if let Some(base_price) = rows.iter().map(|r| r.price).min() {
                listings.push(BoatListing { boat, base_price });
            }
        }
        Ok(listings)
    }
}
