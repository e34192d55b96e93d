//! Per-boat per-place pricing and authoritative total resolution.
//!
//! Prices are u64 minor units, so a negative price is unrepresentable and
//! totals use checked addition. Resolution is the single authority for a
//! booking's total; callers never supply their own.

use crate::auth::{self, Action, Caller, Target};
use crate::catalog::Place;
use crate::error::{Error, Result};
use crate::fleet::Boat;
use crate::{ids, store};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone, minicbor::Encode, minicbor::Decode)]
pub struct PriceRow {
    #[n(0)]
    pub boat_id: String,
    #[n(1)]
    pub place_id: String,
    #[n(2)]
    pub price: u64,
}

/// One place on a boat's price sheet; `None` means not yet priced.
#[derive(Debug, Clone)]
pub struct PriceSheetEntry {
    pub place: Place,
    pub price: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceLine {
    pub place_id: String,
    pub price: u64,
}

/// Resolved total with its per-place breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub total: u64,
    pub lines: Vec<PriceLine>,
}

pub struct PricingService {
    instance: Arc<sled::Db>,
}

impl PricingService {
    pub fn new(instance: Arc<sled::Db>) -> Self {
        Self { instance }
    }

    /// Upsert the price of one place for one boat. Only the boat's current
    /// owner may write; approval status is deliberately not checked, so an
    /// owner can price a still-pending boat. Last write wins per key.
    pub fn set_price(
        &self,
        caller: &Caller,
        boat_id: &str,
        place_id: &str,
        price: u64,
    ) -> Result<PriceRow> {
        auth::screen(caller, Action::SetPrice)?;
        let boat: Boat = store::fetch_or(&self.instance, "boat", boat_id)?;
        auth::authorize(
            caller,
            Action::SetPrice,
            &Target::Owned {
                owner_id: &boat.owner_id,
            },
        )?;
        let place: Place = store::fetch_or(&self.instance, "place", place_id)?;

        let row = PriceRow {
            boat_id: boat.id.clone(),
            place_id: place.id.clone(),
            price,
        };
        store::put(&self.instance, &ids::price_key(&boat.id, &place.id), &row)?;
        tracing::info!(boat = %boat.id, place = %place.id, price, "price set");
        Ok(row)
    }

    /// Every catalog place with the boat's price for it, if set.
    pub fn price_sheet(&self, caller: &Caller, boat_id: &str) -> Result<Vec<PriceSheetEntry>> {
        auth::authorize(caller, Action::BrowseCatalog, &Target::Public)?;
        let _boat: Boat = store::fetch_or(&self.instance, "boat", boat_id)?;
        let places: Vec<Place> = store::scan(&self.instance, ids::PLACE)?;

        let mut sheet = Vec::with_capacity(places.len());
        for place in places {
            let row: Option<PriceRow> =
                store::fetch(&self.instance, &ids::price_key(boat_id, &place.id))?;
            sheet.push(PriceSheetEntry {
                price: row.map(|r| r.price),
                place,
            });
        }
        Ok(sheet)
    }

    /// Resolve the total for a set of places on one boat. Every requested
    /// place must exist and carry a price row; missing prices are reported
    /// together as `IncompletePricing`.
    pub fn resolve_total(&self, boat_id: &str, place_ids: &BTreeSet<String>) -> Result<Quote> {
        let mut lines = Vec::with_capacity(place_ids.len());
        let mut missing = Vec::new();

        for place_id in place_ids {
            let _place: Place = store::fetch_or(&self.instance, "place", place_id)?;
            match store::fetch::<PriceRow>(&self.instance, &ids::price_key(boat_id, place_id))? {
                Some(row) => lines.push(PriceLine {
                    place_id: place_id.clone(),
                    price: row.price,
                }),
                None => missing.push(place_id.clone()),
            }
        }

        if !missing.is_empty() {
            return Err(Error::IncompletePricing {
                boat_id: boat_id.to_string(),
                missing,
            });
        }

        let mut total: u64 = 0;
        for line in &lines {
            total = total
                .checked_add(line.price)
                .ok_or_else(|| Error::validation("booking", "total price overflows"))?;
        }
        Ok(Quote { total, lines })
    }
}
