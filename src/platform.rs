//! Service wiring over one shared store.

use crate::account::IdentityService;
use crate::booking::BookingService;
use crate::catalog::CatalogService;
use crate::chat::ChatService;
use crate::error::Result;
use crate::fleet::FleetService;
use crate::pricing::PricingService;
use std::path::Path;
use std::sync::Arc;

/// Every service of the platform, sharing one `sled::Db`. Services are
/// `Send + Sync`; concurrent requests need no coordination beyond what the
/// store's batches and transactions already give.
pub struct Platform {
    pub identity: IdentityService,
    pub catalog: CatalogService,
    pub fleet: FleetService,
    pub pricing: PricingService,
    pub bookings: BookingService,
    pub chat: ChatService,
}

impl Platform {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Arc::new(sled::open(path)?);
        Ok(Self::with_db(db))
    }

    pub fn with_db(db: Arc<sled::Db>) -> Self {
        Self {
            identity: IdentityService::new(db.clone()),
            catalog: CatalogService::new(db.clone()),
            fleet: FleetService::new(db.clone()),
            pricing: PricingService::new(db.clone()),
            bookings: BookingService::new(db.clone()),
            chat: ChatService::new(db),
        }
    }
}
