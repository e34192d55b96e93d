//! Smoke tests spanning the platform's components.
//!
//! These exercise each service in isolation from the larger integration
//! scenarios and generally test the happy path plus the first guard rail
//! behind it.

use backwater::account::AccountDraft;
use backwater::auth::{Action, Caller, Decision, Role, decision};
use backwater::booking::BookingStatus;
use backwater::catalog::PlaceDraft;
use backwater::error::Error;
use backwater::fleet::{BoatDraft, BoatStatus};
use backwater::ids;
use backwater::platform::Platform;
use tempfile::{TempDir, tempdir};

fn fresh_platform(name: &str) -> (TempDir, Platform) {
    let temp_dir = tempdir().unwrap();
    let platform = Platform::open(temp_dir.path().join(name)).unwrap();
    (temp_dir, platform)
}

mod identity_tests {
    use super::*;

    /// Registration yields a plain user; authentication round-trips the
    /// caller identity.
    #[test]
    fn register_then_authenticate() {
        let (_guard, platform) = fresh_platform("identity.db");

        let user = platform
            .identity
            .register(
                AccountDraft::new()
                    .set_name("Uma")
                    .set_email("uma@example.com")
                    .set_password("secret"),
            )
            .unwrap();
        assert_eq!(user.role, Role::User);
        assert!(user.id.starts_with("user_1"));

        let caller = platform
            .identity
            .authenticate("uma@example.com", "secret")
            .unwrap();
        assert_eq!(caller.id, user.id);
        assert_eq!(caller.role, Role::User);
    }

    /// Bad credentials fail identically whether the email exists or not.
    #[test]
    fn authenticate_does_not_leak_existence() {
        let (_guard, platform) = fresh_platform("identity_leak.db");
        platform
            .identity
            .register(
                AccountDraft::new()
                    .set_name("Uma")
                    .set_email("uma@example.com")
                    .set_password("secret"),
            )
            .unwrap();

        let wrong_pass = platform.identity.authenticate("uma@example.com", "nope");
        let no_user = platform.identity.authenticate("ghost@example.com", "nope");
        assert!(matches!(wrong_pass, Err(Error::Forbidden { .. })));
        assert!(matches!(no_user, Err(Error::Forbidden { .. })));
    }

    #[test]
    fn ensure_admin_is_idempotent() {
        let (_guard, platform) = fresh_platform("identity_admin.db");
        let first = platform
            .identity
            .ensure_admin("Admin", "admin@example.com", "pass")
            .unwrap();
        let second = platform
            .identity
            .ensure_admin("Admin", "admin@example.com", "pass")
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.role, Role::Admin);
    }

    #[test]
    fn admin_creates_owner_accounts_directly() {
        let (_guard, platform) = fresh_platform("identity_owner.db");
        let admin = platform
            .identity
            .ensure_admin("Admin", "admin@example.com", "pass")
            .unwrap()
            .caller();

        let owner = platform
            .identity
            .create_owner_account(
                &admin,
                AccountDraft::new()
                    .set_name("Wes")
                    .set_email("wes@example.com")
                    .set_password("secret"),
            )
            .unwrap();
        assert_eq!(owner.role, Role::BoatOwner);

        let listed = platform.identity.list_accounts(&admin, Role::BoatOwner).unwrap();
        assert_eq!(listed.len(), 1);

        let counts = platform.identity.role_counts(&admin).unwrap();
        assert_eq!(counts.users, 0);
        assert_eq!(counts.boat_owners, 1);
    }

    /// Changing an email re-points the uniqueness index: the old address is
    /// freed, the new one is claimed.
    #[test]
    fn update_contact_repoints_email_index() {
        let (_guard, platform) = fresh_platform("identity_edit.db");
        let admin = platform
            .identity
            .ensure_admin("Admin", "admin@example.com", "pass")
            .unwrap()
            .caller();
        let user = platform
            .identity
            .register(
                AccountDraft::new()
                    .set_name("Uma")
                    .set_email("uma@example.com")
                    .set_password("secret"),
            )
            .unwrap();

        platform
            .identity
            .update_contact(&admin, &user.id, "Uma", "captain@example.com")
            .unwrap();

        assert!(platform.identity.authenticate("uma@example.com", "secret").is_err());
        let caller = platform
            .identity
            .authenticate("captain@example.com", "secret")
            .unwrap();
        assert_eq!(caller.id, user.id);

        // the freed address can be claimed again
        assert!(
            platform
                .identity
                .register(
                    AccountDraft::new()
                        .set_name("Newcomer")
                        .set_email("uma@example.com")
                        .set_password("secret"),
                )
                .is_ok()
        );
    }

    #[test]
    fn profile_image_is_self_service_and_opaque() {
        let (_guard, platform) = fresh_platform("identity_image.db");
        let user = platform
            .identity
            .register(
                AccountDraft::new()
                    .set_name("Uma")
                    .set_email("uma@example.com")
                    .set_password("secret"),
            )
            .unwrap();
        let caller = user.caller();

        let updated = platform
            .identity
            .set_profile_image(&caller, "uploads/user_17123.png")
            .unwrap();
        assert_eq!(updated.profile_image.as_deref(), Some("uploads/user_17123.png"));

        // profile reads are self or admin
        assert!(platform.identity.get_profile(&caller, &user.id).is_ok());
        let other = Caller::new(ids::new_id(ids::USER), Role::User);
        assert!(matches!(
            platform.identity.get_profile(&other, &user.id),
            Err(Error::Forbidden { .. })
        ));
    }
}

mod catalog_tests {
    use super::*;

    #[test]
    fn place_crud_is_admin_only() {
        let (_guard, platform) = fresh_platform("catalog.db");
        let admin = platform
            .identity
            .ensure_admin("Admin", "admin@example.com", "pass")
            .unwrap()
            .caller();
        let guest = Caller::guest();

        assert!(matches!(
            platform.catalog.add_place(
                &guest,
                PlaceDraft::new()
                    .set_name("X")
                    .set_description("Y")
                    .set_image("Z")
            ),
            Err(Error::Forbidden { .. })
        ));

        let place = platform
            .catalog
            .add_place(
                &admin,
                PlaceDraft::new()
                    .set_name("Emerald Lagoon")
                    .set_description("Shallow waters")
                    .set_image("uploads/lagoon.jpg"),
            )
            .unwrap();

        // guests read the public catalog
        assert_eq!(platform.catalog.list_places(&guest).unwrap().len(), 1);

        // None keeps the stored image on edit
        let edited = platform
            .catalog
            .update_place(&admin, &place.id, "Emerald Lagoon", "Now with moorings", None)
            .unwrap();
        assert_eq!(edited.image, "uploads/lagoon.jpg");

        platform.catalog.delete_place(&admin, &place.id).unwrap();
        assert!(matches!(
            platform.catalog.get_place(&guest, &place.id),
            Err(Error::NotFound { .. })
        ));
    }

    /// Bookable means approved with at least one price row; the teaser is
    /// the minimum per-place price.
    #[test]
    fn bookable_listing_requires_a_price_row() {
        let (_guard, platform) = fresh_platform("catalog_bookable.db");
        let admin = platform
            .identity
            .ensure_admin("Admin", "admin@example.com", "pass")
            .unwrap()
            .caller();
        let uma = platform
            .identity
            .register(
                AccountDraft::new()
                    .set_name("Uma")
                    .set_email("uma@example.com")
                    .set_password("secret"),
            )
            .unwrap()
            .caller();

        let boat = platform
            .fleet
            .submit(
                &uma,
                BoatDraft::new()
                    .set_name("Kingfisher")
                    .set_boat_type("catamaran")
                    .set_capacity(6),
            )
            .unwrap();
        platform.fleet.approve(&admin, &boat.id).unwrap();

        // approved but unpriced: visible as approved, not as bookable
        let guest = Caller::guest();
        assert_eq!(platform.catalog.list_approved_boats(&guest).unwrap().len(), 1);
        assert!(platform.catalog.list_bookable_boats(&guest).unwrap().is_empty());

        let p1 = platform
            .catalog
            .add_place(
                &admin,
                PlaceDraft::new()
                    .set_name("Lagoon")
                    .set_description("d")
                    .set_image("i"),
            )
            .unwrap();
        let p2 = platform
            .catalog
            .add_place(
                &admin,
                PlaceDraft::new()
                    .set_name("Reef")
                    .set_description("d")
                    .set_image("i"),
            )
            .unwrap();
        platform.pricing.set_price(&uma, &boat.id, &p1.id, 250).unwrap();
        platform.pricing.set_price(&uma, &boat.id, &p2.id, 100).unwrap();

        let listings = platform.catalog.list_bookable_boats(&guest).unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].base_price, 100);
    }
}

mod fleet_tests {
    use super::*;

    #[test]
    fn submission_starts_pending_and_owned_by_caller() {
        let (_guard, platform) = fresh_platform("fleet.db");
        let uma = platform
            .identity
            .register(
                AccountDraft::new()
                    .set_name("Uma")
                    .set_email("uma@example.com")
                    .set_password("secret"),
            )
            .unwrap()
            .caller();

        let boat = platform
            .fleet
            .submit(
                &uma,
                BoatDraft::new()
                    .set_name("Kingfisher")
                    .set_boat_type("catamaran")
                    .set_capacity(6)
                    .set_photo("uploads/kf.jpg"),
            )
            .unwrap();
        assert_eq!(boat.status, BoatStatus::Pending);
        assert_eq!(boat.owner_id, uma.id);

        // a still-plain user sees their own pending submission
        let own = platform.fleet.list_for_owner(&uma, &uma.id).unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].id, boat.id);
    }

    #[test]
    fn draft_validation_rejects_incomplete_boats() {
        let (_guard, platform) = fresh_platform("fleet_draft.db");
        let uma = platform
            .identity
            .register(
                AccountDraft::new()
                    .set_name("Uma")
                    .set_email("uma@example.com")
                    .set_password("secret"),
            )
            .unwrap()
            .caller();

        assert!(matches!(
            platform.fleet.submit(&uma, BoatDraft::new().set_name("No type")),
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            platform.fleet.submit(
                &uma,
                BoatDraft::new()
                    .set_name("Zero seats")
                    .set_boat_type("dinghy")
                    .set_capacity(0)
            ),
            Err(Error::Validation { .. })
        ));
    }

    /// Promotion upgrades `User` only: an admin who owns a boat keeps their
    /// admin role through approval.
    #[test]
    fn approval_never_demotes_an_admin_owner() {
        let (_guard, platform) = fresh_platform("fleet_admin_owner.db");
        let admin_user = platform
            .identity
            .ensure_admin("Admin", "admin@example.com", "pass")
            .unwrap();
        let admin = admin_user.caller();

        let boat = platform
            .fleet
            .submit(
                &admin,
                BoatDraft::new()
                    .set_name("Harbourmaster")
                    .set_boat_type("launch")
                    .set_capacity(4),
            )
            .unwrap();
        platform.fleet.approve(&admin, &boat.id).unwrap();

        let profile = platform.identity.get_profile(&admin, &admin_user.id).unwrap();
        assert_eq!(profile.role, Role::Admin);
    }

    #[test]
    fn review_queue_lists_pending_only() {
        let (_guard, platform) = fresh_platform("fleet_queue.db");
        let admin = platform
            .identity
            .ensure_admin("Admin", "admin@example.com", "pass")
            .unwrap()
            .caller();
        let uma = platform
            .identity
            .register(
                AccountDraft::new()
                    .set_name("Uma")
                    .set_email("uma@example.com")
                    .set_password("secret"),
            )
            .unwrap()
            .caller();

        let a = platform
            .fleet
            .submit(
                &uma,
                BoatDraft::new().set_name("A").set_boat_type("skiff").set_capacity(2),
            )
            .unwrap();
        let b = platform
            .fleet
            .submit(
                &uma,
                BoatDraft::new().set_name("B").set_boat_type("skiff").set_capacity(2),
            )
            .unwrap();
        platform.fleet.approve(&admin, &a.id).unwrap();

        let queue = platform.fleet.list_pending(&admin).unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].id, b.id);
    }
}

mod pricing_tests {
    use super::*;

    fn seeded(name: &str) -> (TempDir, Platform, Caller, Caller, String, String) {
        let (guard, platform) = fresh_platform(name);
        let admin = platform
            .identity
            .ensure_admin("Admin", "admin@example.com", "pass")
            .unwrap()
            .caller();
        let uma = platform
            .identity
            .register(
                AccountDraft::new()
                    .set_name("Uma")
                    .set_email("uma@example.com")
                    .set_password("secret"),
            )
            .unwrap()
            .caller();
        let boat = platform
            .fleet
            .submit(
                &uma,
                BoatDraft::new()
                    .set_name("Kingfisher")
                    .set_boat_type("catamaran")
                    .set_capacity(6),
            )
            .unwrap();
        let place = platform
            .catalog
            .add_place(
                &admin,
                PlaceDraft::new()
                    .set_name("Lagoon")
                    .set_description("d")
                    .set_image("i"),
            )
            .unwrap();
        (guard, platform, admin, uma, boat.id, place.id)
    }

    #[test]
    fn upsert_is_owner_only_and_last_write_wins() {
        let (_guard, platform, _admin, uma, boat_id, place_id) = seeded("pricing.db");

        platform.pricing.set_price(&uma, &boat_id, &place_id, 100).unwrap();
        platform.pricing.set_price(&uma, &boat_id, &place_id, 120).unwrap();

        let sheet = platform.pricing.price_sheet(&Caller::guest(), &boat_id).unwrap();
        assert_eq!(sheet.len(), 1);
        assert_eq!(sheet[0].price, Some(120));

        let stranger = Caller::new(ids::new_id(ids::USER), Role::BoatOwner);
        assert!(matches!(
            platform.pricing.set_price(&stranger, &boat_id, &place_id, 1),
            Err(Error::Forbidden { .. })
        ));
    }

    #[test]
    fn missing_references_surface_as_not_found() {
        let (_guard, platform, _admin, uma, boat_id, place_id) = seeded("pricing_nf.db");

        let ghost_boat = ids::new_id(ids::BOAT);
        assert!(matches!(
            platform.pricing.set_price(&uma, &ghost_boat, &place_id, 10),
            Err(Error::NotFound { kind: "boat", .. })
        ));

        let ghost_place = ids::new_id(ids::PLACE);
        assert!(matches!(
            platform.pricing.set_price(&uma, &boat_id, &ghost_place, 10),
            Err(Error::NotFound { kind: "place", .. })
        ));
    }

    #[test]
    fn price_sheet_marks_unpriced_places() {
        let (_guard, platform, admin, uma, boat_id, place_id) = seeded("pricing_sheet.db");
        let other = platform
            .catalog
            .add_place(
                &admin,
                PlaceDraft::new()
                    .set_name("Reef")
                    .set_description("d")
                    .set_image("i"),
            )
            .unwrap();
        platform.pricing.set_price(&uma, &boat_id, &place_id, 100).unwrap();

        let sheet = platform.pricing.price_sheet(&Caller::guest(), &boat_id).unwrap();
        assert_eq!(sheet.len(), 2);
        let unpriced = sheet.iter().find(|e| e.place.id == other.id).unwrap();
        assert_eq!(unpriced.price, None);
    }
}

mod booking_tests {
    use super::*;

    #[test]
    fn views_join_place_names_newest_first() {
        let (_guard, platform) = fresh_platform("booking_views.db");
        let admin = platform
            .identity
            .ensure_admin("Admin", "admin@example.com", "pass")
            .unwrap()
            .caller();
        let uma = platform
            .identity
            .register(
                AccountDraft::new()
                    .set_name("Uma")
                    .set_email("uma@example.com")
                    .set_password("secret"),
            )
            .unwrap()
            .caller();
        let vik = platform
            .identity
            .register(
                AccountDraft::new()
                    .set_name("Vik")
                    .set_email("vik@example.com")
                    .set_password("secret"),
            )
            .unwrap()
            .caller();

        let boat = platform
            .fleet
            .submit(
                &uma,
                BoatDraft::new()
                    .set_name("Kingfisher")
                    .set_boat_type("catamaran")
                    .set_capacity(6),
            )
            .unwrap();
        platform.fleet.approve(&admin, &boat.id).unwrap();
        let lagoon = platform
            .catalog
            .add_place(
                &admin,
                PlaceDraft::new()
                    .set_name("Lagoon")
                    .set_description("d")
                    .set_image("i"),
            )
            .unwrap();
        platform.pricing.set_price(&uma, &boat.id, &lagoon.id, 100).unwrap();

        let first = platform
            .bookings
            .create(&vik, &boat.id, &[lagoon.id.clone()])
            .unwrap();
        let second = platform
            .bookings
            .create(&vik, &boat.id, &[lagoon.id.clone()])
            .unwrap();

        let views = platform.bookings.list_for_user(&vik, &vik.id).unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].booking.id, second.id);
        assert_eq!(views[1].booking.id, first.id);
        assert_eq!(views[0].places, vec!["Lagoon".to_string()]);
        assert_eq!(views[0].booking.status, BookingStatus::Pending);
    }

    #[test]
    fn owners_do_not_book_their_own_listings() {
        let (_guard, platform) = fresh_platform("booking_roles.db");
        let owner = Caller::new(ids::new_id(ids::USER), Role::BoatOwner);
        let ghost_boat = ids::new_id(ids::BOAT);

        // the role screen fires before any lookup
        assert!(matches!(
            platform.bookings.create(&owner, &ghost_boat, &[]),
            Err(Error::Forbidden { .. })
        ));
    }
}

mod gate_table_tests {
    use super::*;

    /// Spot checks on the fixed (role, action) table.
    #[test]
    fn table_matches_the_policy() {
        assert_eq!(decision(Role::Guest, Action::BrowseCatalog), Decision::Allow);
        assert_eq!(decision(Role::Guest, Action::SubmitBoat), Decision::Deny);
        assert_eq!(decision(Role::User, Action::CreateBooking), Decision::Allow);
        assert_eq!(decision(Role::BoatOwner, Action::CreateBooking), Decision::Deny);
        assert_eq!(decision(Role::User, Action::SetPrice), Decision::IfOwner);
        assert_eq!(decision(Role::BoatOwner, Action::ApproveBooking), Decision::IfOwner);
        assert_eq!(decision(Role::Admin, Action::ApproveBooking), Decision::IfOwner);
        assert_eq!(decision(Role::Admin, Action::CancelBooking), Decision::IfParty);
        assert_eq!(decision(Role::Admin, Action::ReviewBoat), Decision::Allow);
        assert_eq!(decision(Role::User, Action::ReviewBoat), Decision::Deny);
        assert_eq!(decision(Role::Admin, Action::AuditBookings), Decision::Allow);
        assert_eq!(decision(Role::User, Action::AuditBookings), Decision::Deny);
    }
}
