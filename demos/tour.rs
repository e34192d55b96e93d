//! End-to-end walkthrough of the booking platform against a scratch store:
//! registration, boat submission and review, pricing, booking, approval and
//! cancellation.
//!
//! Run with `cargo run --example tour`.

use anyhow::Context;
use backwater::account::AccountDraft;
use backwater::auth::Role;
use backwater::catalog::PlaceDraft;
use backwater::fleet::BoatDraft;
use backwater::platform::Platform;
use tempfile::tempdir;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let scratch = tempdir()?;
    let platform = Platform::open(scratch.path().join("tour.db"))?;

    // bootstrap the administrator and two accounts
    let admin = platform
        .identity
        .ensure_admin("Admin", "admin@backwater.example", "admin-secret")?
        .caller();

    let uma = platform
        .identity
        .register(
            AccountDraft::new()
                .set_name("Uma")
                .set_email("uma@example.com")
                .set_password("rowboat"),
        )
        .context("registering Uma")?;
    let mut uma_caller = uma.caller();

    let vik = platform
        .identity
        .register(
            AccountDraft::new()
                .set_name("Vik")
                .set_email("vik@example.com")
                .set_password("harbour"),
        )
        .context("registering Vik")?;
    let vik_caller = vik.caller();

    // admin curates the destination catalog
    let lagoon = platform.catalog.add_place(
        &admin,
        PlaceDraft::new()
            .set_name("Emerald Lagoon")
            .set_description("Shallow waters, good for swimming")
            .set_image("uploads/lagoon.jpg"),
    )?;
    let reef = platform.catalog.add_place(
        &admin,
        PlaceDraft::new()
            .set_name("Coral Reef")
            .set_description("Snorkelling spot, half a day out")
            .set_image("uploads/reef.jpg"),
    )?;

    // Uma submits a boat; it sits pending until the admin reviews it
    let boat = platform.fleet.submit(
        &uma_caller,
        BoatDraft::new()
            .set_name("Kingfisher")
            .set_boat_type("catamaran")
            .set_capacity(8)
            .set_photo("uploads/kingfisher.jpg"),
    )?;
    println!("submitted {} ({})", boat.id, boat.status.as_str());

    let boat = platform.fleet.approve(&admin, &boat.id)?;
    println!("approved  {} ({})", boat.id, boat.status.as_str());

    // approval promoted Uma in the same transaction
    let uma = platform.identity.get_profile(&admin, &uma.id)?;
    assert_eq!(uma.role, Role::BoatOwner);
    uma_caller = uma.caller();
    println!("Uma is now a {}", uma.role.as_str());

    // Uma prices her boat per destination
    platform
        .pricing
        .set_price(&uma_caller, &boat.id, &lagoon.id, 100)?;
    platform
        .pricing
        .set_price(&uma_caller, &boat.id, &reef.id, 250)?;

    // Vik books both destinations; the total is resolved server-side
    let booking = platform.bookings.create(
        &vik_caller,
        &boat.id,
        &[lagoon.id.clone(), reef.id.clone()],
    )?;
    println!(
        "booking {} total {} ({})",
        booking.id,
        booking.total_price,
        booking.status.as_str()
    );

    let booking = platform.bookings.approve(&uma_caller, &booking.id)?;
    println!("owner approved -> {}", booking.status.as_str());

    let booking = platform.bookings.cancel(&vik_caller, &booking.id)?;
    println!("user cancelled -> {}", booking.status.as_str());

    // a second approval attempt fails: Cancelled is terminal
    let retry = platform.bookings.approve(&uma_caller, &booking.id);
    println!("re-approve after cancel: {}", retry.unwrap_err());

    for view in platform.bookings.list_for_owner(&uma_caller, &uma.id)? {
        println!(
            "owner view: {} for {:?} ({})",
            view.booking.id,
            view.places,
            view.booking.status.as_str()
        );
    }

    Ok(())
}
