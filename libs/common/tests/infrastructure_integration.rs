//! Integration tests against live PostgreSQL and Redis
//!
//! These run the migrations and exercise the PostgreSQL repositories and the
//! Redis store. They need `DATABASE_URL` and `REDIS_URL` to point at disposable
//! instances, so they are ignored by default:
//!
//! ```sh
//! cargo test -p common --test infrastructure_integration -- --ignored
//! ```

use chrono::{Duration, Utc};
use common::{
    cache::{KeyValueStore, RedisConfig, RedisPool},
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
    error::RepositoryError,
    models::{
        ListingStatus, NewBusinessVerification, NewListing, NewReservation, NewUser, Role,
        VerificationStatus,
    },
    repositories::Repositories,
};
use uuid::Uuid;

async fn repositories() -> Result<Repositories, Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;
    assert!(health_check(&pool).await?, "Database health check failed");
    run_migrations(&pool).await?;
    Ok(Repositories::postgres(pool))
}

fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, Uuid::new_v4())
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_confirmed_reservations_never_overlap() -> Result<(), Box<dyn std::error::Error>> {
    let repos = repositories().await?;

    let provider = repos
        .users
        .create(&NewUser {
            name: "Host".to_string(),
            email: unique_email("host"),
            password_hash: "hash".to_string(),
        })
        .await?;
    repos.users.assign_role(provider.id, Role::Provider).await?;
    let second_role = repos.users.assign_role(provider.id, Role::Customer).await;
    assert!(matches!(second_role, Err(RepositoryError::Conflict(_))));

    let guest = repos
        .users
        .create(&NewUser {
            name: "Guest".to_string(),
            email: unique_email("guest"),
            password_hash: "hash".to_string(),
        })
        .await?;

    let listing = repos
        .listings
        .create(&NewListing {
            provider_id: provider.id,
            title: "Loft".to_string(),
            description: String::new(),
            category: "apartment".to_string(),
            location: "Yaounde".to_string(),
            price_per_night: 40.0,
            capacity: 2,
        })
        .await?;
    repos
        .listings
        .set_status(listing.id, ListingStatus::Approved, None)
        .await?;

    let start = Utc::now().date_naive() + Duration::days(30);
    let booking = |offset: i64, nights: i64| NewReservation {
        listing_id: listing.id,
        user_id: guest.id,
        start_date: start + Duration::days(offset),
        end_date: start + Duration::days(offset + nights),
        total_price: 40.0 * nights as f64,
    };

    let first = repos.reservations.create(&booking(0, 3)).await?;
    let competing = repos.reservations.create(&booking(1, 3)).await?;
    repos.reservations.confirm(first.id).await?;

    let blocked = repos.reservations.create(&booking(2, 2)).await;
    assert!(matches!(blocked, Err(RepositoryError::Conflict(_))));

    let confirm_competing = repos.reservations.confirm(competing.id).await;
    assert!(matches!(confirm_competing, Err(RepositoryError::Conflict(_))));

    let nights = repos
        .reservations
        .nights_booked(
            listing.id,
            start,
            start + Duration::days(30),
            common::models::ReservationStatus::Confirmed,
        )
        .await?;
    assert_eq!(nights, 3);

    repos.listings.delete(listing.id).await?;
    Ok(())
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_verification_approval_is_atomic() -> Result<(), Box<dyn std::error::Error>> {
    let repos = repositories().await?;

    let provider = repos
        .users
        .create(&NewUser {
            name: "Host".to_string(),
            email: unique_email("verify"),
            password_hash: "hash".to_string(),
        })
        .await?;
    let request = NewBusinessVerification {
        user_id: provider.id,
        business_name: "Stays Ltd".to_string(),
        registration_number: "RC-42".to_string(),
        document_url: None,
        contact_phone: None,
    };

    let pending = repos.verifications.submit(&request).await?;
    let duplicate = repos.verifications.submit(&request).await;
    assert!(matches!(duplicate, Err(RepositoryError::Conflict(_))));

    let approved = repos.verifications.approve(pending.id, provider.id).await?;
    assert_eq!(approved.status, VerificationStatus::Approved);

    let user = repos.users.find_by_id(provider.id).await?;
    assert!(user.is_some_and(|user| user.verified));
    Ok(())
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_redis_set_get_delete() -> Result<(), Box<dyn std::error::Error>> {
    let redis_config = RedisConfig::from_env()?;
    let redis_pool = RedisPool::new(&redis_config).await?;

    assert!(
        redis_pool.health_check().await?,
        "Redis health check failed"
    );

    let test_key = "integration_test_key";
    let test_value = "integration_test_value";

    redis_pool.set(test_key, test_value, Some(10)).await?;
    assert_eq!(
        redis_pool.get(test_key).await?,
        Some(test_value.to_string()),
        "Redis SET/GET test failed"
    );

    redis_pool.delete(test_key).await?;
    assert_eq!(
        redis_pool.get(test_key).await?,
        None,
        "Redis delete operation failed"
    );

    Ok(())
}
