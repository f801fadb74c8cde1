use slotbook_core::event::IdentityKey;
use slotbook_db::repositories::EventRepo;
use sqlx::PgPool;

/// Connect, migrate, verify schema and seed data.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    slotbook_db::health_check(&pool).await.unwrap();

    for table in ["events", "slots", "registrations", "registration_slots", "waitlist_entries"] {
        sqlx::query(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_seeded_events(pool: PgPool) {
    let havanam = EventRepo::find_by_slug(&pool, "gayathri-havanam")
        .await
        .unwrap()
        .expect("gayathri-havanam should be seeded");
    let config = havanam.config().unwrap();
    assert_eq!(config.action_code, "GH");
    assert_eq!(config.day_count, 3);
    assert_eq!(config.max_per_day, 4);
    assert_eq!(config.identity, IdentityKey::MobileNumber);

    let parayana = EventRepo::find_by_slug(&pool, "vishnu-sahasra-nama-parayana")
        .await
        .unwrap()
        .expect("vishnu-sahasra-nama-parayana should be seeded");
    let config = parayana.config().unwrap();
    assert_eq!(config.action_code, "VSNP");
    assert_eq!(config.day_count, 2);
    assert_eq!(config.identity, IdentityKey::SourceReference);

    assert_eq!(EventRepo::list(&pool).await.unwrap().len(), 2);
}

/// The counter cannot leave `0..=max_capacity` even through raw SQL.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_capacity_check_constraint(pool: PgPool) {
    let event_id: i64 = sqlx::query_scalar("SELECT id FROM events WHERE slug = 'gayathri-havanam'")
        .fetch_one(&pool)
        .await
        .unwrap();
    let slot_id: i64 = sqlx::query_scalar(
        "INSERT INTO slots (event_id, day, slot_time, max_capacity) VALUES ($1, 1, '6:00 AM', 1) RETURNING id",
    )
    .bind(event_id)
    .fetch_one(&pool)
    .await
    .unwrap();

    let over = sqlx::query("UPDATE slots SET registration_count = 2 WHERE id = $1")
        .bind(slot_id)
        .execute(&pool)
        .await;
    assert!(over.is_err(), "count above capacity must be rejected");

    let under = sqlx::query("UPDATE slots SET registration_count = -1 WHERE id = $1")
        .bind(slot_id)
        .execute(&pool)
        .await;
    assert!(under.is_err(), "negative count must be rejected");
}
