//! Helpers for integration tests.
#![allow(dead_code)]

use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use promo_engine::db::{DbPool, establish_connection_pool};
use promo_engine::models;
use promo_engine::schema;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!(); // assumes migrations/ exists

/// Temporary database used in integration tests.
pub struct TestDb {
    filename: String,
    pool: DbPool,
}

impl TestDb {
    pub fn new(filename: &str) -> Self {
        std::fs::remove_file(filename).ok(); // Clean up old DB

        let pool =
            establish_connection_pool(filename).expect("Failed to establish SQLite connection.");
        let mut conn = pool
            .get()
            .expect("Failed to get SQLite connection from pool.");
        conn.run_pending_migrations(MIGRATIONS)
            .expect("Migrations failed");
        TestDb {
            filename: filename.to_string(),
            pool,
        }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        std::fs::remove_file(&self.filename).ok();
        std::fs::remove_file(format!("{}-shm", &self.filename)).ok();
        std::fs::remove_file(format!("{}-wal", &self.filename)).ok();
    }
}

// The stores/products/users/bookmarks tables belong to external
// collaborators; tests seed them directly instead of going through the
// engine's surface.

pub fn seed_user(pool: &DbPool, name: &str, email: &str, subscription_tier: &str) -> i32 {
    let mut conn = pool.get().expect("connection");
    diesel::insert_into(schema::users::table)
        .values(&models::user::NewUser {
            name,
            email,
            subscription_tier,
        })
        .get_result::<models::user::User>(&mut conn)
        .expect("seed user")
        .id
}

pub fn seed_store(pool: &DbPool, owner_id: i32, name: &str) -> i32 {
    let mut conn = pool.get().expect("connection");
    diesel::insert_into(schema::stores::table)
        .values(&models::store::NewStore { owner_id, name })
        .get_result::<models::store::Store>(&mut conn)
        .expect("seed store")
        .id
}

pub fn seed_product(pool: &DbPool, store_id: i32, name: &str, price: f64) -> i32 {
    let mut conn = pool.get().expect("connection");
    diesel::insert_into(schema::products::table)
        .values(&models::product::NewProduct {
            store_id,
            name,
            price,
            currency: "USD",
        })
        .get_result::<models::product::Product>(&mut conn)
        .expect("seed product")
        .id
}

pub fn seed_bookmark(pool: &DbPool, user_id: i32, product_id: Option<i32>, store_id: Option<i32>) {
    let mut conn = pool.get().expect("connection");
    diesel::insert_into(schema::bookmarks::table)
        .values(&models::bookmark::NewBookmark {
            user_id,
            product_id,
            store_id,
        })
        .execute(&mut conn)
        .expect("seed bookmark");
}
