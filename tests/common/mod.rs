use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

use storefront_api::db::{establish_connection_with_config, run_migrations, DbConfig};
use storefront_api::entities::{product, promo_code};
use storefront_api::events::{Event, EventSender};
use storefront_api::services::{CartService, PromoCodeService, ShippingTaxService};

/// Test harness backed by a throwaway SQLite database file, one per test.
/// The file is deleted when the harness is dropped.
pub struct TestApp {
    pub db: Arc<sea_orm::DatabaseConnection>,
    pub cart: CartService,
    pub promo_codes: PromoCodeService,
    pub shipping: ShippingTaxService,
    // Keep the receiver alive so best-effort event sends succeed.
    pub _event_rx: mpsc::Receiver<Event>,
    db_path: PathBuf,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let db_path = std::env::temp_dir().join(format!("storefront-test-{}.db", Uuid::new_v4()));
        let url = format!("sqlite://{}?mode=rwc", db_path.display());

        let db = establish_connection_with_config(
            &url,
            DbConfig {
                max_connections: 1,
                min_connections: 1,
                connect_timeout: Duration::from_secs(5),
                idle_timeout: Duration::from_secs(60),
                acquire_timeout: Duration::from_secs(5),
            },
        )
        .await
        .expect("failed to open test database");

        run_migrations(&db).await.expect("migrations failed");

        let db = Arc::new(db);
        let (tx, rx) = mpsc::channel(256);
        let event_sender = Arc::new(EventSender::new(tx));

        Self {
            cart: CartService::new(db.clone(), event_sender),
            promo_codes: PromoCodeService::new(db.clone()),
            shipping: ShippingTaxService::new(),
            db,
            _event_rx: rx,
            db_path,
        }
    }

    pub async fn seed_product(&self, name: &str, price: Decimal, stock: i32) -> Uuid {
        let id = Uuid::new_v4();
        product::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            price: Set(price),
            stock: Set(stock),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await
        .expect("failed to seed product");
        id
    }

    pub async fn seed_promo(
        &self,
        code: &str,
        discount_percentage: f64,
        is_active: bool,
        usage_limit: Option<i32>,
        times_used: i32,
        expires_at: Option<DateTime<Utc>>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        promo_code::ActiveModel {
            id: Set(id),
            code: Set(code.to_string()),
            discount_percentage: Set(discount_percentage),
            is_active: Set(is_active),
            usage_limit: Set(usage_limit),
            times_used: Set(times_used),
            expires_at: Set(expires_at),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await
        .expect("failed to seed promo code");
        id
    }

}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_path);
        let mut wal = self.db_path.clone();
        wal.set_extension("db-wal");
        let _ = std::fs::remove_file(&wal);
        let mut shm = self.db_path.clone();
        shm.set_extension("db-shm");
        let _ = std::fs::remove_file(&shm);
    }
}
