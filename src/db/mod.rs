use mongodb::{Client, Database, IndexModel};
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use rocket::{Rocket, Build};
use rocket::fairing::AdHoc;
use std::ops::Deref;

/// Managed handle exposing the database plus the client, so that
/// multi-write sequences can run inside a `ClientSession` transaction.
pub struct DbConn {
    client: Client,
    database: Database,
}

impl DbConn {
    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl Deref for DbConn {
    type Target = Database;

    fn deref(&self) -> &Database {
        &self.database
    }
}

pub fn init() -> AdHoc {
    AdHoc::on_ignite("MongoDB", |rocket| async {
        match connect().await {
            Ok(conn) => {
                info!("✓ MongoDB connected successfully");
                if let Err(e) = ensure_indexes(&conn).await {
                    error!("✗ Failed to create indexes: {}", e);
                }
                rocket.manage(conn)
            }
            Err(e) => {
                error!("✗ Failed to connect to MongoDB: {}", e);
                rocket
            }
        }
    })
}

async fn connect() -> Result<DbConn, mongodb::error::Error> {
    let uri = crate::config::Config::mongodb_uri();
    let client = Client::with_uri_str(&uri).await?;

    // Test connection
    client
        .database("admin")
        .run_command(doc! {"ping": 1}, None)
        .await?;

    let database = client.database("momcar");
    Ok(DbConn { client, database })
}

/// One user per email, one contact per unordered user pair, one catalog
/// entry per (document_type, profile_type). The contacts index is what makes
/// find-or-create safe against concurrent duplicate requests.
async fn ensure_indexes(db: &DbConn) -> Result<(), mongodb::error::Error> {
    let unique = IndexOptions::builder().unique(true).build();

    db.collection::<mongodb::bson::Document>("users")
        .create_index(
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(unique.clone())
                .build(),
            None,
        )
        .await?;

    db.collection::<mongodb::bson::Document>("contacts")
        .create_index(
            IndexModel::builder()
                .keys(doc! { "pair_key": 1 })
                .options(unique.clone())
                .build(),
            None,
        )
        .await?;

    db.collection::<mongodb::bson::Document>("document_configs")
        .create_index(
            IndexModel::builder()
                .keys(doc! { "document_type": 1, "profile_type": 1 })
                .options(unique)
                .build(),
            None,
        )
        .await?;

    Ok(())
}
