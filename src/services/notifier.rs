use mongodb::bson::{oid::ObjectId, DateTime};

use crate::db::DbConn;
use crate::models::Notification;

/// Writes in-app notification records. Delivery beyond the notifications
/// collection (push, email) is out of scope; failures here never fail the
/// request that triggered them.
pub struct NotificationService;

impl NotificationService {
    pub async fn notify(
        db: &DbConn,
        user_id: ObjectId,
        title: &str,
        body: &str,
        link: Option<String>,
    ) {
        let notification = Notification {
            id: None,
            user_id,
            title: title.to_string(),
            body: body.to_string(),
            link,
            read: false,
            created_at: DateTime::now(),
        };

        if let Err(e) = db
            .collection::<Notification>("notifications")
            .insert_one(&notification, None)
            .await
        {
            error!("Failed to create notification for {}: {}", user_id.to_hex(), e);
        }
    }
}
