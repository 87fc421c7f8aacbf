//! Fire-and-forget notification scheduling.
//!
//! Notifications are submitted to a channel drained by a background worker
//! thread. Delivery failures are logged and swallowed; submissions never
//! block the caller and may be lost on process crash. No durability is
//! promised here.

use std::sync::mpsc::{self, Sender};
use std::thread;

use serde::Serialize;
use thiserror::Error;

/// What a notification is about; the dispatcher routes escalations to
/// administrators and fan-outs to the listed users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PricingEscalation,
    PromotionCreated,
}

/// A single outbound notification.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    /// Users to notify. Empty for escalations, which the dispatcher routes
    /// to the administrator audience itself.
    pub target_user_ids: Vec<i32>,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Related record identifiers for deep links.
    pub promotion_id: Option<i32>,
    pub product_ids: Vec<i32>,
    pub store_ids: Vec<i32>,
}

/// Error reported by a delivery sink.
#[derive(Debug, Error)]
#[error("notification delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// External delivery collaborator consumed by the queue worker.
pub trait NotificationDelivery: Send + 'static {
    fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError>;
}

/// Sink that only logs; useful where no dispatcher is wired up.
#[derive(Debug, Default)]
pub struct LogDelivery;

impl NotificationDelivery for LogDelivery {
    fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        log::info!(
            "notification {:?} `{}` for {} users",
            notification.kind,
            notification.title,
            notification.target_user_ids.len()
        );
        Ok(())
    }
}

/// Submission interface the services depend on. Submitting never fails from
/// the caller's point of view.
pub trait Notifier {
    fn notify(&self, notification: Notification);
}

/// Channel-backed queue with a detached worker thread.
#[derive(Clone)]
pub struct NotificationQueue {
    sender: Sender<Notification>,
}

impl NotificationQueue {
    /// Spawn the worker and return the submission handle. The worker exits
    /// once every queue handle has been dropped.
    pub fn start<D: NotificationDelivery>(delivery: D) -> Self {
        let (sender, receiver) = mpsc::channel::<Notification>();

        thread::spawn(move || {
            for notification in receiver {
                if let Err(err) = delivery.deliver(&notification) {
                    log::error!(
                        "Failed to deliver {:?} notification: {err}",
                        notification.kind
                    );
                }
            }
        });

        Self { sender }
    }
}

impl Notifier for NotificationQueue {
    fn notify(&self, notification: Notification) {
        if self.sender.send(notification).is_err() {
            log::error!("Notification queue worker is gone; dropping notification");
        }
    }
}
