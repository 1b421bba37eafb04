use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::store::Post;

/// A post mutation, as delivered to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum PostEvent {
    Create { post: Post },
    Update { post: Post },
    Delete {
        #[serde(rename = "postId")]
        post_id: Uuid,
    },
}

/// Broadcast hub for post changes
///
/// Slow subscribers lag and lose the oldest events rather than holding
/// up publishers.
#[derive(Clone)]
pub struct PostEvents {
    sender: broadcast::Sender<PostEvent>,
}

impl PostEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PostEvent> {
        self.sender.subscribe()
    }

    /// Returns how many subscribers received the event; zero is fine.
    pub fn publish(&self, event: PostEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                tracing::trace!("No post event subscribers");
                0
            }
        }
    }
}
