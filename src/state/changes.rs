use tokio::sync::broadcast;
use uuid::Uuid;

/// Logical table a change notification refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// Panel users.
    Users,
    /// Game definitions.
    Games,
    /// Game questions.
    Questions,
    /// Submitted answers.
    Entries,
    /// Completed attempts.
    Scores,
}

/// Notification that rows of one table changed.
///
/// Stands in for the external store's change channels: every write the
/// service performs publishes one of these, and subscribers filter by table
/// plus the game id column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Table that changed.
    pub table: TableKind,
    /// Game the changed rows belong to, when the table has that column.
    pub game_id: Option<Uuid>,
}

impl ChangeEvent {
    /// Change affecting the scores of one game.
    pub fn scores(game_id: Uuid) -> Self {
        Self {
            table: TableKind::Scores,
            game_id: Some(game_id),
        }
    }

    /// Change affecting user rows.
    pub fn users() -> Self {
        Self {
            table: TableKind::Users,
            game_id: None,
        }
    }

    /// Whether this event matches a subscription on `table` filtered by
    /// equality on the game id column.
    pub fn matches(&self, table: TableKind, game_id: Uuid) -> bool {
        self.table == table && self.game_id == Some(game_id)
    }
}

/// Broadcast hub fanning change notifications out to live subscribers.
pub struct ChangeHub {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeHub {
    /// Construct a hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all current subscribers, ignoring delivery errors.
    pub fn publish(&self, event: ChangeEvent) {
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_only_match_their_game() {
        let hub = ChangeHub::new(8);
        let mut receiver = hub.subscribe();

        let mine = Uuid::new_v4();
        let other = Uuid::new_v4();
        hub.publish(ChangeEvent::scores(other));
        hub.publish(ChangeEvent::users());
        hub.publish(ChangeEvent::scores(mine));

        let mut matched = 0;
        while let Ok(event) = receiver.try_recv() {
            if event.matches(TableKind::Scores, mine) {
                matched += 1;
            }
        }
        assert_eq!(matched, 1);
    }
}
