use std::collections::HashSet;

use crate::message::MessageId;

/// Ids this process has already settled. Owned by the recorder, created at
/// startup and dropped at shutdown, never shared as a global.
#[derive(Default)]
pub(super) struct SeenMessages {
    ids: HashSet<MessageId>,
}

impl SeenMessages {
    pub(super) fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub(super) fn insert(&mut self, id: MessageId) {
        self.ids.insert(id);
    }
}
