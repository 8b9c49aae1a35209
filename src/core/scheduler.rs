use crate::gameplay::replay::Score;
use std::sync::mpsc::{Receiver, Sender, channel};

/// Work that background tasks hand back to the thread owning the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum UiTask {
    LoadScore(Score),
}

/// Sending half, cloned into background tasks.
#[derive(Clone, Debug)]
pub struct UiScheduler {
    sender: Sender<UiTask>,
}

impl UiScheduler {
    /// Queues `task` for the next drain. Returns false if the UI side is gone.
    pub fn schedule(&self, task: UiTask) -> bool {
        self.sender.send(task).is_ok()
    }
}

/// Receiving half, drained once per tick by the update loop.
#[derive(Debug)]
pub struct UiQueue {
    receiver: Receiver<UiTask>,
}

impl UiQueue {
    /// Everything queued so far, without blocking.
    pub fn drain(&self) -> impl Iterator<Item = UiTask> + '_ {
        self.receiver.try_iter()
    }
}

pub fn ui_channel() -> (UiScheduler, UiQueue) {
    let (sender, receiver) = channel();
    (UiScheduler { sender }, UiQueue { receiver })
}
