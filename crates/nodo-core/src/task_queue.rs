//! Cross-thread task queue: the sole gateway for live graph mutation.
//!
//! Non-realtime threads enqueue closures through a [`TaskSender`]; the
//! manager drains the queue at the top of every
//! [`process`](crate::NodeManager::process) call and runs the tasks on the
//! audio thread, in enqueue order, before any node is triggered. Structural
//! changes (adding/removing nodes, rewiring pins) therefore happen between
//! blocks, never concurrently with them.
//!
//! Tasks must be short, must not block, and must not panic; failures inside
//! a task are not reported back to the producer. A node removed by a task is
//! dropped during the drain, i.e. on the audio thread.

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::manager::NodeManager;

/// A queued graph mutation.
pub type Task = Box<dyn FnOnce(&mut NodeManager) + Send>;

/// Multi-producer handle for enqueueing tasks from any thread.
///
/// Cloneable; enqueueing never blocks and never touches the audio thread
/// directly.
#[derive(Clone)]
pub struct TaskSender {
    sender: Sender<Task>,
}

impl TaskSender {
    /// Enqueues `task` to run at the start of the next `process` call.
    ///
    /// Fire-and-forget: if the manager has been dropped the task is
    /// silently discarded.
    pub fn enqueue<F>(&self, task: F)
    where
        F: FnOnce(&mut NodeManager) + Send + 'static,
    {
        let _ = self.sender.send(Box::new(task));
    }
}

/// The queue itself, owned by the manager.
pub(crate) struct TaskQueue {
    sender: Sender<Task>,
    receiver: Receiver<Task>,
}

impl TaskQueue {
    pub(crate) fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    pub(crate) fn sender(&self) -> TaskSender {
        TaskSender {
            sender: self.sender.clone(),
        }
    }

    /// Hands out the consumer side so the manager can run tasks against
    /// itself without holding a borrow on the queue.
    pub(crate) fn receiver(&self) -> Receiver<Task> {
        self.receiver.clone()
    }
}
