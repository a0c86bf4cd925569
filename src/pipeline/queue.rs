//! Bounded work queue between the task generator and the worker pool.
//!
//! A crossbeam `bounded` channel split into a producer half ([`TaskSender`]) and a cloneable
//! consumer half ([`TaskReceiver`]). Closing consumes the sender, so the queue can only be
//! closed once; workers drain what is left and then see [`Dequeue::Closed`].

use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender, bounded};

use super::context::StopFlag;
use crate::Task;
use crate::utils::config::STOP_POLL_INTERVAL;

/// Result of [`TaskSender::enqueue`]. A task that was not accepted is handed back, never dropped.
#[derive(Debug, PartialEq, Eq)]
pub enum Enqueue {
    Sent,
    /// Stop was requested before the queue had room.
    Stopped(Task),
    /// Every worker is gone.
    Disconnected(Task),
}

/// Result of [`TaskReceiver::dequeue`].
#[derive(Debug, PartialEq, Eq)]
pub enum Dequeue {
    Task(Task),
    /// Queue closed and fully drained.
    Closed,
    /// Stop was requested; pending tasks are left in the queue.
    Stopped,
}

/// Producer half. Owned by the coordinator.
pub struct TaskSender {
    tx: Sender<Task>,
    stop: StopFlag,
    capacity: usize,
}

/// Consumer half. One clone per worker.
#[derive(Clone)]
pub struct TaskReceiver {
    rx: Receiver<Task>,
    stop: StopFlag,
}

/// Create a work queue holding at most `capacity` pending tasks (at least 1).
pub fn work_queue(capacity: usize, stop: StopFlag) -> (TaskSender, TaskReceiver) {
    let capacity = capacity.max(1);
    let (tx, rx) = bounded::<Task>(capacity);
    (
        TaskSender {
            tx,
            stop: stop.clone(),
            capacity,
        },
        TaskReceiver { rx, stop },
    )
}

impl TaskSender {
    /// Block while the queue is full. Wakes periodically to honour a stop request.
    pub fn enqueue(&self, task: Task) -> Enqueue {
        let mut task = task;
        loop {
            if self.stop.is_requested() {
                return Enqueue::Stopped(task);
            }
            match self.tx.send_timeout(task, STOP_POLL_INTERVAL) {
                Ok(()) => return Enqueue::Sent,
                Err(SendTimeoutError::Timeout(t)) => task = t,
                Err(SendTimeoutError::Disconnected(t)) => return Enqueue::Disconnected(t),
            }
        }
    }

    /// Pending tasks right now.
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Close the queue. Workers drain the remaining tasks, then receive [`Dequeue::Closed`].
    pub fn close(self) {
        drop(self.tx);
    }
}

impl TaskReceiver {
    /// Block while the queue is empty and still open. Wakes periodically to honour a stop request.
    pub fn dequeue(&self) -> Dequeue {
        loop {
            if self.stop.is_requested() {
                return Dequeue::Stopped;
            }
            match self.rx.recv_timeout(STOP_POLL_INTERVAL) {
                Ok(task) => return Dequeue::Task(task),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return Dequeue::Closed,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
