//! In-process message channel.
//!
//! [`Mailbox`] is a shared FIFO of tagged messages that implements
//! [`Channel`]. It lets two threads of one process play sender and receiver,
//! which is enough to exercise the prober end to end without a real
//! message-passing runtime.
//!
//! Matching follows the usual `(source, tag)` rules: [`ANY_SOURCE`] and
//! [`ANY_TAG`] match everything, and among matching messages the oldest one
//! wins.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};
use thiserror::Error;

use crate::channel::{Channel, Request};

/// Wildcard source selector.
pub const ANY_SOURCE: u32 = u32::MAX;

/// Wildcard tag selector.
pub const ANY_TAG: u32 = u32::MAX;

/// A queued message and its selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub source: u32,
    pub tag: u32,
    pub payload: Vec<u8>,
}

impl Message {
    #[inline]
    fn matches(&self, source: u32, tag: u32) -> bool {
        (source == ANY_SOURCE || source == self.source) && (tag == ANY_TAG || tag == self.tag)
    }
}

/// Failure reported by a [`Mailbox`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MailboxError {
    #[error("mailbox is closed")]
    Closed,
}

#[derive(Debug, Default)]
struct Queue {
    messages: VecDeque<Message>,
    closed: bool,
}

impl Queue {
    fn position(&self, source: u32, tag: u32) -> Option<usize> {
        self.messages.iter().position(|m| m.matches(source, tag))
    }
}

/// Thread-safe message queue with `(source, tag)` matching.
#[derive(Debug, Default)]
pub struct Mailbox {
    queue: Mutex<Queue>,
    arrived: Condvar,
}

impl Mailbox {
    /// Creates an empty, open mailbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message and wakes blocked waiters.
    pub fn post(&self, source: u32, tag: u32, payload: Vec<u8>) -> Result<(), MailboxError> {
        let mut queue = self.queue.lock();
        if queue.closed {
            return Err(MailboxError::Closed);
        }
        queue.messages.push_back(Message {
            source,
            tag,
            payload,
        });
        drop(queue);
        self.arrived.notify_all();
        Ok(())
    }

    /// Removes the oldest matching message, if any, without blocking.
    pub fn take(&self, source: u32, tag: u32) -> Option<Message> {
        let mut queue = self.queue.lock();
        let at = queue.position(source, tag)?;
        queue.messages.remove(at)
    }

    /// Blocks until a matching message arrives and removes it.
    ///
    /// Messages already queued are still delivered after [`close`](Self::close).
    pub fn recv(&self, source: u32, tag: u32) -> Result<Message, MailboxError> {
        let mut queue = self.queue.lock();
        loop {
            if let Some(at) = queue.position(source, tag) {
                if let Some(message) = queue.messages.remove(at) {
                    return Ok(message);
                }
            }
            if queue.closed {
                return Err(MailboxError::Closed);
            }
            self.arrived.wait(&mut queue);
        }
    }

    /// Starts a non-blocking receive, to be finished with
    /// [`Prober::complete`](crate::Prober::complete).
    pub fn irecv(&self, source: u32, tag: u32) -> RecvRequest<'_> {
        RecvRequest {
            mailbox: self,
            source,
            tag,
            message: None,
        }
    }

    /// Rejects further posts and wakes every waiter.
    pub fn close(&self) {
        self.queue.lock().closed = true;
        self.arrived.notify_all();
    }

    /// Number of queued messages.
    pub fn len(&self) -> usize {
        self.queue.lock().messages.len()
    }

    /// `true` when no message is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Channel for Mailbox {
    type Source = u32;
    type Tag = u32;
    type Error = MailboxError;

    fn test_ready(&self, source: u32, tag: u32) -> Result<bool, MailboxError> {
        let queue = self.queue.lock();
        match queue.position(source, tag) {
            Some(_) => Ok(true),
            None if queue.closed => Err(MailboxError::Closed),
            None => Ok(false),
        }
    }

    fn wait_ready(&self, source: u32, tag: u32) -> Result<(), MailboxError> {
        let mut queue = self.queue.lock();
        loop {
            if queue.position(source, tag).is_some() {
                return Ok(());
            }
            if queue.closed {
                return Err(MailboxError::Closed);
            }
            self.arrived.wait(&mut queue);
        }
    }
}

/// Pending receive on a [`Mailbox`].
#[derive(Debug)]
pub struct RecvRequest<'a> {
    mailbox: &'a Mailbox,
    source: u32,
    tag: u32,
    message: Option<Message>,
}

impl RecvRequest<'_> {
    /// The received message, once the request has completed.
    pub fn into_message(self) -> Option<Message> {
        self.message
    }
}

impl Request for RecvRequest<'_> {
    type Error = MailboxError;

    fn test(&mut self) -> Result<bool, MailboxError> {
        if self.message.is_some() {
            return Ok(true);
        }
        let mut queue = self.mailbox.queue.lock();
        if let Some(at) = queue.position(self.source, self.tag) {
            self.message = queue.messages.remove(at);
            return Ok(self.message.is_some());
        }
        if queue.closed {
            return Err(MailboxError::Closed);
        }
        Ok(false)
    }

    fn wait(&mut self) -> Result<(), MailboxError> {
        if self.message.is_none() {
            self.message = Some(self.mailbox.recv(self.source, self.tag)?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_ready_does_not_consume() {
        let mb = Mailbox::new();
        mb.post(1, 2, vec![9]).unwrap();
        assert!(mb.test_ready(1, 2).unwrap());
        assert!(mb.test_ready(1, 2).unwrap());
        assert_eq!(mb.len(), 1);
        assert!(!mb.test_ready(1, 3).unwrap());
    }

    #[test]
    fn wildcards_match_oldest_first() {
        let mb = Mailbox::new();
        mb.post(3, 1, vec![1]).unwrap();
        mb.post(4, 2, vec![2]).unwrap();

        assert_eq!(mb.take(ANY_SOURCE, 2).unwrap().payload, vec![2]);
        assert_eq!(mb.take(ANY_SOURCE, ANY_TAG).unwrap().payload, vec![1]);
        assert!(mb.is_empty());
        assert!(mb.take(ANY_SOURCE, ANY_TAG).is_none());
    }

    #[test]
    fn closed_mailbox_reports_error_once_drained() {
        let mb = Mailbox::new();
        mb.post(0, 0, vec![]).unwrap();
        mb.close();

        assert_eq!(mb.post(0, 0, vec![]), Err(MailboxError::Closed));
        assert!(mb.test_ready(0, 0).unwrap());
        assert!(mb.recv(0, 0).is_ok());
        assert_eq!(mb.test_ready(0, 0), Err(MailboxError::Closed));
        assert_eq!(mb.wait_ready(0, 0), Err(MailboxError::Closed));
    }

    #[test]
    fn wait_ready_wakes_on_post() {
        let mb = Arc::new(Mailbox::new());
        let sender = {
            let mb = Arc::clone(&mb);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                mb.post(0, 5, vec![7]).unwrap();
            })
        };

        mb.wait_ready(0, 5).unwrap();
        assert_eq!(mb.len(), 1);
        sender.join().unwrap();
    }

    #[test]
    fn recv_request_holds_taken_message() {
        let mb = Mailbox::new();
        let mut req = mb.irecv(0, 1);
        assert!(!req.test().unwrap());

        mb.post(0, 1, vec![4, 2]).unwrap();
        assert!(req.test().unwrap());
        assert!(req.test().unwrap());
        assert!(mb.is_empty());
        assert_eq!(req.into_message().unwrap().payload, vec![4, 2]);
    }

    #[test]
    fn recv_request_never_completes_empty_handed() {
        let mb = Arc::new(Mailbox::new());
        for round in 0..200u32 {
            let poster = {
                let mb = Arc::clone(&mb);
                thread::spawn(move || mb.post(0, 3, round.to_le_bytes().to_vec()).unwrap())
            };

            let mut req = mb.irecv(0, 3);
            while !req.test().unwrap() {}
            poster.join().unwrap();

            let message = req.into_message();
            assert!(message.is_some(), "receive completed without a message in round {round}");
            assert_eq!(message.unwrap().payload, round.to_le_bytes().to_vec());
            assert!(mb.is_empty());
        }
    }

    #[test]
    fn recv_request_reports_closed_once_drained() {
        let mb = Mailbox::new();
        let mut req = mb.irecv(0, 0);
        mb.close();
        assert_eq!(req.test(), Err(MailboxError::Closed));
    }
}
