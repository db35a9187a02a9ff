//! Hash partitioned shuffle of contacts into shard channels.
//!
//! The workflow is illustrated as following:
//!
//! Every input file gets its own reader thread. A reader parses and
//! fingerprints each record, then routes the contact to the shard channel
//! picked by `fingerprint % size`. The same fingerprint always lands in the
//! same shard, whichever file or thread it came from, so each shard can be
//! aggregated by a single owner without any lock.

use std::sync::mpsc;

use crate::entry::Contact;

mod reader;
mod shuffler;

pub use reader::FileStats;
pub use shuffler::Shuffler;

pub type Receiver = mpsc::Receiver<Contact>;

#[derive(Debug, Clone, Copy)]
pub struct Group {
    size: u32,
}

impl Group {
    pub fn new(size: u32) -> Group {
        assert!(size > 0, "Group requires at least one shard");
        Group { size }
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    pub fn make_index(&self, fingerprint: u64) -> usize {
        (fingerprint % u64::from(self.size)) as usize
    }
}

/// Sender side of the shard channel set, one clone per reader.
#[derive(Clone)]
pub struct Router {
    group: Group,
    senders: Vec<mpsc::SyncSender<Contact>>,
}

impl Router {
    /// Open one bounded channel per shard of `group`.
    pub fn open(group: Group, capacity: usize) -> (Router, Vec<Receiver>) {
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..group.size())
            .map(|_| mpsc::sync_channel(capacity))
            .unzip();

        (Router { group, senders }, receivers)
    }

    /// Send a contact to its shard, blocking while that shard is full.
    ///
    /// Fails only if the shard's aggregator is gone.
    pub fn route(&self, contact: Contact) -> Result<(), mpsc::SendError<Contact>> {
        let index = self.group.make_index(contact.fingerprint);

        log::trace!("Send contact {} to shard {}", contact, index);

        self.senders[index].send(contact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry;

    #[test]
    fn test_make_index() {
        let group = Group::new(4);

        let idx1 = group.make_index(entry::fingerprint("jon@snowcom"));
        let idx2 = group.make_index(entry::fingerprint("jon@snowcom"));

        assert_eq!(idx1, idx2);
    }

    #[test]
    fn test_make_index_in_range() {
        let group = Group::new(8);

        for fingerprint in vec![0, 1, 7, 8, 9, u64::max_value(), u64::max_value() - 3] {
            let index = group.make_index(fingerprint);
            assert!(index < 8);
            assert_eq!(index as u64, fingerprint % 8);
        }
    }

    #[test]
    fn test_single_shard_takes_everything() {
        let group = Group::new(1);

        assert_eq!(group.make_index(u64::max_value()), 0);
        assert_eq!(group.make_index(12345), 0);
    }

    #[test]
    fn test_route_equal_fingerprints_to_same_shard() {
        let (router, receivers) = Router::open(Group::new(3), 16);
        let fingerprint = entry::fingerprint("c@dcom");

        router.route(Contact::new(10, fingerprint)).unwrap();
        router.clone().route(Contact::new(20, fingerprint)).unwrap();
        drop(router);

        let shard = (fingerprint % 3) as usize;
        for (index, rx) in receivers.into_iter().enumerate() {
            let ids: Vec<i64> = rx.iter().map(|c| c.id).collect();
            if index == shard {
                assert_eq!(ids, vec![10, 20]);
            } else {
                assert!(ids.is_empty());
            }
        }
    }

    #[test]
    fn test_route_fails_without_aggregator() {
        let (router, receivers) = Router::open(Group::new(1), 1);
        drop(receivers);

        assert!(router.route(Contact::new(1, 1)).is_err());
    }
}
