//! Validator derivation.
//!
//! Entity-tags are a SipHash-1-3 (128 bit) digest over every field that is
//! visible in a representation, plus the version. Two snapshots with the same
//! observable state always produce the same tag; any saved change produces a
//! different one because the version moves.

use std::hash::Hasher;

use siphasher::sip128::{Hasher128, SipHasher13};

use super::{Timestamp, Todo, TodoId};
use crate::conditional::{EntityTag, HttpDate, Validators};

/// Fixed key so tags stay stable across restarts and instances.
const DIGEST_KEY: [u8; 16] = *b"todo-api:etag:v1";

/// Anything that can be served with `ETag` and `Last-Modified`.
pub trait Resource {
    type Identity: Ord;

    fn identity(&self) -> &Self::Identity;

    fn updated_at(&self) -> &Timestamp;

    fn entity_tag(&self) -> EntityTag;

    /// `updated_at` at HTTP-date precision.
    fn timestamp(&self) -> HttpDate {
        self.updated_at().to_http_date()
    }

    fn validators(&self) -> Validators {
        Validators::new(self.entity_tag(), self.timestamp())
    }
}

impl Resource for Todo {
    type Identity = TodoId;

    fn identity(&self) -> &TodoId {
        &self.todo_id
    }

    fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    fn entity_tag(&self) -> EntityTag {
        let mut hasher = SipHasher13::new_with_key(&DIGEST_KEY);
        hasher.write(self.todo_id.as_uuid().as_bytes());
        hasher.write_u64(self.version);
        // Length prefix keeps "ab" + "c" apart from "a" + "bc".
        hasher.write_u64(self.title.len() as u64);
        hasher.write(self.title.as_bytes());
        hasher.write_i64(self.order);
        hasher.write_u8(u8::from(self.completed));
        let updated_at = self.updated_at.as_datetime();
        hasher.write_i64(updated_at.timestamp());
        hasher.write_u32(updated_at.timestamp_subsec_nanos());

        EntityTag::from_digest(hasher.finish128().as_u128())
    }
}

/// Validators of a collection: those of its most recently updated member,
/// ties broken by the smallest identity. `None` for an empty collection.
pub fn collection_validators<R: Resource>(members: &[R]) -> Option<Validators> {
    members
        .iter()
        .max_by(|left, right| {
            left.updated_at()
                .cmp(right.updated_at())
                .then_with(|| right.identity().cmp(left.identity()))
        })
        .map(Resource::validators)
}
