//! Matching of user lookups against an in-memory record set.

use std::sync::Arc;

use userdb_protocol::{ErrorCode, GetUserRecordReply, GetUserRecordRequest, UserRecord};

/// Iterator producing the replies to one `GetUserRecord` request.
///
/// Point lookups (by `userName`, `uid` or both) resolve to exactly one reply.
/// Enumeration yields one reply per record, each flagged as continuing except
/// the last. The record set is shared, so concurrent lookups never copy it.
#[derive(Debug)]
pub struct UserRecordLookup {
    records: Arc<[UserRecord]>,
    state: LookupState,
}

#[derive(Debug)]
enum LookupState {
    Single(GetUserRecordReply),
    Enumerate { cursor: usize },
    Finished,
}

impl UserRecordLookup {
    /// Plans the replies for `request`.
    ///
    /// `enumerable` controls whether a request naming no key may list every
    /// record.
    #[must_use]
    pub fn new(records: Arc<[UserRecord]>, request: &GetUserRecordRequest, enumerable: bool) -> Self {
        let parameters = &request.parameters;
        let state = if parameters.is_point_lookup() {
            LookupState::Single(resolve(&records, parameters.user_name.as_deref(), parameters.uid))
        } else if !request.more {
            LookupState::Single(GetUserRecordReply::error(ErrorCode::Unimplemented))
        } else if !enumerable {
            LookupState::Single(GetUserRecordReply::error(
                ErrorCode::EnumerationNotSupported,
            ))
        } else if records.is_empty() {
            LookupState::Single(GetUserRecordReply::empty())
        } else {
            LookupState::Enumerate { cursor: 0 }
        };
        Self { records, state }
    }
}

impl Iterator for UserRecordLookup {
    type Item = GetUserRecordReply;

    fn next(&mut self) -> Option<Self::Item> {
        match std::mem::replace(&mut self.state, LookupState::Finished) {
            LookupState::Finished => None,
            LookupState::Single(reply) => Some(reply),
            LookupState::Enumerate { cursor } => {
                let record = self.records.get(cursor)?.clone();
                let continues = cursor + 1 < self.records.len();
                if continues {
                    self.state = LookupState::Enumerate { cursor: cursor + 1 };
                }
                Some(GetUserRecordReply::record(record).with_continues(continues))
            }
        }
    }
}

/// Resolves a point lookup.
///
/// The first record matching `uid` is taken. The first record matching
/// `user_name` then replaces it, unless the two records carry different uids,
/// which is reported as a conflict.
fn resolve(records: &[UserRecord], user_name: Option<&str>, uid: Option<u32>) -> GetUserRecordReply {
    let mut found = uid.and_then(|uid| records.iter().find(|record| record.uid() == Some(uid)));

    if let Some(name) = user_name
        && let Some(named) = records.iter().find(|record| record.user_name() == name)
    {
        match found {
            Some(by_uid) if by_uid.uid() != named.uid() => {
                return GetUserRecordReply::error(ErrorCode::ConflictingRecordFound);
            }
            _ => found = Some(named),
        }
    }

    found.map_or_else(
        || GetUserRecordReply::error(ErrorCode::NoRecordFound),
        |record| GetUserRecordReply::record(record.clone()),
    )
}
