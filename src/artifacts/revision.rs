//! Revision resolution
//!
//! Maps a user-supplied revision string to a commit id. Accepted forms, in
//! lookup order: `HEAD`, a branch name, a full 40-character hex id, and a
//! hex prefix of at least four characters. A prefix matching more than one
//! object is `AmbiguousRevision`; anything that matches nothing is
//! `NotFound`.

use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::{HEX_LENGTH, ObjectId};
use crate::errors::{Error, Result};

/// Minimum abbreviated id length accepted.
const MIN_PREFIX_LENGTH: usize = 4;

pub struct Revision;

impl Revision {
    pub fn resolve(repository: &Repository, spec: &str) -> Result<ObjectId> {
        if spec == crate::areas::refs::HEAD {
            return repository
                .head_commit()?
                .ok_or_else(|| Error::NotFound("commit at HEAD".to_string()));
        }

        if repository.refs().branch_exists(spec) {
            return repository
                .refs()
                .resolve(&crate::areas::refs::Refs::branch_ref(spec))?
                .ok_or_else(|| Error::NotFound(format!("commit at branch {spec}")));
        }

        if Self::is_hex(spec) {
            if spec.len() == HEX_LENGTH {
                let oid = ObjectId::from_hex(spec)?;
                if repository.database().has(&oid) {
                    return Ok(oid);
                }
            } else if spec.len() >= MIN_PREFIX_LENGTH {
                let mut matches = repository.database().find_by_prefix(spec)?;
                match matches.len() {
                    0 => {}
                    1 => return Ok(matches.remove(0)),
                    _ => {
                        return Err(Error::AmbiguousRevision {
                            spec: spec.to_string(),
                            candidates: matches.len(),
                        });
                    }
                }
            }
        }

        Err(Error::NotFound(format!("revision {spec}")))
    }

    fn is_hex(spec: &str) -> bool {
        !spec.is_empty() && spec.chars().all(|c| c.is_ascii_hexdigit())
    }
}
