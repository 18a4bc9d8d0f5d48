//! Commit object
//!
//! A commit ties a tree (directory snapshot) to its history: zero parents
//! for a root commit, one for a normal commit, two for a merge. Parent
//! order is part of the serialization, so swapping the parents of a merge
//! produces a different commit id.
//!
//! ## Format
//!
//! ```text
//! commit <size>\0
//! tree <hex-id>
//! parent <hex-id>        (0, 1, or 2 lines)
//! author <name> <email> <unix-ts> <tz>
//!
//! <message>
//! ```

use crate::artifacts::objects::object::{Decode, Encode, Object};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectKind;
use crate::errors::{Error, Result};
use bytes::Bytes;
use std::io::{BufRead, Write};

/// Author identity and timestamp recorded in a commit.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Author {
    name: String,
    email: String,
    timestamp: chrono::DateTime<chrono::FixedOffset>,
}

impl Author {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Author {
            name: name.into(),
            email: email.into(),
            timestamp: chrono::Local::now().fixed_offset(),
        }
    }

    pub fn new_with_timestamp(
        name: impl Into<String>,
        email: impl Into<String>,
        timestamp: chrono::DateTime<chrono::FixedOffset>,
    ) -> Self {
        Author {
            name: name.into(),
            email: email.into(),
            timestamp,
        }
    }

    /// Read identity from `SILT_AUTHOR_NAME` / `SILT_AUTHOR_EMAIL`, with an
    /// optional `SILT_AUTHOR_DATE` override for the timestamp.
    pub fn load_from_env() -> Self {
        let name =
            std::env::var("SILT_AUTHOR_NAME").unwrap_or_else(|_| "anonymous".to_string());
        let email = std::env::var("SILT_AUTHOR_EMAIL")
            .unwrap_or_else(|_| "anonymous@localhost".to_string());
        let timestamp = std::env::var("SILT_AUTHOR_DATE").ok().and_then(|date| {
            chrono::DateTime::parse_from_rfc2822(&date)
                .or_else(|_| chrono::DateTime::parse_from_str(&date, "%Y-%m-%d %H:%M:%S %z"))
                .ok()
        });

        match timestamp {
            Some(timestamp) => Author::new_with_timestamp(name, email, timestamp),
            None => Author::new(name, email),
        }
    }

    /// Parse a bare `Name <email>` identity, stamping it with the current time.
    pub fn parse_ident(ident: &str) -> Result<Self> {
        let (name, email) = split_ident(ident)?;
        Ok(Author::new(name, email))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn timestamp(&self) -> chrono::DateTime<chrono::FixedOffset> {
        self.timestamp
    }

    /// `Name <email>` form used in log output.
    pub fn display_name(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }

    /// Full serialized form: `Name <email> <unix-ts> <tz>`.
    pub fn display(&self) -> String {
        format!(
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.timestamp.timestamp(),
            self.timestamp.format("%z")
        )
    }

    pub fn readable_timestamp(&self) -> String {
        self.timestamp
            .format("%a %b %-d %H:%M:%S %Y %z")
            .to_string()
    }
}

fn split_ident(ident: &str) -> Result<(String, String)> {
    let open = ident
        .find('<')
        .ok_or_else(|| Error::Corrupt(format!("invalid author '{ident}': missing '<'")))?;
    let close = ident
        .find('>')
        .ok_or_else(|| Error::Corrupt(format!("invalid author '{ident}': missing '>'")))?;

    let name = ident[..open].trim().to_string();
    let email = ident[open + 1..close].to_string();
    Ok((name, email))
}

impl TryFrom<&str> for Author {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        // "name <email> timestamp timezone": split from the right so the
        // name may contain spaces
        let parts: Vec<&str> = value.rsplitn(3, ' ').collect();
        if parts.len() < 3 {
            return Err(Error::Corrupt(format!("invalid author line: {value}")));
        }

        let timezone = parts[0];
        let timestamp = parts[1]
            .parse::<i64>()
            .map_err(|_| Error::Corrupt(format!("invalid author timestamp: {}", parts[1])))?;
        let (name, email) = split_ident(parts[2])?;

        let datetime = chrono::DateTime::from_timestamp(timestamp, 0)
            .ok_or_else(|| Error::Corrupt(format!("invalid author timestamp: {timestamp}")))?;
        let datetime = chrono::DateTime::parse_from_str(
            &format!("{} {}", datetime.format("%Y-%m-%d %H:%M:%S"), timezone),
            "%Y-%m-%d %H:%M:%S %z",
        )
        .map_err(|_| Error::Corrupt(format!("invalid author timezone: {timezone}")))?;

        Ok(Author {
            name,
            email,
            timestamp: datetime,
        })
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    parents: Vec<ObjectId>,
    tree_oid: ObjectId,
    author: Author,
    message: String,
}

impl Commit {
    pub fn new(
        parents: Vec<ObjectId>,
        tree_oid: ObjectId,
        author: Author,
        message: String,
    ) -> Self {
        Commit {
            parents,
            tree_oid,
            author,
            message,
        }
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// First line of the message, for one-line summaries.
    pub fn short_message(&self) -> String {
        self.message.lines().next().unwrap_or("").to_string()
    }

    pub fn timestamp(&self) -> chrono::DateTime<chrono::FixedOffset> {
        self.author.timestamp()
    }
}

impl Encode for Commit {
    fn encode(&self) -> Result<Bytes> {
        let mut lines = vec![format!("tree {}", self.tree_oid)];
        for parent in &self.parents {
            lines.push(format!("parent {parent}"));
        }
        lines.push(format!("author {}", self.author.display()));
        lines.push(String::new());
        lines.push(self.message.clone());

        let content = lines.join("\n");

        let mut commit_bytes = Vec::new();
        let header = format!("{} {}\0", self.kind().as_str(), content.len());
        commit_bytes.write_all(header.as_bytes())?;
        commit_bytes.write_all(content.as_bytes())?;

        Ok(Bytes::from(commit_bytes))
    }
}

impl Decode for Commit {
    fn decode(reader: impl BufRead) -> Result<Self> {
        let content = reader
            .bytes()
            .collect::<std::result::Result<Vec<u8>, std::io::Error>>()?;
        let content = String::from_utf8(content)
            .map_err(|_| Error::Corrupt("commit body is not valid UTF-8".to_string()))?;

        let mut lines = content.lines();

        let tree_line = lines
            .next()
            .ok_or_else(|| Error::Corrupt("commit is missing its tree line".to_string()))?;
        let tree_oid = tree_line
            .strip_prefix("tree ")
            .ok_or_else(|| Error::Corrupt(format!("invalid commit tree line: {tree_line}")))?;
        let tree_oid = ObjectId::from_hex(tree_oid)?;

        let mut parents = Vec::new();
        let mut next_line = lines
            .next()
            .ok_or_else(|| Error::Corrupt("commit is missing its author line".to_string()))?;

        while let Some(parent) = next_line.strip_prefix("parent ") {
            parents.push(ObjectId::from_hex(parent)?);
            next_line = lines
                .next()
                .ok_or_else(|| Error::Corrupt("commit is missing its author line".to_string()))?;
        }

        let author = next_line
            .strip_prefix("author ")
            .ok_or_else(|| Error::Corrupt(format!("invalid commit author line: {next_line}")))?;
        let author = Author::try_from(author)?;

        // skip the blank separator line
        lines.next();

        let message = lines.collect::<Vec<&str>>().join("\n");
        Ok(Self::new(parents, tree_oid, author, message))
    }
}

impl Object for Commit {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Commit
    }
}
