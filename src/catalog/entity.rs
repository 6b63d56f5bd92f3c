//! Typed catalog entities
//!
//! Repositories group packages; packages are individual releases. Both
//! flatten into a [`Record`] for storage and can be rebuilt from one.

use chrono::{DateTime, Utc};

use super::identifier::derive_id;
use super::record::{parse_timestamp, Record, ID_FIELD, NAME_FIELD, RANK_FIELD};
use crate::error::{CatalogError, Result};

/// Anything that can be stored as a catalog record
pub trait Entity {
    /// Stable identifier
    fn id(&self) -> &str;

    /// Flatten into a record (identifier included)
    fn to_record(&self) -> Record;
}

/// A package repository
#[derive(Debug, Clone, PartialEq)]
pub struct Repository {
    id: String,
    pub name: String,
    pub description: String,
    pub created_on: DateTime<Utc>,
    pub rank: i64,
    pub templated: bool,
}

impl Repository {
    /// Create a repository; without `id` one is derived from `name`
    pub fn new(
        id: Option<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        created_on: DateTime<Utc>,
        rank: i64,
        templated: bool,
    ) -> Self {
        let name = name.into();
        let id = id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| derive_id(&name));

        Self {
            id,
            name,
            description: description.into(),
            created_on,
            rank,
            templated,
        }
    }

    /// Rebuild a repository from a stored record
    pub fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            id: required(record, ID_FIELD)?.to_string(),
            name: required(record, NAME_FIELD)?.to_string(),
            description: record.get("description").unwrap_or_default().to_string(),
            created_on: parse_timestamp(required(record, "createdon")?)?,
            rank: parse_integer(record, RANK_FIELD)?,
            templated: parse_flag(record, "templated"),
        })
    }
}

impl Entity for Repository {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with(ID_FIELD, &self.id)
            .with(NAME_FIELD, &self.name)
            .with("description", &self.description)
            .with("createdon", self.created_on)
            .with(RANK_FIELD, self.rank)
            .with("templated", self.templated)
    }
}

/// One released version of a package
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    id: String,
    pub repository: String,
    pub name: String,
    pub version: String,
    pub signature: String,
    pub author: String,
    pub license: String,
    pub description: String,
    pub instructions: String,
    pub changelog: String,
    pub created_on: DateTime<Utc>,
    pub edited_on: DateTime<Utc>,
    pub released_on: DateTime<Utc>,
    pub cover: String,
    pub thumb: String,
    /// Minimum supported platform version
    pub minimum: String,
    /// Platform version the package breaks at (empty = no known limit)
    pub maximum: String,
    pub databases: String,
    pub downloads: i64,
    pub location: String,
}

impl Package {
    /// Create a package release in `repository`
    ///
    /// The signature is `{name}-{version}` and the identifier is derived from
    /// it, so each release is its own record. Timestamps start at `released_on`.
    pub fn new(
        repository: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        released_on: DateTime<Utc>,
    ) -> Self {
        let name = name.into();
        let version = version.into();
        let signature = format!("{}-{}", name.to_lowercase(), version);

        Self {
            id: derive_id(&signature),
            repository: repository.into(),
            name,
            version,
            signature,
            author: String::new(),
            license: String::new(),
            description: String::new(),
            instructions: String::new(),
            changelog: String::new(),
            created_on: released_on,
            edited_on: released_on,
            released_on,
            cover: String::new(),
            thumb: String::new(),
            minimum: String::new(),
            maximum: String::new(),
            databases: String::new(),
            downloads: 0,
            location: String::new(),
        }
    }

    /// Rebuild a package from a stored record
    pub fn from_record(record: &Record) -> Result<Self> {
        let text = |field: &str| record.get(field).unwrap_or_default().to_string();

        Ok(Self {
            id: required(record, ID_FIELD)?.to_string(),
            repository: text("repository"),
            name: required(record, NAME_FIELD)?.to_string(),
            version: required(record, "version")?.to_string(),
            signature: required(record, "signature")?.to_string(),
            author: text("author"),
            license: text("license"),
            description: text("description"),
            instructions: text("instructions"),
            changelog: text("changelog"),
            created_on: parse_timestamp(required(record, "createdon")?)?,
            edited_on: parse_timestamp(required(record, "editedon")?)?,
            released_on: parse_timestamp(required(record, "releasedon")?)?,
            cover: text("cover"),
            thumb: text("thumb"),
            minimum: text("minimum"),
            maximum: text("maximum"),
            databases: text("databases"),
            downloads: parse_integer(record, "downloads")?,
            location: text("location"),
        })
    }
}

impl Entity for Package {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with(ID_FIELD, &self.id)
            .with("repository", &self.repository)
            .with(NAME_FIELD, &self.name)
            .with("version", &self.version)
            .with("signature", &self.signature)
            .with("author", &self.author)
            .with("license", &self.license)
            .with("description", &self.description)
            .with("instructions", &self.instructions)
            .with("changelog", &self.changelog)
            .with("createdon", self.created_on)
            .with("editedon", self.edited_on)
            .with("releasedon", self.released_on)
            .with("cover", &self.cover)
            .with("thumb", &self.thumb)
            .with("minimum", &self.minimum)
            .with("maximum", &self.maximum)
            .with("databases", &self.databases)
            .with("downloads", self.downloads)
            .with("location", &self.location)
    }
}

fn required<'a>(record: &'a Record, field: &str) -> Result<&'a str> {
    record
        .get(field)
        .ok_or_else(|| CatalogError::InvalidArgument(format!("record is missing '{}'", field)))
}

fn parse_integer(record: &Record, field: &str) -> Result<i64> {
    match record.get(field) {
        None | Some("") => Ok(0),
        Some(raw) => raw.trim().parse().map_err(|_| {
            CatalogError::InvalidArgument(format!("field '{}' is not an integer: {}", field, raw))
        }),
    }
}

fn parse_flag(record: &Record, field: &str) -> bool {
    matches!(record.get(field), Some("1") | Some("true"))
}
