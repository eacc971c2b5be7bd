//! The TOML ledger document.
//!
//! ```toml
//! [meta]
//! schema_version = 1
//!
//! [applied]
//! last_applied = "0002_terrain"
//! applied_at = "2026-10-16T12:00:00Z"
//! ids = ["0001_origin", "0002_terrain"]
//!
//! [applied.tags.root]
//! produced_by = "0001_origin"
//! payload = '{"seed":42}'
//!
//! [[migrations]]
//! id = "0001_origin"
//! type = "script"
//! source = "migrations/0001_origin.luau"
//! emits = ["root"]
//! description = "Create the place root"
//! ```
//!
//! Parsing enforces structure only: required fields, well-formed ids and tag
//! names, syntactically unique ids. Semantic rules (origin, resolution,
//! cycles) belong to validation. Absent `depends`, `emits` and `removes`
//! lists mean the empty set.
//!
//! Tag payloads are stored as JSON text because TOML has no `null`.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use strata_types::{Entry, EntryId, EntryKind, Payload, TagName};

use crate::applied::{AppliedRecord, TagRecord};
use crate::error::{LedgerError, LedgerResult, SchemaPosition};
use crate::ledger::Ledger;

/// Newest ledger document format this build understands.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct LedgerDocument {
    meta: MetaBlock,
    #[serde(default)]
    applied: AppliedBlock,
    #[serde(default)]
    migrations: Vec<EntryRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MetaBlock {
    schema_version: u32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AppliedBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_applied: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    applied_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    fingerprints: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    tags: BTreeMap<String, TagBlock>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TagBlock {
    produced_by: String,
    payload: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    removed_by: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EntryRecord {
    id: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    source: Option<String>,
    #[serde(default)]
    depends: Vec<String>,
    #[serde(default)]
    emits: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    removes: Vec<String>,
    #[serde(default)]
    description: String,
}

/// Parse a ledger document.
pub fn parse(text: &str) -> LedgerResult<(Ledger, AppliedRecord)> {
    let doc: LedgerDocument = toml::from_str(text)
        .map_err(|e| LedgerError::schema(SchemaPosition::Document, e.to_string()))?;

    let version = doc.meta.schema_version;
    if version == 0 || version > CURRENT_SCHEMA_VERSION {
        return Err(LedgerError::schema(
            SchemaPosition::Meta,
            format!(
                "unsupported schema_version {version} (this build reads 1..={CURRENT_SCHEMA_VERSION})"
            ),
        ));
    }

    let mut ledger = Ledger::with_schema_version(version);
    for (index, record) in doc.migrations.into_iter().enumerate() {
        let entry = parse_entry(index, record)?;
        if ledger.contains(entry.id()) {
            return Err(LedgerError::schema(
                SchemaPosition::Record(index),
                format!("duplicate entry id {:?}", entry.id().as_str()),
            ));
        }
        ledger.append(entry)?;
    }

    let applied = parse_applied(doc.applied)?;
    Ok((ledger, applied))
}

/// Render a ledger and its applied record as a ledger document.
pub fn render(ledger: &Ledger, applied: &AppliedRecord) -> LedgerResult<String> {
    let mut tags = BTreeMap::new();
    for (name, record) in applied.tags() {
        let payload = serde_json::to_string(&record.payload)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        tags.insert(
            name.to_string(),
            TagBlock {
                produced_by: record.produced_by.to_string(),
                payload,
                removed_by: record.removed_by.as_ref().map(ToString::to_string),
            },
        );
    }

    let doc = LedgerDocument {
        meta: MetaBlock {
            schema_version: ledger.schema_version(),
        },
        applied: AppliedBlock {
            last_applied: applied.last_applied().map(ToString::to_string),
            applied_at: applied
                .last_applied_at()
                .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ids: Some(applied.applied_ids().iter().map(ToString::to_string).collect()),
            fingerprints: applied
                .fingerprints()
                .iter()
                .map(|(id, fp)| (id.to_string(), fp.clone()))
                .collect(),
            tags,
        },
        migrations: ledger.iter().map(entry_record).collect(),
    };

    toml::to_string_pretty(&doc).map_err(|e| LedgerError::Serialization(e.to_string()))
}

fn entry_record(entry: &Entry) -> EntryRecord {
    let names =
        |set: &BTreeSet<TagName>| -> Vec<String> { set.iter().map(ToString::to_string).collect() };
    EntryRecord {
        id: Some(entry.id().to_string()),
        kind: Some(entry.kind().to_string()),
        source: Some(entry.source().to_string()),
        depends: names(entry.depends()),
        emits: names(entry.emits()),
        removes: names(entry.removes()),
        description: entry.description().to_string(),
    }
}

fn parse_entry(index: usize, record: EntryRecord) -> LedgerResult<Entry> {
    let position = SchemaPosition::Record(index);
    let id = record
        .id
        .ok_or_else(|| LedgerError::schema(position.clone(), "missing field `id`"))?;
    let id = EntryId::new(id).map_err(|e| LedgerError::from_type(position.clone(), e))?;
    let kind = record
        .kind
        .ok_or_else(|| LedgerError::schema(position.clone(), "missing field `type`"))?;
    let kind: EntryKind = kind
        .parse()
        .map_err(|e| LedgerError::from_type(position.clone(), e))?;
    let source = record
        .source
        .ok_or_else(|| LedgerError::schema(position.clone(), "missing field `source`"))?;

    let depends = parse_tag_list(&position, "depends", record.depends)?;
    let emits = parse_tag_list(&position, "emits", record.emits)?;
    let removes = parse_tag_list(&position, "removes", record.removes)?;

    Ok(Entry::builder(id, kind, source)
        .depends(depends)
        .emits(emits)
        .removes(removes)
        .description(record.description)
        .build())
}

fn parse_tag_list(
    position: &SchemaPosition,
    field: &str,
    names: Vec<String>,
) -> LedgerResult<Vec<TagName>> {
    let mut seen = HashSet::new();
    let mut tags = Vec::with_capacity(names.len());
    for name in names {
        if !seen.insert(name.clone()) {
            return Err(LedgerError::schema(
                position.clone(),
                format!("`{field}` lists {name:?} more than once"),
            ));
        }
        let tag = TagName::new(name).map_err(|e| LedgerError::from_type(position.clone(), e))?;
        tags.push(tag);
    }
    Ok(tags)
}

fn parse_applied(block: AppliedBlock) -> LedgerResult<AppliedRecord> {
    let position = SchemaPosition::Applied;

    let raw_ids = match block.ids {
        Some(ids) => ids,
        None if block.last_applied.is_some() => {
            return Err(LedgerError::schema(
                position,
                "`last_applied` is set but the required `ids` list is missing",
            ))
        }
        None => Vec::new(),
    };

    let mut ids = Vec::with_capacity(raw_ids.len());
    let mut seen = HashSet::new();
    for raw in raw_ids {
        let id = EntryId::new(raw).map_err(|e| LedgerError::from_type(position.clone(), e))?;
        if !seen.insert(id.clone()) {
            return Err(LedgerError::schema(
                position,
                format!("`ids` lists {:?} more than once", id.as_str()),
            ));
        }
        ids.push(id);
    }

    if let Some(last) = &block.last_applied {
        if ids.last().map(EntryId::as_str) != Some(last.as_str()) {
            return Err(LedgerError::schema(
                position,
                format!("`last_applied` {last:?} is not the final entry of `ids`"),
            ));
        }
    }

    let applied_at = block
        .applied_at
        .as_deref()
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|at| at.with_timezone(&Utc))
                .map_err(|e| {
                    LedgerError::schema(position.clone(), format!("invalid `applied_at`: {e}"))
                })
        })
        .transpose()?;

    let mut fingerprints = BTreeMap::new();
    for (raw, fingerprint) in block.fingerprints {
        let id = EntryId::new(raw).map_err(|e| LedgerError::from_type(position.clone(), e))?;
        fingerprints.insert(id, fingerprint);
    }

    let mut tags = BTreeMap::new();
    for (raw, tag) in block.tags {
        let tag_position = SchemaPosition::Tag(raw.clone());
        let name =
            TagName::new(raw).map_err(|e| LedgerError::from_type(tag_position.clone(), e))?;
        let payload: Payload = serde_json::from_str(&tag.payload).map_err(|e| {
            LedgerError::schema(tag_position.clone(), format!("payload is not JSON: {e}"))
        })?;
        let produced_by = EntryId::new(tag.produced_by)
            .map_err(|e| LedgerError::from_type(tag_position.clone(), e))?;
        let removed_by = tag
            .removed_by
            .map(EntryId::new)
            .transpose()
            .map_err(|e| LedgerError::from_type(tag_position.clone(), e))?;
        tags.insert(
            name,
            TagRecord {
                payload,
                produced_by,
                removed_by,
            },
        );
    }

    Ok(AppliedRecord::from_parts(ids, tags, fingerprints, applied_at))
}
