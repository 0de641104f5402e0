//! Combined `tzdb.dat` archive
//!
//! The archive bundles every region of a dataset in one resource:
//!
//! ```text
//! u8 marker = 1, utf "TZDB"
//! i16 version count,  utf × versions          (the last one is current)
//! i16 region count,   utf × region ids
//! i16 rule count,     (i16 len + bytes) × typed rule blobs
//! per version: i16 link count, (i16 region index, u16 rule index) × links
//! ```
//!
//! Regions that share identical rules point at the same blob. Blobs are
//! kept undecoded until [`TzdbArchive::decode_rules`] is called.

use std::collections::BTreeMap;

use bytes::Bytes;
use tracing::debug;
use tzdb_core::{VersionTag, ZoneId, ZoneRules};

use crate::error::{PayloadError, Result};
use crate::reader::DataReader;
use crate::rules::{RulesDeserializer, TypedRules};
use crate::zone_file::read_header;

/// Group tag of the combined archive
pub const ARCHIVE_TAG: &str = "TZDB";

/// Parsed archive index with lazily decoded rule blobs
#[derive(Debug, Clone)]
pub struct TzdbArchive {
    version: VersionTag,
    rules: Vec<Bytes>,
    regions: BTreeMap<ZoneId, usize>,
}

impl TzdbArchive {
    /// Parse the archive index. Rule blobs are copied but not decoded.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = DataReader::new(bytes);
        read_header(&mut reader, ARCHIVE_TAG)?;

        let version_count = reader.read_count_i16("version")?;
        let mut version = None;
        for _ in 0..version_count {
            version = Some(VersionTag::from(reader.read_utf()?));
        }
        let version = version.ok_or(PayloadError::MissingVersion)?;

        let region_count = reader.read_count_i16("region")?;
        let region_ids = (0..region_count)
            .map(|_| reader.read_utf().map(ZoneId::from))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let rule_count = reader.read_count_i16("rule")?;
        let mut rules = Vec::with_capacity(rule_count.min(reader.remaining()));
        for _ in 0..rule_count {
            let len = reader.read_count_i16("rule data")?;
            rules.push(Bytes::copy_from_slice(reader.read_bytes(len)?));
        }

        // Only the links of the last version survive
        let mut regions = BTreeMap::new();
        for _ in 0..version_count {
            regions.clear();
            let link_count = reader.read_count_i16("region link")?;
            for _ in 0..link_count {
                let region_index = reader.read_i16()?;
                let rule_index = reader.read_u16()?;

                let region = usize::try_from(region_index)
                    .ok()
                    .and_then(|index| region_ids.get(index))
                    .ok_or(PayloadError::IndexOutOfRange {
                        table: "region",
                        index: region_index.into(),
                        len: region_ids.len(),
                    })?;
                if usize::from(rule_index) >= rules.len() {
                    return Err(PayloadError::IndexOutOfRange {
                        table: "rule",
                        index: rule_index.into(),
                        len: rules.len(),
                    }
                    .into());
                }
                regions.insert(region.clone(), usize::from(rule_index));
            }
        }
        reader.finish()?;

        debug!(
            version = %version,
            regions = regions.len(),
            rules = rules.len(),
            "parsed TZDB archive"
        );

        Ok(Self {
            version,
            rules,
            regions,
        })
    }

    pub fn version(&self) -> &VersionTag {
        &self.version
    }

    /// Linked region ids in ascending order
    pub fn zone_ids(&self) -> impl Iterator<Item = &ZoneId> + '_ {
        self.regions.keys()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.regions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Number of distinct rule blobs
    pub fn rule_blob_count(&self) -> usize {
        self.rules.len()
    }

    /// Raw typed rule blob for a region
    pub fn rules_payload(&self, id: &str) -> Option<Bytes> {
        self.regions.get(id).map(|&index| self.rules[index].clone())
    }

    /// Decode the rules for a region, `None` if the archive does not link it
    pub fn decode_rules(&self, id: &str) -> Result<Option<ZoneRules>> {
        let Some(&index) = self.regions.get(id) else {
            return Ok(None);
        };
        let mut reader = DataReader::new(&self.rules[index]);
        let rules = TypedRules.deserialize(&mut reader)?;
        reader.finish()?;
        Ok(Some(rules))
    }
}
