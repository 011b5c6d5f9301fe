//! Physical samples in a BEERS simulator run.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parsing serialized samples.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("serialized sample has {found} fields, expected {expected}")]
    FieldCount { expected: usize, found: usize },

    #[error("unknown gender {0:?}")]
    UnknownGender(String),
}

/// Gender of a sample donor. May not be known at instantiation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
        }
    }
}

impl FromStr for Gender {
    type Err = SampleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(SampleError::UnknownGender(other.to_string())),
        }
    }
}

/// A physical sample in a BEERS simulator run.
///
/// There can be many samples, the data for which may be spread across many
/// molecule packets; each packet carries the sample its data derives from.
/// Samples therefore serialize to a single line of the packet file format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Identifier unique within the run.
    pub id: String,
    /// Sample name, usually the original input file name.
    pub name: String,
    /// Absolute paths to the sample's FASTQ files.
    pub fastq_paths: Vec<PathBuf>,
    /// Absolute path to the sample's BAM file, if one exists.
    pub bam_path: Option<PathBuf>,
    /// Donor gender, when known.
    pub gender: Option<Gender>,
    /// Adapter sequences, 5' adapter followed by 3' adapter.
    pub adapters: Vec<String>,
}

impl Sample {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            fastq_paths: Vec::new(),
            bam_path: None,
            gender: None,
            adapters: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_fastq_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.fastq_paths = paths;
        self
    }

    #[must_use]
    pub fn with_bam_path(mut self, path: PathBuf) -> Self {
        self.bam_path = Some(path);
        self
    }

    #[must_use]
    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    #[must_use]
    pub fn with_adapters(mut self, adapters: Vec<String>) -> Self {
        self.adapters = adapters;
        self
    }

    /// Render the sample as a single tab-delimited line.
    ///
    /// List fields are comma-joined; unknown gender and missing BAM path are
    /// written as empty fields.
    pub fn serialize(&self) -> String {
        let fastq = self
            .fastq_paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(",");
        let gender = self.gender.map(|g| g.to_string()).unwrap_or_default();
        let bam = self
            .bam_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.id,
            self.name,
            gender,
            fastq,
            bam,
            self.adapters.join(",")
        )
    }

    /// Re-render a serialized line back into a `Sample`.
    ///
    /// Any leading hash is stripped before unpacking.
    pub fn deserialize(data: &str) -> Result<Self, SampleError> {
        let data = data.strip_prefix('#').unwrap_or(data);
        // Only strip the newline: empty trailing fields are delimited by tabs.
        let fields: Vec<&str> = data.trim_end_matches('\n').split('\t').collect();
        if fields.len() != 6 {
            return Err(SampleError::FieldCount {
                expected: 6,
                found: fields.len(),
            });
        }
        let gender = match fields[2] {
            "" | "None" => None,
            value => Some(value.parse()?),
        };
        let fastq_paths = if fields[3].is_empty() {
            Vec::new()
        } else {
            fields[3].split(',').map(PathBuf::from).collect()
        };
        let bam_path = if fields[4].is_empty() {
            None
        } else {
            Some(PathBuf::from(fields[4]))
        };
        let adapters = if fields[5].is_empty() {
            Vec::new()
        } else {
            fields[5].split(',').map(str::to_string).collect()
        };
        Ok(Self {
            id: fields[0].to_string(),
            name: fields[1].to_string(),
            fastq_paths,
            bam_path,
            gender,
            adapters,
        })
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sample id: {}, sample name: {}, gender: {}",
            self.id,
            self.name,
            self.gender
                .map_or_else(|| "unknown".to_string(), |g| g.to_string())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example() -> Sample {
        Sample::new("1", "sample1.fastq")
            .with_fastq_paths(vec![PathBuf::from("/data/r1.fastq"), PathBuf::from("/data/r2.fastq")])
            .with_gender(Gender::Female)
            .with_adapters(vec!["AGAT".to_string(), "TCGA".to_string()])
    }

    #[test]
    fn serialization_round_trips() {
        let sample = example();
        let restored = Sample::deserialize(&sample.serialize()).unwrap();
        assert_eq!(restored, sample);
    }

    #[test]
    fn leading_hash_is_stripped() {
        let sample = example();
        let line = format!("#{}", sample.serialize());
        assert_eq!(Sample::deserialize(&line).unwrap(), sample);
    }

    #[test]
    fn unknown_gender_stays_unknown() {
        let sample = Sample::new("2", "s2");
        let restored = Sample::deserialize(&sample.serialize()).unwrap();
        assert_eq!(restored.gender, None);
        assert!(restored.bam_path.is_none());
    }

    #[test]
    fn empty_trailing_fields_survive_round_trip() {
        // A bare sample serializes with every optional field empty, so the
        // line ends in a run of tabs that must not be stripped.
        let sample = Sample::new("2", "s2");
        assert_eq!(sample.serialize(), "2\ts2\t\t\t\t");
        let restored = Sample::deserialize(&format!("{}\n", sample.serialize())).unwrap();
        assert_eq!(restored, sample);
    }

    #[test]
    fn wrong_field_count_is_rejected() {
        assert!(matches!(
            Sample::deserialize("1\t2\t3"),
            Err(SampleError::FieldCount { expected: 6, found: 3 })
        ));
    }
}
