//! Human-readable sequential document codes
//!
//! A code is rendered as `prefix + partition + zeroPad(sequence, width)`,
//! for example `PPAY2025000001`. Each part is a validated newtype so a code
//! can only be built from values that keep the rendering parseable.

use crate::domain::validation_constants::{partition_key, sequence_width};
use crate::{Error, Result};
use derive_more::Display;
use nutype::nutype;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;

/// Entity family tag, e.g. `PPAY` for purchase payments
#[nutype(
    validate(not_empty, len_char_max = 8, regex = r"^[A-Z]{1,8}$"),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct CodePrefix(String);

/// Value that resets the sequence when it changes: a four-digit calendar year
#[nutype(
    validate(predicate = |year| (partition_key::MIN_YEAR..=partition_key::MAX_YEAR).contains(year)),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct PartitionKey(u16);

impl PartitionKey {
    pub fn from_year(year: i32) -> Result<Self> {
        u16::try_from(year)
            .ok()
            .and_then(|year| Self::try_new(year).ok())
            .ok_or_else(|| {
                Error::invalid_input("partition", format!("{year} is not a four-digit year"))
            })
    }
}

/// Number of digits the sequence is zero-padded to
#[nutype(
    validate(predicate = |width| (sequence_width::MIN..=sequence_width::MAX).contains(width)),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct SequenceWidth(u8);

impl SequenceWidth {
    /// Largest sequence that renders within the width
    pub fn max_in_width(&self) -> u64 {
        10u64.pow(u32::from(self.into_inner())) - 1
    }
}

/// Position of a code within its partition, starting at 1
#[nutype(
    validate(predicate = |sequence| *sequence >= 1),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct SequenceNumber(u64);

impl SequenceNumber {
    pub fn first() -> Self {
        Self::try_new(1).expect("1 is a valid sequence number")
    }

    pub fn checked_next(&self) -> Option<Self> {
        self.into_inner()
            .checked_add(1)
            .and_then(|next| Self::try_new(next).ok())
    }
}

/// A prefix plus the width its sequence is padded to
///
/// Holds the compiled recognition pattern `^PREFIX([0-9]{4})([0-9]{WIDTH,})$`.
/// Sequences that outgrow the width are still recognized.
#[derive(Debug, Clone, Display)]
#[display("{prefix}")]
pub struct CodeFamily {
    prefix: CodePrefix,
    width: SequenceWidth,
    pattern: Regex,
}

impl CodeFamily {
    pub fn new(prefix: CodePrefix, width: SequenceWidth) -> Result<Self> {
        let source = format!(
            r"^{}([0-9]{{{}}})([0-9]{{{},}})$",
            regex::escape(prefix.as_ref()),
            partition_key::DIGITS,
            width.into_inner()
        );
        let pattern = Regex::new(&source).map_err(|e| Error::invalid_input("family", e))?;
        Ok(Self {
            prefix,
            width,
            pattern,
        })
    }

    pub fn from_parts(prefix: &str, width: u8) -> Result<Self> {
        let prefix =
            CodePrefix::try_new(prefix.to_string()).map_err(|e| Error::invalid_input("prefix", e))?;
        let width = SequenceWidth::try_new(width).map_err(|e| Error::invalid_input("width", e))?;
        Self::new(prefix, width)
    }

    /// `PPAY` codes padded to six digits
    pub fn purchase_payment() -> Self {
        use crate::domain::validation_constants::code_prefix;

        Self::from_parts(
            code_prefix::PURCHASE_PAYMENT,
            sequence_width::PURCHASE_PAYMENT,
        )
        .expect("purchase payment family is valid")
    }

    pub fn prefix(&self) -> &CodePrefix {
        &self.prefix
    }

    pub fn width(&self) -> SequenceWidth {
        self.width
    }
}

impl PartialEq for CodeFamily {
    fn eq(&self, other: &Self) -> bool {
        self.prefix == other.prefix && self.width == other.width
    }
}

impl Eq for CodeFamily {}

/// Non-fatal signal that a sequence no longer fits its declared width
///
/// The identifier is still issued (wider than usual); operators should move
/// the family to a wider width before the codes stop sorting as expected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("Sequence {sequence} of {identifier} needs more than {width} digits")]
pub struct SequenceWidthExceeded {
    pub identifier: String,
    pub sequence: u64,
    pub width: u8,
}

/// A code in canonical form
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GeneratedIdentifier {
    prefix: CodePrefix,
    partition: PartitionKey,
    sequence: SequenceNumber,
    width: SequenceWidth,
}

impl GeneratedIdentifier {
    pub fn new(family: &CodeFamily, partition: PartitionKey, sequence: SequenceNumber) -> Self {
        Self {
            prefix: family.prefix.clone(),
            partition,
            sequence,
            width: family.width,
        }
    }

    /// First code of a partition
    pub fn first_in(family: &CodeFamily, partition: PartitionKey) -> Self {
        Self::new(family, partition, SequenceNumber::first())
    }

    /// The `prefix + partition` string every code of the partition starts with
    pub fn partition_pattern(family: &CodeFamily, partition: PartitionKey) -> String {
        format!("{}{}", family.prefix, partition)
    }

    /// Parses a code of the family from any partition
    pub fn parse_canonical(family: &CodeFamily, raw: &str) -> Result<Self> {
        let malformed = |reason: &str| Error::malformed(family.to_string(), raw, reason);

        let captures = family
            .pattern
            .captures(raw)
            .ok_or_else(|| malformed("does not match the canonical form"))?;

        let year: u16 = captures[1]
            .parse()
            .map_err(|_| malformed("partition is not numeric"))?;
        let partition =
            PartitionKey::try_new(year).map_err(|_| malformed("partition is out of range"))?;

        let digits = &captures[2];
        if digits.len() > usize::from(family.width.into_inner()) && digits.starts_with('0') {
            return Err(malformed("sequence is padded beyond its width"));
        }
        let value: u64 = digits
            .parse()
            .map_err(|_| malformed("sequence does not fit in 64 bits"))?;
        let sequence =
            SequenceNumber::try_new(value).map_err(|_| malformed("sequence must be positive"))?;

        Ok(Self {
            prefix: family.prefix.clone(),
            partition,
            sequence,
            width: family.width,
        })
    }

    /// Parses a code that must belong to `partition`
    pub fn parse(family: &CodeFamily, partition: PartitionKey, raw: &str) -> Result<Self> {
        let parsed = Self::parse_canonical(family, raw)?;
        if parsed.partition != partition {
            return Err(Error::malformed(
                family.to_string(),
                raw,
                format!("belongs to partition {}, expected {partition}", parsed.partition),
            ));
        }
        Ok(parsed)
    }

    /// The code that follows this one in the same partition
    pub fn successor(&self) -> Result<Self> {
        let sequence = self
            .sequence
            .checked_next()
            .ok_or_else(|| Error::SequenceOverflow {
                family: self.prefix.to_string(),
                partition: self.partition.to_string(),
            })?;
        Ok(Self {
            sequence,
            ..self.clone()
        })
    }

    pub fn prefix(&self) -> &CodePrefix {
        &self.prefix
    }

    pub fn partition(&self) -> PartitionKey {
        self.partition
    }

    pub fn sequence(&self) -> SequenceNumber {
        self.sequence
    }

    pub fn width(&self) -> SequenceWidth {
        self.width
    }

    pub fn exceeds_width(&self) -> bool {
        self.sequence.into_inner() > self.width.max_in_width()
    }

    pub fn width_warning(&self) -> Option<SequenceWidthExceeded> {
        self.exceeds_width().then(|| SequenceWidthExceeded {
            identifier: self.to_string(),
            sequence: self.sequence.into_inner(),
            width: self.width.into_inner(),
        })
    }
}

impl fmt::Display for GeneratedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{:0width$}",
            self.prefix,
            self.partition,
            self.sequence.into_inner(),
            width = usize::from(self.width.into_inner())
        )
    }
}

impl Serialize for GeneratedIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
