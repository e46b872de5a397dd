//! Desired and observed disk attributes, and the change set between them.

use hvclient::{CreateVhd, VhdFormat, VhdInfo, VhdType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A reconciled disk attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Path,
    Source,
    SourceVm,
    SourceDisk,
    VhdType,
    ParentPath,
    Size,
    BlockSize,
    LogicalSectorSize,
    PhysicalSectorSize,
}

impl Attribute {
    /// Every attribute, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Path,
        Self::Source,
        Self::SourceVm,
        Self::SourceDisk,
        Self::VhdType,
        Self::ParentPath,
        Self::Size,
        Self::BlockSize,
        Self::LogicalSectorSize,
        Self::PhysicalSectorSize,
    ];

    /// Attribute name as used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Path => "path",
            Attribute::Source => "source",
            Attribute::SourceVm => "source_vm",
            Attribute::SourceDisk => "source_disk",
            Attribute::VhdType => "vhd_type",
            Attribute::ParentPath => "parent_path",
            Attribute::Size => "size",
            Attribute::BlockSize => "block_size",
            Attribute::LogicalSectorSize => "logical_sector_size",
            Attribute::PhysicalSectorSize => "physical_sector_size",
        }
    }

    /// Whether a change to this attribute can only be applied by recreating the disk.
    pub fn forces_recreation(&self) -> bool {
        matches!(
            self,
            Self::Path | Self::Source | Self::SourceVm | Self::SourceDisk | Self::ParentPath
        )
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Desired attributes of one virtual disk.
///
/// `path` is the identity. `source`, `source_vm` and `source_disk` only
/// matter when the disk is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiskSpec {
    pub path: String,
    pub source: String,
    pub source_vm: String,
    pub source_disk: u32,
    pub vhd_type: VhdType,
    pub parent_path: String,
    /// Size in bytes; 0 leaves the size alone
    pub size: u64,
    pub block_size: u32,
    pub logical_sector_size: u32,
    pub physical_sector_size: u32,
}

impl DiskSpec {
    /// Spec for a disk at `path` with every other attribute unset.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_parent(mut self, parent_path: impl Into<String>) -> Self {
        self.parent_path = parent_path.into();
        self
    }

    pub fn with_type(mut self, vhd_type: VhdType) -> Self {
        self.vhd_type = vhd_type;
        self
    }

    /// Check if this is a differencing disk
    pub fn is_differencing(&self) -> bool {
        !self.parent_path.is_empty()
    }

    /// Check the spec for contradictions.
    ///
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.path.trim().is_empty() {
            return Err("path argument is required".to_string());
        }
        if hvclient::file_stem(&self.path).trim().is_empty() {
            return Err(format!("{} does not name a disk file", self.path));
        }
        if self.vhd_type == VhdType::Differencing && !self.is_differencing() {
            return Err("differencing disks require parent_path".to_string());
        }
        if self.is_differencing()
            && !matches!(self.vhd_type, VhdType::Unknown | VhdType::Differencing)
        {
            return Err(format!(
                "parent_path is only valid for differencing disks, not {}",
                self.vhd_type
            ));
        }
        if !self.source.is_empty() && self.is_differencing() {
            return Err("source and parent_path are mutually exclusive".to_string());
        }
        if !self.source.is_empty() && !self.source_vm.is_empty() {
            return Err("source and source_vm are mutually exclusive".to_string());
        }
        Ok(())
    }

    /// Arguments for creating this disk.
    pub fn to_create(&self, replace: bool) -> CreateVhd {
        CreateVhd {
            path: self.path.clone(),
            source: self.source.clone(),
            source_vm: self.source_vm.clone(),
            source_disk: self.source_disk,
            vhd_type: self.vhd_type,
            parent_path: self.parent_path.clone(),
            size: self.size,
            block_size: self.block_size,
            logical_sector_size: self.logical_sector_size,
            physical_sector_size: self.physical_sector_size,
            replace,
        }
    }
}

/// Existence of a disk as far as the last read knows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiskStatus {
    /// Never read
    #[default]
    Unknown,
    Absent,
    Present,
}

impl fmt::Display for DiskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiskStatus::Unknown => write!(f, "unknown"),
            DiskStatus::Absent => write!(f, "absent"),
            DiskStatus::Present => write!(f, "present"),
        }
    }
}

/// What the host last confirmed about a disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservedState {
    pub status: DiskStatus,
    /// Attributes as last confirmed; creation-only ones are carried over
    /// from the spec that created the disk
    pub attributes: DiskSpec,
    pub file_size: u64,
    pub minimum_size: Option<u64>,
    pub vhd_format: VhdFormat,
    pub attached: bool,
}

impl ObservedState {
    /// State recorded after a read found nothing, or a delete succeeded.
    pub fn absent() -> Self {
        Self {
            status: DiskStatus::Absent,
            ..Default::default()
        }
    }

    /// State from a read of the disk at `path`.
    ///
    /// The host cannot report how a disk was created, so `creation` supplies
    /// `source`, `source_vm` and `source_disk`. The requested `path` is kept
    /// as the identity rather than the host's spelling of it.
    pub fn from_read(path: &str, vhd: &VhdInfo, creation: &DiskSpec) -> Self {
        if !vhd.exists() {
            return Self::absent();
        }

        Self {
            status: DiskStatus::Present,
            attributes: DiskSpec {
                path: path.to_string(),
                source: creation.source.clone(),
                source_vm: creation.source_vm.clone(),
                source_disk: creation.source_disk,
                vhd_type: vhd.vhd_type,
                parent_path: vhd.parent_path.clone(),
                size: vhd.size,
                block_size: vhd.block_size,
                logical_sector_size: vhd.logical_sector_size,
                physical_sector_size: vhd.physical_sector_size,
            },
            file_size: vhd.file_size,
            minimum_size: vhd.minimum_size,
            vhd_format: vhd.vhd_format,
            attached: vhd.attached,
        }
    }

    /// The existence flag: true only if the last read found the disk.
    pub fn exists(&self) -> bool {
        self.status == DiskStatus::Present
    }
}

/// Attributes whose desired value differs from the observed value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changed: BTreeSet<Attribute>,
}

impl ChangeSet {
    /// Compare two attribute sets field by field.
    ///
    /// Attributes `desired` leaves unset (a zero size or sector size, an
    /// unknown type) are not compared. Host paths compare case-insensitively
    /// and ignore separator style.
    pub fn between(desired: &DiskSpec, observed: &DiskSpec) -> Self {
        let mut changed = BTreeSet::new();
        let mut check = |attribute, differs: bool| {
            if differs {
                changed.insert(attribute);
            }
        };
        let declared = |want: u64, have: u64| want > 0 && want != have;

        check(Attribute::Path, !same_host_path(&desired.path, &observed.path));
        check(Attribute::Source, desired.source != observed.source);
        check(Attribute::SourceVm, desired.source_vm != observed.source_vm);
        check(Attribute::SourceDisk, desired.source_disk != observed.source_disk);
        check(
            Attribute::VhdType,
            desired.vhd_type != VhdType::Unknown && desired.vhd_type != observed.vhd_type,
        );
        check(
            Attribute::ParentPath,
            !same_host_path(&desired.parent_path, &observed.parent_path),
        );
        check(Attribute::Size, declared(desired.size, observed.size));
        check(
            Attribute::BlockSize,
            declared(desired.block_size.into(), observed.block_size.into()),
        );
        check(
            Attribute::LogicalSectorSize,
            declared(
                desired.logical_sector_size.into(),
                observed.logical_sector_size.into(),
            ),
        );
        check(
            Attribute::PhysicalSectorSize,
            declared(
                desired.physical_sector_size.into(),
                observed.physical_sector_size.into(),
            ),
        );

        Self { changed }
    }

    pub fn contains(&self, attribute: Attribute) -> bool {
        self.changed.contains(&attribute)
    }

    /// Check if any changed attribute forces recreation
    pub fn forces_recreation(&self) -> bool {
        self.changed.iter().any(Attribute::forces_recreation)
    }

    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changed.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Attribute> + '_ {
        self.changed.iter().copied()
    }
}

impl fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.changed.iter().map(Attribute::as_str).collect();
        f.write_str(&names.join(", "))
    }
}

fn same_host_path(a: &str, b: &str) -> bool {
    let normalize = |p: &str| p.trim_end_matches(['\\', '/']).replace('/', "\\").to_lowercase();
    normalize(a) == normalize(b)
}
