//! The artifact operations a controller drives.

use hvclient::{CreateVhd, VhdClient, VhdInfo};

/// Disk artifact operations.
///
/// [`VhdClient`] is the production implementation; tests substitute a
/// recording mock.
pub trait DiskApi: Send + Sync {
    fn create_or_update(&self, vhd: &CreateVhd) -> hvclient::Result<()>;

    /// Read the disk; an empty `path` in the result means it does not exist.
    fn get(&self, path: &str) -> hvclient::Result<VhdInfo>;

    fn resize(&self, path: &str, size: u64) -> hvclient::Result<()>;

    fn delete(&self, path: &str) -> hvclient::Result<()>;
}

impl DiskApi for VhdClient {
    fn create_or_update(&self, vhd: &CreateVhd) -> hvclient::Result<()> {
        self.create_or_update_vhd(vhd)
    }

    fn get(&self, path: &str) -> hvclient::Result<VhdInfo> {
        self.get_vhd(path)
    }

    fn resize(&self, path: &str, size: u64) -> hvclient::Result<()> {
        self.resize_vhd(path, size)
    }

    fn delete(&self, path: &str) -> hvclient::Result<()> {
        self.delete_vhd(path)
    }
}
