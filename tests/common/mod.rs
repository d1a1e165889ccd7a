#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Old price list in the layout a Greek wholesaler exports: barcode, name,
/// a retail price that must never be picked up, then the wholesale price.
pub const OLD_LIST: &str = "\
Barcode,Προϊόν,Δραστική Ουσία,Λιανική Τιμή,Χονδρική Τιμή
2800001,Depon 500mg,Paracetamol,\"12,00\",\"10,00\"
2800002,Ponstan,Mefenamic acid,\"6,00\",\"5,00\"
2800003,Aspirin,Acetylsalicylic acid,\"3,00\",\"2,50\"
";

/// New price list with one increase, one unchanged item, one decrease and
/// one product missing from the old list.
pub const NEW_LIST: &str = "\
Barcode,Ονομασία,Προτεινόμενη Χονδρική,Λιανική
2800001,Depon 500mg,\"12,00\",\"14,00\"
2800002,Ponstan,\"5,00\",\"6,00\"
2800003,Aspirin,\"2,00\",\"2,50\"
2800009,Nurofen,\"4,00\",\"5,00\"
";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        self.write_bytes(name, contents.as_bytes())
    }

    /// Writes raw bytes, for inputs in legacy encodings.
    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file contents");
        path
    }

    /// Writes the stock old and new price lists and returns their paths.
    pub fn price_lists(&self) -> (PathBuf, PathBuf) {
        (
            self.write("old.csv", OLD_LIST),
            self.write("new.csv", NEW_LIST),
        )
    }
}
