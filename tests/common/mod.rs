//! Shared fixture for end-to-end build tests

#![allow(dead_code)]

use content_funnel::{ContentFilter, FilterOptions};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// An input tree, an output tree and helpers to populate and inspect them
pub struct Fixture {
    pub input: TempDir,
    pub output: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        content_funnel::logging::init(0);
        Self {
            input: TempDir::new().unwrap(),
            output: TempDir::new().unwrap(),
        }
    }

    /// A filter reading this fixture's input and writing its output
    pub fn filter(&self, options: FilterOptions) -> ContentFilter {
        ContentFilter::new(self.input.path(), self.output.path(), options).unwrap()
    }

    /// Write files (creating parent directories) into the input tree
    pub fn write(&self, files: &[(&str, &str)]) {
        for (path, content) in files {
            let target = self.input.path().join(path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(target, content).unwrap();
        }
    }

    pub fn remove(&self, path: &str) {
        fs::remove_file(self.input.path().join(path)).unwrap();
    }

    /// Every file in the output tree keyed by forward-slash relative path
    pub fn read(&self) -> BTreeMap<String, String> {
        let mut files = BTreeMap::new();
        collect(self.output.path(), self.output.path(), &mut files);
        files
    }
}

fn collect(root: &Path, dir: &Path, files: &mut BTreeMap<String, String>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect(root, &path, files);
        } else {
            let rel = path
                .strip_prefix(root)
                .unwrap()
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            files.insert(rel, fs::read_to_string(&path).unwrap());
        }
    }
}

/// Build an expected output map from literal pairs
pub fn tree(files: &[(&str, &str)]) -> BTreeMap<String, String> {
    files
        .iter()
        .map(|(path, content)| (path.to_string(), content.to_string()))
        .collect()
}
