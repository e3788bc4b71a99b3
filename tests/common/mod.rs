//! Common test utilities for leaf-loader integration tests

#![allow(dead_code, clippy::expect_used)]

use std::path::{Path, PathBuf};

use leaf_loader::config::LoaderConfig;
use leaf_loader::transform::class::{ClassImage, MethodInfo};
use leaf_loader::transform::class::Access;
use serde_json::{Value, json};
use tempfile::TempDir;

/// A throwaway game directory with `mods/`, `classes/` and `libraries/`
pub struct TestGame {
    pub temp: TempDir,
    pub path: PathBuf,
}

impl TestGame {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    /// Write a file in the game directory
    pub fn write_file(&self, path: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    /// Directory package `mods/<dir>/leaf.mod.json`
    pub fn add_mod(&self, dir: &str, manifest: &Value) -> PathBuf {
        let text = serde_json::to_string_pretty(manifest).expect("manifest serializes");
        self.write_file(&format!("mods/{dir}/leaf.mod.json"), text)
            .parent()
            .expect("package dir")
            .to_path_buf()
    }

    /// File inside a directory package
    pub fn add_mod_file(&self, dir: &str, name: &str, content: &str) {
        self.write_file(&format!("mods/{dir}/{name}"), content);
    }

    /// Zip package `mods/<file>` with the given entries
    pub fn add_mod_archive(&self, file: &str, entries: &[(&str, &str)]) -> PathBuf {
        let path = self.path.join("mods").join(file);
        std::fs::create_dir_all(path.parent().expect("mods dir")).expect("create mods dir");
        write_zip(&path, entries);
        path
    }

    /// Encoded class image under `classes/`
    pub fn add_class(&self, image: &ClassImage) -> PathBuf {
        let bytes = image.encode().expect("class encodes");
        self.write_file(&format!("classes/{}.class", image.name), bytes)
    }

    /// Configuration with `classes/` on the class path
    pub fn config(&self) -> LoaderConfig {
        let mut config = LoaderConfig::for_game_dir(&self.path);
        config.class_path = vec![PathBuf::from("classes")];
        config
    }

    /// Path to the leaf binary
    pub fn leaf_bin() -> PathBuf {
        PathBuf::from(env!("CARGO_BIN_EXE_leaf"))
    }
}

/// Writes a zip archive with stored text entries
pub fn write_zip(path: &Path, entries: &[(&str, &str)]) {
    use std::io::Write;

    let file = std::fs::File::create(path).expect("create archive");
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    for (name, content) in entries {
        zip.start_file(*name, options).expect("start entry");
        zip.write_all(content.as_bytes()).expect("write entry");
    }
    zip.finish().expect("finish archive");
}

/// Minimal manifest; `extra` keys are merged in
pub fn manifest(id: &str, version: &str, extra: Value) -> Value {
    let mut manifest = json!({
        "schemaVersion": 1,
        "id": id,
        "version": version,
    });
    if let (Some(target), Value::Object(extra)) = (manifest.as_object_mut(), extra) {
        target.extend(extra);
    }
    manifest
}

/// `net/game/Player` with a `health` field and a `tick()V` method
pub fn player_class() -> ClassImage {
    let mut image = ClassImage::new("net/game/Player");
    image.fields.push(leaf_loader::transform::class::FieldInfo {
        name: "health".to_string(),
        descriptor: "I".to_string(),
        access: Access::PRIVATE,
        environment: None,
    });
    image.methods.push(MethodInfo {
        name: "tick".to_string(),
        descriptor: "()V".to_string(),
        access: Access::PUBLIC,
        environment: None,
        code: vec!["body".to_string()],
    });
    image
}
