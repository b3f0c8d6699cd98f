//! BindingsBuilder for build.rs scripts
//!
//! Collects interface descriptors, generates one Rust unit per interface
//! into `$OUT_DIR/bindings/` and writes a `mod.rs` that includes them.

use crate::codegen::{BindingGenerator, GeneratedUnit};
use crate::config::GeneratorConfig;
use crate::error::BuildError;
use crate::ir::{DescriptorRegistry, InterfaceDescriptor};
use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// A descriptor file holds one descriptor or a list of them
#[derive(Deserialize)]
#[serde(untagged)]
enum DescriptorFile {
    One(Box<InterfaceDescriptor>),
    Many(Vec<InterfaceDescriptor>),
}

/// Builder for binding-generating build scripts
///
/// Handles:
/// - descriptor discovery (files, directories, inline values, inventory)
/// - generator configuration from `bindings.toml`
/// - writing the units and their `mod.rs`
/// - cargo:rerun-if-changed directives
///
/// # Example
/// ```ignore
/// use forge_bind::build::BindingsBuilder;
///
/// fn main() {
///     BindingsBuilder::new()
///         .descriptor_dir("idl")
///         .config_file("bindings.toml")
///         .build()
///         .expect("Failed to generate bindings");
/// }
/// ```
///
/// The crate then includes the result:
/// ```ignore
/// mod bindings {
///     use crate::dom::*;
///     include!(concat!(env!("OUT_DIR"), "/bindings/mod.rs"));
/// }
/// ```
#[derive(Debug, Default)]
pub struct BindingsBuilder {
    descriptor_files: Vec<PathBuf>,
    descriptor_dirs: Vec<PathBuf>,
    inline: Vec<InterfaceDescriptor>,
    use_inventory: bool,
    config_file: Option<PathBuf>,
    config: Option<GeneratorConfig>,
    additional_watch: Vec<PathBuf>,
    out_dir: Option<PathBuf>,
    manifest_dir: Option<PathBuf>,
}

impl BindingsBuilder {
    /// Create a new bindings builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor JSON file (relative to the crate root)
    pub fn descriptor_file(mut self, path: impl AsRef<Path>) -> Self {
        self.descriptor_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Add every `*.json` file of a directory (relative to the crate root)
    pub fn descriptor_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.descriptor_dirs.push(path.as_ref().to_path_buf());
        self
    }

    /// Add a descriptor value
    pub fn descriptor(mut self, descriptor: InterfaceDescriptor) -> Self {
        self.inline.push(descriptor);
        self
    }

    /// Also generate the descriptors registered with `register_interface!`
    pub fn use_inventory(mut self) -> Self {
        self.use_inventory = true;
        self
    }

    /// Load the generator configuration from a TOML file
    pub fn config_file(mut self, path: impl AsRef<Path>) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the generator configuration directly
    pub fn config(mut self, config: GeneratorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Add additional files to watch for rebuilds
    pub fn watch(mut self, path: impl AsRef<Path>) -> Self {
        self.additional_watch.push(path.as_ref().to_path_buf());
        self
    }

    /// Write to this directory instead of `$OUT_DIR`
    pub fn out_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.out_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Resolve relative paths against this directory instead of
    /// `$CARGO_MANIFEST_DIR`
    pub fn manifest_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.manifest_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Generate and write the bindings
    ///
    /// This will:
    /// 1. Load the configuration
    /// 2. Collect and de-duplicate descriptors
    /// 3. Generate every interface
    /// 4. Write the units and `mod.rs`
    /// 5. Print cargo:rerun-if-changed directives
    pub fn build(self) -> Result<BuildOutput, BuildError> {
        let out_dir = resolve_dir(self.out_dir.clone(), "OUT_DIR")?;
        let manifest_dir = resolve_dir(self.manifest_dir.clone(), "CARGO_MANIFEST_DIR")?;

        let config = match (&self.config_file, &self.config) {
            (Some(path), _) => {
                println!("cargo:rerun-if-changed={}", path.display());
                GeneratorConfig::from_file(manifest_dir.join(path))?
            }
            (None, Some(config)) => config.clone(),
            (None, None) => GeneratorConfig::default(),
        };

        let descriptors = self.collect(&manifest_dir)?;
        let generator = BindingGenerator::new(config);
        let units = generator.generate_all(&descriptors)?;

        let bindings_dir = out_dir.join("bindings");
        fs::create_dir_all(&bindings_dir)?;

        let mut written = Vec::with_capacity(units.len());
        for unit in &units {
            let path = bindings_dir.join(&unit.file_name);
            fs::write(&path, &unit.source)?;
            tracing::info!(interface = %unit.interface, path = %path.display(), "wrote bindings");
            written.push(path);
        }

        let mod_rs = bindings_dir.join("mod.rs");
        fs::write(&mod_rs, module_index(&units, &bindings_dir))?;

        for watch_path in &self.additional_watch {
            println!("cargo:rerun-if-changed={}", watch_path.display());
        }
        if self.use_inventory {
            // Registered descriptors live in the crate sources
            println!("cargo:rerun-if-changed=src/lib.rs");
        }

        Ok(BuildOutput {
            bindings_dir,
            mod_rs,
            units: written,
        })
    }

    fn collect(&self, manifest_dir: &Path) -> Result<Vec<InterfaceDescriptor>, BuildError> {
        let mut descriptors = self.inline.clone();

        for path in &self.descriptor_files {
            let full = manifest_dir.join(path);
            if !full.is_file() {
                return Err(BuildError::DescriptorNotFound(full));
            }
            println!("cargo:rerun-if-changed={}", path.display());
            descriptors.extend(read_descriptor_file(&full)?);
        }

        for dir in &self.descriptor_dirs {
            let full = manifest_dir.join(dir);
            if !full.is_dir() {
                return Err(BuildError::DescriptorNotFound(full));
            }
            println!("cargo:rerun-if-changed={}", dir.display());

            let mut files: Vec<PathBuf> = fs::read_dir(&full)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
                .collect();
            files.sort();
            for file in files {
                descriptors.extend(read_descriptor_file(&file)?);
            }
        }

        if self.use_inventory {
            descriptors.extend(DescriptorRegistry::from_inventory().into_interfaces());
        }

        let mut seen = HashSet::new();
        for descriptor in &descriptors {
            if !seen.insert(descriptor.name.as_str()) {
                return Err(BuildError::DuplicateInterface(descriptor.name.clone()));
            }
        }

        tracing::debug!(count = descriptors.len(), "collected descriptors");
        Ok(descriptors)
    }
}

/// Output paths from a successful build
#[derive(Debug)]
pub struct BuildOutput {
    /// Directory holding the generated units
    pub bindings_dir: PathBuf,
    /// Path to the generated `mod.rs`
    pub mod_rs: PathBuf,
    /// Path of every generated unit, in generation order
    pub units: Vec<PathBuf>,
}

fn resolve_dir(explicit: Option<PathBuf>, var: &str) -> Result<PathBuf, BuildError> {
    match explicit {
        Some(path) => Ok(path),
        None => env::var(var)
            .map(PathBuf::from)
            .map_err(|_| BuildError::EnvVarMissing(var.to_string())),
    }
}

fn read_descriptor_file(path: &Path) -> Result<Vec<InterfaceDescriptor>, BuildError> {
    let source = fs::read_to_string(path)?;
    let parsed: DescriptorFile = serde_json::from_str(&source).map_err(|source| BuildError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(match parsed {
        DescriptorFile::One(descriptor) => vec![*descriptor],
        DescriptorFile::Many(descriptors) => descriptors,
    })
}

/// `mod.rs` including every unit under its module name
fn module_index(units: &[GeneratedUnit], bindings_dir: &Path) -> String {
    let mut out = String::from("// Generated by forge-bind. Do not edit.\n");
    for unit in units {
        let path = bindings_dir.join(&unit.file_name);
        out.push_str(&format!(
            "\npub mod {} {{\n    include!({:?});\n}}\n",
            unit.module_name,
            path.display().to_string()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::FailurePolicy;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const LISTENER: &str = r#"{
        "name": "EventListener",
        "kind": "callback_interface",
        "single_operation": true,
        "members": [{
            "member": "operation",
            "name": "handleEvent",
            "signatures": [{
                "return_type": "void",
                "arguments": [{"name": "event", "type": "any"}]
            }]
        }]
    }"#;

    const COLLECTION: &str = r#"[{
        "name": "NodeList",
        "operations": {
            "IndexedGetter": {
                "name": "item",
                "signatures": [{
                    "return_type": {"nullable": {"interface": "Node"}},
                    "arguments": [{"name": "index", "type": {"primitive": "unsigned_long"}}]
                }]
            }
        }
    }]"#;

    fn workspace() -> TempDir {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("idl")).unwrap();
        fs::write(dir.path().join("idl/listener.json"), LISTENER).unwrap();
        fs::write(dir.path().join("idl/collection.json"), COLLECTION).unwrap();
        fs::write(dir.path().join("idl/notes.txt"), "ignored").unwrap();
        fs::write(
            dir.path().join("bindings.toml"),
            "default_failure_policy = \"propagate\"\nverify_syntax = true\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_build_writes_units_and_index() {
        let dir = workspace();
        let out = dir.path().join("out");

        let output = BindingsBuilder::new()
            .descriptor_dir("idl")
            .config_file("bindings.toml")
            .manifest_dir(dir.path())
            .out_dir(&out)
            .build()
            .unwrap();

        assert_eq!(output.bindings_dir, out.join("bindings"));
        assert_eq!(
            output.units,
            vec![
                out.join("bindings/node_list.rs"),
                out.join("bindings/event_listener.rs"),
            ]
        );
        for unit in &output.units {
            assert!(unit.is_file());
        }

        let index = fs::read_to_string(&output.mod_rs).unwrap();
        assert!(index.contains("pub mod node_list {\n    include!("));
        assert!(index.contains("pub mod event_listener {\n    include!("));
        assert!(syn::parse_file(&index).is_ok());

        let list = fs::read_to_string(out.join("bindings/node_list.rs")).unwrap();
        assert!(list.contains("cx.report_failure(\"NodeList\", \"item\");"));
    }

    #[test]
    fn test_inline_descriptor_and_config() {
        let dir = TempDir::new().unwrap();
        let descriptor = InterfaceDescriptor::from_json(LISTENER).unwrap();

        let output = BindingsBuilder::new()
            .descriptor(descriptor)
            .config(GeneratorConfig::default().with_indent(2))
            .manifest_dir(dir.path())
            .out_dir(dir.path())
            .build()
            .unwrap();

        let source = fs::read_to_string(&output.units[0]).unwrap();
        assert!(source.contains("\n  pub fn handle_event_with_this<T: Reflectable>("));
    }

    #[test]
    fn test_duplicate_interface() {
        let dir = workspace();
        let result = BindingsBuilder::new()
            .descriptor_file("idl/listener.json")
            .descriptor(InterfaceDescriptor::from_json(LISTENER).unwrap())
            .manifest_dir(dir.path())
            .out_dir(dir.path().join("out"))
            .build();
        assert!(matches!(result, Err(BuildError::DuplicateInterface(name)) if name == "EventListener"));
    }

    #[test]
    fn test_missing_descriptor() {
        let dir = TempDir::new().unwrap();
        let result = BindingsBuilder::new()
            .descriptor_file("idl/missing.json")
            .manifest_dir(dir.path())
            .out_dir(dir.path())
            .build();
        assert!(matches!(result, Err(BuildError::DescriptorNotFound(_))));
    }

    #[test]
    fn test_invalid_json() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.json"), "{\"name\": 3}").unwrap();
        let result = BindingsBuilder::new()
            .descriptor_file("broken.json")
            .manifest_dir(dir.path())
            .out_dir(dir.path())
            .build();
        assert!(matches!(result, Err(BuildError::Json { .. })));
    }

    #[test]
    fn test_generation_error_propagates() {
        let dir = workspace();
        let result = BindingsBuilder::new()
            .descriptor_file("idl/collection.json")
            .manifest_dir(dir.path())
            .out_dir(dir.path().join("out"))
            .build();
        assert!(matches!(result, Err(BuildError::Generation(_))));

        let ok = BindingsBuilder::new()
            .descriptor_file("idl/collection.json")
            .config(GeneratorConfig::default().with_default_failure_policy(FailurePolicy::Infallible))
            .manifest_dir(dir.path())
            .out_dir(dir.path().join("out"))
            .build();
        assert!(ok.is_ok());
    }
}
