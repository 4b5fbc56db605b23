//! Capability functions exposed to templates.
//!
//! | Function        | Template usage                           |
//! |-----------------|------------------------------------------|
//! | `read_file`     | `{{ read_file(name="notes.txt") }}`      |
//! | `import_module` | `{% set site = import_module(name="site") %}` |
//!
//! Both resolve relative names against the input file's directory and add the
//! resolved path to the render's dependency set before touching the file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tera::{Tera, Value};

use crate::loader::DependencyLoader;

pub const READ_FILE: &str = "read_file";
pub const IMPORT_MODULE: &str = "import_module";

/// Extensions tried, in order, when a module name has no exact match.
pub const MODULE_EXTENSIONS: &[&str] = &["json", "yaml", "yml", "toml"];

/// Register both capabilities on `tera`, scoped to `indir`.
pub fn register(tera: &mut Tera, loader: &DependencyLoader, indir: &Path) {
    tera.register_function(READ_FILE, read_file(loader.clone(), indir.to_path_buf()));
    tera.register_function(
        IMPORT_MODULE,
        import_module(loader.clone(), indir.to_path_buf()),
    );
}

fn name_arg<'a>(function: &str, args: &'a HashMap<String, Value>) -> tera::Result<&'a str> {
    args.get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| tera::Error::msg(format!("{function} requires a string `name` argument")))
}

// ---------------------------------------------------------------------------
// read_file
// ---------------------------------------------------------------------------

/// `read_file(name)`: full text of a file.
///
/// Absolute names are used as-is; relative names are joined to `indir`.
pub fn read_file(loader: DependencyLoader, indir: PathBuf) -> impl tera::Function + 'static {
    move |args: &HashMap<String, Value>| -> tera::Result<Value> {
        let name = name_arg(READ_FILE, args)?;
        let path = resolve_file(&indir, name);
        loader.add_dependency(&path);
        let contents = std::fs::read_to_string(&path).map_err(|e| {
            tera::Error::msg(format!("{READ_FILE}: cannot read {}: {e}", path.display()))
        })?;
        Ok(Value::String(contents))
    }
}

fn resolve_file(indir: &Path, name: &str) -> PathBuf {
    let candidate = Path::new(name);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        indir.join(candidate)
    }
}

// ---------------------------------------------------------------------------
// import_module
// ---------------------------------------------------------------------------

/// `import_module(name)`: a data file under `indir`, parsed into a value the
/// template can use as a namespace.
pub fn import_module(loader: DependencyLoader, indir: PathBuf) -> impl tera::Function + 'static {
    move |args: &HashMap<String, Value>| -> tera::Result<Value> {
        let name = name_arg(IMPORT_MODULE, args)?;
        let Some(path) = resolve_module(&indir, name) else {
            loader.add_dependency(indir.join(name));
            return Err(tera::Error::msg(format!(
                "{IMPORT_MODULE}: no module '{name}' in {}",
                indir.display()
            )));
        };
        loader.add_dependency(&path);
        load_module(&path)
    }
}

/// `<indir>/<name>` if it exists, else the first `<name>.<ext>` that does.
pub fn resolve_module(indir: &Path, name: &str) -> Option<PathBuf> {
    let exact = indir.join(name);
    if exact.is_file() {
        return Some(exact);
    }
    MODULE_EXTENSIONS
        .iter()
        .map(|ext| indir.join(format!("{name}.{ext}")))
        .find(|candidate| candidate.is_file())
}

/// Parse a module file by extension. Files without a known extension are
/// read as JSON.
pub fn load_module(path: &Path) -> tera::Result<Value> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        tera::Error::msg(format!("{IMPORT_MODULE}: cannot read {}: {e}", path.display()))
    })?;
    let parse_err = |e: String| {
        tera::Error::msg(format!("{IMPORT_MODULE}: cannot parse {}: {e}", path.display()))
    };
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&text).map_err(|e| parse_err(e.to_string()))
        }
        Some("toml") => toml::from_str(&text).map_err(|e| parse_err(e.to_string())),
        _ => serde_json::from_str(&text).map_err(|e| parse_err(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::absolutize;
    use serde_json::json;
    use tempfile::TempDir;
    use tera::Function;

    fn args(name: &str) -> HashMap<String, Value> {
        HashMap::from([("name".to_string(), json!(name))])
    }

    #[test]
    fn read_file_relative_to_input_dir_and_recorded() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("data.txt"), "hello").unwrap();
        let loader = DependencyLoader::new(vec![]);
        let f = read_file(loader.clone(), tmp.path().to_path_buf());

        assert_eq!(f.call(&args("data.txt")).unwrap(), json!("hello"));
        assert!(loader
            .dependencies()
            .contains(&absolutize(&tmp.path().join("data.txt"))));
    }

    #[test]
    fn read_file_absolute_path_used_as_is() {
        let tmp = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let abs = other.path().join("abs.txt");
        std::fs::write(&abs, "absolute").unwrap();
        let loader = DependencyLoader::new(vec![]);
        let f = read_file(loader.clone(), tmp.path().to_path_buf());

        let value = f.call(&args(abs.to_str().unwrap())).unwrap();
        assert_eq!(value, json!("absolute"));
        assert!(loader.dependencies().contains(&absolutize(&abs)));
    }

    #[test]
    fn read_file_missing_is_recorded_then_errors() {
        let tmp = TempDir::new().unwrap();
        let loader = DependencyLoader::new(vec![]);
        let f = read_file(loader.clone(), tmp.path().to_path_buf());
        assert!(f.call(&args("gone.txt")).is_err());
        assert_eq!(loader.dependencies().len(), 1);
    }

    #[test]
    fn read_file_requires_name() {
        let loader = DependencyLoader::new(vec![]);
        let f = read_file(loader, PathBuf::from("."));
        let err = f.call(&HashMap::new()).unwrap_err();
        assert!(err.to_string().contains("`name`"));
    }

    #[test]
    fn import_module_tries_extensions_in_order() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("site.yaml"), "title: From YAML\n").unwrap();
        std::fs::write(tmp.path().join("site.toml"), "title = \"From TOML\"\n").unwrap();
        let loader = DependencyLoader::new(vec![]);
        let f = import_module(loader.clone(), tmp.path().to_path_buf());

        let value = f.call(&args("site")).unwrap();
        assert_eq!(value["title"], json!("From YAML"));
        assert!(loader
            .dependencies()
            .contains(&absolutize(&tmp.path().join("site.yaml"))));
    }

    #[test]
    fn import_module_exact_name_parsed_by_extension() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("conf.toml"), "[author]\nname = \"Ada\"\n").unwrap();
        let loader = DependencyLoader::new(vec![]);
        let f = import_module(loader, tmp.path().to_path_buf());
        let value = f.call(&args("conf.toml")).unwrap();
        assert_eq!(value["author"]["name"], json!("Ada"));
    }

    #[test]
    fn import_module_json() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("nums.json"), r#"{"xs": [1, 2, 3]}"#).unwrap();
        let loader = DependencyLoader::new(vec![]);
        let f = import_module(loader, tmp.path().to_path_buf());
        assert_eq!(f.call(&args("nums")).unwrap(), json!({"xs": [1, 2, 3]}));
    }

    #[test]
    fn import_module_missing_is_error() {
        let tmp = TempDir::new().unwrap();
        let loader = DependencyLoader::new(vec![]);
        let f = import_module(loader.clone(), tmp.path().to_path_buf());
        let err = f.call(&args("nothing")).unwrap_err();
        assert!(err.to_string().contains("no module 'nothing'"));
        assert_eq!(loader.dependencies().len(), 1);
    }
}
