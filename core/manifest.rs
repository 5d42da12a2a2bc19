use crate::output_formats::{FileIssue, IssueStage};
use crate::scan::literal_eval;
use log;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

pub const UNKNOWN: &str = "unknown";

/// Key-value metadata declared by the module manifest. Opaque apart from a
/// handful of well-known keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ManifestInfo(Map<String, Value>);

impl ManifestInfo {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn dependencies(&self) -> Value {
        self.get("depends")
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()))
    }

    pub fn version(&self) -> Value {
        self.or_unknown("version")
    }

    pub fn author(&self) -> Value {
        self.or_unknown("author")
    }

    pub fn category(&self) -> Value {
        self.or_unknown("category")
    }

    fn or_unknown(&self, key: &str) -> Value {
        self.get(key)
            .cloned()
            .unwrap_or_else(|| Value::String(UNKNOWN.to_string()))
    }
}

/// Reads `<module_root>/<file_name>`. A missing manifest is simply empty; one
/// that cannot be read or is not a literal dict is empty too, with the reason
/// returned as an issue.
pub fn load_manifest(module_root: &Path, file_name: &str) -> (ManifestInfo, Option<FileIssue>) {
    let manifest_path = module_root.join(file_name);
    if !manifest_path.is_file() {
        log::debug!("No manifest found at {}", manifest_path.display());
        return (ManifestInfo::default(), None);
    }

    let failure = |message: String| {
        log::warn!("Unable to parse {} - {}", file_name, message);
        (
            ManifestInfo::default(),
            Some(FileIssue::new(file_name, IssueStage::Manifest, message)),
        )
    };

    let content = match fs::read_to_string(&manifest_path) {
        Ok(content) => content,
        Err(e) => return failure(e.to_string()),
    };

    match literal_eval(&content, file_name) {
        Ok(Value::Object(map)) => {
            log::debug!("Manifest loaded with {} keys", map.len());
            (ManifestInfo(map), None)
        }
        Ok(other) => failure(format!(
            "expected a dict literal, found {}",
            json_kind(&other)
        )),
        Err(message) => failure(message),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "None",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a dict",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_manifest_is_empty_without_issue() {
        let dir = tempfile::tempdir().unwrap();
        let (info, issue) = load_manifest(dir.path(), "__manifest__.py");
        assert!(info.is_empty());
        assert!(issue.is_none());
        assert_eq!(info.dependencies(), json!([]));
        assert_eq!(info.version(), json!("unknown"));
    }

    #[test]
    fn known_keys_are_exposed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("__manifest__.py"),
            "{'name': 'X', 'depends': ['base'], 'author': 'ACME', 'category': 'Sales'}\n",
        )
        .unwrap();
        let (info, issue) = load_manifest(dir.path(), "__manifest__.py");
        assert!(issue.is_none());
        assert_eq!(info.len(), 4);
        assert_eq!(info.dependencies(), json!(["base"]));
        assert_eq!(info.author(), json!("ACME"));
        assert_eq!(info.category(), json!("Sales"));
        assert_eq!(info.version(), json!("unknown"));
    }

    #[test]
    fn unsafe_content_degrades_to_empty_with_issue() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("__manifest__.py"),
            "{'name': __import__('os').getcwd()}",
        )
        .unwrap();
        let (info, issue) = load_manifest(dir.path(), "__manifest__.py");
        assert!(info.is_empty());
        let issue = issue.unwrap();
        assert_eq!(issue.stage, IssueStage::Manifest);
        assert_eq!(issue.path, "__manifest__.py");
    }

    #[test]
    fn non_dict_literal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("__manifest__.py"), "['a', 'b']").unwrap();
        let (info, issue) = load_manifest(dir.path(), "__manifest__.py");
        assert!(info.is_empty());
        assert!(issue.unwrap().message.contains("sequence"));
    }
}
