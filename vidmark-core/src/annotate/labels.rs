//! Class label configuration.
//!
//! Detection models exported from YOLO training runs ship with a `data.yaml`
//! describing the dataset. Only the class names matter here; they come either
//! as a list (`names: [car, person]`) or as an index map (`names: {0: car}`),
//! optionally alongside a class count `nc`.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Deserialize)]
struct DataConfig {
    nc: Option<usize>,
    names: Names,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Names {
    List(Vec<String>),
    Map(BTreeMap<usize, String>),
}

/// Ordered class names indexed by class id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    names: Vec<String>,
}

impl LabelSet {
    pub fn new(names: Vec<String>) -> CoreResult<Self> {
        if names.is_empty() {
            return Err(CoreError::LabelConfig("no class names defined".to_string()));
        }
        Ok(Self { names })
    }

    /// Reads and validates a label configuration file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            CoreError::LabelConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        let labels = Self::from_yaml_str(&contents)
            .map_err(|e| CoreError::LabelConfig(format!("{}: {e}", path.display())))?;
        log::debug!("Loaded {} class names from {}", labels.len(), path.display());
        Ok(labels)
    }

    pub fn from_yaml_str(contents: &str) -> CoreResult<Self> {
        let config: DataConfig = serde_yaml::from_str(contents)
            .map_err(|e| CoreError::LabelConfig(e.to_string()))?;

        let names = match config.names {
            Names::List(names) => names,
            Names::Map(map) => {
                if let Some((position, id)) = map.keys().enumerate().find(|(i, id)| i != *id) {
                    return Err(CoreError::LabelConfig(format!(
                        "class ids must be contiguous from 0, expected {position} but found {id}"
                    )));
                }
                map.into_values().collect()
            }
        };

        if let Some(nc) = config.nc {
            if nc != names.len() {
                return Err(CoreError::LabelConfig(format!(
                    "nc is {nc} but {} names are listed",
                    names.len()
                )));
            }
        }

        Self::new(names)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name of `class_id`; ids outside the set get a generic name.
    pub fn name(&self, class_id: usize) -> Cow<'_, str> {
        match self.names.get(class_id) {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(format!("class {class_id}")),
        }
    }
}
