//! Load disease models from JSON files
//!
//! A disease file maps intervention names (plus `"Baseline"`) to their
//! Markov model definition. A catalogue is a directory of such files, one
//! per disease, named after the disease.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;

use log::{debug, info, warn};
use serde::Deserialize;

use super::{DiseaseModel, InterventionModel, Reference, ValidationOptions};
use crate::error::{ConfigurationError, Result};

/// Default path to the disease catalogue directory
pub const DEFAULT_DISEASES_PATH: &str = "data/diseases";

/// Name of the disease bundled into the binary
pub const BUILTIN_DISEASE: &str = "Hypercholesterolemia";

const BUILTIN_DISEASE_JSON: &str = include_str!("../../data/diseases/Hypercholesterolemia.json");

/// Raw JSON arm matching the disease file layout
#[derive(Debug, Deserialize)]
struct RawArm {
    states: Vec<String>,
    transition_matrix: Vec<Vec<f64>>,
    utilities: Vec<f64>,
    mortality_vector: Vec<u8>,
    #[serde(rename = "References", default)]
    references: BTreeMap<String, Reference>,
}

impl RawArm {
    fn into_model(
        self,
        options: &ValidationOptions,
    ) -> std::result::Result<InterventionModel, ConfigurationError> {
        InterventionModel::new(
            self.states,
            self.transition_matrix,
            self.utilities,
            self.mortality_vector,
            self.references,
            options,
        )
    }
}

/// Load one disease from any reader (file, string buffer, upload)
pub fn load_disease_from_reader<R: Read>(
    name: &str,
    reader: R,
    options: &ValidationOptions,
) -> Result<DiseaseModel> {
    let raw: BTreeMap<String, RawArm> = serde_json::from_reader(reader)?;

    let mut arms = BTreeMap::new();
    for (key, arm) in raw {
        let model = arm.into_model(options).map_err(|e| {
            warn!("disease {name}: intervention {key:?} rejected: {e}");
            e
        })?;
        arms.insert(key, model);
    }

    let disease = DiseaseModel::new(name, arms)?;
    debug!(
        "loaded disease {} with arms {:?}",
        disease.name(),
        disease.keys().collect::<Vec<_>>()
    );
    Ok(disease)
}

/// Load one disease file; the disease takes the file stem as its name
pub fn load_disease<P: AsRef<Path>>(path: P, options: &ValidationOptions) -> Result<DiseaseModel> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    let file = File::open(path)?;
    load_disease_from_reader(&name, BufReader::new(file), options)
}

/// The demo disease compiled into the crate
pub fn builtin_disease(options: &ValidationOptions) -> Result<DiseaseModel> {
    load_disease_from_reader(BUILTIN_DISEASE, BUILTIN_DISEASE_JSON.as_bytes(), options)
}

/// Named collection of disease models
#[derive(Debug, Clone, Default)]
pub struct DiseaseCatalogue {
    diseases: BTreeMap<String, DiseaseModel>,
}

impl DiseaseCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalogue holding only the bundled demo disease
    pub fn builtin(options: &ValidationOptions) -> Result<Self> {
        let mut catalogue = Self::new();
        catalogue.insert(builtin_disease(options)?);
        Ok(catalogue)
    }

    /// Load every `*.json` file in `dir`, sorted by disease name
    pub fn load_dir<P: AsRef<Path>>(dir: P, options: &ValidationOptions) -> Result<Self> {
        let dir = dir.as_ref();
        let mut catalogue = Self::new();

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            catalogue.insert(load_disease(&path, options)?);
        }

        info!("loaded {} diseases from {}", catalogue.len(), dir.display());
        Ok(catalogue)
    }

    /// Load the default directory
    pub fn load_default(options: &ValidationOptions) -> Result<Self> {
        Self::load_dir(DEFAULT_DISEASES_PATH, options)
    }

    pub fn insert(&mut self, disease: DiseaseModel) {
        self.diseases.insert(disease.name().to_string(), disease);
    }

    pub fn get(&self, name: &str) -> std::result::Result<&DiseaseModel, ConfigurationError> {
        self.diseases
            .get(name)
            .ok_or_else(|| ConfigurationError::UnknownDisease(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.diseases.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiseaseModel> {
        self.diseases.values()
    }

    pub fn len(&self) -> usize {
        self.diseases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diseases.is_empty()
    }
}
