use crate::domain::model::{CountryLabel, QueryRow, VocabularySource};
use crate::domain::ports::FeatureEncoder;
use crate::utils::error::{EncodingError, LoadError};
use ndarray::{s, Array2, ArrayViewMut1};
use serde::{Deserialize, Serialize};

pub use crate::domain::model::{VocabularyPolicy, DEFAULT_FALLBACK_COUNTRIES};

/// 預設從名為 `cat` 的 one-hot 轉換器讀取國家清單
pub const DEFAULT_VOCABULARY_TRANSFORMER: &str = "cat";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputColumn {
    Name,
    Year,
    Month,
}

impl InputColumn {
    fn numeric(self, row: &QueryRow) -> Option<f64> {
        match self {
            InputColumn::Name => None,
            InputColumn::Year => Some(f64::from(row.year)),
            InputColumn::Month => Some(f64::from(row.month)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleUnknown {
    #[default]
    Error,
    /// Unknown categories encode as an all-zero block.
    Ignore,
}

/// One fitted step of the column transformer. Output blocks are concatenated in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnTransform {
    OneHot {
        name: String,
        column: InputColumn,
        categories: Vec<String>,
        #[serde(default)]
        handle_unknown: HandleUnknown,
    },
    Passthrough {
        name: String,
        columns: Vec<InputColumn>,
    },
    StandardScaler {
        name: String,
        columns: Vec<InputColumn>,
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
}

impl ColumnTransform {
    pub fn name(&self) -> &str {
        match self {
            ColumnTransform::OneHot { name, .. }
            | ColumnTransform::Passthrough { name, .. }
            | ColumnTransform::StandardScaler { name, .. } => name,
        }
    }

    pub fn width(&self) -> usize {
        match self {
            ColumnTransform::OneHot { categories, .. } => categories.len(),
            ColumnTransform::Passthrough { columns, .. }
            | ColumnTransform::StandardScaler { columns, .. } => columns.len(),
        }
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            ColumnTransform::OneHot { name, column, .. } => {
                if *column != InputColumn::Name {
                    return Err(format!("one_hot transformer '{}' must encode the name column", name));
                }
            }
            ColumnTransform::Passthrough { name, columns } => {
                if columns.contains(&InputColumn::Name) {
                    return Err(format!("passthrough transformer '{}' cannot take the name column", name));
                }
            }
            ColumnTransform::StandardScaler {
                name,
                columns,
                mean,
                scale,
            } => {
                if columns.contains(&InputColumn::Name) {
                    return Err(format!("standard_scaler '{}' cannot take the name column", name));
                }
                if mean.len() != columns.len() || scale.len() != columns.len() {
                    return Err(format!(
                        "standard_scaler '{}' has {} columns but {} means and {} scales",
                        name,
                        columns.len(),
                        mean.len(),
                        scale.len()
                    ));
                }
            }
        }
        Ok(())
    }

    fn write(&self, row: &QueryRow, mut out: ArrayViewMut1<'_, f64>) -> Result<(), EncodingError> {
        match self {
            ColumnTransform::OneHot {
                categories,
                handle_unknown,
                ..
            } => {
                match categories.iter().position(|c| c == row.country.as_str()) {
                    Some(index) => out[index] = 1.0,
                    None if *handle_unknown == HandleUnknown::Ignore => {}
                    None => {
                        return Err(EncodingError::UnknownCountry {
                            country: row.country.to_string(),
                        })
                    }
                }
            }
            ColumnTransform::Passthrough { columns, .. } => {
                for (slot, column) in columns.iter().enumerate() {
                    out[slot] = column.numeric(row).unwrap_or_default();
                }
            }
            ColumnTransform::StandardScaler {
                columns,
                mean,
                scale,
                ..
            } => {
                for (slot, column) in columns.iter().enumerate() {
                    let value = column.numeric(row).unwrap_or_default();
                    // 與 sklearn 相同：scale 為 0 時視為 1
                    let divisor = if scale[slot] == 0.0 { 1.0 } else { scale[slot] };
                    out[slot] = (value - mean[slot]) / divisor;
                }
            }
        }
        Ok(())
    }
}

/// Frozen training-time preprocessor, as stored in the artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTransformer {
    pub transformers: Vec<ColumnTransform>,
}

impl ColumnTransformer {
    pub fn n_features(&self) -> usize {
        self.transformers.iter().map(ColumnTransform::width).sum()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.transformers.is_empty() {
            return Err("preprocessor has no transformers".to_string());
        }
        self.transformers.iter().try_for_each(ColumnTransform::validate)
    }

    /// Categories of the named one-hot step, if it exists and is non-empty.
    pub fn categories(&self, transformer: &str) -> Option<&[String]> {
        self.transformers.iter().find_map(|t| match t {
            ColumnTransform::OneHot {
                name, categories, ..
            } if name == transformer && !categories.is_empty() => Some(categories.as_slice()),
            _ => None,
        })
    }

    pub fn transform(&self, rows: &[QueryRow]) -> Result<Array2<f64>, EncodingError> {
        let mut matrix = Array2::zeros((rows.len(), self.n_features()));
        for (i, row) in rows.iter().enumerate() {
            let mut offset = 0;
            for transform in &self.transformers {
                let width = transform.width();
                transform.write(row, matrix.slice_mut(s![i, offset..offset + width]))?;
                offset += width;
            }
        }
        Ok(matrix)
    }
}

/// Adapter exposing a [`ColumnTransformer`] through the [`FeatureEncoder`] port.
///
/// The vocabulary is resolved once, at construction, and reused by every query.
#[derive(Debug, Clone)]
pub struct EncoderAdapter {
    transformer: ColumnTransformer,
    countries: Vec<CountryLabel>,
    source: VocabularySource,
}

impl EncoderAdapter {
    pub fn resolve(
        transformer: ColumnTransformer,
        vocabulary_transformer: &str,
        policy: &VocabularyPolicy,
        location: &str,
    ) -> Result<Self, LoadError> {
        let (mut countries, source) = match transformer.categories(vocabulary_transformer) {
            Some(categories) => (
                categories.iter().map(|c| CountryLabel::new(c.as_str())).collect::<Vec<_>>(),
                VocabularySource::Introspected,
            ),
            None => match policy {
                VocabularyPolicy::Strict => {
                    return Err(LoadError::corrupt(
                        location,
                        format!(
                            "vocabulary transformer '{}' not found and strict vocabulary is enabled",
                            vocabulary_transformer
                        ),
                    ))
                }
                VocabularyPolicy::Fallback(list) => {
                    if list.is_empty() {
                        return Err(LoadError::corrupt(location, "fallback vocabulary is empty"));
                    }
                    tracing::warn!(
                        "⚠️ Vocabulary transformer '{}' not found in {}; using fallback list of {} countries",
                        vocabulary_transformer,
                        location,
                        list.len()
                    );
                    (list.clone(), VocabularySource::Fallback)
                }
            },
        };

        countries.sort();
        countries.dedup();

        Ok(Self {
            transformer,
            countries,
            source,
        })
    }
}

impl FeatureEncoder for EncoderAdapter {
    fn valid_countries(&self) -> &[CountryLabel] {
        &self.countries
    }

    fn vocabulary_source(&self) -> VocabularySource {
        self.source
    }

    fn n_features(&self) -> usize {
        self.transformer.n_features()
    }

    fn encode(&self, rows: &[QueryRow]) -> Result<Array2<f64>, EncodingError> {
        if let Some(row) = rows
            .iter()
            .find(|row| self.countries.binary_search(&row.country).is_err())
        {
            return Err(EncodingError::UnknownCountry {
                country: row.country.to_string(),
            });
        }
        self.transformer.transform(rows)
    }
}
