use crate::classify::{CharAtRule, Classifier};
use crate::error::{Result, ShrinkageError};
use crate::schema::{MissingShrinkagePolicy, UnclassifiedPolicy};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct CategoryConfig {
    #[schemars(description = "Category name. Used as the column header in every input and output table.")]
    pub name: String,

    #[schemars(
        description = "The character that marks this category at `code_position` of a transaction's identifying code."
    )]
    pub code_char: char,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct FileLayout {
    #[schemars(description = "Suffix of sales files. The part of the file name before it is the store prefix.")]
    pub sales_suffix: String,

    #[schemars(description = "Suffix of restock (supply) files")]
    pub supply_suffix: String,

    #[schemars(description = "Suffix of audited inventory files")]
    pub inventory_suffix: String,

    #[schemars(description = "Suffix of the written reconstructed daily balance tables")]
    pub daily_suffix: String,

    #[schemars(description = "Suffix of the written per-period shrinkage tables")]
    pub shrinkage_suffix: String,

    #[schemars(description = "File name of the cross-store report")]
    pub report_name: String,
}

impl Default for FileLayout {
    fn default() -> Self {
        Self {
            sales_suffix: "sell.csv".to_string(),
            supply_suffix: "supply.csv".to_string(),
            inventory_suffix: "inventory.csv".to_string(),
            daily_suffix: "daily.csv".to_string(),
            shrinkage_suffix: "steal.csv".to_string(),
            report_name: "states.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct ReconConfig {
    #[schemars(description = "Directory holding the per-store input tables")]
    pub input_dir: PathBuf,

    #[schemars(description = "Directory receiving the per-store outputs and the cross-store report")]
    pub output_dir: PathBuf,

    #[schemars(description = "Wipe and recreate the output directory before a run")]
    pub clean_output: bool,

    #[schemars(description = "Known product categories, in output column order")]
    pub categories: Vec<CategoryConfig>,

    #[schemars(description = "0-based character position of the category marker inside an identifying code")]
    pub code_position: usize,

    #[schemars(description = "Header names accepted for the identifying code column of the sales table, first match wins")]
    pub code_columns: Vec<String>,

    #[schemars(description = "Header name of the date column in all three input tables")]
    pub date_column: String,

    #[schemars(description = "chrono format of day dates in the sales and supply tables. ISO YYYY-MM-DD is always accepted as a fallback.")]
    pub date_format: String,

    #[schemars(description = "Number of leading characters of the store prefix forming the store-category tag")]
    pub store_category_len: usize,

    #[schemars(description = "What to do with transactions whose code matches no category")]
    pub unclassified: UnclassifiedPolicy,

    #[schemars(description = "How periods without an audited count enter the cross-store report")]
    pub missing_shrinkage: MissingShrinkagePolicy,

    pub files: FileLayout,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            clean_output: true,
            categories: vec![
                CategoryConfig {
                    name: "apple".to_string(),
                    code_char: 'a',
                },
                CategoryConfig {
                    name: "pen".to_string(),
                    code_char: 'p',
                },
            ],
            code_position: 6,
            code_columns: vec!["identifying_code".to_string(), "sku_num".to_string()],
            date_column: "date".to_string(),
            date_format: "%Y-%m-%d".to_string(),
            store_category_len: 2,
            unclassified: UnclassifiedPolicy::default(),
            missing_shrinkage: MissingShrinkagePolicy::default(),
            files: FileLayout::default(),
        }
    }
}

impl ReconConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(ShrinkageError::InvalidConfig(
                "at least one category is required".to_string(),
            ));
        }

        let mut names = HashSet::new();
        let mut chars = HashSet::new();
        for category in &self.categories {
            if category.name.trim().is_empty() {
                return Err(ShrinkageError::InvalidConfig(
                    "category names must not be empty".to_string(),
                ));
            }
            if category.name == self.date_column {
                return Err(ShrinkageError::InvalidConfig(format!(
                    "category '{}' collides with the date column",
                    category.name
                )));
            }
            if !names.insert(category.name.as_str()) {
                return Err(ShrinkageError::InvalidConfig(format!(
                    "duplicate category name '{}'",
                    category.name
                )));
            }
            if !chars.insert(category.code_char) {
                return Err(ShrinkageError::InvalidConfig(format!(
                    "code character '{}' is assigned to more than one category",
                    category.code_char
                )));
            }
        }

        if self.code_columns.is_empty() {
            return Err(ShrinkageError::InvalidConfig(
                "at least one identifying code column name is required".to_string(),
            ));
        }

        if self.store_category_len == 0 {
            return Err(ShrinkageError::InvalidConfig(
                "store_category_len must be at least 1".to_string(),
            ));
        }

        let files = &self.files;
        let suffixes = [
            &files.sales_suffix,
            &files.supply_suffix,
            &files.inventory_suffix,
            &files.daily_suffix,
            &files.shrinkage_suffix,
            &files.report_name,
        ];
        if suffixes.iter().any(|s| s.is_empty()) {
            return Err(ShrinkageError::InvalidConfig(
                "file suffixes and report name must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn category_names(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.name.clone()).collect()
    }

    /// Builds the classifier described by `code_position` and `categories`.
    pub fn classifier(&self) -> Classifier<CharAtRule> {
        let rule = CharAtRule::new(
            self.code_position,
            self.categories
                .iter()
                .map(|c| (c.code_char, c.name.clone())),
        );
        Classifier::new(rule, self.category_names())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ReconConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
