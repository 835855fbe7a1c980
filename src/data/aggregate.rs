//! Death Aggregation Module
//! Builds the five per-dimension death-count summary tables from the raw
//! case-level CSV and persists them for fast startup.

use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::data::schema::{
    relabel, Dimension, COUNT_COLUMN, DEATH_COLUMN, DEATH_MARKER, INDEX_COLUMN, RAW_COLUMNS,
};

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Raw dataset is missing expected column '{0}' (upstream schema changed?)")]
    MissingColumn(String),
    #[error("Failed to process dataset: {0}")]
    Polars(#[from] PolarsError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The five summary tables, one per grouping dimension. Each has columns
/// `(index, <dimension_column>, death_count)` with Int64 index and count.
#[derive(Debug, Clone)]
pub struct DeathSummaries {
    pub gender: DataFrame,
    pub age: DataFrame,
    pub financing: DataFrame,
    pub province: DataFrame,
    pub week: DataFrame,
}

impl DeathSummaries {
    pub fn table(&self, dim: Dimension) -> &DataFrame {
        match dim {
            Dimension::Gender => &self.gender,
            Dimension::Age => &self.age,
            Dimension::Financing => &self.financing,
            Dimension::Province => &self.province,
            Dimension::Week => &self.week,
        }
    }
}

/// Aggregate the raw case-level CSV into the five summary tables, persisting
/// each under `summary_dir` and returning them in memory.
///
/// Only the six known columns are materialized from the raw file; the full
/// dataset has tens of millions of rows and many more columns. If any of the
/// six is absent the function fails before writing anything.
pub fn aggregate(raw_path: &Path, summary_dir: &Path) -> Result<DeathSummaries, AggregateError> {
    std::fs::create_dir_all(summary_dir)?;

    info!("loading raw dataset from {}", raw_path.display());
    let mut lf = LazyCsvReader::new(raw_path)
        .with_infer_schema_length(Some(10000))
        .finish()?;

    // Schema check up front: a missing column means the upstream schema
    // changed, and no summary file may be produced.
    let file_schema = lf.collect_schema()?;
    for (raw_name, _) in RAW_COLUMNS {
        if !file_schema.contains(raw_name) {
            return Err(AggregateError::MissingColumn(raw_name.to_string()));
        }
    }

    let renamed: Vec<Expr> = RAW_COLUMNS
        .iter()
        .map(|(raw_name, semantic)| col(*raw_name).alias(*semantic))
        .collect();

    let deaths = lf
        .select(renamed)
        .filter(col(DEATH_COLUMN).eq(lit(DEATH_MARKER)))
        .collect()?;
    info!("{} death records loaded", deaths.height());

    let build = |dim: Dimension| -> Result<DataFrame, AggregateError> {
        let mut table = summarize(&deaths, dim)?;
        let path = summary_dir.join(dim.file_name());
        let mut file = File::create(&path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut table)?;
        info!("wrote {} ({} rows)", path.display(), table.height());
        Ok(table)
    };

    Ok(DeathSummaries {
        gender: build(Dimension::Gender)?,
        age: build(Dimension::Age)?,
        financing: build(Dimension::Financing)?,
        province: build(Dimension::Province)?,
        week: build(Dimension::Week)?,
    })
}

/// Group the death records by one dimension and count rows per key.
///
/// Rows are sorted ascending by the raw key before relabeling, so relabeled
/// values keep the position of their source spelling. Null keys never form a
/// group.
fn summarize(deaths: &DataFrame, dim: Dimension) -> Result<DataFrame, AggregateError> {
    let key = dim.column();

    let mut table = deaths
        .clone()
        .lazy()
        .select([col(key), col(DEATH_COLUMN)])
        .filter(col(key).is_not_null())
        .group_by([col(key)])
        .agg([col(DEATH_COLUMN).count().alias(COUNT_COLUMN)])
        .sort([key], SortMultipleOptions::default())
        .with_row_index(INDEX_COLUMN, None)
        .with_columns([
            col(INDEX_COLUMN).cast(DataType::Int64),
            col(COUNT_COLUMN).cast(DataType::Int64),
        ])
        .select([col(INDEX_COLUMN), col(key), col(COUNT_COLUMN)])
        .collect()?;

    let relabels = dim.relabels();
    if !relabels.is_empty() {
        let relabeled: StringChunked = table
            .column(key)?
            .as_materialized_series()
            .str()?
            .iter()
            .map(|value| value.map(|v| relabel(relabels, v)))
            .collect();
        table.replace(key, relabeled.into_series().with_name(key.into()))?;
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const RAW_FIXTURE: &str = "\
id,sexo,edad,residencia_provincia_nombre,sepi_apertura,fallecido,origen_financiamiento,clasificacion
1,M,45,SIN ESPECIFICAR,10,SI,Privado,Confirmado
2,F,60,Buenos Aires,12,SI,Público,Confirmado
3,M,30,Córdoba,10,NO,Público,Confirmado
4,F,60,Buenos Aires,12,SI,Privado,Confirmado
";

    fn write_fixture(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("Covid19Casos.csv");
        fs::write(&path, RAW_FIXTURE).unwrap();
        path
    }

    fn col_strings(df: &DataFrame, name: &str) -> Vec<String> {
        let series = df.column(name).unwrap().as_materialized_series().clone();
        (0..series.len())
            .map(|i| {
                series
                    .get(i)
                    .unwrap()
                    .to_string()
                    .trim_matches('"')
                    .to_string()
            })
            .collect()
    }

    fn col_i64(df: &DataFrame, name: &str) -> Vec<i64> {
        df.column(name)
            .unwrap()
            .as_materialized_series()
            .i64()
            .unwrap()
            .into_no_null_iter()
            .collect()
    }

    #[test]
    fn test_gender_summary_matches_death_records() {
        let dir = tempfile::tempdir().unwrap();
        let raw = write_fixture(dir.path());
        let out = dir.path().join("csv");

        let summaries = aggregate(&raw, &out).unwrap();
        // Row 3 is not a death; F sorts before M.
        assert_eq!(col_strings(&summaries.gender, "patient_gender"), ["F", "M"]);
        assert_eq!(col_i64(&summaries.gender, COUNT_COLUMN), [2, 1]);
        assert_eq!(col_i64(&summaries.gender, INDEX_COLUMN), [0, 1]);
    }

    #[test]
    fn test_count_conservation_across_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let raw = write_fixture(dir.path());
        let summaries = aggregate(&raw, &dir.path().join("csv")).unwrap();

        for dim in Dimension::ALL {
            let total: i64 = col_i64(summaries.table(dim), COUNT_COLUMN).iter().sum();
            assert_eq!(total, 3, "every dimension must account for all deaths");
        }
    }

    #[test]
    fn test_financing_values_are_translated() {
        let dir = tempfile::tempdir().unwrap();
        let raw = write_fixture(dir.path());
        let summaries = aggregate(&raw, &dir.path().join("csv")).unwrap();

        assert_eq!(
            col_strings(&summaries.financing, "financing_source"),
            ["Private", "Public"]
        );
        assert_eq!(col_i64(&summaries.financing, COUNT_COLUMN), [2, 1]);
    }

    #[test]
    fn test_province_sentinel_is_relabeled_after_sorting() {
        let dir = tempfile::tempdir().unwrap();
        let raw = write_fixture(dir.path());
        let summaries = aggregate(&raw, &dir.path().join("csv")).unwrap();

        // Sorted by the raw spelling, so SIN ESPECIFICAR lands after
        // Buenos Aires and only then becomes Unspecified.
        assert_eq!(
            col_strings(&summaries.province, "residence_province"),
            ["Buenos Aires", "Unspecified"]
        );
        assert_eq!(col_i64(&summaries.province, COUNT_COLUMN), [2, 1]);
    }

    #[test]
    fn test_week_and_age_summaries() {
        let dir = tempfile::tempdir().unwrap();
        let raw = write_fixture(dir.path());
        let summaries = aggregate(&raw, &dir.path().join("csv")).unwrap();

        assert_eq!(col_i64(&summaries.week, "pandemic_week"), [10, 12]);
        assert_eq!(col_i64(&summaries.week, COUNT_COLUMN), [1, 2]);
        assert_eq!(col_i64(&summaries.age, "patient_age"), [45, 60]);
        assert_eq!(col_i64(&summaries.age, COUNT_COLUMN), [1, 2]);
    }

    #[test]
    fn test_aggregation_is_idempotent_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let raw = write_fixture(dir.path());
        let out = dir.path().join("csv");

        aggregate(&raw, &out).unwrap();
        let first: Vec<Vec<u8>> = Dimension::ALL
            .iter()
            .map(|dim| fs::read(out.join(dim.file_name())).unwrap())
            .collect();

        aggregate(&raw, &out).unwrap();
        for (dim, before) in Dimension::ALL.iter().zip(&first) {
            let after = fs::read(out.join(dim.file_name())).unwrap();
            assert_eq!(&after, before, "{} changed between runs", dim.file_name());
        }
    }

    #[test]
    fn test_missing_column_fails_before_any_output() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("Covid19Casos.csv");
        // No `fallecido` column.
        fs::write(&raw, "sexo,edad,residencia_provincia_nombre,sepi_apertura,origen_financiamiento\nF,60,Buenos Aires,12,Público\n").unwrap();
        let out = dir.path().join("csv");

        match aggregate(&raw, &out) {
            Err(AggregateError::MissingColumn(name)) => assert_eq!(name, "fallecido"),
            other => panic!("expected MissingColumn, got {:?}", other.map(|_| ())),
        }
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn test_summary_files_include_index_column() {
        let dir = tempfile::tempdir().unwrap();
        let raw = write_fixture(dir.path());
        let out = dir.path().join("csv");
        aggregate(&raw, &out).unwrap();

        let gender = fs::read_to_string(out.join("gender_death.csv")).unwrap();
        let mut lines = gender.lines();
        assert_eq!(lines.next(), Some("index,patient_gender,death_count"));
        assert_eq!(lines.next(), Some("0,F,2"));
        assert_eq!(lines.next(), Some("1,M,1"));
    }
}
