//! Dataset Schema Module
//! Fixed column mappings, grouping dimensions and value relabel tables for
//! the Covid19Casos case-level dataset.

/// The six raw CSV columns the pipeline reads, paired with the stable
/// semantic names used everywhere downstream. The raw identifiers must match
/// the upstream schema exactly; a missing column is a fatal schema mismatch.
pub const RAW_COLUMNS: [(&str, &str); 6] = [
    ("sexo", "patient_gender"),
    ("edad", "patient_age"),
    ("residencia_provincia_nombre", "residence_province"),
    ("sepi_apertura", "pandemic_week"),
    ("fallecido", "patient_death"),
    ("origen_financiamiento", "financing_source"),
];

/// Semantic name of the death-flag column.
pub const DEATH_COLUMN: &str = "patient_death";

/// Exact token marking a fatal case in the raw data (case-sensitive).
pub const DEATH_MARKER: &str = "SI";

/// Count column in every summary table.
pub const COUNT_COLUMN: &str = "death_count";

/// Row-index column persisted alongside every summary table.
pub const INDEX_COLUMN: &str = "index";

/// Financing-source labels translated from Spanish. Values not listed here
/// pass through unchanged.
pub const FINANCING_RELABELS: &[(&str, &str)] = &[("Privado", "Private"), ("Público", "Public")];

/// Province relabels: the upstream "unspecified" sentinel only. Values not
/// listed here pass through unchanged.
pub const PROVINCE_RELABELS: &[(&str, &str)] = &[("SIN ESPECIFICAR", "Unspecified")];

/// One grouping dimension of the death summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Gender,
    Age,
    Financing,
    Province,
    Week,
}

impl Dimension {
    /// All five dimensions, in summary-generation order.
    pub const ALL: [Dimension; 5] = [
        Dimension::Gender,
        Dimension::Age,
        Dimension::Financing,
        Dimension::Province,
        Dimension::Week,
    ];

    /// Semantic column name of this dimension in the renamed dataset.
    pub fn column(self) -> &'static str {
        match self {
            Dimension::Gender => "patient_gender",
            Dimension::Age => "patient_age",
            Dimension::Financing => "financing_source",
            Dimension::Province => "residence_province",
            Dimension::Week => "pandemic_week",
        }
    }

    /// File name of the cached summary table for this dimension.
    pub fn file_name(self) -> &'static str {
        match self {
            Dimension::Gender => "gender_death.csv",
            Dimension::Age => "age_death.csv",
            Dimension::Financing => "financing_source.csv",
            Dimension::Province => "province_deaths.csv",
            Dimension::Week => "week_deaths.csv",
        }
    }

    /// Post-aggregation value relabels for this dimension. Empty slice means
    /// every value passes through unchanged.
    pub fn relabels(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Dimension::Financing => FINANCING_RELABELS,
            Dimension::Province => PROVINCE_RELABELS,
            _ => &[],
        }
    }
}

/// Look a value up in a relabel table, falling back to the value itself.
pub fn relabel<'a>(table: &[(&str, &'a str)], value: &'a str) -> &'a str {
    table
        .iter()
        .find(|(from, _)| *from == value)
        .map(|(_, to)| *to)
        .unwrap_or(value)
}
