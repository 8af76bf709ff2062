use serde::Serialize;

use crate::domain::DatasetDescriptor;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogRow {
    pub dataset_name: String,
    pub resource_url: String,
    pub resource_format: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CatalogTable {
    rows: Vec<CatalogRow>,
}

impl CatalogTable {
    pub fn from_rows(rows: Vec<CatalogRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[CatalogRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CatalogRow> {
        self.rows.iter()
    }
}

impl<'a> IntoIterator for &'a CatalogTable {
    type Item = &'a CatalogRow;
    type IntoIter = std::slice::Iter<'a, CatalogRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

pub fn flatten(datasets: &[DatasetDescriptor]) -> CatalogTable {
    let rows = datasets
        .iter()
        .flat_map(|dataset| {
            dataset.resources().iter().map(move |resource| CatalogRow {
                dataset_name: dataset.name().to_string(),
                resource_url: resource.url().to_string(),
                resource_format: resource.format().to_string(),
            })
        })
        .collect();
    CatalogTable { rows }
}

/// Rows whose dataset name contains `dataset_name` (case-insensitive) and, when given,
/// whose format equals `format` (case-insensitive). Dataset names on the portal carry
/// suffixes such as year ranges, so the name is never compared for equality.
pub fn select(table: &CatalogTable, dataset_name: &str, format: Option<&str>) -> CatalogTable {
    let needle = dataset_name.trim().to_lowercase();
    let format = format.map(|value| value.trim().to_lowercase());
    let rows = table
        .iter()
        .filter(|row| row.dataset_name.to_lowercase().contains(&needle))
        .filter(|row| match &format {
            Some(format) => row.resource_format.trim().to_lowercase() == *format,
            None => true,
        })
        .cloned()
        .collect();
    CatalogTable { rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, url: &str, format: &str) -> CatalogRow {
        CatalogRow {
            dataset_name: name.to_string(),
            resource_url: url.to_string(),
            resource_format: format.to_string(),
        }
    }

    #[test]
    fn name_match_ignores_case_and_accents_stay_significant() {
        let table = CatalogTable::from_rows(vec![
            row("CATÁLOGO DE TESES E DISSERTAÇÕES 2013-2016", "http://x/a.csv", "CSV"),
            row("Catalogo de Teses", "http://x/b.csv", "CSV"),
        ]);
        let selected = select(&table, "catálogo de teses", None);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected.rows()[0].resource_url, "http://x/a.csv");
    }

    #[test]
    fn format_match_trims_whitespace() {
        let table = CatalogTable::from_rows(vec![row("Dados", "http://x/a.csv", " csv ")]);
        assert_eq!(select(&table, "dados", Some("CSV")).len(), 1);
    }
}
