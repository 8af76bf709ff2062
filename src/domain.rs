use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

pub const THESES_CATALOG_NAME: &str = "Catálogo de Teses e Dissertações";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceDescriptor {
    url: String,
    format: String,
}

impl ResourceDescriptor {
    pub fn new(url: impl Into<String>, format: impl Into<String>) -> Result<Self, CatalogError> {
        let url = url.into().trim().to_string();
        if url.is_empty() {
            return Err(CatalogError::Validation("resource without url".to_string()));
        }
        Ok(Self {
            url,
            format: format.into().trim().to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn format(&self) -> &str {
        &self.format
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetDescriptor {
    name: String,
    resources: Vec<ResourceDescriptor>,
}

impl DatasetDescriptor {
    pub fn new(
        name: impl Into<String>,
        resources: Vec<ResourceDescriptor>,
    ) -> Result<Self, CatalogError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(CatalogError::Validation("dataset without name".to_string()));
        }
        Ok(Self { name, resources })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resources(&self) -> &[ResourceDescriptor] {
        &self.resources
    }
}

#[derive(Debug, Deserialize)]
struct PackageSearchResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    result: Option<PackageSearchResult>,
}

#[derive(Debug, Deserialize)]
struct PackageSearchResult {
    #[serde(default)]
    results: Option<Vec<RawPackage>>,
}

#[derive(Debug, Deserialize)]
struct RawPackage {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    resources: Option<Vec<RawResource>>,
}

#[derive(Debug, Deserialize)]
struct RawResource {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    format: Option<String>,
}

pub fn parse_package_search(body: &str) -> Result<Vec<DatasetDescriptor>, CatalogError> {
    let response: PackageSearchResponse =
        serde_json::from_str(body).map_err(|err| CatalogError::CatalogParse(err.to_string()))?;
    if response.success == Some(false) {
        return Err(CatalogError::CatalogParse(
            "portal reported success=false".to_string(),
        ));
    }
    let packages = response
        .result
        .and_then(|result| result.results)
        .ok_or_else(|| CatalogError::CatalogParse("missing result.results".to_string()))?;

    packages
        .into_iter()
        .enumerate()
        .map(|(index, package)| package.into_descriptor(index))
        .collect()
}

impl RawPackage {
    fn into_descriptor(self, index: usize) -> Result<DatasetDescriptor, CatalogError> {
        let name = self
            .title
            .filter(|title| !title.trim().is_empty())
            .or(self.name)
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| {
                CatalogError::Validation(format!("dataset #{index} has neither title nor name"))
            })?;
        let raw_resources = self.resources.ok_or_else(|| {
            CatalogError::Validation(format!("dataset '{name}' has no resources field"))
        })?;

        let resources = raw_resources
            .into_iter()
            .enumerate()
            .map(|(position, resource)| {
                let url = resource.url.filter(|url| !url.trim().is_empty()).ok_or_else(|| {
                    CatalogError::Validation(format!(
                        "resource #{position} of '{name}' has no url"
                    ))
                })?;
                let format = resource.format.ok_or_else(|| {
                    CatalogError::Validation(format!("resource {url} of '{name}' has no format"))
                })?;
                ResourceDescriptor::new(url, format)
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        DatasetDescriptor::new(name, resources)
    }
}
