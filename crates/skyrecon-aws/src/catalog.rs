//! Volume type catalog and size validation

use serde::{Deserialize, Serialize};
use skyrecon_core::{ReconError, Result};

/// Size bounds of one volume type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskTypeSpec {
    pub name: String,
    pub min_gb: u32,
    pub max_gb: u32,
}

impl DiskTypeSpec {
    pub fn new(name: &str, min_gb: u32, max_gb: u32) -> Self {
        Self {
            name: name.to_string(),
            min_gb,
            max_gb,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskCatalog {
    /// Type used when a request leaves the type empty or `default`
    pub default_type: String,
    pub types: Vec<DiskTypeSpec>,
}

impl Default for DiskCatalog {
    fn default() -> Self {
        Self {
            default_type: "gp3".to_string(),
            types: vec![
                DiskTypeSpec::new("standard", 10, 1024),
                DiskTypeSpec::new("gp2", 10, 16384),
                DiskTypeSpec::new("gp3", 10, 16384),
                DiskTypeSpec::new("io1", 4, 16384),
                DiskTypeSpec::new("io2", 4, 16384),
                DiskTypeSpec::new("st1", 125, 16384),
                DiskTypeSpec::new("sc1", 125, 16384),
            ],
        }
    }
}

fn is_default(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case("default")
}

impl DiskCatalog {
    pub fn spec(&self, disk_type: &str) -> Option<&DiskTypeSpec> {
        self.types
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(disk_type))
    }

    fn type_names(&self) -> String {
        self.types
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Resolve the type and size of a create request
    pub fn validate_create(&self, disk_type: &str, disk_size: &str) -> Result<(String, u32)> {
        let type_name = if is_default(disk_type) {
            self.default_type.as_str()
        } else {
            disk_type.trim()
        };

        let spec = self.spec(type_name).ok_or_else(|| {
            ReconError::validation(format!(
                "invalid disk type '{}', supported types: {}",
                type_name,
                self.type_names()
            ))
        })?;

        if is_default(disk_size) {
            return Ok((spec.name.clone(), spec.min_gb));
        }

        let size = parse_size(disk_size)?;
        check_range(spec, size)?;
        Ok((spec.name.clone(), size))
    }

    /// Validate a resize of a `disk_type` volume currently `current_gb` large
    pub fn validate_resize(&self, disk_type: &str, current_gb: u32, new_size: &str) -> Result<u32> {
        let size = parse_size(new_size)?;
        if size <= current_gb {
            return Err(ReconError::validation(format!(
                "new disk size {} GB must be larger than the current size {} GB",
                size, current_gb
            )));
        }
        if let Some(spec) = self.spec(disk_type) {
            check_range(spec, size)?;
        }
        Ok(size)
    }
}

fn parse_size(value: &str) -> Result<u32> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| ReconError::validation(format!("invalid disk size '{}'", value)))
}

fn check_range(spec: &DiskTypeSpec, size: u32) -> Result<()> {
    if size < spec.min_gb {
        return Err(ReconError::validation(format!(
            "{} disk size must be at least {} GB, got {}",
            spec.name, spec.min_gb, size
        )));
    }
    if size > spec.max_gb {
        return Err(ReconError::validation(format!(
            "{} disk size must be at most {} GB, got {}",
            spec.name, spec.max_gb, size
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let catalog = DiskCatalog::default();
        assert_eq!(catalog.validate_create("", "").unwrap(), ("gp3".to_string(), 10));
        assert_eq!(
            catalog.validate_create("default", "Default").unwrap(),
            ("gp3".to_string(), 10)
        );
        assert_eq!(catalog.validate_create("st1", "").unwrap(), ("st1".to_string(), 125));
    }

    #[test]
    fn test_range_checks() {
        let catalog = DiskCatalog::default();
        assert_eq!(catalog.validate_create("gp3", "20").unwrap().1, 20);
        assert_eq!(catalog.validate_create("gp3", "10").unwrap().1, 10);
        assert!(matches!(
            catalog.validate_create("gp3", "5"),
            Err(ReconError::Validation(_))
        ));
        assert!(catalog.validate_create("gp2", "9").is_err());
        assert!(catalog.validate_create("gp3", "0").is_err());
        assert!(catalog.validate_create("st1", "100").is_err());
        assert!(catalog.validate_create("standard", "2048").is_err());
        assert!(catalog.validate_create("gp3", "twenty").is_err());
        assert!(catalog.validate_create("nvme", "20").is_err());
    }

    #[test]
    fn test_resize_must_grow() {
        let catalog = DiskCatalog::default();
        assert_eq!(catalog.validate_resize("gp3", 20, "40").unwrap(), 40);
        assert!(catalog.validate_resize("gp3", 20, "20").is_err());
        assert!(catalog.validate_resize("gp3", 20, "10").is_err());
        assert!(catalog.validate_resize("standard", 20, "4096").is_err());
    }
}
