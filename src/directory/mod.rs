pub mod recommend;

use once_cell::sync::Lazy;
use serde::{ Deserialize, Serialize };
use std::fs;
use std::path::Path;
use thiserror::Error;
use log::info;

/// Upper bound on providers listed in one recommendation.
pub const MAX_RECOMMENDATIONS: usize = 3;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Failed to read directory file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse directory file '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Directory file '{0}' contains no businesses")]
    Empty(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessRecord {
    pub name: String,
    pub rating: f32,
    pub price: String,
    pub available_time: String,
    pub phone: String,
    pub services: Vec<String>,
}

impl BusinessRecord {
    fn new(
        name: &str,
        rating: f32,
        price: &str,
        available_time: &str,
        phone: &str,
        services: &[&str]
    ) -> Self {
        Self {
            name: name.to_string(),
            rating,
            price: price.to_string(),
            available_time: available_time.to_string(),
            phone: phone.to_string(),
            services: services
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// True when one of the service tags appears inside `problem_type`, ignoring case.
    pub fn serves(&self, problem_type: &str) -> bool {
        let problem = problem_type.to_lowercase();
        self.services
            .iter()
            .map(|service| service.trim().to_lowercase())
            .any(|service| !service.is_empty() && problem.contains(&service))
    }
}

static BUILTIN_RECORDS: Lazy<Vec<BusinessRecord>> = Lazy::new(|| {
    vec![
        BusinessRecord::new(
            "Quick Fix Appliances",
            4.8,
            "$80-120",
            "Today, 2-4 PM",
            "(555) 123-4567",
            &["washer", "dryer", "dishwasher", "refrigerator"]
        ),
        BusinessRecord::new(
            "Pro Appliance Repair",
            4.6,
            "$70-100",
            "Tomorrow, 9-11 AM",
            "(555) 234-5678",
            &["washer", "dryer", "stove", "oven"]
        ),
        BusinessRecord::new(
            "Expert Home Services",
            4.9,
            "$90-130",
            "Today, 5-7 PM",
            "(555) 345-6789",
            &["washer", "dryer", "dishwasher", "refrigerator", "stove"]
        )
    ]
});

/// Read-only list of service providers shared by every request.
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceDirectory {
    records: Vec<BusinessRecord>,
}

impl Default for ServiceDirectory {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ServiceDirectory {
    pub fn new(records: Vec<BusinessRecord>) -> Self {
        Self { records }
    }

    pub fn builtin() -> Self {
        Self::new(BUILTIN_RECORDS.clone())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DirectoryError> {
        let display = path.as_ref().display().to_string();
        let text = fs::read_to_string(&path).map_err(|source| DirectoryError::Io {
            path: display.clone(),
            source,
        })?;
        let records: Vec<BusinessRecord> = serde_json
            ::from_str(&text)
            .map_err(|source| DirectoryError::Json { path: display.clone(), source })?;
        if records.is_empty() {
            return Err(DirectoryError::Empty(display));
        }
        info!("Loaded {} businesses from {}", records.len(), display);
        Ok(Self::new(records))
    }

    /// Builtin list unless a directory file is configured.
    pub fn from_optional_path(path: Option<&str>) -> Result<Self, DirectoryError> {
        match path.map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => Self::load(p),
            None => Ok(Self::builtin()),
        }
    }

    pub fn records(&self) -> &[BusinessRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Providers serving `problem_type`, in directory order, capped at [`MAX_RECOMMENDATIONS`].
    pub fn find_matching(&self, problem_type: &str) -> Vec<&BusinessRecord> {
        self.records
            .iter()
            .filter(|record| record.serves(problem_type))
            .take(MAX_RECOMMENDATIONS)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(records: &[&BusinessRecord]) -> Vec<String> {
        records.iter().map(|r| r.name.clone()).collect()
    }

    #[test]
    fn builtin_has_three_fixed_records() {
        let directory = ServiceDirectory::builtin();
        assert_eq!(directory.len(), 3);
        let first = &directory.records()[0];
        assert_eq!(first.name, "Quick Fix Appliances");
        assert_eq!(first.price, "$80-120");
        assert_eq!(first.phone, "(555) 123-4567");
    }

    #[test]
    fn matches_service_tag_inside_problem_case_insensitively() {
        let directory = ServiceDirectory::builtin();
        let matches = directory.find_matching("My OVEN won't heat up");
        assert_eq!(names(&matches), vec!["Pro Appliance Repair"]);

        let matches = directory.find_matching("Refrigerator not cooling");
        assert_eq!(names(&matches), vec!["Quick Fix Appliances", "Expert Home Services"]);

        // "dishwasher" contains the "washer" tag every record carries.
        let matches = directory.find_matching("Leaking Dishwasher");
        assert_eq!(
            names(&matches),
            vec!["Quick Fix Appliances", "Pro Appliance Repair", "Expert Home Services"]
        );
    }

    #[test]
    fn no_overlap_yields_nothing() {
        let directory = ServiceDirectory::builtin();
        assert!(directory.find_matching("roof leak").is_empty());
        assert!(directory.find_matching("").is_empty());
    }

    #[test]
    fn caps_results_and_keeps_directory_order() {
        let mut records = ServiceDirectory::builtin().records().to_vec();
        records.push(
            BusinessRecord::new("Fourth Washer Co", 4.1, "$50-60", "Friday", "(555) 000-0000", &[
                "washer",
            ])
        );
        let directory = ServiceDirectory::new(records);
        let matches = directory.find_matching("washer");
        assert_eq!(matches.len(), MAX_RECOMMENDATIONS);
        assert_eq!(
            names(&matches),
            vec!["Quick Fix Appliances", "Pro Appliance Repair", "Expert Home Services"]
        );
    }

    #[test]
    fn loads_records_from_json_file() {
        let path = std::env::temp_dir().join(format!("directory-{}.json", uuid::Uuid::new_v4()));
        fs::write(
            &path,
            r#"[{"name":"Drain Doctors","rating":4.2,"price":"$60-90","availableTime":"Today","phone":"(555) 999-0000","services":["sink","drain"]}]"#
        ).unwrap();

        let directory = ServiceDirectory::from_optional_path(path.to_str()).unwrap();
        assert_eq!(directory.len(), 1);
        assert_eq!(names(&directory.find_matching("clogged drain")), vec!["Drain Doctors"]);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn rejects_empty_or_missing_files() {
        let path = std::env::temp_dir().join(format!("directory-{}.json", uuid::Uuid::new_v4()));
        fs::write(&path, "[]").unwrap();
        assert!(matches!(ServiceDirectory::load(&path), Err(DirectoryError::Empty(_))));
        fs::remove_file(&path).unwrap();

        assert!(matches!(ServiceDirectory::load(&path), Err(DirectoryError::Io { .. })));
        assert_eq!(ServiceDirectory::from_optional_path(Some("  ")).unwrap().len(), 3);
    }
}
