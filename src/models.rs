use serde::Deserialize;

/// One element of the endpoint's `data` array, as the API returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawListing {
    pub job_title: String,
    pub employer_name: String,
    pub job_employment_type: String,
    pub job_description: String,
    pub job_apply_link: String,
}

/// One job posting ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct JobListing {
    pub title: String,
    pub employer: String,
    pub employment_type: String,
    pub description: String, // newlines stripped
    pub apply_url: String,
}

impl From<RawListing> for JobListing {
    fn from(raw: RawListing) -> Self {
        Self {
            title: capitalize(&raw.job_title),
            employer: capitalize(&raw.employer_name),
            employment_type: capitalize(&raw.job_employment_type),
            description: raw.job_description.replace('\n', ""),
            apply_url: raw.job_apply_link,
        }
    }
}

/// Uppercase the first character, lowercase everything after it.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("engineer"), "Engineer");
        assert_eq!(capitalize("full_time"), "Full_time");
        assert_eq!(capitalize("ACME CORP"), "Acme corp");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("x"), "X");
    }

    #[test]
    fn test_listing_from_raw() {
        let raw = RawListing {
            job_title: "engineer".to_string(),
            employer_name: "acme".to_string(),
            job_employment_type: "full_time".to_string(),
            job_description: "build stuff\nfast".to_string(),
            job_apply_link: "https://x/1".to_string(),
        };
        let listing = JobListing::from(raw);
        assert_eq!(listing.title, "Engineer");
        assert_eq!(listing.employer, "Acme");
        assert_eq!(listing.employment_type, "Full_time");
        // Newline removed with no space inserted.
        assert_eq!(listing.description, "build stufffast");
        assert_eq!(listing.apply_url, "https://x/1");
    }
}
