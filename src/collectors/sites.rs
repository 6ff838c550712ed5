use crate::collectors::scrape::{LinkStyle, Paging, SearchParams, Selectors, SiteConfig};
use crate::dates::DateStyle;

const LOCATION: &str = "United Kingdom";

/// Every scraped board, in the order they are tried.
pub fn all() -> Vec<SiteConfig> {
    vec![indeed_uk(), reed(), totaljobs(), cwjobs()]
}

pub fn indeed_uk() -> SiteConfig {
    SiteConfig {
        name: "Indeed UK",
        base_url: "https://www.indeed.co.uk".to_string(),
        search_url: "https://www.indeed.co.uk/jobs".to_string(),
        selectors: Selectors {
            job_list: ".jobsearch-ResultsList > li",
            title: ".jobTitle",
            company: ".companyName",
            location: ".companyLocation",
            salary: ".salaryText",
            description: ".job-snippet",
            apply_link: ".jobTitleLink, a[data-jk]",
            date: ".date",
        },
        params: SearchParams {
            query_key: "q",
            location_key: "l",
            location: LOCATION,
            paging: Paging::Offset {
                key: "start",
                per_page: 10,
            },
        },
        link: LinkStyle::JobKey {
            key_selectors: &["a[data-jk]", ".jobTitle"],
            view_url: "https://www.indeed.co.uk/viewjob",
            suffix: "&from=serp&vjs=3",
        },
        date_style: DateStyle::Indeed,
    }
}

pub fn reed() -> SiteConfig {
    SiteConfig {
        name: "Reed",
        base_url: "https://www.reed.co.uk".to_string(),
        search_url: "https://www.reed.co.uk/jobs".to_string(),
        selectors: Selectors {
            job_list: ".job-card",
            title: ".job-card__title",
            company: ".job-card__company-name",
            location: ".job-card__location",
            salary: ".job-card__salary",
            description: ".job-card__description",
            apply_link: ".job-card__link",
            date: ".job-card__posted-date",
        },
        params: SearchParams {
            query_key: "query",
            location_key: "location",
            location: LOCATION,
            paging: Paging::Page { key: "page" },
        },
        link: LinkStyle::Href,
        date_style: DateStyle::Reed,
    }
}

pub fn totaljobs() -> SiteConfig {
    card_board("TotalJobs", "https://www.totaljobs.com")
}

pub fn cwjobs() -> SiteConfig {
    card_board("CWJobs", "https://www.cwjobs.co.uk")
}

// TotalJobs and CWJobs run on the same platform and share markup.
fn card_board(name: &'static str, base_url: &str) -> SiteConfig {
    SiteConfig {
        name,
        base_url: base_url.to_string(),
        search_url: format!("{base_url}/jobs"),
        selectors: Selectors {
            job_list: ".job-card",
            title: ".job-title",
            company: ".company-name",
            location: ".location",
            salary: ".salary",
            description: ".job-description",
            apply_link: "a.job-card__link",
            date: ".posted-date",
        },
        params: SearchParams {
            query_key: "keywords",
            location_key: "location",
            location: LOCATION,
            paging: Paging::Page { key: "page" },
        },
        link: LinkStyle::Href,
        date_style: DateStyle::Generic,
    }
}
