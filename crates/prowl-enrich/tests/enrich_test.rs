use async_trait::async_trait;
use prowl_browser::{BrowserActions, BrowserError, Navigation};
use prowl_core::Record;
use prowl_enrich::{
    fetch_funding, lookup_organizations, Crunchbase, CrunchbaseSettings, EnrichError,
    FundingSource, OrganizationLookup, PassSummary,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

fn record(name: &str, website: &str) -> Record {
    Record {
        name: name.to_string(),
        website: website.to_string(),
        is_accessible: Some(true),
        ..Record::default()
    }
}

/// Lookup backed by a table; unknown sites fail, `begin` can be made to fail.
struct TableLookup {
    table: HashMap<&'static str, Option<&'static str>>,
    fail_begin: bool,
}

#[async_trait]
impl OrganizationLookup for TableLookup {
    async fn begin(&self) -> prowl_enrich::Result<()> {
        if self.fail_begin {
            return Err(EnrichError::UnexpectedResponse("captcha".to_string()));
        }
        Ok(())
    }

    async fn lookup_organization(&self, website: &str) -> prowl_enrich::Result<Option<String>> {
        match self.table.get(website) {
            Some(found) => Ok(found.map(ToString::to_string)),
            None => Err(EnrichError::UnexpectedResponse(website.to_string())),
        }
    }
}

/// Funding backed by a table that records each visit.
#[derive(Default)]
struct TableFunding {
    table: HashMap<&'static str, Option<&'static str>>,
    visits: Mutex<Vec<String>>,
}

#[async_trait]
impl FundingSource for TableFunding {
    async fn fetch_funding(&self, organization_url: &str) -> prowl_enrich::Result<Option<String>> {
        self.visits
            .lock()
            .unwrap()
            .push(organization_url.to_string());
        match self.table.get(organization_url) {
            Some(amount) => Ok(amount.map(ToString::to_string)),
            None => Err(EnrichError::UnexpectedResponse("page crashed".to_string())),
        }
    }
}

#[tokio::test]
async fn test_lookup_sets_match_or_empty() {
    let lookup = TableLookup {
        table: HashMap::from([
            ("https://acme.io/", Some("https://cb/organization/acme")),
            ("https://nobody.io/", None),
        ]),
        fail_begin: false,
    };
    let mut records = vec![
        record("Acme", "https://acme.io/"),
        record("Nobody", "https://nobody.io/"),
        record("Broken", "https://broken.io/"),
        record("Blank", ""),
    ];

    let summary = lookup_organizations(&mut records, &lookup).await;

    assert_eq!(
        summary,
        PassSummary {
            attempted: 4,
            found: 1,
            failed: 1,
        }
    );
    assert_eq!(
        records[0].organization_url.as_deref(),
        Some("https://cb/organization/acme")
    );
    assert_eq!(records[1].organization_url.as_deref(), Some(""));
    assert_eq!(records[2].organization_url.as_deref(), Some(""));
    assert_eq!(records[3].organization_url.as_deref(), Some(""));
}

#[tokio::test]
async fn test_lookup_session_failure_marks_everything_empty() {
    let lookup = TableLookup {
        table: HashMap::new(),
        fail_begin: true,
    };
    let mut records = vec![record("A", "https://a.io/"), record("B", "https://b.io/")];

    let summary = lookup_organizations(&mut records, &lookup).await;

    assert_eq!(summary.failed, 2);
    assert!(records
        .iter()
        .all(|r| r.organization_url.as_deref() == Some("")));
}

#[tokio::test]
async fn test_funding_visits_each_organization_once() {
    let funding = TableFunding {
        table: HashMap::from([
            ("https://cb/organization/acme", Some("$12M")),
            ("https://cb/organization/beta", None),
        ]),
        ..TableFunding::default()
    };

    let mut records = vec![
        record("Acme", "https://acme.io/"),
        record("Acme Pro", "https://pro.acme.io/"),
        record("Beta", "https://beta.io/"),
        record("Solo", "https://solo.io/"),
        record("Crash", "https://crash.io/"),
    ];
    records[0].organization_url = Some("https://cb/organization/acme".to_string());
    records[1].organization_url = Some("https://cb/organization/acme".to_string());
    records[2].organization_url = Some("https://cb/organization/beta".to_string());
    records[3].organization_url = Some(String::new());
    records[4].organization_url = Some("https://cb/organization/crash".to_string());

    let summary = fetch_funding(&mut records, &funding).await;

    assert_eq!(
        *funding.visits.lock().unwrap(),
        vec![
            "https://cb/organization/acme".to_string(),
            "https://cb/organization/beta".to_string(),
            "https://cb/organization/crash".to_string(),
        ]
    );
    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.found, 1);
    assert_eq!(summary.failed, 1);

    assert_eq!(records[0].funding_amount.as_deref(), Some("$12M"));
    assert_eq!(records[1].organization_url.as_deref(), Some(""));
    assert_eq!(records[1].funding_amount.as_deref(), Some(""));
    assert_eq!(records[2].funding_amount.as_deref(), Some(""));
    assert_eq!(records[3].funding_amount.as_deref(), Some(""));
    assert_eq!(records[4].funding_amount.as_deref(), Some(""));
}

/// Browser double for the Crunchbase backend.
#[derive(Default)]
struct FakeSite {
    navigations: Mutex<Vec<String>>,
    expressions: Mutex<Vec<String>>,
    autocomplete: Value,
    funding_texts: Vec<String>,
}

#[async_trait]
impl BrowserActions for FakeSite {
    async fn navigate(&self, url: &str) -> prowl_browser::Result<Navigation> {
        self.navigations.lock().unwrap().push(url.to_string());
        if url.contains("unreachable") {
            return Err(BrowserError::Timeout(url.to_string()));
        }
        Ok(Navigation {
            final_url: url.to_string(),
            status: Some(200),
        })
    }

    async fn evaluate(&self, expression: &str) -> prowl_browser::Result<Value> {
        self.expressions
            .lock()
            .unwrap()
            .push(expression.to_string());
        Ok(self.autocomplete.clone())
    }

    async fn extract_texts(&self, selector: &str) -> prowl_browser::Result<Vec<String>> {
        assert_eq!(selector, "#overview_funding a");
        Ok(self.funding_texts.clone())
    }
}

fn settings() -> CrunchbaseSettings {
    CrunchbaseSettings {
        base_url: "https://www.crunchbase.com".to_string(),
        settle_delay: Duration::from_secs(3),
    }
}

#[tokio::test(start_paused = true)]
async fn test_crunchbase_lookup_through_browser() {
    let site = FakeSite {
        autocomplete: json!({
            "count": 1,
            "entities": [{ "identifier": { "permalink": "acme-inc" } }]
        }),
        ..FakeSite::default()
    };
    let crunchbase = Crunchbase::new(site, settings());

    crunchbase.begin().await.unwrap();
    let found = crunchbase
        .lookup_organization("https://acme.io/")
        .await
        .unwrap();

    assert_eq!(
        found.as_deref(),
        Some("https://www.crunchbase.com/organization/acme-inc")
    );

    let site = crunchbase.into_inner();
    assert_eq!(
        *site.navigations.lock().unwrap(),
        vec!["https://www.crunchbase.com".to_string()]
    );
    let expressions = site.expressions.lock().unwrap();
    assert!(expressions[0].contains("/v4/data/autocompletes?query=https%3A%2F%2Facme.io%2F"));
}

#[tokio::test(start_paused = true)]
async fn test_crunchbase_funding_waits_then_reads_page() {
    let site = FakeSite {
        funding_texts: vec!["Series B".to_string(), " $40M ".to_string()],
        ..FakeSite::default()
    };
    let crunchbase = Crunchbase::new(site, settings());

    let started = tokio::time::Instant::now();
    let amount = crunchbase
        .fetch_funding("https://www.crunchbase.com/organization/acme")
        .await
        .unwrap();

    assert_eq!(amount.as_deref(), Some("$40M"));
    assert!(started.elapsed() >= Duration::from_secs(3));
}

#[tokio::test]
async fn test_crunchbase_funding_navigation_failure_is_an_error() {
    let crunchbase = Crunchbase::new(FakeSite::default(), settings());
    let result = crunchbase
        .fetch_funding("https://www.crunchbase.com/organization/unreachable")
        .await;
    assert!(matches!(result, Err(EnrichError::Browser(_))));
}

#[tokio::test]
async fn test_crunchbase_open_login() {
    let crunchbase = Crunchbase::new(FakeSite::default(), settings());
    crunchbase.open_login().await.unwrap();
    let site = crunchbase.into_inner();
    assert_eq!(
        *site.navigations.lock().unwrap(),
        vec!["https://www.crunchbase.com/login".to_string()]
    );
}
