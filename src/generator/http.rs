//! Strategy for HTTP scanners (zap, burp, nikto).
//!
//! Alert names map onto canned server-configuration snippets by substring.
//! Alerts outside the table still produce a fix by echoing the scanner's
//! own solution text, flagged as a fallback so downstream consumers can
//! weigh it accordingly.

use super::strategy::{FixStrategy, StrategyOutcome};
use crate::error::Result;
use crate::language::Language;
use crate::models::{
    CodeContext, Complexity, FixApproach, SecurityFix, SecurityImpact, VulnerabilityRecord,
};

struct HeaderFix {
    needles: &'static [&'static str],
    title: &'static str,
    description: &'static str,
    snippet: &'static str,
    explanation: &'static str,
    notes: &'static [&'static str],
}

static HEADER_FIXES: &[HeaderFix] = &[
    HeaderFix {
        needles: &[
            "cors",
            "cross-domain",
            "cross-origin resource sharing",
            "access-control-allow",
        ],
        title: "Restrict CORS to an origin allow-list",
        description: "Serve Access-Control-Allow-Origin only for origins on an explicit allow-list instead of reflecting or wildcarding.",
        snippet: "# Allowlist known origins; never reflect arbitrary ones.\nmap $http_origin $cors_origin {\n    default \"\";\n    \"https://app.example.com\" $http_origin;\n}\nadd_header Access-Control-Allow-Origin $cors_origin always;\nadd_header Vary Origin always;",
        explanation: "A wildcard or reflected Access-Control-Allow-Origin lets any site read authenticated responses. An allow-list keeps cross-origin reads to origins you trust.",
        notes: &[
            "List every legitimate front-end origin in the map",
            "Keep Vary: Origin so caches key on the origin",
        ],
    },
    HeaderFix {
        needles: &["content-type-options", "content type options", "nosniff", "x-content-type"],
        title: "Send X-Content-Type-Options: nosniff",
        description: "Add the nosniff header so browsers honor the declared Content-Type.",
        snippet: "# Security header: browsers must honor the declared content type.\nadd_header X-Content-Type-Options \"nosniff\" always;",
        explanation: "Without nosniff, browsers may sniff responses into executable types, turning uploaded text into same-origin script.",
        notes: &["Serve the header on every response, including errors"],
    },
    HeaderFix {
        needles: &["cache-control", "cache control", "cacheable", "storable"],
        title: "Disable caching of sensitive responses",
        description: "Mark authenticated and sensitive responses non-storable.",
        snippet: "# Security policy: keep authenticated responses out of shared caches.\nadd_header Cache-Control \"no-store, no-cache, must-revalidate\" always;\nadd_header Pragma \"no-cache\" always;",
        explanation: "Shared and browser caches retain anything not marked no-store, so authenticated content can leak to other users of the same cache.",
        notes: &["Scope the header to authenticated routes; static assets should stay cacheable"],
    },
    HeaderFix {
        needles: &[
            "cross-origin-resource-policy",
            "cross origin resource policy",
            "resource policy",
        ],
        title: "Send Cross-Origin-Resource-Policy: same-origin",
        description: "Declare resources same-origin so other origins cannot embed them.",
        snippet: "# Security boundary: serve resources same-origin only.\nadd_header Cross-Origin-Resource-Policy \"same-origin\" always;",
        explanation: "CORP blocks cross-origin no-cors embedding, which cuts off side-channel reads of authenticated resources.",
        notes: &["Use cross-origin only for resources meant to be embedded elsewhere"],
    },
    HeaderFix {
        needles: &["fetch metadata", "sec-fetch"],
        title: "Validate Fetch Metadata request headers",
        description: "Reject cross-site state-changing requests based on Sec-Fetch-Site.",
        snippet: "# Validate Fetch Metadata: reject cross-site state-changing requests.\nif ($http_sec_fetch_site = \"cross-site\") {\n    return 403;\n}",
        explanation: "Sec-Fetch-Site tells the server where a request came from; denying cross-site values blocks CSRF-style traffic before it reaches handlers.",
        notes: &["Exempt endpoints that legitimately serve cross-site traffic"],
    },
];

/// Strategy for tools that probe a running HTTP endpoint.
#[derive(Debug, Default)]
pub struct HttpStrategy;

impl FixStrategy for HttpStrategy {
    fn generate(
        &self,
        record: &VulnerabilityRecord,
        _context: Option<&CodeContext>,
    ) -> Result<StrategyOutcome> {
        let alert = record.alert.as_ref();
        let alert_name = alert.map(|a| a.name.as_str()).unwrap_or(&record.message);
        let needle_haystack = alert_name.to_lowercase();

        let matched = HEADER_FIXES.iter().find(|fix| {
            fix.needles
                .iter()
                .any(|needle| needle_haystack.contains(needle))
        });

        let observed = alert
            .and_then(|a| a.evidence.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("# Observed: {alert_name}"));

        let mut notes: Vec<String> = match matched {
            Some(fix) => fix.notes.iter().map(|n| n.to_string()).collect(),
            None => vec!["Verify the change against a re-scan of the endpoint".to_string()],
        };
        if let Some(url) = alert.and_then(|a| a.url.as_deref()) {
            notes.push(format!("Raised against {url}"));
        }

        let fix = match matched {
            Some(header_fix) => SecurityFix {
                approach: FixApproach::ConfigurationChange,
                title: header_fix.title.to_string(),
                description: header_fix.description.to_string(),
                vulnerable_code: observed,
                fixed_code: header_fix.snippet.to_string(),
                explanation: header_fix.explanation.to_string(),
                benefits: vec![
                    "Server-level change, applies to every route".to_string(),
                    "No application code changes".to_string(),
                ],
                trade_offs: vec!["Must be rolled out to every serving tier".to_string()],
                implementation_notes: notes,
                language: Language::Text,
                framework: None,
                complexity: Complexity::Low,
                security_impact: SecurityImpact::from_severity(record.severity),
            },
            None => SecurityFix {
                approach: FixApproach::ConfigurationChange,
                title: format!("Configuration review: {alert_name}"),
                description: "Apply the scanner-suggested server configuration change.".to_string(),
                vulnerable_code: observed,
                fixed_code: alert
                    .and_then(|a| a.solution.as_deref())
                    .unwrap_or("Review the server configuration for this endpoint.")
                    .to_string(),
                explanation: format!(
                    "The scanner flagged '{alert_name}' without a matching canned \
                     configuration fix; its own remediation guidance is echoed here."
                ),
                benefits: vec!["Follows the scanner's own remediation guidance".to_string()],
                trade_offs: vec![
                    "Guidance is generic; adapt it to the actual server stack".to_string(),
                ],
                implementation_notes: notes,
                language: Language::Text,
                framework: None,
                complexity: Complexity::Low,
                security_impact: SecurityImpact::from_severity(record.severity),
            },
        };

        Ok(match matched {
            Some(_) => StrategyOutcome::curated(vec![fix]),
            None => StrategyOutcome::fallback(vec![fix]),
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}
