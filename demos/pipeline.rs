//! Walkthrough of the fix pipeline over a small sample project.
//!
//! Builds a throwaway project in a temp directory, feeds one finding from
//! each scanner family through the pipeline, and prints what survived
//! assessment.
//!
//! Run with:
//! ```bash
//! cargo run --example pipeline
//! ```

use vulnera_fixgen::models::{
    AffectedRange, DependencyInfo, HttpAlertInfo, IacRuleInfo, RangeEvent, RangeType, Severity,
    VulnerabilityRecord,
};
use vulnera_fixgen::{FixPipeline, PipelineConfig};

fn main() -> anyhow::Result<()> {
    let project = tempfile::tempdir()?;
    std::fs::create_dir_all(project.path().join("app"))?;
    std::fs::write(
        project.path().join("app/render.js"),
        "function render(input) {\n  element.innerHTML = input;\n}\n",
    )?;
    std::fs::create_dir_all(project.path().join(".github/workflows"))?;
    std::fs::write(
        project.path().join(".github/workflows/ci.yml"),
        "name: ci\npermissions: write-all\non: push\n",
    )?;

    let config = PipelineConfig {
        project_root: Some(project.path().to_path_buf()),
        ..PipelineConfig::from_env()?
    };

    // Hold the guard until the end of main so file logs flush.
    let _guard = vulnera_fixgen::logging::init_logging(&config);

    let pipeline = FixPipeline::new(&config)?;
    let records = sample_records();

    println!("=== Vulnerability-to-Fix Walkthrough ===\n");
    for record in &records {
        let report = pipeline.process(record)?;
        println!(
            "--- {} [{}] -> strategy {}, type {:?} ---",
            report.record_id, record.tool, report.strategy, report.vulnerability_type
        );
        match report.resolution.context() {
            Some(context) => println!(
                "resolved {}:{} ({})",
                context.file_path.display(),
                context.line,
                context.language.name()
            ),
            None => println!("no source behind this finding"),
        }
        println!(
            "{} candidate(s) generated, {} kept",
            report.generated,
            report.fixes.len()
        );
        for (fix, assessment) in &report.fixes {
            println!(
                "  [{}] {} (overall {:.2}, security {:.2})",
                fix.approach.display_name(),
                fix.title,
                assessment.overall_score,
                assessment.security_score
            );
        }
        println!();
    }

    println!("=== Batch run over the same records ===");
    let stats = pipeline.process_batch(&records);
    println!(
        "total {}, resolved {}, no-source {}, failed {}",
        stats.total, stats.resolved, stats.no_source, stats.failed
    );
    println!(
        "fixes: {} generated, {} kept, {} fallback record(s)",
        stats.fixes_generated, stats.fixes_kept, stats.fallbacks
    );

    Ok(())
}

fn sample_records() -> Vec<VulnerabilityRecord> {
    let base = VulnerabilityRecord {
        id: String::new(),
        tool: String::new(),
        severity: Severity::High,
        file_path: None,
        line: None,
        column: None,
        message: String::new(),
        description: None,
        dependency: None,
        alert: None,
        rule: None,
        detected_at: None,
    };

    vec![
        // Static-analyzer finding with real source behind it.
        VulnerabilityRecord {
            id: "semgrep-xss-001".to_string(),
            tool: "semgrep".to_string(),
            file_path: Some("app/render.js".to_string()),
            line: Some(2),
            message: "Cross-site scripting: untrusted value assigned to innerHTML".to_string(),
            ..base.clone()
        },
        // Dependency auditor finding with structured version data.
        VulnerabilityRecord {
            id: "CVE-2021-23337".to_string(),
            tool: "trivy".to_string(),
            file_path: Some("node_modules/lodash/package.json".to_string()),
            message: "lodash command injection via template".to_string(),
            dependency: Some(DependencyInfo {
                ecosystem: "npm".to_string(),
                package: "lodash".to_string(),
                installed_version: Some("4.17.11".to_string()),
                fixed_version: None,
                affected: vec![AffectedRange {
                    range_type: RangeType::Semver,
                    events: vec![
                        RangeEvent::Introduced("0".to_string()),
                        RangeEvent::Fixed("4.17.12".to_string()),
                        RangeEvent::Fixed("4.17.21".to_string()),
                    ],
                    repo: None,
                }],
            }),
            ..base.clone()
        },
        // HTTP scanner alert against a running endpoint.
        VulnerabilityRecord {
            id: "zap-10098".to_string(),
            tool: "zap".to_string(),
            severity: Severity::Medium,
            file_path: Some("https://api.example.com/v1/users".to_string()),
            message: "Cross-Domain Misconfiguration".to_string(),
            alert: Some(HttpAlertInfo {
                name: "CORS Misconfiguration".to_string(),
                solution: None,
                evidence: Some("Access-Control-Allow-Origin: *".to_string()),
                url: Some("https://api.example.com/v1/users".to_string()),
            }),
            ..base.clone()
        },
        // IaC linter finding on a workflow file.
        VulnerabilityRecord {
            id: "checkov-gha-1".to_string(),
            tool: "checkov".to_string(),
            file_path: Some(".github/workflows/ci.yml".to_string()),
            line: Some(2),
            message: "Ensure top-level permissions are not set to write-all".to_string(),
            rule: Some(IacRuleInfo {
                rule_id: "CKV2_GHA_1".to_string(),
                message: Some("Ensure top-level permissions are not set to write-all".to_string()),
                resource: Some("jobs".to_string()),
            }),
            ..base
        },
    ]
}
