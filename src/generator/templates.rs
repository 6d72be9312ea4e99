//! Fix templates and the text transforms that instantiate them.
//!
//! Templates are keyed by `(vulnerability type, approach)`, falling back to
//! approach-only templates and finally to a generic placeholder. The table
//! is built once and never mutated. Template text uses `#` line comments;
//! the generic strategy rewrites them to the target language's comment
//! style.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::models::{Complexity, FixApproach, VulnerabilityType};

/// An ordered text rewrite applied to the vulnerable code.
#[derive(Debug, Clone, Copy)]
pub(crate) enum TextTransform {
    /// Replace every regex match with literal text.
    ReplacePattern {
        pattern: &'static str,
        replacement: &'static str,
    },
    /// Surround the whole snippet.
    Wrap {
        prefix: &'static str,
        suffix: &'static str,
    },
    /// Add a block before the snippet.
    Prepend(&'static str),
    /// Add a block after the snippet.
    Append(&'static str),
}

/// A reusable fix recipe.
#[derive(Debug)]
pub(crate) struct FixTemplate {
    pub(crate) title: &'static str,
    pub(crate) description: &'static str,
    pub(crate) explanation: &'static str,
    pub(crate) benefits: &'static [&'static str],
    pub(crate) trade_offs: &'static [&'static str],
    pub(crate) notes: &'static [&'static str],
    pub(crate) transforms: &'static [TextTransform],
    pub(crate) complexity: Complexity,
}

use TextTransform::{Append, Prepend, ReplacePattern, Wrap};

static TYPED_TEMPLATES: &[((VulnerabilityType, FixApproach), FixTemplate)] = &[
    (
        (VulnerabilityType::SqlInjection, FixApproach::InputValidation),
        FixTemplate {
            title: "Parameterized query with validated input",
            description: "Replace string-built SQL with bound parameters and validate identifiers against an allowlist before they reach the database layer.",
            explanation: "String concatenation lets attacker-controlled input change the query structure. Bound parameters keep data out of the SQL grammar, and allowlist validation covers the identifiers parameters cannot bind.",
            benefits: &[
                "Neutralizes SQL injection at the driver level",
                "Validation failures surface before any query runs",
            ],
            trade_offs: &["Dynamic table or column names still need a separate allowlist"],
            notes: &[
                "Bind every user-supplied value as a parameter, never as text",
                "Validate identifiers against a fixed allowlist of known names",
            ],
            transforms: &[
                ReplacePattern { pattern: r#"\bf""#, replacement: "\"" },
                ReplacePattern { pattern: r"\bf'", replacement: "'" },
                Append("\n# Bind user input instead of concatenating it:\n# cursor.execute(\"SELECT ... WHERE id = ?\", (user_id,))"),
            ],
            complexity: Complexity::Medium,
        },
    ),
    (
        (VulnerabilityType::SqlInjection, FixApproach::DatabaseSolution),
        FixTemplate {
            title: "Prepared-statement repository",
            description: "Route data access through a repository layer that only exposes prepared statements and typed query builders.",
            explanation: "Centralizing SQL in a repository removes ad-hoc string building at call sites and gives one audited place where every statement is prepared and bound.",
            benefits: &[
                "One audited seam for all SQL",
                "Prepared statements are reused across calls",
            ],
            trade_offs: &[
                "Requires touching every call site of the old query",
                "More indirection for simple reads",
            ],
            notes: &[
                "Introduce a repository method per query shape",
                "Prepare statements once, bind values per call",
            ],
            transforms: &[Wrap {
                prefix: "# Extract into a repository method backed by a prepared statement:\n",
                suffix: "\n# repository.find_by_id(user_id) binds parameters internally.",
            }],
            complexity: Complexity::High,
        },
    ),
    (
        (VulnerabilityType::Xss, FixApproach::OutputSanitization),
        FixTemplate {
            title: "Escape output before rendering",
            description: "Render untrusted values as text, not markup, and escape anything that must carry markup.",
            explanation: "Assigning untrusted strings to HTML sinks executes attacker markup. Text-only sinks and framework escapers keep the payload inert.",
            benefits: &[
                "Stops script execution at the render boundary",
                "No change to upstream data flow required",
            ],
            trade_offs: &["Legitimate rich-text fields need a sanitizer library instead"],
            notes: &[
                "Prefer textContent and framework auto-escaping over manual escaping",
                "Sanitize rich text with an allowlist-based sanitizer",
            ],
            transforms: &[
                ReplacePattern { pattern: r"\.innerHTML\s*=", replacement: ".textContent =" },
                ReplacePattern { pattern: r"document\.write\(", replacement: "renderText(" },
                Append("\n# Escape values rendered as markup with the framework's HTML escaper."),
            ],
            complexity: Complexity::Low,
        },
    ),
    (
        (VulnerabilityType::Xss, FixApproach::InputValidation),
        FixTemplate {
            title: "Validate input before templating",
            description: "Normalize and validate user input before it reaches any template or render call.",
            explanation: "Most reflected XSS rides on fields that never legitimately contain markup. Rejecting markup characters at the boundary removes the payload before rendering is even a question.",
            benefits: &["Shrinks the attack surface for every downstream sink"],
            trade_offs: &["Validation alone does not protect rich-text fields"],
            notes: &["Validate against what the field should contain, not against known payloads"],
            transforms: &[
                Prepend("# Validate and normalize user input before it reaches the template:\n"),
                Append("\n# Reject or strip markup characters the field never legitimately needs."),
            ],
            complexity: Complexity::Low,
        },
    ),
    (
        (VulnerabilityType::CommandInjection, FixApproach::InputValidation),
        FixTemplate {
            title: "Validate arguments and drop the shell",
            description: "Pass command arguments as a list with shell interpretation disabled, validating each argument first.",
            explanation: "Shell interpolation turns argument text into command structure. An argument vector with shell=False plus allowlist validation keeps input as data.",
            benefits: &[
                "Metacharacters lose their meaning without a shell",
                "Bad arguments are rejected before the process spawns",
            ],
            trade_offs: &["Pipelines and redirection must be rebuilt in code"],
            notes: &[
                "Build the command as an argument list, never one string",
                "Validate each argument against an allowlist",
            ],
            transforms: &[
                ReplacePattern { pattern: r"shell\s*=\s*True", replacement: "shell=False" },
                Append("\n# Pass arguments as a list and validate each one against an allowlist."),
            ],
            complexity: Complexity::Medium,
        },
    ),
    (
        (VulnerabilityType::CommandInjection, FixApproach::LibraryReplacement),
        FixTemplate {
            title: "Replace shell call with a process API",
            description: "Swap shell-string execution for a process-spawning API that takes an argument vector.",
            explanation: "os.system and friends hand the whole string to a shell. Process APIs that take argument vectors execute the binary directly, so input cannot grow into extra commands.",
            benefits: &["Removes the shell from the execution path entirely"],
            trade_offs: &["Shell built-ins and globbing need explicit replacements"],
            notes: &["Use subprocess.run with a list argument and check=True"],
            transforms: &[
                ReplacePattern { pattern: r"os\.system\(", replacement: "subprocess.run(" },
                ReplacePattern { pattern: r"shell\s*=\s*True", replacement: "shell=False" },
                Append("\n# subprocess.run with an argument list never invokes a shell."),
            ],
            complexity: Complexity::Medium,
        },
    ),
    (
        (VulnerabilityType::AuthBypass, FixApproach::AccessControl),
        FixTemplate {
            title: "Enforce authentication and authorization",
            description: "Gate the operation behind explicit authentication and permission checks server-side.",
            explanation: "Client-side or implicit checks are bypassable by construction. A server-side check on every entry path is the only enforcement point an attacker cannot skip.",
            benefits: &[
                "Every request path hits the same enforcement point",
                "Authorization failures are auditable",
            ],
            trade_offs: &["Session or token plumbing must reach this code path"],
            notes: &[
                "Check authentication before authorization",
                "Deny by default when the permission lookup fails",
            ],
            transforms: &[Prepend(
                "# Enforce authentication and authorization before this operation:\n# require_authenticated(session)\n# require_permission(session, resource)\n",
            )],
            complexity: Complexity::Medium,
        },
    ),
    (
        (
            VulnerabilityType::InformationDisclosure,
            FixApproach::ErrorHandling,
        ),
        FixTemplate {
            title: "Generic errors outward, details in logs",
            description: "Return a generic error to the client and keep stack traces and internals in server-side logs.",
            explanation: "Stack traces and raw error strings leak paths, versions, and query text. Logging the detail server-side preserves debuggability without handing it to clients.",
            benefits: &["Clients learn nothing about internals from failures"],
            trade_offs: &["Support flows need log access to diagnose user reports"],
            notes: &[
                "Map internal errors to stable, generic client messages",
                "Log the full error with a correlation id",
            ],
            transforms: &[
                ReplacePattern {
                    pattern: r"traceback\.print_exc\(\)",
                    replacement: r#"logger.exception("request failed")"#,
                },
                ReplacePattern {
                    pattern: r"\w+\.printStackTrace\(\);?",
                    replacement: r#"log.error("request failed");"#,
                },
                Append("\n# Return a generic error to the client and keep details in server logs."),
            ],
            complexity: Complexity::Low,
        },
    ),
    (
        (
            VulnerabilityType::InsecureConfiguration,
            FixApproach::ConfigurationChange,
        ),
        FixTemplate {
            title: "Harden the configuration",
            description: "Turn off debug and permissive flags and enable verification in production configuration.",
            explanation: "Permissive defaults ship attacker conveniences: verbose errors, unverified TLS, wide-open policies. Locking the flags down removes the misconfiguration class.",
            benefits: &["No code change, only configuration"],
            trade_offs: &["Environments relying on the permissive behavior will surface quickly"],
            notes: &[
                "Keep production overrides in configuration management, not code",
                "Verify TLS everywhere, including internal calls",
            ],
            transforms: &[
                ReplacePattern { pattern: r"DEBUG\s*=\s*True", replacement: "DEBUG = False" },
                ReplacePattern { pattern: r"verify\s*=\s*False", replacement: "verify=True" },
                Append("\n# Keep hardening flags (TLS verification, debug, secure cookies) locked down in production."),
            ],
            complexity: Complexity::Low,
        },
    ),
    (
        (
            VulnerabilityType::InsecureConfiguration,
            FixApproach::LeastPrivilege,
        ),
        FixTemplate {
            title: "Reduce granted permissions",
            description: "Grant the narrowest permission set the component actually uses.",
            explanation: "Broad grants turn any compromise of this component into a compromise of everything it can touch. Scoping permissions to observed use bounds the blast radius.",
            benefits: &["Limits what a compromised component can do"],
            trade_offs: &["New legitimate operations need a permission review"],
            notes: &["Enumerate the operations actually performed and grant only those"],
            transforms: &[
                Prepend("# Grant the narrowest permissions this component needs:\n"),
                Append("\n# Drop write and admin scopes the workload never uses."),
            ],
            complexity: Complexity::Low,
        },
    ),
];

static APPROACH_TEMPLATES: &[(FixApproach, FixTemplate)] = &[
    (
        FixApproach::InputValidation,
        FixTemplate {
            title: "Validate input at the boundary",
            description: "Check type, length, range, and format of externally-supplied values before use.",
            explanation: "Most injection and corruption classes start with a value nobody checked. Validation at the trust boundary stops malformed input before it reaches sensitive operations.",
            benefits: &["Stops whole input-driven bug classes early"],
            trade_offs: &["Validation rules need maintenance as formats evolve"],
            notes: &["Validate on the server even when the client also validates"],
            transforms: &[
                Prepend("# Validate input at the trust boundary before using it:\n"),
                Append("\n# Reject values that fail validation with a clear error."),
            ],
            complexity: Complexity::Low,
        },
    ),
    (
        FixApproach::OutputSanitization,
        FixTemplate {
            title: "Sanitize output for its destination",
            description: "Encode or escape data appropriately for the sink that renders it.",
            explanation: "Data that is safe in one sink is an exploit in another. Encoding for the destination keeps untrusted content inert wherever it lands.",
            benefits: &["Protects every consumer of the value"],
            trade_offs: &["Double-encoding bugs if applied inconsistently"],
            notes: &["Encode at output time, once, per destination"],
            transforms: &[
                Prepend("# Encode output for its destination before rendering:\n"),
                Append("\n# Use the framework escaper for the target sink."),
            ],
            complexity: Complexity::Low,
        },
    ),
    (
        FixApproach::ErrorHandling,
        FixTemplate {
            title: "Handle failures explicitly",
            description: "Wrap the operation with explicit error handling and fail in a controlled way.",
            explanation: "Unhandled failures either crash or continue on corrupt state. Explicit handling makes the failure path a designed path.",
            benefits: &["Failures become observable and recoverable"],
            trade_offs: &["More code on the unhappy path"],
            notes: &["Handle the error where something meaningful can be done about it"],
            transforms: &[
                Prepend("# Wrap with explicit error handling:\n"),
                Append("\n# Handle failures explicitly and avoid leaking internals in error paths."),
            ],
            complexity: Complexity::Low,
        },
    ),
    (
        FixApproach::AccessControl,
        FixTemplate {
            title: "Add an explicit access check",
            description: "Verify the caller's identity and permission before performing the operation.",
            explanation: "Operations reachable without a check are public by accident. An explicit server-side check makes the intended audience enforceable.",
            benefits: &["Makes the authorization decision visible and testable"],
            trade_offs: &["Requires identity context at this layer"],
            notes: &["Deny by default; allow on explicit grant"],
            transforms: &[Prepend("# Verify caller identity and permission first:\n")],
            complexity: Complexity::Medium,
        },
    ),
    (
        FixApproach::InMemorySolution,
        FixTemplate {
            title: "Compute against validated in-memory state",
            description: "Move the sensitive operation onto validated in-process data instead of raw external input.",
            explanation: "Working from a validated in-memory copy separates parsing from use, so the sensitive operation never sees raw input.",
            benefits: &["Clear separation between untrusted input and trusted state"],
            trade_offs: &["State must be kept consistent with its source"],
            notes: &["Validate once at load, then operate on the validated copy"],
            transforms: &[Prepend("# Operate on validated in-memory state, not raw input:\n")],
            complexity: Complexity::Medium,
        },
    ),
    (
        FixApproach::DatabaseSolution,
        FixTemplate {
            title: "Move the invariant into the database",
            description: "Enforce the constraint with database mechanisms such as constraints, prepared statements, or row-level security.",
            explanation: "Application-level enforcement has one copy per code path. The database enforces its constraints on every path, including ones written later.",
            benefits: &["Enforcement survives new call sites"],
            trade_offs: &["Schema changes and migrations required"],
            notes: &["Keep the application check as a fast-fail, the database as the guarantee"],
            transforms: &[Prepend("# Enforce the invariant at the database layer:\n")],
            complexity: Complexity::High,
        },
    ),
    (
        FixApproach::CacheSolution,
        FixTemplate {
            title: "Serve from a validated cache",
            description: "Serve the value from a cache populated by a single validated writer.",
            explanation: "A single validated writer path means readers can trust cache contents, removing per-read exposure to raw input.",
            benefits: &["Readers never touch unvalidated data"],
            trade_offs: &["Cache invalidation becomes a correctness concern"],
            notes: &["Validate on write; treat the cache as trusted read-only state"],
            transforms: &[Prepend("# Serve from a cache populated by one validated writer:\n")],
            complexity: Complexity::Medium,
        },
    ),
    (
        FixApproach::MicroserviceSolution,
        FixTemplate {
            title: "Isolate the operation in a hardened service",
            description: "Move the sensitive operation behind a small service with a narrow, validated API.",
            explanation: "Isolation bounds what a compromise of the caller can reach; the narrow API is a single auditable trust boundary.",
            benefits: &["Blast radius bounded by the service boundary"],
            trade_offs: &["Operational cost of another deployable"],
            notes: &["Keep the service API minimal and strictly validated"],
            transforms: &[Prepend("# Isolate behind a narrow, validated service API:\n")],
            complexity: Complexity::High,
        },
    ),
    (
        FixApproach::FrameworkSecurity,
        FixTemplate {
            title: "Use the framework's security facilities",
            description: "Replace the hand-rolled handling with the framework's built-in protection.",
            explanation: "Framework facilities are maintained, widely reviewed, and already integrated with the request lifecycle. Hand-rolled equivalents drift and decay.",
            benefits: &["Maintained by the framework, patched with it"],
            trade_offs: &["Couples the fix to the framework's conventions"],
            notes: &["Prefer declarative framework configuration over imperative checks"],
            transforms: &[Prepend("# Lean on the framework's built-in protection here:\n")],
            complexity: Complexity::Medium,
        },
    ),
    (
        FixApproach::LibraryReplacement,
        FixTemplate {
            title: "Replace with a maintained library",
            description: "Swap the hand-rolled routine for a maintained library that solves this problem safely.",
            explanation: "Security-sensitive routines accumulate edge cases; a maintained library carries the fixes for edge cases this code has not hit yet.",
            benefits: &["Inherits upstream security fixes"],
            trade_offs: &["New dependency to track"],
            notes: &["Pin the library version and watch its advisories"],
            transforms: &[Prepend("# Replace the hand-rolled routine with a maintained library:\n")],
            complexity: Complexity::Medium,
        },
    ),
    (
        FixApproach::ConfigurationChange,
        FixTemplate {
            title: "Fix the configuration",
            description: "Correct the insecure setting in configuration rather than code.",
            explanation: "When behavior is configuration-driven, the configuration is the fix; code changes would only mask the setting.",
            benefits: &["Small, reviewable change"],
            trade_offs: &["Must be applied across every environment"],
            notes: &["Encode the secure setting in configuration management"],
            transforms: &[Prepend("# Correct the insecure setting:\n")],
            complexity: Complexity::Low,
        },
    ),
    (
        FixApproach::DefensiveProgramming,
        FixTemplate {
            title: "Add defensive checks",
            description: "Check preconditions and reject impossible states before the sensitive operation.",
            explanation: "Precondition checks convert silent corruption into loud, local failures, which is the difference between a bug report and an incident.",
            benefits: &["Failures surface at the cause, not downstream"],
            trade_offs: &["Extra checks add noise to hot paths"],
            notes: &["Check the preconditions this code actually relies on"],
            transforms: &[
                Prepend("# Check preconditions before the sensitive operation:\n"),
                Append("\n# Fail loudly on impossible states instead of continuing."),
            ],
            complexity: Complexity::Low,
        },
    ),
    (
        FixApproach::FailSafeDesign,
        FixTemplate {
            title: "Fail closed",
            description: "Make the failure path deny access or stop processing rather than continue open.",
            explanation: "When the check itself fails, continuing is equivalent to skipping the check. Failing closed keeps the guarantee under partial failure.",
            benefits: &["Security holds even when dependencies fail"],
            trade_offs: &["Availability trades against safety on failure"],
            notes: &["Audit every error branch for fail-open behavior"],
            transforms: &[Prepend("# On any failure in this path, deny and stop:\n")],
            complexity: Complexity::Medium,
        },
    ),
    (
        FixApproach::LeastPrivilege,
        FixTemplate {
            title: "Run with least privilege",
            description: "Reduce the privileges this code runs with to the minimum it uses.",
            explanation: "Privilege the code never uses is pure downside: unused capability is only exercised by an attacker.",
            benefits: &["Bounds the impact of any compromise here"],
            trade_offs: &["Future features may need privilege re-review"],
            notes: &["Start from zero privilege and add what the code demonstrably needs"],
            transforms: &[Prepend("# Reduce privileges to the minimum this code uses:\n")],
            complexity: Complexity::Low,
        },
    ),
];

static GENERIC_TEMPLATE: FixTemplate = FixTemplate {
    title: "Review and remediate",
    description: "Review the flagged code against the scanner message and apply the appropriate remediation.",
    explanation: "No specific template matches this finding. The flagged code should be reviewed with the scanner's message and hardened accordingly.",
    benefits: &["Keeps the finding visible until a concrete fix lands"],
    trade_offs: &["Requires manual security review"],
    notes: &["Consult the scanner documentation for this rule"],
    transforms: &[Prepend("# Review against the scanner finding and remediate:\n")],
    complexity: Complexity::Medium,
};

static TRANSFORM_REGEXES: Lazy<HashMap<&'static str, Regex>> = Lazy::new(|| {
    let mut map = HashMap::new();
    let all_templates = TYPED_TEMPLATES
        .iter()
        .map(|(_, template)| template)
        .chain(APPROACH_TEMPLATES.iter().map(|(_, template)| template))
        .chain(std::iter::once(&GENERIC_TEMPLATE));
    for template in all_templates {
        for transform in template.transforms {
            if let TextTransform::ReplacePattern { pattern, .. } = transform
                && !map.contains_key(pattern)
                && let Ok(regex) = Regex::new(pattern)
            {
                map.insert(*pattern, regex);
            }
        }
    }
    map
});

/// Most specific template available for this type/approach pair.
pub(crate) fn template_for(
    vuln_type: VulnerabilityType,
    approach: FixApproach,
) -> &'static FixTemplate {
    TYPED_TEMPLATES
        .iter()
        .find(|(key, _)| *key == (vuln_type, approach))
        .map(|(_, template)| template)
        .or_else(|| {
            APPROACH_TEMPLATES
                .iter()
                .find(|(key, _)| *key == approach)
                .map(|(_, template)| template)
        })
        .unwrap_or(&GENERIC_TEMPLATE)
}

/// Apply a template's transforms in order.
pub(crate) fn apply_transforms(code: &str, transforms: &[TextTransform]) -> String {
    let mut result = code.to_string();
    for transform in transforms {
        result = match transform {
            TextTransform::ReplacePattern {
                pattern,
                replacement,
            } => match TRANSFORM_REGEXES.get(pattern) {
                Some(regex) => regex
                    .replace_all(&result, |_: &regex_lite::Captures<'_>| {
                        (*replacement).to_string()
                    })
                    .into_owned(),
                None => result,
            },
            TextTransform::Wrap { prefix, suffix } => format!("{prefix}{result}{suffix}"),
            TextTransform::Prepend(block) => format!("{block}{result}"),
            TextTransform::Append(block) => format!("{result}{block}"),
        };
    }
    result
}
