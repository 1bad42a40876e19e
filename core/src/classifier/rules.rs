use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierRule {
    pub name: String,

    /// Only checks in this category are eligible.
    #[serde(default)]
    pub category: Option<String>,

    /// Only checks whose name contains this substring are eligible.
    #[serde(default)]
    pub check_contains: Option<String>,

    /// Regexes matched against captured output and the failure detail.
    pub patterns: Vec<String>,

    pub remediation: String,
}

impl ClassifierRule {
    fn new(name: &str, patterns: &[&str], remediation: &str) -> Self {
        Self {
            name: name.to_string(),
            category: None,
            check_contains: None,
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            remediation: remediation.to_string(),
        }
    }

    fn in_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    fn for_checks_containing(mut self, needle: &str) -> Self {
        self.check_contains = Some(needle.to_string());
        self
    }
}

/// Built-in signatures for failures that say nothing about the code under test.
pub fn default_rules() -> Vec<ClassifierRule> {
    vec![
        ClassifierRule::new(
            "network-dns",
            &[
                r"(?i)temporary failure in name resolution",
                r"(?i)could not resolve host",
                r"(?i)name or service not known",
                r"(?i)getaddrinfo (failed|enotfound)",
                r"(?i)no such host",
            ],
            "DNS lookup failed. Check network/VPN connectivity and re-run; this is not a code failure.",
        ),
        ClassifierRule::new(
            "container-daemon",
            &[
                r"(?i)cannot connect to the docker daemon",
                r"(?i)is the docker daemon running",
                r"(?i)error during connect",
                r"(?i)podman.*(socket|service).*(not found|refused)",
            ],
            "Container engine is not reachable. Start Docker/Podman and re-run the build checks.",
        ),
        ClassifierRule::new(
            "registry-connectivity",
            &[
                r"(?i)toomanyrequests",
                r"(?i)error pulling image",
                r"(?i)failed to (fetch|resolve) .*(manifest|reference)",
                r"(?i)(registry|index)[^\n]*(timeout|timed out|unreachable|connection refused)",
                r"(?i)net/http: (tls handshake timeout|request canceled)",
            ],
            "Image registry is unreachable or rate-limited. Log in to the registry or retry later.",
        ),
        ClassifierRule::new(
            "missing-artifact",
            &[
                r"(?i)no such image",
                r"(?i)manifest unknown",
                r"(?i)unable to find image",
                r"(?i)image [^\s]+ not found",
            ],
            "Pre-built artifact is missing. Run the build category first (e.g. `localci --categories build`).",
        )
        .in_category("build"),
        ClassifierRule::new(
            "scanner-database",
            &[
                r"(?i)(failed|error) (to )?download(ing)? (the )?(vulnerability )?(db|database)",
                r"(?i)db (update|download) failed",
            ],
            "Scanner could not fetch its vulnerability database. Retry with network access.",
        )
        .for_checks_containing("scan"),
    ]
}
