//! Built-in pipeline used when the config declares no `[[checks]]`.
//!
//! Mirrors the remote pipeline of a Python service with a generated database
//! client, container image and infrastructure templates.

use super::types::Check;

pub fn default_checks() -> Vec<Check> {
    vec![
        // environment
        Check::new("python-version", "environment", ["python3", "--version"])
            .describe("Interpreter is available")
            .timeout(30),
        Check::new(
            "install-dependencies",
            "environment",
            ["python3", "-m", "pip", "install", "-q", "-r", "requirements.txt"],
        )
        .describe("Install pinned dependencies")
        .timeout(600),
        // codegen
        Check::new("prisma-generate", "codegen", ["prisma", "generate"])
            .describe("Generate the database client")
            .timeout(180),
        // quality
        Check::new("ruff", "quality", ["ruff", "check", "."])
            .describe("Lint")
            .timeout(120),
        Check::new("black", "quality", ["black", "--check", "."])
            .describe("Formatting")
            .timeout(120),
        Check::new("mypy", "quality", ["mypy", "src"])
            .describe("Static typing")
            .timeout(300),
        Check::new("compileall", "quality", ["python3", "-m", "compileall", "-q", "src"])
            .describe("Sources compile")
            .timeout(120)
            .always_critical(),
        // security
        Check::new("bandit", "security", ["bandit", "-q", "-r", "src"])
            .describe("Static security analysis")
            .timeout(300),
        Check::new("pip-audit", "security", ["pip-audit", "-r", "requirements.txt"])
            .describe("Known-vulnerable dependencies")
            .timeout(300)
            .non_critical(),
        Check::new(
            "secret-scan",
            "security",
            ["detect-secrets", "scan", "--baseline", ".secrets.baseline"],
        )
        .describe("Committed secrets")
        .timeout(180),
        // tests
        Check::new("unit-tests", "tests", ["pytest", "-q", "tests/unit"])
            .describe("Unit tests")
            .timeout(900)
            .always_critical(),
        Check::new("integration-tests", "tests", ["pytest", "-q", "tests/integration"])
            .describe("Integration tests")
            .timeout(1800)
            .full_only(),
        // build
        Check::new("docker-build", "build", ["docker", "build", "-t", "app:local-ci", "."])
            .describe("Container image builds")
            .timeout(1200),
        Check::new(
            "image-scan",
            "build",
            ["trivy", "image", "--exit-code", "1", "--severity", "HIGH,CRITICAL", "app:local-ci"],
        )
        .describe("Container image vulnerability scan")
        .timeout(600)
        .non_critical(),
        // services
        Check::new("api-server", "services", ["uvicorn", "app.main:app", "--port", "8765"])
            .describe("Service boots and stays up")
            .timeout(60)
            .non_critical(),
        // deployment
        Check::new("terraform-validate", "deployment", ["terraform", "validate"])
            .describe("Infrastructure templates are valid")
            .timeout(300)
            .non_critical(),
        Check::new("cfn-lint", "deployment", ["cfn-lint", "infra/template.yaml"])
            .describe("CloudFormation templates lint")
            .timeout(300)
            .non_critical()
            .env("AWS_PROFILE", "local-ci"),
        // documentation
        Check::new("mkdocs-build", "documentation", ["mkdocs", "build", "--strict"])
            .describe("Documentation builds")
            .timeout(300)
            .non_critical(),
        Check::new("markdown-links", "documentation", ["markdown-link-check", "README.md"])
            .describe("README links resolve")
            .timeout(120)
            .non_critical(),
    ]
}
