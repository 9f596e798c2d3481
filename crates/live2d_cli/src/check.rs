//! Check command - validate a model before shipping it
//!
//! Loads a `.model3.json` the way the runtime would and verifies that every
//! file it references is present, grouped by kind.

use std::fmt;
use std::path::Path;

use crate::model::ModelSettings;

const GREEN: &str = "32";
const YELLOW: &str = "33";
const RED: &str = "31";
const CYAN: &str = "36";

fn paint(code: &str, text: impl fmt::Display) -> String {
    format!("\x1b[{}m{}\x1b[0m", code, text)
}

/// Outcome of one check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Warn { hint: &'static str },
    Fail { hint: &'static str },
}

impl Outcome {
    fn marker(&self) -> String {
        match self {
            Outcome::Pass => paint(GREEN, "ok  "),
            Outcome::Warn { .. } => paint(YELLOW, "warn"),
            Outcome::Fail { .. } => paint(RED, "FAIL"),
        }
    }

    fn hint(&self) -> Option<&'static str> {
        match self {
            Outcome::Pass => None,
            Outcome::Warn { hint } | Outcome::Fail { hint } => Some(*hint),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Finding {
    pub section: &'static str,
    pub subject: String,
    pub detail: String,
    pub outcome: Outcome,
}

/// Everything learned about one model, in check order
#[derive(Debug, Default)]
pub struct ModelReport {
    pub title: String,
    pub findings: Vec<Finding>,
}

impl ModelReport {
    fn record(
        &mut self,
        section: &'static str,
        subject: impl Into<String>,
        detail: impl Into<String>,
        outcome: Outcome,
    ) {
        self.findings.push(Finding {
            section,
            subject: subject.into(),
            detail: detail.into(),
            outcome,
        });
    }

    pub fn in_section<'a>(&'a self, section: &'a str) -> impl Iterator<Item = &'a Finding> {
        self.findings.iter().filter(move |f| f.section == section)
    }

    /// Number of (warnings, failures)
    pub fn problems(&self) -> (usize, usize) {
        self.findings
            .iter()
            .fold((0, 0), |(warn, fail), f| match f.outcome {
                Outcome::Pass => (warn, fail),
                Outcome::Warn { .. } => (warn + 1, fail),
                Outcome::Fail { .. } => (warn, fail + 1),
            })
    }

    pub fn has_failures(&self) -> bool {
        self.problems().1 > 0
    }
}

impl fmt::Display for ModelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", paint(CYAN, &self.title))?;
        let mut section = "";
        for finding in &self.findings {
            if finding.section != section {
                section = finding.section;
                writeln!(f, "\n{}:", section)?;
            }
            writeln!(
                f,
                "  {}  {:<22} {}",
                finding.outcome.marker(),
                finding.subject,
                finding.detail
            )?;
            if let Some(hint) = finding.outcome.hint() {
                writeln!(f, "{:8}-> {}", "", paint(CYAN, hint))?;
            }
        }

        let (warnings, failures) = self.problems();
        let passed = self.findings.len() - warnings - failures;
        writeln!(f)?;
        write!(
            f,
            "{} passed, {} warning(s), {} failed",
            paint(GREEN, passed),
            paint(YELLOW, warnings),
            paint(RED, failures)
        )
    }
}

/// Run every check against one model settings file
pub fn check_model(path: &Path) -> ModelReport {
    let mut report = ModelReport {
        title: format!("Live2D model check: {}", path.display()),
        findings: Vec::new(),
    };

    let settings = match ModelSettings::load(path) {
        Ok(settings) => settings,
        Err(e) => {
            report.record(
                "Settings",
                "model3.json",
                format!("{:#}", e),
                Outcome::Fail {
                    hint: "Pass the path of the model's .model3.json file",
                },
            );
            return report;
        }
    };
    report.record("Settings", "model3.json", "parsed", Outcome::Pass);
    match settings.version {
        Some(3) => report.record("Settings", "Version", "3", Outcome::Pass),
        Some(v) => report.record(
            "Settings",
            "Version",
            v.to_string(),
            Outcome::Warn {
                hint: "The runtime expects Cubism 3+ settings (Version 3)",
            },
        ),
        None => report.record(
            "Settings",
            "Version",
            "not specified",
            Outcome::Warn {
                hint: "Exported settings carry \"Version\": 3",
            },
        ),
    }
    if !path.to_string_lossy().ends_with(".model3.json") {
        report.record(
            "Settings",
            "File name",
            "does not end in .model3.json",
            Outcome::Warn {
                hint: "Hosts locate models by the .model3.json suffix",
            },
        );
    }

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    for (kind, file) in settings.referenced_files(base) {
        let name = file.strip_prefix(base).unwrap_or(&file).display().to_string();
        if file.is_file() {
            report.record("Assets", kind, name, Outcome::Pass);
        } else {
            report.record(
                "Assets",
                kind,
                format!("{} is missing", name),
                Outcome::Fail {
                    hint: "Paths in FileReferences are relative to the settings file",
                },
            );
        }
    }
    let refs = &settings.file_references;
    if refs.textures.is_empty() {
        report.record(
            "Assets",
            "texture",
            "no textures referenced",
            Outcome::Warn {
                hint: "The model will draw without texturing",
            },
        );
    }

    for (group, motions) in &refs.motions {
        let subject = format!("motion group {}", group);
        if motions.is_empty() {
            report.record(
                "Triggers",
                subject,
                "empty",
                Outcome::Warn {
                    hint: "startMotion on this group will be rejected",
                },
            );
        } else {
            report.record(
                "Triggers",
                subject,
                format!("indices 0..{}", motions.len()),
                Outcome::Pass,
            );
        }
    }
    let expressions: Vec<&str> = refs.expressions.iter().map(|e| e.name.as_str()).collect();
    let listed = if expressions.is_empty() {
        "none".to_string()
    } else {
        expressions.join(", ")
    };
    report.record("Triggers", "expressions", listed, Outcome::Pass);

    report
}
