//! Pattern tables, one per tag. Order matters: the first matching rule wins.

use super::ErrorDetail;
use regex::{Captures, Regex};

pub struct Rule {
    pub name: &'static str,
    pub pattern: Regex,
    pub build: fn(&Captures) -> ErrorDetail,
}

impl Rule {
    fn new(name: &'static str, pattern: &str, build: fn(&Captures) -> ErrorDetail) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("valid regex"),
            build,
        }
    }
}

fn group<'a>(captures: &'a Captures, name: &str) -> &'a str {
    captures.name(name).map(|m| m.as_str()).unwrap_or_default()
}

pub fn detect_platform_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            "package_json_parse",
            r"(?i)failed to parse (?P<path>\S*package\.json)",
            |c| ErrorDetail {
                title: format!("We couldn’t parse {}.", group(c, "path")),
                description: "Make sure the file is valid JSON and re-run the scan.".to_string(),
            },
        ),
        Rule::new(
            "pubspec_parse",
            r"(?i)failed to parse (?P<path>\S*pubspec\.yaml)",
            |c| ErrorDetail {
                title: format!("We couldn’t parse {}.", group(c, "path")),
                description: "Make sure the file is valid YAML and declares the flutter SDK dependency."
                    .to_string(),
            },
        ),
        Rule::new(
            "read_failed",
            r"(?i)failed to read (?P<path>\S+)",
            |c| ErrorDetail {
                title: format!("We couldn’t read {}.", group(c, "path")),
                description: "Check the file permissions of your repository and re-run the scan."
                    .to_string(),
            },
        ),
    ]
}

pub fn options_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            "gradle_wrapper",
            r"No Gradle Wrapper \(gradlew\) found",
            |_| ErrorDetail {
                title: "We couldn’t find your Gradle Wrapper. Please make sure there is a gradlew file in your project’s root directory.".to_string(),
                description: "The Gradle Wrapper ensures that the right Gradle version is installed and used for the build. Generate it with `gradle wrapper` and commit the gradlew script.".to_string(),
            },
        ),
        Rule::new(
            "build_gradle",
            r"No build\.gradle(\.kts)? file found",
            |_| ErrorDetail {
                title: "We couldn’t find your build.gradle file.".to_string(),
                description: "Add a build.gradle or build.gradle.kts file to the root of your Android project.".to_string(),
            },
        ),
        Rule::new(
            "no_schemes",
            r"No schemes found for project: (?P<project>.+)",
            |c| ErrorDetail {
                title: format!("We couldn’t find any schemes in {}.", group(c, "project")),
                description: "Open the project in Xcode, mark at least one scheme as Shared under Product > Scheme > Manage Schemes, and commit the xcshareddata directory.".to_string(),
            },
        ),
        Rule::new(
            "no_xcode_project",
            r"No (iOS|macOS|Xcode) (project|workspace)s? found",
            |_| ErrorDetail {
                title: "We couldn’t find your Xcode project.".to_string(),
                description: "Make sure your .xcodeproj or .xcworkspace is committed to the repository.".to_string(),
            },
        ),
        Rule::new(
            "podfile",
            r"(?i)failed to (parse|read) (?P<path>\S*Podfile\S*)",
            |c| ErrorDetail {
                title: format!("We couldn’t parse {}.", group(c, "path")),
                description: "Make sure your Podfile and Podfile.lock are valid and committed.".to_string(),
            },
        ),
        Rule::new(
            "solution",
            r"(?i)no (xamarin )?projects? found in solution:? (?P<path>\S+)",
            |c| ErrorDetail {
                title: format!("We couldn’t find any Xamarin project in {}.", group(c, "path")),
                description: "Make sure the solution references your Xamarin.iOS or Xamarin.Android project.".to_string(),
            },
        ),
        Rule::new(
            "fastfile",
            r"(?i)no lanes found in (?P<path>\S*Fastfile)",
            |c| ErrorDetail {
                title: format!("We couldn’t find any lanes in {}.", group(c, "path")),
                description: "Define at least one lane in your Fastfile.".to_string(),
            },
        ),
        Rule::new(
            "config_xml",
            r"(?i)failed to parse (?P<path>\S*config\.xml)",
            |c| ErrorDetail {
                title: format!("We couldn’t parse {}.", group(c, "path")),
                description: "Make sure your Cordova config.xml is valid.".to_string(),
            },
        ),
    ]
}
